//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pathwarden")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: $PATHWARDEN_CONFIG or the user config directory)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the security mode, permitted roots, deny-list and limits
    Status,
    /// Validate a path against the configured security mode
    Check(CheckArgs),
    /// Manage the sandboxed-mode allow-list
    #[command(subcommand)]
    Allow(AllowCommand),
    /// Check archives for unsafe entries before extraction
    #[command(subcommand)]
    Archive(ArchiveCommand),
    /// Generate shell completions
    Completion(CompletionArgs),
}

impl Commands {
    /// Operation name used in JSON envelopes.
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Check(_) => "check",
            Self::Allow(AllowCommand::Add(_)) => "allow-add",
            Self::Allow(AllowCommand::Remove(_)) => "allow-remove",
            Self::Allow(AllowCommand::List) => "allow-list",
            Self::Allow(AllowCommand::Test(_)) => "allow-test",
            Self::Archive(ArchiveCommand::Check(_)) => "archive-check",
            Self::Completion(_) => "completion",
        }
    }
}

#[derive(clap::Args)]
pub struct CheckArgs {
    /// Path to validate
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Fail if the path does not exist
    #[arg(long)]
    pub must_exist: bool,

    /// Fail if the path (or its nearest existing parent) is not writable
    #[arg(long)]
    pub writable: bool,

    /// Do not follow a symlink at the final component
    #[arg(long)]
    pub no_follow: bool,
}

#[derive(Subcommand)]
pub enum AllowCommand {
    /// Add a directory to the allow-list
    Add(AllowAddArgs),
    /// Remove a directory from the allow-list
    Remove(AllowPathArgs),
    /// List allowed directories
    List,
    /// Show which allowed directory covers a path
    Test(AllowPathArgs),
}

#[derive(clap::Args)]
pub struct AllowAddArgs {
    /// Directory to allow (~ and $VARS are expanded)
    #[arg(value_name = "DIR")]
    pub directory: String,

    /// Create the directory if it does not exist
    #[arg(long)]
    pub create: bool,

    /// Skip the existence check
    #[arg(long, conflicts_with = "create")]
    pub no_validate: bool,
}

#[derive(clap::Args)]
pub struct AllowPathArgs {
    /// Directory or path
    #[arg(value_name = "PATH")]
    pub path: String,
}

#[derive(Subcommand)]
pub enum ArchiveCommand {
    /// Validate every entry of an archive against a target directory
    Check(ArchiveCheckArgs),
}

#[derive(clap::Args)]
pub struct ArchiveCheckArgs {
    /// Path to the archive file
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Directory the archive would be extracted into
    #[arg(value_name = "TARGET_DIR")]
    pub target: PathBuf,

    /// Also decompress every member to detect decompression bombs
    #[arg(long)]
    pub deep: bool,

    /// Lower the single entry size limit
    #[arg(long, value_parser = parse_byte_size)]
    pub max_file_size: Option<u64>,

    /// Lower the total decompressed size limit
    #[arg(long, value_parser = parse_byte_size)]
    pub max_total_size: Option<u64>,
}

#[derive(clap::Args)]
pub struct CompletionArgs {
    /// Target shell
    #[arg(value_enum, value_name = "SHELL")]
    pub shell: Shell,
}

/// Parse byte size with optional suffix (K, M, G, T)
#[allow(clippy::option_if_let_else)]
fn parse_byte_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty byte size".to_string());
    }

    let (num_str, multiplier) = if let Some(stripped) = s.strip_suffix('T') {
        (stripped, 1024_u64.pow(4))
    } else if let Some(stripped) = s.strip_suffix('G') {
        (stripped, 1024_u64.pow(3))
    } else if let Some(stripped) = s.strip_suffix('M') {
        (stripped, 1024_u64.pow(2))
    } else if let Some(stripped) = s.strip_suffix('K') {
        (stripped, 1024)
    } else {
        (s, 1)
    };

    num_str
        .parse::<u64>()
        .map_err(|_| format!("invalid byte size: {s}"))
        .and_then(|n| {
            n.checked_mul(multiplier)
                .ok_or_else(|| format!("byte size overflow: {s}"))
        })
}
