//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use crate::commands::allow::AllowChange;
use crate::commands::allow::AllowTestOutcome;
use crate::commands::archive::ArchiveCheckReport;
use crate::commands::check::CheckOutcome;
use anyhow::Result;
use console::Term;
use console::style;
use pathwarden_core::StatusReport;
use pathwarden_core::allowlist::AllowListEntry;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
    err_term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
            err_term: Term::stderr(),
        }
    }

    fn line(&self, text: &str) {
        let _ = self.term.write_line(text);
    }

    fn mark(&self, ok: bool) -> String {
        match (ok, self.use_colors) {
            (true, true) => style("✓").green().bold().to_string(),
            (false, true) => style("✗").red().bold().to_string(),
            (true, false) => "OK".to_string(),
            (false, false) => "X".to_string(),
        }
    }

    fn heading(&self, text: &str) -> String {
        if self.use_colors {
            style(text).bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn format_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if bytes >= GB {
            format!("{:.1} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.1} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.1} KB", bytes as f64 / KB as f64)
        } else {
            format!("{bytes} B")
        }
    }

    fn format_number(n: usize) -> String {
        let s = n.to_string();
        let mut result = String::new();
        let mut count = 0;

        for c in s.chars().rev() {
            if count == 3 {
                result.push(',');
                count = 0;
            }
            result.push(c);
            count += 1;
        }

        result.chars().rev().collect()
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_status(&self, report: &StatusReport) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        self.line(&format!("{} {}", self.heading("Mode:"), report.mode));
        let config = report
            .config_path
            .as_ref()
            .map_or_else(|| "(in memory)".to_string(), |p| p.display().to_string());
        self.line(&format!("  Config: {config}"));
        self.line(&format!("  Working directory: {}", report.working_directory.display()));

        self.line("");
        self.line(&self.heading("Permitted roots:"));
        if report.roots.is_empty() {
            self.line("  (none)");
        }
        for root in &report.roots {
            let normalized = root
                .normalized
                .as_ref()
                .map_or_else(|| "(unresolvable)".to_string(), |p| p.display().to_string());
            self.line(&format!("  {} {} -> {normalized}", self.mark(root.exists), root.original));
        }

        self.line("");
        if report.deny_list_active {
            self.line(&format!(
                "{} active ({} entries)",
                self.heading("System deny-list:"),
                report.deny_list.len()
            ));
        } else {
            self.line(&format!("{} inactive", self.heading("System deny-list:")));
        }
        if self.verbose {
            for entry in &report.deny_list {
                self.line(&format!("  {}", entry.display()));
            }
        }

        let limits = &report.limits;
        self.line("");
        self.line(&self.heading("Limits:"));
        self.line(&format!("  Max file size:         {}", Self::format_size(limits.max_file_size)));
        self.line(&format!("  Max total size:        {}", Self::format_size(limits.max_absolute_bytes)));
        self.line(&format!("  Max entries:           {}", Self::format_number(limits.max_entries)));
        self.line(&format!("  Max entry depth:       {}", limits.max_entry_depth));
        self.line(&format!("  Max compression ratio: {:.0}:1", limits.max_compression_ratio));

        for issue in &report.issues {
            self.format_warning(issue);
        }
        Ok(())
    }

    fn format_check(&self, outcome: &CheckOutcome) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        self.line(&format!("{} {}", self.mark(true), outcome.real_path.display()));
        if self.verbose {
            self.line(&format!("  Input: {}", outcome.input));
            self.line(&format!("  Mode: {}", outcome.mode));
            self.line(&format!("  Exists: {}", if outcome.exists { "yes" } else { "no" }));
        }
        Ok(())
    }

    fn format_allow_list(&self, entries: &[AllowListEntry]) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        if entries.is_empty() {
            self.line("No allowed directories configured");
            return Ok(());
        }

        for entry in entries {
            match &entry.normalized {
                Some(normalized) if normalized.to_str() != Some(entry.original.as_str()) => {
                    self.line(&format!(
                        "{} {} ({})",
                        self.mark(entry.exists),
                        entry.original,
                        normalized.display()
                    ));
                }
                _ => self.line(&format!("{} {}", self.mark(entry.exists), entry.original)),
            }
        }
        Ok(())
    }

    fn format_allow_change(&self, change: &AllowChange) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        let verb = if change.action == "added" { "Added" } else { "Removed" };
        match &change.normalized {
            Some(normalized) => self.line(&format!(
                "{} {verb} {} ({})",
                self.mark(true),
                change.directory,
                normalized.display()
            )),
            None => self.line(&format!("{} {verb} {}", self.mark(true), change.directory)),
        }
        Ok(())
    }

    fn format_allow_test(&self, outcome: &AllowTestOutcome) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        match &outcome.matched {
            Some(matched) => self.line(&format!(
                "{} {} is covered by {} ({})",
                self.mark(true),
                outcome.path,
                matched.original,
                matched.root.display()
            )),
            None => self.line(&format!(
                "{} {} is not covered by any allowed directory",
                self.mark(false),
                outcome.path
            )),
        }
        Ok(())
    }

    fn format_archive_check(&self, report: &ArchiveCheckReport) -> Result<()> {
        if self.quiet && report.is_safe() {
            return Ok(());
        }

        if !self.quiet {
            let verdict = match (report.is_safe(), self.use_colors) {
                (true, true) => style("SAFE").green().bold().to_string(),
                (false, true) => style("UNSAFE").red().bold().to_string(),
                (true, false) => "SAFE".to_string(),
                (false, false) => "UNSAFE".to_string(),
            };
            self.line(&format!("Archive check: {verdict}"));
            self.line(&format!("  Format: {}", report.format));
            self.line(&format!("  Entries: {}", Self::format_number(report.entries)));
            self.line(&format!("  Valid: {}", Self::format_number(report.valid)));
            if let Some(scan) = &report.scan {
                self.line(&format!(
                    "  Decompressed: {} from {} ({} members)",
                    Self::format_size(scan.uncompressed_bytes),
                    Self::format_size(scan.compressed_bytes),
                    Self::format_number(scan.members)
                ));
            }
            if self.verbose {
                self.line(&format!("  Target: {}", report.target.display()));
            }
        }

        if !report.rejected.is_empty() {
            self.line("");
            self.line(&self.heading("Rejected entries:"));
            for rejection in &report.rejected {
                self.line(&format!("  {} {:?}: {}", self.mark(false), rejection.entry, rejection.reason));
            }
        }
        Ok(())
    }

    fn format_error(&self, _operation: &str, error: &anyhow::Error) {
        // Always show errors, even in quiet mode
        if self.use_colors {
            let _ = self
                .err_term
                .write_line(&format!("{} {error:#}", style("ERROR:").red().bold()));
        } else {
            let _ = self.err_term.write_line(&format!("ERROR: {error:#}"));
        }
    }

    fn format_warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        if self.use_colors {
            let _ = self
                .err_term
                .write_line(&format!("{} {message}", style("⚠").yellow().bold()));
        } else {
            let _ = self.err_term.write_line(&format!("WARNING: {message}"));
        }
    }
}
