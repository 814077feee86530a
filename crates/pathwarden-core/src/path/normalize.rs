//! Lexical path normalization.
//!
//! Turns an untrusted string into an absolute, `.`/`..`-free path without
//! touching the filesystem, so it is safe to run on arbitrary input.

use std::collections::HashMap;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use crate::Result;
use crate::WardenError;

/// Source of the home directory and environment variables used by
/// expansion.
///
/// The default reads the real process environment. Tests and embedders can
/// pin both to fixed values.
///
/// # Examples
///
/// ```
/// use pathwarden_core::path::{ExpansionContext, normalize_with};
/// use std::path::Path;
///
/// let ctx = ExpansionContext::isolated()
///     .with_home("/home/u")
///     .with_var("INBOX", "Downloads/inbox");
///
/// let path = normalize_with("~/$INBOX/../sorted", Path::new("/"), &ctx).unwrap();
/// assert_eq!(path, Path::new("/home/u/Downloads/sorted"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExpansionContext {
    home_dir: Option<PathBuf>,
    vars: Option<HashMap<String, String>>,
    isolated: bool,
}

impl ExpansionContext {
    /// Context backed by the process environment and the user's home.
    #[must_use]
    pub fn from_process() -> Self {
        Self {
            home_dir: dirs::home_dir(),
            vars: None,
            isolated: false,
        }
    }

    /// Context with no home directory and no variables.
    #[must_use]
    pub fn isolated() -> Self {
        Self {
            home_dir: None,
            vars: Some(HashMap::new()),
            isolated: true,
        }
    }

    /// Overrides the home directory.
    #[must_use]
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home_dir = Some(home.into());
        self
    }

    /// Pins a variable. Once any variable is pinned, lookups no longer fall
    /// through to the process environment.
    #[must_use]
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    fn home(&self) -> Option<PathBuf> {
        if self.home_dir.is_some() || self.isolated {
            return self.home_dir.clone();
        }
        dirs::home_dir()
    }

    fn var(&self, name: &str) -> Option<String> {
        match &self.vars {
            Some(vars) => vars.get(name).cloned(),
            None => std::env::var(name).ok(),
        }
    }
}

/// Normalizes `input` against the current working directory using the
/// process environment.
pub fn normalize(input: &str) -> Result<PathBuf> {
    let cwd = std::env::current_dir().map_err(|e| {
        WardenError::validation_with("cannot determine current directory", e.to_string())
    })?;
    normalize_with(input, &cwd, &ExpansionContext::from_process())
}

/// Normalizes `input` to an absolute path.
///
/// Steps, in order:
/// 1. reject empty input and input containing NUL
/// 2. expand a leading `~` or `~/`
/// 3. expand `$VAR`, `${VAR}` and `%VAR%`; undefined variables become the
///    empty string
/// 4. make the path absolute against `base`
/// 5. collapse `.`, `..` and redundant separators (`..` never climbs above
///    the root)
///
/// An input that expands to nothing at all is rejected rather than silently
/// resolving to `base`.
pub fn normalize_with(input: &str, base: &Path, ctx: &ExpansionContext) -> Result<PathBuf> {
    check_input(input)?;

    if !base.is_absolute() {
        return Err(WardenError::validation_with(
            "normalization base must be absolute",
            base.display().to_string(),
        ));
    }

    let expanded = expand(input, ctx)?;
    if expanded.as_os_str().is_empty() {
        return Err(WardenError::validation_with(
            "path is empty after expansion",
            format!("input {input:?} expanded to an empty string"),
        ));
    }

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    };

    Ok(lexical_clean(&absolute))
}

/// Rejects empty and NUL-containing input.
pub(crate) fn check_input(input: &str) -> Result<()> {
    if input.trim().is_empty() {
        return Err(WardenError::validation("path is empty"));
    }
    if input.contains('\0') {
        return Err(WardenError::validation("path contains a NUL byte"));
    }
    Ok(())
}

fn expand(input: &str, ctx: &ExpansionContext) -> Result<PathBuf> {
    let (home, rest) = split_home(input);
    let rest = expand_vars(rest, ctx);

    if !home {
        return Ok(PathBuf::from(rest));
    }

    let home_dir = ctx.home().ok_or_else(|| {
        WardenError::validation_with(
            "cannot expand ~",
            "home directory is not known in this environment",
        )
    })?;
    let rest = rest.trim_start_matches(['/', '\\']);
    if rest.is_empty() {
        Ok(home_dir)
    } else {
        Ok(home_dir.join(rest))
    }
}

/// Splits a leading `~` / `~/` off `input`. `~user` forms are not expanded.
fn split_home(input: &str) -> (bool, &str) {
    match input.strip_prefix('~') {
        Some("") => (true, ""),
        Some(rest) if rest.starts_with('/') || rest.starts_with('\\') => (true, rest),
        _ => (false, input),
    }
}

/// Expands `$VAR`, `${VAR}` and `%VAR%` tokens.
///
/// Malformed tokens (`${` without `}`, a lone `%`) are kept literally.
pub(crate) fn expand_vars(input: &str, ctx: &ExpansionContext) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find(['$', '%']) {
        out.push_str(&rest[..pos]);
        let token = &rest[pos..];

        let (name, consumed) = if let Some(braced) = token.strip_prefix("${") {
            match braced.find('}') {
                Some(end) if is_var_name(&braced[..end]) => (Some(&braced[..end]), end + 3),
                _ => (None, 1),
            }
        } else if let Some(plain) = token.strip_prefix('$') {
            let len = var_name_len(plain);
            if len > 0 { (Some(&plain[..len]), len + 1) } else { (None, 1) }
        } else {
            let inner = &token[1..];
            match inner.find('%') {
                Some(end) if is_var_name(&inner[..end]) => (Some(&inner[..end]), end + 2),
                _ => (None, 1),
            }
        };

        match name {
            Some(name) => out.push_str(&ctx.var(name).unwrap_or_default()),
            None => out.push_str(&token[..1]),
        }
        rest = &token[consumed..];
    }

    out.push_str(rest);
    out
}

fn var_name_len(s: &str) -> usize {
    let mut chars = s.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return 0,
    }
    chars
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        .map_or(s.len(), |(i, _)| i)
}

fn is_var_name(s: &str) -> bool {
    !s.is_empty() && var_name_len(s) == s.len()
}

/// Collapses `.` and `..` components lexically.
///
/// `..` at the root stays at the root. Symlinks are not consulted; use the
/// resolver for the real location.
#[must_use]
pub fn lexical_clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if out.file_name().is_some() {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(name) => out.push(name),
        }
    }
    out
}
