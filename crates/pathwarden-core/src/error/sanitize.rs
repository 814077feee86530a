//! Absolute-path scrubbing for user-facing text.
//!
//! Anything surfaced to an external client passes through [`sanitize`]
//! regardless of security mode, so error text never discloses the layout
//! of the host filesystem.

#![allow(clippy::expect_used)] // literal patterns; failure to compile is a programming error

use std::sync::LazyLock;

use regex::Captures;
use regex::Regex;

/// Token substituted for every absolute path.
pub const PATH_PLACEHOLDER: &str = "<path>";

static UNC_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\\\\[^\s'"<>|]+"#).expect("UNC path pattern"));

static DRIVE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b[A-Za-z]:[\\/][^\s'"<>|]*"#).expect("drive path pattern")
});

static HOME_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"~[\\/][^\s'"<>|]*"#).expect("home path pattern"));

static UNIX_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(^|[\s'"(\[=,])(/[^\s'"<>|)\],;]*)"#).expect("unix path pattern")
});

/// Replaces absolute filesystem paths in `text` with [`PATH_PLACEHOLDER`].
///
/// Recognizes Unix absolute paths, Windows drive and UNC paths, and
/// home-relative `~/` paths. Trailing sentence punctuation is kept outside
/// the placeholder.
///
/// A path ends at the first whitespace, so `/home/u/My Documents/x.txt`
/// only loses its `/home/u/My` prefix. Callers holding a path as a typed
/// field should replace the field with [`PATH_PLACEHOLDER`] instead of
/// scanning rendered text.
///
/// # Examples
///
/// ```
/// use pathwarden_core::error::sanitize;
///
/// let text = "access denied: /home/alice/secret.txt: outside roots";
/// assert_eq!(sanitize(text), "access denied: <path>: outside roots");
///
/// assert_eq!(sanitize("read C:\\Users\\bob\\a.txt."), "read <path>.");
/// assert_eq!(sanitize("no paths here"), "no paths here");
/// ```
#[must_use]
pub fn sanitize(text: &str) -> String {
    let text = UNC_PATH.replace_all(text, whole_match).into_owned();
    let text = DRIVE_PATH.replace_all(&text, whole_match).into_owned();
    let text = HOME_PATH.replace_all(&text, whole_match).into_owned();
    UNIX_PATH
        .replace_all(&text, |caps: &Captures| {
            format!("{}{}", &caps[1], placeholder_keeping_tail(&caps[2]))
        })
        .into_owned()
}

fn whole_match(caps: &Captures<'_>) -> String {
    placeholder_keeping_tail(&caps[0])
}

fn placeholder_keeping_tail(matched: &str) -> String {
    let trimmed = matched.trim_end_matches(['.', ':']);
    let tail = &matched[trimmed.len()..];
    format!("{PATH_PLACEHOLDER}{tail}")
}

/// Returns `true` if `text` still contains something that looks like an
/// absolute path.
#[must_use]
pub fn contains_absolute_path(text: &str) -> bool {
    UNC_PATH.is_match(text)
        || DRIVE_PATH.is_match(text)
        || HOME_PATH.is_match(text)
        || UNIX_PATH.is_match(text)
}
