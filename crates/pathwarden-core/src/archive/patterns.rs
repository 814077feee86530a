//! Blocked entry-name patterns.
//!
//! The rule set is a fixed, ordered table so each rule can be audited and
//! tested on its own. The first matching rule names the rejection.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use regex::Regex;

/// A named, compiled rule.
#[derive(Debug)]
pub struct BlockedPattern {
    /// Stable rule name reported in rejections.
    pub name: &'static str,
    /// The compiled expression.
    pub regex: Regex,
}

const RULES: &[(&str, &str)] = &[
    ("absolute_path", r"^/"),
    ("drive_prefix", r"^[A-Za-z]:"),
    ("parent_traversal", r"(?:^|[/\\])\.\.(?:[/\\]|$)"),
    ("leading_separator", r"^\\"),
    (
        "system_directory",
        r"(?i)^(?:\./)*(?:windows[/\\]system32|etc[/\\](?:passwd|shadow|sudoers|hosts))(?:[/\\]|$)",
    ),
];

static BLOCKED_PATTERNS: LazyLock<Vec<BlockedPattern>> = LazyLock::new(|| {
    RULES
        .iter()
        .map(|&(name, pattern)| BlockedPattern {
            name,
            regex: Regex::new(pattern).expect("blocked pattern must compile"),
        })
        .collect()
});

/// The rule table in evaluation order.
#[must_use]
pub fn blocked_patterns() -> &'static [BlockedPattern] {
    &BLOCKED_PATTERNS
}

/// Returns the name of the first rule `name` matches, if any.
#[must_use]
pub fn first_blocked(name: &str) -> Option<&'static str> {
    blocked_patterns()
        .iter()
        .find(|rule| rule.regex.is_match(name))
        .map(|rule| rule.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_path() {
        assert_eq!(first_blocked("/etc/passwd"), Some("absolute_path"));
    }

    #[test]
    fn test_drive_prefix() {
        assert_eq!(first_blocked("C:\\Windows\\win.ini"), Some("drive_prefix"));
        assert_eq!(first_blocked("d:relative"), Some("drive_prefix"));
    }

    #[test]
    fn test_parent_traversal() {
        assert_eq!(first_blocked("../../etc/passwd"), Some("parent_traversal"));
        assert_eq!(first_blocked("a/../../b"), Some("parent_traversal"));
        assert_eq!(first_blocked("a\\..\\b"), Some("parent_traversal"));
        assert_eq!(first_blocked("a/.."), Some("parent_traversal"));
    }

    #[test]
    fn test_dots_inside_names_allowed() {
        assert_eq!(first_blocked("a..b/file"), None);
        assert_eq!(first_blocked("..hidden"), None);
        assert_eq!(first_blocked("notes...txt"), None);
    }

    #[test]
    fn test_leading_backslash() {
        assert_eq!(first_blocked("\\\\server\\share\\x"), Some("leading_separator"));
    }

    #[test]
    fn test_system_directory() {
        assert_eq!(first_blocked("etc/passwd"), Some("system_directory"));
        assert_eq!(first_blocked("./Windows/System32/drivers"), Some("system_directory"));
        assert_eq!(first_blocked("etcetera/passwd"), None);
    }

    #[test]
    fn test_ordinary_names() {
        assert_eq!(first_blocked("docs/readme.txt"), None);
        assert_eq!(first_blocked("photos/2024/IMG_0001.jpg"), None);
    }

    #[test]
    fn test_table_order_is_stable() {
        let names: Vec<_> = blocked_patterns().iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            ["absolute_path", "drive_prefix", "parent_traversal", "leading_separator", "system_directory"]
        );
    }
}
