//! Validation request options.

/// A path supplied by a caller, together with what the caller intends to do
/// with it.
///
/// # Examples
///
/// ```
/// use pathwarden_core::ValidationRequest;
///
/// let request = ValidationRequest::new("~/Downloads/report.pdf")
///     .require_exists(true)
///     .check_write(true);
/// assert!(request.requires_exists());
/// assert!(request.resolves_symlinks());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRequest {
    input: String,
    require_exists: bool,
    check_write: bool,
    resolve_symlinks: bool,
}

impl ValidationRequest {
    /// Creates a request with default options: the target need not exist,
    /// writability is not checked, and symlinks are followed.
    #[must_use]
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            require_exists: false,
            check_write: false,
            resolve_symlinks: true,
        }
    }

    /// Requires the target to exist.
    #[must_use]
    pub const fn require_exists(mut self, yes: bool) -> Self {
        self.require_exists = yes;
        self
    }

    /// Requires the target, or its nearest existing ancestor, to be
    /// writable.
    #[must_use]
    pub const fn check_write(mut self, yes: bool) -> Self {
        self.check_write = yes;
        self
    }

    /// Controls whether a symlink at the final component is followed.
    ///
    /// With `false` the parent directory is still resolved, but the leaf is
    /// taken as-is so that the link itself (rather than its target) is the
    /// object being validated.
    #[must_use]
    pub const fn resolve_symlinks(mut self, yes: bool) -> Self {
        self.resolve_symlinks = yes;
        self
    }

    /// The path exactly as supplied.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[must_use]
    pub const fn requires_exists(&self) -> bool {
        self.require_exists
    }

    #[must_use]
    pub const fn requires_write(&self) -> bool {
        self.check_write
    }

    #[must_use]
    pub const fn resolves_symlinks(&self) -> bool {
        self.resolve_symlinks
    }
}
