//! Trust-boundary path validation for file-organization tools.
//!
//! `pathwarden-core` decides whether a user-supplied path may be read or
//! written. It normalizes the input, resolves it against the real
//! filesystem, and checks the result against the active security mode:
//! the working directory (strict), a persisted allow-list (sandboxed), or
//! the whole filesystem minus a system deny-list (unrestricted). Archive
//! entry names get the same treatment before anything is extracted, along
//! with limits that stop decompression bombs.
//!
//! # Examples
//!
//! ```no_run
//! use pathwarden_core::PathWarden;
//! use pathwarden_core::ValidationRequest;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let warden = PathWarden::load_default()?;
//! let target = warden.validate(&ValidationRequest::new("~/Downloads/report.pdf").require_exists(true))?;
//! println!("{}", target.as_path().display());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod allowlist;
pub mod archive;
pub mod config;
pub mod error;
pub mod io;
pub mod limits;
pub mod path;
pub mod types;
pub mod validator;
pub mod warden;

#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub mod test_utils;

pub use archive::ArchiveValidator;
pub use config::SecurityMode;
pub use error::DenialReason;
pub use error::ErrorKind;
pub use error::Result;
pub use error::WardenError;
pub use limits::SecurityLimits;
pub use types::AllowedRoot;
pub use types::RealPath;
pub use types::SafeExtractionPath;
pub use validator::ValidationRequest;
pub use warden::OpenIntent;
pub use warden::PathWarden;
pub use warden::StatusReport;
