//! Archive entry validation.
//!
//! Extraction is done by collaborators; this module decides, before any
//! byte is written, where each entry may go and whether the archive may be
//! processed at all. Entry names get the same containment check as
//! caller-supplied paths, and sizes are held to the decompression limits in
//! [`SecurityLimits`](crate::limits::SecurityLimits).

mod entry;
mod error;
mod patterns;
mod reserved;
mod validator;

pub mod detect;
pub mod inspect;
pub mod scan;

pub use detect::ArchiveFormat;
pub use entry::ArchiveEntry;
pub use entry::EntryKind;
pub use entry::EntryRejection;
pub use entry::RejectionReason;
pub use error::ArchiveError;
pub use patterns::BlockedPattern;
pub use patterns::blocked_patterns;
pub use reserved::reserved_device;
pub use validator::ArchiveValidator;
pub use validator::BatchOutcome;
pub use validator::ValidatedEntry;
