//! Error taxonomy and user-facing sanitization.

pub mod messages;
pub mod sanitize;
pub mod types;

pub use messages::UserMessage;
pub use sanitize::PATH_PLACEHOLDER;
pub use sanitize::sanitize;
pub use types::DenialReason;
pub use types::ErrorKind;
pub use types::Result;
pub use types::WardenError;
