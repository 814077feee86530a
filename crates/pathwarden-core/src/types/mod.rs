//! Validated path types.
//!
//! Values of these types can only be produced by validation, so holding one
//! is proof that the corresponding checks ran.

mod allowed_root;
mod extraction_path;
mod real_path;

pub use allowed_root::AllowedRoot;
pub use extraction_path::SafeExtractionPath;
pub use real_path::RealPath;
