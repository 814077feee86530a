//! I/O wrappers that make the decompression limits enforceable.

pub mod bounded;
pub mod counting;

pub use bounded::BoundedReader;
pub use bounded::CompressedSize;
pub use bounded::DecompressionLimit;
pub use counting::ByteCounter;
pub use counting::CountingReader;
