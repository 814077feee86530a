//! Decompression-bomb guard for streaming readers.

use std::io;
use std::io::Read;

use thiserror::Error;

use super::ByteCounter;
use crate::limits::SecurityLimits;

/// A decompression limit that was crossed.
///
/// Returned inside an [`io::Error`] of kind `InvalidData`; use
/// [`DecompressionLimit::from_io`] to recover it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecompressionLimit {
    /// Cumulative output exceeded the absolute cap.
    #[error("decompressed size exceeds {max} bytes")]
    TotalBytes {
        /// Configured maximum.
        max: u64,
    },

    /// Output outgrew input by more than the permitted ratio.
    #[error("compression ratio {ratio:.1} exceeds {max:.1}")]
    Ratio {
        /// Observed uncompressed / compressed.
        ratio: f64,
        /// Configured maximum.
        max: f64,
    },
}

impl DecompressionLimit {
    /// Extracts the limit from an I/O error produced by [`BoundedReader`].
    #[must_use]
    pub fn from_io(err: &io::Error) -> Option<&Self> {
        err.get_ref().and_then(|inner| inner.downcast_ref::<Self>())
    }
}

/// Where the compressed byte count comes from.
#[derive(Debug, Clone)]
pub enum CompressedSize {
    /// Live count of raw bytes pulled by the decoder.
    Counted(ByteCounter),
    /// Size declared by the container (zip members).
    Declared(u64),
}

impl CompressedSize {
    fn get(&self) -> u64 {
        match self {
            Self::Counted(counter) => counter.get(),
            Self::Declared(n) => *n,
        }
    }
}

/// Reader that fails once decompressed output crosses a limit.
///
/// The absolute byte cap is checked on every read. The ratio check runs each
/// time another `chunk_size` bytes of output have been produced, so small
/// archives with a high but harmless ratio (tar padding) are not flagged.
///
/// Once a limit trips, every later read fails with the same error.
///
/// # Examples
///
/// ```
/// use pathwarden_core::io::{BoundedReader, CompressedSize, DecompressionLimit};
/// use pathwarden_core::limits::SecurityLimits;
/// use std::io::Read;
///
/// let limits = SecurityLimits { max_absolute_bytes: 10, ..SecurityLimits::default() };
/// let mut reader = BoundedReader::new(&[0u8; 64][..], CompressedSize::Declared(64), &limits);
///
/// let err = std::io::copy(&mut reader, &mut std::io::sink()).unwrap_err();
/// assert!(matches!(
///     DecompressionLimit::from_io(&err),
///     Some(DecompressionLimit::TotalBytes { max: 10 })
/// ));
/// ```
#[derive(Debug)]
pub struct BoundedReader<R> {
    inner: R,
    compressed: CompressedSize,
    max_bytes: u64,
    max_ratio: f64,
    chunk_size: u64,
    uncompressed: u64,
    next_checkpoint: u64,
    tripped: Option<DecompressionLimit>,
}

impl<R> BoundedReader<R> {
    /// Wraps `inner` with the limits from `limits`.
    #[must_use]
    pub fn new(inner: R, compressed: CompressedSize, limits: &SecurityLimits) -> Self {
        let chunk_size = limits.chunk_size.max(1) as u64;
        Self {
            inner,
            compressed,
            max_bytes: limits.max_absolute_bytes,
            max_ratio: limits.max_compression_ratio,
            chunk_size,
            uncompressed: 0,
            next_checkpoint: chunk_size,
            tripped: None,
        }
    }

    /// Starts the running total at `already_read`, for a budget shared
    /// across several members.
    #[must_use]
    pub fn with_running_total(mut self, already_read: u64) -> Self {
        self.uncompressed = already_read;
        self.next_checkpoint = (already_read / self.chunk_size + 1) * self.chunk_size;
        self
    }

    /// Total decompressed bytes, including any starting total.
    #[must_use]
    pub fn total_uncompressed(&self) -> u64 {
        self.uncompressed
    }

    /// Compressed bytes as currently known.
    #[must_use]
    pub fn total_compressed(&self) -> u64 {
        self.compressed.get()
    }

    /// The limit that tripped, if any.
    #[must_use]
    pub fn tripped(&self) -> Option<&DecompressionLimit> {
        self.tripped.as_ref()
    }

    /// Consumes the reader and returns the inner reader.
    #[must_use]
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn check(&mut self) -> Result<(), DecompressionLimit> {
        if self.uncompressed > self.max_bytes {
            return Err(DecompressionLimit::TotalBytes { max: self.max_bytes });
        }

        if self.uncompressed >= self.next_checkpoint {
            self.next_checkpoint = (self.uncompressed / self.chunk_size + 1) * self.chunk_size;
            let compressed = self.compressed.get();
            if compressed > 0 {
                let ratio = self.uncompressed as f64 / compressed as f64;
                if ratio > self.max_ratio {
                    return Err(DecompressionLimit::Ratio {
                        ratio,
                        max: self.max_ratio,
                    });
                }
            }
        }
        Ok(())
    }
}

impl<R: Read> Read for BoundedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(limit) = &self.tripped {
            return Err(io::Error::new(io::ErrorKind::InvalidData, limit.clone()));
        }

        let n = self.inner.read(buf)?;
        self.uncompressed = self.uncompressed.saturating_add(n as u64);

        if let Err(limit) = self.check() {
            tracing::warn!(
                security_event = "decompression_limit",
                uncompressed = self.uncompressed,
                compressed = self.compressed.get(),
                limit = %limit,
                "decompression stopped"
            );
            self.tripped = Some(limit.clone());
            return Err(io::Error::new(io::ErrorKind::InvalidData, limit));
        }
        Ok(n)
    }
}
