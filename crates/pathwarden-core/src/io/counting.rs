//! Counting reader for tracking compressed bytes consumed.
//!
//! A decompressor owns the reader it pulls from, so the count is kept in a
//! shared [`ByteCounter`] that the caller can still observe while the
//! decoder is running.

use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

/// Shared handle to a byte count.
#[derive(Debug, Clone, Default)]
pub struct ByteCounter(Arc<AtomicU64>);

impl ByteCounter {
    /// Bytes counted so far.
    #[must_use]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    fn add(&self, n: usize) {
        self.0.fetch_add(n as u64, Ordering::Relaxed);
    }
}

/// Wrapper reader that tracks total bytes read.
///
/// The counter only increments on successful reads.
///
/// # Examples
///
/// ```
/// use pathwarden_core::io::CountingReader;
/// use std::io::Read;
///
/// let mut reader = CountingReader::new(&b"Hello, World!"[..]);
/// let counter = reader.counter();
///
/// let mut out = String::new();
/// reader.read_to_string(&mut out)?;
/// assert_eq!(counter.get(), 13);
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct CountingReader<R> {
    inner: R,
    counter: ByteCounter,
}

impl<R> CountingReader<R> {
    /// Creates a new counting reader.
    #[must_use]
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            counter: ByteCounter::default(),
        }
    }

    /// A handle that stays valid after the reader is moved into a decoder.
    #[must_use]
    pub fn counter(&self) -> ByteCounter {
        self.counter.clone()
    }

    /// Returns the total number of bytes successfully read.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.counter.get()
    }

    /// Consumes the counting reader and returns the inner reader.
    #[must_use]
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.counter.add(n);
        Ok(n)
    }
}
