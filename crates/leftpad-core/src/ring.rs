//! Fixed-capacity circular byte storage.
//!
//! The live region is the `occupied` bytes starting at `cursor`, wrapping
//! modulo `capacity`. Appends land at `(cursor + occupied) % capacity` and
//! never overwrite unread bytes; consumes advance `cursor`.
//!
//! Every copy in or out is expressed as at most two non-overlapping ranges
//! of the backing array: the pre-wrap span and the post-wrap span.

use crate::error::{PadError, PadResult};
use std::ops::Range;

/// Where an append landed in the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Appended {
    /// Ring-relative offset of the first appended byte.
    pub offset: usize,
    /// Number of bytes appended.
    pub len: usize,
}

/// A bounded ring of bytes that refuses to overwrite unread data.
#[derive(Debug)]
pub struct RingStore {
    buf: Vec<u8>,
    cursor: usize,
    occupied: usize,
}

impl RingStore {
    /// Allocate a ring of `capacity` bytes.
    ///
    /// Allocation failure is reported as [`PadError::OutOfResources`] rather
    /// than aborting the process.
    pub fn with_capacity(capacity: usize) -> PadResult<Self> {
        if capacity == 0 {
            return Err(PadError::InvalidConfiguration(
                "buffer size must be positive".into(),
            ));
        }
        let mut buf = Vec::new();
        buf.try_reserve_exact(capacity)
            .map_err(|_| PadError::OutOfResources { requested: capacity })?;
        buf.resize(capacity, 0);
        Ok(Self {
            buf,
            cursor: 0,
            occupied: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Offset of the oldest unread byte.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of unread bytes currently held.
    pub fn peek_available(&self) -> usize {
        self.occupied
    }

    pub fn free(&self) -> usize {
        self.capacity() - self.occupied
    }

    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    pub fn is_full(&self) -> bool {
        self.occupied == self.capacity()
    }

    /// Logical distance from the cursor to a ring-relative offset.
    pub fn distance_from_cursor(&self, offset: usize) -> usize {
        let cap = self.capacity();
        (offset + cap - self.cursor) % cap
    }

    /// Split `len` bytes starting at `start` into the pre-wrap and post-wrap
    /// ranges of the backing array. The second range is empty when the span
    /// does not cross the end of the array.
    fn spans(&self, start: usize, len: usize) -> (Range<usize>, Range<usize>) {
        let cap = self.capacity();
        debug_assert!(start < cap && len <= cap);
        let first = len.min(cap - start);
        (start..start + first, 0..len - first)
    }

    /// Append `bytes` after the live region.
    ///
    /// # Panics
    /// Panics if `bytes.len()` exceeds [`free`](Self::free). Callers reserve
    /// space before appending.
    pub fn append(&mut self, bytes: &[u8]) -> Appended {
        assert!(
            bytes.len() <= self.free(),
            "append of {} bytes exceeds free space {}",
            bytes.len(),
            self.free()
        );
        let offset = (self.cursor + self.occupied) % self.capacity();
        let (head, tail) = self.spans(offset, bytes.len());
        let split = head.len();
        self.buf[head].copy_from_slice(&bytes[..split]);
        self.buf[tail].copy_from_slice(&bytes[split..]);
        self.occupied += bytes.len();
        Appended {
            offset,
            len: bytes.len(),
        }
    }

    /// Move up to `max_len` bytes from the front of the ring into `out`.
    ///
    /// Returns the number of bytes moved (`min(max_len, occupied)`).
    pub fn consume_into(&mut self, max_len: usize, out: &mut Vec<u8>) -> usize {
        let n = max_len.min(self.occupied);
        if n == 0 {
            return 0;
        }
        let (head, tail) = self.spans(self.cursor, n);
        out.extend_from_slice(&self.buf[head]);
        out.extend_from_slice(&self.buf[tail]);
        self.cursor = (self.cursor + n) % self.capacity();
        self.occupied -= n;
        n
    }

    /// Remove and return up to `max_len` bytes from the front of the ring.
    pub fn consume(&mut self, max_len: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(max_len.min(self.occupied));
        self.consume_into(max_len, &mut out);
        out
    }
}
