//! FIFO of newline offsets within the ring's address space.

use crate::ring::Appended;
use std::collections::VecDeque;

/// Line terminator byte.
pub const TERMINATOR: u8 = b'\n';

/// Ring-relative offsets of the terminators currently buffered, oldest first.
#[derive(Debug, Default)]
pub struct LineIndex {
    offsets: VecDeque<usize>,
}

impl LineIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a terminator discovered at `offset`.
    pub fn record_terminator(&mut self, offset: usize) {
        self.offsets.push_back(offset);
    }

    /// Scan freshly appended bytes and record every terminator among them,
    /// left to right. Returns how many were found.
    ///
    /// Only the bytes of this append are scanned, never older history.
    pub fn scan_appended(&mut self, at: Appended, bytes: &[u8], capacity: usize) -> usize {
        debug_assert_eq!(at.len, bytes.len());
        let before = self.offsets.len();
        for (i, &b) in bytes.iter().enumerate() {
            if b == TERMINATOR {
                self.record_terminator((at.offset + i) % capacity);
            }
        }
        self.offsets.len() - before
    }

    /// Offset of the oldest buffered terminator.
    pub fn front(&self) -> Option<usize> {
        self.offsets.front().copied()
    }

    /// Drop the oldest terminator once its line has been fully delivered.
    pub fn pop_front(&mut self) -> Option<usize> {
        self.offsets.pop_front()
    }

    /// Number of complete lines buffered.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}
