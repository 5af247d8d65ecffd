//! Per-line padding state machine.
//!
//! The engine decides, for the line at the front of the [`LineIndex`], how
//! many fill bytes precede its content. The pad owed is fixed the first time
//! a read touches the line and never recomputed until the line's terminator
//! has been delivered, so reconfiguration cannot change an in-flight line.

use crate::line_index::LineIndex;
use crate::ring::RingStore;
use tracing::trace;

/// Padding state of the line currently being drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PadState {
    /// No line is being drained.
    #[default]
    Undetermined,
    /// A line is being drained; this many fill bytes are still owed before
    /// its content resumes.
    Remaining(usize),
}

/// One unit of output produced by [`PadEngine::next_chunk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunk {
    /// Emit this many copies of the fill byte.
    Pad(usize),
    /// Emit `len` buffered bytes starting at ring offset `offset`.
    /// `line_finished` is set when the chunk ends with the line's terminator.
    Content {
        offset: usize,
        len: usize,
        line_finished: bool,
    },
}

/// The line at the front of the ring, as seen by the engine.
#[derive(Debug, Clone, Copy)]
enum Front {
    /// A terminator is buffered `line_length` bytes past the cursor.
    Terminated { line_length: usize },
    /// No terminator is buffered but the line must drain anyway: either the
    /// ring filled up without one, or the line is already in progress.
    Overlong { buffered: usize },
}

#[derive(Debug, Default)]
pub struct PadEngine {
    state: PadState,
}

impl PadEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PadState {
        self.state
    }

    /// Whether a line has started draining and not yet been finished.
    pub fn is_mid_line(&self) -> bool {
        self.state != PadState::Undetermined
    }

    fn front(&self, ring: &RingStore, lines: &LineIndex) -> Option<Front> {
        if let Some(offset) = lines.front() {
            return Some(Front::Terminated {
                line_length: ring.distance_from_cursor(offset),
            });
        }
        if ring.is_full() || (self.is_mid_line() && !ring.is_empty()) {
            return Some(Front::Overlong {
                buffered: ring.peek_available(),
            });
        }
        None
    }

    /// Whether a read can make progress right now.
    pub fn can_proceed(&self, ring: &RingStore, lines: &LineIndex) -> bool {
        matches!(self.state, PadState::Remaining(n) if n > 0) || self.front(ring, lines).is_some()
    }

    /// Decide the next chunk of at most `requested_len` bytes.
    ///
    /// Returns `None` when no complete line is buffered (or `requested_len`
    /// is zero). The caller must consume a `Content` chunk from the ring and
    /// pop the line index when `line_finished` is set.
    pub fn next_chunk(
        &mut self,
        requested_len: usize,
        ring: &RingStore,
        lines: &LineIndex,
        width: usize,
    ) -> Option<Chunk> {
        if requested_len == 0 {
            return None;
        }
        let front = self.front(ring, lines)?;

        let remaining = match self.state {
            PadState::Undetermined => {
                let line_length = match front {
                    Front::Terminated { line_length } => line_length,
                    Front::Overlong { buffered } => buffered,
                };
                let pad = width.saturating_sub(line_length);
                trace!(line_length, width, pad, "line drain started");
                pad
            }
            PadState::Remaining(n) => n,
        };

        if remaining > 0 {
            let n = requested_len.min(remaining);
            self.state = PadState::Remaining(remaining - n);
            return Some(Chunk::Pad(n));
        }

        let (available, terminated) = match front {
            Front::Terminated { line_length } => (line_length + 1, true),
            Front::Overlong { buffered } => (buffered, false),
        };
        let len = requested_len.min(available);
        let line_finished = terminated && len == available;
        self.state = if line_finished {
            PadState::Undetermined
        } else {
            PadState::Remaining(0)
        };
        Some(Chunk::Content {
            offset: ring.cursor(),
            len,
            line_finished,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffered(capacity: usize, data: &[u8]) -> (RingStore, LineIndex) {
        let mut ring = RingStore::with_capacity(capacity).unwrap();
        let mut lines = LineIndex::new();
        let at = ring.append(data);
        lines.scan_appended(at, data, capacity);
        (ring, lines)
    }

    /// Drive the engine until the front line is finished, `step` bytes at a
    /// time, returning the rendered output.
    fn drain_line(
        engine: &mut PadEngine,
        ring: &mut RingStore,
        lines: &mut LineIndex,
        width: usize,
        step: usize,
    ) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = engine.next_chunk(step, ring, lines, width) {
            match chunk {
                Chunk::Pad(n) => out.extend(std::iter::repeat(b'-').take(n)),
                Chunk::Content {
                    len, line_finished, ..
                } => {
                    ring.consume_into(len, &mut out);
                    if line_finished {
                        lines.pop_front();
                        break;
                    }
                }
            }
        }
        out
    }

    #[test]
    fn pads_short_line() {
        let (mut ring, mut lines) = buffered(64, b"ab\n");
        let mut engine = PadEngine::new();
        assert_eq!(engine.next_chunk(10, &ring, &lines, 5), Some(Chunk::Pad(3)));
        assert_eq!(
            engine.next_chunk(7, &ring, &lines, 5),
            Some(Chunk::Content {
                offset: 0,
                len: 3,
                line_finished: true
            })
        );
        assert_eq!(engine.state(), PadState::Undetermined);
        ring.consume(3);
        lines.pop_front();
        assert_eq!(engine.next_chunk(10, &ring, &lines, 5), None);
    }

    #[test]
    fn zero_width_never_pads() {
        let (mut ring, mut lines) = buffered(64, b"hello\n");
        let mut engine = PadEngine::new();
        let out = drain_line(&mut engine, &mut ring, &mut lines, 0, 10);
        assert_eq!(out, b"hello\n");
    }

    #[test]
    fn long_line_is_not_padded() {
        let (mut ring, mut lines) = buffered(64, b"abcdef\n");
        let mut engine = PadEngine::new();
        let out = drain_line(&mut engine, &mut ring, &mut lines, 4, 100);
        assert_eq!(out, b"abcdef\n");
    }

    #[test]
    fn empty_line_gets_full_padding() {
        let (mut ring, mut lines) = buffered(64, b"\n");
        let mut engine = PadEngine::new();
        let out = drain_line(&mut engine, &mut ring, &mut lines, 4, 100);
        assert_eq!(out, b"----\n");
    }

    #[test]
    fn byte_at_a_time_matches_single_drain() {
        let (mut ring, mut lines) = buffered(64, b"xy\n");
        let mut engine = PadEngine::new();
        let small = drain_line(&mut engine, &mut ring, &mut lines, 6, 1);
        assert_eq!(small, b"----xy\n");
    }

    #[test]
    fn pad_fixed_when_drain_starts() {
        let (mut ring, mut lines) = buffered(64, b"ab\n");
        let mut engine = PadEngine::new();
        assert_eq!(engine.next_chunk(1, &ring, &lines, 5), Some(Chunk::Pad(1)));
        assert!(engine.is_mid_line());
        // A wider width on a later call does not change what is owed.
        let out = drain_line(&mut engine, &mut ring, &mut lines, 50, 100);
        assert_eq!(out, b"--ab\n");
    }

    #[test]
    fn waits_for_terminator() {
        let (ring, lines) = buffered(64, b"partial");
        let mut engine = PadEngine::new();
        assert!(!engine.can_proceed(&ring, &lines));
        assert_eq!(engine.next_chunk(10, &ring, &lines, 5), None);
        assert_eq!(engine.state(), PadState::Undetermined);
    }

    #[test]
    fn full_ring_without_terminator_drains_as_overlong() {
        let (mut ring, mut lines) = buffered(4, b"abcd");
        let mut engine = PadEngine::new();
        assert!(engine.can_proceed(&ring, &lines));
        assert_eq!(
            engine.next_chunk(10, &ring, &lines, 6),
            Some(Chunk::Pad(2))
        );
        assert_eq!(
            engine.next_chunk(10, &ring, &lines, 6),
            Some(Chunk::Content {
                offset: 0,
                len: 4,
                line_finished: false
            })
        );
        ring.consume(4);
        assert!(engine.is_mid_line());
        assert!(!engine.can_proceed(&ring, &lines));

        let at = ring.append(b"e\n");
        lines.scan_appended(at, b"e\n", 4);
        let out = drain_line(&mut engine, &mut ring, &mut lines, 6, 10);
        assert_eq!(out, b"e\n");
        assert!(!engine.is_mid_line());
    }
}
