//! Session controller.
//!
//! A [`Session`] owns one ring, its line index and its pad engine behind a
//! single lock. Writers suspend while the ring is full and readers suspend
//! while no line can be drained; each side wakes the other after mutating
//! the shared state. Suspended calls release the lock and can be aborted
//! through an [`Interrupt`].

use crate::config::SessionConfig;
use crate::error::{PadError, PadResult};
use crate::interrupt::Interrupt;
use crate::line_index::LineIndex;
use crate::pad::{Chunk, PadEngine};
use crate::ring::RingStore;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, MutexGuard, Notify};
use tracing::{debug, info, trace, warn};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Whether a call may suspend when it cannot make progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoMode {
    Blocking,
    NonBlocking,
}

/// Point-in-time counters for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub capacity: usize,
    pub occupied: usize,
    pub buffered_lines: usize,
    /// Raw bytes accepted from writers.
    pub bytes_written: u64,
    /// Buffered bytes delivered to the reader (fill bytes excluded).
    pub bytes_read: u64,
    /// Fill bytes delivered to the reader.
    pub pad_bytes: u64,
    pub line_in_progress: bool,
}

/// State guarded by the session lock.
#[derive(Debug)]
struct Channel {
    ring: RingStore,
    lines: LineIndex,
    engine: PadEngine,
    config: SessionConfig,
    bytes_written: u64,
    bytes_read: u64,
    pad_bytes: u64,
}

impl Channel {
    /// Append as much of `bytes` as fits and index its terminators.
    /// Returns `(accepted, terminators_found)`.
    fn append(&mut self, bytes: &[u8]) -> (usize, usize) {
        let accepted = &bytes[..bytes.len().min(self.ring.free())];
        let at = self.ring.append(accepted);
        let found = self
            .lines
            .scan_appended(at, accepted, self.ring.capacity());
        self.bytes_written += accepted.len() as u64;
        (accepted.len(), found)
    }

    /// Render up to `max_len` bytes of the front line, stopping after its
    /// terminator. Returns the output and how many ring bytes were freed.
    fn drain_line(&mut self, max_len: usize) -> (Vec<u8>, usize) {
        let mut out = Vec::with_capacity(max_len.min(self.config.width + self.ring.peek_available()));
        let mut freed = 0;

        while out.len() < max_len {
            let Some(chunk) =
                self.engine
                    .next_chunk(max_len - out.len(), &self.ring, &self.lines, self.config.width)
            else {
                break;
            };
            match chunk {
                Chunk::Pad(n) => {
                    out.resize(out.len() + n, self.config.fill);
                    self.pad_bytes += n as u64;
                }
                Chunk::Content {
                    offset,
                    len,
                    line_finished,
                } => {
                    debug_assert_eq!(offset, self.ring.cursor());
                    freed += self.ring.consume_into(len, &mut out);
                    if line_finished {
                        self.lines.pop_front();
                        break;
                    }
                }
            }
        }

        self.bytes_read += freed as u64;
        (out, freed)
    }

    fn stats(&self) -> SessionStats {
        SessionStats {
            capacity: self.ring.capacity(),
            occupied: self.ring.peek_available(),
            buffered_lines: self.lines.len(),
            bytes_written: self.bytes_written,
            bytes_read: self.bytes_read,
            pad_bytes: self.pad_bytes,
            line_in_progress: self.engine.is_mid_line(),
        }
    }
}

/// One producer/consumer padding channel.
#[derive(Debug)]
pub struct Session {
    id: u64,
    /// Id of the [`Device`](crate::Device) that opened this session, if any.
    device: Option<u64>,
    channel: Mutex<Channel>,
    /// Signaled after a read frees ring space.
    space_freed: Notify,
    /// Signaled after a write appends bytes.
    line_ready: Notify,
}

impl Session {
    /// Open a session with a ring of `capacity` bytes.
    pub fn open(capacity: usize, config: SessionConfig) -> PadResult<Self> {
        config.validate()?;
        let ring = RingStore::with_capacity(capacity)?;
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        info!(
            session_id = id,
            capacity,
            width = config.width,
            fill = config.fill,
            "session opened"
        );
        Ok(Self {
            id,
            device: None,
            channel: Mutex::new(Channel {
                ring,
                lines: LineIndex::new(),
                engine: PadEngine::new(),
                config,
                bytes_written: 0,
                bytes_read: 0,
                pad_bytes: 0,
            }),
            space_freed: Notify::new(),
            line_ready: Notify::new(),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn device_id(&self) -> Option<u64> {
        self.device
    }

    pub(crate) fn bind_device(&mut self, device_id: u64) {
        self.device = Some(device_id);
    }

    /// Acquire the session lock unless interrupted while waiting for it.
    async fn lock(&self, interrupt: &Interrupt) -> PadResult<MutexGuard<'_, Channel>> {
        tokio::select! {
            biased;
            guard = self.channel.lock() => Ok(guard),
            _ = interrupt.raised() => Err(PadError::Aborted),
        }
    }

    /// Append bytes, returning how many were accepted.
    ///
    /// Accepts at most the ring's free space (a short write); the caller
    /// retries with the remainder. When the ring is full this suspends until
    /// a read frees space, or fails with [`PadError::WouldBlock`] in
    /// [`IoMode::NonBlocking`].
    pub async fn write(&self, bytes: &[u8], mode: IoMode, interrupt: &Interrupt) -> PadResult<usize> {
        if bytes.is_empty() {
            return Ok(0);
        }
        loop {
            let space_freed = self.space_freed.notified();
            tokio::pin!(space_freed);
            space_freed.as_mut().enable();

            let mut channel = self.lock(interrupt).await?;
            if channel.ring.free() > 0 {
                let (accepted, found) = channel.append(bytes);
                drop(channel);
                trace!(session_id = self.id, bytes = accepted, lines = found, "appended");
                self.line_ready.notify_waiters();
                return Ok(accepted);
            }
            drop(channel);

            if mode == IoMode::NonBlocking {
                return Err(PadError::WouldBlock);
            }
            debug!(session_id = self.id, "writer waiting for space");
            tokio::select! {
                biased;
                _ = interrupt.raised() => {
                    debug!(session_id = self.id, "blocked write aborted");
                    return Err(PadError::Aborted);
                }
                _ = space_freed => {}
            }
        }
    }

    /// Write the whole slice, retrying short writes.
    ///
    /// Bytes accepted before an error stay committed.
    pub async fn write_all(&self, mut bytes: &[u8], mode: IoMode, interrupt: &Interrupt) -> PadResult<()> {
        while !bytes.is_empty() {
            let n = self.write(bytes, mode, interrupt).await?;
            bytes = &bytes[n..];
        }
        Ok(())
    }

    /// Read up to `max_len` bytes of padded output.
    ///
    /// A call delivers at most one line: it returns after the line's
    /// terminator even if `max_len` is not exhausted. When no complete line
    /// is buffered this suspends until one arrives, or fails with
    /// [`PadError::WouldBlock`] in [`IoMode::NonBlocking`].
    pub async fn read(&self, max_len: usize, mode: IoMode, interrupt: &Interrupt) -> PadResult<Vec<u8>> {
        if max_len == 0 {
            return Ok(Vec::new());
        }
        loop {
            let line_ready = self.line_ready.notified();
            tokio::pin!(line_ready);
            line_ready.as_mut().enable();

            let mut channel = self.lock(interrupt).await?;
            if channel.engine.can_proceed(&channel.ring, &channel.lines) {
                let (out, freed) = channel.drain_line(max_len);
                drop(channel);
                trace!(session_id = self.id, bytes = out.len(), freed, "drained");
                if freed > 0 {
                    self.space_freed.notify_waiters();
                }
                return Ok(out);
            }
            drop(channel);

            if mode == IoMode::NonBlocking {
                return Err(PadError::WouldBlock);
            }
            debug!(session_id = self.id, "reader waiting for a line");
            tokio::select! {
                biased;
                _ = interrupt.raised() => {
                    debug!(session_id = self.id, "blocked read aborted");
                    return Err(PadError::Aborted);
                }
                _ = line_ready => {}
            }
        }
    }

    /// Replace width and fill for lines that have not started draining.
    ///
    /// Rejected with [`PadError::InvalidConfiguration`] while a line is being
    /// drained; the session stays usable either way.
    pub async fn reconfigure(&self, config: SessionConfig) -> PadResult<()> {
        config.validate()?;
        let mut channel = self.channel.lock().await;
        if channel.engine.is_mid_line() {
            warn!(session_id = self.id, "reconfiguration rejected mid-line");
            return Err(PadError::InvalidConfiguration(
                "cannot reconfigure while a line is being drained".into(),
            ));
        }
        debug!(
            session_id = self.id,
            width = config.width,
            fill = config.fill,
            "session reconfigured"
        );
        channel.config = config;
        Ok(())
    }

    pub async fn config(&self) -> SessionConfig {
        self.channel.lock().await.config
    }

    pub async fn stats(&self) -> SessionStats {
        self.channel.lock().await.stats()
    }

    /// Release the session. Consuming `self` makes a second close impossible.
    pub fn close(self) {
        let stats = self.channel.into_inner().stats();
        info!(
            session_id = self.id,
            bytes_written = stats.bytes_written,
            bytes_read = stats.bytes_read,
            discarded = stats.occupied,
            "session closed"
        );
    }
}
