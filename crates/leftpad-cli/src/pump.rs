//! Moves bytes from an input stream through a session to an output stream.
//!
//! A writer task feeds the input into the session with blocking writes and
//! raises an end-of-input [`Interrupt`] when the input is exhausted. The
//! reader drains padded lines until that interrupt aborts a blocked read,
//! then empties whatever complete lines remain without blocking.

use anyhow::{Context, Result};
use leftpad_core::{Interrupt, IoMode, PadError, Session};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

const CHUNK: usize = 8192;

/// Byte counts for one completed pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpSummary {
    pub bytes_in: u64,
    pub bytes_out: u64,
    /// Bytes of an unterminated trailing line that were never emitted.
    pub discarded: usize,
    /// Bytes of an overlong trailing line that reached the output without a
    /// terminator.
    pub unterminated: usize,
}

/// Output bytes written since the last terminator.
#[derive(Debug, Default)]
struct Tail(usize);

impl Tail {
    fn observe(&mut self, bytes: &[u8]) {
        match bytes.iter().rposition(|&b| b == b'\n') {
            Some(pos) => self.0 = bytes.len() - pos - 1,
            None => self.0 += bytes.len(),
        }
    }
}

pub async fn run<R, W>(session: Arc<Session>, input: R, mut output: W) -> Result<PumpSummary>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin,
{
    let eof = Interrupt::new();
    let writer = {
        let session = session.clone();
        let eof = eof.clone();
        tokio::spawn(async move {
            let result = feed(&session, input).await;
            eof.raise();
            result
        })
    };

    let mut bytes_out = 0u64;
    let mut tail = Tail::default();
    loop {
        match session.read(CHUNK, IoMode::Blocking, &eof).await {
            Ok(bytes) => {
                output.write_all(&bytes).await.context("writing output")?;
                bytes_out += bytes.len() as u64;
                tail.observe(&bytes);
            }
            Err(PadError::Aborted) => break,
            Err(e) => return Err(e.into()),
        }
    }

    debug!(session_id = session.id(), "input exhausted, draining");
    let never = Interrupt::new();
    loop {
        match session.read(CHUNK, IoMode::NonBlocking, &never).await {
            Ok(bytes) => {
                output.write_all(&bytes).await.context("writing output")?;
                bytes_out += bytes.len() as u64;
                tail.observe(&bytes);
            }
            Err(PadError::WouldBlock) => break,
            Err(e) => return Err(e.into()),
        }
    }
    output.flush().await.context("flushing output")?;

    let bytes_in = writer.await.context("writer task failed")??;
    let stats = session.stats().await;
    let discarded = stats.occupied;
    if discarded > 0 {
        warn!(bytes = discarded, "discarding unterminated trailing line");
    }
    // An overlong line already streaming when input ended has no terminator.
    let unterminated = if stats.line_in_progress { tail.0 } else { 0 };
    if unterminated > 0 {
        warn!(bytes = unterminated, "emitted overlong trailing line without terminator");
    }
    Ok(PumpSummary {
        bytes_in,
        bytes_out,
        discarded,
        unterminated,
    })
}

async fn feed<R>(session: &Session, mut input: R) -> Result<u64>
where
    R: AsyncRead + Unpin,
{
    let never = Interrupt::new();
    let mut buf = vec![0u8; CHUNK];
    let mut total = 0u64;
    loop {
        let n = input.read(&mut buf).await.context("reading input")?;
        if n == 0 {
            return Ok(total);
        }
        session
            .write_all(&buf[..n], IoMode::Blocking, &never)
            .await?;
        total += n as u64;
    }
}
