//! Session lifecycle: a device template from which sessions are opened.
//!
//! Each session copies the device parameters at open time; changing one
//! session's configuration never affects another.

use crate::config::{SessionConfig, DEFAULT_BUFFER_SIZE, DEFAULT_FILL, DEFAULT_WIDTH};
use crate::error::{PadError, PadResult};
use crate::session::Session;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, info, warn};

static NEXT_DEVICE_ID: AtomicU64 = AtomicU64::new(1);

/// Parameters applied to every session opened from a [`Device`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DeviceParams {
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_fill")]
    pub fill: u8,
}

impl DeviceParams {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            width: self.width,
            fill: self.fill,
        }
    }

    pub fn validate(&self) -> PadResult<()> {
        if self.buffer_size == 0 {
            return Err(PadError::InvalidConfiguration(
                "buffer size must be positive".into(),
            ));
        }
        self.session_config().validate()
    }
}

impl Default for DeviceParams {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            width: default_width(),
            fill: default_fill(),
        }
    }
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}
fn default_width() -> usize {
    DEFAULT_WIDTH
}
fn default_fill() -> u8 {
    DEFAULT_FILL
}

/// Opens and releases sessions, counting the ones still open.
#[derive(Debug)]
pub struct Device {
    id: u64,
    name: String,
    params: DeviceParams,
    open_sessions: AtomicUsize,
}

impl Device {
    /// Create a device after validating its parameters.
    pub fn new(name: impl Into<String>, params: DeviceParams) -> PadResult<Self> {
        params.validate()?;
        let name = name.into();
        info!(
            device = %name,
            buffer_size = params.buffer_size,
            width = params.width,
            fill = params.fill,
            "device created"
        );
        Ok(Self {
            id: NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed),
            name,
            params,
            open_sessions: AtomicUsize::new(0),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> DeviceParams {
        self.params
    }

    /// Open a new session. No count is taken if allocation fails.
    pub fn open(&self) -> PadResult<Session> {
        let mut session = Session::open(self.params.buffer_size, self.params.session_config())?;
        session.bind_device(self.id);
        let open = self.open_sessions.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(device = %self.name, session_id = session.id(), open, "session attached");
        Ok(session)
    }

    /// Close a session opened from this device.
    ///
    /// The session is closed either way; a session opened elsewhere is
    /// reported as [`PadError::UnknownSession`] and leaves the count alone.
    pub fn release(&self, session: Session) -> PadResult<()> {
        let id = session.id();
        let owned = session.device_id() == Some(self.id);
        session.close();
        if !owned {
            warn!(device = %self.name, session_id = id, "release of foreign session");
            return Err(PadError::UnknownSession(id));
        }
        let prev = self
            .open_sessions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .map_err(|_| PadError::UnknownSession(id))?;
        debug!(device = %self.name, session_id = id, open = prev - 1, "session released");
        Ok(())
    }

    /// Number of sessions opened and not yet released.
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }
}
