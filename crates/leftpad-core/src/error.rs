use std::io;
use thiserror::Error;

/// Errors produced by a padding session.
///
/// Every variant is local to the call that produced it. None of them leave
/// the session in a partially mutated state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PadError {
    #[error("out of resources: cannot allocate a {requested} byte buffer")]
    OutOfResources { requested: usize },

    #[error("operation would block")]
    WouldBlock,

    #[error("operation aborted")]
    Aborted,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("session {0} was not opened by this device")]
    UnknownSession(u64),
}

impl From<PadError> for io::Error {
    fn from(e: PadError) -> Self {
        let kind = match &e {
            PadError::OutOfResources { .. } => io::ErrorKind::OutOfMemory,
            PadError::WouldBlock => io::ErrorKind::WouldBlock,
            PadError::Aborted => io::ErrorKind::Interrupted,
            PadError::InvalidConfiguration(_) => io::ErrorKind::InvalidInput,
            PadError::UnknownSession(_) => io::ErrorKind::NotFound,
        };
        io::Error::new(kind, e)
    }
}

pub type PadResult<T> = Result<T, PadError>;
