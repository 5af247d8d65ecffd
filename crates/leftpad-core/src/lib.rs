//! leftpad-core: a byte pipe that left-pads every line.
//!
//! Writers append raw bytes into a bounded ring; the reader receives each
//! newline-terminated line preceded by enough fill bytes to reach the
//! configured width. Partial lines stay invisible until their terminator
//! arrives.

pub mod config;
pub mod device;
pub mod error;
pub mod interrupt;
pub mod line_index;
pub mod pad;
pub mod ring;
pub mod session;

// Re-export commonly used items at crate root.
pub use config::{SessionConfig, WIDTH_LIMIT};
pub use device::{Device, DeviceParams};
pub use error::{PadError, PadResult};
pub use interrupt::Interrupt;
pub use session::{IoMode, Session, SessionStats};
