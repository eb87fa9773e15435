//! Serial byte-stream transport abstraction.
//!
//! The protocol layers above only need a handful of capabilities from the
//! wire: open/close, a "bytes available" query, non-blocking-ish reads and
//! blocking writes. [`SerialLink`] captures exactly that.
//!
//! - [`SerialPortLink`] drives a real port (feature `serial`, default).
//! - [`MemoryLink`] is an in-process stand-in used by tests and simulators.

pub mod error;
pub mod memory;
#[cfg(feature = "serial")]
pub mod serial;
pub mod traits;

pub use error::{Result, TransportError};
pub use memory::{MemoryLink, MemoryLinkHandle};
#[cfg(feature = "serial")]
pub use serial::{SerialConfig, SerialPortLink};
pub use traits::SerialLink;
