//! Frame model and wire framers for the focwire packet protocol.
//!
//! A [`Frame`] is one protocol message: a register write or read request,
//! a register response, a telemetry sample or header, a sync marker, or an
//! alert. Two interchangeable framers put frames on the wire:
//!
//! - [`BinaryCodec`]: `0xA5 LENGTH TYPE PAYLOAD`, little-endian scalars,
//!   resynchronising on the next marker after any corruption
//! - [`TextCodec`]: one ASCII line per frame, such as `R8=12.5`
//!
//! Both decode byte-at-a-time through the [`FrameCodec`] trait so a reader
//! thread can feed whatever the serial port delivered.

pub mod binary;
pub mod codec;
pub mod error;
pub mod frame;
pub mod text;

pub use binary::{BinaryCodec, MARKER, MAX_FRAME_LENGTH};
pub use codec::{Decoded, Echo, FrameCodec, Protocol};
pub use error::{FrameError, Result};
pub use frame::{Frame, FrameType, TelemetryPayload, MAX_TELEMETRY_IDS};
pub use text::{parse_value, TextCodec, TextConfig, DEFAULT_MAX_LINE_LENGTH};
