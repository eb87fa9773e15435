use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bytes::BytesMut;
use focwire_registers::{encode_scalar, Catalog, Register, ScalarType, Value};
use serde::{Deserialize, Serialize};

use crate::binary::BinaryCodec;
use crate::error::{FrameError, Result};
use crate::frame::Frame;
use crate::text::{TextCodec, TextConfig};

/// Result of feeding one byte to a [`FrameCodec`].
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A complete inbound frame.
    Frame(Frame),
    /// The peer started a new session; answer with a SYNC frame.
    SyncRequest,
}

/// What was put on the wire for an outbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Echo {
    /// Text line, without the trailing newline.
    Line(String),
    Frame(Frame),
}

impl fmt::Display for Echo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Echo::Line(line) => f.write_str(line),
            Echo::Frame(frame) => write!(f, "{frame}"),
        }
    }
}

/// Incremental frame decoder plus encoder for one wire format.
///
/// Decoding is byte-at-a-time so the framer can resynchronise on any
/// boundary of a noisy stream. Encoding is stateless.
pub trait FrameCodec: Send {
    fn protocol(&self) -> Protocol;

    /// Consume one inbound byte.
    fn feed(&mut self, byte: u8) -> Option<Decoded>;

    /// Append the wire form of `frame` to `dst`.
    fn encode(&self, frame: &Frame, dst: &mut BytesMut) -> Result<Echo>;

    /// Whether the last completed frame was parsed at a confirmed boundary.
    fn in_sync(&self) -> bool;

    /// Drop buffered input and return to the initial state.
    fn reset(&mut self);

    fn catalog(&self) -> &Arc<Catalog>;

    /// Feed a slice and collect everything it completes.
    fn feed_all(&mut self, bytes: &[u8]) -> Vec<Decoded> {
        bytes.iter().filter_map(|b| self.feed(*b)).collect()
    }
}

/// Wire format selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Binary,
    #[serde(alias = "ascii")]
    Text,
}

impl Protocol {
    /// Build a codec for this format over `catalog`.
    pub fn codec(self, catalog: Arc<Catalog>) -> Box<dyn FrameCodec> {
        match self {
            Protocol::Binary => Box::new(BinaryCodec::new(catalog)),
            Protocol::Text => Box::new(TextCodec::new(catalog, TextConfig::default())),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Binary => f.write_str("binary"),
            Protocol::Text => f.write_str("text"),
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binary" => Ok(Protocol::Binary),
            "text" | "ascii" => Ok(Protocol::Text),
            other => Err(format!("unknown protocol '{other}' (expected binary or text)")),
        }
    }
}

/// Encode `values` against `types`, checking count, type and range.
///
/// An empty `values` is accepted for any layout and encodes nothing.
pub(crate) fn encode_values(
    register: &Register,
    types: &[ScalarType],
    values: &[Value],
    dst: &mut BytesMut,
) -> Result<()> {
    if values.is_empty() {
        return Ok(());
    }
    if values.len() != types.len() {
        return Err(FrameError::ValueCount {
            register: register.name.clone(),
            expected: types.len(),
            got: values.len(),
        });
    }
    for (ty, value) in types.iter().zip(values) {
        encode_scalar(*ty, value, dst)?;
    }
    Ok(())
}
