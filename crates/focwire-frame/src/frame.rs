use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use focwire_registers::{Register, Value};
use serde::{Deserialize, Serialize};

/// Number of independent telemetry slots on the device.
pub const MAX_TELEMETRY_IDS: usize = 8;

/// Frame kind, with its one-byte wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameType {
    Register,
    Response,
    Telemetry,
    Header,
    Sync,
    Alert,
}

impl FrameType {
    pub const fn tag(self) -> u8 {
        match self {
            FrameType::Register => b'R',
            FrameType::Response => b'r',
            FrameType::Telemetry => b'T',
            FrameType::Header => b'H',
            FrameType::Sync => b'S',
            FrameType::Alert => b'A',
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'R' => Some(FrameType::Register),
            b'r' => Some(FrameType::Response),
            b'T' => Some(FrameType::Telemetry),
            b'H' => Some(FrameType::Header),
            b'S' => Some(FrameType::Sync),
            b'A' => Some(FrameType::Alert),
            _ => None,
        }
    }
}

/// Telemetry values as carried by a frame.
///
/// Binary telemetry arrives as raw bytes that can only be decoded against
/// the matching header. Text telemetry is already typed by its literals.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryPayload {
    Raw(Bytes),
    Values(Vec<Value>),
}

/// One complete protocol message.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Register write, or read request when `values` is empty.
    Register {
        register: Arc<Register>,
        values: Vec<Value>,
    },
    /// Register value reported by the device.
    Response {
        register: Arc<Register>,
        values: Vec<Value>,
    },
    Telemetry {
        telemetry_id: u8,
        payload: TelemetryPayload,
    },
    /// Decode schema for a telemetry slot: `(register, motor_id)` pairs.
    ///
    /// Binary headers carry no slot id on the wire.
    Header {
        telemetry_id: Option<u8>,
        registers: Vec<(Arc<Register>, u8)>,
    },
    /// Peer synchronisation state.
    Sync { in_sync: bool },
    Alert { message: String },
}

impl Frame {
    /// Read request for `register`.
    pub fn read(register: Arc<Register>) -> Self {
        Frame::Register {
            register,
            values: Vec::new(),
        }
    }

    /// Write of `values` to `register`.
    pub fn write(register: Arc<Register>, values: Vec<Value>) -> Self {
        Frame::Register { register, values }
    }

    pub fn frame_type(&self) -> FrameType {
        match self {
            Frame::Register { .. } => FrameType::Register,
            Frame::Response { .. } => FrameType::Response,
            Frame::Telemetry { .. } => FrameType::Telemetry,
            Frame::Header { .. } => FrameType::Header,
            Frame::Sync { .. } => FrameType::Sync,
            Frame::Alert { .. } => FrameType::Alert,
        }
    }

    /// Register of a REGISTER or RESPONSE frame.
    pub fn register(&self) -> Option<&Arc<Register>> {
        match self {
            Frame::Register { register, .. } | Frame::Response { register, .. } => Some(register),
            _ => None,
        }
    }

    /// Values of a REGISTER or RESPONSE frame, or decoded telemetry.
    pub fn values(&self) -> Option<&[Value]> {
        match self {
            Frame::Register { values, .. } | Frame::Response { values, .. } => Some(values),
            Frame::Telemetry {
                payload: TelemetryPayload::Values(values),
                ..
            } => Some(values),
            _ => None,
        }
    }
}

fn join_values(f: &mut fmt::Formatter<'_>, values: &[Value]) -> fmt::Result {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{value}")?;
    }
    Ok(())
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Register { register, values } if values.is_empty() => {
                write!(f, "R {register}?")
            }
            Frame::Register { register, values } => {
                write!(f, "R {register}=")?;
                join_values(f, values)
            }
            Frame::Response { register, values } => {
                write!(f, "r {register}=")?;
                join_values(f, values)
            }
            Frame::Telemetry {
                telemetry_id,
                payload: TelemetryPayload::Values(values),
            } => {
                write!(f, "T {telemetry_id}=")?;
                join_values(f, values)
            }
            Frame::Telemetry {
                telemetry_id,
                payload: TelemetryPayload::Raw(raw),
            } => write!(f, "T {telemetry_id}=<{} raw bytes>", raw.len()),
            Frame::Header {
                telemetry_id,
                registers,
            } => {
                match telemetry_id {
                    Some(id) => write!(f, "H {id}=")?,
                    None => f.write_str("H ?=")?,
                }
                for (i, (register, motor)) in registers.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}:{motor}", register.short_name())?;
                }
                Ok(())
            }
            Frame::Sync { in_sync } => write!(f, "S {}", u8::from(*in_sync)),
            Frame::Alert { message } => write!(f, "A {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use focwire_registers::{builtin, Catalog};

    use super::*;

    #[test]
    fn type_tags_roundtrip() {
        for ty in [
            FrameType::Register,
            FrameType::Response,
            FrameType::Telemetry,
            FrameType::Header,
            FrameType::Sync,
            FrameType::Alert,
        ] {
            assert_eq!(FrameType::from_tag(ty.tag()), Some(ty));
        }
        assert_eq!(FrameType::from_tag(b'x'), None);
    }

    #[test]
    fn accessors() {
        let catalog = Catalog::builtin();
        let target = catalog.lookup_by_id(builtin::TARGET).unwrap();
        let frame = Frame::write(Arc::clone(&target), vec![Value::Float(1.5)]);

        assert_eq!(frame.frame_type(), FrameType::Register);
        assert_eq!(frame.register(), Some(&target));
        assert_eq!(frame.values(), Some(&[Value::Float(1.5)][..]));
        assert!(Frame::Sync { in_sync: true }.register().is_none());
    }

    #[test]
    fn display_is_compact() {
        let catalog = Catalog::builtin();
        let target = catalog.lookup_by_id(builtin::TARGET).unwrap();
        assert_eq!(Frame::read(Arc::clone(&target)).to_string(), "R REG_TARGET?");
        assert_eq!(
            Frame::Response {
                register: target,
                values: vec![Value::Float(2.0)]
            }
            .to_string(),
            "r REG_TARGET=2.0"
        );
        assert_eq!(
            Frame::Telemetry {
                telemetry_id: 1,
                payload: TelemetryPayload::Raw(Bytes::from_static(&[0, 1, 2]))
            }
            .to_string(),
            "T 1=<3 raw bytes>"
        );
    }
}
