use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use focwire_registers::{decode_layout, Catalog, Register, RegisterError};
use tracing::{debug, trace, warn};

use crate::codec::{encode_values, Decoded, Echo, FrameCodec, Protocol};
use crate::error::{FrameError, Result};
use crate::frame::{Frame, FrameType, TelemetryPayload};

/// Start-of-frame marker.
pub const MARKER: u8 = 0xA5;

/// Largest value of the one-byte length field.
pub const MAX_FRAME_LENGTH: usize = u8::MAX as usize;

/// Marker-delimited binary framer.
///
/// Wire format:
/// ```text
/// ┌──────────┬──────────┬──────────┬──────────────────────┐
/// │ Marker   │ Length   │ Type     │ Payload              │
/// │ 0xA5     │ (1B)     │ (1B tag) │ (Length - 1 bytes)   │
/// └──────────┴──────────┴──────────┴──────────────────────┘
/// ```
///
/// `Length` counts the bytes after the length byte. A frame is only
/// accepted once the next marker arrives exactly where the length said the
/// frame ends, so the decoder always lags one frame behind the wire. Marker
/// bytes inside payloads are not escaped; a collision costs a resync.
#[derive(Debug)]
pub struct BinaryCodec {
    catalog: Arc<Catalog>,
    expected: usize,
    buffer: BytesMut,
    awaiting_length: bool,
    in_sync: bool,
}

impl BinaryCodec {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            expected: 0,
            buffer: BytesMut::with_capacity(MAX_FRAME_LENGTH),
            awaiting_length: false,
            in_sync: false,
        }
    }

    fn start_frame(&mut self) {
        self.expected = 0;
        self.buffer.clear();
        self.awaiting_length = true;
        self.in_sync = false;
    }

    fn complete(&mut self) -> Option<Frame> {
        let parsed = self.parse(&self.buffer);
        self.expected = 0;
        self.buffer.clear();
        self.awaiting_length = true;

        match parsed {
            Ok(frame) => {
                self.in_sync = true;
                trace!(frame = %frame, "binary frame decoded");
                Some(frame)
            }
            Err(FrameError::Register(RegisterError::UnknownRegister(register))) => {
                self.in_sync = true;
                warn!(register = %register, "dropping frame for unknown register");
                None
            }
            Err(err) => {
                self.in_sync = false;
                warn!(error = %err, "dropping malformed binary frame");
                None
            }
        }
    }

    fn lookup(&self, id: u8) -> Result<Arc<Register>> {
        self.catalog
            .lookup_by_id(id)
            .ok_or_else(|| RegisterError::UnknownRegister(format!("0x{id:02X}")).into())
    }

    /// Parse a complete `TYPE PAYLOAD` buffer.
    fn parse(&self, buf: &[u8]) -> Result<Frame> {
        let (&tag, payload) = buf
            .split_first()
            .ok_or_else(|| FrameError::Malformed("empty frame".to_string()))?;
        let frame_type = FrameType::from_tag(tag)
            .ok_or_else(|| FrameError::Malformed(format!("unknown frame type 0x{tag:02X}")))?;

        match frame_type {
            FrameType::Register | FrameType::Response => {
                let (&id, data) = payload
                    .split_first()
                    .ok_or_else(|| FrameError::Malformed("missing register id".to_string()))?;
                let register = self.lookup(id)?;
                let types = if frame_type == FrameType::Register {
                    &register.write_types
                } else {
                    &register.read_types
                };
                let values = if data.is_empty() {
                    Vec::new()
                } else {
                    decode_layout(types, data)
                };
                Ok(if frame_type == FrameType::Register {
                    Frame::Register { register, values }
                } else {
                    Frame::Response { register, values }
                })
            }
            FrameType::Telemetry => {
                let (&telemetry_id, raw) = payload
                    .split_first()
                    .ok_or_else(|| FrameError::Malformed("missing telemetry id".to_string()))?;
                Ok(Frame::Telemetry {
                    telemetry_id,
                    payload: TelemetryPayload::Raw(Bytes::copy_from_slice(raw)),
                })
            }
            FrameType::Header => {
                let (&count, pairs) = payload
                    .split_first()
                    .ok_or_else(|| FrameError::Malformed("missing header count".to_string()))?;
                if pairs.len() != usize::from(count) * 2 {
                    return Err(FrameError::Malformed(format!(
                        "header declares {count} register(s) but carries {} byte(s)",
                        pairs.len()
                    )));
                }
                let registers = pairs
                    .chunks_exact(2)
                    .map(|pair| Ok((self.lookup(pair[0])?, pair[1])))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Frame::Header {
                    telemetry_id: None,
                    registers,
                })
            }
            FrameType::Sync => {
                let state = payload
                    .first()
                    .ok_or_else(|| FrameError::Malformed("missing sync state".to_string()))?;
                Ok(Frame::Sync {
                    in_sync: *state != 0,
                })
            }
            FrameType::Alert => {
                if !payload.is_ascii() {
                    return Err(FrameError::Malformed("alert is not ASCII".to_string()));
                }
                Ok(Frame::Alert {
                    message: String::from_utf8_lossy(payload).into_owned(),
                })
            }
        }
    }
}

impl FrameCodec for BinaryCodec {
    fn protocol(&self) -> Protocol {
        Protocol::Binary
    }

    fn feed(&mut self, byte: u8) -> Option<Decoded> {
        if byte == MARKER {
            if self.expected == 0 && !self.awaiting_length {
                self.start_frame();
                return None;
            }
            if self.expected > 0 && self.buffer.len() == self.expected {
                return self.complete().map(Decoded::Frame);
            }
            debug!(
                expected = self.expected,
                buffered = self.buffer.len(),
                "marker inside frame, resynchronising"
            );
            self.start_frame();
            return None;
        }

        if self.awaiting_length {
            self.expected = usize::from(byte);
            self.buffer.clear();
            self.awaiting_length = false;
            return None;
        }

        if self.expected == 0 {
            // Hunting for a marker.
            return None;
        }

        if self.buffer.len() == self.expected {
            debug!(expected = self.expected, "frame overrun, resynchronising");
            self.expected = 0;
            self.buffer.clear();
            self.in_sync = false;
            return None;
        }

        self.buffer.put_u8(byte);
        None
    }

    fn encode(&self, frame: &Frame, dst: &mut BytesMut) -> Result<Echo> {
        let mut body = BytesMut::with_capacity(16);
        body.put_u8(frame.frame_type().tag());

        match frame {
            Frame::Register { register, values } => {
                body.put_u8(register.id);
                encode_values(register, &register.write_types, values, &mut body)?;
            }
            Frame::Response { register, values } => {
                body.put_u8(register.id);
                encode_values(register, &register.read_types, values, &mut body)?;
            }
            Frame::Telemetry {
                telemetry_id,
                payload,
            } => match payload {
                TelemetryPayload::Raw(raw) => {
                    body.put_u8(*telemetry_id);
                    body.put_slice(raw);
                }
                TelemetryPayload::Values(_) => {
                    return Err(FrameError::Unencodable(
                        "binary telemetry carries raw bytes only".to_string(),
                    ))
                }
            },
            Frame::Header { registers, .. } => {
                let count = u8::try_from(registers.len()).map_err(|_| {
                    FrameError::PayloadTooLarge {
                        size: 2 + registers.len() * 2,
                        max: MAX_FRAME_LENGTH,
                    }
                })?;
                body.put_u8(count);
                for (register, motor) in registers {
                    body.put_u8(register.id);
                    body.put_u8(*motor);
                }
            }
            Frame::Sync { in_sync } => body.put_u8(u8::from(*in_sync)),
            Frame::Alert { message } => {
                if !message.is_ascii() {
                    return Err(FrameError::Unencodable("alert is not ASCII".to_string()));
                }
                body.put_slice(message.as_bytes());
            }
        }

        if body.len() > MAX_FRAME_LENGTH {
            return Err(FrameError::PayloadTooLarge {
                size: body.len(),
                max: MAX_FRAME_LENGTH,
            });
        }

        dst.reserve(2 + body.len());
        dst.put_u8(MARKER);
        dst.put_u8(body.len() as u8);
        dst.put_slice(&body);
        Ok(Echo::Frame(frame.clone()))
    }

    fn in_sync(&self) -> bool {
        self.in_sync
    }

    fn reset(&mut self) {
        self.expected = 0;
        self.buffer.clear();
        self.awaiting_length = false;
        self.in_sync = false;
    }

    fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }
}

#[cfg(test)]
mod tests {
    use focwire_registers::{builtin, ScalarType, Value};

    use super::*;

    fn codec() -> BinaryCodec {
        BinaryCodec::new(Arc::new(Catalog::builtin()))
    }

    fn register(codec: &BinaryCodec, id: u8) -> Arc<Register> {
        codec.catalog().lookup_by_id(id).unwrap()
    }

    fn frames(decoded: Vec<Decoded>) -> Vec<Frame> {
        decoded
            .into_iter()
            .map(|d| match d {
                Decoded::Frame(frame) => frame,
                Decoded::SyncRequest => panic!("binary codec never requests sync"),
            })
            .collect()
    }

    fn target_write() -> Vec<u8> {
        let mut wire = vec![MARKER, 0x06, b'R', 0x08];
        wire.extend_from_slice(&12.5f32.to_le_bytes());
        wire
    }

    #[test]
    fn encode_register_write() {
        let codec = codec();
        let target = register(&codec, builtin::TARGET);
        let mut dst = BytesMut::new();

        let echo = codec
            .encode(&Frame::write(target, vec![Value::Float(12.5)]), &mut dst)
            .unwrap();

        assert_eq!(&dst[..], &target_write()[..]);
        assert!(matches!(echo, Echo::Frame(Frame::Register { .. })));
    }

    #[test]
    fn encode_read_request_has_no_values() {
        let codec = codec();
        let velocity = register(&codec, builtin::VELOCITY);
        let mut dst = BytesMut::new();
        codec.encode(&Frame::read(velocity), &mut dst).unwrap();
        assert_eq!(&dst[..], &[MARKER, 0x02, b'R', 0x11]);
    }

    #[test]
    fn frame_is_emitted_on_next_marker() {
        let mut codec = codec();
        assert!(codec.feed_all(&target_write()).is_empty());

        let decoded = frames(codec.feed_all(&[MARKER]));
        assert_eq!(decoded.len(), 1);
        match &decoded[0] {
            Frame::Register { register, values } => {
                assert_eq!(register.id, builtin::TARGET);
                assert_eq!(values, &vec![Value::Float(12.5)]);
            }
            other => panic!("unexpected frame: {other:?}"),
        }
        assert!(codec.in_sync());
    }

    #[test]
    fn garbage_then_frame_yields_exactly_one_frame() {
        let mut codec = codec();
        let mut wire = vec![0x00, 0x13, 0x37, b'R', 0x06, 0xFF];
        wire.extend(target_write());
        wire.push(MARKER);

        let decoded = frames(codec.feed_all(&wire));
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].register().unwrap().id, builtin::TARGET);
        assert!(codec.in_sync());
    }

    #[test]
    fn back_to_back_frames_decode_in_order() {
        let mut codec = codec();
        let mut wire = target_write();
        wire.extend([MARKER, 0x02, b'S', 0x01]);
        wire.push(MARKER);

        let decoded = frames(codec.feed_all(&wire));
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].frame_type(), FrameType::Register);
        assert_eq!(decoded[1], Frame::Sync { in_sync: true });
    }

    #[test]
    fn marker_inside_frame_resynchronises() {
        let mut codec = codec();
        // Declares 6 bytes but a new frame starts after 3.
        let mut wire = vec![MARKER, 0x06, b'R', 0x08, 0x00];
        wire.extend([MARKER, 0x02, b'S', 0x00, MARKER]);

        let decoded = frames(codec.feed_all(&wire));
        assert_eq!(decoded, vec![Frame::Sync { in_sync: false }]);
    }

    #[test]
    fn overrun_drops_frame_and_sync() {
        let mut codec = codec();
        codec.feed_all(&[MARKER, 0x02, b'S', 0x01, MARKER]);
        assert!(codec.in_sync());

        // One byte more than declared.
        let decoded = codec.feed_all(&[0x02, b'S', 0x01, 0x99, MARKER]);
        assert!(decoded.is_empty());
        assert!(!codec.in_sync());

        // The marker that ended the overrun starts a fresh frame.
        let decoded = frames(codec.feed_all(&[0x02, b'S', 0x01, MARKER]));
        assert_eq!(decoded, vec![Frame::Sync { in_sync: true }]);
        assert!(codec.in_sync());
    }

    #[test]
    fn zero_length_is_ignored() {
        let mut codec = codec();
        let mut wire = vec![MARKER, 0x00, 0x42];
        wire.extend([MARKER, 0x02, b'S', 0x01, MARKER]);
        let decoded = frames(codec.feed_all(&wire));
        assert_eq!(decoded, vec![Frame::Sync { in_sync: true }]);
    }

    #[test]
    fn unknown_register_is_dropped_but_stays_in_sync() {
        let mut codec = codec();
        let decoded = codec.feed_all(&[MARKER, 0x02, b'r', 0xEE, MARKER]);
        assert!(decoded.is_empty());
        assert!(codec.in_sync());
    }

    #[test]
    fn malformed_frames_drop_sync() {
        let mut codec = codec();
        for wire in [
            vec![0x01, b'Q', MARKER],
            vec![0x01, b'R', MARKER],
            vec![0x02, b'H', 0x02, MARKER],
            vec![0x03, b'A', 0xC3, 0xA9, MARKER],
        ] {
            codec.feed_all(&[MARKER, 0x02, b'S', 0x01, MARKER]);
            assert!(codec.in_sync());
            let decoded = codec.feed_all(&wire[..]);
            assert!(decoded.is_empty(), "{wire:02X?}");
            assert!(!codec.in_sync(), "{wire:02X?}");
            codec.reset();
        }
    }

    #[test]
    fn truncated_values_decode_missing() {
        let mut codec = codec();
        let mut wire = vec![MARKER, 0x06, b'r', builtin::POSITION];
        wire.extend_from_slice(&7i32.to_le_bytes());
        wire.push(MARKER);

        let decoded = frames(codec.feed_all(&wire));
        assert_eq!(
            decoded[0].values().unwrap(),
            &[Value::Int(7), Value::Missing]
        );
    }

    #[test]
    fn decode_header_and_telemetry() {
        let mut codec = codec();
        let wire = [
            MARKER, 0x06, b'H', 0x02, builtin::TARGET, 0x00, builtin::VELOCITY, 0x01, //
            MARKER, 0x04, b'T', 0x00, 0xAA, 0xBB, //
            MARKER,
        ];

        let decoded = frames(codec.feed_all(&wire));
        assert_eq!(decoded.len(), 2);
        match &decoded[0] {
            Frame::Header {
                telemetry_id,
                registers,
            } => {
                assert_eq!(*telemetry_id, None);
                assert_eq!(registers.len(), 2);
                assert_eq!(registers[1].0.id, builtin::VELOCITY);
                assert_eq!(registers[1].1, 1);
            }
            other => panic!("unexpected frame: {other:?}"),
        }
        assert_eq!(
            decoded[1],
            Frame::Telemetry {
                telemetry_id: 0,
                payload: TelemetryPayload::Raw(Bytes::from_static(&[0xAA, 0xBB])),
            }
        );
    }

    #[test]
    fn alert_roundtrip() {
        let mut codec = codec();
        let frame = Frame::Alert {
            message: "overtemp".to_string(),
        };
        let mut dst = BytesMut::new();
        codec.encode(&frame, &mut dst).unwrap();
        dst.put_u8(MARKER);

        assert_eq!(frames(codec.feed_all(&dst)), vec![frame]);
    }

    #[test]
    fn response_encodes_read_layout() {
        let mut codec = codec();
        let position = register(&codec, builtin::POSITION);
        let frame = Frame::Response {
            register: position,
            values: vec![Value::Int(3), Value::Float(0.25)],
        };
        let mut dst = BytesMut::new();
        codec.encode(&frame, &mut dst).unwrap();
        assert_eq!(dst[1], 10);
        dst.put_u8(MARKER);

        assert_eq!(frames(codec.feed_all(&dst)), vec![frame]);
    }

    #[test]
    fn oversized_alert_is_rejected() {
        let codec = codec();
        let mut dst = BytesMut::new();
        let err = codec
            .encode(
                &Frame::Alert {
                    message: "x".repeat(300),
                },
                &mut dst,
            )
            .unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 301, max: 255 }));
        assert!(dst.is_empty());
    }

    #[test]
    fn telemetry_values_are_unencodable() {
        let codec = codec();
        let mut dst = BytesMut::new();
        let err = codec
            .encode(
                &Frame::Telemetry {
                    telemetry_id: 0,
                    payload: TelemetryPayload::Values(vec![Value::Float(1.0)]),
                },
                &mut dst,
            )
            .unwrap_err();
        assert!(matches!(err, FrameError::Unencodable(_)));
    }

    #[test]
    fn write_value_errors_surface() {
        let codec = codec();
        let target = register(&codec, builtin::TARGET);
        let mut dst = BytesMut::new();
        let err = codec
            .encode(
                &Frame::write(target, vec![Value::Float(1.0), Value::Float(2.0)]),
                &mut dst,
            )
            .unwrap_err();
        assert!(matches!(err, FrameError::ValueCount { .. }));

        let custom = Arc::new(Register::new(
            "REG_RAW",
            0xE0,
            vec![],
            vec![ScalarType::Byte],
        ));
        let err = codec
            .encode(&Frame::write(custom, vec![Value::Int(-1)]), &mut dst)
            .unwrap_err();
        assert!(matches!(
            err,
            FrameError::Register(RegisterError::Overflow { .. })
        ));
    }
}
