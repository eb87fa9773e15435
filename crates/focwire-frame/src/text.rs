use std::fmt::Write as _;
use std::sync::Arc;

use bytes::{BufMut, BytesMut};
use focwire_registers::{Catalog, Register, RegisterError, ScalarType, Value};
use tracing::{debug, trace, warn};

use crate::codec::{encode_values, Decoded, Echo, FrameCodec, Protocol};
use crate::error::{FrameError, Result};
use crate::frame::{Frame, FrameType, TelemetryPayload};

/// Default maximum line length: 1 KiB.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024;

/// Configuration for the text framer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextConfig {
    /// Longest accepted line, excluding the terminator. Longer lines are
    /// discarded and drop sync.
    pub max_line_length: usize,
}

impl TextConfig {
    pub fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

/// Newline-delimited ASCII framer.
///
/// Each line is one frame: a type character followed by its payload, for
/// example `R8=12.5` or `T0=1.0,2.0`. The first newline seen while out of
/// sync starts a session: the partial line is discarded and a
/// [`Decoded::SyncRequest`] is reported.
#[derive(Debug)]
pub struct TextCodec {
    catalog: Arc<Catalog>,
    config: TextConfig,
    buffer: Vec<u8>,
    in_sync: bool,
    overlong: bool,
}

impl TextCodec {
    pub fn new(catalog: Arc<Catalog>, config: TextConfig) -> Self {
        Self {
            catalog,
            config,
            buffer: Vec::new(),
            in_sync: false,
            overlong: false,
        }
    }

    pub fn config(&self) -> &TextConfig {
        &self.config
    }

    fn end_of_line(&mut self) -> Option<Decoded> {
        let line = std::mem::take(&mut self.buffer);
        if self.overlong {
            self.overlong = false;
            return None;
        }
        if !self.in_sync {
            self.in_sync = true;
            debug!(discarded = line.len(), "text session started");
            return Some(Decoded::SyncRequest);
        }
        if line.is_empty() {
            return None;
        }

        match self.parse(&line) {
            Ok(frame) => {
                trace!(frame = %frame, "text frame decoded");
                Some(Decoded::Frame(frame))
            }
            Err(FrameError::Register(RegisterError::UnknownRegister(register))) => {
                warn!(register = %register, "dropping line for unknown register");
                None
            }
            Err(err) => {
                warn!(error = %err, "dropping malformed line");
                self.in_sync = false;
                None
            }
        }
    }

    fn parse(&self, line: &[u8]) -> Result<Frame> {
        let line = std::str::from_utf8(line)
            .ok()
            .filter(|s| s.is_ascii())
            .ok_or_else(|| FrameError::Malformed("line is not ASCII".to_string()))?;
        let tag = line.as_bytes()[0];
        let rest = &line[1..];
        let frame_type = FrameType::from_tag(tag)
            .ok_or_else(|| FrameError::Malformed(format!("unknown frame type '{}'", tag as char)))?;

        match frame_type {
            FrameType::Register | FrameType::Response => {
                let (token, values) = match rest.split_once('=') {
                    Some((token, values)) => (token, parse_values(values)?),
                    None => (rest, Vec::new()),
                };
                let register = self.catalog.parse(token)?;
                Ok(if frame_type == FrameType::Register {
                    Frame::Register { register, values }
                } else {
                    Frame::Response { register, values }
                })
            }
            FrameType::Telemetry => {
                let (id, values) = rest
                    .split_once('=')
                    .ok_or_else(|| FrameError::Malformed("telemetry without '='".to_string()))?;
                Ok(Frame::Telemetry {
                    telemetry_id: parse_id(id)?,
                    payload: TelemetryPayload::Values(parse_values(values)?),
                })
            }
            FrameType::Header => {
                let (id, pairs) = rest
                    .split_once('=')
                    .ok_or_else(|| FrameError::Malformed("header without '='".to_string()))?;
                let mut registers = Vec::new();
                for pair in pairs.split(',').filter(|p| !p.trim().is_empty()) {
                    let (register, motor) = pair.split_once(':').ok_or_else(|| {
                        FrameError::Malformed(format!("header entry '{pair}' is not reg:motor"))
                    })?;
                    registers.push((self.catalog.parse(register)?, parse_id(motor)?));
                }
                Ok(Frame::Header {
                    telemetry_id: Some(parse_id(id)?),
                    registers,
                })
            }
            FrameType::Sync => match rest.as_bytes().first() {
                Some(b'0') => Ok(Frame::Sync { in_sync: false }),
                Some(_) => Ok(Frame::Sync { in_sync: true }),
                None => Err(FrameError::Malformed("sync without state".to_string())),
            },
            FrameType::Alert => Ok(Frame::Alert {
                message: rest.to_string(),
            }),
        }
    }
}

fn parse_id(token: &str) -> Result<u8> {
    token
        .trim()
        .parse()
        .map_err(|_| FrameError::Malformed(format!("invalid id '{token}'")))
}

fn parse_values(list: &str) -> Result<Vec<Value>> {
    if list.trim().is_empty() {
        return Ok(Vec::new());
    }
    list.split(',').map(parse_value).collect()
}

/// Parse one value literal.
///
/// `0x` hex and `0b` binary are integers; a literal containing `.` or
/// ending in `f` is a float; anything else must be a decimal integer.
pub fn parse_value(token: &str) -> Result<Value> {
    let token = token.trim();
    let invalid = || FrameError::Malformed(format!("invalid value '{token}'"));

    if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).map(Value::Int).map_err(|_| invalid());
    }
    if let Some(bin) = token.strip_prefix("0b").or_else(|| token.strip_prefix("0B")) {
        return i64::from_str_radix(bin, 2).map(Value::Int).map_err(|_| invalid());
    }
    // `inf` ends in `f` but is a complete float literal.
    if let Ok(special) = token.parse::<f32>() {
        if !special.is_finite() {
            return Ok(Value::Float(special));
        }
    }
    if let Some(float) = token.strip_suffix(['f', 'F']) {
        return float.parse::<f32>().map(Value::Float).map_err(|_| invalid());
    }
    if token.contains('.') {
        return token.parse::<f32>().map(Value::Float).map_err(|_| invalid());
    }
    token.parse::<i64>().map(Value::Int).map_err(|_| invalid())
}

fn push_values(line: &mut String, values: &[Value]) {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        let _ = write!(line, "{value}");
    }
}

/// Validate `values` against a register layout without keeping the bytes.
fn check_values(register: &Register, types: &[ScalarType], values: &[Value]) -> Result<()> {
    let mut scratch = BytesMut::new();
    encode_values(register, types, values, &mut scratch)
}

impl FrameCodec for TextCodec {
    fn protocol(&self) -> Protocol {
        Protocol::Text
    }

    fn feed(&mut self, byte: u8) -> Option<Decoded> {
        match byte {
            b'\r' => None,
            b'\n' => self.end_of_line(),
            _ if self.overlong => None,
            _ => {
                if self.buffer.len() >= self.config.max_line_length {
                    warn!(
                        max = self.config.max_line_length,
                        "line too long, discarding"
                    );
                    self.buffer.clear();
                    self.overlong = true;
                    self.in_sync = false;
                    return None;
                }
                self.buffer.push(byte);
                None
            }
        }
    }

    fn encode(&self, frame: &Frame, dst: &mut BytesMut) -> Result<Echo> {
        let mut line = String::new();
        line.push(frame.frame_type().tag() as char);

        match frame {
            Frame::Register { register, values } => {
                check_values(register, &register.write_types, values)?;
                let _ = write!(line, "{}", register.id);
                if !values.is_empty() {
                    line.push('=');
                    push_values(&mut line, values);
                }
            }
            Frame::Response { register, values } => {
                check_values(register, &register.read_types, values)?;
                let _ = write!(line, "{}=", register.id);
                push_values(&mut line, values);
            }
            Frame::Telemetry {
                telemetry_id,
                payload,
            } => match payload {
                TelemetryPayload::Values(values) => {
                    let _ = write!(line, "{telemetry_id}=");
                    push_values(&mut line, values);
                }
                TelemetryPayload::Raw(_) => {
                    return Err(FrameError::Unencodable(
                        "text telemetry carries values only".to_string(),
                    ))
                }
            },
            Frame::Header {
                telemetry_id,
                registers,
            } => {
                let _ = write!(line, "{}=", telemetry_id.unwrap_or(0));
                for (i, (register, motor)) in registers.iter().enumerate() {
                    if i > 0 {
                        line.push(',');
                    }
                    let _ = write!(line, "{}:{motor}", register.id);
                }
            }
            Frame::Sync { in_sync } => line.push(if *in_sync { '1' } else { '0' }),
            Frame::Alert { message } => {
                if message.contains(['\n', '\r']) || !message.is_ascii() {
                    return Err(FrameError::Unencodable(
                        "alert must be a single ASCII line".to_string(),
                    ));
                }
                line.push_str(message);
            }
        }

        dst.reserve(line.len() + 1);
        dst.put_slice(line.as_bytes());
        dst.put_u8(b'\n');
        Ok(Echo::Line(line))
    }

    fn in_sync(&self) -> bool {
        self.in_sync
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.in_sync = false;
        self.overlong = false;
    }

    fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }
}
