use std::fmt;

use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{RegisterError, Result};

/// Wire type of a single register field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    /// Unsigned byte, tag `b`.
    Byte,
    /// Signed 32-bit integer, tag `i`.
    Int32,
    /// IEEE-754 single precision float, tag `f`.
    Float32,
}

impl ScalarType {
    /// Size of the scalar on the wire.
    pub const fn width(self) -> usize {
        match self {
            ScalarType::Byte => 1,
            ScalarType::Int32 | ScalarType::Float32 => 4,
        }
    }

    /// Single character tag used in register tables.
    pub const fn tag(self) -> char {
        match self {
            ScalarType::Byte => 'b',
            ScalarType::Int32 => 'i',
            ScalarType::Float32 => 'f',
        }
    }

    pub fn from_tag(tag: char) -> Result<Self> {
        match tag {
            'b' => Ok(ScalarType::Byte),
            'i' => Ok(ScalarType::Int32),
            'f' => Ok(ScalarType::Float32),
            other => Err(RegisterError::InvalidTypeTag(other)),
        }
    }

    /// Parse a tag string such as `"iff"` into a type list.
    pub fn parse_tags(tags: &str) -> Result<Vec<Self>> {
        tags.chars().map(Self::from_tag).collect()
    }
}

/// Total wire size of a type sequence.
pub fn layout_size(types: &[ScalarType]) -> usize {
    types.iter().map(|t| t.width()).sum()
}

/// A decoded register field.
///
/// Bytes and int32 fields both decode to [`Value::Int`]. A field declared by
/// the register layout but absent from a truncated payload decodes to
/// [`Value::Missing`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f32),
    Missing,
}

impl Value {
    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Value::Int(v) => Some(v as f32),
            Value::Float(v) => Some(v),
            Value::Missing => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int(v) => Some(v),
            Value::Float(_) | Value::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

impl fmt::Display for Value {
    /// Text-protocol rendering: floats always carry a `.` so they re-parse
    /// as floats.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => {
                let text = v.to_string();
                if v.is_finite() && !text.contains('.') {
                    write!(f, "{text}.0")
                } else {
                    f.write_str(&text)
                }
            }
            Value::Missing => f.write_str("null"),
        }
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Int(i64::from(v))
    }
}

/// Encode one value into its declared slot, little-endian.
pub fn encode_scalar(ty: ScalarType, value: &Value, dst: &mut BytesMut) -> Result<()> {
    match (ty, *value) {
        (ScalarType::Byte, Value::Int(v)) => {
            let byte = u8::try_from(v).map_err(|_| RegisterError::Overflow {
                expected: ty,
                value: v,
            })?;
            dst.put_u8(byte);
        }
        (ScalarType::Int32, Value::Int(v)) => {
            let word = i32::try_from(v).map_err(|_| RegisterError::Overflow {
                expected: ty,
                value: v,
            })?;
            dst.put_i32_le(word);
        }
        (ScalarType::Float32, Value::Float(v)) => dst.put_f32_le(v),
        (ScalarType::Float32, Value::Int(v)) => dst.put_f32_le(v as f32),
        (expected, other) => {
            return Err(RegisterError::TypeMismatch {
                expected,
                value: other.to_string(),
            })
        }
    }
    Ok(())
}

/// Decode one value from the front of `src`.
///
/// Returns the value and the declared width consumed. When fewer than
/// `width` bytes remain the value is [`Value::Missing`].
pub fn decode_scalar(ty: ScalarType, src: &[u8]) -> (Value, usize) {
    let width = ty.width();
    if src.len() < width {
        return (Value::Missing, width);
    }
    let value = match ty {
        ScalarType::Byte => Value::Int(i64::from(src[0])),
        ScalarType::Int32 => {
            Value::Int(i64::from(i32::from_le_bytes([src[0], src[1], src[2], src[3]])))
        }
        ScalarType::Float32 => Value::Float(f32::from_le_bytes([src[0], src[1], src[2], src[3]])),
    };
    (value, width)
}

/// Decode a full type sequence starting at `src[0]`.
pub fn decode_layout(types: &[ScalarType], src: &[u8]) -> Vec<Value> {
    let mut pos = 0usize;
    let mut values = Vec::with_capacity(types.len());
    for ty in types {
        let (value, width) = decode_scalar(*ty, src.get(pos..).unwrap_or(&[]));
        pos += width;
        values.push(value);
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_roundtrip() {
        assert_eq!(
            ScalarType::parse_tags("bif").unwrap(),
            vec![ScalarType::Byte, ScalarType::Int32, ScalarType::Float32]
        );
        assert!(matches!(
            ScalarType::from_tag('x'),
            Err(RegisterError::InvalidTypeTag('x'))
        ));
    }

    #[test]
    fn float_is_little_endian() {
        let mut buf = BytesMut::new();
        encode_scalar(ScalarType::Float32, &Value::Float(12.5), &mut buf).unwrap();
        assert_eq!(buf.as_ref(), &12.5f32.to_le_bytes());
    }

    #[test]
    fn byte_overflow_rejected() {
        let mut buf = BytesMut::new();
        let err = encode_scalar(ScalarType::Byte, &Value::Int(256), &mut buf).unwrap_err();
        assert!(matches!(err, RegisterError::Overflow { value: 256, .. }));
        assert!(buf.is_empty());
    }

    #[test]
    fn int32_overflow_rejected() {
        let mut buf = BytesMut::new();
        let err =
            encode_scalar(ScalarType::Int32, &Value::Int(i64::from(u32::MAX)), &mut buf).unwrap_err();
        assert!(matches!(err, RegisterError::Overflow { .. }));
    }

    #[test]
    fn float_into_integer_slot_is_type_mismatch() {
        let mut buf = BytesMut::new();
        let err = encode_scalar(ScalarType::Byte, &Value::Float(1.0), &mut buf).unwrap_err();
        assert!(matches!(err, RegisterError::TypeMismatch { .. }));
    }

    #[test]
    fn integer_into_float_slot_is_widened() {
        let mut buf = BytesMut::new();
        encode_scalar(ScalarType::Float32, &Value::Int(3), &mut buf).unwrap();
        assert_eq!(decode_scalar(ScalarType::Float32, &buf).0, Value::Float(3.0));
    }

    #[test]
    fn missing_cannot_be_encoded() {
        let mut buf = BytesMut::new();
        assert!(encode_scalar(ScalarType::Float32, &Value::Missing, &mut buf).is_err());
    }

    #[test]
    fn negative_int32_decodes_signed() {
        let (value, width) = decode_scalar(ScalarType::Int32, &(-42i32).to_le_bytes());
        assert_eq!(value, Value::Int(-42));
        assert_eq!(width, 4);
    }

    #[test]
    fn short_input_yields_missing() {
        let values = decode_layout(
            &[ScalarType::Int32, ScalarType::Float32],
            &[1, 0, 0, 0, 0x00, 0x00],
        );
        assert_eq!(values, vec![Value::Int(1), Value::Missing]);
    }

    #[test]
    fn display_keeps_floats_recognisable() {
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::Float(12.5).to_string(), "12.5");
        assert_eq!(Value::Int(7).to_string(), "7");
    }
}
