use crate::scalar::ScalarType;

/// Errors raised by the register catalog and the scalar codec.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegisterError {
    /// No register with this id or name is known to the catalog.
    #[error("unknown register: {0}")]
    UnknownRegister(String),

    /// The id or the name is already present in the catalog.
    #[error("register {name} (0x{id:02X}) already exists as {existing}")]
    DuplicateRegistration {
        name: String,
        id: u8,
        existing: String,
    },

    /// The value kind does not match the declared scalar slot.
    #[error("type mismatch: cannot encode {value} as {expected:?}")]
    TypeMismatch { expected: ScalarType, value: String },

    /// The value does not fit in the declared scalar width.
    #[error("value {value} out of range for {expected:?}")]
    Overflow { expected: ScalarType, value: i64 },

    /// A scalar type tag other than `b`, `i` or `f`.
    #[error("invalid scalar type tag '{0}'")]
    InvalidTypeTag(char),
}

pub type Result<T> = std::result::Result<T, RegisterError>;
