use focwire_registers::RegisterError;

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameError {
    /// A completed payload could not be parsed.
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// Register lookup or scalar encoding failed.
    #[error(transparent)]
    Register(#[from] RegisterError),

    /// The number of values does not match the register layout.
    #[error("{register} expects {expected} value(s), got {got}")]
    ValueCount {
        register: String,
        expected: usize,
        got: usize,
    },

    /// The encoded payload does not fit the one-byte length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The frame cannot be expressed in this wire format.
    #[error("cannot encode frame: {0}")]
    Unencodable(String),
}

pub type Result<T> = std::result::Result<T, FrameError>;
