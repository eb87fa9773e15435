/// Errors that can occur in serial transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the named port.
    #[error("failed to open {port}: {reason}")]
    Open { port: String, reason: String },

    /// An I/O error occurred on the byte stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The operation requires an open port.
    #[error("transport {0} is not open")]
    NotOpen(String),

    /// The underlying serial driver reported an error.
    #[cfg(feature = "serial")]
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// The write side accepted zero bytes.
    #[error("transport closed during write")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
