use std::time::Duration;

use crate::telemetry::MAX_TELEMETRY_IDS;

/// Errors that can occur in link operations.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] focwire_transport::TransportError),

    /// Frame encoding error.
    #[error("frame error: {0}")]
    Frame(#[from] focwire_frame::FrameError),

    /// Register reference or value error.
    #[error("register error: {0}")]
    Register(#[from] focwire_registers::RegisterError),

    /// No matching response arrived in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The connection was closed while waiting.
    #[error("connection closed")]
    Disconnected,

    /// The operation requires a connected link.
    #[error("not connected")]
    NotConnected,

    /// `connect` was called on a running connection.
    #[error("already connected")]
    AlreadyConnected,

    /// Telemetry slot outside `0..MAX_TELEMETRY_IDS`.
    #[error("telemetry id {0} out of range (max {max})", max = MAX_TELEMETRY_IDS - 1)]
    InvalidTelemetryId(u8),

    /// The reader thread could not be started.
    #[error("failed to spawn reader thread: {0}")]
    Spawn(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LinkError>;
