use std::fmt;
use std::io;

use focwire_frame::FrameError;
use focwire_link::LinkError;
use focwire_registers::RegisterError;
use focwire_transport::TransportError;

// Process exit codes. 64 follows sysexits EX_USAGE and 124 follows timeout(1).
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Io(source) => io_error(context, source),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn register_error(context: &str, err: RegisterError) -> CliError {
    match err {
        RegisterError::UnknownRegister(_) | RegisterError::InvalidTypeTag(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Register(err) => register_error(context, err),
        FrameError::ValueCount { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn link_error(context: &str, err: LinkError) -> CliError {
    match err {
        LinkError::Transport(err) => transport_error(context, err),
        LinkError::Frame(err) => frame_error(context, err),
        LinkError::Register(err) => register_error(context, err),
        LinkError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        LinkError::InvalidTelemetryId(_) => CliError::new(USAGE, format!("{context}: {err}")),
        LinkError::Disconnected => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn link_errors_map_to_exit_codes() {
        let timeout = link_error("get", LinkError::Timeout(Duration::from_millis(100)));
        assert_eq!(timeout.code, TIMEOUT);

        let unknown = link_error(
            "set",
            LinkError::Register(RegisterError::UnknownRegister("NOPE".to_string())),
        );
        assert_eq!(unknown.code, USAGE);
        assert!(unknown.message.starts_with("set: "));

        let open = link_error(
            "connect",
            LinkError::Transport(TransportError::Open {
                port: "/dev/null0".to_string(),
                reason: "no such device".to_string(),
            }),
        );
        assert_eq!(open.code, TRANSPORT_ERROR);

        let denied = transport_error(
            "connect",
            TransportError::Io(io::Error::from(io::ErrorKind::PermissionDenied)),
        );
        assert_eq!(denied.code, PERMISSION_DENIED);
    }
}
