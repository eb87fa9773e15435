//! Host-side register protocol for FOC motor controllers.
//!
//! focwire talks to motor-controller firmware over a serial link using
//! either a compact binary framing or a line-oriented text framing, and
//! exposes register reads/writes, per-motor addressing and telemetry
//! decoding on top.
//!
//! # Crate Structure
//!
//! - [`registers`]: register catalog, scalar types and control-mode enums
//! - [`transport`]: byte transports (serial ports, in-memory links)
//! - [`frame`]: frame model plus binary and text codecs
//! - [`link`]: connection reader, motor addressing and telemetry
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use focwire::link::Protocol;
//! use focwire::registers::builtin;
//!
//! # fn main() -> focwire::link::Result<()> {
//! let motors = focwire::link::serial("/dev/ttyUSB0", 115_200, Protocol::Binary);
//! motors.connect()?;
//! motors.motor(0).set_target(3.0)?;
//! let angle = motors.get_register(0, builtin::ANGLE, Duration::from_millis(500))?;
//! println!("angle: {angle:?}");
//! motors.disconnect()?;
//! # Ok(())
//! # }
//! ```

/// Re-export register catalog types.
pub mod registers {
    pub use focwire_registers::*;
}

/// Re-export transport types.
pub mod transport {
    pub use focwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use focwire_frame::*;
}

/// Re-export connection, motor and telemetry types.
pub mod link {
    pub use focwire_link::*;
}
