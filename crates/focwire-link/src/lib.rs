//! Connection, motor addressing and telemetry for focwire devices.
//!
//! The layers stack as follows:
//!
//! - [`Connection`] owns the link and framer, runs one reader thread and
//!   fans inbound frames out to [`Subscription`]s in arrival order.
//! - [`Motors`] multiplexes register access across motors with
//!   `REG_MOTOR_ADDRESS` and correlates read requests with responses.
//! - [`Telemetry`] programs telemetry slots and decodes TELEMETRY frames
//!   against the headers the device announced.
//!
//! ```no_run
//! use focwire_link::Protocol;
//!
//! let motors = focwire_link::serial("/dev/ttyACM0", 115_200, Protocol::Binary);
//! motors.connect()?;
//! motors.motor(0).set_target(3.0)?;
//! let angle = motors.motor(0).get_angle()?;
//! # let _ = angle;
//! # Ok::<(), focwire_link::LinkError>(())
//! ```

use std::sync::Arc;

use focwire_registers::Catalog;
use focwire_transport::SerialLink;

pub mod bus;
pub mod connection;
pub mod error;
pub mod motor;
pub mod motors;
pub mod telemetry;

pub use focwire_frame::Protocol;

pub use bus::{Broadcast, RecvError, Subscription};
pub use connection::{Connection, Inbound, InboundStage, LinkConfig};
pub use error::{LinkError, Result};
pub use motor::{AnglePid, Limits, Motor, MotorParameters, VelocityPid};
pub use motors::{Motors, DEFAULT_TIMEOUT};
pub use telemetry::{Telemetry, TelemetryHeader, TelemetrySample, MAX_TELEMETRY_IDS};

/// Build an unconnected [`Motors`] over any link.
pub fn open(
    link: Box<dyn SerialLink>,
    protocol: Protocol,
    catalog: Arc<Catalog>,
    config: LinkConfig,
) -> Motors {
    let codec = protocol.codec(catalog);
    Motors::new(Arc::new(Connection::with_config(link, codec, config)))
}

/// Build an unconnected [`Motors`] for a serial port, using the built-in
/// register catalog.
#[cfg(feature = "serial")]
pub fn serial(port: &str, baud_rate: u32, protocol: Protocol) -> Motors {
    let link = focwire_transport::SerialPortLink::new(focwire_transport::SerialConfig::new(
        port, baud_rate,
    ));
    open(
        Box::new(link),
        protocol,
        Catalog::global(),
        LinkConfig::default(),
    )
}
