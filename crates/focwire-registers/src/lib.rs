//! Register catalog and typed scalar codec.
//!
//! Every device variable is a register: a one-byte id, a name, and the
//! scalar layouts used when the device reports it and when the host
//! writes it. The [`Catalog`] maps ids and names to registers and is the
//! single place where loosely typed register references are resolved.

pub mod builtin;
pub mod catalog;
pub mod error;
pub mod modes;
pub mod register;
pub mod scalar;

pub use catalog::{Catalog, RegisterRef};
pub use error::{RegisterError, Result};
pub use modes::{ModulationType, MotionControlType, MotorStatus, TorqueControlType};
pub use register::Register;
pub use scalar::{decode_layout, decode_scalar, encode_scalar, layout_size, ScalarType, Value};
