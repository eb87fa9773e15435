//! Enumerations carried in the mode and status registers.

use serde::{Deserialize, Serialize};

macro_rules! byte_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        #[repr(u8)]
        pub enum $name {
            $($variant = $value),+
        }

        impl $name {
            pub const fn as_byte(self) -> u8 {
                self as u8
            }
        }

        impl TryFrom<u8> for $name {
            type Error = u8;

            fn try_from(value: u8) -> Result<Self, u8> {
                match value {
                    $($value => Ok($name::$variant),)+
                    other => Err(other),
                }
            }
        }
    };
}

byte_enum! {
    /// Value of `REG_TORQUE_MODE`.
    TorqueControlType {
        Voltage = 0x00,
        DcCurrent = 0x01,
        FocCurrent = 0x02,
    }
}

byte_enum! {
    /// Value of `REG_CONTROL_MODE`.
    MotionControlType {
        Torque = 0x00,
        Velocity = 0x01,
        Angle = 0x02,
        VelocityOpenloop = 0x03,
        AngleOpenloop = 0x04,
    }
}

byte_enum! {
    /// Value of `REG_MODULATION_MODE`.
    ModulationType {
        SinePwm = 0x00,
        SpaceVectorPwm = 0x01,
        Trapezoid120 = 0x02,
        Trapezoid150 = 0x03,
    }
}

byte_enum! {
    /// Value of `REG_STATUS`.
    MotorStatus {
        Uninitialized = 0x00,
        Initializing = 0x01,
        Uncalibrated = 0x02,
        Calibrating = 0x03,
        Ready = 0x04,
        Error = 0x08,
        CalibFailed = 0x0E,
        InitFailed = 0x0F,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_conversions() {
        assert_eq!(MotionControlType::Velocity.as_byte(), 1);
        assert_eq!(MotorStatus::try_from(0x04), Ok(MotorStatus::Ready));
        assert_eq!(MotorStatus::try_from(0x05), Err(0x05));
        assert_eq!(
            TorqueControlType::try_from(2),
            Ok(TorqueControlType::FocCurrent)
        );
    }

    #[test]
    fn status_error_variant_converts() {
        let error = MotorStatus::Error;
        assert_eq!(error.as_byte(), 0x08);
        assert_eq!(MotorStatus::try_from(0x08), Ok(MotorStatus::Error));
        assert_eq!(MotorStatus::try_from(0x0F), Ok(MotorStatus::InitFailed));
    }
}
