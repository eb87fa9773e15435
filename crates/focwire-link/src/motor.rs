use std::time::Duration;

use focwire_frame::FrameError;
use focwire_registers::{
    builtin, MotionControlType, MotorStatus, RegisterRef, TorqueControlType, Value,
};

use crate::bus::Subscription;
use crate::connection::Inbound;
use crate::error::{LinkError, Result};
use crate::motors::{Motors, DEFAULT_TIMEOUT};

/// Limits written by [`Motor::set_limits`]. `None` leaves a limit unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Limits {
    pub voltage: Option<f32>,
    pub current: Option<f32>,
    pub velocity: Option<f32>,
}

/// Velocity loop settings. `None` leaves a setting unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VelocityPid {
    pub p: Option<f32>,
    pub i: Option<f32>,
    pub d: Option<f32>,
    /// Output limit, applied as the voltage limit.
    pub limit: Option<f32>,
    pub ramp: Option<f32>,
    /// Low-pass filter time constant.
    pub tf: Option<f32>,
}

/// Angle loop settings. The firmware only exposes P and the output
/// (velocity) limit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnglePid {
    pub p: Option<f32>,
    pub limit: Option<f32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotorParameters {
    pub phase_resistance: Option<f32>,
    pub kv: Option<f32>,
    pub inductance: Option<f32>,
    pub pole_pairs: Option<u8>,
}

/// One motor behind a [`Motors`] connection.
#[derive(Debug, Clone, Copy)]
pub struct Motor<'a> {
    motors: &'a Motors,
    id: u8,
}

impl<'a> Motor<'a> {
    pub(crate) fn new(motors: &'a Motors, id: u8) -> Self {
        Self { motors, id }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    /// Responses and alerts attributed to this motor.
    pub fn subscribe(&self) -> Subscription<Inbound> {
        self.motors.subscribe_motor(self.id)
    }

    pub fn set_register(&self, register: impl Into<RegisterRef>, values: Vec<Value>) -> Result<()> {
        self.motors.set_register(self.id, register, values)
    }

    pub fn get_register(
        &self,
        register: impl Into<RegisterRef>,
        timeout: Duration,
    ) -> Result<Vec<Value>> {
        self.motors.get_register(self.id, register, timeout)
    }

    fn set_f32(&self, register: u8, value: Option<f32>) -> Result<()> {
        match value {
            Some(v) => self.set_register(register, vec![Value::Float(v)]),
            None => Ok(()),
        }
    }

    pub fn set_target(&self, target: f32) -> Result<()> {
        self.set_f32(builtin::TARGET, Some(target))
    }

    pub fn set_mode(&self, motion: MotionControlType, torque: TorqueControlType) -> Result<()> {
        self.set_register(builtin::CONTROL_MODE, vec![Value::from(motion.as_byte())])?;
        self.set_register(builtin::TORQUE_MODE, vec![Value::from(torque.as_byte())])
    }

    pub fn set_limits(&self, limits: Limits) -> Result<()> {
        self.set_f32(builtin::VOLTAGE_LIMIT, limits.voltage)?;
        self.set_f32(builtin::CURRENT_LIMIT, limits.current)?;
        self.set_f32(builtin::VEL_LIMIT, limits.velocity)
    }

    pub fn set_velocity_pid(&self, pid: VelocityPid) -> Result<()> {
        self.set_f32(builtin::VEL_PID_P, pid.p)?;
        self.set_f32(builtin::VEL_PID_I, pid.i)?;
        self.set_f32(builtin::VEL_PID_D, pid.d)?;
        self.set_f32(builtin::VOLTAGE_LIMIT, pid.limit)?;
        self.set_f32(builtin::VEL_MAX_RAMP, pid.ramp)?;
        self.set_f32(builtin::VEL_LPF_T, pid.tf)
    }

    pub fn set_angle_pid(&self, pid: AnglePid) -> Result<()> {
        self.set_f32(builtin::ANG_PID_P, pid.p)?;
        self.set_f32(builtin::VEL_LIMIT, pid.limit)
    }

    pub fn set_motor_parameters(&self, params: MotorParameters) -> Result<()> {
        self.set_f32(builtin::KV, params.kv)?;
        self.set_f32(builtin::PHASE_RESISTANCE, params.phase_resistance)?;
        self.set_f32(builtin::INDUCTANCE, params.inductance)?;
        match params.pole_pairs {
            Some(pairs) => self.set_register(builtin::POLE_PAIRS, vec![Value::from(pairs)]),
            None => Ok(()),
        }
    }

    pub fn enable(&self) -> Result<()> {
        self.set_register(builtin::ENABLE, vec![Value::from(true)])
    }

    pub fn disable(&self) -> Result<()> {
        self.set_register(builtin::ENABLE, vec![Value::from(false)])
    }

    /// Shaft angle in radians.
    pub fn get_angle(&self) -> Result<f32> {
        let values = self.get_register(builtin::ANGLE, DEFAULT_TIMEOUT)?;
        first_f32(&values)
    }

    pub fn get_status(&self) -> Result<MotorStatus> {
        let values = self.get_register(builtin::STATUS, DEFAULT_TIMEOUT)?;
        let raw = values
            .first()
            .and_then(Value::as_i64)
            .and_then(|v| u8::try_from(v).ok())
            .ok_or_else(|| malformed("status response carries no byte".to_string()))?;
        MotorStatus::try_from(raw)
            .map_err(|raw| malformed(format!("unknown motor status 0x{raw:02X}")))
    }
}

fn malformed(reason: String) -> LinkError {
    LinkError::Frame(FrameError::Malformed(reason))
}

fn first_f32(values: &[Value]) -> Result<f32> {
    values
        .first()
        .and_then(Value::as_f32)
        .ok_or_else(|| malformed("response carries no value".to_string()))
}
