//! Built-in register table.
//!
//! Ids 0x00-0xDF are reserved for the firmware's standard registers.
//! Custom registers are conventionally added from 0xE0 upward.

pub const STATUS: u8 = 0x00;
pub const MOTOR_ADDRESS: u8 = 0x01;
pub const REPORT: u8 = 0x02;
pub const ENABLE_ALL: u8 = 0x03;
pub const ENABLE: u8 = 0x04;
pub const CONTROL_MODE: u8 = 0x05;
pub const TORQUE_MODE: u8 = 0x06;
pub const MODULATION_MODE: u8 = 0x07;
pub const TARGET: u8 = 0x08;
pub const ANGLE: u8 = 0x09;
pub const POSITION: u8 = 0x10;
pub const VELOCITY: u8 = 0x11;
pub const SENSOR_ANGLE: u8 = 0x12;
pub const TELEMETRY_REG: u8 = 0x1A;
pub const TELEMETRY_CTRL: u8 = 0x1B;
pub const TELEMETRY_DOWNSAMPLE: u8 = 0x1C;
pub const ITERATIONS_SEC: u8 = 0x1D;
pub const VOLTAGE_Q: u8 = 0x20;
pub const VOLTAGE_D: u8 = 0x21;
pub const CURRENT_Q: u8 = 0x22;
pub const CURRENT_D: u8 = 0x23;
pub const CURRENT_A: u8 = 0x24;
pub const CURRENT_B: u8 = 0x25;
pub const CURRENT_C: u8 = 0x26;
pub const CURRENT_ABC: u8 = 0x27;
pub const CURRENT_DC: u8 = 0x28;
pub const VEL_PID_P: u8 = 0x30;
pub const VEL_PID_I: u8 = 0x31;
pub const VEL_PID_D: u8 = 0x32;
pub const VEL_LPF_T: u8 = 0x33;
pub const ANG_PID_P: u8 = 0x34;
pub const VEL_LIMIT: u8 = 0x35;
pub const VEL_MAX_RAMP: u8 = 0x36;
pub const CURQ_PID_P: u8 = 0x40;
pub const CURQ_PID_I: u8 = 0x41;
pub const CURQ_PID_D: u8 = 0x42;
pub const CURQ_LPF_T: u8 = 0x43;
pub const CURD_PID_P: u8 = 0x44;
pub const CURD_PID_I: u8 = 0x45;
pub const CURD_PID_D: u8 = 0x46;
pub const CURD_LPF_T: u8 = 0x47;
pub const VOLTAGE_LIMIT: u8 = 0x50;
pub const CURRENT_LIMIT: u8 = 0x51;
pub const MOTION_DOWNSAMPLE: u8 = 0x52;
pub const DRIVER_VOLTAGE_LIMIT: u8 = 0x53;
pub const PWM_FREQUENCY: u8 = 0x54;
pub const ZERO_ELECTRIC_ANGLE: u8 = 0x60;
pub const SENSOR_DIRECTION: u8 = 0x61;
pub const ZERO_OFFSET: u8 = 0x62;
pub const POLE_PAIRS: u8 = 0x63;
pub const PHASE_RESISTANCE: u8 = 0x64;
pub const KV: u8 = 0x65;
pub const INDUCTANCE: u8 = 0x66;
pub const NUM_MOTORS: u8 = 0x70;
pub const SYS_TIME: u8 = 0x71;

/// `(name, id, read tags, write tags)`.
pub(crate) const BUILTIN_REGISTERS: &[(&str, u8, &str, &str)] = &[
    ("REG_STATUS", STATUS, "b", ""),
    ("REG_MOTOR_ADDRESS", MOTOR_ADDRESS, "b", "b"),
    ("REG_REPORT", REPORT, "", ""),
    ("REG_ENABLE_ALL", ENABLE_ALL, "", "b"),
    ("REG_ENABLE", ENABLE, "b", "b"),
    ("REG_CONTROL_MODE", CONTROL_MODE, "b", "b"),
    ("REG_TORQUE_MODE", TORQUE_MODE, "b", "b"),
    ("REG_MODULATION_MODE", MODULATION_MODE, "b", "b"),
    ("REG_TARGET", TARGET, "f", "f"),
    ("REG_ANGLE", ANGLE, "f", ""),
    ("REG_POSITION", POSITION, "if", ""),
    ("REG_VELOCITY", VELOCITY, "f", ""),
    ("REG_SENSOR_ANGLE", SENSOR_ANGLE, "f", ""),
    ("REG_TELEMETRY_REG", TELEMETRY_REG, "", ""),
    ("REG_TELEMETRY_CTRL", TELEMETRY_CTRL, "b", "b"),
    ("REG_TELEMETRY_DOWNSAMPLE", TELEMETRY_DOWNSAMPLE, "i", "i"),
    ("REG_ITERATIONS_SEC", ITERATIONS_SEC, "i", ""),
    ("REG_VOLTAGE_Q", VOLTAGE_Q, "f", ""),
    ("REG_VOLTAGE_D", VOLTAGE_D, "f", ""),
    ("REG_CURRENT_Q", CURRENT_Q, "f", ""),
    ("REG_CURRENT_D", CURRENT_D, "f", ""),
    ("REG_CURRENT_A", CURRENT_A, "f", ""),
    ("REG_CURRENT_B", CURRENT_B, "f", ""),
    ("REG_CURRENT_C", CURRENT_C, "f", ""),
    ("REG_CURRENT_ABC", CURRENT_ABC, "fff", ""),
    ("REG_CURRENT_DC", CURRENT_DC, "ff", ""),
    ("REG_VEL_PID_P", VEL_PID_P, "f", "f"),
    ("REG_VEL_PID_I", VEL_PID_I, "f", "f"),
    ("REG_VEL_PID_D", VEL_PID_D, "f", "f"),
    ("REG_VEL_LPF_T", VEL_LPF_T, "f", "f"),
    ("REG_ANG_PID_P", ANG_PID_P, "f", "f"),
    ("REG_VEL_LIMIT", VEL_LIMIT, "f", "f"),
    ("REG_VEL_MAX_RAMP", VEL_MAX_RAMP, "f", "f"),
    ("REG_CURQ_PID_P", CURQ_PID_P, "f", "f"),
    ("REG_CURQ_PID_I", CURQ_PID_I, "f", "f"),
    ("REG_CURQ_PID_D", CURQ_PID_D, "f", "f"),
    ("REG_CURQ_LPF_T", CURQ_LPF_T, "f", "f"),
    ("REG_CURD_PID_P", CURD_PID_P, "f", "f"),
    ("REG_CURD_PID_I", CURD_PID_I, "f", "f"),
    ("REG_CURD_PID_D", CURD_PID_D, "f", "f"),
    ("REG_CURD_LPF_T", CURD_LPF_T, "f", "f"),
    ("REG_VOLTAGE_LIMIT", VOLTAGE_LIMIT, "f", "f"),
    ("REG_CURRENT_LIMIT", CURRENT_LIMIT, "f", "f"),
    ("REG_MOTION_DOWNSAMPLE", MOTION_DOWNSAMPLE, "i", "i"),
    ("REG_DRIVER_VOLTAGE_LIMIT", DRIVER_VOLTAGE_LIMIT, "f", "f"),
    ("REG_PWM_FREQUENCY", PWM_FREQUENCY, "i", "i"),
    ("REG_ZERO_ELECTRIC_ANGLE", ZERO_ELECTRIC_ANGLE, "f", "f"),
    ("REG_SENSOR_DIRECTION", SENSOR_DIRECTION, "b", "b"),
    ("REG_ZERO_OFFSET", ZERO_OFFSET, "f", "f"),
    ("REG_POLE_PAIRS", POLE_PAIRS, "b", "b"),
    ("REG_PHASE_RESISTANCE", PHASE_RESISTANCE, "f", "f"),
    ("REG_KV", KV, "f", "f"),
    ("REG_INDUCTANCE", INDUCTANCE, "f", "f"),
    ("REG_NUM_MOTORS", NUM_MOTORS, "b", "b"),
    ("REG_SYS_TIME", SYS_TIME, "i", ""),
];
