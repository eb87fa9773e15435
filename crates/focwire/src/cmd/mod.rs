use std::time::Duration;

use clap::{Args, Subcommand};
use focwire_link::{Motors, Protocol};

use crate::exit::{link_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod get;
pub mod listen;
pub mod registers;
pub mod set;
pub mod telemetry;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the built-in register catalog.
    Registers(RegistersArgs),
    /// Read one register.
    Get(GetArgs),
    /// Write one register.
    Set(SetArgs),
    /// Print responses and alerts as they arrive.
    Listen(ListenArgs),
    /// Configure a telemetry slot and print decoded samples.
    Telemetry(TelemetryArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Registers(args) => registers::run(args, format),
        Command::Get(args) => get::run(args, format),
        Command::Set(args) => set::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Telemetry(args) => telemetry::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct PortArgs {
    /// Serial port the controller is attached to (e.g. /dev/ttyUSB0, COM3).
    pub port: String,
    /// Baud rate.
    #[arg(long, short = 'b', default_value_t = 115_200, env = "FOCWIRE_BAUD")]
    pub baud: u32,
    /// Wire protocol: binary or text.
    #[arg(long, short = 'p', default_value = "binary", env = "FOCWIRE_PROTOCOL")]
    pub protocol: Protocol,
}

impl PortArgs {
    /// Open the port and start the reader.
    pub fn connect(&self) -> CliResult<Motors> {
        let motors = focwire_link::serial(&self.port, self.baud, self.protocol);
        motors
            .connect()
            .map_err(|err| link_error("connect failed", err))?;
        tracing::debug!(port = %self.port, baud = self.baud, protocol = %self.protocol, "connected");
        Ok(motors)
    }
}

#[derive(Args, Debug, Default)]
pub struct RegistersArgs {}

#[derive(Args, Debug)]
pub struct GetArgs {
    #[command(flatten)]
    pub port: PortArgs,
    /// Register name (REG_TARGET, target) or id (8, 0x08).
    pub register: String,
    /// Motor to address.
    #[arg(long, short = 'm', default_value_t = 0)]
    pub motor: u8,
    /// Maximum time to wait for the response (e.g. 1s, 250ms).
    #[arg(long, default_value = "1s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    #[command(flatten)]
    pub port: PortArgs,
    /// Register name or id.
    pub register: String,
    /// Values in register layout order (1.5, 2f, 0x1F, 0b101).
    #[arg(required = true, allow_negative_numbers = true)]
    pub values: Vec<String>,
    /// Motor to address.
    #[arg(long, short = 'm', default_value_t = 0)]
    pub motor: u8,
    /// Wait for the device to report the register back and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait when --wait is set.
    #[arg(long, default_value = "1s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub port: PortArgs,
    /// Only frames attributed to this motor.
    #[arg(long, short = 'm')]
    pub motor: Option<u8>,
    /// Exit after printing N frames.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct TelemetryArgs {
    #[command(flatten)]
    pub port: PortArgs,
    /// Telemetry slot.
    #[arg(long, default_value_t = 0)]
    pub id: u8,
    /// Registers to report, as register[:motor] (comma-separated).
    #[arg(long, short = 'r', value_delimiter = ',')]
    pub registers: Option<Vec<String>>,
    /// Report every N control iterations.
    #[arg(long)]
    pub downsample: Option<u32>,
    /// Exit after printing N samples.
    #[arg(long)]
    pub count: Option<usize>,
    /// Set the slot's downsample to 0 before exiting.
    #[arg(long)]
    pub stop: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(match unit {
        "ms" => Duration::from_millis(value),
        _ => Duration::from_secs(value),
    })
}
