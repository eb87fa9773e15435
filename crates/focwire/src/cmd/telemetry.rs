use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use focwire_link::{Motors, RecvError};
use focwire_registers::{Catalog, Register};

use crate::cmd::listen::{install_ctrlc_handler, POLL};
use crate::cmd::TelemetryArgs;
use crate::exit::{link_error, register_error, CliError, CliResult, FAILURE, SUCCESS, USAGE};
use crate::output::{print_sample, OutputFormat};

pub fn run(args: TelemetryArgs, format: OutputFormat) -> CliResult<i32> {
    let registers = match &args.registers {
        Some(entries) => Some(parse_registers(&Catalog::global(), entries)?),
        None => None,
    };

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let motors = args.port.connect()?;
    let result = stream(&motors, &args, registers.as_deref(), &running, format);
    if args.stop {
        if let Err(err) = motors.telemetry().stop(args.id) {
            tracing::warn!(error = %err, telemetry_id = args.id, "failed to stop telemetry");
        }
    }
    let _ = motors.disconnect();
    result
}

fn stream(
    motors: &Motors,
    args: &TelemetryArgs,
    registers: Option<&[(Arc<Register>, u8)]>,
    running: &AtomicBool,
    format: OutputFormat,
) -> CliResult<i32> {
    let telemetry = motors.telemetry();
    let samples = telemetry.subscribe_id(args.id);

    if let Some(registers) = registers {
        telemetry
            .set_registers(args.id, registers)
            .map_err(|err| link_error("telemetry setup failed", err))?;
    } else {
        // Binary headers carry no slot id; they land in the selected slot.
        telemetry
            .select_id(args.id)
            .and_then(|()| telemetry.fetch_headers())
            .map_err(|err| link_error("header request failed", err))?;
    }
    if let Some(downsample) = args.downsample {
        telemetry
            .set_downsample(args.id, downsample)
            .map_err(|err| link_error("telemetry setup failed", err))?;
    }

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        let sample = match samples.recv_timeout(POLL) {
            Ok(sample) => sample,
            Err(RecvError::Timeout) => continue,
            Err(RecvError::Closed) => return Err(CliError::new(FAILURE, "connection closed")),
        };

        print_sample(&sample, format);
        printed = printed.saturating_add(1);

        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
    }
    Ok(SUCCESS)
}

/// Parse `register[:motor]` entries.
fn parse_registers(catalog: &Catalog, entries: &[String]) -> CliResult<Vec<(Arc<Register>, u8)>> {
    entries
        .iter()
        .map(|entry| {
            let (register, motor) = match entry.split_once(':') {
                Some((register, motor)) => {
                    let motor = motor.trim().parse::<u8>().map_err(|_| {
                        CliError::new(USAGE, format!("invalid motor in '{entry}'"))
                    })?;
                    (register, motor)
                }
                None => (entry.as_str(), 0),
            };
            let register = catalog
                .parse(register)
                .map_err(|err| register_error("invalid telemetry register", err))?;
            Ok((register, motor))
        })
        .collect()
}
