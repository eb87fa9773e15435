use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use focwire_link::RecvError;

use crate::cmd::ListenArgs;
use crate::exit::{CliError, CliResult, FAILURE, INTERNAL, SUCCESS};
use crate::output::{print_inbound, OutputFormat};

pub(crate) const POLL: Duration = Duration::from_millis(100);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let motors = args.port.connect()?;
    let frames = match args.motor {
        Some(motor) => motors.subscribe_motor(motor),
        None => motors.subscribe(),
    };

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        let inbound = match frames.recv_timeout(POLL) {
            Ok(inbound) => inbound,
            Err(RecvError::Timeout) => continue,
            Err(RecvError::Closed) => {
                return Err(CliError::new(FAILURE, "connection closed"));
            }
        };

        print_inbound(&inbound, format);
        printed = printed.saturating_add(1);

        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
    }

    let _ = motors.disconnect();
    Ok(SUCCESS)
}

pub(crate) fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
