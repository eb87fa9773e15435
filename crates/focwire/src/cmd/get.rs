use focwire_registers::Catalog;

use crate::cmd::{parse_duration, GetArgs};
use crate::exit::{link_error, register_error, CliResult, SUCCESS};
use crate::output::{print_values, OutputFormat};

pub fn run(args: GetArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let register = Catalog::global()
        .parse(args.register.as_str())
        .map_err(|err| register_error("invalid register", err))?;

    let motors = args.port.connect()?;
    let result = motors.get_register(args.motor, &register, timeout);
    let _ = motors.disconnect();

    let values = result.map_err(|err| link_error("read failed", err))?;
    print_values(&register, args.motor, &values, format);
    Ok(SUCCESS)
}
