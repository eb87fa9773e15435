use focwire_registers::Catalog;

use crate::cmd::RegistersArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_registers, OutputFormat};

pub fn run(_args: RegistersArgs, format: OutputFormat) -> CliResult<i32> {
    print_registers(&Catalog::global(), format);
    Ok(SUCCESS)
}
