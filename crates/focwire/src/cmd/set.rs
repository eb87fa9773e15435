use focwire_frame::parse_value;
use focwire_registers::{Catalog, Register, Value};

use crate::cmd::{parse_duration, SetArgs};
use crate::exit::{link_error, register_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_values, OutputFormat};

pub fn run(args: SetArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let register = Catalog::global()
        .parse(args.register.as_str())
        .map_err(|err| register_error("invalid register", err))?;
    let values = parse_values(&register, &args.values)?;

    let motors = args.port.connect()?;
    let result = if args.wait {
        motors
            .set_register_with_response(args.motor, &register, values, timeout)
            .map(Some)
    } else {
        motors
            .set_register(args.motor, &register, values)
            .map(|()| None)
    };
    let _ = motors.disconnect();

    if let Some(reported) = result.map_err(|err| link_error("write failed", err))? {
        print_values(&register, args.motor, &reported, format);
    }
    Ok(SUCCESS)
}

/// Parse CLI value tokens, checking the count against the write layout.
fn parse_values(register: &Register, tokens: &[String]) -> CliResult<Vec<Value>> {
    if !register.is_writable() {
        return Err(CliError::new(
            USAGE,
            format!("{} is read-only", register.name),
        ));
    }
    if tokens.len() != register.write_types.len() {
        return Err(CliError::new(
            USAGE,
            format!(
                "{} takes {} value(s), got {}",
                register.name,
                register.write_types.len(),
                tokens.len()
            ),
        ));
    }
    tokens
        .iter()
        .map(|token| {
            parse_value(token).map_err(|err| CliError::new(USAGE, format!("{token}: {err}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use focwire_registers::builtin;

    use super::*;

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn parses_values_for_layout() {
        let catalog = Catalog::builtin();
        let target = catalog.lookup_by_id(builtin::TARGET).unwrap();
        assert_eq!(
            parse_values(&target, &tokens(&["-1.5"])).unwrap(),
            vec![Value::Float(-1.5)]
        );

        let mode = catalog.lookup_by_id(builtin::CONTROL_MODE).unwrap();
        assert_eq!(
            parse_values(&mode, &tokens(&["0x02"])).unwrap(),
            vec![Value::Int(2)]
        );
    }

    #[test]
    fn rejects_wrong_count_and_read_only() {
        let catalog = Catalog::builtin();
        let target = catalog.lookup_by_id(builtin::TARGET).unwrap();
        let err = parse_values(&target, &tokens(&["1.0", "2.0"])).unwrap_err();
        assert_eq!(err.code, USAGE);

        let angle = catalog.lookup_by_id(builtin::ANGLE).unwrap();
        let err = parse_values(&angle, &tokens(&["1.0"])).unwrap_err();
        assert!(err.message.contains("read-only"));

        let err = parse_values(&target, &tokens(&["abc"])).unwrap_err();
        assert_eq!(err.code, USAGE);
    }
}
