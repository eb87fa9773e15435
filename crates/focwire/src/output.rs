use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use focwire_frame::{Frame, FrameType};
use focwire_link::{Inbound, TelemetrySample};
use focwire_registers::{Catalog, Register, ScalarType, Value};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct RegisterOutput<'a> {
    id: u8,
    name: &'a str,
    read: String,
    write: String,
}

#[derive(Serialize)]
struct ValuesOutput<'a> {
    register: &'a str,
    id: u8,
    motor: u8,
    values: &'a [Value],
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    #[serde(rename = "type")]
    frame_type: FrameType,
    motor: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    register: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    values: Option<&'a [Value]>,
    text: String,
    timestamp_ms: u128,
}

#[derive(Serialize)]
struct FieldOutput<'a> {
    register: &'a str,
    motor: u8,
    values: &'a [Value],
}

#[derive(Serialize)]
struct SampleOutput<'a> {
    telemetry_id: u8,
    fields: Vec<FieldOutput<'a>>,
    timestamp_ms: u128,
}

fn tags(types: &[ScalarType]) -> String {
    types.iter().map(|t| t.tag()).collect()
}

fn join(values: &[Value]) -> String {
    values
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn unix_millis(at: SystemTime) -> u128 {
    at.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn print_registers(catalog: &Catalog, format: OutputFormat) {
    let mut registers: Vec<&Register> = catalog.iter().map(|r| &**r).collect();
    registers.sort_by_key(|r| r.id);

    match format {
        OutputFormat::Json => {
            for register in registers {
                print_json(&RegisterOutput {
                    id: register.id,
                    name: &register.name,
                    read: tags(&register.read_types),
                    write: tags(&register.write_types),
                });
            }
        }
        OutputFormat::Table => {
            let mut out = table(vec!["ID", "NAME", "READ", "WRITE"]);
            for register in registers {
                out.add_row(vec![
                    format!("0x{:02X}", register.id),
                    register.name.clone(),
                    tags(&register.read_types),
                    tags(&register.write_types),
                ]);
            }
            println!("{out}");
        }
        OutputFormat::Pretty => {
            for register in registers {
                println!(
                    "0x{:02X} {} read={} write={}",
                    register.id,
                    register.name,
                    tags(&register.read_types),
                    tags(&register.write_types)
                );
            }
        }
    }
}

pub fn print_values(register: &Register, motor: u8, values: &[Value], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&ValuesOutput {
            register: &register.name,
            id: register.id,
            motor,
            values,
        }),
        OutputFormat::Table => {
            let mut out = table(vec!["MOTOR", "REGISTER", "VALUES"]);
            out.add_row(vec![motor.to_string(), register.name.clone(), join(values)]);
            println!("{out}");
        }
        OutputFormat::Pretty => {
            println!("motor={motor} {}={}", register.name, join(values));
        }
    }
}

pub fn print_inbound(inbound: &Inbound, format: OutputFormat) {
    let frame = &inbound.frame;
    match format {
        OutputFormat::Json => print_json(&FrameOutput {
            frame_type: frame.frame_type(),
            motor: inbound.motor_id,
            register: frame.register().map(|r| r.name.as_str()),
            values: frame.values(),
            text: frame.to_string(),
            timestamp_ms: unix_millis(inbound.received_at),
        }),
        OutputFormat::Table => {
            let mut out = table(vec!["TYPE", "MOTOR", "FRAME"]);
            out.add_row(vec![
                format!("{:?}", frame.frame_type()),
                motor_label(inbound.motor_id),
                frame.to_string(),
            ]);
            println!("{out}");
        }
        OutputFormat::Pretty => match frame {
            Frame::Alert { message } => {
                println!("alert motor={} {message}", motor_label(inbound.motor_id))
            }
            _ => println!("motor={} {frame}", motor_label(inbound.motor_id)),
        },
    }
}

pub fn print_sample(sample: &TelemetrySample, format: OutputFormat) {
    let fields = sample.fields();
    match format {
        OutputFormat::Json => print_json(&SampleOutput {
            telemetry_id: sample.telemetry_id,
            fields: fields
                .iter()
                .map(|(register, motor, values)| FieldOutput {
                    register: register.short_name(),
                    motor: *motor,
                    values,
                })
                .collect(),
            timestamp_ms: unix_millis(sample.received_at),
        }),
        OutputFormat::Table => {
            let mut out = table(vec!["ID", "MOTOR", "REGISTER", "VALUES"]);
            for (register, motor, values) in &fields {
                out.add_row(vec![
                    sample.telemetry_id.to_string(),
                    motor.to_string(),
                    register.short_name().to_string(),
                    join(values),
                ]);
            }
            println!("{out}");
        }
        OutputFormat::Pretty => {
            let line = fields
                .iter()
                .map(|(register, motor, values)| {
                    format!("{}[{motor}]={}", register.short_name(), join(values))
                })
                .collect::<Vec<_>>()
                .join(" ");
            println!("T{} {line}", sample.telemetry_id);
        }
    }
}

fn motor_label(motor: Option<u8>) -> String {
    motor.map_or_else(|| "-".to_string(), |m| m.to_string())
}
