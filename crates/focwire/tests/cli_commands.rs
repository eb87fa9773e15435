#![cfg(feature = "cli")]

use std::process::Command;

fn focwire() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_focwire"));
    cmd.arg("--log-level").arg("error");
    cmd
}

fn missing_port() -> String {
    if cfg!(windows) {
        "COM250".to_string()
    } else {
        format!("/dev/focwire-missing-{}", std::process::id())
    }
}

#[test]
fn registers_lists_builtin_catalog_as_json_lines() {
    let output = focwire()
        .arg("--format")
        .arg("json")
        .arg("registers")
        .output()
        .expect("registers should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let rows: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be json"))
        .collect();

    let target = rows
        .iter()
        .find(|row| row["name"] == "REG_TARGET")
        .expect("REG_TARGET should be listed");
    assert_eq!(target["id"], 8);
    assert_eq!(target["read"], "f");
    assert_eq!(target["write"], "f");

    let ids: Vec<u64> = rows.iter().filter_map(|row| row["id"].as_u64()).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn version_reports_package_version() {
    let output = focwire().arg("version").output().expect("version should run");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("focwire {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn get_on_missing_port_returns_transport_error() {
    let output = focwire()
        .arg("get")
        .arg(missing_port())
        .arg("target")
        .arg("--timeout")
        .arg("200ms")
        .output()
        .expect("get should run");

    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("connect failed"));
}

#[test]
fn unknown_register_is_a_usage_error() {
    let output = focwire()
        .arg("get")
        .arg(missing_port())
        .arg("REG_DOES_NOT_EXIST")
        .output()
        .expect("get should run");

    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn set_checks_value_count_before_connecting() {
    let output = focwire()
        .arg("set")
        .arg(missing_port())
        .arg("target")
        .arg("1.0")
        .arg("2.0")
        .output()
        .expect("set should run");

    assert_eq!(output.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&output.stderr).contains("takes 1 value(s), got 2"));
}
