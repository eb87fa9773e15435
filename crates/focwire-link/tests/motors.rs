mod common;

use std::thread;
use std::time::{Duration, Instant};

use common::{binary_motors, register_ids, WAIT};
use focwire_frame::Frame;
use focwire_link::{Limits, LinkError};
use focwire_registers::{builtin, MotionControlType, TorqueControlType, Value};

#[test]
fn addressing_emits_one_address_per_motor_switch() {
    let (motors, mut device) = binary_motors();

    motors
        .set_register(0, builtin::TARGET, vec![Value::Float(1.0)])
        .unwrap();
    motors
        .set_register(0, "target", vec![Value::Float(2.0)])
        .unwrap();
    motors
        .set_register(1, "0x08", vec![Value::Float(3.0)])
        .unwrap();
    motors
        .set_register(1, "REG_VOLTAGE_LIMIT", vec![Value::Float(6.0)])
        .unwrap();

    let frames = device.received();
    assert_eq!(
        register_ids(&frames),
        vec![
            builtin::MOTOR_ADDRESS,
            builtin::TARGET,
            builtin::TARGET,
            builtin::MOTOR_ADDRESS,
            builtin::TARGET,
            builtin::VOLTAGE_LIMIT,
        ]
    );
    assert_eq!(frames[0].values().unwrap(), &[Value::Int(0)]);
    assert_eq!(frames[3].values().unwrap(), &[Value::Int(1)]);
    assert_eq!(frames[4].values().unwrap(), &[Value::Float(3.0)]);
    assert_eq!(motors.current_motor(), Some(1));
}

#[test]
fn unknown_register_is_rejected_before_writing() {
    let (motors, device) = binary_motors();
    let err = motors
        .set_register(0, "REG_NOPE", vec![Value::Int(1)])
        .unwrap_err();
    assert!(matches!(err, LinkError::Register(_)));
    assert!(device.handle.written().is_empty());
}

#[test]
fn get_register_returns_device_response() {
    let (motors, mut device) = binary_motors();

    thread::scope(|s| {
        s.spawn(|| {
            // MOTOR_ADDRESS write (5 bytes) + read request (4 bytes).
            assert!(device.handle.wait_written(9, WAIT));
            let frames = device.received();
            assert_eq!(
                register_ids(&frames),
                vec![builtin::MOTOR_ADDRESS, builtin::TARGET]
            );
            let target = motors.catalog().lookup_by_id(builtin::TARGET).unwrap();
            device.send(&[Frame::Response {
                register: target,
                values: vec![Value::Float(12.5)],
            }]);
        });

        let values = motors.get_register(0, "target", WAIT).unwrap();
        assert_eq!(values, vec![Value::Float(12.5)]);
    });
}

#[test]
fn get_register_times_out_without_response() {
    let (motors, _device) = binary_motors();
    let timeout = Duration::from_millis(100);

    let started = Instant::now();
    let err = motors.get_register(0, builtin::TARGET, timeout).unwrap_err();

    assert!(matches!(err, LinkError::Timeout(d) if d == timeout));
    let elapsed = started.elapsed();
    assert!(elapsed >= timeout);
    assert!(
        elapsed < timeout + Duration::from_millis(100),
        "timed out late: {elapsed:?}"
    );
}

#[test]
fn response_for_other_motor_does_not_satisfy_read() {
    let (motors, device) = binary_motors();
    let catalog = motors.catalog().clone();

    thread::scope(|s| {
        s.spawn(|| {
            assert!(device.handle.wait_written(9, WAIT));
            let address = catalog.lookup_by_id(builtin::MOTOR_ADDRESS).unwrap();
            let target = catalog.lookup_by_id(builtin::TARGET).unwrap();
            device.send(&[
                Frame::Response {
                    register: address,
                    values: vec![Value::Int(0)],
                },
                Frame::Response {
                    register: target,
                    values: vec![Value::Float(1.0)],
                },
            ]);
        });

        let err = motors
            .get_register(1, builtin::TARGET, Duration::from_millis(300))
            .unwrap_err();
        assert!(matches!(err, LinkError::Timeout(_)));
    });
}

#[test]
fn responses_are_stamped_with_acknowledged_motor() {
    let (motors, device) = binary_motors();
    let motor_two = motors.motor(2).subscribe();
    let all = motors.subscribe();

    let catalog = motors.catalog();
    device.send(&[
        Frame::Response {
            register: catalog.lookup_by_id(builtin::MOTOR_ADDRESS).unwrap(),
            values: vec![Value::Int(2)],
        },
        Frame::Response {
            register: catalog.lookup_by_id(builtin::VELOCITY).unwrap(),
            values: vec![Value::Float(4.0)],
        },
        Frame::Alert {
            message: "stall".to_string(),
        },
    ]);

    for _ in 0..3 {
        let inbound = motor_two.recv_timeout(WAIT).unwrap();
        assert_eq!(inbound.motor_id, Some(2));
        assert_eq!(all.recv_timeout(WAIT).unwrap().frame, inbound.frame);
    }
}

#[test]
fn disconnect_resolves_pending_read() {
    let (motors, device) = binary_motors();

    thread::scope(|s| {
        let reader = s.spawn(|| motors.get_register(0, builtin::ANGLE, Duration::from_secs(10)));
        assert!(device.handle.wait_written(9, WAIT));
        motors.disconnect().unwrap();

        let err = reader.join().unwrap().unwrap_err();
        assert!(matches!(err, LinkError::Disconnected));
    });
}

#[test]
fn motor_helpers_write_expected_registers() {
    let (motors, mut device) = binary_motors();
    let motor = motors.motor(3);

    motor
        .set_mode(MotionControlType::Velocity, TorqueControlType::Voltage)
        .unwrap();
    motor
        .set_limits(Limits {
            voltage: Some(12.0),
            velocity: Some(20.0),
            ..Limits::default()
        })
        .unwrap();
    motor.enable().unwrap();

    let frames = device.received();
    assert_eq!(
        register_ids(&frames),
        vec![
            builtin::MOTOR_ADDRESS,
            builtin::CONTROL_MODE,
            builtin::TORQUE_MODE,
            builtin::VOLTAGE_LIMIT,
            builtin::VEL_LIMIT,
            builtin::ENABLE,
        ]
    );
    assert_eq!(frames[1].values().unwrap(), &[Value::Int(1)]);
    assert_eq!(frames[5].values().unwrap(), &[Value::Int(1)]);
}

#[test]
fn set_register_with_response_waits_for_device() {
    let (motors, device) = binary_motors();

    thread::scope(|s| {
        s.spawn(|| {
            // MOTOR_ADDRESS write (5 bytes) + TARGET write (8 bytes).
            assert!(device.handle.wait_written(13, WAIT));
            let target = motors.catalog().lookup_by_id(builtin::TARGET).unwrap();
            device.send(&[Frame::Response {
                register: target,
                values: vec![Value::Float(5.0)],
            }]);
        });

        let values = motors
            .set_register_with_response(0, builtin::TARGET, vec![Value::Float(5.0)], WAIT)
            .unwrap();
        assert_eq!(values, vec![Value::Float(5.0)]);
    });
}
