use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use focwire_frame::{Echo, Frame, FrameType};
use focwire_registers::{builtin, Catalog, Register, RegisterRef, Value};
use tracing::{debug, trace};

use crate::bus::{RecvError, Subscription};
use crate::connection::{Connection, Inbound, InboundStage};
use crate::error::{LinkError, Result};
use crate::motor::Motor;
use crate::telemetry::{Telemetry, TelemetryDecoder};

/// Default wait for register reads issued through [`Motor`] helpers.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Tracks which motor inbound responses belong to.
///
/// The device reports its selected motor by answering `REG_MOTOR_ADDRESS`.
/// Until it has done so after the host last switched motors, the host's own
/// selection is assumed.
#[derive(Debug, Default)]
struct AddressTracker {
    host: Mutex<Option<u8>>,
    device: Mutex<Option<u8>>,
}

impl AddressTracker {
    fn host_selected(&self, motor_id: u8) {
        *lock(&self.host) = Some(motor_id);
        *lock(&self.device) = None;
    }

    fn reset(&self) {
        *lock(&self.host) = None;
        *lock(&self.device) = None;
    }

    fn current(&self) -> Option<u8> {
        let device = *lock(&self.device);
        device.or(*lock(&self.host))
    }
}

impl InboundStage for AddressTracker {
    fn process(&self, inbound: &mut Inbound) {
        match &inbound.frame {
            Frame::Response { register, values } if register.id == builtin::MOTOR_ADDRESS => {
                let reported = values
                    .first()
                    .and_then(Value::as_i64)
                    .and_then(|v| u8::try_from(v).ok());
                if let Some(motor_id) = reported {
                    trace!(motor = motor_id, "device acknowledged motor address");
                    *lock(&self.device) = Some(motor_id);
                }
                inbound.motor_id = self.current();
            }
            Frame::Response { .. } | Frame::Alert { .. } => {
                inbound.motor_id = self.current();
            }
            _ => {}
        }
    }
}

/// Register access for every motor behind one connection.
///
/// The device keeps a "current motor" cursor that all register accesses
/// apply to. `Motors` switches it with a `REG_MOTOR_ADDRESS` write only
/// when the target motor differs from the last one addressed, and stamps
/// inbound responses and alerts with the motor they belong to.
pub struct Motors {
    connection: Arc<Connection>,
    cursor: Mutex<Option<u8>>,
    tracker: Arc<AddressTracker>,
    telemetry: OnceLock<Arc<TelemetryDecoder>>,
}

impl Motors {
    /// Wrap `connection`, installing the motor-stamping stage.
    pub fn new(connection: Arc<Connection>) -> Self {
        let tracker = Arc::new(AddressTracker::default());
        connection.add_stage(Arc::clone(&tracker) as Arc<dyn InboundStage>);
        Self {
            connection,
            cursor: Mutex::new(None),
            tracker,
            telemetry: OnceLock::new(),
        }
    }

    /// Connect and forget any previous motor selection.
    pub fn connect(&self) -> Result<()> {
        let mut cursor = lock(&self.cursor);
        self.connection.connect()?;
        *cursor = None;
        self.tracker.reset();
        Ok(())
    }

    pub fn disconnect(&self) -> Result<()> {
        self.connection.disconnect()
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        self.connection.catalog()
    }

    /// Handle for one motor.
    pub fn motor(&self, motor_id: u8) -> Motor<'_> {
        Motor::new(self, motor_id)
    }

    /// Motor the host last addressed, if any.
    pub fn current_motor(&self) -> Option<u8> {
        *lock(&self.cursor)
    }

    /// Write `values` to `register` on `motor_id`.
    pub fn set_register(
        &self,
        motor_id: u8,
        register: impl Into<RegisterRef>,
        values: Vec<Value>,
    ) -> Result<()> {
        let register = self.catalog().parse(register)?;
        let mut cursor = lock(&self.cursor);
        self.address(&mut cursor, motor_id)?;
        self.connection
            .send_frame(&Frame::write(register, values))
            .map(|_| ())
    }

    /// Read `register` from `motor_id`, waiting up to `timeout` for the
    /// device's response.
    pub fn get_register(
        &self,
        motor_id: u8,
        register: impl Into<RegisterRef>,
        timeout: Duration,
    ) -> Result<Vec<Value>> {
        let register = self.catalog().parse(register)?;
        let responses = self.responses(motor_id, &register);
        {
            let mut cursor = lock(&self.cursor);
            self.address(&mut cursor, motor_id)?;
            self.connection.send_frame(&Frame::read(Arc::clone(&register)))?;
        }
        Self::await_response(&responses, &register, timeout)
    }

    /// Write `values`, then wait for the device to report the register.
    pub fn set_register_with_response(
        &self,
        motor_id: u8,
        register: impl Into<RegisterRef>,
        values: Vec<Value>,
        timeout: Duration,
    ) -> Result<Vec<Value>> {
        let register = self.catalog().parse(register)?;
        let responses = self.responses(motor_id, &register);
        self.set_register(motor_id, Arc::clone(&register), values)?;
        Self::await_response(&responses, &register, timeout)
    }

    /// RESPONSE and ALERT frames, stamped with their motor.
    pub fn subscribe(&self) -> Subscription<Inbound> {
        self.connection.subscribe(|inbound| {
            matches!(
                inbound.frame.frame_type(),
                FrameType::Response | FrameType::Alert
            )
        })
    }

    /// RESPONSE and ALERT frames attributed to `motor_id`.
    pub fn subscribe_motor(&self, motor_id: u8) -> Subscription<Inbound> {
        self.connection.subscribe(move |inbound| {
            inbound.motor_id == Some(motor_id)
                && matches!(
                    inbound.frame.frame_type(),
                    FrameType::Response | FrameType::Alert
                )
        })
    }

    pub fn echo(&self) -> Subscription<Echo> {
        self.connection.echo()
    }

    /// Telemetry configuration and decoded samples.
    ///
    /// The decoder is installed on first use and shared by every handle.
    pub fn telemetry(&self) -> Telemetry<'_> {
        let decoder = self.telemetry.get_or_init(|| {
            let decoder = Arc::new(TelemetryDecoder::new());
            self.connection
                .add_stage(Arc::clone(&decoder) as Arc<dyn InboundStage>);
            decoder
        });
        Telemetry::new(self, Arc::clone(decoder))
    }

    /// Select `motor_id` on the device unless it already is.
    fn address(&self, cursor: &mut Option<u8>, motor_id: u8) -> Result<()> {
        if *cursor == Some(motor_id) {
            return Ok(());
        }
        let address = self.catalog().parse(builtin::MOTOR_ADDRESS)?;
        self.connection
            .send_frame(&Frame::write(address, vec![Value::from(motor_id)]))?;
        *cursor = Some(motor_id);
        self.tracker.host_selected(motor_id);
        debug!(motor = motor_id, "motor addressed");
        Ok(())
    }

    fn responses(&self, motor_id: u8, register: &Register) -> Subscription<Inbound> {
        let register_id = register.id;
        self.connection.subscribe(move |inbound| match &inbound.frame {
            Frame::Response { register, values } => {
                register.id == register_id
                    && inbound.motor_id == Some(motor_id)
                    && !values.is_empty()
            }
            _ => false,
        })
    }

    fn await_response(
        responses: &Subscription<Inbound>,
        register: &Register,
        timeout: Duration,
    ) -> Result<Vec<Value>> {
        match responses.recv_timeout(timeout) {
            Ok(inbound) => Ok(inbound.frame.values().map(<[Value]>::to_vec).unwrap_or_default()),
            Err(RecvError::Timeout) => {
                debug!(register = %register, ?timeout, "no response");
                Err(LinkError::Timeout(timeout))
            }
            Err(RecvError::Closed) => Err(LinkError::Disconnected),
        }
    }
}

impl std::fmt::Debug for Motors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Motors")
            .field("connection", &self.connection)
            .field("current_motor", &self.current_motor())
            .finish()
    }
}
