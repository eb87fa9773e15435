use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use focwire_frame::{Frame, TelemetryPayload};
use focwire_registers::{builtin, decode_layout, layout_size, Register, RegisterRef, ScalarType, Value};
use tracing::{debug, warn};

use crate::bus::{Broadcast, Subscription};
use crate::connection::{Inbound, InboundStage};
use crate::error::{LinkError, Result};
use crate::motors::Motors;

pub use focwire_frame::MAX_TELEMETRY_IDS;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Decode schema announced by the device for one telemetry slot.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryHeader {
    pub registers: Vec<(Arc<Register>, u8)>,
    read_size: usize,
    scalar_count: usize,
}

impl TelemetryHeader {
    pub fn new(registers: Vec<(Arc<Register>, u8)>) -> Self {
        let read_size = registers.iter().map(|(r, _)| r.read_size()).sum();
        let scalar_count = registers.iter().map(|(r, _)| r.read_types.len()).sum();
        Self {
            registers,
            read_size,
            scalar_count,
        }
    }

    /// Raw payload size a matching TELEMETRY frame carries.
    pub fn read_size(&self) -> usize {
        self.read_size
    }

    /// Number of scalars a matching TELEMETRY frame carries.
    pub fn scalar_count(&self) -> usize {
        self.scalar_count
    }

    /// Decode a payload against this header, or `None` if it does not fit.
    fn decode(&self, payload: &TelemetryPayload) -> Option<Vec<Value>> {
        match payload {
            TelemetryPayload::Raw(raw) if raw.len() == self.read_size => {
                let types: Vec<ScalarType> = self
                    .registers
                    .iter()
                    .flat_map(|(r, _)| r.read_types.iter().copied())
                    .collect();
                debug_assert_eq!(layout_size(&types), raw.len());
                Some(decode_layout(&types, raw))
            }
            TelemetryPayload::Values(values) if values.len() == self.scalar_count => {
                Some(values.clone())
            }
            _ => None,
        }
    }
}

/// One decoded telemetry frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySample {
    pub telemetry_id: u8,
    /// `(register, motor)` pairs from the header, in frame order.
    pub registers: Vec<(Arc<Register>, u8)>,
    /// Flat value list aligned with `registers`' read layouts.
    pub values: Vec<Value>,
    pub received_at: SystemTime,
}

impl TelemetrySample {
    /// Values grouped per `(register, motor)` entry.
    pub fn fields(&self) -> Vec<(&Arc<Register>, u8, &[Value])> {
        let mut offset = 0;
        self.registers
            .iter()
            .map(|(register, motor)| {
                let end = (offset + register.read_types.len()).min(self.values.len());
                let start = offset.min(end);
                offset += register.read_types.len();
                (register, *motor, &self.values[start..end])
            })
            .collect()
    }
}

/// Inbound stage caching headers and publishing decoded samples.
#[derive(Debug)]
pub(crate) struct TelemetryDecoder {
    headers: Mutex<[Option<TelemetryHeader>; MAX_TELEMETRY_IDS]>,
    configured: Mutex<Option<u8>>,
    samples: Broadcast<TelemetrySample>,
}

impl TelemetryDecoder {
    pub(crate) fn new() -> Self {
        Self {
            headers: Mutex::new(Default::default()),
            configured: Mutex::new(None),
            samples: Broadcast::new(),
        }
    }

    fn store_header(&self, telemetry_id: Option<u8>, registers: &[(Arc<Register>, u8)]) {
        let slot = telemetry_id.unwrap_or_else(|| lock(&self.configured).unwrap_or(0));
        let mut headers = lock(&self.headers);
        match headers.get_mut(usize::from(slot)) {
            Some(entry) => {
                *entry = Some(TelemetryHeader::new(registers.to_vec()));
                debug!(
                    telemetry_id = slot,
                    registers = registers.len(),
                    "telemetry header cached"
                );
            }
            None => warn!(telemetry_id = slot, "dropping header for out-of-range telemetry id"),
        }
    }

    fn decode(&self, telemetry_id: u8, payload: &TelemetryPayload, received_at: SystemTime) {
        let header = lock(&self.headers)
            .get(usize::from(telemetry_id))
            .cloned()
            .flatten();
        let Some(header) = header else {
            debug!(telemetry_id, "dropping telemetry without header");
            return;
        };
        let Some(values) = header.decode(payload) else {
            debug!(telemetry_id, "dropping telemetry that does not match its header");
            return;
        };
        self.samples.publish(&TelemetrySample {
            telemetry_id,
            registers: header.registers,
            values,
            received_at,
        });
    }
}

impl InboundStage for TelemetryDecoder {
    fn process(&self, inbound: &mut Inbound) {
        match &inbound.frame {
            Frame::Header {
                telemetry_id,
                registers,
            } => self.store_header(*telemetry_id, registers),
            Frame::Telemetry {
                telemetry_id,
                payload,
            } => self.decode(*telemetry_id, payload, inbound.received_at),
            _ => {}
        }
    }
}

/// Telemetry configuration and decoded samples for one connection.
///
/// Obtained from [`Motors::telemetry`]. Configuration writes go to motor 0,
/// the board-level address.
#[derive(Debug)]
pub struct Telemetry<'a> {
    motors: &'a Motors,
    decoder: Arc<TelemetryDecoder>,
}

impl<'a> Telemetry<'a> {
    pub(crate) fn new(motors: &'a Motors, decoder: Arc<TelemetryDecoder>) -> Self {
        Self { motors, decoder }
    }

    /// Program the register list reported in slot `telemetry_id`.
    pub fn set_registers<R>(&self, telemetry_id: u8, registers: &[(R, u8)]) -> Result<()>
    where
        R: Into<RegisterRef> + Clone,
    {
        check_id(telemetry_id)?;
        let catalog = self.motors.catalog();

        let mut values = Vec::with_capacity(1 + registers.len() * 2);
        values.push(Value::Int(registers.len() as i64));
        for (register, motor) in registers {
            let register = catalog.parse(register.clone())?;
            values.push(Value::from(register.id));
            values.push(Value::from(*motor));
        }
        let list = catalog
            .parse(builtin::TELEMETRY_REG)?
            .with_write_types(vec![ScalarType::Byte; values.len()]);

        let mut configured = lock(&self.decoder.configured);
        self.select(&mut configured, telemetry_id)?;
        self.motors.set_register(0, list, values)
    }

    /// Report slot `telemetry_id` every `downsample` control iterations.
    pub fn set_downsample(&self, telemetry_id: u8, downsample: u32) -> Result<()> {
        check_id(telemetry_id)?;
        let downsample = i64::from(downsample);
        let mut configured = lock(&self.decoder.configured);
        self.select(&mut configured, telemetry_id)?;
        self.motors.set_register(
            0,
            builtin::TELEMETRY_DOWNSAMPLE,
            vec![Value::Int(downsample)],
        )
    }

    /// Stop reporting slot `telemetry_id`.
    pub fn stop(&self, telemetry_id: u8) -> Result<()> {
        self.set_downsample(telemetry_id, 0)
    }

    /// Last header received for `telemetry_id`.
    pub fn header(&self, telemetry_id: u8) -> Option<TelemetryHeader> {
        lock(&self.decoder.headers)
            .get(usize::from(telemetry_id))
            .cloned()
            .flatten()
    }

    /// Make `telemetry_id` the slot the device configures and reports
    /// id-less headers for. Writes nothing if it already is.
    pub fn select_id(&self, telemetry_id: u8) -> Result<()> {
        check_id(telemetry_id)?;
        let mut configured = lock(&self.decoder.configured);
        self.select(&mut configured, telemetry_id)
    }

    /// Ask the device to report its telemetry headers.
    pub fn fetch_headers(&self) -> Result<()> {
        let list = self.motors.catalog().parse(builtin::TELEMETRY_REG)?;
        self.motors.set_register(0, list, Vec::new())
    }

    pub fn subscribe(&self) -> Subscription<TelemetrySample> {
        self.decoder.samples.subscribe_all()
    }

    /// Samples from one slot only.
    pub fn subscribe_id(&self, telemetry_id: u8) -> Subscription<TelemetrySample> {
        self.decoder
            .samples
            .subscribe(move |sample| sample.telemetry_id == telemetry_id)
    }

    /// Slot the device was last told to configure.
    pub fn configured_id(&self) -> Option<u8> {
        *lock(&self.decoder.configured)
    }

    fn select(&self, configured: &mut Option<u8>, telemetry_id: u8) -> Result<()> {
        if *configured == Some(telemetry_id) {
            return Ok(());
        }
        self.motors.set_register(
            0,
            builtin::TELEMETRY_CTRL,
            vec![Value::from(telemetry_id)],
        )?;
        *configured = Some(telemetry_id);
        debug!(telemetry_id, "telemetry slot selected");
        Ok(())
    }
}

fn check_id(telemetry_id: u8) -> Result<()> {
    if usize::from(telemetry_id) < MAX_TELEMETRY_IDS {
        Ok(())
    } else {
        Err(LinkError::InvalidTelemetryId(telemetry_id))
    }
}
