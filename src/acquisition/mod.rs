// src/acquisition/mod.rs

//! Per-cycle orchestration: read every attached provider, merge into one
//! [`ReadingRecord`], and hand it to the encoder.

use crate::common::{
    capability::CapabilitySet,
    error::PayloadError,
    field::Field,
    hal_traits::BatteryMonitor,
    reading::ReadingRecord,
};
use crate::payload::{encoder, PayloadBuffer};
use crate::sensor::SensorProvider;
use arrayvec::ArrayVec;

/// Number of provider slots.
pub const MAX_PROVIDERS: usize = 3;

/// Acquisition orchestrator.
///
/// Borrows its providers for its whole lifetime and reads them in a fixed
/// order: climate, submerged, chemistry. The battery monitor is always read
/// and is not a provider.
pub struct Acquisition<'a, B> {
    battery: B,
    climate: Option<&'a mut dyn SensorProvider>,
    submerged: Option<&'a mut dyn SensorProvider>,
    chemistry: Option<&'a mut dyn SensorProvider>,
}

impl<'a, B> Acquisition<'a, B>
where
    B: BatteryMonitor,
{
    pub fn new(battery: B) -> Self {
        Acquisition {
            battery,
            climate: None,
            submerged: None,
            chemistry: None,
        }
    }

    /// Attaches the air-side provider (outdoor temperature, humidity, pressure).
    pub fn with_climate(mut self, provider: &'a mut dyn SensorProvider) -> Self {
        self.climate = Some(provider);
        self
    }

    /// Attaches the water temperature provider.
    pub fn with_submerged(mut self, provider: &'a mut dyn SensorProvider) -> Self {
        self.submerged = Some(provider);
        self
    }

    /// Attaches the pH provider. It receives the climate temperature as its
    /// compensation input before every read.
    pub fn with_chemistry(mut self, provider: &'a mut dyn SensorProvider) -> Self {
        self.chemistry = Some(provider);
        self
    }

    pub fn battery_mut(&mut self) -> &mut B {
        &mut self.battery
    }

    fn providers(&self) -> impl Iterator<Item = &(dyn SensorProvider + 'a)> + '_ {
        [
            self.climate.as_deref(),
            self.submerged.as_deref(),
            self.chemistry.as_deref(),
        ]
        .into_iter()
        .flatten()
    }

    fn providers_mut(&mut self) -> impl Iterator<Item = &mut (dyn SensorProvider + 'a)> + '_ {
        [
            self.climate.as_deref_mut(),
            self.submerged.as_deref_mut(),
            self.chemistry.as_deref_mut(),
        ]
        .into_iter()
        .flatten()
    }

    /// Runs `init` on every attached provider. Returns `true` if any came up.
    pub fn init_all(&mut self) -> bool {
        let mut any = false;
        for provider in self.providers_mut() {
            let ok = provider.init();
            if ok {
                info!("acquisition: {} initialized", provider.name());
            } else {
                warn!("acquisition: {} not detected", provider.name());
            }
            any |= ok;
        }
        any
    }

    pub fn is_any_available(&self) -> bool {
        self.providers().any(|p| p.is_available())
    }

    /// Calls `retry_init` on every attached provider, without short-circuiting.
    pub fn retry_init_all(&mut self) -> bool {
        self.providers_mut().fold(false, |any, p| p.retry_init() | any)
    }

    pub fn set_forced_availability_all(&mut self, available: bool) {
        for provider in self.providers_mut() {
            provider.set_forced_availability(available);
        }
    }

    /// Names of the attached providers that are currently available, in read order.
    pub fn active_sensors(&self) -> ArrayVec<&'static str, MAX_PROVIDERS> {
        self.providers().filter(|p| p.is_available()).map(|p| p.name()).collect()
    }

    /// One acquisition cycle.
    ///
    /// Never fails: a provider that errors leaves its fields at their
    /// sentinels. When no provider produced anything, `valid` is false and
    /// every provider gets a `retry_init`.
    pub fn acquire_all(&mut self) -> ReadingRecord {
        let mut record = ReadingRecord::sentinel();

        match self.battery.read_voltage() {
            Ok(volts) => record.battery = volts,
            Err(_) => warn!("acquisition: battery read failed"),
        }

        let mut updated = false;
        if let Some(provider) = self.climate.as_deref_mut() {
            updated |= merge(provider, &mut record);
        }
        if let Some(provider) = self.submerged.as_deref_mut() {
            updated |= merge(provider, &mut record);
        }
        if let Some(provider) = self.chemistry.as_deref_mut() {
            provider.set_compensation_input(record.value(Field::OutdoorTemperature));
            updated |= merge(provider, &mut record);
        }

        record.valid = updated;
        if !updated {
            warn!("acquisition: no sensor produced data, retrying init");
            self.retry_init_all();
        }
        record
    }

    /// Acquires and encodes one frame into `buffer`.
    ///
    /// The capacity check runs first, so a too-small buffer costs no sensor I/O.
    pub fn acquire_into(
        &mut self,
        caps: &CapabilitySet,
        buffer: &mut PayloadBuffer<'_>,
    ) -> Result<(ReadingRecord, usize), PayloadError> {
        let needed = caps.frame_len();
        if buffer.remaining() < needed {
            return Err(PayloadError::BufferTooSmall {
                needed,
                got: buffer.remaining(),
            });
        }

        let record = self.acquire_all();
        let written = encoder::encode(&record, caps, buffer)?;
        Ok((record, written))
    }
}

/// Copies one provider's readout into the record, keeping only non-sentinel
/// values for fields the provider owns. Returns `true` if anything was written.
fn merge(provider: &mut dyn SensorProvider, record: &mut ReadingRecord) -> bool {
    let readout = match provider.read_all() {
        Ok(readout) => readout,
        Err(e) => {
            warn!("acquisition: {} read failed: {}", provider.name(), e);
            return false;
        }
    };

    let owned = provider.fields();
    let mut updated = false;
    for (field, value) in readout.iter() {
        if !owned.contains(&field) {
            warn!("acquisition: {} reported foreign field {}", provider.name(), field);
            continue;
        }
        if field.is_sentinel(value) {
            continue;
        }
        record.set(field, value);
        updated = true;
    }
    updated
}
