// src/sensor/mod.rs

// One module per physical sensor family. Each provider owns exactly the
// fields it measures and its own power/calibration state.

pub mod climate;
pub mod ph;
pub mod submerged;

pub use climate::ClimateSensor;
pub use ph::PhSensor;
pub use submerged::SubmergedSensor;

use crate::common::{error::SensorError, field::Field};
use arrayvec::ArrayVec;

/// Most fields any single provider reports.
pub const MAX_FIELDS_PER_PROVIDER: usize = 3;

/// Values produced by one successful provider read.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Readout {
    values: ArrayVec<(Field, f32), MAX_FIELDS_PER_PROVIDER>,
}

impl Readout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value. Values beyond the capacity are dropped.
    pub fn push(&mut self, field: Field, value: f32) {
        let _ = self.values.try_push((field, value));
    }

    pub fn with(mut self, field: Field, value: f32) -> Self {
        self.push(field, value);
        self
    }

    pub fn get(&self, field: Field) -> Option<f32> {
        self.values.iter().find(|(f, _)| *f == field).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, f32)> + '_ {
        self.values.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Uniform capability interface over a physical sensor.
///
/// A provider may be absent (never initialized), healthy, or transiently
/// failing. None of the methods panic or propagate hardware errors; failures
/// are expressed through the availability flag and [`SensorError`].
pub trait SensorProvider {
    /// Short human-readable name, used in logs.
    fn name(&self) -> &'static str;

    /// Fields this provider owns. A [`Readout`] never contains anything else.
    fn fields(&self) -> &'static [Field];

    /// Hardware bring-up. Marks the provider available on success.
    ///
    /// May block for power-stabilization delays.
    fn init(&mut self) -> bool;

    /// Last known health. No I/O.
    fn is_available(&self) -> bool;

    /// `true` straight away if already available, otherwise runs [`init`](Self::init) again.
    fn retry_init(&mut self) -> bool {
        if self.is_available() {
            return true;
        }
        self.init()
    }

    /// Reads every field this provider owns.
    ///
    /// Returns `Err(SensorError::Unavailable)` without touching hardware when
    /// the provider is not available. A `ReadInvalid` failure leaves the
    /// provider available.
    fn read_all(&mut self) -> Result<Readout, SensorError>;

    /// Feeds a measurement this provider's quantity depends on (e.g. water
    /// temperature for pH). `None` selects the provider's static default.
    fn set_compensation_input(&mut self, _value: Option<f32>) {}

    /// Forces the availability flag, bypassing hardware state. Test hook.
    fn set_forced_availability(&mut self, available: bool);
}
