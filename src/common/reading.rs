// src/common/reading.rs

use super::field::{
    Field, SENTINEL_BATTERY, SENTINEL_HUMIDITY, SENTINEL_PH, SENTINEL_PRESSURE, SENTINEL_TEMPERATURE,
};

/// One snapshot of every measured quantity for a single transmission cycle.
///
/// Each numeric field holds either a measurement or its [`Field::sentinel`].
/// `valid` is true iff at least one sensor field (battery excluded) carries a
/// real measurement.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReadingRecord {
    /// Outdoor temperature, °C.
    pub outdoor_temperature: f32,
    /// Relative humidity, %RH.
    pub humidity: f32,
    /// Pressure, hPa.
    pub pressure: f32,
    /// Submerged temperature, °C.
    pub submerged_temperature: f32,
    /// pH, unitless.
    pub ph: f32,
    /// Battery, V.
    pub battery: f32,
    pub valid: bool,
}

impl ReadingRecord {
    /// A record holding only sentinels.
    pub const fn sentinel() -> Self {
        ReadingRecord {
            outdoor_temperature: SENTINEL_TEMPERATURE,
            humidity: SENTINEL_HUMIDITY,
            pressure: SENTINEL_PRESSURE,
            submerged_temperature: SENTINEL_TEMPERATURE,
            ph: SENTINEL_PH,
            battery: SENTINEL_BATTERY,
            valid: false,
        }
    }

    pub const fn get(&self, field: Field) -> f32 {
        match field {
            Field::Battery => self.battery,
            Field::Ph => self.ph,
            Field::OutdoorTemperature => self.outdoor_temperature,
            Field::SubmergedTemperature => self.submerged_temperature,
            Field::Humidity => self.humidity,
            Field::Pressure => self.pressure,
        }
    }

    pub fn set(&mut self, field: Field, value: f32) {
        let slot = match field {
            Field::Battery => &mut self.battery,
            Field::Ph => &mut self.ph,
            Field::OutdoorTemperature => &mut self.outdoor_temperature,
            Field::SubmergedTemperature => &mut self.submerged_temperature,
            Field::Humidity => &mut self.humidity,
            Field::Pressure => &mut self.pressure,
        };
        *slot = value;
    }

    /// Returns the value unless it is the field's sentinel.
    pub fn value(&self, field: Field) -> Option<f32> {
        let v = self.get(field);
        if field.is_sentinel(v) {
            None
        } else {
            Some(v)
        }
    }
}

impl Default for ReadingRecord {
    fn default() -> Self {
        Self::sentinel()
    }
}
