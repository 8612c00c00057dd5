// src/common/field.rs

use core::fmt;

/// A measured quantity that can appear in a telemetry frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Field {
    /// Supply battery voltage in volts.
    Battery,
    /// pH of the monitored water, unitless.
    Ph,
    /// Ambient (outdoor) air temperature in °C.
    OutdoorTemperature,
    /// Temperature of the submerged probe in °C.
    SubmergedTemperature,
    /// Relative humidity in %RH.
    Humidity,
    /// Barometric pressure in hPa.
    Pressure,
}

/// Sentinel used for both temperature fields.
pub const SENTINEL_TEMPERATURE: f32 = -999.0;
pub const SENTINEL_HUMIDITY: f32 = -1.0;
pub const SENTINEL_PRESSURE: f32 = -1.0;
pub const SENTINEL_PH: f32 = -1.0;
pub const SENTINEL_BATTERY: f32 = -1.0;

impl Field {
    /// Every field, in frame order.
    pub const WIRE_ORDER: [Field; 6] = [
        Field::Battery,
        Field::Ph,
        Field::OutdoorTemperature,
        Field::SubmergedTemperature,
        Field::Humidity,
        Field::Pressure,
    ];

    /// Stable identifier used in decoder output.
    pub const fn name(&self) -> &'static str {
        match self {
            Field::Battery => "battery",
            Field::Ph => "ph",
            Field::OutdoorTemperature => "temperature",
            Field::SubmergedTemperature => "temperature_submerged",
            Field::Humidity => "humidity",
            Field::Pressure => "pressure",
        }
    }

    pub const fn unit(&self) -> &'static str {
        match self {
            Field::Battery => "V",
            Field::Ph => "",
            Field::OutdoorTemperature | Field::SubmergedTemperature => "°C",
            Field::Humidity => "%",
            Field::Pressure => "hPa",
        }
    }

    /// The reserved "no data" value for this field.
    pub const fn sentinel(&self) -> f32 {
        match self {
            Field::Battery => SENTINEL_BATTERY,
            Field::Ph => SENTINEL_PH,
            Field::OutdoorTemperature | Field::SubmergedTemperature => SENTINEL_TEMPERATURE,
            Field::Humidity => SENTINEL_HUMIDITY,
            Field::Pressure => SENTINEL_PRESSURE,
        }
    }

    /// Exact comparison against the sentinel; NaN never counts as data either.
    #[inline]
    pub fn is_sentinel(&self, value: f32) -> bool {
        value.is_nan() || value == self.sentinel()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
