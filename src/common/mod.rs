// src/common/mod.rs

// --- Declare all public modules within common ---
pub mod capability;
pub mod crc;
pub mod error;
pub mod field;
pub mod hal_traits;
pub mod reading;
pub mod timing;

// --- Re-export key types/traits/functions for easier access ---

// From capability.rs
pub use capability::{BatteryCurve, BatteryEncoding, CapabilitySet, FieldLayout};

// From crc.rs
pub use crc::{calculate_crc8, verify_scratchpad};

// From error.rs
pub use error::{PayloadError, SensorError};

// From field.rs
pub use field::Field;

// From hal_traits.rs
pub use hal_traits::{
    AlwaysOn, AnalogInput, BatteryMonitor, ClimateDevice, ClimateSample, Delay, OneWireThermometer, PowerSwitch,
};

// From reading.rs
pub use reading::ReadingRecord;

// Native HAL adapters (from hal_traits.rs)
#[cfg(feature = "impl-native")]
pub use hal_traits::{HalDelay, HalPowerPin};
