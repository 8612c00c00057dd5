// src/common/timing.rs

use core::time::Duration;

// Nominal delays taken from the sensor datasheets / board bring-up notes.
// All of these are blocking waits issued through `Delay`.

// === Climate sensor (BME280) ===

/// Settling time after powering the climate sensor before probing it.
pub const CLIMATE_POWER_ON_DELAY: Duration = Duration::from_millis(100);
/// Wait between read attempts after a bus error.
pub const CLIMATE_READ_RETRY_DELAY: Duration = Duration::from_millis(100);
/// Read attempts before the climate read is reported as a bus error.
pub const CLIMATE_READ_ATTEMPTS: u8 = 3;

// === Submerged thermometer (DS18B20) ===

/// Stabilization after switching the probe supply through a MOSFET.
pub const SUBMERGED_SWITCHED_POWER_ON_DELAY: Duration = Duration::from_millis(30_000);
/// Settling time when the probe is permanently powered.
pub const SUBMERGED_PERMANENT_POWER_ON_DELAY: Duration = Duration::from_millis(100);
/// Wait after cutting the probe supply so the bus fully discharges.
pub const SUBMERGED_POWER_OFF_DELAY: Duration = Duration::from_millis(1_000);
/// Conversion time at 12-bit resolution; halves for every bit less.
pub const SUBMERGED_CONVERSION_12BIT: Duration = Duration::from_millis(750);
/// Scratchpad poll interval while a conversion is running.
pub const SUBMERGED_POLL_INTERVAL: Duration = Duration::from_millis(10);

// === pH probe (DFRobot analog) ===

/// Stabilization after switching the pH front-end supply.
pub const PH_SWITCHED_POWER_ON_DELAY: Duration = Duration::from_millis(30_000);
/// Spacing between averaged ADC samples (20 ms minimum for the front-end).
pub const PH_SAMPLE_INTERVAL: Duration = Duration::from_millis(20);

/// Conversion time for the given DS18B20 resolution (9..=12 bits).
pub const fn submerged_conversion_time(resolution_bits: u8) -> Duration {
    let bits = if resolution_bits < 9 {
        9
    } else if resolution_bits > 12 {
        12
    } else {
        resolution_bits
    };
    let shift = 12 - bits as u32;
    Duration::from_micros(SUBMERGED_CONVERSION_12BIT.as_micros() as u64 >> shift)
}

/// Milliseconds as the `u32` the `Delay` trait takes.
#[inline]
pub(crate) fn as_ms(d: Duration) -> u32 {
    u32::try_from(d.as_millis()).unwrap_or(u32::MAX)
}
