// src/common/hal_traits.rs

use core::fmt::Debug;

/// Abstraction for the blocking delays the sensor providers need
/// (power stabilization, sample spacing, conversion waits).
///
/// Note: with the `impl-native` feature any `embedded_hal::delay::DelayNs`
/// can be used through [`HalDelay`].
pub trait Delay {
    /// Delay for at least the specified number of microseconds.
    fn delay_us(&mut self, us: u32);

    /// Delay for at least the specified number of milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// Switchable supply rail in front of a sensor.
pub trait PowerSwitch {
    type Error: Debug;

    fn power_on(&mut self) -> Result<(), Self::Error>;

    fn power_off(&mut self) -> Result<(), Self::Error>;
}

/// Board battery voltage measurement. Always present, never gated.
pub trait BatteryMonitor {
    type Error: Debug;

    /// Battery voltage in volts.
    fn read_voltage(&mut self) -> Result<f32, Self::Error>;
}

/// One compensated sample from a combined temperature/humidity/pressure sensor.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClimateSample {
    /// °C
    pub temperature: f32,
    /// %RH
    pub humidity: f32,
    /// Pa, as the driver reports it
    pub pressure_pa: f32,
}

/// Driver for a BME280-class climate sensor on an I2C bus.
pub trait ClimateDevice {
    type Error: Debug;

    /// Checks for a device at `address` and configures it for sampling.
    /// `Ok(false)` means nothing answered at that address.
    fn begin(&mut self, address: u8) -> Result<bool, Self::Error>;

    /// Reads one compensated sample. Channels may be NaN when the chip
    /// returned the skipped-measurement pattern.
    fn read(&mut self) -> Result<ClimateSample, Self::Error>;
}

/// Driver for a DS18B20-class thermometer on a one-wire bus.
pub trait OneWireThermometer {
    type Error: Debug;

    /// Number of devices that answered the search.
    fn device_count(&mut self) -> Result<u8, Self::Error>;

    /// Conversion resolution, 9 to 12 bits.
    fn set_resolution(&mut self, bits: u8) -> Result<(), Self::Error>;

    /// Issues a temperature conversion to the first device.
    fn start_conversion(&mut self) -> Result<(), Self::Error>;

    /// Attempts to read the 9-byte scratchpad of the first device.
    ///
    /// Returns `Err(nb::Error::WouldBlock)` while the conversion is still running.
    fn read_scratchpad(&mut self) -> nb::Result<[u8; 9], Self::Error>;
}

/// A single ADC channel.
pub trait AnalogInput {
    type Error: Debug;

    /// One raw conversion.
    fn read_raw(&mut self) -> Result<u16, Self::Error>;
}

/// Placeholder for providers without a switchable supply.
#[derive(Debug, Default, Copy, Clone)]
pub struct AlwaysOn;

impl PowerSwitch for AlwaysOn {
    type Error = core::convert::Infallible;

    fn power_on(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn power_off(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Wraps an `embedded-hal` delay provider.
#[cfg(feature = "impl-native")]
#[derive(Debug)]
pub struct HalDelay<D>(pub D);

#[cfg(feature = "impl-native")]
impl<D: embedded_hal::delay::DelayNs> Delay for HalDelay<D> {
    fn delay_us(&mut self, us: u32) {
        self.0.delay_us(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.delay_ms(ms);
    }
}

/// Drives a sensor supply MOSFET from an `embedded-hal` output pin
/// (high = powered).
#[cfg(feature = "impl-native")]
#[derive(Debug)]
pub struct HalPowerPin<P>(pub P);

#[cfg(feature = "impl-native")]
impl<P: embedded_hal::digital::OutputPin> PowerSwitch for HalPowerPin<P> {
    type Error = P::Error;

    fn power_on(&mut self) -> Result<(), Self::Error> {
        self.0.set_high()
    }

    fn power_off(&mut self) -> Result<(), Self::Error> {
        self.0.set_low()
    }
}
