// src/sensor/climate.rs

use crate::common::{
    error::SensorError,
    field::Field,
    hal_traits::{AlwaysOn, ClimateDevice, Delay, PowerSwitch},
    timing,
};

use super::{Readout, SensorProvider};

/// I2C address with SDO tied low.
pub const ADDRESS_PRIMARY: u8 = 0x76;
/// I2C address with SDO tied high.
pub const ADDRESS_SECONDARY: u8 = 0x77;

const FIELDS: &[Field] = &[Field::OutdoorTemperature, Field::Humidity, Field::Pressure];

/// Plausibility limits for the climate channels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClimateConfig {
    /// Addresses probed in order during `init`.
    pub addresses: [u8; 2],
    /// °C
    pub temperature_range: (f32, f32),
    /// %RH
    pub humidity_range: (f32, f32),
    /// hPa
    pub pressure_range: (f32, f32),
    pub read_attempts: u8,
}

impl Default for ClimateConfig {
    fn default() -> Self {
        Self {
            addresses: [ADDRESS_PRIMARY, ADDRESS_SECONDARY],
            temperature_range: (-40.0, 85.0),
            humidity_range: (0.0, 100.0),
            pressure_range: (300.0, 1100.0),
            read_attempts: timing::CLIMATE_READ_ATTEMPTS,
        }
    }
}

/// Ambient climate provider (outdoor temperature, humidity, pressure) on top
/// of a BME280-class driver.
#[derive(Debug)]
pub struct ClimateSensor<D, T, P = AlwaysOn> {
    device: D,
    delay: T,
    power: P,
    config: ClimateConfig,
    address: Option<u8>,
    available: bool,
}

impl<D, T> ClimateSensor<D, T, AlwaysOn>
where
    D: ClimateDevice,
    T: Delay,
{
    pub fn new(device: D, delay: T) -> Self {
        ClimateSensor {
            device,
            delay,
            power: AlwaysOn,
            config: ClimateConfig::default(),
            address: None,
            available: false,
        }
    }
}

impl<D, T, P> ClimateSensor<D, T, P>
where
    D: ClimateDevice,
    T: Delay,
    P: PowerSwitch,
{
    /// Puts the sensor behind a switchable supply.
    pub fn with_power_switch<Q: PowerSwitch>(self, power: Q) -> ClimateSensor<D, T, Q> {
        ClimateSensor {
            device: self.device,
            delay: self.delay,
            power,
            config: self.config,
            address: self.address,
            available: self.available,
        }
    }

    pub fn with_config(mut self, config: ClimateConfig) -> Self {
        self.config = config;
        self
    }

    /// Address the sensor answered on, once initialized.
    pub fn address(&self) -> Option<u8> {
        self.address
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    fn read_with_retries(&mut self) -> Result<crate::common::hal_traits::ClimateSample, SensorError> {
        let attempts = self.config.read_attempts.max(1);
        for attempt in 1..=attempts {
            match self.device.read() {
                Ok(sample) => return Ok(sample),
                Err(_) if attempt < attempts => {
                    warn!("climate: read attempt {} failed, retrying", attempt);
                    self.delay.delay_ms(timing::as_ms(timing::CLIMATE_READ_RETRY_DELAY));
                }
                Err(_) => {}
            }
        }
        error!("climate: bus error after {} attempts", attempts);
        Err(SensorError::Bus)
    }
}

fn in_range(value: f32, (lo, hi): (f32, f32)) -> bool {
    value >= lo && value <= hi
}

impl<D, T, P> SensorProvider for ClimateSensor<D, T, P>
where
    D: ClimateDevice,
    T: Delay,
    P: PowerSwitch,
{
    fn name(&self) -> &'static str {
        "BME280"
    }

    fn fields(&self) -> &'static [Field] {
        FIELDS
    }

    /// A switched supply stays on once the sensor is found (it idles in
    /// sleep mode between reads) and is cut again when nothing answers.
    fn init(&mut self) -> bool {
        info!("climate: probing sensor");
        if self.power.power_on().is_err() {
            error!("climate: failed to enable supply");
            self.available = false;
            return false;
        }
        self.delay.delay_ms(timing::as_ms(timing::CLIMATE_POWER_ON_DELAY));

        self.address = None;
        for address in self.config.addresses {
            match self.device.begin(address) {
                Ok(true) => {
                    self.address = Some(address);
                    break;
                }
                Ok(false) => debug!("climate: nothing at {=u8:#x}", address),
                Err(_) => warn!("climate: bus error probing {=u8:#x}", address),
            }
        }

        match self.address {
            Some(address) => {
                info!("climate: sensor found at {=u8:#x}", address);
                self.available = true;
            }
            None => {
                error!("climate: sensor not found");
                self.available = false;
                if self.power.power_off().is_err() {
                    warn!("climate: failed to cut supply");
                }
            }
        }
        self.available
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn read_all(&mut self) -> Result<Readout, SensorError> {
        if !self.available {
            return Err(SensorError::Unavailable);
        }

        let sample = self.read_with_retries()?;
        let pressure = sample.pressure_pa / 100.0;

        if sample.temperature.is_nan() || sample.humidity.is_nan() || pressure.is_nan() {
            warn!("climate: skipped measurement");
            return Err(SensorError::ReadInvalid);
        }
        if !in_range(sample.temperature, self.config.temperature_range)
            || !in_range(sample.humidity, self.config.humidity_range)
            || !in_range(pressure, self.config.pressure_range)
        {
            warn!(
                "climate: implausible reading t={} h={} p={}",
                sample.temperature, sample.humidity, pressure
            );
            return Err(SensorError::ReadInvalid);
        }

        debug!("climate: t={} h={} p={}", sample.temperature, sample.humidity, pressure);
        Ok(Readout::new()
            .with(Field::OutdoorTemperature, sample.temperature)
            .with(Field::Humidity, sample.humidity)
            .with(Field::Pressure, pressure))
    }

    fn set_forced_availability(&mut self, available: bool) {
        info!("climate: availability forced to {}", available);
        self.available = available;
    }
}
