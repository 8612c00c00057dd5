// src/sensor/submerged.rs

use core::time::Duration;

use crate::common::{
    crc,
    error::SensorError,
    field::Field,
    hal_traits::{AlwaysOn, Delay, OneWireThermometer, PowerSwitch},
    timing,
};

use super::{Readout, SensorProvider};

/// Value the Dallas driver reports for a probe that dropped off the bus.
pub const DEVICE_DISCONNECTED_C: f32 = -127.0;

const FIELDS: &[Field] = &[Field::SubmergedTemperature];

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SubmergedConfig {
    /// 9..=12 bits.
    pub resolution_bits: u8,
    /// °C
    pub temperature_range: (f32, f32),
}

impl Default for SubmergedConfig {
    fn default() -> Self {
        Self {
            resolution_bits: 12,
            temperature_range: (-55.0, 125.0),
        }
    }
}

/// Submerged-probe provider on top of a DS18B20-class one-wire thermometer.
///
/// The probe supply is bracketed around every init and read. With a switched
/// supply the bracket includes the long stabilization delay.
#[derive(Debug)]
pub struct SubmergedSensor<W, T, P = AlwaysOn> {
    bus: W,
    delay: T,
    power: P,
    switched: bool,
    powered: bool,
    config: SubmergedConfig,
    available: bool,
}

impl<W, T> SubmergedSensor<W, T, AlwaysOn>
where
    W: OneWireThermometer,
    T: Delay,
{
    pub fn new(bus: W, delay: T) -> Self {
        SubmergedSensor {
            bus,
            delay,
            power: AlwaysOn,
            switched: false,
            powered: false,
            config: SubmergedConfig::default(),
            available: false,
        }
    }
}

impl<W, T, P> SubmergedSensor<W, T, P>
where
    W: OneWireThermometer,
    T: Delay,
    P: PowerSwitch,
{
    /// Feeds the probe through a MOSFET that is only switched on around reads.
    pub fn with_power_switch<Q: PowerSwitch>(self, power: Q) -> SubmergedSensor<W, T, Q> {
        SubmergedSensor {
            bus: self.bus,
            delay: self.delay,
            power,
            switched: true,
            powered: false,
            config: self.config,
            available: self.available,
        }
    }

    pub fn with_config(mut self, config: SubmergedConfig) -> Self {
        self.config = config;
        self
    }

    pub fn bus(&self) -> &W {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut W {
        &mut self.bus
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    fn power_on(&mut self) -> Result<(), SensorError> {
        if self.switched {
            if self.powered {
                return Ok(());
            }
            self.power.power_on().map_err(|_| SensorError::Bus)?;
            self.powered = true;
            debug!("submerged: supply on, stabilizing");
            self.delay.delay_ms(timing::as_ms(timing::SUBMERGED_SWITCHED_POWER_ON_DELAY));
        } else {
            self.powered = true;
            self.delay.delay_ms(timing::as_ms(timing::SUBMERGED_PERMANENT_POWER_ON_DELAY));
        }
        Ok(())
    }

    fn power_off(&mut self) {
        if !self.switched || !self.powered {
            return;
        }
        if self.power.power_off().is_err() {
            warn!("submerged: failed to cut supply");
        }
        self.powered = false;
        self.delay.delay_ms(timing::as_ms(timing::SUBMERGED_POWER_OFF_DELAY));
    }

    fn wait_for_scratchpad(&mut self) -> Result<[u8; 9], SensorError> {
        // Allow twice the datasheet conversion time before giving up.
        let budget = timing::submerged_conversion_time(self.config.resolution_bits) * 2;
        let mut waited = Duration::ZERO;

        loop {
            match self.bus.read_scratchpad() {
                Ok(pad) => return Ok(pad),
                Err(nb::Error::WouldBlock) => {
                    if waited >= budget {
                        error!("submerged: conversion timed out");
                        return Err(SensorError::Timeout);
                    }
                    self.delay.delay_ms(timing::as_ms(timing::SUBMERGED_POLL_INTERVAL));
                    waited += timing::SUBMERGED_POLL_INTERVAL;
                }
                Err(nb::Error::Other(_)) => return Err(SensorError::Bus),
            }
        }
    }

    fn measure(&mut self) -> Result<f32, SensorError> {
        self.bus.start_conversion().map_err(|_| SensorError::Bus)?;
        let pad = self.wait_for_scratchpad()?;

        if pad.iter().all(|b| *b == 0x00) || pad.iter().all(|b| *b == 0xFF) {
            warn!("submerged: probe disconnected");
            return Err(SensorError::ReadInvalid);
        }
        crc::verify_scratchpad(&pad)?;

        let temperature = decode_temperature(&pad, self.config.resolution_bits);
        let (lo, hi) = self.config.temperature_range;
        if temperature == DEVICE_DISCONNECTED_C || temperature < lo || temperature > hi {
            warn!("submerged: invalid reading {}", temperature);
            return Err(SensorError::ReadInvalid);
        }
        Ok(temperature)
    }
}

/// Converts scratchpad bytes 0..2 (LSB first, 1/16 °C) to °C, masking the
/// bits that are undefined at lower resolutions.
pub fn decode_temperature(scratchpad: &[u8; 9], resolution_bits: u8) -> f32 {
    let raw = i16::from_le_bytes([scratchpad[0], scratchpad[1]]);
    let mask: i16 = match resolution_bits {
        0..=9 => !0b111,
        10 => !0b11,
        11 => !0b1,
        _ => !0,
    };
    f32::from(raw & mask) / 16.0
}

impl<W, T, P> SensorProvider for SubmergedSensor<W, T, P>
where
    W: OneWireThermometer,
    T: Delay,
    P: PowerSwitch,
{
    fn name(&self) -> &'static str {
        "DS18B20"
    }

    fn fields(&self) -> &'static [Field] {
        FIELDS
    }

    fn init(&mut self) -> bool {
        info!("submerged: starting probe");
        if self.power_on().is_err() {
            error!("submerged: failed to enable supply");
            self.available = false;
            return false;
        }

        let count = self.bus.device_count().unwrap_or(0);
        if count == 0 {
            error!("submerged: no probe on the bus");
            self.available = false;
            self.power_off();
            return false;
        }
        info!("submerged: {=u8} device(s) on the bus", count);

        if self.bus.set_resolution(self.config.resolution_bits).is_err() {
            error!("submerged: failed to set resolution");
            self.available = false;
            self.power_off();
            return false;
        }

        self.available = true;
        self.power_off();
        true
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn read_all(&mut self) -> Result<Readout, SensorError> {
        if !self.available {
            return Err(SensorError::Unavailable);
        }

        self.power_on()?;
        let result = self.measure();
        self.power_off();

        let temperature = result?;
        debug!("submerged: t={}", temperature);
        Ok(Readout::new().with(Field::SubmergedTemperature, temperature))
    }

    fn set_forced_availability(&mut self, available: bool) {
        info!("submerged: availability forced to {}", available);
        self.available = available;
    }
}
