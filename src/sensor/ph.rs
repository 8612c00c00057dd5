// src/sensor/ph.rs

use crate::common::{
    error::SensorError,
    field::Field,
    hal_traits::{AlwaysOn, AnalogInput, Delay, PowerSwitch},
    timing,
};

use super::{Readout, SensorProvider};

const FIELDS: &[Field] = &[Field::Ph];

/// Absolute zero offset for the Nernst correction.
const KELVIN_OFFSET: f32 = 273.15;

/// Analog front-end and calibration of the pH probe.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PhConfig {
    /// ADC reference voltage, volts.
    pub reference_volts: f32,
    /// ADC full-scale count (4096 for 12 bits).
    pub adc_resolution: f32,
    /// Samples averaged per reading.
    pub samples: u8,
    /// Probe output in buffer pH 7.0, millivolts.
    pub neutral_mv: f32,
    /// Probe output in buffer pH 4.0, millivolts.
    pub acid_mv: f32,
    /// Temperature the calibration was taken at, °C.
    pub calibration_temperature: f32,
    /// Used when no compensation input was supplied this cycle, °C.
    pub default_temperature: f32,
    pub range: (f32, f32),
}

impl Default for PhConfig {
    fn default() -> Self {
        Self {
            reference_volts: 3.3,
            adc_resolution: 4096.0,
            samples: 10,
            neutral_mv: 1500.0,
            acid_mv: 2032.44,
            calibration_temperature: 25.0,
            default_temperature: 25.0,
            range: (0.0, 14.0),
        }
    }
}

impl PhConfig {
    /// Raw ADC counts to millivolts.
    pub fn millivolts(&self, raw: f32) -> f32 {
        raw / self.adc_resolution * self.reference_volts * 1000.0
    }

    /// Two-point calibration line through (neutral, 7.0) and (acid, 4.0),
    /// Nernst-corrected from the calibration temperature to `temperature`.
    pub fn ph_from_millivolts(&self, mv: f32, temperature: f32) -> f32 {
        let neutral = (self.neutral_mv - 1500.0) / 3.0;
        let acid = (self.acid_mv - 1500.0) / 3.0;
        let slope = (7.0 - 4.0) / (neutral - acid);
        let intercept = 7.0 - slope * neutral;
        let ph = slope * (mv - 1500.0) / 3.0 + intercept;

        let ratio = (self.calibration_temperature + KELVIN_OFFSET) / (temperature + KELVIN_OFFSET);
        7.0 + (ph - 7.0) * ratio
    }
}

/// DFRobot-style analog pH provider.
///
/// Its reading depends on water temperature, supplied each cycle through
/// [`SensorProvider::set_compensation_input`].
#[derive(Debug)]
pub struct PhSensor<A, T, P = AlwaysOn> {
    adc: A,
    delay: T,
    power: P,
    switched: bool,
    config: PhConfig,
    compensation: Option<f32>,
    available: bool,
}

impl<A, T> PhSensor<A, T, AlwaysOn>
where
    A: AnalogInput,
    T: Delay,
{
    pub fn new(adc: A, delay: T) -> Self {
        PhSensor {
            adc,
            delay,
            power: AlwaysOn,
            switched: false,
            config: PhConfig::default(),
            compensation: None,
            available: false,
        }
    }
}

impl<A, T, P> PhSensor<A, T, P>
where
    A: AnalogInput,
    T: Delay,
    P: PowerSwitch,
{
    pub fn with_power_switch<Q: PowerSwitch>(self, power: Q) -> PhSensor<A, T, Q> {
        PhSensor {
            adc: self.adc,
            delay: self.delay,
            power,
            switched: true,
            config: self.config,
            compensation: self.compensation,
            available: self.available,
        }
    }

    pub fn with_config(mut self, config: PhConfig) -> Self {
        self.config = config;
        self
    }

    pub fn adc_mut(&mut self) -> &mut A {
        &mut self.adc
    }

    /// Temperature the next reading will be compensated to, °C.
    pub fn compensation_temperature(&self) -> f32 {
        self.compensation.unwrap_or(self.config.default_temperature)
    }

    fn power_on(&mut self) -> Result<(), SensorError> {
        if !self.switched {
            return Ok(());
        }
        self.power.power_on().map_err(|_| SensorError::Bus)?;
        debug!("ph: supply on, stabilizing");
        self.delay.delay_ms(timing::as_ms(timing::PH_SWITCHED_POWER_ON_DELAY));
        Ok(())
    }

    fn power_off(&mut self) {
        if self.switched && self.power.power_off().is_err() {
            warn!("ph: failed to cut supply");
        }
    }

    fn is_rail(&self, raw: u16) -> bool {
        raw == 0 || f32::from(raw) >= self.config.adc_resolution - 1.0
    }

    fn sample_average(&mut self) -> Result<f32, SensorError> {
        let samples = self.config.samples.max(1);
        let mut sum: u32 = 0;
        for i in 0..samples {
            if i > 0 {
                self.delay.delay_ms(timing::as_ms(timing::PH_SAMPLE_INTERVAL));
            }
            let raw = self.adc.read_raw().map_err(|_| SensorError::Bus)?;
            sum += u32::from(raw);
        }
        Ok(sum as f32 / f32::from(samples))
    }

    fn measure(&mut self) -> Result<f32, SensorError> {
        let raw = self.sample_average()?;
        let mv = self.config.millivolts(raw);
        let temperature = self.compensation_temperature();
        let ph = self.config.ph_from_millivolts(mv, temperature);

        let (lo, hi) = self.config.range;
        if ph.is_nan() || ph < lo || ph > hi {
            warn!("ph: implausible reading {} ({} mV)", ph, mv);
            return Err(SensorError::ReadInvalid);
        }
        debug!("ph: {} at {} °C ({} mV)", ph, temperature, mv);
        Ok(ph)
    }
}

impl<A, T, P> SensorProvider for PhSensor<A, T, P>
where
    A: AnalogInput,
    T: Delay,
    P: PowerSwitch,
{
    fn name(&self) -> &'static str {
        "pH"
    }

    fn fields(&self) -> &'static [Field] {
        FIELDS
    }

    fn init(&mut self) -> bool {
        info!("ph: starting probe");
        if self.power_on().is_err() {
            error!("ph: failed to enable supply");
            self.available = false;
            return false;
        }

        self.available = match self.adc.read_raw() {
            Ok(raw) if self.is_rail(raw) => {
                error!("ph: input at rail ({=u16}), no probe connected", raw);
                false
            }
            Ok(_) => {
                info!("ph: probe ready");
                true
            }
            Err(_) => {
                error!("ph: ADC read failed");
                false
            }
        };

        self.power_off();
        self.available
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

        Ok(Readout::new().with(Field::Ph, result?))
    }

    fn set_compensation_input(&mut self, value: Option<f32>) {
        self.compensation = value.filter(|t| !t.is_nan());
    }

    fn set_forced_availability(&mut self, available: bool) {
        info!("ph: availability forced to {}", available);
        self.available = available;
    }
}
