// src/common/capability.rs

use super::field::Field;

/// How the battery field is carried in the frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BatteryEncoding {
    /// One byte, 0-100 %, through a [`BatteryCurve`].
    Percentage,
    /// Two bytes, `round(volts * 100)`, unsigned.
    Voltage,
}

/// Linear voltage-to-charge curve for the battery percentage byte.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BatteryCurve {
    /// Voltage reported as 0 %.
    pub empty_volts: f32,
    /// Voltage reported as 100 %.
    pub full_volts: f32,
}

impl BatteryCurve {
    /// Single-cell Li-ion as wired on the LoRa32 boards.
    pub const LI_ION: BatteryCurve = BatteryCurve {
        empty_volts: 3.3,
        full_volts: 4.2,
    };

    /// Charge in percent, rounded and clamped to `0..=100`.
    ///
    /// Sentinel or NaN voltages come out as 0.
    pub fn percent(&self, volts: f32) -> u8 {
        let span = self.full_volts - self.empty_volts;
        if !(span > 0.0) || volts.is_nan() {
            return 0;
        }
        let pct = libm::roundf((volts - self.empty_volts) / span * 100.0);
        pct.clamp(0.0, 100.0) as u8
    }
}

impl Default for BatteryCurve {
    fn default() -> Self {
        Self::LI_ION
    }
}

/// Wire representation of one field: width in bytes, the factor applied
/// before rounding, and whether the integer is two's complement.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldLayout {
    pub width: usize,
    pub scale: f32,
    pub signed: bool,
}

/// The fixed set of quantities a build measures and transmits.
///
/// Both the payload encoder and the decoder description are driven by this
/// value; they must always be handed the same one.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CapabilitySet {
    pub outdoor_temperature: bool,
    pub humidity: bool,
    pub pressure: bool,
    pub submerged_temperature: bool,
    pub ph: bool,
    pub battery: bool,
    pub battery_encoding: BatteryEncoding,
    pub battery_curve: BatteryCurve,
}

impl CapabilitySet {
    /// Nothing enabled; the frame is empty.
    pub const NONE: CapabilitySet = CapabilitySet {
        outdoor_temperature: false,
        humidity: false,
        pressure: false,
        submerged_temperature: false,
        ph: false,
        battery: false,
        battery_encoding: BatteryEncoding::Percentage,
        battery_curve: BatteryCurve::LI_ION,
    };

    /// Capability set selected by the crate's Cargo features.
    pub const BUILD: CapabilitySet = CapabilitySet {
        outdoor_temperature: cfg!(feature = "climate"),
        humidity: cfg!(feature = "climate"),
        pressure: cfg!(feature = "climate"),
        submerged_temperature: cfg!(feature = "submerged"),
        ph: cfg!(feature = "ph"),
        battery: cfg!(feature = "battery"),
        battery_encoding: if cfg!(feature = "battery-percentage") {
            BatteryEncoding::Percentage
        } else {
            BatteryEncoding::Voltage
        },
        battery_curve: BatteryCurve::LI_ION,
    };

    /// Derives the field flags from which sensors are fitted.
    ///
    /// A climate sensor provides outdoor temperature, humidity and pressure;
    /// the battery is always reported.
    pub const fn from_sensors(climate: bool, submerged: bool, ph: bool, battery_encoding: BatteryEncoding) -> Self {
        CapabilitySet {
            outdoor_temperature: climate,
            humidity: climate,
            pressure: climate,
            submerged_temperature: submerged,
            ph,
            battery: true,
            battery_encoding,
            battery_curve: BatteryCurve::LI_ION,
        }
    }

    /// Builds a set from a 7-bit mask, one bit per field in [`Field::WIRE_ORDER`]
    /// (bit 0 = battery ... bit 5 = pressure), bit 6 selecting voltage encoding.
    ///
    /// Mainly useful for enumerating every possible configuration.
    pub const fn from_bits(bits: u8) -> Self {
        CapabilitySet {
            battery: bits & 0x01 != 0,
            ph: bits & 0x02 != 0,
            outdoor_temperature: bits & 0x04 != 0,
            submerged_temperature: bits & 0x08 != 0,
            humidity: bits & 0x10 != 0,
            pressure: bits & 0x20 != 0,
            battery_encoding: if bits & 0x40 != 0 {
                BatteryEncoding::Voltage
            } else {
                BatteryEncoding::Percentage
            },
            battery_curve: BatteryCurve::LI_ION,
        }
    }

    /// Number of distinct masks accepted by [`CapabilitySet::from_bits`].
    pub const COMBINATIONS: u8 = 1 << 7;

    pub const fn with_battery_encoding(mut self, encoding: BatteryEncoding) -> Self {
        self.battery_encoding = encoding;
        self
    }

    pub const fn with_battery_curve(mut self, curve: BatteryCurve) -> Self {
        self.battery_curve = curve;
        self
    }

    /// Whether `field` is part of the frame.
    pub const fn has(&self, field: Field) -> bool {
        match field {
            Field::Battery => self.battery,
            Field::Ph => self.ph,
            Field::OutdoorTemperature => self.outdoor_temperature,
            Field::SubmergedTemperature => self.submerged_temperature,
            Field::Humidity => self.humidity,
            Field::Pressure => self.pressure,
        }
    }

    /// Enabled fields in frame order.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        Field::WIRE_ORDER.into_iter().filter(move |f| self.has(*f))
    }

    /// How `field` is carried when enabled. The encoder and the decoder
    /// description both read this; nothing else defines widths or scales.
    pub const fn layout(&self, field: Field) -> FieldLayout {
        let (width, scale, signed) = match field {
            Field::Battery => match self.battery_encoding {
                BatteryEncoding::Percentage => (1, 1.0, false),
                BatteryEncoding::Voltage => (2, 100.0, false),
            },
            Field::Ph => (2, 100.0, false),
            Field::OutdoorTemperature | Field::SubmergedTemperature | Field::Humidity => (2, 100.0, true),
            Field::Pressure => (2, 10.0, false),
        };
        FieldLayout { width, scale, signed }
    }

    /// Bytes `field` occupies in the frame (0 when disabled).
    pub const fn width_of(&self, field: Field) -> usize {
        if !self.has(field) {
            return 0;
        }
        self.layout(field).width
    }

    /// Fixed frame length for this build.
    pub fn frame_len(&self) -> usize {
        Field::WIRE_ORDER.iter().map(|f| self.width_of(*f)).sum()
    }
}

impl Default for CapabilitySet {
    fn default() -> Self {
        Self::BUILD
    }
}
