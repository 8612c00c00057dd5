// src/payload/decoder.rs

//! Description of the frame layout for the receiving side.
//!
//! The network server never sees this crate, so the layout is exported as
//! data ([`DecoderDescription`]) and as a JavaScript payload formatter
//! ([`DecoderRecipe`]). Both follow the encoder's field order, widths and
//! scales exactly.

use core::fmt;

use arrayvec::ArrayVec;

use crate::common::{
    capability::{BatteryEncoding, CapabilitySet},
    error::PayloadError,
    field::Field,
};

/// Where and how one field sits in the frame.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldSpec {
    pub field: Field,
    /// Key used in decoded output.
    pub name: &'static str,
    /// Byte offset from the start of the frame.
    pub offset: usize,
    /// 1 or 2 bytes, little-endian.
    pub width: usize,
    /// Divide the raw integer by this to get engineering units.
    pub scale: f32,
    /// Raw integer is two's complement.
    pub signed: bool,
}

impl FieldSpec {
    fn for_field(field: Field, offset: usize, caps: &CapabilitySet) -> Self {
        let layout = caps.layout(field);
        FieldSpec {
            field,
            name: field.name(),
            offset,
            width: layout.width,
            scale: layout.scale,
            signed: layout.signed,
        }
    }

    /// Raw integer at this field's position. `frame` must be long enough.
    fn raw(&self, frame: &[u8]) -> i32 {
        let bytes = &frame[self.offset..self.offset + self.width];
        match (self.width, self.signed) {
            (1, false) => i32::from(bytes[0]),
            (1, true) => i32::from(bytes[0] as i8),
            (_, false) => i32::from(u16::from_le_bytes([bytes[0], bytes[1]])),
            (_, true) => i32::from(i16::from_le_bytes([bytes[0], bytes[1]])),
        }
    }

    /// Value in engineering units. Battery in percentage mode decodes to percent.
    pub fn decode(&self, frame: &[u8]) -> Result<f32, PayloadError> {
        let needed = self.offset + self.width;
        if frame.len() < needed {
            return Err(PayloadError::FrameTooShort {
                needed,
                got: frame.len(),
            });
        }
        Ok(self.raw(frame) as f32 / self.scale)
    }

    fn unit(&self, encoding: BatteryEncoding) -> &'static str {
        match (self.field, encoding) {
            (Field::Battery, BatteryEncoding::Percentage) => "%",
            (field, _) => field.unit(),
        }
    }
}

/// Ordered layout of one build's frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderDescription {
    fields: ArrayVec<FieldSpec, 6>,
    battery_encoding: BatteryEncoding,
    frame_len: usize,
}

/// Builds the receiving-side layout for `caps`.
pub fn describe_decoder(caps: &CapabilitySet) -> DecoderDescription {
    let mut fields = ArrayVec::new();
    let mut offset = 0;
    for field in caps.fields() {
        let spec = FieldSpec::for_field(field, offset, caps);
        offset += spec.width;
        fields.push(spec);
    }
    DecoderDescription {
        fields,
        battery_encoding: caps.battery_encoding,
        frame_len: offset,
    }
}

impl DecoderDescription {
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    pub fn get(&self, field: Field) -> Option<&FieldSpec> {
        self.fields.iter().find(|s| s.field == field)
    }

    /// Applies the layout to a received frame. Trailing bytes are ignored.
    pub fn decode(&self, frame: &[u8]) -> Result<DecodedFrame, PayloadError> {
        if frame.len() < self.frame_len {
            return Err(PayloadError::FrameTooShort {
                needed: self.frame_len,
                got: frame.len(),
            });
        }
        let mut values = ArrayVec::new();
        for spec in &self.fields {
            values.push((spec.field, spec.decode(frame)?));
        }
        Ok(DecodedFrame { values })
    }

    /// JavaScript `decodeUplink` formatter for this layout.
    pub fn recipe(&self) -> DecoderRecipe<'_> {
        DecoderRecipe { description: self }
    }

    /// Human-readable table of the enabled fields.
    pub fn summary(&self) -> ConfigurationSummary<'_> {
        ConfigurationSummary { description: self }
    }
}

/// Values recovered from one frame, in frame order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedFrame {
    values: ArrayVec<(Field, f32), 6>,
}

impl DecodedFrame {
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

/// Renders a network-server payload formatter (`decodeUplink(input)`).
#[derive(Debug, Clone, Copy)]
pub struct DecoderRecipe<'a> {
    description: &'a DecoderDescription,
}

impl fmt::Display for DecoderRecipe<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let desc = self.description;
        writeln!(f, "function decodeUplink(input) {{")?;
        writeln!(f, "  var bytes = input.bytes;")?;
        writeln!(f, "  if (bytes.length < {}) {{", desc.frame_len)?;
        writeln!(
            f,
            "    return {{ errors: [\"expected {} bytes, got \" + bytes.length] }};",
            desc.frame_len
        )?;
        writeln!(f, "  }}")?;
        writeln!(f, "  var data = {{}};")?;
        for spec in &desc.fields {
            let o = spec.offset;
            write!(f, "  data.{} = ", spec.name)?;
            match (spec.width, spec.signed) {
                (1, false) => write!(f, "bytes[{}]", o)?,
                (1, true) => write!(f, "((bytes[{}] << 24) >> 24)", o)?,
                (_, false) => write!(f, "(bytes[{}] | (bytes[{}] << 8))", o, o + 1)?,
                (_, true) => write!(f, "(((bytes[{}] | (bytes[{}] << 8)) << 16) >> 16)", o, o + 1)?,
            }
            if spec.scale != 1.0 {
                write!(f, " / {}", spec.scale)?;
            }
            writeln!(f, ";")?;
        }
        writeln!(f, "  return {{ data: data }};")?;
        write!(f, "}}")
    }
}

/// Lists enabled fields with offset, width and scale, then the frame length.
#[derive(Debug, Clone, Copy)]
pub struct ConfigurationSummary<'a> {
    description: &'a DecoderDescription,
}

impl fmt::Display for ConfigurationSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let desc = self.description;
        writeln!(f, "Sensor configuration:")?;
        if desc.fields.is_empty() {
            writeln!(f, "  (no fields enabled)")?;
        }
        for spec in &desc.fields {
            let unit = spec.unit(desc.battery_encoding);
            write!(
                f,
                "  {:<22} @{:<2} {} byte{}",
                spec.name,
                spec.offset,
                spec.width,
                if spec.width == 1 { " " } else { "s" }
            )?;
            if spec.scale != 1.0 {
                write!(f, " /{}", spec.scale)?;
            }
            if spec.signed {
                write!(f, " signed")?;
            }
            if !unit.is_empty() {
                write!(f, " [{}]", unit)?;
            }
            writeln!(f)?;
        }
        write!(f, "Frame length: {} bytes", desc.frame_len)
    }
}

/// Startup diagnostics switch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Print the configuration summary and the network-server formatter.
    pub show_decoder: bool,
}

impl Diagnostics {
    /// Writes the summary and the formatter for `caps` to `sink`, or nothing
    /// when `show_decoder` is off.
    pub fn emit<W: fmt::Write>(&self, caps: &CapabilitySet, sink: &mut W) -> fmt::Result {
        if !self.show_decoder {
            return Ok(());
        }
        let desc = describe_decoder(caps);
        writeln!(sink, "{}", desc.summary())?;
        writeln!(sink)?;
        writeln!(sink, "{}", desc.recipe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::reading::ReadingRecord;
    use crate::payload::{encode, field_code, FieldCode, PayloadBuffer};
    use core::fmt::Write;

    fn sample_record() -> ReadingRecord {
        ReadingRecord {
            outdoor_temperature: -12.34,
            humidity: 45.67,
            pressure: 987.6,
            submerged_temperature: 8.5,
            ph: 6.83,
            battery: 3.87,
            valid: true,
        }
    }

    #[test]
    fn test_climate_layout() {
        let caps = CapabilitySet::from_sensors(true, false, false, BatteryEncoding::Percentage);
        let desc = describe_decoder(&caps);
        assert_eq!(desc.frame_len(), 7);

        let battery = desc.get(Field::Battery).unwrap();
        assert_eq!((battery.offset, battery.width, battery.signed), (0, 1, false));
        let temperature = desc.get(Field::OutdoorTemperature).unwrap();
        assert_eq!((temperature.offset, temperature.width, temperature.scale), (1, 2, 100.0));
        assert!(temperature.signed);
        let pressure = desc.get(Field::Pressure).unwrap();
        assert_eq!((pressure.offset, pressure.scale, pressure.signed), (5, 10.0, false));
        assert!(desc.get(Field::Ph).is_none());
    }

    #[test]
    fn test_decode_known_frame() {
        let caps = CapabilitySet::from_sensors(true, false, false, BatteryEncoding::Percentage);
        let decoded = describe_decoder(&caps)
            .decode(&[67, 0x29, 0x09, 0xE8, 0x17, 0x94, 0x27])
            .unwrap();
        assert_eq!(decoded.len(), 4);
        assert_eq!(decoded.get(Field::Battery), Some(67.0));
        assert!((decoded.get(Field::OutdoorTemperature).unwrap() - 23.45).abs() < 1e-4);
        assert!((decoded.get(Field::Humidity).unwrap() - 61.2).abs() < 1e-4);
        assert!((decoded.get(Field::Pressure).unwrap() - 1013.2).abs() < 1e-3);
    }

    #[test]
    fn test_decode_short_frame() {
        let caps = CapabilitySet::from_sensors(true, false, false, BatteryEncoding::Percentage);
        assert_eq!(
            describe_decoder(&caps).decode(&[0u8; 3]),
            Err(PayloadError::FrameTooShort { needed: 7, got: 3 })
        );
    }

    #[test]
    fn test_sentinel_temperature_decodes_to_floor() {
        let caps = CapabilitySet {
            outdoor_temperature: true,
            ..CapabilitySet::NONE
        };
        let mut storage = [0u8; 2];
        let mut buffer = PayloadBuffer::new(&mut storage);
        encode(&ReadingRecord::sentinel(), &caps, &mut buffer).unwrap();
        let decoded = describe_decoder(&caps).decode(buffer.as_bytes()).unwrap();
        assert_eq!(decoded.get(Field::OutdoorTemperature), Some(-327.68));
    }

    /// Out-of-range and sentinel values on every field.
    fn edge_record() -> ReadingRecord {
        ReadingRecord {
            outdoor_temperature: -999.0,
            humidity: -1.0,
            pressure: -1.0,
            submerged_temperature: -0.04,
            ph: -1.0,
            battery: -1.0,
            valid: false,
        }
    }

    /// Frame format per field, written out independently of the layout table.
    fn wire_format(field: Field, encoding: BatteryEncoding) -> (usize, f32, bool) {
        match (field, encoding) {
            (Field::Battery, BatteryEncoding::Percentage) => (1, 1.0, false),
            (Field::Battery, BatteryEncoding::Voltage) => (2, 100.0, false),
            (Field::Ph, _) => (2, 100.0, false),
            (Field::OutdoorTemperature, _) => (2, 100.0, true),
            (Field::SubmergedTemperature, _) => (2, 100.0, true),
            (Field::Humidity, _) => (2, 100.0, true),
            (Field::Pressure, _) => (2, 10.0, false),
        }
    }

    /// What the receiver should see for `value`, given integer saturation.
    fn received(field: Field, value: f32, caps: &CapabilitySet) -> f32 {
        let (_, scale, signed) = wire_format(field, caps.battery_encoding);
        if field == Field::Battery && caps.battery_encoding == BatteryEncoding::Percentage {
            return f32::from(caps.battery_curve.percent(value));
        }
        let (lo, hi) = if signed {
            (f32::from(i16::MIN), f32::from(i16::MAX))
        } else {
            (0.0, f32::from(u16::MAX))
        };
        libm::roundf(value * scale).clamp(lo, hi) / scale
    }

    #[test]
    fn test_encoder_and_description_agree_for_every_capability_set() {
        let mut storage = [0u8; 16];

        for record in [sample_record(), edge_record()] {
            for bits in 0..CapabilitySet::COMBINATIONS {
                let caps = CapabilitySet::from_bits(bits);
                let desc = describe_decoder(&caps);
                assert_eq!(desc.frame_len(), caps.frame_len(), "caps {:#04x}", bits);

                // Same fields, same order, contiguous offsets, same representation.
                let mut offset = 0;
                let mut expected = caps.fields();
                for spec in desc.fields() {
                    assert_eq!(Some(spec.field), expected.next());
                    assert_eq!(spec.offset, offset);
                    assert_eq!(
                        (spec.width, spec.scale, spec.signed),
                        wire_format(spec.field, caps.battery_encoding),
                        "caps {:#04x} {}",
                        bits,
                        spec.name
                    );
                    assert_eq!(spec.width, caps.width_of(spec.field));

                    let code = field_code(spec.field, record.get(spec.field), &caps);
                    assert_eq!(spec.width, code.width());
                    assert_eq!(spec.signed, matches!(code, FieldCode::I16(_)), "{}", spec.name);
                    offset += spec.width;
                }
                assert_eq!(expected.next(), None);

                let mut buffer = PayloadBuffer::new(&mut storage);
                let written = encode(&record, &caps, &mut buffer).unwrap();
                assert_eq!(written, desc.frame_len());

                let decoded = desc.decode(buffer.as_bytes()).unwrap();
                assert_eq!(decoded.len(), desc.fields().len());
                for spec in desc.fields() {
                    let got = decoded.get(spec.field).unwrap();
                    let want = received(spec.field, record.get(spec.field), &caps);
                    assert!(
                        (got - want).abs() <= 1e-3,
                        "caps {:#04x} {}: {} vs {}",
                        bits,
                        spec.name,
                        got,
                        want
                    );
                }
            }
        }
    }

    #[test]
    fn test_edge_values_decode() {
        let caps = CapabilitySet::from_bits(0x7F);
        let mut storage = [0u8; 12];
        let mut buffer = PayloadBuffer::new(&mut storage);
        encode(&edge_record(), &caps, &mut buffer).unwrap();
        let decoded = describe_decoder(&caps).decode(buffer.as_bytes()).unwrap();

        assert_eq!(decoded.get(Field::Battery), Some(0.0));
        assert_eq!(decoded.get(Field::Ph), Some(0.0));
        assert_eq!(decoded.get(Field::OutdoorTemperature), Some(-327.68));
        assert_eq!(decoded.get(Field::SubmergedTemperature), Some(-0.04));
        assert_eq!(decoded.get(Field::Humidity), Some(-1.0));
        assert_eq!(decoded.get(Field::Pressure), Some(0.0));
    }

    #[test]
    fn test_recipe_rendering() {
        let caps = CapabilitySet::from_sensors(true, false, false, BatteryEncoding::Percentage);
        let desc = describe_decoder(&caps);
        let mut js: heapless::String<1024> = heapless::String::new();
        write!(js, "{}", desc.recipe()).unwrap();

        assert!(js.starts_with("function decodeUplink(input) {"));
        assert!(js.contains("if (bytes.length < 7)"));
        assert!(js.contains("data.battery = bytes[0];"));
        assert!(js.contains("data.temperature = (((bytes[1] | (bytes[2] << 8)) << 16) >> 16) / 100;"));
        assert!(js.contains("data.humidity = (((bytes[3] | (bytes[4] << 8)) << 16) >> 16) / 100;"));
        assert!(js.contains("data.pressure = (bytes[5] | (bytes[6] << 8)) / 10;"));
        assert!(!js.contains("data.ph"));
        assert!(js.ends_with('}'));
    }

    #[test]
    fn test_recipe_voltage_battery() {
        let caps = CapabilitySet::from_bits(0x43);
        let mut js: heapless::String<1024> = heapless::String::new();
        write!(js, "{}", describe_decoder(&caps).recipe()).unwrap();
        assert!(js.contains("data.battery = (bytes[0] | (bytes[1] << 8)) / 100;"));
        assert!(js.contains("data.ph = (bytes[2] | (bytes[3] << 8)) / 100;"));
    }

    #[test]
    fn test_recipe_overflows_small_sink() {
        let caps = CapabilitySet::from_bits(0x3F);
        let mut js: heapless::String<32> = heapless::String::new();
        assert!(write!(js, "{}", describe_decoder(&caps).recipe()).is_err());
    }

    #[test]
    fn test_summary() {
        let caps = CapabilitySet::from_sensors(true, true, true, BatteryEncoding::Percentage);
        let mut s: heapless::String<1024> = heapless::String::new();
        write!(s, "{}", describe_decoder(&caps).summary()).unwrap();
        assert!(s.starts_with("Sensor configuration:"));
        assert!(s.contains("temperature_submerged"));
        assert!(s.contains("[%]"));
        assert!(s.ends_with("Frame length: 11 bytes"));

        let mut s: heapless::String<128> = heapless::String::new();
        write!(s, "{}", describe_decoder(&CapabilitySet::NONE).summary()).unwrap();
        assert!(s.contains("(no fields enabled)"));
        assert!(s.ends_with("Frame length: 0 bytes"));
    }

    #[test]
    fn test_diagnostics_gate() {
        let caps = CapabilitySet::from_sensors(true, true, true, BatteryEncoding::Voltage);

        let mut out: heapless::String<2048> = heapless::String::new();
        Diagnostics::default().emit(&caps, &mut out).unwrap();
        assert!(out.is_empty());

        Diagnostics { show_decoder: true }.emit(&caps, &mut out).unwrap();
        assert!(out.contains("Frame length: 12 bytes"));
        assert!(out.contains("function decodeUplink(input) {"));
        assert!(out.contains("data.temperature_submerged"));
    }
}
