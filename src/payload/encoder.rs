// src/payload/encoder.rs

use crate::common::{
    capability::{BatteryEncoding, CapabilitySet},
    error::PayloadError,
    field::Field,
    reading::ReadingRecord,
};

use super::PayloadBuffer;

/// Integer representation of one field, before byte serialization.
///
/// Conversions from `f32` saturate at the integer bounds and map NaN to 0,
/// so sentinels always produce a well-defined code.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldCode {
    U8(u8),
    U16(u16),
    I16(i16),
}

impl FieldCode {
    pub const fn width(&self) -> usize {
        match self {
            FieldCode::U8(_) => 1,
            FieldCode::U16(_) | FieldCode::I16(_) => 2,
        }
    }

    fn write_to(self, buffer: &mut PayloadBuffer<'_>) -> Result<(), PayloadError> {
        match self {
            FieldCode::U8(v) => buffer.extend_from_slice(&[v]),
            FieldCode::U16(v) => buffer.extend_from_slice(&v.to_le_bytes()),
            FieldCode::I16(v) => buffer.extend_from_slice(&v.to_le_bytes()),
        }
    }
}

/// Scales and rounds `value` the way `field` travels in the frame.
///
/// Battery in percentage mode goes through the capability set's curve;
/// everything else follows [`CapabilitySet::layout`].
pub fn field_code(field: Field, value: f32, caps: &CapabilitySet) -> FieldCode {
    if field == Field::Battery && caps.battery_encoding == BatteryEncoding::Percentage {
        return FieldCode::U8(caps.battery_curve.percent(value));
    }
    let layout = caps.layout(field);
    let scaled = libm::roundf(value * layout.scale);
    match (layout.width, layout.signed) {
        (1, false) => FieldCode::U8(scaled as u8),
        (1, true) => FieldCode::U8(scaled as i8 as u8),
        (_, false) => FieldCode::U16(scaled as u16),
        (_, true) => FieldCode::I16(scaled as i16),
    }
}

/// Appends one frame for `record` to `buffer` and returns the bytes written.
///
/// Every enabled field is written, sentinel or not, so the frame length
/// depends only on `caps`. If the buffer cannot take the whole frame nothing
/// is written.
pub fn encode(record: &ReadingRecord, caps: &CapabilitySet, buffer: &mut PayloadBuffer<'_>) -> Result<usize, PayloadError> {
    let needed = caps.frame_len();
    if buffer.remaining() < needed {
        warn!("payload: buffer too small ({} < {})", buffer.remaining(), needed);
        return Err(PayloadError::BufferTooSmall {
            needed,
            got: buffer.remaining(),
        });
    }

    let start = buffer.len();
    for field in caps.fields() {
        field_code(field, record.get(field), caps).write_to(buffer)?;
    }

    let written = buffer.len() - start;
    trace!("payload: encoded {} bytes", written);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::field::SENTINEL_TEMPERATURE;

    fn climate_record() -> ReadingRecord {
        ReadingRecord {
            outdoor_temperature: 23.45,
            humidity: 61.2,
            pressure: 1013.2,
            battery: 3.9,
            valid: true,
            ..ReadingRecord::sentinel()
        }
    }

    #[test]
    fn test_climate_and_battery_frame() {
        let caps = CapabilitySet::from_sensors(true, false, false, BatteryEncoding::Percentage);
        let mut storage = [0u8; 16];
        let mut buffer = PayloadBuffer::new(&mut storage);
        assert_eq!(encode(&climate_record(), &caps, &mut buffer), Ok(7));
        assert_eq!(buffer.as_bytes(), &[67, 0x29, 0x09, 0xE8, 0x17, 0x94, 0x27]);
    }

    #[test]
    fn test_negative_temperature_is_twos_complement() {
        let caps = CapabilitySet {
            submerged_temperature: true,
            ..CapabilitySet::NONE
        };
        let record = ReadingRecord {
            submerged_temperature: -5.0,
            ..ReadingRecord::sentinel()
        };
        let mut storage = [0u8; 2];
        let mut buffer = PayloadBuffer::new(&mut storage);
        assert_eq!(encode(&record, &caps, &mut buffer), Ok(2));
        assert_eq!(buffer.as_bytes(), &[0x0C, 0xFE]);
    }

    #[test]
    fn test_voltage_battery() {
        let caps = CapabilitySet {
            battery: true,
            battery_encoding: BatteryEncoding::Voltage,
            ..CapabilitySet::NONE
        };
        let record = ReadingRecord {
            battery: 3.87,
            ..ReadingRecord::sentinel()
        };
        let mut storage = [0u8; 2];
        let mut buffer = PayloadBuffer::new(&mut storage);
        encode(&record, &caps, &mut buffer).unwrap();
        assert_eq!(buffer.as_bytes(), &387u16.to_le_bytes());
    }

    #[test]
    fn test_sentinel_codes() {
        let caps = CapabilitySet::from_bits(0x7F);
        assert_eq!(
            field_code(Field::OutdoorTemperature, SENTINEL_TEMPERATURE, &caps),
            FieldCode::I16(i16::MIN)
        );
        assert_eq!(field_code(Field::Humidity, -1.0, &caps), FieldCode::I16(-100));
        assert_eq!(field_code(Field::Pressure, -1.0, &caps), FieldCode::U16(0));
        assert_eq!(field_code(Field::Ph, -1.0, &caps), FieldCode::U16(0));
        assert_eq!(field_code(Field::Battery, -1.0, &caps), FieldCode::U16(0));
        assert_eq!(field_code(Field::Ph, f32::NAN, &caps), FieldCode::U16(0));
    }

    #[test]
    fn test_sentinel_record_keeps_frame_length() {
        let mut storage = [0u8; 16];
        for bits in 0..CapabilitySet::COMBINATIONS {
            let caps = CapabilitySet::from_bits(bits);
            let mut buffer = PayloadBuffer::new(&mut storage);
            assert_eq!(encode(&ReadingRecord::sentinel(), &caps, &mut buffer), Ok(caps.frame_len()));
        }
    }

    #[test]
    fn test_empty_capability_set() {
        let mut storage = [0u8; 0];
        let mut buffer = PayloadBuffer::new(&mut storage);
        assert_eq!(encode(&climate_record(), &CapabilitySet::NONE, &mut buffer), Ok(0));
    }

    #[test]
    fn test_buffer_too_small_writes_nothing() {
        let caps = CapabilitySet::from_sensors(true, true, true, BatteryEncoding::Percentage);
        let mut storage = [0x55u8; 10];
        let mut buffer = PayloadBuffer::new(&mut storage);
        assert_eq!(
            encode(&climate_record(), &caps, &mut buffer),
            Err(PayloadError::BufferTooSmall { needed: 11, got: 10 })
        );
        assert!(buffer.is_empty());
        drop(buffer);
        assert_eq!(storage, [0x55u8; 10]);
    }

    #[test]
    fn test_appends_after_existing_bytes() {
        let caps = CapabilitySet {
            ph: true,
            ..CapabilitySet::NONE
        };
        let record = ReadingRecord {
            ph: 7.25,
            ..ReadingRecord::sentinel()
        };
        let mut storage = [0u8; 4];
        let mut buffer = PayloadBuffer::new(&mut storage);
        buffer.extend_from_slice(&[0xEE]).unwrap();
        assert_eq!(encode(&record, &caps, &mut buffer), Ok(2));
        assert_eq!(buffer.as_bytes(), &[0xEE, 0xD5, 0x02]);
    }
}
