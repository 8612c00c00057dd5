// src/common/crc.rs

use super::error::SensorError;
use crc::{Crc, CRC_8_MAXIM_DOW};

// Dallas/Maxim one-wire CRC-8.
// Polynomial: 0x31 (x^8 + x^5 + x^4 + 1), reflected in and out, init 0x00.
// Check value: 0xA1 (for "123456789").
const CRC_COMPUTER: Crc<u8> = Crc::<u8>::new(&CRC_8_MAXIM_DOW);

/// Calculates the one-wire CRC-8 over `data`.
#[inline]
pub fn calculate_crc8(data: &[u8]) -> u8 {
    CRC_COMPUTER.checksum(data)
}

/// Verifies a DS18B20 scratchpad: byte 8 is the CRC of bytes 0..8.
///
/// # Returns
///
/// * `Ok(())` if the CRC is valid.
/// * `Err(SensorError::CrcMismatch)` otherwise.
pub fn verify_scratchpad(scratchpad: &[u8; 9]) -> Result<(), SensorError> {
    let calculated = calculate_crc8(&scratchpad[..8]);
    let expected = scratchpad[8];
    if calculated == expected {
        Ok(())
    } else {
        Err(SensorError::CrcMismatch { expected, calculated })
    }
}
