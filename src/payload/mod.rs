// src/payload/mod.rs

//! Fixed-layout telemetry frames: the device-side encoder and the
//! network-side decoding recipe, both driven by one [`CapabilitySet`].
//!
//! [`CapabilitySet`]: crate::common::CapabilitySet

pub mod decoder;
pub mod encoder;

pub use decoder::{
    describe_decoder, ConfigurationSummary, DecodedFrame, DecoderDescription, DecoderRecipe, Diagnostics, FieldSpec,
};
pub use encoder::{encode, field_code, FieldCode};

use crate::common::error::PayloadError;

/// Caller-owned byte storage with a high-water mark.
///
/// Append-only: bytes before [`len`](Self::len) are never rewritten until
/// [`clear`](Self::clear).
#[derive(Debug)]
pub struct PayloadBuffer<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> PayloadBuffer<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        PayloadBuffer { buf, len: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.len
    }

    /// The written part of the buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Resets the high-water mark so the storage can take the next frame.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Appends `bytes`, or writes nothing if they do not fit.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<(), PayloadError> {
        let got = self.remaining();
        let end = self.len + bytes.len();
        let slot = self.buf.get_mut(self.len..end).ok_or(PayloadError::BufferTooSmall {
            needed: bytes.len(),
            got,
        })?;
        slot.copy_from_slice(bytes);
        self.len = end;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_high_water_mark() {
        let mut storage = [0xAAu8; 4];
        let mut buffer = PayloadBuffer::new(&mut storage);
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 4);

        buffer.extend_from_slice(&[1, 2]).unwrap();
        buffer.extend_from_slice(&[3]).unwrap();
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.remaining(), 1);
        assert_eq!(buffer.as_bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_overflow_writes_nothing() {
        let mut storage = [0xAAu8; 3];
        let mut buffer = PayloadBuffer::new(&mut storage);
        buffer.extend_from_slice(&[1, 2]).unwrap();
        assert_eq!(
            buffer.extend_from_slice(&[3, 4]),
            Err(PayloadError::BufferTooSmall { needed: 2, got: 1 })
        );
        assert_eq!(buffer.as_bytes(), &[1, 2]);
        drop(buffer);
        assert_eq!(storage[2], 0xAA);
    }

    #[test]
    fn test_clear() {
        let mut storage = [0u8; 2];
        let mut buffer = PayloadBuffer::new(&mut storage);
        buffer.extend_from_slice(&[9, 9]).unwrap();
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.remaining(), 2);
    }
}
