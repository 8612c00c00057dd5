// src/lib.rs

#![no_std] // Specify no_std at the crate root

// Must come first so the logging macros are visible to every module below.
#[macro_use]
mod log;

pub mod acquisition;
pub mod common;
pub mod payload;
pub mod sensor;

// Re-export key types for convenience
pub use acquisition::Acquisition;
pub use common::{CapabilitySet, Field, PayloadError, ReadingRecord, SensorError};
pub use payload::{describe_decoder, encode, PayloadBuffer};
pub use sensor::SensorProvider;
