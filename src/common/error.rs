// src/common/error.rs

/// Why a sensor provider produced no data this cycle.
///
/// These never escape the acquisition cycle; the orchestrator logs them and
/// leaves the provider's fields at their sentinels.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// The provider has never been brought up successfully (or lost it).
    #[error("sensor not initialized")]
    Unavailable,

    /// The reading is outside the physically plausible range or the
    /// transducer reports itself disconnected. The provider stays available.
    #[error("sensor reading out of range or transducer disconnected")]
    ReadInvalid,

    /// The underlying bus transfer failed after all attempts.
    #[error("sensor bus error")]
    Bus,

    /// A conversion did not complete within its time budget.
    #[error("sensor conversion timed out")]
    Timeout,

    /// One-wire scratchpad failed its CRC check.
    #[error("CRC mismatch: expected {expected:#04x}, calculated {calculated:#04x}")]
    CrcMismatch { expected: u8, calculated: u8 },
}

/// Errors from packing or unpacking a telemetry frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PayloadError {
    /// Destination buffer cannot hold the build's fixed frame length.
    /// Nothing was written.
    #[error("Buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },

    /// Frame handed to the decoder is shorter than the recipe expects.
    #[error("Frame too short: needed {needed}, got {got}")]
    FrameTooShort { needed: usize, got: usize },
}
