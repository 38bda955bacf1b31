//! Error types
//!
//! This module defines error types for the SHTP endpoint and its HAL seam.
//! HAL implementations map their bus-specific failures to `HalError`; the
//! endpoint wraps those in `ShtpError` alongside its own parameter checks.

use core::fmt;

/// Result type for SHTP operations
pub type Result<T> = core::result::Result<T, ShtpError>;

/// Endpoint-level errors
///
/// Protocol anomalies on the receive path are never surfaced here; they are
/// reported through the event listener and the statistics counters instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShtpError {
    /// Channel id out of range, or listener registration on channel 0
    InvalidChannel,
    /// Outbound cargo exceeds the maximum payload size
    PayloadTooLarge,
    /// The HAL reported a bus-level failure
    Hal(HalError),
}

/// Bus-level errors reported by a HAL implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// The transport could not be brought up
    OpenFailed,
    /// A bus transfer failed
    Bus,
    /// The device did not respond within the HAL's deadline
    Timeout,
}

impl From<HalError> for ShtpError {
    fn from(e: HalError) -> Self {
        ShtpError::Hal(e)
    }
}

impl fmt::Display for ShtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShtpError::InvalidChannel => write!(f, "invalid channel"),
            ShtpError::PayloadTooLarge => write!(f, "payload too large"),
            ShtpError::Hal(e) => write!(f, "HAL error: {}", e),
        }
    }
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HalError::OpenFailed => write!(f, "transport open failed"),
            HalError::Bus => write!(f, "bus transfer failed"),
            HalError::Timeout => write!(f, "device timeout"),
        }
    }
}
