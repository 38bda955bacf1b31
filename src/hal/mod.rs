//! Hardware abstraction layer
//!
//! The endpoint sits on top of a byte-oriented transport (SPI, I²C or UART)
//! reached through the [`ShtpHal`] trait. Implementations own the bus and the
//! device-specific handshaking (wake lines, interrupt pins, clock stretching);
//! the endpoint only sees whole transfers.
//!
//! All I/O is polled. `read` must never block waiting for the device, and
//! `write` signals back-pressure with [`WriteOutcome::Busy`] instead of
//! blocking.

pub mod i2c;
pub mod mock;

pub use i2c::ShtpI2c;

use crate::error::HalError;

/// Largest frame handed to [`ShtpHal::write`], header included
pub const MAX_TRANSFER_OUT: usize = 256;

/// Largest single transfer returned by [`ShtpHal::read`]
pub const MAX_TRANSFER_IN: usize = 256;

/// Largest cargo accepted by `send`
pub const MAX_PAYLOAD_OUT: usize = 256;

/// Capacity of the inbound reassembly buffer
pub const MAX_PAYLOAD_IN: usize = 1024;

/// Outcome of a HAL write attempt
///
/// Writes are all-or-nothing at the frame boundary: `Accepted` means the
/// whole frame was taken by the transport, `Busy` means none of it was and
/// the caller should retry the identical frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteOutcome {
    /// The frame was accepted by the transport
    Accepted,
    /// The device cannot take a frame right now; retry later
    Busy,
}

/// Monotonic microsecond clock
///
/// HAL implementations that cannot timestamp transfers in hardware stamp
/// them with a `TimeSource` at the moment the bytes are read off the bus.
pub trait TimeSource {
    /// Current time in microseconds from an arbitrary monotonic origin
    fn now_us(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}

/// Byte-level transport consumed by the endpoint
///
/// # Contract
///
/// - `read` and `write` move whole SHTP frames (or, for transports that
///   cannot frame, a prefix of transport data starting with a frame header).
/// - `write` is all-or-nothing: a frame is either fully accepted or not at
///   all. Partial acceptance would desynchronize the per-channel sequence
///   numbers, which advance once per formatted frame.
/// - Timestamps are monotonic microseconds and apply to the moment the
///   transfer was received.
pub trait ShtpHal {
    /// Bring the transport up
    ///
    /// Called exactly once, from `Endpoint::open`.
    ///
    /// # Errors
    ///
    /// Returns `HalError` if the bus cannot be initialized or the device does
    /// not respond; the endpoint open fails and no further calls are made.
    fn open(&mut self) -> Result<(), HalError>;

    /// Release the transport
    ///
    /// Called exactly once, from `Endpoint::close`.
    fn close(&mut self);

    /// Attempt to transmit one frame
    ///
    /// # Errors
    ///
    /// Returns `HalError` on a bus failure. The endpoint aborts the cargo
    /// being transmitted and surfaces the error to the `send` caller.
    fn write(&mut self, frame: &[u8]) -> Result<WriteOutcome, HalError>;

    /// Poll for one received transfer
    ///
    /// Fills `buffer` and returns the transfer length together with its
    /// timestamp in microseconds, or `None` when nothing is pending. Must not
    /// block waiting for the device.
    ///
    /// # Errors
    ///
    /// Returns `HalError` on a bus failure. "No data available" is not a
    /// failure; report it as `Ok(None)`.
    fn read(&mut self, buffer: &mut [u8]) -> Result<Option<(usize, u64)>, HalError>;
}
