//! SHTP over I2C
//!
//! Blocking I2C implementation of [`ShtpHal`] for BNO08x-class devices.
//!
//! # I2C Protocol Notes
//!
//! BNO08x sensors use I2C with the following characteristics:
//! - Default address: 0x4A (SA0 high) or 0x4B (SA0 low)
//! - Speed: up to 400kHz (Fast Mode)
//! - Clock stretching: required (sensor may hold SCL low)
//!
//! Unlike typical I2C devices, the BNO08x does NOT use register addresses.
//! Every read starts at the beginning of the sensor's output buffer, and the
//! whole frame must be taken in ONE transaction; splitting header and payload
//! into separate reads changes sensor state between them. Reads therefore
//! fetch a full transfer and let the frame header say how much of it is real.
//!
//! The sensor NACKs writes while its receive buffer is full, which maps onto
//! [`WriteOutcome::Busy`].

use embedded_hal::i2c::{Error as _, ErrorKind, I2c};

use super::{ShtpHal, TimeSource, WriteOutcome, MAX_TRANSFER_IN};
use crate::error::HalError;
use crate::header::HEADER_LEN;

/// SHTP over I2C transport
///
/// # Type Parameters
///
/// * `I2C` - I2C bus type implementing `embedded_hal::i2c::I2c`
/// * `T` - Clock used to stamp inbound transfers
pub struct ShtpI2c<I2C, T> {
    /// I2C bus instance
    i2c: I2C,
    /// Device I2C address (7-bit)
    address: u8,
    /// Timestamp source for inbound transfers
    time: T,
}

impl<I2C, T> ShtpI2c<I2C, T> {
    /// Default BNO08x I2C address (SA0 = high)
    pub const DEFAULT_ADDRESS: u8 = 0x4A;

    /// Alternate BNO08x I2C address (SA0 = low)
    pub const ALTERNATE_ADDRESS: u8 = 0x4B;

    /// Create a new SHTP I2C transport
    pub fn new(i2c: I2C, address: u8, time: T) -> Self {
        Self { i2c, address, time }
    }

    /// Get the I2C address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Release the I2C bus and the clock
    pub fn release(self) -> (I2C, T) {
        (self.i2c, self.time)
    }
}

impl<I2C, T> ShtpHal for ShtpI2c<I2C, T>
where
    I2C: I2c,
    T: TimeSource,
{
    fn open(&mut self) -> Result<(), HalError> {
        // Bus bring-up belongs to the platform layer; the device needs no
        // addressing preamble.
        Ok(())
    }

    fn close(&mut self) {
        // Shared bus; nothing to release.
    }

    fn write(&mut self, frame: &[u8]) -> Result<WriteOutcome, HalError> {
        match self.i2c.write(self.address, frame) {
            Ok(()) => Ok(WriteOutcome::Accepted),
            Err(e) if matches!(e.kind(), ErrorKind::NoAcknowledge(_)) => Ok(WriteOutcome::Busy),
            Err(_) => Err(HalError::Bus),
        }
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<Option<(usize, u64)>, HalError> {
        let len = buffer.len().min(MAX_TRANSFER_IN);
        if len < HEADER_LEN {
            return Ok(None);
        }
        let buf = &mut buffer[..len];
        match self.i2c.read(self.address, buf) {
            Ok(()) => {}
            Err(e) if matches!(e.kind(), ErrorKind::NoAcknowledge(_)) => return Ok(None),
            Err(_) => return Err(HalError::Bus),
        }
        let timestamp_us = self.time.now_us();

        // Zero-length or floating-bus (0xFF) headers mean nothing is pending
        let raw_length = u16::from_le_bytes([buf[0], buf[1]]) & 0x7FFF;
        if raw_length == 0 || buf[0] == 0xFF {
            return Ok(None);
        }

        Ok(Some((len, timestamp_us)))
    }
}
