#![cfg_attr(not(test), no_std)]

//! Sensor Hub Transport Protocol (SHTP)
//!
//! Framing layer for BNO08x-class motion sensor hubs: a fragmenting,
//! multi-channel, sequence-numbered transport carrying variable-length
//! payloads over a byte-oriented bus (SPI, I²C or UART).
//!
//! The crate centers on [`Endpoint`], which owns a [`hal::ShtpHal`]
//! transport and:
//!
//! - splits outbound cargoes into header-prefixed fragments sized to the
//!   transport, with continuation semantics and per-channel sequence numbers;
//! - reassembles inbound fragments into whole cargoes, detecting corruption
//!   (short fragments, oversized payloads, interrupted assemblies) and
//!   recovering at the next first fragment;
//! - dispatches completed cargoes to per-channel listeners and protocol
//!   anomalies to an event listener.
//!
//! Everything is polled; there is no executor dependency. On embedded
//! targets enable the `defmt` feature for logging.
//!
//! ## Usage
//!
//! ```ignore
//! use shtp::{Endpoint, ShtpChannel};
//! use shtp::hal::ShtpI2c;
//!
//! let transport = ShtpI2c::new(i2c, 0x4A, clock);
//! let mut on_report = |payload: &[u8], timestamp_us: u64| {
//!     // decode a sensor report
//! };
//!
//! let mut endpoint = Endpoint::open(transport)?;
//! endpoint.listen(ShtpChannel::InputReport.into(), &mut on_report)?;
//! loop {
//!     endpoint.service()?;
//! }
//! ```

pub mod channel;
pub mod endpoint;
pub mod error;
pub mod event;
pub mod hal;
pub mod header;
mod logging;

pub use channel::{ChannelListener, ShtpChannel, MAX_CHANNELS};
pub use endpoint::{Endpoint, ShtpStats};
pub use error::{HalError, Result, ShtpError};
pub use event::{EventListener, ShtpEvent};
pub use hal::{
    ShtpHal, TimeSource, WriteOutcome, MAX_PAYLOAD_IN, MAX_PAYLOAD_OUT, MAX_TRANSFER_IN,
    MAX_TRANSFER_OUT,
};
pub use header::{FrameHeader, HEADER_LEN};
