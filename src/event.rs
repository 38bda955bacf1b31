//! Asynchronous protocol events
//!
//! The endpoint reports non-fatal protocol anomalies through a registered
//! event listener. Events never fail the call that detected them; each one
//! also bumps the matching counter in [`ShtpStats`](crate::endpoint::ShtpStats).

/// Listener for asynchronous protocol events
///
/// Invoked synchronously from `service` (receive-side events) or from `send`
/// (transmit-side events and any `service` pass pumped during a busy wait).
pub type EventListener<'a> = dyn FnMut(ShtpEvent) + 'a;

/// Protocol anomalies reported through the event listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShtpEvent {
    /// Received transfer (or its declared length) shorter than one header
    ShortFragment,
    /// First fragment declared a payload larger than the reassembly buffer
    TooLargePayload,
    /// Received frame addressed a channel outside the channel table
    BadRxChannel,
    /// `send` was asked to transmit on a channel outside the channel table
    BadTxChannel,
    /// Received fragment does not fit the assembly in progress
    BadFragment,
    /// Received sequence number differs from the expected one
    BadSequence,
    /// An assembly in progress was abandoned because of an incompatible fragment
    InterruptedPayload,
    /// An outbound cargo was aborted after a HAL write failure
    TxDiscard,
}
