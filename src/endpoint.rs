//! SHTP endpoint
//!
//! The endpoint owns one HAL transport and multiplexes up to
//! [`MAX_CHANNELS`] logical streams over it. Outbound cargoes are split into
//! header-prefixed fragments no larger than the HAL transfer size; inbound
//! fragments are reassembled into whole cargoes and handed to the listener
//! registered on their channel.
//!
//! # Driving the endpoint
//!
//! All I/O is polled: call [`Endpoint::service`] whenever the transport may
//! have data (on an interrupt line edge, or periodically). `send` blocks
//! cooperatively while the device signals back-pressure, pumping `service`
//! between retries so inbound traffic keeps flowing.
//!
//! # Re-entrancy
//!
//! Listeners run synchronously inside `service` and must not call `send` on
//! the same endpoint; queue outbound work and send it after `service`
//! returns.
//!
//! # Example
//!
//! ```ignore
//! use shtp::{Endpoint, ShtpChannel};
//!
//! let mut on_report = |payload: &[u8], timestamp_us: u64| {
//!     // decode a sensor report
//! };
//!
//! let mut endpoint = Endpoint::open(hal)?;
//! endpoint.listen(ShtpChannel::InputReport.into(), &mut on_report)?;
//! loop {
//!     endpoint.service()?;
//! }
//! ```

use heapless::Vec;

use crate::channel::{Channel, ChannelListener, MAX_CHANNELS};
use crate::error::{Result, ShtpError};
use crate::event::{EventListener, ShtpEvent};
use crate::hal::{
    ShtpHal, WriteOutcome, MAX_PAYLOAD_IN, MAX_PAYLOAD_OUT, MAX_TRANSFER_IN, MAX_TRANSFER_OUT,
};
use crate::header::{FrameHeader, HEADER_LEN};

/// Endpoint statistics for monitoring and diagnostics
#[derive(Debug, Clone, Copy, Default)]
pub struct ShtpStats {
    /// Received frames addressed to a channel outside the table
    pub rx_bad_channel: u32,
    /// Received transfers (or declared lengths) shorter than one header
    pub rx_short_fragments: u32,
    /// First fragments declaring a payload beyond the reassembly buffer
    pub rx_too_large_payloads: u32,
    /// Assemblies abandoned because an incompatible fragment arrived
    pub rx_interrupted_payloads: u32,
    /// `send` calls rejected for a channel outside the table
    pub tx_bad_channel: u32,
    /// Outbound cargoes aborted on a HAL write failure
    pub tx_discards: u32,
    /// `send` calls rejected for an oversized payload
    pub tx_too_large_payloads: u32,
}

/// SHTP endpoint over one HAL transport
///
/// Created by [`Endpoint::open`], destroyed by [`Endpoint::close`]. Single
/// owner, not internally synchronized; callers serialize access.
pub struct Endpoint<'a, H: ShtpHal> {
    /// Owned transport
    hal: H,

    /// Listener for asynchronous protocol events
    event_listener: Option<&'a mut EventListener<'a>>,

    /// Per-channel sequence state and listeners
    channels: [Channel<'a>; MAX_CHANNELS],

    /// Staging buffer for one outbound frame
    out_transfer: [u8; MAX_TRANSFER_OUT],

    /// Payload under reassembly
    in_payload: Vec<u8, MAX_PAYLOAD_IN>,
    /// Bytes still expected for the in-flight payload; zero when idle
    in_remaining: u16,
    /// Channel of the in-flight payload
    in_channel: u8,
    /// HAL timestamp of the first fragment of the in-flight payload
    in_timestamp: u64,

    /// Diagnostic counters
    stats: ShtpStats,
}

impl<'a, H: ShtpHal> Endpoint<'a, H> {
    /// Open an endpoint over `hal`
    ///
    /// Brings the transport up. On failure the HAL is dropped and the error
    /// surfaced.
    pub fn open(mut hal: H) -> Result<Self> {
        hal.open()?;
        crate::log_info!("SHTP: endpoint open");
        Ok(Self {
            hal,
            event_listener: None,
            channels: core::array::from_fn(|_| Channel::new()),
            out_transfer: [0; MAX_TRANSFER_OUT],
            in_payload: Vec::new(),
            in_remaining: 0,
            in_channel: 0,
            in_timestamp: 0,
            stats: ShtpStats::default(),
        })
    }

    /// Close the endpoint, closing the transport, and hand the HAL back
    pub fn close(mut self) -> H {
        self.hal.close();
        crate::log_info!("SHTP: endpoint closed");
        self.hal
    }

    /// Register the listener for asynchronous protocol events
    pub fn set_event_listener(&mut self, listener: &'a mut EventListener<'a>) {
        self.event_listener = Some(listener);
    }

    /// Register a cargo listener on `channel`, replacing any prior one
    ///
    /// # Errors
    ///
    /// `InvalidChannel` for channel 0 (reserved for protocol control) or a
    /// channel outside the table.
    pub fn listen(&mut self, channel: u8, listener: &'a mut ChannelListener<'a>) -> Result<()> {
        if channel == 0 || channel as usize >= MAX_CHANNELS {
            return Err(ShtpError::InvalidChannel);
        }
        self.channels[channel as usize].listener = Some(listener);
        Ok(())
    }

    /// Access the underlying HAL (e.g. to drive a test double)
    pub fn hal_mut(&mut self) -> &mut H {
        &mut self.hal
    }

    /// Current diagnostic counters
    pub fn stats(&self) -> ShtpStats {
        self.stats
    }

    /// Reset diagnostic counters
    pub fn reset_stats(&mut self) {
        self.stats = ShtpStats::default();
    }

    /// Send one cargo on `channel`
    ///
    /// The payload is fragmented into transfer-sized frames; the peer's
    /// listener on `channel` sees exactly one delivery of these bytes.
    /// Successive `send` calls on one channel deliver in call order. An empty
    /// payload is a successful no-op.
    ///
    /// Blocks cooperatively while the device signals back-pressure, pumping
    /// [`service`](Self::service) between write retries.
    ///
    /// # Errors
    ///
    /// - `PayloadTooLarge` if the cargo exceeds [`MAX_PAYLOAD_OUT`]
    /// - `InvalidChannel` if `channel` is outside the table
    /// - `Hal` if the transport fails; the rest of the cargo is discarded
    pub fn send(&mut self, channel: u8, payload: &[u8]) -> Result<()> {
        if payload.len() > MAX_PAYLOAD_OUT {
            self.stats.tx_too_large_payloads += 1;
            return Err(ShtpError::PayloadTooLarge);
        }
        if channel as usize >= MAX_CHANNELS {
            self.stats.tx_bad_channel += 1;
            self.emit(ShtpEvent::BadTxChannel);
            return Err(ShtpError::InvalidChannel);
        }
        self.tx_process(channel, payload)
    }

    /// Poll the transport once and process anything received
    ///
    /// Performs one non-blocking HAL read; if a transfer is pending it is fed
    /// through reassembly, which may invoke a channel listener. Protocol
    /// anomalies never fail this call; they raise events and bump counters.
    ///
    /// # Errors
    ///
    /// `Hal` if the transport read fails.
    pub fn service(&mut self) -> Result<()> {
        let mut transfer = [0u8; MAX_TRANSFER_IN];
        if let Some((len, timestamp_us)) = self.hal.read(&mut transfer)? {
            if len > 0 {
                let len = len.min(transfer.len());
                self.rx_assemble(&transfer[..len], timestamp_us);
            }
        }
        Ok(())
    }

    /// Send a cargo as a sequence of transfers
    fn tx_process(&mut self, channel: u8, payload: &[u8]) -> Result<()> {
        let mut continuation = false;
        let mut cursor = 0;
        let mut remaining = payload.len();

        while remaining > 0 {
            // Data bytes (not header) carried by the next transfer
            let chunk = remaining.min(MAX_TRANSFER_OUT - HEADER_LEN);
            let frame_len = chunk + HEADER_LEN;

            // The sequence number advances at format time, exactly once per
            // fragment; busy retries re-send the identical frame.
            let header = FrameHeader {
                length: frame_len as u16,
                continuation,
                channel,
                sequence: self.channels[channel as usize].next_out_seq,
            };
            self.channels[channel as usize].next_out_seq =
                self.channels[channel as usize].next_out_seq.wrapping_add(1);

            self.out_transfer[..HEADER_LEN].copy_from_slice(&header.to_bytes());
            self.out_transfer[HEADER_LEN..frame_len]
                .copy_from_slice(&payload[cursor..cursor + chunk]);

            loop {
                match self.hal.write(&self.out_transfer[..frame_len]) {
                    Ok(WriteOutcome::Accepted) => break,
                    Ok(WriteOutcome::Busy) => {
                        // Keep inbound traffic flowing while we wait
                        if let Err(e) = self.service() {
                            self.stats.tx_discards += 1;
                            self.emit(ShtpEvent::TxDiscard);
                            return Err(e);
                        }
                    }
                    Err(e) => {
                        crate::log_warn!("SHTP: tx discard on channel {}", channel);
                        self.stats.tx_discards += 1;
                        self.emit(ShtpEvent::TxDiscard);
                        return Err(ShtpError::Hal(e));
                    }
                }
            }

            // The rest of this cargo goes out as continuations
            continuation = true;
            cursor += chunk;
            remaining -= chunk;
        }

        Ok(())
    }

    /// Fold one received transfer into the payload under reassembly
    fn rx_assemble(&mut self, transfer: &[u8], timestamp_us: u64) {
        // Discard invalid short fragments
        if transfer.len() < HEADER_LEN {
            crate::log_warn!("SHTP: short fragment ({} bytes)", transfer.len());
            self.stats.rx_short_fragments += 1;
            self.emit(ShtpEvent::ShortFragment);
            return;
        }

        let mut raw = [0u8; HEADER_LEN];
        raw.copy_from_slice(&transfer[..HEADER_LEN]);
        let header = FrameHeader::parse(&raw);
        let chan = header.channel as usize;
        let payload_len = header.length as usize;

        // The expected sequence is only tracked for channels in the table
        if chan < MAX_CHANNELS && header.sequence != self.channels[chan].next_in_seq {
            crate::log_debug!(
                "SHTP: sequence {} on channel {}, expected {}",
                header.sequence,
                header.channel,
                self.channels[chan].next_in_seq
            );
            self.emit(ShtpEvent::BadSequence);
        }

        if payload_len < HEADER_LEN {
            self.stats.rx_short_fragments += 1;
            self.emit(ShtpEvent::ShortFragment);
            return;
        }

        if chan >= MAX_CHANNELS {
            crate::log_warn!("SHTP: bad rx channel {}", header.channel);
            self.stats.rx_bad_channel += 1;
            self.emit(ShtpEvent::BadRxChannel);
            return;
        }

        // Discard the assembly in progress if this fragment doesn't fit it
        if self.in_remaining > 0 {
            let compatible = header.continuation
                && header.channel == self.in_channel
                && header.sequence == self.channels[chan].next_in_seq
                && payload_len - HEADER_LEN == self.in_remaining as usize;
            if !compatible {
                crate::log_debug!("SHTP: assembly interrupted on channel {}", self.in_channel);
                self.emit(ShtpEvent::BadFragment);
                self.in_remaining = 0;
                self.in_payload.clear();
                self.stats.rx_interrupted_payloads += 1;
                self.emit(ShtpEvent::InterruptedPayload);
            }
        }

        // Remember the next sequence number we expect on this channel
        self.channels[chan].next_in_seq = header.sequence.wrapping_add(1);

        if self.in_remaining == 0 {
            if payload_len > MAX_PAYLOAD_IN {
                crate::log_warn!("SHTP: payload too large ({} bytes)", payload_len);
                self.stats.rx_too_large_payloads += 1;
                self.emit(ShtpEvent::TooLargePayload);
                return;
            }

            // First fragment of a new payload
            self.in_timestamp = timestamp_us;
            self.in_payload.clear();
            self.in_channel = header.channel;
        }

        // Only the declared portion of the transfer is frame data
        let len = transfer.len().min(payload_len);
        if self.in_payload.extend_from_slice(&transfer[HEADER_LEN..len]).is_err() {
            // Residual bookkeeping went wrong; drop the cargo rather than truncate it
            self.stats.rx_too_large_payloads += 1;
            self.emit(ShtpEvent::TooLargePayload);
            self.in_remaining = 0;
            self.in_payload.clear();
            return;
        }
        self.in_remaining = (payload_len - len) as u16;

        // Deliver once the whole payload has arrived
        if self.in_remaining == 0 {
            let timestamp = self.in_timestamp;
            let payload: &[u8] = &self.in_payload;
            if let Some(listener) = self.channels[chan].listener.as_mut() {
                listener(payload, timestamp);
            }
        }
    }

    fn emit(&mut self, event: ShtpEvent) {
        if let Some(listener) = self.event_listener.as_mut() {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HalError;
    use crate::hal::mock::MockHal;
    use std::cell::RefCell;

    /// Build one wire frame: header with `declared` in the length field,
    /// followed by `data`
    fn frame(
        channel: u8,
        sequence: u8,
        continuation: bool,
        declared: u16,
        data: &[u8],
    ) -> std::vec::Vec<u8> {
        let header = FrameHeader {
            length: declared,
            continuation,
            channel,
            sequence,
        };
        let mut bytes = header.to_bytes().to_vec();
        bytes.extend_from_slice(data);
        bytes
    }

    #[test]
    fn test_open_failure_surfaces_hal_error() {
        let mut hal = MockHal::new();
        hal.fail_open(HalError::OpenFailed);
        assert!(matches!(
            Endpoint::open(hal),
            Err(ShtpError::Hal(HalError::OpenFailed))
        ));
    }

    #[test]
    fn test_close_closes_hal() {
        let endpoint = Endpoint::open(MockHal::new()).unwrap();
        let hal = endpoint.close();
        assert!(hal.was_closed());
    }

    #[test]
    fn test_listen_rejects_reserved_and_out_of_range() {
        let mut heard = |_: &[u8], _: u64| {};
        let mut endpoint = Endpoint::open(MockHal::new()).unwrap();
        assert_eq!(endpoint.listen(0, &mut heard), Err(ShtpError::InvalidChannel));

        let mut heard = |_: &[u8], _: u64| {};
        assert_eq!(
            endpoint.listen(MAX_CHANNELS as u8, &mut heard),
            Err(ShtpError::InvalidChannel)
        );

        let mut heard = |_: &[u8], _: u64| {};
        assert_eq!(endpoint.listen(1, &mut heard), Ok(()));
    }

    #[test]
    fn test_send_single_fragment_wire_bytes() {
        let mut endpoint = Endpoint::open(MockHal::new()).unwrap();
        endpoint.send(2, &[0x01, 0x02, 0x03]).unwrap();

        let written = endpoint.hal_mut().take_write().unwrap();
        assert_eq!(&written[..], &[0x07, 0x00, 0x02, 0x00, 0x01, 0x02, 0x03]);
        assert_eq!(endpoint.hal_mut().take_write(), None);
    }

    #[test]
    fn test_send_two_fragments() {
        let payload: std::vec::Vec<u8> = (0..=255).collect();
        let mut endpoint = Endpoint::open(MockHal::new()).unwrap();
        endpoint.send(3, &payload).unwrap();

        // 256 payload bytes split at MAX_TRANSFER_OUT - HEADER_LEN = 252
        let first = endpoint.hal_mut().take_write().unwrap();
        assert_eq!(first.len(), MAX_TRANSFER_OUT);
        assert_eq!(&first[..HEADER_LEN], &[0x00, 0x01, 0x03, 0x00]);
        assert_eq!(&first[HEADER_LEN..], &payload[..252]);

        let second = endpoint.hal_mut().take_write().unwrap();
        assert_eq!(second.len(), 8);
        assert_eq!(&second[..HEADER_LEN], &[0x08, 0x80, 0x03, 0x01]);
        assert_eq!(&second[HEADER_LEN..], &payload[252..]);
    }

    #[test]
    fn test_send_sequence_is_per_channel() {
        let mut endpoint = Endpoint::open(MockHal::new()).unwrap();
        endpoint.send(2, &[1]).unwrap();
        endpoint.send(3, &[2]).unwrap();
        endpoint.send(2, &[3]).unwrap();

        assert_eq!(endpoint.hal_mut().take_write().unwrap()[3], 0);
        assert_eq!(endpoint.hal_mut().take_write().unwrap()[3], 0);
        assert_eq!(endpoint.hal_mut().take_write().unwrap()[3], 1);
    }

    #[test]
    fn test_send_sequence_wraps() {
        let mut endpoint = Endpoint::open(MockHal::new()).unwrap();
        for _ in 0..=255 {
            endpoint.send(1, &[0]).unwrap();
            endpoint.hal_mut().take_write().unwrap();
        }
        endpoint.send(1, &[0]).unwrap();
        assert_eq!(endpoint.hal_mut().take_write().unwrap()[3], 0);
    }

    #[test]
    fn test_send_empty_payload_is_noop() {
        let mut endpoint = Endpoint::open(MockHal::new()).unwrap();
        endpoint.send(2, &[]).unwrap();
        assert_eq!(endpoint.hal_mut().pending_writes(), 0);
    }

    #[test]
    fn test_send_rejects_oversized_payload() {
        let payload = [0u8; MAX_PAYLOAD_OUT + 1];
        let mut endpoint = Endpoint::open(MockHal::new()).unwrap();
        assert_eq!(endpoint.send(2, &payload), Err(ShtpError::PayloadTooLarge));
        assert_eq!(endpoint.stats().tx_too_large_payloads, 1);
        assert_eq!(endpoint.hal_mut().pending_writes(), 0);
    }

    #[test]
    fn test_send_rejects_bad_channel() {
        let events = RefCell::new(std::vec::Vec::new());
        let mut on_event = |event: ShtpEvent| events.borrow_mut().push(event);

        let mut endpoint = Endpoint::open(MockHal::new()).unwrap();
        endpoint.set_event_listener(&mut on_event);
        assert_eq!(
            endpoint.send(MAX_CHANNELS as u8, &[1]),
            Err(ShtpError::InvalidChannel)
        );
        assert_eq!(endpoint.stats().tx_bad_channel, 1);
        assert_eq!(*events.borrow(), vec![ShtpEvent::BadTxChannel]);
    }

    #[test]
    fn test_send_busy_pumps_service_and_retries() {
        let received = RefCell::new(std::vec::Vec::new());
        let mut on_cargo = |payload: &[u8], _: u64| received.borrow_mut().push(payload.to_vec());

        let mut hal = MockHal::new();
        hal.busy_for(1);
        hal.push_read(&frame(4, 0, false, 6, &[0xAA, 0xBB]), 10);

        let mut endpoint = Endpoint::open(hal).unwrap();
        endpoint.listen(4, &mut on_cargo).unwrap();
        endpoint.send(2, &[0x01]).unwrap();

        // One busy attempt, one accepted; the pumped service drained the
        // inbound transfer
        assert_eq!(endpoint.hal_mut().write_attempts(), 2);
        assert_eq!(endpoint.hal_mut().pending_reads(), 0);
        assert_eq!(*received.borrow(), vec![vec![0xAA, 0xBB]]);

        // The retried frame went out once, with one sequence step
        let written = endpoint.hal_mut().take_write().unwrap();
        assert_eq!(&written[..], &[0x05, 0x00, 0x02, 0x00, 0x01]);
        endpoint.send(2, &[0x02]).unwrap();
        assert_eq!(endpoint.hal_mut().take_write().unwrap()[3], 1);
    }

    #[test]
    fn test_send_write_error_discards_cargo() {
        let events = RefCell::new(std::vec::Vec::new());
        let mut on_event = |event: ShtpEvent| events.borrow_mut().push(event);

        let mut hal = MockHal::new();
        hal.fail_writes(HalError::Bus);

        let mut endpoint = Endpoint::open(hal).unwrap();
        endpoint.set_event_listener(&mut on_event);
        assert_eq!(
            endpoint.send(2, &[1, 2, 3]),
            Err(ShtpError::Hal(HalError::Bus))
        );
        assert_eq!(endpoint.stats().tx_discards, 1);
        assert_eq!(*events.borrow(), vec![ShtpEvent::TxDiscard]);
    }

    #[test]
    fn test_service_delivers_single_fragment() {
        let received = RefCell::new(std::vec::Vec::new());
        let mut on_cargo =
            |payload: &[u8], timestamp: u64| received.borrow_mut().push((payload.to_vec(), timestamp));

        let mut hal = MockHal::new();
        hal.push_read(&[0x07, 0x00, 0x02, 0x00, 0x01, 0x02, 0x03], 1234);

        let mut endpoint = Endpoint::open(hal).unwrap();
        endpoint.listen(2, &mut on_cargo).unwrap();
        endpoint.service().unwrap();

        assert_eq!(*received.borrow(), vec![(vec![0x01, 0x02, 0x03], 1234)]);
    }

    #[test]
    fn test_service_reassembles_two_fragments() {
        let payload: std::vec::Vec<u8> = (0..80).collect();
        let received = RefCell::new(std::vec::Vec::new());
        let mut on_cargo =
            |bytes: &[u8], timestamp: u64| received.borrow_mut().push((bytes.to_vec(), timestamp));

        let mut hal = MockHal::new();
        hal.push_read(&frame(3, 0, false, 84, &payload[..60]), 1000);
        hal.push_read(&frame(3, 1, true, 24, &payload[60..]), 2000);

        let mut endpoint = Endpoint::open(hal).unwrap();
        endpoint.listen(3, &mut on_cargo).unwrap();
        endpoint.service().unwrap();
        assert!(received.borrow().is_empty());
        endpoint.service().unwrap();

        // Delivered once, stamped with the first fragment's timestamp
        assert_eq!(*received.borrow(), vec![(payload, 1000)]);
    }

    #[test]
    fn test_service_short_transfer() {
        let events = RefCell::new(std::vec::Vec::new());
        let mut on_event = |event: ShtpEvent| events.borrow_mut().push(event);

        let mut hal = MockHal::new();
        hal.push_read(&[0x05], 0);

        let mut endpoint = Endpoint::open(hal).unwrap();
        endpoint.set_event_listener(&mut on_event);
        endpoint.service().unwrap();

        assert_eq!(endpoint.stats().rx_short_fragments, 1);
        assert_eq!(*events.borrow(), vec![ShtpEvent::ShortFragment]);
    }

    #[test]
    fn test_service_short_length_field() {
        let events = RefCell::new(std::vec::Vec::new());
        let mut on_event = |event: ShtpEvent| events.borrow_mut().push(event);

        let mut hal = MockHal::new();
        // Length field 2 < HEADER_LEN
        hal.push_read(&[0x02, 0x00, 0x01, 0x00], 0);

        let mut endpoint = Endpoint::open(hal).unwrap();
        endpoint.set_event_listener(&mut on_event);
        endpoint.service().unwrap();

        assert_eq!(endpoint.stats().rx_short_fragments, 1);
        assert_eq!(*events.borrow(), vec![ShtpEvent::ShortFragment]);
    }

    #[test]
    fn test_service_bad_rx_channel() {
        let events = RefCell::new(std::vec::Vec::new());
        let mut on_event = |event: ShtpEvent| events.borrow_mut().push(event);

        let mut hal = MockHal::new();
        hal.push_read(&frame(MAX_CHANNELS as u8, 0, false, 5, &[0xEE]), 0);

        let mut endpoint = Endpoint::open(hal).unwrap();
        endpoint.set_event_listener(&mut on_event);
        endpoint.service().unwrap();

        assert_eq!(endpoint.stats().rx_bad_channel, 1);
        assert_eq!(*events.borrow(), vec![ShtpEvent::BadRxChannel]);
    }

    #[test]
    fn test_service_oversize_payload_dropped_whole() {
        let received = RefCell::new(std::vec::Vec::new());
        let mut on_cargo = |bytes: &[u8], _: u64| received.borrow_mut().push(bytes.to_vec());
        let events = RefCell::new(std::vec::Vec::new());
        let mut on_event = |event: ShtpEvent| events.borrow_mut().push(event);

        let mut hal = MockHal::new();
        // Declares more than MAX_PAYLOAD_IN
        hal.push_read(
            &frame(3, 0, false, (MAX_PAYLOAD_IN + 76) as u16, &[0u8; 60]),
            0,
        );
        hal.push_read(&frame(3, 1, false, 7, &[1, 2, 3]), 5);

        let mut endpoint = Endpoint::open(hal).unwrap();
        endpoint.listen(3, &mut on_cargo).unwrap();
        endpoint.set_event_listener(&mut on_event);
        endpoint.service().unwrap();

        assert_eq!(endpoint.stats().rx_too_large_payloads, 1);
        assert_eq!(*events.borrow(), vec![ShtpEvent::TooLargePayload]);
        assert!(received.borrow().is_empty());

        // Idle preserved: the next first fragment delivers normally
        endpoint.service().unwrap();
        assert_eq!(*received.borrow(), vec![vec![1, 2, 3]]);
    }

    #[test]
    fn test_service_interrupted_assembly() {
        let received = RefCell::new(std::vec::Vec::new());
        let mut on_cargo = |bytes: &[u8], _: u64| received.borrow_mut().push(bytes.to_vec());
        let events = RefCell::new(std::vec::Vec::new());
        let mut on_event = |event: ShtpEvent| events.borrow_mut().push(event);

        let mut hal = MockHal::new();
        // A opens a 100-byte assembly carrying 60 data bytes
        hal.push_read(&frame(3, 0, false, 100, &[0xAA; 60]), 0);
        // B is not a continuation: incompatible, A dropped, B delivers
        hal.push_read(&frame(3, 1, false, 54, &[0xBB; 50]), 1);

        let mut endpoint = Endpoint::open(hal).unwrap();
        endpoint.listen(3, &mut on_cargo).unwrap();
        endpoint.set_event_listener(&mut on_event);
        endpoint.service().unwrap();
        endpoint.service().unwrap();

        assert_eq!(endpoint.stats().rx_interrupted_payloads, 1);
        assert_eq!(
            *events.borrow(),
            vec![ShtpEvent::BadFragment, ShtpEvent::InterruptedPayload]
        );
        assert_eq!(*received.borrow(), vec![vec![0xBB; 50]]);
    }

    #[test]
    fn test_service_permissive_sequence() {
        let received = RefCell::new(std::vec::Vec::new());
        let mut on_cargo = |bytes: &[u8], _: u64| received.borrow_mut().push(bytes.to_vec());
        let events = RefCell::new(std::vec::Vec::new());
        let mut on_event = |event: ShtpEvent| events.borrow_mut().push(event);

        let mut hal = MockHal::new();
        // Skipped ahead to sequence 5; the frame is still delivered
        hal.push_read(&frame(2, 5, false, 6, &[1, 2]), 0);
        // The endpoint follows the sender: 6 is now in sequence
        hal.push_read(&frame(2, 6, false, 6, &[3, 4]), 1);

        let mut endpoint = Endpoint::open(hal).unwrap();
        endpoint.listen(2, &mut on_cargo).unwrap();
        endpoint.set_event_listener(&mut on_event);
        endpoint.service().unwrap();
        endpoint.service().unwrap();

        assert_eq!(*events.borrow(), vec![ShtpEvent::BadSequence]);
        assert_eq!(*received.borrow(), vec![vec![1, 2], vec![3, 4]]);
    }

    #[test]
    fn test_service_clamps_trailing_bytes() {
        let received = RefCell::new(std::vec::Vec::new());
        let mut on_cargo = |bytes: &[u8], _: u64| received.borrow_mut().push(bytes.to_vec());

        let mut hal = MockHal::new();
        // Transfer carries 8 bytes beyond the declared frame length
        let mut transfer = frame(2, 0, false, 8, &[1, 2, 3, 4]);
        transfer.extend_from_slice(&[0xFF; 8]);
        hal.push_read(&transfer, 0);

        let mut endpoint = Endpoint::open(hal).unwrap();
        endpoint.listen(2, &mut on_cargo).unwrap();
        endpoint.service().unwrap();

        assert_eq!(*received.borrow(), vec![vec![1, 2, 3, 4]]);
    }

    #[test]
    fn test_service_header_only_frame_delivers_empty_cargo() {
        let received = RefCell::new(std::vec::Vec::new());
        let mut on_cargo = |bytes: &[u8], _: u64| received.borrow_mut().push(bytes.to_vec());

        let mut hal = MockHal::new();
        hal.push_read(&frame(2, 0, false, HEADER_LEN as u16, &[]), 0);

        let mut endpoint = Endpoint::open(hal).unwrap();
        endpoint.listen(2, &mut on_cargo).unwrap();
        endpoint.service().unwrap();

        assert_eq!(*received.borrow(), vec![std::vec::Vec::<u8>::new()]);
    }

    #[test]
    fn test_service_lone_continuation_starts_fresh_assembly() {
        let received = RefCell::new(std::vec::Vec::new());
        let mut on_cargo = |bytes: &[u8], _: u64| received.borrow_mut().push(bytes.to_vec());
        let events = RefCell::new(std::vec::Vec::new());
        let mut on_event = |event: ShtpEvent| events.borrow_mut().push(event);

        let mut hal = MockHal::new();
        // A continuation arriving idle opens a new assembly, as the hub does
        // after resetting mid-payload
        hal.push_read(&frame(2, 0, true, 10, &[9, 9, 9, 9, 9, 9]), 0);

        let mut endpoint = Endpoint::open(hal).unwrap();
        endpoint.listen(2, &mut on_cargo).unwrap();
        endpoint.set_event_listener(&mut on_event);
        endpoint.service().unwrap();

        assert!(events.borrow().is_empty());
        assert_eq!(*received.borrow(), vec![vec![9; 6]]);
    }

    #[test]
    fn test_service_without_listener_discards_silently() {
        let mut hal = MockHal::new();
        hal.push_read(&frame(5, 0, false, 6, &[1, 2]), 0);

        let mut endpoint = Endpoint::open(hal).unwrap();
        endpoint.service().unwrap();

        // No listener registered: payload dropped, no anomaly recorded
        assert_eq!(endpoint.stats().rx_interrupted_payloads, 0);
        assert_eq!(endpoint.stats().rx_bad_channel, 0);
    }

    #[test]
    fn test_service_read_error_propagates() {
        let mut hal = MockHal::new();
        hal.fail_next_read(HalError::Bus);

        let mut endpoint = Endpoint::open(hal).unwrap();
        assert_eq!(endpoint.service(), Err(ShtpError::Hal(HalError::Bus)));
        assert_eq!(endpoint.service(), Ok(()));
    }

    #[test]
    fn test_stats_reset() {
        let mut hal = MockHal::new();
        hal.push_read(&[0x01], 0);

        let mut endpoint = Endpoint::open(hal).unwrap();
        endpoint.service().unwrap();
        assert_eq!(endpoint.stats().rx_short_fragments, 1);

        endpoint.reset_stats();
        assert_eq!(endpoint.stats().rx_short_fragments, 0);
    }
}
