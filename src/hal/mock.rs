//! Mock HAL for host-side testing
//!
//! [`MockHal`] is a scripted test double: tests queue inbound transfers with
//! timestamps, script write back-pressure and failures, and inspect the
//! frames the endpoint produced. [`MockClock`] is a manually-advanced
//! [`TimeSource`] for HAL implementations that need one.
//!
//! Panics on script misuse (oversized transfers, overfull queues); these are
//! test fixtures, not production paths.

use core::cell::Cell;

use heapless::{Deque, Vec};

use super::{ShtpHal, TimeSource, WriteOutcome, MAX_TRANSFER_IN, MAX_TRANSFER_OUT};
use crate::error::HalError;

/// Maximum queued transfers per direction
const SCRIPT_DEPTH: usize = 32;

/// Scripted in-memory transport
pub struct MockHal {
    open_error: Option<HalError>,
    opened: bool,
    closed: bool,
    inbound: Deque<(Vec<u8, MAX_TRANSFER_IN>, u64), SCRIPT_DEPTH>,
    read_error: Option<HalError>,
    busy_writes: u32,
    write_error: Option<HalError>,
    outbound: Deque<Vec<u8, MAX_TRANSFER_OUT>, SCRIPT_DEPTH>,
    write_attempts: u32,
}

impl MockHal {
    pub fn new() -> Self {
        Self {
            open_error: None,
            opened: false,
            closed: false,
            inbound: Deque::new(),
            read_error: None,
            busy_writes: 0,
            write_error: None,
            outbound: Deque::new(),
            write_attempts: 0,
        }
    }

    /// Make the next `open` fail with `error`
    pub fn fail_open(&mut self, error: HalError) {
        self.open_error = Some(error);
    }

    /// Queue one inbound transfer with its receive timestamp
    pub fn push_read(&mut self, bytes: &[u8], timestamp_us: u64) {
        let transfer =
            Vec::from_slice(bytes).expect("scripted transfer exceeds MAX_TRANSFER_IN");
        self.inbound
            .push_back((transfer, timestamp_us))
            .expect("mock inbound queue full");
    }

    /// Make the next `read` fail with `error` (one-shot)
    pub fn fail_next_read(&mut self, error: HalError) {
        self.read_error = Some(error);
    }

    /// Inbound transfers still queued
    pub fn pending_reads(&self) -> usize {
        self.inbound.len()
    }

    /// Answer the next `count` writes with [`WriteOutcome::Busy`]
    pub fn busy_for(&mut self, count: u32) {
        self.busy_writes = count;
    }

    /// Make every subsequent `write` fail with `error`
    pub fn fail_writes(&mut self, error: HalError) {
        self.write_error = Some(error);
    }

    /// Pop the oldest frame the endpoint wrote
    pub fn take_write(&mut self) -> Option<Vec<u8, MAX_TRANSFER_OUT>> {
        self.outbound.pop_front()
    }

    /// Frames written and accepted, still queued for inspection
    pub fn pending_writes(&self) -> usize {
        self.outbound.len()
    }

    /// Total `write` calls observed, including busy and failed attempts
    pub fn write_attempts(&self) -> u32 {
        self.write_attempts
    }

    pub fn is_open(&self) -> bool {
        self.opened && !self.closed
    }

    pub fn was_closed(&self) -> bool {
        self.closed
    }
}

impl Default for MockHal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShtpHal for MockHal {
    fn open(&mut self) -> Result<(), HalError> {
        if let Some(error) = self.open_error {
            return Err(error);
        }
        self.opened = true;
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn write(&mut self, frame: &[u8]) -> Result<WriteOutcome, HalError> {
        self.write_attempts += 1;
        if let Some(error) = self.write_error {
            return Err(error);
        }
        if self.busy_writes > 0 {
            self.busy_writes -= 1;
            return Ok(WriteOutcome::Busy);
        }
        let frame = Vec::from_slice(frame).expect("frame exceeds MAX_TRANSFER_OUT");
        self.outbound.push_back(frame).expect("mock outbound queue full");
        Ok(WriteOutcome::Accepted)
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<Option<(usize, u64)>, HalError> {
        if let Some(error) = self.read_error.take() {
            return Err(error);
        }
        match self.inbound.pop_front() {
            Some((transfer, timestamp_us)) => {
                let len = transfer.len().min(buffer.len());
                buffer[..len].copy_from_slice(&transfer[..len]);
                Ok(Some((len, timestamp_us)))
            }
            None => Ok(None),
        }
    }
}

/// Manually-advanced monotonic clock
pub struct MockClock {
    now_us: Cell<u64>,
}

impl MockClock {
    pub fn new() -> Self {
        Self { now_us: Cell::new(0) }
    }

    /// Move the clock forward
    pub fn advance_us(&self, us: u64) {
        self.now_us.set(self.now_us.get().wrapping_add(us));
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MockClock {
    fn now_us(&self) -> u64 {
        self.now_us.get()
    }
}
