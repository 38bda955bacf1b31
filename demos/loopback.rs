//! SHTP Loopback Demo
//!
//! Host-side demonstration of the SHTP endpoint: two endpoints are wired
//! back-to-back through the mock HAL, one sends cargoes of various sizes,
//! the other reassembles and prints them.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example loopback
//! ```
//!
//! # Expected Output
//!
//! ```text
//! channel 2: 3 bytes at t=1000us
//! channel 3: 256 bytes at t=2000us
//! 3 fragments on the wire
//! stats: 0 short fragments, 0 interrupted payloads
//! ```

use std::cell::RefCell;

use shtp::hal::mock::MockHal;
use shtp::{Endpoint, ShtpChannel, ShtpEvent};

fn main() {
    let deliveries = RefCell::new(Vec::new());
    let mut on_control = |payload: &[u8], timestamp_us: u64| {
        deliveries
            .borrow_mut()
            .push((u8::from(ShtpChannel::Control), payload.len(), timestamp_us));
    };
    let mut on_report = |payload: &[u8], timestamp_us: u64| {
        deliveries
            .borrow_mut()
            .push((u8::from(ShtpChannel::InputReport), payload.len(), timestamp_us));
    };
    let mut on_event = |event: ShtpEvent| println!("event: {:?}", event);

    let mut sender = Endpoint::open(MockHal::new()).expect("open sender");
    let mut receiver = Endpoint::open(MockHal::new()).expect("open receiver");
    receiver
        .listen(ShtpChannel::Control.into(), &mut on_control)
        .expect("listen control");
    receiver
        .listen(ShtpChannel::InputReport.into(), &mut on_report)
        .expect("listen input report");
    receiver.set_event_listener(&mut on_event);

    // A short control exchange and a report large enough to fragment
    sender
        .send(ShtpChannel::Control.into(), &[0xF9, 0x00, 0x01])
        .expect("send control");
    let report: Vec<u8> = (0..=255).collect();
    sender
        .send(ShtpChannel::InputReport.into(), &report)
        .expect("send report");

    // Carry frames across the "wire"
    let mut timestamp_us = 1_000;
    let mut fragments = 0;
    while let Some(frame) = sender.hal_mut().take_write() {
        receiver.hal_mut().push_read(&frame, timestamp_us);
        receiver.service().expect("service");
        timestamp_us += 1_000;
        fragments += 1;
    }

    for (channel, len, timestamp) in deliveries.borrow().iter() {
        println!("channel {}: {} bytes at t={}us", channel, len, timestamp);
    }
    println!("{} fragments on the wire", fragments);

    let stats = receiver.stats();
    println!(
        "stats: {} short fragments, {} interrupted payloads",
        stats.rx_short_fragments, stats.rx_interrupted_payloads
    );
}
