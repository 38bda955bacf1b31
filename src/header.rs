//! SHTP frame header
//!
//! Every transfer on the wire starts with a 4-byte header:
//!
//! ```text
//! ┌────────────────────────┬───────────┬────────────┐
//! │ Length (15 bits, LE)   │ Channel   │ Sequence   │
//! │ + continuation (bit 15)│ (1 byte)  │ (1 byte)   │
//! └────────────────────────┴───────────┴────────────┘
//! ```
//!
//! The length field counts the whole frame, header included. The high bit of
//! the 16-bit field is clear on the first fragment of a payload and set on
//! every continuation fragment.

/// Size of the SHTP frame header in bytes
pub const HEADER_LEN: usize = 4;

/// Continuation flag: bit 15 of the 16-bit length field
const CONTINUATION_BIT: u16 = 0x8000;

/// Decoded SHTP frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Total frame length including the header, in bytes
    pub length: u16,
    /// Clear on the first fragment of a payload, set on continuations
    pub continuation: bool,
    /// Destination channel id
    pub channel: u8,
    /// Per-channel sequence number
    pub sequence: u8,
}

impl FrameHeader {
    /// Decode a header from the first four bytes of a transfer
    pub fn parse(bytes: &[u8; HEADER_LEN]) -> Self {
        let raw = u16::from_le_bytes([bytes[0], bytes[1]]);
        Self {
            length: raw & !CONTINUATION_BIT,
            continuation: raw & CONTINUATION_BIT != 0,
            channel: bytes[2],
            sequence: bytes[3],
        }
    }

    /// Encode this header into its wire representation
    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        let mut raw = self.length & !CONTINUATION_BIT;
        if self.continuation {
            raw |= CONTINUATION_BIT;
        }
        let len = raw.to_le_bytes();
        [len[0], len[1], self.channel, self.sequence]
    }
}
