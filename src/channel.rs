//! SHTP channels
//!
//! An endpoint multiplexes up to [`MAX_CHANNELS`] logical streams over one
//! transport. Channel 0 carries SHTP protocol control traffic; application
//! listeners may only be registered on channels 1 and up.
//!
//! The [`ShtpChannel`] enum names the conventional channel assignments used
//! by BNO08x-class sensor hubs. The endpoint itself does not interpret them;
//! they exist so driver code above the transport reads naturally.

/// Number of channels tracked per endpoint
pub const MAX_CHANNELS: usize = 8;

/// Cargo delivery callback: `(payload, timestamp_us)`
///
/// `timestamp_us` is the HAL timestamp of the first fragment of the payload.
/// Listeners are invoked synchronously from `service` and must not call
/// `send` on the same endpoint; queue outbound work instead.
pub type ChannelListener<'a> = dyn FnMut(&[u8], u64) + 'a;

/// Conventional BNO08x channel assignments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ShtpChannel {
    /// SHTP protocol control (channel 0, no application listeners)
    Command = 0,
    /// Executable control (reset, on, sleep)
    Executable = 1,
    /// Sensor hub control channel (commands and responses)
    Control = 2,
    /// Non-wake input reports
    InputReport = 3,
    /// Wake input reports
    WakeReport = 4,
    /// Gyro-integrated rotation vector
    GyroRotationVector = 5,
}

impl ShtpChannel {
    /// Convert from a raw channel id
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Command),
            1 => Some(Self::Executable),
            2 => Some(Self::Control),
            3 => Some(Self::InputReport),
            4 => Some(Self::WakeReport),
            5 => Some(Self::GyroRotationVector),
            _ => None,
        }
    }
}

impl From<ShtpChannel> for u8 {
    fn from(channel: ShtpChannel) -> Self {
        channel as u8
    }
}

/// Per-channel endpoint state
pub(crate) struct Channel<'a> {
    /// Sequence number of the next outbound fragment on this channel
    pub next_out_seq: u8,
    /// Expected sequence number of the next inbound fragment
    pub next_in_seq: u8,
    /// Cargo listener, if one is registered
    pub listener: Option<&'a mut ChannelListener<'a>>,
}

impl<'a> Channel<'a> {
    pub const fn new() -> Self {
        Self {
            next_out_seq: 0,
            next_in_seq: 0,
            listener: None,
        }
    }
}
