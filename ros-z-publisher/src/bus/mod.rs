//! The publish side of a message bus.
//!
//! The registry only needs to open a channel per publisher, send filled
//! instances on it and release it again. [`ZenohBus`] does this over zenoh;
//! [`RecordingBus`] keeps everything in memory.

mod codec;
mod recording;
mod zenoh;

use std::fmt;
use std::sync::Arc;

pub use self::codec::encode_cdr;
pub use self::recording::{RecordedSample, RecordingBus, RecordingChannel};
pub use self::zenoh::{ZenohBus, ZenohBusBuilder, ZenohChannel};

use crate::clock::{Clock, Time};
use crate::dynamic::{FieldType, MessageInstance};
use crate::qos::QosProfile;

/// Errors reported by a bus adapter
#[derive(Debug)]
pub enum BusError {
    /// The message could not be encoded for the wire
    Encode(String),
    /// The transport rejected the operation
    Transport(String),
    /// The channel was already released
    ChannelClosed(String),
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::Encode(msg) => write!(f, "Failed to encode message: {}", msg),
            BusError::Transport(msg) => write!(f, "Transport error: {}", msg),
            BusError::ChannelClosed(topic) => write!(f, "Channel for '{}' is closed", topic),
        }
    }
}

impl std::error::Error for BusError {}

impl From<::zenoh::Error> for BusError {
    fn from(e: ::zenoh::Error) -> Self {
        BusError::Transport(e.to_string())
    }
}

/// A bus the publisher registry can emit onto.
pub trait BusClient {
    /// Handle to an open publishing channel.
    type Channel;

    /// Open a channel publishing `message_type` on the fully qualified `topic`.
    fn create_channel(
        &self,
        message_type: &FieldType,
        topic: &str,
        qos: &QosProfile,
    ) -> Result<Self::Channel, BusError>;

    /// Release a channel. Sending on it afterwards is impossible.
    fn destroy_channel(&self, channel: Self::Channel);

    /// Send one filled instance.
    fn send(&self, channel: &Self::Channel, message: &MessageInstance) -> Result<(), BusError>;

    /// Clock behind `now()` in expressions.
    fn clock(&self) -> Arc<dyn Clock>;

    fn current_time(&self) -> Time {
        self.clock().now()
    }
}
