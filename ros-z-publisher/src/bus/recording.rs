use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::{BusClient, BusError};
use crate::clock::{Clock, SystemClock, Time};
use crate::dynamic::{FieldType, MessageInstance};
use crate::qos::QosProfile;

/// A sample captured by [`RecordingBus`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSample {
    pub channel: u64,
    pub topic: String,
    pub message: MessageInstance,
    pub stamp: Time,
}

#[derive(Debug)]
pub struct RecordingChannel {
    id: u64,
    topic: String,
}

impl RecordingChannel {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[derive(Default)]
struct RecordingState {
    next_id: u64,
    open: BTreeMap<u64, (String, String)>,
    samples: Vec<RecordedSample>,
    failing: bool,
}

/// An in-memory bus keeping every sent instance.
///
/// Clones share the same recording, so a handle kept by a test still sees
/// what a registry sends after the bus was moved into it.
#[derive(Clone)]
pub struct RecordingBus {
    state: Arc<Mutex<RecordingState>>,
    clock: Arc<dyn Clock>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(RecordingState::default())),
            clock,
        }
    }

    /// All samples sent so far, oldest first.
    pub fn samples(&self) -> Vec<RecordedSample> {
        self.state.lock().samples.clone()
    }

    /// Messages sent on `topic`, oldest first.
    pub fn messages_on(&self, topic: &str) -> Vec<MessageInstance> {
        self.state
            .lock()
            .samples
            .iter()
            .filter(|s| s.topic == topic)
            .map(|s| s.message.clone())
            .collect()
    }

    /// Open channels as `(topic, type)` pairs, in creation order.
    pub fn open_channels(&self) -> Vec<(String, String)> {
        self.state.lock().open.values().cloned().collect()
    }

    /// Make every following send fail with a transport error.
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }
}

impl Default for RecordingBus {
    fn default() -> Self {
        Self::new()
    }
}

impl BusClient for RecordingBus {
    type Channel = RecordingChannel;

    fn create_channel(
        &self,
        message_type: &FieldType,
        topic: &str,
        qos: &QosProfile,
    ) -> Result<Self::Channel, BusError> {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        state
            .open
            .insert(id, (topic.to_string(), message_type.to_string()));
        debug!("[REC] Channel {} open: topic={}, {}", id, topic, qos);
        Ok(RecordingChannel {
            id,
            topic: topic.to_string(),
        })
    }

    fn destroy_channel(&self, channel: Self::Channel) {
        self.state.lock().open.remove(&channel.id);
        debug!("[REC] Channel {} closed", channel.id);
    }

    fn send(&self, channel: &Self::Channel, message: &MessageInstance) -> Result<(), BusError> {
        let stamp = self.clock.now();
        let mut state = self.state.lock();
        if state.failing {
            return Err(BusError::Transport("recording bus set to fail".into()));
        }
        if !state.open.contains_key(&channel.id) {
            return Err(BusError::ChannelClosed(channel.topic.clone()));
        }
        state.samples.push(RecordedSample {
            channel: channel.id,
            topic: channel.topic.clone(),
            message: message.clone(),
            stamp,
        });
        Ok(())
    }

    fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }
}
