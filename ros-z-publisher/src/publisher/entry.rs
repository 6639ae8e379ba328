use std::time::Instant;

use tracing::trace;

use super::descriptor::{PublisherDescriptor, PublisherSummary};
use super::timer::PublishTimer;
use super::PublisherId;
use crate::bus::{BusClient, BusError};
use crate::dynamic::MessageInstance;
use crate::expression::ExpressionEngine;
use crate::filler::{ExpressionMap, fill_instance};

/// One configured publisher.
///
/// `message` always instantiates its own field type. The timer exists exactly
/// while the entry is active.
pub struct PublisherEntry<C> {
    pub(crate) id: PublisherId,
    pub(crate) topic_name: String,
    pub(crate) type_name: String,
    pub(crate) rate: f64,
    pub(crate) enabled: bool,
    pub(crate) counter: u64,
    pub(crate) expressions: ExpressionMap,
    pub(crate) message: MessageInstance,
    pub(crate) channel: C,
    pub(crate) timer: Option<PublishTimer>,
}

impl<C> PublisherEntry<C> {
    pub fn id(&self) -> PublisherId {
        self.id
    }

    pub fn topic_name(&self) -> &str {
        &self.topic_name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    pub fn expressions(&self) -> &ExpressionMap {
        &self.expressions
    }

    pub fn message(&self) -> &MessageInstance {
        &self.message
    }

    pub fn timer(&self) -> Option<&PublishTimer> {
        self.timer.as_ref()
    }

    /// Enabled with a positive rate.
    pub fn is_active(&self) -> bool {
        self.enabled && self.rate > 0.0
    }

    /// Restart or stop the timer to match the enabled flag and rate.
    pub(crate) fn restart_timer(&mut self, now: Instant) {
        self.timer = if self.is_active() {
            PublishTimer::from_rate(self.rate, now)
        } else {
            None
        };
    }

    /// Set an expression, pruning it when empty.
    pub(crate) fn set_expression(&mut self, path: &str, expression: &str) {
        if expression.is_empty() {
            self.expressions.remove(path);
        } else {
            self.expressions
                .insert(path.to_string(), expression.to_string());
        }
    }

    /// Fill the message with the current counter, hand it to the bus, then
    /// advance the counter. The counter advances even when the send fails.
    pub(crate) fn publish_once<B>(&mut self, bus: &B, engine: &ExpressionEngine) -> Result<(), BusError>
    where
        B: BusClient<Channel = C>,
    {
        fill_instance(&mut self.message, &self.expressions, engine, self.counter);
        let sent = bus.send(&self.channel, &self.message);
        trace!(id = self.id, counter = self.counter, "Published on {}", self.topic_name);
        self.counter += 1;
        sent
    }

    pub fn summary(&self) -> PublisherSummary {
        PublisherSummary {
            id: self.id,
            topic_name: self.topic_name.clone(),
            type_name: self.type_name.clone(),
            rate: self.rate,
            enabled: self.enabled,
            active: self.is_active(),
            counter: self.counter,
            expressions: self.expressions.clone(),
        }
    }

    pub fn descriptor(&self) -> PublisherDescriptor {
        PublisherDescriptor {
            topic_name: self.topic_name.clone(),
            type_name: self.type_name.clone(),
            rate: self.rate,
            enabled: self.enabled,
            counter: self.counter,
            expressions: self.expressions.clone(),
        }
    }
}
