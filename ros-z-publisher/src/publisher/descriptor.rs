use serde::{Deserialize, Serialize};

use super::PublisherId;
use crate::filler::ExpressionMap;

/// Persisted form of one publisher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublisherDescriptor {
    pub topic_name: String,
    pub type_name: String,
    pub rate: f64,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub counter: u64,
    #[serde(default)]
    pub expressions: ExpressionMap,
}

/// Snapshot of a live publisher for display.
#[derive(Debug, Clone, PartialEq)]
pub struct PublisherSummary {
    pub id: PublisherId,
    pub topic_name: String,
    pub type_name: String,
    pub rate: f64,
    pub enabled: bool,
    /// Whether the timer is running (`enabled` and a positive rate)
    pub active: bool,
    pub counter: u64,
    pub expressions: ExpressionMap,
}
