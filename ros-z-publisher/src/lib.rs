//! Expression-driven ROS 2 message publishing over zenoh.
//!
//! A [`PublisherRegistry`] keeps a set of publishers, each with a message
//! instance whose fields are recomputed from user expressions before every
//! send. [`PublisherExecutor`] runs the registry and its timers on one thread.

pub mod bus;
pub mod clock;
pub mod config;
pub mod dynamic;
pub mod error;
pub mod executor;
pub mod expression;
pub mod filler;
pub mod publisher;
pub mod qos;
pub mod settings;
pub mod topic_name;

pub use bus::{BusClient, BusError, RecordingBus, ZenohBus, ZenohBusBuilder};
pub use clock::{Clock, ManualClock, SystemClock, Time};
pub use config::PublisherConfig;
pub use error::PublisherError;
pub use executor::{PublisherClient, PublisherExecutor};
pub use expression::{EvalError, ExpressionEngine};
pub use filler::ExpressionMap;
pub use publisher::{
    ChangeField, PublisherDescriptor, PublisherId, PublisherRegistry, PublisherSummary,
};
pub use qos::QosProfile;
