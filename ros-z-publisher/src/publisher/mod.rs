//! Publisher registry: one entry per configured topic, each with its own
//! message instance, expressions, counter and timer.

mod descriptor;
mod entry;
mod registry;
mod timer;

pub use self::descriptor::{PublisherDescriptor, PublisherSummary};
pub use self::entry::PublisherEntry;
pub use self::registry::{ChangeField, PublisherRegistry};
pub use self::timer::PublishTimer;

/// Registry-assigned publisher identifier, never reused within a registry.
pub type PublisherId = u64;
