use std::sync::Arc;

use ros_z_publisher::dynamic::SchemaRegistry;
use ros_z_publisher::{
    ManualClock, PublisherConfig, PublisherRegistry, RecordingBus, Time,
};

/// Registry over a recording bus with a clock fixed at `start_sec`.
#[allow(dead_code)]
pub fn recording_registry(start_sec: i32) -> (RecordingBus, PublisherRegistry<RecordingBus>) {
    let clock = ManualClock::new(Time {
        sec: start_sec,
        nanosec: 0,
    });
    let bus = RecordingBus::with_clock(clock);
    let registry = PublisherRegistry::new(
        bus.clone(),
        Arc::new(SchemaRegistry::with_bundled()),
        PublisherConfig::default(),
    )
    .expect("default config is valid");
    (bus, registry)
}

/// Values of a float64 field across every message sent on `topic`.
#[allow(dead_code)]
pub fn f64_field(bus: &RecordingBus, topic: &str, field: &str) -> Vec<f64> {
    bus.messages_on(topic)
        .iter()
        .map(|m| {
            m.value()
                .as_message()
                .expect("message instance")
                .get::<f64>(field)
                .expect("float64 field")
        })
        .collect()
}
