use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::descriptor::{PublisherDescriptor, PublisherSummary};
use super::entry::PublisherEntry;
use super::PublisherId;
use crate::bus::BusClient;
use crate::config::PublisherConfig;
use crate::dynamic::path::{canonical_path, is_strict_descendant};
use crate::dynamic::{MessageInstance, SchemaAccess};
use crate::error::PublisherError;
use crate::expression::ExpressionEngine;
use crate::filler::ExpressionMap;
use crate::topic_name::NameScope;

const ERROR_ANNOTATION: &str = "# error";

/// Editable column of a publisher, as named by front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(ascii_case_insensitive)]
pub enum ChangeField {
    /// The enable checkbox, shown in the topic column
    #[strum(to_string = "enabled", serialize = "topic")]
    Enabled,
    #[strum(serialize = "type")]
    Type,
    #[strum(serialize = "rate")]
    Rate,
    #[strum(serialize = "expression")]
    Expression,
}

fn canonical_field_path(path: &str) -> Result<String, PublisherError> {
    canonical_path(path).map_err(|source| PublisherError::InvalidField {
        path: path.to_string(),
        source,
    })
}

/// Every publisher of one front end, keyed by id.
///
/// Only the executor thread owns a registry, so no operation here blocks on
/// another.
pub struct PublisherRegistry<B: BusClient> {
    bus: B,
    schemas: Arc<dyn SchemaAccess>,
    engine: ExpressionEngine,
    config: PublisherConfig,
    scope: NameScope,
    entries: BTreeMap<PublisherId, PublisherEntry<B::Channel>>,
    next_id: PublisherId,
}

impl<B: BusClient> PublisherRegistry<B> {
    pub fn new(
        bus: B,
        schemas: Arc<dyn SchemaAccess>,
        config: PublisherConfig,
    ) -> Result<Self, PublisherError> {
        let scope = NameScope::new(&config.namespace, &config.node_name)?;
        let engine = ExpressionEngine::with_clock(bus.clock());
        Ok(Self {
            bus,
            schemas,
            engine,
            config,
            scope,
            entries: BTreeMap::new(),
            next_id: 0,
        })
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: PublisherId) -> Option<&PublisherEntry<B::Channel>> {
        self.entries.get(&id)
    }

    /// Create a publisher and open its channel.
    pub fn add(
        &mut self,
        topic: &str,
        type_name: &str,
        rate: f64,
        enabled: bool,
    ) -> Result<PublisherId, PublisherError> {
        let topic_name = self.scope.expand(topic)?;
        let type_name = type_name.trim();
        let field_type =
            self.schemas
                .resolve_type(type_name)
                .map_err(|source| PublisherError::UnresolvableType {
                    type_name: type_name.to_string(),
                    previous: None,
                    source,
                })?;
        let rate = if rate.is_finite() && rate >= 0.0 {
            rate
        } else {
            warn!("Invalid rate {} for {}, using 0", rate, topic_name);
            0.0
        };

        let channel = self
            .bus
            .create_channel(&field_type, &topic_name, &self.config.qos)?;

        let id = self.next_id;
        self.next_id += 1;

        let mut entry = PublisherEntry {
            id,
            topic_name,
            type_name: type_name.to_string(),
            rate,
            enabled,
            counter: 0,
            expressions: ExpressionMap::new(),
            message: MessageInstance::instantiate(field_type, self.schemas.as_ref()),
            channel,
            timer: None,
        };
        entry.restart_timer(Instant::now());
        info!(
            "Publisher {} created: topic={}, type={}, rate={}, enabled={}",
            id, entry.topic_name, entry.type_name, entry.rate, entry.enabled
        );
        self.entries.insert(id, entry);
        Ok(id)
    }

    /// Stop the timer, release the channel and drop the publisher.
    pub fn remove(&mut self, id: PublisherId) -> Result<(), PublisherError> {
        let mut entry = self.entries.remove(&id).ok_or_else(|| {
            debug!("Remove on unknown publisher {}", id);
            PublisherError::UnknownId(id)
        })?;
        entry.timer = None;
        let PublisherEntry {
            channel,
            topic_name,
            ..
        } = entry;
        self.bus.destroy_channel(channel);
        info!("Publisher {} removed: topic={}", id, topic_name);
        Ok(())
    }

    /// Edit one column of one node of a publisher.
    ///
    /// Returns the text the front end should display in place of what was
    /// typed, or `None` to keep it (or clear it, for a removed expression).
    pub fn change(
        &mut self,
        id: PublisherId,
        path: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<String>, PublisherError> {
        let field = ChangeField::from_str(field.trim())
            .map_err(|_| PublisherError::UnknownField(field.to_string()))?;
        if !self.entries.contains_key(&id) {
            debug!("Change of {} on unknown publisher {}", field, id);
            return Err(PublisherError::UnknownId(id));
        }
        match field {
            ChangeField::Enabled => Ok(Some(self.change_enabled(id, value))),
            ChangeField::Rate => Ok(Some(self.change_rate(id, value))),
            ChangeField::Type => {
                let path = canonical_field_path(path)?;
                self.change_type(id, &path, value).map(Some)
            }
            ChangeField::Expression => {
                let path = canonical_field_path(path)?;
                self.change_expression(id, &path, value)
            }
        }
    }

    fn entry_mut(&mut self, id: PublisherId) -> Result<&mut PublisherEntry<B::Channel>, PublisherError> {
        self.entries
            .get_mut(&id)
            .ok_or(PublisherError::UnknownId(id))
    }

    fn change_enabled(&mut self, id: PublisherId, value: &str) -> String {
        let enabled = matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes"
        );
        let Ok(entry) = self.entry_mut(id) else {
            return enabled.to_string();
        };
        entry.enabled = enabled;
        entry.restart_timer(Instant::now());
        debug!("Publisher {} enabled={}", id, enabled);
        enabled.to_string()
    }

    fn change_rate(&mut self, id: PublisherId, value: &str) -> String {
        let Ok(entry) = self.entry_mut(id) else {
            return String::new();
        };
        match value.trim().parse::<f64>() {
            Ok(rate) if rate.is_finite() && rate >= 0.0 => {
                entry.rate = rate;
                entry.restart_timer(Instant::now());
                debug!("Publisher {} rate={}Hz", id, rate);
            }
            _ => warn!("Could not parse rate value: {}", value),
        }
        format!("{:.2}", entry.rate)
    }

    fn change_type(
        &mut self,
        id: PublisherId,
        path: &str,
        value: &str,
    ) -> Result<String, PublisherError> {
        let Self {
            bus,
            schemas,
            config,
            entries,
            ..
        } = self;
        let entry = entries.get_mut(&id).ok_or(PublisherError::UnknownId(id))?;
        let type_name = value.trim();

        let new_type = match schemas.resolve_type(type_name) {
            Ok(new_type) => new_type,
            Err(source) => {
                let previous = if path.is_empty() {
                    Some(entry.type_name.clone())
                } else {
                    schemas
                        .field_type_and_arity(entry.message.field_type(), path)
                        .ok()
                        .map(|(ty, _)| ty.to_string())
                };
                warn!("Could not find type: {}", type_name);
                return Err(PublisherError::UnresolvableType {
                    type_name: type_name.to_string(),
                    previous,
                    source,
                });
            }
        };

        if path.is_empty() {
            let channel = bus.create_channel(&new_type, &entry.topic_name, &config.qos)?;
            let old = std::mem::replace(&mut entry.channel, channel);
            bus.destroy_channel(old);
            entry.message = MessageInstance::instantiate(new_type, schemas.as_ref());
            entry.type_name = type_name.to_string();
        } else {
            entry
                .message
                .retype(path, new_type)
                .map_err(|source| PublisherError::InvalidField {
                    path: path.to_string(),
                    source,
                })?;
        }

        let before = entry.expressions.len();
        entry
            .expressions
            .retain(|p, _| !is_strict_descendant(p, path));
        debug!(
            "Publisher {} retyped '{}' to {} ({} stale expressions dropped)",
            id,
            path,
            type_name,
            before - entry.expressions.len()
        );
        Ok(type_name.to_string())
    }

    fn change_expression(
        &mut self,
        id: PublisherId,
        path: &str,
        value: &str,
    ) -> Result<Option<String>, PublisherError> {
        let Self {
            schemas,
            engine,
            entries,
            ..
        } = self;
        let entry = entries.get_mut(&id).ok_or(PublisherError::UnknownId(id))?;

        // Only the space the echo puts before the annotation is dropped.
        let expression = match value.find(ERROR_ANNOTATION) {
            Some(pos) => {
                let kept = &value[..pos];
                kept.strip_suffix(' ').unwrap_or(kept)
            }
            None => value,
        };

        if expression.is_empty() {
            if entry.expressions.remove(path).is_some() {
                debug!("Publisher {} removed expression for '{}'", id, path);
            }
            return Ok(None);
        }

        let (node_type, is_sequence) = schemas
            .field_type_and_arity(entry.message.field_type(), path)
            .map_err(|source| PublisherError::InvalidField {
                path: path.to_string(),
                source,
            })?;

        match engine.evaluate(expression, &node_type, entry.counter) {
            Ok(_) => {
                entry.set_expression(path, expression);
                debug!(
                    "Publisher {} expression for '{}' ({}{}): {}",
                    id,
                    path,
                    node_type,
                    if is_sequence { ", sequence" } else { "" },
                    expression
                );
                Ok(Some(expression.to_string()))
            }
            Err(e) => Ok(Some(format!(
                "{} {} evaluating as \"{}\": {}",
                expression, ERROR_ANNOTATION, node_type, e
            ))),
        }
    }

    /// Summaries in id order.
    pub fn list(&self) -> Vec<PublisherSummary> {
        self.entries.values().map(|e| e.summary()).collect()
    }

    /// Remove every publisher.
    pub fn clear(&mut self) {
        let ids: Vec<PublisherId> = self.entries.keys().copied().collect();
        for id in ids {
            // ids come from the map itself
            let _ = self.remove(id);
        }
    }

    /// Descriptors in id order, all disabled.
    pub fn export(&self) -> Vec<PublisherDescriptor> {
        self.entries
            .values()
            .map(|e| PublisherDescriptor {
                enabled: false,
                ..e.descriptor()
            })
            .collect()
    }

    /// Replace all publishers with `descriptors`.
    ///
    /// Imported publishers start disabled with a zero counter. Rates and
    /// expressions are taken as stored. Descriptors that cannot be added are
    /// skipped.
    pub fn import(&mut self, descriptors: &[PublisherDescriptor]) -> Vec<PublisherId> {
        self.clear();
        let mut ids = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            match self.add(
                &descriptor.topic_name,
                &descriptor.type_name,
                descriptor.rate,
                false,
            ) {
                Ok(id) => {
                    if let Ok(entry) = self.entry_mut(id) {
                        entry.expressions = descriptor
                            .expressions
                            .iter()
                            .filter(|(_, e)| !e.is_empty())
                            .filter_map(|(p, e)| match canonical_path(p) {
                                Ok(path) => Some((path, e.clone())),
                                Err(err) => {
                                    warn!(
                                        "Skipping expression on {} for {}: {}",
                                        p, descriptor.topic_name, err
                                    );
                                    None
                                }
                            })
                            .collect();
                    }
                    ids.push(id);
                }
                Err(e) => warn!(
                    "Skipping publisher {} ({}): {}",
                    descriptor.topic_name, descriptor.type_name, e
                ),
            }
        }
        ids
    }

    /// Fill and send one message now.
    #[tracing::instrument(name = "publish_once", skip(self), fields(topic))]
    pub fn publish_once(&mut self, id: PublisherId) -> Result<(), PublisherError> {
        let Self {
            bus,
            engine,
            entries,
            ..
        } = self;
        let entry = entries.get_mut(&id).ok_or_else(|| {
            debug!("Publish on unknown publisher {}", id);
            PublisherError::UnknownId(id)
        })?;
        tracing::Span::current().record("topic", entry.topic_name.as_str());
        entry.publish_once(bus, engine).map_err(|e| {
            warn!("Publishing on {} failed: {}", entry.topic_name, e);
            PublisherError::Bus(e)
        })
    }

    /// Earliest pending timer deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries
            .values()
            .filter_map(|e| e.timer.as_ref())
            .map(|t| t.next_call_time())
            .min()
    }

    /// Publish every entry whose timer is due at `now`. Returns how many fired.
    pub fn fire_due(&mut self, now: Instant) -> usize {
        let due: Vec<PublisherId> = self
            .entries
            .values()
            .filter(|e| e.timer.as_ref().is_some_and(|t| t.is_ready(now)))
            .map(|e| e.id)
            .collect();
        for &id in &due {
            // Failures are logged by publish_once; the timer keeps running.
            let _ = self.publish_once(id);
            if let Some(timer) = self.entries.get_mut(&id).and_then(|e| e.timer.as_mut()) {
                timer.update(now);
            }
        }
        due.len()
    }
}

impl<B: BusClient> Drop for PublisherRegistry<B> {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::RecordingBus;
    use crate::dynamic::SchemaRegistry;

    fn registry() -> (RecordingBus, PublisherRegistry<RecordingBus>) {
        let bus = RecordingBus::new();
        let registry = PublisherRegistry::new(
            bus.clone(),
            Arc::new(SchemaRegistry::with_bundled()),
            PublisherConfig::default(),
        )
        .unwrap();
        (bus, registry)
    }

    fn x_of(bus: &RecordingBus, topic: &str) -> Vec<f64> {
        bus.messages_on(topic)
            .iter()
            .map(|m| m.value().as_message().unwrap().get::<f64>("x").unwrap())
            .collect()
    }

    #[test]
    fn test_change_field_names() {
        assert_eq!("topic".parse::<ChangeField>().unwrap(), ChangeField::Enabled);
        assert_eq!("enabled".parse::<ChangeField>().unwrap(), ChangeField::Enabled);
        assert_eq!("Expression".parse::<ChangeField>().unwrap(), ChangeField::Expression);
        assert!("value".parse::<ChangeField>().is_err());
        assert_eq!(ChangeField::Enabled.to_string(), "enabled");
    }

    #[test]
    fn test_add_expands_topic_and_opens_channel() {
        let (bus, mut reg) = registry();
        let id = reg.add("pos", "geometry_msgs/msg/Point", 0.0, false).unwrap();
        let entry = reg.get(id).unwrap();
        assert_eq!(entry.topic_name(), "/pos");
        assert_eq!(entry.counter(), 0);
        assert!(entry.timer().is_none());
        assert_eq!(
            bus.open_channels(),
            vec![("/pos".to_string(), "geometry_msgs/msg/Point".to_string())]
        );
    }

    #[test]
    fn test_add_unknown_type_creates_nothing() {
        let (bus, mut reg) = registry();
        let err = reg.add("/a", "nope_msgs/msg/Missing", 1.0, true).unwrap_err();
        assert!(matches!(err, PublisherError::UnresolvableType { .. }));
        assert!(reg.is_empty());
        assert!(bus.open_channels().is_empty());
    }

    #[test]
    fn test_add_invalid_topic() {
        let (_, mut reg) = registry();
        assert!(matches!(
            reg.add("/bad topic", "std_msgs/msg/Int32", 1.0, true),
            Err(PublisherError::InvalidTopicName(_))
        ));
    }

    #[test]
    fn test_ids_are_not_reused() {
        let (_, mut reg) = registry();
        let a = reg.add("/a", "std_msgs/msg/Int32", 0.0, false).unwrap();
        reg.remove(a).unwrap();
        let b = reg.add("/a", "std_msgs/msg/Int32", 0.0, false).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_remove_closes_channel() {
        let (bus, mut reg) = registry();
        let id = reg.add("/a", "std_msgs/msg/Int32", 10.0, true).unwrap();
        reg.remove(id).unwrap();
        assert!(bus.open_channels().is_empty());
        assert!(matches!(reg.remove(id), Err(PublisherError::UnknownId(_))));
        assert!(reg.next_deadline().is_none());
    }

    #[test]
    fn test_publish_once_counter_scenario() {
        let (bus, mut reg) = registry();
        let id = reg.add("/p", "geometry_msgs/msg/Point", 0.0, false).unwrap();
        assert_eq!(reg.change(id, "/x", "expression", "i*2").unwrap(), Some("i*2".into()));
        for _ in 0..3 {
            reg.publish_once(id).unwrap();
        }
        assert_eq!(x_of(&bus, "/p"), vec![0.0, 2.0, 4.0]);
        assert_eq!(reg.get(id).unwrap().counter(), 3);
    }

    #[test]
    fn test_expression_error_is_annotated() {
        let (_, mut reg) = registry();
        let id = reg.add("/p", "geometry_msgs/msg/Point", 0.0, false).unwrap();
        let echo = reg.change(id, "/x", "expression", "1/0").unwrap().unwrap();
        assert!(echo.starts_with("1/0 # error evaluating as \"float64\""), "{}", echo);
        assert!(reg.get(id).unwrap().expressions().is_empty());

        // Editing the echoed text again strips the old annotation
        let echo = reg
            .change(id, "/x", "expression", "i + 1 # error evaluating as \"float64\"")
            .unwrap();
        assert_eq!(echo, Some("i + 1".into()));
    }

    #[test]
    fn test_empty_expression_removes() {
        let (_, mut reg) = registry();
        let id = reg.add("/p", "geometry_msgs/msg/Point", 0.0, false).unwrap();
        reg.change(id, "/x", "expression", "3").unwrap();
        assert_eq!(reg.change(id, "/x", "expression", "").unwrap(), None);
        assert!(reg.get(id).unwrap().expressions().is_empty());
    }

    #[test]
    fn test_blank_expression_is_not_a_clear() {
        let (bus, mut reg) = registry();
        let id = reg.add("/s", "std_msgs/msg/String", 0.0, false).unwrap();
        assert_eq!(
            reg.change(id, "/data", "expression", "  padded  ").unwrap(),
            Some("  padded  ".into())
        );
        reg.publish_once(id).unwrap();
        let sent = bus.messages_on("/s");
        assert_eq!(
            sent[0].value().as_message().unwrap().get::<String>("data").unwrap(),
            "  padded  "
        );

        let point = reg.add("/p", "geometry_msgs/msg/Point", 0.0, false).unwrap();
        reg.change(point, "/x", "expression", "3").unwrap();
        let echo = reg.change(point, "/x", "expression", "   ").unwrap().unwrap();
        assert!(echo.contains(ERROR_ANNOTATION), "{}", echo);
        assert_eq!(
            reg.get(point).unwrap().expressions().get("/x").map(String::as_str),
            Some("3")
        );
    }

    #[test]
    fn test_paths_are_canonicalized() {
        let (bus, mut reg) = registry();
        let id = reg.add("/p", "geometry_msgs/msg/Point", 0.0, false).unwrap();
        assert_eq!(reg.change(id, "x", "expression", "i + 5").unwrap(), Some("i + 5".into()));
        assert_eq!(reg.get(id).unwrap().expressions().get("/x").map(String::as_str), Some("i + 5"));
        reg.publish_once(id).unwrap();
        assert_eq!(x_of(&bus, "/p"), vec![5.0]);

        // "/" is the root
        reg.change(id, "x", "expression", "").unwrap();
        reg.change(id, "/", "expression", "#{x: 3.0}").unwrap();
        assert!(reg.get(id).unwrap().expressions().contains_key(""));
        reg.publish_once(id).unwrap();
        assert_eq!(x_of(&bus, "/p"), vec![5.0, 3.0]);

        assert!(matches!(
            reg.change(id, "/a//b", "expression", "1"),
            Err(PublisherError::InvalidField { .. })
        ));
    }

    #[test]
    fn test_root_array_element_path() {
        let (bus, mut reg) = registry();
        let id = reg.add("/pts", "geometry_msgs/msg/Point[2]", 0.0, false).unwrap();
        reg.change(id, "/[0]/x", "expression", "7").unwrap();
        reg.change(id, "[1]/y", "expression", "i + 1").unwrap();
        reg.publish_once(id).unwrap();

        let sent = bus.messages_on("/pts");
        let items = sent[0].value().as_array().unwrap();
        assert_eq!(items[0].as_message().unwrap().get::<f64>("x").unwrap(), 7.0);
        assert_eq!(items[1].as_message().unwrap().get::<f64>("y").unwrap(), 1.0);
    }

    #[test]
    fn test_type_change_prunes_with_short_path() {
        let (_, mut reg) = registry();
        let id = reg.add("/p", "geometry_msgs/msg/Pose", 0.0, false).unwrap();
        reg.change(id, "/position/x", "expression", "1").unwrap();
        reg.change(id, "position", "type", "geometry_msgs/msg/Point").unwrap();
        assert!(reg.get(id).unwrap().expressions().is_empty());
    }

    #[test]
    fn test_import_canonicalizes_paths() {
        let (bus, mut reg) = registry();
        let ids = reg.import(&[PublisherDescriptor {
            topic_name: "/p".into(),
            type_name: "geometry_msgs/msg/Point".into(),
            rate: 0.0,
            enabled: false,
            counter: 0,
            expressions: [
                ("x".to_string(), "i * 3".to_string()),
                ("/a//b".to_string(), "1".to_string()),
            ]
            .into_iter()
            .collect(),
        }]);
        let entry = reg.get(ids[0]).unwrap();
        assert_eq!(entry.expressions().len(), 1);
        assert!(entry.expressions().contains_key("/x"));
        reg.publish_once(ids[0]).unwrap();
        reg.publish_once(ids[0]).unwrap();
        assert_eq!(x_of(&bus, "/p"), vec![0.0, 3.0]);
    }

    #[test]
    fn test_huge_fixed_array_is_rejected() {
        let (bus, mut reg) = registry();
        assert!(matches!(
            reg.add("/a", "float64[18446744073709551615]", 1.0, true),
            Err(PublisherError::UnresolvableType { .. })
        ));
        assert!(bus.open_channels().is_empty());
    }

    #[test]
    fn test_expression_on_unknown_path() {
        let (_, mut reg) = registry();
        let id = reg.add("/p", "geometry_msgs/msg/Point", 0.0, false).unwrap();
        assert!(matches!(
            reg.change(id, "/w", "expression", "1"),
            Err(PublisherError::InvalidField { .. })
        ));
    }

    #[test]
    fn test_rate_and_enabled_drive_timer() {
        let (_, mut reg) = registry();
        let id = reg.add("/p", "geometry_msgs/msg/Point", 0.0, true).unwrap();
        assert!(reg.next_deadline().is_none());

        assert_eq!(reg.change(id, "", "rate", "4").unwrap(), Some("4.00".into()));
        let timer = reg.get(id).unwrap().timer().unwrap();
        assert_eq!(timer.period(), std::time::Duration::from_millis(250));

        assert_eq!(reg.change(id, "", "topic", "0").unwrap(), Some("false".into()));
        assert!(reg.get(id).unwrap().timer().is_none());

        reg.change(id, "", "enabled", "yes").unwrap();
        assert!(reg.get(id).unwrap().timer().is_some());

        assert_eq!(reg.change(id, "", "rate", "0").unwrap(), Some("0.00".into()));
        assert!(reg.get(id).unwrap().timer().is_none());
    }

    #[test]
    fn test_unparsable_rate_keeps_previous() {
        let (_, mut reg) = registry();
        let id = reg.add("/p", "geometry_msgs/msg/Point", 2.5, false).unwrap();
        assert_eq!(reg.change(id, "", "rate", "fast").unwrap(), Some("2.50".into()));
        assert_eq!(reg.get(id).unwrap().rate(), 2.5);
    }

    #[test]
    fn test_unknown_field_and_id() {
        let (_, mut reg) = registry();
        let id = reg.add("/p", "geometry_msgs/msg/Point", 0.0, false).unwrap();
        assert!(matches!(
            reg.change(id, "", "colour", "red"),
            Err(PublisherError::UnknownField(_))
        ));
        assert!(matches!(
            reg.change(id + 1, "", "rate", "1"),
            Err(PublisherError::UnknownId(_))
        ));
    }

    #[test]
    fn test_root_type_change_recreates_channel() {
        let (bus, mut reg) = registry();
        let id = reg.add("/p", "geometry_msgs/msg/Point", 0.0, false).unwrap();
        reg.change(id, "/x", "expression", "1").unwrap();
        reg.change(id, "", "expression", "").unwrap();

        let echo = reg.change(id, "", "type", "std_msgs/msg/Int32").unwrap();
        assert_eq!(echo, Some("std_msgs/msg/Int32".into()));
        let entry = reg.get(id).unwrap();
        assert_eq!(entry.type_name(), "std_msgs/msg/Int32");
        assert!(entry.expressions().is_empty());
        assert_eq!(
            bus.open_channels(),
            vec![("/p".to_string(), "std_msgs/msg/Int32".to_string())]
        );
    }

    #[test]
    fn test_unresolvable_type_change_reports_previous() {
        let (_, mut reg) = registry();
        let id = reg.add("/p", "geometry_msgs/msg/Point", 0.0, false).unwrap();
        match reg.change(id, "", "type", "no/msg/Such") {
            Err(PublisherError::UnresolvableType { previous, .. }) => {
                assert_eq!(previous.as_deref(), Some("geometry_msgs/msg/Point"))
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(reg.get(id).unwrap().type_name(), "geometry_msgs/msg/Point");
    }

    #[test]
    fn test_send_failure_still_advances_counter() {
        let (bus, mut reg) = registry();
        let id = reg.add("/p", "geometry_msgs/msg/Point", 0.0, false).unwrap();
        bus.set_failing(true);
        assert!(matches!(reg.publish_once(id), Err(PublisherError::Bus(_))));
        assert_eq!(reg.get(id).unwrap().counter(), 1);
    }

    #[test]
    fn test_export_and_import() {
        let (bus, mut reg) = registry();
        let id = reg.add("/p", "geometry_msgs/msg/Point", 5.0, true).unwrap();
        reg.change(id, "/y", "expression", "i").unwrap();
        reg.publish_once(id).unwrap();

        let exported = reg.export();
        assert_eq!(exported.len(), 1);
        assert!(!exported[0].enabled);
        assert_eq!(exported[0].counter, 1);

        let mut with_bad = exported.clone();
        with_bad.push(PublisherDescriptor {
            topic_name: "/q".into(),
            type_name: "missing/msg/Type".into(),
            rate: 1.0,
            enabled: true,
            counter: 0,
            expressions: Default::default(),
        });
        let ids = reg.import(&with_bad);
        assert_eq!(ids.len(), 1);
        let entry = reg.get(ids[0]).unwrap();
        assert_eq!(entry.rate(), 5.0);
        assert_eq!(entry.counter(), 0);
        assert!(entry.timer().is_none());
        assert_eq!(entry.expressions().get("/y").map(String::as_str), Some("i"));
        assert_eq!(bus.open_channels().len(), 1);
    }

    #[test]
    fn test_fire_due() {
        let (bus, mut reg) = registry();
        let id = reg.add("/p", "geometry_msgs/msg/Point", 10.0, true).unwrap();
        reg.change(id, "/x", "expression", "i").unwrap();
        let deadline = reg.next_deadline().unwrap();
        assert_eq!(reg.fire_due(deadline - std::time::Duration::from_millis(1)), 0);
        assert_eq!(reg.fire_due(deadline), 1);
        assert!(reg.next_deadline().unwrap() > deadline);
        assert_eq!(x_of(&bus, "/p"), vec![0.0]);
    }
}
