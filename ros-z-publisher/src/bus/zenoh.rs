use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, trace, warn};
use zenoh::key_expr::KeyExpr;
use zenoh::{Session, Wait};

use super::{BusClient, BusError, encode_cdr};
use crate::clock::{Clock, SystemClock};
use crate::dynamic::{FieldType, MessageInstance};
use crate::qos::{QosDurability, QosProfile, QosReliability};

pub struct ZenohBusBuilder {
    domain_id: usize,
    config_file: Option<PathBuf>,
    config_overrides: Vec<(String, serde_json::Value)>,
}

impl Default for ZenohBusBuilder {
    fn default() -> Self {
        Self {
            domain_id: 0,
            config_file: None,
            config_overrides: Vec::new(),
        }
    }
}

impl ZenohBusBuilder {
    /// Set the ROS domain ID
    pub fn with_domain_id(mut self, domain_id: usize) -> Self {
        self.domain_id = domain_id;
        self
    }

    /// Load configuration from a JSON5 file
    pub fn with_config_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Add a JSON configuration override
    pub fn with_json<K: Into<String>>(mut self, key: K, value: serde_json::Value) -> Self {
        self.config_overrides.push((key.into(), value));
        self
    }

    /// Convenience method: disable multicast scouting
    pub fn disable_multicast_scouting(self) -> Self {
        self.with_json("scouting/multicast/enabled", json!(false))
    }

    /// Convenience method: connect to specific endpoints
    pub fn with_connect_endpoints<I, S>(self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let endpoints: Vec<String> = endpoints.into_iter().map(|s| s.into()).collect();
        self.with_json("connect/endpoints", json!(endpoints))
    }

    /// Convenience method: set mode (peer, client, router)
    pub fn with_mode<S: Into<String>>(self, mode: S) -> Self {
        self.with_json("mode", json!(mode.into()))
    }

    /// Apply overrides from `ROSZ_CONFIG_OVERRIDE`.
    ///
    /// Expected format: `key1=value1;key2=value2`, each value valid JSON.
    fn apply_env_overrides(mut self) -> Result<Self, BusError> {
        let Ok(overrides) = std::env::var("ROSZ_CONFIG_OVERRIDE") else {
            return Ok(self);
        };
        debug!("Applying config overrides from ROSZ_CONFIG_OVERRIDE: {}", overrides);

        for pair in overrides.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                BusError::Transport(format!(
                    "Invalid ROSZ_CONFIG_OVERRIDE entry '{}', expected 'key=value'",
                    pair
                ))
            })?;
            let value: serde_json::Value = serde_json::from_str(value.trim()).map_err(|e| {
                BusError::Transport(format!(
                    "Failed to parse ROSZ_CONFIG_OVERRIDE value for key '{}': {}",
                    key.trim(),
                    e
                ))
            })?;
            debug!("Override: {} = {}", key.trim(), value);
            self.config_overrides.push((key.trim().to_string(), value));
        }
        Ok(self)
    }

    /// Open the zenoh session.
    ///
    /// Configuration priority: explicit file, then `ROSZ_CONFIG_FILE`, then
    /// defaults. Overrides apply on top, environment first.
    pub fn build(mut self) -> Result<ZenohBus, BusError> {
        let mut config = if let Some(ref config_file) = self.config_file {
            zenoh::Config::from_file(config_file)?
        } else if let Ok(path) = std::env::var("ROSZ_CONFIG_FILE") {
            zenoh::Config::from_file(path)?
        } else {
            zenoh::Config::default()
        };

        self = self.apply_env_overrides()?;

        for (key, value) in &self.config_overrides {
            let value_str = value.to_string();
            config.insert_json5(key, &value_str).map_err(|e| {
                BusError::Transport(format!(
                    "Failed to apply config override '{}' = '{}': {}",
                    key, value_str, e
                ))
            })?;
        }

        let session = zenoh::open(config).wait()?;
        info!("Zenoh session open: domain={}", self.domain_id);

        Ok(ZenohBus {
            session: Arc::new(session),
            domain_id: self.domain_id,
            clock: Arc::new(SystemClock),
        })
    }
}

/// Publishes CDR-encoded instances over zenoh.
pub struct ZenohBus {
    session: Arc<Session>,
    domain_id: usize,
    clock: Arc<dyn Clock>,
}

pub struct ZenohChannel {
    inner: zenoh::pubsub::Publisher<'static>,
    topic: String,
}

impl ZenohChannel {
    pub fn key_expr(&self) -> &KeyExpr<'static> {
        self.inner.key_expr()
    }
}

impl ZenohBus {
    pub fn builder() -> ZenohBusBuilder {
        ZenohBusBuilder::default()
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn domain_id(&self) -> usize {
        self.domain_id
    }

    /// `<domain_id>/<topic>/<type>/<type_hash>`, the topic with '/' mangled to '%'.
    pub fn topic_key_expr(
        &self,
        topic: &str,
        message_type: &FieldType,
    ) -> Result<KeyExpr<'static>, BusError> {
        let topic = topic.strip_prefix('/').unwrap_or(topic);
        let topic = topic.strip_suffix('/').unwrap_or(topic);
        let key = format!(
            "{}/{}/{}/{}",
            self.domain_id,
            mangle_name(topic),
            mangle_name(&wire_type_name(message_type)),
            message_type.wire_hash()
        );
        Ok(KeyExpr::try_from(key)?)
    }
}

fn mangle_name(name: &str) -> String {
    name.replace('/', "%")
}

/// DDS-style name of a publishable type.
fn wire_type_name(field_type: &FieldType) -> String {
    match field_type {
        FieldType::Message(schema) => schema.dds_type_name(),
        FieldType::Array(inner, n) => format!("{}[{}]", wire_type_name(inner), n),
        FieldType::Sequence(inner) => format!("{}[]", wire_type_name(inner)),
        FieldType::BoundedSequence(inner, n) => format!("{}[<={}]", wire_type_name(inner), n),
        primitive => primitive.to_string(),
    }
}

impl BusClient for ZenohBus {
    type Channel = ZenohChannel;

    #[tracing::instrument(name = "channel_create", skip(self, message_type), fields(
        type_name = %message_type,
        qos_reliability = ?qos.reliability,
        qos_durability = ?qos.durability
    ))]
    fn create_channel(
        &self,
        message_type: &FieldType,
        topic: &str,
        qos: &QosProfile,
    ) -> Result<Self::Channel, BusError> {
        let key_expr = self.topic_key_expr(topic, message_type)?;
        debug!("[PUB] Key expression: {}", key_expr);

        let mut pub_builder = self.session.declare_publisher(key_expr);

        // Map reliability: Reliable uses Block, BestEffort uses Drop
        match qos.reliability {
            QosReliability::Reliable => {
                pub_builder = pub_builder.congestion_control(zenoh::qos::CongestionControl::Block);
            }
            QosReliability::BestEffort => {
                pub_builder = pub_builder.congestion_control(zenoh::qos::CongestionControl::Drop);
            }
        }

        // Map durability: TransientLocal uses express
        pub_builder = pub_builder.express(qos.durability == QosDurability::TransientLocal);

        let inner = pub_builder.wait()?;
        info!("[PUB] Channel ready: topic={}", topic);

        Ok(ZenohChannel {
            inner,
            topic: topic.to_string(),
        })
    }

    fn destroy_channel(&self, channel: Self::Channel) {
        let ZenohChannel { inner, topic } = channel;
        match inner.undeclare().wait() {
            Ok(()) => debug!("[PUB] Channel closed: topic={}", topic),
            Err(e) => warn!("[PUB] Failed to close channel for {}: {}", topic, e),
        }
    }

    fn send(&self, channel: &Self::Channel, message: &MessageInstance) -> Result<(), BusError> {
        let payload = encode_cdr(message)?;
        trace!("[PUB] {} bytes on {}", payload.len(), channel.topic);
        channel.inner.put(payload).wait()?;
        Ok(())
    }

    fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::{SchemaAccess, SchemaRegistry};

    #[test]
    fn test_wire_type_name() {
        let registry = SchemaRegistry::with_bundled();
        let point = registry.resolve_type("geometry_msgs/msg/Point").unwrap();
        assert_eq!(wire_type_name(&point), "geometry_msgs::msg::dds_::Point_");
        let arr = registry.resolve_type("geometry_msgs/msg/Point[2]").unwrap();
        assert_eq!(wire_type_name(&arr), "geometry_msgs::msg::dds_::Point_[2]");
        assert_eq!(wire_type_name(&FieldType::Float64), "float64");
    }

    #[test]
    fn test_mangle_name() {
        assert_eq!(mangle_name("ns/chatter"), "ns%chatter");
    }
}
