use serde::{Deserialize, Serialize};

use crate::qos::QosProfile;

/// Node identity and defaults shared by every publisher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Node name private (`~`) topics expand under
    pub node_name: String,
    /// Namespace relative topics expand under
    pub namespace: String,
    /// QoS for every channel
    pub qos: QosProfile,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            node_name: "rqt_publisher".to_string(),
            namespace: "/".to_string(),
            qos: QosProfile::default(),
        }
    }
}

impl PublisherConfig {
    pub fn with_node_name(mut self, node_name: impl Into<String>) -> Self {
        self.node_name = node_name.into();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_qos(mut self, qos: QosProfile) -> Self {
        self.qos = qos;
        self
    }
}
