// Copyright 2025 ZettaScale Technology
//
// Topic name validation and expansion for publisher entries

/// Errors from validating or expanding a topic name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicNameError {
    /// Topic name is empty
    Empty,
    /// Topic name contains an invalid component
    InvalidComponent { topic: String, component: String },
    /// `~` appears somewhere other than the first character
    MisplacedTilde(String),
    /// Namespace is invalid
    InvalidNamespace(String),
    /// Node name is invalid
    InvalidNodeName(String),
}

impl std::fmt::Display for TopicNameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Topic name is empty"),
            Self::InvalidComponent { topic, component } => {
                write!(f, "Topic name '{}' has invalid component '{}'", topic, component)
            }
            Self::MisplacedTilde(topic) => {
                write!(f, "Topic name '{}' may only start with '~'", topic)
            }
            Self::InvalidNamespace(s) => write!(f, "Invalid namespace: {}", s),
            Self::InvalidNodeName(s) => write!(f, "Invalid node name: {}", s),
        }
    }
}

impl std::error::Error for TopicNameError {}

/// A component must start with a letter or underscore and continue with
/// alphanumerics or underscores.
fn is_valid_component(component: &str) -> bool {
    let mut chars = component.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// The namespace and node name relative and private topics expand against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameScope {
    namespace: String,
    node_name: String,
}

impl NameScope {
    /// Validate and normalize a scope. `""` and `"/"` are the root namespace;
    /// a relative namespace gets a leading slash.
    pub fn new(namespace: &str, node_name: &str) -> Result<Self, TopicNameError> {
        if !is_valid_component(node_name) {
            return Err(TopicNameError::InvalidNodeName(node_name.to_string()));
        }

        let trimmed = namespace.strip_prefix('/').unwrap_or(namespace);
        let namespace = if trimmed.is_empty() {
            String::new()
        } else {
            if !trimmed.split('/').all(is_valid_component) {
                return Err(TopicNameError::InvalidNamespace(namespace.to_string()));
            }
            format!("/{}", trimmed)
        };

        Ok(Self {
            namespace,
            node_name: node_name.to_string(),
        })
    }

    /// Normalized namespace, `"/"` for the root.
    pub fn namespace(&self) -> &str {
        if self.namespace.is_empty() {
            "/"
        } else {
            &self.namespace
        }
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    /// Expand `topic` to a fully qualified name.
    ///
    /// - `/a/b` is absolute and kept
    /// - `a/b` is relative to the namespace
    /// - `~`, `~a` and `~/a` are private to the node
    ///
    /// A single trailing slash is dropped.
    pub fn expand(&self, topic: &str) -> Result<String, TopicNameError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(TopicNameError::Empty);
        }
        if topic.chars().skip(1).any(|c| c == '~') {
            return Err(TopicNameError::MisplacedTilde(topic.to_string()));
        }

        let (prefix, rest) = if let Some(rest) = topic.strip_prefix('/') {
            (String::new(), rest)
        } else if let Some(rest) = topic.strip_prefix('~') {
            (
                format!("{}/{}", self.namespace, self.node_name),
                rest.strip_prefix('/').unwrap_or(rest),
            )
        } else {
            (self.namespace.clone(), topic)
        };
        let rest = rest.strip_suffix('/').unwrap_or(rest);

        if rest.is_empty() {
            // Bare "~" names the node itself; a bare "/" names nothing.
            return if prefix.is_empty() {
                Err(TopicNameError::InvalidComponent {
                    topic: topic.to_string(),
                    component: String::new(),
                })
            } else {
                Ok(prefix)
            };
        }

        if let Some(bad) = rest.split('/').find(|c| !is_valid_component(c)) {
            return Err(TopicNameError::InvalidComponent {
                topic: topic.to_string(),
                component: bad.to_string(),
            });
        }
        Ok(format!("{}/{}", prefix, rest))
    }
}
