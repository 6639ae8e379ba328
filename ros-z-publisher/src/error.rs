use std::fmt;

use crate::bus::BusError;
use crate::dynamic::DynamicError;
use crate::publisher::PublisherId;
use crate::topic_name::TopicNameError;

/// Errors returned by publisher registry operations.
///
/// Expression failures never show up here: they are contained in the
/// filler and reported back as annotated text on edits.
#[derive(Debug)]
pub enum PublisherError {
    /// Topic name could not be validated or expanded
    InvalidTopicName(TopicNameError),

    /// A type descriptor did not resolve; `previous` is the type kept instead
    UnresolvableType {
        type_name: String,
        previous: Option<String>,
        source: DynamicError,
    },

    /// No publisher with this id
    UnknownId(PublisherId),

    /// `change` was called with a column name it does not know
    UnknownField(String),

    /// A field path does not address a node of the publisher's message
    InvalidField { path: String, source: DynamicError },

    /// The bus refused to open a channel or send
    Bus(BusError),

    /// The executor loop is gone
    Disconnected,
}

impl fmt::Display for PublisherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublisherError::InvalidTopicName(e) => write!(f, "{}", e),
            PublisherError::UnresolvableType {
                type_name,
                previous,
                source,
            } => {
                write!(f, "Could not resolve type '{}': {}", type_name, source)?;
                if let Some(previous) = previous {
                    write!(f, " (keeping '{}')", previous)?;
                }
                Ok(())
            }
            PublisherError::UnknownId(id) => write!(f, "No publisher with id {}", id),
            PublisherError::UnknownField(name) => write!(f, "Unknown publisher field '{}'", name),
            PublisherError::InvalidField { path, source } => {
                write!(f, "Invalid field path '{}': {}", path, source)
            }
            PublisherError::Bus(e) => write!(f, "{}", e),
            PublisherError::Disconnected => write!(f, "Publisher executor is not running"),
        }
    }
}

impl std::error::Error for PublisherError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PublisherError::InvalidTopicName(e) => Some(e),
            PublisherError::UnresolvableType { source, .. } => Some(source),
            PublisherError::InvalidField { source, .. } => Some(source),
            PublisherError::Bus(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TopicNameError> for PublisherError {
    fn from(e: TopicNameError) -> Self {
        PublisherError::InvalidTopicName(e)
    }
}

impl From<BusError> for PublisherError {
    fn from(e: BusError) -> Self {
        PublisherError::Bus(e)
    }
}
