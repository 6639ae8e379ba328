//! Saving and restoring publisher lists as JSON.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::publisher::PublisherDescriptor;

#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "Settings I/O error: {}", e),
            SettingsError::Json(e) => write!(f, "Invalid settings: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(e) => Some(e),
            SettingsError::Json(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::Io(e)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        SettingsError::Json(e)
    }
}

/// On-disk layout: `{"publishers": [...]}`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    publishers: Vec<PublisherDescriptor>,
}

pub fn to_json(descriptors: &[PublisherDescriptor]) -> Result<String, SettingsError> {
    let file = SettingsFile {
        publishers: descriptors.to_vec(),
    };
    Ok(serde_json::to_string_pretty(&file)?)
}

pub fn from_json(text: &str) -> Result<Vec<PublisherDescriptor>, SettingsError> {
    let file: SettingsFile = serde_json::from_str(text)?;
    Ok(file.publishers)
}

pub fn save(path: impl AsRef<Path>, descriptors: &[PublisherDescriptor]) -> Result<(), SettingsError> {
    let path = path.as_ref();
    fs::write(path, to_json(descriptors)?)?;
    info!("Saved {} publishers to {}", descriptors.len(), path.display());
    Ok(())
}

pub fn load(path: impl AsRef<Path>) -> Result<Vec<PublisherDescriptor>, SettingsError> {
    let path = path.as_ref();
    let descriptors = from_json(&fs::read_to_string(path)?)?;
    info!("Loaded {} publishers from {}", descriptors.len(), path.display());
    Ok(descriptors)
}
