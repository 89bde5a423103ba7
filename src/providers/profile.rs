//! Profile snapshot source
//!
//! Reads an exported browser profile snapshot (a single JSON document
//! listing installed extensions and, optionally, privacy settings) and
//! serves it through both data-source traits. The file is re-read on
//! every call so a refreshed export is picked up without restarting.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::{ExtensionSource, SettingReadError, SettingReading, SettingsSource};
use crate::{ControlAuthority, ExtensionRecord, SettingValue};
use async_trait::async_trait;

/// Extension and settings source backed by a profile snapshot file
pub struct ProfileSnapshot {
    path: PathBuf,
}

impl ProfileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// SHA256 of the snapshot file, used to detect stale or changed exports
    pub fn digest(&self) -> Option<String> {
        let data = std::fs::read(&self.path).ok()?;
        let mut hasher = Sha256::new();
        hasher.update(&data);
        Some(format!("{:x}", hasher.finalize()))
    }

    fn load(&self) -> anyhow::Result<ProfileDocument> {
        let raw = std::fs::read_to_string(&self.path)?;
        let doc = serde_json::from_str(&raw)?;
        Ok(doc)
    }
}

#[async_trait]
impl ExtensionSource for ProfileSnapshot {
    fn name(&self) -> &'static str {
        "profile-snapshot"
    }

    async fn enumerate(&self) -> anyhow::Result<Vec<ExtensionRecord>> {
        let doc = self.load()?;
        let mut records = Vec::with_capacity(doc.extensions.len());
        for entry in doc.extensions {
            match serde_json::from_value::<ExtensionRecord>(entry) {
                Ok(record) => records.push(record),
                Err(e) => {
                    // One bad entry should not sink the whole enumeration
                    warn!("Skipping malformed extension entry: {}", e);
                }
            }
        }
        debug!("Enumerated {} entries from {:?}", records.len(), self.path);
        Ok(records)
    }

    fn is_available(&self) -> bool {
        self.path.exists()
    }
}

#[async_trait]
impl SettingsSource for ProfileSnapshot {
    async fn read(&self, setting: &str) -> Result<SettingReading, SettingReadError> {
        let doc = self
            .load()
            .map_err(|e| SettingReadError::Unavailable(setting.to_string(), e.to_string()))?;
        let raw = doc
            .settings
            .get(setting)
            .ok_or_else(|| SettingReadError::Unsupported(setting.to_string()))?;
        let entry: SettingEntry = serde_json::from_value(raw.clone())
            .map_err(|_| SettingReadError::Malformed(setting.to_string()))?;
        Ok(entry.into_reading())
    }
}

// ============================================
// Serde structures for the snapshot document
// ============================================

#[derive(Debug, Deserialize)]
struct ProfileDocument {
    #[serde(default)]
    extensions: Vec<serde_json::Value>,
    // Entries stay raw so one malformed setting fails alone
    #[serde(default)]
    settings: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SettingEntry {
    Annotated {
        value: SettingValue,
        #[serde(default)]
        controlled_by: Option<ControlAuthority>,
    },
    Bare(SettingValue),
}

impl SettingEntry {
    fn into_reading(self) -> SettingReading {
        match self {
            SettingEntry::Bare(value) => SettingReading {
                value,
                controlled_by: None,
            },
            SettingEntry::Annotated {
                value,
                controlled_by,
            } => SettingReading {
                value,
                controlled_by,
            },
        }
    }
}
