//! Audit data sources
//!
//! The engine reads everything through these boundaries:
//! 1. Extension enumeration - the installed extension inventory
//! 2. Settings - named browser privacy/security settings, read one by one
//! 3. Consent - the authorization needed to read those settings
//!
//! The bundled implementations work off an exported browser profile
//! snapshot, so audits run without a live browser attached.

pub mod consent;
pub mod profile;

use async_trait::async_trait;
use thiserror::Error;

use crate::{ControlAuthority, ExtensionRecord, SettingValue};

/// Source of installed-extension records
#[async_trait]
pub trait ExtensionSource: Send + Sync {
    /// Name of the source
    fn name(&self) -> &'static str;

    /// Enumerate every installed entry. Apps and themes are included;
    /// filtering down to extensions is the engine's job, and the host
    /// tool's own entry is listed like any other.
    async fn enumerate(&self) -> anyhow::Result<Vec<ExtensionRecord>>;

    /// Check if the source is reachable
    fn is_available(&self) -> bool;
}

/// One successful setting read
#[derive(Debug, Clone)]
pub struct SettingReading {
    pub value: SettingValue,
    pub controlled_by: Option<ControlAuthority>,
}

/// Why one setting read failed. Reads are isolated per setting, so one
/// of these never blocks the remaining settings.
#[derive(Debug, Error)]
pub enum SettingReadError {
    /// The source does not expose this setting at all
    #[error("setting '{0}' is not exposed by this source")]
    Unsupported(String),
    /// The source exists but the read itself failed
    #[error("setting '{0}' could not be read: {1}")]
    Unavailable(String, String),
    /// The source returned something that is not a settings value
    #[error("setting '{0}' has a malformed value")]
    Malformed(String),
}

/// Source of browser privacy/security settings
#[async_trait]
pub trait SettingsSource: Send + Sync {
    /// Read one named setting
    async fn read(&self, setting: &str) -> Result<SettingReading, SettingReadError>;
}

/// Authorization gate for reading browser settings.
///
/// Grant state is re-derived from the platform on every query, never
/// cached: the capability can be revoked through paths outside this tool.
#[async_trait]
pub trait ConsentGate: Send + Sync {
    /// Whether the capability currently holds
    async fn is_granted(&self) -> anyhow::Result<bool>;

    /// Ask the user for the capability; suspends until they decide,
    /// with no timeout
    async fn request(&self) -> anyhow::Result<bool>;

    /// Give the capability up
    async fn revoke(&self) -> anyhow::Result<()>;
}
