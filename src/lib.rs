//! Browser Sentry Library
//!
//! Core components for browser extension and privacy-setting auditing.

pub mod audit;
pub mod providers;
pub mod report;
pub mod rules;
pub mod scoring;
pub mod store;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors for operations keyed by user-supplied identifiers
#[derive(Debug, Error)]
pub enum SentryError {
    #[error("unknown usage tag '{0}' (expected actively-used, rarely-used or can-remove)")]
    UnknownTag(String),
    #[error("unknown manual check id '{0}' (run `check --list` for valid ids)")]
    UnknownCheck(String),
}

/// One installed extension as reported by the enumeration source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionRecord {
    /// Stable identifier assigned at install time
    pub id: String,
    /// Display name
    pub name: String,
    /// Version string
    pub version: String,
    /// Whether the extension is currently enabled
    pub enabled: bool,
    /// Entry kind (extensions are scored, apps and themes are filtered out)
    #[serde(default, rename = "type")]
    pub kind: EntryKind,
    /// How the extension got installed
    #[serde(default)]
    pub install: InstallKind,
    /// Granted API capability names
    #[serde(default)]
    pub permissions: BTreeSet<String>,
    /// Granted host-access patterns
    #[serde(default)]
    pub host_permissions: BTreeSet<String>,
}

/// Kind of entry in the enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    #[default]
    Extension,
    App,
    Theme,
    #[serde(other)]
    Unknown,
}

/// Install provenance of an extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InstallKind {
    /// Installed from the browser's store ("normal" in exported profiles)
    #[serde(alias = "normal")]
    Store,
    /// Loaded unpacked with developer mode
    Development,
    /// Sideloaded by third-party software
    Sideload,
    /// Forced by enterprise policy
    Admin,
    /// Anything the browser could not attribute
    #[default]
    #[serde(other)]
    Other,
}

impl InstallKind {
    /// Human label used in listings and exports
    pub fn label(&self) -> &'static str {
        match self {
            InstallKind::Store => "Browser store",
            InstallKind::Development => "Developer mode",
            InstallKind::Sideload => "Sideloaded",
            InstallKind::Admin => "Enterprise policy",
            InstallKind::Other => "Unknown source",
        }
    }
}

/// Risk tier of a single extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Tier for a final extension risk score
    pub fn from_score(score: u8) -> Self {
        if score > 50 {
            RiskTier::High
        } else if score > 20 {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskTier::Low => write!(f, "low"),
            RiskTier::Medium => write!(f, "medium"),
            RiskTier::High => write!(f, "high"),
        }
    }
}

/// Status tier of one setting or manual check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTier {
    /// Matches the recommended value
    Secure,
    /// Diverges in a low-impact way
    Warning,
    /// Diverges in a high-impact way
    Risky,
    /// Value could not be read
    Error,
}

/// Five-level tier for the combined posture score, mapped to a badge color
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostureTier {
    Critical,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl PostureTier {
    /// Tier for a combined posture score, inclusive on each band's lower bound
    pub fn from_score(score: u8) -> Self {
        match score {
            81..=100 => PostureTier::Excellent,
            61..=80 => PostureTier::Good,
            41..=60 => PostureTier::Fair,
            21..=40 => PostureTier::Poor,
            _ => PostureTier::Critical,
        }
    }

    /// Badge color for this tier
    pub fn color(&self) -> &'static str {
        match self {
            PostureTier::Excellent => "green",
            PostureTier::Good => "light-green",
            PostureTier::Fair => "yellow",
            PostureTier::Poor => "orange",
            PostureTier::Critical => "red",
        }
    }
}

impl std::fmt::Display for PostureTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostureTier::Critical => write!(f, "critical"),
            PostureTier::Poor => write!(f, "poor"),
            PostureTier::Fair => write!(f, "fair"),
            PostureTier::Good => write!(f, "good"),
            PostureTier::Excellent => write!(f, "excellent"),
        }
    }
}

/// Category of a risk factor in an extension's score breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorCategory {
    /// Host-access pattern class
    Host,
    /// One granted API capability
    Capability,
    /// Install provenance
    Provenance,
}

/// One contributing factor in an extension's score breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFactor {
    /// Factor category
    pub category: FactorCategory,
    /// Short human label
    pub label: String,
    /// Point weight added to the raw sum
    pub weight: i32,
    /// Tier of this individual factor
    pub tier: RiskTier,
    /// What this factor means for the user
    pub detail: String,
}

/// Computed risk score for one extension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionScore {
    /// Final score in [0, 100]
    pub score: u8,
    /// Tier derived from the final score
    pub tier: RiskTier,
    /// All contributing factors, retained even past the cap
    pub factors: Vec<RiskFactor>,
    /// Whether the raw factor sum exceeded 100
    pub capped: bool,
}

/// Observed value of one browser setting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Keyword(String),
}

impl std::fmt::Display for SettingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingValue::Bool(v) => write!(f, "{}", v),
            SettingValue::Keyword(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        SettingValue::Bool(v)
    }
}

impl From<&str> for SettingValue {
    fn from(v: &str) -> Self {
        SettingValue::Keyword(v.to_string())
    }
}

/// Who controls a setting's current value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAuthority {
    /// The user, through the browser UI
    User,
    /// An enterprise policy
    Policy,
    /// Another installed extension
    OtherExtension,
}

impl std::fmt::Display for ControlAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlAuthority::User => write!(f, "user"),
            ControlAuthority::Policy => write!(f, "policy"),
            ControlAuthority::OtherExtension => write!(f, "other extension"),
        }
    }
}

/// One read of one browser setting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingObservation {
    /// Setting identifier
    pub setting: String,
    /// Observed value, absent when the read failed
    pub value: Option<SettingValue>,
    /// Control authority, when the source reports one
    pub controlled_by: Option<ControlAuthority>,
    /// Why the read failed, when it did
    pub error: Option<String>,
}

impl SettingObservation {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Verification record for one manual check; absence from the map means
/// unverified, so a verified entry always carries its timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualCheckState {
    /// When the user marked the check verified
    pub verified_at: DateTime<Utc>,
}

/// Usage tag a user can assign to an extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UsageTag {
    ActivelyUsed,
    RarelyUsed,
    CanRemove,
}

impl std::fmt::Display for UsageTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UsageTag::ActivelyUsed => write!(f, "actively-used"),
            UsageTag::RarelyUsed => write!(f, "rarely-used"),
            UsageTag::CanRemove => write!(f, "can-remove"),
        }
    }
}

impl std::str::FromStr for UsageTag {
    type Err = SentryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "actively-used" => Ok(UsageTag::ActivelyUsed),
            "rarely-used" => Ok(UsageTag::RarelyUsed),
            "can-remove" => Ok(UsageTag::CanRemove),
            other => Err(SentryError::UnknownTag(other.to_string())),
        }
    }
}

/// One assigned usage tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagEntry {
    /// The assigned tag
    pub tag: UsageTag,
    /// When it was assigned
    pub tagged_at: DateTime<Utc>,
}

/// Persisted snapshot of the browser-settings audit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSecurityAudit {
    /// Whether the settings-read capability held at scan time
    pub granted: bool,
    /// Observations keyed by setting identifier
    pub observations: BTreeMap<String, SettingObservation>,
    /// Last computed security score
    pub score: u8,
    /// Count of settings matching their secure entry
    pub secure: u32,
    /// Count of settings in a warning state
    pub warning: u32,
    /// Count of settings in a risky state
    pub risky: u32,
    /// When the last scan completed
    pub last_checked: Option<DateTime<Utc>>,
}

impl Default for BrowserSecurityAudit {
    fn default() -> Self {
        Self {
            granted: false,
            observations: BTreeMap::new(),
            score: 0,
            secure: 0,
            warning: 0,
            risky: 0,
            last_checked: None,
        }
    }
}

/// Configuration for the sentry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path of the browser profile snapshot to audit
    pub profile_path: String,
    /// Path of the state database
    pub store_path: String,
    /// Path of the settings-read consent marker
    pub consent_path: String,
    /// Seconds between profile polls in watch mode
    pub scan_interval_secs: u64,
    /// Fold verified manual checks into the numeric browser score
    pub include_manual_checks: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile_path: "~/.browser-sentry/profile.json".to_string(),
            store_path: "~/.browser-sentry/browser-sentry.db".to_string(),
            consent_path: "~/.browser-sentry/settings-consent".to_string(),
            scan_interval_secs: 30,
            include_manual_checks: false,
        }
    }
}

impl Config {
    /// Load from a YAML file, or fall back to defaults when the file is absent
    pub fn load(path: Option<&std::path::Path>) -> anyhow::Result<Self> {
        let candidate = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path(),
        };
        if !candidate.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&candidate)?;
        let config = serde_yaml::from_str(&raw)?;
        Ok(config)
    }
}

/// Default config file location
pub fn default_config_path() -> std::path::PathBuf {
    dirs::config_dir()
        .unwrap_or_default()
        .join("browser-sentry")
        .join("config.yaml")
}

/// Expand a leading `~/` against the home directory
pub fn expand_home(path: &str) -> std::path::PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().unwrap_or_default().join(rest),
        None => std::path::PathBuf::from(path),
    }
}
