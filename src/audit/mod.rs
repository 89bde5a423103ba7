//! Audit engine
//!
//! `Auditor` owns the data-source handles and the current audit state.
//! Scans are stateless recomputations: every pass re-enumerates, re-reads
//! and re-scores from scratch, then persists last-write-wins. Consent is
//! re-queried through the gate on every operation, never cached, so a
//! revocation done outside the tool takes effect on the next scan.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::providers::{ConsentGate, ExtensionSource, SettingsSource};
use crate::rules;
use crate::scoring;
use crate::store::{self, KvStore};
use crate::{
    BrowserSecurityAudit, Config, EntryKind, ExtensionRecord, ExtensionScore, ManualCheckState,
    PostureTier, SentryError, SettingObservation, TagEntry, UsageTag,
};

/// Where the settings side of the audit currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditPhase {
    /// No consent; no observations may exist
    Unauthorized,
    /// Consent present, no scan recorded yet
    AuthorizedUnscanned,
    /// Consent present and a scan has completed
    AuthorizedScanned,
}

/// Everything the auditor currently knows, held by value on the auditor
/// itself. There is no shared registry; two auditors never see each
/// other's state except through the store.
#[derive(Debug, Default)]
pub struct AuditState {
    /// Scoreable extensions from the latest enumeration
    pub records: Vec<ExtensionRecord>,
    /// Scores keyed by extension id
    pub scores: BTreeMap<String, ExtensionScore>,
    /// Latest browser-settings snapshot
    pub browser: BrowserSecurityAudit,
    /// Usage tags keyed by extension id
    pub tags: BTreeMap<String, TagEntry>,
    /// Verified manual checks keyed by check id
    pub checks: BTreeMap<String, ManualCheckState>,
}

pub struct Auditor {
    extensions: Arc<dyn ExtensionSource>,
    settings: Arc<dyn SettingsSource>,
    gate: Arc<dyn ConsentGate>,
    store: Arc<dyn KvStore>,
    config: Config,
    state: AuditState,
    tags_swept: bool,
}

impl Auditor {
    pub fn new(
        extensions: Arc<dyn ExtensionSource>,
        settings: Arc<dyn SettingsSource>,
        gate: Arc<dyn ConsentGate>,
        store: Arc<dyn KvStore>,
        config: Config,
    ) -> Self {
        Self {
            extensions,
            settings,
            gate,
            store,
            config,
            state: AuditState::default(),
            tags_swept: false,
        }
    }

    /// Load persisted tags, checks and the last snapshot. Unreadable or
    /// malformed state degrades to empty defaults, never an error.
    pub async fn hydrate(&mut self) {
        self.state.tags = store::load_tags(self.store.as_ref()).await;
        self.state.checks = store::load_manual_checks(self.store.as_ref()).await;
        self.state.browser = store::load_audit(self.store.as_ref()).await;
    }

    pub fn state(&self) -> &AuditState {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Full audit pass: extension inventory always, browser settings
    /// according to the current consent state.
    pub async fn scan(&mut self) -> anyhow::Result<()> {
        self.scan_extensions().await?;
        self.scan_browser().await?;
        Ok(())
    }

    /// Re-enumerate and re-score the extension inventory from scratch.
    /// Apps and themes are dropped; everything else is scored, including
    /// any entry belonging to this tool itself.
    pub async fn scan_extensions(&mut self) -> anyhow::Result<&[ExtensionRecord]> {
        let entries = self.extensions.enumerate().await?;
        let total = entries.len();

        let records: Vec<ExtensionRecord> = entries
            .into_iter()
            .filter(|r| r.kind == EntryKind::Extension)
            .collect();
        debug!(
            "Enumerated {} entries from '{}', {} scoreable",
            total,
            self.extensions.name(),
            records.len()
        );

        let mut scores = BTreeMap::new();
        for record in &records {
            scores.insert(record.id.clone(), scoring::extension::score(record));
        }

        self.state.records = records;
        self.state.scores = scores;

        // Tags for uninstalled extensions are reaped once per session so a
        // tag set right before the extension shows up in the inventory is
        // not lost to a rescan.
        if !self.tags_swept {
            self.sweep_orphaned_tags().await?;
            self.tags_swept = true;
        }

        Ok(&self.state.records)
    }

    async fn sweep_orphaned_tags(&mut self) -> anyhow::Result<()> {
        let before = self.state.tags.len();
        let scores = &self.state.scores;
        self.state.tags.retain(|id, _| scores.contains_key(id));

        let removed = before - self.state.tags.len();
        if removed > 0 {
            info!("🧹 Removed {} tags for uninstalled extensions", removed);
            store::save_tags(self.store.as_ref(), &self.state.tags).await?;
        }
        Ok(())
    }

    /// Re-read and re-score the browser settings. Without consent this
    /// clears the snapshot down to the unauthorized baseline; with it,
    /// every known setting is read independently and a failed read
    /// becomes an error observation rather than aborting the pass.
    pub async fn scan_browser(&mut self) -> anyhow::Result<&BrowserSecurityAudit> {
        let granted = self.gate.is_granted().await?;

        if !granted {
            if self.state.browser.granted {
                info!("Settings access revoked, clearing browser audit state");
            }
            self.state.browser = BrowserSecurityAudit::default();
            store::save_audit(self.store.as_ref(), &self.state.browser).await?;
            return Ok(&self.state.browser);
        }

        let mut observations = BTreeMap::new();
        for rule in rules::SETTING_RULES {
            let observation = match self.settings.read(rule.id).await {
                Ok(reading) => SettingObservation {
                    setting: rule.id.to_string(),
                    value: Some(reading.value),
                    controlled_by: reading.controlled_by,
                    error: None,
                },
                Err(err) => {
                    warn!("Unable to check setting {}: {}", rule.id, err);
                    SettingObservation {
                        setting: rule.id.to_string(),
                        value: None,
                        controlled_by: None,
                        error: Some(err.to_string()),
                    }
                }
            };
            observations.insert(rule.id.to_string(), observation);
        }

        let checks = self
            .config
            .include_manual_checks
            .then_some(&self.state.checks);
        let outcome = scoring::browser::score_with_checks(true, &observations, checks);

        self.state.browser = BrowserSecurityAudit {
            granted: true,
            observations,
            score: outcome.score,
            secure: outcome.secure,
            warning: outcome.warning,
            risky: outcome.risky,
            last_checked: Some(Utc::now()),
        };
        store::save_audit(self.store.as_ref(), &self.state.browser).await?;

        Ok(&self.state.browser)
    }

    /// Request settings access through the gate and record the opt-in
    /// preference. The request may block indefinitely on user interaction.
    /// Returns whether access ended up granted.
    pub async fn enable_browser_audit(&mut self) -> anyhow::Result<bool> {
        let granted = self.gate.request().await?;
        store::save_opt_in(self.store.as_ref(), granted).await?;
        if granted {
            info!("🔐 Browser settings audit enabled");
        } else {
            info!("Settings access declined");
        }
        Ok(granted)
    }

    /// Revoke settings access and clear the snapshot down to the
    /// unauthorized baseline.
    pub async fn disable_browser_audit(&mut self) -> anyhow::Result<()> {
        self.gate.revoke().await?;
        store::save_opt_in(self.store.as_ref(), false).await?;
        self.state.browser = BrowserSecurityAudit::default();
        store::save_audit(self.store.as_ref(), &self.state.browser).await?;
        info!("Browser settings audit disabled, snapshot cleared");
        Ok(())
    }

    /// Assign or clear the usage tag on an extension id. Assigning always
    /// stamps a fresh timestamp, even when the tag value is unchanged.
    pub async fn set_tag(&mut self, id: &str, tag: Option<UsageTag>) -> anyhow::Result<()> {
        match tag {
            Some(tag) => {
                self.state.tags.insert(
                    id.to_string(),
                    TagEntry {
                        tag,
                        tagged_at: Utc::now(),
                    },
                );
            }
            None => {
                self.state.tags.remove(id);
            }
        }
        store::save_tags(self.store.as_ref(), &self.state.tags).await
    }

    /// Mark a manual check verified or unverified. Verified state is the
    /// entry's presence, so unverifying deletes it outright.
    pub async fn set_check(&mut self, id: &str, verified: bool) -> anyhow::Result<()> {
        if rules::manual_check(id).is_none() {
            return Err(SentryError::UnknownCheck(id.to_string()).into());
        }

        if verified {
            self.state.checks.insert(
                id.to_string(),
                ManualCheckState {
                    verified_at: Utc::now(),
                },
            );
        } else {
            self.state.checks.remove(id);
        }
        store::save_manual_checks(self.store.as_ref(), &self.state.checks).await
    }

    /// Current phase of the settings audit, derived from a fresh gate
    /// query plus whether a scan has ever completed.
    pub async fn phase(&self) -> anyhow::Result<AuditPhase> {
        if !self.gate.is_granted().await? {
            return Ok(AuditPhase::Unauthorized);
        }
        if self.state.browser.last_checked.is_none() {
            return Ok(AuditPhase::AuthorizedUnscanned);
        }
        Ok(AuditPhase::AuthorizedScanned)
    }

    /// Fleet score over the current extension scores
    pub fn fleet_score(&self) -> u8 {
        let scores: Vec<ExtensionScore> = self.state.scores.values().cloned().collect();
        scoring::posture::fleet_score(&scores)
    }

    /// Combined posture score; the browser half only participates while
    /// the snapshot says access was granted
    pub fn combined_score(&self) -> u8 {
        let browser = self
            .state
            .browser
            .granted
            .then_some(self.state.browser.score);
        scoring::posture::combined_score(self.fleet_score(), browser)
    }

    pub fn posture(&self) -> PostureTier {
        PostureTier::from_score(self.combined_score())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{SettingReadError, SettingReading};
    use crate::store::MemoryStore;
    use crate::{InstallKind, SettingValue};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FixedExtensions(Vec<ExtensionRecord>);

    #[async_trait]
    impl ExtensionSource for FixedExtensions {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn enumerate(&self) -> anyhow::Result<Vec<ExtensionRecord>> {
            Ok(self.0.clone())
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    struct FixedSettings(BTreeMap<String, SettingValue>);

    #[async_trait]
    impl SettingsSource for FixedSettings {
        async fn read(&self, setting: &str) -> Result<SettingReading, SettingReadError> {
            match self.0.get(setting) {
                Some(value) => Ok(SettingReading {
                    value: value.clone(),
                    controlled_by: None,
                }),
                None => Err(SettingReadError::Unsupported(setting.to_string())),
            }
        }
    }

    struct FlagGate(AtomicBool);

    impl FlagGate {
        fn new(granted: bool) -> Self {
            Self(AtomicBool::new(granted))
        }
    }

    #[async_trait]
    impl ConsentGate for FlagGate {
        async fn is_granted(&self) -> anyhow::Result<bool> {
            Ok(self.0.load(Ordering::SeqCst))
        }

        async fn request(&self) -> anyhow::Result<bool> {
            self.0.store(true, Ordering::SeqCst);
            Ok(true)
        }

        async fn revoke(&self) -> anyhow::Result<()> {
            self.0.store(false, Ordering::SeqCst);
            Ok(())
        }
    }

    fn record(id: &str, kind: EntryKind, permissions: &[&str]) -> ExtensionRecord {
        ExtensionRecord {
            id: id.to_string(),
            name: format!("Extension {}", id),
            version: "1.0.0".to_string(),
            enabled: true,
            kind,
            install: InstallKind::Store,
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            host_permissions: Default::default(),
        }
    }

    fn secure_settings() -> BTreeMap<String, SettingValue> {
        let mut settings = BTreeMap::new();
        settings.insert(
            "network.webRTCIPHandlingPolicy".to_string(),
            SettingValue::from("default_public_interface_only"),
        );
        settings.insert(
            "network.networkPredictionEnabled".to_string(),
            SettingValue::from(false),
        );
        settings.insert(
            "services.safeBrowsingEnabled".to_string(),
            SettingValue::from(true),
        );
        settings.insert(
            "services.alternateErrorPagesEnabled".to_string(),
            SettingValue::from(false),
        );
        settings.insert(
            "websites.thirdPartyCookiesAllowed".to_string(),
            SettingValue::from(false),
        );
        settings.insert(
            "websites.hyperlinkAuditingEnabled".to_string(),
            SettingValue::from(false),
        );
        settings.insert(
            "websites.referrersEnabled".to_string(),
            SettingValue::from(false),
        );
        settings
    }

    fn auditor(
        records: Vec<ExtensionRecord>,
        settings: BTreeMap<String, SettingValue>,
        gate: Arc<FlagGate>,
        store: Arc<MemoryStore>,
    ) -> Auditor {
        Auditor::new(
            Arc::new(FixedExtensions(records)),
            Arc::new(FixedSettings(settings)),
            gate,
            store,
            Config::default(),
        )
    }

    #[tokio::test]
    async fn scan_scores_extensions_and_skips_apps_and_themes() {
        let mut auditor = auditor(
            vec![
                record("keeper", EntryKind::Extension, &["tabs"]),
                record("game", EntryKind::App, &["debugger"]),
                record("skin", EntryKind::Theme, &[]),
            ],
            BTreeMap::new(),
            Arc::new(FlagGate::new(false)),
            Arc::new(MemoryStore::new()),
        );

        auditor.scan_extensions().await.unwrap();

        let state = auditor.state();
        assert_eq!(state.records.len(), 1);
        assert_eq!(state.scores.len(), 1);
        assert_eq!(state.scores["keeper"].score, 5);
    }

    #[tokio::test]
    async fn orphaned_tags_are_swept_on_the_first_scan_only() {
        let store = Arc::new(MemoryStore::new());
        let mut seeded = BTreeMap::new();
        seeded.insert(
            "keeper".to_string(),
            TagEntry {
                tag: UsageTag::ActivelyUsed,
                tagged_at: Utc::now(),
            },
        );
        seeded.insert(
            "gone".to_string(),
            TagEntry {
                tag: UsageTag::CanRemove,
                tagged_at: Utc::now(),
            },
        );
        store::save_tags(store.as_ref(), &seeded).await.unwrap();

        let mut auditor = auditor(
            vec![record("keeper", EntryKind::Extension, &[])],
            BTreeMap::new(),
            Arc::new(FlagGate::new(false)),
            store.clone(),
        );
        auditor.hydrate().await;
        auditor.scan_extensions().await.unwrap();

        assert!(auditor.state().tags.contains_key("keeper"));
        assert!(!auditor.state().tags.contains_key("gone"));
        assert_eq!(store::load_tags(store.as_ref()).await.len(), 1);

        // A tag set mid-session for an id the inventory does not show yet
        // must survive later rescans
        auditor
            .set_tag("pending-install", Some(UsageTag::RarelyUsed))
            .await
            .unwrap();
        auditor.scan_extensions().await.unwrap();
        assert!(auditor.state().tags.contains_key("pending-install"));
    }

    #[tokio::test]
    async fn clearing_a_tag_deletes_the_entry_outright() {
        let store = Arc::new(MemoryStore::new());
        let mut auditor = auditor(
            vec![record("keeper", EntryKind::Extension, &[])],
            BTreeMap::new(),
            Arc::new(FlagGate::new(false)),
            store.clone(),
        );

        auditor
            .set_tag("keeper", Some(UsageTag::ActivelyUsed))
            .await
            .unwrap();
        assert!(auditor.state().tags.contains_key("keeper"));
        assert_eq!(store::load_tags(store.as_ref()).await.len(), 1);

        auditor.set_tag("keeper", None).await.unwrap();
        assert!(!auditor.state().tags.contains_key("keeper"));
        assert!(store::load_tags(store.as_ref()).await.is_empty());
    }

    #[tokio::test]
    async fn revocation_clears_the_snapshot_and_persists_the_cleared_state() {
        let store = Arc::new(MemoryStore::new());
        let gate = Arc::new(FlagGate::new(true));
        let mut auditor = auditor(Vec::new(), secure_settings(), gate.clone(), store.clone());

        auditor.scan_browser().await.unwrap();
        assert!(auditor.state().browser.granted);
        assert_eq!(auditor.state().browser.score, 100);
        assert!(auditor.state().browser.last_checked.is_some());

        gate.revoke().await.unwrap();
        auditor.scan_browser().await.unwrap();

        let browser = &auditor.state().browser;
        assert!(!browser.granted);
        assert_eq!(browser.score, 0);
        assert!(browser.observations.is_empty());
        assert!(browser.last_checked.is_none());

        let persisted = store::load_audit(store.as_ref()).await;
        assert!(!persisted.granted);
        assert!(persisted.observations.is_empty());
    }

    #[tokio::test]
    async fn unreadable_settings_become_error_observations() {
        let mut auditor = auditor(
            Vec::new(),
            BTreeMap::new(),
            Arc::new(FlagGate::new(true)),
            Arc::new(MemoryStore::new()),
        );

        auditor.scan_browser().await.unwrap();

        let browser = &auditor.state().browser;
        assert_eq!(browser.observations.len(), rules::SETTING_RULES.len());
        assert!(browser.observations.values().all(|o| o.is_error()));
        assert_eq!(browser.score, 100);
        assert_eq!(browser.secure, 0);
        assert_eq!(browser.warning, 0);
        assert_eq!(browser.risky, 0);
    }

    #[tokio::test]
    async fn unknown_check_ids_are_rejected() {
        let mut auditor = auditor(
            Vec::new(),
            BTreeMap::new(),
            Arc::new(FlagGate::new(false)),
            Arc::new(MemoryStore::new()),
        );

        let err = auditor
            .set_check("definitely-not-a-check", true)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SentryError>(),
            Some(SentryError::UnknownCheck(_))
        ));
    }

    #[tokio::test]
    async fn checklist_penalties_require_the_config_toggle() {
        let store = Arc::new(MemoryStore::new());
        let gate = Arc::new(FlagGate::new(true));
        let mut auditor = auditor(Vec::new(), secure_settings(), gate.clone(), store.clone());

        // Default config keeps the checklist out of the number entirely
        auditor.scan_browser().await.unwrap();
        assert_eq!(auditor.state().browser.score, 100);

        let config = Config {
            include_manual_checks: true,
            ..Config::default()
        };
        let mut opted_in = Auditor::new(
            Arc::new(FixedExtensions(Vec::new())),
            Arc::new(FixedSettings(secure_settings())),
            gate,
            store,
            config,
        );

        // Nothing verified: every checklist penalty lands at once
        opted_in.scan_browser().await.unwrap();
        assert_eq!(opted_in.state().browser.score, 0);
        assert!(opted_in.state().browser.risky > 0);

        // Verifying everything restores the full score
        for check in rules::MANUAL_CHECKS {
            opted_in.set_check(check.id, true).await.unwrap();
        }
        opted_in.scan_browser().await.unwrap();
        assert_eq!(opted_in.state().browser.score, 100);
        assert_eq!(
            opted_in.state().browser.secure,
            7 + rules::MANUAL_CHECKS.len() as u32
        );
    }

    #[tokio::test]
    async fn phase_follows_consent_and_scan_state() {
        let gate = Arc::new(FlagGate::new(false));
        let mut auditor = auditor(
            Vec::new(),
            secure_settings(),
            gate.clone(),
            Arc::new(MemoryStore::new()),
        );

        assert_eq!(auditor.phase().await.unwrap(), AuditPhase::Unauthorized);

        gate.request().await.unwrap();
        assert_eq!(
            auditor.phase().await.unwrap(),
            AuditPhase::AuthorizedUnscanned
        );

        auditor.scan_browser().await.unwrap();
        assert_eq!(
            auditor.phase().await.unwrap(),
            AuditPhase::AuthorizedScanned
        );
    }

    #[tokio::test]
    async fn posture_combines_fleet_and_browser_only_when_granted() {
        let risky = ExtensionRecord {
            id: "risky".to_string(),
            name: "Risky".to_string(),
            version: "1.0".to_string(),
            enabled: true,
            kind: EntryKind::Extension,
            install: InstallKind::Sideload,
            permissions: ["debugger", "cookies"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
            host_permissions: ["<all_urls>"].iter().map(|p| p.to_string()).collect(),
        };

        let gate = Arc::new(FlagGate::new(false));
        let mut auditor = auditor(
            vec![risky],
            secure_settings(),
            gate.clone(),
            Arc::new(MemoryStore::new()),
        );

        auditor.scan().await.unwrap();
        assert_eq!(auditor.fleet_score(), 10);
        assert_eq!(auditor.combined_score(), 10);
        assert_eq!(auditor.posture(), PostureTier::Critical);

        gate.request().await.unwrap();
        auditor.scan().await.unwrap();
        assert_eq!(auditor.state().browser.score, 100);
        assert_eq!(auditor.combined_score(), 55);
        assert_eq!(auditor.posture(), PostureTier::Fair);
    }
}
