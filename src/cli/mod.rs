//! CLI command handlers

pub mod check;
pub mod report;
pub mod rules;
pub mod scan;
pub mod settings;
pub mod status;
pub mod tag;
pub mod watch;

use std::sync::Arc;

use tracing::warn;

use browser_sentry::audit::Auditor;
use browser_sentry::providers::consent::FileConsentGate;
use browser_sentry::providers::profile::ProfileSnapshot;
use browser_sentry::store::{self, SqliteStore};
use browser_sentry::{expand_home, Config, RiskTier, StatusTier};

/// Connected collaborators every command works through
pub struct CliContext {
    pub config: Config,
    pub profile: Arc<ProfileSnapshot>,
    pub gate: Arc<FileConsentGate>,
    pub store: Arc<SqliteStore>,
}

impl CliContext {
    pub fn connect(config: Config) -> anyhow::Result<Self> {
        let profile = Arc::new(ProfileSnapshot::new(expand_home(&config.profile_path)));
        let gate = Arc::new(FileConsentGate::new(expand_home(&config.consent_path)));
        let store = Arc::new(SqliteStore::open(&expand_home(&config.store_path))?);
        Ok(Self {
            config,
            profile,
            gate,
            store,
        })
    }

    /// Build an auditor over the connected collaborators with persisted
    /// state already loaded
    pub async fn auditor(&self) -> Auditor {
        let mut auditor = Auditor::new(
            self.profile.clone(),
            self.profile.clone(),
            self.gate.clone(),
            self.store.clone(),
            self.config.clone(),
        );
        auditor.hydrate().await;
        auditor
    }
}

/// Record which profile content a completed pass covered, so `status`
/// can tell when the profile moved on since
pub async fn record_digest(ctx: &CliContext) {
    if let Some(digest) = ctx.profile.digest() {
        if let Err(e) = store::save_profile_digest(ctx.store.as_ref(), &digest).await {
            warn!("Failed to record profile digest: {}", e);
        }
    }
}

/// Posture summary block shared by scan, status and watch output
pub fn print_posture(auditor: &Auditor) {
    let combined = auditor.combined_score();
    let tier = auditor.posture();
    let browser = &auditor.state().browser;

    println!("Posture: {}/100 - {} ({})", combined, tier, tier.color());
    println!("   Extension fleet: {}/100", auditor.fleet_score());
    if browser.granted {
        println!(
            "   Browser settings: {}/100 ({} secure, {} warnings, {} risky)",
            browser.score, browser.secure, browser.warning, browser.risky
        );
    } else {
        println!("   Browser settings: not audited - run 'browser-sentry settings enable'");
    }
}

/// Glyph for an extension risk tier
pub fn tier_glyph(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::High => "🔴",
        RiskTier::Medium => "🟡",
        RiskTier::Low => "🟢",
    }
}

/// Glyph for a setting or check status
pub fn status_glyph(status: StatusTier) -> &'static str {
    match status {
        StatusTier::Secure => "✅",
        StatusTier::Warning => "⚠️ ",
        StatusTier::Risky => "❌",
        StatusTier::Error => "❓",
    }
}
