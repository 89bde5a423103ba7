//! Audit report export
//!
//! One-way JSON export of a full audit pass, schema 2.0. A report is a
//! reviewable artifact, not a backup format; there is no import path.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::audit::AuditState;
use crate::{BrowserSecurityAudit, InstallKind, RiskTier, TagEntry, UsageTag};

pub const SCHEMA_VERSION: &str = "2.0";

#[derive(Debug, Serialize)]
pub struct AuditReport {
    pub schema_version: &'static str,
    pub report_id: String,
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,
    pub extension_tags: BTreeMap<String, TagEntry>,
    pub extensions: Vec<ExtensionEntry>,
    /// Present only while settings access is granted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser: Option<BrowserSecurityAudit>,
}

#[derive(Debug, Default, Serialize)]
pub struct ReportSummary {
    pub total_extensions: usize,
    pub enabled_extensions: usize,
    pub high_risk: usize,
    pub medium_risk: usize,
    pub low_risk: usize,
    pub actively_used: usize,
    pub rarely_used: usize,
    pub can_remove: usize,
    pub untagged: usize,
}

#[derive(Debug, Serialize)]
pub struct ExtensionEntry {
    pub id: String,
    pub name: String,
    pub version: String,
    pub enabled: bool,
    pub install: InstallKind,
    pub risk_score: u8,
    pub risk_tier: RiskTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_tag: Option<UsageTag>,
    pub permissions: BTreeSet<String>,
    pub host_permissions: BTreeSet<String>,
}

/// Build a report from the current audit state.
pub fn build(state: &AuditState) -> AuditReport {
    let mut extensions = Vec::with_capacity(state.records.len());
    for record in &state.records {
        let Some(score) = state.scores.get(&record.id) else {
            continue;
        };
        extensions.push(ExtensionEntry {
            id: record.id.clone(),
            name: record.name.clone(),
            version: record.version.clone(),
            enabled: record.enabled,
            install: record.install,
            risk_score: score.score,
            risk_tier: score.tier,
            usage_tag: state.tags.get(&record.id).map(|t| t.tag),
            permissions: record.permissions.clone(),
            host_permissions: record.host_permissions.clone(),
        });
    }

    AuditReport {
        schema_version: SCHEMA_VERSION,
        report_id: Uuid::new_v4().to_string(),
        generated_at: Utc::now(),
        summary: summarize(&extensions),
        extension_tags: state.tags.clone(),
        extensions,
        browser: state.browser.granted.then(|| state.browser.clone()),
    }
}

fn summarize(extensions: &[ExtensionEntry]) -> ReportSummary {
    let mut summary = ReportSummary {
        total_extensions: extensions.len(),
        ..ReportSummary::default()
    };

    for entry in extensions {
        if entry.enabled {
            summary.enabled_extensions += 1;
        }
        match entry.risk_tier {
            RiskTier::High => summary.high_risk += 1,
            RiskTier::Medium => summary.medium_risk += 1,
            RiskTier::Low => summary.low_risk += 1,
        }
        match entry.usage_tag {
            Some(UsageTag::ActivelyUsed) => summary.actively_used += 1,
            Some(UsageTag::RarelyUsed) => summary.rarely_used += 1,
            Some(UsageTag::CanRemove) => summary.can_remove += 1,
            None => summary.untagged += 1,
        }
    }
    summary
}

/// Render a report as pretty JSON.
pub fn render(report: &AuditReport) -> anyhow::Result<String> {
    let json = serde_json::to_string_pretty(report)?;
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring;
    use crate::{EntryKind, ExtensionRecord, TagEntry};

    fn record(id: &str, enabled: bool, permissions: &[&str]) -> ExtensionRecord {
        ExtensionRecord {
            id: id.to_string(),
            name: format!("Extension {}", id),
            version: "2.1.0".to_string(),
            enabled,
            kind: EntryKind::Extension,
            install: InstallKind::Store,
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            host_permissions: BTreeSet::new(),
        }
    }

    fn state_with(records: Vec<ExtensionRecord>) -> AuditState {
        let mut state = AuditState::default();
        for record in &records {
            state
                .scores
                .insert(record.id.clone(), scoring::extension::score(record));
        }
        state.records = records;
        state
    }

    #[test]
    fn summary_counts_tiers_and_tags() {
        let mut state = state_with(vec![
            record("quiet", true, &[]),
            record("noisy", true, &["debugger", "nativeMessaging", "webRequest"]),
            record("dormant", false, &["tabs", "history"]),
        ]);
        state.tags.insert(
            "quiet".to_string(),
            TagEntry {
                tag: UsageTag::ActivelyUsed,
                tagged_at: Utc::now(),
            },
        );
        state.tags.insert(
            "noisy".to_string(),
            TagEntry {
                tag: UsageTag::CanRemove,
                tagged_at: Utc::now(),
            },
        );

        let report = build(&state);

        assert_eq!(report.summary.total_extensions, 3);
        assert_eq!(report.summary.enabled_extensions, 2);
        assert_eq!(report.summary.high_risk, 1);
        assert_eq!(report.summary.low_risk, 2);
        assert_eq!(report.summary.medium_risk, 0);
        assert_eq!(report.summary.actively_used, 1);
        assert_eq!(report.summary.can_remove, 1);
        assert_eq!(report.summary.rarely_used, 0);
        assert_eq!(report.summary.untagged, 1);
    }

    #[test]
    fn browser_section_requires_granted_access() {
        let state = state_with(Vec::new());
        let report = build(&state);
        assert!(report.browser.is_none());

        let mut granted = state_with(Vec::new());
        granted.browser.granted = true;
        granted.browser.score = 85;
        let report = build(&granted);
        assert_eq!(report.browser.as_ref().map(|b| b.score), Some(85));
    }

    #[test]
    fn report_ids_are_valid_uuids() {
        let report = build(&AuditState::default());
        assert_eq!(report.schema_version, "2.0");
        assert!(Uuid::parse_str(&report.report_id).is_ok());
    }

    #[test]
    fn rendered_json_has_the_schema_shape() {
        let mut state = state_with(vec![record("quiet", true, &["cookies"])]);
        state.tags.insert(
            "quiet".to_string(),
            TagEntry {
                tag: UsageTag::RarelyUsed,
                tagged_at: Utc::now(),
            },
        );

        let json = render(&build(&state)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["schema_version"], "2.0");
        assert_eq!(value["summary"]["total_extensions"], 1);
        assert_eq!(value["extensions"][0]["id"], "quiet");
        assert_eq!(value["extensions"][0]["risk_score"], 15);
        assert_eq!(value["extensions"][0]["usage_tag"], "rarely-used");
        assert_eq!(value["extension_tags"]["quiet"]["tag"], "rarely-used");
        assert!(value.get("browser").is_none());
    }
}
