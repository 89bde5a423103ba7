//! Extension risk scoring

use crate::rules;
use crate::{ExtensionRecord, ExtensionScore, FactorCategory, RiskFactor, RiskTier};

/// Score one extension from its declared metadata.
///
/// Factors accumulate in a fixed order: at most one host-access factor,
/// one factor per table-listed capability, then at most one non-zero
/// provenance factor. The final score is capped at 100; the breakdown
/// keeps every factor so the full sum stays visible past the cap.
pub fn score(record: &ExtensionRecord) -> ExtensionScore {
    let mut factors: Vec<RiskFactor> = Vec::new();

    if let Some(factor) = rules::classify_host_access(&record.host_permissions) {
        factors.push(factor);
    }

    // Capabilities are independent and additive, no first-match-wins here
    for permission in &record.permissions {
        if let Some(rule) = rules::capability_rule(permission) {
            factors.push(RiskFactor {
                category: FactorCategory::Capability,
                label: rule.name.to_string(),
                weight: rule.weight,
                tier: rule.tier,
                detail: rule.description.to_string(),
            });
        }
    }

    // Zero-weight provenance (store installs) stays out of the breakdown
    if let Some(rule) = rules::provenance_rule(record.install) {
        if rule.weight > 0 {
            factors.push(RiskFactor {
                category: FactorCategory::Provenance,
                label: record.install.label().to_string(),
                weight: rule.weight,
                tier: rule.tier,
                detail: rule.description.to_string(),
            });
        }
    }

    let raw: i32 = factors.iter().map(|f| f.weight).sum();
    let score = raw.min(100) as u8;

    ExtensionScore {
        score,
        tier: RiskTier::from_score(score),
        factors,
        capped: raw > 100,
    }
}
