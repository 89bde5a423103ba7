//! Browser security scoring

use std::collections::BTreeMap;

use crate::rules;
use crate::{ManualCheckState, SettingObservation, StatusTier};

/// Computed browser security score with per-tier counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BrowserScore {
    /// Final score in [0, 100]
    pub score: u8,
    /// Settings matching their secure outcome
    pub secure: u32,
    /// Settings in a warning state
    pub warning: u32,
    /// Settings in a risky state
    pub risky: u32,
}

/// Score the observed settings against the setting-risk table.
///
/// Without the read permission the score is a hard 0: missing visibility
/// is itself treated as worst case, not skipped. Observations whose read
/// failed are left out of the score and every counter; values the table
/// does not recognize contribute nothing and count nowhere.
pub fn score(granted: bool, observations: &BTreeMap<String, SettingObservation>) -> BrowserScore {
    score_with_checks(granted, observations, None)
}

/// Score with the manual checklist folded into the number.
///
/// The checklist stays out of the score unless explicitly opted in: a
/// verified check then counts secure at zero delta, an unverified one
/// contributes its table penalty and tier count.
pub fn score_with_checks(
    granted: bool,
    observations: &BTreeMap<String, SettingObservation>,
    manual_checks: Option<&BTreeMap<String, ManualCheckState>>,
) -> BrowserScore {
    if !granted {
        return BrowserScore::default();
    }

    let mut total: i32 = 0;
    let mut result = BrowserScore::default();

    for observation in observations.values() {
        if observation.is_error() {
            continue;
        }
        let Some(value) = &observation.value else {
            continue;
        };
        let Some(rule) = rules::setting_rule(&observation.setting) else {
            continue;
        };
        let Some(outcome) = rule.outcome_for(value) else {
            continue;
        };
        total += outcome.delta;
        bump(&mut result, outcome.tier);
    }

    if let Some(checks) = manual_checks {
        for check in rules::MANUAL_CHECKS {
            if checks.contains_key(check.id) {
                result.secure += 1;
            } else {
                total += check.penalty;
                bump(&mut result, check.tier);
            }
        }
    }

    result.score = (100 + total).clamp(0, 100) as u8;
    result
}

fn bump(result: &mut BrowserScore, tier: StatusTier) {
    match tier {
        StatusTier::Secure => result.secure += 1,
        StatusTier::Warning => result.warning += 1,
        StatusTier::Risky => result.risky += 1,
        StatusTier::Error => {}
    }
}

/// Display status of one observation, forced to error when its read
/// failed; None means the value is unrecognized by the table
pub fn observation_status(observation: &SettingObservation) -> Option<StatusTier> {
    if observation.is_error() {
        return Some(StatusTier::Error);
    }
    let value = observation.value.as_ref()?;
    let rule = rules::setting_rule(&observation.setting)?;
    rule.outcome_for(value).map(|o| o.tier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SettingValue;
    use chrono::Utc;

    fn obs(setting: &str, value: SettingValue) -> (String, SettingObservation) {
        (
            setting.to_string(),
            SettingObservation {
                setting: setting.to_string(),
                value: Some(value),
                controlled_by: None,
                error: None,
            },
        )
    }

    fn err_obs(setting: &str) -> (String, SettingObservation) {
        (
            setting.to_string(),
            SettingObservation {
                setting: setting.to_string(),
                value: None,
                controlled_by: None,
                error: Some("not exposed on this platform".to_string()),
            },
        )
    }

    #[test]
    fn not_granted_is_a_hard_zero() {
        // stale risky observations must not resurrect the score
        let observations = BTreeMap::from([obs(
            "services.safeBrowsingEnabled",
            SettingValue::Bool(false),
        )]);
        let result = score(false, &observations);
        assert_eq!(result.score, 0);
        assert_eq!((result.secure, result.warning, result.risky), (0, 0, 0));
    }

    #[test]
    fn granted_with_no_observations_scores_perfect() {
        let result = score(true, &BTreeMap::new());
        assert_eq!(result.score, 100);
    }

    #[test]
    fn deltas_accumulate_with_tier_counts() {
        let observations = BTreeMap::from([
            obs("services.safeBrowsingEnabled", SettingValue::Bool(false)),
            obs("websites.thirdPartyCookiesAllowed", SettingValue::Bool(true)),
            obs("network.networkPredictionEnabled", SettingValue::Bool(false)),
        ]);
        let result = score(true, &observations);
        // -20 risky, -10 warning, 0 secure
        assert_eq!(result.score, 70);
        assert_eq!(result.secure, 1);
        assert_eq!(result.warning, 1);
        assert_eq!(result.risky, 1);
    }

    #[test]
    fn failed_reads_are_excluded_everywhere() {
        let observations = BTreeMap::from([
            obs("services.safeBrowsingEnabled", SettingValue::Bool(true)),
            err_obs("network.webRTCIPHandlingPolicy"),
        ]);
        let result = score(true, &observations);
        assert_eq!(result.score, 100);
        assert_eq!(result.secure, 1);
        assert_eq!(result.warning, 0);
        assert_eq!(result.risky, 0);
    }

    #[test]
    fn unrecognized_values_count_nowhere() {
        let observations = BTreeMap::from([obs(
            "network.webRTCIPHandlingPolicy",
            SettingValue::Keyword("disable_all_udp".to_string()),
        )]);
        let result = score(true, &observations);
        assert_eq!(result.score, 100);
        assert_eq!((result.secure, result.warning, result.risky), (0, 0, 0));
    }

    #[test]
    fn unknown_setting_ids_are_ignored() {
        let observations = BTreeMap::from([obs(
            "services.telemetryEnabled",
            SettingValue::Bool(true),
        )]);
        let result = score(true, &observations);
        assert_eq!(result.score, 100);
    }

    #[test]
    fn checklist_stays_out_of_the_number_by_default() {
        let result = score(true, &BTreeMap::new());
        assert_eq!(result.score, 100);
        assert_eq!(result.risky, 0);
    }

    #[test]
    fn opted_in_checklist_penalizes_unverified_checks() {
        let mut checks = BTreeMap::new();
        for check in rules::MANUAL_CHECKS {
            checks.insert(
                check.id.to_string(),
                ManualCheckState {
                    verified_at: Utc::now(),
                },
            );
        }
        let all_verified = score_with_checks(true, &BTreeMap::new(), Some(&checks));
        assert_eq!(all_verified.score, 100);
        assert_eq!(all_verified.secure, rules::MANUAL_CHECKS.len() as u32);

        checks.remove("site-isolation");
        let one_unmet = score_with_checks(true, &BTreeMap::new(), Some(&checks));
        assert_eq!(one_unmet.score, 70);
        assert_eq!(one_unmet.risky, 1);
    }

    #[test]
    fn score_clamps_at_zero() {
        let observations = BTreeMap::from([
            obs("services.safeBrowsingEnabled", SettingValue::Bool(false)),
            obs("websites.thirdPartyCookiesAllowed", SettingValue::Bool(true)),
            obs(
                "network.webRTCIPHandlingPolicy",
                SettingValue::Keyword("default".to_string()),
            ),
        ]);
        // settings -40, unverified checklist -161
        let result = score_with_checks(true, &observations, Some(&BTreeMap::new()));
        assert_eq!(result.score, 0);
    }

    #[test]
    fn observation_status_mapping() {
        let (_, secure) = obs("services.safeBrowsingEnabled", SettingValue::Bool(true));
        assert_eq!(observation_status(&secure), Some(StatusTier::Secure));

        let (_, risky) = obs("services.safeBrowsingEnabled", SettingValue::Bool(false));
        assert_eq!(observation_status(&risky), Some(StatusTier::Risky));

        let (_, failed) = err_obs("services.safeBrowsingEnabled");
        assert_eq!(observation_status(&failed), Some(StatusTier::Error));

        let (_, unknown) = obs(
            "services.safeBrowsingEnabled",
            SettingValue::Keyword("standard".to_string()),
        );
        assert_eq!(observation_status(&unknown), None);
    }
}
