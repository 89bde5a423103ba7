//! Fleet and combined posture scoring

use crate::ExtensionScore;

/// Fleet-wide extension security score: 100 minus the mean risk score,
/// rounded. An empty fleet is maximally safe, not unknown.
pub fn fleet_score(scores: &[ExtensionScore]) -> u8 {
    if scores.is_empty() {
        return 100;
    }
    let total: u32 = scores.iter().map(|s| s.score as u32).sum();
    let mean = total as f64 / scores.len() as f64;
    (100.0 - mean).round() as u8
}

/// Combined posture score.
///
/// The browser component joins as an unweighted 50/50 average only while
/// the settings permission is granted. When it is not, the fleet score
/// stands alone; folding in a zero would punish the fleet for a feature
/// the user never opted into.
pub fn combined_score(fleet: u8, browser: Option<u8>) -> u8 {
    match browser {
        Some(b) => ((fleet as f64 + b as f64) / 2.0).round() as u8,
        None => fleet,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RiskTier;

    fn scored(score: u8) -> ExtensionScore {
        ExtensionScore {
            score,
            tier: RiskTier::from_score(score),
            factors: vec![],
            capped: false,
        }
    }

    #[test]
    fn empty_fleet_is_maximally_safe() {
        assert_eq!(fleet_score(&[]), 100);
    }

    #[test]
    fn single_extension_fleet() {
        assert_eq!(fleet_score(&[scored(90)]), 10);
    }

    #[test]
    fn fleet_mean_rounds_to_nearest() {
        // mean 12.5 -> fleet 87.5 -> 88
        assert_eq!(fleet_score(&[scored(10), scored(15)]), 88);
        assert_eq!(fleet_score(&[scored(0), scored(0), scored(30)]), 90);
    }

    #[test]
    fn without_grant_fleet_stands_alone() {
        assert_eq!(combined_score(87, None), 87);
        assert_eq!(combined_score(0, None), 0);
    }

    #[test]
    fn with_grant_scores_average_evenly() {
        assert_eq!(combined_score(10, Some(100)), 55);
        assert_eq!(combined_score(100, Some(100)), 100);
        assert_eq!(combined_score(85, Some(90)), 88);
        assert_eq!(combined_score(0, Some(0)), 0);
    }
}
