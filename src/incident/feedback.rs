//! Analyst feedback and the weight-bias learner.
//!
//! Feedback never rewrites past verdicts; it biases the weight table used
//! by future scans. The learner is deliberately conservative: a fixed small
//! delta per fired flag per feedback item, applied at most once per item.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::flags::{FlagCode, WeightTable};
use crate::models::Finding;

/// Analyst verdict on an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    /// The scan flagged a benign page
    FalsePositive,
    /// The scan caught a real phish
    ConfirmedPhish,
    /// The target was a sanctioned test page
    BenignTest,
    Other,
}

impl FeedbackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackType::FalsePositive => "false_positive",
            FeedbackType::ConfirmedPhish => "confirmed_phish",
            FeedbackType::BenignTest => "benign_test",
            FeedbackType::Other => "other",
        }
    }

    pub fn from_str_code(code: &str) -> Option<Self> {
        match code {
            "false_positive" => Some(FeedbackType::FalsePositive),
            "confirmed_phish" => Some(FeedbackType::ConfirmedPhish),
            "benign_test" => Some(FeedbackType::BenignTest),
            "other" => Some(FeedbackType::Other),
            _ => None,
        }
    }
}

/// One feedback submission, optionally tied to a stored incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserFeedback {
    pub id: String,
    /// Incident this feedback refers to, when the analyst knows it
    pub incident_id: Option<String>,
    /// URL the feedback is about
    pub url: String,
    pub feedback_type: FeedbackType,
    pub comment: Option<String>,
    pub user_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate feedback counts, surfaced for analyst dashboards.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeedbackStats {
    pub total: u64,
    pub false_positives: u64,
    pub confirmed_phish: u64,
    pub benign_test: u64,
    pub other: u64,
}

/// Per-flag weight delta applied per feedback item.
const FEEDBACK_BIAS_STEP: i16 = 5;

/// Strategy for turning feedback into weight adjustments. Pluggable so the
/// bias policy can change without touching the incident service.
pub trait LearningStrategy: Send + Sync {
    /// Applies one feedback item against the flags that fired in the
    /// incident it refers to. Must be idempotent per feedback id.
    fn apply(&mut self, feedback: &UserFeedback, findings: &[Finding], weights: &mut WeightTable);
}

/// Default learner: nudges each fired flag's weight down on a false
/// positive or benign test, up on a confirmed phish.
#[derive(Debug, Default)]
pub struct WeightBiasLearner {
    /// Net delta applied so far per flag, for inspection
    adjustments: HashMap<FlagCode, i16>,
    /// Feedback ids already applied
    applied: HashSet<String>,
}

impl WeightBiasLearner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Net adjustment recorded for a flag so far.
    pub fn adjustment(&self, flag: FlagCode) -> i16 {
        self.adjustments.get(&flag).copied().unwrap_or(0)
    }
}

impl LearningStrategy for WeightBiasLearner {
    fn apply(&mut self, feedback: &UserFeedback, findings: &[Finding], weights: &mut WeightTable) {
        if !self.applied.insert(feedback.id.clone()) {
            debug!("Feedback {} already applied, skipping", feedback.id);
            return;
        }

        let delta = match feedback.feedback_type {
            FeedbackType::FalsePositive | FeedbackType::BenignTest => -FEEDBACK_BIAS_STEP,
            FeedbackType::ConfirmedPhish => FEEDBACK_BIAS_STEP,
            FeedbackType::Other => return,
        };

        // Each distinct flag is nudged once even if it fired in several
        // findings of the same incident.
        let fired: HashSet<FlagCode> = findings
            .iter()
            .filter_map(|f| WeightTable::flag_by_code(&f.flag))
            .collect();

        for flag in fired {
            weights.adjust(flag, delta);
            *self.adjustments.entry(flag).or_insert(0) += delta;
            debug!(
                "Feedback {} biased {} by {delta} (now {})",
                feedback.id,
                flag.code(),
                weights.weight(flag)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ComponentKind;

    fn finding(flag: FlagCode) -> Finding {
        Finding {
            component: ComponentKind::ContentInspector,
            flag: flag.code().to_string(),
            description: flag.description().to_string(),
            risk_score: flag.default_weight(),
        }
    }

    fn feedback(id: &str, feedback_type: FeedbackType) -> UserFeedback {
        UserFeedback {
            id: id.to_string(),
            incident_id: Some("INC-1-ABCDEF".to_string()),
            url: "https://phish.example/".to_string(),
            feedback_type,
            comment: None,
            user_id: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_false_positive_lowers_fired_flags() {
        let mut learner = WeightBiasLearner::new();
        let mut weights = WeightTable::default();
        let findings = vec![finding(FlagCode::BrandImpersonation)];

        learner.apply(&feedback("fb-1", FeedbackType::FalsePositive), &findings, &mut weights);
        assert_eq!(weights.weight(FlagCode::BrandImpersonation), 25);
        assert_eq!(learner.adjustment(FlagCode::BrandImpersonation), -5);
    }

    #[test]
    fn test_confirmed_phish_raises_fired_flags() {
        let mut learner = WeightBiasLearner::new();
        let mut weights = WeightTable::default();
        let findings = vec![finding(FlagCode::SeedPhraseField)];

        learner.apply(&feedback("fb-1", FeedbackType::ConfirmedPhish), &findings, &mut weights);
        assert_eq!(weights.weight(FlagCode::SeedPhraseField), 55);
    }

    #[test]
    fn test_same_feedback_id_applied_once() {
        let mut learner = WeightBiasLearner::new();
        let mut weights = WeightTable::default();
        let findings = vec![finding(FlagCode::MissingHsts)];
        let fb = feedback("fb-1", FeedbackType::FalsePositive);

        learner.apply(&fb, &findings, &mut weights);
        learner.apply(&fb, &findings, &mut weights);
        assert_eq!(weights.weight(FlagCode::MissingHsts), 15);
    }

    #[test]
    fn test_duplicate_flag_in_findings_nudged_once() {
        let mut learner = WeightBiasLearner::new();
        let mut weights = WeightTable::default();
        let findings = vec![
            finding(FlagCode::PasswordField),
            finding(FlagCode::PasswordField),
        ];

        learner.apply(&feedback("fb-1", FeedbackType::FalsePositive), &findings, &mut weights);
        assert_eq!(weights.weight(FlagCode::PasswordField), 10);
    }

    #[test]
    fn test_other_feedback_is_a_no_op() {
        let mut learner = WeightBiasLearner::new();
        let mut weights = WeightTable::default();
        let findings = vec![finding(FlagCode::ObfuscatedScript)];

        learner.apply(&feedback("fb-1", FeedbackType::Other), &findings, &mut weights);
        assert_eq!(weights.weight(FlagCode::ObfuscatedScript), 25);
    }

    #[test]
    fn test_unknown_flag_codes_ignored() {
        let mut learner = WeightBiasLearner::new();
        let mut weights = WeightTable::default();
        let findings = vec![Finding {
            component: ComponentKind::ThreatIntel,
            flag: "known_phishing_host".to_string(),
            description: "feed report".to_string(),
            risk_score: 90,
        }];

        // Intel flags are feed-defined strings outside the weight table
        learner.apply(&feedback("fb-1", FeedbackType::ConfirmedPhish), &findings, &mut weights);
        assert!(learner.adjustments.is_empty());
    }

    #[test]
    fn test_feedback_type_round_trip() {
        for ft in [
            FeedbackType::FalsePositive,
            FeedbackType::ConfirmedPhish,
            FeedbackType::BenignTest,
            FeedbackType::Other,
        ] {
            assert_eq!(FeedbackType::from_str_code(ft.as_str()), Some(ft));
        }
        assert_eq!(FeedbackType::from_str_code("nonsense"), None);
    }
}
