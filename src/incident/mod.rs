//! Incident reporting and analyst feedback.
//!
//! A scan whose verdict crosses the reporting threshold becomes an
//! incident: a structured, SIEM-ready record with a stable id, category,
//! and recommendation. Feedback on incidents is fed to a learning strategy
//! that biases flag weights for future scans.

pub mod feedback;
pub mod store;

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error_handling::ScanError;
use crate::flags::WeightTable;
use crate::models::{AnalysisBundle, Finding};
use crate::scoring::{RiskScoreResult, Severity};

pub use feedback::{
    FeedbackStats, FeedbackType, LearningStrategy, UserFeedback, WeightBiasLearner,
};
pub use store::IncidentStore;

/// Threat category assigned to an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Phishing,
    Malware,
    BrandImpersonation,
    CredentialTheft,
    Unknown,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Phishing => "phishing",
            Category::Malware => "malware",
            Category::BrandImpersonation => "brand_impersonation",
            Category::CredentialTheft => "credential_theft",
            Category::Unknown => "unknown",
        }
    }
}

/// Assigns the highest-priority category whose indicators appear in the
/// findings. Phishing outranks malware outranks impersonation outranks
/// plain credential collection.
pub fn categorize(findings: &[Finding]) -> Category {
    let has = |needle: &str| findings.iter().any(|f| f.flag.contains(needle));

    if has("phish") || has("credential_capture_page") {
        return Category::Phishing;
    }
    if has("malware") || has("clipboard_hijack_script") || has("obfuscated_script") {
        return Category::Malware;
    }
    if has("brand_impersonation") {
        return Category::BrandImpersonation;
    }
    if has("password_field")
        || has("seed_phrase_field")
        || has("card_number_field")
        || has("cross_domain_form_action")
    {
        return Category::CredentialTheft;
    }
    Category::Unknown
}

/// Analyst-facing recommendation for a severity band.
pub fn recommendation(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "Block the URL and alert affected users immediately",
        Severity::High => "Block the URL pending analyst review",
        Severity::Medium => "Warn users and monitor for repeat reports",
        Severity::Low => "No action required; archive for reference",
    }
}

/// SIEM-ready incident record for one scan verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentReport {
    /// Stable id of the form `INC-<epoch millis>-<suffix>`
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub url: String,
    pub severity: Severity,
    pub category: Category,
    pub findings: Vec<Finding>,
    pub overall_risk_score: u8,
    pub recommendation: String,
    /// Scan context: final URL, explanation, inconclusive checks
    pub metadata: serde_json::Value,
    /// Always true; the report serializes to flat JSON for SIEM ingestion
    pub siem_ready: bool,
}

fn id_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect()
}

fn new_incident_id() -> String {
    format!("INC-{}-{}", Utc::now().timestamp_millis(), id_suffix())
}

fn new_feedback_id() -> String {
    format!("FB-{}-{}", Utc::now().timestamp_millis(), id_suffix())
}

/// Builds an incident report from a scored bundle. Pure apart from the id
/// and timestamp.
pub fn build_incident_report(
    bundle: &AnalysisBundle,
    verdict: &RiskScoreResult,
    weights: &WeightTable,
) -> IncidentReport {
    let findings = bundle.findings(weights);
    let category = categorize(&findings);

    IncidentReport {
        id: new_incident_id(),
        timestamp: Utc::now(),
        url: bundle.url.clone(),
        severity: verdict.severity,
        category,
        findings,
        overall_risk_score: verdict.overall_risk_score,
        recommendation: recommendation(verdict.severity).to_string(),
        metadata: serde_json::json!({
            "final_url": bundle.final_url,
            "explanation": verdict.explanation,
            "inconclusive_checks": bundle.inconclusive_checks(),
        }),
        siem_ready: true,
    }
}

/// Incident generation, persistence, and feedback intake.
///
/// The store is optional; without one, reports are still generated and
/// feedback still biases weights, only persistence is skipped.
pub struct IncidentService {
    store: Option<IncidentStore>,
    learner: Box<dyn LearningStrategy>,
    weights: WeightTable,
}

impl IncidentService {
    pub fn new(store: Option<IncidentStore>, weights: WeightTable) -> Self {
        Self {
            store,
            learner: Box::new(WeightBiasLearner::new()),
            weights,
        }
    }

    pub fn with_learner(mut self, learner: Box<dyn LearningStrategy>) -> Self {
        self.learner = learner;
        self
    }

    /// Weight table as biased by feedback so far. Subsequent scans should
    /// read their weights from here.
    pub fn effective_weights(&self) -> &WeightTable {
        &self.weights
    }

    /// Builds and persists an incident report for a scored bundle.
    ///
    /// Persistence failure is logged and swallowed: the caller always gets
    /// the report it asked for.
    pub async fn generate_incident_report(
        &self,
        bundle: &AnalysisBundle,
        verdict: &RiskScoreResult,
    ) -> IncidentReport {
        let report = build_incident_report(bundle, verdict, &self.weights);

        if let Some(store) = &self.store {
            match store.insert_incident(&report).await {
                Ok(()) => info!("Persisted incident {}", report.id),
                Err(e) => error!("Failed to persist incident {}: {e}", report.id),
            }
        }

        report
    }

    /// Records analyst feedback for a URL.
    ///
    /// When `incident_id` names a stored incident, the flags that fired in
    /// it bias the weight table. Feedback always comes back to the caller:
    /// a missing store, an unknown incident id, or a failed write is logged
    /// and only skips the learning or persistence step it affects.
    pub async fn submit_feedback(
        &mut self,
        url: &str,
        feedback_type: FeedbackType,
        comment: Option<String>,
        incident_id: Option<&str>,
        user_id: Option<String>,
    ) -> UserFeedback {
        let report = match (incident_id, &self.store) {
            (Some(id), Some(store)) => match store.get_incident(id).await {
                Ok(Some(report)) => Some(report),
                Ok(None) => {
                    warn!("Feedback names unknown incident {id}; recorded without learning");
                    None
                }
                Err(e) => {
                    error!("Incident lookup for {id} failed: {e}");
                    None
                }
            },
            (Some(id), None) => {
                warn!("No store to resolve incident {id}; feedback recorded without learning");
                None
            }
            (None, _) => None,
        };

        let feedback = UserFeedback {
            id: new_feedback_id(),
            incident_id: incident_id.map(str::to_string),
            url: url.to_string(),
            feedback_type,
            comment,
            user_id,
            timestamp: Utc::now(),
        };

        if let Some(report) = &report {
            self.learner
                .apply(&feedback, &report.findings, &mut self.weights);
        }

        if let Some(store) = &self.store {
            if let Err(e) = store.insert_feedback(&feedback).await {
                error!("Failed to persist feedback {}: {e}", feedback.id);
            }
        }

        feedback
    }

    /// Applies feedback for a report already in hand, without store lookup.
    pub fn record_feedback(
        &mut self,
        report: &IncidentReport,
        feedback_type: FeedbackType,
        comment: Option<String>,
        user_id: Option<String>,
    ) -> UserFeedback {
        let feedback = UserFeedback {
            id: new_feedback_id(),
            incident_id: Some(report.id.clone()),
            url: report.url.clone(),
            feedback_type,
            comment,
            user_id,
            timestamp: Utc::now(),
        };
        self.learner
            .apply(&feedback, &report.findings, &mut self.weights);
        feedback
    }

    /// Aggregate feedback stats, empty when no store is configured.
    pub async fn get_feedback_stats(&self) -> Result<FeedbackStats, ScanError> {
        match &self.store {
            Some(store) => store.feedback_stats().await,
            None => Ok(FeedbackStats::default()),
        }
    }

    /// The most recent persisted incidents, empty when no store is
    /// configured.
    pub async fn get_recent_incidents(&self, limit: u32) -> Result<Vec<IncidentReport>, ScanError> {
        match &self.store {
            Some(store) => store.recent_incidents(limit).await,
            None => Ok(Vec::new()),
        }
    }
}
