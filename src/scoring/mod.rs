//! Risk scoring engine.
//!
//! Pure combinator over an [`AnalysisBundle`]: no network, no clock, no
//! randomness, so the same bundle always scores identically. One strong
//! signal dominates the overall score; several weak signals escalate it by
//! a capped fraction of their sum rather than a plain average, so a pile of
//! minor header findings cannot outrank a seed-phrase form on its own.

use serde::{Deserialize, Serialize};

use crate::config::{STRONG_SIGNAL_THRESHOLD, WEAK_SIGNAL_ESCALATION_CAP};
use crate::flags::WeightTable;
use crate::models::{AnalysisBundle, Finding};

/// Severity band derived from the overall risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=29 => Severity::Low,
            30..=59 => Severity::Medium,
            60..=84 => Severity::High,
            _ => Severity::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The scoring engine's verdict for one scan.
#[derive(Debug, Clone, Serialize)]
pub struct RiskScoreResult {
    pub overall_risk_score: u8,
    pub severity: Severity,
    /// Deterministic human-readable summary of how the score was derived
    pub explanation: String,
}

/// Per-component scores feeding the combiner. Components that did not
/// complete contribute nothing rather than zero-as-evidence.
fn component_scores(bundle: &AnalysisBundle) -> Vec<(String, u8)> {
    let mut scores = Vec::new();

    if let Some(redirects) = bundle.redirects.value() {
        scores.push(("redirect_tracer".to_string(), redirects.risk_score));
    }
    if let Some(content) = bundle.content.value() {
        scores.push(("content_inspector".to_string(), content.risk_score));
    }
    if let Some(forms) = bundle.forms.value() {
        let max_form = forms.iter().map(|f| f.risk_score).max().unwrap_or(0);
        scores.push(("form_analyzer".to_string(), max_form));
    }
    if let Some(tls) = bundle.tls.value() {
        scores.push(("network_audit".to_string(), tls.risk_score));
    }
    for signal in &bundle.intel {
        if signal.conclusive {
            scores.push((format!("threat_intel({})", signal.source), signal.risk_score));
        }
    }

    scores
}

/// Combines per-component scores into the overall score.
///
/// `overall = min(100, max + min(cap, 40% of the sum of the others))`.
fn combine(scores: &[(String, u8)]) -> u8 {
    let Some(max) = scores.iter().map(|(_, s)| *s as u32).max() else {
        return 0;
    };
    let sum_others: u32 = scores.iter().map(|(_, s)| *s as u32).sum::<u32>() - max;
    let escalation = (sum_others * 2 / 5).min(WEAK_SIGNAL_ESCALATION_CAP as u32);
    (max + escalation).min(100) as u8
}

/// Scores an analysis bundle against the effective weight table.
pub fn score_risk(bundle: &AnalysisBundle, weights: &WeightTable) -> RiskScoreResult {
    let scores = component_scores(bundle);
    let overall_risk_score = combine(&scores);
    let severity = Severity::from_score(overall_risk_score);
    let strongest = scores
        .iter()
        .max_by_key(|(_, s)| *s)
        .filter(|(_, s)| *s >= STRONG_SIGNAL_THRESHOLD)
        .map(|(name, _)| name.clone());
    let findings = bundle.findings(weights);
    let explanation = build_explanation(overall_risk_score, severity, &findings, bundle, strongest);

    RiskScoreResult {
        overall_risk_score,
        severity,
        explanation,
    }
}

/// Builds the explanation string: findings sorted by contribution (risk
/// descending, then flag code for ties), then the inconclusive checks.
fn build_explanation(
    score: u8,
    severity: Severity,
    findings: &[Finding],
    bundle: &AnalysisBundle,
    strongest: Option<String>,
) -> String {
    let mut parts = vec![format!("Overall risk {score}/100 ({severity})")];

    if let Some(component) = strongest {
        parts.push(format!("driven by a strong {component} signal"));
    }

    if findings.is_empty() {
        parts.push("no risk signals detected".to_string());
    } else {
        let mut sorted: Vec<&Finding> = findings.iter().collect();
        sorted.sort_by(|a, b| b.risk_score.cmp(&a.risk_score).then(a.flag.cmp(&b.flag)));
        let summary = sorted
            .iter()
            .map(|f| format!("{} [{}, +{}]", f.flag, f.component, f.risk_score))
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("signals: {summary}"));
    }

    let inconclusive = bundle.inconclusive_checks();
    if !inconclusive.is_empty() {
        parts.push(format!("inconclusive checks: {}", inconclusive.join(", ")));
    }

    parts.join("; ")
}
