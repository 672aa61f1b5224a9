//! Shared data models for the scan pipeline.

use serde::{Deserialize, Serialize};

use crate::content::PageContent;
use crate::flags::WeightTable;
use crate::forms::FormRisk;
use crate::intel::IntelSignal;
use crate::netaudit::TlsAudit;
use crate::redirects::RedirectAnalysis;

/// The analysis component that produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    RedirectTracer,
    ContentInspector,
    FormAnalyzer,
    NetworkAudit,
    ThreatIntel,
}

impl ComponentKind {
    /// Stable snake_case name used in findings and explanations.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::RedirectTracer => "redirect_tracer",
            ComponentKind::ContentInspector => "content_inspector",
            ComponentKind::FormAnalyzer => "form_analyzer",
            ComponentKind::NetworkAudit => "network_audit",
            ComponentKind::ThreatIntel => "threat_intel",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A flag enriched with its originating component and the risk weight it
/// contributed. Findings are the unit the scoring engine and incident
/// reports work with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Originating component
    #[serde(rename = "type")]
    pub component: ComponentKind,
    /// Stable flag code (e.g. `missing_hsts`)
    pub flag: String,
    /// Human-readable description
    pub description: String,
    /// Risk weight this finding contributed
    pub risk_score: u8,
}

/// Result of one analysis branch: either a completed value or an explicit
/// "inconclusive" marker carrying the reason (timeout, fetch failure).
///
/// A missing signal is never silently dropped; the explanation states which
/// checks were inconclusive.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ComponentOutcome<T> {
    Complete(T),
    Inconclusive { reason: String },
}

impl<T> ComponentOutcome<T> {
    /// The completed value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            ComponentOutcome::Complete(v) => Some(v),
            ComponentOutcome::Inconclusive { .. } => None,
        }
    }

    pub fn is_inconclusive(&self) -> bool {
        matches!(self, ComponentOutcome::Inconclusive { .. })
    }
}

/// The raw outputs of every analysis component for one scan invocation.
///
/// Owned exclusively by the scan that produced it; the scoring engine only
/// borrows it to derive a `RiskScoreResult`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisBundle {
    /// Normalized input URL
    pub url: String,
    /// Final URL after redirect resolution (the input URL when the tracer
    /// was inconclusive)
    pub final_url: String,
    pub redirects: ComponentOutcome<RedirectAnalysis>,
    pub content: ComponentOutcome<PageContent>,
    pub forms: ComponentOutcome<Vec<FormRisk>>,
    pub tls: ComponentOutcome<TlsAudit>,
    /// One signal per configured threat-intel source, inconclusive ones
    /// included with zero risk
    pub intel: Vec<IntelSignal>,
}

impl AnalysisBundle {
    /// Flattens every component's flags into findings, type-tagged by the
    /// originating component. Risk weights come from the supplied table so
    /// feedback bias is reflected.
    pub fn findings(&self, weights: &WeightTable) -> Vec<Finding> {
        let mut findings = Vec::new();

        if let Some(redirects) = self.redirects.value() {
            for flag in &redirects.flags {
                findings.push(Finding {
                    component: ComponentKind::RedirectTracer,
                    flag: flag.code().to_string(),
                    description: flag.description().to_string(),
                    risk_score: weights.weight(*flag),
                });
            }
        }

        if let Some(content) = self.content.value() {
            for flag in &content.flags {
                findings.push(Finding {
                    component: ComponentKind::ContentInspector,
                    flag: flag.code().to_string(),
                    description: flag.description().to_string(),
                    risk_score: weights.weight(*flag),
                });
            }
        }

        if let Some(forms) = self.forms.value() {
            for form in forms {
                for flag in &form.flags {
                    findings.push(Finding {
                        component: ComponentKind::FormAnalyzer,
                        flag: flag.code().to_string(),
                        description: format!("{} (form #{})", flag.description(), form.form_index),
                        risk_score: weights.weight(*flag),
                    });
                }
            }
        }

        if let Some(tls) = self.tls.value() {
            for flag in &tls.flags {
                findings.push(Finding {
                    component: ComponentKind::NetworkAudit,
                    flag: flag.code().to_string(),
                    description: flag.description().to_string(),
                    risk_score: weights.weight(*flag),
                });
            }
        }

        for signal in &self.intel {
            for flag in &signal.flags {
                findings.push(Finding {
                    component: ComponentKind::ThreatIntel,
                    flag: flag.clone(),
                    description: format!("{} reported {}", signal.source, flag),
                    risk_score: signal.risk_score,
                });
            }
        }

        findings
    }

    /// Names of the checks that could not be completed, for the explanation.
    pub fn inconclusive_checks(&self) -> Vec<String> {
        let mut checks = Vec::new();
        if self.redirects.is_inconclusive() {
            checks.push(ComponentKind::RedirectTracer.as_str().to_string());
        }
        if self.content.is_inconclusive() {
            checks.push(ComponentKind::ContentInspector.as_str().to_string());
        }
        if self.forms.is_inconclusive() {
            checks.push(ComponentKind::FormAnalyzer.as_str().to_string());
        }
        if self.tls.is_inconclusive() {
            checks.push(ComponentKind::NetworkAudit.as_str().to_string());
        }
        for signal in &self.intel {
            if !signal.conclusive {
                checks.push(format!("threat_intel({})", signal.source));
            }
        }
        checks
    }
}
