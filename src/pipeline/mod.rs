//! Scan orchestration.
//!
//! One [`ScanContext`] owns the HTTP clients, collaborator handles, and
//! configuration for any number of scans. A scan validates its input,
//! traces redirects first (every later component works on the final URL),
//! then runs content inspection, form analysis, the network audit, and
//! threat-intel aggregation concurrently, each under its own deadline.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::{ScanConfig, COMPONENT_TIMEOUT};
use crate::content::inspect_content;
use crate::error_handling::{InitializationError, ScanError};
use crate::forms::analyze_forms;
use crate::initialization::{init_client, init_redirect_client};
use crate::intel::{aggregate_intel, IntelSource};
use crate::models::{AnalysisBundle, ComponentOutcome};
use crate::netaudit::{audit_network, CrtShClient, CtLogSource, DnsResolver, DohResolver};
use crate::redirects::trace_redirects;
use crate::scoring::{score_risk, RiskScoreResult};
use crate::utils::validate_and_normalize_url;

/// Everything a scan needs, built once and shared across scans.
pub struct ScanContext {
    pub client: Arc<reqwest::Client>,
    pub redirect_client: Arc<reqwest::Client>,
    pub config: ScanConfig,
    pub dns: Arc<dyn DnsResolver>,
    pub ct: Arc<dyn CtLogSource>,
    pub intel_sources: Vec<Arc<dyn IntelSource>>,
}

impl ScanContext {
    /// Builds a context with the default DoH and CT-log collaborators and
    /// no threat-intel sources.
    pub fn new(config: ScanConfig) -> Result<Self, InitializationError> {
        let client = init_client(&config)?;
        let redirect_client = init_redirect_client(&config)?;
        let dns: Arc<dyn DnsResolver> = Arc::new(DohResolver::new(
            Arc::clone(&client),
            config.doh_endpoint.clone(),
        ));
        let ct: Arc<dyn CtLogSource> = Arc::new(CrtShClient::new(
            Arc::clone(&client),
            config.ct_endpoint.clone(),
        ));
        Ok(Self {
            client,
            redirect_client,
            config,
            dns,
            ct,
            intel_sources: Vec::new(),
        })
    }

    pub fn with_intel_source(mut self, source: Arc<dyn IntelSource>) -> Self {
        self.intel_sources.push(source);
        self
    }
}

/// Maps a deadline-wrapped component result to its outcome.
fn outcome_from<T>(
    result: Result<Result<T, ScanError>, tokio::time::error::Elapsed>,
    component: &str,
) -> ComponentOutcome<T> {
    match result {
        Ok(Ok(value)) => ComponentOutcome::Complete(value),
        Ok(Err(e)) => {
            warn!("{component} inconclusive: {e}");
            ComponentOutcome::Inconclusive {
                reason: e.to_string(),
            }
        }
        Err(_) => {
            warn!("{component} timed out after {COMPONENT_TIMEOUT:?}");
            ComponentOutcome::Inconclusive {
                reason: format!("timed out after {COMPONENT_TIMEOUT:?}"),
            }
        }
    }
}

/// Runs every analysis component against one URL.
///
/// # Errors
///
/// Returns `ScanError::InvalidInput` for a malformed URL; all component
/// failures degrade to inconclusive outcomes inside the bundle.
pub async fn analyze_url(url: &str, ctx: &ScanContext) -> Result<AnalysisBundle, ScanError> {
    let normalized = validate_and_normalize_url(url)?;
    info!("Scanning {normalized}");

    let redirects = outcome_from(
        tokio::time::timeout(
            COMPONENT_TIMEOUT,
            trace_redirects(&normalized, &ctx.redirect_client, &ctx.config),
        )
        .await,
        "redirect_tracer",
    );

    // Later components work on the resolved URL; an inconclusive trace
    // falls back to the input URL.
    let final_url = redirects
        .value()
        .map(|r| r.final_url.clone())
        .unwrap_or_else(|| normalized.clone());
    debug!("Final URL for {normalized}: {final_url}");

    let (content, forms, tls, intel) = tokio::join!(
        tokio::time::timeout(
            COMPONENT_TIMEOUT,
            inspect_content(&final_url, &ctx.client, &ctx.config),
        ),
        tokio::time::timeout(
            COMPONENT_TIMEOUT,
            analyze_forms(&final_url, &ctx.client, &ctx.config),
        ),
        tokio::time::timeout(
            COMPONENT_TIMEOUT,
            audit_network(
                &final_url,
                &ctx.client,
                ctx.dns.as_ref(),
                ctx.ct.as_ref(),
                &ctx.config,
            ),
        ),
        aggregate_intel(&ctx.intel_sources, &final_url, COMPONENT_TIMEOUT),
    );

    Ok(AnalysisBundle {
        url: normalized,
        final_url,
        redirects,
        content: outcome_from(content, "content_inspector"),
        forms: outcome_from(forms, "form_analyzer"),
        tls: outcome_from(tls, "network_audit"),
        intel,
    })
}

/// Full scan: analysis plus scoring against the context's weight table.
pub async fn scan_url(
    url: &str,
    ctx: &ScanContext,
) -> Result<(AnalysisBundle, RiskScoreResult), ScanError> {
    let bundle = analyze_url(url, ctx).await?;
    let verdict = score_risk(&bundle, &ctx.config.weights);
    info!(
        "Scan of {} complete: {} ({})",
        bundle.url, verdict.overall_risk_score, verdict.severity
    );
    Ok((bundle, verdict))
}
