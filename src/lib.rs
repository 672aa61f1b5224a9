//! url_verdict library: multi-layer URL risk scanning.
//!
//! Scans a URL through five analysis layers (redirect tracing, content
//! inspection, form risk analysis, network/TLS audit, threat-intel
//! aggregation), combines them into a single risk verdict, and turns
//! reportable verdicts into SIEM-ready incident records with an analyst
//! feedback loop.
//!
//! # Example
//!
//! ```no_run
//! use url_verdict::{scan_url, ScanConfig, ScanContext};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = ScanContext::new(ScanConfig::default())?;
//! let (bundle, verdict) = scan_url("suspicious-site.example", &ctx).await?;
//! println!("{}: {} ({})", bundle.url, verdict.overall_risk_score, verdict.severity);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your
//! application or call library functions within an async context.

pub mod config;
pub mod content;
pub mod error_handling;
pub mod flags;
pub mod forms;
pub mod incident;
pub mod initialization;
pub mod intel;
mod models;
pub mod netaudit;
pub mod pipeline;
pub mod redirects;
pub mod scoring;
mod utils;

// Re-export public API
pub use config::{LogFormat, LogLevel, ScanConfig};
pub use error_handling::ScanError;
pub use flags::{FlagCode, WeightTable};
pub use incident::{
    FeedbackType, IncidentReport, IncidentService, IncidentStore, UserFeedback,
};
pub use models::{AnalysisBundle, ComponentKind, ComponentOutcome, Finding};
pub use pipeline::{analyze_url, scan_url, ScanContext};
pub use scoring::{score_risk, RiskScoreResult, Severity};
pub use utils::validate_and_normalize_url;
