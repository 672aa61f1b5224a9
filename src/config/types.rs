//! Configuration types.
//!
//! The scan pipeline has no process-wide mutable state; everything a
//! component needs (timeouts, weight table, brand list) travels in a
//! `ScanConfig` carried by the scan context.

use std::path::PathBuf;

use clap::ValueEnum;

use crate::config::constants::{
    DEFAULT_BRANDS, DEFAULT_CT_ENDPOINT, DEFAULT_DOH_ENDPOINT, DEFAULT_TIMEOUT_SECS,
    DEFAULT_USER_AGENT, MAX_REDIRECTS,
};
use crate::flags::WeightTable;

/// Logging level for the application.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Library configuration (no CLI dependencies).
///
/// Constructed programmatically or from CLI arguments; a copy is owned by
/// each `ScanContext`, so concurrent scans of different URLs never share
/// mutable state.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,

    /// Maximum redirect hops followed per trace
    pub max_redirects: usize,

    /// HTTP User-Agent header value
    pub user_agent: String,

    /// SQLite database path for incident/feedback storage.
    /// `None` disables persistence; scans still return full in-memory reports.
    pub db_path: Option<PathBuf>,

    /// Per-flag risk weights, adjustable by the feedback learner
    pub weights: WeightTable,

    /// Brand names checked for impersonation
    pub brands: Vec<String>,

    /// DNS-over-HTTPS endpoint (JSON API)
    pub doh_endpoint: String,

    /// Certificate-transparency log search endpoint
    pub ct_endpoint: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            max_redirects: MAX_REDIRECTS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            db_path: Some(PathBuf::from("./url_verdict.db")),
            weights: WeightTable::default(),
            brands: DEFAULT_BRANDS.iter().map(|s| s.to_string()).collect(),
            doh_endpoint: DEFAULT_DOH_ENDPOINT.to_string(),
            ct_endpoint: DEFAULT_CT_ENDPOINT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_scan_config_default() {
        let config = ScanConfig::default();
        assert_eq!(config.timeout_seconds, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.max_redirects, MAX_REDIRECTS);
        assert!(!config.brands.is_empty());
        assert!(config.brands.iter().any(|b| b == "paypal"));
        assert!(config.db_path.is_some());
    }
}
