//! Error type definitions.
//!
//! Component-level failures never escape the pipeline: they degrade to an
//! inconclusive component outcome so the scoring engine can state which
//! checks were and were not performed. Only `InvalidInput` is fatal to a
//! whole scan.

use thiserror::Error;

/// Errors produced while scanning a target.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Malformed URL/domain/email supplied by the caller. Fatal; the scan
    /// never starts.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Network, DNS, or TLS handshake failure on an outbound call.
    /// Recovered locally as "no signal" for the affected component.
    #[error("fetch failed: {0}")]
    FetchFailed(String),

    /// Malformed HTML or JSON from a target or collaborator. Recovered
    /// locally; contributes a zero-weight `parse_error` flag.
    #[error("parse failed: {0}")]
    ParseFailed(String),

    /// Incident/feedback persistence failure. Logged; the report or
    /// feedback object is still returned to the caller.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl ScanError {
    /// Whether the error aborts the whole scan. Everything except
    /// `InvalidInput` is recovered as a degraded component result.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScanError::InvalidInput(_))
    }
}

impl From<reqwest::Error> for ScanError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ScanError::ParseFailed(e.to_string())
        } else {
            ScanError::FetchFailed(e.to_string())
        }
    }
}

/// Errors raised during logger/client initialization.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] log::SetLoggerError),

    /// Error initializing an HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] reqwest::Error),
}
