//! Security response header analysis.

use std::collections::BTreeSet;

use reqwest::header::HeaderMap;
use serde::Serialize;

use crate::flags::FlagCode;

/// The security response headers the audit records.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SecurityHeaders {
    pub hsts: Option<String>,
    pub csp: Option<String>,
    pub x_frame_options: Option<String>,
    pub x_content_type_options: Option<String>,
    pub referrer_policy: Option<String>,
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

/// Extracts the audited security headers from a response header map.
pub fn extract_security_headers(headers: &HeaderMap) -> SecurityHeaders {
    SecurityHeaders {
        hsts: header_value(headers, "strict-transport-security"),
        csp: header_value(headers, "content-security-policy"),
        x_frame_options: header_value(headers, "x-frame-options"),
        x_content_type_options: header_value(headers, "x-content-type-options"),
        referrer_policy: header_value(headers, "referrer-policy"),
    }
}

/// Flags missing security headers.
///
/// A plain-HTTP target is flagged `no_tls_encryption` regardless of header
/// state; HSTS absence is only meaningful on HTTPS pages. Referrer-Policy is
/// recorded but carries no penalty.
pub fn analyze_security_headers(headers: &SecurityHeaders, is_https: bool) -> BTreeSet<FlagCode> {
    let mut flags = BTreeSet::new();

    if !is_https {
        flags.insert(FlagCode::NoTlsEncryption);
    } else if headers.hsts.is_none() {
        flags.insert(FlagCode::MissingHsts);
    }

    if headers.csp.is_none() {
        flags.insert(FlagCode::MissingCsp);
    }
    if headers.x_frame_options.is_none() {
        flags.insert(FlagCode::MissingXFrameOptions);
    }
    if headers.x_content_type_options.is_none() {
        flags.insert(FlagCode::MissingXContentTypeOptions);
    }

    flags
}
