//! Risk flags and their weights.
//!
//! A flag is a discrete, named signal (e.g. `missing_hsts`) indicating one
//! specific risk condition found by a component. Each flag carries a default
//! additive weight; per-component totals saturate at 100. The effective
//! weight of a flag can be biased by analyst feedback through the
//! [`WeightTable`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum_macros::EnumIter as EnumIterMacro;

/// Discrete risk conditions detected by the analysis components.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIterMacro, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FlagCode {
    // Redirect tracer
    HttpsDowngrade,
    RedirectToIpLiteral,
    RedirectLoop,
    GeoRedirect,
    ExcessiveRedirects,
    // Content inspector
    CredentialCapturePage,
    BrandImpersonation,
    HiddenInputCluster,
    ClipboardHijackScript,
    ObfuscatedScript,
    IframeCluster,
    // Form analyzer
    CrossDomainFormAction,
    PasswordField,
    SeedPhraseField,
    CardNumberField,
    // Network/TLS audit
    NoTlsEncryption,
    MissingHsts,
    MissingCsp,
    MissingXFrameOptions,
    MissingXContentTypeOptions,
    CertNearExpiry,
    CertExcessiveCount,
    CertRecentlyIssued,
    // Recovered parse failures contribute a zero-weight marker rather
    // than aborting the component.
    ParseError,
}

impl FlagCode {
    /// Stable snake_case code used in findings, reports, and feedback.
    pub fn code(&self) -> &'static str {
        match self {
            FlagCode::HttpsDowngrade => "https_downgrade",
            FlagCode::RedirectToIpLiteral => "redirect_to_ip_literal",
            FlagCode::RedirectLoop => "redirect_loop",
            FlagCode::GeoRedirect => "geo_redirect",
            FlagCode::ExcessiveRedirects => "excessive_redirects",
            FlagCode::CredentialCapturePage => "credential_capture_page",
            FlagCode::BrandImpersonation => "brand_impersonation",
            FlagCode::HiddenInputCluster => "hidden_input_cluster",
            FlagCode::ClipboardHijackScript => "clipboard_hijack_script",
            FlagCode::ObfuscatedScript => "obfuscated_script",
            FlagCode::IframeCluster => "iframe_cluster",
            FlagCode::CrossDomainFormAction => "cross_domain_form_action",
            FlagCode::PasswordField => "password_field",
            FlagCode::SeedPhraseField => "seed_phrase_field",
            FlagCode::CardNumberField => "card_number_field",
            FlagCode::NoTlsEncryption => "no_tls_encryption",
            FlagCode::MissingHsts => "missing_hsts",
            FlagCode::MissingCsp => "missing_csp",
            FlagCode::MissingXFrameOptions => "missing_x_frame_options",
            FlagCode::MissingXContentTypeOptions => "missing_x_content_type_options",
            FlagCode::CertNearExpiry => "cert_near_expiry",
            FlagCode::CertExcessiveCount => "cert_excessive_count",
            FlagCode::CertRecentlyIssued => "cert_recently_issued",
            FlagCode::ParseError => "parse_error",
        }
    }

    /// Default additive risk weight before any feedback bias.
    pub fn default_weight(&self) -> u8 {
        match self {
            FlagCode::HttpsDowngrade => 40,
            FlagCode::RedirectToIpLiteral => 25,
            FlagCode::RedirectLoop => 30,
            FlagCode::GeoRedirect => 10,
            FlagCode::ExcessiveRedirects => 20,
            FlagCode::CredentialCapturePage => 20,
            FlagCode::BrandImpersonation => 30,
            FlagCode::HiddenInputCluster => 15,
            FlagCode::ClipboardHijackScript => 35,
            FlagCode::ObfuscatedScript => 25,
            FlagCode::IframeCluster => 20,
            FlagCode::CrossDomainFormAction => 40,
            FlagCode::PasswordField => 15,
            FlagCode::SeedPhraseField => 50,
            FlagCode::CardNumberField => 40,
            FlagCode::NoTlsEncryption => 50,
            FlagCode::MissingHsts => 20,
            FlagCode::MissingCsp => 15,
            FlagCode::MissingXFrameOptions => 15,
            FlagCode::MissingXContentTypeOptions => 10,
            FlagCode::CertNearExpiry => 25,
            FlagCode::CertExcessiveCount => 15,
            FlagCode::CertRecentlyIssued => 20,
            FlagCode::ParseError => 0,
        }
    }

    /// Human-readable description used in findings and explanations.
    pub fn description(&self) -> &'static str {
        match self {
            FlagCode::HttpsDowngrade => "Redirect downgrades from HTTPS to plain HTTP",
            FlagCode::RedirectToIpLiteral => "Redirect target is a raw IP address",
            FlagCode::RedirectLoop => "Redirect chain contains a loop",
            FlagCode::GeoRedirect => "Geo-targeted redirect response headers present",
            FlagCode::ExcessiveRedirects => "Redirect chain exceeds five hops",
            FlagCode::CredentialCapturePage => "Password field combined with login-related text",
            FlagCode::BrandImpersonation => {
                "Known brand name appears in page body but not in the resolved domain"
            }
            FlagCode::HiddenInputCluster => "Unusually many hidden input fields",
            FlagCode::ClipboardHijackScript => "Clipboard or keylogger-related script identifiers",
            FlagCode::ObfuscatedScript => "Script obfuscation indicators (eval/atob/fromCharCode)",
            FlagCode::IframeCluster => "Unusually many iframes",
            FlagCode::CrossDomainFormAction => "Form submits to a different host than the page",
            FlagCode::PasswordField => "Form collects a password",
            FlagCode::SeedPhraseField => "Form collects a wallet seed/recovery phrase",
            FlagCode::CardNumberField => "Form collects payment card details",
            FlagCode::NoTlsEncryption => "Page is served over plain HTTP without TLS",
            FlagCode::MissingHsts => "Strict-Transport-Security header missing",
            FlagCode::MissingCsp => "Content-Security-Policy header missing",
            FlagCode::MissingXFrameOptions => "X-Frame-Options header missing",
            FlagCode::MissingXContentTypeOptions => "X-Content-Type-Options header missing",
            FlagCode::CertNearExpiry => "Certificate expires within 30 days",
            FlagCode::CertExcessiveCount => "Excessive certificate count for the domain",
            FlagCode::CertRecentlyIssued => "Certificate issued within the last 7 days",
            FlagCode::ParseError => "Response could not be fully parsed; heuristic coverage reduced",
        }
    }
}

impl std::fmt::Display for FlagCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Per-flag weight overrides layered over the defaults.
///
/// The feedback learner biases entries in this table; components read their
/// effective weights through it, so a scan always sees a consistent snapshot.
#[derive(Debug, Clone, Default)]
pub struct WeightTable {
    overrides: HashMap<FlagCode, u8>,
}

impl WeightTable {
    /// Effective weight for a flag: the override if one exists, otherwise
    /// the default.
    pub fn weight(&self, flag: FlagCode) -> u8 {
        self.overrides
            .get(&flag)
            .copied()
            .unwrap_or_else(|| flag.default_weight())
    }

    /// Applies a signed delta to a flag's weight, clamped to [0, 100].
    pub fn adjust(&mut self, flag: FlagCode, delta: i16) {
        let current = self.weight(flag) as i16;
        let adjusted = (current + delta).clamp(0, 100) as u8;
        self.overrides.insert(flag, adjusted);
    }

    /// Looks up a flag by its snake_case code.
    pub fn flag_by_code(code: &str) -> Option<FlagCode> {
        use strum::IntoEnumIterator;
        FlagCode::iter().find(|f| f.code() == code)
    }

    /// Saturating sum of flag weights, capped at 100.
    pub fn saturating_total<'a>(&self, flags: impl IntoIterator<Item = &'a FlagCode>) -> u8 {
        let sum: u32 = flags.into_iter().map(|f| self.weight(*f) as u32).sum();
        sum.min(100) as u8
    }
}
