//! Page content inspection.
//!
//! Counts DOM constructs and flags phishing indicators with structural
//! pattern matching over the raw HTML. This is a cheap heuristic layer, not
//! a DOM parse: it is explicitly non-authoritative and can miss constructs
//! on heavily obfuscated pages. The scoring engine treats its output
//! accordingly.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use url::Url;

use crate::config::{ScanConfig, HIDDEN_INPUT_LIMIT, IFRAME_LIMIT};
use crate::error_handling::ScanError;
use crate::flags::FlagCode;
use crate::utils::fetch_body_limited;

/// Login-related text that, combined with a password field, suggests a
/// credential-capture page.
const LOGIN_TEXT_MARKERS: &[&str] = &["login", "log in", "sign in", "signin", "verify"];

/// Script identifiers associated with clipboard hijacking or keylogging.
const CLIPBOARD_KEYLOG_IDENTIFIERS: &[&str] = &[
    "clipboarddata",
    "navigator.clipboard.writetext",
    "keylogger",
    "onkeydown=",
    "onkeypress=",
    "addeventlistener('keydown'",
    "addeventlistener(\"keydown\"",
];

/// Obfuscation indicators commonly seen in injected or packed scripts.
const OBFUSCATION_MARKERS: &[&str] = &["eval(", "atob(", "fromcharcode"];

/// Structural counts extracted from the page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DomCounts {
    pub forms: usize,
    pub scripts: usize,
    pub iframes: usize,
    pub external_links: usize,
}

/// Content inspection result for one page. Read-only after creation.
#[derive(Debug, Clone, Serialize)]
pub struct PageContent {
    pub html: String,
    pub dom_counts: DomCounts,
    /// Brand names found in the body but absent from the resolved domain
    pub impersonated_brands: Vec<String>,
    pub flags: BTreeSet<FlagCode>,
    pub risk_score: u8,
}

/// Whether the host's registrable label is the brand itself, as in
/// `paypal.com` or `login.paypal.com`. Lookalike hosts that merely embed
/// the brand name, such as `totally-not-paypal.example` or
/// `paypal.com.evil.example`, do not qualify.
fn brand_owns_host(host: &str, brand: &str) -> bool {
    let mut labels = host.rsplit('.');
    let _tld = labels.next();
    labels.next() == Some(brand)
}

fn hidden_input_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)<input[^>]*type\s*=\s*["']?hidden"#).expect("hidden input regex is valid")
    })
}

fn password_input_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)type\s*=\s*["']?password"#).expect("password input regex is valid")
    })
}

/// Fetches the final URL once and inspects its body.
///
/// # Errors
///
/// Returns `ScanError::FetchFailed` on network failure; the pipeline
/// degrades this to an inconclusive component.
pub async fn inspect_content(
    final_url: &str,
    client: &reqwest::Client,
    config: &ScanConfig,
) -> Result<PageContent, ScanError> {
    let page_url = Url::parse(final_url)
        .map_err(|e| ScanError::ParseFailed(format!("final URL {final_url}: {e}")))?;
    let html = fetch_body_limited(final_url, client).await?;
    Ok(inspect_html(html, &page_url, config))
}

/// Inspects fetched HTML for phishing indicators. Pure; the network never
/// enters here.
pub fn inspect_html(html: String, page_url: &Url, config: &ScanConfig) -> PageContent {
    let lower = html.to_lowercase();
    let host = page_url.host_str().unwrap_or_default().to_lowercase();

    let dom_counts = DomCounts {
        forms: lower.matches("<form").count(),
        scripts: lower.matches("<script").count(),
        iframes: lower.matches("<iframe").count(),
        external_links: lower.matches("href=\"http").count() + lower.matches("href='http").count(),
    };

    let mut flags: BTreeSet<FlagCode> = BTreeSet::new();

    let has_password_field = password_input_regex().is_match(&lower);
    let has_login_text = LOGIN_TEXT_MARKERS.iter().any(|m| lower.contains(m));
    if has_password_field && has_login_text {
        flags.insert(FlagCode::CredentialCapturePage);
    }

    let impersonated_brands: Vec<String> = config
        .brands
        .iter()
        .filter(|brand| lower.contains(brand.as_str()) && !brand_owns_host(&host, brand))
        .cloned()
        .collect();
    if !impersonated_brands.is_empty() {
        flags.insert(FlagCode::BrandImpersonation);
    }

    if hidden_input_regex().find_iter(&lower).count() > HIDDEN_INPUT_LIMIT {
        flags.insert(FlagCode::HiddenInputCluster);
    }

    if CLIPBOARD_KEYLOG_IDENTIFIERS.iter().any(|id| lower.contains(id)) {
        flags.insert(FlagCode::ClipboardHijackScript);
    }

    if OBFUSCATION_MARKERS.iter().any(|m| lower.contains(m)) {
        flags.insert(FlagCode::ObfuscatedScript);
    }

    if dom_counts.iframes > IFRAME_LIMIT {
        flags.insert(FlagCode::IframeCluster);
    }

    // Additive score; brand impersonation contributes once per brand hit
    let mut total: u32 = flags
        .iter()
        .map(|f| config.weights.weight(*f) as u32)
        .sum();
    if impersonated_brands.len() > 1 {
        total += (impersonated_brands.len() as u32 - 1)
            * config.weights.weight(FlagCode::BrandImpersonation) as u32;
    }
    let risk_score = total.min(100) as u8;

    PageContent {
        html,
        dom_counts,
        impersonated_brands,
        flags,
        risk_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inspect(html: &str, url: &str) -> PageContent {
        let config = ScanConfig::default();
        inspect_html(html.to_string(), &Url::parse(url).unwrap(), &config)
    }

    #[test]
    fn test_dom_counts() {
        let html = r#"
            <form></form><form></form>
            <script>1</script>
            <iframe></iframe>
            <a href="https://other.example">x</a>
            <a href='http://another.example'>y</a>
        "#;
        let content = inspect(html, "https://example.com/");
        assert_eq!(content.dom_counts.forms, 2);
        assert_eq!(content.dom_counts.scripts, 1);
        assert_eq!(content.dom_counts.iframes, 1);
        assert_eq!(content.dom_counts.external_links, 2);
    }

    #[test]
    fn test_credential_capture_page() {
        let html = r#"<h1>Sign in</h1><input type="password" name="pw">"#;
        let content = inspect(html, "https://example.com/");
        assert!(content.flags.contains(&FlagCode::CredentialCapturePage));
        assert!(content.risk_score >= 20);
    }

    #[test]
    fn test_password_without_login_text_not_flagged() {
        let html = r#"<input type="password" name="pw">"#;
        let content = inspect(html, "https://example.com/");
        assert!(!content.flags.contains(&FlagCode::CredentialCapturePage));
    }

    #[test]
    fn test_brand_impersonation() {
        // Body mentions paypal, domain does not
        let html = "<p>Confirm your PayPal account now</p>";
        let content = inspect(html, "https://totally-not-related.example/");
        assert!(content.flags.contains(&FlagCode::BrandImpersonation));
        assert_eq!(content.impersonated_brands, vec!["paypal".to_string()]);
        assert!(content.risk_score >= 30);
    }

    #[test]
    fn test_lookalike_host_embedding_brand_still_flagged() {
        // The brand name inside a lookalike host must not suppress the flag
        let html = "<p>paypal</p>";
        let content = inspect(html, "https://totally-not-paypal.example/");
        assert!(content.flags.contains(&FlagCode::BrandImpersonation));
        assert!(content.risk_score >= 30);

        // Brand as a subdomain of an attacker's domain
        let content = inspect(html, "https://paypal.com.evil.example/");
        assert!(content.flags.contains(&FlagCode::BrandImpersonation));
    }

    #[test]
    fn test_brand_in_own_domain_not_flagged() {
        let html = "<p>Welcome to PayPal</p>";
        let content = inspect(html, "https://www.paypal.com/");
        assert!(!content.flags.contains(&FlagCode::BrandImpersonation));

        let content = inspect(html, "https://paypal.com/");
        assert!(!content.flags.contains(&FlagCode::BrandImpersonation));
    }

    #[test]
    fn test_multiple_brand_hits_escalate_score() {
        let html = "<p>paypal</p><p>coinbase</p><p>netflix</p>";
        let content = inspect(html, "https://phish.example/");
        assert_eq!(content.impersonated_brands.len(), 3);
        // 30 per hit
        assert!(content.risk_score >= 90);
    }

    #[test]
    fn test_hidden_input_cluster() {
        let inputs: String = (0..6)
            .map(|i| format!(r#"<input type="hidden" name="h{i}">"#))
            .collect();
        let content = inspect(&inputs, "https://example.com/");
        assert!(content.flags.contains(&FlagCode::HiddenInputCluster));
    }

    #[test]
    fn test_obfuscation_markers() {
        let html = "<script>eval(atob('ZXZpbA=='))</script>";
        let content = inspect(html, "https://example.com/");
        assert!(content.flags.contains(&FlagCode::ObfuscatedScript));
    }

    #[test]
    fn test_clipboard_hijack_identifiers() {
        let html = "<script>navigator.clipboard.writeText(addr)</script>";
        let content = inspect(html, "https://example.com/");
        assert!(content.flags.contains(&FlagCode::ClipboardHijackScript));
    }

    #[test]
    fn test_iframe_cluster() {
        let html = "<iframe></iframe>".repeat(4);
        let content = inspect(&html, "https://example.com/");
        assert!(content.flags.contains(&FlagCode::IframeCluster));
    }

    #[test]
    fn test_clean_page_scores_zero() {
        let html = "<html><body><h1>Hello</h1></body></html>";
        let content = inspect(html, "https://example.com/");
        assert!(content.flags.is_empty());
        assert_eq!(content.risk_score, 0);
    }

    #[test]
    fn test_score_capped_at_100() {
        let html = format!(
            "{}{}{}{}",
            "<h1>login</h1><input type='password'>",
            "<p>paypal apple google amazon</p>",
            "<script>eval(atob(x));navigator.clipboard.writeText(y)</script>",
            "<iframe></iframe>".repeat(5),
        );
        let content = inspect(&html, "https://phish.example/");
        assert_eq!(content.risk_score, 100);
    }
}
