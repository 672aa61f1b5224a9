//! Shared constants for scan behavior and flag weighting.

use std::time::Duration;

/// Maximum URL length (2048 characters) to prevent abuse via extremely long URLs.
/// This matches common browser and server limits.
pub const MAX_URL_LENGTH: usize = 2048;

/// Maximum number of redirect hops followed during a single trace.
pub const MAX_REDIRECTS: usize = 10;

/// A chain longer than this many hops is flagged as excessive.
pub const EXCESSIVE_REDIRECT_HOPS: usize = 5;

/// Per-request timeout for outbound HTTP calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Upper bound for each concurrent analysis branch (content, forms,
/// network audit, threat intel). One slow external API must not stall
/// the whole scan.
pub const COMPONENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum number of response body bytes inspected per fetch.
pub const MAX_BODY_BYTES: usize = 512 * 1024;

/// More hidden inputs than this on a single page is flagged.
pub const HIDDEN_INPUT_LIMIT: usize = 5;

/// More iframes than this on a single page is flagged.
pub const IFRAME_LIMIT: usize = 3;

/// Certificates expiring within this many days are flagged as near expiry.
pub const CERT_NEAR_EXPIRY_DAYS: i64 = 30;

/// Certificates issued within this many days are flagged as freshly issued.
/// Very young certificates are common in newly stood-up phishing infrastructure.
pub const CERT_FRESH_DAYS: i64 = 7;

/// More CT-log certificates than this for one domain is flagged as a
/// possible domain-abuse / subdomain-takeover surface.
pub const CERT_EXCESSIVE_COUNT: usize = 50;

/// A single component score at or above this is treated as a strong,
/// high-confidence signal by the scoring engine.
pub const STRONG_SIGNAL_THRESHOLD: u8 = 80;

/// Cap on the escalation contributed by weaker signals beyond the
/// strongest single component score.
pub const WEAK_SIGNAL_ESCALATION_CAP: u8 = 40;

/// Default User-Agent for outbound requests.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0.0.0 Safari/537.36";

/// Default DNS-over-HTTPS endpoint (JSON API).
pub const DEFAULT_DOH_ENDPOINT: &str = "https://cloudflare-dns.com/dns-query";

/// Default certificate-transparency log search endpoint.
pub const DEFAULT_CT_ENDPOINT: &str = "https://crt.sh/";

/// Brand names checked for impersonation when they appear in page bodies
/// but not in the resolved domain.
pub const DEFAULT_BRANDS: &[&str] = &[
    "paypal",
    "apple",
    "microsoft",
    "google",
    "amazon",
    "netflix",
    "facebook",
    "instagram",
    "linkedin",
    "coinbase",
    "binance",
    "metamask",
    "chase",
    "wellsfargo",
    "docusign",
    "dropbox",
];
