//! URL validation and normalization utilities.

use std::net::IpAddr;

use url::Url;

use crate::config::MAX_URL_LENGTH;
use crate::error_handling::ScanError;

/// Validates and normalizes a target URL.
///
/// Adds an https:// prefix if the scheme is missing, then validates that the
/// URL is syntactically valid and uses an http/https scheme. Rejects URLs
/// longer than `MAX_URL_LENGTH`.
///
/// # Errors
///
/// Returns `ScanError::InvalidInput` for malformed input; this is the only
/// error that is fatal to a scan.
pub fn validate_and_normalize_url(url: &str) -> Result<String, ScanError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(ScanError::InvalidInput("empty URL".to_string()));
    }
    if trimmed.len() > MAX_URL_LENGTH {
        return Err(ScanError::InvalidInput(format!(
            "URL exceeds maximum length ({} > {})",
            trimmed.len(),
            MAX_URL_LENGTH
        )));
    }

    let normalized = if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        format!("https://{trimmed}")
    } else {
        trimmed.to_string()
    };

    if normalized.len() > MAX_URL_LENGTH {
        return Err(ScanError::InvalidInput(format!(
            "normalized URL exceeds maximum length ({} > {})",
            normalized.len(),
            MAX_URL_LENGTH
        )));
    }

    match Url::parse(&normalized) {
        Ok(parsed) => match parsed.scheme() {
            "http" | "https" => {
                if parsed.host_str().is_none() {
                    return Err(ScanError::InvalidInput(format!("URL has no host: {url}")));
                }
                Ok(normalized)
            }
            other => Err(ScanError::InvalidInput(format!(
                "unsupported scheme '{other}' in URL: {url}"
            ))),
        },
        Err(e) => Err(ScanError::InvalidInput(format!("invalid URL {url}: {e}"))),
    }
}

/// Backoff before the single retry of an idempotent GET.
const FETCH_RETRY_BACKOFF: std::time::Duration = std::time::Duration::from_millis(250);

/// Fetches a URL's body, truncated to `MAX_BODY_BYTES`.
///
/// Each component fetches independently to stay decoupled; bodies are
/// lossy-decoded so malformed UTF-8 never aborts an analysis. GETs are
/// idempotent, so one failed attempt is retried once after a short backoff.
pub(crate) async fn fetch_body_limited(
    url: &str,
    client: &reqwest::Client,
) -> Result<String, ScanError> {
    match fetch_body_once(url, client).await {
        Ok(body) => Ok(body),
        Err(first) => {
            log::debug!("Fetch of {url} failed ({first}), retrying once");
            tokio::time::sleep(FETCH_RETRY_BACKOFF).await;
            fetch_body_once(url, client).await
        }
    }
}

async fn fetch_body_once(url: &str, client: &reqwest::Client) -> Result<String, ScanError> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| ScanError::FetchFailed(e.to_string()))?;
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| ScanError::FetchFailed(e.to_string()))?;
    let slice = &bytes[..bytes.len().min(crate::config::MAX_BODY_BYTES)];
    Ok(String::from_utf8_lossy(slice).into_owned())
}

/// Whether a URL's host is a raw IP literal (v4 or v6).
pub fn is_ip_host(url: &Url) -> bool {
    match url.host() {
        Some(url::Host::Ipv4(_)) | Some(url::Host::Ipv6(_)) => true,
        Some(url::Host::Domain(d)) => d.parse::<IpAddr>().is_ok(),
        None => false,
    }
}
