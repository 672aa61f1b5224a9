//! Redirect chain tracing.
//!
//! Follows HTTP and meta-refresh redirects manually (redirects-disabled
//! client) so the full path from initial URL to final destination is
//! captured, including intermediate response headers. Loop detection uses a
//! bounded per-scan visited set that is discarded when the trace completes.

mod analysis;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::OnceLock;

use async_trait::async_trait;
use log::{debug, warn};
use regex::Regex;
use reqwest::Url;
use serde::Serialize;

use crate::config::{ScanConfig, MAX_BODY_BYTES};
use crate::error_handling::ScanError;
use crate::flags::FlagCode;

pub use analysis::analyze_chain;

/// How control moved from one hop to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectKind {
    /// 3xx status with a Location header
    Http,
    /// HTML meta-refresh tag in a 2xx body
    Meta,
    /// JavaScript-driven navigation (recorded when detected, never followed)
    Javascript,
    /// Terminal hop
    None,
}

/// One requested URL in a redirect chain.
#[derive(Debug, Clone, Serialize)]
pub struct RedirectHop {
    pub url: String,
    pub status_code: u16,
    /// Response headers, lowercased keys
    pub response_headers: HashMap<String, String>,
    pub kind: RedirectKind,
}

/// Outcome of tracing one URL's redirect chain.
#[derive(Debug, Clone, Serialize)]
pub struct RedirectAnalysis {
    pub chain: Vec<RedirectHop>,
    pub final_url: String,
    pub flags: BTreeSet<FlagCode>,
    pub risk_score: u8,
}

fn meta_refresh_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)<meta[^>]+http-equiv\s*=\s*["']?refresh["']?[^>]*content\s*=\s*["']?\s*\d+\s*;\s*url\s*=\s*([^"'>\s]+)"#,
        )
        .expect("meta refresh regex is valid")
    })
}

/// Extracts a meta-refresh target from an HTML body, if present.
pub(crate) fn find_meta_refresh(body: &str) -> Option<&str> {
    meta_refresh_regex()
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Script constructs that navigate away from the page. Targets are often
/// computed at runtime, so these are recorded but never followed.
const JS_REDIRECT_MARKERS: &[&str] = &[
    "window.location.href",
    "window.location.replace(",
    "window.location.assign(",
    "location.href =",
    "location.replace(",
];

pub(crate) fn has_js_redirect(body: &str) -> bool {
    let lower = body.to_lowercase();
    JS_REDIRECT_MARKERS.iter().any(|m| lower.contains(m))
}

fn lowercase_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_lowercase(),
                v.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect()
}

/// Resolves a redirect target relative to the current URL.
fn resolve_target(current: &str, target: &str) -> Result<String, url::ParseError> {
    let resolved =
        Url::parse(target).or_else(|_| Url::parse(current).and_then(|base| base.join(target)))?;
    Ok(resolved.to_string())
}

/// One HTTP response as the tracer sees it. The body is read only for
/// non-redirect HTML responses, where a meta-refresh or script navigation
/// could hide.
pub struct HopResponse {
    pub status_code: u16,
    /// Response headers, lowercased keys
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HopResponse {
    fn is_redirection(&self) -> bool {
        (300..400).contains(&self.status_code)
    }
}

/// Fetch seam for the tracer, so chain handling can be driven without a
/// network in tests.
#[async_trait]
pub trait HopFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<HopResponse, ScanError>;
}

struct ClientFetcher<'a> {
    client: &'a reqwest::Client,
}

#[async_trait]
impl HopFetcher for ClientFetcher<'_> {
    async fn fetch(&self, url: &str) -> Result<HopResponse, ScanError> {
        let resp = self.client.get(url).send().await.map_err(|e| {
            warn!("Redirect trace fetch failed for {url}: {e}");
            ScanError::FetchFailed(e.to_string())
        })?;

        let status_code = resp.status().as_u16();
        let headers = lowercase_headers(resp.headers());

        let is_html = headers
            .get("content-type")
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(false);
        let body = if is_html && !(300..400).contains(&status_code) {
            match resp.bytes().await {
                Ok(bytes) => {
                    let slice = &bytes[..bytes.len().min(MAX_BODY_BYTES)];
                    String::from_utf8_lossy(slice).into_owned()
                }
                Err(e) => {
                    debug!("Failed to read body of {url}: {e}");
                    String::new()
                }
            }
        } else {
            String::new()
        };

        Ok(HopResponse {
            status_code,
            headers,
            body,
        })
    }
}

/// Traces the redirect chain for a URL.
///
/// Iteratively requests the current URL with redirects disabled, recording a
/// hop per request. 3xx responses are followed via Location; 2xx HTML bodies
/// are scanned for a meta-refresh target, which becomes a synthetic `Meta`
/// hop. Tracing stops at the first non-redirect, at `max_redirects` hops, or
/// when a previously visited URL reappears (loop).
///
/// # Errors
///
/// Returns `ScanError::FetchFailed` if any hop's HTTP request fails. The
/// caller treats this as an inconclusive component, not a fatal scan error.
pub async fn trace_redirects(
    start_url: &str,
    client: &reqwest::Client,
    config: &ScanConfig,
) -> Result<RedirectAnalysis, ScanError> {
    trace_chain(start_url, &ClientFetcher { client }, config).await
}

/// The hop loop behind [`trace_redirects`].
///
/// The recorded chain never exceeds `max_redirects` entries, and no two
/// consecutive entries share a URL: an immediate self-redirect breaks the
/// loop before the repeated URL is recorded again.
async fn trace_chain(
    start_url: &str,
    fetcher: &dyn HopFetcher,
    config: &ScanConfig,
) -> Result<RedirectAnalysis, ScanError> {
    let mut chain: Vec<RedirectHop> = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut current = start_url.to_string();
    let mut loop_detected = false;

    for _ in 0..config.max_redirects {
        if !visited.insert(current.clone()) {
            // Previously visited URL reappeared
            loop_detected = true;
            break;
        }

        let resp = fetcher.fetch(&current).await?;
        let is_redirect = resp.is_redirection();
        let status_code = resp.status_code;
        let headers = resp.headers;
        let body = resp.body;

        if is_redirect {
            let Some(location) = headers.get("location").cloned() else {
                // Redirect status but no Location header; treat as terminal
                debug!("Status {status_code} for {current} without Location header");
                chain.push(RedirectHop {
                    url: current.clone(),
                    status_code,
                    response_headers: headers,
                    kind: RedirectKind::None,
                });
                break;
            };
            match resolve_target(&current, &location) {
                Ok(next) => {
                    chain.push(RedirectHop {
                        url: current.clone(),
                        status_code,
                        response_headers: headers,
                        kind: RedirectKind::Http,
                    });
                    if next == current {
                        loop_detected = true;
                        break;
                    }
                    current = next;
                    continue;
                }
                Err(e) => {
                    debug!("Unresolvable Location '{location}' at {current}: {e}");
                    chain.push(RedirectHop {
                        url: current.clone(),
                        status_code,
                        response_headers: headers,
                        kind: RedirectKind::None,
                    });
                    break;
                }
            }
        }

        // Non-redirect response: look for a meta refresh in the body
        if let Some(target) = find_meta_refresh(&body) {
            match resolve_target(&current, target) {
                Ok(next) => {
                    chain.push(RedirectHop {
                        url: current.clone(),
                        status_code,
                        response_headers: headers,
                        kind: RedirectKind::Meta,
                    });
                    if next == current {
                        loop_detected = true;
                        break;
                    }
                    current = next;
                    continue;
                }
                Err(e) => {
                    debug!("Unresolvable meta-refresh target '{target}' at {current}: {e}");
                }
            }
        }

        // Terminal hop; a script-driven navigation is recorded as such but
        // never followed, since its target is usually computed at runtime.
        let kind = if has_js_redirect(&body) {
            RedirectKind::Javascript
        } else {
            RedirectKind::None
        };
        chain.push(RedirectHop {
            url: current.clone(),
            status_code,
            response_headers: headers,
            kind,
        });
        break;
    }

    Ok(analyze_chain(
        &chain,
        &current,
        loop_detected,
        &config.weights,
    ))
}
