//! Pure analysis of a traced redirect chain.

use std::collections::BTreeSet;

use url::Url;

use crate::config::EXCESSIVE_REDIRECT_HOPS;
use crate::flags::{FlagCode, WeightTable};
use crate::redirects::{RedirectAnalysis, RedirectHop};
use crate::utils::is_ip_host;

/// Response headers that indicate geo-targeted redirection.
const GEO_REDIRECT_HEADERS: &[&str] = &[
    "cf-ipcountry",
    "x-geo-country",
    "x-geoip-country",
    "x-country-code",
    "x-akamai-edgescape",
];

/// Derives flags and a saturating risk score from a traced chain.
///
/// The chain holds every requested URL in order; `final_url` is the last
/// URL reached (it may not appear in the chain when tracing stopped at the
/// hop bound or on a loop).
pub fn analyze_chain(
    chain: &[RedirectHop],
    final_url: &str,
    loop_detected: bool,
    weights: &WeightTable,
) -> RedirectAnalysis {
    let mut flags: BTreeSet<FlagCode> = BTreeSet::new();

    // Full URL sequence including the final target when it was never fetched
    let mut urls: Vec<&str> = chain.iter().map(|h| h.url.as_str()).collect();
    if urls.last().map(|u| *u != final_url).unwrap_or(false) {
        urls.push(final_url);
    }

    for pair in urls.windows(2) {
        let (prev, next) = (Url::parse(pair[0]), Url::parse(pair[1]));
        match (prev, next) {
            (Ok(prev), Ok(next)) => {
                if prev.scheme() == "https" && next.scheme() == "http" {
                    flags.insert(FlagCode::HttpsDowngrade);
                }
                if is_ip_host(&next) {
                    flags.insert(FlagCode::RedirectToIpLiteral);
                }
            }
            // Unparseable URL in the chain: zero-weight marker so the
            // explanation can state coverage was reduced
            _ => {
                flags.insert(FlagCode::ParseError);
            }
        }
    }

    if loop_detected {
        flags.insert(FlagCode::RedirectLoop);
    }

    if chain
        .iter()
        .any(|hop| GEO_REDIRECT_HEADERS.iter().any(|h| hop.response_headers.contains_key(*h)))
    {
        flags.insert(FlagCode::GeoRedirect);
    }

    if chain.len() > EXCESSIVE_REDIRECT_HOPS {
        flags.insert(FlagCode::ExcessiveRedirects);
    }

    let risk_score = weights.saturating_total(flags.iter());

    RedirectAnalysis {
        chain: chain.to_vec(),
        final_url: final_url.to_string(),
        flags,
        risk_score,
    }
}
