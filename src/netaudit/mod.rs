//! Network and TLS posture audit.
//!
//! Combines three passive probes against the final URL: security response
//! headers, DNS records via a DoH collaborator, and certificate state from
//! CT logs. The probes run concurrently and fail independently; a probe
//! failure leaves its field `None` rather than sinking the whole audit.

pub mod certs;
pub mod dns;
pub mod headers;

use std::collections::BTreeSet;

use chrono::Utc;
use log::{debug, warn};
use serde::Serialize;
use url::Url;

use crate::config::ScanConfig;
use crate::error_handling::ScanError;
use crate::flags::FlagCode;

pub use certs::{audit_certificates, CertificateInfo, CrtShClient, CtCertificate, CtLogSource};
pub use dns::{query_dns_records, DnsRecords, DnsResolver, DohResolver, RecordType};
pub use headers::{analyze_security_headers, extract_security_headers, SecurityHeaders};

/// Aggregated network audit for the final URL.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TlsAudit {
    pub certificate: Option<CertificateInfo>,
    pub security_headers: Option<SecurityHeaders>,
    pub dns_records: Option<DnsRecords>,
    pub flags: BTreeSet<FlagCode>,
    pub risk_score: u8,
}

/// Runs the header, DNS, and CT probes against the final URL.
///
/// The scheme flag is derived from the URL itself, so a plain-HTTP target
/// is flagged even when the header probe fails.
///
/// # Errors
///
/// Returns `ScanError::ParseFailed` only when the final URL has no host;
/// probe failures degrade to `None` fields instead.
pub async fn audit_network(
    final_url: &str,
    client: &reqwest::Client,
    dns: &dyn DnsResolver,
    ct: &dyn CtLogSource,
    config: &ScanConfig,
) -> Result<TlsAudit, ScanError> {
    let url = Url::parse(final_url)
        .map_err(|e| ScanError::ParseFailed(format!("final URL {final_url}: {e}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| ScanError::ParseFailed(format!("final URL {final_url} has no host")))?
        .to_string();
    let is_https = url.scheme() == "https";

    let (header_result, dns_records, ct_result) = futures::join!(
        fetch_headers(final_url, client),
        query_dns_records(dns, &host),
        ct.lookup(&host),
    );

    let mut flags: BTreeSet<FlagCode> = BTreeSet::new();

    let security_headers = match header_result {
        Ok(headers) => {
            flags.extend(analyze_security_headers(&headers, is_https));
            Some(headers)
        }
        Err(e) => {
            warn!("Header probe failed for {final_url}: {e}");
            if !is_https {
                flags.insert(FlagCode::NoTlsEncryption);
            }
            None
        }
    };

    let certificate = match ct_result {
        Ok(entries) => {
            debug!("{} CT entries for {host}", entries.len());
            let (info, cert_flags) = audit_certificates(&entries, Utc::now());
            flags.extend(cert_flags);
            Some(info)
        }
        Err(e) => {
            warn!("CT probe failed for {host}: {e}");
            None
        }
    };

    let risk_score = config.weights.saturating_total(flags.iter());

    Ok(TlsAudit {
        certificate,
        security_headers,
        dns_records,
        flags,
        risk_score,
    })
}

async fn fetch_headers(
    final_url: &str,
    client: &reqwest::Client,
) -> Result<SecurityHeaders, ScanError> {
    let response = client.get(final_url).send().await?;
    Ok(extract_security_headers(response.headers()))
}
