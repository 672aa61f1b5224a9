//! DNS record queries via a DNS-over-HTTPS collaborator.
//!
//! The pipeline only depends on the [`DnsResolver`] trait; the default
//! implementation queries a public DoH JSON endpoint. "No records found" is
//! expected for many domains and yields an empty vector, while transport
//! failures propagate so the caller can record a partial audit.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::warn;
use serde::{Deserialize, Serialize};

/// DNS record types the audit queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    A,
    Aaaa,
    Mx,
    Txt,
    Ns,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Mx => "MX",
            RecordType::Txt => "TXT",
            RecordType::Ns => "NS",
        }
    }

    /// Numeric RR type as used in DoH JSON answers.
    fn code(&self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::Aaaa => 28,
            RecordType::Mx => 15,
            RecordType::Txt => 16,
            RecordType::Ns => 2,
        }
    }
}

/// DNS lookup collaborator. Implementations must be safe to call
/// concurrently.
#[async_trait]
pub trait DnsResolver: Send + Sync {
    /// Resolves a record type for a domain. An empty vector means the
    /// domain has no such records; an error means the query itself failed.
    async fn resolve(&self, domain: &str, record_type: RecordType) -> Result<Vec<String>>;
}

#[derive(Debug, Deserialize)]
struct DohResponse {
    #[serde(rename = "Status")]
    status: u32,
    #[serde(rename = "Answer")]
    answer: Option<Vec<DohAnswer>>,
}

#[derive(Debug, Deserialize)]
struct DohAnswer {
    #[serde(rename = "type")]
    rtype: u16,
    data: String,
}

/// NXDOMAIN status in DoH JSON responses.
const DOH_STATUS_NXDOMAIN: u32 = 3;

fn answers_to_records(response: DohResponse, record_type: RecordType) -> Vec<String> {
    if response.status == DOH_STATUS_NXDOMAIN {
        return Vec::new();
    }
    response
        .answer
        .unwrap_or_default()
        .into_iter()
        .filter(|a| a.rtype == record_type.code())
        .map(|a| a.data.trim_matches('"').to_string())
        .collect()
}

/// DNS-over-HTTPS resolver against a JSON API endpoint.
pub struct DohResolver {
    client: Arc<reqwest::Client>,
    endpoint: String,
}

impl DohResolver {
    pub fn new(client: Arc<reqwest::Client>, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl DnsResolver for DohResolver {
    async fn resolve(&self, domain: &str, record_type: RecordType) -> Result<Vec<String>> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("name", domain), ("type", record_type.as_str())])
            .header("accept", "application/dns-json")
            .send()
            .await
            .with_context(|| format!("DoH query for {domain} {}", record_type.as_str()))?
            .error_for_status()
            .with_context(|| format!("DoH status for {domain} {}", record_type.as_str()))?;
        let body: DohResponse = resp
            .json()
            .await
            .with_context(|| format!("DoH response body for {domain}"))?;
        Ok(answers_to_records(body, record_type))
    }
}

/// Resolved record sets for a domain.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DnsRecords {
    pub a: Vec<String>,
    pub aaaa: Vec<String>,
    pub mx: Vec<String>,
    pub txt: Vec<String>,
    pub ns: Vec<String>,
}

/// Queries all audited record types concurrently.
///
/// Individual query failures degrade to empty record sets; `None` is
/// returned only when every query failed, meaning DNS was unreachable and
/// the audit should omit the field entirely.
pub async fn query_dns_records(resolver: &dyn DnsResolver, domain: &str) -> Option<DnsRecords> {
    let (a, aaaa, mx, txt, ns) = tokio::join!(
        resolver.resolve(domain, RecordType::A),
        resolver.resolve(domain, RecordType::Aaaa),
        resolver.resolve(domain, RecordType::Mx),
        resolver.resolve(domain, RecordType::Txt),
        resolver.resolve(domain, RecordType::Ns),
    );

    let results = [&a, &aaaa, &mx, &txt, &ns];
    if results.iter().all(|r| r.is_err()) {
        warn!("All DNS queries failed for {domain}");
        return None;
    }

    let unwrap_or_log = |result: Result<Vec<String>>, rt: RecordType| match result {
        Ok(records) => records,
        Err(e) => {
            warn!("DNS {} lookup failed for {domain}: {e}", rt.as_str());
            Vec::new()
        }
    };

    Some(DnsRecords {
        a: unwrap_or_log(a, RecordType::A),
        aaaa: unwrap_or_log(aaaa, RecordType::Aaaa),
        mx: unwrap_or_log(mx, RecordType::Mx),
        txt: unwrap_or_log(txt, RecordType::Txt),
        ns: unwrap_or_log(ns, RecordType::Ns),
    })
}
