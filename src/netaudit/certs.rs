//! Certificate-transparency log analysis.
//!
//! Certificate validity windows come from CT-log entries rather than a live
//! TLS handshake; this is passive analysis, so no cryptographic verification
//! is performed.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{CERT_EXCESSIVE_COUNT, CERT_FRESH_DAYS, CERT_NEAR_EXPIRY_DAYS};
use crate::flags::FlagCode;

/// One CT-log entry for a domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CtCertificate {
    pub issuer_name: String,
    pub not_before: String,
    pub not_after: String,
    /// Newline-separated subject names covered by the certificate
    pub name_value: String,
}

/// Certificate-transparency lookup collaborator.
#[async_trait]
pub trait CtLogSource: Send + Sync {
    async fn lookup(&self, domain: &str) -> Result<Vec<CtCertificate>>;
}

/// crt.sh JSON search client.
pub struct CrtShClient {
    client: Arc<reqwest::Client>,
    endpoint: String,
}

impl CrtShClient {
    pub fn new(client: Arc<reqwest::Client>, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl CtLogSource for CrtShClient {
    async fn lookup(&self, domain: &str) -> Result<Vec<CtCertificate>> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("q", domain), ("output", "json")])
            .send()
            .await
            .with_context(|| format!("CT log query for {domain}"))?
            .error_for_status()
            .with_context(|| format!("CT log status for {domain}"))?;
        let entries: Vec<CtCertificate> = resp
            .json()
            .await
            .with_context(|| format!("CT log response body for {domain}"))?;
        Ok(entries)
    }
}

/// Derived certificate state for the audited domain.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CertificateInfo {
    /// Whether the newest certificate's validity window covers now
    pub valid: bool,
    pub issuer: Option<String>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
    pub days_until_expiry: Option<i64>,
    pub subject_alt_names: Vec<String>,
    /// Total CT-log entries observed for the domain
    pub certificate_count: usize,
}

/// Parses a CT-log timestamp (crt.sh uses naive ISO-8601, UTC implied).
fn parse_ct_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let formats = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d"];
    for format in &formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc());
        }
        if let Ok(date) = chrono::NaiveDate::parse_from_str(value, format) {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }
    None
}

/// Derives certificate state and risk flags from CT-log entries.
///
/// The newest entry (latest `not_before`) is treated as the current
/// certificate. Flags: near expiry (<30 days), excessive entry count for
/// the domain (>50), and very recent issuance (<7 days).
pub fn audit_certificates(
    entries: &[CtCertificate],
    now: DateTime<Utc>,
) -> (CertificateInfo, BTreeSet<FlagCode>) {
    let mut flags = BTreeSet::new();

    if entries.is_empty() {
        return (CertificateInfo::default(), flags);
    }

    let newest = entries
        .iter()
        .filter_map(|e| parse_ct_timestamp(&e.not_before).map(|ts| (ts, e)))
        .max_by_key(|(ts, _)| *ts);

    let mut info = CertificateInfo {
        certificate_count: entries.len(),
        ..Default::default()
    };

    if entries.len() > CERT_EXCESSIVE_COUNT {
        flags.insert(FlagCode::CertExcessiveCount);
    }

    let Some((valid_from, leaf)) = newest else {
        // Entries exist but none parsed; count is still meaningful
        return (info, flags);
    };

    let valid_to = parse_ct_timestamp(&leaf.not_after);
    info.issuer = Some(leaf.issuer_name.clone());
    info.valid_from = Some(valid_from);
    info.valid_to = valid_to;
    info.subject_alt_names = leaf
        .name_value
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();

    if let Some(valid_to) = valid_to {
        let days_until_expiry = (valid_to - now).num_days();
        info.days_until_expiry = Some(days_until_expiry);
        info.valid = valid_from <= now && now <= valid_to;
        if days_until_expiry < CERT_NEAR_EXPIRY_DAYS {
            flags.insert(FlagCode::CertNearExpiry);
        }
    }

    if (now - valid_from).num_days() < CERT_FRESH_DAYS && valid_from <= now {
        flags.insert(FlagCode::CertRecentlyIssued);
    }

    (info, flags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cert(not_before: &str, not_after: &str) -> CtCertificate {
        CtCertificate {
            issuer_name: "C=US, O=Let's Encrypt, CN=R11".to_string(),
            not_before: not_before.to_string(),
            not_after: not_after.to_string(),
            name_value: "example.com\nwww.example.com".to_string(),
        }
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_ct_timestamp_formats() {
        assert!(parse_ct_timestamp("2024-06-01T00:00:00").is_some());
        assert!(parse_ct_timestamp("2024-06-01T00:00:00.123").is_some());
        assert!(parse_ct_timestamp("2024-06-01").is_some());
        assert!(parse_ct_timestamp("junk").is_none());
    }

    #[test]
    fn test_healthy_certificate_no_flags() {
        let entries = vec![cert("2025-01-01T00:00:00", "2027-01-01T00:00:00")];
        let (info, flags) = audit_certificates(&entries, at(2026, 1, 15));
        assert!(info.valid);
        assert!(flags.is_empty());
        assert_eq!(info.certificate_count, 1);
        assert_eq!(
            info.subject_alt_names,
            vec!["example.com".to_string(), "www.example.com".to_string()]
        );
    }

    #[test]
    fn test_near_expiry_flagged() {
        let entries = vec![cert("2025-01-01T00:00:00", "2026-02-01T00:00:00")];
        let (info, flags) = audit_certificates(&entries, at(2026, 1, 15));
        assert!(flags.contains(&FlagCode::CertNearExpiry));
        assert!(info.days_until_expiry.unwrap() < 30);
    }

    #[test]
    fn test_expired_certificate_invalid_and_flagged() {
        let entries = vec![cert("2024-01-01T00:00:00", "2024-04-01T00:00:00")];
        let (info, flags) = audit_certificates(&entries, at(2026, 1, 15));
        assert!(!info.valid);
        assert!(info.days_until_expiry.unwrap() < 0);
        assert!(flags.contains(&FlagCode::CertNearExpiry));
    }

    #[test]
    fn test_freshly_issued_flagged() {
        let entries = vec![cert("2026-01-12T00:00:00", "2026-04-12T00:00:00")];
        let (_, flags) = audit_certificates(&entries, at(2026, 1, 15));
        assert!(flags.contains(&FlagCode::CertRecentlyIssued));
    }

    #[test]
    fn test_excessive_certificate_count_flagged() {
        let entries: Vec<CtCertificate> = (0..51)
            .map(|_| cert("2025-01-01T00:00:00", "2027-01-01T00:00:00"))
            .collect();
        let (info, flags) = audit_certificates(&entries, at(2026, 1, 15));
        assert!(flags.contains(&FlagCode::CertExcessiveCount));
        assert_eq!(info.certificate_count, 51);
    }

    #[test]
    fn test_newest_entry_wins() {
        let entries = vec![
            cert("2020-01-01T00:00:00", "2020-04-01T00:00:00"),
            cert("2025-06-01T00:00:00", "2027-06-01T00:00:00"),
        ];
        let (info, flags) = audit_certificates(&entries, at(2026, 1, 15));
        assert!(info.valid);
        assert_eq!(info.valid_from, Some(at(2025, 6, 1) - chrono::Duration::hours(12)));
        assert!(!flags.contains(&FlagCode::CertNearExpiry));
    }

    #[test]
    fn test_no_entries() {
        let (info, flags) = audit_certificates(&[], at(2026, 1, 15));
        assert!(!info.valid);
        assert_eq!(info.certificate_count, 0);
        assert!(flags.is_empty());
    }

    #[test]
    fn test_unparseable_timestamps_keep_count() {
        let entries = vec![CtCertificate {
            issuer_name: "X".to_string(),
            not_before: "garbage".to_string(),
            not_after: "garbage".to_string(),
            name_value: "example.com".to_string(),
        }];
        let (info, flags) = audit_certificates(&entries, at(2026, 1, 15));
        assert_eq!(info.certificate_count, 1);
        assert!(info.issuer.is_none());
        assert!(flags.is_empty());
    }
}
