//! Threat-intelligence aggregation.
//!
//! Each feed is a pluggable [`IntelSource`]; the aggregator fans out to all
//! configured feeds concurrently and collects whatever comes back before
//! the per-source deadline. A feed that errors or times out contributes an
//! inconclusive signal, never a verdict.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use log::warn;
use serde::{Deserialize, Serialize};

/// One feed's assessment of a target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntelSignal {
    pub source: String,
    /// Flag codes reported by the feed, e.g. `known_phishing_host`
    pub flags: Vec<String>,
    pub risk_score: u8,
    /// False when the feed could not be reached or gave no usable answer
    pub conclusive: bool,
    pub details: Option<serde_json::Value>,
}

impl IntelSignal {
    /// An inconclusive placeholder for a feed that produced no answer.
    pub fn no_signal(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            flags: Vec::new(),
            risk_score: 0,
            conclusive: false,
            details: None,
        }
    }
}

/// A threat-intelligence feed.
#[async_trait]
pub trait IntelSource: Send + Sync {
    fn name(&self) -> &str;

    /// Checks a target URL or host against the feed.
    async fn check(&self, target: &str) -> Result<IntelSignal>;
}

/// Queries every feed concurrently with a per-source deadline.
///
/// The output always has one signal per configured source, in the same
/// order, so downstream reporting can name the feeds that did not answer.
pub async fn aggregate_intel(
    sources: &[Arc<dyn IntelSource>],
    target: &str,
    timeout: Duration,
) -> Vec<IntelSignal> {
    let lookups = sources.iter().map(|source| {
        let source = Arc::clone(source);
        let target = target.to_string();
        async move {
            match tokio::time::timeout(timeout, source.check(&target)).await {
                Ok(Ok(signal)) => signal,
                Ok(Err(e)) => {
                    warn!("Intel source {} failed for {target}: {e}", source.name());
                    IntelSignal::no_signal(source.name())
                }
                Err(_) => {
                    warn!(
                        "Intel source {} timed out after {timeout:?} for {target}",
                        source.name()
                    );
                    IntelSignal::no_signal(source.name())
                }
            }
        }
    });

    futures::future::join_all(lookups).await
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticSource {
        name: String,
        score: u8,
        flag: &'static str,
    }

    #[async_trait]
    impl IntelSource for StaticSource {
        fn name(&self) -> &str {
            &self.name
        }

        async fn check(&self, _target: &str) -> Result<IntelSignal> {
            Ok(IntelSignal {
                source: self.name.clone(),
                flags: vec![self.flag.to_string()],
                risk_score: self.score,
                conclusive: true,
                details: None,
            })
        }
    }

    struct FailingSource;

    #[async_trait]
    impl IntelSource for FailingSource {
        fn name(&self) -> &str {
            "offline_feed"
        }

        async fn check(&self, _target: &str) -> Result<IntelSignal> {
            anyhow::bail!("connection refused")
        }
    }

    struct SlowSource;

    #[async_trait]
    impl IntelSource for SlowSource {
        fn name(&self) -> &str {
            "slow_feed"
        }

        async fn check(&self, target: &str) -> Result<IntelSignal> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(IntelSignal::no_signal(format!("never: {target}")))
        }
    }

    #[tokio::test]
    async fn test_aggregate_collects_all_sources_in_order() {
        let sources: Vec<Arc<dyn IntelSource>> = vec![
            Arc::new(StaticSource {
                name: "feed_a".to_string(),
                score: 90,
                flag: "known_phishing_host",
            }),
            Arc::new(StaticSource {
                name: "feed_b".to_string(),
                score: 0,
                flag: "clean",
            }),
        ];
        let signals = aggregate_intel(&sources, "https://bad.example/", Duration::from_secs(5)).await;
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].source, "feed_a");
        assert_eq!(signals[0].risk_score, 90);
        assert!(signals[0].conclusive);
        assert_eq!(signals[1].source, "feed_b");
    }

    #[tokio::test]
    async fn test_failing_source_degrades_to_no_signal() {
        let sources: Vec<Arc<dyn IntelSource>> = vec![Arc::new(FailingSource)];
        let signals = aggregate_intel(&sources, "https://x.example/", Duration::from_secs(5)).await;
        assert_eq!(signals.len(), 1);
        assert!(!signals[0].conclusive);
        assert_eq!(signals[0].risk_score, 0);
        assert_eq!(signals[0].source, "offline_feed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_source_times_out() {
        let sources: Vec<Arc<dyn IntelSource>> = vec![Arc::new(SlowSource)];
        let signals = aggregate_intel(&sources, "https://x.example/", Duration::from_secs(1)).await;
        assert!(!signals[0].conclusive);
        assert_eq!(signals[0].source, "slow_feed");
    }

    #[tokio::test]
    async fn test_no_sources_yields_empty() {
        let signals = aggregate_intel(&[], "https://x.example/", Duration::from_secs(1)).await;
        assert!(signals.is_empty());
    }
}
