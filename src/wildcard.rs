use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::dns::DnsResolve;
use crate::http::{FetchOutcome, HttpFetch};
use crate::model::WildcardContext;

/// Classifies an apex as wildcard or not by querying a synthetic name that
/// should not exist, then fetching its HTTP body for use as the reference
/// body candidates are later compared against.
pub struct WildcardDetector {
    dns: Arc<dyn DnsResolve>,
    http: Arc<dyn HttpFetch>,
}

impl WildcardDetector {
    pub fn new(dns: Arc<dyn DnsResolve>, http: Arc<dyn HttpFetch>) -> Self {
        Self { dns, http }
    }

    pub async fn detect(&self, apex: &str) -> WildcardContext {
        let timestamp = Utc::now().format("%Y%m%d%H%M%S");
        let probe_name = format!("{timestamp}.{apex}");

        let ips = self.dns.resolve_a(&probe_name).await;
        if ips.is_empty() {
            debug!(apex, "no wildcard: synthetic name did not resolve");
            return WildcardContext::non_wildcard();
        }

        let body = match self.http.fetch(&probe_name).await {
            FetchOutcome::Body(body) => body,
            _ => String::new(),
        };

        if body.is_empty() {
            // Zone resolves but nothing serves HTTP: content-based
            // filtering is impossible, so the false-positive risk of
            // treating this as non-wildcard is accepted.
            debug!(apex, "wildcard zone but empty HTTP body: reverting to non-wildcard");
            return WildcardContext::non_wildcard();
        }

        debug!(apex, body_len = body.len(), "wildcard apex detected");
        WildcardContext {
            is_wildcard: true,
            reference_html: body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{MockDns, MockHttp};
    use std::collections::HashMap;

    #[tokio::test]
    async fn resolves_and_empty_body_reverts_to_non_wildcard() {
        let dns = Arc::new(MockDns::default());
        dns.set_a_prefix("wild.test", vec!["9.9.9.9".parse().unwrap()]);
        let http = Arc::new(MockHttp::new(HashMap::new()));
        let detector = WildcardDetector::new(dns, http);
        let ctx = detector.detect("wild.test").await;
        assert!(!ctx.is_wildcard);
    }

    #[tokio::test]
    async fn non_resolving_synthetic_name_is_non_wildcard() {
        let dns = Arc::new(MockDns::default());
        let http = Arc::new(MockHttp::new(HashMap::new()));
        let detector = WildcardDetector::new(dns, http);
        let ctx = detector.detect("example.com").await;
        assert!(!ctx.is_wildcard);
    }
}
