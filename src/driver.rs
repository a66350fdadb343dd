use std::collections::HashSet;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use crate::candidates::generate;
use crate::config::ContentFilters;
use crate::dns::{DnsResolve, TrustDnsResolve, CANDIDATE_SERVERS, DEFAULT_SERVER};
use crate::dictionary;
use crate::http::HttpFetch;
use crate::model::{is_domain, ApexDomain, Cancel, HostRecord, ResultMap, WildcardContext, WorkQueue};
use crate::wildcard::WildcardDetector;
use crate::worker::{self, ProbeContext};

const SERVER_SELECT_TIMEOUT: Duration = Duration::from_secs(1);
/// A name assumed to always resolve, used purely to time each candidate
/// server's responsiveness during selection.
const LIVENESS_PROBE_NAME: &str = "baidu.com";

/// Races each candidate server with a 1s-timeout A-query; the fastest
/// responder wins. Falls back to `DEFAULT_SERVER` if every candidate times
/// out. The source "selects a list" but only ever queries
/// `dns_servers[0]` afterward — this implementation makes that single-
/// server use explicit by returning one `IpAddr`, not a list.
pub async fn select_dns_server() -> IpAddr {
    let mut fastest: Option<(IpAddr, Duration)> = None;
    for server in CANDIDATE_SERVERS {
        let ip = IpAddr::from_str(server).expect("static candidate server is a valid IP");
        let resolver = TrustDnsResolve::new(ip);
        let start = Instant::now();
        let result = tokio::time::timeout(
            SERVER_SELECT_TIMEOUT,
            resolver.resolve_a(LIVENESS_PROBE_NAME),
        )
        .await;
        let elapsed = start.elapsed();
        if matches!(result, Ok(ips) if !ips.is_empty()) && elapsed < SERVER_SELECT_TIMEOUT {
            if fastest.as_ref().map_or(true, |(_, best)| elapsed < *best) {
                fastest = Some((ip, elapsed));
            }
        }
    }
    match fastest {
        Some((ip, elapsed)) => {
            info!(%ip, ?elapsed, "selected dns server");
            ip
        }
        None => {
            info!("no dns server answered within timeout, falling back to default");
            IpAddr::from_str(DEFAULT_SERVER).expect("default server is a valid IP")
        }
    }
}

/// Per-apex worker counts and feature toggles, mirroring the CLI surface.
#[derive(Clone)]
pub struct DriverOptions {
    pub workers: usize,
    pub loop_query: bool,
    pub filters: ContentFilters,
}

pub struct EnumerationDriver {
    dns: Arc<dyn DnsResolve>,
    http: Arc<dyn HttpFetch>,
    options: DriverOptions,
}

impl EnumerationDriver {
    pub fn new(dns: Arc<dyn DnsResolve>, http: Arc<dyn HttpFetch>, options: DriverOptions) -> Self {
        Self { dns, http, options }
    }

    /// Runs a full enumeration for one apex: wildcard detect, zone-transfer
    /// probe, dictionary-seeded pass, optional title-fetch pass, and
    /// (if enabled) the loop-query fixed point. Returns the accumulated
    /// result map and the union of every label discovered, for dictionary
    /// feedback.
    pub async fn run_apex(
        &self,
        apex: &ApexDomain,
        primary_dict: &HashSet<String>,
        loop_dict: &HashSet<String>,
        cancel: &Cancel,
    ) -> (ResultMap, HashSet<String>) {
        let results = ResultMap::new();
        let mut discovered_labels = HashSet::new();

        self.run_pass(apex.as_str(), apex.as_str(), primary_dict, &results, cancel)
            .await;

        if self.options.loop_query && !cancel.is_set() {
            self.loop_query(apex.as_str(), loop_dict, &results, cancel)
                .await;
        }

        for host in results.keys().await {
            discovered_labels.extend(dictionary::labels_above(&host, apex.as_str()));
        }

        (results, discovered_labels)
    }

    /// One full per-apex pass: WILDCARD_CHECK -> TRANSFER_CHECK ->
    /// ENUMERATING -> (TITLE_FETCH if non-wildcard).
    async fn run_pass(
        &self,
        root_apex: &str,
        parent: &str,
        labels: &HashSet<String>,
        results: &ResultMap,
        cancel: &Cancel,
    ) {
        if cancel.is_set() {
            return;
        }

        let detector = WildcardDetector::new(self.dns.clone(), self.http.clone());
        let wildcard_ctx = Arc::new(detector.detect(parent).await);

        let axfr_names = self.zone_transfer_probe(parent).await;

        let queue = WorkQueue::new();
        queue.seed(generate(parent, labels)).await;
        for name in axfr_names.into_iter().filter(|n| is_domain(n)) {
            queue.enqueue(name).await;
        }

        let before = results.keys().await;

        let ctx = ProbeContext {
            apex: root_apex.to_string(),
            dns: self.dns.clone(),
            http: self.http.clone(),
            results: results.clone(),
            queue,
            wildcard: wildcard_ctx.clone(),
            filters: Arc::new(self.options.filters.clone()),
            cancel: cancel.clone(),
        };
        worker::run_pass(self.options.workers, ctx).await;

        if !wildcard_ctx.is_wildcard && !cancel.is_set() {
            let after = results.keys().await;
            let newly_resolved: Vec<String> = after.difference(&before).cloned().collect();
            self.fetch_titles(results, newly_resolved, cancel).await;
        }
    }

    /// Second pass in non-wildcard mode: HTTP-probe each newly-resolved
    /// host for its title with a quarter of the worker count, since this
    /// pass is purely for enrichment rather than discovery. A host whose
    /// title or body matches the content filter is dropped from results
    /// entirely, the same suppression `probe_wildcard_mode` applies.
    async fn fetch_titles(&self, results: &ResultMap, hosts: Vec<String>, cancel: &Cancel) {
        if hosts.is_empty() {
            return;
        }
        let title_workers = (self.options.workers / 4).max(1);
        let queue = WorkQueue::new();
        queue.seed(hosts).await;

        let http = self.http.clone();
        let results = results.clone();
        let filters = Arc::new(self.options.filters.clone());
        let mut handles = Vec::with_capacity(title_workers);
        for _ in 0..title_workers {
            let queue = queue.clone();
            let http = http.clone();
            let results = results.clone();
            let filters = filters.clone();
            let cancel = cancel.clone();
            handles.push(tokio::spawn(async move {
                loop {
                    if cancel.is_set() {
                        break;
                    }
                    let host = match queue.pop().await {
                        Some(h) => h,
                        None => {
                            if queue.is_quiescent().await {
                                break;
                            }
                            tokio::task::yield_now().await;
                            continue;
                        }
                    };
                    let _guard = queue.mark_in_flight();
                    if let crate::http::FetchOutcome::Body(body) = http.fetch(&host).await {
                        let title = crate::http::extract_title(&body);
                        if filters.matches(&title, &body) {
                            results.remove(&host).await;
                            continue;
                        }
                        if !title.is_empty() {
                            results.upsert(&host, Vec::<IpAddr>::new(), Some(title)).await;
                        }
                    }
                }
            }));
        }
        for handle in handles {
            let _ = handle.await;
        }
    }

    /// NS -> A chain to discover nameserver IPs, then AXFR against each.
    /// Failure at any step is non-fatal: most zones refuse transfers.
    async fn zone_transfer_probe(&self, zone: &str) -> Vec<String> {
        let mut names = Vec::new();
        for ns_name in self.dns.resolve_ns(zone).await {
            for ns_ip in self.dns.resolve_a(&ns_name).await {
                let transferred = self.dns.zone_transfer(ns_ip, zone).await;
                if !transferred.is_empty() {
                    info!(zone, count = transferred.len(), "zone transfer succeeded");
                }
                names.extend(transferred);
            }
        }
        names
    }

    /// Fixed-point iteration: each round uses newly-discovered hosts as
    /// parents for a further pass with the loop dictionary, until the
    /// result map stops growing.
    async fn loop_query(
        &self,
        root_apex: &str,
        loop_dict: &HashSet<String>,
        results: &ResultMap,
        cancel: &Cancel,
    ) {
        let mut last_domains: HashSet<String> = [root_apex.to_string()].into_iter().collect();
        let mut last_count = results.len().await;
        loop {
            if cancel.is_set() {
                break;
            }
            let current_domains = results.keys().await;
            let query_set: Vec<String> = current_domains
                .difference(&last_domains)
                .cloned()
                .collect();
            last_domains = current_domains;

            if query_set.is_empty() {
                break;
            }

            for parent in &query_set {
                if cancel.is_set() {
                    break;
                }
                self.run_pass(root_apex, parent, loop_dict, results, cancel)
                    .await;
            }

            let current_count = results.len().await;
            if current_count <= last_count {
                break;
            }
            last_count = current_count;
        }
    }
}

/// Persists freshly-discovered hosts not yet present in `record` helper —
/// a tiny adapter kept here so `main`/`lib` can convert a `ResultMap`
/// snapshot into the plain map `output::write_results` expects.
pub async fn snapshot(results: &ResultMap) -> std::collections::HashMap<String, HostRecord> {
    results.snapshot().await
}
