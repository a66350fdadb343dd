use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{EnumError, Result};

fn domain_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][-A-Za-z0-9]{0,62}(\.[A-Za-z0-9][-A-Za-z0-9]{0,62})+$").unwrap()
    })
}

/// True when `name` matches the DNS label grammar used throughout the
/// engine to admit candidates to the work queue.
pub fn is_domain(name: &str) -> bool {
    domain_pattern().is_match(name)
}

/// A syntactically-valid, caller-supplied root of enumeration. Input-only;
/// never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApexDomain(String);

impl ApexDomain {
    pub fn parse(name: &str) -> Result<Self> {
        let lower = name.trim().to_lowercase();
        if !is_domain(&lower) {
            return Err(EnumError::InvalidApex(name.to_string()));
        }
        Ok(Self(lower))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ApexDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The engine's primary output entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostRecord {
    pub name: String,
    pub ips: Vec<IpAddr>,
    #[serde(default)]
    pub title: String,
}

impl HostRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ips: Vec::new(),
            title: String::new(),
        }
    }

    /// Merges freshly-resolved IPs in, keeping the set sorted and deduped.
    pub fn add_ips(&mut self, ips: impl IntoIterator<Item = IpAddr>) {
        self.ips.extend(ips);
        self.ips.sort();
        self.ips.dedup();
    }
}

/// `host -> HostRecord`, mutated by many workers under a single mutex. This
/// is the sole deduplication mechanism for CNAME and HTML-scraped
/// discoveries: a host already present here is never re-probed.
#[derive(Clone, Default)]
pub struct ResultMap(Arc<Mutex<HashMap<String, HostRecord>>>);

impl ResultMap {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(HashMap::new())))
    }

    pub async fn contains(&self, host: &str) -> bool {
        self.0.lock().await.contains_key(host)
    }

    pub async fn upsert(&self, host: &str, ips: impl IntoIterator<Item = IpAddr>, title: Option<String>) {
        let mut map = self.0.lock().await;
        let record = map
            .entry(host.to_string())
            .or_insert_with(|| HostRecord::new(host));
        record.add_ips(ips);
        if let Some(title) = title {
            record.title = title;
        }
    }

    pub async fn len(&self) -> usize {
        self.0.lock().await.len()
    }

    /// Drops a host already recorded, e.g. when title-enrichment discovers
    /// after the fact that its body matches a content filter.
    pub async fn remove(&self, host: &str) {
        self.0.lock().await.remove(host);
    }

    pub async fn keys(&self) -> HashSet<String> {
        self.0.lock().await.keys().cloned().collect()
    }

    pub async fn snapshot(&self) -> HashMap<String, HostRecord> {
        self.0.lock().await.clone()
    }
}

/// Built once per apex by the wildcard detector, read by every worker
/// during that pass. No guarding required: it is written before the pass
/// starts and never mutated afterward.
#[derive(Debug, Clone, Default)]
pub struct WildcardContext {
    pub is_wildcard: bool,
    pub reference_html: String,
}

impl WildcardContext {
    pub fn non_wildcard() -> Self {
        Self::default()
    }
}

/// LIFO work queue shared by all workers in a pass, plus the seen-set that
/// prevents re-enqueuing a host multiple times within the same pass, plus
/// the in-flight counter used for the wait-group termination rule (queue
/// empty AND no probe currently running).
#[derive(Clone)]
pub struct WorkQueue {
    stack: Arc<Mutex<Vec<String>>>,
    seen: Arc<Mutex<HashSet<String>>>,
    in_flight: Arc<AtomicUsize>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self {
            stack: Arc::new(Mutex::new(Vec::new())),
            seen: Arc::new(Mutex::new(HashSet::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Seeds the queue with candidates, marking each as seen. Used once at
    /// the start of a pass, before duplicates are possible.
    pub async fn seed(&self, hosts: impl IntoIterator<Item = String>) {
        let mut stack = self.stack.lock().await;
        let mut seen = self.seen.lock().await;
        for host in hosts {
            if seen.insert(host.clone()) {
                stack.push(host);
            }
        }
    }

    /// Enqueues a single newly-discovered host (CNAME target, HTML scrape
    /// match) if it has not already been seen in this pass.
    pub async fn enqueue(&self, host: String) -> bool {
        let mut seen = self.seen.lock().await;
        if !seen.insert(host.clone()) {
            return false;
        }
        drop(seen);
        self.stack.lock().await.push(host);
        true
    }

    pub async fn pop(&self) -> Option<String> {
        self.stack.lock().await.pop()
    }

    pub fn mark_in_flight(&self) -> InFlightGuard {
        self.in_flight
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        InFlightGuard {
            counter: self.in_flight.clone(),
        }
    }

    /// True once the stack is empty and no worker currently holds a
    /// `InFlightGuard`. Racy by construction (enqueues can race a check);
    /// callers must re-check after observing `true`, see `worker::drain`.
    pub async fn is_quiescent(&self) -> bool {
        self.stack.lock().await.is_empty()
            && self.in_flight.load(std::sync::atomic::Ordering::SeqCst) == 0
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

pub struct InFlightGuard {
    counter: Arc<AtomicUsize>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.counter
            .fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
    }
}

/// Cooperative cancellation flag shared across an entire run (every apex,
/// every pass). On keyboard interrupt, workers finish whatever probe is
/// already in flight but stop picking up new work; no in-flight work is
/// abandoned silently, but nothing new is started.
#[derive(Clone, Default)]
pub struct Cancel(Arc<std::sync::atomic::AtomicBool>);

impl Cancel {
    pub fn new() -> Self {
        Self(Arc::new(std::sync::atomic::AtomicBool::new(false)))
    }

    pub fn trigger(&self) {
        self.0.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}
