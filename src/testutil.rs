//! In-memory doubles for `DnsResolve` and `HttpFetch`, used by unit and
//! integration tests to exercise the engine deterministically without a
//! live network.

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::dns::DnsResolve;
use crate::http::{FetchOutcome, HttpFetch};

fn is_under(name: &str, apex: &str) -> bool {
    name == apex || name.ends_with(&format!(".{apex}"))
}

#[derive(Default)]
pub struct MockDns {
    a_exact: Mutex<HashMap<String, Vec<IpAddr>>>,
    a_suffix: Mutex<HashMap<String, Vec<IpAddr>>>,
    cname: Mutex<HashMap<String, Vec<String>>>,
    ns: Mutex<HashMap<String, Vec<String>>>,
    axfr: Mutex<HashMap<String, Vec<String>>>,
}

impl MockDns {
    pub fn set_a(&self, name: &str, ips: Vec<IpAddr>) {
        self.a_exact.lock().unwrap().insert(name.to_string(), ips);
    }

    /// Any name under `apex` (including `apex` itself) resolves to `ips`,
    /// unless a more specific `set_a` entry exists. Used to model wildcard
    /// zones, where the probed name carries a random/timestamp prefix the
    /// test cannot predict exactly.
    pub fn set_a_prefix(&self, apex: &str, ips: Vec<IpAddr>) {
        self.a_suffix.lock().unwrap().insert(apex.to_string(), ips);
    }

    pub fn set_cname(&self, name: &str, targets: Vec<String>) {
        self.cname.lock().unwrap().insert(name.to_string(), targets);
    }

    pub fn set_ns(&self, name: &str, targets: Vec<String>) {
        self.ns.lock().unwrap().insert(name.to_string(), targets);
    }

    pub fn set_axfr(&self, zone: &str, names: Vec<String>) {
        self.axfr.lock().unwrap().insert(zone.to_string(), names);
    }
}

#[async_trait]
impl DnsResolve for MockDns {
    async fn resolve_a(&self, name: &str) -> Vec<IpAddr> {
        if let Some(ips) = self.a_exact.lock().unwrap().get(name) {
            return crate::dns::filter_ips(ips.clone());
        }
        for (apex, ips) in self.a_suffix.lock().unwrap().iter() {
            if is_under(name, apex) {
                return crate::dns::filter_ips(ips.clone());
            }
        }
        Vec::new()
    }

    async fn resolve_cname(&self, name: &str) -> Vec<String> {
        self.cname
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    async fn resolve_ns(&self, name: &str) -> Vec<String> {
        self.ns.lock().unwrap().get(name).cloned().unwrap_or_default()
    }

    async fn zone_transfer(&self, _ns_ip: IpAddr, zone: &str) -> Vec<String> {
        self.axfr.lock().unwrap().get(zone).cloned().unwrap_or_default()
    }
}

#[derive(Default)]
pub struct MockHttp {
    exact: Mutex<HashMap<String, FetchOutcome>>,
    suffix: Mutex<HashMap<String, FetchOutcome>>,
    refused_once: Mutex<HashSet<String>>,
}

impl MockHttp {
    pub fn new(bodies: HashMap<String, String>) -> Self {
        let exact = bodies
            .into_iter()
            .map(|(k, v)| (k, FetchOutcome::Body(v)))
            .collect();
        Self {
            exact: Mutex::new(exact),
            suffix: Mutex::new(HashMap::new()),
            refused_once: Mutex::new(HashSet::new()),
        }
    }

    pub fn set_body(&self, host: &str, body: &str) {
        self.exact
            .lock()
            .unwrap()
            .insert(host.to_string(), FetchOutcome::Body(body.to_string()));
    }

    pub fn set_body_prefix(&self, apex: &str, body: &str) {
        self.suffix
            .lock()
            .unwrap()
            .insert(apex.to_string(), FetchOutcome::Body(body.to_string()));
    }

    /// The first fetch of `host` returns `Refused`; subsequent fetches fall
    /// through to whatever exact/suffix body is configured, modeling a
    /// transient connection-refused retry.
    pub fn refuse_once(&self, host: &str) {
        self.refused_once.lock().unwrap().insert(host.to_string());
    }
}

#[async_trait]
impl HttpFetch for MockHttp {
    async fn fetch(&self, host: &str) -> FetchOutcome {
        if self.refused_once.lock().unwrap().remove(host) {
            return FetchOutcome::Refused;
        }
        if let Some(outcome) = self.exact.lock().unwrap().get(host) {
            return outcome.clone();
        }
        for (apex, outcome) in self.suffix.lock().unwrap().iter() {
            if is_under(host, apex) {
                return outcome.clone();
            }
        }
        FetchOutcome::Empty
    }
}
