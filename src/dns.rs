use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use trust_dns_client::client::{AsyncClient, ClientHandle};
use trust_dns_client::proto::iocompat::AsyncIoTokioAsIoTokio;
use trust_dns_client::proto::rr::{DNSClass, Name, RData, Record, RecordType as ClientRecordType};
use trust_dns_client::tcp::TcpClientStream;
use trust_dns_resolver::config::{NameServerConfig, Protocol, ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// Fixed, vestigial "random selection" list from the source tool. Only the
/// first responder is ever used once selection completes (see driver.rs);
/// the rest of the list exists for the race, not for round-robin use.
pub const CANDIDATE_SERVERS: &[&str] = &[
    "114.114.114.114",
    "223.5.5.5",
    "1.1.1.1",
    "119.29.29.29",
    "1.2.4.8",
    "8.8.8.8",
];

pub const DEFAULT_SERVER: &str = "114.114.114.114";

const QUERY_TIMEOUT: Duration = Duration::from_secs(1);
const AXFR_TIMEOUT: Duration = Duration::from_secs(2);

fn is_filtered_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || *v4 == Ipv4Addr::new(0, 0, 0, 1)
        }
        IpAddr::V6(_) => true, // out of scope: engine only emits public IPv4
    }
}

/// Filters a raw answer set down to public IPv4 addresses, sorted for
/// stable output.
pub fn filter_ips(mut ips: Vec<IpAddr>) -> Vec<IpAddr> {
    ips.retain(|ip| !is_filtered_ip(ip));
    ips.sort();
    ips.dedup();
    ips
}

/// Single-query resolver abstraction. Mocked in tests; backed by
/// `trust-dns-resolver`/`trust-dns-client` in production.
#[async_trait]
pub trait DnsResolve: Send + Sync {
    async fn resolve_a(&self, name: &str) -> Vec<IpAddr>;
    async fn resolve_cname(&self, name: &str) -> Vec<String>;
    async fn resolve_ns(&self, name: &str) -> Vec<String>;
    /// Zone transfer against a nameserver IP; empty on refusal or error.
    async fn zone_transfer(&self, ns_ip: IpAddr, zone: &str) -> Vec<String>;
}

/// Resolver pinned to a single, driver-selected DNS server. All transport
/// errors are swallowed and surfaced as an empty result — brute-force
/// enumeration expects a high NXDOMAIN/SERVFAIL rate.
pub struct TrustDnsResolve {
    resolver: TokioAsyncResolver,
    server_ip: IpAddr,
}

impl TrustDnsResolve {
    pub fn new(server_ip: IpAddr) -> Self {
        let mut config = ResolverConfig::new();
        config.add_name_server(NameServerConfig {
            socket_addr: SocketAddr::new(server_ip, 53),
            protocol: Protocol::Udp,
            tls_dns_name: None,
            trust_negative_responses: false,
            bind_addr: None,
        });
        let mut opts = ResolverOpts::default();
        opts.timeout = QUERY_TIMEOUT;
        opts.attempts = 1;
        let resolver = TokioAsyncResolver::tokio(config, opts);
        Self { resolver, server_ip }
    }
}

#[async_trait]
impl DnsResolve for TrustDnsResolve {
    async fn resolve_a(&self, name: &str) -> Vec<IpAddr> {
        match tokio::time::timeout(QUERY_TIMEOUT, self.resolver.lookup_ip(name)).await {
            Ok(Ok(lookup)) => filter_ips(lookup.iter().collect()),
            _ => Vec::new(),
        }
    }

    async fn resolve_cname(&self, name: &str) -> Vec<String> {
        match tokio::time::timeout(
            QUERY_TIMEOUT,
            self.resolver
                .lookup(name, trust_dns_resolver::proto::rr::RecordType::CNAME),
        )
        .await
        {
            Ok(Ok(lookup)) => lookup
                .record_iter()
                .filter_map(|r| r.data().and_then(|d| d.as_cname()).map(|n| n.to_utf8()))
                .map(|s| s.trim_end_matches('.').to_lowercase())
                .collect(),
            _ => Vec::new(),
        }
    }

    async fn resolve_ns(&self, name: &str) -> Vec<String> {
        match tokio::time::timeout(
            QUERY_TIMEOUT,
            self.resolver
                .lookup(name, trust_dns_resolver::proto::rr::RecordType::NS),
        )
        .await
        {
            Ok(Ok(lookup)) => lookup
                .record_iter()
                .filter_map(|r| r.data().and_then(|d| d.as_ns()).map(|n| n.to_utf8()))
                .map(|s| s.trim_end_matches('.').to_lowercase())
                .collect(),
            _ => Vec::new(),
        }
    }

    async fn zone_transfer(&self, ns_ip: IpAddr, zone: &str) -> Vec<String> {
        match tokio::time::timeout(AXFR_TIMEOUT, axfr(ns_ip, zone)).await {
            Ok(Ok(names)) => names,
            _ => Vec::new(),
        }
    }
}

impl TrustDnsResolve {
    pub fn server_ip(&self) -> IpAddr {
        self.server_ip
    }
}

/// Issues a single AXFR request over TCP and collects every owner name in
/// the response. Most zones refuse transfers; failure here is non-fatal
/// and handled by the caller's timeout/`Result` collapse to empty.
async fn axfr(ns_ip: IpAddr, zone: &str) -> anyhow::Result<Vec<String>> {
    let addr = SocketAddr::new(ns_ip, 53);
    let (stream, sender) = TcpClientStream::<AsyncIoTokioAsIoTokio>::new(addr);
    let client = AsyncClient::new(stream, sender, None);
    let (mut client, bg) = client.await?;
    tokio::spawn(bg);

    let name = Name::from_ascii(zone)?;
    let response = client
        .query(name, DNSClass::IN, ClientRecordType::AXFR)
        .await?;

    let names: Vec<String> = response
        .answers()
        .iter()
        .map(owner_name)
        .filter(|n| !n.is_empty())
        .collect();
    Ok(names)
}

fn owner_name(record: &Record) -> String {
    let name = record.name().to_utf8();
    let name = name.trim_end_matches('.').to_lowercase();
    match record.data() {
        Some(RData::SOA(_)) => String::new(), // zone start/end markers, not hosts
        _ => name,
    }
}
