use std::collections::HashSet;
use std::sync::Arc;

use subrecur::config::ContentFilters;
use subrecur::driver::{DriverOptions, EnumerationDriver};
use subrecur::model::{ApexDomain, Cancel};
use subrecur::testutil::{MockDns, MockHttp};

fn labels(words: &[&str]) -> HashSet<String> {
    words.iter().map(|s| s.to_string()).collect()
}

fn driver(dns: Arc<MockDns>, http: Arc<MockHttp>, loop_query: bool) -> EnumerationDriver {
    EnumerationDriver::new(
        dns,
        http,
        DriverOptions {
            workers: 4,
            loop_query,
            filters: ContentFilters::default(),
        },
    )
}

#[tokio::test]
async fn simple_enumeration_finds_dictionary_hosts() {
    let dns = Arc::new(MockDns::default());
    dns.set_a("www.example.com", vec!["1.1.1.1".parse().unwrap()]);
    dns.set_a("mail.example.com", vec!["2.2.2.2".parse().unwrap()]);
    let http = Arc::new(MockHttp::default());

    let apex = ApexDomain::parse("example.com").unwrap();
    let cancel = Cancel::new();
    let (results, discovered) = driver(dns, http, false)
        .run_apex(&apex, &labels(&["www", "mail", "ghost"]), &HashSet::new(), &cancel)
        .await;

    let snapshot = results.snapshot().await;
    assert!(snapshot.contains_key("www.example.com"));
    assert!(snapshot.contains_key("mail.example.com"));
    assert!(!snapshot.contains_key("ghost.example.com"));
    assert!(discovered.contains("www"));
    assert!(discovered.contains("mail"));
}

#[tokio::test]
async fn wildcard_apex_suppresses_default_page_but_keeps_real_host() {
    let dns = Arc::new(MockDns::default());
    dns.set_a_prefix("wild.test", vec!["9.9.9.9".parse().unwrap()]);
    let http = Arc::new(MockHttp::default());
    http.set_body_prefix("wild.test", "this is the default parking page for any host");
    http.set_body("real.wild.test", "a completely unrelated application homepage");

    let apex = ApexDomain::parse("wild.test").unwrap();
    let cancel = Cancel::new();
    let (results, _) = driver(dns, http, false)
        .run_apex(&apex, &labels(&["real", "decoy"]), &HashSet::new(), &cancel)
        .await;

    let snapshot = results.snapshot().await;
    assert!(snapshot.contains_key("real.wild.test"));
    assert!(!snapshot.contains_key("decoy.wild.test"));
}

#[tokio::test]
async fn cname_target_within_apex_is_chased_and_recorded() {
    let dns = Arc::new(MockDns::default());
    dns.set_cname("cdn.example.com", vec!["origin.example.com".to_string()]);
    dns.set_a("origin.example.com", vec!["3.3.3.3".parse().unwrap()]);
    let http = Arc::new(MockHttp::default());

    let apex = ApexDomain::parse("example.com").unwrap();
    let cancel = Cancel::new();
    let (results, _) = driver(dns, http, false)
        .run_apex(&apex, &labels(&["cdn"]), &HashSet::new(), &cancel)
        .await;

    let snapshot = results.snapshot().await;
    assert!(snapshot.contains_key("origin.example.com"));
}

#[tokio::test]
async fn loop_query_recurses_into_newly_discovered_hosts() {
    let dns = Arc::new(MockDns::default());
    dns.set_a("api.example.com", vec!["4.4.4.4".parse().unwrap()]);
    dns.set_a("internal.api.example.com", vec!["5.5.5.5".parse().unwrap()]);
    let http = Arc::new(MockHttp::default());

    let apex = ApexDomain::parse("example.com").unwrap();
    let cancel = Cancel::new();
    let (results, _) = driver(dns, http, true)
        .run_apex(&apex, &labels(&["api"]), &labels(&["internal"]), &cancel)
        .await;

    let snapshot = results.snapshot().await;
    assert!(snapshot.contains_key("api.example.com"));
    assert!(snapshot.contains_key("internal.api.example.com"));
}

#[tokio::test]
async fn zone_transfer_seeds_additional_candidates() {
    let dns = Arc::new(MockDns::default());
    dns.set_ns("example.com", vec!["ns1.example.com".to_string()]);
    dns.set_a("ns1.example.com", vec!["6.6.6.6".parse().unwrap()]);
    dns.set_axfr("example.com", vec!["secret.example.com".to_string()]);
    dns.set_a("secret.example.com", vec!["7.7.7.7".parse().unwrap()]);
    let http = Arc::new(MockHttp::default());

    let apex = ApexDomain::parse("example.com").unwrap();
    let cancel = Cancel::new();
    let (results, _) = driver(dns, http, false)
        .run_apex(&apex, &HashSet::new(), &HashSet::new(), &cancel)
        .await;

    let snapshot = results.snapshot().await;
    assert!(snapshot.contains_key("secret.example.com"));
}

#[tokio::test]
async fn content_filter_drops_parked_domains_in_wildcard_mode() {
    let dns = Arc::new(MockDns::default());
    dns.set_a_prefix("wild.test", vec!["9.9.9.9".parse().unwrap()]);
    let http = Arc::new(MockHttp::default());
    http.set_body_prefix("wild.test", "default reference body");
    http.set_body("parked.wild.test", "This domain is for sale, inquire within");

    let apex = ApexDomain::parse("wild.test").unwrap();
    let cancel = Cancel::new();
    let options = DriverOptions {
        workers: 4,
        loop_query: false,
        filters: ContentFilters {
            title_filters: vec![],
            html_filters: vec!["This domain is for sale".to_string()],
        },
    };
    let driver = EnumerationDriver::new(dns, http, options);
    let (results, _) = driver
        .run_apex(&apex, &labels(&["parked"]), &HashSet::new(), &cancel)
        .await;

    let snapshot = results.snapshot().await;
    assert!(!snapshot.contains_key("parked.wild.test"));
}

#[tokio::test]
async fn content_filter_drops_matching_host_in_plain_mode() {
    let dns = Arc::new(MockDns::default());
    dns.set_a("parked.example.com", vec!["8.8.4.4".parse().unwrap()]);
    dns.set_a("real.example.com", vec!["8.8.8.8".parse().unwrap()]);
    let http = Arc::new(MockHttp::default());
    http.set_body("parked.example.com", "This domain is for sale, inquire within");
    http.set_body("real.example.com", "a completely unrelated application homepage");

    let apex = ApexDomain::parse("example.com").unwrap();
    let cancel = Cancel::new();
    let options = DriverOptions {
        workers: 4,
        loop_query: false,
        filters: ContentFilters {
            title_filters: vec![],
            html_filters: vec!["This domain is for sale".to_string()],
        },
    };
    let driver = EnumerationDriver::new(dns, http, options);
    let (results, _) = driver
        .run_apex(&apex, &labels(&["parked", "real"]), &HashSet::new(), &cancel)
        .await;

    let snapshot = results.snapshot().await;
    assert!(!snapshot.contains_key("parked.example.com"));
    assert!(snapshot.contains_key("real.example.com"));
}

#[tokio::test]
async fn zone_transfer_rejects_malformed_owner_names() {
    let dns = Arc::new(MockDns::default());
    dns.set_ns("example.com", vec!["ns1.example.com".to_string()]);
    dns.set_a("ns1.example.com", vec!["6.6.6.6".parse().unwrap()]);
    dns.set_axfr(
        "example.com",
        vec!["*.example.com".to_string(), "secret.example.com".to_string()],
    );
    dns.set_a("secret.example.com", vec!["7.7.7.7".parse().unwrap()]);
    let http = Arc::new(MockHttp::default());

    let apex = ApexDomain::parse("example.com").unwrap();
    let cancel = Cancel::new();
    let (results, _) = driver(dns, http, false)
        .run_apex(&apex, &HashSet::new(), &HashSet::new(), &cancel)
        .await;

    let snapshot = results.snapshot().await;
    assert!(snapshot.contains_key("secret.example.com"));
    assert!(!snapshot.contains_key("*.example.com"));
}

#[tokio::test]
async fn cancel_stops_picking_up_new_candidates() {
    let dns = Arc::new(MockDns::default());
    dns.set_a("www.example.com", vec!["1.1.1.1".parse().unwrap()]);
    let http = Arc::new(MockHttp::default());

    let apex = ApexDomain::parse("example.com").unwrap();
    let cancel = Cancel::new();
    cancel.trigger();
    let (results, _) = driver(dns, http, false)
        .run_apex(&apex, &labels(&["www"]), &HashSet::new(), &cancel)
        .await;

    assert_eq!(results.len().await, 0);
}
