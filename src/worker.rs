use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::config::ContentFilters;
use crate::dns::DnsResolve;
use crate::http::{extract_title, FetchOutcome, HttpFetch};
use crate::model::{Cancel, ResultMap, WildcardContext, WorkQueue};
use crate::similarity::similarity;

const WILDCARD_SIMILARITY_THRESHOLD: f64 = 0.8;
const HTTP_REFUSAL_RETRY_LIMIT: u8 = 2;

/// Everything a single worker needs to probe one host. Cheap to clone —
/// every field is an `Arc` or a small value.
#[derive(Clone)]
pub struct ProbeContext {
    pub apex: String,
    pub dns: Arc<dyn DnsResolve>,
    pub http: Arc<dyn HttpFetch>,
    pub results: ResultMap,
    pub queue: WorkQueue,
    pub wildcard: Arc<WildcardContext>,
    pub filters: Arc<ContentFilters>,
    pub cancel: Cancel,
}

/// Runs `workers` cooperative tasks against `queue` until it is fully
/// drained and no probe is in flight. Re-checks quiescence on an empty pop
/// rather than exiting immediately, since another worker may be mid-probe
/// and about to enqueue more work (see model::WorkQueue::is_quiescent). On
/// cancellation, workers finish a probe already in flight but stop picking
/// up new work from the queue.
pub async fn run_pass(workers: usize, ctx: ProbeContext) {
    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let ctx = ctx.clone();
        handles.push(tokio::spawn(async move {
            loop {
                if ctx.cancel.is_set() {
                    break;
                }
                let host = match ctx.queue.pop().await {
                    Some(host) => host,
                    None => {
                        if ctx.queue.is_quiescent().await {
                            break;
                        }
                        tokio::task::yield_now().await;
                        continue;
                    }
                };
                let _in_flight = ctx.queue.mark_in_flight();
                probe_host(&ctx, &host).await;
            }
        }));
    }
    for handle in handles {
        let _ = handle.await;
    }
}

async fn probe_host(ctx: &ProbeContext, host: &str) {
    if ctx.wildcard.is_wildcard {
        probe_wildcard_mode(ctx, host).await;
    } else {
        probe_plain_mode(ctx, host).await;
    }
}

async fn probe_plain_mode(ctx: &ProbeContext, host: &str) {
    let ips = ctx.dns.resolve_a(host).await;
    if !ips.is_empty() {
        ctx.results.upsert(host, ips, None).await;
        debug!(host, "resolved");
    }
    chase_cname(ctx, host).await;
}

async fn probe_wildcard_mode(ctx: &ProbeContext, host: &str) {
    let body = match fetch_with_retry(ctx, host, HTTP_REFUSAL_RETRY_LIMIT).await {
        Some(body) => body,
        None => return,
    };

    if ctx.filters.matches(&extract_title(&body), &body) {
        debug!(host, "dropped by content filter");
        return;
    }

    let ratio = similarity(&body, &ctx.wildcard.reference_html);
    if ratio >= WILDCARD_SIMILARITY_THRESHOLD {
        debug!(host, ratio, "dropped as wildcard-similar");
        return;
    }

    let ips = ctx.dns.resolve_a(host).await;
    if !ips.is_empty() {
        let title = extract_title(&body);
        ctx.results.upsert(host, ips, Some(title)).await;
        debug!(host, "resolved (wildcard mode)");
    }

    scrape_html(ctx, &body).await;
    chase_cname(ctx, host).await;
}

/// Re-queues the host once on connection refusal, up to `retries` times, as
/// a best-effort retry for transient errors. All other failures are
/// treated as an empty body and the host is dropped.
async fn fetch_with_retry(ctx: &ProbeContext, host: &str, retries: u8) -> Option<String> {
    let mut attempts_left = retries;
    loop {
        match ctx.http.fetch(host).await {
            FetchOutcome::Body(body) => return Some(body),
            FetchOutcome::Empty => return None,
            FetchOutcome::Refused if attempts_left > 0 => {
                attempts_left -= 1;
                continue;
            }
            FetchOutcome::Refused => return None,
        }
    }
}

async fn chase_cname(ctx: &ProbeContext, host: &str) {
    for target in ctx.dns.resolve_cname(host).await {
        if !target.ends_with(&format!(".{}", ctx.apex)) && target != ctx.apex {
            continue;
        }
        if ctx.results.contains(&target).await {
            continue;
        }
        ctx.queue.enqueue(target).await;
    }
}

async fn scrape_html(ctx: &ProbeContext, body: &str) {
    let pattern = format!(
        r"(?i)(?:[a-z0-9](?:[-a-z0-9]{{0,62}})?\.)+{}",
        regex::escape(&ctx.apex)
    );
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(_) => return,
    };
    for m in re.find_iter(body) {
        let candidate = m.as_str().to_lowercase();
        if ctx.results.contains(&candidate).await {
            continue;
        }
        ctx.queue.enqueue(candidate).await;
    }
}
