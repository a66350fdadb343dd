use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

const FETCH_TIMEOUT: Duration = Duration::from_secs(3);

fn title_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<title>(.*?)</title>").unwrap())
}

/// Outcome of a single HTTP probe. Distinguishes connection refusal (worth
/// a retry) from every other failure (treated as an empty body).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Body(String),
    Refused,
    Empty,
}

/// Fetches `http://<host>` and extracts the UTF-8 body. Mocked in tests;
/// backed by `reqwest` in production.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn fetch(&self, host: &str) -> FetchOutcome;
}

pub struct ReqwestFetch {
    client: reqwest::Client,
}

impl ReqwestFetch {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(3))
            .build()
            .expect("reqwest client");
        Self { client }
    }
}

impl Default for ReqwestFetch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetch {
    async fn fetch(&self, host: &str) -> FetchOutcome {
        let url = format!("http://{host}");
        match self.client.get(&url).send().await {
            Ok(resp) => match resp.text().await {
                Ok(body) if !body.is_empty() => FetchOutcome::Body(body),
                Ok(_) => FetchOutcome::Empty,
                Err(_) => FetchOutcome::Empty,
            },
            Err(e) if e.is_connect() => FetchOutcome::Refused,
            Err(_) => FetchOutcome::Empty,
        }
    }
}

/// First `<title>...</title>` group, case-insensitive, trimmed. Empty
/// string when absent.
pub fn extract_title(body: &str) -> String {
    title_pattern()
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}
