// src/source.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;

pub const CTFTIME_API: &str = "https://ctftime.org/api/v1/events/";

// CTFtime asks API consumers to identify themselves.
const USER_AGENT: &str = "CTF-Discord-Notifier/1.0";

/// One event as returned by the CTFtime events API. Optionals are lenient:
/// the API omits or blanks fields freely, and one bad event must never sink
/// the whole batch.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CtfEvent {
    pub id: u64,
    pub title: String,
    /// CTFtime page for the event.
    pub url: String,
    /// Organizer's own site, when they have one.
    #[serde(default)]
    pub ctf_url: Option<String>,
    /// ISO-8601 with numeric offset, e.g. "2025-06-01T00:00:00+0000".
    pub start: String,
    pub finish: String,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CtfEvent {
    /// Dedup key. CTFtime ids are stable across repeated fetches of the
    /// same event, which is what makes the sent-store usable at all.
    pub fn dedup_id(&self) -> String {
        self.id.to_string()
    }
}

/// Forward time span, from now, within which candidate events are queried.
#[derive(Debug, Clone, Copy)]
pub struct LookaheadWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub limit: u32,
}

impl LookaheadWindow {
    pub fn next_days(now: DateTime<Utc>, days: u32, limit: u32) -> Self {
        Self {
            start: now,
            end: now + Duration::days(i64::from(days)),
            limit,
        }
    }
}

#[async_trait::async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch_upcoming(&self, window: LookaheadWindow) -> Result<Vec<CtfEvent>>;
    fn name(&self) -> &'static str;
}

/// Live adapter for the CTFtime events API.
pub struct CtftimeSource {
    base_url: String,
    client: Client,
    timeout: std::time::Duration,
}

impl CtftimeSource {
    pub fn new() -> Self {
        Self::with_base_url(CTFTIME_API.to_string())
    }

    /// Point at a different endpoint (tests, mirrors).
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            base_url,
            client: Client::new(),
            timeout: std::time::Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = std::time::Duration::from_secs(secs);
        self
    }
}

impl Default for CtftimeSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EventSource for CtftimeSource {
    async fn fetch_upcoming(&self, window: LookaheadWindow) -> Result<Vec<CtfEvent>> {
        let params = [
            ("limit", window.limit.to_string()),
            ("start", window.start.timestamp().to_string()),
            ("finish", window.end.timestamp().to_string()),
        ];

        let events = self
            .client
            .get(&self.base_url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&params)
            .timeout(self.timeout)
            .send()
            .await
            .context("ctftime request")?
            .error_for_status()
            .context("ctftime non-2xx")?
            .json::<Vec<CtfEvent>>()
            .await
            .context("ctftime response body")?;

        Ok(events)
    }

    fn name(&self) -> &'static str {
        "ctftime"
    }
}
