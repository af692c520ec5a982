use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{error, warn};

use super::{Deliverer, DeliveryOutcome};
use crate::embed::WebhookMessage;

const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

#[derive(Clone)]
pub struct DiscordNotifier {
    webhook: String,
    client: Client,
    timeout: Duration,
    max_attempts: u8,
}

impl DiscordNotifier {
    pub fn new(webhook: String) -> Self {
        Self {
            webhook,
            client: Client::new(),
            timeout: Duration::from_secs(5),
            max_attempts: 3,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_attempts(mut self, attempts: u8) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }
}

/// Discord sends `Retry-After` in whole seconds; fall back to 1s when the
/// header is missing or garbled.
fn parse_retry_after(raw: Option<&str>) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

#[async_trait::async_trait]
impl Deliverer for DiscordNotifier {
    async fn deliver(&self, msg: &WebhookMessage) -> DeliveryOutcome {
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&self.webhook)
                .timeout(self.timeout)
                .json(msg)
                .send()
                .await;

            match res {
                Ok(rsp) if rsp.status().is_success() => return DeliveryOutcome::Sent,
                Ok(rsp) if rsp.status() == StatusCode::TOO_MANY_REQUESTS => {
                    if attempt >= self.max_attempts {
                        warn!(attempts = attempt, "webhook retry budget exhausted");
                        return DeliveryOutcome::RateLimitExhausted;
                    }
                    let wait = parse_retry_after(
                        rsp.headers()
                            .get(reqwest::header::RETRY_AFTER)
                            .and_then(|v| v.to_str().ok()),
                    );
                    warn!(retry_after = wait, attempt, "webhook rate limited, backing off");
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                }
                Ok(rsp) => {
                    error!(status = %rsp.status(), "webhook rejected payload");
                    return DeliveryOutcome::Failed;
                }
                Err(e) => {
                    error!(error = %e, "webhook request failed");
                    return DeliveryOutcome::Failed;
                }
            }
        }
    }
}
