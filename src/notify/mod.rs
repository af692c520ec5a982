pub mod discord;

use crate::embed::WebhookMessage;

/// Terminal classification of one delivery, after any in-cycle retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 2xx from the channel; the event may be marked as announced.
    Sent,
    /// The 429 retry budget ran out; the event stays eligible next cycle.
    RateLimitExhausted,
    /// Any other HTTP or transport failure; eligible again next cycle.
    Failed,
}

#[async_trait::async_trait]
pub trait Deliverer: Send + Sync {
    async fn deliver(&self, msg: &WebhookMessage) -> DeliveryOutcome;
}
