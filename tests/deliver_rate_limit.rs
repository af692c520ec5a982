// tests/deliver_rate_limit.rs
// Webhook retry behavior against a local mock endpoint.

use std::time::{Duration, Instant};

use chrono::Utc;
use ctf_notifier::notify::discord::DiscordNotifier;
use ctf_notifier::notify::{Deliverer, DeliveryOutcome};
use ctf_notifier::{build_message, CtfEvent, WebhookMessage};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sample_message() -> WebhookMessage {
    let event = CtfEvent {
        id: 42,
        title: "Example CTF".into(),
        url: "https://ctftime.org/event/42".into(),
        ctf_url: None,
        start: "2025-06-01T00:00:00+0000".into(),
        finish: "2025-06-02T00:00:00+0000".into(),
        weight: Some(35.5),
        format: None,
        logo: None,
        description: None,
    };
    build_message(&event, Utc::now()).unwrap()
}

#[tokio::test]
async fn success_is_a_single_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let sink = DiscordNotifier::new(format!("{}/hook", server.uri()));
    assert_eq!(sink.deliver(&sample_message()).await, DeliveryOutcome::Sent);
}

#[tokio::test]
async fn persistent_429_exhausts_after_three_attempts_with_backoff() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "2"))
        .expect(3)
        .mount(&server)
        .await;

    let sink = DiscordNotifier::new(format!("{}/hook", server.uri()));
    let started = Instant::now();
    let outcome = sink.deliver(&sample_message()).await;
    let elapsed = started.elapsed();

    assert_eq!(outcome, DeliveryOutcome::RateLimitExhausted);
    // Two backoff sleeps of 2s each between the three attempts.
    assert!(elapsed >= Duration::from_secs(4), "only waited {elapsed:?}");
}

#[tokio::test]
async fn missing_retry_after_defaults_to_one_second() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&server)
        .await;

    let sink = DiscordNotifier::new(format!("{}/hook", server.uri())).with_attempts(2);
    let started = Instant::now();
    let outcome = sink.deliver(&sample_message()).await;

    assert_eq!(outcome, DeliveryOutcome::RateLimitExhausted);
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn recovers_when_rate_limit_clears() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let sink = DiscordNotifier::new(format!("{}/hook", server.uri()));
    assert_eq!(sink.deliver(&sample_message()).await, DeliveryOutcome::Sent);
}

#[tokio::test]
async fn other_http_errors_fail_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let sink = DiscordNotifier::new(format!("{}/hook", server.uri()));
    assert_eq!(sink.deliver(&sample_message()).await, DeliveryOutcome::Failed);
}

#[tokio::test]
async fn transport_failure_is_failed_not_a_panic() {
    // Nothing listens on port 9; connection is refused immediately.
    let sink = DiscordNotifier::new("http://127.0.0.1:9/hook".into()).with_timeout(2);
    assert_eq!(sink.deliver(&sample_message()).await, DeliveryOutcome::Failed);
}
