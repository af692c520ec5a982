//! Demo that pushes one sample event through the real webhook sink.
//! Reads DISCORD_WEBHOOK_URL; does not touch the sent-event store.

use chrono::Utc;
use ctf_notifier::notify::discord::DiscordNotifier;
use ctf_notifier::notify::Deliverer;
use ctf_notifier::{build_message, CtfEvent};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).init();
    let _ = dotenvy::dotenv();

    let Ok(webhook) = std::env::var("DISCORD_WEBHOOK_URL") else {
        eprintln!("set DISCORD_WEBHOOK_URL to run the demo");
        return;
    };

    let event = CtfEvent {
        id: 0,
        title: "Notifier Demo CTF".into(),
        url: "https://ctftime.org/".into(),
        ctf_url: None,
        start: "2025-06-01T00:00:00+0000".into(),
        finish: "2025-06-02T00:00:00+0000".into(),
        weight: Some(25.0),
        format: Some("Jeopardy".into()),
        logo: None,
        description: Some("Test message from ctf-notifier's notify-demo bin.".into()),
    };
    let msg = build_message(&event, Utc::now()).expect("sample event formats");

    let sink = DiscordNotifier::new(webhook);
    let outcome = sink.deliver(&msg).await;
    println!("notify-demo done: {outcome:?}");
}
