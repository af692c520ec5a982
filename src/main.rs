//! CTFtime Discord Notifier — Binary Entrypoint
//! Boots the poll loop: config, tracing, CTFtime source, Discord webhook sink.

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ctf_notifier::notify::discord::DiscordNotifier;
use ctf_notifier::poller::Poller;
use ctf_notifier::source::CtftimeSource;
use ctf_notifier::NotifierConfig;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ctf_notifier=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = NotifierConfig::load_default()?;
    tracing::info!(
        interval_secs = cfg.poll_interval_secs,
        lookahead_days = cfg.lookahead_days,
        state = %cfg.state_path.display(),
        "starting CTFtime Discord notifier"
    );

    let source = CtftimeSource::new();
    let sink = DiscordNotifier::new(cfg.webhook_url.clone());
    let poller = Poller::new(&cfg, source, sink);

    tokio::select! {
        _ = poller.run() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received, stopping");
        }
    }
    Ok(())
}
