// src/config.rs
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

const ENV_CONFIG_PATH: &str = "NOTIFIER_CONFIG_PATH";
const ENV_WEBHOOK_URL: &str = "DISCORD_WEBHOOK_URL";
const DEFAULT_CONFIG_PATH: &str = "config/notifier.json";

fn default_poll_interval() -> u64 {
    3600
}
fn default_lookahead_days() -> u32 {
    5
}
fn default_page_limit() -> u32 {
    100
}
fn default_state_path() -> PathBuf {
    PathBuf::from("sent_events.json")
}

/// Fixed at process start; no hot reload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// "ENV" means: read from DISCORD_WEBHOOK_URL.
    pub webhook_url: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_lookahead_days")]
    pub lookahead_days: u32,
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// Where the sent-event dedup set lives.
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
}

impl NotifierConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(&path)
            .map_err(|e| anyhow!("reading config from {}: {e}", path.as_ref().display()))?;
        let mut cfg: NotifierConfig =
            serde_json::from_str(&data).map_err(|e| anyhow!("parsing notifier config: {e}"))?;

        // Resolve webhook if "ENV"
        if cfg.webhook_url.trim().eq_ignore_ascii_case("env") {
            cfg.webhook_url = env::var(ENV_WEBHOOK_URL)
                .map_err(|_| anyhow!("Missing {ENV_WEBHOOK_URL} env var"))?;
        }
        if cfg.webhook_url.trim().is_empty() {
            return Err(anyhow!("No Discord Webhook URL provided"));
        }

        cfg.sanitize();
        Ok(cfg)
    }

    /// Load config using env var + fallbacks:
    /// 1) $NOTIFIER_CONFIG_PATH
    /// 2) config/notifier.json
    /// 3) env-only: DISCORD_WEBHOOK_URL required, defaults elsewhere
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from_file(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from_file(&default_p);
        }
        let webhook_url = env::var(ENV_WEBHOOK_URL)
            .map_err(|_| anyhow!("no config file found and {ENV_WEBHOOK_URL} is not set"))?;
        if webhook_url.trim().is_empty() {
            return Err(anyhow!("No Discord Webhook URL provided"));
        }
        Ok(Self {
            webhook_url,
            poll_interval_secs: default_poll_interval(),
            lookahead_days: default_lookahead_days(),
            page_limit: default_page_limit(),
            state_path: default_state_path(),
        })
    }

    // Zeroed-out timings would spin or query an empty window; clamp to defaults.
    fn sanitize(&mut self) {
        if self.poll_interval_secs == 0 {
            self.poll_interval_secs = default_poll_interval();
        }
        if self.lookahead_days == 0 {
            self.lookahead_days = default_lookahead_days();
        }
        if self.page_limit == 0 {
            self.page_limit = default_page_limit();
        }
    }
}
