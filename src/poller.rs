// src/poller.rs
use chrono::Utc;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::NotifierConfig;
use crate::embed;
use crate::notify::{Deliverer, DeliveryOutcome};
use crate::source::{EventSource, LookaheadWindow};
use crate::store::SentStore;

/// Courtesy pause after each successful send, independent of 429 handling.
const SEND_COOLDOWN: Duration = Duration::from_secs(1);

/// What one poll cycle did; drives the cycle log line and the tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub sent: usize,
    pub skipped_duplicate: usize,
    pub skipped_malformed: usize,
    pub rate_limit_exhausted: usize,
    pub failed: usize,
    pub persisted: bool,
}

/// Single-flight orchestrator: fetch, filter against the sent-store,
/// format, deliver, persist, sleep, repeat. Exactly one cycle runs at a
/// time, which is what keeps the store's atomic-replace discipline
/// race-free.
pub struct Poller<S, D> {
    source: S,
    deliverer: D,
    state_path: PathBuf,
    poll_interval: Duration,
    lookahead_days: u32,
    page_limit: u32,
}

impl<S: EventSource, D: Deliverer> Poller<S, D> {
    pub fn new(cfg: &NotifierConfig, source: S, deliverer: D) -> Self {
        Self {
            source,
            deliverer,
            state_path: cfg.state_path.clone(),
            poll_interval: Duration::from_secs(cfg.poll_interval_secs),
            lookahead_days: cfg.lookahead_days,
            page_limit: cfg.page_limit,
        }
    }

    /// The delivery sink; lets tests inspect mock sinks after a cycle.
    pub fn deliverer(&self) -> &D {
        &self.deliverer
    }

    /// One fetch/filter/deliver/persist pass.
    ///
    /// Never fails: every per-event and per-cycle error downgrades to a log
    /// line and a report counter, and the event stays eligible next cycle.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();

        let window = LookaheadWindow::next_days(Utc::now(), self.lookahead_days, self.page_limit);
        let events = match self.source.fetch_upcoming(window).await {
            Ok(evs) => evs,
            Err(e) => {
                warn!(source = self.source.name(), error = ?e, "event fetch failed, skipping cycle");
                return report;
            }
        };
        report.fetched = events.len();
        if events.is_empty() {
            info!("no upcoming events in window");
            return report;
        }

        // One snapshot per cycle; the store file is not touched again until
        // the batched save below.
        let mut store = SentStore::load(&self.state_path);
        let mut newly_sent = 0usize;

        for event in &events {
            let id = event.dedup_id();
            if store.contains(&id) {
                report.skipped_duplicate += 1;
                continue;
            }

            let msg = match embed::build_message(event, Utc::now()) {
                Ok(m) => m,
                Err(e) => {
                    warn!(event_id = %id, error = ?e, "malformed event, skipping");
                    report.skipped_malformed += 1;
                    continue;
                }
            };

            match self.deliverer.deliver(&msg).await {
                DeliveryOutcome::Sent => {
                    info!(event_id = %id, title = %event.title, "sent event notification");
                    store.insert(id);
                    newly_sent += 1;
                    report.sent += 1;
                    tokio::time::sleep(SEND_COOLDOWN).await;
                }
                DeliveryOutcome::RateLimitExhausted => {
                    report.rate_limit_exhausted += 1;
                }
                DeliveryOutcome::Failed => {
                    report.failed += 1;
                }
            }
        }

        if newly_sent > 0 {
            match store.save() {
                Ok(()) => {
                    report.persisted = true;
                    info!(added = newly_sent, total = store.len(), "sent-event store updated");
                }
                Err(e) => {
                    // Already-sent notifications are not rolled back; a
                    // duplicate after restart beats silent loss.
                    warn!(error = ?e, "failed to persist sent-event store");
                }
            }
        }

        report
    }

    /// Poll forever. Cycles never overlap and errors never end the loop;
    /// only an external signal stops the process.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            info!("checking for new CTFs");
            let report = self.run_cycle().await;
            info!(
                fetched = report.fetched,
                sent = report.sent,
                duplicates = report.skipped_duplicate,
                interval_secs = self.poll_interval.as_secs(),
                "cycle finished, sleeping"
            );
        }
    }
}
