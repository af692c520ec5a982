// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod config;
pub mod embed;
pub mod notify;
pub mod poller;
pub mod source;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::config::NotifierConfig;
pub use crate::embed::{build_message, WebhookMessage};
pub use crate::notify::{Deliverer, DeliveryOutcome};
pub use crate::poller::{CycleReport, Poller};
pub use crate::source::{CtfEvent, CtftimeSource, EventSource, LookaheadWindow};
pub use crate::store::SentStore;
