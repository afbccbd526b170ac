//! pricegate-events: append-only, replayable per-session event log
//! backing resumable notification delivery.

pub mod event_log;

pub use event_log::{Event, EventId, EventLog};
