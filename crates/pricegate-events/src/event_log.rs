//! In-memory event log: one ordered, append-only event sequence per
//! session, replayable from a last-seen checkpoint.
//!
//! The log is transient by design: it lives and dies with the process.
//! Events are never pruned; at this deployment's volume (one campaign,
//! advisory notifications) unbounded growth is the accepted tradeoff.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ─── Constants ───────────────────────────────────────────────────────

/// Width of the zero-padded decimal event id.
///
/// Fixed width makes lexicographic id comparison equal to numeric append
/// order, which is the invariant reconnecting clients rely on.
const EVENT_ID_WIDTH: usize = 16;

// ─── Event ───────────────────────────────────────────────────────────

/// Monotonically sortable event token, unique within one session.
pub type EventId = String;

/// A single stored event. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub payload: serde_json::Value,
}

// ─── Event Log ───────────────────────────────────────────────────────

/// Per-session event sequence.
#[derive(Debug, Default)]
struct SessionEvents {
    seq: u64,
    events: Vec<Event>,
}

/// Append-only event log keyed by session id.
///
/// Not internally synchronized: the owner wraps it in a lock. A single
/// lock over the whole map is sufficient here; per-session appends are
/// thereby serialized, and cross-session appends never logically contend.
#[derive(Debug, Default)]
pub struct EventLog {
    sessions: HashMap<String, SessionEvents>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a payload to the session's sequence, assigning the next
    /// monotonically increasing id. Returns the assigned id.
    pub fn append(&mut self, session_id: &str, payload: serde_json::Value) -> EventId {
        let entry = self.sessions.entry(session_id.to_string()).or_default();
        entry.seq += 1;
        let id = format!("{:0width$}", entry.seq, width = EVENT_ID_WIDTH);
        entry.events.push(Event {
            id: id.clone(),
            payload,
        });
        id
    }

    /// Replay all events strictly after `last_seen`, in append order.
    ///
    /// An absent or unknown checkpoint yields an empty sequence: a
    /// reconnecting client without a valid last-seen id gets no backfill,
    /// not an error. Replay only happens from a known point.
    pub fn replay_after(&self, session_id: &str, last_seen: Option<&str>) -> Vec<Event> {
        let Some(last_seen) = last_seen else {
            return Vec::new();
        };
        let Some(entry) = self.sessions.get(session_id) else {
            return Vec::new();
        };
        match entry.events.iter().position(|e| e.id == last_seen) {
            Some(idx) => entry.events[idx + 1..].to_vec(),
            None => Vec::new(),
        }
    }

    /// Number of events stored for a session (0 for unknown sessions).
    pub fn len(&self, session_id: &str) -> usize {
        self.sessions.get(session_id).map_or(0, |e| e.events.len())
    }

    pub fn is_empty(&self, session_id: &str) -> bool {
        self.len(session_id) == 0
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
