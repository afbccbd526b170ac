//! Wire protocol: newline-delimited JSON frames over the session socket.
//!
//! The hello frame is the transport boundary: its raw header pairs are
//! normalized into a [`pricegate_core::types::Headers`] map exactly once,
//! and session identity rides on the hello (request) and session
//! (response) frames.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ─── Client → Server ─────────────────────────────────────────────────

/// A decoded tool invocation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// First frame on every connection. No `session_id` starts a new
    /// session; a known one resumes it (replaying events after
    /// `last_event_id`); an unknown one is a client error.
    Hello {
        #[serde(default)]
        session_id: Option<String>,
        #[serde(default)]
        last_event_id: Option<String>,
        #[serde(default)]
        headers: HashMap<String, String>,
    },
    /// Tool invocation. `id` is echoed on the response frame.
    Invoke { id: u64, tool: ToolRequest },
}

// ─── Server → Client ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Hello acknowledgment carrying the assigned or resumed session id.
    Session { session_id: String },
    /// One response per invocation: a sequence of result payloads.
    Response {
        id: u64,
        payloads: Vec<serde_json::Value>,
    },
    /// Out-of-band notification, live or replayed.
    Notification {
        event_id: String,
        payload: serde_json::Value,
    },
    /// Protocol-level client error.
    Error { message: String },
}

// ─── Tests ───────────────────────────────────────────────────────────
