//! Session identity and transport registry.
//!
//! The registry exclusively owns the SessionId → SessionTransport mapping.
//! Known-session lookups take a read lock only; creation is serialized by a
//! dedicated mutex held just for id generation, transport construction, and
//! map insertion. O(1) bookkeeping, no IO under the lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use thiserror::Error;
use tokio::sync::{Mutex, RwLock, mpsc};

use crate::protocol::ServerFrame;

// ─── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SessionError {
    /// The caller presented a session id we never issued (or the process
    /// restarted; the registry is in-memory only). Client error, no retry.
    #[error("unknown session id: {0}")]
    UnknownSession(String),
}

// ─── Transport ───────────────────────────────────────────────────────

/// Outbound half of one client conversation.
///
/// Owns at most one live message stream: `attach` hands back a fresh
/// receiver for the current connection's writer and invalidates the
/// previous one, so a reconnecting client takes the stream over and two
/// concurrent connections never share a session.
#[derive(Debug)]
pub struct SessionTransport {
    session_id: String,
    outbound: StdMutex<Option<mpsc::UnboundedSender<ServerFrame>>>,
}

impl SessionTransport {
    fn new(session_id: String) -> Self {
        Self {
            session_id,
            outbound: StdMutex::new(None),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Attach the current connection, replacing any previous stream.
    /// Dropping the old sender ends the previous connection's writer task
    /// cooperatively.
    pub fn attach(&self) -> mpsc::UnboundedReceiver<ServerFrame> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut outbound = self.outbound.lock().expect("outbound lock poisoned");
        *outbound = Some(tx);
        rx
    }

    /// Drop the outbound stream (connection gone or registry teardown).
    pub fn detach(&self) {
        let mut outbound = self.outbound.lock().expect("outbound lock poisoned");
        *outbound = None;
    }

    /// Send a frame to the connected client. Returns `false` if no
    /// connection is attached or the writer has gone away; the caller
    /// drops the frame and relies on event-log replay.
    pub fn send(&self, frame: ServerFrame) -> bool {
        let mut outbound = self.outbound.lock().expect("outbound lock poisoned");
        match outbound.as_ref() {
            Some(tx) => {
                if tx.send(frame).is_ok() {
                    true
                } else {
                    *outbound = None;
                    false
                }
            }
            None => false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.outbound
            .lock()
            .expect("outbound lock poisoned")
            .is_some()
    }
}

// ─── Registry ────────────────────────────────────────────────────────

/// Lifecycle and lookup of session-scoped transports.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<SessionTransport>>>,
    /// Serializes the create path only; ids are generated inside the lock
    /// so two concurrent session-less requests can never race to register
    /// under the same id.
    create_lock: Mutex<()>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a session id to its transport, creating a new session when
    /// no id is supplied. An unknown id is a client error.
    pub async fn resolve(
        &self,
        session_id: Option<&str>,
    ) -> Result<Arc<SessionTransport>, SessionError> {
        match session_id {
            Some(id) => self
                .sessions
                .read()
                .await
                .get(id)
                .cloned()
                .ok_or_else(|| SessionError::UnknownSession(id.to_string())),
            None => Ok(self.create().await),
        }
    }

    async fn create(&self) -> Arc<SessionTransport> {
        let _guard = self.create_lock.lock().await;
        let session_id = uuid::Uuid::new_v4().simple().to_string();
        let transport = Arc::new(SessionTransport::new(session_id.clone()));
        self.sessions
            .write()
            .await
            .insert(session_id.clone(), Arc::clone(&transport));
        tracing::info!(%session_id, "created new session transport");
        transport
    }

    pub async fn get(&self, session_id: &str) -> Option<Arc<SessionTransport>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Tear down every registered transport and clear the mapping.
    /// Detaching drops the outbound senders, which ends each connection's
    /// writer task cooperatively. Nothing survives restart.
    pub async fn shutdown(&self) {
        let mut sessions = self.sessions.write().await;
        for transport in sessions.values() {
            transport.detach();
        }
        let count = sessions.len();
        sessions.clear();
        tracing::info!(count, "session registry cleared");
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Creation ────────────────────────────────────────────────

    #[tokio::test]
    async fn resolve_none_creates_new_session() {
        let registry = SessionRegistry::new();
        let transport = registry.resolve(None).await.expect("create");
        assert!(!transport.session_id().is_empty());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn concurrent_creation_never_collides() {
        let registry = Arc::new(SessionRegistry::new());
        let (a, b) = tokio::join!(
            {
                let r = Arc::clone(&registry);
                async move { r.resolve(None).await.expect("create a") }
            },
            {
                let r = Arc::clone(&registry);
                async move { r.resolve(None).await.expect("create b") }
            }
        );
        assert_ne!(a.session_id(), b.session_id());
        assert_eq!(registry.len().await, 2, "both sessions must register");
    }

    // ── Lookup ──────────────────────────────────────────────────

    #[tokio::test]
    async fn resolve_known_id_returns_existing_transport() {
        let registry = SessionRegistry::new();
        let created = registry.resolve(None).await.expect("create");
        let resolved = registry
            .resolve(Some(created.session_id()))
            .await
            .expect("resolve");
        assert_eq!(created.session_id(), resolved.session_id());
        assert_eq!(registry.len().await, 1, "no duplicate registration");
    }

    #[tokio::test]
    async fn resolve_unknown_id_is_a_client_error() {
        let registry = SessionRegistry::new();
        let err = registry.resolve(Some("deadbeef")).await.unwrap_err();
        assert!(matches!(err, SessionError::UnknownSession(ref id) if id == "deadbeef"));
    }

    // ── Transport stream ────────────────────────────────────────

    #[tokio::test]
    async fn send_without_connection_is_dropped() {
        let registry = SessionRegistry::new();
        let transport = registry.resolve(None).await.expect("create");
        assert!(!transport.is_connected());
        assert!(!transport.send(ServerFrame::Error {
            message: "x".to_string()
        }));
    }

    #[tokio::test]
    async fn attach_delivers_frames_to_receiver() {
        let registry = SessionRegistry::new();
        let transport = registry.resolve(None).await.expect("create");
        let mut rx = transport.attach();
        assert!(transport.is_connected());

        assert!(transport.send(ServerFrame::Session {
            session_id: transport.session_id().to_string()
        }));
        let frame = rx.recv().await.expect("frame");
        assert!(matches!(frame, ServerFrame::Session { .. }));
    }

    #[tokio::test]
    async fn reattach_invalidates_previous_stream() {
        let registry = SessionRegistry::new();
        let transport = registry.resolve(None).await.expect("create");

        let mut old_rx = transport.attach();
        let mut new_rx = transport.attach();

        assert!(transport.send(ServerFrame::Error {
            message: "after takeover".to_string()
        }));
        // Old receiver's sender was replaced: it sees end-of-stream.
        assert!(old_rx.recv().await.is_none());
        assert!(new_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn send_after_receiver_dropped_detaches() {
        let registry = SessionRegistry::new();
        let transport = registry.resolve(None).await.expect("create");
        let rx = transport.attach();
        drop(rx);

        assert!(!transport.send(ServerFrame::Error {
            message: "x".to_string()
        }));
        assert!(!transport.is_connected());
    }

    // ── Teardown ────────────────────────────────────────────────

    #[tokio::test]
    async fn shutdown_clears_registry_and_detaches() {
        let registry = SessionRegistry::new();
        let transport = registry.resolve(None).await.expect("create");
        let mut rx = transport.attach();

        registry.shutdown().await;

        assert_eq!(registry.len().await, 0);
        assert!(!transport.is_connected());
        assert!(rx.recv().await.is_none(), "writer stream must end");
        assert!(
            registry
                .resolve(Some(transport.session_id()))
                .await
                .is_err(),
            "old ids are gone after teardown"
        );
    }
}
