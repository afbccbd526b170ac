//! UDS session server: long-lived connections speaking newline-delimited
//! JSON frames, with resumable delivery per session.
//!
//! Connection lifecycle: hello → resolve/create session → attach writer →
//! replay missed events → invoke loop. Internal faults never terminate the
//! session transport; the client always receives a well-formed frame.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;

use pricegate_core::types::Headers;
use pricegate_events::EventLog;
use pricegate_store::CampaignStore;

use crate::invoker;
use crate::notify::NotificationDispatcher;
use crate::protocol::{ClientFrame, ServerFrame, ToolRequest};
use crate::session::{SessionRegistry, SessionTransport};

// ─── State ───────────────────────────────────────────────────────────

/// Shared server state: the session registry, the per-session event log,
/// the background dispatcher, and the campaign store.
pub struct ServerState {
    pub registry: SessionRegistry,
    pub events: Mutex<EventLog>,
    pub dispatcher: NotificationDispatcher,
    pub store: CampaignStore,
}

impl ServerState {
    pub fn new(store: CampaignStore) -> Self {
        Self {
            registry: SessionRegistry::new(),
            events: Mutex::new(EventLog::new()),
            dispatcher: NotificationDispatcher::new(),
            store,
        }
    }
}

// ─── Daemon ──────────────────────────────────────────────────────────

/// Run the daemon: starts the session server and waits for shutdown.
pub async fn run_daemon(data_dir: &str, socket_path: &str) -> anyhow::Result<()> {
    let store = CampaignStore::open(Path::new(data_dir).join("campaign.json"))
        .with_context(|| format!("campaign store unusable under {data_dir:?}"))?;
    let state = Arc::new(ServerState::new(store));

    let server_state = Arc::clone(&state);
    let server_socket = socket_path.to_string();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = run_server(&server_socket, server_state).await {
            tracing::error!("session server error: {e}");
        }
    });

    // Wait for shutdown signal (ctrl-c or SIGTERM)
    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("failed to register SIGTERM handler");
            tokio::select! {
                _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
                _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
            }
        }

        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
            tracing::info!("received ctrl-c, shutting down");
        }
    };

    tokio::select! {
        () = shutdown => {}
        _ = server_handle => {
            tracing::warn!("session server exited unexpectedly");
        }
    }

    // Cancel background notification tasks, then tear down sessions.
    state.dispatcher.shutdown();
    state.registry.shutdown().await;
    let _ = std::fs::remove_file(socket_path);
    tracing::info!("daemon stopped");
    Ok(())
}

// ─── Server ──────────────────────────────────────────────────────────

/// Run the UDS session server.
pub async fn run_server(socket_path: &str, state: Arc<ServerState>) -> anyhow::Result<()> {
    // Create socket directory with mode 0700
    let socket_dir = Path::new(socket_path)
        .parent()
        .ok_or_else(|| anyhow::anyhow!("invalid socket path"))?;

    std::fs::create_dir_all(socket_dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(socket_dir, std::fs::Permissions::from_mode(0o700))?;
    }

    // Check for stale socket
    if Path::new(socket_path).exists() {
        if UnixStream::connect(socket_path).await.is_err() {
            std::fs::remove_file(socket_path)?;
            tracing::info!("removed stale socket at {socket_path}");
        } else {
            anyhow::bail!("another daemon is already running at {socket_path}");
        }
    }

    let listener = UnixListener::bind(socket_path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
    }

    tracing::info!("session server listening on {socket_path}");

    loop {
        let (stream, _) = listener.accept().await?;
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, state).await {
                tracing::debug!("connection error: {e}");
            }
        });
    }
}

// ─── Connection Handling ─────────────────────────────────────────────

async fn handle_connection(stream: UnixStream, state: Arc<ServerState>) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    // First frame must be a hello.
    if reader.read_line(&mut line).await? == 0 {
        return Ok(());
    }
    let (session_id, last_event_id, raw_headers) =
        match serde_json::from_str::<ClientFrame>(line.trim()) {
            Ok(ClientFrame::Hello {
                session_id,
                last_event_id,
                headers,
            }) => (session_id, last_event_id, headers),
            Ok(_) | Err(_) => {
                write_frame(
                    &mut writer,
                    &ServerFrame::Error {
                        message: "expected hello frame".to_string(),
                    },
                )
                .await?;
                return Ok(());
            }
        };

    // Normalize headers exactly once, at the transport boundary.
    let headers = Headers::from_pairs(raw_headers);

    let transport = match state.registry.resolve(session_id.as_deref()).await {
        Ok(transport) => transport,
        Err(e) => {
            tracing::info!("rejecting connection: {e}");
            write_frame(
                &mut writer,
                &ServerFrame::Error {
                    message: e.to_string(),
                },
            )
            .await?;
            return Ok(());
        }
    };

    // Attach this connection: a writer task owns the write half and drains
    // the transport's outbound stream until the sender is replaced or
    // dropped (reconnect takeover, registry teardown, or socket error).
    let mut outbound = transport.attach();
    tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            let mut encoded = match serde_json::to_string(&frame) {
                Ok(encoded) => encoded,
                Err(e) => {
                    tracing::warn!("unencodable outbound frame: {e}");
                    continue;
                }
            };
            encoded.push('\n');
            if writer.write_all(encoded.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    transport.send(ServerFrame::Session {
        session_id: transport.session_id().to_string(),
    });

    // Replay events missed while disconnected, strictly after the client's
    // checkpoint. No valid checkpoint → no backfill.
    {
        let events = state.events.lock().await;
        for event in events.replay_after(transport.session_id(), last_event_id.as_deref()) {
            transport.send(ServerFrame::Notification {
                event_id: event.id,
                payload: event.payload,
            });
        }
    }

    // Invocation loop.
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<ClientFrame>(trimmed) {
            Ok(ClientFrame::Invoke { id, tool }) => {
                handle_invoke(&state, &transport, &headers, id, &tool).await;
            }
            Ok(ClientFrame::Hello { .. }) => {
                transport.send(ServerFrame::Error {
                    message: "unexpected hello on established session".to_string(),
                });
            }
            Err(e) => {
                transport.send(ServerFrame::Error {
                    message: format!("malformed frame: {e}"),
                });
            }
        }
    }

    tracing::debug!(session_id = transport.session_id(), "connection closed");
    Ok(())
}

async fn handle_invoke(
    state: &Arc<ServerState>,
    transport: &Arc<SessionTransport>,
    headers: &Headers,
    id: u64,
    tool: &ToolRequest,
) {
    // Fresh snapshot on every gating decision. An unreadable store degrades
    // to "no campaign" → the standard denial, never a crash.
    let campaign = match state.store.load() {
        Ok(campaign) => campaign,
        Err(e) => {
            tracing::warn!("campaign store unreadable: {e}");
            None
        }
    };

    let outcome = invoker::invoke(tool, campaign.as_ref(), headers, Utc::now());

    if let Some(payload) = outcome.notification {
        schedule_notification(state, transport, payload);
    }

    transport.send(ServerFrame::Response {
        id,
        payloads: outcome.payloads,
    });
}

/// Fire-and-forget: append the notification to the session's event log and
/// deliver it over the transport. The request path does not wait.
fn schedule_notification(
    state: &Arc<ServerState>,
    transport: &Arc<SessionTransport>,
    payload: serde_json::Value,
) {
    let task_state = Arc::clone(state);
    let transport = Arc::clone(transport);
    state.dispatcher.schedule(async move {
        let event_id = {
            let mut events = task_state.events.lock().await;
            events.append(transport.session_id(), payload.clone())
        };
        if !transport.send(ServerFrame::Notification { event_id, payload }) {
            tracing::debug!(
                session_id = transport.session_id(),
                "notification not delivered, client disconnected; replay covers it"
            );
        }
    });
}

async fn write_frame(
    writer: &mut (impl AsyncWriteExt + Unpin),
    frame: &ServerFrame,
) -> anyhow::Result<()> {
    let mut encoded = serde_json::to_string(frame)?;
    encoded.push('\n');
    writer.write_all(encoded.as_bytes()).await?;
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────
