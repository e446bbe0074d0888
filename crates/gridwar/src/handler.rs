//! Per-connection handler: admission, event delivery, and intent routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Read the upgrade path → pairing, new session, a session id, or an
//!      info lookup (answered once, then closed)
//!   2. Seat the player through the registry → cache the session handle
//!   3. Spawn a writer task that encodes events onto the socket
//!   4. Loop: decode intents → forward to the session actor

use std::sync::Arc;

use gridwar_protocol::{
    ClientIntent, Codec, PlayerSlot, ProtocolError, RejectReason, ServerEvent, SessionId,
};
use gridwar_registry::{PlayerSender, RegistryError, SessionHandle, SessionInfo};
use gridwar_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::GridwarError;
use crate::server::ServerState;

/// What the client asked for in the upgrade path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Route {
    /// `/ws`, `/ws/` or `/ws/match`: pair with whoever is waiting.
    Pair,
    /// `/ws/new`: open a session others join by id.
    New,
    /// `/ws/{session_id}`
    Join(SessionId),
    /// `/ws/{session_id}/info`: one `session_info` event, then close.
    Info(SessionId),
}

pub(crate) fn parse_route(path: &str) -> Option<Route> {
    match path.strip_prefix("/ws")? {
        "" | "/" | "/match" => Some(Route::Pair),
        "/new" => Some(Route::New),
        rest => {
            let tail = rest.strip_prefix('/')?;
            match tail.split_once('/') {
                None => Some(Route::Join(SessionId::from(tail))),
                Some((id, "info")) if !id.is_empty() => Some(Route::Info(SessionId::from(id))),
                Some(_) => None,
            }
        }
    }
}

/// Drop guard that reports the disconnect to the session when the handler
/// exits, even on an early return.
///
/// `Drop` is synchronous, so the async send runs in a spawned task.
struct ConnectionGuard {
    handle: SessionHandle,
    slot: PlayerSlot,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let handle = self.handle.clone();
        let slot = self.slot;
        tokio::spawn(async move {
            let _ = handle.disconnect(slot).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), GridwarError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, path = conn.path(), "handling new connection");

    let Some(route) = parse_route(conn.path()) else {
        let err = ProtocolError::InvalidMessage(format!("unknown path {}", conn.path()));
        tracing::info!(%conn_id, error = %err, "connection refused");
        refuse(&conn, &state.codec, RejectReason::InvalidMessage, err.to_string()).await?;
        return Ok(());
    };

    if let Route::Info(session_id) = &route {
        let event = match describe(&state, session_id).await {
            Ok(info) => ServerEvent::from(info),
            Err(e) => ServerEvent::Error {
                reason: e.reason(),
                message: e.to_string(),
            },
        };
        send_event(&conn, &state.codec, &event).await?;
        conn.close().await?;
        return Ok(());
    }

    // --- Step 1: Admission ---
    let (tx, rx) = mpsc::unbounded_channel();
    let (session_id, slot, handle) = match admit(&state, route, tx.clone()).await {
        Ok(admitted) => admitted,
        Err(e) => {
            tracing::info!(%conn_id, error = %e, "admission refused");
            refuse(&conn, &state.codec, e.reason(), e.to_string()).await?;
            return Ok(());
        }
    };
    tracing::info!(%conn_id, %session_id, player = %slot, "player connected");

    let _guard = ConnectionGuard {
        handle: handle.clone(),
        slot,
    };

    // --- Step 2: Outbound events ---
    tokio::spawn(write_events(Arc::clone(&conn), Arc::clone(&state), rx));

    // --- Step 3: Intent loop ---
    loop {
        let received = match state.idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, conn.recv()).await {
                Ok(received) => received,
                Err(_) => {
                    tracing::info!(%conn_id, %session_id, player = %slot, "connection timed out");
                    let _ = conn.close().await;
                    break;
                }
            },
            None => conn.recv().await,
        };

        let data = match received {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, %session_id, player = %slot, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let intent: ClientIntent = match state.codec.decode(&data) {
            Ok(intent) => intent,
            Err(e) => {
                tracing::debug!(%conn_id, player = %slot, error = %e, "failed to decode intent");
                let _ = tx.send(ServerEvent::Error {
                    reason: RejectReason::InvalidMessage,
                    message: e.to_string(),
                });
                continue;
            }
        };

        if let Err(e) = handle.send_intent(slot, intent).await {
            tracing::debug!(%conn_id, error = %e, "session unavailable");
            let _ = tx.send(ServerEvent::Error {
                reason: e.reason(),
                message: e.to_string(),
            });
            break;
        }
    }

    // _guard drops here → the session hears about the disconnect and
    // releases its sink, which ends the writer task.
    Ok(())
}

/// Sends a single `error` event and closes the connection.
async fn refuse<C: Codec>(
    conn: &WebSocketConnection,
    codec: &C,
    reason: RejectReason,
    message: String,
) -> Result<(), GridwarError> {
    send_event(conn, codec, &ServerEvent::Error { reason, message }).await?;
    conn.close().await?;
    Ok(())
}

/// Looks up a session's metadata. The registry lock is released before
/// the session actor is asked.
async fn describe<C: Codec>(
    state: &ServerState<C>,
    session_id: &SessionId,
) -> Result<SessionInfo, RegistryError> {
    let handle = state
        .registry
        .lock()
        .await
        .handle(session_id)
        .ok_or_else(|| RegistryError::NotFound(session_id.clone()))?;
    handle.get_info().await
}

/// Seats the player according to `route`.
///
/// The registry lock is held for the whole admission so two pairing
/// requests can't both open a session.
async fn admit<C: Codec>(
    state: &ServerState<C>,
    route: Route,
    sink: PlayerSender,
) -> Result<(SessionId, PlayerSlot, SessionHandle), RegistryError> {
    let mut registry = state.registry.lock().await;
    match route {
        Route::Pair => {
            registry
                .join_or_create(state.game_config.clone(), sink)
                .await
        }
        Route::New => {
            let session_id = registry.create_session(state.game_config.clone());
            let (slot, handle) = registry.join(&session_id, sink).await?;
            Ok((session_id, slot, handle))
        }
        Route::Join(session_id) => {
            let (slot, handle) = registry.join(&session_id, sink).await?;
            Ok((session_id, slot, handle))
        }
        // Answered before admission; never seats anyone.
        Route::Info(session_id) => Err(RegistryError::NotFound(session_id)),
    }
}

/// Drains the player's event channel onto the socket until either side
/// goes away.
async fn write_events<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
) {
    while let Some(event) = rx.recv().await {
        if let Err(e) = send_event(&conn, &state.codec, &event).await {
            tracing::debug!(conn_id = %conn.id(), error = %e, "send failed, stopping writer");
            break;
        }
    }
}

/// Encodes one event and sends it, as a text frame when the codec
/// produces text.
async fn send_event<C: Codec>(
    conn: &WebSocketConnection,
    codec: &C,
    event: &ServerEvent,
) -> Result<(), GridwarError> {
    let bytes = codec.encode(event)?;
    match std::str::from_utf8(&bytes) {
        Ok(text) if codec.is_text() => conn.send_text(text).await?,
        _ => conn.send(&bytes).await?,
    }
    Ok(())
}
