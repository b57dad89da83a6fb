//! Per-connection lifecycle: register, pump frames, unregister.
//!
//! Every upgraded WebSocket gets one session task.  The task:
//!
//! 1. Splits the socket into a sink and a stream.
//! 2. Creates the connection's outbound channel and registers it with the
//!    [`ConnectionRegistry`](crate::application::ConnectionRegistry).
//! 3. Spawns a writer task that drains the channel into the sink, so a
//!    broadcast never waits on a slow socket.
//! 4. Reads frames one at a time and hands each to the
//!    [`Dispatcher`](crate::application::Dispatcher).  Frames from one
//!    connection are therefore processed in arrival order.
//! 5. On close, transport error, or server shutdown, unregisters the
//!    connection and lets the writer flush and send a Close frame.

use std::time::{Duration, Instant};

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use rfid_relay_core::ConnectionId;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::infrastructure::server::AppState;

/// How long a closing session waits for its writer to flush.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

// ── Public API ────────────────────────────────────────────────────────────────

/// Top-level handler for one WebSocket connection.
///
/// Wraps [`run_session`] and guarantees the connection is unregistered
/// whatever way the read loop ended.
pub async fn handle_session(socket: WebSocket, peer_addr: String, state: AppState) {
    let accepted_at = Instant::now();
    let (ws_tx, ws_rx) = socket.split();

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    let id = state.registry.register(peer_addr.clone(), out_tx).await;
    info!(
        "client {id} connected from {peer_addr} ({} open)",
        state.registry.size().await
    );

    let mut writer = tokio::spawn(async move {
        let mut ws_tx = ws_tx;
        while let Some(text) = out_rx.recv().await {
            if let Err(e) = ws_tx.send(Message::Text(text.into())).await {
                debug!("{id}: write failed, stopping writer: {e}");
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    match run_session(id, ws_rx, &state).await {
        Ok(()) => debug!("{id}: read loop finished"),
        Err(e) => warn!("{id}: transport error: {e}"),
    }

    // The registry holds the last long-lived sender.  Once it is gone the
    // writer flushes what is queued, sends a Close frame and exits.
    state.registry.unregister(id).await;
    if timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await.is_err() {
        debug!("{id}: writer did not drain within {WRITER_DRAIN_TIMEOUT:?}");
        writer.abort();
    }

    info!(
        "client {id} disconnected after {:.1?} ({} open, {} accepted since start)",
        accepted_at.elapsed(),
        state.registry.size().await,
        state.registry.total_accepted()
    );
}

// ── Read loop ─────────────────────────────────────────────────────────────────

/// Reads frames until the peer closes, the transport fails, or the server
/// begins shutting down.
async fn run_session(
    id: ConnectionId,
    mut ws_rx: futures_util::stream::SplitStream<WebSocket>,
    state: &AppState,
) -> Result<(), axum::Error> {
    let mut shutdown = state.subscribe_shutdown();
    if *shutdown.borrow() {
        return Ok(());
    }

    loop {
        let frame = tokio::select! {
            frame = ws_rx.next() => frame,
            _ = shutdown.changed() => {
                debug!("{id}: server shutting down");
                return Ok(());
            }
        };

        let Some(frame) = frame else {
            return Ok(());
        };

        match frame? {
            Message::Text(text) => {
                state.dispatcher.dispatch(id, text.as_str()).await;
            }
            Message::Binary(bytes) => match std::str::from_utf8(&bytes) {
                Ok(text) => {
                    state.dispatcher.dispatch(id, text).await;
                }
                Err(_) => warn!("{id}: ignoring {}-byte non-UTF-8 binary frame", bytes.len()),
            },
            // Pongs are queued by the WebSocket layer itself.
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(frame) => {
                debug!("{id}: close frame received: {frame:?}");
                return Ok(());
            }
        }
    }
}
