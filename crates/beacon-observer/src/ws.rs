//! `WebSocket` handler for the observer push channel.
//!
//! Clients connect to `GET /ws` and are attached to the [`ObserverHub`].
//! The first frame is always a `NETWORK_UPDATE` with the current status;
//! after that the client receives every `NETWORK_UPDATE` and
//! `AUDIT_EVENT` the scheduler broadcasts while it is attached.
//!
//! Client text and binary frames are ignored. Pings are answered. A
//! close frame, a socket error, or a failed send ends the session and
//! detaches the observer.
//!
//! [`ObserverHub`]: crate::hub::ObserverHub

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tracing::debug;

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` observer session.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_observe(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Pump hub frames to the socket until either side goes away.
async fn handle_ws(socket: WebSocket, state: Arc<AppState>) {
    let (id, mut frames) = state.hub.open();
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            frame = frames.recv() => {
                let Some(text) = frame else {
                    debug!(observer = %id, "Observer queue closed by hub");
                    break;
                };
                if sink.send(Message::Text(text)).await.is_err() {
                    debug!(observer = %id, "WebSocket send failed");
                    break;
                }
            }
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(observer = %id, "WebSocket client disconnected");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sink.send(Message::Pong(data)).await.is_err() {
                            debug!(observer = %id, "WebSocket pong failed");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(observer = %id, error = %e, "WebSocket error");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.hub.detach(id);
}
