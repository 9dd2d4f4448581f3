//! services/api/src/web/ws_handler.rs
//!
//! WebSocket endpoint. Connections are registered with the broadcast hub and
//! receive server-pushed notifications (e.g. import status updates); inbound
//! messages are not acted on.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::info;

use crate::web::state::AppState;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (listener_id, mut hub_rx) = state.hub.connect().await;
    info!("WebSocket listener {} connected", listener_id);

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            // Forward hub messages to the socket.
            maybe_msg = hub_rx.recv() => {
                match maybe_msg {
                    Some(msg) => {
                        if sender.send(Message::Text(msg.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            // Drain inbound frames; the server does not act on them, but a
            // close (or error) ends the connection.
            inbound = receiver.next() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }

    state.hub.disconnect(listener_id).await;
    info!("WebSocket listener {} disconnected", listener_id);
}
