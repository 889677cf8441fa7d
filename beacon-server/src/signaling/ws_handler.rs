use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

use beacon_core::{ClientMessage, ConnectionId};

use crate::signaling::RelayService;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(relay): State<Arc<RelayService>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, relay))
}

async fn handle_socket(socket: WebSocket, relay: Arc<RelayService>) {
    let connection_id = ConnectionId::new();
    info!(%connection_id, "new websocket connection");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    relay.connect(connection_id, tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let relay = relay.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    // Each message is handled to completion before the next
                    // one from this connection is read.
                    Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(message) => relay.handle_message(connection_id, message).await,
                        Err(e) => {
                            warn!(%connection_id, error = %e, "invalid client message")
                        }
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    relay.handle_disconnect(connection_id).await;
    info!(%connection_id, "websocket disconnected");
}
