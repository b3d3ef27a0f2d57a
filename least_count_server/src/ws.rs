//! WebSocket connection driver.
//!
//! Each WebSocket text frame carries exactly one JSON message, so a logical
//! message can never be split or merged across reads.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{stream::StreamExt, SinkExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use least_count_core::{ClientMessage, ServerMessage};

use crate::table::{TableHandle, OUTBOX_CAPACITY};

/// Inbound frames above this size are refused by the transport.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
pub struct JoinParams {
    #[serde(default)]
    pub name: String,
}

pub fn router(table: TableHandle) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .with_state(table)
}

/// Handles the WebSocket upgrade. Connecting is the join attempt.
async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<JoinParams>,
    State(table): State<TableHandle>,
) -> impl IntoResponse {
    ws.max_message_size(MAX_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_socket(socket, table, params.name))
}

/// Drives one connection from join to leave.
async fn handle_socket(socket: WebSocket, table: TableHandle, nickname: String) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(OUTBOX_CAPACITY);

    // The writer owns the socket's sink; the table only ever enqueues.
    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let payload = match serde_json::to_string(&msg) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("failed to encode message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    let player_id = Uuid::new_v4();
    if let Err(e) = table.join(player_id, nickname, tx.clone()).await {
        let _ = tx.send(ServerMessage::Error { message: e.to_string() }).await;
        drop(tx);
        let _ = writer.await;
        return;
    }
    info!(%player_id, "client connected");

    // From here on only the table holds a strong sender, so when the table
    // drops this player the writer drains, closes the socket and ends.
    let replies = tx.downgrade();
    drop(tx);

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    if table.act(player_id, client_msg).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(%player_id, "failed to parse message: {}", e);
                    if let Some(tx) = replies.upgrade() {
                        let _ = tx.send(ServerMessage::Error { message: format!("malformed message: {e}") }).await;
                    }
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    let _ = table.leave(player_id).await;
    let _ = writer.await;
    info!(%player_id, "client connection closed");
}
