use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use tictactoe_protocol::{ClientToServer, ServerToClient};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::relay::{short, Relay};

pub async fn ws_handler(ws: WebSocketUpgrade, State(relay): State<Relay>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, relay))
}

async fn handle_socket(socket: WebSocket, relay: Relay) {
    let (mut sender, mut receiver) = socket.split();

    let (tx_out, mut rx_out) = tokio::sync::mpsc::unbounded_channel::<ServerToClient>();

    tokio::spawn(async move {
        while let Some(msg) = rx_out.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(err) => {
                    error!(%err, "failed to encode outbound message");
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let my_id = Uuid::new_v4();
    relay.connect(my_id, tx_out.clone());

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(t) => match serde_json::from_str::<ClientToServer>(&t) {
                Ok(cmd) => {
                    debug!(connection = %short(my_id), ?cmd, "received");
                    if let Err(err) = relay.dispatch(my_id, cmd) {
                        warn!(connection = %short(my_id), %err, "rejected");
                        let _ = tx_out.send(ServerToClient::Error {
                            message: err.to_string(),
                        });
                    }
                }
                Err(err) => {
                    warn!(connection = %short(my_id), %err, "bad json");
                    let _ = tx_out.send(ServerToClient::Error {
                        message: format!("bad json: {err}"),
                    });
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    // Covers clean closes as well as dropped sockets.
    relay.disconnect(my_id);
}
