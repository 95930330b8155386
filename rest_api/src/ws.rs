// rest_api/src/ws.rs

//! Live subscription endpoint.
//!
//! A subscriber receives one `initial-data` frame on connect, then a
//! `vital-update` frame per tick. It may send `request-patient` frames at any
//! time and gets `patient-data` back for known ids.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::gateway::BroadcastGateway;
use crate::protocol::{handle_client_frame, ServerEvent};

const REPLY_QUEUE: usize = 16;

pub async fn ws_handler(State(gateway): State<BroadcastGateway>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, gateway))
}

async fn handle_socket(socket: WebSocket, gateway: BroadcastGateway) {
    let connection_id = Uuid::new_v4();
    tracing::info!(%connection_id, "Client connected");

    // Subscribe before the snapshot so no tick falls between the two.
    let mut updates_rx = gateway.subscribe();
    let (mut sender, mut receiver) = socket.split();

    let initial = gateway.get_all();
    match serde_json::to_string(&ServerEvent::InitialData(&initial)) {
        Ok(frame) => {
            if sender.send(Message::Text(frame)).await.is_err() {
                tracing::info!(%connection_id, "Client disconnected before initial data");
                return;
            }
        }
        Err(e) => tracing::warn!(error = %e, %connection_id, "Failed to encode initial data"),
    }

    let (reply_tx, mut reply_rx) = mpsc::channel::<String>(REPLY_QUEUE);

    let forward_task = tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                result = updates_rx.recv() => match result {
                    Ok(frame) => frame.to_string(),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, %connection_id, "Subscriber lagged, vital updates dropped");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                reply = reply_rx.recv() => match reply {
                    Some(frame) => frame,
                    None => break,
                },
            };
            if sender.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => {
                if let Some(reply) = handle_client_frame(&gateway, &text) {
                    if reply_tx.send(reply).await.is_err() {
                        break;
                    }
                }
            }
            Message::Binary(_) => tracing::debug!(%connection_id, "Ignoring binary frame"),
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => break,
        }
    }

    forward_task.abort();
    tracing::info!(%connection_id, "Client disconnected");
}
