use std::sync::Arc;

use axum::{debug_handler, extract::{ws::{Message as WsMessage, WebSocket}, State, WebSocketUpgrade}, response::IntoResponse};
use futures_util::{SinkExt, StreamExt};

use crate::Config;

use super::{conn::Connection, event::Inbound, hub::Relay};

#[debug_handler(state = crate::AppState)]
pub async fn relay_ws(
    State(relay): State<Arc<Relay>>,
    State(config): State<Arc<Config>>,

    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let capacity = config.send_queue_capacity;
    ws.on_upgrade(async move |stream| serve(relay, stream, capacity).await)
}

/// Pumps one socket until either side hangs up, then drops it from the registry.
pub(crate) async fn serve(relay: Arc<Relay>, stream: WebSocket, capacity: usize) {
    let (conn, mut rx) = Connection::channel(relay.next_conn_id(), capacity);
    let conn_id = conn.id();
    tracing::info!(conn = %conn_id, "connected");

    let (mut sender, mut receiver) = stream.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match event.to_json() {
                Ok(json) => json,
                Err(err) => {
                    tracing::warn!(conn = %conn_id, error = %err, "failed to encode event");
                    continue;
                }
            };
            if sender.send(WsMessage::text(json)).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let relay = relay.clone();
        async move {
            while let Some(Ok(frame)) = receiver.next().await {
                let payload = match frame {
                    WsMessage::Text(text) => text,
                    WsMessage::Close(_) => break,
                    _ => continue,
                };
                let Some(inbound) = Inbound::parse(payload.as_str().as_bytes()) else {
                    continue;
                };
                dispatch(&relay, &conn, inbound);
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    };

    relay.unregister(conn_id);
    tracing::info!(conn = %conn_id, "disconnected");
}

fn dispatch(relay: &Relay, conn: &Connection, inbound: Inbound) {
    match inbound {
        Inbound::Register { user_id, name } => {
            relay.register(&user_id, name, conn.clone());
        }
        Inbound::Message(message) => {
            relay.route(message);
        }
        Inbound::Typing { from, to } => {
            relay.relay_typing(&from, to.as_deref());
        }
    }
}
