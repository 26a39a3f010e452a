use std::sync::Arc;

use axum::{debug_handler, extract::State, Json};

use super::{event::Message, hub::Relay};

/// Everything routed so far, oldest first. Clients call this once on startup.
#[debug_handler(state = crate::AppState)]
pub async fn messages(State(relay): State<Arc<Relay>>) -> Json<Vec<Message>> {
    Json(relay.history())
}
