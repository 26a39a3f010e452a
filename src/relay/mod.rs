mod conn;
mod event;
mod history;
mod hub;
mod ws;

use axum::{routing::get, Router};

use crate::AppState;

pub use conn::{ConnId, Connection};
pub use event::{is_broadcast, Inbound, Message, Outbound, PresenceStatus, ALL};
pub use hub::{Registration, Relay};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::relay_ws))
        .route("/messages", get(history::messages))
}
