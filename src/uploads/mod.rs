mod download;
mod upload;

use axum::{extract::DefaultBodyLimit, routing::{get, post}, Router};

use crate::AppState;

pub use upload::Uploaded;

/// URL prefix stored uploads are served from.
pub const PREFIX: &str = "/uploads";

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload::upload))
        .route("/uploads/{name}", get(download::download))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// Stored names are bare UUIDs; anything else can't have come from us and
/// might point outside the upload directory.
pub(crate) fn is_stored_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric())
}
