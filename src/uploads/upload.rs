use std::sync::Arc;

use axum::{debug_handler, extract::{Multipart, State}, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::{AppError, AppResult, Config};

use super::PREFIX;

#[derive(Debug, Serialize)]
pub struct Uploaded {
    /// Opaque reference a client puts into `Message::file_ref`.
    pub url: String,
    pub originalname: Option<String>,
}

/// POST /upload, multipart field `file`.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn upload(
    State(config): State<Arc<Config>>,
    mut multipart: Multipart,
) -> AppResult<Json<Uploaded>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let originalname = field.file_name().map(str::to_owned);
        let data = field.bytes().await?;

        let name = Uuid::now_v7().simple().to_string();
        tokio::fs::create_dir_all(&config.upload_dir).await?;
        tokio::fs::write(config.upload_dir.join(&name), &data).await?;

        tracing::info!(name = %name, original = ?originalname, bytes = data.len(), "stored upload");

        return Ok(Json(Uploaded {
            url: format!("{PREFIX}/{name}"),
            originalname,
        }));
    }

    Err(AppError::BadRequest("No file".to_owned()))
}
