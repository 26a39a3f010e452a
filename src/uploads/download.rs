use std::{io::ErrorKind, sync::Arc};

use axum::{debug_handler, extract::{Path, State}, http::header, response::IntoResponse};

use crate::{AppError, AppResult, Config};

use super::is_stored_name;

/// GET /uploads/{name}
#[debug_handler(state = crate::AppState)]
pub(crate) async fn download(
    State(config): State<Arc<Config>>,
    Path(name): Path<String>,
) -> AppResult<impl IntoResponse> {
    if !is_stored_name(&name) {
        return Err(AppError::NotFound);
    }

    let data = match tokio::fs::read(config.upload_dir.join(&name)).await {
        Ok(data) => data,
        Err(err) if err.kind() == ErrorKind::NotFound => return Err(AppError::NotFound),
        Err(err) => return Err(err.into()),
    };

    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], data))
}
