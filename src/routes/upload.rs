//! Upload route — multipart file intake for audio and image input.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::Json;
use tracing::info;
use uuid::Uuid;

use crate::services::conversation::MAX_UPLOAD_BYTES;
use crate::state::AppState;

type ErrorBody = (StatusCode, Json<serde_json::Value>);

fn error_body(status: StatusCode, message: &str) -> ErrorBody {
    (status, Json(serde_json::json!({ "error": message })))
}

/// `POST /api/upload` — store the `file` multipart field in the uploads
/// directory and return its served URL.
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<serde_json::Value>, ErrorBody> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| error_body(StatusCode::BAD_REQUEST, &e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| error_body(StatusCode::BAD_REQUEST, &e.to_string()))?;
        if bytes.len() as u64 > MAX_UPLOAD_BYTES {
            return Err(error_body(StatusCode::BAD_REQUEST, "File size must be less than 25MB"));
        }

        let stored = format!("{}-{}", Uuid::new_v4(), sanitize_filename(&filename));
        tokio::fs::write(state.uploads_dir.join(&stored), &bytes)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "upload: write failed");
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            })?;

        info!(file = %stored, size = bytes.len(), "upload: file stored");
        return Ok(Json(serde_json::json!({ "fileUrl": format!("/uploads/{stored}") })));
    }

    Err(error_body(StatusCode::BAD_REQUEST, "missing file field"))
}

/// Keep stored names flat and shell-safe; everything else becomes `_`.
pub(crate) fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect()
}

#[cfg(test)]
#[path = "upload_test.rs"]
mod tests;
