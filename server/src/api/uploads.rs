//! Image upload endpoint.

use crate::auth::middleware::AdminSession;
use crate::error::AppError;
use crate::server::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use chrono::Utc;
use obwira_core::blob_store::BlobKey;
use serde_json::{json, Value};

fn valid_category(category: &str) -> bool {
    !category.is_empty()
        && category
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// `POST /api/uploads/:category`
///
/// Takes the first multipart field that carries a filename, stores it, and
/// returns the public URL. The category becomes the storage prefix, so it
/// is restricted to a conservative character set.
pub async fn upload(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(category): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    if !valid_category(&category) {
        return Err(AppError::bad_request(format!(
            "invalid upload category '{category}'"
        )));
    }

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("malformed multipart body: {e}")))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::bad_request(format!("failed to read upload: {e}")))?;
        if bytes.is_empty() {
            return Err(AppError::validation("uploaded file is empty"));
        }

        let key = BlobKey::new(&category, Utc::now(), &filename);
        let size = bytes.len();
        let url = state.blobs.put(key, bytes.to_vec()).await?;
        tracing::info!(category = %category, size, "upload stored");
        return Ok(Json(json!({ "url": url })));
    }

    Err(AppError::validation("no file field in upload"))
}
