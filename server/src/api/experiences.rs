//! Experience endpoints, including the featured flag and the seed.
//!
//! Featuring goes through [`crate::featured::FeaturedManager`] so the
//! at-most-one invariant holds under concurrent requests.

use crate::auth::middleware::AdminSession;
use crate::error::AppError;
use crate::server::state::AppState;
use crate::types::{experience_from_document, Experience};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use obwira_core::document::{Collection, DocumentId, SortOrder};
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// Experience create/update body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceRequest {
    /// Title. Required on create.
    pub title: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Display date.
    pub date: Option<String>,
    /// Image URL.
    pub image_url: Option<String>,
}

impl ExperienceRequest {
    fn into_patch(self) -> Map<String, Value> {
        let mut patch = Map::new();
        if let Some(title) = self.title {
            patch.insert("title".to_string(), Value::String(title));
        }
        if let Some(description) = self.description {
            patch.insert("description".to_string(), Value::String(description));
        }
        if let Some(date) = self.date {
            patch.insert("date".to_string(), Value::String(date));
        }
        if let Some(image_url) = self.image_url {
            patch.insert("imageUrl".to_string(), Value::String(image_url));
        }
        patch
    }
}

/// `GET /api/experiences` — newest first.
pub async fn list(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Json<Vec<Experience>> {
    let docs = match state
        .records
        .list(Collection::Experiences, Vec::new(), SortOrder::CreatedAtDesc)
        .await
    {
        Ok(docs) => docs,
        Err(e) => {
            tracing::error!(error = %e, "experience fetch failed, returning empty list");
            Vec::new()
        },
    };
    Json(docs.iter().map(experience_from_document).collect())
}

/// `POST /api/experiences`
///
/// New experiences are never featured; featuring is a separate, guarded
/// operation.
pub async fn create(
    _admin: AdminSession,
    State(state): State<AppState>,
    Json(request): Json<ExperienceRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    match request.title.as_deref() {
        Some(t) if !t.trim().is_empty() => {},
        _ => return Err(AppError::validation("title must not be empty")),
    }
    let mut fields = request.into_patch();
    fields.insert("isFeatured".to_string(), Value::Bool(false));
    let id = state.records.create(Collection::Experiences, fields).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// `PUT /api/experiences/:id`
pub async fn update(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ExperienceRequest>,
) -> Result<Json<Value>, AppError> {
    if let Some(title) = request.title.as_deref() {
        if title.trim().is_empty() {
            return Err(AppError::validation("title must not be empty"));
        }
    }
    state
        .records
        .update(
            Collection::Experiences,
            DocumentId::from(id.as_str()),
            request.into_patch(),
        )
        .await?;
    Ok(Json(json!({ "id": id })))
}

/// `DELETE /api/experiences/:id`
pub async fn remove(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .records
        .delete(Collection::Experiences, DocumentId::from(id.as_str()))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Featured flag body.
#[derive(Debug, Deserialize)]
pub struct FeaturedRequest {
    /// Whether this experience becomes the featured one.
    pub featured: bool,
}

/// `PUT /api/experiences/:id/featured`
pub async fn set_featured(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<FeaturedRequest>,
) -> Result<Json<Value>, AppError> {
    state
        .featured
        .set_featured(DocumentId::from(id.as_str()), request.featured)
        .await?;
    Ok(Json(json!({ "id": id, "featured": request.featured })))
}

/// `POST /api/experiences/seed`
///
/// Inserts the canned defaults and features the first of them.
pub async fn seed(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let ids = state.featured.seed_defaults(Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(json!({ "created": ids }))))
}
