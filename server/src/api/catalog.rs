//! Catalog endpoints: rooms, halls, and the two menus.
//!
//! Four near-identical CRUD surfaces. Lists degrade to an empty vector on
//! fetch failure; creates require a non-empty name; menu categories are
//! validated against their menu's vocabulary.

use crate::auth::middleware::AdminSession;
use crate::error::AppError;
use crate::server::state::AppState;
use crate::types::{
    hall_from_document, menu_item_from_document, room_from_document, Hall, MenuItem, Room,
    BAR_CATEGORIES, RESTAURANT_CATEGORIES,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use obwira_core::document::{Collection, Document, DocumentId, SortOrder};
use obwira_core::record_store::RecordStore;
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// Lists a collection, degrading to empty on failure.
async fn fetch_or_empty(
    records: &dyn RecordStore,
    collection: Collection,
    order: SortOrder,
) -> Vec<Document> {
    match records.list(collection, Vec::new(), order).await {
        Ok(docs) => docs,
        Err(e) => {
            tracing::error!(collection = %collection, error = %e, "catalog fetch failed, returning empty list");
            Vec::new()
        },
    }
}

fn require_name(name: Option<&str>) -> Result<String, AppError> {
    match name {
        Some(n) if !n.trim().is_empty() => Ok(n.to_string()),
        _ => Err(AppError::validation("name must not be empty")),
    }
}

fn check_category(category: &str, allowed: &[&str], menu: &str) -> Result<(), AppError> {
    if allowed.contains(&category) {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "unknown {menu} category '{category}', expected one of {}",
            allowed.join(", ")
        )))
    }
}

/// Inserts `field: value` into the patch when the value is present.
fn put_opt(patch: &mut Map<String, Value>, field: &str, value: Option<impl Into<Value>>) {
    if let Some(v) = value {
        patch.insert(field.to_string(), v.into());
    }
}

// ---------------------------------------------------------------------------
// Rooms
// ---------------------------------------------------------------------------

/// Room create/update body. Every field is optional on update.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRequest {
    /// Display name. Required on create.
    pub name: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Maximum occupancy.
    pub capacity: Option<i64>,
    /// Nightly rate.
    pub price_per_night: Option<f64>,
    /// Gallery image URLs.
    pub images: Option<Vec<String>>,
}

impl RoomRequest {
    fn into_patch(self) -> Map<String, Value> {
        let mut patch = Map::new();
        put_opt(&mut patch, "name", self.name);
        put_opt(&mut patch, "description", self.description);
        put_opt(&mut patch, "capacity", self.capacity);
        put_opt(&mut patch, "pricePerNight", self.price_per_night);
        if let Some(images) = self.images {
            patch.insert("images".to_string(), json!(images));
        }
        patch
    }
}

/// `GET /api/rooms`
pub async fn list_rooms(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Json<Vec<Room>> {
    let docs = fetch_or_empty(state.records.as_ref(), Collection::Rooms, SortOrder::Unordered).await;
    Json(docs.iter().map(room_from_document).collect())
}

/// `POST /api/rooms`
pub async fn create_room(
    _admin: AdminSession,
    State(state): State<AppState>,
    Json(request): Json<RoomRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_name(request.name.as_deref())?;
    let id = state
        .records
        .create(Collection::Rooms, request.into_patch())
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// `PUT /api/rooms/:id`
pub async fn update_room(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RoomRequest>,
) -> Result<Json<Value>, AppError> {
    if let Some(name) = request.name.as_deref() {
        require_name(Some(name))?;
    }
    state
        .records
        .update(
            Collection::Rooms,
            DocumentId::from(id.as_str()),
            request.into_patch(),
        )
        .await?;
    Ok(Json(json!({ "id": id })))
}

/// `DELETE /api/rooms/:id`
pub async fn delete_room(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .records
        .delete(Collection::Rooms, DocumentId::from(id.as_str()))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Halls
// ---------------------------------------------------------------------------

/// Hall create/update body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HallRequest {
    /// Display name. Required on create.
    pub name: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Hourly rate.
    pub price_per_hour: Option<f64>,
    /// Maximum occupancy.
    pub capacity: Option<i64>,
    /// Image URL.
    pub image_url: Option<String>,
}

impl HallRequest {
    fn into_patch(self) -> Map<String, Value> {
        let mut patch = Map::new();
        put_opt(&mut patch, "name", self.name);
        put_opt(&mut patch, "description", self.description);
        put_opt(&mut patch, "pricePerHour", self.price_per_hour);
        put_opt(&mut patch, "capacity", self.capacity);
        put_opt(&mut patch, "imageUrl", self.image_url);
        patch
    }
}

/// `GET /api/halls` — newest first.
pub async fn list_halls(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Json<Vec<Hall>> {
    let docs = fetch_or_empty(
        state.records.as_ref(),
        Collection::Halls,
        SortOrder::CreatedAtDesc,
    )
    .await;
    Json(docs.iter().map(hall_from_document).collect())
}

/// `POST /api/halls`
pub async fn create_hall(
    _admin: AdminSession,
    State(state): State<AppState>,
    Json(request): Json<HallRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_name(request.name.as_deref())?;
    let id = state
        .records
        .create(Collection::Halls, request.into_patch())
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// `PUT /api/halls/:id`
pub async fn update_hall(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<HallRequest>,
) -> Result<Json<Value>, AppError> {
    if let Some(name) = request.name.as_deref() {
        require_name(Some(name))?;
    }
    state
        .records
        .update(
            Collection::Halls,
            DocumentId::from(id.as_str()),
            request.into_patch(),
        )
        .await?;
    Ok(Json(json!({ "id": id })))
}

/// `DELETE /api/halls/:id`
pub async fn delete_hall(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .records
        .delete(Collection::Halls, DocumentId::from(id.as_str()))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Menus
// ---------------------------------------------------------------------------

/// Menu item create/update body, shared by both menus.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemRequest {
    /// Dish or drink name. Required on create.
    pub name: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Price.
    pub price: Option<f64>,
    /// Menu section. Validated against the menu's vocabulary.
    pub category: Option<String>,
    /// Image URL.
    pub image_url: Option<String>,
}

impl MenuItemRequest {
    fn into_patch(self) -> Map<String, Value> {
        let mut patch = Map::new();
        put_opt(&mut patch, "name", self.name);
        put_opt(&mut patch, "description", self.description);
        put_opt(&mut patch, "price", self.price);
        put_opt(&mut patch, "category", self.category);
        put_opt(&mut patch, "imageUrl", self.image_url);
        patch
    }
}

async fn list_menu(state: &AppState, collection: Collection) -> Json<Vec<MenuItem>> {
    let docs = fetch_or_empty(state.records.as_ref(), collection, SortOrder::Unordered).await;
    Json(docs.iter().map(menu_item_from_document).collect())
}

async fn create_menu_item(
    state: &AppState,
    collection: Collection,
    allowed: &[&str],
    menu: &str,
    request: MenuItemRequest,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_name(request.name.as_deref())?;
    if let Some(category) = request.category.as_deref() {
        check_category(category, allowed, menu)?;
    }
    let id = state.records.create(collection, request.into_patch()).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn update_menu_item(
    state: &AppState,
    collection: Collection,
    allowed: &[&str],
    menu: &str,
    id: String,
    request: MenuItemRequest,
) -> Result<Json<Value>, AppError> {
    if let Some(name) = request.name.as_deref() {
        require_name(Some(name))?;
    }
    if let Some(category) = request.category.as_deref() {
        check_category(category, allowed, menu)?;
    }
    state
        .records
        .update(collection, DocumentId::from(id.as_str()), request.into_patch())
        .await?;
    Ok(Json(json!({ "id": id })))
}

async fn delete_menu_item(
    state: &AppState,
    collection: Collection,
    id: String,
) -> Result<StatusCode, AppError> {
    state
        .records
        .delete(collection, DocumentId::from(id.as_str()))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/restaurant-menu`
pub async fn list_restaurant_menu(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Json<Vec<MenuItem>> {
    list_menu(&state, Collection::RestaurantMenu).await
}

/// `POST /api/restaurant-menu`
pub async fn create_restaurant_item(
    _admin: AdminSession,
    State(state): State<AppState>,
    Json(request): Json<MenuItemRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    create_menu_item(
        &state,
        Collection::RestaurantMenu,
        &RESTAURANT_CATEGORIES,
        "restaurant menu",
        request,
    )
    .await
}

/// `PUT /api/restaurant-menu/:id`
pub async fn update_restaurant_item(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<MenuItemRequest>,
) -> Result<Json<Value>, AppError> {
    update_menu_item(
        &state,
        Collection::RestaurantMenu,
        &RESTAURANT_CATEGORIES,
        "restaurant menu",
        id,
        request,
    )
    .await
}

/// `DELETE /api/restaurant-menu/:id`
pub async fn delete_restaurant_item(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    delete_menu_item(&state, Collection::RestaurantMenu, id).await
}

/// `GET /api/bar-menu`
pub async fn list_bar_menu(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Json<Vec<MenuItem>> {
    list_menu(&state, Collection::BarMenu).await
}

/// `POST /api/bar-menu`
pub async fn create_bar_item(
    _admin: AdminSession,
    State(state): State<AppState>,
    Json(request): Json<MenuItemRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    create_menu_item(
        &state,
        Collection::BarMenu,
        &BAR_CATEGORIES,
        "bar menu",
        request,
    )
    .await
}

/// `PUT /api/bar-menu/:id`
pub async fn update_bar_item(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<MenuItemRequest>,
) -> Result<Json<Value>, AppError> {
    update_menu_item(
        &state,
        Collection::BarMenu,
        &BAR_CATEGORIES,
        "bar menu",
        id,
        request,
    )
    .await
}

/// `DELETE /api/bar-menu/:id`
pub async fn delete_bar_item(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    delete_menu_item(&state, Collection::BarMenu, id).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn patch_skips_absent_fields() {
        let request = RoomRequest {
            name: Some("Suite".to_string()),
            description: None,
            capacity: Some(3),
            price_per_night: None,
            images: None,
        };
        let patch = request.into_patch();
        assert_eq!(patch.len(), 2);
        assert_eq!(patch["name"], "Suite");
        assert_eq!(patch["capacity"], 3);
    }

    #[test]
    fn category_check_rejects_foreign_vocabulary() {
        assert!(check_category("main", &RESTAURANT_CATEGORIES, "restaurant menu").is_ok());
        assert!(check_category("signature", &RESTAURANT_CATEGORIES, "restaurant menu").is_err());
        assert!(check_category("signature", &BAR_CATEGORIES, "bar menu").is_ok());
    }

    #[test]
    fn name_validation_rejects_whitespace() {
        assert!(require_name(Some("Atrium")).is_ok());
        assert!(require_name(Some("   ")).is_err());
        assert!(require_name(None).is_err());
    }
}
