//! Router configuration.
//!
//! Builds the complete Axum router with all endpoints.

use super::health::{health_check, readiness_check};
use super::state::AppState;
use crate::api::{catalog, experiences, notifications, reservations, stats, uploads};
use crate::auth::handlers as auth_handlers;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the complete Axum router.
///
/// # Arguments
///
/// - `state`: Application state to share with handlers
///
/// # Returns
///
/// Configured Axum router ready to serve requests.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Reservations (merged view over the three booking collections)
        .route("/reservations", get(reservations::list))
        .route("/reservations/:id", get(reservations::detail))
        .route("/reservations/:id/status", put(reservations::update_status))
        // Dashboard
        .route("/dashboard/stats", get(stats::dashboard_stats))
        // Notification feed
        .route("/notifications", get(notifications::feed))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/notifications/:id/read", post(notifications::mark_read))
        // Rooms
        .route("/rooms", get(catalog::list_rooms).post(catalog::create_room))
        .route(
            "/rooms/:id",
            put(catalog::update_room).delete(catalog::delete_room),
        )
        // Halls
        .route("/halls", get(catalog::list_halls).post(catalog::create_hall))
        .route(
            "/halls/:id",
            put(catalog::update_hall).delete(catalog::delete_hall),
        )
        // Restaurant menu
        .route(
            "/restaurant-menu",
            get(catalog::list_restaurant_menu).post(catalog::create_restaurant_item),
        )
        .route(
            "/restaurant-menu/:id",
            put(catalog::update_restaurant_item).delete(catalog::delete_restaurant_item),
        )
        // Bar menu
        .route(
            "/bar-menu",
            get(catalog::list_bar_menu).post(catalog::create_bar_item),
        )
        .route(
            "/bar-menu/:id",
            put(catalog::update_bar_item).delete(catalog::delete_bar_item),
        )
        // Experiences
        .route(
            "/experiences",
            get(experiences::list).post(experiences::create),
        )
        .route(
            "/experiences/:id",
            put(experiences::update).delete(experiences::remove),
        )
        .route("/experiences/:id/featured", put(experiences::set_featured))
        .route("/experiences/seed", post(experiences::seed))
        // Uploads
        .route("/uploads/:category", post(uploads::upload));

    Router::new()
        // Health checks (no authentication)
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // Authentication
        .route("/auth/login", post(auth_handlers::post_login))
        .route("/auth/logout", post(auth_handlers::post_logout))
        .route("/auth/me", get(auth_handlers::get_me))
        // API routes under /api prefix
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
