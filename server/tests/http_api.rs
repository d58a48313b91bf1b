//! End-to-end HTTP tests over the in-memory stores.

#![allow(clippy::unwrap_used)]

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use chrono::{Duration, TimeZone, Utc};
use obwira_core::document::{Collection, Document, DocumentId};
use obwira_core::record_store::RecordStore;
use obwira_server::auth::{hash_password, SessionRegistry};
use obwira_server::featured::FeaturedManager;
use obwira_server::notifications::{
    spawn_feed_subscription, FeedEnvironment, FeedReducer, FeedState, FeedStore,
};
use obwira_server::server::{build_router, AppState};
use obwira_testing::{InMemoryBlobStore, InMemoryRecordStore};
use serde_json::{json, Map, Value};
use std::sync::Arc;

fn doc(id: &str, fields: Value) -> Document {
    let Value::Object(map) = fields else {
        unreachable!("test documents are objects")
    };
    Document::new(DocumentId::new(id), map)
}

fn object(fields: Value) -> Map<String, Value> {
    let Value::Object(map) = fields else {
        unreachable!("test fields are objects")
    };
    map
}

struct TestApp {
    server: TestServer,
    records: Arc<InMemoryRecordStore>,
}

fn build_app() -> TestApp {
    let records = Arc::new(InMemoryRecordStore::new());
    let records_dyn: Arc<dyn obwira_core::record_store::RecordStore> = records.clone();

    let feed: FeedStore = FeedStore::new(
        FeedState::default(),
        FeedReducer,
        FeedEnvironment {
            records: records_dyn.clone(),
        },
    );
    spawn_feed_subscription(records_dyn.clone(), feed.clone());

    let state = AppState::new(
        records_dyn.clone(),
        Arc::new(InMemoryBlobStore::new()),
        Arc::new(SessionRegistry::new(Duration::hours(8))),
        feed,
        Arc::new(FeaturedManager::new(records_dyn)),
    );

    let server = TestServer::new(build_router(state)).unwrap();
    TestApp { server, records }
}

async fn seed_admin(records: &InMemoryRecordStore) {
    records
        .seed(
            Collection::Users,
            doc(
                "admin1",
                json!({
                    "email": "manager@obwira.example",
                    "passwordHash": hash_password("hunter2"),
                    "role": "admin",
                    "fullName": "Night Manager"
                }),
            ),
        )
        .await;
}

async fn login(app: &TestApp) -> String {
    seed_admin(&app.records).await;
    let response = app
        .server
        .post("/auth/login")
        .json(&json!({ "email": "manager@obwira.example", "password": "hunter2" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn login_rejects_wrong_password_and_non_admin() {
    let app = build_app();
    seed_admin(&app.records).await;
    app.records
        .seed(
            Collection::Users,
            doc(
                "guest1",
                json!({
                    "email": "guest@obwira.example",
                    "passwordHash": hash_password("letmein"),
                    "role": "guest"
                }),
            ),
        )
        .await;

    let response = app
        .server
        .post("/auth/login")
        .json(&json!({ "email": "manager@obwira.example", "password": "wrong" }))
        .await;
    response.assert_status_unauthorized();

    let response = app
        .server
        .post("/auth/login")
        .json(&json!({ "email": "guest@obwira.example", "password": "letmein" }))
        .await;
    response.assert_status_unauthorized();

    let response = app
        .server
        .post("/auth/login")
        .json(&json!({ "email": "manager@obwira.example", "password": "hunter2" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["user"]["fullName"], "Night Manager");
}

#[tokio::test]
async fn logout_invalidates_the_token() {
    let app = build_app();
    let token = login(&app).await;

    app.server
        .get("/auth/me")
        .authorization_bearer(&token)
        .await
        .assert_status_ok();

    app.server
        .post("/auth/logout")
        .authorization_bearer(&token)
        .await
        .assert_status(http::StatusCode::NO_CONTENT);

    app.server
        .get("/auth/me")
        .authorization_bearer(&token)
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn api_requires_a_bearer_token() {
    let app = build_app();
    app.server
        .get("/api/reservations")
        .await
        .assert_status_unauthorized();
    app.server
        .get("/api/dashboard/stats")
        .authorization_bearer("bogus")
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn reservations_merge_filter_and_update() {
    let app = build_app();
    let token = login(&app).await;
    let base = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();

    app.records
        .seed(
            Collection::Bookings,
            doc("room1", json!({ "status": "confirmé", "guests": 2, "userId": "guest1" }))
                .with_created_at(base),
        )
        .await;
    app.records
        .seed(
            Collection::RestaurantBookings,
            doc("rest1", json!({ "guests": 4 })).with_created_at(base + Duration::hours(2)),
        )
        .await;
    app.records
        .seed(
            Collection::ShuttleBookings,
            doc("shut1", json!({ "passengers": 1, "luggage": 2 })),
        )
        .await;

    let response = app
        .server
        .get("/api/reservations")
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    let bookings: Vec<Value> = response.json();
    assert_eq!(bookings.len(), 3);
    // Newest first; the unstamped shuttle booking sorts last.
    assert_eq!(bookings[0]["id"], "rest1");
    assert_eq!(bookings[0]["status"], "pending");
    assert_eq!(bookings[1]["id"], "room1");
    assert_eq!(bookings[1]["status"], "confirmed");
    assert_eq!(bookings[2]["type"], "shuttle");

    let response = app
        .server
        .get("/api/reservations")
        .add_query_param("type", "room")
        .authorization_bearer(&token)
        .await;
    let rooms: Vec<Value> = response.json();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0]["id"], "room1");

    app.server
        .get("/api/reservations")
        .add_query_param("type", "spa")
        .authorization_bearer(&token)
        .await
        .assert_status_bad_request();

    let response = app
        .server
        .put("/api/reservations/room1/status")
        .authorization_bearer(&token)
        .json(&json!({ "type": "room", "status": "cancelled" }))
        .await;
    response.assert_status_ok();
    let stored = app
        .records
        .get(Collection::Bookings, DocumentId::new("room1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.str_field("status"), Some("cancelled"));
}

#[tokio::test]
async fn reservation_detail_resolves_the_guest() {
    let app = build_app();
    let token = login(&app).await;

    app.records
        .seed(
            Collection::Users,
            doc("guest7", json!({ "fullName": "Ada Guest", "email": "ada@example.com" })),
        )
        .await;
    app.records
        .seed(
            Collection::Bookings,
            doc("room9", json!({ "status": "pending", "userId": "guest7", "guests": 1 })),
        )
        .await;

    let response = app
        .server
        .get("/api/reservations/room9")
        .add_query_param("type", "room")
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["id"], "room9");
    assert_eq!(body["user"]["fullName"], "Ada Guest");

    app.server
        .get("/api/reservations/missing")
        .add_query_param("type", "room")
        .authorization_bearer(&token)
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn stats_count_the_seeded_bookings() {
    let app = build_app();
    let token = login(&app).await;
    let now = Utc::now();

    app.records
        .seed(
            Collection::Bookings,
            doc(
                "stay1",
                json!({
                    "status": "confirmed",
                    "checkIn": (now - Duration::days(1)).to_rfc3339(),
                    "checkOut": (now + Duration::days(1)).to_rfc3339(),
                    "guests": 2
                }),
            )
            .with_created_at(now - Duration::days(3)),
        )
        .await;
    app.records
        .seed(
            Collection::RestaurantBookings,
            doc("table1", json!({ "status": "en attente", "guests": 4 })).with_created_at(now),
        )
        .await;

    let response = app
        .server
        .get("/api/dashboard/stats")
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["totalBookings"], 2);
    assert_eq!(body["pendingBookings"], 1);
    assert_eq!(body["activeGuests"], 2);
    assert_eq!(body["recentActivity"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn catalog_crud_round_trip() {
    let app = build_app();
    let token = login(&app).await;

    let response = app
        .server
        .post("/api/rooms")
        .authorization_bearer(&token)
        .json(&json!({
            "name": "Lake Suite",
            "capacity": 3,
            "pricePerNight": 240.0,
            "images": ["a.jpg"]
        }))
        .await;
    response.assert_status(http::StatusCode::CREATED);
    let created: Value = response.json();
    let id = created["id"].as_str().unwrap().to_string();

    let rooms: Vec<Value> = app
        .server
        .get("/api/rooms")
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0]["name"], "Lake Suite");
    assert_eq!(rooms[0]["pricePerNight"], 240.0);

    app.server
        .put(&format!("/api/rooms/{id}"))
        .authorization_bearer(&token)
        .json(&json!({ "capacity": 4 }))
        .await
        .assert_status_ok();
    let rooms: Vec<Value> = app
        .server
        .get("/api/rooms")
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(rooms[0]["capacity"], 4);
    assert_eq!(rooms[0]["name"], "Lake Suite");

    app.server
        .delete(&format!("/api/rooms/{id}"))
        .authorization_bearer(&token)
        .await
        .assert_status(http::StatusCode::NO_CONTENT);
    let rooms: Vec<Value> = app
        .server
        .get("/api/rooms")
        .authorization_bearer(&token)
        .await
        .json();
    assert!(rooms.is_empty());
}

#[tokio::test]
async fn catalog_validation_rejects_bad_input() {
    let app = build_app();
    let token = login(&app).await;

    app.server
        .post("/api/halls")
        .authorization_bearer(&token)
        .json(&json!({ "description": "no name" }))
        .await
        .assert_status(http::StatusCode::UNPROCESSABLE_ENTITY);

    app.server
        .post("/api/restaurant-menu")
        .authorization_bearer(&token)
        .json(&json!({ "name": "Old Fashioned", "category": "signature" }))
        .await
        .assert_status(http::StatusCode::UNPROCESSABLE_ENTITY);

    app.server
        .post("/api/bar-menu")
        .authorization_bearer(&token)
        .json(&json!({ "name": "Old Fashioned", "category": "classic" }))
        .await
        .assert_status(http::StatusCode::CREATED);
}

#[tokio::test]
async fn featuring_over_http_keeps_one_flag() {
    let app = build_app();
    let token = login(&app).await;

    let mut ids = Vec::new();
    for title in ["Jazz Night", "Wine Tasting"] {
        let response = app
            .server
            .post("/api/experiences")
            .authorization_bearer(&token)
            .json(&json!({ "title": title }))
            .await;
        response.assert_status(http::StatusCode::CREATED);
        let body: Value = response.json();
        ids.push(body["id"].as_str().unwrap().to_string());
    }

    for id in &ids {
        app.server
            .put(&format!("/api/experiences/{id}/featured"))
            .authorization_bearer(&token)
            .json(&json!({ "featured": true }))
            .await
            .assert_status_ok();
    }

    let experiences: Vec<Value> = app
        .server
        .get("/api/experiences")
        .authorization_bearer(&token)
        .await
        .json();
    let featured: Vec<&Value> = experiences
        .iter()
        .filter(|e| e["isFeatured"] == true)
        .collect();
    assert_eq!(featured.len(), 1);
    assert_eq!(featured[0]["title"], "Wine Tasting");
}

#[tokio::test]
async fn seeding_creates_the_defaults_with_one_featured() {
    let app = build_app();
    let token = login(&app).await;

    app.server
        .post("/api/experiences/seed")
        .authorization_bearer(&token)
        .await
        .assert_status(http::StatusCode::CREATED);

    let experiences: Vec<Value> = app
        .server
        .get("/api/experiences")
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(experiences.len(), 4);
    let featured = experiences.iter().filter(|e| e["isFeatured"] == true).count();
    assert_eq!(featured, 1);
}

#[tokio::test]
async fn uploads_store_the_file_and_return_a_url() {
    let app = build_app();
    let token = login(&app).await;

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"not really a jpeg".to_vec())
            .file_name("lobby photo.jpg")
            .mime_type("image/jpeg"),
    );
    let response = app
        .server
        .post("/api/uploads/rooms")
        .authorization_bearer(&token)
        .multipart(form)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let url = body["url"].as_str().unwrap();
    assert!(url.contains("rooms/"));
    assert!(url.ends_with("lobby_photo.jpg"));

    app.server
        .post("/api/uploads/Rooms")
        .authorization_bearer(&token)
        .multipart(MultipartForm::new())
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn notification_feed_marks_read_over_http() {
    let app = build_app();
    let token = login(&app).await;

    app.records
        .create(
            Collection::Notifications,
            object(json!({
                "targetRole": "admin",
                "title": "New booking",
                "message": "Room booking received",
                "read": false
            })),
        )
        .await
        .unwrap();

    // The subscription task re-lists on the change signal; poll until the
    // snapshot lands.
    let mut feed = Value::Null;
    for _ in 0..40 {
        let response = app
            .server
            .get("/api/notifications")
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        feed = response.json();
        if feed["unreadCount"] == 1 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    assert_eq!(feed["unreadCount"], 1);
    let id = feed["items"][0]["id"].as_str().unwrap().to_string();

    app.server
        .post(&format!("/api/notifications/{id}/read"))
        .authorization_bearer(&token)
        .await
        .assert_status(http::StatusCode::ACCEPTED);

    let mut cleared = false;
    for _ in 0..40 {
        let response = app
            .server
            .get("/api/notifications")
            .authorization_bearer(&token)
            .await;
        let body: Value = response.json();
        if body["unreadCount"] == 0 {
            cleared = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    assert!(cleared, "mark-read never reached the feed");
}
