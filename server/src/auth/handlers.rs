//! Authentication endpoints.
//!
//! - `POST /auth/login` — email/password sign-in, returns a bearer token
//! - `POST /auth/logout` — deletes the session
//! - `GET /auth/me` — who the token belongs to

use crate::auth::middleware::{AdminSession, BearerToken};
use crate::auth::{login, AuthError};
use crate::error::AppError;
use crate::server::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Sign-in request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// The signed-in account, as returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUserResponse {
    /// User document id.
    pub id: String,
    /// Sign-in email.
    pub email: String,
    /// Display name.
    pub full_name: Option<String>,
}

/// Sign-in response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token for subsequent requests.
    pub token: String,
    /// When the token expires.
    pub expires_at: chrono::DateTime<Utc>,
    /// The signed-in account.
    pub user: SessionUserResponse,
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            // Both credential and role failures are a 401 with the inline
            // message; no distinction leaks to the client beyond the text.
            AuthError::InvalidCredentials | AuthError::AccessDenied => {
                Self::unauthorized(err.to_string())
            },
            AuthError::Store(e) => Self::internal("Sign-in failed").with_source(e.into()),
        }
    }
}

/// `POST /auth/login`
pub async fn post_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (session, user) = login(
        state.records.as_ref(),
        &state.sessions,
        &request.email,
        &request.password,
        Utc::now(),
    )
    .await?;

    Ok(Json(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
        user: SessionUserResponse {
            id: user.id.as_str().to_string(),
            email: request.email,
            full_name: user.full_name,
        },
    }))
}

/// `POST /auth/logout`
pub async fn post_logout(State(state): State<AppState>, bearer: BearerToken) -> StatusCode {
    state.sessions.revoke(&bearer.0);
    StatusCode::NO_CONTENT
}

/// `GET /auth/me`
pub async fn get_me(admin: AdminSession) -> Json<SessionUserResponse> {
    Json(SessionUserResponse {
        id: admin.session.user_id.as_str().to_string(),
        email: admin.session.email,
        full_name: admin.session.full_name,
    })
}
