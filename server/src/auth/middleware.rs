//! Authentication extractors.
//!
//! Handlers requiring an authenticated admin take [`AdminSession`] as a
//! parameter; the extractor validates the `Authorization: Bearer` header
//! against the session registry and rejects with 401 otherwise.
//!
//! # Usage
//!
//! ```rust,ignore
//! async fn dashboard_stats(
//!     admin: AdminSession,
//!     State(state): State<AppState>,
//! ) -> Result<Json<StatsResponse>, AppError> {
//!     // admin.session is guaranteed valid
//! }
//! ```

use crate::auth::session::Session;
use crate::error::AppError;
use crate::server::state::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::Utc;

/// Bearer token extracted from `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| {
                AppError::unauthorized("Invalid authorization format. Expected 'Bearer <token>'")
            })?
            .to_string();

        if token.is_empty() {
            return Err(AppError::unauthorized("Empty bearer token"));
        }

        Ok(Self(token))
    }
}

/// Authenticated admin session.
///
/// Every session in the registry belongs to an admin — non-admin accounts
/// never get one issued — so validation doubles as the role check.
#[derive(Debug, Clone)]
pub struct AdminSession {
    /// The validated session.
    pub session: Session,
}

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = BearerToken::from_request_parts(parts, state).await?;
        let session = state
            .sessions
            .validate(&bearer.0, Utc::now())
            .ok_or_else(|| AppError::unauthorized("Session expired or invalid"))?;
        Ok(Self { session })
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn bearer_prefix_parsing() {
        let header = "Bearer abc123";
        assert_eq!(header.strip_prefix("Bearer "), Some("abc123"));
        assert_eq!("Basic dXNlcg==".strip_prefix("Bearer "), None);
    }
}
