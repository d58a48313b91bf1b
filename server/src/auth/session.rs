//! In-memory bearer session registry.
//!
//! Sessions are random 32-byte tokens with a TTL, held in process memory.
//! A restart signs everyone out, which is acceptable for a staff dashboard
//! with a handful of users.

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use obwira_core::document::DocumentId;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// An authenticated admin session.
#[derive(Clone, Debug)]
pub struct Session {
    /// Bearer token identifying the session.
    pub token: String,
    /// The signed-in user's document id.
    pub user_id: DocumentId,
    /// Sign-in email.
    pub email: String,
    /// Display name, if the account has one.
    pub full_name: Option<String>,
    /// When the session stops validating.
    pub expires_at: DateTime<Utc>,
}

/// Registry of live sessions.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Session>>,
    ttl: Duration,
}

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

impl SessionRegistry {
    /// Create a registry issuing sessions with the given TTL.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Issue a session for a signed-in admin.
    pub fn issue(
        &self,
        user_id: DocumentId,
        email: String,
        full_name: Option<String>,
        now: DateTime<Utc>,
    ) -> Session {
        let session = Session {
            token: generate_token(),
            user_id,
            email,
            full_name,
            expires_at: now + self.ttl,
        };
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        sessions.insert(session.token.clone(), session.clone());
        session
    }

    /// Validate a bearer token. Expired sessions are dropped on lookup.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Option<Session> {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match sessions.get(token) {
            Some(session) if session.expires_at > now => Some(session.clone()),
            Some(_) => {
                sessions.remove(token);
                None
            },
            None => None,
        }
    }

    /// Delete a session. Unknown tokens are a no-op.
    pub fn revoke(&self, token: &str) {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        sessions.remove(token);
    }

    /// Number of live sessions (including not-yet-collected expired ones).
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no sessions are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
