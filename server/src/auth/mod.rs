//! Admin authentication.
//!
//! Email/password sign-in against the `users` collection, gated on the
//! `admin` role: valid credentials with any other role are rejected with
//! no session established. Passwords are stored as hex-encoded SHA-256
//! digests and compared in constant time.

pub mod handlers;
pub mod middleware;
pub mod session;

pub use session::{Session, SessionRegistry};

use crate::types::{user_from_document, User};
use chrono::{DateTime, Utc};
use constant_time_eq::constant_time_eq;
use obwira_core::document::{Collection, Filter, SortOrder};
use obwira_core::record_store::{RecordStore, RecordStoreError};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Authentication failures.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Unknown email or wrong password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Valid credentials, but the account is not an admin.
    #[error("this account does not have back-office access")]
    AccessDenied,

    /// The user lookup itself failed.
    #[error(transparent)]
    Store(#[from] RecordStoreError),
}

/// Hex-encoded SHA-256 digest of a password.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write;
        // Writing to a String cannot fail.
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Compare a password against a stored hex digest in constant time.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let computed = hash_password(password);
    constant_time_eq(computed.as_bytes(), stored_hash.as_bytes())
}

/// Sign an admin in, issuing a bearer session.
///
/// # Errors
///
/// [`AuthError::InvalidCredentials`] for an unknown email, a missing
/// stored hash, or a wrong password; [`AuthError::AccessDenied`] when the
/// account's role is not `admin`; [`AuthError::Store`] if the lookup
/// fails.
pub async fn login(
    records: &dyn RecordStore,
    sessions: &SessionRegistry,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<(Session, User), AuthError> {
    let docs = records
        .list(
            Collection::Users,
            vec![Filter::eq("email", email)],
            SortOrder::Unordered,
        )
        .await?;
    let Some(doc) = docs.first() else {
        return Err(AuthError::InvalidCredentials);
    };

    let Some(stored_hash) = doc.str_field("passwordHash") else {
        return Err(AuthError::InvalidCredentials);
    };
    if !verify_password(password, stored_hash) {
        return Err(AuthError::InvalidCredentials);
    }

    let user = user_from_document(doc);
    if user.role.as_deref() != Some("admin") {
        tracing::warn!(email, role = ?user.role, "non-admin sign-in rejected");
        return Err(AuthError::AccessDenied);
    }

    let session = sessions.issue(
        user.id.clone(),
        email.to_string(),
        user.full_name.clone(),
        now,
    );
    tracing::info!(email, "admin signed in");
    Ok((session, user))
}
