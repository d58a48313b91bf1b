//! Blob upload abstraction.
//!
//! Accepts a binary payload, stores it under a generated key, and returns a
//! publicly resolvable URL. Keys follow the upstream convention
//! `{category}/{millis}_{original_filename}`.
//!
//! Uploads are write-once: there is no delete, and an uploaded blob is not
//! rolled back when a subsequent document write fails.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during blob operations.
#[derive(Error, Debug)]
pub enum BlobStoreError {
    /// Storage backend failure (I/O, permissions, quota).
    #[error("blob backend error: {0}")]
    Backend(String),

    /// The payload or filename was rejected before storage.
    #[error("invalid upload: {0}")]
    InvalidUpload(String),
}

/// Storage key for an uploaded blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobKey(String);

impl BlobKey {
    /// Builds a key as `{category}/{millis}_{filename}`.
    ///
    /// The filename is sanitized to a conservative character set; path
    /// separators in user-supplied names must not escape the category
    /// prefix.
    #[must_use]
    pub fn new(category: &str, at: DateTime<Utc>, filename: &str) -> Self {
        let safe: String = filename
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        Self(format!("{category}/{}_{safe}", at.timestamp_millis()))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlobKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Boxed future alias used by the trait methods.
pub type BlobFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, BlobStoreError>> + Send + 'a>>;

/// Write-once binary storage returning durable public URLs.
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under `key` and returns the public URL.
    ///
    /// # Errors
    ///
    /// [`BlobStoreError::Backend`] when the backend rejects the write.
    fn put(&self, key: BlobKey, bytes: Vec<u8>) -> BlobFuture<'_, String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_layout_matches_upstream_convention() {
        let at = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap_or_default();
        let key = BlobKey::new("experiences", at, "jazz night.jpg");
        assert_eq!(key.as_str(), "experiences/1700000000000_jazz_night.jpg");
    }

    #[test]
    fn key_sanitizes_path_separators() {
        let at = DateTime::from_timestamp_millis(0).unwrap_or_default();
        let key = BlobKey::new("rooms", at, "../../etc/passwd");
        // Only the category separator survives; the name cannot escape it.
        assert_eq!(key.as_str().matches('/').count(), 1);
        assert_eq!(key.as_str(), "rooms/0_.._.._etc_passwd");
    }
}
