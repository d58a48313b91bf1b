//! Filesystem blob store.
//!
//! Writes uploads below a configured root and returns URLs under the
//! configured public base. Suitable behind a static-file server or a CDN
//! origin pull; the service itself does not serve the files back.

use obwira_core::blob_store::{BlobFuture, BlobKey, BlobStore, BlobStoreError};
use std::path::PathBuf;

/// [`BlobStore`] over a local directory.
pub struct FsBlobStore {
    root: PathBuf,
    public_base: String,
}

impl FsBlobStore {
    /// Create a store writing under `root`, returning `{public_base}/{key}`
    /// URLs.
    #[must_use]
    pub fn new(root: PathBuf, public_base: impl Into<String>) -> Self {
        let mut public_base = public_base.into();
        while public_base.ends_with('/') {
            public_base.pop();
        }
        Self { root, public_base }
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, key: BlobKey, bytes: Vec<u8>) -> BlobFuture<'_, String> {
        Box::pin(async move {
            let path = self.root.join(key.as_str());
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| BlobStoreError::Backend(e.to_string()))?;
            }
            tokio::fs::write(&path, bytes)
                .await
                .map_err(|e| BlobStoreError::Backend(e.to_string()))?;

            tracing::debug!(key = %key, "blob written");
            Ok(format!("{}/{key}", self.public_base))
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn put_writes_file_and_returns_public_url() {
        let dir = std::env::temp_dir().join(format!("obwira-blob-{}", uuid::Uuid::new_v4()));
        let store = FsBlobStore::new(dir.clone(), "http://localhost:8080/uploads/");

        let at = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let key = BlobKey::new("rooms", at, "photo.jpg");
        let url = store.put(key, vec![0xAB, 0xCD]).await.unwrap();

        assert_eq!(
            url,
            "http://localhost:8080/uploads/rooms/1700000000000_photo.jpg"
        );
        let written = tokio::fs::read(dir.join("rooms/1700000000000_photo.jpg"))
            .await
            .unwrap();
        assert_eq!(written, vec![0xAB, 0xCD]);

        tokio::fs::remove_dir_all(dir).await.unwrap();
    }
}
