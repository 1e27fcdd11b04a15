//! Local directory object storage implementation

use crate::blobs::{compute_etag, join_url, BlobStore, StoredObject};
use crate::config::BlobConfig;
use crate::error::{RecordError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, info};
use std::path::{Component, Path, PathBuf};

/// Object store that writes files under a base directory
pub struct LocalBlobStore {
    base_path: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(config: &BlobConfig) -> Self {
        let base_path = PathBuf::from(&config.base_path);
        let public_base_url = config
            .public_base_url
            .clone()
            .unwrap_or_else(|| format!("file://{}", config.base_path.trim_end_matches('/')));
        info!(
            "Using local blob directory {}, files served from {}",
            base_path.display(),
            public_base_url
        );
        Self {
            base_path,
            public_base_url,
        }
    }

    /// Path an object key maps to; keys may not leave the base directory
    fn object_path(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(RecordError::Upload(format!("Invalid object key: {}", key)));
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn put_object(&self, key: &str, data: Bytes, _content_type: Option<&str>) -> Result<StoredObject> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RecordError::Upload(format!("Failed to create {}: {}", parent.display(), e)))?;
        }
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| RecordError::Upload(format!("Failed to write {}: {}", path.display(), e)))?;
        debug!("Wrote {} bytes to {}", data.len(), path.display());

        Ok(StoredObject {
            key: key.to_string(),
            url: self.object_url(key),
            etag: Some(compute_etag(&data)),
            size: data.len() as u64,
        })
    }

    fn object_url(&self, key: &str) -> String {
        join_url(&self.public_base_url, key)
    }
}
