//! Object Storage Layer Abstraction
//!
//! This module provides an abstraction over object storage backends
//! (S3, a local directory, memory) with "put object, get URL" semantics.

pub mod s3_store;
pub mod local_store;
pub mod mock_store;


use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Outcome of a successful object write
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredObject {
    /// Key the object was written under
    pub key: String,
    /// Public reference URL for the object
    pub url: String,
    /// Entity tag reported (or computed) for the payload
    pub etag: Option<String>,
    /// Size in bytes
    pub size: u64,
}

/// Trait defining the object storage interface
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Human-readable backend name for logs
    fn name(&self) -> &str;

    /// Write `data` under `key`, replacing any existing object
    async fn put_object(&self, key: &str, data: Bytes, content_type: Option<&str>) -> Result<StoredObject>;

    /// Reference URL an object stored under `key` is reachable at
    fn object_url(&self, key: &str) -> String;
}

/// MD5 hex digest used as the entity tag by backends that do not report one
pub fn compute_etag(data: &[u8]) -> String {
    hex::encode(md5::compute(data).0)
}

/// Join a base URL and an object key with exactly one slash
pub fn join_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}
