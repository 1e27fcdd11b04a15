//! Mock implementation of BlobStore trait for testing

use crate::blobs::{compute_etag, join_url, BlobStore, StoredObject};
use crate::error::{RecordError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use log::info;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

const MOCK_BASE_URL: &str = "https://mock-bucket.local";

/// In-memory object store that counts writes and can be told to fail
pub struct MockBlobStore {
    objects: Arc<Mutex<HashMap<String, Bytes>>>,
    put_calls: AtomicUsize,
    fail_puts: AtomicBool,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(Mutex::new(HashMap::new())),
            put_calls: AtomicUsize::new(0),
            fail_puts: AtomicBool::new(false),
        }
    }

    fn objects(&self) -> MutexGuard<'_, HashMap<String, Bytes>> {
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make every following `put_object` fail with an upload error
    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Number of `put_object` calls, failed ones included
    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.objects().get(key).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects().len()
    }
}

impl Default for MockBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn put_object(&self, key: &str, data: Bytes, _content_type: Option<&str>) -> Result<StoredObject> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(RecordError::Upload(format!("mock store refused {}", key)));
        }

        info!("Mock store received {} bytes for key: {}", data.len(), key);
        let stored = StoredObject {
            key: key.to_string(),
            url: self.object_url(key),
            etag: Some(compute_etag(&data)),
            size: data.len() as u64,
        };
        self.objects().insert(key.to_string(), data);
        Ok(stored)
    }

    fn object_url(&self, key: &str) -> String {
        join_url(MOCK_BASE_URL, key)
    }
}
