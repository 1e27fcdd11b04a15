//! Mock implementation of RecordStore trait for testing

use crate::error::{RecordError, Result};
use crate::records::{Category, RecordStore, UserRecord};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Mock implementation of RecordStore for testing
pub struct MockRecordStore {
    data: Arc<Mutex<HashMap<String, UserRecord>>>,
}

impl MockRecordStore {
    /// Create a new mock record store
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn data(&self) -> MutexGuard<'_, HashMap<String, UserRecord>> {
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Clear all data from the store (useful for test cleanup)
    pub fn clear(&self) {
        self.data().clear();
    }

    /// Get the number of users in the store
    pub fn user_count(&self) -> usize {
        self.data().len()
    }
}

impl Default for MockRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MockRecordStore {
    fn name(&self) -> &str {
        "mock"
    }

    fn find(&self, user_id: &str) -> Result<Option<UserRecord>> {
        Ok(self.data().get(user_id).cloned())
    }

    fn insert(&self, record: &UserRecord) -> Result<bool> {
        let mut data = self.data();
        if data.contains_key(&record.user_id) {
            return Ok(false);
        }
        data.insert(record.user_id.clone(), record.clone());
        Ok(true)
    }

    fn append_file(&self, user_id: &str, category: Category, url: &str) -> Result<()> {
        let mut data = self.data();
        let record = data.get_mut(user_id).ok_or(RecordError::NotFound)?;
        record.push_file(category, url);
        Ok(())
    }
}
