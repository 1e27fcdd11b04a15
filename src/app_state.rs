//! Application State Management
//!
//! This module provides the application state that contains all services
//! and their dependencies, following the dependency injection pattern.

use std::sync::Arc;
use log::info;

use crate::blobs::{BlobStore, local_store::LocalBlobStore, mock_store::MockBlobStore, s3_store::S3BlobStore};
use crate::records::{RecordStore, sqlite_store::SqliteRecordStore, mock_store::MockRecordStore};
use crate::service::{CredentialService, RecordService};
use crate::util::password::SecretHasher;
use crate::config::{AppConfig, BlobBackend, RecordBackend};
use crate::error::Result;

/// Application state containing all services and their dependencies
#[derive(Clone)]
pub struct AppState {
    pub credential_service: Arc<CredentialService>,
    pub record_service: Arc<RecordService>,
    pub config: AppConfig,
}

impl AppState {
    /// Create application state with backends chosen by the configuration
    pub fn from_config(config: AppConfig) -> Result<Self> {
        info!("Initializing application state with configuration");

        let records: Arc<dyn RecordStore> = match config.records.backend {
            RecordBackend::SQLite => {
                info!("Using SQLite record backend at {}", config.records.database_uri);
                Arc::new(SqliteRecordStore::open(&config.records.database_uri)?)
            }
            RecordBackend::Mock => {
                info!("Using mock record backend");
                Arc::new(MockRecordStore::new())
            }
        };

        let blobs: Arc<dyn BlobStore> = match config.blobs.backend {
            BlobBackend::S3 => Arc::new(S3BlobStore::new(&config.blobs)),
            BlobBackend::Local => Arc::new(LocalBlobStore::new(&config.blobs)),
            BlobBackend::Mock => {
                info!("Using mock blob backend");
                Arc::new(MockBlobStore::new())
            }
        };

        Self::with_backends(config, records, blobs)
    }

    /// Create application state around already-built backends
    pub fn with_backends(config: AppConfig, records: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>) -> Result<Self> {
        let hasher = SecretHasher::new(&config.credentials)?;
        let credential_service = Arc::new(CredentialService::new(Arc::clone(&records), hasher));
        let record_service = Arc::new(RecordService::new(records, blobs, config.blobs.max_upload_size));

        info!("Application state initialized successfully");
        Ok(Self {
            credential_service,
            record_service,
            config,
        })
    }

    /// Create application state for testing with mock backends
    pub fn new_for_testing() -> Result<Self> {
        Self::from_config(AppConfig::for_testing())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_for_testing() {
        let state = AppState::new_for_testing().unwrap();
        assert_eq!(state.config.records.backend, RecordBackend::Mock);
        assert_eq!(state.config.blobs.backend, BlobBackend::Mock);
    }

    #[test]
    fn test_from_config_with_sqlite_and_local() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::for_testing();
        config.records.backend = RecordBackend::SQLite;
        config.records.database_uri = dir.path().join("patients.db").to_str().unwrap().to_string();
        config.blobs.backend = BlobBackend::Local;
        config.blobs.base_path = dir.path().join("files").to_str().unwrap().to_string();

        let state = AppState::from_config(config).unwrap();
        let outcome = state.credential_service.authenticate("u1", "p").unwrap();
        assert_eq!(outcome.message(), "User registered");
    }
}
