//! Application Configuration
//!
//! This module provides configuration management for the application,
//! supporting a YAML configuration file with sensible defaults and
//! environment variable overrides for deployment secrets.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use log::{info, warn};

/// Record store backend types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum RecordBackend {
    SQLite,
    Mock,
}

impl Default for RecordBackend {
    fn default() -> Self {
        RecordBackend::SQLite
    }
}

impl std::str::FromStr for RecordBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(RecordBackend::SQLite),
            "mock" => Ok(RecordBackend::Mock),
            _ => Err(format!("Unknown record backend: {}", s)),
        }
    }
}

/// Blob store backend types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum BlobBackend {
    S3,
    Local,
    Mock,
}

impl Default for BlobBackend {
    fn default() -> Self {
        BlobBackend::S3
    }
}

impl std::str::FromStr for BlobBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" | "aws" => Ok(BlobBackend::S3),
            "local" | "fs" => Ok(BlobBackend::Local),
            "mock" => Ok(BlobBackend::Mock),
            _ => Err(format!("Unknown blob backend: {}", s)),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Patient record store configuration
    pub records: RecordsConfig,
    /// Object store configuration
    pub blobs: BlobConfig,
    /// Password hashing configuration
    pub credentials: CredentialConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Number of worker threads
    pub workers: usize,
    /// Maximum request payload size in bytes
    pub max_payload_size: usize,
}

/// Record store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsConfig {
    pub backend: RecordBackend,
    /// SQLite database file, or `:memory:`
    pub database_uri: String,
}

/// Object store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobConfig {
    pub backend: BlobBackend,
    pub bucket: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    /// Custom S3-compatible endpoint; AWS when absent
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Prefix for the reference URLs handed back to clients
    #[serde(default)]
    pub public_base_url: Option<String>,
    /// Root directory for the local backend
    pub base_path: String,
    /// Largest accepted file in bytes
    pub max_upload_size: usize,
}

/// Argon2id cost parameters for stored password hashes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Path to log4rs configuration file
    pub config_file: String,
}

impl AppConfig {
    /// Load configuration from file (defaults if absent), then apply
    /// environment overrides
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_FILE").unwrap_or_else(|_| "config.yaml".to_string());
        let mut config = Self::from_file(&config_path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(config_path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        if Path::new(config_path).exists() {
            let content = fs::read_to_string(config_path)?;
            let config: AppConfig = serde_yaml::from_str(&content)?;
            info!("Loaded configuration from {}", config_path);
            Ok(config)
        } else {
            warn!("Config file {} not found, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Override settings from the process environment
    pub fn apply_env_overrides(&mut self) {
        if let Ok(port) = env::var("PORT") {
            match port.parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("Invalid PORT in environment: {}. Keeping {}", port, self.server.port),
            }
        }
        if let Ok(backend) = env::var("RECORD_STORE_BACKEND") {
            match backend.parse::<RecordBackend>() {
                Ok(backend) => {
                    info!("Using record backend from environment: {:?}", backend);
                    self.records.backend = backend;
                }
                Err(e) => warn!("{}. Keeping {:?}", e, self.records.backend),
            }
        }
        if let Ok(backend) = env::var("BLOB_STORE_BACKEND") {
            match backend.parse::<BlobBackend>() {
                Ok(backend) => {
                    info!("Using blob backend from environment: {:?}", backend);
                    self.blobs.backend = backend;
                }
                Err(e) => warn!("{}. Keeping {:?}", e, self.blobs.backend),
            }
        }
        if let Ok(uri) = env::var("DATABASE_URI") {
            self.records.database_uri = uri;
        }
        if let Ok(key) = env::var("AWS_ACCESS_KEY") {
            self.blobs.access_key = key;
        }
        if let Ok(secret) = env::var("AWS_SECRET_KEY") {
            self.blobs.secret_key = secret;
        }
        if let Ok(region) = env::var("AWS_REGION") {
            self.blobs.region = region;
        }
        if let Ok(bucket) = env::var("AWS_BUCKET_NAME") {
            self.blobs.bucket = bucket;
        }
        if let Ok(endpoint) = env::var("AWS_ENDPOINT") {
            self.blobs.endpoint = Some(endpoint);
        }
        if let Ok(base_url) = env::var("PUBLIC_BASE_URL") {
            self.blobs.public_base_url = Some(base_url);
        }
        if let Ok(dir) = env::var("STORAGE_DIRECTORY") {
            self.blobs.base_path = dir;
        }
    }

    /// Reject configurations the server cannot start with
    pub fn validate(&self) -> Result<(), String> {
        if self.blobs.backend == BlobBackend::S3 && self.blobs.bucket.trim().is_empty() {
            return Err("S3 blob backend requires a bucket name (AWS_BUCKET_NAME)".to_string());
        }
        if self.blobs.max_upload_size == 0 {
            return Err("blobs.max_upload_size must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Configuration for tests: in-memory backends and cheap hashing
    pub fn for_testing() -> Self {
        let mut config = Self::default();
        config.records.backend = RecordBackend::Mock;
        config.records.database_uri = ":memory:".to_string();
        config.blobs.backend = BlobBackend::Mock;
        config.blobs.bucket = "test-bucket".to_string();
        config.credentials = CredentialConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        };
        config
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3001,
                workers: 4,
                max_payload_size: 52428800, // 50MB
            },
            records: RecordsConfig {
                backend: RecordBackend::SQLite,
                database_uri: "./data/patients.db".to_string(),
            },
            blobs: BlobConfig {
                backend: BlobBackend::S3,
                bucket: String::new(),
                region: "us-east-1".to_string(),
                access_key: String::new(),
                secret_key: String::new(),
                endpoint: None,
                public_base_url: None,
                base_path: "./data/files".to_string(),
                max_upload_size: 20971520, // 20MB
            },
            credentials: CredentialConfig {
                memory_kib: 19456,
                iterations: 2,
                parallelism: 1,
            },
            logging: LoggingConfig {
                config_file: "server_log.yaml".to_string(),
            },
        }
    }
}
