//! Credential service: register-or-login against the record store

use crate::error::{RecordError, Result};
use crate::records::{normalize_user_id, RecordStore, UserRecord};
use crate::util::password::SecretHasher;
use log::{debug, info, warn};
use std::sync::Arc;

/// Result of a successful `authenticate` call
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    /// The id was unknown; a record was created with this secret
    Registered(UserRecord),
    /// The id was known and the secret matched
    Authenticated(UserRecord),
}

impl AuthOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            AuthOutcome::Registered(_) => "User registered",
            AuthOutcome::Authenticated(_) => "Login successful",
        }
    }

    pub fn record(&self) -> &UserRecord {
        match self {
            AuthOutcome::Registered(record) | AuthOutcome::Authenticated(record) => record,
        }
    }
}

pub struct CredentialService {
    records: Arc<dyn RecordStore>,
    hasher: SecretHasher,
}

impl CredentialService {
    pub fn new(records: Arc<dyn RecordStore>, hasher: SecretHasher) -> Self {
        Self { records, hasher }
    }

    /// Register `user_id` on first sight, otherwise verify `secret` against
    /// the stored hash. Blocking: hashes and hits the record store.
    pub fn authenticate(&self, user_id: &str, secret: &str) -> Result<AuthOutcome> {
        let user_id = normalize_user_id(user_id);
        if user_id.is_empty() {
            return Err(RecordError::validation("Missing userId"));
        }
        if secret.is_empty() {
            return Err(RecordError::validation("Missing password"));
        }

        let existing = match self.records.find(user_id)? {
            Some(record) => record,
            None => {
                let record = UserRecord::new(user_id, self.hasher.hash(secret)?);
                if self.records.insert(&record)? {
                    info!("Registered new user: {}", user_id);
                    return Ok(AuthOutcome::Registered(record));
                }
                // Lost a race with a concurrent registration; check against the winner
                debug!("User {} was registered concurrently, verifying instead", user_id);
                self.records.find(user_id)?.ok_or_else(|| {
                    RecordError::Persistence(format!("Record for {} vanished after insert conflict", user_id))
                })?
            }
        };

        if !self.hasher.verify(secret, &existing.password_hash)? {
            warn!("Invalid credentials for user: {}", user_id);
            return Err(RecordError::Authentication);
        }
        debug!("User authenticated: {}", user_id);
        Ok(AuthOutcome::Authenticated(existing))
    }
}
