//! Identity Store Abstraction
//!
//! This module defines the patient record model and the keyed record store
//! interface, so the services can run against SQLite in production and an
//! in-memory store in tests without any change.

pub mod sqlite_store;
pub mod mock_store;


use crate::error::{RecordError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User identifier type
pub type UserId = String;

/// Canonical form of a client-supplied user id. Every entry point applies it
/// before the id reaches a store.
pub fn normalize_user_id(raw: &str) -> &str {
    raw.trim()
}

/// Category tag for an uploaded file
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Prescription,
    Report,
}

impl Category {
    /// Tag as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Prescription => "prescription",
            Category::Report => "report",
        }
    }

    /// Storage key segment, which is also the name of the list on the record
    pub fn key_segment(&self) -> &'static str {
        match self {
            Category::Prescription => "prescriptions",
            Category::Report => "reports",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "prescription" => Ok(Category::Prescription),
            "report" => Ok(Category::Report),
            other => Err(RecordError::validation(format!(
                "Invalid type: {}, expected one of: prescription, report",
                other
            ))),
        }
    }
}

/// Persisted entity per patient
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    pub user_id: UserId,
    /// Argon2id PHC string, never the plaintext
    pub password_hash: String,
    pub prescriptions: Vec<String>,
    pub reports: Vec<String>,
}

impl UserRecord {
    /// Create a record with empty file lists
    pub fn new(user_id: impl Into<UserId>, password_hash: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            password_hash: password_hash.into(),
            prescriptions: Vec::new(),
            reports: Vec::new(),
        }
    }

    pub fn files(&self, category: Category) -> &[String] {
        match category {
            Category::Prescription => &self.prescriptions,
            Category::Report => &self.reports,
        }
    }

    /// Append a reference URL to the end of the list for `category`
    pub fn push_file(&mut self, category: Category, url: impl Into<String>) {
        match category {
            Category::Prescription => self.prescriptions.push(url.into()),
            Category::Report => self.reports.push(url.into()),
        }
    }

    /// External rendering without the password hash
    pub fn view(&self) -> PatientView {
        PatientView {
            user_id: self.user_id.clone(),
            prescriptions: self.prescriptions.clone(),
            reports: self.reports.clone(),
        }
    }
}

/// What the API is allowed to show about a patient
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientView {
    pub user_id: UserId,
    pub prescriptions: Vec<String>,
    pub reports: Vec<String>,
}

/// Trait defining the keyed record store interface
pub trait RecordStore: Send + Sync {
    /// Human-readable backend name for logs
    fn name(&self) -> &str;

    /// Look up a record by user id
    fn find(&self, user_id: &str) -> Result<Option<UserRecord>>;

    /// Insert a new record. Returns `false` and leaves the store untouched
    /// when the user id is already taken.
    fn insert(&self, record: &UserRecord) -> Result<bool>;

    /// Append a reference URL to one of the record's lists.
    /// Fails with `RecordError::NotFound` for an unknown user id.
    fn append_file(&self, user_id: &str, category: Category, url: &str) -> Result<()>;

    /// Check if a record exists
    fn exists(&self, user_id: &str) -> Result<bool> {
        Ok(self.find(user_id)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_str() {
        assert_eq!("prescription".parse::<Category>().unwrap(), Category::Prescription);
        assert_eq!("report".parse::<Category>().unwrap(), Category::Report);

        assert!("Report".parse::<Category>().is_err());
        assert!("prescriptions".parse::<Category>().is_err());
        assert!("".parse::<Category>().is_err());
    }

    #[test]
    fn test_normalize_user_id() {
        assert_eq!(normalize_user_id(" u1\t"), "u1");
        assert_eq!(normalize_user_id("a b"), "a b");
        assert_eq!(normalize_user_id("   "), "");
    }

    #[test]
    fn test_push_file_keeps_order() {
        let mut record = UserRecord::new("u1", "$argon2id$stub");
        record.push_file(Category::Report, "https://files/a");
        record.push_file(Category::Report, "https://files/b");
        record.push_file(Category::Prescription, "https://files/c");

        assert_eq!(record.files(Category::Report), ["https://files/a", "https://files/b"]);
        assert_eq!(record.files(Category::Prescription), ["https://files/c"]);
    }

    #[test]
    fn test_view_omits_hash() {
        let record = UserRecord::new("u1", "$argon2id$secret-hash");
        let json = serde_json::to_string(&record.view()).unwrap();

        assert!(json.contains("\"userId\":\"u1\""));
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("password"));
    }
}
