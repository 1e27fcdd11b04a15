//! Record service: file upload into the object store and the read path
//!
//! An upload is validated completely, then checked against the record store,
//! and only then written to the object store. The reference URL is appended
//! to the record after the object write succeeds, so a failed write leaves the
//! record untouched.

use crate::blobs::BlobStore;
use crate::error::{RecordError, Result};
use crate::records::{normalize_user_id, Category, RecordStore};
use crate::util::multipart::UploadForm;
use actix_web::web;
use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Fallback for files that arrive without a name
const DEFAULT_ORIGINAL_NAME: &str = "upload";

/// Successful upload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadOutcome {
    pub file_url: String,
    pub file_name: String,
    pub key: String,
}

/// Both file lists of a patient, in upload order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientFiles {
    pub prescriptions: Vec<String>,
    pub reports: Vec<String>,
}

/// Replace anything outside `[A-Za-z0-9._-]` with `_`, and a leading dot too,
/// so the result is a single object key segment.
pub fn sanitize_segment(raw: &str) -> String {
    raw.trim()
        .chars()
        .enumerate()
        .map(|(i, c)| match c {
            '.' if i == 0 => '_',
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => c,
            _ => '_',
        })
        .collect()
}

/// The supplied display name when it is not blank, otherwise
/// `{unix_millis}-{original_name}`.
pub fn resolve_display_name(display_name: Option<&str>, original_name: Option<&str>, now_millis: i64) -> String {
    match display_name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => sanitize_segment(name),
        None => {
            let original = original_name
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .unwrap_or(DEFAULT_ORIGINAL_NAME);
            format!("{}-{}", now_millis, sanitize_segment(original))
        }
    }
}

/// Key segment for a user id. An id made only of `[A-Za-z0-9_-]` is used
/// as is; any other id becomes `~` followed by the hex of its bytes. `~`
/// never occurs in a verbatim id, so two ids never share a segment.
pub fn user_segment(user_id: &str) -> String {
    if !user_id.is_empty()
        && user_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        user_id.to_string()
    } else {
        format!("~{}", hex::encode(user_id.as_bytes()))
    }
}

/// `records/{user_segment}/{prescriptions|reports}/{display_name}`
pub fn storage_key(user_id: &str, category: Category, display_name: &str) -> String {
    format!(
        "records/{}/{}/{}",
        user_segment(user_id),
        category.key_segment(),
        display_name
    )
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    web::block(f).await?
}

pub struct RecordService {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    max_upload_size: usize,
}

impl RecordService {
    pub fn new(records: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>, max_upload_size: usize) -> Self {
        Self {
            records,
            blobs,
            max_upload_size,
        }
    }

    /// Store an uploaded file and append its reference URL to the patient's
    /// list for the form's category
    pub async fn upload(&self, form: UploadForm) -> Result<UploadOutcome> {
        let user_id = form
            .user_id
            .as_deref()
            .map(normalize_user_id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| RecordError::validation("Missing userId"))?
            .to_string();
        let category: Category = form
            .category
            .as_deref()
            .ok_or_else(|| RecordError::validation("Missing type"))?
            .parse()?;
        let file = form
            .file
            .ok_or_else(|| RecordError::validation("No file uploaded"))?;
        if file.data.is_empty() {
            return Err(RecordError::validation("Uploaded file is empty"));
        }
        if file.data.len() > self.max_upload_size {
            return Err(RecordError::validation(format!(
                "File exceeds the maximum size of {} bytes",
                self.max_upload_size
            )));
        }

        let records = Arc::clone(&self.records);
        let lookup_id = user_id.clone();
        if !blocking(move || records.exists(&lookup_id)).await? {
            return Err(RecordError::NotFound);
        }

        let file_name = resolve_display_name(
            form.file_name.as_deref(),
            file.original_name.as_deref(),
            Utc::now().timestamp_millis(),
        );
        let key = storage_key(&user_id, category, &file_name);
        debug!("Uploading {} bytes for user {} to {} via {}", file.data.len(), user_id, key, self.blobs.name());

        let stored = self
            .blobs
            .put_object(&key, file.data, file.content_type.as_deref())
            .await?;

        let records = Arc::clone(&self.records);
        let append_id = user_id.clone();
        let url = stored.url.clone();
        blocking(move || records.append_file(&append_id, category, &url)).await?;

        info!(
            "Stored {} for user {}: key={}, size={}, etag={:?}",
            category, user_id, stored.key, stored.size, stored.etag
        );
        Ok(UploadOutcome {
            file_url: stored.url,
            file_name,
            key: stored.key,
        })
    }

    /// Both file lists for `user_id`
    pub async fn files(&self, user_id: &str) -> Result<PatientFiles> {
        let records = Arc::clone(&self.records);
        let lookup_id = normalize_user_id(user_id).to_string();
        let record = blocking(move || records.find(&lookup_id))
            .await?
            .ok_or(RecordError::NotFound)?;

        Ok(PatientFiles {
            prescriptions: record.prescriptions,
            reports: record.reports,
        })
    }
}
