//! Collects the fields of an upload form from a multipart body

use crate::error::{RecordError, Result};
use actix_multipart::{Field, Multipart};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use log::debug;

/// Text fields are identifiers and names, never documents
const MAX_TEXT_FIELD: usize = 4096;

/// File part of an upload form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Fields of `POST /upload`, all optional until validated by the service
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub user_id: Option<String>,
    pub category: Option<String>,
    pub file_name: Option<String>,
    pub file: Option<UploadedFile>,
}

fn malformed(e: impl std::fmt::Display) -> RecordError {
    RecordError::validation(format!("Malformed multipart body: {}", e))
}

async fn read_field(field: &mut Field, limit: usize, what: &str) -> Result<Bytes> {
    let mut bytes = BytesMut::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(malformed)?;
        if bytes.len() + chunk.len() > limit {
            return Err(RecordError::validation(format!(
                "{} exceeds the maximum size of {} bytes",
                what, limit
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes.freeze())
}

async fn read_text(field: &mut Field, name: &str) -> Result<String> {
    let bytes = read_field(field, MAX_TEXT_FIELD, name).await?;
    String::from_utf8(bytes.to_vec())
        .map(|text| text.trim().to_string())
        .map_err(|_| RecordError::validation(format!("Field {} is not valid UTF-8", name)))
}

/// Drain `payload` into an `UploadForm`. Unknown fields are skipped; the
/// `file` part may not exceed `max_file_size` bytes.
pub async fn read_upload_form(mut payload: Multipart, max_file_size: usize) -> Result<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(malformed)?;
        let disposition = field.content_disposition();
        let name = disposition
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();
        let original_name = disposition.and_then(|cd| cd.get_filename()).map(str::to_string);
        let content_type = field.content_type().map(|mime| mime.to_string());

        match name.as_str() {
            "userId" => form.user_id = Some(read_text(&mut field, "userId").await?),
            "type" => form.category = Some(read_text(&mut field, "type").await?),
            "fileName" => form.file_name = Some(read_text(&mut field, "fileName").await?),
            "file" => {
                let data = read_field(&mut field, max_file_size, "File").await?;
                debug!("Received file part {:?} of {} bytes", original_name, data.len());
                form.file = Some(UploadedFile {
                    original_name,
                    content_type,
                    data,
                });
            }
            other => {
                debug!("Skipping unexpected form field: {}", other);
                read_field(&mut field, max_file_size, other).await?;
            }
        }
    }

    Ok(form)
}
