//! HTTP endpoints
//!
//! Every handler returns `Result<HttpResponse, RecordError>`; the error side
//! renders as a status code and a `{"message": ...}` body.

use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpResponse};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::error::RecordError;
use crate::records::{normalize_user_id, PatientView};
use crate::util::multipart::read_upload_form;

/// Largest accepted JSON body
const JSON_LIMIT: usize = 16 * 1024;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub patient: PatientView,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub file_url: String,
    pub file_name: String,
}

/// JSON extractor settings: errors use the same `{"message": ...}` body
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| RecordError::validation(format!("Invalid JSON body: {}", err)).into())
}

/// Tag the worker's log context with the request's user, clearing any tag
/// a previous request left on this thread
fn tag_user(user_id: Option<&str>) {
    match user_id.map(normalize_user_id).filter(|id| !id.is_empty()) {
        Some(id) => log_mdc::insert("user", id),
        None => log_mdc::remove("user"),
    };
}

#[get("/")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(MessageResponse {
        message: "API is up and running".to_string(),
    })
}

#[post("/auth")]
pub async fn auth(body: web::Json<AuthRequest>, app_state: web::Data<AppState>) -> Result<HttpResponse, RecordError> {
    let AuthRequest { user_id, password } = body.into_inner();
    tag_user(Some(&user_id));
    debug!("Auth request for user: {}", user_id);

    let service = app_state.credential_service.clone();
    let outcome = web::block(move || service.authenticate(&user_id, &password)).await??;

    Ok(HttpResponse::Ok().json(AuthResponse {
        message: outcome.message().to_string(),
        patient: outcome.record().view(),
    }))
}

#[post("/upload")]
pub async fn upload(payload: Multipart, app_state: web::Data<AppState>) -> Result<HttpResponse, RecordError> {
    let form = read_upload_form(payload, app_state.config.blobs.max_upload_size).await?;
    tag_user(form.user_id.as_deref());

    let outcome = app_state.record_service.upload(form).await?;
    info!("File uploaded: {}", outcome.file_url);

    Ok(HttpResponse::Ok().json(UploadResponse {
        message: "File uploaded".to_string(),
        file_url: outcome.file_url,
        file_name: outcome.file_name,
    }))
}

#[get("/records/{user_id}")]
pub async fn records(path: web::Path<String>, app_state: web::Data<AppState>) -> Result<HttpResponse, RecordError> {
    let user_id = path.into_inner();
    tag_user(Some(&user_id));

    let files = app_state.record_service.files(&user_id).await?;
    debug!(
        "Returning {} prescriptions and {} reports for user: {}",
        files.prescriptions.len(),
        files.reports.len(),
        user_id
    );
    Ok(HttpResponse::Ok().json(files))
}

/// Mount every endpoint under `/api`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(json_config())
            .service(health)
            .service(auth)
            .service(upload)
            .service(records),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current_user() -> Option<String> {
        log_mdc::get("user", |value| value.map(str::to_string))
    }

    #[test]
    fn test_tag_user_replaces_and_clears() {
        tag_user(Some(" u1 "));
        assert_eq!(current_user().as_deref(), Some("u1"));

        tag_user(None);
        assert_eq!(current_user(), None);

        tag_user(Some("u2"));
        tag_user(Some("   "));
        assert_eq!(current_user(), None);
    }
}
