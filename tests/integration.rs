use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;

use patient_records::api;
use patient_records::app_state::AppState;
use patient_records::blobs::mock_store::MockBlobStore;
use patient_records::config::AppConfig;
use patient_records::records::mock_store::MockRecordStore;
use patient_records::records::RecordStore;

const BOUNDARY: &str = "----patient-records-boundary";

fn test_state() -> (AppState, Arc<MockRecordStore>, Arc<MockBlobStore>) {
    let records = Arc::new(MockRecordStore::new());
    let blobs = Arc::new(MockBlobStore::new());
    let state = AppState::with_backends(AppConfig::for_testing(), records.clone(), blobs.clone())
        .expect("Failed to build app state");
    (state, records, blobs)
}

/// Build a multipart/form-data body from text fields and an optional file part
fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes());
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    if let Some((filename, data)) = file {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn file_part<'a>(name: &'a str, data: &'a [u8]) -> Option<(&'a str, &'a [u8])> {
    Some((name, data))
}

fn upload_request(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/upload")
        .insert_header((
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body(fields, file))
}

fn auth_request(user_id: &str, password: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/auth")
        .set_json(json!({ "userId": user_id, "password": password }))
}

#[actix_web::test]
async fn test_health() {
    let (state, _, _) = test_state();
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(api::configure)).await;

    let req = test::TestRequest::get().uri("/api/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "API is up and running");
}

#[actix_web::test]
async fn test_register_login_upload_scenario() {
    let (state, _, blobs) = test_state();
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(api::configure)).await;

    // First sight registers
    let resp = test::call_service(&app, auth_request("u1", "p").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "User registered");
    assert_eq!(body["patient"]["userId"], "u1");
    assert!(body["patient"].get("passwordHash").is_none());
    assert!(body["patient"].get("password_hash").is_none());

    // Wrong password
    let resp = test::call_service(&app, auth_request("u1", "wrong").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Invalid credentials");

    // Right password
    let resp = test::call_service(&app, auth_request("u1", "p").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Login successful");

    // Upload a report
    let req = upload_request(&[("userId", "u1"), ("type", "report")], file_part("scan.pdf", b"%PDF-1.4 data")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "File uploaded");
    let file_url = body["fileUrl"].as_str().expect("fileUrl missing").to_string();
    assert!(body["fileName"].as_str().unwrap().ends_with("-scan.pdf"));
    assert!(file_url.contains("/records/u1/reports/"));
    assert_eq!(blobs.put_calls(), 1);

    // Records list it under reports
    let req = test::TestRequest::get().uri("/api/records/u1").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({ "prescriptions": [], "reports": [file_url] }));
}

#[actix_web::test]
async fn test_upload_with_display_name_appends_in_order() {
    let (state, records, _) = test_state();
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(api::configure)).await;
    test::call_service(&app, auth_request("u2", "secret").to_request()).await;

    let mut urls = Vec::new();
    for name in ["first", "second"] {
        let req = upload_request(
            &[("userId", "u2"), ("type", "prescription"), ("fileName", name)],
            file_part("rx.png", b"image bytes"),
        )
        .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["fileName"], name);
        urls.push(body["fileUrl"].as_str().unwrap().to_string());
    }

    let stored = records.find("u2").unwrap().unwrap();
    assert_eq!(stored.prescriptions, urls);
    assert!(stored.reports.is_empty());

    // Reads are idempotent
    let first: Value = test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/records/u2").to_request()).await;
    let second: Value = test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/records/u2").to_request()).await;
    assert_eq!(first, second);
}

#[actix_web::test]
async fn test_upload_rejections() {
    let (state, records, blobs) = test_state();
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(api::configure)).await;
    test::call_service(&app, auth_request("u3", "pw").to_request()).await;

    // Unknown category
    let req = upload_request(&[("userId", "u3"), ("type", "xray")], file_part("a.bin", b"data")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Missing file
    let req = upload_request(&[("userId", "u3"), ("type", "report")], None).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Empty file
    let req = upload_request(&[("userId", "u3"), ("type", "report")], file_part("a.bin", b"")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Unknown user
    let req = upload_request(&[("userId", "ghost"), ("type", "report")], file_part("a.bin", b"data")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "User not found");

    assert_eq!(blobs.put_calls(), 0);
    let stored = records.find("u3").unwrap().unwrap();
    assert!(stored.prescriptions.is_empty() && stored.reports.is_empty());
}

#[actix_web::test]
async fn test_storage_failure_is_server_error() {
    let (state, records, blobs) = test_state();
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(api::configure)).await;
    test::call_service(&app, auth_request("u4", "pw").to_request()).await;
    blobs.set_fail_puts(true);

    let req = upload_request(&[("userId", "u4"), ("type", "report")], file_part("a.bin", b"data")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let stored = records.find("u4").unwrap().unwrap();
    assert!(stored.reports.is_empty());
}

#[actix_web::test]
async fn test_records_unknown_user() {
    let (state, _, _) = test_state();
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(api::configure)).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/records/nobody").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_auth_missing_fields() {
    let (state, _, _) = test_state();
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(api::configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/auth")
        .set_json(json!({ "userId": "u5" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/auth")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].as_str().unwrap().starts_with("Invalid JSON body"));
}

#[actix_web::test]
async fn test_padded_user_id_matches_on_every_route() {
    let (state, records, _) = test_state();
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(api::configure)).await;

    let resp = test::call_service(&app, auth_request(" u6 ", "pw").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["patient"]["userId"], "u6");
    assert!(records.exists("u6").unwrap());

    let req = upload_request(&[("userId", "u6"), ("type", "report")], file_part("a.bin", b"data")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, auth_request("u6", "pw").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
