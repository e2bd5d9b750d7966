#![cfg(feature = "server")]

use actix_web::{http::StatusCode, test, web, App};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use jewelbench::{
    server::{self, AppState},
    BatchSettings, Config, FalConfig,
};
use serde_json::json;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};
use zip::ZipArchive;

struct CountingFal {
    calls: AtomicUsize,
    fail_from: Option<usize>,
}

impl Respond for CountingFal {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_from.is_some_and(|from| call >= from) {
            return ResponseTemplate::new(401).set_body_json(json!({ "detail": "expired key" }));
        }
        let content = BASE64.encode(format!("brooch {}", call));
        ResponseTemplate::new(200).set_body_json(json!({
            "images": [{ "url": format!("data:image/jpeg;base64,{}", content) }]
        }))
    }
}

async fn mock_fal(fail_from: Option<usize>) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fal-ai/flux-2-pro/edit"))
        .and(header("Authorization", "Key form-key"))
        .respond_with(CountingFal {
            calls: AtomicUsize::new(0),
            fail_from,
        })
        .mount(&server)
        .await;
    server
}

fn config(server: &MockServer) -> Config {
    Config::new()
        .with_fal(FalConfig::new().with_base_url(server.uri()))
        .with_batch(BatchSettings::new().with_transient_backoff(Duration::ZERO))
}

fn entry_count(archive_base64: &str) -> usize {
    let bytes = BASE64.decode(archive_base64).unwrap();
    ZipArchive::new(Cursor::new(bytes)).unwrap().len()
}

#[actix_web::test]
async fn test_batch_returns_archive_and_summary() {
    let fal = mock_fal(None).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(AppState { config: config(&fal) }))
            .configure(server::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/batches")
        .set_json(json!({
            "batch_size": 25,
            "prompt": "baroque pearl brooch",
            "reference_image": format!("data:image/png;base64,{}", BASE64.encode([137u8, 80, 78, 71])),
            "style_tag": "baroque",
            "api_key": "form-key"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "succeeded");
    assert!(body["reason"].is_null());
    assert_eq!(body["file_name"], "jewelbench_variations.zip");
    assert_eq!(body["summary"]["accepted"], 25);
    assert_eq!(body["summary"]["attempts_used"], 25);
    assert_eq!(entry_count(body["archive_base64"].as_str().unwrap()), 25);
}

#[actix_web::test]
async fn test_aborted_batch_still_returns_partial_archive() {
    let fal = mock_fal(Some(3)).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(AppState { config: config(&fal) }))
            .configure(server::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/batches")
        .set_json(json!({
            "batch_size": 50,
            "reference_image": BASE64.encode([0xFFu8, 0xD8, 0xFF]),
            "api_key": "form-key"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "aborted");
    assert!(body["reason"].as_str().unwrap().contains("API key"));
    assert_eq!(body["summary"]["accepted"], 3);
    assert_eq!(entry_count(body["archive_base64"].as_str().unwrap()), 3);
}

#[actix_web::test]
async fn test_undecodable_reference_image_is_bad_request() {
    let fal = mock_fal(None).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(AppState { config: config(&fal) }))
            .configure(server::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/batches")
        .set_json(json!({
            "batch_size": 25,
            "reference_image": "%%% not base64 %%%",
            "api_key": "form-key"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(fal.received_requests().await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_archive_download_serves_zip_attachment() {
    let fal = mock_fal(Some(4)).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(AppState { config: config(&fal) }))
            .configure(server::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/batches/archive")
        .set_json(json!({
            "batch_size": 25,
            "prompt": "emerald pendant",
            "reference_image": BASE64.encode([0xFFu8, 0xD8, 0xFF]),
            "api_key": "form-key"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let headers = resp.headers();
    assert_eq!(headers.get("content-type").unwrap(), "application/zip");
    assert_eq!(
        headers.get("content-disposition").unwrap(),
        "attachment; filename=\"jewelbench_variations.zip\""
    );
    assert_eq!(headers.get("x-jewelbench-status").unwrap(), "aborted");
    assert_eq!(headers.get("x-jewelbench-accepted").unwrap(), "4");

    let bytes = test::read_body(resp).await;
    assert_eq!(ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap().len(), 4);
}
