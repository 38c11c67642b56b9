mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::*;
use gcs_file_gateway::config::AppConfig;
use std::sync::atomic::Ordering;

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_static_assets_served_at_root() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>upload here</h1>").unwrap();
    std::fs::write(dir.path().join("app.js"), "console.log('hi');").unwrap();

    let config = AppConfig {
        static_dir: dir.path().to_path_buf(),
        ..AppConfig::development()
    };
    let (app, _store) = setup_app_with_config(config);

    let response = send(&app, get("/")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "<h1>upload here</h1>");

    let response = send(&app, get("/app.js")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "console.log('hi');");

    let response = send(&app, get("/missing.css")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_reports_provider() {
    let (app, _store) = setup_app();

    let response = send(&app, get("/health")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["storage_provider"], "mock");
    assert_eq!(json["bucket"], "mock-bucket");
}

#[tokio::test]
async fn test_request_id_is_propagated_or_generated() {
    let (app, _store) = setup_app();

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.headers()["x-request-id"], "abc-123");

    let response = send(&app, get("/health")).await;
    let generated = response.headers()["x-request-id"].to_str().unwrap();
    assert_eq!(generated.len(), 36);
}

#[tokio::test]
async fn test_handler_panic_becomes_500() {
    let (app, store) = setup_app();
    store.panic_on_open.store(true, Ordering::SeqCst);

    let body = multipart_body(&[("files", "a.txt", "a")]);
    let response = send(&app, upload_request(body)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Internal Server Error");

    // The service keeps answering afterwards.
    store.panic_on_open.store(false, Ordering::SeqCst);
    let body = multipart_body(&[("files", "a.txt", "a")]);
    let response = send(&app, upload_request(body)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(store.object("images/a.txt").is_some());
}

#[tokio::test]
async fn test_wrong_method_is_rejected() {
    let (app, _store) = setup_app();

    let response = send(&app, get("/gcp-upload")).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let request = Request::builder()
        .method("POST")
        .uri("/gcp-delete")
        .header("Content-Type", "application/json")
        .body(Body::from("[]"))
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_openapi_document_lists_routes() {
    let (app, _store) = setup_app();

    let response = send(&app, get("/api-docs/openapi.json")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["paths"]["/gcp-upload"]["post"].is_object());
    assert!(json["paths"]["/gcp-delete"]["delete"].is_object());
}
