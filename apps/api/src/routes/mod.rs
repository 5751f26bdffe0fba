pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

/// Uploads and form posts are small text documents.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Inputs
        .route("/api/v1/styles", get(handlers::handle_list_styles))
        .route("/api/v1/sample", get(handlers::handle_sample))
        .route("/api/v1/upload", post(handlers::handle_upload))
        // Generation
        .route("/api/v1/generate", post(handlers::handle_generate_form))
        .route("/api/v1/generate/json", post(handlers::handle_generate_json))
        .route(
            "/api/v1/generate/all-styles",
            post(handlers::handle_generate_all_styles),
        )
        // Artifacts
        .route(
            "/api/v1/artifacts/:key",
            get(handlers::handle_get_artifact).delete(handlers::handle_delete_artifact),
        )
        .route(
            "/api/v1/jobs/:job_id/fallback",
            get(handlers::handle_get_fallback),
        )
        // Cache
        .route("/api/v1/cache/stats", get(handlers::handle_cache_stats))
        .route("/api/v1/cache", delete(handlers::handle_clear_cache))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::{path::Path, sync::Arc, time::Duration};

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::build_router;
    use crate::compile::stub::StubMode;
    use crate::config::Config;
    use crate::generation::service::fixtures::{harness, Harness, ADA_JSON};
    use crate::state::AppState;

    const BOUNDARY: &str = "cvforge-test-boundary";

    fn test_config(root: &Path) -> Config {
        Config {
            port: 0,
            rust_log: "debug".to_string(),
            template_dir: root.join("template"),
            output_dir: root.join("output"),
            upload_dir: root.join("uploads"),
            cache_dir: root.join("cache"),
            cache_ttl_secs: 3600,
            cache_max_bytes: 10 * 1024 * 1024,
            latex_program: "stub".to_string(),
            fallback_timeout: Duration::from_secs(5),
            default_style: "red".to_string(),
        }
    }

    /// Router over a stub compiler. The returned dir must outlive the router.
    fn app(mode: StubMode) -> (TempDir, Router) {
        let Harness { root, service, .. } = harness(mode);
        let state = AppState {
            config: test_config(root.path()),
            service: Arc::new(service),
        };
        (root, build_router(state))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = send(app, request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn post_file(uri: &str, file_name: &str, contents: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             {contents}\r\n\
             --{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn ada() -> Value {
        serde_json::from_str(ADA_JSON).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_compiler() {
        let (_root, app) = app(StubMode::Succeed);
        let (status, body) = send_json(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["compiler"]["program"], "stub");
    }

    #[tokio::test]
    async fn test_styles_lists_standard_themes() {
        let (_root, app) = app(StubMode::Succeed);
        let (status, body) = send_json(&app, get("/api/v1/styles")).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body["standard"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|s| s["name"].as_str())
            .collect();
        assert!(names.contains(&"red"));
        assert!(body["all"].as_array().unwrap().len() > names.len());
    }

    #[tokio::test]
    async fn test_sample_is_valid_json() {
        let (_root, app) = app(StubMode::Succeed);
        let (status, body) = send_json(&app, get("/api/v1/sample")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"].is_object());
    }

    #[tokio::test]
    async fn test_generate_json_then_download() {
        let (_root, app) = app(StubMode::Succeed);
        let (status, body) = send_json(
            &app,
            post_json("/api/v1/generate/json", json!({ "data": ada(), "style": "navy" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["cached"], false);
        assert_eq!(body["kind"], "pdf");

        let url = body["download_url"].as_str().unwrap().to_string();
        let response = app.clone().oneshot(get(&url)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/pdf"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_generate_json_validation_error_is_400() {
        let (_root, app) = app(StubMode::Succeed);
        let (status, body) = send_json(
            &app,
            post_json(
                "/api/v1/generate/json",
                json!({ "data": { "FirstName": "Ada", "Email": "not-an-email" } }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        let errors: Vec<&str> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(errors.contains(&"Last Name is required"));
        assert!(errors.contains(&"Invalid email format"));
    }

    #[tokio::test]
    async fn test_generate_json_rejects_malformed_body() {
        let (_root, app) = app(StubMode::Succeed);
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/generate/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send_json(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "PARSE_ERROR");
    }

    #[tokio::test]
    async fn test_compile_failure_points_at_fallback() {
        let (_root, app) = app(StubMode::FailDocuments);
        let (status, body) =
            send_json(&app, post_json("/api/v1/generate/json", json!({ "data": ada() }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fallback"], true);
        let url = body["download_url"].as_str().unwrap();
        assert!(url.ends_with("/fallback"));

        let (status, bytes) = send(&app, get(url)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_upload_returns_normalized_record() {
        let (root, app) = app(StubMode::Succeed);
        let (status, body) =
            send_json(&app, post_file("/api/v1/upload", "ada.json", ADA_JSON)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["filename"], "ada.json");
        assert_eq!(body["data"]["FirstName"], "Ada");

        let stored = std::fs::read_dir(root.path().join("uploads")).unwrap().count();
        assert_eq!(stored, 1);
    }

    #[tokio::test]
    async fn test_upload_rejects_unknown_extension() {
        let (_root, app) = app(StubMode::Succeed);
        let (status, body) =
            send_json(&app, post_file("/api/v1/upload", "ada.docx", "whatever")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["errors"][0],
            "Unsupported file format. Please use JSON or TXT files."
        );
    }

    #[tokio::test]
    async fn test_unknown_artifact_is_404() {
        let (_root, app) = app(StubMode::Succeed);
        let (status, body) = send_json(&app, get("/api/v1/artifacts/deadbeef")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_delete_artifact_evicts_it() {
        let (_root, app) = app(StubMode::Succeed);
        let (_, body) =
            send_json(&app, post_json("/api/v1/generate/json", json!({ "data": ada() }))).await;
        let url = body["download_url"].as_str().unwrap().to_string();

        let delete = |uri: &str| {
            Request::builder()
                .method(Method::DELETE)
                .uri(uri)
                .body(Body::empty())
                .unwrap()
        };
        let (status, _) = send_json(&app, delete(url.as_str())).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send_json(&app, get(&url)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send_json(&app, delete(url.as_str())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cache_stats_and_clear() {
        let (_root, app) = app(StubMode::Succeed);
        send_json(&app, post_json("/api/v1/generate/json", json!({ "data": ada() }))).await;

        let (_, stats) = send_json(&app, get("/api/v1/cache/stats")).await;
        assert_eq!(stats["stats"]["entry_count"], 1);

        let clear = Request::builder()
            .method(Method::DELETE)
            .uri("/api/v1/cache")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send_json(&app, clear).await;
        assert_eq!(status, StatusCode::OK);

        let (_, stats) = send_json(&app, get("/api/v1/cache/stats")).await;
        assert_eq!(stats["stats"]["entry_count"], 0);
    }
}
