//! HTTP listener tests, driving the router directly as a tower service

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use senmlcat::Pipeline;
use senmlcat::senml::{EncodeOptions, Format};
use senmlcat::serve::{AppState, DEFAULT_BODY_LIMIT, router};
use senmlcat::sink::{ConsoleSink, Forwarder};
use tower::ServiceExt;

const BODY: &str = r#"[{"n":"temp","u":"degC","v":22.1,"t":1700000000}]"#;

fn state(output: Format) -> AppState {
    let pipeline = Pipeline::new(Format::Json, output);
    AppState::new(pipeline, Forwarder::new())
}

async fn send(state: AppState, method: &str, uri: &str, body: impl Into<Body>) -> (StatusCode, Option<String>, Vec<u8>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(body.into())
        .unwrap();
    let response = router(state).oneshot(request).await.unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, body.to_vec())
}

#[tokio::test]
async fn test_any_path_converts() {
    for (method, uri) in [("POST", "/"), ("PUT", "/senml/room-1"), ("GET", "/x?y=z")] {
        let (status, content_type, body) = send(state(Format::Csv), method, uri, BODY).await;
        assert_eq!(status, StatusCode::OK, "{} {}", method, uri);
        assert_eq!(content_type.as_deref(), Some("text/csv"));
        assert_eq!(body, b"temp,45244.925926,22.100000,degC\r\n".to_vec());
    }
}

#[tokio::test]
async fn test_response_uses_output_content_type() {
    let (status, content_type, body) = send(state(Format::Cbor), "POST", "/", BODY).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/senml+cbor"));
    assert!(!body.is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let (status, _, body) = send(state(Format::Json), "POST", "/", "{not senml").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let text = String::from_utf8(body).unwrap();
    assert!(text.to_lowercase().contains("json"), "{}", text);
}

#[tokio::test]
async fn test_empty_body_is_bad_request() {
    let (status, _, _) = send(state(Format::Json), "POST", "/", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pretty_pipeline_with_console_forwarder() {
    let pipeline = Pipeline::new(Format::Json, Format::Json)
        .with_options(EncodeOptions::new().with_pretty(true));
    let forwarder = Forwarder::new().with_sink(ConsoleSink::new(Vec::new()));
    let state = AppState::new(pipeline, forwarder).with_verbose(true);

    let (status, _, body) = send(state, "POST", "/", BODY).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("\n  {"));
}

#[tokio::test]
async fn test_oversized_body_is_bad_request() {
    let state = state(Format::Json).with_body_limit(16);
    let (status, _, body) = send(state, "POST", "/", BODY).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!body.is_empty());
}

#[tokio::test]
async fn test_default_limit_rejects_large_packs_with_400() {
    let records = vec![r#"{"n":"x","v":1}"#; DEFAULT_BODY_LIMIT / 10];
    let large = format!("[{}]", records.join(","));
    assert!(large.len() > DEFAULT_BODY_LIMIT);

    let (status, _, body) = send(state(Format::Json), "POST", "/", large).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(String::from_utf8(body).unwrap().to_lowercase().contains("length limit"));
}
