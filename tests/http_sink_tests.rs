//! HTTP forwarding against a local axum endpoint

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::post;
use senmlcat::sink::http::POST_CONTENT_TYPE;
use senmlcat::sink::{ConsoleSink, ForwardError, Forwarder, HttpSink, Sink};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

#[derive(Clone, Default)]
struct Received {
    bodies: Arc<Mutex<Vec<(Option<String>, Vec<u8>)>>>,
}

async fn accept(State(received): State<Received>, headers: HeaderMap, body: Bytes) -> StatusCode {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    received.bodies.lock().await.push((content_type, body.to_vec()));
    StatusCode::NO_CONTENT
}

async fn refuse() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "database offline")
}

async fn created() -> StatusCode {
    StatusCode::CREATED
}

/// Serve `app` on an ephemeral port and return its base URL
async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_no_content_is_success() {
    let received = Received::default();
    let app = Router::new()
        .route("/write", post(accept))
        .with_state(received.clone());
    let base = spawn(app).await;

    let sink = HttpSink::new(format!("{}/write", base), Duration::from_secs(5)).unwrap();
    assert_eq!(sink.name(), "http");
    sink.forward(b"temp,25569.000000,22.100000,degC\r\n")
        .await
        .unwrap();

    let bodies = received.bodies.lock().await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0].0.as_deref(), Some(POST_CONTENT_TYPE));
    assert_eq!(bodies[0].1, b"temp,25569.000000,22.100000,degC\r\n".to_vec());
}

#[tokio::test]
async fn test_error_status_carries_body() {
    let base = spawn(Router::new().route("/write", post(refuse))).await;
    let sink = HttpSink::new(format!("{}/write", base), Duration::from_secs(5)).unwrap();

    let err = sink.forward(b"[]").await.unwrap_err();
    match err {
        ForwardError::UnexpectedStatus { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "database offline");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_other_success_codes_are_rejected() {
    let base = spawn(Router::new().route("/write", post(created))).await;
    let sink = HttpSink::new(format!("{}/write", base), Duration::from_secs(5)).unwrap();

    let err = sink.forward(b"[]").await.unwrap_err();
    assert!(matches!(err, ForwardError::UnexpectedStatus { status: 201, .. }));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_http_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let sink = HttpSink::new(format!("http://{}/write", addr), Duration::from_secs(2)).unwrap();
    let err = sink.forward(b"[]").await.unwrap_err();
    assert!(matches!(err, ForwardError::Http(_)));
}

#[tokio::test]
async fn test_forwarder_stops_at_first_failure() {
    let base = spawn(Router::new().route("/write", post(refuse))).await;

    let forwarder = Forwarder::new()
        .with_sink(HttpSink::new(format!("{}/write", base), Duration::from_secs(5)).unwrap())
        .with_sink(ConsoleSink::new(Vec::new()));
    assert_eq!(forwarder.names(), ["http", "console"]);

    assert!(forwarder.forward(b"[]").await.is_err());
}

#[tokio::test]
async fn test_unreadable_error_body_is_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // answer 500 promising more body than is sent, then hang up
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        while !request.ends_with(b"\r\n\r\n[]") {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
        }
        socket
            .write_all(b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\n\r\npartial")
            .await
            .unwrap();
    });

    let sink = HttpSink::new(format!("http://{}/write", addr), Duration::from_secs(5)).unwrap();
    let err = sink.forward(b"[]").await.unwrap_err();
    match err {
        ForwardError::UnexpectedStatus { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("failed to read response body"), "{}", body);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
