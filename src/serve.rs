//! HTTP listener
//!
//! Every request, whatever its method or path, carries one pack in the configured input
//! format. The converted pack is forwarded to the sinks and echoed back in the response.
//! Every failure, an oversized body included, is answered with 400 and the error text.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::pipeline::Pipeline;
use crate::sink::Forwarder;

/// Largest request body accepted by default, in bytes
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Shared state of the listener
#[derive(Debug, Clone)]
pub struct AppState {
    pipeline: Pipeline,
    forwarder: Arc<Forwarder>,
    verbose: bool,
    body_limit: usize,
}

impl AppState {
    pub fn new(pipeline: Pipeline, forwarder: Forwarder) -> Self {
        Self {
            pipeline,
            forwarder: Arc::new(forwarder),
            verbose: false,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Reject request bodies larger than `limit` bytes
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Log every request body
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    async fn handle(&self, body: &[u8]) -> crate::Result<crate::Output> {
        let output = self.pipeline.process(body)?;
        self.forwarder.forward(&output.bytes).await?;
        Ok(output)
    }
}

/// Router answering every path with the conversion handler
pub fn router(state: AppState) -> Router {
    let limit = state.body_limit;
    Router::new()
        .fallback(convert)
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

/// Serve `router(state)` on `listener` until the process stops
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    info!(addr = %listener.local_addr()?, "listening for SenML");
    axum::serve(listener, router(state)).await
}

async fn convert(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!("rejected request body: {}", rejection.body_text());
            return (StatusCode::BAD_REQUEST, rejection.body_text()).into_response();
        }
    };

    if state.verbose {
        info!(body = %String::from_utf8_lossy(&body), "request");
    }

    match state.handle(&body).await {
        Ok(output) => {
            debug!(records = output.records, bytes = output.len(), "converted");
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, output.content_type)],
                output.bytes,
            )
                .into_response()
        }
        Err(e) => {
            warn!("request failed: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}
