//! HTTP POST sink

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};

use super::{ForwardError, Sink};

/// Media type announced on every POST, whatever the output format
pub const POST_CONTENT_TYPE: &str = "application/senml+json";

/// POSTs each output to a fixed URL; only `204 No Content` counts as delivered
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: reqwest::Client,
    url: String,
}

impl HttpSink {
    pub fn new<S: Into<String>>(url: S, timeout: Duration) -> Result<Self, ForwardError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Sink for HttpSink {
    fn name(&self) -> &str {
        "http"
    }

    async fn forward(&self, payload: &[u8]) -> Result<(), ForwardError> {
        debug!(url = %self.url, bytes = payload.len(), "posting output");

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, POST_CONTENT_TYPE)
            .body(payload.to_vec())
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(());
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => format!("<failed to read response body: {}>", e),
        };
        warn!(url = %self.url, status = status.as_u16(), "post rejected");
        Err(ForwardError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        })
    }
}
