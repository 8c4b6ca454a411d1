//! Forwarding sinks
//!
//! Encoded output is handed to each configured [`Sink`] in turn: console first, then
//! the broker, then the HTTP endpoint. Delivery is at-most-once and the first failure
//! stops the fan-out.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::broker::{BrokerError, BrokerSink};
use crate::config::Config;

pub mod console;
pub mod http;

pub use console::ConsoleSink;
pub use http::HttpSink;

/// Errors raised while delivering output to a sink
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("Failed to write to console: {0}")]
    Console(#[source] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP endpoint answered {status} instead of 204 No Content: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error(transparent)]
    Broker(#[from] BrokerError),
}

/// A destination for encoded packs
#[async_trait]
pub trait Sink: Send + Sync {
    /// Short label used in logs
    fn name(&self) -> &str;

    /// Deliver one encoded pack
    async fn forward(&self, payload: &[u8]) -> Result<(), ForwardError>;
}

/// Ordered set of sinks fed with every output
#[derive(Default)]
pub struct Forwarder {
    sinks: Vec<Box<dyn Sink>>,
}

impl Forwarder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the sinks named by `config`
    ///
    /// The broker connection is dialed here, so an unreachable broker fails startup.
    pub async fn from_config(config: &Config) -> crate::Result<Self> {
        let mut forwarder = Self::new();

        if config.print {
            forwarder.push(ConsoleSink::stdout());
        }
        if let Some(broker) = &config.broker {
            forwarder.push(BrokerSink::connect(broker, config.topic.clone()).await?);
        }
        if let Some(url) = &config.post_url {
            forwarder.push(HttpSink::new(url.clone(), config.http_timeout())?);
        }

        Ok(forwarder)
    }

    pub fn push<S: Sink + 'static>(&mut self, sink: S) {
        self.sinks.push(Box::new(sink));
    }

    pub fn with_sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Names of the configured sinks, in delivery order
    pub fn names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Hand `payload` to every sink, stopping at the first failure
    pub async fn forward(&self, payload: &[u8]) -> Result<(), ForwardError> {
        for sink in &self.sinks {
            sink.forward(payload).await?;
            debug!(sink = sink.name(), bytes = payload.len(), "forwarded");
        }
        Ok(())
    }
}

impl std::fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forwarder")
            .field("sinks", &self.names())
            .finish()
    }
}
