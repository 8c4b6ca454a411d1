//! Message broker producer
//!
//! [`Producer`] owns one long-lived connection and the correlation id counter.
//! [`BrokerSink`] shares a producer between concurrent forwards, one send at a time.

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::config::BrokerConfig;
use crate::sink::{ForwardError, Sink};

pub mod producer;
pub mod protocol;

pub use producer::Producer;
pub use protocol::{ErrorCode, ProduceRequest, ProduceResponse};

/// Errors raised by the broker producer
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Failed to connect to broker at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Timed out after {timeout_ms} ms connecting to broker at {addr}")]
    DialTimeout { addr: String, timeout_ms: u64 },

    #[error("Broker I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{field} is too long for a produce request ({len} bytes)")]
    FieldTooLong { field: &'static str, len: usize },

    #[error("Malformed broker response: {message}")]
    MalformedResponse { message: String },

    #[error("Broker response of {len} bytes exceeds the {max} byte limit")]
    ResponseTooLarge { len: usize, max: usize },

    #[error("Broker session is out of step after an unfinished request; reconnect required")]
    Desynchronized,

    #[error("Broker answered correlation id {actual}, expected {expected}")]
    CorrelationMismatch { expected: i32, actual: i32 },

    #[error("Broker rejected topic '{topic}' partition {partition}: {code}")]
    Partition {
        topic: String,
        partition: i32,
        code: ErrorCode,
    },
}

impl BrokerError {
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    pub fn field_too_long(field: &'static str, len: usize) -> Self {
        Self::FieldTooLong { field, len }
    }

    /// The broker error code, when the broker itself refused the message
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Partition { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Sink producing every output to one topic
pub struct BrokerSink<S = TcpStream> {
    producer: Mutex<Producer<S>>,
    topic: String,
}

impl BrokerSink<TcpStream> {
    /// Dial the broker named by `config`
    pub async fn connect(config: &BrokerConfig, topic: String) -> Result<Self, BrokerError> {
        let producer = Producer::connect(config).await?;
        Ok(Self::new(producer, topic))
    }
}

impl<S> BrokerSink<S>
where
    S: AsyncRead + AsyncWrite + Send + Unpin,
{
    pub fn new(producer: Producer<S>, topic: String) -> Self {
        Self {
            producer: Mutex::new(producer),
            topic,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn into_producer(self) -> Producer<S> {
        self.producer.into_inner()
    }
}

#[async_trait]
impl<S> Sink for BrokerSink<S>
where
    S: AsyncRead + AsyncWrite + Send + Unpin,
{
    fn name(&self) -> &str {
        "broker"
    }

    async fn forward(&self, payload: &[u8]) -> Result<(), ForwardError> {
        let mut producer = self.producer.lock().await;
        producer.send(&self.topic, payload).await?;
        Ok(())
    }
}
