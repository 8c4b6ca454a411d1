//! Producer session over a single stream

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use super::BrokerError;
use super::protocol::{MAX_RESPONSE_SIZE, ProduceRequest, ProduceResponse};
use crate::config::{BrokerConfig, DEFAULT_CLIENT_ID};

/// Correlation id of the first request on a session
pub const FIRST_CORRELATION_ID: i32 = 1;

/// Sends produce requests and checks their responses, one at a time
///
/// The stream is dialed once and never re-dialed. A send that stops between writing its
/// request and reading the whole response, whether by error or by being dropped, leaves
/// the stream out of step with the broker; every later send then fails with
/// [`BrokerError::Desynchronized`].
#[derive(Debug)]
pub struct Producer<S> {
    stream: S,
    client_id: String,
    partition: i32,
    next_correlation_id: i32,
    in_flight: bool,
}

impl Producer<TcpStream> {
    /// Dial `config.addr`, giving up after `config.dial_timeout_ms`
    pub async fn connect(config: &BrokerConfig) -> Result<Self, BrokerError> {
        let dial = TcpStream::connect(&config.addr);
        let stream = match tokio::time::timeout(config.dial_timeout(), dial).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(BrokerError::Connect {
                    addr: config.addr.clone(),
                    source,
                });
            }
            Err(_) => {
                return Err(BrokerError::DialTimeout {
                    addr: config.addr.clone(),
                    timeout_ms: config.dial_timeout_ms,
                });
            }
        };
        stream.set_nodelay(true)?;

        info!(addr = %config.addr, client_id = %config.client_id, "connected to broker");
        Ok(Self::new(stream, config.client_id.clone()).with_partition(config.partition))
    }
}

impl<S> Producer<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new<C: Into<String>>(stream: S, client_id: C) -> Self {
        Self {
            stream,
            client_id: client_id.into(),
            partition: 0,
            next_correlation_id: FIRST_CORRELATION_ID,
            in_flight: false,
        }
    }

    /// Producer with the default client id
    pub fn with_default_client_id(stream: S) -> Self {
        Self::new(stream, DEFAULT_CLIENT_ID)
    }

    pub fn with_partition(mut self, partition: i32) -> Self {
        self.partition = partition;
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Correlation id the next send will use
    pub fn next_correlation_id(&self) -> i32 {
        self.next_correlation_id
    }

    /// True once a send was abandoned mid-exchange
    pub fn is_desynchronized(&self) -> bool {
        self.in_flight
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Produce `value` to `topic` and wait for the broker's answer
    pub async fn send(&mut self, topic: &str, value: &[u8]) -> Result<ProduceResponse, BrokerError> {
        if self.in_flight {
            return Err(BrokerError::Desynchronized);
        }

        let correlation_id = self.next_correlation_id;
        self.next_correlation_id = self.next_correlation_id.wrapping_add(1);

        let frame = ProduceRequest {
            correlation_id,
            client_id: &self.client_id,
            topic,
            partition: self.partition,
            value,
        }
        .encode()?;

        // cleared only once the matching response has been read in full
        self.in_flight = true;
        self.stream.write_all(&frame).await?;
        self.stream.flush().await?;
        debug!(correlation_id, topic, bytes = frame.len(), "produce request sent");

        let response = self.read_response().await?;
        if response.correlation_id != correlation_id {
            warn!(
                expected = correlation_id,
                actual = response.correlation_id,
                "broker session out of step"
            );
            self.in_flight = true;
            return Err(BrokerError::CorrelationMismatch {
                expected: correlation_id,
                actual: response.correlation_id,
            });
        }

        if let Some((topic, partition, code)) = response.first_error() {
            warn!(topic, partition, code = code.code(), "broker rejected message: {}", code);
            return Err(BrokerError::Partition {
                topic: topic.to_string(),
                partition,
                code,
            });
        }

        Ok(response)
    }

    async fn read_response(&mut self) -> Result<ProduceResponse, BrokerError> {
        let mut len = [0u8; 4];
        self.stream
            .read_exact(&mut len)
            .await
            .map_err(|e| truncated_or_io(e, "response size"))?;

        let len = i32::from_be_bytes(len);
        let len = usize::try_from(len)
            .map_err(|_| BrokerError::malformed(format!("negative response size {}", len)))?;
        if len > MAX_RESPONSE_SIZE {
            return Err(BrokerError::ResponseTooLarge {
                len,
                max: MAX_RESPONSE_SIZE,
            });
        }

        let mut body = vec![0u8; len];
        self.stream
            .read_exact(&mut body)
            .await
            .map_err(|e| truncated_or_io(e, "response body"))?;

        // the frame has been consumed; the stream is back in step whatever its content
        self.in_flight = false;
        ProduceResponse::decode(&body)
    }
}

fn truncated_or_io(err: std::io::Error, what: &str) -> BrokerError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        BrokerError::malformed(format!("connection closed while reading {}", what))
    } else {
        BrokerError::Io(err)
    }
}
