//! Produce request framing and response parsing
//!
//! Request layout, all integers big-endian:
//!
//! ```text
//! i32 size                      bytes that follow, to the end of the frame
//! i16 api_key = 0               produce
//! i16 api_version = 1
//! i32 correlation_id
//! i16 client_id length, client_id bytes
//! i16 required_acks = 1
//! i32 timeout_ms = 1500
//! i32 topic count = 1
//!   i16 topic length, topic bytes
//!   i32 partition count = 1
//!     i32 partition
//!     i32 message set size
//!       i64 offset = 0
//!       i32 message size
//!         u32 crc32          IEEE, over magic..end of value
//!         i8  magic = 0
//!         i8  attributes = 0
//!         i32 key length = -1 (null key)
//!         i32 value length, value bytes
//! ```
//!
//! The response is a size-prefixed body holding the correlation id and, per topic and
//! partition, an error code and the assigned offset.

use std::fmt;

use bytes::{Buf, BufMut, BytesMut};

use super::BrokerError;

pub const API_KEY_PRODUCE: i16 = 0;
pub const API_VERSION: i16 = 1;
pub const REQUIRED_ACKS: i16 = 1;
pub const REQUEST_TIMEOUT_MS: i32 = 1500;
pub const MESSAGE_MAGIC: i8 = 0;
pub const MESSAGE_ATTRIBUTES: i8 = 0;
const NULL_KEY: i32 = -1;

/// Frame size without the client id, topic and value bytes
pub const FIXED_REQUEST_SIZE: usize = 64;

/// Largest response body accepted from the broker
pub const MAX_RESPONSE_SIZE: usize = 1024 * 1024;

/// One produce request carrying a single message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProduceRequest<'a> {
    pub correlation_id: i32,
    pub client_id: &'a str,
    pub topic: &'a str,
    pub partition: i32,
    pub value: &'a [u8],
}

impl ProduceRequest<'_> {
    /// Serialize into a complete frame, size prefix included
    pub fn encode(&self) -> Result<BytesMut, BrokerError> {
        let client_id = short_string("client id", self.client_id)?;
        let topic = short_string("topic", self.topic)?;
        let value_len = i32::try_from(self.value.len())
            .map_err(|_| BrokerError::field_too_long("value", self.value.len()))?;

        let mut buf = BytesMut::with_capacity(
            FIXED_REQUEST_SIZE + self.client_id.len() + self.topic.len() + self.value.len(),
        );

        let size_at = reserve_i32(&mut buf);
        buf.put_i16(API_KEY_PRODUCE);
        buf.put_i16(API_VERSION);
        buf.put_i32(self.correlation_id);
        buf.put_i16(client_id);
        buf.put_slice(self.client_id.as_bytes());

        buf.put_i16(REQUIRED_ACKS);
        buf.put_i32(REQUEST_TIMEOUT_MS);
        buf.put_i32(1);
        buf.put_i16(topic);
        buf.put_slice(self.topic.as_bytes());
        buf.put_i32(1);
        buf.put_i32(self.partition);

        let message_set_at = reserve_i32(&mut buf);
        buf.put_i64(0);
        let message_at = reserve_i32(&mut buf);
        let crc_at = buf.len();
        buf.put_u32(0);
        buf.put_i8(MESSAGE_MAGIC);
        buf.put_i8(MESSAGE_ATTRIBUTES);
        buf.put_i32(NULL_KEY);
        buf.put_i32(value_len);
        buf.put_slice(self.value);

        let crc = crc32fast::hash(&buf[crc_at + 4..]);
        buf[crc_at..crc_at + 4].copy_from_slice(&crc.to_be_bytes());

        backpatch_len(&mut buf, message_at)?;
        backpatch_len(&mut buf, message_set_at)?;
        backpatch_len(&mut buf, size_at)?;

        Ok(buf)
    }
}

fn short_string(field: &'static str, text: &str) -> Result<i16, BrokerError> {
    i16::try_from(text.len()).map_err(|_| BrokerError::field_too_long(field, text.len()))
}

fn reserve_i32(buf: &mut BytesMut) -> usize {
    let at = buf.len();
    buf.put_i32(0);
    at
}

/// Write the number of bytes after the length field at `at`
fn backpatch_len(buf: &mut BytesMut, at: usize) -> Result<(), BrokerError> {
    let len = buf.len() - at - 4;
    let len = i32::try_from(len).map_err(|_| BrokerError::field_too_long("frame", len))?;
    buf[at..at + 4].copy_from_slice(&len.to_be_bytes());
    Ok(())
}

/// Per-partition outcome reported by the broker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionResponse {
    pub partition: i32,
    pub error_code: i16,
    pub offset: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicResponse {
    pub name: String,
    pub partitions: Vec<PartitionResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProduceResponse {
    pub correlation_id: i32,
    pub topics: Vec<TopicResponse>,
}

impl ProduceResponse {
    /// Parse a response body (the bytes after the size prefix)
    pub fn decode(mut body: &[u8]) -> Result<Self, BrokerError> {
        let correlation_id = take_i32(&mut body, "correlation id")?;
        let topic_count = take_count(&mut body, "topic count")?;

        let mut topics = Vec::new();
        for _ in 0..topic_count {
            let name_len = take_i16(&mut body, "topic name length")?;
            let name_len = usize::try_from(name_len)
                .map_err(|_| BrokerError::malformed("negative topic name length"))?;
            if body.remaining() < name_len {
                return Err(BrokerError::malformed("truncated topic name"));
            }
            let name = String::from_utf8_lossy(&body[..name_len]).into_owned();
            body.advance(name_len);

            let partition_count = take_count(&mut body, "partition count")?;
            let mut partitions = Vec::new();
            for _ in 0..partition_count {
                partitions.push(PartitionResponse {
                    partition: take_i32(&mut body, "partition")?,
                    error_code: take_i16(&mut body, "error code")?,
                    offset: take_i64(&mut body, "offset")?,
                });
            }
            topics.push(TopicResponse { name, partitions });
        }

        Ok(Self {
            correlation_id,
            topics,
        })
    }

    /// The first partition that reported an error, in response order
    pub fn first_error(&self) -> Option<(&str, i32, ErrorCode)> {
        self.topics.iter().find_map(|topic| {
            topic.partitions.iter().find_map(|p| {
                ErrorCode::from_code(p.error_code).map(|code| (topic.name.as_str(), p.partition, code))
            })
        })
    }
}

fn take_i16(body: &mut &[u8], what: &str) -> Result<i16, BrokerError> {
    if body.remaining() < 2 {
        return Err(BrokerError::malformed(format!("truncated {}", what)));
    }
    Ok(body.get_i16())
}

fn take_i32(body: &mut &[u8], what: &str) -> Result<i32, BrokerError> {
    if body.remaining() < 4 {
        return Err(BrokerError::malformed(format!("truncated {}", what)));
    }
    Ok(body.get_i32())
}

fn take_i64(body: &mut &[u8], what: &str) -> Result<i64, BrokerError> {
    if body.remaining() < 8 {
        return Err(BrokerError::malformed(format!("truncated {}", what)));
    }
    Ok(body.get_i64())
}

fn take_count(body: &mut &[u8], what: &str) -> Result<usize, BrokerError> {
    let count = take_i32(body, what)?;
    usize::try_from(count).map_err(|_| BrokerError::malformed(format!("negative {}", what)))
}

/// Broker error codes carried in produce responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Unknown,
    OffsetOutOfRange,
    InvalidMessage,
    UnknownTopicOrPartition,
    InvalidMessageSize,
    LeaderNotAvailable,
    NotLeaderForPartition,
    RequestTimedOut,
    BrokerNotAvailable,
    ReplicaNotAvailable,
    MessageSizeTooLarge,
    StaleControllerEpoch,
    OffsetMetadataTooLarge,
    GroupLoadInProgress,
    GroupCoordinatorNotAvailable,
    NotCoordinatorForGroup,
    InvalidTopic,
    RecordListTooLarge,
    NotEnoughReplicas,
    NotEnoughReplicasAfterAppend,
    InvalidRequiredAcks,
    IllegalGeneration,
    InconsistentGroupProtocol,
    InvalidGroupId,
    UnknownMemberId,
    InvalidSessionTimeout,
    RebalanceInProgress,
    InvalidCommitOffsetSize,
    TopicAuthorizationFailed,
    GroupAuthorizationFailed,
    ClusterAuthorizationFailed,
    /// A non-zero code outside the known table
    Unrecognized(i16),
}

impl ErrorCode {
    /// Map a wire code; `0` means success and yields `None`
    pub fn from_code(code: i16) -> Option<Self> {
        let code = match code {
            0 => return None,
            -1 => Self::Unknown,
            1 => Self::OffsetOutOfRange,
            2 => Self::InvalidMessage,
            3 => Self::UnknownTopicOrPartition,
            4 => Self::InvalidMessageSize,
            5 => Self::LeaderNotAvailable,
            6 => Self::NotLeaderForPartition,
            7 => Self::RequestTimedOut,
            8 => Self::BrokerNotAvailable,
            9 => Self::ReplicaNotAvailable,
            10 => Self::MessageSizeTooLarge,
            11 => Self::StaleControllerEpoch,
            12 => Self::OffsetMetadataTooLarge,
            14 => Self::GroupLoadInProgress,
            15 => Self::GroupCoordinatorNotAvailable,
            16 => Self::NotCoordinatorForGroup,
            17 => Self::InvalidTopic,
            18 => Self::RecordListTooLarge,
            19 => Self::NotEnoughReplicas,
            20 => Self::NotEnoughReplicasAfterAppend,
            21 => Self::InvalidRequiredAcks,
            22 => Self::IllegalGeneration,
            23 => Self::InconsistentGroupProtocol,
            24 => Self::InvalidGroupId,
            25 => Self::UnknownMemberId,
            26 => Self::InvalidSessionTimeout,
            27 => Self::RebalanceInProgress,
            28 => Self::InvalidCommitOffsetSize,
            29 => Self::TopicAuthorizationFailed,
            30 => Self::GroupAuthorizationFailed,
            31 => Self::ClusterAuthorizationFailed,
            other => Self::Unrecognized(other),
        };
        Some(code)
    }

    pub fn code(self) -> i16 {
        match self {
            Self::Unknown => -1,
            Self::OffsetOutOfRange => 1,
            Self::InvalidMessage => 2,
            Self::UnknownTopicOrPartition => 3,
            Self::InvalidMessageSize => 4,
            Self::LeaderNotAvailable => 5,
            Self::NotLeaderForPartition => 6,
            Self::RequestTimedOut => 7,
            Self::BrokerNotAvailable => 8,
            Self::ReplicaNotAvailable => 9,
            Self::MessageSizeTooLarge => 10,
            Self::StaleControllerEpoch => 11,
            Self::OffsetMetadataTooLarge => 12,
            Self::GroupLoadInProgress => 14,
            Self::GroupCoordinatorNotAvailable => 15,
            Self::NotCoordinatorForGroup => 16,
            Self::InvalidTopic => 17,
            Self::RecordListTooLarge => 18,
            Self::NotEnoughReplicas => 19,
            Self::NotEnoughReplicasAfterAppend => 20,
            Self::InvalidRequiredAcks => 21,
            Self::IllegalGeneration => 22,
            Self::InconsistentGroupProtocol => 23,
            Self::InvalidGroupId => 24,
            Self::UnknownMemberId => 25,
            Self::InvalidSessionTimeout => 26,
            Self::RebalanceInProgress => 27,
            Self::InvalidCommitOffsetSize => 28,
            Self::TopicAuthorizationFailed => 29,
            Self::GroupAuthorizationFailed => 30,
            Self::ClusterAuthorizationFailed => 31,
            Self::Unrecognized(code) => code,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Unknown => "unknown broker error",
            Self::OffsetOutOfRange => "offset out of range",
            Self::InvalidMessage => "invalid message",
            Self::UnknownTopicOrPartition => "unknown topic or partition",
            Self::InvalidMessageSize => "invalid message size",
            Self::LeaderNotAvailable => "leader not available",
            Self::NotLeaderForPartition => "not leader for partition",
            Self::RequestTimedOut => "request timed out",
            Self::BrokerNotAvailable => "broker not available",
            Self::ReplicaNotAvailable => "replica not available",
            Self::MessageSizeTooLarge => "message size too large",
            Self::StaleControllerEpoch => "stale controller epoch",
            Self::OffsetMetadataTooLarge => "offset metadata too large",
            Self::GroupLoadInProgress => "group load in progress",
            Self::GroupCoordinatorNotAvailable => "group coordinator not available",
            Self::NotCoordinatorForGroup => "not coordinator for group",
            Self::InvalidTopic => "invalid topic",
            Self::RecordListTooLarge => "record list too large",
            Self::NotEnoughReplicas => "not enough replicas",
            Self::NotEnoughReplicasAfterAppend => "not enough replicas after append",
            Self::InvalidRequiredAcks => "invalid required acks",
            Self::IllegalGeneration => "illegal generation",
            Self::InconsistentGroupProtocol => "inconsistent group protocol",
            Self::InvalidGroupId => "invalid group id",
            Self::UnknownMemberId => "unknown member id",
            Self::InvalidSessionTimeout => "invalid session timeout",
            Self::RebalanceInProgress => "rebalance in progress",
            Self::InvalidCommitOffsetSize => "invalid commit offset size",
            Self::TopicAuthorizationFailed => "topic authorization failed",
            Self::GroupAuthorizationFailed => "group authorization failed",
            Self::ClusterAuthorizationFailed => "cluster authorization failed",
            Self::Unrecognized(_) => "unrecognized broker error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrecognized(code) => write!(f, "{} (code {})", self.description(), code),
            _ => f.write_str(self.description()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(value: &[u8]) -> BytesMut {
        ProduceRequest {
            correlation_id: 1,
            client_id: "SenMLCat-0.1",
            topic: "senml",
            partition: 0,
            value,
        }
        .encode()
        .unwrap()
    }

    fn read_i32(buf: &[u8], at: usize) -> i32 {
        i32::from_be_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
    }

    #[test]
    fn test_frame_length_prefix_covers_rest() {
        let frame = request(b"[{\"n\":\"a\",\"v\":1}]");
        assert_eq!(read_i32(&frame, 0) as usize + 4, frame.len());
        assert_eq!(frame.len(), FIXED_REQUEST_SIZE + 12 + 5 + 17);
    }

    #[test]
    fn test_frame_header_fields() {
        let frame = request(b"x");
        assert_eq!(&frame[4..6], &API_KEY_PRODUCE.to_be_bytes());
        assert_eq!(&frame[6..8], &API_VERSION.to_be_bytes());
        assert_eq!(read_i32(&frame, 8), 1);
        assert_eq!(&frame[12..14], &12i16.to_be_bytes());
        assert_eq!(&frame[14..26], b"SenMLCat-0.1");
        assert_eq!(&frame[26..28], &1i16.to_be_bytes());
        assert_eq!(read_i32(&frame, 28), 1500);
    }

    #[test]
    fn test_nested_lengths_and_crc() {
        let value = b"hello broker";
        let frame = request(value);

        // 4 size + 22 header/client id + 6 acks/timeout + 4 topic count + 7 topic
        // + 4 partition count + 4 partition
        let message_set_at = 4 + 22 + 6 + 4 + 7 + 4 + 4;
        let message_set_len = read_i32(&frame, message_set_at) as usize;
        assert_eq!(message_set_at + 4 + message_set_len, frame.len());

        let message_at = message_set_at + 4 + 8;
        let message_len = read_i32(&frame, message_at) as usize;
        assert_eq!(message_at + 4 + message_len, frame.len());

        let crc_at = message_at + 4;
        let crc = u32::from_be_bytes([
            frame[crc_at],
            frame[crc_at + 1],
            frame[crc_at + 2],
            frame[crc_at + 3],
        ]);
        assert_eq!(crc, crc32fast::hash(&frame[crc_at + 4..]));

        assert_eq!(read_i32(&frame, crc_at + 6), -1);
        assert_eq!(read_i32(&frame, crc_at + 10) as usize, value.len());
        assert!(frame.ends_with(value));
    }

    #[test]
    fn test_oversized_topic_is_rejected() {
        let topic = "t".repeat(40_000);
        let err = ProduceRequest {
            correlation_id: 1,
            client_id: "c",
            topic: &topic,
            partition: 0,
            value: b"",
        }
        .encode()
        .unwrap_err();
        assert!(matches!(err, BrokerError::FieldTooLong { field: "topic", .. }));
    }

    fn response(code: i16) -> Vec<u8> {
        let mut body = BytesMut::new();
        body.put_i32(9);
        body.put_i32(1);
        body.put_i16(5);
        body.put_slice(b"senml");
        body.put_i32(1);
        body.put_i32(0);
        body.put_i16(code);
        body.put_i64(42);
        body.to_vec()
    }

    #[test]
    fn test_decode_success_response() {
        let parsed = ProduceResponse::decode(&response(0)).unwrap();
        assert_eq!(parsed.correlation_id, 9);
        assert_eq!(parsed.topics[0].name, "senml");
        assert_eq!(parsed.topics[0].partitions[0].offset, 42);
        assert!(parsed.first_error().is_none());
    }

    #[test]
    fn test_decode_error_response() {
        let parsed = ProduceResponse::decode(&response(7)).unwrap();
        let (topic, partition, code) = parsed.first_error().unwrap();
        assert_eq!((topic, partition), ("senml", 0));
        assert_eq!(code, ErrorCode::RequestTimedOut);
        assert_eq!(code.to_string(), "request timed out");
    }

    #[test]
    fn test_decode_truncated_response() {
        let body = response(0);
        for cut in [0, 3, 9, 15, body.len() - 1] {
            let err = ProduceResponse::decode(&body[..cut]).unwrap_err();
            assert!(matches!(err, BrokerError::MalformedResponse { .. }), "cut at {}", cut);
        }
    }

    #[test]
    fn test_error_code_table() {
        assert_eq!(ErrorCode::from_code(0), None);
        assert_eq!(ErrorCode::from_code(-1), Some(ErrorCode::Unknown));
        assert_eq!(ErrorCode::from_code(13), Some(ErrorCode::Unrecognized(13)));
        assert_eq!(ErrorCode::from_code(99), Some(ErrorCode::Unrecognized(99)));
        for code in (1..=31).filter(|c| *c != 13) {
            let mapped = ErrorCode::from_code(code).unwrap();
            assert!(!matches!(mapped, ErrorCode::Unrecognized(_)), "{}", code);
            assert_eq!(mapped.code(), code);
        }
        assert_eq!(
            ErrorCode::Unrecognized(99).to_string(),
            "unrecognized broker error (code 99)"
        );
    }
}
