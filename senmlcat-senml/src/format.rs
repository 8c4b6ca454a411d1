//! Wire formats and the codec lookup table
//!
//! Every format implements [`Codec`]. Callers pick an implementation by [`Format`]
//! (or by name through [`FromStr`]) and never switch on the format themselves.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::csv::CsvCodec;
use crate::line_protocol::LineProtocolCodec;
use crate::{Pack, Result, SenMLError};

/// Series name used by the line protocol encoder when none is configured
pub const DEFAULT_TOPIC: &str = "senml";

/// Supported wire formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    /// JSON array of record objects
    #[serde(rename = "json")]
    Json,
    /// One JSON record object per line
    #[serde(rename = "jsonl")]
    JsonLines,
    /// `sensml` root element with one `senml` element per record
    #[serde(rename = "xml")]
    Xml,
    /// CBOR array of maps
    #[serde(rename = "cbor")]
    Cbor,
    /// MessagePack array of maps
    #[serde(rename = "mpack", alias = "msgpack")]
    MessagePack,
    /// Spreadsheet friendly lines, encode-only
    #[serde(rename = "csv")]
    Csv,
    /// InfluxDB line protocol, encode-only
    #[serde(rename = "linp", alias = "line-protocol")]
    LineProtocol,
}

impl Format {
    /// All formats, in declaration order
    pub const ALL: [Format; 7] = [
        Format::Json,
        Format::JsonLines,
        Format::Xml,
        Format::Cbor,
        Format::MessagePack,
        Format::Csv,
        Format::LineProtocol,
    ];

    /// Short name used on the command line and in configuration files
    pub fn name(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::JsonLines => "jsonl",
            Format::Xml => "xml",
            Format::Cbor => "cbor",
            Format::MessagePack => "mpack",
            Format::Csv => "csv",
            Format::LineProtocol => "linp",
        }
    }

    /// Media type of encoded output
    pub fn content_type(self) -> &'static str {
        match self {
            Format::Json => "application/senml+json",
            Format::JsonLines => "application/x-ndjson",
            Format::Xml => "application/senml+xml",
            Format::Cbor => "application/senml+cbor",
            Format::MessagePack => "application/vnd.msgpack",
            Format::Csv => "text/csv",
            Format::LineProtocol => "text/plain",
        }
    }

    /// Whether the format can be read back into a pack
    pub fn can_decode(self) -> bool {
        !matches!(self, Format::Csv | Format::LineProtocol)
    }

    /// Look up the codec implementing this format
    pub fn codec(self) -> Result<&'static dyn Codec> {
        codec_for(self)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = SenMLError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "jsonl" | "jsonlines" => Ok(Format::JsonLines),
            "xml" => Ok(Format::Xml),
            "cbor" => Ok(Format::Cbor),
            "mpack" | "msgpack" | "messagepack" => Ok(Format::MessagePack),
            "csv" => Ok(Format::Csv),
            "linp" | "line-protocol" => Ok(Format::LineProtocol),
            _ => Err(SenMLError::unknown_format(s)),
        }
    }
}

/// Output options shared by every encoder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Indent text formats
    pub pretty: bool,
    /// Series name for the line protocol; empty means [`DEFAULT_TOPIC`]
    pub topic: String,
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_topic<S: Into<String>>(mut self, topic: S) -> Self {
        self.topic = topic.into();
        self
    }

    /// The configured topic, or [`DEFAULT_TOPIC`] when empty
    pub fn topic_or_default(&self) -> &str {
        if self.topic.is_empty() {
            DEFAULT_TOPIC
        } else {
            &self.topic
        }
    }
}

/// A wire format implementation
pub trait Codec: Send + Sync {
    /// The format this codec implements
    fn format(&self) -> Format;

    /// Parse wire bytes into a pack
    fn decode(&self, bytes: &[u8]) -> Result<Pack>;

    /// Serialize a pack into wire bytes
    fn encode(&self, pack: &Pack, options: &EncodeOptions) -> Result<Vec<u8>>;
}

static CODECS: &[&dyn Codec] = &[
    #[cfg(feature = "json")]
    &crate::json::JsonCodec,
    #[cfg(feature = "json")]
    &crate::json::JsonLinesCodec,
    #[cfg(feature = "xml")]
    &crate::xml::XmlCodec,
    #[cfg(feature = "cbor")]
    &crate::cbor::CborCodec,
    #[cfg(feature = "msgpack")]
    &crate::msgpack::MessagePackCodec,
    &CsvCodec,
    &LineProtocolCodec,
];

/// Find the codec for `format`
///
/// Fails with [`SenMLError::Unsupported`] when the format's cargo feature is disabled.
pub fn codec_for(format: Format) -> Result<&'static dyn Codec> {
    CODECS
        .iter()
        .copied()
        .find(|codec| codec.format() == format)
        .ok_or_else(|| SenMLError::unsupported(format, "this build"))
}

/// Find a codec by its short name
pub fn codec_by_name(name: &str) -> Result<&'static dyn Codec> {
    codec_for(name.parse()?)
}
