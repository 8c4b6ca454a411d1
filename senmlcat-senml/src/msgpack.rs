//! MessagePack serialization support for SenML
//!
//! Records are written as maps keyed by the JSON labels, so packs produced by other
//! MessagePack SenML implementations decode regardless of their key order.

use crate::format::{Codec, EncodeOptions, Format};
use crate::{Pack, Record, Result, SenMLError};

/// MessagePack codec
#[derive(Debug, Clone, Copy, Default)]
pub struct MessagePackCodec;

impl Codec for MessagePackCodec {
    fn format(&self) -> Format {
        Format::MessagePack
    }

    fn decode(&self, bytes: &[u8]) -> Result<Pack> {
        rmp_serde::from_slice::<Vec<Record>>(bytes)
            .map(Pack::from)
            .map_err(|e| SenMLError::decode(Format::MessagePack, e.to_string()))
    }

    fn encode(&self, pack: &Pack, _options: &EncodeOptions) -> Result<Vec<u8>> {
        rmp_serde::to_vec_named(&pack.records)
            .map_err(|e| SenMLError::encode(Format::MessagePack, e.to_string()))
    }
}

impl Pack {
    /// Serialize this SenML pack to MessagePack
    pub fn to_msgpack(&self) -> Result<Vec<u8>> {
        MessagePackCodec.encode(self, &EncodeOptions::default())
    }

    /// Deserialize a SenML pack from MessagePack
    pub fn from_msgpack(bytes: &[u8]) -> Result<Self> {
        MessagePackCodec.decode(bytes)
    }
}
