//! CBOR serialization support for SenML
//!
//! Records are CBOR maps keyed by the short text labels used in JSON. Numbers keep
//! their float encoding; ciborium picks the shortest lossless width.

use crate::format::{Codec, EncodeOptions, Format};
use crate::{Pack, Record, Result, SenMLError};

/// CBOR codec (`application/senml+cbor`)
#[derive(Debug, Clone, Copy, Default)]
pub struct CborCodec;

impl Codec for CborCodec {
    fn format(&self) -> Format {
        Format::Cbor
    }

    fn decode(&self, bytes: &[u8]) -> Result<Pack> {
        ciborium::de::from_reader::<Vec<Record>, _>(bytes)
            .map(Pack::from)
            .map_err(|e| SenMLError::decode(Format::Cbor, e.to_string()))
    }

    fn encode(&self, pack: &Pack, _options: &EncodeOptions) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        ciborium::ser::into_writer(&pack.records, &mut buffer)
            .map_err(|e| SenMLError::encode(Format::Cbor, e.to_string()))?;
        Ok(buffer)
    }
}

impl Pack {
    /// Serialize this SenML pack to CBOR
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        CborCodec.encode(self, &EncodeOptions::default())
    }

    /// Deserialize a SenML pack from CBOR
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        CborCodec.decode(bytes)
    }
}
