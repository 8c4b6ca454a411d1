//! JSON serialization support for SenML
//!
//! Two shapes are supported: the regular JSON array of records and JSON Lines, where
//! each record object sits on its own line.

use crate::format::{Codec, EncodeOptions, Format};
use crate::{Pack, Record, Result, SenMLError};

/// JSON array codec (`application/senml+json`)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn format(&self) -> Format {
        Format::Json
    }

    fn decode(&self, bytes: &[u8]) -> Result<Pack> {
        serde_json::from_slice::<Vec<Record>>(bytes)
            .map(Pack::from)
            .map_err(|e| SenMLError::decode(Format::Json, e.to_string()))
    }

    fn encode(&self, pack: &Pack, options: &EncodeOptions) -> Result<Vec<u8>> {
        pack.validate()
            .map_err(|e| SenMLError::encode(Format::Json, e.to_string()))?;

        let encoded = if options.pretty {
            serde_json::to_vec_pretty(&pack.records)
        } else {
            serde_json::to_vec(&pack.records)
        };
        encoded.map_err(|e| SenMLError::encode(Format::Json, e.to_string()))
    }
}

/// JSON Lines codec: one record object per `\n` terminated line
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLinesCodec;

impl Codec for JsonLinesCodec {
    fn format(&self) -> Format {
        Format::JsonLines
    }

    fn decode(&self, bytes: &[u8]) -> Result<Pack> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| SenMLError::decode(Format::JsonLines, e.to_string()))?;

        let mut pack = Pack::new();
        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record = serde_json::from_str::<Record>(line).map_err(|e| {
                SenMLError::decode(Format::JsonLines, format!("line {}: {}", i + 1, e))
            })?;
            pack.add_record(record);
        }
        Ok(pack)
    }

    fn encode(&self, pack: &Pack, _options: &EncodeOptions) -> Result<Vec<u8>> {
        pack.validate()
            .map_err(|e| SenMLError::encode(Format::JsonLines, e.to_string()))?;

        let mut out = Vec::new();
        for record in &pack.records {
            serde_json::to_writer(&mut out, record)
                .map_err(|e| SenMLError::encode(Format::JsonLines, e.to_string()))?;
            out.push(b'\n');
        }
        Ok(out)
    }
}

impl Pack {
    /// Serialize to a compact JSON string
    pub fn to_json(&self) -> Result<String> {
        self.to_json_with(&EncodeOptions::default())
    }

    /// Serialize to a two-space indented JSON string
    pub fn to_json_pretty(&self) -> Result<String> {
        self.to_json_with(&EncodeOptions::new().with_pretty(true))
    }

    /// Deserialize from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        JsonCodec.decode(json.as_bytes())
    }

    fn to_json_with(&self, options: &EncodeOptions) -> Result<String> {
        let bytes = JsonCodec.encode(self, options)?;
        String::from_utf8(bytes).map_err(|e| SenMLError::encode(Format::Json, e.to_string()))
    }
}
