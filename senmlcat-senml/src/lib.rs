//! # SenMLCat SenML - Sensor Measurement Lists for Rust
//!
//! The record model, wire codecs and canonicalizer behind `senmlcat`, following
//! [RFC 8428](https://tools.ietf.org/html/rfc8428).
//!
//! A pack is an ordered list of records. Records may declare base fields (base name,
//! base time, base unit, base version) that apply to themselves and every later record.
//! [`normalize`] resolves them so that each record stands on its own.
//!
//! ## Formats
//!
//! | format        | decode | encode | cargo feature |
//! |---------------|--------|--------|---------------|
//! | JSON          | yes    | yes    | `json`        |
//! | JSON Lines    | yes    | yes    | `json`        |
//! | XML           | yes    | yes    | `xml`         |
//! | CBOR          | yes    | yes    | `cbor`        |
//! | MessagePack   | yes    | yes    | `msgpack`     |
//! | CSV           | no     | yes    |               |
//! | Line Protocol | no     | yes    |               |
//!
//! ## Quick Start
//!
//! ```rust
//! use senmlcat_senml::{EncodeOptions, Format, Pack, PackBuilder, Result};
//!
//! fn example() -> Result<()> {
//!     let pack = PackBuilder::new()
//!         .base_name("urn:dev:sensor1/")
//!         .base_unit("Cel")
//!         .add_value("temperature", 22.5)
//!         .build();
//!
//!     let json = pack.normalize().encode(Format::Json, &EncodeOptions::default())?;
//!     let back = Pack::decode(&json, Format::Json)?;
//!     assert_eq!(back.records[0].name, "urn:dev:sensor1/temperature");
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod builder;
pub mod csv;
pub mod error;
pub mod format;
pub mod line_protocol;
pub mod normalize;
pub mod pack;
pub mod record;

#[cfg(feature = "json")]
pub mod json;

#[cfg(feature = "cbor")]
pub mod cbor;

#[cfg(feature = "xml")]
pub mod xml;

#[cfg(feature = "msgpack")]
pub mod msgpack;

// Re-export main types
pub use builder::{PackBuilder, TimeSeriesBuilder};
pub use error::{Result, SenMLError};
pub use format::{Codec, DEFAULT_TOPIC, EncodeOptions, Format, codec_by_name, codec_for};
pub use normalize::{normalize, normalize_at, now_unix_seconds};
pub use pack::Pack;
pub use record::{DEFAULT_BASE_VERSION, Record, Value};
