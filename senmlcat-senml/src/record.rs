//! SenML Record types and values

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use serde::{Deserialize, Serialize};

use crate::{Result, SenMLError};

/// Base version assumed when a pack never declares `bver`
pub const DEFAULT_BASE_VERSION: i32 = 5;

/// A SenML Record represents a single sensor measurement or a carrier of base fields
///
/// Scalar fields use their zero value (`""`, `0.0`, `0`) as "unset": they are never
/// written to the wire when unset, and an explicit zero on the wire decodes as unset.
/// The value union and the sum are real options, so `Some(0.0)` survives a round trip.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "WireRecord", into = "WireRecord")]
pub struct Record {
    /// Base Name - prefix for this and subsequent record names
    pub base_name: String,

    /// Base Time - offset added to this and subsequent record times
    pub base_time: f64,

    /// Base Unit - unit for records that carry none of their own
    pub base_unit: String,

    /// Base Version - SenML version for this and subsequent records
    pub base_version: i32,

    /// Link - opaque link text carried through untouched
    pub link: String,

    /// Name - identifies the sensor or parameter
    pub name: String,

    /// Unit - SI unit or custom unit string
    pub unit: String,

    /// Time - seconds; relative to now when <= 0 after base time is applied
    pub time: f64,

    /// Update Time - maximum time before the value is considered stale
    pub update_time: f64,

    /// The measured value, if any
    pub value: Option<Value>,

    /// Sum - integrated value over time
    pub sum: Option<f64>,
}

/// The value union of a record
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Numeric value (`v`)
    Float(f64),
    /// String value (`vs`)
    String(String),
    /// Opaque data, kept as the base64 text found on the wire (`vd`)
    Data(String),
    /// Boolean value (`vb`)
    Bool(bool),
}

impl Value {
    /// The wire key carrying this variant
    pub fn key(&self) -> &'static str {
        match self {
            Value::Float(_) => "v",
            Value::String(_) => "vs",
            Value::Data(_) => "vd",
            Value::Bool(_) => "vb",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Decode opaque data into bytes
    ///
    /// Returns `None` for other variants or when the text is not base64. Padding is
    /// optional.
    pub fn data_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Value::Data(text) => STANDARD
                .decode(text)
                .or_else(|_| STANDARD_NO_PAD.decode(text))
                .ok(),
            _ => None,
        }
    }
}

impl Record {
    /// Create a new empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record with a numeric value
    pub fn with_value<S: Into<String>>(name: S, value: f64) -> Self {
        Self {
            name: name.into(),
            value: Some(Value::Float(value)),
            ..Default::default()
        }
    }

    /// Create a record with a string value
    pub fn with_string_value<S: Into<String>, V: Into<String>>(name: S, value: V) -> Self {
        Self {
            name: name.into(),
            value: Some(Value::String(value.into())),
            ..Default::default()
        }
    }

    /// Create a record with a boolean value
    pub fn with_bool_value<S: Into<String>>(name: S, value: bool) -> Self {
        Self {
            name: name.into(),
            value: Some(Value::Bool(value)),
            ..Default::default()
        }
    }

    /// Create a record with binary data, base64 encoded
    pub fn with_data_value<S: Into<String>>(name: S, data: &[u8]) -> Self {
        Self {
            name: name.into(),
            value: Some(Value::Data(STANDARD.encode(data))),
            ..Default::default()
        }
    }

    /// Set the name for this record
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Set the unit for this record
    pub fn with_unit<S: Into<String>>(mut self, unit: S) -> Self {
        self.unit = unit.into();
        self
    }

    /// Set the timestamp for this record
    pub fn with_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    /// Set the update time for this record
    pub fn with_update_time(mut self, update_time: f64) -> Self {
        self.update_time = update_time;
        self
    }

    /// Set the sum value for this record
    pub fn with_sum(mut self, sum: f64) -> Self {
        self.sum = Some(sum);
        self
    }

    pub fn with_link<S: Into<String>>(mut self, link: S) -> Self {
        self.link = link.into();
        self
    }

    pub fn with_base_name<S: Into<String>>(mut self, base_name: S) -> Self {
        self.base_name = base_name.into();
        self
    }

    pub fn with_base_time(mut self, base_time: f64) -> Self {
        self.base_time = base_time;
        self
    }

    pub fn with_base_unit<S: Into<String>>(mut self, base_unit: S) -> Self {
        self.base_unit = base_unit.into();
        self
    }

    pub fn with_base_version(mut self, base_version: i32) -> Self {
        self.base_version = base_version;
        self
    }

    /// Check if this record has any value
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Check if this record survives normalization
    ///
    /// Numeric, non-empty string and boolean values count. Opaque data alone does not.
    pub fn carries_measurement(&self) -> bool {
        match &self.value {
            Some(Value::Float(_)) | Some(Value::Bool(_)) => true,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Data(_)) | None => false,
        }
    }

    /// The numeric value, if this record has one
    pub fn value_f64(&self) -> Option<f64> {
        self.value.as_ref().and_then(Value::as_f64)
    }

    /// Check if this record declares any base field
    pub fn has_base_fields(&self) -> bool {
        !self.base_name.is_empty()
            || self.base_time != 0.0
            || !self.base_unit.is_empty()
            || self.base_version != 0
    }

    /// Check that every numeric field is finite
    pub fn validate(&self) -> Result<()> {
        let numbers = [
            ("bt", Some(self.base_time)),
            ("t", Some(self.time)),
            ("ut", Some(self.update_time)),
            ("v", self.value_f64()),
            ("s", self.sum),
        ];

        for (field, number) in numbers {
            if let Some(n) = number {
                if !n.is_finite() {
                    return Err(SenMLError::invalid_field_value(field, n.to_string()));
                }
            }
        }

        Ok(())
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Self {
            value: Some(value),
            ..Default::default()
        }
    }
}

/// Flat wire shape shared by the serde formats and the XML codec
///
/// Field order is the emission order for the map-based encodings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct WireRecord {
    #[serde(rename = "bn", default, skip_serializing_if = "Option::is_none")]
    pub(crate) base_name: Option<String>,
    #[serde(
        rename = "bt",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "number::serialize"
    )]
    pub(crate) base_time: Option<f64>,
    #[serde(rename = "bu", default, skip_serializing_if = "Option::is_none")]
    pub(crate) base_unit: Option<String>,
    #[serde(rename = "bver", default, skip_serializing_if = "Option::is_none")]
    pub(crate) base_version: Option<i32>,
    #[serde(rename = "l", default, skip_serializing_if = "Option::is_none")]
    pub(crate) link: Option<String>,
    #[serde(rename = "n", default, skip_serializing_if = "Option::is_none")]
    pub(crate) name: Option<String>,
    #[serde(rename = "u", default, skip_serializing_if = "Option::is_none")]
    pub(crate) unit: Option<String>,
    #[serde(
        rename = "t",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "number::serialize"
    )]
    pub(crate) time: Option<f64>,
    #[serde(
        rename = "ut",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "number::serialize"
    )]
    pub(crate) update_time: Option<f64>,
    #[serde(
        rename = "v",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "number::serialize"
    )]
    pub(crate) value: Option<f64>,
    #[serde(rename = "vs", default, skip_serializing_if = "Option::is_none")]
    pub(crate) string_value: Option<String>,
    #[serde(rename = "vd", default, skip_serializing_if = "Option::is_none")]
    pub(crate) data_value: Option<String>,
    #[serde(rename = "vb", default, skip_serializing_if = "Option::is_none")]
    pub(crate) bool_value: Option<bool>,
    #[serde(
        rename = "s",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "number::serialize"
    )]
    pub(crate) sum: Option<f64>,
}

impl TryFrom<WireRecord> for Record {
    type Error = SenMLError;

    fn try_from(wire: WireRecord) -> Result<Self> {
        let mut values = [
            wire.value.map(Value::Float),
            non_empty(wire.string_value.unwrap_or_default()).map(Value::String),
            non_empty(wire.data_value.unwrap_or_default()).map(Value::Data),
            wire.bool_value.map(Value::Bool),
        ]
        .into_iter()
        .flatten();

        let value = values.next();
        if let Some(extra) = values.next() {
            return Err(SenMLError::invalid_data(format!(
                "record carries more than one value field (found '{}' and '{}')",
                value.as_ref().map(Value::key).unwrap_or_default(),
                extra.key()
            )));
        }

        Ok(Record {
            base_name: wire.base_name.unwrap_or_default(),
            base_time: wire.base_time.unwrap_or_default(),
            base_unit: wire.base_unit.unwrap_or_default(),
            base_version: wire.base_version.unwrap_or_default(),
            link: wire.link.unwrap_or_default(),
            name: wire.name.unwrap_or_default(),
            unit: wire.unit.unwrap_or_default(),
            time: wire.time.unwrap_or_default(),
            update_time: wire.update_time.unwrap_or_default(),
            value,
            sum: wire.sum,
        })
    }
}

impl From<Record> for WireRecord {
    fn from(record: Record) -> Self {
        let mut wire = WireRecord {
            base_name: non_empty(record.base_name),
            base_time: non_zero(record.base_time),
            base_unit: non_empty(record.base_unit),
            base_version: (record.base_version != 0).then_some(record.base_version),
            link: non_empty(record.link),
            name: non_empty(record.name),
            unit: non_empty(record.unit),
            time: non_zero(record.time),
            update_time: non_zero(record.update_time),
            sum: record.sum,
            ..Default::default()
        };

        match record.value {
            Some(Value::Float(v)) => wire.value = Some(v),
            Some(Value::String(s)) => wire.string_value = non_empty(s),
            Some(Value::Data(d)) => wire.data_value = non_empty(d),
            Some(Value::Bool(b)) => wire.bool_value = Some(b),
            None => {}
        }

        wire
    }
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

fn non_zero(n: f64) -> Option<f64> {
    (n != 0.0).then_some(n)
}

/// Numbers are written as integers in text formats when they have no fractional part,
/// so `10.0` is emitted as `10`. Binary formats always keep the float encoding.
pub(crate) mod number {
    use serde::Serializer;

    /// Largest magnitude below which an integral float converts to `i64` exactly
    const EXACT_INTEGER_LIMIT: f64 = 1e15;

    pub(crate) fn serialize<S: Serializer>(
        value: &Option<f64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match *value {
            Some(v) if serializer.is_human_readable() && is_integral(v) => {
                serializer.serialize_i64(v as i64)
            }
            Some(v) => serializer.serialize_f64(v),
            None => serializer.serialize_none(),
        }
    }

    pub(crate) fn is_integral(v: f64) -> bool {
        v.is_finite() && v.fract() == 0.0 && v.abs() < EXACT_INTEGER_LIMIT
    }
}
