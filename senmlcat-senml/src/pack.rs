//! SenML Pack - ordered collection of SenML records

use serde::{Deserialize, Serialize};

use crate::format::{EncodeOptions, Format};
use crate::{Record, Result, SenMLError};

/// A SenML Pack represents an ordered collection of SenML records
///
/// Base fields declared by one record apply to every later record until overridden,
/// so the order of `records` is significant and is preserved by every codec.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pack {
    /// Array of SenML records
    pub records: Vec<Record>,
}

impl Pack {
    /// Create a new empty pack
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Add a record to this pack
    pub fn add_record(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Add multiple records to this pack
    pub fn add_records<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = Record>,
    {
        self.records.extend(records);
    }

    /// Get the number of records in this pack
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if this pack is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over records in this pack
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Get a mutable iterator over records
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Record> {
        self.records.iter_mut()
    }

    /// Check if any record still declares base fields
    pub fn has_base_fields(&self) -> bool {
        self.records.iter().any(Record::has_base_fields)
    }

    /// Check that every record holds only finite numbers
    pub fn validate(&self) -> Result<()> {
        for (i, record) in self.records.iter().enumerate() {
            record.validate().map_err(|e| {
                SenMLError::invalid_data(format!("Invalid record at index {}: {}", i, e))
            })?;
        }
        Ok(())
    }

    /// Resolve base fields against the wall clock, see [`crate::normalize`]
    pub fn normalize(&self) -> Pack {
        crate::normalize::normalize(self)
    }

    /// Decode a pack from `bytes` in the given format
    pub fn decode(bytes: &[u8], format: Format) -> Result<Self> {
        format.codec()?.decode(bytes)
    }

    /// Encode this pack into the given format
    pub fn encode(&self, format: Format, options: &EncodeOptions) -> Result<Vec<u8>> {
        format.codec()?.encode(self, options)
    }
}

impl FromIterator<Record> for Pack {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Record>> for Pack {
    fn from(records: Vec<Record>) -> Self {
        Self { records }
    }
}

impl IntoIterator for Pack {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a Pack {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
