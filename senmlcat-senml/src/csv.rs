//! CSV output for spreadsheets
//!
//! One line per numeric record: `name,excel_time,value[,unit]` terminated by `\r\n`.
//! The time column is an Excel serial date (days since 1899-12-30), so it can be
//! formatted as a date directly. Records without a numeric value are skipped and no
//! header row is written.

use std::fmt::Write as _;

use crate::format::{Codec, EncodeOptions, Format};
use crate::{Pack, Result, SenMLError};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Excel serial date of the Unix epoch
const EXCEL_UNIX_EPOCH: f64 = 25_569.0;

/// Encode-only CSV codec
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvCodec;

impl Codec for CsvCodec {
    fn format(&self) -> Format {
        Format::Csv
    }

    fn decode(&self, _bytes: &[u8]) -> Result<Pack> {
        Err(SenMLError::unsupported(Format::Csv, "decoding"))
    }

    fn encode(&self, pack: &Pack, _options: &EncodeOptions) -> Result<Vec<u8>> {
        let mut out = String::new();
        for record in pack {
            let Some(value) = record.value_f64() else {
                continue;
            };
            write!(
                out,
                "{},{:.6},{:.6}",
                record.name,
                excel_time(record.time),
                value
            )
            .map_err(|e| SenMLError::encode(Format::Csv, e.to_string()))?;
            if !record.unit.is_empty() {
                out.push(',');
                out.push_str(&record.unit);
            }
            out.push_str("\r\n");
        }
        Ok(out.into_bytes())
    }
}

/// Convert Unix seconds into an Excel serial date
pub fn excel_time(unix_seconds: f64) -> f64 {
    unix_seconds / SECONDS_PER_DAY + EXCEL_UNIX_EPOCH
}
