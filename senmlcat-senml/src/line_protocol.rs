//! InfluxDB line protocol output
//!
//! Each numeric record becomes `<topic>,n=<name>[,u=<unit>] v=<value> <time_ns>`.
//! The topic is the measurement name; the record name and unit are tags.

use crate::format::{Codec, EncodeOptions, Format};
use crate::{Pack, Result, SenMLError};

const NANOS_PER_SECOND: f64 = 1.0e9;

/// Encode-only line protocol codec
#[derive(Debug, Clone, Copy, Default)]
pub struct LineProtocolCodec;

impl Codec for LineProtocolCodec {
    fn format(&self) -> Format {
        Format::LineProtocol
    }

    fn decode(&self, _bytes: &[u8]) -> Result<Pack> {
        Err(SenMLError::unsupported(Format::LineProtocol, "decoding"))
    }

    fn encode(&self, pack: &Pack, options: &EncodeOptions) -> Result<Vec<u8>> {
        let measurement = escape(options.topic_or_default(), &[',', ' ']);

        let mut out = String::new();
        for record in pack {
            let Some(value) = record.value_f64() else {
                continue;
            };
            if !value.is_finite() || !record.time.is_finite() {
                return Err(SenMLError::encode(
                    Format::LineProtocol,
                    format!("record '{}' has a non-finite number", record.name),
                ));
            }

            out.push_str(&measurement);
            out.push_str(",n=");
            out.push_str(&escape_tag(&record.name));
            if !record.unit.is_empty() {
                out.push_str(",u=");
                out.push_str(&escape_tag(&record.unit));
            }
            out.push_str(&format!(" v={} {}\n", value, timestamp_ns(record.time)));
        }
        Ok(out.into_bytes())
    }
}

/// Seconds to whole nanoseconds, rounded
fn timestamp_ns(seconds: f64) -> i64 {
    (seconds * NANOS_PER_SECOND).round() as i64
}

fn escape_tag(text: &str) -> String {
    escape(text, &[',', ' ', '='])
}

fn escape(text: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
