//! Decode, optionally normalize, encode
//!
//! A [`Pipeline`] is plain configuration and can be shared between requests; every call
//! works on its own pack.

use std::time::{Duration, Instant};

use senmlcat_senml::{EncodeOptions, Format, Pack, normalize_at, now_unix_seconds};
use tracing::debug;

use crate::Result;

/// One conversion from an input format to an output format
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    input: Format,
    output: Format,
    normalize: bool,
    options: EncodeOptions,
}

/// Result of running a pack through a [`Pipeline`]
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    /// Encoded bytes
    pub bytes: Vec<u8>,
    /// Media type of `bytes`
    pub content_type: &'static str,
    /// Records in the encoded pack
    pub records: usize,
}

impl Output {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Pipeline {
    pub fn new(input: Format, output: Format) -> Self {
        Self {
            input,
            output,
            normalize: false,
            options: EncodeOptions::default(),
        }
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn with_options(mut self, options: EncodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn input(&self) -> Format {
        self.input
    }

    pub fn output(&self) -> Format {
        self.output
    }

    pub fn normalizes(&self) -> bool {
        self.normalize
    }

    /// Decode `bytes` in the input format
    pub fn decode(&self, bytes: &[u8]) -> Result<Pack> {
        Ok(Pack::decode(bytes, self.input)?)
    }

    /// Run the full conversion against the wall clock
    pub fn process(&self, bytes: &[u8]) -> Result<Output> {
        self.process_at(bytes, now_unix_seconds())
    }

    /// Run the full conversion with `now` as the current Unix time in seconds
    pub fn process_at(&self, bytes: &[u8], now: i64) -> Result<Output> {
        let pack = self.decode(bytes)?;
        debug!(
            input = %self.input,
            records = pack.len(),
            "decoded pack"
        );

        let pack = if self.normalize {
            normalize_at(&pack, now)
        } else {
            pack
        };

        let encoded = pack.encode(self.output, &self.options)?;
        debug!(
            output = %self.output,
            records = pack.len(),
            bytes = encoded.len(),
            "encoded pack"
        );

        Ok(Output {
            bytes: encoded,
            content_type: self.output.content_type(),
            records: pack.len(),
        })
    }
}

/// Decode throughput measured by [`benchmark_decode`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeTiming {
    pub iterations: u32,
    pub elapsed: Duration,
}

impl DecodeTiming {
    pub fn micros_per_message(&self) -> f64 {
        if self.iterations == 0 {
            return 0.0;
        }
        self.elapsed.as_secs_f64() * 1.0e6 / f64::from(self.iterations)
    }

    pub fn messages_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return f64::INFINITY;
        }
        f64::from(self.iterations) / secs
    }
}

/// Decode `bytes` `iterations` times and report the elapsed time
pub fn benchmark_decode(pipeline: &Pipeline, bytes: &[u8], iterations: u32) -> Result<DecodeTiming> {
    let start = Instant::now();
    for _ in 0..iterations {
        pipeline.decode(bytes)?;
    }
    Ok(DecodeTiming {
        iterations,
        elapsed: start.elapsed(),
    })
}
