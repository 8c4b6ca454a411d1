//! # SenMLCat
//!
//! Converts SenML packs between wire formats, optionally resolving base fields, and
//! forwards the result to the console, an HTTP endpoint or a message broker.
//!
//! The format codecs and the normalizer live in [`senmlcat_senml`], re-exported here as
//! [`senml`]. This crate adds the I/O around them:
//!
//! - [`pipeline`]: decode, normalize, encode
//! - [`sink`]: forwarding destinations
//! - [`broker`]: produce requests over a persistent TCP connection
//! - [`serve`]: HTTP listener running the pipeline per request
//! - [`config`] and [`cli`]: settings shared by both binaries

pub mod broker;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod serve;
pub mod sink;

pub use config::{BrokerConfig, Config};
pub use error::{Error, Result};
pub use pipeline::{Output, Pipeline};
pub use senmlcat_senml as senml;
pub use sink::{Forwarder, Sink};
