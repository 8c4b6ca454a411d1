//! Command line flags shared by both binaries

use std::path::PathBuf;

use clap::Args;
use senmlcat_senml::Format;
use tracing_subscriber::EnvFilter;

use crate::config::{BrokerConfig, Config};

/// Pipeline and forwarding flags
///
/// Flags override the configuration file; a flag left out keeps the file's value.
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    /// Input format (json, jsonl, xml, cbor, mpack)
    #[arg(short = 'I', long = "input", value_name = "FORMAT")]
    pub input: Option<Format>,

    /// Output format (json, jsonl, xml, cbor, mpack, csv, linp)
    #[arg(short = 'O', long = "output", value_name = "FORMAT")]
    pub output: Option<Format>,

    /// Resolve base names, times and units before encoding
    #[arg(long)]
    pub resolve: bool,

    /// Indent text output
    #[arg(short = 'i', long)]
    pub indent: bool,

    /// Write the output to stdout
    #[arg(long)]
    pub print: bool,

    /// POST the output to this URL
    #[arg(long, value_name = "URL")]
    pub post: Option<String>,

    /// Produce the output to the broker at this address
    #[arg(long, value_name = "HOST:PORT")]
    pub broker: Option<String>,

    /// Broker topic and line protocol measurement
    #[arg(long)]
    pub topic: Option<String>,

    /// TOML configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl PipelineArgs {
    /// Read `--config` if given, apply the flags on top and check the result
    pub fn load_config(&self) -> crate::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn apply(&self, config: &mut Config) {
        if let Some(input) = self.input {
            config.input_format = input;
        }
        if let Some(output) = self.output {
            config.output_format = output;
        }
        config.normalize |= self.resolve;
        config.pretty |= self.indent;
        config.print |= self.print;
        if let Some(url) = &self.post {
            config.post_url = Some(url.clone());
        }
        if let Some(topic) = &self.topic {
            config.topic = topic.clone();
        }
        if let Some(addr) = &self.broker {
            match &mut config.broker {
                Some(broker) => broker.addr = addr.clone(),
                None => config.broker = Some(BrokerConfig::new(addr.clone())),
            }
        }
    }
}

/// Install the global subscriber, preferring `RUST_LOG` over `level`
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
