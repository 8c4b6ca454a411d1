//! Runtime configuration
//!
//! A [`Config`] is read from an optional TOML file and then overridden by command line
//! flags. Every field has a default, so an empty file is a valid configuration.
//!
//! ```toml
//! input_format = "xml"
//! output_format = "json"
//! normalize = true
//! topic = "plant-7"
//! post_url = "http://collector.local/senml"
//!
//! [broker]
//! addr = "127.0.0.1:9092"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use senmlcat_senml::{DEFAULT_TOPIC, EncodeOptions, Format};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::Pipeline;

/// Client id sent with every produce request unless configured otherwise
pub const DEFAULT_CLIENT_ID: &str = "SenMLCat-0.1";

/// Broker connection timeout
pub const DEFAULT_DIAL_TIMEOUT_MS: u64 = 2500;

/// HTTP forwarding request timeout
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;

/// Errors raised while loading or checking a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Wire format of incoming packs
    pub input_format: Format,

    /// Wire format of forwarded packs
    pub output_format: Format,

    /// Resolve base fields before encoding
    pub normalize: bool,

    /// Indent text output
    pub pretty: bool,

    /// Broker topic and line protocol measurement name
    pub topic: String,

    /// Write encoded output to stdout
    pub print: bool,

    /// POST encoded output to this URL
    pub post_url: Option<String>,

    /// Timeout for each POST, in milliseconds
    pub http_timeout_ms: u64,

    /// Produce encoded output to a broker
    pub broker: Option<BrokerConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_format: Format::Json,
            output_format: Format::Json,
            normalize: false,
            pretty: false,
            topic: DEFAULT_TOPIC.to_string(),
            print: false,
            post_url: None,
            http_timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
            broker: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrokerConfig {
    /// `host:port` of the broker
    pub addr: String,

    #[serde(default = "default_client_id")]
    pub client_id: String,

    #[serde(default)]
    pub partition: i32,

    #[serde(default = "default_dial_timeout_ms")]
    pub dial_timeout_ms: u64,
}

impl BrokerConfig {
    pub fn new<S: Into<String>>(addr: S) -> Self {
        Self {
            addr: addr.into(),
            client_id: default_client_id(),
            partition: 0,
            dial_timeout_ms: DEFAULT_DIAL_TIMEOUT_MS,
        }
    }

    pub fn dial_timeout(&self) -> Duration {
        Duration::from_millis(self.dial_timeout_ms)
    }
}

fn default_client_id() -> String {
    DEFAULT_CLIENT_ID.to_string()
}

fn default_dial_timeout_ms() -> u64 {
    DEFAULT_DIAL_TIMEOUT_MS
}

impl Config {
    /// Load and check a TOML configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.input_format.can_decode() {
            return Err(ConfigError::invalid(format!(
                "input format '{}' is output-only",
                self.input_format
            )));
        }

        if let Some(url) = &self.post_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::invalid(format!(
                    "post_url must be an http or https URL, got '{}'",
                    url
                )));
            }
        }

        if self.http_timeout_ms == 0 {
            return Err(ConfigError::invalid("http_timeout_ms must be positive"));
        }

        if let Some(broker) = &self.broker {
            if broker.addr.is_empty() {
                return Err(ConfigError::invalid("broker.addr must not be empty"));
            }
            if self.topic.is_empty() {
                return Err(ConfigError::invalid("topic must not be empty when a broker is set"));
            }
        }

        Ok(())
    }

    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions::new()
            .with_pretty(self.pretty)
            .with_topic(self.topic.clone())
    }

    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(self.input_format, self.output_format)
            .with_normalize(self.normalize)
            .with_options(self.encode_options())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.input_format, Format::Json);
        assert_eq!(config.topic, "senml");
        assert!(config.broker.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            output_format = "mpack"
            normalize = true

            [broker]
            addr = "10.0.0.1:9092"
            "#,
        )
        .unwrap();

        assert_eq!(config.output_format, Format::MessagePack);
        assert!(config.normalize);
        assert!(!config.pretty);
        let broker = config.broker.unwrap();
        assert_eq!(broker.client_id, DEFAULT_CLIENT_ID);
        assert_eq!(broker.dial_timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(toml::from_str::<Config>("colour = true").is_err());
    }

    #[test]
    fn test_validate_rejects_output_only_input() {
        let config = Config {
            input_format: Format::Csv,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("output-only"));
    }

    #[test]
    fn test_validate_rejects_bad_post_url() {
        let config = Config {
            post_url: Some("ftp://example.com".to_string()),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_encode_options_follow_config() {
        let config = Config {
            pretty: true,
            topic: "room".to_string(),
            ..Default::default()
        };
        let options = config.encode_options();
        assert!(options.pretty);
        assert_eq!(options.topic_or_default(), "room");
    }
}
