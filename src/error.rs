//! Crate-level error type

use senmlcat_senml::SenMLError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::sink::ForwardError;

pub type Result<T> = std::result::Result<T, Error>;

/// Any failure while converting or forwarding a pack
#[derive(Debug, Error)]
pub enum Error {
    /// Decoding or encoding failed
    #[error(transparent)]
    Codec(#[from] SenMLError),

    /// A sink refused or failed to deliver the output
    #[error(transparent)]
    Forward(#[from] ForwardError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<crate::broker::BrokerError> for Error {
    fn from(err: crate::broker::BrokerError) -> Self {
        Error::Forward(ForwardError::Broker(err))
    }
}

impl Error {
    /// True when the input itself was at fault rather than a sink or the host
    pub fn is_input_error(&self) -> bool {
        matches!(self, Error::Codec(_))
    }
}
