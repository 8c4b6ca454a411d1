//! Error types for SenML operations

use thiserror::Error;

use crate::format::Format;

/// Result type alias for SenML operations
pub type Result<T> = std::result::Result<T, SenMLError>;

/// Errors that can occur while decoding, encoding or inspecting SenML data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SenMLError {
    /// Malformed or unsupported wire bytes for the selected format
    #[error("Decode error ({format}): {message}")]
    Decode { format: Format, message: String },

    /// Serialization of an in-memory pack failed
    #[error("Encode error ({format}): {message}")]
    Encode { format: Format, message: String },

    /// The format does not implement the requested direction
    #[error("Format '{format}' does not support {operation}")]
    Unsupported {
        format: Format,
        operation: &'static str,
    },

    /// A format name did not match any known codec
    #[error("Unknown format: {name}")]
    UnknownFormat { name: String },

    /// Invalid SenML structure or data
    #[error("Invalid SenML data: {message}")]
    InvalidData { message: String },

    /// Invalid field value
    #[error("Invalid value for field '{field}': {value}")]
    InvalidFieldValue { field: String, value: String },
}

impl SenMLError {
    /// Create a decode error for `format`
    pub fn decode<S: Into<String>>(format: Format, message: S) -> Self {
        Self::Decode {
            format,
            message: message.into(),
        }
    }

    /// Create an encode error for `format`
    pub fn encode<S: Into<String>>(format: Format, message: S) -> Self {
        Self::Encode {
            format,
            message: message.into(),
        }
    }

    /// Create an unsupported-operation error
    pub fn unsupported(format: Format, operation: &'static str) -> Self {
        Self::Unsupported { format, operation }
    }

    /// Create an unknown format error
    pub fn unknown_format<S: Into<String>>(name: S) -> Self {
        Self::UnknownFormat { name: name.into() }
    }

    /// Create an invalid data error
    pub fn invalid_data<S: Into<String>>(message: S) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create an invalid field value error
    pub fn invalid_field_value<F: Into<String>, V: Into<String>>(field: F, value: V) -> Self {
        Self::InvalidFieldValue {
            field: field.into(),
            value: value.into(),
        }
    }

    /// True for errors raised while reading wire bytes
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::InvalidData { .. })
    }
}
