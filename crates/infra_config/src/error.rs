//! Configuration errors.

use thiserror::Error;

/// Errors that can occur while loading or materialising configuration.
///
/// Configuration errors are fatal to session start and never retried.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// A required field is absent
    #[error("Missing required field '{key}' in {origin}")]
    MissingField { key: String, origin: String },

    /// A field is present but malformed
    #[error("Invalid value for '{key}' in {origin}: {message}")]
    InvalidValue {
        key: String,
        origin: String,
        message: String,
    },

    /// Reading or writing a configuration file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON
    #[error("Malformed JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Underlying config crate error
    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    /// Settings could not be rendered as TOML
    #[error("TOML serialisation error: {0}")]
    Toml(#[from] toml::ser::Error),
}

impl ConfigError {
    /// Create a missing field error.
    pub fn missing_field(key: &str, origin: impl Into<String>) -> Self {
        ConfigError::MissingField {
            key: key.to_string(),
            origin: origin.into(),
        }
    }

    /// Create an invalid value error.
    pub fn invalid_value(key: &str, origin: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            origin: origin.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error bound to a path.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }
}
