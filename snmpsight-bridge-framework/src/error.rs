//! Failures of the bridge plumbing: config loading, Zenoh setup and publishing.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// Startup setting that could not be applied (e.g. the tracing filter).
    #[error("configuration error: {0}")]
    Config(String),

    #[error("config file {path} does not exist")]
    ConfigNotFound { path: String },

    #[error("cannot parse config: {0}")]
    ConfigParse(String),

    /// The file parsed but describes something the bridge cannot run.
    #[error("invalid config: {0}")]
    ConfigValidation(String),

    #[error("cannot open Zenoh session: {0}")]
    ZenohConnection(String),

    #[error("cannot encode payload: {0}")]
    Encode(String),

    #[error("put on {key} failed: {message}")]
    Publish { key: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ConfigValidation(msg.into())
    }

    pub(crate) fn publish(key: &str, err: impl std::fmt::Display) -> Self {
        Self::Publish {
            key: key.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<json5::Error> for BridgeError {
    fn from(err: json5::Error) -> Self {
        Self::ConfigParse(err.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_error_names_key() {
        let err = BridgeError::publish("snmpsight/@/status", "session closed");
        assert_eq!(err.to_string(), "put on snmpsight/@/status failed: session closed");
    }

    #[test]
    fn test_json5_error_is_parse_error() {
        let err: BridgeError = json5::from_str::<serde_json::Value>("{ a: ")
            .unwrap_err()
            .into();
        assert!(matches!(err, BridgeError::ConfigParse(_)));
    }
}
