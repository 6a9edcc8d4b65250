//! Errors raised by the shared snmpsight helpers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Zenoh or logging settings that cannot be applied.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Zenoh(#[from] zenoh::Error),

    /// A reading or document could not be put on the wire.
    #[error("cannot encode payload as {format}: {message}")]
    Encode {
        format: &'static str,
        message: String,
    },
}

impl Error {
    pub(crate) fn encode(format: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Encode {
            format,
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
