use serde::Serialize;

use crate::error::{Error, Result};
use crate::telemetry::SensorReading;

/// Payload format for published sensor values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// The bare scalar rendered as text, as dashboards and home automation
    /// consumers expect on a state topic.
    #[default]
    Raw,

    /// JSON [`SensorReading`] envelope.
    Json,

    /// CBOR [`SensorReading`] envelope (compact binary).
    Cbor,
}

impl Format {
    /// Get the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Format::Raw => "text/plain",
            Format::Json => "application/json",
            Format::Cbor => "application/cbor",
        }
    }
}

/// Encode a structured value.
///
/// `Raw` has no meaning for structured documents and is encoded as JSON.
fn encode<T: Serialize>(value: &T, format: Format) -> Result<Vec<u8>> {
    match format {
        Format::Raw | Format::Json => serde_json::to_vec(value).map_err(|e| Error::encode("json", e)),
        Format::Cbor => {
            let mut buf = Vec::new();
            ciborium::into_writer(value, &mut buf).map_err(|e| Error::encode("cbor", e))?;
            Ok(buf)
        }
    }
}

/// Encode a sensor reading for its value topic.
pub fn encode_reading(reading: &SensorReading, format: Format) -> Result<Vec<u8>> {
    match format {
        Format::Raw => Ok(reading.value.to_string().into_bytes()),
        Format::Json | Format::Cbor => encode(reading, format),
    }
}
