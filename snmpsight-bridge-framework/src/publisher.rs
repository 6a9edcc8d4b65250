//! Publisher for sending readings and documents to Zenoh.

use std::sync::Arc;

use snmpsight_common::{Format, SensorReading, TopicBuilder, encode_reading};

use crate::error::{BridgeError, Result};

/// Availability payloads published on status topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Online,
    Offline,
}

impl Availability {
    /// Text payload understood by availability consumers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Online => "online",
            Availability::Offline => "offline",
        }
    }
}

/// Publisher wrapping a Zenoh session.
///
/// Readings are encoded with the configured [`Format`]; documents are
/// always JSON; availability is plain text.
#[derive(Clone, Debug)]
pub struct Publisher {
    session: Arc<zenoh::Session>,
    topics: TopicBuilder,
    format: Format,
}

impl Publisher {
    /// Create a new publisher.
    pub fn new(session: Arc<zenoh::Session>, key_prefix: impl Into<String>, format: Format) -> Self {
        Self {
            session,
            topics: TopicBuilder::with_prefix(key_prefix),
            format,
        }
    }

    /// Topic builder for this publisher's prefix.
    pub fn topics(&self) -> &TopicBuilder {
        &self.topics
    }

    /// Get the serialization format.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Publish a reading on its sensor's value topic.
    pub async fn publish_reading(&self, reading: &SensorReading) -> Result<()> {
        let key = self.topics.value_key(&reading.host, &reading.sensor);
        let payload = encode_reading(reading, self.format)
            .map_err(|e| BridgeError::Encode(e.to_string()))?;

        self.publish_raw(&key, payload).await?;
        tracing::trace!(key = %key, "Published reading");
        Ok(())
    }

    /// Publish a sensor's availability.
    pub async fn publish_sensor_availability(
        &self,
        host: &str,
        sensor: &str,
        availability: Availability,
    ) -> Result<()> {
        let key = self.topics.sensor_status_key(host, sensor);
        self.publish_raw(&key, availability.as_str().as_bytes().to_vec())
            .await
    }

    /// Publish raw bytes to a full key.
    pub async fn publish_raw(&self, key: &str, payload: Vec<u8>) -> Result<()> {
        self.session
            .put(key, payload)
            .await
            .map_err(|e| BridgeError::publish(key, e))
    }

    /// Publish a JSON document to a full key.
    pub async fn publish_json<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let payload = serde_json::to_vec(value)?;
        self.publish_raw(key, payload).await
    }
}
