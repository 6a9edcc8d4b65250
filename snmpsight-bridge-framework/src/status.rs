//! Bridge status reporting.

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::publisher::{Availability, Publisher};

/// Bridge status document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeStatus {
    /// Bridge name.
    pub bridge: String,
    /// Bridge version.
    pub version: String,
    /// Current status ("online", "offline").
    pub status: String,
    /// Additional metadata (session count, targets).
    #[serde(flatten)]
    pub metadata: serde_json::Value,
}

impl BridgeStatus {
    fn with_availability(
        bridge: impl Into<String>,
        version: impl Into<String>,
        availability: Availability,
    ) -> Self {
        Self {
            bridge: bridge.into(),
            version: version.into(),
            status: availability.as_str().to_string(),
            metadata: serde_json::json!({}),
        }
    }

    /// Create a status in the "online" state.
    pub fn online(bridge: impl Into<String>, version: impl Into<String>) -> Self {
        Self::with_availability(bridge, version, Availability::Online)
    }

    /// Create a status in the "offline" state.
    pub fn offline(bridge: impl Into<String>, version: impl Into<String>) -> Self {
        Self::with_availability(bridge, version, Availability::Offline)
    }

    /// Add metadata to the status.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Publishes bridge availability on startup and shutdown.
///
/// Availability goes to `{prefix}/@/status` as plain text so that sensor
/// discovery documents can reference it; the full [`BridgeStatus`] goes to
/// `{prefix}/@/info`.
pub struct StatusPublisher {
    publisher: Publisher,
    bridge_name: String,
    version: String,
}

impl StatusPublisher {
    /// Create a new status publisher.
    pub fn new(
        publisher: Publisher,
        bridge_name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            publisher,
            bridge_name: bridge_name.into(),
            version: version.into(),
        }
    }

    /// Publish "online" status with optional metadata.
    pub async fn publish_online(&self, metadata: Option<serde_json::Value>) -> Result<()> {
        let mut status = BridgeStatus::online(&self.bridge_name, &self.version);
        if let Some(meta) = metadata {
            status = status.with_metadata(meta);
        }
        self.publish(&status, Availability::Online).await
    }

    /// Publish "offline" status.
    pub async fn publish_offline(&self) -> Result<()> {
        let status = BridgeStatus::offline(&self.bridge_name, &self.version);
        self.publish(&status, Availability::Offline).await
    }

    async fn publish(&self, status: &BridgeStatus, availability: Availability) -> Result<()> {
        let topics = self.publisher.topics();
        self.publisher
            .publish_json(&topics.bridge_info_key(), status)
            .await?;
        self.publisher
            .publish_raw(
                &topics.bridge_status_key(),
                availability.as_str().as_bytes().to_vec(),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_online() {
        let status = BridgeStatus::online("snmpsight", "0.1.0");
        assert_eq!(status.bridge, "snmpsight");
        assert_eq!(status.status, "online");
    }

    #[test]
    fn test_status_with_metadata() {
        let status = BridgeStatus::online("snmpsight", "0.1.0").with_metadata(serde_json::json!({
            "targets": ["10.0.0.1", "10.0.0.2"],
            "sensors": 12
        }));

        assert_eq!(status.metadata["targets"][0], "10.0.0.1");
        assert_eq!(status.metadata["sensors"], 12);
    }

    #[test]
    fn test_status_serialization() {
        let status = BridgeStatus::offline("snmpsight", "1.0.0")
            .with_metadata(serde_json::json!({ "sessions": 5 }));

        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"bridge\":\"snmpsight\""));
        assert!(json.contains("\"status\":\"offline\""));
        assert!(json.contains("\"sessions\":5"));
    }
}
