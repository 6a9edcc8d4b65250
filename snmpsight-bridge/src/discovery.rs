//! Home Assistant style discovery documents, one per sensor.

use std::collections::HashSet;

use serde::Serialize;
use sha2::{Digest, Sha256};

use snmpsight_bridge_framework::Publisher;
use snmpsight_common::{TopicBuilder, slugify};

use crate::config::{BridgeSettings, DeviceTarget, SensorSpec};

/// Hex digits of the hash kept in unique ids.
const UNIQUE_ID_HEX_LEN: usize = 32;

/// Discovery document announcing one sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryDocument {
    pub name: String,
    pub unique_id: String,
    pub state_topic: String,
    pub availability: Vec<AvailabilityTopic>,
    pub availability_mode: String,
    pub device: DeviceInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityTopic {
    pub topic: String,
}

/// Device block shared by all sensors of a target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    pub name: String,
    pub identifiers: Vec<String>,
    pub via_device: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Stable id derived from the bridge name, host and OID.
pub fn unique_id(bridge: &str, host: &str, oid: &str) -> String {
    let digest = Sha256::digest(format!("{}-{}", host, oid).as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(UNIQUE_ID_HEX_LEN);
    format!("{}.{}", bridge, hex)
}

/// Key the document for `sensor` of the device at `host` is published on.
///
/// The object id joins host and sensor slugs so equally named sensors on
/// different devices do not overwrite each other.
pub fn discovery_key(prefix: &str, bridge: &str, host: &str, sensor: &SensorSpec) -> String {
    let component = if sensor.binary_sensor {
        "binary_sensor"
    } else {
        "sensor"
    };
    format!(
        "{}/{}/{}/{}_{}/config",
        prefix.trim_end_matches('/'),
        component,
        slugify(bridge),
        slugify(host),
        slugify(&sensor.name)
    )
}

/// Build the document for one sensor of one target.
pub fn build_document(
    topics: &TopicBuilder,
    bridge: &str,
    target: &DeviceTarget,
    sensor: &SensorSpec,
) -> DiscoveryDocument {
    DiscoveryDocument {
        name: sensor.name.clone(),
        unique_id: unique_id(bridge, &target.host, &sensor.oid),
        state_topic: topics.value_key(&target.host, &sensor.name),
        availability: vec![
            AvailabilityTopic {
                topic: topics.bridge_status_key(),
            },
            AvailabilityTopic {
                topic: topics.sensor_status_key(&target.host, &sensor.name),
            },
        ],
        availability_mode: "all".to_string(),
        device: DeviceInfo {
            name: target.display_name().to_string(),
            identifiers: vec![target.host.clone()],
            via_device: bridge.to_string(),
            manufacturer: target.device_manufacturer.clone(),
            model: target.device_model.clone(),
        },
        unit_of_measurement: sensor.unit_of_measurement.clone(),
        device_class: sensor.device_class.clone(),
        icon: sensor.icon.clone(),
    }
}

/// All `(key, document)` pairs for the configured targets.
pub fn build_all(topics: &TopicBuilder, settings: &BridgeSettings) -> Vec<(String, DiscoveryDocument)> {
    settings
        .targets
        .iter()
        .flat_map(|target| {
            target.sensors.iter().map(move |sensor| {
                (
                    discovery_key(&settings.discovery.prefix, &settings.name, &target.host, sensor),
                    build_document(topics, &settings.name, target, sensor),
                )
            })
        })
        .collect()
}

/// Publish every discovery document. Returns how many were published.
pub async fn publish_all(publisher: &Publisher, settings: &BridgeSettings) -> usize {
    if !settings.discovery.enabled {
        tracing::debug!("Discovery disabled");
        return 0;
    }

    let mut published = 0;
    let mut seen = HashSet::new();
    for (key, document) in build_all(publisher.topics(), settings) {
        if !seen.insert(key.clone()) {
            tracing::warn!(
                key = %key,
                sensor = %document.name,
                "Discovery key already used, document replaces the previous one"
            );
        }
        match publisher.publish_json(&key, &document).await {
            Ok(()) => published += 1,
            Err(e) => tracing::warn!(key = %key, error = %e, "Failed to publish discovery document"),
        }
    }

    tracing::info!(documents = published, "Published discovery documents");
    published
}
