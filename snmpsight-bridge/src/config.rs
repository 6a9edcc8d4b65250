use serde::{Deserialize, Serialize};
use std::time::Duration;

use snmpsight_bridge_framework::{BridgeConfig, BridgeError};
use snmpsight_common::{Format, LoggingConfig, ZenohConfig};

use crate::oid::parse_oid;

/// Root configuration for the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnmpsightConfig {
    /// Zenoh connection settings.
    #[serde(default)]
    pub zenoh: ZenohConfig,

    /// Payload format for sensor values.
    #[serde(default)]
    pub serialization: Format,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Bridge and target settings.
    pub bridge: BridgeSettings,
}

/// Bridge-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeSettings {
    /// Bridge name, used in discovery ids and as `via_device`.
    #[serde(default = "default_bridge_name")]
    pub name: String,

    /// Key expression prefix (default: "snmpsight").
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Discovery document publishing.
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Devices to poll.
    #[serde(default)]
    pub targets: Vec<DeviceTarget>,
}

fn default_bridge_name() -> String {
    "snmpsight".to_string()
}

fn default_key_prefix() -> String {
    snmpsight_common::KEY_PREFIX.to_string()
}

/// Discovery document configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Publish one discovery document per sensor at startup.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Key prefix of discovery documents.
    #[serde(default = "default_discovery_prefix")]
    pub prefix: String,
}

fn default_true() -> bool {
    true
}

fn default_discovery_prefix() -> String {
    "homeassistant".to_string()
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: default_discovery_prefix(),
        }
    }
}

/// One remote SNMP agent and the sensors to fetch from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceTarget {
    /// Agent host name or address.
    pub host: String,

    /// Agent UDP port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Display name (defaults to the host).
    #[serde(default)]
    pub name: Option<String>,

    /// SNMP version ("1", "2c" or "3").
    #[serde(default)]
    pub version: SnmpVersion,

    /// Community string for v1/v2c (default "public").
    #[serde(default)]
    pub community: Option<String>,

    /// SNMPv3 user name.
    #[serde(default)]
    pub username: Option<String>,

    /// SNMPv3 authentication protocol.
    #[serde(default)]
    pub auth_protocol: Option<AuthProtocol>,

    /// SNMPv3 authentication key.
    #[serde(default)]
    pub auth_key: Option<String>,

    /// SNMPv3 privacy protocol.
    #[serde(default)]
    pub priv_protocol: Option<PrivProtocol>,

    /// SNMPv3 privacy key.
    #[serde(default)]
    pub priv_key: Option<String>,

    /// Polling interval in seconds.
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,

    /// Manufacturer shown in discovery documents.
    #[serde(default)]
    pub device_manufacturer: Option<String>,

    /// Model shown in discovery documents.
    #[serde(default)]
    pub device_model: Option<String>,

    /// Sensors fetched on every cycle, in request order.
    #[serde(default)]
    pub sensors: Vec<SensorSpec>,
}

fn default_port() -> u16 {
    161
}

fn default_scan_interval() -> u64 {
    10
}

impl DeviceTarget {
    /// Name shown to consumers.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.host)
    }

    /// Socket address string accepted by the SNMP client.
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Interval between fetch cycles.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval)
    }

    /// OIDs of all sensors, in order.
    pub fn oids(&self) -> Vec<String> {
        self.sensors.iter().map(|s| s.oid.clone()).collect()
    }

    fn has_usm_fields(&self) -> bool {
        self.username.is_some()
            || self.auth_protocol.is_some()
            || self.auth_key.is_some()
            || self.priv_protocol.is_some()
            || self.priv_key.is_some()
    }

    /// Check the credential invariant and per-sensor settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("Target host cannot be empty".to_string());
        }
        if self.scan_interval == 0 {
            return Err(format!("Target '{}' has a zero scan_interval", self.host));
        }
        if self.sensors.is_empty() {
            return Err(format!("Target '{}' has no sensors", self.host));
        }

        match self.version {
            SnmpVersion::V3 => {
                if self.username.as_deref().is_none_or(str::is_empty) {
                    return Err(format!(
                        "Target '{}' uses SNMPv3 but has no username",
                        self.host
                    ));
                }
                if self.community.is_some() {
                    return Err(format!(
                        "Target '{}' uses SNMPv3; community is not allowed",
                        self.host
                    ));
                }
            }
            SnmpVersion::V1 | SnmpVersion::V2c => {
                if self.has_usm_fields() {
                    return Err(format!(
                        "Target '{}' uses SNMP{}; username and auth/priv settings require version 3",
                        self.host, self.version
                    ));
                }
            }
        }

        for sensor in &self.sensors {
            if sensor.name.is_empty() {
                return Err(format!(
                    "Target '{}' has a sensor without a name (oid {})",
                    self.host, sensor.oid
                ));
            }
            parse_oid(&sensor.oid).map_err(|e| format!("Target '{}': {}", self.host, e))?;
        }

        Ok(())
    }
}

/// One value fetched from a device on every cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorSpec {
    /// Object identifier (dotted string).
    pub oid: String,

    /// Human-readable name.
    pub name: String,

    /// Unit shown by consumers.
    #[serde(default)]
    pub unit_of_measurement: Option<String>,

    /// Device class hint for consumers.
    #[serde(default)]
    pub device_class: Option<String>,

    /// Icon hint for consumers.
    #[serde(default)]
    pub icon: Option<String>,

    /// Announce as an on/off sensor instead of a value sensor.
    #[serde(default)]
    pub binary_sensor: bool,

    /// Expression applied to the decoded value (bound as `value`).
    #[serde(default)]
    pub transform: Option<String>,
}

/// SNMP protocol version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnmpVersion {
    #[default]
    #[serde(rename = "1", alias = "v1")]
    V1,
    #[serde(rename = "2c", alias = "v2c")]
    V2c,
    #[serde(rename = "3", alias = "v3")]
    V3,
}

impl std::fmt::Display for SnmpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnmpVersion::V1 => write!(f, "v1"),
            SnmpVersion::V2c => write!(f, "v2c"),
            SnmpVersion::V3 => write!(f, "v3"),
        }
    }
}

/// SNMPv3 authentication protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProtocol {
    Md5,
    #[serde(alias = "sha1")]
    Sha,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

/// SNMPv3 privacy protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivProtocol {
    Des,
    #[serde(alias = "aes128")]
    Aes,
    Aes192,
    Aes256,
}

impl SnmpsightConfig {
    /// Total number of sensors across all targets.
    pub fn sensor_count(&self) -> usize {
        self.bridge.targets.iter().map(|t| t.sensors.len()).sum()
    }
}

impl BridgeConfig for SnmpsightConfig {
    fn zenoh(&self) -> &ZenohConfig {
        &self.zenoh
    }

    fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    fn key_prefix(&self) -> &str {
        &self.bridge.key_prefix
    }

    fn format(&self) -> Format {
        self.serialization
    }

    fn validate(&self) -> snmpsight_bridge_framework::Result<()> {
        if self.bridge.key_prefix.is_empty() {
            return Err(BridgeError::validation("key_prefix cannot be empty"));
        }
        if self.bridge.targets.is_empty() {
            return Err(BridgeError::validation("At least one target is required"));
        }
        for target in &self.bridge.targets {
            target.validate().map_err(BridgeError::validation)?;
        }
        Ok(())
    }
}
