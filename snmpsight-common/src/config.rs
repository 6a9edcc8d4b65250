//! Settings shared by every snmpsight process: how to reach Zenoh and how to log.

use serde::{Deserialize, Serialize};

/// Role the bridge takes in the Zenoh network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZenohMode {
    #[default]
    Peer,
    Client,
    Router,
}

impl ZenohMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZenohMode::Peer => "peer",
            ZenohMode::Client => "client",
            ZenohMode::Router => "router",
        }
    }
}

impl std::fmt::Display for ZenohMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `zenoh` section of the config file.
///
/// `connect` only matters in client mode, `listen` in peer and router mode.
/// Both may be left empty to rely on scouting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ZenohConfig {
    pub mode: ZenohMode,
    pub connect: Vec<String>,
    pub listen: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per event, for log shippers.
    Json,
}

/// `logging` section of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `"info"` or `"snmpsight_bridge=debug"`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl LoggingConfig {
    /// Same output format, different filter.
    pub fn with_level(&self, level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            format: self.format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sections {
        #[serde(default)]
        zenoh: ZenohConfig,
        #[serde(default)]
        logging: LoggingConfig,
    }

    #[test]
    fn test_sections_parse() {
        let sections: Sections = serde_json::from_str(
            r#"{
                "zenoh": { "mode": "client", "connect": ["tcp/localhost:7447"] },
                "logging": { "level": "debug", "format": "json" }
            }"#,
        )
        .unwrap();

        assert_eq!(sections.zenoh.mode, ZenohMode::Client);
        assert_eq!(sections.zenoh.connect, vec!["tcp/localhost:7447"]);
        assert!(sections.zenoh.listen.is_empty());
        assert_eq!(sections.logging.level, "debug");
        assert_eq!(sections.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_missing_sections_default() {
        let sections: Sections = serde_json::from_str("{}").unwrap();

        assert_eq!(sections.zenoh, ZenohConfig::default());
        assert_eq!(sections.zenoh.mode.to_string(), "peer");
        assert_eq!(sections.logging, LoggingConfig::default());
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let result: Result<ZenohConfig, _> = serde_json::from_str(r#"{ "mode": "mesh" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_level_override_keeps_format() {
        let logging = LoggingConfig {
            level: "warn".to_string(),
            format: LogFormat::Json,
        };

        let overridden = logging.with_level("trace");
        assert_eq!(overridden.level, "trace");
        assert_eq!(overridden.format, LogFormat::Json);
    }
}
