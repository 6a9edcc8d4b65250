//! Version-specific session parameters derived from a device target.

use std::fmt;
use std::time::Duration;

use crate::config::{AuthProtocol, DeviceTarget, PrivProtocol, SnmpVersion};

/// Resends after the first attempt of every request.
pub const RETRIES: u32 = 3;

/// Multiplier applied to the timeout between attempts.
pub const BACKOFF: f64 = 1.0;

/// Upper bound on the per-attempt timeout.
pub const MAX_TIMEOUT: Duration = Duration::from_millis(5000);

/// Delay before reconnecting a lost session.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Community used when a v1/v2c target does not set one.
pub const DEFAULT_COMMUNITY: &str = "public";

/// USM security level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityLevel {
    NoAuthNoPriv,
    AuthNoPriv,
    AuthPriv,
}

impl SecurityLevel {
    /// Derive the level from which keys are configured.
    pub fn derive(auth_key: Option<&str>, priv_key: Option<&str>) -> Self {
        match (auth_key, priv_key) {
            (Some(_), Some(_)) => SecurityLevel::AuthPriv,
            (Some(_), None) => SecurityLevel::AuthNoPriv,
            _ => SecurityLevel::NoAuthNoPriv,
        }
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityLevel::NoAuthNoPriv => write!(f, "noAuthNoPriv"),
            SecurityLevel::AuthNoPriv => write!(f, "authNoPriv"),
            SecurityLevel::AuthPriv => write!(f, "authPriv"),
        }
    }
}

/// SNMPv3 user credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsmUser {
    pub name: String,
    pub level: SecurityLevel,
    pub auth_protocol: Option<AuthProtocol>,
    pub auth_key: Option<String>,
    pub priv_protocol: Option<PrivProtocol>,
    pub priv_key: Option<String>,
}

/// Credentials for one session; the variant follows the protocol version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Community(String),
    Usm(UsmUser),
}

/// Everything needed to open one SNMP session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionParams {
    /// Socket address string ("host:port").
    pub address: String,
    /// Host as configured.
    pub host: String,
    pub version: SnmpVersion,
    pub credentials: Credentials,
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Resends after the first attempt.
    pub retries: u32,
    pub backoff: f64,
}

impl SessionParams {
    /// Build parameters for a target.
    pub fn from_target(target: &DeviceTarget) -> Self {
        let credentials = match target.version {
            SnmpVersion::V3 => {
                let auth_key = target.auth_key.clone().filter(|k| !k.is_empty());
                let priv_key = target.priv_key.clone().filter(|k| !k.is_empty());
                Credentials::Usm(UsmUser {
                    name: target.username.clone().unwrap_or_default(),
                    level: SecurityLevel::derive(auth_key.as_deref(), priv_key.as_deref()),
                    auth_protocol: target.auth_protocol,
                    auth_key,
                    priv_protocol: target.priv_protocol,
                    priv_key,
                })
            }
            SnmpVersion::V1 | SnmpVersion::V2c => Credentials::Community(
                target
                    .community
                    .clone()
                    .unwrap_or_else(|| DEFAULT_COMMUNITY.to_string()),
            ),
        };

        Self {
            address: target.address(),
            host: target.host.clone(),
            version: target.version,
            credentials,
            timeout: derive_timeout(target.poll_interval()),
            retries: RETRIES,
            backoff: BACKOFF,
        }
    }

    /// Number of send attempts per request.
    pub fn attempts(&self) -> u32 {
        self.retries + 1
    }

    /// Timeout for the given zero-based attempt.
    pub fn attempt_timeout(&self, attempt: u32) -> Duration {
        self.timeout.mul_f64(self.backoff.powi(attempt as i32))
    }
}

/// Per-attempt timeout: half the poll interval, capped at 5 seconds.
pub fn derive_timeout(poll_interval: Duration) -> Duration {
    (poll_interval / 2).min(MAX_TIMEOUT)
}
