//! SNMP polling bridge.
//!
//! Each configured device target gets one [`PollingSession`] that keeps an
//! SNMP session open, fetches every sensor OID on a fixed interval, decodes
//! the results and emits one [`PollEvent`] per sensor. The [`SessionManager`]
//! fans those events into an [`EventSink`]; the bundled [`ZenohSink`]
//! publishes values and availability to Zenoh.
//!
//! # Key Expressions
//!
//! ```text
//! <key_prefix>/<host>/<sensor>          decoded value
//! <key_prefix>/<host>/<sensor>/status   "online" | "offline"
//! <key_prefix>/@/status                 bridge availability
//! ```

pub mod config;
pub mod decoder;
pub mod discovery;
pub mod event;
pub mod manager;
pub mod oid;
pub mod params;
pub mod poller;
pub mod sink;
pub mod snmp;
pub mod transform;
pub mod transport;

pub use config::{
    AuthProtocol, BridgeSettings, DeviceTarget, DiscoveryConfig, PrivProtocol, SensorSpec,
    SnmpVersion, SnmpsightConfig,
};
pub use decoder::{DecodeError, ObjectType, RawValue, RawVarbind, decode};
pub use discovery::DiscoveryDocument;
pub use event::{EventSink, PollError, PollEvent};
pub use manager::SessionManager;
pub use params::{Credentials, SecurityLevel, SessionParams, UsmUser};
pub use poller::{PollingSession, SessionError, SessionState};
pub use sink::{AvailabilityTracker, ZenohSink};
pub use snmp::SnmpConnector;
pub use transport::{Connector, ItemError, ItemResult, SessionHandle, TransportError};
