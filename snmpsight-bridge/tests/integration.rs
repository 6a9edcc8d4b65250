//! Integration tests for snmpsight-bridge.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use num_bigint::BigUint;
use tokio::sync::watch;

use snmpsight_bridge::{
    Connector, DeviceTarget, EventSink, ItemError, ItemResult, ObjectType,
    PollError, RawValue, RawVarbind, SensorSpec, SessionHandle, SessionManager, SessionParams,
    SnmpsightConfig, TransportError, discovery,
};
use snmpsight_bridge_framework::BridgeConfig;
use snmpsight_common::{DecodedValue, Format, SensorReading, TopicBuilder, encode_reading};

const CONFIG: &str = r#"
{
    bridge: {
        name: "lab",
        targets: [
            {
                host: "192.168.1.1",
                name: "core-switch",
                version: "2c",
                scan_interval: 5,
                sensors: [
                    { oid: "1.3.6.1.2.1.1.5.0", name: "Hostname" },
                    { oid: "1.3.6.1.2.1.31.1.1.1.6.1", name: "WAN In", unit_of_measurement: "B" },
                    { oid: "1.3.6.1.2.1.1.3.0", name: "Uptime", unit_of_measurement: "s", transform: "value / 100" },
                    { oid: "1.3.6.1.2.1.99.1.0", name: "Missing" },
                ],
            },
        ],
    },
}
"#;

/// Agent answering every OID from a fixed table.
struct TableHandle {
    closed: watch::Sender<bool>,
}

fn lookup(oid: &str) -> ItemResult {
    match oid {
        "1.3.6.1.2.1.1.5.0" => Ok(RawVarbind::new(
            ObjectType::OctetString,
            RawValue::Bytes(b"core-switch-01".to_vec()),
        )),
        "1.3.6.1.2.1.31.1.1.1.6.1" => Ok(RawVarbind::new(
            ObjectType::Counter64,
            RawValue::Bytes(vec![0x01, 0, 0, 0, 0, 0, 0, 0, 0x2a]),
        )),
        "1.3.6.1.2.1.1.3.0" => Ok(RawVarbind::new(
            ObjectType::TimeTicks,
            RawValue::Unsigned(123_400),
        )),
        _ => Err(ItemError::NoSuchObject),
    }
}

#[async_trait]
impl SessionHandle for TableHandle {
    async fn get(&self, oids: &[String]) -> Result<Vec<ItemResult>, TransportError> {
        Ok(oids.iter().map(|oid| lookup(oid)).collect())
    }

    async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        let _ = rx.wait_for(|c| *c).await;
    }
}

#[derive(Default)]
struct TableConnector {
    seen: std::sync::Mutex<Vec<SessionParams>>,
}

#[async_trait]
impl Connector for TableConnector {
    async fn connect(&self, params: &SessionParams) -> Result<Arc<dyn SessionHandle>, TransportError> {
        self.seen.lock().unwrap().push(params.clone());
        let (closed, _) = watch::channel(false);
        Ok(Arc::new(TableHandle { closed }))
    }
}

#[derive(Default)]
struct Collect {
    published: Vec<(String, Vec<u8>)>,
    errors: Vec<(String, PollError)>,
}

#[async_trait]
impl EventSink for Collect {
    async fn on_response(&mut self, value: DecodedValue, sensor: &SensorSpec, target: &DeviceTarget) {
        let reading = SensorReading::new(&target.host, &sensor.name, &sensor.oid, value);
        let key = TopicBuilder::new().value_key(&target.host, &sensor.name);
        let payload = encode_reading(&reading, Format::Raw).unwrap();
        self.published.push((key, payload));
    }

    async fn on_error(&mut self, error: PollError, sensor: &SensorSpec, _target: &DeviceTarget) {
        self.errors.push((sensor.name.clone(), error));
    }
}

#[tokio::test(start_paused = true)]
async fn test_one_cycle_end_to_end() {
    let config = SnmpsightConfig::parse(CONFIG).expect("config should parse");
    let connector = Arc::new(TableConnector::default());

    let mut manager = SessionManager::new(connector.clone(), config.bridge.targets.clone());
    let mut events = manager.events().unwrap();
    manager.start_all();

    // Stop after the first cycle so the channel closes once the drivers exit.
    let mut sink = Collect::default();
    for _ in 0..4 {
        let event = events.recv().await.unwrap();
        sink.dispatch(event).await;
    }
    manager.stop_all();
    drop(manager);
    let sink = SessionManager::run(events, sink).await;

    let params = connector.seen.lock().unwrap();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].address, "192.168.1.1:161");
    assert_eq!(params[0].timeout, Duration::from_millis(2500));

    let published: Vec<(&str, String)> = sink
        .published
        .iter()
        .map(|(k, v)| (k.as_str(), String::from_utf8(v.clone()).unwrap()))
        .collect();
    assert_eq!(
        published,
        vec![
            ("snmpsight/192_168_1_1/hostname", "core-switch-01".to_string()),
            ("snmpsight/192_168_1_1/wan_in", "18446744073709551658".to_string()),
            ("snmpsight/192_168_1_1/uptime", "1234".to_string()),
        ]
    );

    assert_eq!(sink.errors.len(), 1);
    assert_eq!(sink.errors[0].0, "Missing");
    assert!(matches!(sink.errors[0].1, PollError::Item(ItemError::NoSuchObject)));
}

#[test]
fn test_counter64_exact_in_json_envelope() {
    let value = DecodedValue::BigInt(BigUint::from(u64::MAX));
    let reading = SensorReading::new("10.0.0.1", "WAN In", "1.3.6.1.2.1.31.1.1.1.6.1", value);

    let json = encode_reading(&reading, Format::Json).unwrap();
    let doc: serde_json::Value = serde_json::from_slice(&json).unwrap();
    assert_eq!(doc["value"], serde_json::json!(u64::MAX));
}

#[test]
fn test_discovery_for_configured_sensors() {
    let config = SnmpsightConfig::parse(CONFIG).unwrap();
    let docs = discovery::build_all(&TopicBuilder::new(), &config.bridge);

    assert_eq!(docs.len(), 4);
    assert_eq!(docs[0].0, "homeassistant/sensor/lab/192_168_1_1_hostname/config");
    assert_eq!(docs[0].1.device.via_device, "lab");
    assert_eq!(docs[0].1.device.name, "core-switch");
    assert!(docs[0].1.unique_id.starts_with("lab."));
    assert_eq!(docs[1].1.unit_of_measurement.as_deref(), Some("B"));
}

#[test]
fn test_invalid_configs_rejected() {
    let v3_without_user = r#"{ bridge: { targets: [ { host: "10.0.0.1", version: "3",
        sensors: [ { oid: "1.3.6.1.2.1.1.3.0", name: "Uptime" } ] } ] } }"#;
    assert!(SnmpsightConfig::parse(v3_without_user).is_err());

    let v1_with_user = r#"{ bridge: { targets: [ { host: "10.0.0.1", username: "admin",
        sensors: [ { oid: "1.3.6.1.2.1.1.3.0", name: "Uptime" } ] } ] } }"#;
    assert!(SnmpsightConfig::parse(v1_with_user).is_err());

    let zero_interval = r#"{ bridge: { targets: [ { host: "10.0.0.1", scan_interval: 0,
        sensors: [ { oid: "1.3.6.1.2.1.1.3.0", name: "Uptime" } ] } ] } }"#;
    assert!(SnmpsightConfig::parse(zero_interval).is_err());
}

#[test]
fn test_sample_config_is_valid() {
    let config = SnmpsightConfig::parse(include_str!("../../configs/snmpsight.json5"))
        .expect("sample config should be valid");

    assert_eq!(config.bridge.targets.len(), 2);
    assert_eq!(config.sensor_count(), 5);
    assert!(config.bridge.targets[0].sensors[3].binary_sensor);
}
