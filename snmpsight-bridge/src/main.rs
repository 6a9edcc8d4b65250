//! snmpsight-bridge: polls SNMP agents and publishes decoded values to Zenoh.

use std::sync::Arc;

use anyhow::{Context, Result};

use snmpsight_bridge::{SessionManager, SnmpConnector, SnmpsightConfig, ZenohSink, discovery};
use snmpsight_bridge_framework::{BridgeArgs, BridgeConfig, BridgeRunner};

#[tokio::main]
async fn main() -> Result<()> {
    let args = BridgeArgs::parse_with_default("snmpsight.json5");

    let config = SnmpsightConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    let bridge_name = config.bridge.name.clone();
    let mut runner = BridgeRunner::new_with_args(bridge_name, config, Some(&args))
        .await
        .context("Failed to start bridge")?;

    let settings = runner.config().bridge.clone();
    let publisher = runner.publisher();

    tracing::info!(
        config = ?args.config,
        targets = settings.targets.len(),
        sensors = runner.config().sensor_count(),
        key_prefix = %settings.key_prefix,
        "Configuration loaded"
    );

    discovery::publish_all(&publisher, &settings).await;

    let mut manager = SessionManager::new(Arc::new(SnmpConnector::new()), settings.targets.clone());
    let events = manager
        .events()
        .context("Event receiver already taken")?;

    runner.spawn(async move {
        SessionManager::run(events, ZenohSink::new(publisher)).await;
    });

    manager.start_all();

    let metadata = serde_json::json!({
        "targets": settings.targets.iter().map(|t| t.display_name()).collect::<Vec<_>>(),
        "sensors": runner.config().sensor_count(),
        "format": runner.config().format(),
    });

    runner
        .run_with_shutdown(Some(metadata), move || manager.stop_all())
        .await
        .context("Bridge failed")
}
