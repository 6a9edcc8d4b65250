use zenoh::Session;

use crate::config::ZenohConfig;
use crate::error::{Error, Result};

/// Open a Zenoh session with the configured mode and endpoints.
pub async fn connect(config: &ZenohConfig) -> Result<Session> {
    let mut zenoh_config = zenoh::Config::default();

    set_json(&mut zenoh_config, "mode", config.mode.as_str())?;
    if !config.connect.is_empty() {
        set_json(&mut zenoh_config, "connect/endpoints", &config.connect)?;
    }
    if !config.listen.is_empty() {
        set_json(&mut zenoh_config, "listen/endpoints", &config.listen)?;
    }

    tracing::info!(
        mode = %config.mode,
        connect = ?config.connect,
        listen = ?config.listen,
        "Connecting to Zenoh"
    );

    let session = zenoh::open(zenoh_config).await?;
    tracing::info!(zid = %session.zid(), "Connected to Zenoh");

    Ok(session)
}

fn set_json<T: serde::Serialize + ?Sized>(
    zenoh_config: &mut zenoh::Config,
    key: &str,
    value: &T,
) -> Result<()> {
    let json = serde_json::to_string(value)
        .map_err(|e| Error::Config(format!("zenoh {}: {}", key, e)))?;
    zenoh_config
        .insert_json5(key, &json)
        .map_err(|e| Error::Config(format!("zenoh {}: {}", key, e)))
}
