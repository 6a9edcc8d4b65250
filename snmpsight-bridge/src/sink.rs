//! Publishes poll events to Zenoh.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, warn};

use snmpsight_bridge_framework::{Availability, Publisher};
use snmpsight_common::{DecodedValue, SensorReading};

use crate::config::{DeviceTarget, SensorSpec};
use crate::event::{EventSink, PollError};

/// Remembers the last availability published per sensor.
#[derive(Debug, Default)]
pub struct AvailabilityTracker {
    last: HashMap<(String, String), Availability>,
}

impl AvailabilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `availability` and report whether it differs from the last one.
    pub fn update(&mut self, host: &str, sensor: &str, availability: Availability) -> bool {
        let key = (host.to_string(), sensor.to_string());
        self.last.insert(key, availability) != Some(availability)
    }

    /// Forget a sensor so its next availability is published again.
    pub fn reset(&mut self, host: &str, sensor: &str) {
        self.last.remove(&(host.to_string(), sensor.to_string()));
    }
}

/// [`EventSink`] that publishes values and availability changes.
pub struct ZenohSink {
    publisher: Publisher,
    availability: AvailabilityTracker,
}

impl ZenohSink {
    pub fn new(publisher: Publisher) -> Self {
        Self {
            publisher,
            availability: AvailabilityTracker::new(),
        }
    }

    async fn set_availability(&mut self, host: &str, sensor: &str, availability: Availability) {
        if !self.availability.update(host, sensor, availability) {
            return;
        }

        if let Err(e) = self
            .publisher
            .publish_sensor_availability(host, sensor, availability)
            .await
        {
            warn!(host = %host, sensor = %sensor, error = %e, "Failed to publish availability");
            // Retry on the next event.
            self.availability.reset(host, sensor);
        }
    }
}

#[async_trait]
impl EventSink for ZenohSink {
    async fn on_response(&mut self, value: DecodedValue, sensor: &SensorSpec, target: &DeviceTarget) {
        debug!(
            device = %target.display_name(),
            sensor = %sensor.name,
            value = %value,
            "Sensor value"
        );

        let reading = SensorReading::new(&target.host, &sensor.name, &sensor.oid, value)
            .with_unit(sensor.unit_of_measurement.clone());

        if let Err(e) = self.publisher.publish_reading(&reading).await {
            warn!(host = %target.host, sensor = %sensor.name, error = %e, "Failed to publish reading");
        }

        self.set_availability(&target.host, &sensor.name, Availability::Online)
            .await;
    }

    async fn on_error(&mut self, error: PollError, sensor: &SensorSpec, target: &DeviceTarget) {
        warn!(
            device = %target.display_name(),
            host = %target.host,
            sensor = %sensor.name,
            oid = %sensor.oid,
            error = %error,
            "Sensor fetch failed"
        );

        self.set_availability(&target.host, &sensor.name, Availability::Offline)
            .await;
    }
}
