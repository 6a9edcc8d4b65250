//! Owns the polling sessions and fans their events into one sink.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::DeviceTarget;
use crate::event::{EventSink, PollEvent};
use crate::poller::PollingSession;
use crate::transport::Connector;

/// Capacity of the shared event channel.
const EVENT_CHANNEL_SIZE: usize = 1024;

/// One polling session per configured target, all feeding one channel.
pub struct SessionManager {
    sessions: Vec<PollingSession>,
    events: Option<mpsc::Receiver<PollEvent>>,
}

impl SessionManager {
    pub fn new(connector: Arc<dyn Connector>, targets: impl IntoIterator<Item = DeviceTarget>) -> Self {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
        let sessions = targets
            .into_iter()
            .map(|target| PollingSession::new(Arc::new(target), connector.clone(), tx.clone()))
            .collect();

        Self {
            sessions,
            events: Some(rx),
        }
    }

    pub fn sessions(&self) -> &[PollingSession] {
        &self.sessions
    }

    /// Start every session that is not already running.
    pub fn start_all(&mut self) {
        for session in &mut self.sessions {
            let device = session.target().display_name().to_string();
            match session.start() {
                Ok(()) => debug!(device = %device, "Polling session started"),
                Err(e) => warn!(device = %device, error = %e, "Polling session not started"),
            }
        }
        info!(sessions = self.sessions.len(), "Polling sessions started");
    }

    /// Stop every session.
    pub fn stop_all(&self) {
        for session in &self.sessions {
            session.stop();
        }
        info!(sessions = self.sessions.len(), "Polling sessions stopped");
    }

    /// Hand out the event receiver. Returns `None` after the first call.
    pub fn events(&mut self) -> Option<mpsc::Receiver<PollEvent>> {
        self.events.take()
    }

    /// Forward events to `sink` until every session is gone, then hand the
    /// sink back.
    pub async fn run<S: EventSink>(mut events: mpsc::Receiver<PollEvent>, mut sink: S) -> S {
        while let Some(event) = events.recv().await {
            sink.dispatch(event).await;
        }
        debug!("Event channel closed");
        sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::watch;

    use crate::config::{SensorSpec, SnmpVersion};
    use crate::decoder::{ObjectType, RawValue, RawVarbind};
    use crate::event::PollError;
    use crate::params::SessionParams;
    use crate::poller::SessionState;
    use crate::transport::{ItemResult, SessionHandle, TransportError};
    use snmpsight_common::DecodedValue;

    struct FixedHandle {
        closed: watch::Sender<bool>,
    }

    #[async_trait]
    impl SessionHandle for FixedHandle {
        async fn get(&self, oids: &[String]) -> Result<Vec<ItemResult>, TransportError> {
            Ok(oids
                .iter()
                .map(|_| Ok(RawVarbind::new(ObjectType::Integer, RawValue::Integer(42))))
                .collect())
        }

        async fn closed(&self) {
            let mut rx = self.closed.subscribe();
            let _ = rx.wait_for(|c| *c).await;
        }
    }

    struct FixedConnector;

    #[async_trait]
    impl Connector for FixedConnector {
        async fn connect(
            &self,
            _params: &SessionParams,
        ) -> Result<Arc<dyn SessionHandle>, TransportError> {
            let (closed, _) = watch::channel(false);
            Ok(Arc::new(FixedHandle { closed }))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        responses: Vec<(String, String, DecodedValue)>,
        errors: usize,
    }

    #[async_trait]
    impl EventSink for RecordingSink {
        async fn on_response(
            &mut self,
            value: DecodedValue,
            sensor: &SensorSpec,
            target: &DeviceTarget,
        ) {
            self.responses
                .push((target.host.clone(), sensor.name.clone(), value));
        }

        async fn on_error(&mut self, _error: PollError, _sensor: &SensorSpec, _target: &DeviceTarget) {
            self.errors += 1;
        }
    }

    fn target(host: &str) -> DeviceTarget {
        DeviceTarget {
            host: host.to_string(),
            port: 161,
            name: None,
            version: SnmpVersion::V1,
            community: None,
            username: None,
            auth_protocol: None,
            auth_key: None,
            priv_protocol: None,
            priv_key: None,
            scan_interval: 10,
            device_manufacturer: None,
            device_model: None,
            sensors: vec![SensorSpec {
                oid: "1.3.6.1.2.1.1.7.0".to_string(),
                name: "Services".to_string(),
                unit_of_measurement: None,
                device_class: None,
                icon: None,
                binary_sensor: false,
                transform: None,
            }],
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_from_all_targets() {
        let mut manager = SessionManager::new(
            Arc::new(FixedConnector),
            vec![target("10.0.0.1"), target("10.0.0.2")],
        );
        assert_eq!(manager.sessions().len(), 2);

        let mut events = manager.events().unwrap();
        assert!(manager.events().is_none());

        manager.start_all();

        let mut hosts = Vec::new();
        for _ in 0..2 {
            let event = events.recv().await.unwrap();
            hosts.push(event.target().host.clone());
        }
        hosts.sort();
        assert_eq!(hosts, vec!["10.0.0.1", "10.0.0.2"]);

        manager.stop_all();
        assert!(
            manager
                .sessions()
                .iter()
                .all(|s| s.state() == SessionState::Stopped)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_dispatches_until_closed() {
        let (tx, rx) = mpsc::channel(8);
        let t = Arc::new(target("10.0.0.9"));
        let sensor = Arc::new(t.sensors[0].clone());

        tx.send(PollEvent::Response {
            value: DecodedValue::Number(42.0),
            sensor: sensor.clone(),
            target: t.clone(),
        })
        .await
        .unwrap();
        tx.send(PollEvent::Error {
            error: PollError::Transport(Arc::new(TransportError::Closed)),
            sensor,
            target: t,
        })
        .await
        .unwrap();
        drop(tx);

        let sink = SessionManager::run(rx, RecordingSink::default()).await;

        assert_eq!(
            sink.responses,
            vec![(
                "10.0.0.9".to_string(),
                "Services".to_string(),
                DecodedValue::Number(42.0)
            )]
        );
        assert_eq!(sink.errors, 1);
    }
}
