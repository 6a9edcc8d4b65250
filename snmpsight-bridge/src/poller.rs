//! Per-device polling session.
//!
//! A [`PollingSession`] owns one SNMP session with one device. Once started,
//! its driver task connects, fetches every sensor on the configured interval
//! (first fetch immediately) and emits one [`PollEvent`] per sensor and cycle.
//! A lost session cancels the timer and is rebuilt after [`RECONNECT_DELAY`],
//! without limit, until [`PollingSession::stop`] is called.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, sleep};
use tracing::{debug, info, trace, warn};

use snmpsight_common::DecodedValue;

use crate::config::{DeviceTarget, SensorSpec};
use crate::decoder::decode;
use crate::event::{PollError, PollEvent};
use crate::params::{RECONNECT_DELAY, SessionParams};
use crate::transport::{Connector, ItemError, SessionHandle};

/// Lifecycle state of a polling session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Active,
    Fetching,
    Stopped,
}

/// Misuse of the session API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session already started")]
    AlreadyStarted,
}

/// Polls one device target.
pub struct PollingSession {
    target: Arc<DeviceTarget>,
    connector: Arc<dyn Connector>,
    events: mpsc::Sender<PollEvent>,
    state: Arc<watch::Sender<SessionState>>,
    stop: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl PollingSession {
    /// Create an idle session. Nothing happens until [`start`](Self::start).
    pub fn new(
        target: Arc<DeviceTarget>,
        connector: Arc<dyn Connector>,
        events: mpsc::Sender<PollEvent>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Disconnected);
        let (stop, _) = watch::channel(false);
        Self {
            target,
            connector,
            events,
            state: Arc::new(state),
            stop,
            task: None,
        }
    }

    pub fn target(&self) -> &Arc<DeviceTarget> {
        &self.target
    }

    /// Spawn the driver task. A session can be started once.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.task.is_some() {
            return Err(SessionError::AlreadyStarted);
        }

        let driver = Driver {
            params: SessionParams::from_target(&self.target),
            sensors: self.target.sensors.iter().cloned().map(Arc::new).collect(),
            oids: Arc::new(self.target.oids()),
            target: self.target.clone(),
            connector: self.connector.clone(),
            events: self.events.clone(),
            state: self.state.clone(),
            stop: self.stop.subscribe(),
        };

        self.task = Some(tokio::spawn(driver.run()));
        Ok(())
    }

    /// Cancel the timer and disarm reconnection. An in-flight fetch still
    /// completes and delivers its events.
    pub fn stop(&self) {
        self.stop.send_replace(true);
        self.state.send_replace(SessionState::Stopped);
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Watch lifecycle transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

/// Runtime state owned by the driver task.
struct Driver {
    target: Arc<DeviceTarget>,
    sensors: Arc<[Arc<SensorSpec>]>,
    oids: Arc<Vec<String>>,
    params: SessionParams,
    connector: Arc<dyn Connector>,
    events: mpsc::Sender<PollEvent>,
    state: Arc<watch::Sender<SessionState>>,
    stop: watch::Receiver<bool>,
}

impl Driver {
    async fn run(self) {
        let device = self.target.display_name().to_string();
        let mut stop = self.stop.clone();

        loop {
            set_state(&self.state, SessionState::Connecting);
            debug!(device = %device, address = %self.params.address, "Connecting");

            let connected = tokio::select! {
                biased;
                _ = stop.wait_for(|stopped| *stopped) => break,
                result = self.connector.connect(&self.params) => result,
            };

            match connected {
                Ok(handle) => {
                    info!(
                        device = %device,
                        version = %self.params.version,
                        sensors = self.sensors.len(),
                        "Session established"
                    );
                    if !self.poll(handle).await {
                        break;
                    }
                    warn!(device = %device, "Session closed, reconnecting");
                }
                Err(e) => {
                    warn!(device = %device, error = %e, "Failed to connect");
                }
            }

            set_state(&self.state, SessionState::Disconnected);

            tokio::select! {
                biased;
                _ = stop.wait_for(|stopped| *stopped) => break,
                _ = sleep(RECONNECT_DELAY) => {}
            }
        }

        self.state.send_replace(SessionState::Stopped);
        debug!(device = %device, "Driver stopped");
    }

    /// Drive the fetch timer on an open session.
    ///
    /// Returns `true` when the session was lost and `false` when stopped.
    async fn poll(&self, handle: Arc<dyn SessionHandle>) -> bool {
        let mut stop = self.stop.clone();
        // Scoped to this connection: a fetch left on a lost one must not hold
        // back the next.
        let in_flight = Arc::new(AtomicBool::new(false));
        set_state(&self.state, SessionState::Active);

        let mut ticker = interval(self.target.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = stop.wait_for(|stopped| *stopped) => return false,
                _ = handle.closed() => return true,
                _ = ticker.tick() => self.spawn_fetch(handle.clone(), &in_flight),
            }
        }
    }

    fn spawn_fetch(&self, handle: Arc<dyn SessionHandle>, in_flight: &Arc<AtomicBool>) {
        if in_flight.swap(true, Ordering::AcqRel) {
            debug!(
                device = %self.target.display_name(),
                "Previous fetch still running, skipping tick"
            );
            return;
        }

        set_state(&self.state, SessionState::Fetching);

        let fetch = Fetch {
            target: self.target.clone(),
            sensors: self.sensors.clone(),
            oids: self.oids.clone(),
            events: self.events.clone(),
        };
        let state = self.state.clone();
        let in_flight = in_flight.clone();

        tokio::spawn(async move {
            fetch.run(handle.as_ref()).await;
            in_flight.store(false, Ordering::Release);
            state.send_if_modified(|s| {
                if *s == SessionState::Fetching {
                    *s = SessionState::Active;
                    true
                } else {
                    false
                }
            });
        });
    }
}

/// Move to `next` unless the session has been stopped.
fn set_state(state: &watch::Sender<SessionState>, next: SessionState) {
    state.send_if_modified(|s| {
        if *s == SessionState::Stopped || *s == next {
            false
        } else {
            *s = next;
            true
        }
    });
}

/// One fetch cycle.
struct Fetch {
    target: Arc<DeviceTarget>,
    sensors: Arc<[Arc<SensorSpec>]>,
    oids: Arc<Vec<String>>,
    events: mpsc::Sender<PollEvent>,
}

impl Fetch {
    async fn run(self, handle: &dyn SessionHandle) {
        match handle.get(&self.oids).await {
            Ok(items) => {
                let mut items = items.into_iter();
                for sensor in self.sensors.iter() {
                    let result = match items.next() {
                        Some(Ok(varbind)) => decode(
                            &varbind.value,
                            varbind.object_type,
                            sensor.transform.as_deref(),
                        )
                        .map_err(PollError::from),
                        Some(Err(e)) => Err(PollError::Item(e)),
                        None => Err(PollError::Item(ItemError::Unsupported(
                            "missing from response".to_string(),
                        ))),
                    };
                    self.emit(sensor, result).await;
                }
            }
            Err(e) => {
                debug!(
                    device = %self.target.display_name(),
                    error = %e,
                    "Fetch failed for all sensors"
                );
                let error = Arc::new(e);
                for sensor in self.sensors.iter() {
                    self.emit(sensor, Err(PollError::Transport(error.clone())))
                        .await;
                }
            }
        }
    }

    async fn emit(&self, sensor: &Arc<SensorSpec>, result: Result<DecodedValue, PollError>) {
        let event = match result {
            Ok(value) => PollEvent::Response {
                value,
                sensor: sensor.clone(),
                target: self.target.clone(),
            },
            Err(error) => PollEvent::Error {
                error,
                sensor: sensor.clone(),
                target: self.target.clone(),
            },
        };

        if self.events.send(event).await.is_err() {
            trace!(device = %self.target.display_name(), "Event receiver dropped");
        }
    }
}
