//! Events emitted by polling sessions.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use snmpsight_common::DecodedValue;

use crate::config::{DeviceTarget, SensorSpec};
use crate::decoder::DecodeError;
use crate::transport::{ItemError, TransportError};

/// Why a sensor has no value this cycle.
#[derive(Error, Debug, Clone)]
pub enum PollError {
    /// The whole batch failed. All sensors of the batch share this value.
    #[error("transport: {0}")]
    Transport(Arc<TransportError>),

    #[error("device: {0}")]
    Item(#[from] ItemError),

    #[error("decode: {0}")]
    Decode(#[from] DecodeError),
}

/// Outcome of one sensor for one fetch cycle.
#[derive(Debug, Clone)]
pub enum PollEvent {
    Response {
        value: DecodedValue,
        sensor: Arc<SensorSpec>,
        target: Arc<DeviceTarget>,
    },
    Error {
        error: PollError,
        sensor: Arc<SensorSpec>,
        target: Arc<DeviceTarget>,
    },
}

impl PollEvent {
    pub fn sensor(&self) -> &SensorSpec {
        match self {
            PollEvent::Response { sensor, .. } | PollEvent::Error { sensor, .. } => sensor,
        }
    }

    pub fn target(&self) -> &DeviceTarget {
        match self {
            PollEvent::Response { target, .. } | PollEvent::Error { target, .. } => target,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, PollEvent::Error { .. })
    }
}

/// Consumer of poll events.
#[async_trait]
pub trait EventSink: Send {
    async fn on_response(&mut self, value: DecodedValue, sensor: &SensorSpec, target: &DeviceTarget);

    async fn on_error(&mut self, error: PollError, sensor: &SensorSpec, target: &DeviceTarget);

    /// Dispatch one event to the matching callback.
    async fn dispatch(&mut self, event: PollEvent) {
        match event {
            PollEvent::Response {
                value,
                sensor,
                target,
            } => self.on_response(value, &sensor, &target).await,
            PollEvent::Error {
                error,
                sensor,
                target,
            } => self.on_error(error, &sensor, &target).await,
        }
    }
}
