//! Seam between polling sessions and the SNMP client library.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::decoder::RawVarbind;
use crate::params::SessionParams;

/// Failure of a whole request. Every sensor of the batch is affected.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("no response after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("authentication rejected: {0}")]
    AuthRejected(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("invalid OID '{oid}': {message}")]
    InvalidOid { oid: String, message: String },

    #[error("session closed")]
    Closed,
}

/// Explicit error returned by the device for a single OID.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemError {
    #[error("no such object")]
    NoSuchObject,

    #[error("no such instance")]
    NoSuchInstance,

    #[error("end of MIB view")]
    EndOfMibView,

    #[error("error status {status} at index {index}")]
    ErrorStatus { status: u32, index: u32 },

    #[error("unsupported value type: {0}")]
    Unsupported(String),
}

/// Outcome for one OID of a batch.
pub type ItemResult = Result<RawVarbind, ItemError>;

/// An open session with one agent.
#[async_trait]
pub trait SessionHandle: Send + Sync {
    /// Fetch all `oids` in one logical request. Items come back in request order.
    async fn get(&self, oids: &[String]) -> Result<Vec<ItemResult>, TransportError>;

    /// Resolves once the session has been lost.
    async fn closed(&self);
}

/// Opens sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, params: &SessionParams) -> Result<Arc<dyn SessionHandle>, TransportError>;
}
