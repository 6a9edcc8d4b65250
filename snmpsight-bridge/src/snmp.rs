//! [`Connector`] implementation on top of `snmp2::AsyncSession`.

use std::sync::Arc;

use async_trait::async_trait;
use snmp2::{AsyncSession, Oid, Pdu, Value, v3};
use tokio::sync::{Mutex, watch};
use tokio::time::timeout;

use crate::config::{AuthProtocol, PrivProtocol, SnmpVersion};
use crate::decoder::{ObjectType, RawValue, RawVarbind};
use crate::oid::{oid_to_string, parse_oid};
use crate::params::{Credentials, SecurityLevel, SessionParams, UsmUser};
use crate::transport::{Connector, ItemError, ItemResult, SessionHandle, TransportError};

/// Opens real SNMP sessions over UDP.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnmpConnector;

impl SnmpConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for SnmpConnector {
    async fn connect(&self, params: &SessionParams) -> Result<Arc<dyn SessionHandle>, TransportError> {
        let session = match (&params.version, &params.credentials) {
            (SnmpVersion::V1, Credentials::Community(community)) => {
                AsyncSession::new_v1(params.address.as_str(), community.as_bytes(), 0).await?
            }
            (SnmpVersion::V2c, Credentials::Community(community)) => {
                AsyncSession::new_v2c(params.address.as_str(), community.as_bytes(), 0).await?
            }
            (SnmpVersion::V3, Credentials::Usm(user)) => {
                let mut session =
                    AsyncSession::new_v3(params.address.as_str(), 0, security(user)).await?;
                // Engine discovery round-trip; bounded like any other request.
                match timeout(params.attempt_timeout(0), session.init()).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => return Err(TransportError::AuthRejected(format!("{:?}", e))),
                    Err(_) => return Err(TransportError::Timeout { attempts: 1 }),
                }
                session
            }
            (version, _) => {
                return Err(TransportError::Protocol(format!(
                    "credentials do not match SNMP {}",
                    version
                )));
            }
        };

        tracing::debug!(
            host = %params.host,
            address = %params.address,
            version = %params.version,
            "SNMP session opened"
        );

        let (closed, _) = watch::channel(false);
        Ok(Arc::new(SnmpHandle {
            params: params.clone(),
            session: Mutex::new(session),
            closed,
        }))
    }
}

fn security(user: &UsmUser) -> v3::Security {
    let auth_key = user.auth_key.as_deref().unwrap_or_default();
    let mut security = v3::Security::new(user.name.as_bytes(), auth_key.as_bytes());

    if let Some(protocol) = user.auth_protocol {
        security = security.with_auth_protocol(match protocol {
            AuthProtocol::Md5 => v3::AuthProtocol::Md5,
            AuthProtocol::Sha => v3::AuthProtocol::Sha1,
            AuthProtocol::Sha224 => v3::AuthProtocol::Sha224,
            AuthProtocol::Sha256 => v3::AuthProtocol::Sha256,
            AuthProtocol::Sha384 => v3::AuthProtocol::Sha384,
            AuthProtocol::Sha512 => v3::AuthProtocol::Sha512,
        });
    }

    let auth = match user.level {
        SecurityLevel::NoAuthNoPriv => v3::Auth::NoAuthNoPriv,
        SecurityLevel::AuthNoPriv => v3::Auth::AuthNoPriv,
        SecurityLevel::AuthPriv => v3::Auth::AuthPriv {
            cipher: match user.priv_protocol {
                Some(PrivProtocol::Des) => v3::Cipher::Des,
                Some(PrivProtocol::Aes192) => v3::Cipher::Aes192,
                Some(PrivProtocol::Aes256) => v3::Cipher::Aes256,
                Some(PrivProtocol::Aes) | None => v3::Cipher::Aes128,
            },
            privacy_password: user.priv_key.clone().unwrap_or_default().into_bytes(),
        },
    };

    security.with_auth(auth)
}

/// One open session. Requests are serialized through the mutex.
struct SnmpHandle {
    params: SessionParams,
    session: Mutex<AsyncSession>,
    closed: watch::Sender<bool>,
}

impl SnmpHandle {
    fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    fn mark_closed(&self) {
        self.closed.send_replace(true);
    }

    /// GET one OID, resending on timeout or library errors.
    async fn get_one(
        &self,
        session: &mut AsyncSession,
        oid: &Oid<'static>,
    ) -> Result<ItemResult, TransportError> {
        let attempts = self.params.attempts();
        let mut last_error = None;

        for attempt in 0..attempts {
            match timeout(self.params.attempt_timeout(attempt), session.get(oid)).await {
                Ok(Ok(pdu)) => return Ok(item_from_pdu(pdu)),
                Ok(Err(e)) => {
                    tracing::trace!(host = %self.params.host, attempt, error = ?e, "SNMP GET failed");
                    last_error = Some(format!("{:?}", e));
                }
                Err(_) => {
                    tracing::trace!(host = %self.params.host, attempt, "SNMP GET timed out");
                    last_error = None;
                }
            }
        }

        match last_error {
            // The library gave up on this session; the driver rebuilds it.
            Some(message) => {
                self.mark_closed();
                Err(TransportError::Protocol(message))
            }
            None => Err(TransportError::Timeout { attempts }),
        }
    }
}

#[async_trait]
impl SessionHandle for SnmpHandle {
    async fn get(&self, oids: &[String]) -> Result<Vec<ItemResult>, TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        let parsed = oids
            .iter()
            .map(|oid| {
                parse_oid(oid).map_err(|e| TransportError::InvalidOid {
                    oid: oid.clone(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut session = self.session.lock().await;
        let mut items = Vec::with_capacity(parsed.len());
        for oid in &parsed {
            items.push(self.get_one(&mut session, oid).await?);
        }
        Ok(items)
    }

    async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

fn item_from_pdu(pdu: Pdu<'_>) -> ItemResult {
    item_from_response(pdu.error_status, pdu.error_index, pdu.varbinds)
}

/// Result for a single-OID GET, from the response's error fields and varbinds.
fn item_from_response<'a>(
    error_status: u32,
    error_index: u32,
    mut varbinds: impl Iterator<Item = (Oid<'a>, Value<'a>)>,
) -> ItemResult {
    if error_status != 0 {
        return Err(ItemError::ErrorStatus {
            status: error_status,
            index: error_index,
        });
    }

    match varbinds.next() {
        Some((_, value)) => varbind_from_value(&value),
        None => Err(ItemError::Unsupported("empty response".to_string())),
    }
}

fn varbind_from_value(value: &Value<'_>) -> ItemResult {
    let varbind = match value {
        Value::Integer(n) => RawVarbind::new(ObjectType::Integer, RawValue::Integer(*n)),
        Value::OctetString(bytes) => {
            RawVarbind::new(ObjectType::OctetString, RawValue::Bytes(bytes.to_vec()))
        }
        Value::ObjectIdentifier(oid) => {
            RawVarbind::new(ObjectType::ObjectIdentifier, RawValue::Text(oid_to_string(oid)))
        }
        Value::IpAddress(ip) => RawVarbind::new(
            ObjectType::IpAddress,
            RawValue::Text(format!("{}.{}.{}.{}", ip[0], ip[1], ip[2], ip[3])),
        ),
        Value::Counter32(n) => RawVarbind::new(ObjectType::Counter32, RawValue::Unsigned(*n as u64)),
        Value::Unsigned32(n) => RawVarbind::new(ObjectType::Gauge32, RawValue::Unsigned(*n as u64)),
        Value::Timeticks(n) => RawVarbind::new(ObjectType::TimeTicks, RawValue::Unsigned(*n as u64)),
        Value::Opaque(bytes) => RawVarbind::new(ObjectType::Opaque, RawValue::Bytes(bytes.to_vec())),
        Value::Counter64(n) => RawVarbind::new(ObjectType::Counter64, RawValue::Unsigned(*n)),
        Value::NoSuchObject => return Err(ItemError::NoSuchObject),
        Value::NoSuchInstance => return Err(ItemError::NoSuchInstance),
        Value::EndOfMibView => return Err(ItemError::EndOfMibView),
        Value::Null => return Err(ItemError::Unsupported("null".to_string())),
        _ => return Err(ItemError::Unsupported("unexpected value type".to_string())),
    };
    Ok(varbind)
}
