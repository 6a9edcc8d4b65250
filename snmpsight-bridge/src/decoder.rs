//! Type-aware conversion of raw SNMP values into [`DecodedValue`]s.

use std::fmt;

use num_bigint::BigUint;
use thiserror::Error;

use snmpsight_common::DecodedValue;

use crate::transform;

/// SNMP object type of a fetched value, as reported by the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Integer,
    OctetString,
    ObjectIdentifier,
    IpAddress,
    Counter32,
    Gauge32,
    TimeTicks,
    Opaque,
    Counter64,
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectType::Integer => "Integer",
            ObjectType::OctetString => "OctetString",
            ObjectType::ObjectIdentifier => "ObjectIdentifier",
            ObjectType::IpAddress => "IpAddress",
            ObjectType::Counter32 => "Counter32",
            ObjectType::Gauge32 => "Gauge32",
            ObjectType::TimeTicks => "TimeTicks",
            ObjectType::Opaque => "Opaque",
            ObjectType::Counter64 => "Counter64",
        };
        f.write_str(name)
    }
}

/// Raw value carried by one variable binding.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Signed integer.
    Integer(i64),
    /// Unsigned integer (counters, gauges, timeticks).
    Unsigned(u64),
    /// Uninterpreted bytes (octet strings, opaque, wire-form counters).
    Bytes(Vec<u8>),
    /// Value already rendered as text by the transport (OIDs, addresses).
    Text(String),
}

/// One successful item of a batched GET.
#[derive(Debug, Clone, PartialEq)]
pub struct RawVarbind {
    pub object_type: ObjectType,
    pub value: RawValue,
}

impl RawVarbind {
    pub fn new(object_type: ObjectType, value: RawValue) -> Self {
        Self { object_type, value }
    }
}

/// Errors raised while decoding a single sensor value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("transform '{expression}' failed: {message}")]
    Transform { expression: String, message: String },

    #[error("transform '{expression}' returned a non-scalar {kind} value")]
    NonScalar { expression: String, kind: String },
}

/// Decode a raw value according to its object type, then apply the optional
/// transform expression.
///
/// Only the transform can fail; decoding itself is total.
pub fn decode(
    raw: &RawValue,
    object_type: ObjectType,
    transform: Option<&str>,
) -> Result<DecodedValue, DecodeError> {
    let value = match object_type {
        ObjectType::Counter64 => decode_counter64(raw),
        ObjectType::OctetString => match raw {
            RawValue::Bytes(bytes) => DecodedValue::Text(String::from_utf8_lossy(bytes).into_owned()),
            other => passthrough(other),
        },
        _ => passthrough(raw),
    };

    match transform {
        Some(expression) if !expression.trim().is_empty() => transform::apply(expression, &value),
        _ => Ok(value),
    }
}

fn decode_counter64(raw: &RawValue) -> DecodedValue {
    match raw {
        RawValue::Bytes(bytes) => DecodedValue::BigInt(BigUint::from_bytes_be(bytes)),
        RawValue::Unsigned(n) => DecodedValue::BigInt(BigUint::from(*n)),
        RawValue::Integer(n) if *n >= 0 => DecodedValue::BigInt(BigUint::from(*n as u64)),
        other => passthrough(other),
    }
}

fn passthrough(raw: &RawValue) -> DecodedValue {
    match raw {
        RawValue::Integer(n) => DecodedValue::Number(*n as f64),
        RawValue::Unsigned(n) => DecodedValue::Number(*n as f64),
        RawValue::Bytes(bytes) => DecodedValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        RawValue::Text(s) => DecodedValue::Text(s.clone()),
    }
}
