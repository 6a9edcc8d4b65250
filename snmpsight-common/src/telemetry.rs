use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use num_bigint::BigUint;
use serde::{Serialize, Serializer};

/// Normalized scalar produced by decoding one SNMP value.
///
/// `BigInt` carries 64-bit counters exactly; it is never narrowed to a
/// fixed-width or floating-point type.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    /// Text value (octet strings, transform string results).
    Text(String),

    /// Numeric value (integers, gauges, timeticks, transform results).
    Number(f64),

    /// Arbitrary-precision non-negative integer (Counter64).
    BigInt(BigUint),
}

impl DecodedValue {
    /// Short name of the variant, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DecodedValue::Text(_) => "text",
            DecodedValue::Number(_) => "number",
            DecodedValue::BigInt(_) => "bigint",
        }
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::Text(s) => f.write_str(s),
            DecodedValue::Number(n) => write!(f, "{}", n),
            DecodedValue::BigInt(n) => write!(f, "{}", n),
        }
    }
}

impl Serialize for DecodedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DecodedValue::Text(s) => serializer.serialize_str(s),
            DecodedValue::Number(n) => serializer.serialize_f64(*n),
            // Counters that outgrow u64 are carried as decimal strings.
            DecodedValue::BigInt(n) => match u64::try_from(n) {
                Ok(small) => serializer.serialize_u64(small),
                Err(_) => serializer.collect_str(n),
            },
        }
    }
}

impl From<String> for DecodedValue {
    fn from(v: String) -> Self {
        DecodedValue::Text(v)
    }
}

impl From<&str> for DecodedValue {
    fn from(v: &str) -> Self {
        DecodedValue::Text(v.to_string())
    }
}

impl From<f64> for DecodedValue {
    fn from(v: f64) -> Self {
        DecodedValue::Number(v)
    }
}

impl From<BigUint> for DecodedValue {
    fn from(v: BigUint) -> Self {
        DecodedValue::BigInt(v)
    }
}

/// Envelope published for one sensor reading when a structured format is used.
#[derive(Debug, Clone, Serialize)]
pub struct SensorReading {
    /// Unix epoch milliseconds when the value was decoded.
    pub timestamp: i64,

    /// Device host the value was fetched from.
    pub host: String,

    /// Human-readable sensor name.
    pub sensor: String,

    /// Object identifier that was fetched.
    pub oid: String,

    /// The decoded value.
    pub value: DecodedValue,

    /// Unit of measurement, if configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl SensorReading {
    /// Create a reading stamped with the current time.
    pub fn new(
        host: impl Into<String>,
        sensor: impl Into<String>,
        oid: impl Into<String>,
        value: DecodedValue,
    ) -> Self {
        Self {
            timestamp: current_timestamp_millis(),
            host: host.into(),
            sensor: sensor.into(),
            oid: oid.into(),
            value,
            unit: None,
        }
    }

    /// Attach a unit of measurement.
    pub fn with_unit(mut self, unit: Option<String>) -> Self {
        self.unit = unit;
        self
    }
}

/// Get the current timestamp in milliseconds since Unix epoch.
///
/// Returns 0 if system time is before Unix epoch.
pub fn current_timestamp_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
