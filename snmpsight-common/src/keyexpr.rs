/// Default key expression prefix for all snmpsight topics.
pub const KEY_PREFIX: &str = "snmpsight";

/// Segment that marks the availability topic of a sensor.
const STATUS_SEGMENT: &str = "status";

/// Builder for snmpsight key expressions.
///
/// Topics follow the pattern:
/// `<prefix>/<host>/<sensor>` for values and
/// `<prefix>/<host>/<sensor>/status` for per-sensor availability.
/// Host and sensor segments are passed through [`slugify`].
#[derive(Debug, Clone)]
pub struct TopicBuilder {
    prefix: String,
}

impl Default for TopicBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TopicBuilder {
    /// Create a builder using [`KEY_PREFIX`].
    pub fn new() -> Self {
        Self::with_prefix(KEY_PREFIX)
    }

    /// Create a builder with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().trim_end_matches('/').to_string(),
        }
    }

    /// The prefix all topics start with.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Topic carrying the values of one sensor.
    ///
    /// # Example
    /// ```
    /// use snmpsight_common::keyexpr::TopicBuilder;
    ///
    /// let topics = TopicBuilder::new();
    /// assert_eq!(
    ///     topics.value_key("192.168.1.1", "CPU Load"),
    ///     "snmpsight/192_168_1_1/cpu_load"
    /// );
    /// ```
    pub fn value_key(&self, host: &str, sensor: &str) -> String {
        format!("{}/{}/{}", self.prefix, slugify(host), slugify(sensor))
    }

    /// Availability topic of one sensor ("online" / "offline").
    pub fn sensor_status_key(&self, host: &str, sensor: &str) -> String {
        format!("{}/{}", self.value_key(host, sensor), STATUS_SEGMENT)
    }

    /// Key of the bridge availability topic ("online" / "offline").
    ///
    /// # Example
    /// ```
    /// use snmpsight_common::keyexpr::TopicBuilder;
    ///
    /// assert_eq!(TopicBuilder::new().bridge_status_key(), "snmpsight/@/status");
    /// ```
    pub fn bridge_status_key(&self) -> String {
        format!("{}/@/status", self.prefix)
    }

    /// Key of the bridge info document (name, version, metadata).
    pub fn bridge_info_key(&self) -> String {
        format!("{}/@/info", self.prefix)
    }
}

/// Reduce a free-form name to a key expression segment.
///
/// ASCII letters are lowercased, digits, `-` and `_` are kept, and every other
/// run of characters collapses into a single `_`. Leading and trailing `_` are
/// dropped. An input with nothing usable becomes `"_"`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_sep = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }

    let slug = slug.trim_matches('_').to_string();
    if slug.is_empty() { "_".to_string() } else { slug }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_builder() {
        let topics = TopicBuilder::new();

        assert_eq!(
            topics.value_key("router01", "sysUpTime"),
            "snmpsight/router01/sysuptime"
        );
        assert_eq!(
            topics.sensor_status_key("router01", "sysUpTime"),
            "snmpsight/router01/sysuptime/status"
        );
        assert_eq!(topics.bridge_status_key(), "snmpsight/@/status");
        assert_eq!(topics.bridge_info_key(), "snmpsight/@/info");
    }

    #[test]
    fn test_custom_prefix_trailing_slash() {
        let topics = TopicBuilder::with_prefix("lab/snmp/");
        assert_eq!(topics.prefix(), "lab/snmp");
        assert_eq!(topics.value_key("sw1", "temp"), "lab/snmp/sw1/temp");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("CPU Load (%)"), "cpu_load");
        assert_eq!(slugify("192.168.1.1"), "192_168_1_1");
        assert_eq!(slugify("if-eth0_in"), "if-eth0_in");
        assert_eq!(slugify("  Fan  #2 "), "fan_2");
        assert_eq!(slugify("2001:db8::1"), "2001_db8_1");
        assert_eq!(slugify("***"), "_");
    }
}
