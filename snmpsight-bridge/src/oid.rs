use anyhow::{Result, anyhow};
use snmp2::Oid;

/// Parse a dotted OID string (e.g. "1.3.6.1.2.1.1.3.0") into an owned snmp2::Oid.
pub fn parse_oid(oid_str: &str) -> Result<Oid<'static>> {
    let trimmed = oid_str.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return Err(anyhow!("OID cannot be empty"));
    }
    trimmed
        .parse::<Oid>()
        .map_err(|e| anyhow!("Failed to parse OID '{}': {:?}", oid_str, e))
        .map(|oid| oid.to_owned())
}

/// Dotted string form of an snmp2::Oid.
pub fn oid_to_string(oid: &Oid) -> String {
    oid.to_id_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_oid() {
        let oid = parse_oid("1.3.6.1.2.1.1.3.0").unwrap();
        assert_eq!(oid_to_string(&oid), "1.3.6.1.2.1.1.3.0");
    }

    #[test]
    fn test_parse_oid_leading_dot() {
        let oid = parse_oid(".1.3.6.1.2.1.1.5.0").unwrap();
        assert_eq!(oid_to_string(&oid), "1.3.6.1.2.1.1.5.0");
    }

    #[test]
    fn test_parse_oid_rejects_garbage() {
        assert!(parse_oid("").is_err());
        assert!(parse_oid("1.3.six.1").is_err());
    }
}
