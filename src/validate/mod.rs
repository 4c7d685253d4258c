use ipnet::IpNet;
use serde::Deserialize;
use std::fmt;
use std::net::IpAddr;

use crate::models::SiteRecord;
use crate::utils::strip_whitespace;

/// Static rule set a site record is checked against.
///
/// `ip_fields` hold exactly one IP address. `ip_list_fields` are
/// newline-separated lists where each non-empty line is an IP address or a
/// CIDR network.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldRules {
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub ip_fields: Vec<String>,
    #[serde(default)]
    pub ip_list_fields: Vec<String>,
}

/// Why a record was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    Empty(String),
    InvalidFormat { field: String, value: String },
}

impl Violation {
    pub fn field(&self) -> &str {
        match self {
            Self::Empty(field) => field,
            Self::InvalidFormat { field, .. } => field,
        }
    }

    /// The offending raw value, for format failures
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Empty(_) => None,
            Self::InvalidFormat { value, .. } => Some(value.as_str()),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty(field) => write!(f, "field {} is empty", field),
            Self::InvalidFormat { field, .. } => write!(f, "invalid format for field {}", field),
        }
    }
}

impl FieldRules {
    pub fn is_ip_field(&self, field: &str) -> bool {
        self.ip_fields.iter().any(|f| f == field)
    }

    pub fn is_ip_list_field(&self, field: &str) -> bool {
        self.ip_list_fields.iter().any(|f| f == field)
    }

    /// Format check for a non-empty value; fields without an IP rule always pass
    fn has_valid_format(&self, field: &str, value: &str) -> bool {
        if self.is_ip_field(field) {
            is_valid_ip(value)
        } else if self.is_ip_list_field(field) {
            is_valid_ip_list(value)
        } else {
            true
        }
    }

    /// Check a record, stopping at the first failing field.
    ///
    /// Required fields are visited in rule order, then any optional IP fields
    /// that carry a value.
    pub fn validate(&self, record: &SiteRecord) -> Result<(), Violation> {
        match self.checks(record).next() {
            Some(violation) => Err(violation),
            None => Ok(()),
        }
    }

    /// Every violation in the record, in the same order `validate` visits them
    pub fn violations(&self, record: &SiteRecord) -> Vec<Violation> {
        self.checks(record).collect()
    }

    fn checks<'a>(&'a self, record: &'a SiteRecord) -> impl Iterator<Item = Violation> + 'a {
        let required = self
            .required
            .iter()
            .filter_map(move |field| self.check_required(record, field));

        let optional_ip = self
            .ip_fields
            .iter()
            .chain(self.ip_list_fields.iter())
            .filter(move |field| !self.required.contains(*field))
            .filter_map(move |field| {
                let value = record.value(field);
                if value.is_empty() || self.has_valid_format(field, value) {
                    None
                } else {
                    Some(invalid(field, value))
                }
            });

        required.chain(optional_ip)
    }

    /// Emptiness is checked before format, even for IP fields: an empty or
    /// absent value has nothing to parse and is reported as "field X is empty".
    fn check_required(&self, record: &SiteRecord, field: &str) -> Option<Violation> {
        let value = record.value(field);
        if value.is_empty() {
            return Some(Violation::Empty(field.to_string()));
        }
        if !self.has_valid_format(field, value) {
            return Some(invalid(field, value));
        }
        None
    }
}

fn invalid(field: &str, value: &str) -> Violation {
    Violation::InvalidFormat {
        field: field.to_string(),
        value: value.to_string(),
    }
}

/// Parse exactly one address; whitespace anywhere in the value is ignored
/// e.g., " 10.0. 0.1 " is valid, "10.0.0.0/24" is not
pub fn is_valid_ip(value: &str) -> bool {
    strip_whitespace(value).parse::<IpAddr>().is_ok()
}

/// Parse a single address or CIDR network, e.g. "10.0.0.1" or "192.168.1.0/24"
pub fn is_valid_ip_or_network(s: &str) -> bool {
    s.parse::<IpAddr>().is_ok() || s.parse::<IpNet>().is_ok()
}

/// Check a newline-separated list of addresses/networks.
/// Whitespace inside each line is removed before parsing; blank lines are skipped.
/// A value with no entries at all is not a valid list.
pub fn is_valid_ip_list(value: &str) -> bool {
    let mut entries = value
        .lines()
        .map(strip_whitespace)
        .filter(|line| !line.is_empty())
        .peekable();

    if entries.peek().is_none() {
        return false;
    }
    entries.all(|entry| is_valid_ip_or_network(&entry))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> FieldRules {
        FieldRules {
            required: vec!["Site_ID".into(), "WAN_IP".into(), "LAN_Subnet".into()],
            ip_fields: vec!["WAN_IP".into()],
            ip_list_fields: vec!["LAN_Subnet".into()],
        }
    }

    fn record(pairs: &[(&str, &str)]) -> SiteRecord {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_valid_record() {
        let r = record(&[
            ("Site_ID", "S1"),
            ("WAN_IP", "10.0.0.1"),
            ("LAN_Subnet", "192.168.1.0/24"),
        ]);
        assert_eq!(rules().validate(&r), Ok(()));
        assert!(rules().violations(&r).is_empty());
    }

    #[test]
    fn test_invalid_ip_names_field() {
        let r = record(&[
            ("Site_ID", "S1"),
            ("WAN_IP", "not-an-ip"),
            ("LAN_Subnet", "192.168.1.0/24"),
        ]);
        let err = rules().validate(&r).unwrap_err();
        assert_eq!(err.field(), "WAN_IP");
        assert_eq!(err.value(), Some("not-an-ip"));
        assert_eq!(err.to_string(), "invalid format for field WAN_IP");
    }

    #[test]
    fn test_missing_field_reported_as_empty() {
        let r = record(&[("Site_ID", "S1"), ("WAN_IP", "10.0.0.1")]);
        let err = rules().validate(&r).unwrap_err();
        assert_eq!(err.to_string(), "field LAN_Subnet is empty");
    }

    #[test]
    fn test_empty_string_is_empty() {
        let r = record(&[("Site_ID", ""), ("WAN_IP", "10.0.0.1"), ("LAN_Subnet", "10.1.0.0/16")]);
        assert_eq!(
            rules().validate(&r),
            Err(Violation::Empty("Site_ID".into()))
        );
    }

    #[test]
    fn test_empty_ip_field_is_empty_not_invalid() {
        let r = record(&[("Site_ID", "S1"), ("WAN_IP", ""), ("LAN_Subnet", "10.1.0.0/16")]);
        assert_eq!(rules().validate(&r), Err(Violation::Empty("WAN_IP".into())));

        let r = record(&[("Site_ID", "S1"), ("WAN_IP", "10.0.0.1"), ("LAN_Subnet", "")]);
        assert_eq!(
            rules().validate(&r).unwrap_err().to_string(),
            "field LAN_Subnet is empty"
        );
    }

    #[test]
    fn test_interior_whitespace_is_ignored() {
        let r = record(&[
            ("Site_ID", "S1"),
            ("WAN_IP", " 10.0. 0.1 "),
            ("LAN_Subnet", "192.168.1.0 / 24"),
        ]);
        assert_eq!(rules().validate(&r), Ok(()));
    }

    #[test]
    fn test_short_circuits_on_first_failure() {
        let r = record(&[("WAN_IP", "bogus")]);
        let err = rules().validate(&r).unwrap_err();
        assert_eq!(err, Violation::Empty("Site_ID".into()));

        let all = rules().violations(&r);
        assert_eq!(
            all.iter().map(|v| v.to_string()).collect::<Vec<_>>(),
            vec![
                "field Site_ID is empty",
                "invalid format for field WAN_IP",
                "field LAN_Subnet is empty",
            ]
        );
    }

    #[test]
    fn test_optional_ip_field_checked_when_present() {
        let mut r = rules();
        r.ip_list_fields.push("DNS_Servers".into());

        let ok = record(&[
            ("Site_ID", "S1"),
            ("WAN_IP", "10.0.0.1"),
            ("LAN_Subnet", "10.1.0.0/16"),
        ]);
        assert_eq!(r.validate(&ok), Ok(()));

        let bad = record(&[
            ("Site_ID", "S1"),
            ("WAN_IP", "10.0.0.1"),
            ("LAN_Subnet", "10.1.0.0/16"),
            ("DNS_Servers", "8.8.8.8\nnope"),
        ]);
        assert_eq!(r.validate(&bad).unwrap_err().field(), "DNS_Servers");
    }

    #[test]
    fn test_single_ip_field_rejects_networks_and_lists() {
        for wan in ["10.0.0.0/24", "10.0.0.0/24\n10.0.0.1", "10.0.0.1\n10.0.0.2"] {
            let r = record(&[
                ("Site_ID", "S1"),
                ("WAN_IP", wan),
                ("LAN_Subnet", "192.168.1.0/24\n192.168.2.0/24"),
            ]);
            let err = rules().validate(&r).unwrap_err();
            assert_eq!(err.to_string(), "invalid format for field WAN_IP", "{:?}", wan);
        }
    }

    #[test]
    fn test_list_field_accepts_addresses_and_networks() {
        let r = record(&[
            ("Site_ID", "S1"),
            ("WAN_IP", "2001:db8::1"),
            ("LAN_Subnet", "192.168.1.0/24\n\n10.0.0.1\n2001:db8::/48"),
        ]);
        assert_eq!(rules().validate(&r), Ok(()));
    }

    #[test]
    fn test_is_valid_ip() {
        assert!(is_valid_ip("192.168.1.1"));
        assert!(is_valid_ip(" 10.0. 0.1 "));
        assert!(is_valid_ip("::1"));
        assert!(!is_valid_ip("10.0.0.0/24"));
        assert!(!is_valid_ip("not-an-ip"));
        assert!(!is_valid_ip(""));
    }

    #[test]
    fn test_ip_list() {
        assert!(is_valid_ip_list("10.0.0.0/24\n10.0.1.0/24"));
        assert!(is_valid_ip_list("10.0.0.1\r\n\n2001:db8::1\n"));
        assert!(is_valid_ip_list("2001:db8::/32"));
        assert!(!is_valid_ip_list("10.0.0.0/24\n10.0.1.0/33"));
        assert!(!is_valid_ip_list("256.1.1.1"));
        assert!(!is_valid_ip_list(" \n "));
        assert!(!is_valid_ip_list("; rm -rf /"));
    }

    #[test]
    fn test_is_valid_ip_or_network() {
        assert!(is_valid_ip_or_network("192.168.1.1"));
        assert!(is_valid_ip_or_network("0.0.0.0/0"));
        assert!(is_valid_ip_or_network("::1"));
        assert!(!is_valid_ip_or_network(""));
        assert!(!is_valid_ip_or_network("1.2.3"));
        assert!(!is_valid_ip_or_network("10.0.0.0/"));
    }
}
