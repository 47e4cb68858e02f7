//! The `format` keyword hook and built-in format checks.
//!
//! A format checker is a plain predicate over strings. Built-in checkers
//! cover the formats the JSON Schema drafts name; callers can register their
//! own through [`Options::with_format_checker`](crate::Options::with_format_checker),
//! which take precedence. Formats with no checker always pass.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, NaiveDate};
use indexmap::IndexMap;
use regex::Regex;
use uuid::Uuid;

/// A predicate deciding whether a string conforms to a format.
pub type FormatChecker = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Format checkers available to one compilation.
#[derive(Clone)]
pub(crate) struct FormatRegistry {
    checkers: IndexMap<String, FormatChecker>,
}

impl FormatRegistry {
    /// Built-in checkers overridden by `custom`.
    pub(crate) fn new(custom: &IndexMap<String, FormatChecker>) -> Self {
        let mut checkers: IndexMap<String, FormatChecker> = IndexMap::new();
        checkers.insert("email".into(), Arc::new(is_email));
        checkers.insert("date".into(), Arc::new(is_date));
        checkers.insert("time".into(), Arc::new(is_time));
        checkers.insert("date-time".into(), Arc::new(is_date_time));
        checkers.insert("ipv4".into(), Arc::new(is_ipv4));
        checkers.insert("ipv6".into(), Arc::new(is_ipv6));
        checkers.insert("hostname".into(), Arc::new(is_hostname));
        checkers.insert("uri".into(), Arc::new(is_uri));
        checkers.insert("uuid".into(), Arc::new(is_uuid));
        checkers.insert("regex".into(), Arc::new(is_regex));
        checkers.insert("json-pointer".into(), Arc::new(is_json_pointer));
        for (name, checker) in custom {
            checkers.insert(name.clone(), Arc::clone(checker));
        }
        Self { checkers }
    }

    pub(crate) fn get(&self, format: &str) -> Option<FormatChecker> {
        self.checkers.get(format).cloned()
    }
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$")
            .expect("email pattern is valid")
    })
}

fn is_email(value: &str) -> bool {
    let Some((local, _)) = value.rsplit_once('@') else {
        return false;
    };
    !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && email_regex().is_match(value)
}

fn is_date(value: &str) -> bool {
    value.len() == 10 && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

fn is_time(value: &str) -> bool {
    // RFC 3339 full-time, checked by anchoring it to a fixed date
    DateTime::parse_from_rfc3339(&format!("1970-01-01T{value}")).is_ok()
}

fn is_date_time(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
}

fn is_ipv4(value: &str) -> bool {
    value.parse::<Ipv4Addr>().is_ok()
}

fn is_ipv6(value: &str) -> bool {
    value.parse::<Ipv6Addr>().is_ok()
}

fn is_hostname(value: &str) -> bool {
    let value = value.strip_suffix('.').unwrap_or(value);
    !value.is_empty()
        && value.len() <= 253
        && value.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

fn is_uri(value: &str) -> bool {
    url::Url::parse(value).is_ok()
}

fn is_uuid(value: &str) -> bool {
    // hyphenated form only
    value.len() == 36 && Uuid::parse_str(value).is_ok()
}

fn is_regex(value: &str) -> bool {
    Regex::new(value).is_ok()
}

fn is_json_pointer(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    if !value.starts_with('/') {
        return false;
    }
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '~' && !matches!(chars.next(), Some('0') | Some('1')) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(format: &str, value: &str) -> bool {
        let registry = FormatRegistry::new(&IndexMap::new());
        let checker = registry.get(format).unwrap();
        checker(value)
    }

    #[test]
    fn test_email() {
        assert!(check("email", "joe.bloggs@example.com"));
        assert!(!check("email", "2962"));
        assert!(!check("email", ".test@example.com"));
        assert!(!check("email", "te..st@example.com"));
    }

    #[test]
    fn test_date_checks_calendar() {
        assert!(check("date", "2020-02-29"));
        assert!(!check("date", "2021-02-29"));
        assert!(!check("date", "2020-13-01"));
        assert!(!check("date", "06/19/1963"));
        assert!(!check("date", "2020-2-29"));
    }

    #[test]
    fn test_time_and_date_time() {
        assert!(check("time", "08:30:06Z"));
        assert!(check("time", "08:30:06.283185+01:00"));
        assert!(!check("time", "24:00:00Z"));
        assert!(!check("time", "08:30:06"));
        assert!(check("date-time", "1963-06-19T08:30:06.283185Z"));
        assert!(!check("date-time", "1963-06-19"));
    }

    #[test]
    fn test_ip_addresses() {
        assert!(check("ipv4", "192.168.0.1"));
        assert!(!check("ipv4", "256.0.0.1"));
        assert!(check("ipv6", "::1"));
        assert!(!check("ipv6", "12345::"));
    }

    #[test]
    fn test_hostname_uuid_pointer() {
        assert!(check("hostname", "www.example.com"));
        assert!(!check("hostname", "-bad.example.com"));
        assert!(check("uuid", "2eb8aa08-aa98-11ea-b4aa-73b441d16380"));
        assert!(!check("uuid", "2eb8aa08-aa98-11ea-b4aa-73b441d1638"));
        assert!(!check("uuid", "2eb8aa08aa9811eab4aa73b441d16380"));
        assert!(check("json-pointer", "/foo/bar~0/baz~1"));
        assert!(!check("json-pointer", "/foo/bar~"));
        assert!(!check("json-pointer", "foo"));
    }

    #[test]
    fn test_uri_and_regex() {
        assert!(check("uri", "http://example.com/path?q=1"));
        assert!(!check("uri", "//example.com/relative"));
        assert!(check("regex", "^[a-z]+$"));
        assert!(!check("regex", "^(abc"));
    }

    #[test]
    fn test_custom_checker_overrides_builtin() {
        let mut custom: IndexMap<String, FormatChecker> = IndexMap::new();
        custom.insert("email".into(), Arc::new(|s: &str| s == "ok"));
        let registry = FormatRegistry::new(&custom);
        let checker = registry.get("email").unwrap();
        assert!(checker("ok"));
        assert!(!checker("joe@example.com"));
        assert!(registry.get("unknown-format").is_none());
    }
}
