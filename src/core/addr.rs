//! Connection strings and master/replica address sets.
//!
//! Two forms are accepted wherever an endpoint is named:
//!
//! - the compact form `host[:port[:password[:db]]]`, e.g. `127.0.0.1`,
//!   `127.0.0.1:6379`, `127.0.0.1:6379::1` or `127.0.0.1:::1`;
//! - a URL `redis://[:password@]host[:port][/db]`.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Port used when a connection string leaves it out.
pub const DEFAULT_PORT: u16 = 6379;

/// Formats a compact connection string.
///
/// A non-positive `port` becomes [`DEFAULT_PORT`]; a `db` outside `0..=9`
/// becomes `0`.
///
/// ```
/// assert_eq!(tandem::conn_string("10.0.0.1", 0, "", 3), "10.0.0.1:6379::3");
/// ```
pub fn conn_string(host: &str, port: i32, password: &str, db: i32) -> String {
    let port = if port <= 0 { i32::from(DEFAULT_PORT) } else { port };
    let db = if (0..=9).contains(&db) { db } else { 0 };
    format!("{host}:{port}:{password}:{db}")
}

/// A parsed endpoint: where to dial and how to prepare the connection.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnAddr {
    /// Host name or IPv4 address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Password sent with `AUTH` after dialing.
    pub password: Option<String>,
    /// Database selected with `SELECT` after dialing when non-zero.
    pub database: u8,
}

impl ConnAddr {
    /// Parses a compact connection string or a `redis://` URL.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.starts_with("redis://") {
            return Self::parse_url(s);
        }

        let mut parts = s.splitn(4, ':');
        let host = parts.next().unwrap_or_default();
        if host.is_empty() {
            return Err(Error::invalid(format!("missing host in address {s:?}")));
        }

        let port = match parts.next() {
            None | Some("") => DEFAULT_PORT,
            Some(p) => p
                .parse()
                .map_err(|_| Error::invalid(format!("invalid port {p:?} in address")))?,
        };
        let password = parts
            .next()
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        // An unparsable database index falls back to 0.
        let database = parts.next().and_then(|db| db.parse().ok()).unwrap_or(0);

        Ok(Self {
            host: host.to_string(),
            port,
            password,
            database,
        })
    }

    fn parse_url(s: &str) -> Result<Self> {
        let url = url::Url::parse(s).map_err(|_| Error::invalid("invalid address format"))?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::invalid("missing host in address"))?;
        let database = url
            .path()
            .trim_start_matches('/')
            .parse()
            .unwrap_or(0);

        Ok(Self {
            host: host.to_string(),
            port: url.port().unwrap_or(DEFAULT_PORT),
            password: url.password().map(str::to_string),
            database,
        })
    }

    /// The `host:port` pair to dial.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl FromStr for ConnAddr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// Never print the password.
impl fmt::Debug for ConnAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnAddr")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .finish()
    }
}

impl fmt::Display for ConnAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.host, self.port, self.database)
    }
}

/// A master connection string plus the connection strings of its replicas.
///
/// With the `json` feature the type (de)serializes as
/// `{"master": "...", "slaves": ["..."]}`; `replicas` is accepted as an alias.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct Address {
    /// Master connection string. Writes and version checks go here.
    pub master: String,
    /// Replica connection strings. Reads rotate across these.
    #[cfg_attr(feature = "json", serde(default, rename = "slaves", alias = "replicas"))]
    pub replicas: Vec<String>,
}

impl Address {
    /// An address with replicas.
    pub fn new<R: Into<String>>(master: impl Into<String>, replicas: impl IntoIterator<Item = R>) -> Self {
        Self {
            master: master.into(),
            replicas: replicas.into_iter().map(Into::into).collect(),
        }
    }

    /// A master-only address.
    pub fn simple(master: impl Into<String>) -> Self {
        Self {
            master: master.into(),
            replicas: Vec::new(),
        }
    }
}

#[cfg(feature = "json")]
impl Address {
    /// Loads a list of addresses from a JSON array.
    pub fn list_from_json(json: &str) -> Result<Vec<Address>> {
        serde_json::from_str(json).map_err(|e| Error::invalid(format!("invalid address list: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(host: &str, port: u16, password: Option<&str>, database: u8) -> ConnAddr {
        ConnAddr {
            host: host.to_string(),
            port,
            password: password.map(str::to_string),
            database,
        }
    }

    #[test]
    fn test_conn_string_defaults() {
        assert_eq!(conn_string("127.0.0.1", 0, "", 0), "127.0.0.1:6379::0");
        assert_eq!(conn_string("127.0.0.1", -5, "pw", 12), "127.0.0.1:6379:pw:0");
        assert_eq!(conn_string("h", 7000, "pw", 9), "h:7000:pw:9");
    }

    #[test]
    fn test_parse_compact_forms() {
        let cases = [
            ("127.0.0.1", addr("127.0.0.1", 6379, None, 0)),
            ("127.0.0.1:", addr("127.0.0.1", 6379, None, 0)),
            ("127.0.0.1:6380", addr("127.0.0.1", 6380, None, 0)),
            ("127.0.0.1:6379:", addr("127.0.0.1", 6379, None, 0)),
            ("127.0.0.1:6379::", addr("127.0.0.1", 6379, None, 0)),
            ("127.0.0.1:6379::1", addr("127.0.0.1", 6379, None, 1)),
            ("127.0.0.1:::", addr("127.0.0.1", 6379, None, 0)),
            ("127.0.0.1:::1", addr("127.0.0.1", 6379, None, 1)),
            ("cache:6379:secret:2", addr("cache", 6379, Some("secret"), 2)),
        ];
        for (input, expected) in cases {
            assert_eq!(ConnAddr::parse(input).unwrap(), expected, "input {input}");
        }
    }

    #[test]
    fn test_parse_bad_database_falls_back_to_zero() {
        assert_eq!(ConnAddr::parse("h:1:pw:abc").unwrap().database, 0);
    }

    #[test]
    fn test_parse_rejects_missing_host_and_bad_port() {
        assert!(matches!(
            ConnAddr::parse(":6379"),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(matches!(
            ConnAddr::parse("h:port"),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_parse_url() {
        assert_eq!(
            ConnAddr::parse("redis://:secret@cache.local:7000/3").unwrap(),
            addr("cache.local", 7000, Some("secret"), 3)
        );
        assert_eq!(
            ConnAddr::parse("redis://127.0.0.1").unwrap(),
            addr("127.0.0.1", 6379, None, 0)
        );
    }

    #[test]
    fn test_debug_hides_password() {
        let a = ConnAddr::parse("h:1:hunter2:0").unwrap();
        assert!(!format!("{a:?}").contains("hunter2"));
        assert_eq!(a.to_string(), "h:1/0");
        assert_eq!(a.socket_addr(), "h:1");
    }

    #[test]
    fn test_address_constructors() {
        let a = Address::new("m", ["r1", "r2"]);
        assert_eq!(a.replicas, vec!["r1".to_string(), "r2".to_string()]);
        assert!(Address::simple("m").replicas.is_empty());
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_address_list_from_json() {
        let list = Address::list_from_json(
            r#"[{"master": "a:6379", "slaves": ["b:6379"]}, {"master": "c"}]"#,
        )
        .unwrap();
        assert_eq!(list[0], Address::new("a:6379", ["b:6379"]));
        assert_eq!(list[1], Address::simple("c"));
    }
}
