use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Oldest master version a [`ConnPool`](crate::ConnPool) will accept.
pub const MIN_SUPPORTED: ServerVersion = ServerVersion::new(2, 6, 12);

/// A server version as reported by `INFO server` (`redis_version`).
///
/// Ordering is numeric per component, so `2.10.0 > 2.9.9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ServerVersion {
    /// Major component.
    pub major: u16,
    /// Minor component.
    pub minor: u16,
    /// Patch component.
    pub patch: u16,
}

impl ServerVersion {
    /// Creates a version from its components.
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses a dotted version string.
    ///
    /// Missing components default to zero (`"2.6"` is `2.6.0`) and anything
    /// after the leading digits of a component is ignored (`"7.0.0-rc1"`).
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::invalid("empty server version"));
        }

        let mut parts = [0u16; 3];
        for (slot, component) in parts.iter_mut().zip(s.split('.')) {
            let digits: &str = component
                .find(|c: char| !c.is_ascii_digit())
                .map_or(component, |end| &component[..end]);
            if digits.is_empty() {
                return Err(Error::invalid(format!("invalid server version: {s}")));
            }
            *slot = digits
                .parse()
                .map_err(|_| Error::invalid(format!("invalid server version: {s}")))?;
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for ServerVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        assert_eq!(
            ServerVersion::parse("7.2.4").unwrap(),
            ServerVersion::new(7, 2, 4)
        );
    }

    #[test]
    fn test_parse_short_and_suffixed() {
        assert_eq!(
            ServerVersion::parse("2.6").unwrap(),
            ServerVersion::new(2, 6, 0)
        );
        assert_eq!(
            "7.0.0-rc1".parse::<ServerVersion>().unwrap(),
            ServerVersion::new(7, 0, 0)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ServerVersion::parse("").is_err());
        assert!(ServerVersion::parse("abc").is_err());
        assert!(ServerVersion::parse("3.x.1").is_err());
    }

    #[test]
    fn test_ordering_is_numeric() {
        assert!(ServerVersion::new(2, 10, 0) > ServerVersion::new(2, 9, 9));
        assert!(ServerVersion::new(2, 6, 12) > ServerVersion::new(2, 6, 9));
        assert!(ServerVersion::new(3, 0, 0) > ServerVersion::new(2, 8, 24));
        assert!(ServerVersion::new(4, 0, 0) >= ServerVersion::new(4, 0, 0));
    }

    #[test]
    fn test_min_supported() {
        assert!(ServerVersion::new(2, 6, 11) < MIN_SUPPORTED);
        assert!(ServerVersion::new(2, 6, 12) >= MIN_SUPPORTED);
    }

    #[test]
    fn test_display() {
        assert_eq!(ServerVersion::new(3, 2, 1).to_string(), "3.2.1");
    }
}
