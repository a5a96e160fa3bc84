//! One method on [`ConnPool`](crate::ConnPool) per protocol command.
//!
//! Writes are sent to the master; reads rotate across the replicas. Commands
//! newer than the master's server version fail with
//! [`Error::NotSupported`](crate::Error::NotSupported) before anything is sent.

mod geo;
mod hashes;
mod keys;
mod lists;
mod server;
mod sets;
mod sorted_sets;
mod strings;

pub use geo::{GeoMember, GeoRadiusOptions, GeoUnit};
pub use keys::{KeyType, MigrateOptions, ObjectSubcommand, SortOptions};
pub use lists::Position;
pub use server::{ReplicaInfo, Role};
pub use sorted_sets::{Aggregate, LexBound, ScoreBound, StoreOptions, ZAddOptions};
pub use strings::{BitFieldOp, BitOp, Overflow, SetOptions};

use crate::core::command::Cmd;
use crate::core::version::ServerVersion;

/// Write guard shared by `SET` and `ZADD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Only act when the key (or member) does not exist yet (`NX`).
    NotExists,
    /// Only act when the key (or member) already exists (`XX`).
    Exists,
}

impl Condition {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Condition::NotExists => "NX",
            Condition::Exists => "XX",
        }
    }
}

/// `LIMIT offset count` for range queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    /// Elements to skip.
    pub offset: i64,
    /// Elements to return; negative means all remaining.
    pub count: i64,
}

impl Limit {
    /// Creates a limit.
    pub fn new(offset: i64, count: i64) -> Self {
        Self { offset, count }
    }

    pub(crate) fn apply(self, cmd: Cmd) -> Cmd {
        cmd.arg("LIMIT").arg_num(self.offset).arg_num(self.count)
    }
}

/// `MATCH` and `COUNT` for the `SCAN` family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Glob-style pattern the returned elements must match.
    pub pattern: Option<String>,
    /// Amount of work the server does per call.
    pub count: Option<u64>,
}

impl ScanOptions {
    /// Sets the `MATCH` pattern.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Sets the `COUNT` hint.
    pub fn count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    pub(crate) fn apply(&self, mut cmd: Cmd) -> Cmd {
        if let Some(pattern) = &self.pattern {
            cmd = cmd.arg("MATCH").arg(pattern);
        }
        if let Some(count) = self.count {
            cmd = cmd.arg("COUNT").arg_num(count);
        }
        cmd
    }
}

pub(crate) const V2_8_0: ServerVersion = ServerVersion::new(2, 8, 0);
pub(crate) const V2_8_7: ServerVersion = ServerVersion::new(2, 8, 7);
pub(crate) const V2_8_9: ServerVersion = ServerVersion::new(2, 8, 9);
pub(crate) const V2_8_12: ServerVersion = ServerVersion::new(2, 8, 12);
pub(crate) const V3_0_0: ServerVersion = ServerVersion::new(3, 0, 0);
pub(crate) const V3_0_2: ServerVersion = ServerVersion::new(3, 0, 2);
pub(crate) const V3_0_3: ServerVersion = ServerVersion::new(3, 0, 3);
pub(crate) const V3_2_0: ServerVersion = ServerVersion::new(3, 2, 0);
pub(crate) const V3_2_1: ServerVersion = ServerVersion::new(3, 2, 1);
pub(crate) const V3_2_10: ServerVersion = ServerVersion::new(3, 2, 10);
pub(crate) const V4_0_0: ServerVersion = ServerVersion::new(4, 0, 0);

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_limit_apply() {
        let cmd = Limit::new(10, -1).apply(Cmd::new("ZRANGEBYSCORE"));
        assert_eq!(
            cmd.arguments(),
            &[Bytes::from("LIMIT"), Bytes::from("10"), Bytes::from("-1")]
        );
    }

    #[test]
    fn test_scan_options_apply() {
        let cmd = ScanOptions::default()
            .pattern("user:*")
            .count(100)
            .apply(Cmd::new("SCAN").arg("0"));
        assert_eq!(
            cmd.arguments(),
            &[
                Bytes::from("0"),
                Bytes::from("MATCH"),
                Bytes::from("user:*"),
                Bytes::from("COUNT"),
                Bytes::from("100")
            ]
        );
        assert_eq!(ScanOptions::default().apply(Cmd::new("SCAN")).arguments().len(), 0);
    }

    #[test]
    fn test_condition_as_str() {
        assert_eq!(Condition::NotExists.as_str(), "NX");
        assert_eq!(Condition::Exists.as_str(), "XX");
    }
}
