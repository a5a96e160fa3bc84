use std::fmt;
use std::time::Duration;

use bytes::Bytes;

use super::{Limit, ScanOptions, V2_8_0, V3_0_0, V3_0_3, V3_2_1, V4_0_0};
use crate::core::command::{self as conv, ensure_non_empty, Cmd};
use crate::proto::frame::Frame;
use crate::{ConnPool, Error, Result};

/// Millisecond timeouts, rounded up so a sub-millisecond timeout does not
/// turn into "no timeout" on the server.
fn whole_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis())
        .unwrap_or(u64::MAX)
        .saturating_add(u64::from(timeout.subsec_nanos() % 1_000_000 > 0))
}

/// The type reported by `TYPE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyType {
    /// The key does not exist.
    None,
    /// String value.
    String,
    /// Hash value.
    Hash,
    /// List value.
    List,
    /// Set value.
    Set,
    /// Sorted set value.
    ZSet,
    /// Stream value.
    Stream,
    /// A type this crate does not know (e.g. a module type).
    Other(String),
}

impl From<&str> for KeyType {
    fn from(s: &str) -> Self {
        match s {
            "none" => KeyType::None,
            "string" => KeyType::String,
            "hash" => KeyType::Hash,
            "list" => KeyType::List,
            "set" => KeyType::Set,
            "zset" => KeyType::ZSet,
            "stream" => KeyType::Stream,
            other => KeyType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KeyType::None => "none",
            KeyType::String => "string",
            KeyType::Hash => "hash",
            KeyType::List => "list",
            KeyType::Set => "set",
            KeyType::ZSet => "zset",
            KeyType::Stream => "stream",
            KeyType::Other(s) => s,
        })
    }
}

/// `OBJECT` subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectSubcommand {
    /// Internal encoding (`ziplist`, `int`, ...).
    Encoding,
    /// Number of references to the value.
    Refcount,
    /// Seconds since the last access.
    Idletime,
    /// Access frequency counter; needs an LFU maxmemory policy and 4.0.0.
    Freq,
}

impl ObjectSubcommand {
    fn as_str(&self) -> &'static str {
        match self {
            ObjectSubcommand::Encoding => "ENCODING",
            ObjectSubcommand::Refcount => "REFCOUNT",
            ObjectSubcommand::Idletime => "IDLETIME",
            ObjectSubcommand::Freq => "FREQ",
        }
    }
}

/// Flags for `MIGRATE`. Both need 3.0.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrateOptions {
    /// Keep the key on the source instance.
    pub copy: bool,
    /// Overwrite an existing key on the target.
    pub replace: bool,
}

/// Modifiers for `SORT`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortOptions {
    /// `BY pattern`; `nosort` skips sorting.
    pub by: Option<String>,
    /// `LIMIT offset count`.
    pub limit: Option<Limit>,
    /// `GET pattern`, repeated in order.
    pub get: Vec<String>,
    /// Sort descending.
    pub desc: bool,
    /// Compare lexicographically instead of numerically.
    pub alpha: bool,
}

impl SortOptions {
    /// Sorts by the values of an external key pattern.
    pub fn by(mut self, pattern: impl Into<String>) -> Self {
        self.by = Some(pattern.into());
        self
    }

    /// Returns only a window of the result.
    pub fn limit(mut self, offset: i64, count: i64) -> Self {
        self.limit = Some(Limit::new(offset, count));
        self
    }

    /// Adds a `GET` pattern.
    pub fn get(mut self, pattern: impl Into<String>) -> Self {
        self.get.push(pattern.into());
        self
    }

    /// Sorts descending.
    pub fn desc(mut self) -> Self {
        self.desc = true;
        self
    }

    /// Sorts lexicographically.
    pub fn alpha(mut self) -> Self {
        self.alpha = true;
        self
    }

    fn apply(&self, mut cmd: Cmd) -> Cmd {
        if let Some(by) = &self.by {
            cmd = cmd.arg("BY").arg(by);
        }
        if let Some(limit) = self.limit {
            cmd = limit.apply(cmd);
        }
        for pattern in &self.get {
            cmd = cmd.arg("GET").arg(pattern);
        }
        cmd.arg_if(self.desc, "DESC").arg_if(self.alpha, "ALPHA")
    }
}

/// Key commands.
impl ConnPool {
    /// Removes `keys`; returns how many existed.
    pub async fn del(&self, keys: &[&str]) -> Result<i64> {
        ensure_non_empty(keys, "DEL")?;
        conv::frame_to_int(self.on_master(Cmd::new("DEL").args(keys)).await?)
    }

    /// Serialized value of `key`, suitable for [`restore`](Self::restore).
    pub async fn dump(&self, key: &str) -> Result<Option<Bytes>> {
        conv::frame_to_bytes(self.on_replica(Cmd::new("DUMP").arg(key)).await?)
    }

    /// Whether `key` exists.
    pub async fn exists(&self, key: &str) -> Result<bool> {
        conv::frame_to_bool(self.on_replica(Cmd::new("EXISTS").arg(key)).await?)
    }

    /// How many of `keys` exist, counting repeats. Requires 3.0.3.
    pub async fn exists_many(&self, keys: &[&str]) -> Result<i64> {
        self.require("EXISTS", V3_0_3)?;
        ensure_non_empty(keys, "EXISTS")?;
        conv::frame_to_int(self.on_replica(Cmd::new("EXISTS").args(keys)).await?)
    }

    /// Sets a time to live in seconds.
    pub async fn expire(&self, key: &str, seconds: i64) -> Result<bool> {
        conv::frame_to_bool(
            self.on_master(Cmd::new("EXPIRE").arg(key).arg_num(seconds))
                .await?,
        )
    }

    /// Expires `key` at a Unix time in seconds.
    pub async fn expireat(&self, key: &str, timestamp: i64) -> Result<bool> {
        conv::frame_to_bool(
            self.on_master(Cmd::new("EXPIREAT").arg(key).arg_num(timestamp))
                .await?,
        )
    }

    /// Keys matching `pattern`.
    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        conv::frame_to_vec_string(self.on_replica(Cmd::new("KEYS").arg(pattern)).await?)
    }

    /// Moves `key` to another instance.
    ///
    /// Returns `false` when the key did not exist on the source (`NOKEY`).
    pub async fn migrate(
        &self,
        host: &str,
        port: u16,
        key: &str,
        db: u8,
        timeout: Duration,
        options: MigrateOptions,
    ) -> Result<bool> {
        if options.copy || options.replace {
            self.require("MIGRATE", V3_0_0)?;
        }
        let millis = whole_millis(timeout);
        let cmd = Cmd::new("MIGRATE")
            .arg(host)
            .arg_num(port)
            .arg(key)
            .arg_num(db)
            .arg_num(millis)
            .arg_if(options.copy, "COPY")
            .arg_if(options.replace, "REPLACE");
        match self.on_master(cmd).await? {
            Frame::SimpleString(s) if s == b"NOKEY" => Ok(false),
            other => conv::frame_to_unit(other).map(|_| true),
        }
    }

    /// Moves `key` to database `db`.
    pub async fn move_key(&self, key: &str, db: u8) -> Result<bool> {
        conv::frame_to_bool(self.on_master(Cmd::new("MOVE").arg(key).arg_num(db)).await?)
    }

    /// Internal encoding of the value at `key`.
    pub async fn object_encoding(&self, key: &str) -> Result<Option<String>> {
        conv::frame_to_opt_string(self.object(ObjectSubcommand::Encoding, key).await?)
    }

    /// Reference count, idle time or access frequency of the value at `key`.
    ///
    /// `Encoding` is rejected here; use [`object_encoding`](Self::object_encoding).
    pub async fn object_stat(&self, sub: ObjectSubcommand, key: &str) -> Result<Option<i64>> {
        match sub {
            ObjectSubcommand::Encoding => Err(Error::invalid(
                "OBJECT ENCODING replies with a string, use object_encoding",
            )),
            ObjectSubcommand::Freq => {
                self.require("OBJECT FREQ", V4_0_0)?;
                conv::frame_to_opt_int(self.object(sub, key).await?)
            }
            _ => conv::frame_to_opt_int(self.object(sub, key).await?),
        }
    }

    async fn object(&self, sub: ObjectSubcommand, key: &str) -> Result<Frame> {
        self.on_replica(Cmd::new("OBJECT").arg(sub.as_str()).arg(key))
            .await
    }

    /// Removes the time to live of `key`.
    pub async fn persist(&self, key: &str) -> Result<bool> {
        conv::frame_to_bool(self.on_master(Cmd::new("PERSIST").arg(key)).await?)
    }

    /// Sets a time to live in milliseconds.
    pub async fn pexpire(&self, key: &str, millis: i64) -> Result<bool> {
        conv::frame_to_bool(
            self.on_master(Cmd::new("PEXPIRE").arg(key).arg_num(millis))
                .await?,
        )
    }

    /// Expires `key` at a Unix time in milliseconds.
    pub async fn pexpireat(&self, key: &str, timestamp_ms: i64) -> Result<bool> {
        conv::frame_to_bool(
            self.on_master(Cmd::new("PEXPIREAT").arg(key).arg_num(timestamp_ms))
                .await?,
        )
    }

    /// Remaining time to live in milliseconds; -2 if missing, -1 if persistent.
    pub async fn pttl(&self, key: &str) -> Result<i64> {
        conv::frame_to_int(self.on_replica(Cmd::new("PTTL").arg(key)).await?)
    }

    /// A random key, or `None` when the database is empty.
    pub async fn randomkey(&self) -> Result<Option<String>> {
        conv::frame_to_opt_string(self.on_replica(Cmd::new("RANDOMKEY")).await?)
    }

    /// Renames `key`, overwriting `new_key`.
    pub async fn rename(&self, key: &str, new_key: &str) -> Result<()> {
        conv::frame_to_unit(self.on_master(Cmd::new("RENAME").arg(key).arg(new_key)).await?)
    }

    /// Renames `key` only if `new_key` does not exist.
    pub async fn renamenx(&self, key: &str, new_key: &str) -> Result<bool> {
        conv::frame_to_bool(
            self.on_master(Cmd::new("RENAMENX").arg(key).arg(new_key))
                .await?,
        )
    }

    /// Recreates `key` from a [`dump`](Self::dump) payload.
    ///
    /// `replace` is only sent to 3.0.0 and newer; older servers fail when
    /// the key exists.
    pub async fn restore(
        &self,
        key: &str,
        ttl_ms: u64,
        serialized: impl AsRef<[u8]>,
        replace: bool,
    ) -> Result<()> {
        let cmd = Cmd::new("RESTORE")
            .arg(key)
            .arg_num(ttl_ms)
            .arg(serialized)
            .arg_if(replace && self.supports(V3_0_0), "REPLACE");
        conv::frame_to_unit(self.on_master(cmd).await?)
    }

    /// One step of a keyspace iteration. Requires 2.8.0.
    ///
    /// Start with cursor 0; the iteration is complete when 0 comes back.
    pub async fn scan(&self, cursor: u64, options: &ScanOptions) -> Result<(u64, Vec<String>)> {
        self.require("SCAN", V2_8_0)?;
        let cmd = options.apply(Cmd::new("SCAN").arg_num(cursor));
        let (next, page) = conv::frame_to_scan_page(self.on_replica(cmd).await?)?;
        Ok((next, conv::frame_to_vec_string(page)?))
    }

    /// Sorted elements of the list, set or sorted set at `key`.
    ///
    /// Elements are `None` where a `GET` pattern pointed at a missing key.
    pub async fn sort(&self, key: &str, options: &SortOptions) -> Result<Vec<Option<Bytes>>> {
        let cmd = options.apply(Cmd::new("SORT").arg(key));
        conv::frame_to_vec_bytes(self.on_replica(cmd).await?)
    }

    /// Sorts into `dest`; returns the number of stored elements.
    pub async fn sort_store(&self, key: &str, options: &SortOptions, dest: &str) -> Result<i64> {
        let cmd = options.apply(Cmd::new("SORT").arg(key)).arg("STORE").arg(dest);
        conv::frame_to_int(self.on_master(cmd).await?)
    }

    /// Updates the access time of `keys`. Requires 3.2.1.
    pub async fn touch(&self, keys: &[&str]) -> Result<i64> {
        self.require("TOUCH", V3_2_1)?;
        ensure_non_empty(keys, "TOUCH")?;
        conv::frame_to_int(self.on_master(Cmd::new("TOUCH").args(keys)).await?)
    }

    /// Remaining time to live in seconds; -2 if missing, -1 if persistent.
    pub async fn ttl(&self, key: &str) -> Result<i64> {
        conv::frame_to_int(self.on_replica(Cmd::new("TTL").arg(key)).await?)
    }

    /// The type of the value at `key`.
    pub async fn key_type(&self, key: &str) -> Result<KeyType> {
        let name = conv::frame_to_string(self.on_master(Cmd::new("TYPE").arg(key)).await?)?;
        Ok(KeyType::from(name.as_str()))
    }

    /// Removes `keys`, reclaiming memory in the background. Requires 4.0.0.
    pub async fn unlink(&self, keys: &[&str]) -> Result<i64> {
        self.require("UNLINK", V4_0_0)?;
        ensure_non_empty(keys, "UNLINK")?;
        conv::frame_to_int(self.on_master(Cmd::new("UNLINK").args(keys)).await?)
    }

    /// Blocks until `replicas` acknowledged previous writes or `timeout`
    /// elapses (zero waits forever); returns the number that acknowledged.
    pub async fn wait(&self, replicas: u32, timeout: Duration) -> Result<i64> {
        let millis = whole_millis(timeout);
        let cmd = Cmd::new("WAIT").arg_num(replicas).arg_num(millis);
        conv::frame_to_int(
            self.on_master_blocking(cmd, Duration::from_millis(millis))
                .await?,
        )
    }
}
