use std::time::Duration;

use bytes::Bytes;

use crate::core::command::{self as conv, ensure_non_empty, Cmd};
use crate::proto::frame::Frame;
use crate::{ConnPool, Error, Result};

/// Where `LINSERT` puts the new element relative to the pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Insert before the pivot.
    Before,
    /// Insert after the pivot.
    After,
}

/// Blocking timeouts go over the wire in whole seconds, rounded up so a
/// sub-second timeout does not turn into "block forever".
fn block_secs(timeout: Duration) -> u64 {
    timeout
        .as_secs()
        .saturating_add(u64::from(timeout.subsec_nanos() > 0))
}

fn popped_pair(frame: Frame) -> Result<Option<(String, Bytes)>> {
    if frame.is_null() {
        return Ok(None);
    }
    let mut items = conv::frame_to_array(frame)?.into_iter();
    match (items.next(), items.next(), items.next()) {
        (Some(key), Some(value), None) => Ok(Some((
            conv::frame_to_string(key)?,
            conv::frame_to_value(value)?,
        ))),
        _ => Err(Error::protocol("blocking pop reply must have 2 elements")),
    }
}

/// List commands.
impl ConnPool {
    /// Pops the head of the first non-empty list among `keys`, waiting up to
    /// `timeout` (zero waits forever). Returns the list name and the element.
    pub async fn blpop(&self, keys: &[&str], timeout: Duration) -> Result<Option<(String, Bytes)>> {
        self.blocking_pop("BLPOP", keys, timeout).await
    }

    /// Like [`blpop`](Self::blpop) but pops the tail.
    pub async fn brpop(&self, keys: &[&str], timeout: Duration) -> Result<Option<(String, Bytes)>> {
        self.blocking_pop("BRPOP", keys, timeout).await
    }

    async fn blocking_pop(
        &self,
        name: &'static str,
        keys: &[&str],
        timeout: Duration,
    ) -> Result<Option<(String, Bytes)>> {
        ensure_non_empty(keys, name)?;
        let secs = block_secs(timeout);
        let cmd = Cmd::new(name).args(keys).arg_num(secs);
        popped_pair(
            self.on_master_blocking(cmd, Duration::from_secs(secs))
                .await?,
        )
    }

    /// Pops the tail of `source` onto `dest`, waiting up to `timeout`.
    pub async fn brpoplpush(&self, source: &str, dest: &str, timeout: Duration) -> Result<Option<Bytes>> {
        let secs = block_secs(timeout);
        let cmd = Cmd::new("BRPOPLPUSH").arg(source).arg(dest).arg_num(secs);
        conv::frame_to_bytes(
            self.on_master_blocking(cmd, Duration::from_secs(secs))
                .await?,
        )
    }

    /// Element at `index` (negative counts from the tail).
    pub async fn lindex(&self, key: &str, index: i64) -> Result<Option<Bytes>> {
        conv::frame_to_bytes(
            self.on_replica(Cmd::new("LINDEX").arg(key).arg_num(index))
                .await?,
        )
    }

    /// Inserts `value` next to `pivot`; returns the new length, or -1 when
    /// the pivot was not found.
    pub async fn linsert(
        &self,
        key: &str,
        position: Position,
        pivot: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) -> Result<i64> {
        let cmd = Cmd::new("LINSERT")
            .arg(key)
            .arg(match position {
                Position::Before => "BEFORE",
                Position::After => "AFTER",
            })
            .arg(pivot)
            .arg(value);
        conv::frame_to_int(self.on_master(cmd).await?)
    }

    /// Length of the list.
    pub async fn llen(&self, key: &str) -> Result<i64> {
        conv::frame_to_int(self.on_replica(Cmd::new("LLEN").arg(key)).await?)
    }

    /// Removes and returns the head.
    pub async fn lpop(&self, key: &str) -> Result<Option<Bytes>> {
        conv::frame_to_bytes(self.on_master(Cmd::new("LPOP").arg(key)).await?)
    }

    /// Prepends `values`; returns the new length.
    pub async fn lpush<V: AsRef<[u8]>>(&self, key: &str, values: &[V]) -> Result<i64> {
        ensure_non_empty(values, "LPUSH")?;
        conv::frame_to_int(self.on_master(Cmd::new("LPUSH").arg(key).args(values)).await?)
    }

    /// Prepends `value` only if the list exists.
    pub async fn lpushx(&self, key: &str, value: impl AsRef<[u8]>) -> Result<i64> {
        conv::frame_to_int(self.on_master(Cmd::new("LPUSHX").arg(key).arg(value)).await?)
    }

    /// Elements between `start` and `stop`, inclusive.
    pub async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Bytes>> {
        let cmd = Cmd::new("LRANGE").arg(key).arg_num(start).arg_num(stop);
        conv::frame_to_vec_value(self.on_replica(cmd).await?)
    }

    /// Removes up to `count` occurrences of `value` (all when zero, from the
    /// tail when negative).
    pub async fn lrem(&self, key: &str, count: i64, value: impl AsRef<[u8]>) -> Result<i64> {
        let cmd = Cmd::new("LREM").arg(key).arg_num(count).arg(value);
        conv::frame_to_int(self.on_master(cmd).await?)
    }

    /// Overwrites the element at `index`.
    pub async fn lset(&self, key: &str, index: i64, value: impl AsRef<[u8]>) -> Result<()> {
        let cmd = Cmd::new("LSET").arg(key).arg_num(index).arg(value);
        conv::frame_to_unit(self.on_master(cmd).await?)
    }

    /// Keeps only the elements between `start` and `stop`.
    pub async fn ltrim(&self, key: &str, start: i64, stop: i64) -> Result<()> {
        let cmd = Cmd::new("LTRIM").arg(key).arg_num(start).arg_num(stop);
        conv::frame_to_unit(self.on_master(cmd).await?)
    }

    /// Removes and returns the tail.
    pub async fn rpop(&self, key: &str) -> Result<Option<Bytes>> {
        conv::frame_to_bytes(self.on_master(Cmd::new("RPOP").arg(key)).await?)
    }

    /// Pops the tail of `source` onto the head of `dest`.
    pub async fn rpoplpush(&self, source: &str, dest: &str) -> Result<Option<Bytes>> {
        conv::frame_to_bytes(
            self.on_master(Cmd::new("RPOPLPUSH").arg(source).arg(dest))
                .await?,
        )
    }

    /// Appends `values`; returns the new length.
    pub async fn rpush<V: AsRef<[u8]>>(&self, key: &str, values: &[V]) -> Result<i64> {
        ensure_non_empty(values, "RPUSH")?;
        conv::frame_to_int(self.on_master(Cmd::new("RPUSH").arg(key).args(values)).await?)
    }

    /// Appends `value` only if the list exists.
    pub async fn rpushx(&self, key: &str, value: impl AsRef<[u8]>) -> Result<i64> {
        conv::frame_to_int(self.on_master(Cmd::new("RPUSHX").arg(key).arg(value)).await?)
    }
}
