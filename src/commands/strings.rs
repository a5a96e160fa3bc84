use bytes::Bytes;

use super::{Condition, V2_8_7, V3_2_0};
use crate::core::command::{self as conv, ensure_non_empty, Cmd};
use crate::{ConnPool, Error, Result};

/// Operator for `BITOP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOp {
    /// Bitwise AND.
    And,
    /// Bitwise OR.
    Or,
    /// Bitwise XOR.
    Xor,
    /// Bitwise NOT; takes exactly one source key.
    Not,
}

impl BitOp {
    fn as_str(&self) -> &'static str {
        match self {
            BitOp::And => "AND",
            BitOp::Or => "OR",
            BitOp::Xor => "XOR",
            BitOp::Not => "NOT",
        }
    }
}

/// Overflow behaviour for the `BITFIELD` operations that follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    /// Wrap around.
    Wrap,
    /// Saturate at the type bounds.
    Sat,
    /// Skip the operation and reply nil.
    Fail,
}

/// One `BITFIELD` sub-operation.
///
/// `ty` is an encoding like `i5` or `u8`; `offset` is a bit offset, or a
/// `#`-prefixed multiple of the type width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BitFieldOp {
    /// `GET type offset`
    Get {
        /// Integer encoding.
        ty: String,
        /// Bit offset.
        offset: String,
    },
    /// `SET type offset value`
    Set {
        /// Integer encoding.
        ty: String,
        /// Bit offset.
        offset: String,
        /// New value.
        value: i64,
    },
    /// `INCRBY type offset increment`
    IncrBy {
        /// Integer encoding.
        ty: String,
        /// Bit offset.
        offset: String,
        /// Amount to add.
        increment: i64,
    },
    /// `OVERFLOW WRAP|SAT|FAIL`
    Overflow(Overflow),
}

impl BitFieldOp {
    fn apply(&self, cmd: Cmd) -> Cmd {
        match self {
            BitFieldOp::Get { ty, offset } => cmd.arg("GET").arg(ty).arg(offset),
            BitFieldOp::Set { ty, offset, value } => {
                cmd.arg("SET").arg(ty).arg(offset).arg_num(value)
            }
            BitFieldOp::IncrBy {
                ty,
                offset,
                increment,
            } => cmd.arg("INCRBY").arg(ty).arg(offset).arg_num(increment),
            BitFieldOp::Overflow(o) => cmd.arg("OVERFLOW").arg(match o {
                Overflow::Wrap => "WRAP",
                Overflow::Sat => "SAT",
                Overflow::Fail => "FAIL",
            }),
        }
    }
}

/// Expiry and condition for `SET`.
///
/// When both `ex` and `px` are set, `EX` is sent and `px` is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Expiry in seconds.
    pub ex: Option<u64>,
    /// Expiry in milliseconds.
    pub px: Option<u64>,
    /// Only set if the key does or does not exist.
    pub condition: Option<Condition>,
}

impl SetOptions {
    /// Expire after `seconds`.
    pub fn ex(mut self, seconds: u64) -> Self {
        self.ex = Some(seconds);
        self
    }

    /// Expire after `millis`.
    pub fn px(mut self, millis: u64) -> Self {
        self.px = Some(millis);
        self
    }

    /// Only set the key if it does not exist.
    pub fn nx(mut self) -> Self {
        self.condition = Some(Condition::NotExists);
        self
    }

    /// Only set the key if it already exists.
    pub fn xx(mut self) -> Self {
        self.condition = Some(Condition::Exists);
        self
    }

    fn apply(&self, mut cmd: Cmd) -> Cmd {
        match (self.ex.filter(|s| *s > 0), self.px.filter(|m| *m > 0)) {
            (Some(s), _) => cmd = cmd.arg("EX").arg_num(s),
            (None, Some(ms)) => cmd = cmd.arg("PX").arg_num(ms),
            (None, None) => {}
        }
        if let Some(cond) = self.condition {
            cmd = cmd.arg(cond.as_str());
        }
        cmd
    }
}

/// String commands.
impl ConnPool {
    /// Appends `value` to the string at `key`; returns the new length.
    pub async fn append(&self, key: &str, value: impl AsRef<[u8]>) -> Result<i64> {
        conv::frame_to_int(self.on_master(Cmd::new("APPEND").arg(key).arg(value)).await?)
    }

    /// Counts set bits, optionally within a byte range.
    pub async fn bitcount(&self, key: &str, range: Option<(i64, i64)>) -> Result<i64> {
        let mut cmd = Cmd::new("BITCOUNT").arg(key);
        if let Some((start, end)) = range {
            cmd = cmd.arg_num(start).arg_num(end);
        }
        conv::frame_to_int(self.on_replica(cmd).await?)
    }

    /// Runs `BITFIELD` sub-operations. Requires 3.2.0.
    ///
    /// Each `GET`, `SET` and `INCRBY` produces one element; it is `None` when
    /// an `OVERFLOW FAIL` skipped the operation.
    pub async fn bitfield(&self, key: &str, ops: &[BitFieldOp]) -> Result<Vec<Option<i64>>> {
        self.require("BITFIELD", V3_2_0)?;
        ensure_non_empty(ops, "BITFIELD")?;
        let cmd = ops
            .iter()
            .fold(Cmd::new("BITFIELD").arg(key), |cmd, op| op.apply(cmd));
        conv::frame_to_vec_opt_int(self.on_master(cmd).await?)
    }

    /// Combines `keys` bitwise into `dest`; returns the length of `dest`.
    pub async fn bitop(&self, op: BitOp, dest: &str, keys: &[&str]) -> Result<i64> {
        ensure_non_empty(keys, "BITOP")?;
        if op == BitOp::Not && keys.len() != 1 {
            return Err(Error::invalid("BITOP NOT takes exactly one source key"));
        }
        let cmd = Cmd::new("BITOP").arg(op.as_str()).arg(dest).args(keys);
        conv::frame_to_int(self.on_master(cmd).await?)
    }

    /// Position of the first bit equal to `bit`. Requires 2.8.7.
    ///
    /// `end` is only honoured together with `start`.
    pub async fn bitpos(
        &self,
        key: &str,
        bit: bool,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<i64> {
        self.require("BITPOS", V2_8_7)?;
        let mut cmd = Cmd::new("BITPOS").arg(key).arg(if bit { "1" } else { "0" });
        match (start, end) {
            (Some(s), Some(e)) => cmd = cmd.arg_num(s).arg_num(e),
            (Some(s), None) => cmd = cmd.arg_num(s),
            (None, Some(_)) => return Err(Error::invalid("BITPOS end needs a start")),
            (None, None) => {}
        }
        conv::frame_to_int(self.on_master(cmd).await?)
    }

    /// Decrements the integer at `key` by one.
    pub async fn decr(&self, key: &str) -> Result<i64> {
        conv::frame_to_int(self.on_master(Cmd::new("DECR").arg(key)).await?)
    }

    /// Decrements the integer at `key` by `decrement`.
    pub async fn decr_by(&self, key: &str, decrement: i64) -> Result<i64> {
        conv::frame_to_int(
            self.on_master(Cmd::new("DECRBY").arg(key).arg_num(decrement))
                .await?,
        )
    }

    /// Value of `key`, or `None` if it does not exist.
    pub async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        conv::frame_to_bytes(self.on_replica(Cmd::new("GET").arg(key)).await?)
    }

    /// Bit at `offset`.
    pub async fn getbit(&self, key: &str, offset: u64) -> Result<i64> {
        conv::frame_to_int(
            self.on_replica(Cmd::new("GETBIT").arg(key).arg_num(offset))
                .await?,
        )
    }

    /// Substring between `start` and `end` (inclusive, negative from the end).
    pub async fn getrange(&self, key: &str, start: i64, end: i64) -> Result<Bytes> {
        let cmd = Cmd::new("GETRANGE").arg(key).arg_num(start).arg_num(end);
        Ok(conv::frame_to_bytes(self.on_replica(cmd).await?)?.unwrap_or_default())
    }

    /// Sets `key` and returns its previous value.
    pub async fn getset(&self, key: &str, value: impl AsRef<[u8]>) -> Result<Option<Bytes>> {
        conv::frame_to_bytes(self.on_master(Cmd::new("GETSET").arg(key).arg(value)).await?)
    }

    /// Increments the integer at `key` by one.
    pub async fn incr(&self, key: &str) -> Result<i64> {
        conv::frame_to_int(self.on_master(Cmd::new("INCR").arg(key)).await?)
    }

    /// Increments the integer at `key` by `increment`.
    pub async fn incr_by(&self, key: &str, increment: i64) -> Result<i64> {
        conv::frame_to_int(
            self.on_master(Cmd::new("INCRBY").arg(key).arg_num(increment))
                .await?,
        )
    }

    /// Increments the float at `key` by `increment`.
    pub async fn incr_by_float(&self, key: &str, increment: f64) -> Result<f64> {
        conv::frame_to_float(
            self.on_master(Cmd::new("INCRBYFLOAT").arg(key).arg_num(increment))
                .await?,
        )
    }

    /// Values of `keys`, in order; missing keys are `None`.
    pub async fn mget(&self, keys: &[&str]) -> Result<Vec<Option<Bytes>>> {
        ensure_non_empty(keys, "MGET")?;
        let values = conv::frame_to_vec_bytes(self.on_replica(Cmd::new("MGET").args(keys)).await?)?;
        if values.len() != keys.len() {
            return Err(Error::protocol(format!(
                "MGET returned {} values for {} keys",
                values.len(),
                keys.len()
            )));
        }
        Ok(values)
    }

    /// Sets every pair.
    pub async fn mset<V: AsRef<[u8]>>(&self, pairs: &[(&str, V)]) -> Result<()> {
        ensure_non_empty(pairs, "MSET")?;
        conv::frame_to_unit(self.on_master(pair_args(Cmd::new("MSET"), pairs)).await?)
    }

    /// Sets every pair only if none of the keys exist.
    pub async fn msetnx<V: AsRef<[u8]>>(&self, pairs: &[(&str, V)]) -> Result<bool> {
        ensure_non_empty(pairs, "MSETNX")?;
        conv::frame_to_bool(self.on_master(pair_args(Cmd::new("MSETNX"), pairs)).await?)
    }

    /// Sets `key` with a time to live in milliseconds.
    pub async fn psetex(&self, key: &str, millis: u64, value: impl AsRef<[u8]>) -> Result<()> {
        let cmd = Cmd::new("PSETEX").arg(key).arg_num(millis).arg(value);
        conv::frame_to_unit(self.on_master(cmd).await?)
    }

    /// Sets `key` unconditionally.
    pub async fn set(&self, key: &str, value: impl AsRef<[u8]>) -> Result<()> {
        conv::frame_to_unit(self.on_master(Cmd::new("SET").arg(key).arg(value)).await?)
    }

    /// Sets `key` with an expiry and/or condition.
    ///
    /// Returns `false` when the `NX`/`XX` condition prevented the write.
    pub async fn set_with(
        &self,
        key: &str,
        value: impl AsRef<[u8]>,
        options: SetOptions,
    ) -> Result<bool> {
        let cmd = options.apply(Cmd::new("SET").arg(key).arg(value));
        conv::frame_to_status_flag(self.on_master(cmd).await?)
    }

    /// Sets or clears the bit at `offset`; returns the previous bit.
    pub async fn setbit(&self, key: &str, offset: u64, value: bool) -> Result<i64> {
        let cmd = Cmd::new("SETBIT")
            .arg(key)
            .arg_num(offset)
            .arg(if value { "1" } else { "0" });
        conv::frame_to_int(self.on_master(cmd).await?)
    }

    /// Sets `key` with a time to live in seconds.
    pub async fn setex(&self, key: &str, seconds: u64, value: impl AsRef<[u8]>) -> Result<()> {
        let cmd = Cmd::new("SETEX").arg(key).arg_num(seconds).arg(value);
        conv::frame_to_unit(self.on_master(cmd).await?)
    }

    /// Sets `key` only if it does not exist.
    pub async fn setnx(&self, key: &str, value: impl AsRef<[u8]>) -> Result<bool> {
        conv::frame_to_bool(self.on_master(Cmd::new("SETNX").arg(key).arg(value)).await?)
    }

    /// Overwrites part of the string at `offset`; returns the new length.
    pub async fn setrange(&self, key: &str, offset: u64, value: impl AsRef<[u8]>) -> Result<i64> {
        let cmd = Cmd::new("SETRANGE").arg(key).arg_num(offset).arg(value);
        conv::frame_to_int(self.on_master(cmd).await?)
    }

    /// Length of the string at `key`.
    pub async fn strlen(&self, key: &str) -> Result<i64> {
        conv::frame_to_int(self.on_replica(Cmd::new("STRLEN").arg(key)).await?)
    }
}

fn pair_args<V: AsRef<[u8]>>(cmd: Cmd, pairs: &[(&str, V)]) -> Cmd {
    pairs
        .iter()
        .fold(cmd, |cmd, (k, v)| cmd.arg(k).arg(v))
}
