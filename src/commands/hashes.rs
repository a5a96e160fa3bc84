use std::collections::HashMap;

use bytes::Bytes;

use super::{ScanOptions, V2_8_0, V3_2_0};
use crate::core::command::{self as conv, ensure_non_empty, Cmd};
use crate::{ConnPool, Error, Result};

/// Hash commands.
impl ConnPool {
    /// Removes `fields` from the hash; returns how many existed.
    pub async fn hdel(&self, key: &str, fields: &[&str]) -> Result<i64> {
        ensure_non_empty(fields, "HDEL")?;
        conv::frame_to_int(self.on_master(Cmd::new("HDEL").arg(key).args(fields)).await?)
    }

    /// Whether `field` exists in the hash.
    pub async fn hexists(&self, key: &str, field: &str) -> Result<bool> {
        conv::frame_to_bool(
            self.on_replica(Cmd::new("HEXISTS").arg(key).arg(field))
                .await?,
        )
    }

    /// Value of `field`, or `None` if the field or the hash is missing.
    pub async fn hget(&self, key: &str, field: &str) -> Result<Option<Bytes>> {
        conv::frame_to_bytes(self.on_replica(Cmd::new("HGET").arg(key).arg(field)).await?)
    }

    /// Every field and value of the hash.
    pub async fn hgetall(&self, key: &str) -> Result<HashMap<String, Bytes>> {
        conv::frame_to_hashmap(self.on_replica(Cmd::new("HGETALL").arg(key)).await?)
    }

    /// Increments the integer in `field` by `increment`.
    pub async fn hincr_by(&self, key: &str, field: &str, increment: i64) -> Result<i64> {
        let cmd = Cmd::new("HINCRBY").arg(key).arg(field).arg_num(increment);
        conv::frame_to_int(self.on_master(cmd).await?)
    }

    /// Increments the float in `field` by `increment`.
    pub async fn hincr_by_float(&self, key: &str, field: &str, increment: f64) -> Result<f64> {
        let cmd = Cmd::new("HINCRBYFLOAT")
            .arg(key)
            .arg(field)
            .arg_num(increment);
        conv::frame_to_float(self.on_master(cmd).await?)
    }

    /// Field names of the hash.
    pub async fn hkeys(&self, key: &str) -> Result<Vec<String>> {
        conv::frame_to_vec_string(self.on_replica(Cmd::new("HKEYS").arg(key)).await?)
    }

    /// Number of fields in the hash.
    pub async fn hlen(&self, key: &str) -> Result<i64> {
        conv::frame_to_int(self.on_replica(Cmd::new("HLEN").arg(key)).await?)
    }

    /// Values of `fields`, in order; missing fields are `None`.
    pub async fn hmget(&self, key: &str, fields: &[&str]) -> Result<Vec<Option<Bytes>>> {
        ensure_non_empty(fields, "HMGET")?;
        let values =
            conv::frame_to_vec_bytes(self.on_replica(Cmd::new("HMGET").arg(key).args(fields)).await?)?;
        if values.len() != fields.len() {
            return Err(Error::protocol(format!(
                "HMGET returned {} values for {} fields",
                values.len(),
                fields.len()
            )));
        }
        Ok(values)
    }

    /// Sets every field/value pair.
    pub async fn hmset<V: AsRef<[u8]>>(&self, key: &str, pairs: &[(&str, V)]) -> Result<()> {
        ensure_non_empty(pairs, "HMSET")?;
        let cmd = pairs
            .iter()
            .fold(Cmd::new("HMSET").arg(key), |cmd, (f, v)| cmd.arg(f).arg(v));
        conv::frame_to_unit(self.on_master(cmd).await?)
    }

    /// One step of a hash iteration. Requires 2.8.0.
    pub async fn hscan(
        &self,
        key: &str,
        cursor: u64,
        options: &ScanOptions,
    ) -> Result<(u64, Vec<(String, Bytes)>)> {
        self.require("HSCAN", V2_8_0)?;
        let cmd = options.apply(Cmd::new("HSCAN").arg(key).arg_num(cursor));
        let (next, page) = conv::frame_to_scan_page(self.on_replica(cmd).await?)?;
        Ok((next, conv::frame_to_pairs(page)?))
    }

    /// Sets `field`; returns `true` if the field is new.
    pub async fn hset(&self, key: &str, field: &str, value: impl AsRef<[u8]>) -> Result<bool> {
        let cmd = Cmd::new("HSET").arg(key).arg(field).arg(value);
        conv::frame_to_bool(self.on_master(cmd).await?)
    }

    /// Sets `field` only if it does not exist.
    pub async fn hsetnx(&self, key: &str, field: &str, value: impl AsRef<[u8]>) -> Result<bool> {
        let cmd = Cmd::new("HSETNX").arg(key).arg(field).arg(value);
        conv::frame_to_bool(self.on_master(cmd).await?)
    }

    /// Length of the value in `field`. Requires 3.2.0.
    pub async fn hstrlen(&self, key: &str, field: &str) -> Result<i64> {
        self.require("HSTRLEN", V3_2_0)?;
        conv::frame_to_int(
            self.on_replica(Cmd::new("HSTRLEN").arg(key).arg(field))
                .await?,
        )
    }

    /// Values of the hash.
    pub async fn hvals(&self, key: &str) -> Result<Vec<Bytes>> {
        conv::frame_to_vec_value(self.on_replica(Cmd::new("HVALS").arg(key)).await?)
    }
}
