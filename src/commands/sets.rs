use super::{ScanOptions, V2_8_0, V3_2_0};
use crate::core::command::{self as conv, ensure_non_empty, Cmd};
use crate::{ConnPool, Result};

/// Set commands.
impl ConnPool {
    /// Adds `members`; returns how many were new.
    pub async fn sadd<M: AsRef<[u8]>>(&self, key: &str, members: &[M]) -> Result<i64> {
        ensure_non_empty(members, "SADD")?;
        conv::frame_to_int(self.on_master(Cmd::new("SADD").arg(key).args(members)).await?)
    }

    /// Number of members.
    pub async fn scard(&self, key: &str) -> Result<i64> {
        conv::frame_to_int(self.on_replica(Cmd::new("SCARD").arg(key)).await?)
    }

    /// Members of the first set missing from all the others.
    pub async fn sdiff(&self, keys: &[&str]) -> Result<Vec<String>> {
        ensure_non_empty(keys, "SDIFF")?;
        conv::frame_to_vec_string(self.on_replica(Cmd::new("SDIFF").args(keys)).await?)
    }

    /// Stores [`sdiff`](Self::sdiff) in `dest`; returns its size.
    pub async fn sdiffstore(&self, dest: &str, keys: &[&str]) -> Result<i64> {
        ensure_non_empty(keys, "SDIFFSTORE")?;
        conv::frame_to_int(
            self.on_master(Cmd::new("SDIFFSTORE").arg(dest).args(keys))
                .await?,
        )
    }

    /// Members present in every set.
    pub async fn sinter(&self, keys: &[&str]) -> Result<Vec<String>> {
        ensure_non_empty(keys, "SINTER")?;
        conv::frame_to_vec_string(self.on_replica(Cmd::new("SINTER").args(keys)).await?)
    }

    /// Stores [`sinter`](Self::sinter) in `dest`; returns its size.
    pub async fn sinterstore(&self, dest: &str, keys: &[&str]) -> Result<i64> {
        ensure_non_empty(keys, "SINTERSTORE")?;
        conv::frame_to_int(
            self.on_master(Cmd::new("SINTERSTORE").arg(dest).args(keys))
                .await?,
        )
    }

    /// Whether `member` is in the set.
    pub async fn sismember(&self, key: &str, member: impl AsRef<[u8]>) -> Result<bool> {
        conv::frame_to_bool(
            self.on_replica(Cmd::new("SISMEMBER").arg(key).arg(member))
                .await?,
        )
    }

    /// Every member of the set.
    pub async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        conv::frame_to_vec_string(self.on_replica(Cmd::new("SMEMBERS").arg(key)).await?)
    }

    /// Moves `member` from `source` to `dest`.
    pub async fn smove(&self, source: &str, dest: &str, member: impl AsRef<[u8]>) -> Result<bool> {
        let cmd = Cmd::new("SMOVE").arg(source).arg(dest).arg(member);
        conv::frame_to_bool(self.on_master(cmd).await?)
    }

    /// Removes and returns up to `count` random members.
    ///
    /// Servers older than 3.2.0 only pop one member at a time: a `count` of
    /// one or less sends a plain `SPOP`, anything larger is `NotSupported`.
    pub async fn spop(&self, key: &str, count: u64) -> Result<Vec<String>> {
        if self.supports(V3_2_0) {
            let cmd = Cmd::new("SPOP").arg(key).arg_num(count);
            return conv::frame_to_vec_string(self.on_master(cmd).await?);
        }
        if count > 1 {
            self.require("SPOP", V3_2_0)?;
        }
        let popped = conv::frame_to_opt_string(self.on_master(Cmd::new("SPOP").arg(key)).await?)?;
        Ok(popped.into_iter().collect())
    }

    /// Random members without removing them. A negative `count` may repeat
    /// members.
    pub async fn srandmember(&self, key: &str, count: i64) -> Result<Vec<String>> {
        let cmd = Cmd::new("SRANDMEMBER").arg(key).arg_num(count);
        conv::frame_to_vec_string(self.on_replica(cmd).await?)
    }

    /// Removes `members`; returns how many existed.
    pub async fn srem<M: AsRef<[u8]>>(&self, key: &str, members: &[M]) -> Result<i64> {
        ensure_non_empty(members, "SREM")?;
        conv::frame_to_int(self.on_master(Cmd::new("SREM").arg(key).args(members)).await?)
    }

    /// One step of a set iteration. Requires 2.8.0.
    pub async fn sscan(
        &self,
        key: &str,
        cursor: u64,
        options: &ScanOptions,
    ) -> Result<(u64, Vec<String>)> {
        self.require("SSCAN", V2_8_0)?;
        let cmd = options.apply(Cmd::new("SSCAN").arg(key).arg_num(cursor));
        let (next, page) = conv::frame_to_scan_page(self.on_replica(cmd).await?)?;
        Ok((next, conv::frame_to_vec_string(page)?))
    }

    /// Members present in any of the sets.
    pub async fn sunion(&self, keys: &[&str]) -> Result<Vec<String>> {
        ensure_non_empty(keys, "SUNION")?;
        conv::frame_to_vec_string(self.on_replica(Cmd::new("SUNION").args(keys)).await?)
    }

    /// Stores [`sunion`](Self::sunion) in `dest`; returns its size.
    pub async fn sunionstore(&self, dest: &str, keys: &[&str]) -> Result<i64> {
        ensure_non_empty(keys, "SUNIONSTORE")?;
        conv::frame_to_int(
            self.on_master(Cmd::new("SUNIONSTORE").arg(dest).args(keys))
                .await?,
        )
    }
}
