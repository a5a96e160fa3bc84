use super::{Condition, Limit, ScanOptions, V2_8_0, V2_8_9, V3_0_2};
use crate::core::command::{self as conv, ensure_non_empty, score_arg, Cmd};
use crate::{ConnPool, Error, Result};

/// One end of a score range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreBound {
    /// Scores equal to the bound are included.
    Inclusive(f64),
    /// Scores equal to the bound are excluded (`(x`).
    Exclusive(f64),
    /// `-inf`
    NegInf,
    /// `+inf`
    PosInf,
}

impl ScoreBound {
    fn to_arg(self) -> Result<String> {
        match self {
            ScoreBound::Inclusive(x) => checked_score(x),
            ScoreBound::Exclusive(x) => Ok(format!("({}", checked_score(x)?)),
            ScoreBound::NegInf => Ok("-inf".into()),
            ScoreBound::PosInf => Ok("+inf".into()),
        }
    }
}

/// One end of a lexicographical range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexBound {
    /// `[member`
    Inclusive(String),
    /// `(member`
    Exclusive(String),
    /// `-`, below every member.
    Min,
    /// `+`, above every member.
    Max,
}

impl LexBound {
    fn to_arg(&self) -> String {
        match self {
            LexBound::Inclusive(m) => format!("[{m}"),
            LexBound::Exclusive(m) => format!("({m}"),
            LexBound::Min => "-".into(),
            LexBound::Max => "+".into(),
        }
    }
}

/// `NX`/`XX` and `CH` flags for `ZADD`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZAddOptions {
    /// Only add new members (`NX`) or only update existing ones (`XX`).
    pub condition: Option<Condition>,
    /// Count changed members instead of added ones.
    pub ch: bool,
}

/// How `ZINTERSTORE`/`ZUNIONSTORE` combine scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    /// Sum the weighted scores (server default).
    Sum,
    /// Keep the smallest weighted score.
    Min,
    /// Keep the largest weighted score.
    Max,
}

/// `WEIGHTS` and `AGGREGATE` for `ZINTERSTORE`/`ZUNIONSTORE`.
///
/// When present, `weights` must have one entry per source key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreOptions {
    /// Multiplier per source key.
    pub weights: Vec<f64>,
    /// Score combination.
    pub aggregate: Option<Aggregate>,
}

fn checked_score(score: f64) -> Result<String> {
    if score.is_nan() {
        return Err(Error::invalid("score must not be NaN"));
    }
    Ok(score_arg(score))
}

fn member_pairs<M: AsRef<[u8]>>(mut cmd: Cmd, members: &[(f64, M)]) -> Result<Cmd> {
    for (score, member) in members {
        cmd = cmd.arg(checked_score(*score)?).arg(member);
    }
    Ok(cmd)
}

fn store_cmd(name: &'static str, dest: &str, keys: &[&str], options: &StoreOptions) -> Result<Cmd> {
    ensure_non_empty(keys, name)?;
    if !options.weights.is_empty() && options.weights.len() != keys.len() {
        return Err(Error::invalid(format!(
            "{name} got {} weights for {} keys",
            options.weights.len(),
            keys.len()
        )));
    }

    let mut cmd = Cmd::new(name).arg(dest).arg_num(keys.len()).args(keys);
    if !options.weights.is_empty() {
        cmd = cmd.arg("WEIGHTS");
        for w in &options.weights {
            cmd = cmd.arg(checked_score(*w)?);
        }
    }
    if let Some(agg) = options.aggregate {
        cmd = cmd.arg("AGGREGATE").arg(match agg {
            Aggregate::Sum => "SUM",
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
        });
    }
    Ok(cmd)
}

fn score_range(
    name: &'static str,
    key: &str,
    from: ScoreBound,
    to: ScoreBound,
    with_scores: bool,
    limit: Option<Limit>,
) -> Result<Cmd> {
    let cmd = Cmd::new(name)
        .arg(key)
        .arg(from.to_arg()?)
        .arg(to.to_arg()?)
        .arg_if(with_scores, "WITHSCORES");
    Ok(match limit {
        Some(limit) => limit.apply(cmd),
        None => cmd,
    })
}

fn lex_range(name: &'static str, key: &str, from: &LexBound, to: &LexBound, limit: Option<Limit>) -> Cmd {
    let cmd = Cmd::new(name).arg(key).arg(from.to_arg()).arg(to.to_arg());
    match limit {
        Some(limit) => limit.apply(cmd),
        None => cmd,
    }
}

/// Sorted set commands.
impl ConnPool {
    /// Adds or updates one member; returns 1 if it was new.
    pub async fn zadd(&self, key: &str, score: f64, member: impl AsRef<[u8]>) -> Result<i64> {
        let cmd = Cmd::new("ZADD").arg(key).arg(checked_score(score)?).arg(member);
        conv::frame_to_int(self.on_master(cmd).await?)
    }

    /// Adds or updates many `(score, member)` pairs; returns how many were new.
    pub async fn zadd_many<M: AsRef<[u8]>>(&self, key: &str, members: &[(f64, M)]) -> Result<i64> {
        ensure_non_empty(members, "ZADD")?;
        let cmd = member_pairs(Cmd::new("ZADD").arg(key), members)?;
        conv::frame_to_int(self.on_master(cmd).await?)
    }

    /// `ZADD` with `NX`/`XX` and `CH`. Requires 3.0.2.
    pub async fn zadd_with<M: AsRef<[u8]>>(
        &self,
        key: &str,
        options: ZAddOptions,
        members: &[(f64, M)],
    ) -> Result<i64> {
        self.require("ZADD", V3_0_2)?;
        ensure_non_empty(members, "ZADD")?;
        let mut cmd = Cmd::new("ZADD").arg(key);
        if let Some(cond) = options.condition {
            cmd = cmd.arg(cond.as_str());
        }
        let cmd = member_pairs(cmd.arg_if(options.ch, "CH"), members)?;
        conv::frame_to_int(self.on_master(cmd).await?)
    }

    /// `ZADD ... INCR`: increments one member's score. Requires 3.0.2.
    ///
    /// Returns `None` when the condition prevented the update.
    pub async fn zadd_incr(
        &self,
        key: &str,
        condition: Option<Condition>,
        increment: f64,
        member: impl AsRef<[u8]>,
    ) -> Result<Option<f64>> {
        self.require("ZADD", V3_0_2)?;
        let mut cmd = Cmd::new("ZADD").arg(key);
        if let Some(cond) = condition {
            cmd = cmd.arg(cond.as_str());
        }
        let cmd = cmd.arg("INCR").arg(checked_score(increment)?).arg(member);
        conv::frame_to_opt_float(self.on_master(cmd).await?)
    }

    /// Number of members.
    pub async fn zcard(&self, key: &str) -> Result<i64> {
        conv::frame_to_int(self.on_replica(Cmd::new("ZCARD").arg(key)).await?)
    }

    /// Number of members with a score between `min` and `max`.
    pub async fn zcount(&self, key: &str, min: ScoreBound, max: ScoreBound) -> Result<i64> {
        let cmd = Cmd::new("ZCOUNT").arg(key).arg(min.to_arg()?).arg(max.to_arg()?);
        conv::frame_to_int(self.on_replica(cmd).await?)
    }

    /// Adds `increment` to a member's score; returns the new score.
    pub async fn zincrby(&self, key: &str, increment: f64, member: impl AsRef<[u8]>) -> Result<f64> {
        let cmd = Cmd::new("ZINCRBY")
            .arg(key)
            .arg(checked_score(increment)?)
            .arg(member);
        conv::frame_to_float(self.on_master(cmd).await?)
    }

    /// Stores the intersection of `keys` in `dest`; returns its size.
    pub async fn zinterstore(&self, dest: &str, keys: &[&str], options: &StoreOptions) -> Result<i64> {
        let cmd = store_cmd("ZINTERSTORE", dest, keys, options)?;
        conv::frame_to_int(self.on_master(cmd).await?)
    }

    /// Stores the union of `keys` in `dest`; returns its size.
    pub async fn zunionstore(&self, dest: &str, keys: &[&str], options: &StoreOptions) -> Result<i64> {
        let cmd = store_cmd("ZUNIONSTORE", dest, keys, options)?;
        conv::frame_to_int(self.on_master(cmd).await?)
    }

    /// Number of members between two lex bounds. Requires 2.8.9.
    pub async fn zlexcount(&self, key: &str, min: &LexBound, max: &LexBound) -> Result<i64> {
        self.require("ZLEXCOUNT", V2_8_9)?;
        conv::frame_to_int(self.on_replica(lex_range("ZLEXCOUNT", key, min, max, None)).await?)
    }

    /// Members by rank, lowest score first.
    pub async fn zrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let cmd = Cmd::new("ZRANGE").arg(key).arg_num(start).arg_num(stop);
        conv::frame_to_vec_string(self.on_replica(cmd).await?)
    }

    /// Members and scores by rank, lowest score first.
    pub async fn zrange_withscores(&self, key: &str, start: i64, stop: i64) -> Result<Vec<(String, f64)>> {
        let cmd = Cmd::new("ZRANGE")
            .arg(key)
            .arg_num(start)
            .arg_num(stop)
            .arg("WITHSCORES");
        conv::frame_to_scored(self.on_replica(cmd).await?)
    }

    /// Members by rank, highest score first.
    pub async fn zrevrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let cmd = Cmd::new("ZREVRANGE").arg(key).arg_num(start).arg_num(stop);
        conv::frame_to_vec_string(self.on_replica(cmd).await?)
    }

    /// Members and scores by rank, highest score first.
    pub async fn zrevrange_withscores(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<(String, f64)>> {
        let cmd = Cmd::new("ZREVRANGE")
            .arg(key)
            .arg_num(start)
            .arg_num(stop)
            .arg("WITHSCORES");
        conv::frame_to_scored(self.on_replica(cmd).await?)
    }

    /// Members between two lex bounds, ascending. Requires 2.8.9.
    pub async fn zrangebylex(
        &self,
        key: &str,
        min: &LexBound,
        max: &LexBound,
        limit: Option<Limit>,
    ) -> Result<Vec<String>> {
        self.require("ZRANGEBYLEX", V2_8_9)?;
        let cmd = lex_range("ZRANGEBYLEX", key, min, max, limit);
        conv::frame_to_vec_string(self.on_replica(cmd).await?)
    }

    /// Members between two lex bounds, descending. Requires 2.8.9.
    ///
    /// Note the bound order: `max` first.
    pub async fn zrevrangebylex(
        &self,
        key: &str,
        max: &LexBound,
        min: &LexBound,
        limit: Option<Limit>,
    ) -> Result<Vec<String>> {
        self.require("ZREVRANGEBYLEX", V2_8_9)?;
        let cmd = lex_range("ZREVRANGEBYLEX", key, max, min, limit);
        conv::frame_to_vec_string(self.on_replica(cmd).await?)
    }

    /// Members with a score between `min` and `max`, ascending.
    pub async fn zrangebyscore(
        &self,
        key: &str,
        min: ScoreBound,
        max: ScoreBound,
        limit: Option<Limit>,
    ) -> Result<Vec<String>> {
        let cmd = score_range("ZRANGEBYSCORE", key, min, max, false, limit)?;
        conv::frame_to_vec_string(self.on_replica(cmd).await?)
    }

    /// Members and scores between `min` and `max`, ascending.
    pub async fn zrangebyscore_withscores(
        &self,
        key: &str,
        min: ScoreBound,
        max: ScoreBound,
        limit: Option<Limit>,
    ) -> Result<Vec<(String, f64)>> {
        let cmd = score_range("ZRANGEBYSCORE", key, min, max, true, limit)?;
        conv::frame_to_scored(self.on_replica(cmd).await?)
    }

    /// Members with a score between `max` and `min`, descending.
    pub async fn zrevrangebyscore(
        &self,
        key: &str,
        max: ScoreBound,
        min: ScoreBound,
        limit: Option<Limit>,
    ) -> Result<Vec<String>> {
        let cmd = score_range("ZREVRANGEBYSCORE", key, max, min, false, limit)?;
        conv::frame_to_vec_string(self.on_replica(cmd).await?)
    }

    /// Members and scores between `max` and `min`, descending.
    pub async fn zrevrangebyscore_withscores(
        &self,
        key: &str,
        max: ScoreBound,
        min: ScoreBound,
        limit: Option<Limit>,
    ) -> Result<Vec<(String, f64)>> {
        let cmd = score_range("ZREVRANGEBYSCORE", key, max, min, true, limit)?;
        conv::frame_to_scored(self.on_replica(cmd).await?)
    }

    /// Rank of `member`, lowest score first.
    pub async fn zrank(&self, key: &str, member: impl AsRef<[u8]>) -> Result<Option<i64>> {
        conv::frame_to_opt_int(self.on_replica(Cmd::new("ZRANK").arg(key).arg(member)).await?)
    }

    /// Rank of `member`, highest score first.
    pub async fn zrevrank(&self, key: &str, member: impl AsRef<[u8]>) -> Result<Option<i64>> {
        conv::frame_to_opt_int(
            self.on_replica(Cmd::new("ZREVRANK").arg(key).arg(member))
                .await?,
        )
    }

    /// Removes `members`; returns how many existed.
    pub async fn zrem<M: AsRef<[u8]>>(&self, key: &str, members: &[M]) -> Result<i64> {
        ensure_non_empty(members, "ZREM")?;
        conv::frame_to_int(self.on_master(Cmd::new("ZREM").arg(key).args(members)).await?)
    }

    /// Removes members between two lex bounds. Requires 2.8.9.
    pub async fn zremrangebylex(&self, key: &str, min: &LexBound, max: &LexBound) -> Result<i64> {
        self.require("ZREMRANGEBYLEX", V2_8_9)?;
        conv::frame_to_int(
            self.on_master(lex_range("ZREMRANGEBYLEX", key, min, max, None))
                .await?,
        )
    }

    /// Removes members by rank.
    pub async fn zremrangebyrank(&self, key: &str, start: i64, stop: i64) -> Result<i64> {
        let cmd = Cmd::new("ZREMRANGEBYRANK")
            .arg(key)
            .arg_num(start)
            .arg_num(stop);
        conv::frame_to_int(self.on_master(cmd).await?)
    }

    /// Removes members with a score between `min` and `max`.
    pub async fn zremrangebyscore(&self, key: &str, min: ScoreBound, max: ScoreBound) -> Result<i64> {
        let cmd = score_range("ZREMRANGEBYSCORE", key, min, max, false, None)?;
        conv::frame_to_int(self.on_master(cmd).await?)
    }

    /// One step of a sorted set iteration. Requires 2.8.0.
    pub async fn zscan(
        &self,
        key: &str,
        cursor: u64,
        options: &ScanOptions,
    ) -> Result<(u64, Vec<(String, f64)>)> {
        self.require("ZSCAN", V2_8_0)?;
        let cmd = options.apply(Cmd::new("ZSCAN").arg(key).arg_num(cursor));
        let (next, page) = conv::frame_to_scan_page(self.on_replica(cmd).await?)?;
        Ok((next, conv::frame_to_scored(page)?))
    }

    /// Score of `member`.
    pub async fn zscore(&self, key: &str, member: impl AsRef<[u8]>) -> Result<Option<f64>> {
        conv::frame_to_opt_float(
            self.on_replica(Cmd::new("ZSCORE").arg(key).arg(member))
                .await?,
        )
    }
}
