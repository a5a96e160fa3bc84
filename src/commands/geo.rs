use super::{V3_2_0, V3_2_10};
use crate::core::command::{self as conv, ensure_non_empty, Cmd};
use crate::proto::frame::Frame;
use crate::{ConnPool, Error, Result};

/// Distance unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeoUnit {
    /// Meters (server default).
    #[default]
    Meters,
    /// Kilometers.
    Kilometers,
    /// Miles.
    Miles,
    /// Feet.
    Feet,
}

impl GeoUnit {
    fn as_str(&self) -> &'static str {
        match self {
            GeoUnit::Meters => "m",
            GeoUnit::Kilometers => "km",
            GeoUnit::Miles => "mi",
            GeoUnit::Feet => "ft",
        }
    }
}

/// Extra fields and ordering for `GEORADIUS` and `GEORADIUSBYMEMBER`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeoRadiusOptions {
    /// Include `(longitude, latitude)` of each match.
    pub with_coord: bool,
    /// Include the distance from the center.
    pub with_dist: bool,
    /// Include the raw geohash.
    pub with_hash: bool,
    /// Return at most this many matches.
    pub count: Option<u64>,
    /// `Some(true)` nearest first, `Some(false)` farthest first.
    pub ascending: Option<bool>,
}

impl GeoRadiusOptions {
    fn apply(&self, cmd: Cmd) -> Cmd {
        let mut cmd = cmd
            .arg_if(self.with_coord, "WITHCOORD")
            .arg_if(self.with_dist, "WITHDIST")
            .arg_if(self.with_hash, "WITHHASH");
        if let Some(count) = self.count {
            cmd = cmd.arg("COUNT").arg_num(count);
        }
        match self.ascending {
            Some(true) => cmd.arg("ASC"),
            Some(false) => cmd.arg("DESC"),
            None => cmd,
        }
    }

    fn decorated(&self) -> bool {
        self.with_coord || self.with_dist || self.with_hash
    }
}

/// One `GEORADIUS` match. Optional fields are filled according to the
/// requested [`GeoRadiusOptions`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeoMember {
    /// Member name.
    pub name: String,
    /// Distance from the center, in the query unit.
    pub dist: Option<f64>,
    /// 52-bit geohash score.
    pub hash: Option<i64>,
    /// `(longitude, latitude)`.
    pub coord: Option<(f64, f64)>,
}

fn frame_to_coord(frame: Frame) -> Result<Option<(f64, f64)>> {
    if frame.is_null() {
        return Ok(None);
    }
    let mut items = conv::frame_to_array(frame)?.into_iter();
    match (items.next(), items.next(), items.next()) {
        (Some(lon), Some(lat), None) => Ok(Some((
            conv::frame_to_float(lon)?,
            conv::frame_to_float(lat)?,
        ))),
        _ => Err(Error::protocol("coordinate must have 2 elements")),
    }
}

fn parse_members(frame: Frame, options: &GeoRadiusOptions) -> Result<Vec<GeoMember>> {
    let items = conv::frame_to_array(frame)?;
    if !options.decorated() {
        return items
            .into_iter()
            .map(|f| {
                Ok(GeoMember {
                    name: conv::frame_to_string(f)?,
                    dist: None,
                    hash: None,
                    coord: None,
                })
            })
            .collect();
    }

    items
        .into_iter()
        .map(|item| {
            let mut fields = conv::frame_to_array(item)?.into_iter();
            let name = fields
                .next()
                .ok_or_else(|| Error::protocol("empty GEORADIUS entry"))
                .and_then(conv::frame_to_string)?;
            let mut next = |what: &str| {
                fields
                    .next()
                    .ok_or_else(|| Error::protocol(format!("GEORADIUS entry lacks {what}")))
            };
            // The server writes the extras in dist, hash, coord order.
            let dist = match options.with_dist {
                true => Some(conv::frame_to_float(next("distance")?)?),
                false => None,
            };
            let hash = match options.with_hash {
                true => Some(conv::frame_to_int(next("hash")?)?),
                false => None,
            };
            let coord = match options.with_coord {
                true => frame_to_coord(next("coordinates")?)?,
                false => None,
            };
            Ok(GeoMember {
                name,
                dist,
                hash,
                coord,
            })
        })
        .collect()
}

/// Geo commands. All of them require 3.2.0.
impl ConnPool {
    /// Adds `(longitude, latitude, member)` entries; returns how many were new.
    pub async fn geoadd(&self, key: &str, members: &[(f64, f64, &str)]) -> Result<i64> {
        self.require("GEOADD", V3_2_0)?;
        ensure_non_empty(members, "GEOADD")?;
        let cmd = members
            .iter()
            .fold(Cmd::new("GEOADD").arg(key), |cmd, (lon, lat, m)| {
                cmd.arg_num(lon).arg_num(lat).arg(m)
            });
        conv::frame_to_int(self.on_master(cmd).await?)
    }

    /// Distance between two members, or `None` if either is missing.
    pub async fn geodist(
        &self,
        key: &str,
        member1: &str,
        member2: &str,
        unit: Option<GeoUnit>,
    ) -> Result<Option<f64>> {
        self.require("GEODIST", V3_2_0)?;
        let mut cmd = Cmd::new("GEODIST").arg(key).arg(member1).arg(member2);
        if let Some(unit) = unit {
            cmd = cmd.arg(unit.as_str());
        }
        conv::frame_to_opt_float(self.on_replica(cmd).await?)
    }

    /// Geohash strings of `members`; `None` for missing members.
    pub async fn geohash(&self, key: &str, members: &[&str]) -> Result<Vec<Option<String>>> {
        self.require("GEOHASH", V3_2_0)?;
        ensure_non_empty(members, "GEOHASH")?;
        let reply = self.on_replica(Cmd::new("GEOHASH").arg(key).args(members)).await?;
        conv::frame_to_array(reply)?
            .into_iter()
            .map(conv::frame_to_opt_string)
            .collect()
    }

    /// `(longitude, latitude)` of `members`; `None` for missing members.
    pub async fn geopos(&self, key: &str, members: &[&str]) -> Result<Vec<Option<(f64, f64)>>> {
        self.require("GEOPOS", V3_2_0)?;
        ensure_non_empty(members, "GEOPOS")?;
        let reply = self.on_replica(Cmd::new("GEOPOS").arg(key).args(members)).await?;
        conv::frame_to_array(reply)?
            .into_iter()
            .map(frame_to_coord)
            .collect()
    }

    /// Members within `radius` of a point.
    ///
    /// Runs `GEORADIUS_RO` on a replica when the server has it (3.2.10);
    /// older servers get a plain `GEORADIUS` on the master.
    pub async fn georadius(
        &self,
        key: &str,
        longitude: f64,
        latitude: f64,
        radius: f64,
        unit: GeoUnit,
        options: &GeoRadiusOptions,
    ) -> Result<Vec<GeoMember>> {
        self.require("GEORADIUS", V3_2_0)?;
        let read_only = self.supports(V3_2_10);
        let name = if read_only { "GEORADIUS_RO" } else { "GEORADIUS" };
        let cmd = Cmd::new(name)
            .arg(key)
            .arg_num(longitude)
            .arg_num(latitude)
            .arg_num(radius)
            .arg(unit.as_str());
        let cmd = options.apply(cmd);
        let reply = match read_only {
            true => self.on_replica(cmd).await?,
            false => self.on_master(cmd).await?,
        };
        parse_members(reply, options)
    }

    /// Members within `radius` of another member. Routed like
    /// [`georadius`](Self::georadius).
    pub async fn georadius_by_member(
        &self,
        key: &str,
        member: &str,
        radius: f64,
        unit: GeoUnit,
        options: &GeoRadiusOptions,
    ) -> Result<Vec<GeoMember>> {
        self.require("GEORADIUSBYMEMBER", V3_2_0)?;
        let read_only = self.supports(V3_2_10);
        let name = if read_only {
            "GEORADIUSBYMEMBER_RO"
        } else {
            "GEORADIUSBYMEMBER"
        };
        let cmd = Cmd::new(name)
            .arg(key)
            .arg(member)
            .arg_num(radius)
            .arg(unit.as_str());
        let cmd = options.apply(cmd);
        let reply = match read_only {
            true => self.on_replica(cmd).await?,
            false => self.on_master(cmd).await?,
        };
        parse_members(reply, options)
    }
}
