use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::{V2_8_12, V4_0_0};
use crate::core::command::{self as conv, Cmd};
use crate::core::info::{parse_info, Section};
use crate::proto::frame::Frame;
use crate::{ConnPool, Error, Result};

/// A replica as listed in the master's `ROLE` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaInfo {
    /// Replica host.
    pub host: String,
    /// Replica listening port.
    pub port: u16,
    /// Replication offset acknowledged by the replica.
    pub offset: i64,
}

/// Reply of `ROLE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// The instance is a master.
    Master {
        /// Current replication offset.
        offset: i64,
        /// Connected replicas.
        replicas: Vec<ReplicaInfo>,
    },
    /// The instance replicates another one.
    Replica {
        /// Master host.
        master_host: String,
        /// Master port.
        master_port: u16,
        /// `connect`, `connecting`, `sync` or `connected`.
        state: String,
        /// Replication offset received so far; -1 while connecting.
        offset: i64,
    },
    /// The instance is a sentinel.
    Sentinel {
        /// Names of the monitored masters.
        masters: Vec<String>,
    },
}

fn field(fields: &mut impl Iterator<Item = Frame>, what: &str) -> Result<Frame> {
    fields
        .next()
        .ok_or_else(|| Error::protocol(format!("ROLE reply lacks {what}")))
}

fn port(frame: Frame) -> Result<u16> {
    let n = conv::frame_to_int(frame)?;
    u16::try_from(n).map_err(|_| Error::protocol(format!("invalid port {n}")))
}

fn parse_role(frame: Frame) -> Result<Role> {
    let mut fields = conv::frame_to_array(frame)?.into_iter();
    let kind = conv::frame_to_string(field(&mut fields, "role name")?)?;
    match kind.as_str() {
        "master" => {
            let offset = conv::frame_to_int(field(&mut fields, "offset")?)?;
            let replicas = conv::frame_to_array(field(&mut fields, "replica list")?)?
                .into_iter()
                .map(|entry| {
                    let mut parts = conv::frame_to_array(entry)?.into_iter();
                    Ok(ReplicaInfo {
                        host: conv::frame_to_string(field(&mut parts, "replica host")?)?,
                        port: port(field(&mut parts, "replica port")?)?,
                        offset: conv::frame_to_int(field(&mut parts, "replica offset")?)?,
                    })
                })
                .collect::<Result<_>>()?;
            Ok(Role::Master { offset, replicas })
        }
        "slave" | "replica" => Ok(Role::Replica {
            master_host: conv::frame_to_string(field(&mut fields, "master host")?)?,
            master_port: port(field(&mut fields, "master port")?)?,
            state: conv::frame_to_string(field(&mut fields, "state")?)?,
            offset: conv::frame_to_int(field(&mut fields, "offset")?)?,
        }),
        "sentinel" => Ok(Role::Sentinel {
            masters: conv::frame_to_vec_string(field(&mut fields, "master names")?)?,
        }),
        other => Err(Error::protocol(format!("unknown role {other}"))),
    }
}

fn parse_time(frame: Frame) -> Result<SystemTime> {
    let mut parts = conv::frame_to_array(frame)?.into_iter();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(secs), Some(micros), None) => {
            let secs = conv::frame_to_int(secs)?;
            let micros = conv::frame_to_int(micros)?;
            let secs = u64::try_from(secs).map_err(|_| Error::protocol("negative TIME seconds"))?;
            let micros = u64::try_from(micros).map_err(|_| Error::protocol("negative TIME micros"))?;
            Duration::from_secs(secs)
                .checked_add(Duration::from_micros(micros))
                .and_then(|since| UNIX_EPOCH.checked_add(since))
                .ok_or_else(|| Error::protocol("TIME reply out of range"))
        }
        _ => Err(Error::protocol("TIME reply must have 2 elements")),
    }
}

/// Server commands. All run on the master.
impl ConnPool {
    /// Starts an append-only file rewrite in the background.
    pub async fn bgrewriteaof(&self) -> Result<()> {
        conv::frame_to_unit(self.on_master(Cmd::new("BGREWRITEAOF")).await?)
    }

    /// Starts a snapshot in the background.
    pub async fn bgsave(&self) -> Result<()> {
        conv::frame_to_unit(self.on_master(Cmd::new("BGSAVE")).await?)
    }

    /// Number of keys in the selected database.
    pub async fn dbsize(&self) -> Result<i64> {
        conv::frame_to_int(self.on_master(Cmd::new("DBSIZE")).await?)
    }

    /// Deletes every key of every database.
    ///
    /// `asynchronous` is only sent to 4.0.0 and newer; older servers flush
    /// synchronously.
    pub async fn flushall(&self, asynchronous: bool) -> Result<()> {
        let cmd = Cmd::new("FLUSHALL").arg_if(asynchronous && self.supports(V4_0_0), "ASYNC");
        conv::frame_to_unit(self.on_master(cmd).await?)
    }

    /// Deletes every key of the selected database. See [`flushall`](Self::flushall)
    /// for `asynchronous`.
    pub async fn flushdb(&self, asynchronous: bool) -> Result<()> {
        let cmd = Cmd::new("FLUSHDB").arg_if(asynchronous && self.supports(V4_0_0), "ASYNC");
        conv::frame_to_unit(self.on_master(cmd).await?)
    }

    /// `INFO` fields of one section.
    pub async fn info(&self, section: Section) -> Result<HashMap<String, String>> {
        let text = conv::frame_to_string(self.on_master(conv::info(section)).await?)?;
        Ok(parse_info(&text))
    }

    /// Unix time of the last successful save.
    pub async fn lastsave(&self) -> Result<i64> {
        conv::frame_to_int(self.on_master(Cmd::new("LASTSAVE")).await?)
    }

    /// Checks the master is alive.
    pub async fn ping(&self) -> Result<()> {
        conv::frame_to_unit(self.on_master(Cmd::new("PING")).await?)
    }

    /// Replication role of the master. Requires 2.8.12.
    pub async fn role(&self) -> Result<Role> {
        self.require("ROLE", V2_8_12)?;
        parse_role(self.on_master(Cmd::new("ROLE")).await?)
    }

    /// Saves a snapshot synchronously.
    pub async fn save(&self) -> Result<()> {
        conv::frame_to_unit(self.on_master(Cmd::new("SAVE")).await?)
    }

    /// The server clock.
    pub async fn time(&self) -> Result<SystemTime> {
        parse_time(self.on_master(Cmd::new("TIME")).await?)
    }
}
