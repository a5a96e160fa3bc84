//! A master pool plus one pool per replica.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bb8::{Pool, PooledConnection, RunError};
use futures::future::try_join_all;
use tracing::{debug, error, info, instrument};

use crate::core::addr::ConnAddr;
use crate::core::builder::PoolOptions;
use crate::core::command::{self, Cmd};
use crate::core::info::{parse_info, Section};
use crate::core::manager::{ConnectionManager, LogErrorSink};
use crate::core::version::{ServerVersion, MIN_SUPPORTED};
use crate::proto::frame::Frame;
use crate::{Error, Result};

/// A connection checked out of a [`ConnPool`]. Returned to its pool on drop.
pub type PooledConn<'a> = PooledConnection<'a, ConnectionManager>;

/// Pooled connections to one master and its replicas.
///
/// Writes always go to the master. Reads rotate across the replicas, or go
/// to the master when there are none. The master's server version is read
/// once at construction and gates commands newer than it.
///
/// # Example
///
/// ```no_run
/// use tandem::{ConnPool, PoolOptions};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = ConnPool::connect("127.0.0.1:6379", &["127.0.0.1:6380"], &PoolOptions::default()).await?;
/// pool.set("greeting", "hello").await?;
/// let value = pool.get("greeting").await?;
/// # Ok(())
/// # }
/// ```
pub struct ConnPool {
    master_addr: ConnAddr,
    master: Pool<ConnectionManager>,
    replicas: Vec<Pool<ConnectionManager>>,
    next_replica: AtomicUsize,
    version: ServerVersion,
}

impl ConnPool {
    /// Opens pools to `master` and every replica and reads the master's version.
    ///
    /// # Errors
    ///
    /// Fails if an address does not parse, the master cannot be reached, or
    /// the master runs a version older than 2.6.12.
    #[instrument(skip(replicas, options), fields(replicas = replicas.len()))]
    pub async fn connect<R: AsRef<str>>(
        master: &str,
        replicas: &[R],
        options: &PoolOptions,
    ) -> Result<Self> {
        let master_addr = ConnAddr::parse(master)?;
        let master_pool = build_pool(master_addr.clone(), options).await?;

        let version = {
            let mut conn = checkout(&master_pool).await?;
            let reply = conn.execute(command::info(Section::Server)).await?;
            server_version(reply)?
        };
        if version < MIN_SUPPORTED {
            return Err(Error::NotSupported {
                command: "CONNECT",
                required: MIN_SUPPORTED,
                actual: version,
            });
        }

        let replica_pools = try_join_all(replicas.iter().map(|r| async move {
            let addr = ConnAddr::parse(r.as_ref())?;
            build_pool(addr, options).await
        }))
        .await?;

        info!(
            master = %master_addr,
            %version,
            replicas = replica_pools.len(),
            "connection pool ready"
        );

        Ok(Self {
            master_addr,
            master: master_pool,
            replicas: replica_pools,
            next_replica: AtomicUsize::new(0),
            version,
        })
    }

    /// The master's server version, read when the pool was created.
    pub fn version(&self) -> ServerVersion {
        self.version
    }

    /// The parsed master address.
    pub fn master_addr(&self) -> &ConnAddr {
        &self.master_addr
    }

    /// Number of replica pools.
    pub fn replica_count(&self) -> usize {
        self.replicas.len()
    }

    /// Checks a connection out of the master pool.
    pub async fn master_conn(&self) -> Result<PooledConn<'_>> {
        checkout(&self.master).await
    }

    /// Checks a connection out of the next replica pool in rotation, or out
    /// of the master pool when no replicas are configured.
    pub async fn replica_conn(&self) -> Result<PooledConn<'_>> {
        match self.replicas.len() {
            0 => checkout(&self.master).await,
            n => {
                let idx = self.next_replica.fetch_add(1, Ordering::Relaxed) % n;
                checkout(&self.replicas[idx]).await
            }
        }
    }

    /// Fails with `NotSupported` when the master is older than `required`.
    pub(crate) fn require(&self, command: &'static str, required: ServerVersion) -> Result<()> {
        if self.version < required {
            return Err(Error::NotSupported {
                command,
                required,
                actual: self.version,
            });
        }
        Ok(())
    }

    /// Whether the master is at least `version`.
    pub(crate) fn supports(&self, version: ServerVersion) -> bool {
        self.version >= version
    }

    pub(crate) async fn on_master(&self, cmd: Cmd) -> Result<Frame> {
        let mut conn = self.master_conn().await?;
        run(&mut conn, cmd, None).await
    }

    pub(crate) async fn on_replica(&self, cmd: Cmd) -> Result<Frame> {
        let mut conn = self.replica_conn().await?;
        run(&mut conn, cmd, None).await
    }

    pub(crate) async fn on_master_blocking(&self, cmd: Cmd, block: Duration) -> Result<Frame> {
        let mut conn = self.master_conn().await?;
        run(&mut conn, cmd, Some(block)).await
    }
}

impl fmt::Debug for ConnPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnPool")
            .field("master", &self.master_addr)
            .field("replicas", &self.replicas.len())
            .field("version", &self.version)
            .finish()
    }
}

async fn run(conn: &mut PooledConn<'_>, cmd: Cmd, block: Option<Duration>) -> Result<Frame> {
    let name = cmd.name();
    debug!(command = name, args = cmd.arguments().len(), "send");
    let res = match block {
        Some(block) => conn.execute_blocking(cmd, block).await,
        None => conn.execute(cmd).await,
    };
    match &res {
        Ok(frame) => debug!(command = name, reply = frame.kind(), "recv"),
        Err(e) if conn.is_broken() => error!(command = name, error = %e, "connection broken"),
        Err(_) => {}
    }
    res
}

async fn build_pool(addr: ConnAddr, options: &PoolOptions) -> Result<Pool<ConnectionManager>> {
    if options.max_active == 0 {
        return Err(Error::Pool {
            message: "max_active must be at least 1".into(),
        });
    }
    if options.connection_timeout.is_zero() {
        return Err(Error::Pool {
            message: "connection_timeout must be non-zero".into(),
        });
    }

    let sink = LogErrorSink {
        addr: addr.to_string(),
    };
    let manager = ConnectionManager::new(addr)
        .connect_timeout(options.connect_timeout)
        .timeouts(options.read_timeout, options.write_timeout);

    Pool::builder()
        .max_size(options.max_active)
        .min_idle(options.min_idle)
        .idle_timeout(options.idle_timeout)
        .connection_timeout(options.connection_timeout)
        .test_on_check_out(options.test_on_borrow)
        .error_sink(Box::new(sink))
        .build(manager)
        .await
}

async fn checkout(pool: &Pool<ConnectionManager>) -> Result<PooledConn<'_>> {
    pool.get().await.map_err(|e| match e {
        RunError::User(err) => err,
        RunError::TimedOut => Error::Timeout,
    })
}

fn server_version(reply: Frame) -> Result<ServerVersion> {
    let text = command::frame_to_string(reply)?;
    let fields = parse_info(&text);
    let raw = fields
        .get("redis_version")
        .ok_or_else(|| Error::protocol("INFO server reply has no redis_version"))?;
    ServerVersion::parse(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_version_from_info() {
        let reply = Frame::bulk("# Server\r\nredis_version:3.2.12\r\nredis_mode:standalone\r\n");
        assert_eq!(
            server_version(reply).unwrap(),
            ServerVersion::new(3, 2, 12)
        );
    }

    #[test]
    fn test_server_version_missing() {
        let reply = Frame::bulk("# Server\r\nredis_mode:standalone\r\n");
        assert!(matches!(
            server_version(reply),
            Err(Error::Protocol { .. })
        ));
    }

    #[tokio::test]
    async fn test_build_pool_rejects_zero_size() {
        let opts = PoolOptions {
            max_active: 0,
            ..PoolOptions::default()
        };
        let addr = ConnAddr::parse("127.0.0.1").unwrap();
        assert!(matches!(
            build_pool(addr, &opts).await,
            Err(Error::Pool { .. })
        ));
    }
}
