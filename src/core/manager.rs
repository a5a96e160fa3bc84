//! Connection factory plugged into [`bb8`].

use std::time::Duration;

use bb8::{ErrorSink, ManageConnection};
use tokio::net::TcpStream;
use tracing::{debug, error, instrument, warn};

use crate::core::addr::ConnAddr;
use crate::core::command;
use crate::core::connection::Connection;
use crate::proto::frame::Frame;
use crate::{Error, Result};

/// Dials and validates connections to one server for a `bb8` pool.
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    addr: ConnAddr,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

impl ConnectionManager {
    /// Creates a manager for `addr` without any deadlines.
    pub fn new(addr: ConnAddr) -> Self {
        Self {
            addr,
            connect_timeout: None,
            read_timeout: None,
            write_timeout: None,
        }
    }

    /// Deadline for the TCP dial.
    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Per-frame read and write deadlines for dialed connections.
    pub fn timeouts(mut self, read: Option<Duration>, write: Option<Duration>) -> Self {
        self.read_timeout = read;
        self.write_timeout = write;
        self
    }

    /// The endpoint this manager dials.
    pub fn addr(&self) -> &ConnAddr {
        &self.addr
    }

    #[instrument(level = "debug", skip(self), fields(addr = %self.addr))]
    async fn dial(&self) -> Result<Connection> {
        let target = self.addr.socket_addr();
        let stream = match self.connect_timeout.filter(|d| !d.is_zero()) {
            Some(d) => tokio::time::timeout(d, TcpStream::connect(&target))
                .await
                .map_err(|_| Error::Timeout)??,
            None => TcpStream::connect(&target).await?,
        };
        stream.set_nodelay(true)?;
        debug!("dialed");

        let mut conn = Connection::new(stream).with_timeouts(self.read_timeout, self.write_timeout);

        if let Some(password) = &self.addr.password {
            match conn.execute(command::auth(password)).await {
                Ok(_) => {}
                Err(Error::Server { message }) => {
                    warn!(%message, "AUTH rejected");
                    return Err(Error::Auth);
                }
                Err(e) => return Err(e),
            }
        }

        if self.addr.database != 0 {
            command::frame_to_unit(conn.execute(command::select(self.addr.database)).await?)?;
        }

        Ok(conn)
    }
}

impl ManageConnection for ConnectionManager {
    type Connection = Connection;
    type Error = Error;

    async fn connect(&self) -> Result<Connection> {
        self.dial().await
    }

    async fn is_valid(&self, conn: &mut Connection) -> Result<()> {
        match conn.execute(command::ping()).await {
            Ok(Frame::SimpleString(_)) => Ok(()),
            Ok(other) => {
                warn!(addr = %self.addr, reply = other.kind(), "health check got unexpected reply");
                Err(Error::protocol(format!("unexpected PING reply: {}", other.kind())))
            }
            Err(e) => {
                warn!(addr = %self.addr, error = %e, "health check failed");
                Err(e)
            }
        }
    }

    fn has_broken(&self, conn: &mut Connection) -> bool {
        conn.is_broken()
    }
}

/// Forwards background pool failures (replenishing idle connections,
/// failed health checks) to `tracing`.
#[derive(Debug, Clone)]
pub(crate) struct LogErrorSink {
    pub(crate) addr: String,
}

impl ErrorSink<Error> for LogErrorSink {
    fn sink(&self, err: Error) {
        error!(addr = %self.addr, error = %err, "connection pool error");
    }

    fn boxed_clone(&self) -> Box<dyn ErrorSink<Error>> {
        Box::new(self.clone())
    }
}
