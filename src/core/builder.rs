use std::time::Duration;

use crate::core::addr::Address;
use crate::core::pool::ConnPool;
use crate::Error;

/// Tuning knobs shared by the master pool and every replica pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolOptions {
    /// Upper bound on open connections per endpoint.
    pub max_active: u32,
    /// Idle connections kept open per endpoint. `None` lets the pool shrink to zero.
    pub min_idle: Option<u32>,
    /// Idle connections older than this are closed. `None` keeps them forever.
    pub idle_timeout: Option<Duration>,
    /// How long a caller waits for a connection before getting [`Error::Timeout`].
    pub connection_timeout: Duration,
    /// Deadline for the TCP dial.
    pub connect_timeout: Option<Duration>,
    /// Per-reply read deadline.
    pub read_timeout: Option<Duration>,
    /// Per-command write deadline.
    pub write_timeout: Option<Duration>,
    /// Send `PING` before handing out a pooled connection.
    pub test_on_borrow: bool,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_active: 120,
            min_idle: None,
            idle_timeout: Some(Duration::from_secs(20)),
            connection_timeout: Duration::from_secs(30),
            connect_timeout: None,
            read_timeout: None,
            write_timeout: None,
            test_on_borrow: true,
        }
    }
}

/// Builder for configuring and creating a [`ConnPool`].
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use tandem::PoolBuilder;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = PoolBuilder::new()
///     .master("127.0.0.1:6379")
///     .replica("127.0.0.1:6380")
///     .max_active(32)
///     .read_timeout(Some(Duration::from_secs(1)))
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct PoolBuilder {
    master: Option<String>,
    replicas: Vec<String>,
    options: PoolOptions,
}

impl PoolBuilder {
    /// Creates a new [`PoolBuilder`] with default options.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing master/replica address.
    #[inline]
    pub fn address(mut self, address: Address) -> Self {
        self.master = Some(address.master);
        self.replicas = address.replicas;
        self
    }

    /// Sets the master connection string.
    ///
    /// # Arguments
    ///
    /// * `master` - `host[:port[:password[:db]]]` or a `redis://` URL
    #[inline]
    pub fn master(mut self, master: impl Into<String>) -> Self {
        self.master = Some(master.into());
        self
    }

    /// Adds one replica connection string.
    #[inline]
    pub fn replica(mut self, replica: impl Into<String>) -> Self {
        self.replicas.push(replica.into());
        self
    }

    /// Adds several replica connection strings.
    #[inline]
    pub fn replicas<I, R>(mut self, replicas: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        self.replicas.extend(replicas.into_iter().map(Into::into));
        self
    }

    /// Replaces all options at once.
    #[inline]
    pub fn options(mut self, options: PoolOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the maximum number of connections per endpoint (default 120).
    #[inline]
    pub fn max_active(mut self, max: u32) -> Self {
        self.options.max_active = max;
        self
    }

    /// Sets the number of idle connections kept open per endpoint.
    #[inline]
    pub fn min_idle(mut self, min: Option<u32>) -> Self {
        self.options.min_idle = min;
        self
    }

    /// Sets how long an idle connection survives (default 20 s).
    #[inline]
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.options.idle_timeout = timeout;
        self
    }

    /// Sets how long a checkout waits for a free connection (default 30 s).
    #[inline]
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.options.connection_timeout = timeout;
        self
    }

    /// Sets the TCP dial deadline.
    #[inline]
    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.options.connect_timeout = timeout;
        self
    }

    /// Sets the read timeout for replies. `None` means no timeout.
    #[inline]
    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.options.read_timeout = timeout;
        self
    }

    /// Sets the write timeout for commands. `None` means no timeout.
    #[inline]
    pub fn write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.options.write_timeout = timeout;
        self
    }

    /// Enables or disables the `PING` check on checkout (default on).
    #[inline]
    pub fn test_on_borrow(mut self, enabled: bool) -> Self {
        self.options.test_on_borrow = enabled;
        self
    }

    /// Builds the [`ConnPool`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the master is not set or an
    /// address does not parse, [`Error::NotSupported`] if the master is too
    /// old, and any dial error from the master or a replica.
    pub async fn build(self) -> Result<ConnPool, Error> {
        let master = self.master.ok_or_else(|| Error::invalid("master address is required"))?;
        ConnPool::connect(&master, &self.replicas, &self.options).await
    }
}
