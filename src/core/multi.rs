use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::core::addr::Address;
use crate::core::builder::PoolOptions;
use crate::core::pool::ConnPool;
use crate::Result;

/// A registry of [`ConnPool`]s keyed by master connection string.
///
/// Lookups share a read lock; registration takes the write lock.
#[derive(Debug)]
pub struct MultiPool {
    options: PoolOptions,
    pools: RwLock<HashMap<String, Arc<ConnPool>>>,
}

impl MultiPool {
    /// Creates a pool for every address.
    ///
    /// # Errors
    ///
    /// Fails on the first address whose pool cannot be created.
    pub async fn new(addresses: &[Address], options: PoolOptions) -> Result<Self> {
        let mut pools = HashMap::with_capacity(addresses.len());
        for address in addresses {
            let pool = ConnPool::connect(&address.master, &address.replicas, &options).await?;
            pools.insert(address.master.clone(), Arc::new(pool));
        }
        Ok(Self {
            options,
            pools: RwLock::new(pools),
        })
    }

    /// Creates a pool for `address` and registers it, replacing any pool
    /// already registered for the same master.
    pub async fn add(&self, address: &Address) -> Result<Arc<ConnPool>> {
        let pool = Arc::new(
            ConnPool::connect(&address.master, &address.replicas, &self.options).await?,
        );
        let previous = self
            .pools
            .write()
            .await
            .insert(address.master.clone(), Arc::clone(&pool));
        if previous.is_some() {
            debug!(master = %address.master, "replaced registered pool");
        }
        Ok(pool)
    }

    /// Returns the pool registered for `master`, creating a master-only pool
    /// on first use.
    pub async fn get(&self, master: &str) -> Result<Arc<ConnPool>> {
        if let Some(pool) = self.pools.read().await.get(master) {
            return Ok(Arc::clone(pool));
        }

        let pool = Arc::new(ConnPool::connect::<&str>(master, &[], &self.options).await?);
        // A concurrent caller may have registered one while this one dialed.
        let mut pools = self.pools.write().await;
        let pool = pools
            .entry(master.to_string())
            .or_insert(pool);
        Ok(Arc::clone(pool))
    }

    /// Unregisters the pool for `master`. Checked-out connections stay valid.
    pub async fn remove(&self, master: &str) -> Option<Arc<ConnPool>> {
        self.pools.write().await.remove(master)
    }

    /// Number of registered pools.
    pub async fn len(&self) -> usize {
        self.pools.read().await.len()
    }

    /// Whether no pool is registered.
    pub async fn is_empty(&self) -> bool {
        self.pools.read().await.is_empty()
    }
}
