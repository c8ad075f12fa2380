use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;

use super::{ConnectionFactory, ContextId, ContextPool, PoolConfig, PoolError, PoolResult, Pooled};

/// One [`ContextPool`] per execution context, sharing a factory.
#[derive(Debug)]
pub struct GroupPool<F: ConnectionFactory> {
    pools: Vec<ContextPool<F>>,
    next: AtomicUsize,
}

impl<F: ConnectionFactory> GroupPool<F> {
    pub fn new(contexts: usize, factory: Arc<F>, config: PoolConfig) -> Self {
        let pools = (0..contexts)
            .map(|n| ContextPool::new(ContextId(n), factory.clone(), config))
            .collect();
        Self {
            pools,
            next: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub fn pool(&self, context: ContextId) -> PoolResult<&ContextPool<F>> {
        self.pools
            .get(context.0)
            .ok_or_else(|| PoolError::InvalidState(format!("unknown {}", context)))
    }

    /// Next context pool in round-robin order.
    pub fn any_pool(&self) -> PoolResult<&ContextPool<F>> {
        if self.pools.is_empty() {
            return Err(PoolError::InvalidState("group has no contexts".to_string()));
        }
        let n = self.next.fetch_add(1, Ordering::Relaxed) % self.pools.len();
        Ok(&self.pools[n])
    }

    pub async fn request_connection(&self, context: ContextId) -> PoolResult<Pooled<F::Connection>> {
        self.pool(context)?.request_connection().await
    }

    /// Routes the connection back to the context that lent it.
    pub fn return_connection(&self, connection: Pooled<F::Connection>) -> PoolResult<()> {
        self.pool(connection.context)?.return_connection(connection)
    }

    pub async fn with_connection<T, E, B>(&self, context: ContextId, body: B) -> Result<T, E>
    where
        B: for<'c> FnOnce(&'c F::Connection) -> BoxFuture<'c, Result<T, E>>,
        E: From<PoolError>,
    {
        self.pool(context)?.with_connection(body).await
    }

    pub async fn shutdown(&self) -> PoolResult<()> {
        for pool in &self.pools {
            pool.shutdown().await?;
        }
        Ok(())
    }
}
