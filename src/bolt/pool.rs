//! Pooling for Bolt connections.

use async_trait::async_trait;
use tracing::debug;

use super::config::BoltConfig;
use super::connection::BoltConnection;
use crate::pool::{ConnectionFactory, ContextId, GroupPool, PoolableConnection};

impl PoolableConnection for BoltConnection {
    fn is_closed(&self) -> bool {
        BoltConnection::is_closed(self)
    }
}

/// Opens a new [`BoltConnection`] per pool request. The connection is not
/// authenticated; callers send `hello` (and `logon`) on first use.
#[derive(Debug, Clone)]
pub struct BoltConnectionFactory {
    config: BoltConfig,
}

impl BoltConnectionFactory {
    pub fn new(config: BoltConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BoltConfig {
        &self.config
    }
}

#[async_trait]
impl ConnectionFactory for BoltConnectionFactory {
    type Connection = BoltConnection;

    async fn create_connection(&self, context: ContextId) -> BoltConnection {
        debug!("Opening Bolt connection to {} for {}", self.config.address(), context);
        BoltConnection::new(&self.config)
    }
}

pub type BoltConnectionPool = GroupPool<BoltConnectionFactory>;
