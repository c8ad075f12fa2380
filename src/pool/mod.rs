//! Two-tier connection pool.
//!
//! A [`GroupPool`] fans out over one [`ContextPool`] per execution context.
//! Each context pool is a task that owns its connections and a FIFO list of
//! borrowers waiting for one to free up; handles talk to it over a channel.

pub mod config;
pub mod context;
pub mod error;
pub mod group;

mod connection_list;
mod waiting_list;

use std::fmt;
use std::ops::{Deref, DerefMut};

use async_trait::async_trait;

pub use config::PoolConfig;
pub use context::ContextPool;
pub use error::{PoolError, PoolResult};
pub use group::GroupPool;

/// Index of an execution context within a [`GroupPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub usize);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "context-{}", self.0)
    }
}

pub trait PoolableConnection: Send + 'static {
    fn is_closed(&self) -> bool;
}

#[async_trait]
pub trait ConnectionFactory: Send + Sync + 'static {
    type Connection: PoolableConnection;

    async fn create_connection(&self, context: ContextId) -> Self::Connection;
}

/// A borrowed connection. Hand it back with `return_connection` so the
/// owning context can reuse it.
#[derive(Debug)]
pub struct Pooled<C> {
    pub(crate) id: u64,
    pub(crate) context: ContextId,
    pub(crate) connection: C,
}

impl<C> Pooled<C> {
    pub fn context(&self) -> ContextId {
        self.context
    }
}

impl<C> Deref for Pooled<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.connection
    }
}

impl<C> DerefMut for Pooled<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.connection
    }
}
