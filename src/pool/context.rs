//! Per-context pool actor.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::connection_list::ConnectionList;
use super::waiting_list::{Reply, WaitingList};
use super::{ConnectionFactory, ContextId, PoolConfig, PoolError, PoolResult, PoolableConnection, Pooled};

pub(crate) enum Command<C> {
    Request { reply: Reply<C> },
    Return { connection: Pooled<C> },
    Expire { id: u64 },
    Shutdown { done: oneshot::Sender<()> },
}

/// Handle to the pool of one execution context. Cloning is cheap and every
/// clone drives the same task.
pub struct ContextPool<F: ConnectionFactory> {
    context: ContextId,
    commands: mpsc::UnboundedSender<Command<F::Connection>>,
}

impl<F: ConnectionFactory> Clone for ContextPool<F> {
    fn clone(&self) -> Self {
        Self {
            context: self.context,
            commands: self.commands.clone(),
        }
    }
}

impl<F: ConnectionFactory> fmt::Debug for ContextPool<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextPool")
            .field("context", &self.context)
            .field("closed", &self.commands.is_closed())
            .finish()
    }
}

fn actor_gone() -> PoolError {
    PoolError::InvalidState("pool task has stopped".to_string())
}

impl<F: ConnectionFactory> ContextPool<F> {
    pub fn new(context: ContextId, factory: Arc<F>, config: PoolConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let actor = PoolActor {
            context,
            factory,
            max_connections: config.max_connections_per_context,
            connections: ConnectionList::new(context, config.max_connections_per_context),
            waiting: WaitingList::new(config.request_timeout),
            commands: tx.downgrade(),
            terminated: false,
        };
        tokio::spawn(actor.run(rx));

        info!(
            "Connection pool for {} created (max {} connections, timeout {:?})",
            context, config.max_connections_per_context, config.request_timeout
        );

        Self { context, commands: tx }
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Borrows a connection, waiting in line when the context is saturated.
    pub async fn request_connection(&self) -> PoolResult<Pooled<F::Connection>> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Request { reply })
            .map_err(|_| actor_gone())?;
        rx.await.map_err(|_| actor_gone())?
    }

    pub fn return_connection(&self, connection: Pooled<F::Connection>) -> PoolResult<()> {
        if connection.context != self.context {
            return Err(PoolError::InvalidState(format!(
                "connection belongs to {}, not {}",
                connection.context, self.context
            )));
        }
        self.commands
            .send(Command::Return { connection })
            .map_err(|_| actor_gone())
    }

    /// Runs `body` with a borrowed connection, which is returned afterwards
    /// whatever the outcome.
    pub async fn with_connection<T, E, B>(&self, body: B) -> Result<T, E>
    where
        B: for<'c> FnOnce(&'c F::Connection) -> BoxFuture<'c, Result<T, E>>,
        E: From<PoolError>,
    {
        let pooled = self.request_connection().await?;
        let result = body(&pooled).await;
        let returned = self.return_connection(pooled);
        let value = result?;
        returned?;
        Ok(value)
    }

    /// Stops handing out connections and releases the idle ones. Borrowers
    /// already waiting are left to time out.
    pub async fn shutdown(&self) -> PoolResult<()> {
        let (done, rx) = oneshot::channel();
        self.commands
            .send(Command::Shutdown { done })
            .map_err(|_| actor_gone())?;
        rx.await.map_err(|_| actor_gone())
    }
}

// ==================== Actor ====================

struct PoolActor<F: ConnectionFactory> {
    context: ContextId,
    factory: Arc<F>,
    max_connections: usize,
    connections: ConnectionList<F::Connection>,
    waiting: WaitingList<F::Connection>,
    commands: mpsc::WeakUnboundedSender<Command<F::Connection>>,
    terminated: bool,
}

impl<F: ConnectionFactory> PoolActor<F> {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command<F::Connection>>) {
        while let Some(command) = rx.recv().await {
            match command {
                Command::Request { reply } => self.handle_request(reply).await,
                Command::Return { connection } => self.handle_return(connection).await,
                Command::Expire { id } => {
                    if self.waiting.expire(id) {
                        warn!(
                            "Connection request {} on {} timed out ({} still waiting)",
                            id,
                            self.context,
                            self.waiting.len()
                        );
                    }
                }
                Command::Shutdown { done } => {
                    self.terminated = true;
                    let released = self.connections.drain_idle().len();
                    info!(
                        "Connection pool for {} shut down, released {} idle connections",
                        self.context, released
                    );
                    let _ = done.send(());
                }
            }
        }
        debug!("Connection pool task for {} stopped", self.context);
    }

    /// Idle connection first, then a new one while under the limit.
    async fn acquire(&mut self) -> Option<Pooled<F::Connection>> {
        if self.terminated {
            return None;
        }
        if let Some(pooled) = self.connections.borrow() {
            debug!("Reusing connection {} on {}", pooled.id, self.context);
            return Some(pooled);
        }
        if self.connections.count() < self.max_connections {
            let connection = self.factory.create_connection(self.context).await;
            let pooled = self.connections.register(connection);
            debug!(
                "Created connection {} on {} ({}/{})",
                pooled.id,
                self.context,
                self.connections.count(),
                self.max_connections
            );
            return Some(pooled);
        }
        None
    }

    async fn handle_request(&mut self, reply: Reply<F::Connection>) {
        match self.acquire().await {
            Some(pooled) => {
                if let Err(Ok(back)) = reply.send(Ok(pooled)) {
                    debug!("Requester on {} went away, requeueing", self.context);
                    self.connections.give_back(back, true);
                }
            }
            None => {
                let commands = self.commands.clone();
                let id = self.waiting.push(reply, move |id| {
                    if let Some(commands) = commands.upgrade() {
                        let _ = commands.send(Command::Expire { id });
                    }
                });
                debug!(
                    "No connection available on {}, request {} queued ({} waiting)",
                    self.context,
                    id,
                    self.waiting.len()
                );
            }
        }
    }

    async fn handle_return(&mut self, pooled: Pooled<F::Connection>) {
        if self.terminated {
            self.connections.give_back(pooled, false);
            return;
        }

        let id = pooled.id;
        let reusable = !pooled.connection.is_closed();
        if !reusable {
            warn!("Connection {} on {} came back closed", id, self.context);
        }
        if !self.connections.give_back(pooled, reusable) {
            warn!("Ignoring unknown connection {} returned to {}", id, self.context);
            return;
        }
        debug!(
            "Connection {} returned to {} ({} idle of {})",
            id,
            self.context,
            self.connections.idle_count(),
            self.connections.count()
        );

        while !self.waiting.is_empty() {
            let Some(pooled) = self.acquire().await else {
                break;
            };
            if let Some(unclaimed) = self.waiting.fulfil(pooled) {
                self.connections.give_back(unclaimed, true);
                break;
            }
        }
    }
}
