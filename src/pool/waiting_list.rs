use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::AbortHandle;

use super::error::{PoolError, PoolResult};
use super::Pooled;

pub(crate) type Reply<C> = oneshot::Sender<PoolResult<Pooled<C>>>;

struct Waiter<C> {
    reply: Reply<C>,
    timer: AbortHandle,
}

/// Borrowers waiting on a saturated context, oldest first.
///
/// Each waiter owns one timer armed when it is queued. A waiter leaves the
/// list exactly once: fulfilled (timer aborted) or expired.
pub(crate) struct WaitingList<C> {
    waiters: BTreeMap<u64, Waiter<C>>,
    next_id: u64,
    timeout: Duration,
}

impl<C: Send + 'static> WaitingList<C> {
    pub(crate) fn new(timeout: Duration) -> Self {
        Self {
            waiters: BTreeMap::new(),
            next_id: 0,
            timeout,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.waiters.len()
    }

    /// Queues `reply`; `on_expire` runs with the waiter id once the timeout
    /// elapses unless the waiter is fulfilled first.
    pub(crate) fn push<E>(&mut self, reply: Reply<C>, on_expire: E) -> u64
    where
        E: FnOnce(u64) + Send + 'static,
    {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        let timeout = self.timeout;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            on_expire(id);
        })
        .abort_handle();

        self.waiters.insert(id, Waiter { reply, timer });
        id
    }

    /// Fails the waiter with a timeout. False if it already left the list.
    pub(crate) fn expire(&mut self, id: u64) -> bool {
        match self.waiters.remove(&id) {
            Some(waiter) => {
                let _ = waiter.reply.send(Err(PoolError::Timeout(self.timeout)));
                true
            }
            None => false,
        }
    }

    /// Hands `connection` to the oldest waiter still listening. Gives the
    /// connection back if every remaining waiter has gone away.
    pub(crate) fn fulfil(&mut self, mut connection: Pooled<C>) -> Option<Pooled<C>> {
        while let Some((_, waiter)) = self.waiters.pop_first() {
            waiter.timer.abort();
            match waiter.reply.send(Ok(connection)) {
                Ok(()) => return None,
                Err(Ok(back)) => connection = back,
                Err(Err(_)) => return None,
            }
        }
        Some(connection)
    }
}

impl<C> Drop for WaitingList<C> {
    fn drop(&mut self) {
        for waiter in self.waiters.values() {
            waiter.timer.abort();
        }
    }
}
