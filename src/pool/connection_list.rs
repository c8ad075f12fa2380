use std::collections::{HashSet, VecDeque};

use tracing::debug;

use super::{ContextId, PoolableConnection, Pooled};

/// Idle connections plus the ids of every live connection a context owns,
/// borrowed or not.
#[derive(Debug)]
pub(crate) struct ConnectionList<C> {
    context: ContextId,
    idle: VecDeque<Pooled<C>>,
    members: HashSet<u64>,
    next_id: u64,
}

impl<C: PoolableConnection> ConnectionList<C> {
    pub(crate) fn new(context: ContextId, capacity: usize) -> Self {
        Self {
            context,
            idle: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
            next_id: 0,
        }
    }

    /// Live connections, idle and borrowed.
    pub(crate) fn count(&self) -> usize {
        self.members.len()
    }

    pub(crate) fn idle_count(&self) -> usize {
        self.idle.len()
    }

    /// First idle connection that is still open. Closed ones met on the way
    /// are forgotten.
    pub(crate) fn borrow(&mut self) -> Option<Pooled<C>> {
        while let Some(pooled) = self.idle.pop_front() {
            if pooled.connection.is_closed() {
                debug!(
                    "Dropping closed connection {} from context {}",
                    pooled.id, self.context.0
                );
                self.members.remove(&pooled.id);
                continue;
            }
            return Some(pooled);
        }
        None
    }

    /// Takes ownership of a freshly created connection.
    pub(crate) fn register(&mut self, connection: C) -> Pooled<C> {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.members.insert(id);
        Pooled {
            id,
            context: self.context,
            connection,
        }
    }

    /// Puts a borrowed connection back, or forgets it when not reusable.
    /// Returns false for a connection this list does not own.
    pub(crate) fn give_back(&mut self, pooled: Pooled<C>, reusable: bool) -> bool {
        if pooled.context != self.context || !self.members.contains(&pooled.id) {
            return false;
        }
        if reusable {
            self.idle.push_back(pooled);
        } else {
            self.members.remove(&pooled.id);
        }
        true
    }

    /// Releases every idle connection.
    pub(crate) fn drain_idle(&mut self) -> Vec<Pooled<C>> {
        let drained: Vec<_> = self.idle.drain(..).collect();
        for pooled in &drained {
            self.members.remove(&pooled.id);
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Clone, Default)]
    struct Fake {
        closed: Arc<AtomicBool>,
    }

    impl PoolableConnection for Fake {
        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_borrow_skips_closed() {
        let mut list = ConnectionList::new(ContextId(0), 4);
        let first = list.register(Fake::default());
        let second = list.register(Fake::default());
        first.connection.closed.store(true, Ordering::SeqCst);
        assert!(list.give_back(first, true));
        assert!(list.give_back(second, true));
        assert_eq!(list.count(), 2);

        let borrowed = list.borrow().unwrap();
        assert_eq!(borrowed.id, 1);
        assert_eq!(list.count(), 1);
        assert_eq!(list.idle_count(), 0);
    }

    #[test]
    fn test_give_back_unreusable_forgets() {
        let mut list = ConnectionList::new(ContextId(0), 1);
        let pooled = list.register(Fake::default());
        assert!(list.give_back(pooled, false));
        assert_eq!(list.count(), 0);
        assert!(list.borrow().is_none());
    }

    #[test]
    fn test_foreign_connection_is_rejected() {
        let mut ours = ConnectionList::new(ContextId(0), 1);
        let mut theirs = ConnectionList::new(ContextId(1), 1);
        let foreign = theirs.register(Fake::default());
        assert!(!ours.give_back(foreign, true));
        assert_eq!(ours.idle_count(), 0);
    }

    #[test]
    fn test_drain_idle_releases_membership() {
        let mut list = ConnectionList::new(ContextId(0), 2);
        let a = list.register(Fake::default());
        let _borrowed = list.register(Fake::default());
        list.give_back(a, true);
        assert_eq!(list.drain_idle().len(), 1);
        assert_eq!(list.count(), 1);
    }
}
