use std::{borrow::Borrow, collections::HashMap, hash::Hash, sync::Arc};

use parking_lot::RwLock;

use simcircuit_shared::Message;

/// A function consuming one dispatched message
pub type Handler = Arc<dyn Fn(Message) + Send + Sync>;

/// Keyed handler map. Reads vastly outnumber writes, so lookups share a read
/// lock and hand out a clone of the handler which is invoked after the lock
/// is released. One handler per key, the last registration wins.
pub struct RoutingTable<K> {
    handlers: RwLock<HashMap<K, Handler>>,
}

impl<K: Eq + Hash> RoutingTable<K> {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Register `handler` for `key`, returning the handler it replaced
    pub fn insert<F>(&self, key: K, handler: F) -> Option<Handler>
    where
        F: Fn(Message) + Send + Sync + 'static,
    {
        self.insert_handler(key, Arc::new(handler))
    }

    pub fn insert_handler(&self, key: K, handler: Handler) -> Option<Handler> {
        self.handlers.write().insert(key, handler)
    }

    pub fn remove<Q>(&self, key: &Q) -> Option<Handler>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.handlers.write().remove(key)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<Handler>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.handlers.read().get(key).cloned()
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.handlers.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    pub fn clear(&self) {
        self.handlers.write().clear();
    }
}

impl<K: Eq + Hash> Default for RoutingTable<K> {
    fn default() -> Self {
        Self::new()
    }
}
