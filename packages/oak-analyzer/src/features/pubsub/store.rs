//! NotifyingStore - keyed values behind an explicit mutator set
//!
//! Readers get clones; writers replace the whole map at once. Every
//! replacement publishes on the store's bus.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::bus::InvalidationBus;

#[derive(Debug)]
pub struct NotifyingStore<V> {
    values: RwLock<BTreeMap<String, V>>,
    bus: Arc<InvalidationBus>,
}

impl<V: Clone> NotifyingStore<V> {
    pub fn new(bus: Arc<InvalidationBus>) -> Self {
        Self {
            values: RwLock::new(BTreeMap::new()),
            bus,
        }
    }

    pub fn read(&self, key: &str) -> Option<V> {
        self.values.read().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    /// Swap in a new map, then schedule a notification
    pub fn replace_all(&self, values: BTreeMap<String, V>) {
        *self.values.write() = values;
        self.notify();
    }

    pub fn notify(&self) {
        self.bus.notify();
    }

    pub fn snapshot(&self) -> BTreeMap<String, V> {
        self.values.read().clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.values.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    pub fn bus(&self) -> &Arc<InvalidationBus> {
        &self.bus
    }
}
