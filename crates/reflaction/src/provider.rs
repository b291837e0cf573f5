//! Provider registry - one store per subtree, looked up explicitly
//!
//! Hosts that render several independent subtrees keep their stores here,
//! keyed by whatever identifies a subtree in the host (a view id, a route, a
//! window handle). Consumers receive handles from the registry instead of
//! reaching for shared globals.

use crate::error::ConfigError;
use crate::store::{Store, StoreConfig, StoreHandle};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

pub struct ProviderRegistry<K, S, P = Value> {
    stores: HashMap<K, Store<S, P>>,
}

impl<K, S, P> ProviderRegistry<K, S, P>
where
    K: Eq + Hash + fmt::Debug,
    S: Clone + 'static,
    P: 'static,
{
    pub fn new() -> Self {
        Self {
            stores: HashMap::new(),
        }
    }

    /// Handle for the store of `key`, building it from `config` on first use
    ///
    /// `config` is only called when no store exists for `key` yet.
    pub fn provide(
        &mut self,
        key: K,
        config: impl FnOnce() -> StoreConfig<S, P>,
    ) -> Result<StoreHandle<S, P>, ConfigError> {
        if let Some(store) = self.stores.get(&key) {
            return Ok(store.handle());
        }
        log::debug!("Creating store for subtree {:?}", key);
        let store = Store::new(config())?;
        let handle = store.handle();
        self.stores.insert(key, store);
        Ok(handle)
    }

    pub fn handle(&self, key: &K) -> Option<StoreHandle<S, P>> {
        self.stores.get(key).map(Store::handle)
    }

    pub fn store(&self, key: &K) -> Option<&Store<S, P>> {
        self.stores.get(key)
    }

    /// Drop the store of `key`; outstanding handles keep it alive until
    /// they are dropped too
    pub fn release(&mut self, key: &K) -> bool {
        let removed = self.stores.remove(key).is_some();
        if removed {
            log::debug!("Released store for subtree {:?}", key);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

impl<K, S, P> Default for ProviderRegistry<K, S, P>
where
    K: Eq + Hash + fmt::Debug,
    S: Clone + 'static,
    P: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, S, P> fmt::Debug for ProviderRegistry<K, S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.stores.keys()).finish()
    }
}
