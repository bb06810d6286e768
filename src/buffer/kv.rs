//! External key-value store backend
//!
//! Buffers of this kind keep their items in a list stored under a per-simulation
//! key in a `KeyValueStore`. The store is shared by every external-store
//! simulation of a registry, so all list primitives must be atomic per key.
//!
//! ## Keys
//!
//! Each list lives at `buffer:<namespace>:sim-<n>`. The namespace belongs to
//! the registry, so registries sharing one store never collide even though
//! each numbers its simulations from 1. A key that already exists is never
//! reused.
//!
//! ## Encoding
//!
//! Items are stored as their sequence number in decimal. Values that do not
//! decode are dropped with a warning when popped.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, trace, warn};

use super::backend::BufferBackend;
use crate::config::BufferKind;
use crate::error::{SimulationError, SimulationResult};
use crate::{Item, SimulationId};

/// List primitives an external store must provide
///
/// Modelled after the list commands of common key-value servers. Every method
/// must answer immediately; none of them wait for space or for data.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Append `value` to the list at `key` unless it already holds `max_len` values
    ///
    /// The length check and the append form one atomic step.
    async fn push_back_bounded(&self, key: &str, value: String, max_len: usize) -> bool;

    /// Remove and return the first value of the list at `key`
    async fn pop_front(&self, key: &str) -> Option<String>;

    /// Length of the list at `key` (0 when absent)
    async fn list_len(&self, key: &str) -> usize;

    /// All values of the list at `key`, front first
    async fn list_range(&self, key: &str) -> Vec<String>;

    /// Drop the list at `key`, returning whether it existed
    async fn delete(&self, key: &str) -> bool;

    /// Create an empty list at `key` unless the key already exists
    ///
    /// The existence check and the creation form one atomic step.
    async fn create_list(&self, key: &str) -> bool;
}

/// In-process `KeyValueStore`
///
/// Stands in for an external server; one instance is shared across all
/// simulations of a registry.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    lists: RwLock<HashMap<String, VecDeque<String>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently holding a list
    pub async fn key_count(&self) -> usize {
        self.lists.read().await.len()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn push_back_bounded(&self, key: &str, value: String, max_len: usize) -> bool {
        let mut lists = self.lists.write().await;
        let list = lists.entry(key.to_string()).or_default();
        if list.len() >= max_len {
            return false;
        }
        list.push_back(value);
        true
    }

    async fn pop_front(&self, key: &str) -> Option<String> {
        let mut lists = self.lists.write().await;
        lists.get_mut(key).and_then(|list| list.pop_front())
    }

    async fn list_len(&self, key: &str) -> usize {
        let lists = self.lists.read().await;
        lists.get(key).map_or(0, VecDeque::len)
    }

    async fn list_range(&self, key: &str) -> Vec<String> {
        let lists = self.lists.read().await;
        lists
            .get(key)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default()
    }

    async fn delete(&self, key: &str) -> bool {
        self.lists.write().await.remove(key).is_some()
    }

    async fn create_list(&self, key: &str) -> bool {
        match self.lists.write().await.entry(key.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(VecDeque::new());
                true
            }
        }
    }
}

/// Bounded buffer stored as a list in a `KeyValueStore`
pub struct KvBuffer {
    store: Arc<dyn KeyValueStore>,
    key: String,
    capacity: usize,
}

impl std::fmt::Debug for KvBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvBuffer")
            .field("key", &self.key)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl KvBuffer {
    /// Claim the list of `id` inside `namespace`
    ///
    /// Fails if the key is already taken, so a live buffer of another
    /// simulation sharing the store is never touched.
    pub async fn create(
        store: Arc<dyn KeyValueStore>,
        namespace: &str,
        id: SimulationId,
        capacity: usize,
    ) -> SimulationResult<Self> {
        let key = Self::key_for(namespace, id);
        if !store.create_list(&key).await {
            warn!("buffer key {key} is already in use");
            return Err(SimulationError::InvalidConfiguration(format!(
                "buffer key {key} is already in use"
            )));
        }
        debug!("created list at {key}");

        Ok(Self {
            store,
            key,
            capacity,
        })
    }

    pub fn key_for(namespace: &str, id: SimulationId) -> String {
        format!("buffer:{namespace}:{id}")
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn encode(item: Item) -> String {
        item.seq.to_string()
    }

    fn decode(value: &str) -> Option<Item> {
        value.parse().ok().map(Item::new)
    }
}

#[async_trait]
impl BufferBackend for KvBuffer {
    async fn try_insert(&mut self, item: Item) -> bool {
        let accepted = self
            .store
            .push_back_bounded(&self.key, Self::encode(item), self.capacity)
            .await;
        if !accepted {
            trace!("list {} full ({}), rejecting {item}", self.key, self.capacity);
        }
        accepted
    }

    async fn try_remove(&mut self) -> Option<Item> {
        let value = self.store.pop_front(&self.key).await?;
        let item = Self::decode(&value);
        if item.is_none() {
            warn!("dropping undecodable value {value:?} from {}", self.key);
        }
        item
    }

    async fn size(&self) -> usize {
        self.store.list_len(&self.key).await
    }

    async fn items(&self) -> Vec<Item> {
        self.store
            .list_range(&self.key)
            .await
            .iter()
            .filter_map(|value| Self::decode(value))
            .collect()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn kind(&self) -> BufferKind {
        BufferKind::ExternalStore
    }

    async fn close(&mut self) {
        debug!("deleting list {}", self.key);
        self.store.delete(&self.key).await;
    }
}
