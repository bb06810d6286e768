//! Registry of running simulations
//!
//! The registry is a plain value: construct as many as you like, share one
//! behind an `Arc` if several tasks need it. It owns the handles of its
//! simulations and the key-value store used by external-store buffers.
//!
//! Every registry gets its own store namespace, so several registries can
//! share one store without touching each other's lists.
//!
//! A simulation stopped through a [`SimulationHandle`] counts as gone: it is
//! dropped from the registry the next time the registry looks at it.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::SimulationId;
use crate::actors::{SimulationHandle, StatusSnapshot};
use crate::buffer::{BoundedBuffer, BufferBackend, KeyValueStore, KvBuffer, MemoryKvStore};
use crate::config::{BufferKind, SimulationConfig};
use crate::error::{SimulationError, SimulationResult};

/// Source of per-process registry namespaces
static NEXT_NAMESPACE: AtomicU64 = AtomicU64::new(1);

/// Creates, tracks and tears down simulations by id
pub struct SimulationRegistry {
    instances: RwLock<HashMap<SimulationId, SimulationHandle>>,

    /// Last id handed out
    last_id: AtomicU64,

    /// Backing store for external-store buffers
    store: Arc<dyn KeyValueStore>,

    /// Prefix of this registry's keys in `store`
    namespace: String,
}

impl SimulationRegistry {
    /// Create a registry with its own in-process key-value store
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryKvStore::new()))
    }

    /// Create a registry whose external-store buffers live in `store`
    pub fn with_store(store: Arc<dyn KeyValueStore>) -> Self {
        let namespace = format!("registry-{}", NEXT_NAMESPACE.fetch_add(1, Ordering::SeqCst));
        Self::with_namespace(store, namespace)
    }

    /// Create a registry using an explicit key namespace in `store`
    ///
    /// Registries in different processes sharing one external store need
    /// distinct namespaces. Starting a simulation whose key is already taken
    /// fails instead of clobbering the existing list.
    pub fn with_namespace(store: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            instances: RwLock::new(HashMap::new()),
            last_id: AtomicU64::new(0),
            store,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Store key of the buffer list of `id`
    pub fn buffer_key(&self, id: SimulationId) -> String {
        KvBuffer::key_for(&self.namespace, id)
    }

    /// Start a new simulation
    ///
    /// Nothing is created when the configuration is invalid.
    pub async fn start(&self, config: SimulationConfig) -> SimulationResult<SimulationId> {
        config
            .validate()
            .inspect_err(|e| warn!("refusing to start simulation: {e}"))?;

        let id = SimulationId(self.last_id.fetch_add(1, Ordering::SeqCst) + 1);

        let buffer: Box<dyn BufferBackend> = match config.buffer_kind {
            BufferKind::InMemory => Box::new(BoundedBuffer::new(config.buffer_capacity)),
            BufferKind::ExternalStore => Box::new(
                KvBuffer::create(self.store.clone(), &self.namespace, id, config.buffer_capacity)
                    .await?,
            ),
        };

        info!(
            "starting simulation {id}: producer every {}ms, consumer every {}ms, {} buffer of {}",
            config.producer_interval_ms,
            config.consumer_interval_ms,
            config.buffer_kind,
            config.buffer_capacity
        );

        let handle = SimulationHandle::spawn(id, config, buffer);
        self.instances.write().await.insert(id, handle);

        Ok(id)
    }

    /// Stop a simulation and forget it
    ///
    /// Stopping an id that is unknown or already stopped, by this registry or
    /// through a handle, is `NotFound`.
    pub async fn stop(&self, id: SimulationId) -> SimulationResult<()> {
        let handle = self
            .instances
            .write()
            .await
            .remove(&id)
            .ok_or(SimulationError::NotFound(id))?;

        let counters = handle.stop().await.inspect_err(|e| {
            debug!("simulation {id} was already stopped: {e}");
        })?;
        debug!("simulation {id} removed with {counters:?}");

        Ok(())
    }

    /// Snapshot of a running simulation
    pub async fn status(&self, id: SimulationId) -> SimulationResult<StatusSnapshot> {
        let result = self.handle(id).await?.status().await;
        if result.is_err() {
            self.prune().await;
        }
        result
    }

    /// Control handle of a running simulation
    pub async fn handle(&self, id: SimulationId) -> SimulationResult<SimulationHandle> {
        self.instances
            .read()
            .await
            .get(&id)
            .filter(|handle| !handle.is_stopped())
            .cloned()
            .ok_or(SimulationError::NotFound(id))
    }

    /// Ids of all running simulations, oldest first
    pub async fn list(&self) -> Vec<SimulationId> {
        self.prune().await;
        let mut ids: Vec<SimulationId> = self.instances.read().await.keys().copied().collect();
        ids.sort();
        ids
    }

    pub async fn len(&self) -> usize {
        self.prune().await;
        self.instances.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Forget simulations that were stopped behind the registry's back
    async fn prune(&self) {
        self.instances.write().await.retain(|id, handle| {
            let stopped = handle.is_stopped();
            if stopped {
                debug!("dropping stopped simulation {id}");
            }
            !stopped
        });
    }

    /// Stop every simulation
    pub async fn shutdown(&self) {
        let handles: Vec<SimulationHandle> = self
            .instances
            .write()
            .await
            .drain()
            .map(|(_, handle)| handle)
            .collect();

        debug!("stopping {} simulations", handles.len());

        let results = futures::future::join_all(handles.iter().map(|handle| handle.stop())).await;

        for (handle, result) in handles.iter().zip(results) {
            if let Err(e) = result {
                debug!("{} was already stopped: {e}", handle.id());
            }
        }
    }
}

impl Default for SimulationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
