//! Start / status / stop through the registry

use assert_matches::assert_matches;
use buffer_sim::actors::{Role, TickOutcome};
use buffer_sim::buffer::{KeyValueStore, MemoryKvStore};
use buffer_sim::config::BufferKind;
use buffer_sim::{Item, SimulationError, SimulationRegistry, SimulationStatus};
use pretty_assertions::assert_eq;
use std::sync::Arc;

use crate::helpers::*;

#[tokio::test]
async fn test_fresh_simulation_snapshot() {
    let registry = SimulationRegistry::new();
    let config = create_manual_config(10, BufferKind::InMemory);
    let id = registry.start(config.clone()).await.unwrap();

    let snapshot = registry.status(id).await.unwrap();

    assert_eq!(snapshot.id, id);
    assert_eq!(snapshot.config, config);
    assert_eq!(snapshot.status, SimulationStatus::Running);
    assert_eq!(snapshot.counters.produced, 0);
    assert_eq!(snapshot.counters.consumed, 0);
    assert_eq!(snapshot.counters.lost, 0);
    assert_eq!(snapshot.buffer_size, 0);
    assert_eq!(snapshot.buffer_capacity, 10);
    assert!(snapshot.buffer_items.is_empty());
    assert_eq!(snapshot.metrics.efficiency, 0.0);
    assert_eq!(snapshot.history.len(), 1);

    registry.stop(id).await.unwrap();
}

#[tokio::test]
async fn test_stop_then_status_is_not_found() {
    let registry = SimulationRegistry::new();
    let id = registry
        .start(create_manual_config(3, BufferKind::InMemory))
        .await
        .unwrap();

    registry.stop(id).await.unwrap();

    assert_eq!(
        registry.status(id).await.unwrap_err(),
        SimulationError::NotFound(id)
    );
    assert_eq!(
        registry.stop(id).await.unwrap_err(),
        SimulationError::NotFound(id)
    );
    assert!(registry.list().await.is_empty());
}

#[tokio::test]
async fn test_stopped_handle_stays_dead() {
    let registry = SimulationRegistry::new();
    let id = registry
        .start(create_manual_config(3, BufferKind::InMemory))
        .await
        .unwrap();
    let handle = registry.handle(id).await.unwrap();

    registry.stop(id).await.unwrap();

    assert!(handle.is_stopped());
    assert_matches!(
        handle.tick_now(Role::Producer).await,
        Err(SimulationError::NotFound(_))
    );

    // A new start never brings the old id back
    let new_id = registry
        .start(create_manual_config(3, BufferKind::InMemory))
        .await
        .unwrap();
    assert_ne!(new_id, id);
    registry.shutdown().await;
}

#[tokio::test]
async fn test_efficiency_is_100_only_when_everything_consumed() {
    let registry = SimulationRegistry::new();
    let id = registry
        .start(create_manual_config(2, BufferKind::InMemory))
        .await
        .unwrap();
    let handle = registry.handle(id).await.unwrap();

    handle.tick_now(Role::Producer).await.unwrap();
    handle.tick_now(Role::Producer).await.unwrap();
    handle.tick_now(Role::Consumer).await.unwrap();

    let partial = registry.status(id).await.unwrap();
    assert_eq!(partial.metrics.efficiency, 50.0);

    handle.tick_now(Role::Consumer).await.unwrap();
    let complete = registry.status(id).await.unwrap();
    assert_eq!(complete.metrics.efficiency, 100.0);
    assert_eq!(complete.metrics.loss_rate, 0.0);

    // Overflow: produced 3 into capacity 2 without consuming in between
    for _ in 0..3 {
        handle.tick_now(Role::Producer).await.unwrap();
    }
    for _ in 0..3 {
        handle.tick_now(Role::Consumer).await.unwrap();
    }
    let lossy = registry.status(id).await.unwrap();
    assert_eq!(lossy.counters.lost, 1);
    assert_eq!(lossy.buffer_size, 0);
    assert!(lossy.metrics.efficiency < 100.0);
    assert_snapshot_invariants(&lossy);

    registry.stop(id).await.unwrap();
}

#[tokio::test]
async fn test_history_is_capped_at_30() {
    let registry = SimulationRegistry::new();
    let id = registry
        .start(create_manual_config(3, BufferKind::InMemory))
        .await
        .unwrap();

    let mut last = None;
    for _ in 0..45 {
        last = Some(registry.status(id).await.unwrap());
    }

    let snapshot = last.unwrap();
    assert_eq!(snapshot.history.len(), 30);
    assert_snapshot_invariants(&snapshot);

    registry.stop(id).await.unwrap();
}

#[tokio::test]
async fn test_external_store_simulation() {
    let store = Arc::new(MemoryKvStore::new());
    let registry = SimulationRegistry::with_store(store.clone());

    let id = registry
        .start(create_manual_config(2, BufferKind::ExternalStore))
        .await
        .unwrap();
    let handle = registry.handle(id).await.unwrap();

    let outcomes = vec![
        handle.tick_now(Role::Producer).await.unwrap(),
        handle.tick_now(Role::Producer).await.unwrap(),
        handle.tick_now(Role::Producer).await.unwrap(),
        handle.tick_now(Role::Consumer).await.unwrap(),
    ];
    assert_eq!(
        outcomes,
        vec![
            TickOutcome::Inserted(Item::new(1)),
            TickOutcome::Inserted(Item::new(2)),
            TickOutcome::Lost(Item::new(3)),
            TickOutcome::Consumed(Item::new(1)),
        ]
    );

    let snapshot = registry.status(id).await.unwrap();
    assert_eq!(snapshot.buffer_items, vec!["Item 2"]);
    assert_eq!(snapshot.config.buffer_kind, BufferKind::ExternalStore);
    assert_eq!(store.list_len(&registry.buffer_key(id)).await, 1);
    assert_snapshot_invariants(&snapshot);

    registry.stop(id).await.unwrap();
    assert_eq!(store.key_count().await, 0);
}

#[tokio::test]
async fn test_snapshot_serializes_flat_counters() {
    let registry = SimulationRegistry::new();
    let id = registry
        .start(create_manual_config(4, BufferKind::InMemory))
        .await
        .unwrap();
    let handle = registry.handle(id).await.unwrap();
    handle.tick_now(Role::Producer).await.unwrap();

    let snapshot = registry.status(id).await.unwrap();
    let json = serde_json::to_value(&snapshot).unwrap();

    assert_eq!(json["id"], 1);
    assert_eq!(json["status"], "running");
    assert_eq!(json["produced"], 1);
    assert_eq!(json["lost"], 0);
    assert_eq!(json["buffer_items"][0], "Item 1");
    assert_eq!(json["fill_level"], "low");
    assert_eq!(json["config"]["buffer_kind"], "in-memory");
    assert!(json["history"].is_array());

    registry.stop(id).await.unwrap();
}
