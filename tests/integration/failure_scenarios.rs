//! Rejected configurations and unknown ids

use assert_matches::assert_matches;
use buffer_sim::config::{BufferKind, SimulationConfig};
use buffer_sim::{SimulationError, SimulationId, SimulationRegistry};

use crate::helpers::*;

#[tokio::test]
async fn test_zero_capacity_rejected() {
    let registry = SimulationRegistry::new();

    let result = registry
        .start(SimulationConfig::new(1000, 1000, 0, BufferKind::InMemory))
        .await;

    assert_matches!(result, Err(SimulationError::InvalidConfiguration(msg)) if msg.contains("capacity"));
    assert_eq!(registry.len().await, 0);
}

#[tokio::test]
async fn test_zero_intervals_rejected() {
    let registry = SimulationRegistry::new();
    let existing = registry
        .start(create_manual_config(5, BufferKind::InMemory))
        .await
        .unwrap();

    for config in [
        SimulationConfig::new(0, 1000, 5, BufferKind::InMemory),
        SimulationConfig::new(1000, 0, 5, BufferKind::ExternalStore),
    ] {
        assert_matches!(
            registry.start(config).await,
            Err(SimulationError::InvalidConfiguration(_))
        );
    }

    // Only the valid simulation exists
    assert_eq!(registry.list().await, vec![existing]);
    registry.shutdown().await;
}

#[tokio::test]
async fn test_unknown_id_is_not_found() {
    let registry = SimulationRegistry::new();
    let unknown = SimulationId(42);

    assert_eq!(
        registry.status(unknown).await.unwrap_err(),
        SimulationError::NotFound(unknown)
    );
    assert_eq!(
        registry.stop(unknown).await.unwrap_err(),
        SimulationError::NotFound(unknown)
    );
    assert_matches!(
        registry.handle(unknown).await,
        Err(SimulationError::NotFound(_))
    );
}

#[tokio::test]
async fn test_rejected_start_does_not_consume_an_id() {
    let registry = SimulationRegistry::new();

    let _ = registry
        .start(create_manual_config(0, BufferKind::InMemory))
        .await;
    let id = registry
        .start(create_manual_config(1, BufferKind::InMemory))
        .await
        .unwrap();

    assert_eq!(id, SimulationId(1));
    registry.stop(id).await.unwrap();
}

#[tokio::test]
async fn test_capacity_one_buffer() {
    let registry = SimulationRegistry::new();
    let id = registry
        .start(create_manual_config(1, BufferKind::InMemory))
        .await
        .unwrap();
    let handle = registry.handle(id).await.unwrap();

    for _ in 0..5 {
        handle
            .tick_now(buffer_sim::actors::Role::Producer)
            .await
            .unwrap();
    }

    let snapshot = registry.status(id).await.unwrap();
    assert_eq!(snapshot.buffer_size, 1);
    assert_eq!(snapshot.counters.lost, 4);
    assert_eq!(snapshot.metrics.loss_rate, 80.0);
    assert_snapshot_invariants(&snapshot);

    registry.stop(id).await.unwrap();
}
