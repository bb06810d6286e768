//! Helper functions for integration tests

use buffer_sim::actors::StatusSnapshot;
use buffer_sim::config::{BufferKind, SimulationConfig};

/// Interval long enough that timers never fire during a test
pub const NEVER_MS: u64 = 3_600_000;

/// Simulation driven only by manual ticks
pub fn create_manual_config(capacity: usize, kind: BufferKind) -> SimulationConfig {
    SimulationConfig::new(NEVER_MS, NEVER_MS, capacity, kind)
}

pub fn create_timed_config(producer_ms: u64, consumer_ms: u64, capacity: usize) -> SimulationConfig {
    SimulationConfig::new(producer_ms, consumer_ms, capacity, BufferKind::InMemory)
}

/// Invariants that must hold for every snapshot
pub fn assert_snapshot_invariants(snapshot: &StatusSnapshot) {
    let counters = snapshot.counters;

    assert!(
        snapshot.buffer_size <= snapshot.buffer_capacity,
        "buffer size {} exceeds capacity {}",
        snapshot.buffer_size,
        snapshot.buffer_capacity
    );
    assert!(counters.lost <= counters.produced);
    assert!(
        counters.consumed <= counters.accepted(),
        "consumed {} more than accepted {}",
        counters.consumed,
        counters.accepted()
    );
    assert_eq!(
        counters.accepted() - counters.consumed,
        snapshot.buffer_size as u64,
        "items in buffer must equal accepted minus consumed"
    );
    assert_eq!(snapshot.buffer_items.len(), snapshot.buffer_size);
    assert!((0.0..=100.0).contains(&snapshot.metrics.efficiency));
    assert!(snapshot.history.len() <= 30);
    assert!(
        snapshot
            .history
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp)
    );
}
