//! Long-running behaviour under the tokio paused clock
//!
//! With the clock paused, sleeping advances virtual time and fires every due
//! timer in order, so minutes of simulation run instantly and deterministically.

use buffer_sim::SimulationRegistry;
use buffer_sim::config::Preset;
use buffer_sim::metrics::FillLevel;
use std::time::Duration;

use crate::helpers::*;

#[tokio::test(start_paused = true)]
async fn test_fast_producer_fills_buffer_and_loses_items() {
    let registry = SimulationRegistry::new();
    let id = registry
        .start(create_timed_config(1000, 1500, 10))
        .await
        .unwrap();

    let mut previous_lost = 0;
    for minute in 1..=3 {
        tokio::time::sleep(Duration::from_secs(60)).await;
        let snapshot = registry.status(id).await.unwrap();
        assert_snapshot_invariants(&snapshot);

        assert!(snapshot.counters.lost > 0, "no loss after {minute} minute(s)");
        assert!(snapshot.counters.lost > previous_lost, "loss stopped growing");
        assert!(snapshot.buffer_size >= 9, "buffer should stay near full");
        assert_eq!(snapshot.metrics.fill_level, FillLevel::High);
        previous_lost = snapshot.counters.lost;
    }

    registry.stop(id).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_fast_consumer_never_loses() {
    let registry = SimulationRegistry::new();
    let id = registry
        .start(create_timed_config(1500, 1000, 10))
        .await
        .unwrap();

    for _ in 0..5 {
        tokio::time::sleep(Duration::from_secs(60)).await;
        let snapshot = registry.status(id).await.unwrap();
        assert_snapshot_invariants(&snapshot);

        assert_eq!(snapshot.counters.lost, 0);
        assert!(snapshot.buffer_size <= 1);
        assert!(snapshot.counters.produced >= 39);
    }

    registry.stop(id).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_throughput_matches_consumer_rate() {
    let registry = SimulationRegistry::new();
    let id = registry
        .start(create_timed_config(500, 1000, 10))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100_500)).await;
    let snapshot = registry.status(id).await.unwrap();

    // Consumer never starves, so it takes one item per second
    assert_eq!(snapshot.counters.consumed, 100);
    assert!((snapshot.metrics.throughput - 100.0 / 100.5).abs() < 1e-9);
    assert!(snapshot.metrics.elapsed_secs >= 100.5);

    registry.stop(id).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_presets_behave_as_named() {
    let registry = SimulationRegistry::new();
    let classic = registry.start(Preset::Classic.config()).await.unwrap();
    let heavy = registry.start(Preset::ConsumerHeavy.config()).await.unwrap();

    tokio::time::sleep(Duration::from_secs(120)).await;

    let classic = registry.status(classic).await.unwrap();
    let heavy = registry.status(heavy).await.unwrap();

    assert!(classic.counters.lost > 0);
    assert!(classic.metrics.efficiency < 100.0);
    assert_eq!(heavy.counters.lost, 0);
    assert!(heavy.metrics.efficiency > 95.0);

    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_history_tracks_polls_over_time() {
    let registry = SimulationRegistry::new();
    let id = registry
        .start(create_timed_config(1000, 1500, 10))
        .await
        .unwrap();

    let mut snapshot = None;
    for _ in 0..40 {
        tokio::time::sleep(Duration::from_millis(3000)).await;
        snapshot = Some(registry.status(id).await.unwrap());
    }

    let snapshot = snapshot.unwrap();
    assert_eq!(snapshot.history.len(), 30);
    assert_snapshot_invariants(&snapshot);

    // Newest sample is the observation that produced this snapshot
    let last = snapshot.history.last().unwrap();
    assert_eq!(last.buffer_size, snapshot.buffer_size);

    registry.stop(id).await.unwrap();
}
