//! Derived simulation metrics
//!
//! Nothing in here is maintained continuously. Every status query feeds the
//! current counters into [`MetricsCollector::observe`], which derives the
//! rates and appends one sample to a fixed-size history ring.
//!
//! ```text
//! throughput = consumed / elapsed_secs        (0 while elapsed < 1ms)
//! efficiency = consumed / produced * 100      (0 while produced == 0)
//! loss_rate  = lost / produced * 100          (0 while produced == 0)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::Counters;

/// Number of samples kept for trend display
pub const HISTORY_CAPACITY: usize = 30;

/// Below this, elapsed time counts as zero
const MIN_ELAPSED_SECS: f64 = 0.001;

/// Fill percentage at which the buffer counts as half full
const MEDIUM_FILL_THRESHOLD: f64 = 50.0;

/// Fill percentage at which the buffer counts as nearly full
const HIGH_FILL_THRESHOLD: f64 = 80.0;

/// Consumed items per elapsed second
pub fn throughput(consumed: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs < MIN_ELAPSED_SECS {
        return 0.0;
    }
    consumed as f64 / elapsed_secs
}

/// Percentage of produced items that were consumed
pub fn efficiency(consumed: u64, produced: u64) -> f64 {
    if produced == 0 {
        return 0.0;
    }
    (consumed as f64 / produced as f64 * 100.0).clamp(0.0, 100.0)
}

/// Percentage of production attempts that were lost
pub fn loss_rate(lost: u64, produced: u64) -> f64 {
    if produced == 0 {
        return 0.0;
    }
    (lost as f64 / produced as f64 * 100.0).clamp(0.0, 100.0)
}

pub fn fill_percentage(size: usize, capacity: usize) -> f64 {
    if capacity == 0 {
        return 0.0;
    }
    size as f64 / capacity as f64 * 100.0
}

/// Coarse buffer occupancy for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillLevel {
    Low,
    Medium,
    High,
}

impl FillLevel {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= HIGH_FILL_THRESHOLD {
            FillLevel::High
        } else if percentage >= MEDIUM_FILL_THRESHOLD {
            FillLevel::Medium
        } else {
            FillLevel::Low
        }
    }
}

/// One point of the rolling history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySample {
    pub timestamp: DateTime<Utc>,
    pub buffer_size: usize,
    pub throughput: f64,
}

/// Metrics derived from one observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub elapsed_secs: f64,
    pub throughput: f64,
    pub efficiency: f64,
    pub loss_rate: f64,
    pub fill_percentage: f64,
    pub fill_level: FillLevel,
}

/// Fixed-capacity ring of history samples
///
/// Slots are allocated once; the write position only grows and the slot index
/// is `pos % capacity`, so a push into a full ring overwrites the oldest sample.
#[derive(Debug, Clone)]
pub struct HistoryRing<T> {
    slots: Vec<Option<T>>,
    write_pos: u64,
}

impl<T: Clone> HistoryRing<T> {
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "HistoryRing capacity must be > 0");
        Self {
            slots: vec![None; capacity],
            write_pos: 0,
        }
    }

    /// Store a value, returning the one it displaced (if any)
    pub fn push(&mut self, value: T) -> Option<T> {
        let slot_idx = (self.write_pos % self.slots.len() as u64) as usize;
        self.write_pos += 1;
        self.slots[slot_idx].replace(value)
    }

    pub fn len(&self) -> usize {
        (self.write_pos as usize).min(self.slots.len())
    }

    pub fn is_empty(&self) -> bool {
        self.write_pos == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Most recently pushed value
    pub fn latest(&self) -> Option<&T> {
        if self.write_pos == 0 {
            return None;
        }
        let slot_idx = ((self.write_pos - 1) % self.slots.len() as u64) as usize;
        self.slots[slot_idx].as_ref()
    }

    /// Values from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let capacity = self.slots.len() as u64;
        let start = self.write_pos.saturating_sub(capacity);
        (start..self.write_pos).filter_map(move |pos| self.slots[(pos % capacity) as usize].as_ref())
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

/// Derives metrics for one simulation and keeps its rolling history
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    started_at: Instant,
    history: HistoryRing<HistorySample>,
}

impl MetricsCollector {
    pub fn new(started_at: Instant) -> Self {
        Self {
            started_at,
            history: HistoryRing::new(HISTORY_CAPACITY),
        }
    }

    /// Observe the simulation now
    pub fn observe(&mut self, counters: &Counters, buffer_size: usize, capacity: usize) -> DerivedMetrics {
        self.observe_at(Instant::now(), Utc::now(), counters, buffer_size, capacity)
    }

    /// Observe the simulation at a given instant
    ///
    /// `now` drives elapsed time, `timestamp` labels the history sample. The
    /// sample timestamp never goes backwards, even if the wall clock does.
    pub fn observe_at(
        &mut self,
        now: Instant,
        timestamp: DateTime<Utc>,
        counters: &Counters,
        buffer_size: usize,
        capacity: usize,
    ) -> DerivedMetrics {
        let elapsed_secs = now.saturating_duration_since(self.started_at).as_secs_f64();
        let fill = fill_percentage(buffer_size, capacity);

        let metrics = DerivedMetrics {
            elapsed_secs,
            throughput: throughput(counters.consumed, elapsed_secs),
            efficiency: efficiency(counters.consumed, counters.produced),
            loss_rate: loss_rate(counters.lost, counters.produced),
            fill_percentage: fill,
            fill_level: FillLevel::from_percentage(fill),
        };

        let timestamp = match self.history.latest() {
            Some(last) if last.timestamp > timestamp => last.timestamp,
            _ => timestamp,
        };

        self.history.push(HistorySample {
            timestamp,
            buffer_size,
            throughput: metrics.throughput,
        });

        metrics
    }

    pub fn history(&self) -> Vec<HistorySample> {
        self.history.to_vec()
    }
}
