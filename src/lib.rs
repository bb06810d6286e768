pub mod actors;
pub mod buffer;
pub mod config;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod util;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use error::{SimulationError, SimulationResult};
pub use registry::SimulationRegistry;

/// Opaque identifier of a simulation instance
///
/// Allocated by a [`SimulationRegistry`] from a monotonically increasing counter,
/// so an id is never handed out twice by the same registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimulationId(pub u64);

impl fmt::Display for SimulationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sim-{}", self.0)
    }
}

/// A unit of work moving through the buffer
///
/// Items carry no payload; the sequence number assigned by the producer is
/// their whole identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub seq: u64,
}

impl Item {
    pub fn new(seq: u64) -> Self {
        Self { seq }
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Item {}", self.seq)
    }
}

/// Cumulative event counts of one simulation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    /// Every production attempt, accepted or not
    pub produced: u64,

    /// Every successful removal
    pub consumed: u64,

    /// Production attempts rejected by a full buffer
    pub lost: u64,
}

impl Counters {
    /// Number of items that actually made it into the buffer
    pub fn accepted(&self) -> u64 {
        self.produced - self.lost
    }
}

/// Lifecycle state of a simulation instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationStatus {
    Running,
    Stopped,
}

impl fmt::Display for SimulationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationStatus::Running => write!(f, "running"),
            SimulationStatus::Stopped => write!(f, "stopped"),
        }
    }
}
