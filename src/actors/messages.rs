//! Message types for actor communication
//!
//! ## Design Principles
//!
//! 1. **Commands**: Every change to a simulation arrives as a message in its mailbox
//! 2. **Request/Response**: oneshot channels carry answers back to the caller
//! 3. **Snapshots**: Status is copied out, never shared by reference

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::config::SimulationConfig;
use crate::metrics::{DerivedMetrics, HistorySample};
use crate::{Counters, Item, SimulationId, SimulationStatus};

/// Which side of the buffer an actor drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Producer,
    Consumer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Producer => write!(f, "producer"),
            Role::Consumer => write!(f, "consumer"),
        }
    }
}

/// What a single tick did to the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Producer tick, item accepted
    Inserted(Item),

    /// Producer tick, buffer was full
    Lost(Item),

    /// Consumer tick, item removed
    Consumed(Item),

    /// Consumer tick, buffer was empty
    Empty,
}

/// Commands handled by a SimulationActor
#[derive(Debug)]
pub enum SimulationCommand {
    /// Run one producer or consumer step
    ///
    /// Rate actors send these without a responder on every timer tick.
    Tick {
        role: Role,
        respond_to: Option<oneshot::Sender<TickOutcome>>,
    },

    /// Derive metrics and return a snapshot
    ///
    /// Appends one sample to the history as a side effect.
    GetStatus {
        respond_to: oneshot::Sender<StatusSnapshot>,
    },

    /// Stop the rate actors, release the buffer and exit
    ///
    /// Answers with the final counters.
    Stop { respond_to: oneshot::Sender<Counters> },
}

/// Commands that can be sent to a RateActor
#[derive(Debug)]
pub enum RateCommand {
    /// Fire one tick immediately, independent of the timer
    ///
    /// Answers whether the tick reached the simulation.
    TickNow { respond_to: oneshot::Sender<bool> },

    /// Cancel the timer for good
    Shutdown,
}

/// Point-in-time view of one simulation
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub id: SimulationId,

    pub config: SimulationConfig,

    pub status: SimulationStatus,

    #[serde(flatten)]
    pub counters: Counters,

    pub buffer_size: usize,

    pub buffer_capacity: usize,

    /// Labels of the buffered items, oldest first
    pub buffer_items: Vec<String>,

    #[serde(flatten)]
    pub metrics: DerivedMetrics,

    /// At most 30 samples, oldest first
    pub history: Vec<HistorySample>,

    pub taken_at: DateTime<Utc>,
}
