//! Actor-based simulation engine
//!
//! Each simulation runs as three independent async tasks communicating via
//! Tokio channels.
//!
//! ## Architecture Overview
//!
//! ```text
//!                  ┌───────────────────────┐
//!                  │  SimulationRegistry   │
//!                  └───────────┬───────────┘
//!                              │ spawns, one per id
//!                  ┌───────────▼───────────┐
//!                  │   SimulationActor     │◄──── GetStatus / Stop
//!                  │ buffer + counters +   │      (SimulationHandle)
//!                  │ metrics history       │
//!                  └───▲───────────────▲───┘
//!                      │ Tick          │ Tick
//!              ┌───────┴──────┐ ┌──────┴───────┐
//!              │ RateActor    │ │ RateActor    │
//!              │ (producer)   │ │ (consumer)   │
//!              └──────────────┘ └──────────────┘
//! ```
//!
//! ## Actor Types
//!
//! - **RateActor**: Fires ticks for one side of the buffer at a fixed interval
//! - **SimulationActor**: Serializes ticks and status reads of one simulation
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: Each actor has an mpsc command channel
//! 2. **Request/Response**: oneshot channels for queries and manual ticks

pub mod messages;
pub mod rate;
pub mod simulation;

pub use messages::{Role, StatusSnapshot, TickOutcome};
pub use simulation::SimulationHandle;
