//! Error types for simulation operations

use std::fmt;

use crate::SimulationId;

/// Result type alias for registry and instance operations
pub type SimulationResult<T> = Result<T, SimulationError>;

/// Errors that can occur when controlling simulations
///
/// A full buffer, an empty buffer or zero elapsed time are normal outcomes
/// and never show up here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    /// Zero interval or zero capacity at start time
    InvalidConfiguration(String),

    /// Unknown or already stopped simulation
    NotFound(SimulationId),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::InvalidConfiguration(msg) => {
                write!(f, "invalid simulation configuration: {}", msg)
            }
            SimulationError::NotFound(id) => write!(f, "simulation {} not found", id),
        }
    }
}

impl std::error::Error for SimulationError {}
