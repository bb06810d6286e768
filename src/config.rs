use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{SimulationError, SimulationResult};

/// Backing store of a simulation's buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BufferKind {
    /// Plain in-process queue
    #[default]
    InMemory,

    /// Lists held in the registry's key-value store
    ExternalStore,
}

impl fmt::Display for BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferKind::InMemory => write!(f, "in-memory"),
            BufferKind::ExternalStore => write!(f, "external-store"),
        }
    }
}

impl FromStr for BufferKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in-memory" | "memory" | "queue" => Ok(BufferKind::InMemory),
            "external-store" | "external" | "kv" => Ok(BufferKind::ExternalStore),
            other => Err(format!("unknown buffer kind '{other}'")),
        }
    }
}

/// Configuration of a single simulation
///
/// Immutable once the simulation runs; a different configuration means
/// stopping and starting a new instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_producer_interval")]
    pub producer_interval_ms: u64,
    #[serde(default = "default_consumer_interval")]
    pub consumer_interval_ms: u64,
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
    #[serde(default)]
    pub buffer_kind: BufferKind,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            producer_interval_ms: default_producer_interval(),
            consumer_interval_ms: default_consumer_interval(),
            buffer_capacity: default_buffer_capacity(),
            buffer_kind: BufferKind::default(),
        }
    }
}

impl SimulationConfig {
    pub fn new(
        producer_interval_ms: u64,
        consumer_interval_ms: u64,
        buffer_capacity: usize,
        buffer_kind: BufferKind,
    ) -> Self {
        Self {
            producer_interval_ms,
            consumer_interval_ms,
            buffer_capacity,
            buffer_kind,
        }
    }

    /// Reject zero intervals and zero capacity
    pub fn validate(&self) -> SimulationResult<()> {
        if self.producer_interval_ms == 0 {
            return Err(SimulationError::InvalidConfiguration(
                "producer_interval_ms must be positive".to_string(),
            ));
        }
        if self.consumer_interval_ms == 0 {
            return Err(SimulationError::InvalidConfiguration(
                "consumer_interval_ms must be positive".to_string(),
            ));
        }
        if self.buffer_capacity == 0 {
            return Err(SimulationError::InvalidConfiguration(
                "buffer_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_producer_interval() -> u64 {
    1000
}

fn default_consumer_interval() -> u64 {
    1500
}

fn default_buffer_capacity() -> usize {
    10
}

/// Named interval pairs for common scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// Producer faster than consumer, the buffer fills up and items get lost
    Classic,
    /// Both sides at the same pace
    Balanced,
    /// Consumer faster than producer, the buffer stays near empty
    ConsumerHeavy,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Classic, Preset::Balanced, Preset::ConsumerHeavy];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Classic => "classic",
            Preset::Balanced => "balanced",
            Preset::ConsumerHeavy => "consumer-heavy",
        }
    }

    /// `(producer_interval_ms, consumer_interval_ms)`
    pub fn intervals(&self) -> (u64, u64) {
        match self {
            Preset::Classic => (1000, 1500),
            Preset::Balanced => (1000, 1000),
            Preset::ConsumerHeavy => (1500, 1000),
        }
    }

    pub fn config(&self) -> SimulationConfig {
        let (producer_interval_ms, consumer_interval_ms) = self.intervals();
        SimulationConfig {
            producer_interval_ms,
            consumer_interval_ms,
            ..SimulationConfig::default()
        }
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|preset| preset.name() == s)
            .ok_or_else(|| format!("unknown preset '{s}'"))
    }
}

/// One simulation as written in a config file
///
/// Fields left out fall back to the preset (if any), then to the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimulationEntry {
    pub preset: Option<Preset>,
    pub producer_interval_ms: Option<u64>,
    pub consumer_interval_ms: Option<u64>,
    pub buffer_capacity: Option<usize>,
    pub buffer_kind: Option<BufferKind>,
}

impl SimulationEntry {
    pub fn resolve(&self) -> SimulationConfig {
        let base = self
            .preset
            .map(|preset| preset.config())
            .unwrap_or_default();

        SimulationConfig {
            producer_interval_ms: self
                .producer_interval_ms
                .unwrap_or(base.producer_interval_ms),
            consumer_interval_ms: self
                .consumer_interval_ms
                .unwrap_or(base.consumer_interval_ms),
            buffer_capacity: self.buffer_capacity.unwrap_or(base.buffer_capacity),
            buffer_kind: self.buffer_kind.unwrap_or(base.buffer_kind),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub simulations: Option<Vec<SimulationEntry>>,

    /// Status poll cadence of the driver (defaults to the environment, then 3000ms)
    pub poll_interval_ms: Option<u64>,
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}
