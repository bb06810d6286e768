//! SimulationActor - Owns one running producer-consumer simulation
//!
//! ## Architecture
//!
//! The actor is the single owner of the buffer, the counters and the metrics
//! history of one simulation. Nothing else ever touches them:
//!
//! ```text
//!   ┌───────────────┐   Tick(producer)
//!   │ Producer rate ├──────────────┐
//!   └───────────────┘              │
//!   ┌───────────────┐   Tick(consumer)   ┌──────────────────┐
//!   │ Consumer rate ├──────────────┼────►│ SimulationActor  │
//!   └───────────────┘              │     │ (buffer,counters)│
//!   ┌───────────────┐  GetStatus/Stop    └──────────────────┘
//!   │ Handles       ├──────────────┘
//!   └───────────────┘
//! ```
//!
//! Because the mailbox is drained one message at a time, a producer tick
//! records `produced`, the insert attempt and a possible `lost` as one step,
//! and a status read always sees a consistent set of counters.
//!
//! ## Ordering
//!
//! Ticks are applied in mailbox arrival order. A producer tick is decided
//! against the buffer as it is when that tick is dequeued; a consumer tick
//! that arrived first has already freed its slot.
//!
//! ## Lifecycle
//!
//! Running on spawn. `Stop` cancels both rate actors, closes the buffer and
//! ends the loop, which drops the mailbox so no later tick is ever applied.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, instrument, trace, warn};

use crate::buffer::BufferBackend;
use crate::config::SimulationConfig;
use crate::error::{SimulationError, SimulationResult};
use crate::metrics::MetricsCollector;
use crate::{Counters, Item, SimulationId, SimulationStatus};

use super::messages::{Role, SimulationCommand, StatusSnapshot, TickOutcome};
use super::rate::RateHandle;

/// Pending messages per simulation before senders wait
const MAILBOX_CAPACITY: usize = 32;

/// Actor owning the state of one simulation
pub struct SimulationActor {
    id: SimulationId,

    config: SimulationConfig,

    buffer: Box<dyn BufferBackend>,

    counters: Counters,

    /// Sequence number of the last produced item
    last_seq: u64,

    metrics: MetricsCollector,

    status: SimulationStatus,

    command_rx: mpsc::Receiver<SimulationCommand>,

    producer: RateHandle,

    consumer: RateHandle,
}

impl SimulationActor {
    pub fn new(
        id: SimulationId,
        config: SimulationConfig,
        buffer: Box<dyn BufferBackend>,
        command_rx: mpsc::Receiver<SimulationCommand>,
        producer: RateHandle,
        consumer: RateHandle,
    ) -> Self {
        debug!(
            "creating simulation {id} ({} buffer, capacity {})",
            buffer.kind(),
            buffer.capacity()
        );

        Self {
            id,
            config,
            buffer,
            counters: Counters::default(),
            last_seq: 0,
            metrics: MetricsCollector::new(Instant::now()),
            status: SimulationStatus::Running,
            command_rx,
            producer,
            consumer,
        }
    }

    /// Run the actor's main loop
    ///
    /// Runs until a Stop command is received or every handle is dropped.
    #[instrument(skip(self), fields(simulation = %self.id))]
    pub async fn run(mut self) {
        debug!("starting simulation actor");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                SimulationCommand::Tick { role, respond_to } => {
                    let outcome = self.tick(role).await;
                    if let Some(respond_to) = respond_to {
                        let _ = respond_to.send(outcome);
                    }
                }

                SimulationCommand::GetStatus { respond_to } => {
                    let snapshot = self.snapshot().await;
                    let _ = respond_to.send(snapshot);
                }

                SimulationCommand::Stop { respond_to } => {
                    debug!("received stop command");
                    self.stop().await;
                    let _ = respond_to.send(self.counters);
                    break;
                }
            }
        }

        if self.status == SimulationStatus::Running {
            warn!("all handles dropped, stopping");
            self.stop().await;
        }

        debug!("simulation actor stopped");
    }

    /// Apply one producer or consumer step
    async fn tick(&mut self, role: Role) -> TickOutcome {
        match role {
            Role::Producer => {
                self.last_seq += 1;
                let item = Item::new(self.last_seq);
                self.counters.produced += 1;

                if self.buffer.try_insert(item).await {
                    trace!("produced {item}");
                    TickOutcome::Inserted(item)
                } else {
                    self.counters.lost += 1;
                    trace!("lost {item} (total lost: {})", self.counters.lost);
                    TickOutcome::Lost(item)
                }
            }

            Role::Consumer => match self.buffer.try_remove().await {
                Some(item) => {
                    self.counters.consumed += 1;
                    trace!("consumed {item}");
                    TickOutcome::Consumed(item)
                }
                None => {
                    trace!("buffer empty, nothing to consume");
                    TickOutcome::Empty
                }
            },
        }
    }

    /// Derive metrics and build a snapshot
    async fn snapshot(&mut self) -> StatusSnapshot {
        let buffer_size = self.buffer.size().await;
        let buffer_capacity = self.buffer.capacity();
        let buffer_items = self
            .buffer
            .items()
            .await
            .iter()
            .map(Item::label)
            .collect();

        let metrics = self
            .metrics
            .observe(&self.counters, buffer_size, buffer_capacity);

        StatusSnapshot {
            id: self.id,
            config: self.config.clone(),
            status: self.status,
            counters: self.counters,
            buffer_size,
            buffer_capacity,
            buffer_items,
            metrics,
            history: self.metrics.history(),
            taken_at: Utc::now(),
        }
    }

    /// Transition Running → Stopped
    ///
    /// Only the first call has an effect.
    async fn stop(&mut self) {
        if self.status == SimulationStatus::Stopped {
            return;
        }
        self.status = SimulationStatus::Stopped;

        self.producer.shutdown();
        self.consumer.shutdown();
        self.command_rx.close();
        self.buffer.close().await;

        info!(
            "simulation stopped: produced={} consumed={} lost={}",
            self.counters.produced, self.counters.consumed, self.counters.lost
        );
    }
}

/// Handle for controlling a SimulationActor
///
/// Cheap to clone. Every method answers `NotFound` once the simulation has
/// stopped.
#[derive(Clone, Debug)]
pub struct SimulationHandle {
    sender: mpsc::Sender<SimulationCommand>,

    id: SimulationId,
}

impl SimulationHandle {
    /// Spawn the simulation actor and its two rate actors
    ///
    /// The simulation is Running as soon as this returns.
    pub fn spawn(id: SimulationId, config: SimulationConfig, buffer: Box<dyn BufferBackend>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(MAILBOX_CAPACITY);

        let producer = RateHandle::spawn(
            id,
            Role::Producer,
            Duration::from_millis(config.producer_interval_ms),
            cmd_tx.downgrade(),
        );
        let consumer = RateHandle::spawn(
            id,
            Role::Consumer,
            Duration::from_millis(config.consumer_interval_ms),
            cmd_tx.downgrade(),
        );

        let actor = SimulationActor::new(id, config, buffer, cmd_rx, producer, consumer);

        tokio::spawn(actor.run());

        Self { sender: cmd_tx, id }
    }

    pub fn id(&self) -> SimulationId {
        self.id
    }

    /// Run one step for `role` right now, outside the timer
    pub async fn tick_now(&self, role: Role) -> SimulationResult<TickOutcome> {
        let (tx, rx) = oneshot::channel();
        self.send(SimulationCommand::Tick {
            role,
            respond_to: Some(tx),
        })
        .await?;

        rx.await.map_err(|_| SimulationError::NotFound(self.id))
    }

    /// Take a status snapshot
    pub async fn status(&self) -> SimulationResult<StatusSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(SimulationCommand::GetStatus { respond_to: tx })
            .await?;

        rx.await.map_err(|_| SimulationError::NotFound(self.id))
    }

    /// Stop the simulation and return its final counters
    pub async fn stop(&self) -> SimulationResult<Counters> {
        let (tx, rx) = oneshot::channel();
        self.send(SimulationCommand::Stop { respond_to: tx }).await?;

        rx.await.map_err(|_| SimulationError::NotFound(self.id))
    }

    /// Whether the actor has gone away
    pub fn is_stopped(&self) -> bool {
        self.sender.is_closed()
    }

    async fn send(&self, cmd: SimulationCommand) -> SimulationResult<()> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| SimulationError::NotFound(self.id))
    }
}
