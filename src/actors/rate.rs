//! RateActor - Drives one side of a simulation on a fixed timer
//!
//! A simulation owns two of these, a producer and a consumer. They never touch
//! the buffer themselves; every timer tick becomes a `Tick` message in the
//! simulation's mailbox, where it is applied in arrival order.
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → SimulationCommand::Tick { role } → SimulationActor mailbox
//!     ↑
//!     └─── Commands (TickNow, Shutdown)
//! ```
//!
//! The first tick fires one full interval after start. The actor only holds a
//! weak sender to the mailbox, so it winds down by itself once the simulation
//! is gone.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, instrument, trace, warn};

use crate::SimulationId;

use super::messages::{RateCommand, Role, SimulationCommand};

/// Actor firing ticks for one side of a simulation
pub struct RateActor {
    simulation: SimulationId,

    role: Role,

    period: Duration,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<RateCommand>,

    /// Mailbox of the owning simulation
    mailbox: mpsc::WeakSender<SimulationCommand>,

    /// Ticks delivered so far
    ticks: u64,
}

impl RateActor {
    pub fn new(
        simulation: SimulationId,
        role: Role,
        period: Duration,
        command_rx: mpsc::Receiver<RateCommand>,
        mailbox: mpsc::WeakSender<SimulationCommand>,
    ) -> Self {
        Self {
            simulation,
            role,
            period,
            command_rx,
            mailbox,
            ticks: 0,
        }
    }

    /// Run the actor's main loop
    ///
    /// Runs until:
    /// - A Shutdown command is received
    /// - The simulation mailbox is closed
    #[instrument(skip(self), fields(simulation = %self.simulation, role = %self.role))]
    pub async fn run(mut self) {
        debug!("starting rate actor every {:?}", self.period);

        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        RateCommand::TickNow { respond_to } => {
                            trace!("received TickNow command");
                            let delivered = self.fire().await;
                            let _ = respond_to.send(delivered);
                            if !delivered {
                                break;
                            }
                        }

                        RateCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                _ = ticker.tick() => {
                    if !self.fire().await {
                        debug!("simulation mailbox closed, shutting down");
                        break;
                    }
                }
            }
        }

        debug!("rate actor stopped after {} ticks", self.ticks);
    }

    /// Deliver one tick to the simulation
    ///
    /// Returns `false` once the simulation is gone.
    async fn fire(&mut self) -> bool {
        let Some(mailbox) = self.mailbox.upgrade() else {
            return false;
        };

        let cmd = SimulationCommand::Tick {
            role: self.role,
            respond_to: None,
        };

        if mailbox.send(cmd).await.is_err() {
            return false;
        }

        self.ticks += 1;
        trace!("tick #{} delivered", self.ticks);
        true
    }
}

/// Handle for controlling a RateActor
pub struct RateHandle {
    sender: mpsc::Sender<RateCommand>,

    task: JoinHandle<()>,

    pub role: Role,
}

impl RateHandle {
    /// Spawn a new rate actor feeding `mailbox`
    pub fn spawn(
        simulation: SimulationId,
        role: Role,
        period: Duration,
        mailbox: mpsc::WeakSender<SimulationCommand>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);

        let actor = RateActor::new(simulation, role, period, cmd_rx, mailbox);

        let task = tokio::spawn(actor.run());

        Self {
            sender: cmd_tx,
            task,
            role,
        }
    }

    /// Fire one tick right away
    ///
    /// Returns `false` if the actor or its simulation is gone.
    pub async fn tick_now(&self) -> bool {
        let (tx, rx) = oneshot::channel();
        if self
            .sender
            .send(RateCommand::TickNow { respond_to: tx })
            .await
            .is_err()
        {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    /// Cancel the timer
    ///
    /// Never waits: the simulation actor calls this from its own loop while
    /// the rate actor may be parked on a full mailbox. If the command cannot be
    /// queued the task is aborted instead.
    pub fn shutdown(&self) {
        if self.sender.try_send(RateCommand::Shutdown).is_err() {
            warn!("{} command channel unavailable, aborting task", self.role);
            self.task.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
