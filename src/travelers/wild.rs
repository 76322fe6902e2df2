// src/travelers/wild.rs
//! Wild traveler: appears, gets pushed around, vanishes
//!
//! A wild traveler never moves on its own. Once placed it only waits on its
//! relocation inbox, where cell actors push forced moves (displacement) and
//! traps push captures. The inbox is the one channel through which another
//! task hands state to a traveler; the traveler alone applies it.

use crate::grid::{Identity, Occupant, Relocation, Response, TravelerKind};
use crate::travelers::{place, TravelerContext, TravelerCore};
use crate::utils::rng::SimRng;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, timeout};
use tracing::debug;

#[derive(Debug)]
pub struct WildTraveler {
    core: TravelerCore,
    identity: Identity,

    /// Emergence time, relative to simulation start
    emerge_at: Duration,

    /// Vanish time, relative to simulation start
    vanish_at: Duration,

    relocation_tx: mpsc::Sender<Relocation>,
    relocations: mpsc::Receiver<Relocation>,
    rng: SimRng,
    ctx: TravelerContext,
}

impl WildTraveler {
    /// Schedule emergence and vanishing; placement happens once started
    pub fn init(identity: Identity, ctx: TravelerContext, mut rng: SimRng) -> Self {
        let timing = &ctx.timing;
        let max_steps = ctx.steps.max_steps;

        let emerge_window =
            (timing.max_delay().saturating_sub(timing.min_delay()) / 2).saturating_mul(max_steps);
        let horizon = timing.max_delay().saturating_mul(max_steps);
        let emerge_at = rng.duration_below(emerge_window);
        let vanish_at =
            emerge_at.saturating_add(rng.duration_below(horizon.saturating_sub(emerge_at)));

        let (relocation_tx, relocations) = mpsc::channel(timing.relocation_inbox_capacity);

        Self {
            core: TravelerCore::new(identity, TravelerKind::Wild, ctx.clock),
            identity,
            emerge_at,
            vanish_at,
            relocation_tx,
            relocations,
            rng,
            ctx,
        }
    }

    /// Override the schedule, e.g. for scripted runs
    pub fn with_schedule(mut self, emerge_at: Duration, vanish_at: Duration) -> Self {
        self.emerge_at = emerge_at;
        self.vanish_at = vanish_at.max(emerge_at);
        self
    }

    pub fn core(&self) -> &TravelerCore {
        &self.core
    }

    pub fn emerge_at(&self) -> Duration {
        self.emerge_at
    }

    pub fn vanish_at(&self) -> Duration {
        self.vanish_at
    }

    fn occupant(&self) -> Occupant {
        Occupant::Wild {
            identity: self.identity,
            relocations: self.relocation_tx.clone(),
        }
    }

    pub async fn run(mut self) {
        sleep_until(self.ctx.clock.at(self.emerge_at)).await;

        let occupant = self.occupant();
        let window = self.ctx.timing.deadlock_window();
        let placed = timeout(window, place(&self.ctx.grid, &occupant, &mut self.rng)).await;
        drop(occupant);

        let (position, response) = match placed {
            Ok(placed) => placed,
            Err(_) => (self.ctx.grid.dimensions().vanished(), Response::Deadlocked),
        };
        self.core.status = response;
        if response != Response::Success {
            self.core.position = self.ctx.grid.dimensions().vanished();
            self.core.record_step();
            debug!(
                "Wild traveler {} could not emerge: {:?}",
                self.core.id, response
            );
            self.core.finish(&self.ctx.traces);
            return;
        }

        self.core.position = position;
        self.core.record_step();
        debug!("Wild traveler {} emerged at {}", self.core.id, position);

        if !self.roam().await {
            self.vanish().await;
        }

        self.core.finish(&self.ctx.traces);
    }

    /// Follow pushed relocations until captured (`true`) or the vanish time (`false`)
    async fn roam(&mut self) -> bool {
        let deadline = self.ctx.clock.at(self.vanish_at);

        loop {
            tokio::select! {
                relocation = self.relocations.recv() => match relocation {
                    Some(relocation) => {
                        if self.apply(relocation) {
                            return true;
                        }
                    }
                    None => return false,
                },
                _ = sleep_until(deadline) => return false,
            }
        }
    }

    /// Stop accepting relocations, apply those already queued, then leave the board
    async fn vanish(&mut self) {
        self.relocations.close();
        while let Some(relocation) = self.relocations.recv().await {
            if self.apply(relocation) {
                return;
            }
        }

        self.ctx.grid.cell(self.core.position).leave(self.core.id);
        self.core.position = self.ctx.grid.dimensions().vanished();
        self.core.record_step();
        debug!("Wild traveler {} vanished", self.core.id);
    }

    /// Adopt a pushed position and status; `true` when it was a capture
    fn apply(&mut self, relocation: Relocation) -> bool {
        self.core.position = relocation.position;
        self.core.status = relocation.status;
        self.core.record_step();

        let captured = relocation.status == Response::Trapped;
        if captured {
            debug!("Wild traveler {} captured", self.core.id);
        }
        captured
    }
}
