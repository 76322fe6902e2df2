// src/travelers/normal.rs
//! Normal traveler: random walk with a deadlock timer
//!
//! ```text
//! Initializing ──placed──▶ Moving ──budget spent──▶ Done
//!      │                    │  │
//!      └──trapped──┐        │  └──no move within window──▶ Deadlocked
//!                  ▼        │
//!               Trapped ◀───┘
//! ```

use crate::grid::{Identity, Occupant, Position, Response, TravelerKind};
use crate::travelers::{lowercase, place, TravelerContext, TravelerCore};
use crate::utils::rng::SimRng;
use tokio::time::{sleep, timeout};
use tracing::debug;

/// How a single movement attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MoveOutcome {
    Moved(Position),
    Captured,
}

#[derive(Debug)]
pub struct NormalTraveler {
    core: TravelerCore,
    identity: Identity,
    steps: u32,
    rng: SimRng,
    ctx: TravelerContext,
}

impl NormalTraveler {
    /// Draw a step budget and place the traveler on a random free cell
    ///
    /// Landing on a trap leaves the traveler Trapped and off the board.
    pub async fn init(identity: Identity, ctx: TravelerContext, mut rng: SimRng) -> Self {
        let steps = rng.steps(ctx.steps.min_steps, ctx.steps.max_steps);
        let mut core = TravelerCore::new(identity, TravelerKind::Normal, ctx.clock);

        let occupant = Occupant::Normal { identity };
        let (position, response) = place(&ctx.grid, &occupant, &mut rng).await;
        core.status = response;
        core.position = match response {
            Response::Trapped => {
                debug!("Traveler {} trapped while being placed", identity.id);
                ctx.grid.dimensions().vanished()
            }
            _ => position,
        };
        core.record_step();

        debug!(
            "Traveler {} ({}) placed at {} with {} steps",
            identity.id, identity.symbol, core.position, steps
        );

        Self {
            core,
            identity,
            steps,
            rng,
            ctx,
        }
    }

    pub fn core(&self) -> &TravelerCore {
        &self.core
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Walk until the budget is spent, the traveler is trapped, or it deadlocks
    pub async fn run(mut self) {
        let window = self.ctx.timing.deadlock_window();

        for _ in 0..self.steps {
            if matches!(self.core.status, Response::Trapped | Response::Deadlocked) {
                break;
            }

            let delay = self
                .rng
                .delay(self.ctx.timing.min_delay(), self.ctx.timing.max_delay());
            sleep(delay).await;

            let previous = self.core.position;
            match timeout(window, self.attempt_move()).await {
                Ok(MoveOutcome::Moved(target)) => {
                    self.ctx.grid.cell(previous).leave(self.core.id);
                    self.core.position = target;
                    self.core.status = Response::Success;
                }
                Ok(MoveOutcome::Captured) => {
                    self.ctx.grid.cell(previous).leave(self.core.id);
                    self.core.position = self.ctx.grid.dimensions().vanished();
                    self.core.status = Response::Trapped;
                    debug!("Traveler {} trapped next to {}", self.core.id, previous);
                }
                Err(_) => {
                    // The abandoned acquire may have been admitted just before
                    // the timer fired. Cells not holding this traveler ignore the Leave.
                    for neighbor in previous.distinct_neighbors(self.ctx.grid.dimensions()) {
                        self.ctx.grid.cell(neighbor).leave(self.core.id);
                    }
                    self.core.status = Response::Deadlocked;
                    self.core.symbol = lowercase(self.core.symbol);
                    debug!(
                        "Traveler {} deadlocked at {} after {:?}",
                        self.core.id, previous, window
                    );
                }
            }

            self.core.record_step();
        }

        self.core.finish(&self.ctx.traces);
    }

    /// Retry random directions until a neighbor cell answers something other than Fail
    async fn attempt_move(&mut self) -> MoveOutcome {
        let dims = self.ctx.grid.dimensions();
        let occupant = Occupant::Normal {
            identity: self.identity,
        };

        loop {
            let target = self.core.position.step(self.rng.direction(), dims);
            match self.ctx.grid.cell(target).acquire(occupant.clone()).await {
                Response::Success => return MoveOutcome::Moved(target),
                Response::Trapped => return MoveOutcome::Captured,
                _ => sleep(self.ctx.timing.retry_pause()).await,
            }
        }
    }
}
