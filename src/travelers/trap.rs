// src/travelers/trap.rs
//! Trap traveler: a stationary occupant that captures whoever walks in
//!
//! The cell a trap occupies forwards every Acquire to the trap's capture
//! inbox and relays the trap's verdict. Traps run until the simulation
//! cancels them.

use crate::grid::{CaptureRequest, Identity, Occupant, Relocation, Response, TravelerKind};
use crate::travelers::{
    lowercase, place, TravelerContext, TravelerCore, CAPTURED_WILD_GLYPH, TRAP_GLYPH,
};
use crate::utils::rng::SimRng;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug)]
pub struct TrapTraveler {
    core: TravelerCore,
    captures: mpsc::Receiver<CaptureRequest>,
    shutdown: CancellationToken,
    ctx: TravelerContext,
}

impl TrapTraveler {
    /// Place the trap on a random free cell
    pub async fn init(
        id: usize,
        ctx: TravelerContext,
        mut rng: SimRng,
        shutdown: CancellationToken,
    ) -> Self {
        let identity = Identity::new(id, TRAP_GLYPH);
        let mut core = TravelerCore::new(identity, TravelerKind::Trap, ctx.clock);
        let (capture_tx, captures) = mpsc::channel(ctx.timing.capture_inbox_capacity);

        let occupant = Occupant::Trap {
            identity,
            captures: capture_tx,
        };
        let (position, response) = place(&ctx.grid, &occupant, &mut rng).await;
        core.position = position;
        core.status = response;
        core.record_step();

        debug!("Trap {} placed at {}", id, position);

        Self {
            core,
            captures,
            shutdown,
            ctx,
        }
    }

    pub fn core(&self) -> &TravelerCore {
        &self.core
    }

    /// Serve forwarded Acquires until cancelled
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                Some(request) = self.captures.recv() => self.handle_capture(request).await,
                else => break,
            }
        }

        debug!("Trap {} stopped", self.core.id);
        self.core.finish(&self.ctx.traces);
    }

    async fn handle_capture(&mut self, request: CaptureRequest) {
        let response = match request.requester {
            Occupant::Normal { identity } => {
                self.core.status = Response::Trapped;
                self.core.symbol = lowercase(identity.symbol);
                debug!("Trap {} captured traveler {}", self.core.id, identity.id);
                Response::Trapped
            }
            Occupant::Wild {
                identity,
                relocations,
            } => {
                let capture = Relocation {
                    position: self.ctx.grid.dimensions().vanished(),
                    status: Response::Trapped,
                };
                match relocations
                    .send_timeout(capture, self.ctx.timing.capture_push_timeout())
                    .await
                {
                    Ok(()) => {
                        self.core.status = Response::Trapped;
                        self.core.symbol = CAPTURED_WILD_GLYPH;
                        debug!("Trap {} captured wild traveler {}", self.core.id, identity.id);
                        Response::Trapped
                    }
                    Err(_) => {
                        debug!(
                            "Trap {} gave up capturing unresponsive wild traveler {}",
                            self.core.id, identity.id
                        );
                        Response::Fail
                    }
                }
            }
            Occupant::Trap { .. } => Response::Fail,
        };

        let _ = request.reply.send(response);

        if response == Response::Trapped {
            self.core.record_step();
            sleep(self.ctx.timing.trap_dwell()).await;
            self.core.symbol = TRAP_GLYPH;
            self.core.record_step();
        }
    }
}
