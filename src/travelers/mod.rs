// src/travelers/mod.rs
//! Traveler state machines
//!
//! Three kinds of traveler move across the grid, each as its own task:
//!
//! - **Normal**: takes random steps; never yields its cell
//! - **Wild**: appears and vanishes on a timer; only moves when a cell pushes it
//! - **Trap**: stationary; captures normal and wild travelers that walk in
//!
//! Every traveler is created (and, for normal and trap travelers, placed)
//! before any is started. A traveler's trace is touched only by its own task
//! and leaves it exactly once, on termination.

pub mod normal;
pub mod trap;
pub mod wild;

pub use normal::NormalTraveler;
pub use trap::TrapTraveler;
pub use wild::WildTraveler;

use crate::grid::{Grid, Identity, Occupant, Position, Response, TravelerId, TravelerKind};
use crate::recording::{TraceRecord, TraceSender, TravelerTrace};
use crate::utils::config::{StepConfig, TimingConfig};
use crate::utils::rng::SimRng;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::trace;

/// Glyph shown by an idle trap
pub const TRAP_GLYPH: char = '#';

/// Glyph shown by a trap that has just captured a wild traveler
pub const CAPTURED_WILD_GLYPH: char = '*';

/// Simulation start, shared by every traveler for trace timestamps
#[derive(Debug, Clone, Copy)]
pub struct SimClock {
    start: Instant,
}

impl SimClock {
    pub fn start_now() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Instant `offset` after simulation start
    pub fn at(&self, offset: Duration) -> Instant {
        self.start + offset
    }
}

/// What every traveler task needs from the simulation
#[derive(Debug, Clone)]
pub struct TravelerContext {
    pub grid: Grid,
    pub timing: TimingConfig,
    pub steps: StepConfig,
    pub clock: SimClock,
    pub traces: TraceSender,
}

/// State shared by all traveler kinds
#[derive(Debug)]
pub struct TravelerCore {
    pub id: TravelerId,
    pub kind: TravelerKind,

    /// Currently displayed glyph
    pub symbol: char,
    pub position: Position,
    pub status: Response,

    clock: SimClock,
    records: Vec<TraceRecord>,
}

impl TravelerCore {
    fn new(identity: Identity, kind: TravelerKind, clock: SimClock) -> Self {
        Self {
            id: identity.id,
            kind,
            symbol: identity.symbol,
            position: Position::new(0, 0),
            status: Response::Pending,
            clock,
            records: Vec::new(),
        }
    }

    /// Append the current position and glyph to the trace
    pub fn record_step(&mut self) {
        self.records.push(TraceRecord {
            elapsed: self.clock.elapsed(),
            id: self.id,
            position: self.position,
            symbol: self.symbol,
        });
    }

    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    /// Move the trace out to the sink
    fn finish(self, traces: &TraceSender) {
        trace!(
            "Traveler {} finished with {:?} after {} records",
            self.id,
            self.status,
            self.records.len()
        );
        traces.deliver(TravelerTrace {
            id: self.id,
            kind: self.kind,
            outcome: self.status,
            records: self.records,
        });
    }
}

/// Any traveler, ready to start
#[derive(Debug)]
pub enum Traveler {
    Normal(NormalTraveler),
    Wild(WildTraveler),
    Trap(TrapTraveler),
}

impl Traveler {
    pub fn id(&self) -> TravelerId {
        match self {
            Traveler::Normal(t) => t.core().id,
            Traveler::Wild(t) => t.core().id,
            Traveler::Trap(t) => t.core().id,
        }
    }

    pub fn kind(&self) -> TravelerKind {
        match self {
            Traveler::Normal(_) => TravelerKind::Normal,
            Traveler::Wild(_) => TravelerKind::Wild,
            Traveler::Trap(_) => TravelerKind::Trap,
        }
    }

    /// Spawn the traveler's task; its trace is delivered when the task ends
    pub fn start(self) -> JoinHandle<()> {
        match self {
            Traveler::Normal(t) => tokio::spawn(t.run()),
            Traveler::Wild(t) => tokio::spawn(t.run()),
            Traveler::Trap(t) => tokio::spawn(t.run()),
        }
    }
}

/// Glyph `offset` places after `base`, e.g. `'A'` + 2 = `'C'`
pub fn symbol_at(base: char, offset: usize) -> char {
    u32::try_from(offset)
        .ok()
        .and_then(|offset| (base as u32).checked_add(offset))
        .and_then(char::from_u32)
        .unwrap_or('?')
}

/// Lower-case form of a glyph, or the glyph itself
pub fn lowercase(symbol: char) -> char {
    symbol.to_lowercase().next().unwrap_or(symbol)
}

/// Try random cells until one answers something other than Fail
pub(crate) async fn place(grid: &Grid, occupant: &Occupant, rng: &mut SimRng) -> (Position, Response) {
    loop {
        let position = rng.position(grid.dimensions());
        let response = grid.cell(position).acquire(occupant.clone()).await;
        if response != Response::Fail {
            return (position, response);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbols() {
        assert_eq!(symbol_at('A', 0), 'A');
        assert_eq!(symbol_at('A', 14), 'O');
        assert_eq!(symbol_at('0', 9), '9');
        assert_eq!(lowercase('Q'), 'q');
        assert_eq!(lowercase('#'), '#');
    }

    #[tokio::test]
    async fn test_record_step_keeps_order() {
        let mut core = TravelerCore::new(
            Identity::new(4, 'E'),
            TravelerKind::Normal,
            SimClock::start_now(),
        );

        core.position = Position::new(1, 1);
        core.record_step();
        core.position = Position::new(1, 2);
        core.symbol = 'e';
        core.record_step();

        let records = core.records();
        assert_eq!(records.len(), 2);
        assert!(records[0].elapsed <= records[1].elapsed);
        assert_eq!(records[1].position, Position::new(1, 2));
        assert_eq!(records[1].symbol, 'e');
        assert_eq!(core.status, Response::Pending);
    }
}
