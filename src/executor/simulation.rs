// src/executor/simulation.rs
//! One complete simulation run
//!
//! Bootstrap order matters: the grid exists before any traveler, every
//! traveler is created before normal and wild travelers start, and traps are
//! only told to stop once every mobile traveler has reported.

use crate::grid::{Grid, Identity};
use crate::recording::{SimulationReport, TraceSink, TravelerTrace};
use crate::travelers::{
    symbol_at, NormalTraveler, SimClock, TrapTraveler, Traveler, TravelerContext, WildTraveler,
};
use crate::utils::config::EngineConfig;
use crate::utils::errors::Result;
use crate::utils::rng::SimRng;
use chrono::Utc;
use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use ulid::Ulid;

const NORMAL_SYMBOL_BASE: char = 'A';
const WILD_SYMBOL_BASE: char = '0';

/// Runs the grid arbitration simulation described by an [`EngineConfig`]
pub struct Simulation {
    config: EngineConfig,
}

impl Simulation {
    /// Create a simulation; the configuration is validated up front
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run to completion and return every traveler's trace
    pub async fn run(&self) -> Result<SimulationReport> {
        let run_id = Ulid::new().to_string();
        let started_at = Utc::now();
        let counts = &self.config.travelers;
        let dims = self.config.grid.dimensions();

        info!(
            "Starting run {} on a {}x{} grid with {} normal, {} wild and {} trap travelers",
            run_id, dims.width, dims.height, counts.normal, counts.wild, counts.traps
        );

        let grid_runtime = Grid::spawn(dims, self.config.grid.inbox_capacity);
        let (mut sink, sender) = TraceSink::new();
        let ctx = TravelerContext {
            grid: grid_runtime.grid().clone(),
            timing: self.config.timing.clone(),
            steps: self.config.steps.clone(),
            clock: SimClock::start_now(),
            traces: sender,
        };
        let mut rng = SimRng::from_seed(self.config.seed);
        let trap_shutdown = CancellationToken::new();

        let mut id = 0;
        let mut trap_tasks = Vec::with_capacity(counts.traps);
        for _ in 0..counts.traps {
            let trap =
                TrapTraveler::init(id, ctx.clone(), rng.fork(), trap_shutdown.child_token()).await;
            trap_tasks.push(Traveler::Trap(trap).start());
            id += 1;
        }

        let mut mobile = Vec::with_capacity(counts.normal + counts.wild);
        for offset in 0..counts.normal {
            let identity = Identity::new(id, symbol_at(NORMAL_SYMBOL_BASE, offset));
            let normal = NormalTraveler::init(identity, ctx.clone(), rng.fork()).await;
            mobile.push(Traveler::Normal(normal));
            id += 1;
        }
        for offset in 0..counts.wild {
            let identity = Identity::new(id, symbol_at(WILD_SYMBOL_BASE, offset));
            mobile.push(Traveler::Wild(WildTraveler::init(
                identity,
                ctx.clone(),
                rng.fork(),
            )));
            id += 1;
        }
        drop(ctx);

        debug!("All {} travelers created, starting", id);
        let mobile_tasks: Vec<JoinHandle<()>> = mobile.into_iter().map(Traveler::start).collect();

        let result = self
            .collect(&mut sink, mobile_tasks, trap_tasks, &trap_shutdown)
            .await;
        grid_runtime.shutdown().await;
        let traces = result?;

        info!("Run {} finished with {} traces", run_id, traces.len());

        Ok(SimulationReport {
            run_id,
            started_at,
            dimensions: dims,
            traces,
        })
    }

    /// Wait for the mobile travelers, then stop the traps and gather every trace
    ///
    /// Traps are stopped even when a mobile task failed, so a panicking
    /// traveler surfaces as an error instead of a run that never ends.
    async fn collect(
        &self,
        sink: &mut TraceSink,
        mobile_tasks: Vec<JoinHandle<()>>,
        trap_tasks: Vec<JoinHandle<()>>,
        trap_shutdown: &CancellationToken,
    ) -> Result<Vec<TravelerTrace>> {
        let mobile = join_tasks(mobile_tasks).await;
        debug!("Mobile travelers done, stopping traps");

        trap_shutdown.cancel();
        let traps = join_tasks(trap_tasks).await;
        mobile?;
        traps?;

        // Every traveler delivers its trace before its task ends.
        sink.collect(self.config.travelers.total()).await
    }
}

/// Await every task, reporting the first one that panicked or was aborted
async fn join_tasks(tasks: Vec<JoinHandle<()>>) -> Result<()> {
    for joined in join_all(tasks).await {
        joined?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::errors::EngineError;

    fn config(normal: usize, traps: usize) -> EngineConfig {
        let mut config = EngineConfig::default();
        config.grid.width = 3;
        config.grid.height = 3;
        config.travelers.normal = normal;
        config.travelers.wild = 0;
        config.travelers.traps = traps;
        config
    }

    #[tokio::test]
    async fn test_panicking_traveler_fails_the_run() {
        let simulation = Simulation::new(config(1, 1)).unwrap();
        let (mut sink, sender) = TraceSink::new();
        let shutdown = CancellationToken::new();

        let mobile = vec![tokio::spawn(async {
            panic!("traveler crashed mid-step");
        })];
        let trap = tokio::spawn({
            let stopped = shutdown.child_token();
            async move {
                stopped.cancelled().await;
                drop(sender);
            }
        });

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            simulation.collect(&mut sink, mobile, vec![trap], &shutdown),
        )
        .await
        .unwrap();

        assert!(matches!(result, Err(EngineError::TaskFailed(_))));
        assert!(shutdown.is_cancelled());
    }

    #[tokio::test]
    async fn test_missing_trace_is_reported() {
        let simulation = Simulation::new(config(1, 0)).unwrap();
        let (mut sink, sender) = TraceSink::new();
        let shutdown = CancellationToken::new();

        let mobile = vec![tokio::spawn(async move { drop(sender) })];
        let result = simulation.collect(&mut sink, mobile, Vec::new(), &shutdown).await;

        assert!(matches!(
            result,
            Err(EngineError::TraceSinkClosed {
                expected: 1,
                received: 0
            })
        ));
    }
}
