// src/lib.rs
//! Grid Arbiter Library
//!
//! Distributed mutual exclusion over a toroidal grid: one actor per cell
//! decides who occupies it, while normal, wild and trap travelers move
//! concurrently and contest cells through message passing only.
//!
//! # Architecture
//!
//! The engine is structured into several key modules:
//!
//! - **grid**: positions, the arbitration protocol and the cell actors
//! - **travelers**: normal, wild and trap state machines
//! - **recording**: per-traveler traces, the trace sink and exporters
//! - **executor**: bootstrap and orchestration of one simulation run
//! - **observability**: logging setup
//! - **utils**: configuration, errors and the randomness source

pub mod executor;
pub mod grid;
pub mod observability;
pub mod recording;
pub mod travelers;
pub mod utils;

// Re-export commonly used types
pub use executor::Simulation;
pub use grid::{Dimensions, Grid, Position, Response};
pub use recording::{ExportFormat, Exporter, SimulationReport};
pub use utils::config::EngineConfig;
pub use utils::errors::{EngineError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
