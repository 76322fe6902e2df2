// src/executor/mod.rs
//! Simulation orchestration
//!
//! Wires the grid, the travelers and the trace sink together for one run.

pub mod simulation;

pub use simulation::Simulation;
