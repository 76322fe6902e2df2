// src/recording/mod.rs
//! Trace recording and export
//!
//! - **Trace**: per-traveler step records and the run report
//! - **Sink**: exactly-once hand-off of each finished trace
//! - **Exporter**: text stream for the board renderer, or JSON
//!
//! # Architecture
//!
//! ```text
//! Traveler task ── record_step() ──▶ own Vec<TraceRecord>
//!       │ (on termination, ownership moves)
//!       ▼
//!  TraceSender ──▶ TraceSink::collect(n) ──▶ SimulationReport ──▶ Exporter
//! ```

pub mod exporter;
pub mod sink;
pub mod trace;

pub use exporter::{ExportFormat, Exporter};
pub use sink::{TraceSender, TraceSink};
pub use trace::{SimulationReport, TraceRecord, TravelerTrace};
