// src/main.rs
//! Grid Arbiter
//!
//! Runs one grid arbitration simulation and writes the traveler traces to
//! stdout for the board renderer.

use anyhow::Result;
use grid_arbiter::observability::init_tracing;
use grid_arbiter::recording::Exporter;
use grid_arbiter::utils::config::EngineConfig;
use grid_arbiter::Simulation;
use std::io::Write;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = EngineConfig::load()?;

    // Initialize logging
    init_tracing(&config.logging)?;

    info!("Starting Grid Arbiter v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded: {:?}", config);

    let exporter = Exporter::new(config.output.format);
    let simulation = Simulation::new(config)?;

    match simulation.run().await {
        Ok(report) => {
            let output = exporter.export(&report)?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(output.as_bytes())?;
            stdout.flush()?;
            info!("Simulation finished");
            Ok(())
        }
        Err(e) => {
            error!("Simulation error: {}", e);
            Err(e.into())
        }
    }
}
