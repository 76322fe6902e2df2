// src/utils/mod.rs
//! Shared utilities: configuration, errors and the randomness source

pub mod config;
pub mod errors;
pub mod rng;

pub use config::EngineConfig;
pub use errors::{EngineError, Result};
pub use rng::SimRng;
