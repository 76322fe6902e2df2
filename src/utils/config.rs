// src/utils/config.rs
//! Engine configuration
//!
//! Values are layered from built-in defaults, an optional config file and
//! `GRID_ARBITER__*` environment variables. The result is read once at
//! startup and never changes during a run.

use crate::grid::Dimensions;
use crate::recording::ExportFormat;
use crate::utils::errors::{EngineError, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Environment variable naming the config file (without extension)
pub const CONFIG_PATH_ENV: &str = "GRID_ARBITER_CONFIG";

const DEFAULT_CONFIG_NAME: &str = "grid-arbiter";
const ENV_PREFIX: &str = "GRID_ARBITER";

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub grid: GridConfig,
    pub travelers: TravelerCounts,
    pub timing: TimingConfig,
    pub steps: StepConfig,
    pub logging: LoggingConfig,
    pub output: OutputConfig,

    /// Seed for the randomness source; entropy when absent
    pub seed: Option<u64>,
}

/// Board size and per-cell inbox sizing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub width: usize,
    pub height: usize,

    /// Capacity of each cell's Acquire inbox
    pub inbox_capacity: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 15,
            height: 15,
            inbox_capacity: 16,
        }
    }
}

impl GridConfig {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }
}

/// How many travelers of each kind take part
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TravelerCounts {
    pub normal: usize,
    pub wild: usize,
    pub traps: usize,
}

impl Default for TravelerCounts {
    fn default() -> Self {
        Self {
            normal: 15,
            wild: 10,
            traps: 10,
        }
    }
}

impl TravelerCounts {
    pub fn total(&self) -> usize {
        self.normal + self.wild + self.traps
    }
}

/// Delays, timeouts and inbox sizes for traveler tasks
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,

    /// Deadlock window as a multiple of the maximum step delay
    pub deadlock_factor: u32,

    /// Pause between two failed movement attempts
    pub retry_pause_ms: u64,

    /// How long a trap shows a captured glyph, as a multiple of the maximum step delay
    pub trap_dwell_factor: u32,

    /// Bound on a trap pushing a capture onto a wild traveler
    pub capture_push_timeout_ms: u64,

    pub relocation_inbox_capacity: usize,
    pub capture_inbox_capacity: usize,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 10,
            max_delay_ms: 50,
            deadlock_factor: 4,
            retry_pause_ms: 1,
            trap_dwell_factor: 2,
            capture_push_timeout_ms: 100,
            relocation_inbox_capacity: 4,
            capture_inbox_capacity: 4,
        }
    }
}

impl TimingConfig {
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Upper bound on a single movement attempt before the traveler deadlocks
    pub fn deadlock_window(&self) -> Duration {
        self.max_delay().saturating_mul(self.deadlock_factor)
    }

    pub fn retry_pause(&self) -> Duration {
        Duration::from_millis(self.retry_pause_ms)
    }

    pub fn trap_dwell(&self) -> Duration {
        self.max_delay().saturating_mul(self.trap_dwell_factor)
    }

    pub fn capture_push_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_push_timeout_ms)
    }
}

/// Bounds for each normal traveler's step budget
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    pub min_steps: u32,
    pub max_steps: u32,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            min_steps: 10,
            max_steps: 100,
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: ExportFormat,
}

impl EngineConfig {
    /// Load configuration from defaults, optional file and environment
    pub fn load() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_NAME.to_string());

        let config: EngineConfig = Config::builder()
            .add_source(File::with_name(&path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values that cannot describe a runnable simulation
    pub fn validate(&self) -> Result<()> {
        if self.grid.width == 0 || self.grid.height == 0 {
            return Err(EngineError::InvalidConfig(
                "grid width and height must be positive".to_string(),
            ));
        }

        if self.grid.inbox_capacity == 0
            || self.timing.relocation_inbox_capacity == 0
            || self.timing.capture_inbox_capacity == 0
        {
            return Err(EngineError::InvalidConfig(
                "inbox capacities must be positive".to_string(),
            ));
        }

        if self.timing.max_delay_ms == 0 {
            return Err(EngineError::InvalidConfig(
                "max_delay_ms must be positive".to_string(),
            ));
        }

        if self.timing.min_delay_ms > self.timing.max_delay_ms {
            return Err(EngineError::InvalidConfig(format!(
                "min_delay_ms ({}) exceeds max_delay_ms ({})",
                self.timing.min_delay_ms, self.timing.max_delay_ms
            )));
        }

        if self.timing.deadlock_factor == 0 {
            return Err(EngineError::InvalidConfig(
                "deadlock_factor must be positive".to_string(),
            ));
        }

        if self.steps.min_steps > self.steps.max_steps {
            return Err(EngineError::InvalidConfig(format!(
                "min_steps ({}) exceeds max_steps ({})",
                self.steps.min_steps, self.steps.max_steps
            )));
        }

        let max_delay = self.timing.max_delay();
        for (name, factor) in [
            ("deadlock_factor", self.timing.deadlock_factor),
            ("trap_dwell_factor", self.timing.trap_dwell_factor),
            ("max_steps", self.steps.max_steps),
        ] {
            if max_delay.checked_mul(factor).is_none() {
                return Err(EngineError::InvalidConfig(format!(
                    "max_delay_ms ({}) times {} ({}) overflows",
                    self.timing.max_delay_ms, name, factor
                )));
            }
        }

        let cells = self
            .grid
            .width
            .checked_mul(self.grid.height)
            .ok_or_else(|| EngineError::InvalidConfig("grid is too large".to_string()))?;
        if self.travelers.total() > cells {
            return Err(EngineError::InvalidConfig(format!(
                "{} travelers cannot fit on {} cells",
                self.travelers.total(),
                cells
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_run() {
        let config = EngineConfig::default();
        assert_eq!(config.grid.width, 15);
        assert_eq!(config.grid.height, 15);
        assert_eq!(config.travelers.total(), 35);
        assert_eq!(config.timing.deadlock_window(), Duration::from_millis(200));
        assert_eq!(config.timing.trap_dwell(), Duration::from_millis(100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut config = EngineConfig::default();
        config.grid.width = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.timing.min_delay_ms = 60;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.steps.min_steps = 200;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.grid.width = 2;
        config.grid.height = 2;
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_timing_products_must_not_overflow() {
        let mut config = EngineConfig::default();
        config.timing.max_delay_ms = u64::MAX / 2;
        config.timing.min_delay_ms = 0;
        config.timing.deadlock_factor = u32::MAX;
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidConfig(_))
        ));
        assert_eq!(config.timing.deadlock_window(), Duration::MAX);

        config.timing.deadlock_factor = 1;
        config.steps.max_steps = u32::MAX;
        assert!(config.validate().is_err());

        config.steps.max_steps = 100;
        config.timing.trap_dwell_factor = u32::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arbiter.toml");
        std::fs::write(
            &path,
            "seed = 7\n[grid]\nwidth = 20\n[travelers]\ntraps = 0\n[output]\nformat = \"json\"\n",
        )
        .unwrap();

        let config: EngineConfig = Config::builder()
            .add_source(File::from(path))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.grid.width, 20);
        assert_eq!(config.grid.height, 15);
        assert_eq!(config.travelers.traps, 0);
        assert_eq!(config.travelers.normal, 15);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.output.format, ExportFormat::Json);
    }
}
