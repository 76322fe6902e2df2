// src/recording/trace.rs
//! Trace records and the finished simulation report

use crate::grid::{Dimensions, Position, Response, TravelerId, TravelerKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One recorded step of a traveler
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Time since simulation start
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
    pub id: TravelerId,
    pub position: Position,
    pub symbol: char,
}

/// The complete, ordered trace of one terminated traveler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelerTrace {
    pub id: TravelerId,
    pub kind: TravelerKind,

    /// Status the traveler ended with
    pub outcome: Response,
    pub records: Vec<TraceRecord>,
}

impl TravelerTrace {
    pub fn last(&self) -> Option<&TraceRecord> {
        self.records.last()
    }
}

/// Everything one simulation run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub dimensions: Dimensions,

    /// Traveler traces in delivery order
    pub traces: Vec<TravelerTrace>,
}

impl SimulationReport {
    pub fn traveler_count(&self) -> usize {
        self.traces.len()
    }

    pub fn trace(&self, id: TravelerId) -> Option<&TravelerTrace> {
        self.traces.iter().find(|trace| trace.id == id)
    }

    pub fn traces_of(&self, kind: TravelerKind) -> impl Iterator<Item = &TravelerTrace> {
        self.traces.iter().filter(move |trace| trace.kind == kind)
    }
}

/// Durations as fractional seconds
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
