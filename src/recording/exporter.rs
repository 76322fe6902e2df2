// src/recording/exporter.rs
//! Export simulation reports
//!
//! Supports:
//! - Text (the line stream consumed by the board renderer)
//! - JSON (for analysis)

use crate::recording::trace::{SimulationReport, TraceRecord};
use crate::utils::errors::{EngineError, Result};
use serde::Deserialize;
use std::fmt::Write as _;
use std::path::Path;
use tracing::debug;

/// Export formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Header `-1 <travelers> <width> <height>`, then one line per record
    #[default]
    Text,

    /// Whole report as pretty JSON
    Json,
}

/// Exporter for simulation reports
pub struct Exporter {
    format: ExportFormat,
}

impl Exporter {
    pub fn new(format: ExportFormat) -> Self {
        Self { format }
    }

    /// Export a report to string
    pub fn export(&self, report: &SimulationReport) -> Result<String> {
        debug!(
            "Exporting {} traces to {:?} format",
            report.traveler_count(),
            self.format
        );

        match self.format {
            ExportFormat::Text => Ok(self.export_text(report)),
            ExportFormat::Json => self.export_json(report),
        }
    }

    /// Export a report into a file, replacing it
    pub fn export_to_file(&self, report: &SimulationReport, path: &Path) -> Result<()> {
        let content = self.export(report)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn export_text(&self, report: &SimulationReport) -> String {
        let mut out = format!(
            "-1 {} {} {}\n",
            report.traveler_count(),
            report.dimensions.width,
            report.dimensions.height
        );

        for record in report.traces.iter().flat_map(|trace| &trace.records) {
            push_record(&mut out, record);
        }

        out
    }

    fn export_json(&self, report: &SimulationReport) -> Result<String> {
        serde_json::to_string_pretty(report)
            .map_err(|e| EngineError::ExportFailed(format!("JSON serialization error: {}", e)))
    }
}

fn push_record(out: &mut String, record: &TraceRecord) {
    // Writing into a String cannot fail.
    let _ = writeln!(
        out,
        "{:.6} {} {} {} {}",
        record.elapsed.as_secs_f64(),
        record.id,
        record.position.x,
        record.position.y,
        record.symbol
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Dimensions, Position, Response, TravelerKind};
    use crate::recording::trace::TravelerTrace;
    use chrono::Utc;
    use std::time::Duration;

    fn create_test_report() -> SimulationReport {
        let record = |millis, x, y, symbol| TraceRecord {
            elapsed: Duration::from_millis(millis),
            id: 3,
            position: Position::new(x, y),
            symbol,
        };

        SimulationReport {
            run_id: "run_abc".to_string(),
            started_at: Utc::now(),
            dimensions: Dimensions::new(15, 15),
            traces: vec![TravelerTrace {
                id: 3,
                kind: TravelerKind::Normal,
                outcome: Response::Trapped,
                records: vec![record(12, 4, 5, 'A'), record(1500, 15, 15, 'A')],
            }],
        }
    }

    #[test]
    fn test_text_export() {
        let exporter = Exporter::new(ExportFormat::Text);
        let text = exporter.export(&create_test_report()).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec!["-1 1 15 15", "0.012000 3 4 5 A", "1.500000 3 15 15 A"]
        );
    }

    #[test]
    fn test_json_export() {
        let exporter = Exporter::new(ExportFormat::Json);
        let json = exporter.export(&create_test_report()).unwrap();

        assert!(json.contains("run_abc"));
        assert!(json.contains("\"trapped\""));

        let parsed: SimulationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.traces[0].records[1].position, Position::new(15, 15));
        assert_eq!(parsed.traces[0].records[0].elapsed, Duration::from_millis(12));
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.txt");

        Exporter::new(ExportFormat::Text)
            .export_to_file(&create_test_report(), &path)
            .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("-1 1 15 15\n"));
    }
}
