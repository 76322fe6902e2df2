// src/recording/sink.rs
//! Trace sink
//!
//! Each traveler hands its trace over exactly once, when its task ends. The
//! sink only counts and collects; ordering and formatting belong to the
//! exporter.

use crate::recording::trace::TravelerTrace;
use crate::utils::errors::{EngineError, Result};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Sending half handed to every traveler
#[derive(Debug, Clone)]
pub struct TraceSender {
    tx: mpsc::UnboundedSender<TravelerTrace>,
}

impl TraceSender {
    /// Transfer a finished trace to the sink
    pub fn deliver(&self, trace: TravelerTrace) {
        let id = trace.id;
        if self.tx.send(trace).is_err() {
            warn!("Trace sink dropped before traveler {} reported", id);
        }
    }
}

/// Receiving half, owned by the simulation
#[derive(Debug)]
pub struct TraceSink {
    rx: mpsc::UnboundedReceiver<TravelerTrace>,
    delivered: usize,
}

impl TraceSink {
    pub fn new() -> (Self, TraceSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx, delivered: 0 }, TraceSender { tx })
    }

    /// Wait for exactly `expected` more traces
    pub async fn collect(&mut self, expected: usize) -> Result<Vec<TravelerTrace>> {
        let mut traces = Vec::with_capacity(expected);

        while traces.len() < expected {
            match self.rx.recv().await {
                Some(trace) => {
                    debug!(
                        "Trace of traveler {} received ({} records)",
                        trace.id,
                        trace.records.len()
                    );
                    traces.push(trace);
                }
                None => {
                    return Err(EngineError::TraceSinkClosed {
                        expected,
                        received: traces.len(),
                    })
                }
            }
        }

        self.delivered += traces.len();
        Ok(traces)
    }

    /// Total traces collected so far
    pub fn delivered(&self) -> usize {
        self.delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Response, TravelerKind};

    fn trace(id: usize) -> TravelerTrace {
        TravelerTrace {
            id,
            kind: TravelerKind::Normal,
            outcome: Response::Success,
            records: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_collect_in_batches() {
        let (mut sink, sender) = TraceSink::new();
        for id in 0..3 {
            sender.deliver(trace(id));
        }

        assert_eq!(sink.collect(2).await.unwrap().len(), 2);
        assert_eq!(sink.collect(1).await.unwrap()[0].id, 2);
        assert_eq!(sink.delivered(), 3);
    }

    #[tokio::test]
    async fn test_closed_sink_reports_shortfall() {
        let (mut sink, sender) = TraceSink::new();
        sender.deliver(trace(0));
        drop(sender);

        match sink.collect(2).await {
            Err(EngineError::TraceSinkClosed { expected, received }) => {
                assert_eq!(expected, 2);
                assert_eq!(received, 1);
            }
            other => panic!("unexpected result: {:?}", other.map(|t| t.len())),
        }
    }
}
