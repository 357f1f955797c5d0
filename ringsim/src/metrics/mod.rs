//! Timing and progress output of a worker.
//!
//! The driver reports a wall-clock sample per iteration and per
//! checkpoint, plus a progress fraction on the coordinator. Formatting is
//! left to the sink.

pub mod csv;

pub use csv::CsvMetrics;

use crate::error::SimResult;

pub trait MetricsSink {
    fn iteration_time(&mut self, secs: f64);
    fn checkpoint_time(&mut self, secs: f64);
    fn progress(&mut self, fraction: f64) -> SimResult<()>;
    fn flush(&mut self) -> SimResult<()>;
}

/// Discards every sample.
#[derive(Debug, Default)]
pub struct NullMetrics;

impl MetricsSink for NullMetrics {
    fn iteration_time(&mut self, _secs: f64) {}
    fn checkpoint_time(&mut self, _secs: f64) {}
    fn progress(&mut self, _fraction: f64) -> SimResult<()> {
        Ok(())
    }
    fn flush(&mut self) -> SimResult<()> {
        Ok(())
    }
}
