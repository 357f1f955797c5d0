//! CSV metrics under the results directory.
//!
//! - `logs/iteration_time_<rank>.csv` and `logs/checkpoint_time_<rank>.csv`:
//!   a header line with the column name, then one sample per line,
//!   written on `flush`
//! - `progress.csv`: `<unix seconds>,<percent>` appended after every
//!   iteration (coordinator only)

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use super::MetricsSink;
use crate::error::{SimError, SimResult};

#[derive(Debug)]
pub struct CsvMetrics {
    results_dir: PathBuf,
    rank: usize,
    iteration_times: Vec<f64>,
    checkpoint_times: Vec<f64>,
}

impl CsvMetrics {
    pub fn new(results_dir: &Path, rank: usize) -> Self {
        Self {
            results_dir: results_dir.to_path_buf(),
            rank,
            iteration_times: Vec::new(),
            checkpoint_times: Vec::new(),
        }
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.results_dir.join("logs")
    }

    pub fn progress_path(&self) -> PathBuf {
        self.results_dir.join("progress.csv")
    }

    fn write_column(&self, name: &str, data: &[f64]) -> SimResult<()> {
        let dir = self.logs_dir();
        let path = dir.join(format!("{}_{}.csv", name, self.rank));
        let metrics_err = |source| SimError::Metrics { path: path.clone(), source };

        fs::create_dir_all(&dir).map_err(metrics_err)?;
        let mut out = BufWriter::new(File::create(&path).map_err(metrics_err)?);
        writeln!(out, "{name}").map_err(metrics_err)?;
        for value in data {
            writeln!(out, "{value}").map_err(metrics_err)?;
        }
        out.flush().map_err(metrics_err)
    }
}

impl MetricsSink for CsvMetrics {
    fn iteration_time(&mut self, secs: f64) {
        self.iteration_times.push(secs);
    }

    fn checkpoint_time(&mut self, secs: f64) {
        self.checkpoint_times.push(secs);
    }

    fn progress(&mut self, fraction: f64) -> SimResult<()> {
        let path = self.progress_path();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| SimError::Metrics { path: path.clone(), source })?;
        writeln!(file, "{},{}", now, fraction * 100.0)
            .map_err(|source| SimError::Metrics { path, source })
    }

    fn flush(&mut self) -> SimResult<()> {
        self.write_column("iteration_time", &self.iteration_times)?;
        self.write_column("checkpoint_time", &self.checkpoint_times)
    }
}
