use ringsim::{bench_ring, launch, RunConfig};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ringsim", about = "Distributed ring N-body simulation")]
struct Args {
    /// YAML run configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Total bodies
    #[arg(short = 'b', long)]
    total_bodies: Option<usize>,

    /// Restore from the last checkpoint when one exists
    #[arg(short, long)]
    restore: bool,

    /// Print initial and final values
    #[arg(short, long)]
    print: bool,

    /// Checkpoint interval
    #[arg(short, long)]
    checkpoint_interval: Option<i32>,

    /// Results folder
    #[arg(short = 'f', long)]
    results_folder: Option<PathBuf>,

    /// Total number of iterations
    #[arg(short, long)]
    iterations: Option<i32>,

    /// Number of workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Time step
    #[arg(long)]
    dt: Option<f64>,

    /// Time ring iterations against the direct sum and exit
    #[arg(long)]
    bench: bool,
}

impl Args {
    fn into_config(self) -> Result<RunConfig> {
        let mut cfg = match &self.config {
            Some(path) => RunConfig::from_yaml_file(path)?,
            None => RunConfig::default(),
        };
        if let Some(n) = self.total_bodies {
            cfg.total_bodies = n;
        }
        cfg.restore |= self.restore;
        cfg.print |= self.print;
        if let Some(c) = self.checkpoint_interval {
            cfg.checkpoint_interval = c;
        }
        if let Some(folder) = self.results_folder {
            cfg.results_folder = folder;
        }
        if let Some(i) = self.iterations {
            cfg.iterations = i;
        }
        if let Some(w) = self.workers {
            cfg.workers = w;
        }
        if let Some(dt) = self.dt {
            cfg.dt = dt;
        }
        Ok(cfg)
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .init();

    let args = Args::parse();
    if args.bench {
        bench_ring()?;
        return Ok(());
    }

    let config = args.into_config()?;
    let reports = launch(&config).context("simulation aborted")?;

    let ran = reports.first().map(|r| r.iterations_run).unwrap_or(0);
    tracing::info!(workers = reports.len(), iterations = ran, "run complete");
    Ok(())
}
