//! Run driver
//!
//! `run_worker` is the symmetric program every worker executes; worker 0
//! additionally coordinates. `launch` starts an in-process group of
//! workers, one thread each, and waits for all of them.

use std::thread;
use std::time::Instant;

use tracing::info;

use crate::comm::{Communicator, LocalWorld};
use crate::configuration::config::RunConfig;
use crate::distributed::checkpoint::checkpoint_state;
use crate::distributed::gather::{collect_print, LogSink};
use crate::distributed::init::initialize;
use crate::distributed::ring::RingEngine;
use crate::error::{SimError, SimResult};
use crate::metrics::{CsvMetrics, MetricsSink};
use crate::simulation::forces::SoftenedGravity;
use crate::simulation::states::SimulationState;

/// What one worker did during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerReport {
    pub rank: usize,
    pub start_iteration: i32, // first iteration run (0 unless restored)
    pub iterations_run: usize,
    pub checkpoints: usize,
    pub last_checkpoint: Option<i32>, // iteration stored by the last checkpoint
    pub state: SimulationState, // final state of this worker
}

/// Run the whole simulation on one worker.
pub fn run_worker<C, M>(comm: &C, config: &RunConfig, metrics: &mut M) -> SimResult<WorkerReport>
where
    C: Communicator + ?Sized,
    M: MetricsSink + ?Sized,
{
    config.validate()?;
    let rank = comm.rank();
    let params = config.parameters();
    let checkpoint = config.checkpoint_file();

    let mut state = initialize(comm, params.total_bodies, config.restore, &checkpoint)?;
    info!(rank, size = comm.size(), local = state.local.len(), "worker ready");
    if comm.is_coordinator() {
        info!(start = state.next_iteration, "starting from iteration");
    }

    let mut engine = RingEngine::new(
        state.partition.node_max(),
        SoftenedGravity::from_params(&params),
        params.dt,
    );

    if config.print {
        collect_print(comm, &state, engine.buffers.scratch(), &mut LogSink)?;
    }

    let start_iteration = state.next_iteration;
    let mut report = WorkerReport {
        rank,
        start_iteration,
        iterations_run: 0,
        checkpoints: 0,
        last_checkpoint: None,
        state: state.clone(),
    };

    for i in start_iteration..config.iterations {
        let start = Instant::now();
        engine.do_iteration(comm, &mut state)?;
        let elapsed = start.elapsed().as_secs_f64();
        metrics.iteration_time(elapsed);
        report.iterations_run += 1;

        if comm.is_coordinator() {
            metrics.progress(f64::from(i + 1) / f64::from(config.iterations))?;
            info!(iteration = i, time_s = elapsed, "iteration done");
        }

        if i % config.checkpoint_interval == 0 {
            let start = Instant::now();
            checkpoint_state(comm, &state, engine.buffers.scratch(), i, &checkpoint)?;
            metrics.checkpoint_time(start.elapsed().as_secs_f64());
            report.checkpoints += 1;
            report.last_checkpoint = Some(i);
        }
        state.next_iteration = i + 1;
    }

    if comm.is_coordinator() {
        info!("simulation is done");
    }
    if config.print {
        collect_print(comm, &state, engine.buffers.scratch(), &mut LogSink)?;
    }

    metrics.flush()?;
    report.state = state;
    Ok(report)
}

/// Run `config.workers` workers on threads and collect their reports,
/// ordered by rank.
pub fn launch(config: &RunConfig) -> SimResult<Vec<WorkerReport>> {
    let results_dir = config.ensure_results_dir()?;
    launch_with(config, |rank| CsvMetrics::new(&results_dir, rank))
}

/// Like [`launch`] with a caller supplied metrics sink per rank.
pub fn launch_with<M, F>(config: &RunConfig, make_metrics: F) -> SimResult<Vec<WorkerReport>>
where
    M: MetricsSink + Send,
    F: Fn(usize) -> M,
{
    config.validate()?;
    let comms = LocalWorld::new(config.workers);

    let results: Vec<SimResult<WorkerReport>> = thread::scope(|s| {
        let mut handles = Vec::with_capacity(comms.len());
        for comm in comms {
            let rank = comm.rank();
            let mut metrics = make_metrics(rank);
            let spawned = thread::Builder::new()
                .name(format!("worker-{rank}"))
                .spawn_scoped(s, move || run_worker(&comm, config, &mut metrics));
            match spawned {
                Ok(handle) => handles.push((rank, Ok(handle))),
                Err(source) => handles.push((rank, Err(SimError::Spawn { rank, source }))),
            }
        }

        handles
            .into_iter()
            .map(|(rank, handle)| match handle {
                Ok(h) => h.join().unwrap_or(Err(SimError::WorkerPanicked { rank })),
                Err(e) => Err(e),
            })
            .collect()
    });

    first_failure(results)
}

/// All reports, or the error that started the failure. Echoes of an
/// abort on other workers are only returned when nothing better exists.
fn first_failure(results: Vec<SimResult<WorkerReport>>) -> SimResult<Vec<WorkerReport>> {
    let mut reports = Vec::with_capacity(results.len());
    let mut echo = None;
    let mut root = None;
    for result in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e) if e.is_group_echo() => {
                echo.get_or_insert(e);
            }
            Err(e) => {
                root.get_or_insert(e);
            }
        }
    }
    match root.or(echo) {
        Some(e) => Err(e),
        None => Ok(reports),
    }
}
