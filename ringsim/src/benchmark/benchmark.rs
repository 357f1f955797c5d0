use std::thread;
use std::time::Instant;

use crate::comm::{Communicator, LocalWorld};
use crate::distributed::init::initialize_static;
use crate::distributed::ring::RingEngine;
use crate::error::{SimError, SimResult};
use crate::simulation::forces::{direct_forces, SoftenedGravity};
use crate::simulation::generator::generate;
use crate::simulation::params::Parameters;
use crate::simulation::partition::Partition;
use crate::simulation::states::SimulationState;

/// Compare one ring iteration at several group sizes against the direct sum.
pub fn bench_ring() -> SimResult<()> {
    // Different system sizes to test
    let ns = [200, 400, 800, 1600, 3200];
    let sizes = [1, 2, 4, 8];

    for n in ns {
        let params = Parameters::new(n, 1.0);
        let gravity = SoftenedGravity::from_params(&params);
        let bodies = generate(n, 0, n);

        // Warm up
        direct_forces(&bodies, &gravity);

        // Time direct
        let t0 = Instant::now();
        direct_forces(&bodies, &gravity);
        let dt_direct = t0.elapsed().as_secs_f64();

        print!("N = {n:5}, direct = {:8.6} s", dt_direct);
        for size in sizes {
            let dt_ring = time_ring_iteration(&params, size)?;
            print!(", ring[{size}] = {:8.6} s", dt_ring);
        }
        println!();
    }
    Ok(())
}

/// Wall time of the slowest worker for a single ring iteration.
pub fn time_ring_iteration(params: &Parameters, size: usize) -> SimResult<f64> {
    let comms = LocalWorld::new(size);

    let times: Vec<SimResult<f64>> = thread::scope(|s| {
        let handles: Vec<_> = comms
            .iter()
            .map(|comm| {
                s.spawn(move || -> SimResult<f64> {
                    let partition = Partition::new(params.total_bodies, size, comm.rank());
                    let mut state = SimulationState::new(partition);
                    let mut outgoing = Vec::with_capacity(partition.node_max());
                    initialize_static(comm, &mut state, &mut outgoing)?;

                    let gravity = SoftenedGravity::from_params(params);
                    let mut engine = RingEngine::new(partition.node_max(), gravity, params.dt);
                    let t0 = Instant::now();
                    engine.do_iteration(comm, &mut state)?;
                    Ok(t0.elapsed().as_secs_f64())
                })
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(rank, h)| h.join().unwrap_or(Err(SimError::WorkerPanicked { rank })))
            .collect()
    });

    times
        .into_iter()
        .try_fold(0.0_f64, |slowest, t| t.map(|t| slowest.max(t)))
}
