//! Start-up: fresh synthetic state or resume from the checkpoint.
//!
//! Every worker makes the same fresh/restore decision (restore requested
//! and the checkpoint can be opened), so no extra message is needed to
//! agree on it. The coordinator then either generates or reads every
//! partition and ships each one to its owner. A restore that cannot be
//! read to the end aborts the whole group: no worker may start from a
//! different iteration than the others.

use std::fs::File;
use std::path::Path;

use tracing::{error, info};

use crate::comm::{Communicator, COORDINATOR};
use crate::distributed::checkpoint::CheckpointReader;
use crate::error::{SimError, SimResult};
use crate::simulation::generator::generate_into;
use crate::simulation::partition::Partition;
use crate::simulation::states::{Body, SimulationState};

/// Bring this worker's state up, fresh or restored.
pub fn initialize<C: Communicator + ?Sized>(
    comm: &C,
    total_bodies: usize,
    restore: bool,
    checkpoint: &Path,
) -> SimResult<SimulationState> {
    let partition = Partition::new(total_bodies, comm.size(), comm.rank());
    let mut state = SimulationState::new(partition);
    let mut outgoing = Vec::with_capacity(partition.node_max());

    if restore && File::open(checkpoint).is_ok() {
        initialize_restore(comm, &mut state, &mut outgoing, checkpoint)?;
    } else {
        initialize_static(comm, &mut state, &mut outgoing)?;
    }
    Ok(state)
}

/// Coordinator generates every partition; each other worker receives its own.
pub fn initialize_static<C: Communicator + ?Sized>(
    comm: &C,
    state: &mut SimulationState,
    outgoing: &mut Vec<Body>,
) -> SimResult<()> {
    let p = state.partition;
    if comm.is_coordinator() {
        generate_into(&mut state.local, p.len(), p.offset(), p.total);
        for rank in 1..comm.size() {
            let other = p.of(rank);
            generate_into(outgoing, other.len(), other.offset(), p.total);
            comm.send_bodies(rank, outgoing)?;
        }
    } else {
        comm.recv_bodies_into(COORDINATOR, &mut state.local, p.len())?;
    }
    state.next_iteration = 0;
    Ok(())
}

/// Coordinator reads the checkpoint and ships `(iteration + 1, partition)`
/// to every worker.
pub fn initialize_restore<C: Communicator + ?Sized>(
    comm: &C,
    state: &mut SimulationState,
    outgoing: &mut Vec<Body>,
    checkpoint: &Path,
) -> SimResult<()> {
    if !comm.is_coordinator() {
        state.next_iteration = comm.recv_iteration(COORDINATOR)?;
        comm.recv_bodies_into(COORDINATOR, &mut state.local, state.partition.len())?;
        return Ok(());
    }

    info!(path = %checkpoint.display(), "reloading from checkpoint");
    match read_and_distribute(comm, state, outgoing, checkpoint) {
        Ok(()) => Ok(()),
        Err(e) if e.is_group_echo() => Err(e),
        Err(e) => {
            error!(error = %e, "cannot restore checkpoint, aborting");
            comm.abort(1);
            Err(SimError::InitializationAbort(Box::new(e)))
        }
    }
}

fn read_and_distribute<C: Communicator + ?Sized>(
    comm: &C,
    state: &mut SimulationState,
    outgoing: &mut Vec<Body>,
    checkpoint: &Path,
) -> SimResult<()> {
    let p = state.partition;
    let mut reader = CheckpointReader::open_expecting(checkpoint, p.total)?;

    let stored = reader.read_iteration()?;
    let next_iteration = match stored.checked_add(1) {
        Some(next) if stored >= 0 => next,
        _ => {
            return Err(SimError::CheckpointIo {
                path: checkpoint.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("stored iteration {stored} is not a completed iteration"),
                ),
            })
        }
    };

    reader.read_bodies_into(&mut state.local, p.len())?;
    for rank in 1..comm.size() {
        reader.read_bodies_into(outgoing, p.of(rank).len())?;
        comm.send_iteration(rank, next_iteration)?;
        comm.send_bodies(rank, outgoing)?;
    }
    state.next_iteration = next_iteration;
    Ok(())
}
