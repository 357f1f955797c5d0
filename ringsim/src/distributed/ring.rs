//! Ring all-pairs force computation.
//!
//! Workers form a logical ring. Each iteration every worker starts with a
//! copy of its own partition in the `remote` slot and, for `size` rounds,
//! adds the pull of whatever partition sits there, then passes that block
//! to its predecessor while taking the next one from its successor. After
//! one full rotation each local body has felt every body of the system
//! exactly once (its own softened self term included).
//!
//! Per iteration: `Accumulating(0..size)` -> `Integrating` -> done.

use tracing::debug;

use crate::comm::Communicator;
use crate::error::SimResult;
use crate::simulation::forces::Acceleration;
use crate::simulation::integrator::{drift, kick};
use crate::simulation::partition::partition_size;
use crate::simulation::states::{Body, NVec3, SimulationState};

/// Two scratch buffers whose incoming/outgoing roles swap every round.
/// Neither ever aliases a worker's `local` partition.
#[derive(Debug)]
pub struct RingBuffers {
    slots: [Vec<Body>; 2],
    remote: usize, // slot holding the block being read
}

impl RingBuffers {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: [Vec::with_capacity(capacity), Vec::with_capacity(capacity)],
            remote: 0,
        }
    }

    /// Start a rotation from a copy of the local partition.
    pub fn load(&mut self, local: &[Body]) {
        let slot = &mut self.slots[self.remote];
        slot.clear();
        slot.extend_from_slice(local);
    }

    pub fn remote(&self) -> &[Body] {
        &self.slots[self.remote]
    }

    /// Swap roles: the block just read becomes outgoing, the other slot
    /// becomes the remote slot to receive into. Returns the outgoing slot.
    pub fn rotate(&mut self) -> usize {
        let outgoing = self.remote;
        self.remote = 1 - self.remote;
        outgoing
    }

    /// Outgoing slot and the (incoming) remote slot after a [`rotate`].
    ///
    /// [`rotate`]: RingBuffers::rotate
    pub fn split(&mut self, outgoing: usize) -> (&mut Vec<Body>, &mut Vec<Body>) {
        let [a, b] = &mut self.slots;
        if outgoing == 0 {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Receive buffer for coordinator-side gathers between iterations.
    pub fn scratch(&mut self) -> &mut Vec<Body> {
        &mut self.slots[1 - self.remote]
    }
}

/// Per local body force sums, reset at the start of every iteration.
#[derive(Debug, Default)]
pub struct ForceAccumulator {
    forces: Vec<NVec3>,
}

impl ForceAccumulator {
    pub fn reset(&mut self, len: usize) {
        self.forces.clear();
        self.forces.resize(len, NVec3::zeros());
    }

    pub fn forces(&self) -> &[NVec3] {
        &self.forces
    }

    pub fn forces_mut(&mut self) -> &mut [NVec3] {
        &mut self.forces
    }
}

/// Everything a worker needs across iterations besides its own state.
#[derive(Debug)]
pub struct RingEngine<A> {
    pub buffers: RingBuffers,
    pub accumulator: ForceAccumulator,
    pub forces: A,
    pub dt: f64,
}

impl<A: Acceleration> RingEngine<A> {
    pub fn new(node_max: usize, forces: A, dt: f64) -> Self {
        Self {
            buffers: RingBuffers::new(node_max),
            accumulator: ForceAccumulator::default(),
            forces,
            dt,
        }
    }

    /// Advance `state` by one time step. Every worker of the group must
    /// call this for the same iteration.
    pub fn do_iteration<C>(&mut self, comm: &C, state: &mut SimulationState) -> SimResult<()>
    where
        C: Communicator + ?Sized,
    {
        let rank = comm.rank();
        let size = comm.size();
        let total = state.partition.total;
        let prev = comm.predecessor();
        let next = comm.successor();

        self.accumulator.reset(state.local.len());
        self.buffers.load(&state.local);

        for k in 0..size {
            // remote slot now holds the partition of worker (rank + k)
            let owner = (rank + k) % size;
            debug_assert_eq!(self.buffers.remote().len(), partition_size(total, size, owner));
            self.forces
                .accumulate(&state.local, self.buffers.remote(), self.accumulator.forces_mut());
            debug!(rank, step = k, owner, "accumulated remote block");

            let outgoing = self.buffers.rotate();
            let expected = partition_size(total, size, (owner + 1) % size);
            let (out, incoming) = self.buffers.split(outgoing);
            comm.exchange_bodies(out, prev, next, incoming, expected)?;
        }

        kick(&mut state.local, self.accumulator.forces(), self.dt);
        drift(&mut state.local, self.dt);
        Ok(())
    }
}
