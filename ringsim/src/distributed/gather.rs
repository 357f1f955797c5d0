//! On-demand collection of the full state on the coordinator, for reporting.
//! Read-only: no worker's partition is modified.

use tracing::info;

use crate::comm::{Communicator, COORDINATOR};
use crate::error::SimResult;
use crate::simulation::states::{Body, SimulationState};

/// Receiver of gathered bodies, in global index order.
pub trait DiagnosticSink {
    fn body(&mut self, index: usize, body: &Body);
}

/// Writes one log line per body.
#[derive(Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn body(&mut self, index: usize, b: &Body) {
        info!(
            "{}: m = {}. P = [{},{},{}], V = [{},{},{}]",
            index, b.m, b.x.x, b.x.y, b.x.z, b.v.x, b.v.y, b.v.z
        );
    }
}

impl DiagnosticSink for Vec<(usize, Body)> {
    fn body(&mut self, index: usize, body: &Body) {
        self.push((index, *body));
    }
}

/// Collective gather. Non-coordinators send their partition and return 0;
/// the coordinator reports every body and returns how many it reported.
pub fn collect_print<C, S>(
    comm: &C,
    state: &SimulationState,
    scratch: &mut Vec<Body>,
    sink: &mut S,
) -> SimResult<usize>
where
    C: Communicator + ?Sized,
    S: DiagnosticSink + ?Sized,
{
    if !comm.is_coordinator() {
        comm.send_bodies(COORDINATOR, &state.local)?;
        return Ok(0);
    }

    let mut reported = 0;
    let mut report = |offset: usize, bodies: &[Body]| {
        for (i, b) in bodies.iter().enumerate() {
            sink.body(offset + i, b);
        }
        reported += bodies.len();
    };

    report(state.partition.offset(), &state.local);
    for rank in 1..comm.size() {
        let p = state.partition.of(rank);
        comm.recv_bodies_into(rank, scratch, p.len())?;
        report(p.offset(), scratch);
    }
    Ok(reported)
}
