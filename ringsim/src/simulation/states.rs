//! Core state types for the distributed N-body simulation.
//!
//! Defines the on-wire / on-disk body record and the per-worker state:
//! - `Body` a fixed 56 byte record (position, velocity, mass) that is
//!   bitwise serializable through `bytemuck`
//! - `SimulationState` the partition owned by one worker plus the
//!   iteration it will run next

use bytemuck::{Pod, Zeroable};
use nalgebra::Vector3;

use crate::simulation::partition::Partition;

pub type NVec3 = Vector3<f64>;

/// Size of one serialized body record in bytes.
pub const BODY_BYTES: usize = std::mem::size_of::<Body>();

/// Point mass. Identity is positional: the index inside a partition plus
/// the partition's global offset.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Body {
    pub x: NVec3, // position
    pub v: NVec3, // velocity
    pub m: f64, // mass
}

impl Body {
    pub fn new(x: NVec3, v: NVec3, m: f64) -> Self {
        Self { x, v, m }
    }
}

/// State owned exclusively by one worker.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub partition: Partition, // which global slice this worker owns
    pub local: Vec<Body>, // bodies of this worker, capacity = node_max
    pub next_iteration: i32, // first iteration still to run
}

impl SimulationState {
    /// Allocate the local buffer once, sized for the largest partition in
    /// the group so it never reallocates.
    pub fn new(partition: Partition) -> Self {
        let capacity = partition.node_max();
        Self {
            partition,
            local: Vec::with_capacity(capacity),
            next_iteration: 0,
        }
    }

    /// Sum of the local masses.
    pub fn local_mass(&self) -> f64 {
        self.local.iter().map(|b| b.m).sum()
    }
}
