//! Deterministic synthetic initial conditions
//!
//! Body with global index `n` starts at `(n, n, n)` with velocity
//! `(n², n², n²)` and mass `1 / total`, so the system mass is always 1.0
//! and runs with the same `(total, size)` are bit-for-bit reproducible.

use crate::simulation::states::{Body, NVec3};

/// Generate `count` bodies starting at global index `global_offset`.
pub fn generate(count: usize, global_offset: usize, total: usize) -> Vec<Body> {
    let mut bodies = Vec::with_capacity(count);
    generate_into(&mut bodies, count, global_offset, total);
    bodies
}

/// Same as [`generate`] but reuses `buf` (keeps its capacity).
pub fn generate_into(buf: &mut Vec<Body>, count: usize, global_offset: usize, total: usize) {
    buf.clear();
    let m = 1.0 / total as f64;
    buf.extend((0..count).map(|i| {
        let n = (global_offset + i) as f64;
        Body::new(NVec3::repeat(n), NVec3::repeat(n * n), m)
    }));
}
