//! Fixed-step explicit Euler integration
//!
//! The ring engine kicks every local body once with the force summed over
//! the full rotation, then drifts positions with the updated velocity.

use super::states::{Body, NVec3};

/// Kick: v_n+1 = v_n + dt * F
pub fn kick(bodies: &mut [Body], forces: &[NVec3], dt: f64) {
    debug_assert_eq!(bodies.len(), forces.len());
    for (b, f) in bodies.iter_mut().zip(forces.iter()) {
        b.v += dt * *f;
    }
}

/// Drift: x_n+1 = x_n + dt * v_n+1
pub fn drift(bodies: &mut [Body], dt: f64) {
    for b in bodies.iter_mut() {
        b.x += dt * b.v;
    }
}
