//! Force / acceleration contributors for the ring engine
//!
//! A contributor adds the pull of a `remote` block of bodies onto every
//! body of a `local` block. The ring engine calls it once per rotation
//! step, so the accumulator is never cleared in here.

use crate::simulation::params::Parameters;
use crate::simulation::states::{Body, NVec3};

/// Source of acceleration between two blocks of bodies.
/// Implementations add their contribution into `out[i]` for each local body
pub trait Acceleration {
    fn accumulate(&self, local: &[Body], remote: &[Body], out: &mut [NVec3]);
}

/// Newtonian gravity with Plummer softening
/// The softening keeps the self term (a body against its own copy) finite
#[allow(non_snake_case)]
#[derive(Debug, Clone, Copy)]
pub struct SoftenedGravity {
    pub G: f64, // gravitational constant
    pub softening: f64, // softening length
}

impl SoftenedGravity {
    pub fn from_params(p: &Parameters) -> Self {
        Self {
            G: p.G,
            softening: p.softening,
        }
    }
}

impl Acceleration for SoftenedGravity {
    fn accumulate(&self, local: &[Body], remote: &[Body], out: &mut [NVec3]) {
        debug_assert_eq!(local.len(), out.len());
        let soft2 = self.softening * self.softening;

        for (bi, ai) in local.iter().zip(out.iter_mut()) {
            let mut f = NVec3::zeros();
            for bj in remote {
                // d points from the local body towards the remote one
                let d = bj.x - bi.x;

                // |d|^2 + softening^2
                let d2 = d.dot(&d) + soft2;

                // 1 / |d_soft|^3
                let inv_r = d2.sqrt().recip();
                let inv_r3 = inv_r * inv_r * inv_r;

                // pulled by the remote body's mass
                f += self.G * bj.m * inv_r3 * d;
            }
            *ai += f;
        }
    }
}

/// Direct O(N^2) evaluation over one block, self term included.
/// Reference for the distributed result.
pub fn direct_forces<A: Acceleration + ?Sized>(bodies: &[Body], term: &A) -> Vec<NVec3> {
    let mut out = vec![NVec3::zeros(); bodies.len()];
    term.accumulate(bodies, bodies, &mut out);
    out
}
