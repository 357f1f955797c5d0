//! Numerical and physical parameters for one run
//!
//! `Parameters` holds runtime settings shared by every worker:
//! - body count and fixed step size,
//! - softening and gravitational constant

/// Default gravitational constant.
pub const DEFAULT_G: f64 = 1.0;

/// Default softening length (added squared to every separation).
pub const DEFAULT_SOFTENING: f64 = 0.1;

#[allow(non_snake_case)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    pub total_bodies: usize, // global body count
    pub dt: f64, // step size
    pub softening: f64, // softening length
    pub G: f64, // gravitational constant
}

impl Parameters {
    pub fn new(total_bodies: usize, dt: f64) -> Self {
        Self {
            total_bodies,
            dt,
            softening: DEFAULT_SOFTENING,
            G: DEFAULT_G,
        }
    }
}
