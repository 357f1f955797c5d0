pub mod states;
pub mod params;
pub mod partition;
pub mod generator;
pub mod forces;
pub mod integrator;
pub mod engine;
