pub mod simulation;
pub mod comm;
pub mod distributed;
pub mod configuration;
pub mod metrics;
pub mod benchmark;
pub mod error;

pub use simulation::states::{Body, NVec3, SimulationState, BODY_BYTES};
pub use simulation::partition::{node_max, partition_offset, partition_size, Partition};
pub use simulation::generator::{generate, generate_into};
pub use simulation::forces::{direct_forces, Acceleration, SoftenedGravity};
pub use simulation::integrator::{drift, kick};
pub use simulation::params::Parameters;
pub use simulation::engine::{launch, launch_with, run_worker, WorkerReport};

pub use comm::{Communicator, LocalComm, LocalWorld, Message, COORDINATOR};
pub use distributed::init::initialize;
pub use distributed::ring::{ForceAccumulator, RingBuffers, RingEngine};
pub use distributed::checkpoint::{
    checkpoint_len, checkpoint_path, checkpoint_state, CheckpointReader, CheckpointWriter,
};
pub use distributed::gather::{collect_print, DiagnosticSink, LogSink};

pub use configuration::config::RunConfig;
pub use metrics::{CsvMetrics, MetricsSink, NullMetrics};
pub use error::{CommError, SimError, SimResult};

pub use benchmark::benchmark::{bench_ring, time_ring_iteration};
