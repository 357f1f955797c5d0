//! Error types for ringsim.
//!
//! `SimError` covers everything a worker can fail with. Checkpoint I/O
//! problems are only ever raised on the coordinator; the other workers see
//! them as `CommError::Aborted` once the coordinator tears the group down.
//! There is no timeout variant: a peer that never answers blocks forever.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures of point-to-point messaging between workers.
#[derive(Debug, Error)]
pub enum CommError {
    #[error("worker group aborted with code {code}")]
    Aborted { code: i32 },

    #[error("worker {peer} has left the group")]
    Disconnected { peer: usize },

    #[error("expected a {expected} message from worker {peer}, got {actual}")]
    UnexpectedMessage {
        peer: usize,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("worker {peer} sent {actual} bodies, expected {expected}")]
    PayloadSize {
        peer: usize,
        expected: usize,
        actual: usize,
    },

    #[error("worker {peer} is outside a group of {size}")]
    InvalidPeer { peer: usize, size: usize },

    #[error("worker {rank} cannot message itself")]
    SelfMessage { rank: usize },
}

pub type CommResult<T> = Result<T, CommError>;

/// Top-level error of a simulation worker.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("cannot open checkpoint {}", path.display())]
    CheckpointOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("checkpoint I/O failed on {}", path.display())]
    CheckpointIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("initialization aborted")]
    InitializationAbort(#[source] Box<SimError>),

    #[error(transparent)]
    Comm(#[from] CommError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("cannot write metrics to {}", path.display())]
    Metrics {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot start worker {rank}")]
    Spawn {
        rank: usize,
        #[source]
        source: io::Error,
    },

    #[error("worker {rank} panicked")]
    WorkerPanicked { rank: usize },
}

impl SimError {
    /// True for errors that only echo a failure that started on another
    /// worker (abort broadcast or a vanished peer).
    pub fn is_group_echo(&self) -> bool {
        matches!(
            self,
            SimError::Comm(CommError::Aborted { .. } | CommError::Disconnected { .. })
        )
    }
}

pub type SimResult<T> = Result<T, SimError>;
