//! Collective operations of the worker group: start-up, the ring force
//! step, checkpointing and diagnostic gathers.

pub mod checkpoint;
pub mod gather;
pub mod init;
pub mod ring;
