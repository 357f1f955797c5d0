//! Single-file checkpoint of the whole distributed state.
//!
//! Layout: native-endian `i32` iteration, then every body of the system in
//! ascending worker order and local order, 56 bytes each with no padding
//! or endianness normalization. Per-worker block sizes are not stored; they
//! follow from the partition scheme. Only the coordinator touches the file.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use bytemuck::Zeroable;
use tracing::{error, info};

use crate::comm::{Communicator, COORDINATOR};
use crate::error::{SimError, SimResult};
use crate::simulation::states::{Body, SimulationState, BODY_BYTES};

pub const CHECKPOINT_FILE: &str = "checkpoint.dat";

const ITERATION_BYTES: usize = std::mem::size_of::<i32>();

pub fn checkpoint_path(results_dir: &Path) -> PathBuf {
    results_dir.join(CHECKPOINT_FILE)
}

/// Expected file length for a system of `total` bodies.
pub fn checkpoint_len(total: usize) -> u64 {
    (ITERATION_BYTES + total * BODY_BYTES) as u64
}

pub struct CheckpointWriter {
    path: PathBuf,
    inner: BufWriter<File>,
}

impl CheckpointWriter {
    /// Create or truncate the checkpoint at `path`.
    pub fn create(path: &Path) -> SimResult<Self> {
        let file = File::create(path).map_err(|source| SimError::CheckpointOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            inner: BufWriter::new(file),
        })
    }

    fn io_err(&self, source: io::Error) -> SimError {
        SimError::CheckpointIo {
            path: self.path.clone(),
            source,
        }
    }

    pub fn write_iteration(&mut self, iteration: i32) -> SimResult<()> {
        self.inner
            .write_all(&iteration.to_ne_bytes())
            .map_err(|e| self.io_err(e))
    }

    pub fn write_bodies(&mut self, bodies: &[Body]) -> SimResult<()> {
        self.inner
            .write_all(bytemuck::cast_slice(bodies))
            .map_err(|e| self.io_err(e))
    }

    /// Flush and sync; the checkpoint is only complete once this succeeds.
    pub fn finish(mut self) -> SimResult<()> {
        self.inner.flush().map_err(|e| self.io_err(e))?;
        self.inner.get_ref().sync_all().map_err(|e| self.io_err(e))
    }
}

pub struct CheckpointReader {
    path: PathBuf,
    inner: BufReader<File>,
}

impl CheckpointReader {
    pub fn open(path: &Path) -> SimResult<Self> {
        let file = File::open(path).map_err(|source| SimError::CheckpointOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            inner: BufReader::new(file),
        })
    }

    /// Open and check the file holds exactly `total` bodies.
    pub fn open_expecting(path: &Path, total: usize) -> SimResult<Self> {
        let reader = Self::open(path)?;
        let len = reader
            .inner
            .get_ref()
            .metadata()
            .map_err(|e| reader.io_err(e))?
            .len();
        let expected = checkpoint_len(total);
        if len != expected {
            return Err(reader.io_err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("checkpoint is {len} bytes, expected {expected} for {total} bodies"),
            )));
        }
        Ok(reader)
    }

    fn io_err(&self, source: io::Error) -> SimError {
        SimError::CheckpointIo {
            path: self.path.clone(),
            source,
        }
    }

    pub fn read_iteration(&mut self) -> SimResult<i32> {
        let mut raw = [0u8; ITERATION_BYTES];
        self.inner.read_exact(&mut raw).map_err(|e| self.io_err(e))?;
        Ok(i32::from_ne_bytes(raw))
    }

    /// Replace the contents of `buf` with the next `count` records.
    pub fn read_bodies_into(&mut self, buf: &mut Vec<Body>, count: usize) -> SimResult<()> {
        buf.clear();
        buf.resize(count, Body::zeroed());
        self.inner
            .read_exact(bytemuck::cast_slice_mut(buf.as_mut_slice()))
            .map_err(|e| self.io_err(e))
    }
}

/// Collective checkpoint of iteration `iteration`.
///
/// Non-coordinators hand their partition to worker 0 and return. The
/// coordinator writes the file; on any I/O failure it aborts the group.
pub fn checkpoint_state<C: Communicator + ?Sized>(
    comm: &C,
    state: &SimulationState,
    scratch: &mut Vec<Body>,
    iteration: i32,
    path: &Path,
) -> SimResult<()> {
    if !comm.is_coordinator() {
        comm.send_bodies(COORDINATOR, &state.local)?;
        return Ok(());
    }

    match write_checkpoint(comm, state, scratch, iteration, path) {
        Ok(()) => {
            info!(iteration, path = %path.display(), "checkpoint written");
            Ok(())
        }
        Err(e) if e.is_group_echo() => Err(e),
        Err(e) => {
            error!(error = %e, "checkpoint failed, aborting");
            comm.abort(1);
            Err(e)
        }
    }
}

fn write_checkpoint<C: Communicator + ?Sized>(
    comm: &C,
    state: &SimulationState,
    scratch: &mut Vec<Body>,
    iteration: i32,
    path: &Path,
) -> SimResult<()> {
    let mut writer = CheckpointWriter::create(path)?;
    writer.write_iteration(iteration)?;
    writer.write_bodies(&state.local)?;
    for rank in 1..comm.size() {
        let expected = state.partition.of(rank).len();
        comm.recv_bodies_into(rank, scratch, expected)?;
        writer.write_bodies(scratch)?;
    }
    writer.finish()
}
