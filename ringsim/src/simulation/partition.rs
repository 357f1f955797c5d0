//! Block partition of the global body index space across workers.
//!
//! Worker `r` of `size` owns `total / size` bodies, plus one more when
//! `r < total % size`. Ranges are contiguous and ascending, so the owner of
//! any global index is computable without communication.

use std::ops::Range;

/// Number of bodies owned by `rank`.
pub fn partition_size(total: usize, size: usize, rank: usize) -> usize {
    debug_assert!(size > 0, "worker group cannot be empty");
    let base = total / size;
    let remainder = total % size; // the first `remainder` ranks get one extra
    if rank < remainder {
        base + 1
    } else {
        base
    }
}

/// Global index of the first body owned by `rank`.
pub fn partition_offset(total: usize, size: usize, rank: usize) -> usize {
    let base = total / size;
    let remainder = total % size;
    rank * base + rank.min(remainder)
}

/// Buffer capacity able to hold any worker's partition.
pub fn node_max(total: usize, size: usize) -> usize {
    total / size + 1
}

/// One worker's share of the global index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub total: usize, // total bodies in the run
    pub size: usize, // number of workers
    pub rank: usize, // owner
}

impl Partition {
    pub fn new(total: usize, size: usize, rank: usize) -> Self {
        Self { total, size, rank }
    }

    pub fn len(&self) -> usize {
        partition_size(self.total, self.size, self.rank)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn offset(&self) -> usize {
        partition_offset(self.total, self.size, self.rank)
    }

    pub fn range(&self) -> Range<usize> {
        let start = self.offset();
        start..start + self.len()
    }

    pub fn node_max(&self) -> usize {
        node_max(self.total, self.size)
    }

    /// Partition of another worker in the same group.
    pub fn of(&self, rank: usize) -> Partition {
        Partition::new(self.total, self.size, rank)
    }
}
