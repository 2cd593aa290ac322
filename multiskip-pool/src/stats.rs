use std::{iter::Sum, ops::AddAssign};

/// Occupancy counters of one size class, or of a whole pool when summed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// Batches obtained from the system.
    pub batches: usize,
    /// Slots across all batches.
    pub capacity: usize,
    /// Slots handed out and not yet released.
    pub in_use: usize,
    /// Bytes across all batches.
    pub bytes: usize,
}

impl Stats {
    pub fn free(&self) -> usize {
        self.capacity - self.in_use
    }
}

impl AddAssign for Stats {
    fn add_assign(&mut self, rhs: Self) {
        self.batches += rhs.batches;
        self.capacity += rhs.capacity;
        self.in_use += rhs.in_use;
        self.bytes += rhs.bytes;
    }
}

impl Sum for Stats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Stats::default(), |mut acc, s| {
            acc += s;
            acc
        })
    }
}
