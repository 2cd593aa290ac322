//! Size-class slot allocators.
//!
//! A [`SizeClassPool`] keeps one batch-grown free list per size class, so
//! objects whose size depends on a small integer (a skip list node's level,
//! for instance) can be recycled without a system allocation per object and
//! without rounding every object up to the largest class.

use std::{alloc::Layout, ptr::NonNull};

mod free_list;
mod size_class_pool;
mod stats;
mod system_allocator;

pub mod error;

pub use error::{Error, Result};
pub use free_list::FreeList;
pub use size_class_pool::SizeClassPool;
pub use stats::Stats;
pub use system_allocator::SystemAllocator;

pub mod prelude {
    #![allow(unused)]

    pub use super::{SizeClass, SizeClassPool, SlotAllocator, Stats, SystemAllocator};
}

/// Shape of one size class: the slot layout and how many slots a single
/// growth step reserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeClass {
    pub layout: Layout,
    pub batch: usize,
}

impl SizeClass {
    pub fn new(layout: Layout, batch: usize) -> Self {
        Self {
            layout,
            batch: batch.max(1),
        }
    }
}

pub trait SlotAllocator {
    fn with_size_classes(classes: Vec<SizeClass>) -> Self
    where
        Self: Sized;

    /// Hands out an uninitialised slot of size class `class`.
    fn allocate(&mut self, class: usize) -> Result<NonNull<u8>>;

    /// # Safety
    ///
    /// `slot` must come from `allocate(class)` on this allocator and must not
    /// have been released since. Releasing twice corrupts the free list.
    unsafe fn release(&mut self, class: usize, slot: NonNull<u8>);

    fn num_classes(&self) -> usize;

    fn stats(&self, class: usize) -> Option<Stats>;

    fn stats_total(&self) -> Stats {
        (0..self.num_classes())
            .filter_map(|class| self.stats(class))
            .sum()
    }

    /// Bytes currently obtained from the system.
    fn mem_usage(&self) -> usize {
        self.stats_total().bytes
    }
}
