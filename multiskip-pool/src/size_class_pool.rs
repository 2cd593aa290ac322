use std::{fmt, ptr::NonNull};

use crate::{
    FreeList, SizeClass, SlotAllocator, Stats,
    error::{Error, Result},
};

/// A family of [`FreeList`]s indexed by size class.
///
/// Classes are independent: growing one never touches another, and a slot
/// must always be released to the class it was allocated from.
pub struct SizeClassPool {
    classes: Vec<FreeList>,
}

impl SizeClassPool {
    pub fn new(classes: impl IntoIterator<Item = SizeClass>) -> Self {
        Self {
            classes: classes
                .into_iter()
                .enumerate()
                .map(|(i, class)| FreeList::new(i, class))
                .collect(),
        }
    }

    pub fn class(&self, class: usize) -> Option<&FreeList> {
        self.classes.get(class)
    }
}

impl SlotAllocator for SizeClassPool {
    fn with_size_classes(classes: Vec<SizeClass>) -> Self {
        Self::new(classes)
    }

    fn allocate(&mut self, class: usize) -> Result<NonNull<u8>> {
        self.classes
            .get_mut(class)
            .ok_or(Error::UnknownClass(class))?
            .allocate()
    }

    unsafe fn release(&mut self, class: usize, slot: NonNull<u8>) {
        debug_assert!(class < self.classes.len(), "unknown size class {class}");
        unsafe { self.classes[class].release(slot) }
    }

    fn num_classes(&self) -> usize {
        self.classes.len()
    }

    fn stats(&self, class: usize) -> Option<Stats> {
        self.classes.get(class).map(FreeList::stats)
    }
}

impl fmt::Display for SizeClassPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>5} {:>9} {:>7} {:>8} {:>10} {:>10} {:>10} {:>12}",
            "class", "slot_size", "batch", "batches", "capacity", "in_use", "free", "bytes"
        )?;
        for (i, class) in self.classes.iter().enumerate() {
            let stats = class.stats();
            writeln!(
                f,
                "{:>5} {:>9} {:>7} {:>8} {:>10} {:>10} {:>10} {:>12}",
                i,
                class.slot_layout().size(),
                class.batch(),
                stats.batches,
                stats.capacity,
                stats.in_use,
                stats.free(),
                stats.bytes
            )?;
        }

        let total = self.stats_total();
        write!(
            f,
            "{:>5} {:>9} {:>7} {:>8} {:>10} {:>10} {:>10} {:>12}",
            "total", "", "", total.batches, total.capacity, total.in_use, total.free(), total.bytes
        )
    }
}
