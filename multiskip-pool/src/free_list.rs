use std::{
    alloc::{self, Layout},
    mem,
    ptr::NonNull,
};

use crate::{
    SizeClass, Stats,
    error::{Error, Result},
};

// Header written into a slot while it sits on the free list.
struct FreeSlot {
    next: Option<NonNull<FreeSlot>>,
}

/// Fixed-size slot allocator for a single size class.
///
/// Slots are carved out of batches obtained with one system allocation each.
/// Released slots go back onto an intrusive LIFO list and are reused before
/// the list grows again. Batches are only returned to the system when the
/// free list itself is dropped, so every slot handed out must be released (or
/// abandoned) before that.
pub struct FreeList {
    class: usize,
    slot: Layout,
    batch: usize,
    head: Option<NonNull<FreeSlot>>,
    batches: Vec<(NonNull<u8>, Layout)>,
    capacity: usize,
    in_use: usize,
    bytes: usize,
}

unsafe impl Send for FreeList {}
unsafe impl Sync for FreeList {}

impl FreeList {
    pub fn new(class: usize, size_class: SizeClass) -> Self {
        Self {
            class,
            slot: slot_layout(size_class.layout),
            batch: size_class.batch.max(1),
            head: None,
            batches: Vec::new(),
            capacity: 0,
            in_use: 0,
            bytes: 0,
        }
    }

    /// Layout of one slot after padding it to fit a free-list link.
    pub fn slot_layout(&self) -> Layout {
        self.slot
    }

    pub fn batch(&self) -> usize {
        self.batch
    }

    pub fn allocate(&mut self) -> Result<NonNull<u8>> {
        let slot = match self.head {
            Some(slot) => slot,
            None => self.grow()?,
        };

        unsafe {
            self.head = (*slot.as_ptr()).next;
        }
        self.in_use += 1;
        Ok(slot.cast())
    }

    /// # Safety
    ///
    /// `slot` must have been returned by [`FreeList::allocate`] on this list
    /// and must not be released twice.
    pub unsafe fn release(&mut self, slot: NonNull<u8>) {
        debug_assert!(self.in_use > 0, "release on an idle size class");
        debug_assert_eq!(slot.as_ptr().align_offset(self.slot.align()), 0);

        let slot = slot.cast::<FreeSlot>();
        unsafe {
            slot.write(FreeSlot { next: self.head });
        }
        self.head = Some(slot);
        self.in_use -= 1;
    }

    pub fn stats(&self) -> Stats {
        Stats {
            batches: self.batches.len(),
            capacity: self.capacity,
            in_use: self.in_use,
            bytes: self.bytes,
        }
    }

    fn grow(&mut self) -> Result<NonNull<FreeSlot>> {
        let size = self.slot.size();
        let layout = size
            .checked_mul(self.batch)
            .and_then(|bytes| Layout::from_size_align(bytes, self.slot.align()).ok());
        let Some(layout) = layout else {
            return Err(self.out_of_memory(size.saturating_mul(self.batch)));
        };

        let Some(base) = NonNull::new(unsafe { alloc::alloc(layout) }) else {
            return Err(self.out_of_memory(layout.size()));
        };

        // Threaded back to front so a fresh batch hands out ascending addresses.
        for i in (0..self.batch).rev() {
            unsafe {
                let slot = base.add(i * size).cast::<FreeSlot>();
                slot.write(FreeSlot { next: self.head });
                self.head = Some(slot);
            }
        }

        self.batches.push((base, layout));
        self.capacity += self.batch;
        self.bytes += layout.size();

        tracing::debug!(
            class = self.class,
            slots = self.batch,
            bytes = layout.size(),
            batches = self.batches.len(),
            "size class grown"
        );

        Ok(base.cast())
    }

    fn out_of_memory(&self, bytes: usize) -> Error {
        tracing::error!(class = self.class, bytes, "size class batch allocation failed");
        Error::OutOfMemory {
            class: self.class,
            bytes,
        }
    }
}

impl Drop for FreeList {
    fn drop(&mut self) {
        if self.batches.is_empty() {
            return;
        }

        tracing::trace!(
            class = self.class,
            batches = self.batches.len(),
            in_use = self.in_use,
            "releasing size class batches"
        );

        unsafe {
            for (ptr, layout) in self.batches.drain(..) {
                alloc::dealloc(ptr.as_ptr(), layout);
            }
        }
    }
}

fn slot_layout(layout: Layout) -> Layout {
    let size = layout.size().max(mem::size_of::<FreeSlot>());
    let align = layout.align().max(mem::align_of::<FreeSlot>());
    Layout::from_size_align(size, align)
        .map(|l| l.pad_to_align())
        .unwrap_or_else(|_| panic!("Layout error, size: {size}, align: {align}"))
}
