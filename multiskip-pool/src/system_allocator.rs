use std::{
    alloc::{self, Layout},
    ptr::NonNull,
};

use crate::{
    SizeClass, SlotAllocator, Stats,
    error::{Error, Result},
};

/// Allocates every slot straight from the global allocator.
///
/// No pooling at all; mainly useful as a baseline against [`SizeClassPool`].
///
/// [`SizeClassPool`]: crate::SizeClassPool
#[derive(Debug, Default)]
pub struct SystemAllocator {
    classes: Vec<(Layout, usize)>,
}

impl SlotAllocator for SystemAllocator {
    fn with_size_classes(classes: Vec<SizeClass>) -> Self {
        Self {
            classes: classes.into_iter().map(|c| (c.layout, 0)).collect(),
        }
    }

    fn allocate(&mut self, class: usize) -> Result<NonNull<u8>> {
        let (layout, live) = self
            .classes
            .get_mut(class)
            .ok_or(Error::UnknownClass(class))?;

        let ptr = unsafe { alloc::alloc(*layout) };
        let ptr = NonNull::new(ptr).ok_or(Error::OutOfMemory {
            class,
            bytes: layout.size(),
        })?;
        *live += 1;
        Ok(ptr)
    }

    unsafe fn release(&mut self, class: usize, slot: NonNull<u8>) {
        let (layout, live) = &mut self.classes[class];
        unsafe { alloc::dealloc(slot.as_ptr(), *layout) };
        *live -= 1;
    }

    fn num_classes(&self) -> usize {
        self.classes.len()
    }

    fn stats(&self, class: usize) -> Option<Stats> {
        self.classes.get(class).map(|(layout, live)| Stats {
            batches: *live,
            capacity: *live,
            in_use: *live,
            bytes: layout.size() * live,
        })
    }
}
