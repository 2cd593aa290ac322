use std::{
    alloc::Layout,
    cmp::Ordering::*,
    fmt,
    marker::PhantomData,
    mem,
    ptr::{self, NonNull, addr_of_mut, null_mut},
};

use multiskip_pool::prelude::*;
use rand::{RngCore, SeedableRng, rngs::SmallRng};

use crate::{
    comparator::Comparator,
    error::{Error, Result},
    iterator::Iter,
    options::{MAX_LEVEL_LIMIT, SkipListOptions},
};

// A node climbs one more level with probability 1 / BRANCHING.
const BRANCHING: u32 = 2;

pub(crate) type Link<R> = *mut Node<R>;

type Update<R> = [*mut Link<R>; MAX_LEVEL_LIMIT];

#[repr(C)]
pub(crate) struct Node<R> {
    record: R,
    level: usize,
    // `level` forward links follow the header in the same slot.
    tower: [Link<R>; 0],
}

impl<R> Node<R> {
    fn layout(level: usize) -> Layout {
        assert!(level > 0);
        let size = mem::size_of::<Self>() + mem::size_of::<Link<R>>() * level;
        let align = mem::align_of::<Self>();
        Layout::from_size_align(size, align)
            .map(|l| l.pad_to_align())
            .unwrap_or_else(|_| panic!("Layout error, size: {size}, align: {align}"))
    }

    unsafe fn tower(node: *mut Self) -> *mut Link<R> {
        unsafe { addr_of_mut!((*node).tower).cast() }
    }

    pub(crate) unsafe fn next(node: *mut Self, level: usize) -> Link<R> {
        unsafe { *Self::tower(node).add(level) }
    }

    pub(crate) unsafe fn record<'a>(node: *mut Self) -> &'a R {
        unsafe { &(*node).record }
    }

    fn new_in(record: R, level: usize, allocator: &mut impl SlotAllocator) -> Result<*mut Self> {
        let p = allocator.allocate(level - 1)?.cast::<Self>().as_ptr();
        debug_assert!(p.is_aligned());

        unsafe {
            ptr::write(addr_of_mut!((*p).record), record);
            ptr::write(addr_of_mut!((*p).level), level);
            ptr::write_bytes(Self::tower(p), 0, level);
        }
        Ok(p)
    }

    /// Moves the record out and hands the slot back to the size class of its
    /// level.
    unsafe fn free_in(node: *mut Self, allocator: &mut impl SlotAllocator) -> R {
        unsafe {
            let level = (*node).level;
            let record = ptr::read(addr_of_mut!((*node).record));
            allocator.release(level - 1, NonNull::new_unchecked(node.cast()));
            record
        }
    }
}

/// Which side of a run of equal records a search stops on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bias {
    /// Stop before the first record not less than the probe.
    Before,
    /// Stop before the first record greater than the probe.
    After,
}

/// A sorted multiset of records ordered by a [`Comparator`].
///
/// Records comparing equal are all kept and stay in insertion order: lookups
/// and deletes see the earliest-inserted one first, iteration yields them in
/// the order they went in.
///
/// Nodes come from a [`SlotAllocator`] with one size class per tower height,
/// [`SizeClassPool`] by default, so steady-state inserts and deletes recycle
/// slots instead of calling the system allocator.
///
/// Not internally synchronised. Share it across threads behind a lock that
/// covers iteration as well as mutation.
pub struct MultiSkipList<R, C, A: SlotAllocator = SizeClassPool> {
    // `max_level` links, `head[i]` is the first node on lane `i`.
    head: NonNull<Link<R>>,
    max_level: usize,
    // Lanes in use, at least 1.
    level: usize,
    len: usize,
    c: C,
    a: A,
    rng: SmallRng,
    _marker: PhantomData<R>,
}

unsafe impl<R, C, A> Send for MultiSkipList<R, C, A>
where
    R: Send,
    C: Send,
    A: SlotAllocator + Send,
{
}

unsafe impl<R, C, A> Sync for MultiSkipList<R, C, A>
where
    R: Sync,
    C: Sync,
    A: SlotAllocator + Sync,
{
}

impl<R, C> MultiSkipList<R, C>
where
    C: Comparator<Item = R>,
{
    /// Builds an empty list backed by a [`SizeClassPool`]; see
    /// [`SkipListOptions`] for the remaining knobs and other allocators.
    pub fn new(max_level: usize, comparator: C, min_batch_alloc: usize) -> Result<Self> {
        SkipListOptions::new()
            .max_level(max_level)
            .min_batch_alloc(min_batch_alloc)
            .comparator(comparator)
            .build()
    }
}

impl<R, C, A> MultiSkipList<R, C, A>
where
    C: Comparator<Item = R>,
    A: SlotAllocator,
{
    pub(crate) fn from_parts(max_level: usize, c: C, a: A, seed: Option<u64>) -> Self {
        debug_assert!((1..=MAX_LEVEL_LIMIT).contains(&max_level));

        let head = vec![null_mut::<Node<R>>(); max_level].into_boxed_slice();
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };

        Self {
            head: NonNull::from(Box::leak(head)).cast(),
            max_level,
            level: 1,
            len: 0,
            c,
            a,
            rng,
            _marker: PhantomData,
        }
    }

    pub(crate) fn node_layout(level: usize) -> Layout {
        Node::<R>::layout(level)
    }

    pub fn comparator(&self) -> &C {
        &self.c
    }

    /// Inserts `record` after every record comparing equal to it.
    ///
    /// Fails only when the node cannot be allocated, in which case the list is
    /// left untouched and `record` is dropped.
    pub fn insert(&mut self, record: R) -> Result<()> {
        let head = self.head.as_ptr();
        let mut update: Update<R> = [null_mut(); MAX_LEVEL_LIMIT];
        unsafe {
            self.seek_for_update(&record, Bias::After, &mut update);
        }

        let level = self.random_level();
        let node = Node::new_in(record, level, &mut self.a)?;

        if level > self.level {
            update[self.level..level].fill(head);
            self.level = level;
        }

        unsafe {
            let tower = Node::tower(node);
            for (i, prev) in update.iter().enumerate().take(level) {
                *tower.add(i) = *prev.add(i);
                *prev.add(i) = node;
            }
        }

        self.len += 1;
        Ok(())
    }

    /// Returns the earliest-inserted record comparing equal to `probe`.
    pub fn find(&self, probe: &R) -> Option<&R> {
        let node = self.seek(probe, Bias::Before);
        unsafe {
            match node.as_ref() {
                Some(node) if self.c.compare(&node.record, probe) == Equal => Some(&node.record),
                _ => None,
            }
        }
    }

    pub fn contains(&self, probe: &R) -> bool {
        self.find(probe).is_some()
    }

    /// Every record comparing equal to `probe`, in insertion order.
    pub fn find_all(&self, probe: &R) -> Iter<'_, R> {
        Iter::new(self.seek(probe, Bias::Before), self.seek(probe, Bias::After))
    }

    /// Every record `r` with `low <= r <= high`, sorted and stable.
    pub fn range(&self, low: &R, high: &R) -> Iter<'_, R> {
        if self.c.compare(low, high) == Greater {
            return Iter::new(null_mut(), null_mut());
        }
        Iter::new(self.seek(low, Bias::Before), self.seek(high, Bias::After))
    }

    /// Removes the earliest-inserted record comparing equal to `probe` and
    /// hands it back.
    pub fn delete(&mut self, probe: &R) -> Result<R> {
        let head = self.head.as_ptr();
        let mut update: Update<R> = [null_mut(); MAX_LEVEL_LIMIT];

        unsafe {
            let target = self.seek_for_update(probe, Bias::Before, &mut update);
            match target.as_ref() {
                Some(node) if self.c.compare(&node.record, probe) == Equal => {}
                _ => return Err(Error::NotFound),
            }

            for (i, prev) in update.iter().enumerate().take((*target).level) {
                debug_assert_eq!(*prev.add(i), target);
                *prev.add(i) = Node::next(target, i);
            }

            while self.level > 1 && (*head.add(self.level - 1)).is_null() {
                self.level -= 1;
            }

            self.len -= 1;
            Ok(Node::free_in(target, &mut self.a))
        }
    }

    /// Removes every record comparing equal to `probe`, returning how many
    /// went.
    pub fn delete_all(&mut self, probe: &R) -> usize {
        let mut removed = 0;
        while self.delete(probe).is_ok() {
            removed += 1;
        }
        removed
    }

    fn random_level(&mut self) -> usize {
        let mut level = 1;
        while level < self.max_level && self.rng.next_u32() % BRANCHING == 0 {
            level += 1;
        }
        level
    }

    // Walks lane `level` starting at `tower` and returns the tower of the last
    // node left of `probe`.
    unsafe fn walk(
        &self,
        mut tower: *mut Link<R>,
        level: usize,
        probe: &R,
        bias: Bias,
    ) -> *mut Link<R> {
        unsafe {
            loop {
                let next = *tower.add(level);
                if next.is_null() {
                    return tower;
                }

                let advance = match (self.c.compare(&(*next).record, probe), bias) {
                    (Less, _) => true,
                    (Equal, Bias::After) => true,
                    _ => false,
                };
                if !advance {
                    return tower;
                }
                tower = Node::tower(next);
            }
        }
    }

    fn seek(&self, probe: &R, bias: Bias) -> Link<R> {
        let mut tower = self.head.as_ptr();
        unsafe {
            for level in (0..self.level).rev() {
                tower = self.walk(tower, level, probe, bias);
            }
            *tower
        }
    }

    // Like `seek`, also recording the predecessor tower on every lane in use.
    unsafe fn seek_for_update(&self, probe: &R, bias: Bias, update: &mut Update<R>) -> Link<R> {
        let mut tower = self.head.as_ptr();
        unsafe {
            for level in (0..self.level).rev() {
                tower = self.walk(tower, level, probe, bias);
                update[level] = tower;
            }
            *tower
        }
    }
}

impl<R, C, A> MultiSkipList<R, C, A>
where
    A: SlotAllocator,
{
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn max_level(&self) -> usize {
        self.max_level
    }

    /// Highest lane any node currently reaches.
    pub fn current_level(&self) -> usize {
        self.level
    }

    /// Records in sorted order, equal records in insertion order.
    pub fn iter(&self) -> Iter<'_, R> {
        Iter::new(self.first_node(), null_mut())
    }

    pub fn first(&self) -> Option<&R> {
        unsafe { self.first_node().as_ref().map(|node| &node.record) }
    }

    pub fn last(&self) -> Option<&R> {
        let mut tower = self.head.as_ptr();
        let mut last: Link<R> = null_mut();
        unsafe {
            for level in (0..self.level).rev() {
                while let Some(next) = NonNull::new(*tower.add(level)) {
                    last = next.as_ptr();
                    tower = Node::tower(last);
                }
            }
            last.as_ref().map(|node| &node.record)
        }
    }

    /// Drops every record and returns every node to the allocator. Batches
    /// already reserved by the pool are kept for reuse.
    ///
    /// If a record's destructor panics, the list still holds exactly the
    /// records not yet dropped.
    pub fn clear(&mut self) {
        let head = self.head.as_ptr();
        unsafe {
            while let Some(first) = NonNull::new(*head) {
                let first = first.as_ptr();
                // the first node on lane 0 also leads every lane it reaches
                for i in 0..(*first).level {
                    *head.add(i) = Node::next(first, i);
                }
                while self.level > 1 && (*head.add(self.level - 1)).is_null() {
                    self.level -= 1;
                }
                self.len -= 1;

                drop(Node::free_in(first, &mut self.a));
            }
        }
    }

    pub fn allocator(&self) -> &A {
        &self.a
    }

    /// Occupancy of the size class holding nodes of height `level`
    /// (`1..=max_level`).
    pub fn pool_stats(&self, level: usize) -> Option<Stats> {
        level.checked_sub(1).and_then(|class| self.a.stats(class))
    }

    pub fn pool_stats_total(&self) -> Stats {
        self.a.stats_total()
    }

    pub fn mem_usage(&self) -> usize {
        self.a.mem_usage()
    }

    fn first_node(&self) -> Link<R> {
        unsafe { *self.head.as_ptr() }
    }
}

impl<R, C, A> Drop for MultiSkipList<R, C, A>
where
    A: SlotAllocator,
{
    fn drop(&mut self) {
        self.clear();
        unsafe {
            drop(Box::from_raw(ptr::slice_from_raw_parts_mut(
                self.head.as_ptr(),
                self.max_level,
            )));
        }
    }
}

impl<'a, R, C, A> IntoIterator for &'a MultiSkipList<R, C, A>
where
    A: SlotAllocator,
{
    type Item = &'a R;
    type IntoIter = Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<R, C, A> fmt::Debug for MultiSkipList<R, C, A>
where
    R: fmt::Debug,
    A: SlotAllocator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
