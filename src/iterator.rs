use std::{iter::FusedIterator, marker::PhantomData, ptr};

use crate::skip_list::{Link, Node};

/// Forward cursor over the bottom lane of a [`MultiSkipList`].
///
/// Holds a shared borrow of the list, so the list cannot be mutated while a
/// cursor is alive. Once exhausted it stays exhausted; ask the list for a new
/// one to walk again.
///
/// [`MultiSkipList`]: crate::MultiSkipList
pub struct Iter<'a, R> {
    cur: Link<R>,
    // exclusive, null for the end of the lane
    end: Link<R>,
    _marker: PhantomData<&'a R>,
}

unsafe impl<R: Sync> Send for Iter<'_, R> {}
unsafe impl<R: Sync> Sync for Iter<'_, R> {}

impl<R> Iter<'_, R> {
    pub(crate) fn new(cur: Link<R>, end: Link<R>) -> Self {
        Self {
            cur,
            end,
            _marker: PhantomData,
        }
    }
}

impl<'a, R> Iterator for Iter<'a, R> {
    type Item = &'a R;

    fn next(&mut self) -> Option<Self::Item> {
        if ptr::eq(self.cur, self.end) {
            return None;
        }

        unsafe {
            let node = self.cur;
            self.cur = Node::next(node, 0);
            Some(Node::record(node))
        }
    }
}

impl<R> FusedIterator for Iter<'_, R> {}

impl<R> Clone for Iter<'_, R> {
    fn clone(&self) -> Self {
        Self::new(self.cur, self.end)
    }
}
