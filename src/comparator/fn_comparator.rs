use std::{cmp, fmt, marker::PhantomData};

use super::Comparator;

/// Adapts a plain comparison closure to [`Comparator`].
pub struct FnComparator<T, F> {
    f: F,
    _marker: PhantomData<fn(&T, &T)>,
}

pub fn from_fn<T, F>(f: F) -> FnComparator<T, F>
where
    F: Fn(&T, &T) -> cmp::Ordering + Clone,
{
    FnComparator {
        f,
        _marker: PhantomData,
    }
}

impl<T, F> Comparator for FnComparator<T, F>
where
    F: Fn(&T, &T) -> cmp::Ordering + Clone,
{
    type Item = T;

    fn compare(&self, a: &Self::Item, b: &Self::Item) -> cmp::Ordering {
        (self.f)(a, b)
    }
}

impl<T, F: Clone> Clone for FnComparator<T, F> {
    fn clone(&self) -> Self {
        Self {
            f: self.f.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T, F> fmt::Debug for FnComparator<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnComparator").finish_non_exhaustive()
    }
}
