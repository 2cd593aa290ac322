use std::cmp;

mod default_comparator;
mod fn_comparator;

pub mod prelude {
    #![allow(unused)]

    pub use super::{
        Comparator,
        default_comparator::DefaultComparator,
        fn_comparator::{FnComparator, from_fn},
    };
}

/// Orders the records stored in a skip list.
///
/// Records that compare [`Equal`](cmp::Ordering::Equal) may coexist; the list
/// keeps them in insertion order.
pub trait Comparator: Clone {
    type Item;

    fn compare(&self, a: &Self::Item, b: &Self::Item) -> cmp::Ordering;
}
