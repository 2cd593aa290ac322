//! An ordered multiset of caller-owned records.
//!
//! [`MultiSkipList`] keeps records sorted by a caller-supplied [`Comparator`],
//! allows any number of records to compare equal and keeps those in insertion
//! order. Nodes are recycled through a per-level [`SizeClassPool`], so a list
//! at steady size does not touch the system allocator.
//!
//! ```
//! use multiskip::{MultiSkipList, comparator::prelude::*};
//!
//! struct Order {
//!     id: u32,
//!     price: u64,
//! }
//!
//! let orders = [
//!     Order { id: 1, price: 30 },
//!     Order { id: 2, price: 10 },
//!     Order { id: 3, price: 30 },
//! ];
//!
//! let mut book = MultiSkipList::new(8, from_fn::<&Order, _>(|a, b| a.price.cmp(&b.price)), 32)?;
//! for order in &orders {
//!     book.insert(order)?;
//! }
//!
//! let ids = book.iter().map(|o| o.id).collect::<Vec<_>>();
//! assert_eq!(ids, [2, 1, 3]);
//! # Ok::<(), multiskip::error::Error>(())
//! ```

mod iterator;
mod skip_list;

#[cfg(test)]
mod test_utils;

pub mod comparator;
pub mod error;
pub mod options;

pub use iterator::Iter;
pub use multiskip_pool::{SizeClass, SizeClassPool, SlotAllocator, Stats, SystemAllocator};
pub use skip_list::MultiSkipList;
