use std::alloc::Layout;

use multiskip_pool::prelude::*;

use crate::{
    comparator::Comparator,
    error::{Error, Result},
    skip_list::MultiSkipList,
};

/// Upper bound for `max_level`; the search keeps its update chain on the stack.
pub const MAX_LEVEL_LIMIT: usize = 32;

/// Largest batch any single level grows by.
pub const MAX_BATCH_ALLOC: usize = 1 << 16;

pub const DEFAULT_MAX_LEVEL: usize = 16;

pub const DEFAULT_MIN_BATCH_ALLOC: usize = 32;

#[derive(Debug, Clone)]
pub struct SkipListOptions<C> {
    max_level: usize,

    min_batch_alloc: usize,

    comparator: Option<C>,

    seed: Option<u64>,
}

impl<C> Default for SkipListOptions<C> {
    fn default() -> Self {
        Self {
            max_level: DEFAULT_MAX_LEVEL,
            min_batch_alloc: DEFAULT_MIN_BATCH_ALLOC,
            comparator: None,
            seed: None,
        }
    }
}

impl<C> SkipListOptions<C>
where
    C: Comparator,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Tallest tower a node may get. Around `log2(expected records)` is a good
    /// pick.
    pub fn max_level(&mut self, max_level: usize) -> &mut Self {
        self.max_level = max_level;
        self
    }

    /// Slots the top level reserves per growth step; each lower level doubles it.
    pub fn min_batch_alloc(&mut self, min_batch_alloc: usize) -> &mut Self {
        self.min_batch_alloc = min_batch_alloc;
        self
    }

    pub fn comparator(&mut self, comparator: C) -> &mut Self {
        self.comparator = Some(comparator);
        self
    }

    /// Fixes the level generator's seed, making tower heights reproducible.
    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(&self) -> Result<MultiSkipList<C::Item, C>> {
        self.build_in()
    }

    pub fn build_in<A>(&self) -> Result<MultiSkipList<C::Item, C, A>>
    where
        A: SlotAllocator,
    {
        let comparator = self.validate()?;
        let classes = size_classes(
            MultiSkipList::<C::Item, C, A>::node_layout,
            self.max_level,
            self.min_batch_alloc,
        );
        tracing::debug!(
            max_level = self.max_level,
            top_batch = classes.last().map(|c| c.batch),
            bottom_batch = classes.first().map(|c| c.batch),
            "building multi skip list"
        );

        Ok(MultiSkipList::from_parts(
            self.max_level,
            comparator,
            A::with_size_classes(classes),
            self.seed,
        ))
    }

    fn validate(&self) -> Result<C> {
        if !(1..=MAX_LEVEL_LIMIT).contains(&self.max_level) {
            return Err(Error::InvalidArgument(format!(
                "max_level must be within 1..={MAX_LEVEL_LIMIT}, got {}",
                self.max_level
            )));
        }
        if self.min_batch_alloc == 0 {
            return Err(Error::InvalidArgument(
                "min_batch_alloc must be at least 1".to_string(),
            ));
        }
        self.comparator
            .clone()
            .ok_or_else(|| Error::InvalidArgument("comparator is required".to_string()))
    }
}

/// One size class per level `1..=max_level`, stored at index `level - 1`.
fn size_classes(
    node_layout: impl Fn(usize) -> Layout,
    max_level: usize,
    min_batch_alloc: usize,
) -> Vec<SizeClass> {
    (1..=max_level)
        .map(|level| SizeClass::new(node_layout(level), level_batch(level, max_level, min_batch_alloc)))
        .collect()
}

fn level_batch(level: usize, max_level: usize, min_batch_alloc: usize) -> usize {
    let shift = (max_level - level) as u32;
    min_batch_alloc
        .checked_shl(shift)
        .filter(|batch| batch >> shift == min_batch_alloc)
        .unwrap_or(usize::MAX)
        .min(MAX_BATCH_ALLOC)
        .max(min_batch_alloc)
}
