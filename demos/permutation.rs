//! Feeds a shuffled permutation through a list twice, checking every
//! round trip and logging timings, then runs a small stable-sort check.
//!
//! `RUST_LOG=debug cargo run --release --example permutation`

use std::time::Instant;

use multiskip::{MultiSkipList, comparator::prelude::*};
use rand::{Rng, seq::SliceRandom};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const COUNT: u32 = 1_280_000;
const LEVEL_COUNT: usize = 18;
const MIN_ALLOC_ONCE: usize = 32;

type List<'a> = MultiSkipList<&'a u32, DefaultComparator<&'a u32>>;

fn test_insert<'a>(list: &mut List<'a>, numbers: &'a [u32]) -> anyhow::Result<()> {
    let start = Instant::now();
    for n in numbers {
        list.insert(n)?;
    }
    tracing::info!(elapsed = ?start.elapsed(), "insert");

    let start = Instant::now();
    for n in numbers {
        let found = list.find(&n);
        anyhow::ensure!(found == Some(&n), "{n} not found after insert");
    }
    tracing::info!(elapsed = ?start.elapsed(), "find");

    let start = Instant::now();
    let mut expected = 1;
    for n in list.iter() {
        anyhow::ensure!(**n == expected, "expected {expected}, iterated {n}");
        expected += 1;
    }
    anyhow::ensure!(expected - 1 == COUNT, "iterated {} records", expected - 1);
    tracing::info!(elapsed = ?start.elapsed(), "iterate");

    Ok(())
}

fn test_delete<'a>(list: &mut List<'a>, numbers: &'a [u32]) -> anyhow::Result<()> {
    let start = Instant::now();
    for n in numbers {
        list.delete(&n)?;
    }
    tracing::info!(elapsed = ?start.elapsed(), "delete");

    let start = Instant::now();
    for n in numbers {
        anyhow::ensure!(list.find(&n).is_none(), "{n} found after delete");
    }
    tracing::info!(elapsed = ?start.elapsed(), "find after delete");

    anyhow::ensure!(list.iter().count() == 0, "list not empty after delete");
    Ok(())
}

struct Record {
    line: usize,
    key: usize,
}

fn test_stable_sort() -> anyhow::Result<()> {
    const RECORDS: usize = 20;

    let mut rng = rand::rng();
    let mut records = (0..RECORDS)
        .map(|i| Record {
            line: i + 1,
            key: i + 1,
        })
        .collect::<Vec<_>>();
    for _ in 0..RECORDS / 4 {
        let index1 = rng.random_range(0..RECORDS);
        let index2 = RECORDS - 1 - index1;
        if index1 != index2 {
            records[index1].key = records[index2].key;
        }
    }

    let mut list = MultiSkipList::new(12, from_fn::<&Record, _>(|a, b| a.key.cmp(&b.key)), 128)?;
    for r in &records {
        list.insert(r)?;
    }
    for r in &records {
        let found = list.find(&r);
        anyhow::ensure!(found.map(|f| f.key) == Some(r.key), "key {} lost", r.key);
    }

    let mut count = 0;
    let mut prev: Option<&Record> = None;
    for r in list.iter() {
        println!("{} => #{}", r.key, r.line);
        if let Some(p) = prev {
            anyhow::ensure!(
                p.key < r.key || (p.key == r.key && p.line < r.line),
                "#{} out of order",
                r.line
            );
        }
        prev = Some(*r);
        count += 1;
    }
    anyhow::ensure!(count == RECORDS, "iterated {count} records");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut numbers = (1..=COUNT).collect::<Vec<_>>();
    numbers.shuffle(&mut rand::rng());

    let mut list = MultiSkipList::new(LEVEL_COUNT, DefaultComparator::default(), MIN_ALLOC_ONCE)?;

    test_insert(&mut list, &numbers)?;
    tracing::info!("pool statistics\n{}", list.allocator());
    test_delete(&mut list, &numbers)?;

    test_insert(&mut list, &numbers)?;
    test_delete(&mut list, &numbers)?;
    drop(list);

    test_stable_sort()?;

    println!("pass OK");
    Ok(())
}
