//! Randomized checks of slicing invariants over seeded synthetic stores.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::thread;

use arrow::array::RecordBatch;
use arrow::datatypes::TimeUnit;
use chrono::{DateTime, TimeDelta, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ts_cutter_core::synth::{SynthSpec, make_table, make_tables};
use ts_cutter_core::time_column::TimeColumn;
use ts_cutter_core::{SliceOptions, TableStore, Window, slice, slice_with};

type TestResult = Result<(), Box<dyn std::error::Error>>;

const UNITS: [TimeUnit; 4] = [
    TimeUnit::Second,
    TimeUnit::Millisecond,
    TimeUnit::Microsecond,
    TimeUnit::Nanosecond,
];

fn random_store(rng: &mut StdRng, unit: TimeUnit) -> TableStore {
    let tables = (0..rng.random_range(1..12usize)).map(|i| {
        let spec = SynthSpec::default()
            .with_rows(rng.random_range(0..300))
            .with_columns(rng.random_range(0..4))
            .with_unit(unit)
            .with_step(TimeDelta::seconds(rng.random_range(1..90)))
            .with_max_repeat(rng.random_range(1..5));
        (format!("sensor-{i:02}"), make_table(&mut *rng, &spec).unwrap())
    });
    let tables: Vec<(String, RecordBatch)> = tables.collect();
    TableStore::new(tables).unwrap()
}

fn random_bound(rng: &mut StdRng, base: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if rng.random_bool(0.2) {
        None
    } else {
        // Spans a little before the first row to well past the last, with
        // sub-second offsets so bounds fall between column ticks.
        Some(base + TimeDelta::milliseconds(rng.random_range(-60_000..8 * 3_600_000)))
    }
}

fn timestamps(table: &RecordBatch, unit: TimeUnit) -> Vec<DateTime<Utc>> {
    let col = TimeColumn::resolve(table, "TS").unwrap();
    col.values()
        .iter()
        .map(|&v| match unit {
            TimeUnit::Second => DateTime::from_timestamp(v, 0),
            TimeUnit::Millisecond => DateTime::from_timestamp_millis(v),
            TimeUnit::Microsecond => DateTime::from_timestamp_micros(v),
            TimeUnit::Nanosecond => Some(DateTime::from_timestamp_nanos(v)),
        })
        .map(Option::unwrap)
        .collect()
}

#[test]
fn sliced_rows_are_exactly_the_rows_in_window() -> TestResult {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let base = SynthSpec::default().start;

    for round in 0..40 {
        let unit = UNITS[round % UNITS.len()];
        let store = random_store(&mut rng, unit);

        for _ in 0..10 {
            let window = Window::new(random_bound(&mut rng, base), random_bound(&mut rng, base));
            let out = slice(&store, window, false)?;
            assert_eq!(out.len(), store.len());

            for (name, source) in &store {
                let sliced = &out[name];
                assert_eq!(sliced.schema(), source.schema());

                let expected: Vec<_> = timestamps(source, unit)
                    .into_iter()
                    .filter(|ts| window.contains(*ts))
                    .collect();
                assert_eq!(
                    timestamps(sliced, unit),
                    expected,
                    "table {name} window {window} unit {unit:?}"
                );
            }
        }
    }
    Ok(())
}

#[test]
fn parallel_and_sequential_agree() -> TestResult {
    let mut rng = StdRng::seed_from_u64(99);
    let base = SynthSpec::default().start;

    for round in 0..20 {
        let store = random_store(&mut rng, UNITS[round % UNITS.len()]);
        for _ in 0..5 {
            let window = Window::new(random_bound(&mut rng, base), random_bound(&mut rng, base));
            let sequential = slice(&store, window, false)?;
            let parallel = slice(&store, window, true)?;
            let pooled = slice_with(&store, window, &SliceOptions::parallel().with_threads(2))?;
            assert_eq!(sequential, parallel);
            assert_eq!(sequential, pooled);
        }
    }
    Ok(())
}

#[test]
fn unbounded_window_conserves_rows() -> TestResult {
    let mut rng = StdRng::seed_from_u64(3);
    for unit in UNITS {
        let store = random_store(&mut rng, unit);
        for parallel in [false, true] {
            let out = slice(&store, Window::unbounded(), parallel)?;
            let total: u64 = out.values().map(|t| t.num_rows() as u64).sum();
            assert_eq!(total, store.total_row_count());
            for (name, table) in &store {
                assert_eq!(&out[name], table);
            }
        }
    }
    Ok(())
}

#[test]
fn inverted_windows_are_always_empty() -> TestResult {
    let mut rng = StdRng::seed_from_u64(11);
    let base = SynthSpec::default().start;
    let store = random_store(&mut rng, TimeUnit::Millisecond);

    for _ in 0..50 {
        let a = base + TimeDelta::seconds(rng.random_range(0..20_000));
        let b = a + TimeDelta::milliseconds(rng.random_range(1..600_000));
        let out = slice(&store, Window::between(b, a), rng.random_bool(0.5))?;
        assert!(out.values().all(|t| t.num_rows() == 0));
    }
    Ok(())
}

#[test]
fn concurrent_slices_share_one_store() -> TestResult {
    let mut rng = StdRng::seed_from_u64(2024);
    let spec = SynthSpec::default().with_rows(2_000).with_max_repeat(3);
    let store = Arc::new(TableStore::new(make_tables(&mut rng, 16, &spec)?)?);
    let base = spec.start;

    let handles: Vec<_> = (0..8i64)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let window = Window::between(
                    base + TimeDelta::minutes(i * 100),
                    base + TimeDelta::minutes(i * 100 + 250),
                );
                let parallel = slice(&store, window, true).unwrap();
                let sequential = slice(&store, window, false).unwrap();
                assert_eq!(parallel, sequential);
                parallel.values().map(|t| t.num_rows()).sum::<usize>()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap() > 0);
    }
    assert_eq!(store.total_row_count(), 16 * 2_000);
    Ok(())
}
