//! Benchmarks for row windowing, sorting and filtering.
//!
//! Run with: cargo bench
//!
//! Results are saved to `target/criterion/` with HTML reports.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::cast_possible_truncation
)]

use atable::grid::{FetchTicket, GridConfig, GridController};
use atable::layout::{WindowEngine, BUFFER_ROWS};
use atable::render::MemorySurface;
use atable::rows::{RowSet, RowStore};
use atable::{CellValue, ColumnSpec, SortDirection};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn dataset(rows: usize, cols: usize) -> Vec<Vec<CellValue>> {
    let mut rng = fastrand::Rng::with_seed(1);
    (0..rows)
        .map(|_| {
            (0..cols)
                .map(|c| {
                    if c % 2 == 0 {
                        CellValue::Number(rng.f64() * 1e6)
                    } else {
                        CellValue::Text(format!("item-{}", rng.u32(..)))
                    }
                })
                .collect()
        })
        .collect()
}

fn grid(rows: usize) -> GridController<MemorySurface, fn(FetchTicket)> {
    let columns = (0..6).map(|i| ColumnSpec::new(format!("c{i}"))).collect();
    let mut grid = GridController::new(
        GridConfig::new(columns, 600),
        MemorySurface::new(20),
        (|_| {}) as fn(FetchTicket),
    )
    .expect("valid config");
    grid.render().expect("render");
    grid.receive(grid.current_ticket(), dataset(rows, 6), false)
        .expect("deliver");
    grid
}

/// Engine transitions only, one row per step
fn bench_engine_sweep(c: &mut Criterion) {
    let count = 100_000;
    c.bench_function("engine_sweep_100k", |b| {
        b.iter(|| {
            let mut engine = WindowEngine::new(600, BUFFER_ROWS, None);
            engine.set_row_height(20);
            for offset in (0..count as u32 * 20).step_by(20) {
                black_box(engine.scroll_to(offset, count));
            }
        })
    });
}

/// Full scroll path including surface updates
fn bench_grid_scroll(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_scroll");
    for step in [20u32, 300, 5_000] {
        let mut g = grid(50_000);
        group.throughput(Throughput::Elements(1_000));
        group.bench_with_input(BenchmarkId::new("step", step), &step, |b, &step| {
            b.iter(|| {
                for i in 0..1_000u32 {
                    g.scroll_to(black_box(i * step % 1_000_000)).expect("scroll");
                }
            })
        });
    }
    group.finish();
}

/// Sorting by number and by text
fn bench_sort(c: &mut Criterion) {
    let rows = dataset(100_000, 2);
    let mut group = c.benchmark_group("sort_100k");
    group.throughput(Throughput::Elements(rows.len() as u64));
    for (name, column) in [("number", 0usize), ("text", 1)] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut set = RowSet::new(2);
                set.reset(rows.clone());
                set.sort(column, Some(SortDirection::Descending)).expect("sort");
                black_box(set.visible_count())
            })
        });
    }
    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let mut set = RowSet::new(2);
    set.reset(dataset(100_000, 2));
    let mut needles = ["12", "345"].iter().cycle();
    c.bench_function("filter_100k", |b| {
        b.iter(|| {
            let needle = needles.next().expect("cycle");
            set.filter(1, black_box(needle), false).expect("filter");
            black_box(set.visible_count())
        })
    });
}

criterion_group!(
    benches,
    bench_engine_sweep,
    bench_grid_scroll,
    bench_sort,
    bench_filter,
);

criterion_main!(benches);
