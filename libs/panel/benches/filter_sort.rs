//! Filter/sort throughput on large tables
//!
//! Run with: cargo bench -p panel

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use panel::{filter_and_sort, CaseFold, MemoryRow, MemoryTable, SortMode};

fn build_table(rows: usize) -> MemoryTable {
    (0..rows)
        .map(|i| {
            let name = format!("Documento {:05} ({})", (i * 7919) % rows, i % 13);
            MemoryRow::data(i as i64, &name)
        })
        .collect()
}

fn bench_filter_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_and_sort");

    for rows in [100, 1_000, 5_000] {
        let table = build_table(rows);

        for mode in [SortMode::Az, SortMode::Newest] {
            group.bench_with_input(
                BenchmarkId::new(mode.as_value(), rows),
                &table,
                |b, table| {
                    b.iter(|| {
                        let mut table = table.clone();
                        filter_and_sort(&mut table, black_box("documento 0"), mode, &CaseFold)
                            .unwrap()
                    })
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_filter_sort);
criterion_main!(benches);
