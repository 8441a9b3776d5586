use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use heart_rate_relay::store::{ReadingStore, Timestamp};
use std::sync::Arc;
use std::thread;

/// Benchmark uncontended set/get pairs
fn bench_set_get(c: &mut Criterion) {
    let store = ReadingStore::detached();

    c.bench_function("set_get", |b| {
        b.iter(|| {
            store.set(black_box(72.4), Timestamp::from(black_box(1_700_000_000_000i64)));
            black_box(store.get());
        });
    });
}

/// Benchmark readers polling while one writer updates the value
fn bench_concurrent_readers(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_readers");

    for reader_count in [1, 2, 4, 8].iter() {
        group.throughput(Throughput::Elements(*reader_count as u64 * 1000));
        group.bench_with_input(
            BenchmarkId::new("readers", reader_count),
            reader_count,
            |b, &reader_count| {
                b.iter(|| {
                    let store = Arc::new(ReadingStore::detached());

                    let writer = {
                        let store = Arc::clone(&store);
                        thread::spawn(move || {
                            for i in 0..1000i64 {
                                store.set(black_box(60.0 + (i % 40) as f64), Timestamp::from(i));
                            }
                        })
                    };

                    let readers: Vec<_> = (0..reader_count)
                        .map(|_| {
                            let store = Arc::clone(&store);
                            thread::spawn(move || {
                                for _ in 0..1000 {
                                    black_box(store.get().bpm());
                                }
                            })
                        })
                        .collect();

                    writer.join().unwrap();
                    for reader in readers {
                        reader.join().unwrap();
                    }
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_set_get, bench_concurrent_readers);
criterion_main!(benches);
