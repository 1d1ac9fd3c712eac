use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use pagestream::pagination::{plan, PartialPage};
use pagestream::pipeline::Pipeline;
use pagestream::sources::NumberSource;

fn bench_planning(c: &mut Criterion) {
    let mut group = c.benchmark_group("planning");

    for total in [100usize, 10_000, 1_000_000].iter() {
        group.bench_with_input(BenchmarkId::new("plan", total), total, |b, &total| {
            b.iter(|| plan(black_box(total), black_box(10), PartialPage::Include).unwrap());
        });
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let runtime = tokio::runtime::Runtime::new().unwrap();

    for size in [100usize, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("sequential", size), size, |b, &size| {
            b.iter(|| {
                runtime.block_on(async {
                    Pipeline::new(NumberSource::new(size))
                        .sequential()
                        .buffer_size(64)
                        .spawn()
                        .collect()
                        .await
                        .unwrap()
                })
            });
        });

        for workers in [2usize, 8].iter() {
            group.bench_with_input(
                BenchmarkId::new(format!("concurrent_{}", workers), size),
                size,
                |b, &size| {
                    b.iter(|| {
                        runtime.block_on(async {
                            Pipeline::new(NumberSource::new(size))
                                .max_concurrency(*workers)
                                .buffer_size(64)
                                .spawn()
                                .collect()
                                .await
                                .unwrap()
                        })
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_channel_capacity(c: &mut Criterion) {
    let mut group = c.benchmark_group("channel_capacity");
    let runtime = tokio::runtime::Runtime::new().unwrap();

    for capacity in [1usize, 16, 256].iter() {
        group.bench_with_input(
            BenchmarkId::new("buffer", capacity),
            capacity,
            |b, &capacity| {
                b.iter(|| {
                    runtime.block_on(async {
                        Pipeline::new(NumberSource::new(5000))
                            .buffer_size(capacity)
                            .spawn()
                            .finish()
                            .await
                            .unwrap()
                    })
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_planning, bench_pipeline, bench_channel_capacity);
criterion_main!(benches);
