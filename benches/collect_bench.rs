use criterion::{Criterion, criterion_group, criterion_main};
use procsnap::collector::HostProbe;
use procsnap::process::read_allocator_stats;
use procsnap::report;
use std::hint::black_box;

fn bench_allocator_stats(c: &mut Criterion) {
    c.bench_function("read_allocator_stats", |b| {
        b.iter(|| black_box(read_allocator_stats()))
    });
}

fn bench_collect_and_render(c: &mut Criterion) {
    c.bench_function("collect_and_render", |b| {
        b.iter(|| {
            let report = report::collect(&HostProbe).expect("collection failed");
            black_box(report::render(&report).expect("render failed"))
        })
    });
}

criterion_group!(benches, bench_allocator_stats, bench_collect_and_render);
criterion_main!(benches);
