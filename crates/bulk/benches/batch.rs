use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use dorisload_bulk::Batch;
use std::hint::black_box;

fn sample_records(count: usize, width: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| format!("{i:0width$},order,{}", i % 97).into_bytes())
        .collect()
}

fn bench_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_push");

    for count in [1_000usize, 10_000, 100_000] {
        let records = sample_records(count, 32);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::from_parameter(count), &records, |b, records| {
            b.iter(|| {
                let mut batch = Batch::with_capacity(records.len());
                for record in records {
                    batch.push(record.clone());
                }
                black_box(batch.estimated_size())
            });
        });
    }

    group.finish();
}

fn bench_payload(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_payload");

    for count in [1_000usize, 10_000, 100_000] {
        let mut batch = Batch::with_capacity(count);
        for record in sample_records(count, 64) {
            batch.push(record);
        }
        group.throughput(Throughput::Bytes(batch.estimated_size() as u64));

        group.bench_with_input(BenchmarkId::from_parameter(count), &batch, |b, batch| {
            b.iter(|| black_box(batch.to_payload()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_push, bench_payload);
criterion_main!(benches);
