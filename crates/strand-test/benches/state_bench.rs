//! Benchmarks for Strand state operations

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use strand_core::{Cid, Commit, StreamState, UnixTimestamp};
use strand_state::{select_tip, CommitLogEquality, SerializedEquality, StateEquality, StreamStateSubject};
use strand_test::{anchored, fake_cid, linear_history, FAKE_CID_1};

fn bench_cid_parse(c: &mut Criterion) {
    c.bench_function("cid_parse", |b| {
        b.iter(|| black_box(FAKE_CID_1).parse::<Cid>())
    });
}

fn bench_cid_encode(c: &mut Criterion) {
    let cid = fake_cid(7);
    c.bench_function("cid_encode", |b| b.iter(|| black_box(&cid).encode()));
}

fn bench_oracle(c: &mut Criterion) {
    let mut group = c.benchmark_group("oracle_equal_logs");

    for len in [1u64, 16, 256] {
        let a = linear_history(1, len);
        let b = linear_history(1, len);

        group.bench_with_input(BenchmarkId::new("commit_log", len), &len, |bench, _| {
            bench.iter(|| CommitLogEquality.equal(black_box(&a), black_box(&b)))
        });
        group.bench_with_input(BenchmarkId::new("serialized", len), &len, |bench, _| {
            bench.iter(|| SerializedEquality.equal(black_box(&a), black_box(&b)))
        });
    }

    group.finish();
}

fn bench_subject_next(c: &mut Criterion) {
    let mut group = c.benchmark_group("subject_next");

    for observers in [0usize, 1, 8] {
        let subject = StreamStateSubject::new(linear_history(2, 8));
        for _ in 0..observers {
            subject.subscribe(|state| {
                black_box(state.len());
            });
        }
        let copy = linear_history(2, 8);

        group.bench_with_input(
            BenchmarkId::new("suppressed", observers),
            &observers,
            |bench, _| bench.iter(|| subject.next(black_box(copy.clone()))),
        );
    }

    for observers in [1usize, 8] {
        let subject = StreamStateSubject::new(linear_history(3, 0));
        for _ in 0..observers {
            subject.subscribe(|state| {
                black_box(state.len());
            });
        }
        let states = [
            Arc::new(linear_history(3, 1)),
            Arc::new(linear_history(3, 2)),
        ];
        let mut i = 0;

        group.bench_with_input(
            BenchmarkId::new("emitted", observers),
            &observers,
            |bench, _| {
                bench.iter(|| {
                    i ^= 1;
                    subject.next(black_box(states[i].clone()))
                })
            },
        );
    }

    group.finish();
}

fn bench_select_tip(c: &mut Criterion) {
    let current = linear_history(4, 64);
    let extended = current.append(Commit::signed(fake_cid(u64::MAX))).unwrap();
    let diverged = anchored(&linear_history(5, 32), UnixTimestamp(10));
    let diverged = StreamState::new(
        current.stream_type(),
        std::iter::once(current.genesis_commit().clone())
            .chain(diverged.log()[1..].iter().cloned())
            .collect(),
    )
    .unwrap();

    c.bench_function("select_tip_extension", |b| {
        b.iter(|| select_tip(black_box(&current), black_box(&extended)))
    });
    c.bench_function("select_tip_diverged", |b| {
        b.iter(|| select_tip(black_box(&current), black_box(&diverged)))
    });
}

criterion_group!(
    benches,
    bench_cid_parse,
    bench_cid_encode,
    bench_oracle,
    bench_subject_next,
    bench_select_tip,
);

criterion_main!(benches);
