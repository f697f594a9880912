use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use glint_mmr::{HashSum, Mmr, PruneMode};
use glint_nullables::NullEnvironment;
use glint_store::Environment;

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("mmr_append");
    for n in [64u64, 512, 4096] {
        group.bench_with_input(BenchmarkId::new("append", n), &n, |b, &n| {
            b.iter(|| {
                let env = NullEnvironment::new();
                let tree = Mmr::new(1, "bench", PruneMode::DiscardOnly, HashSum);
                let mut txn = env.write_txn().unwrap();
                for i in 0..n {
                    tree.append(&mut txn, &i.to_be_bytes(), b"object").unwrap();
                }
                black_box(tree.get_root(&txn).unwrap())
            });
        });
    }
    group.finish();
}

fn bench_remove(c: &mut Criterion) {
    let env = NullEnvironment::new();
    let tree = Mmr::new(1, "bench", PruneMode::DiscardOnly, HashSum);
    let mut txn = env.write_txn().unwrap();
    for i in 0..4096u64 {
        tree.append(&mut txn, &i.to_be_bytes(), b"object").unwrap();
    }

    c.bench_function("mmr_remove_then_reappend_16", |b| {
        b.iter(|| {
            let removed = tree.remove(&mut txn, 16, None).unwrap();
            for (index, object) in removed {
                tree.append(&mut txn, &index, &object.unwrap_or_default()).unwrap();
            }
        })
    });
}

criterion_group!(benches, bench_append, bench_remove);
criterion_main!(benches);
