use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use closed_group::core::{compute_diff, ExpirationType, GroupInfo, GroupState};
use closed_group::crypto::{GroupKeyPair, KeyPairCodec};
use closed_group::identity::PubKey;

fn random_account() -> PubKey {
    PubKey::from_public_key(GroupKeyPair::generate().public_key())
}

fn snapshot(size: usize) -> (GroupState, Vec<PubKey>) {
    let members: Vec<PubKey> = (0..size).map(|_| random_account()).collect();
    let state = GroupState::new(random_account(), "Bench", members.iter().cloned());
    (state, members)
}

fn proposal(state: &GroupState, members: Vec<PubKey>) -> GroupInfo {
    GroupInfo {
        id: state.id.clone(),
        name: state.name.clone(),
        members,
        zombies: Vec::new(),
        active_at: 1,
        admins: Vec::new(),
        expiration_type: ExpirationType::Unknown,
        expire_timer: 0,
    }
}

/// Benchmark for classifying a single removal in groups of growing size
fn diff_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_diff_kick");
    for size in [10, 50, 100] {
        let (state, mut members) = snapshot(size);
        members.pop();
        let proposed = proposal(&state, members);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| compute_diff(&state, &proposed))
        });
    }
    group.finish();
}

/// Benchmark for wrapping a fresh key pair for every remaining member
fn wrap_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("wrap_for_all");
    for size in [10, 50, 100] {
        let recipients: Vec<PubKey> = (0..size).map(|_| random_account()).collect();
        let pair = GroupKeyPair::generate();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| KeyPairCodec::wrap_for_all(&pair, &recipients).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, diff_benchmark, wrap_benchmark);
criterion_main!(benches);
