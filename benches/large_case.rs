// SPDX-License-Identifier: MPL-2.0

//! A synthetic but sizeable resolution, exercising the solver on a dependency graph shaped like
//! a real package index: many packages, each with several releases, with a long dependency
//! chain and a few conflicting branches that force backtracking.
//!
//! This is not drawn from a real package index snapshot; it is generated procedurally so the
//! benchmark has no external fixture to keep in sync. It is too slow to be useful as a unit
//! test, which is why it lives here instead of in `tests/`.

use criterion::{criterion_group, criterion_main, Criterion};

use pubgrub::{resolve, OfflineDependencyProvider, Ranges};

type NumVS = Ranges<u32>;

/// Builds a dependency graph of `width` packages, each with `depth` releases. Release `v` of
/// package `i` depends on release `v` (or the closest one not exceeding it) of package `i + 1`,
/// and on every third release also pulls in an older, narrower constraint on package `i + 2` to
/// create occasional conflicts the solver must backtrack out of.
fn build_provider(width: u32, depth: u32) -> OfflineDependencyProvider<u32, NumVS> {
    let mut provider = OfflineDependencyProvider::<u32, NumVS>::new();
    for pkg in 0..width {
        for v in 0..depth {
            let mut deps = Vec::new();
            if pkg + 1 < width {
                deps.push((pkg + 1, Ranges::higher_than(v.saturating_sub(1))));
            }
            if v % 3 == 0 && pkg + 2 < width {
                deps.push((pkg + 2, Ranges::strictly_lower_than(depth / 2)));
            }
            provider.add_dependencies(pkg, v, deps);
        }
    }
    provider
}

fn large_case(c: &mut Criterion) {
    let width = 40;
    let depth = 12;
    let provider = build_provider(width, depth);

    c.bench_function("large_case", |b| {
        b.iter(|| {
            let _ = resolve(&provider, 0u32, depth - 1);
        })
    });
}

criterion_group!(benches, large_case);
criterion_main!(benches);
