//! Benchmarks for query validation.

use criterion::{Criterion, criterion_group, criterion_main};
use hostdb_firewall::{FirewallPolicy, QueryFirewall};
use std::hint::black_box;

fn bench_validate(c: &mut Criterion) {
    let firewall = QueryFirewall::new(FirewallPolicy::default());
    let mut group = c.benchmark_group("validate");

    group.bench_function("select_append_limit", |b| {
        b.iter(|| black_box(firewall.validate(black_box("SELECT * FROM orders WHERE id > 10"), "db")))
    });

    group.bench_function("delete_with_where", |b| {
        b.iter(|| black_box(firewall.validate(black_box("DELETE FROM orders WHERE id = 1"), "db")))
    });

    group.bench_function("forbidden_last_rule", |b| {
        b.iter(|| black_box(firewall.validate(black_box("SELECT * FROM sys.processlist"), "db")))
    });

    let long_query = format!(
        "SELECT {} FROM t -- trailing comment",
        (0..200).map(|i| format!("c{}", i)).collect::<Vec<_>>().join(", ")
    );
    group.bench_function("long_select_with_comment", |b| {
        b.iter(|| black_box(firewall.validate(black_box(&long_query), "db")))
    });

    group.finish();
}

criterion_group!(benches, bench_validate);
criterion_main!(benches);
