//! # Foodtrace Contract Benchmarks
//!
//! | Group | Operation | Shape |
//! |-------|-----------|-------|
//! | lifecycle | `CreateShipment` through the dispatcher | one tx per iteration |
//! | listings | `GetMyActionableShipments` first page | ledger of N shipments |
//! | recall | `QueryRelatedShipments` | full scan over N shipments |

#![allow(clippy::excessive_nesting)]

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ft_02_shipments::{FoodtraceContract, RecallApi};
use ft_tests::fixtures::*;
use node_runtime::{dispatch, Invocation};
use serde_json::Value;
use shared_ledger::{InMemoryLedger, TxContext};
use shared_types::CallerIdentity;

/// Dispatch one invocation in its own committed transaction.
fn invoke(
    ledger: &InMemoryLedger,
    contract: &FoodtraceContract,
    caller: &str,
    function: &str,
    args: &[&str],
) -> Value {
    let caller = CallerIdentity::new(caller);
    let tx = ledger.begin(&caller);
    let ctx = TxContext::new(&tx, &caller);
    let out = dispatch(contract, &ctx, &Invocation::new(function, args.iter().copied()))
        .unwrap_or_else(|e| panic!("{function}: {e}"));
    tx.commit().expect("commit");
    out
}

/// A network holding `n` processed shipments spread over four lines.
fn seeded_network(n: usize) -> (InMemoryLedger, FoodtraceContract) {
    let (ledger, contract) = bare_network();
    let farmer_data = farmer_json("2025-05-20T00:00:00Z");
    for i in 0..n {
        let id = format!("S{i:05}");
        invoke(
            &ledger,
            &contract,
            FARMER,
            "CreateShipment",
            &[id.as_str(), "Spinach", "", "100", "kg", farmer_data.as_str()],
        );
        let line = format!("LINE-{}", i % 4);
        let date = format!("2025-06-01T{:02}:00:00Z", i % 24);
        let data = processor_json(&line, &date);
        invoke(&ledger, &contract, PROCESSOR, "ProcessShipment", &[id.as_str(), data.as_str()]);
    }
    (ledger, contract)
}

// ============================================================================
// Lifecycle
// ============================================================================

fn bench_create_shipment(c: &mut Criterion) {
    let mut group = c.benchmark_group("ft-lifecycle");
    group.measurement_time(Duration::from_secs(5));
    group.throughput(Throughput::Elements(1));

    let (ledger, contract) = bare_network();
    let farmer_data = farmer_json("2025-05-20T00:00:00Z");
    let mut next = 0u64;
    group.bench_function("create_shipment", |b| {
        b.iter(|| {
            next += 1;
            let id = format!("B{next}");
            black_box(invoke(
                &ledger,
                &contract,
                FARMER,
                "CreateShipment",
                &[id.as_str(), "Spinach", "", "100", "kg", farmer_data.as_str()],
            ))
        })
    });

    group.finish();
}

// ============================================================================
// Listings
// ============================================================================

fn bench_actionable_listing(c: &mut Criterion) {
    let mut group = c.benchmark_group("ft-listings");

    for size in [100, 500, 1_000] {
        let (ledger, contract) = seeded_network(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("actionable_first_page", size), &size, |b, _| {
            b.iter(|| {
                black_box(invoke(&ledger, &contract, DISTRIBUTOR, "GetMyActionableShipments", &[]))
            })
        });
    }

    group.finish();
}

// ============================================================================
// Recall
// ============================================================================

fn bench_query_related(c: &mut Criterion) {
    let mut group = c.benchmark_group("ft-recall");
    group.measurement_time(Duration::from_secs(10));

    for size in [100, 500, 1_000] {
        let (ledger, contract) = seeded_network(size);
        invoke(&ledger, &contract, PROCESSOR, "InitiateRecall", &["S00000", "R1", "Listeria"]);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("query_related", size), &size, |b, _| {
            b.iter(|| {
                let related = run(&ledger, &contract, ADMIN, |c, ctx| {
                    c.query_related_shipments(ctx, "S00000", Some(24))
                })
                .expect("query related");
                black_box(related.len())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_create_shipment,
    bench_actionable_listing,
    bench_query_related
);
criterion_main!(benches);
