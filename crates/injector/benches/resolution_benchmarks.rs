//! Benchmarks for constructor resolution
//!
//! Measures dependency chains of increasing depth resolved through the service
//! lookup hook, and repeated access to memoized services.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use elif_injector::{
    Injector, ParameterDescriptor, Parameters, TypeCatalog, TypeDefinition, Value,
};

/// Chain `bench::T0 <- bench::T1 <- ... <- bench::T(n-1)`, each taking the previous one
fn chain_catalog(depth: usize) -> TypeCatalog {
    let mut builder = TypeCatalog::builder();
    for i in 0..depth {
        let name = format!("bench::T{}", i);
        let parameters = if i == 0 {
            vec![]
        } else {
            vec![ParameterDescriptor::of("previous", format!("bench::T{}", i - 1))]
        };
        let type_name = name.clone();
        builder = builder.define(
            TypeDefinition::concrete(name)
                .constructor(parameters, move |_| Ok(Value::new(type_name.as_str(), ()))),
        );
    }
    builder.build().expect("benchmark catalog")
}

fn chain_injector(depth: usize) -> Injector {
    Injector::builder(Arc::new(chain_catalog(depth)))
        .with_namespace("bench")
        .build()
        .expect("benchmark injector")
}

/// Fresh injector per iteration so every link is constructed
fn benchmark_chain_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_construction");

    for depth in [1, 10, 50, 100].iter() {
        group.bench_with_input(BenchmarkId::new("depth", depth), depth, |b, &depth| {
            let leaf = format!("bench::T{}", depth - 1);
            b.iter(|| {
                let injector = chain_injector(depth);
                black_box(injector.instantiate(&leaf, &Parameters::new()).expect("resolved"))
            });
        });
    }

    group.finish();
}

fn benchmark_cached_service(c: &mut Criterion) {
    let injector = chain_injector(10);
    let leaf = "bench::T9";
    injector
        .services()
        .register(leaf, Parameters::new())
        .expect("registered");
    injector
        .services()
        .get(leaf, &Parameters::new())
        .expect("warm cache");

    c.bench_function("cached_service_get", |b| {
        b.iter(|| {
            black_box(
                injector
                    .services()
                    .get(black_box(leaf), &Parameters::new())
                    .expect("cached"),
            )
        })
    });
}

fn benchmark_explicit_values(c: &mut Criterion) {
    let injector = chain_injector(2);
    let parameters = Parameters::new().with("previous", Value::new("bench::T0", ()));

    c.bench_function("explicit_value_construction", |b| {
        b.iter(|| black_box(injector.instantiate("bench::T1", &parameters)))
    });
}

criterion_group!(
    benches,
    benchmark_chain_construction,
    benchmark_cached_service,
    benchmark_explicit_values
);
criterion_main!(benches);
