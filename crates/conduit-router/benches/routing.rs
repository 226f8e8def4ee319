//! Routing benchmarks.
//!
//! Run with: `cargo bench -p conduit-router`

use conduit_router::{HttpMethod, Route, RouteTable};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn build_table(num_routes: usize) -> RouteTable<String> {
    let table = RouteTable::new();

    // Exact routes
    for i in 0..num_routes / 3 {
        table
            .register("bench", Route::get(format!("/api/v1/resource{i}"), format!("getResource{i}")))
            .ok();
    }

    // Prefix routes
    for i in 0..num_routes / 3 {
        table
            .register(
                "bench",
                Route::starts_with(
                    HttpMethod::Get,
                    format!("/api/v1/tree{i}/"),
                    format!("browseTree{i}"),
                ),
            )
            .ok();
    }

    // Runtime-resolved routes
    for i in 0..num_routes / 3 {
        table
            .register(
                "bench",
                Route::runtime_resolved(
                    HttpMethod::Get,
                    format!("/static/bundle{i}/"),
                    format!("serveBundle{i}"),
                    |rest: &str| rest.ends_with(".js"),
                ),
            )
            .ok();
    }

    table
        .register("bench", Route::starts_with(HttpMethod::Get, "/", "fallback".to_string()))
        .ok();

    table
}

fn bench_exact_match(c: &mut Criterion) {
    let table = build_table(100);

    c.bench_function("exact_match", |b| {
        b.iter(|| {
            black_box(table.match_route(HttpMethod::Get, "/api/v1/resource20"));
        });
    });
}

fn bench_prefix_match(c: &mut Criterion) {
    let table = build_table(100);

    c.bench_function("prefix_match", |b| {
        b.iter(|| {
            black_box(table.match_route(HttpMethod::Get, "/api/v1/tree25/a/b/c"));
        });
    });
}

fn bench_runtime_resolved_match(c: &mut Criterion) {
    let table = build_table(100);

    c.bench_function("runtime_resolved_match", |b| {
        b.iter(|| {
            black_box(table.match_route(HttpMethod::Get, "/static/bundle30/app.js"));
        });
    });
}

fn bench_fallback(c: &mut Criterion) {
    let table = build_table(100);

    c.bench_function("fallback", |b| {
        b.iter(|| {
            black_box(table.match_route(HttpMethod::Get, "/nonexistent/path"));
        });
    });
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");

    for num_routes in [10, 50, 100, 500, 1000] {
        let table = build_table(num_routes);

        group.bench_with_input(
            BenchmarkId::new("exact_match", num_routes),
            &num_routes,
            |b, &n| {
                let path = format!("/api/v1/resource{}", n / 6);
                b.iter(|| black_box(table.match_route(HttpMethod::Get, &path)));
            },
        );

        group.bench_with_input(
            BenchmarkId::new("prefix_match", num_routes),
            &num_routes,
            |b, &n| {
                let path = format!("/api/v1/tree{}/12345", n / 6);
                b.iter(|| black_box(table.match_route(HttpMethod::Get, &path)));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_exact_match,
    bench_prefix_match,
    bench_runtime_resolved_match,
    bench_fallback,
    bench_scaling
);
criterion_main!(benches);
