//! Benchmark template compilation and rendering time.

use criterion::{criterion_group, criterion_main, Criterion};

use benches::{context, engine, repeat, BASE, PAGE};

criterion_main! { benches }
criterion_group! { benches, bench_compile, bench_render, bench_render_extended }

/// Benchmarks the time taken to compile a template.
fn bench_compile(c: &mut Criterion) {
    let source = repeat(BASE, 50);
    let engine = engine();
    c.bench_function("compile", |b| {
        b.iter(|| engine.compile(source.as_str()).unwrap());
    });
}

/// Benchmarks the time taken to render a template as a string.
fn bench_render(c: &mut Criterion) {
    let ctx = tmpl::to_value(context::random(150)).unwrap();
    let engine = engine();
    let template = engine.compile(repeat(BASE, 20)).unwrap();
    c.bench_function("render", |b| {
        b.iter(|| template.render_from(&ctx).unwrap());
    });
}

/// Benchmarks rendering a base template with a block overridden by another.
fn bench_render_extended(c: &mut Criterion) {
    let ctx = tmpl::to_value(context::random(150)).unwrap();
    let engine = engine();
    let base = engine.compile(BASE).unwrap();
    let page = engine.compile(PAGE).unwrap();
    c.bench_function("render_extended", |b| {
        b.iter(|| base.render_extended_from(&page, &ctx).unwrap());
    });
}
