//! Overhead of the abstract calling convention.
//!
//! Run with: `cargo bench -p ta-abstract`
//!
//! Each group measures the same computation twice: through the typed kernel
//! and through lookup + holder allocation + binding + dispatch.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ta_abstract::functions::{overlap::sma_into, volatility::atr_into};
use ta_abstract::{PriceSeries, Registry};

/// Generate synthetic HLC data for benchmarks.
fn generate_hlc(size: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let close = generate_series(size);
    let high = close.iter().map(|c| c + 1.0).collect();
    let low = close.iter().map(|c| c - 1.0).collect();
    (high, low, close)
}

/// Generate single series for simple indicators.
fn generate_series(size: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(size);
    let mut price = 100.0;
    for i in 0..size {
        let x = i as f64;
        let delta = ((x * 0.1).sin() * 2.0) + ((x * 0.03).cos() * 1.5);
        price += delta;
        price = f64::max(price, 10.0);
        data.push(price);
    }
    data
}

// Standard sizes for benchmarking
const SIZES: &[usize] = &[100, 1_000, 10_000, 100_000];

fn bench_sma(c: &mut Criterion) {
    let registry = Registry::global();
    let mut group = c.benchmark_group("sma");
    for &size in SIZES {
        let data = generate_series(size);
        let mut out = vec![0.0; size];
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("kernel", size), &data, |b, data| {
            b.iter(|| sma_into(black_box(data), black_box(20), 0, size - 1, &mut out));
        });
        group.bench_with_input(BenchmarkId::new("abstract", size), &data, |b, data| {
            b.iter(|| {
                let handle = registry.lookup(black_box("SMA")).unwrap();
                let mut holder = registry.alloc(handle).unwrap();
                holder.set_input_real(0, data).unwrap();
                holder.set_opt_input_integer(0, black_box(20)).unwrap();
                holder.set_output_real(0, &mut out).unwrap();
                holder.call(0, size - 1)
            });
        });
    }
    group.finish();
}

fn bench_atr(c: &mut Criterion) {
    let registry = Registry::global();
    let mut group = c.benchmark_group("atr");
    for &size in SIZES {
        let (high, low, close) = generate_hlc(size);
        let mut out = vec![0.0; size];
        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(BenchmarkId::new("kernel", size), |b| {
            b.iter(|| atr_into(&high, &low, &close, black_box(14), 0, size - 1, &mut out));
        });
        group.bench_function(BenchmarkId::new("abstract", size), |b| {
            b.iter(|| {
                let handle = registry.lookup(black_box("ATR")).unwrap();
                let mut holder = registry.alloc(handle).unwrap();
                holder
                    .set_input_price(0, PriceSeries::hlc(&high, &low, &close))
                    .unwrap();
                holder.set_output_real(0, &mut out).unwrap();
                holder.call(0, size - 1)
            });
        });
    }
    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let registry = Registry::global();
    c.bench_function("lookup", |b| {
        b.iter(|| registry.lookup(black_box("TYPPRICE")));
    });
}

criterion_group!(benches, bench_sma, bench_atr, bench_lookup);
criterion_main!(benches);
