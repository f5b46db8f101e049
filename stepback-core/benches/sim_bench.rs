//! Criterion benchmarks for stepback hot paths.
//!
//! Benchmarks:
//! 1. Simulator bar loops (threshold and ATR bracket)
//! 2. Indicator precompute (SMA + ATR)
//! 3. OHLCV resampling
//! 4. Context alignment (as-of join)

use chrono::TimeZone;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use stepback_core::context::{align_to_execution, trend_flag};
use stepback_core::indicators::{atr, sma};
use stepback_core::resample::resample;
use stepback_core::sim::{
    run_atr_bracket, run_threshold, BracketParams, CostParams, IndicatorColumns,
};
use stepback_core::{Bar, Timeframe};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(n: usize) -> Vec<Bar> {
    let base = chrono::Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            let open = close - 0.3;
            Bar {
                time: base + chrono::Duration::minutes(5 * i as i64),
                open,
                high: close + 1.5,
                low: close - 1.5,
                close,
                volume: 1_000.0 + (i % 500) as f64,
                spread: None,
                real_volume: None,
            }
        })
        .collect()
}

fn make_columns(bars: &[Bar]) -> IndicatorColumns {
    let mut columns = IndicatorColumns::new();
    columns.insert_ma(20, sma(bars, 20));
    columns.insert_atr(14, atr(bars, 14));
    columns
}

// ── 1. Simulator Bar Loops ───────────────────────────────────────────

fn bench_simulators(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulator");
    let params = BracketParams::default();
    let costs = CostParams {
        commission_per_trade: 0.0005,
        slippage_bps: 1.0,
        spread_bps: 1.0,
    };

    for &bar_count in &[1_000, 10_000, 50_000] {
        let bars = make_bars(bar_count);
        let columns = make_columns(&bars);

        group.bench_with_input(
            BenchmarkId::new("threshold", bar_count),
            &bar_count,
            |b, _| {
                b.iter(|| {
                    run_threshold(
                        black_box(&bars),
                        black_box(&columns),
                        20,
                        None,
                        &costs,
                        1.0,
                    )
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("atr_bracket", bar_count),
            &bar_count,
            |b, _| {
                b.iter(|| {
                    run_atr_bracket(
                        black_box(&bars),
                        black_box(&columns),
                        black_box(&params),
                        None,
                        &costs,
                        1.0,
                    )
                });
            },
        );
    }

    group.finish();
}

// ── 2. Indicator Precompute ──────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_precompute");

    for &bar_count in &[1_000, 10_000, 50_000] {
        let bars = make_bars(bar_count);

        group.bench_with_input(BenchmarkId::new("sma_20", bar_count), &bar_count, |b, _| {
            b.iter(|| sma(black_box(&bars), 20));
        });

        group.bench_with_input(BenchmarkId::new("atr_14", bar_count), &bar_count, |b, _| {
            b.iter(|| atr(black_box(&bars), 14));
        });
    }

    group.finish();
}

// ── 3. OHLCV Resampling ──────────────────────────────────────────────

fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample");

    for &bar_count in &[10_000, 50_000] {
        let bars = make_bars(bar_count);
        group.bench_with_input(
            BenchmarkId::new("m5_to_h1", bar_count),
            &bar_count,
            |b, _| {
                b.iter(|| resample(black_box(&bars), Timeframe::H1));
            },
        );
    }

    group.finish();
}

// ── 4. Context Alignment ─────────────────────────────────────────────

fn bench_context(c: &mut Criterion) {
    let mut group = c.benchmark_group("context");

    let exec = make_bars(50_000);
    let h1 = resample(&exec, Timeframe::H1);
    let flags = trend_flag(&h1, 10);

    group.bench_function("align_50k_to_h1", |b| {
        b.iter(|| align_to_execution(black_box(&exec), black_box(&h1), black_box(&flags)));
    });

    group.bench_function("full_filter_build_50k", |b| {
        b.iter(|| {
            let ctx = resample(black_box(&exec), Timeframe::H1);
            let flags = trend_flag(&ctx, 10);
            align_to_execution(&exec, &ctx, &flags)
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_simulators,
    bench_indicators,
    bench_resample,
    bench_context,
);
criterion_main!(benches);
