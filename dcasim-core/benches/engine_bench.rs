//! Criterion benchmarks for the simulation hot paths.
//!
//! Benchmarks:
//! 1. Indicator preprocessing (rolling mean + bands)
//! 2. Full replay over daily, hourly and minute-sized windows

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use dcasim_core::{run, Bar, DipGainBands, Interval, StrategyConfig};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(n: usize, step: chrono::Duration) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2020, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0 + (i as f64 * 0.013).cos() * 5.0;
            Bar::new(base + step * i as i32, close)
        })
        .collect()
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let bars = make_bars(10_000, chrono::Duration::hours(1));
    let mut group = c.benchmark_group("indicators");
    for window in [3_usize, 24, 96] {
        let bands = DipGainBands::new(window, 0.95, 1.08);
        group.bench_with_input(BenchmarkId::from_parameter(window), &bands, |b, bands| {
            b.iter(|| bands.compute(black_box(&bars)))
        });
    }
    group.finish();
}

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay");
    let cases = [
        (Interval::OneDay, chrono::Duration::days(1), 2_500_usize),
        (Interval::OneHour, chrono::Duration::hours(1), 20_000),
        (Interval::FifteenMinutes, chrono::Duration::minutes(15), 50_000),
    ];
    for (interval, step, n) in cases {
        let bars = make_bars(n, step);
        let config = StrategyConfig {
            interval: interval.clone(),
            ..StrategyConfig::default()
        };
        group.bench_with_input(
            BenchmarkId::new(interval.to_string(), n),
            &bars,
            |b, bars| b.iter(|| run(black_box(bars), &config).map(|r| r.final_value())),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_indicators, bench_replay);
criterion_main!(benches);
