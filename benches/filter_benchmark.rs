#![allow(clippy::expect_used, clippy::unwrap_used, missing_docs)]
//! Benchmark for the filter pipeline and the full gesture round trip.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use wellbeing_viz::prelude::*;

const REGIONS: [&str; 10] = [
    "Western Europe",
    "Central and Eastern Europe",
    "Commonwealth of Independent States",
    "East Asia",
    "Southeast Asia",
    "South Asia",
    "Middle East and North Africa",
    "Sub-Saharan Africa",
    "Latin America and Caribbean",
    "North America and ANZ",
];

/// `countries` countries over 2015..=2019 with smoothly varying attributes.
fn synthetic(countries: usize) -> Vec<Record> {
    let mut out = Vec::with_capacity(countries * 5);
    for c in 0..countries {
        let name = format!("Country {c}");
        let region = REGIONS[c % REGIONS.len()];
        let base = c as f64 / countries as f64;
        for (i, year) in (2015..=2019).enumerate() {
            let t = i as f64 * 0.1;
            let mut record = Record::new(name.as_str(), region, year)
                .with(Attribute::HappinessScore, 3.0 + 5.0 * base + t)
                .with(Attribute::GdpPerCapita, 6.0 + 5.0 * base)
                .with(Attribute::SocialSupport, 0.5 + 0.4 * base)
                .with(Attribute::FertilityRate, 1.2 + 5.0 * (1.0 - base))
                .with(Attribute::Population, 1.0e6 * (c + 1) as f64);
            if c % 7 != 0 {
                record.set(Attribute::Temperature, -5.0 + 35.0 * base);
            }
            out.push(record);
        }
    }
    out
}

fn filter_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_dataset");

    for countries in [150, 1_000, 10_000] {
        let dataset = Dataset::new(synthetic(countries)).unwrap();
        let mut state = SelectionState::new(&dataset);
        state.set_brush(BrushKey::HappinessPercentile, Some((0.0, 50.0))).unwrap();
        state
            .set_brush(Attribute::Temperature.into(), Some((0.0, 20.0)))
            .unwrap();
        state.toggle_region_checked("South Asia", false).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(countries), &countries, |b, _| {
            b.iter(|| filter_dataset(black_box(dataset.records()), black_box(&state)));
        });
    }

    group.finish();
}

fn correlation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("correlation_matrix");

    for countries in [150, 1_000] {
        let records = synthetic(countries);
        group.bench_with_input(BenchmarkId::from_parameter(countries), &countries, |b, _| {
            b.iter(|| CorrelationMatrix::compute(black_box(&records), &Attribute::CORRELATED));
        });
    }

    group.finish();
}

fn gesture_round_trip_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("gesture_round_trip");

    let mut dash = Dashboard::from_records(synthetic(150), DashboardConfig::default()).unwrap();
    let _views = DashboardViews::attach(&ViewContext::new(&dash));
    dash.refresh().unwrap();

    // Alternating ends keep every dispatch a real state change.
    let mut flip = false;
    group.bench_function("toggle_year", |b| {
        b.iter(|| {
            flip = !flip;
            let year = if flip { 2017 } else { 2018 };
            dash.dispatch(black_box(Gesture::SetSingleYear(year))).unwrap()
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    filter_benchmark,
    correlation_benchmark,
    gesture_round_trip_benchmark
);
criterion_main!(benches);
