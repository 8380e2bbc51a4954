use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::collections::BTreeMap;

use fitload::{
    Activity, ActivitySource, ActivityType, Deduplicator, Gender, Intensity, LoadCalculator,
    RollingMetricsAggregator, UserProfile,
};

/// Performance benchmarks for the deduplication and load engine
///
/// Exercises the core passes with varying dataset sizes to keep the
/// per-user batch paths scalable.

fn create_activity(idx: usize) -> Activity {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 6, 0, 0).unwrap()
        + Duration::minutes(idx as i64 * 90);
    Activity {
        id: format!("activity-{idx}"),
        user_id: format!("user-{}", idx % 8),
        start_time: start,
        duration_seconds: 1800 + (idx as u32 % 7) * 600,
        activity_type: if idx % 2 == 0 {
            ActivityType::Run
        } else {
            ActivityType::Ride
        },
        source: if idx % 3 == 0 {
            ActivitySource::Manual
        } else {
            ActivitySource::Imported("service-a".to_string())
        },
        source_external_id: Some(format!("ext-{idx}")),
        created_at: start + Duration::hours(1),
        has_heart_rate_stream: idx % 4 == 0,
        avg_heart_rate: Some(120 + (idx as u16 % 60)),
        hr_samples: None,
        has_gps: idx % 2 == 0,
        has_power: idx % 5 == 0,
        per_second_data: false,
        device_name: None,
        calories: Some(400),
        elevation_gain: Some(120),
        zone_minutes: None,
        notes: None,
        subjective_exertion: None,
        intensity: Intensity::Moderate,
        canonical_source: None,
        source_set: BTreeMap::new(),
        merge_history: Vec::new(),
    }
}

fn create_dataset(size: usize) -> Vec<Activity> {
    (0..size).map(create_activity).collect()
}

fn benchmark_profile() -> UserProfile {
    UserProfile {
        max_heart_rate: Some(190),
        rest_heart_rate: Some(55),
        age: Some(32),
        gender: Gender::Male,
        fitness_level: Default::default(),
    }
}

fn bench_deduplication(c: &mut Criterion) {
    let deduplicator = Deduplicator::default();
    let mut group = c.benchmark_group("Deduplication");

    for &size in &[10, 100, 1000] {
        let activities = create_dataset(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(
            BenchmarkId::new("process", size),
            &activities,
            |b, activities| {
                b.iter(|| {
                    let outcome = deduplicator.process(black_box(activities)).unwrap();
                    black_box(outcome);
                });
            },
        );
    }

    group.finish();
}

fn bench_load_calculation(c: &mut Criterion) {
    let profile = benchmark_profile();
    let mut group = c.benchmark_group("Load Calculation");

    for &size in &[10, 100, 1000] {
        let activities = create_dataset(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(
            BenchmarkId::new("compute_loads", size),
            &activities,
            |b, activities| {
                b.iter(|| {
                    let results =
                        LoadCalculator::compute_loads(black_box(activities), &profile);
                    black_box(results);
                });
            },
        );
    }

    group.finish();
}

fn bench_rolling_metrics(c: &mut Criterion) {
    let aggregator = RollingMetricsAggregator::default();
    let mut group = c.benchmark_group("Rolling Metrics");

    for &days in &[7, 30, 90, 365] {
        let loads: Vec<f64> = (0..days).map(|d| 40.0 + f64::from(d % 5) * 20.0).collect();

        group.throughput(Throughput::Elements(days as u64));
        group.bench_with_input(BenchmarkId::new("evaluate", days), &loads, |b, loads| {
            b.iter(|| {
                let metrics = aggregator.evaluate(black_box(loads));
                black_box(metrics);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_deduplication,
    bench_load_calculation,
    bench_rolling_metrics
);
criterion_main!(benches);
