use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use fi_forecast::{
    Dataset, Event, EventCategory, EvidenceBasis, EvidenceConfidence, EvidenceStore, ImpactDirection, ImpactLink,
    IndicatorCode, Observation, Pipeline, PipelineConfig,
};

const PREFIXES: [&str; 4] = ["ACC", "USG", "INF", "ENA"];

/// `indicators` series over 2011–2024 and `events` events, each linked to
/// two indicators.
fn make_dataset(indicators: usize, events: usize) -> Dataset {
    let codes: Vec<IndicatorCode> = (0..indicators)
        .map(|i| IndicatorCode::new(format!("{}_SERIES_{i}", PREFIXES[i % PREFIXES.len()])).unwrap())
        .collect();

    let mut observations = Vec::new();
    for (i, code) in codes.iter().enumerate() {
        for year in (2011..=2024).step_by(2) {
            let t = f64::from(year - 2011);
            let value = (5.0 + i as f64 + 2.5 * t + (t * 0.7).sin()).min(99.0);
            observations.push(Observation::new(
                code.clone(),
                value,
                NaiveDate::from_ymd_opt(year, 12, 31).unwrap(),
            ));
        }
    }

    let categories = [
        EventCategory::Policy,
        EventCategory::ProductLaunch,
        EventCategory::MarketEntry,
        EventCategory::Infrastructure,
    ];
    let mut event_rows = Vec::new();
    let mut links = Vec::new();
    for e in 0..events {
        let id = format!("EVT_{e}");
        event_rows.push(Event::new(
            &id,
            format!("Event {e}"),
            NaiveDate::from_ymd_opt(2012 + (e % 16) as i32, 1 + (e % 12) as u32, 1),
            categories[e % categories.len()].clone(),
        ));
        // Every third event is left to comparable evidence.
        if e % 3 == 0 {
            continue;
        }
        for k in 0..2 {
            links.push(ImpactLink {
                parent_id: id.clone(),
                related_indicator: codes[(e + k) % codes.len()].clone(),
                impact_direction: if k == 0 { ImpactDirection::Positive } else { ImpactDirection::Negative },
                impact_magnitude: 1.0 + (e % 5) as f64,
                lag_months: 6 * (e % 4) as u32,
                evidence_basis: EvidenceBasis::DirectObservation,
                confidence: EvidenceConfidence::new(0.6).unwrap(),
                notes: String::new(),
            });
        }
    }

    Dataset::new(observations, event_rows, links, Vec::new())
}

fn bench_pipeline(c: &mut Criterion) {
    let target = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let mut group = c.benchmark_group("pipeline_run");

    for (indicators, events) in [(8, 20), (32, 100), (128, 400)] {
        let dataset = make_dataset(indicators, events);
        group.throughput(Throughput::Elements(indicators as u64));

        for workers in [1usize, 4] {
            let config = PipelineConfig {
                indicators: Vec::new(),
                forecast_workers: workers,
                ..PipelineConfig::default()
            };
            let pipeline = Pipeline::new(config, EvidenceStore::reference());
            group.bench_with_input(
                BenchmarkId::new(format!("workers_{workers}"), format!("{indicators}x{events}")),
                &dataset,
                |b, dataset| b.iter(|| pipeline.run(dataset, target).unwrap()),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
