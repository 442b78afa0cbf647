use chronotope::aggregate::Aggregator;
use chronotope::{
    FloatSpan, Interpolation, RTreeIndex, SkipListConfig, TInstant, TSequence, Temporal,
    TimestampTz,
};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

const HOUR: i64 = 3_600_000_000;

fn trip(offset: i64, len: usize) -> Temporal<f64> {
    let instants = (0..len)
        .map(|i| {
            let t = TimestampTz::from_micros((offset + i as i64) * HOUR);
            TInstant::new(((offset + i as i64) % 17) as f64, t)
        })
        .collect();
    Temporal::Sequence(TSequence::make(instants, true, true, Interpolation::Linear, true).unwrap())
}

fn benchmark_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");
    let config = SkipListConfig {
        seed: Some(1),
        ..Default::default()
    };

    for count in [10usize, 100, 1000] {
        let trips: Vec<Temporal<f64>> = (0..count).map(|i| trip((i as i64 * 7) % 500, 24)).collect();

        group.bench_with_input(BenchmarkId::new("tsum", count), &trips, |b, trips| {
            b.iter(|| {
                let mut agg = Aggregator::tsum().with_skiplist(&config);
                for t in trips {
                    agg.add(black_box(t)).unwrap();
                }
                agg.finish().unwrap()
            })
        });

        group.bench_with_input(BenchmarkId::new("tcount", count), &trips, |b, trips| {
            b.iter(|| {
                let mut agg = Aggregator::tcount().with_skiplist(&config);
                for t in trips {
                    agg.add_count(black_box(t)).unwrap();
                }
                agg.finish().unwrap()
            })
        });
    }

    // Disjoint inputs only insert into the skip list
    let disjoint: Vec<Temporal<f64>> = (0..1000).map(|i| trip(i * 30, 24)).collect();
    group.bench_function("tmax_disjoint_1000", |b| {
        b.iter(|| {
            let mut agg = Aggregator::tmax().with_skiplist(&config);
            for t in &disjoint {
                agg.add(black_box(t)).unwrap();
            }
            agg.len()
        })
    });

    group.finish();
}

fn benchmark_rtree(c: &mut Criterion) {
    let mut group = c.benchmark_group("rtree");

    let spans: Vec<(FloatSpan, i64)> = (0..10_000)
        .map(|i| {
            let lower = ((i * 7919) % 100_000) as f64;
            (FloatSpan::new(lower, lower + 50.0, true, true).unwrap(), i)
        })
        .collect();

    group.bench_function("bulk_load_10000", |b| {
        b.iter(|| RTreeIndex::bulk_load(black_box(spans.clone())).unwrap())
    });

    let index = RTreeIndex::bulk_load(spans).unwrap();
    let query = FloatSpan::new(40_000.0, 40_500.0, true, true).unwrap();
    group.bench_function("window_query", |b| {
        b.iter(|| index.search(black_box(&query)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_aggregation, benchmark_rtree);
criterion_main!(benches);
