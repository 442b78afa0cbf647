use chronotope::aggregate::Aggregator;
use chronotope::prelude::*;
use chronotope::{IntSpanSet, TInstant, TSequence};
use proptest::prelude::*;

const DAY: i64 = 86_400_000_000;

fn int_span() -> impl Strategy<Value = IntSpan> {
    (-100i32..100, 1i32..50).prop_map(|(lower, width)| {
        IntSpan::new(lower, lower + width, true, false).unwrap()
    })
}

/// Quarter-unit bounds, exactly representable in text.
fn float_span() -> impl Strategy<Value = FloatSpan> {
    quarter_span(-4000..4000, 0..400)
}

fn quarter_span(
    lower: std::ops::Range<i32>,
    width: std::ops::Range<i32>,
) -> impl Strategy<Value = FloatSpan> {
    (lower, width, any::<bool>(), any::<bool>()).prop_map(
        |(lower, width, lower_inc, upper_inc)| {
            let (lower_inc, upper_inc) = if width == 0 {
                (true, true)
            } else {
                (lower_inc, upper_inc)
            };
            let lower = f64::from(lower) / 4.0;
            let upper = lower + f64::from(width) / 4.0;
            FloatSpan::new(lower, upper, lower_inc, upper_inc).unwrap()
        },
    )
}

/// Step integer sequence starting after `start` days, one instant per step.
fn step_sequence(start: i64, steps: &[(i32, i64)]) -> Temporal<i32> {
    let mut day = start;
    let instants = steps
        .iter()
        .map(|&(value, gap)| {
            day += gap;
            TInstant::new(value, TimestampTz::from_micros(day * DAY))
        })
        .collect();
    Temporal::Sequence(TSequence::make(instants, true, true, Interpolation::Step, true).unwrap())
}

fn step_temporal() -> impl Strategy<Value = Temporal<i32>> {
    (0i64..10, prop::collection::vec((-3i32..3, 1i64..3), 1..8))
        .prop_map(|(start, steps)| step_sequence(start, &steps))
}

/// Linear float sequence with quarter-unit values in [-3, 3].
fn linear_temporal() -> impl Strategy<Value = Temporal<f64>> {
    (0i64..10, prop::collection::vec((-12i32..=12, 1i64..3), 1..8)).prop_map(|(start, steps)| {
        let mut day = start;
        let instants = steps
            .iter()
            .map(|&(quarters, gap)| {
                day += gap;
                TInstant::new(f64::from(quarters) / 4.0, TimestampTz::from_micros(day * DAY))
            })
            .collect();
        Temporal::Sequence(
            TSequence::make(instants, true, true, Interpolation::Linear, true).unwrap(),
        )
    })
}

/// `at` and `minus` cover the time of `whole` without sharing any of it.
fn check_partition<V: chronotope::TemporalValue>(
    whole: &Temporal<V>,
    at: Option<Temporal<V>>,
    minus: Option<Temporal<V>>,
) -> std::result::Result<(), TestCaseError> {
    match (at, minus) {
        (Some(at), Some(minus)) => {
            prop_assert!(at.time().intersection(&minus.time()).is_none());
            prop_assert_eq!(at.time().union(&minus.time()), whole.time());
        }
        (Some(at), None) => prop_assert_eq!(at.time(), whole.time()),
        (None, Some(minus)) => prop_assert_eq!(minus.time(), whole.time()),
        (None, None) => prop_assert!(false, "restriction lost the whole value"),
    }
    Ok(())
}

proptest! {
    #[test]
    fn prop_span_bounds_are_canonical(lower in -1000i32..1000, width in 0i32..100, li: bool, ui: bool) {
        let empty = (width == 0 && !(li && ui)) || (width == 1 && !li && !ui);
        match IntSpan::new(lower, lower + width, li, ui) {
            Ok(span) => {
                prop_assert!(!empty);
                prop_assert!(span.lower() < span.upper());
                prop_assert!(span.lower_inc());
                prop_assert!(!span.upper_inc());
            }
            Err(_) => prop_assert!(empty),
        }
    }

    #[test]
    fn prop_position_predicates_are_exclusive(a in int_span(), b in int_span()) {
        let holds = [a.left(&b), a.overlaps(&b), a.right(&b)];
        prop_assert_eq!(holds.iter().filter(|h| **h).count(), 1);
        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        prop_assert_eq!(a.left(&b), b.right(&a));
    }

    #[test]
    fn prop_topological_predicates_are_exclusive(a in float_span(), b in float_span()) {
        let holds = [a.overlaps(&b), a.adjacent(&b), a.before(&b), a.after(&b)];
        prop_assert_eq!(holds.iter().filter(|h| **h).count(), 1);
        prop_assert_eq!(a.adjacent(&b), b.adjacent(&a));
        prop_assert_eq!(a.before(&b), b.after(&a));
    }

    #[test]
    fn prop_topological_predicates_are_exclusive_near(a in quarter_span(-8..8, 0..8), b in quarter_span(-8..8, 0..8)) {
        let holds = [a.overlaps(&b), a.adjacent(&b), a.before(&b), a.after(&b)];
        prop_assert_eq!(holds.iter().filter(|h| **h).count(), 1);
    }

    #[test]
    fn prop_spanset_is_normalized(spans in prop::collection::vec(int_span(), 1..10)) {
        let set = IntSpanSet::new(spans.clone()).unwrap();
        for pair in set.spans().windows(2) {
            prop_assert!(pair[0].upper() < pair[1].lower());
        }
        for span in &spans {
            prop_assert!(set.contains_span(span));
        }
    }

    #[test]
    fn prop_span_text_and_wkb_round_trip(span in float_span()) {
        prop_assert_eq!(span.to_string().parse::<FloatSpan>().unwrap(), span);
        let bytes = span.as_wkb(WkbVariant::XDR).unwrap();
        prop_assert_eq!(FloatSpan::from_wkb(&bytes).unwrap(), span);
    }

    #[test]
    fn prop_at_and_minus_partition_time(t in step_temporal(), value in -3i32..3) {
        let at = t.at_value(&value).unwrap();
        let minus = t.minus_value(&value).unwrap();
        match (at, minus) {
            (Some(at), Some(minus)) => {
                prop_assert!(at.time().intersection(&minus.time()).is_none());
                prop_assert_eq!(at.time().union(&minus.time()), t.time());
                prop_assert!(at.values().iter().all(|v| *v == value));
                prop_assert!(minus.values().iter().all(|v| *v != value));
            }
            (Some(at), None) => prop_assert_eq!(at.time(), t.time()),
            (None, Some(minus)) => prop_assert_eq!(minus.time(), t.time()),
            (None, None) => prop_assert!(false, "restriction lost the whole value"),
        }
    }

    #[test]
    fn prop_linear_at_and_minus_value_partition_time(t in linear_temporal(), quarters in -12i32..=12) {
        let value = f64::from(quarters) / 4.0;
        let at = t.at_value(&value).unwrap();
        if let Some(found) = &at {
            prop_assert!(found.values().iter().all(|v| *v == value));
        }
        check_partition(&t, at, t.minus_value(&value).unwrap())?;
    }

    #[test]
    fn prop_linear_at_and_minus_span_partition_time(t in linear_temporal(), span in quarter_span(-16..16, 0..12)) {
        let at = t.at_span(&span).unwrap();
        let minus = t.minus_span(&span).unwrap();
        check_partition(&t, at, minus)?;
    }

    #[test]
    fn prop_partial_sums_are_associative(values in prop::collection::vec(step_temporal(), 2..6), split in 1usize..5) {
        let split = split.min(values.len() - 1);
        let mut single = Aggregator::tsum();
        for v in &values {
            single.add(v).unwrap();
        }
        let mut left = Aggregator::tsum();
        let mut right = Aggregator::tsum();
        for v in &values[..split] {
            left.add(v).unwrap();
        }
        for v in values[split..].iter().rev() {
            right.add(v).unwrap();
        }
        left.merge(right).unwrap();

        let expected = single.finish().unwrap().unwrap();
        let merged = left.finish().unwrap().unwrap();
        prop_assert_eq!(merged.time(), expected.time());
        for hour in 0..(30 * 24) {
            let t = TimestampTz::from_micros(hour * DAY / 24);
            let pointwise: Option<i32> = values
                .iter()
                .filter_map(|v| v.value_at_timestamp(t))
                .reduce(|a, b| a + b);
            prop_assert_eq!(merged.value_at_timestamp(t), pointwise);
        }
    }

    #[test]
    fn prop_rtree_finds_every_stored_box(spans in prop::collection::vec(float_span(), 1..40)) {
        let items: Vec<(FloatSpan, i64)> =
            spans.iter().enumerate().map(|(i, s)| (*s, i as i64)).collect();
        let index = RTreeIndex::bulk_load(items).unwrap();
        prop_assert_eq!(index.len(), spans.len());
        for (i, span) in spans.iter().enumerate() {
            let found = index.search(span);
            prop_assert!(found.contains(&(i as i64)));
            let expected: Vec<i64> = spans
                .iter()
                .enumerate()
                .filter(|(_, s)| s.overlaps(span))
                .map(|(j, _)| j as i64)
                .collect();
            prop_assert_eq!(found, expected);
        }
    }
}
