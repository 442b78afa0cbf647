//! Temporal aggregation.
//!
//! An [`Aggregator`] folds temporal values into a time-ordered state kept
//! in a [`SkipList`] of non-overlapping sequences. Adding a value splices
//! it over the stored pieces it overlaps: where only one side is defined
//! its values are kept, where both are defined the combine function is
//! lifted over them. Two aggregators can be merged, which makes partial
//! aggregation over partitions of the input possible.
//!
//! Window aggregates extend every instant and segment of an input by the
//! window before splicing, so that the state at `t` covers every piece
//! defined somewhere in `[t - window, t]`.
//!
//! ```
//! use chronotope::aggregate::Aggregator;
//! use chronotope::temporal::Temporal;
//!
//! let a: Temporal<i32> = "[1@2000-01-01, 1@2000-01-03]".parse().unwrap();
//! let b: Temporal<i32> = "[2@2000-01-02, 2@2000-01-04]".parse().unwrap();
//! let mut agg = Aggregator::tsum();
//! agg.add(&a).unwrap();
//! agg.add(&b).unwrap();
//! let total = agg.finish().unwrap().unwrap();
//! let t = "2000-01-02 12:00:00".parse().unwrap();
//! assert_eq!(total.value_at_timestamp(t), Some(3));
//! ```

mod skiplist;

pub use skiplist::{Comparator, Iter, SkipList};

use crate::boxes::{STBox, TBox};
use crate::config::SkipListConfig;
use crate::error::{ChronotopeError, ReportExt, Result};
use crate::span::{Span, SpanBound, SpanSet, TstzSpan};
use crate::temporal::{Interpolation, TInstant, TSequence, Temporal, lift_binary};
use crate::types::{Double2, GeoPoint, Interval, NumericValue, TemporalValue};
use std::cmp::Ordering;

/// Function combining the values of two inputs defined at the same time.
pub type Combine<V> = fn(&V, &V) -> Result<V>;

/// Sequences ordered by period; overlapping periods compare equal.
fn cmp_pieces<V: TemporalValue>(a: &TSequence<V>, b: &TSequence<V>) -> Ordering {
    let (pa, pb) = (a.period(), b.period());
    if pa.overlaps(&pb) {
        Ordering::Equal
    } else {
        pa.cmp_span(&pb)
    }
}

/// Merge instantaneous discrete pieces by timestamp.
fn merge_instants<V: TemporalValue>(
    old: Vec<&TSequence<V>>,
    new: Vec<TSequence<V>>,
    combine: Combine<V>,
) -> Result<Vec<TSequence<V>>> {
    let mut out = Vec::with_capacity(old.len() + new.len());
    let mut old = old.into_iter().peekable();
    let mut new = new.into_iter().peekable();
    loop {
        let order = match (old.peek(), new.peek()) {
            (Some(a), Some(b)) => a.start_timestamp().cmp(&b.start_timestamp()),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => break,
        };
        match order {
            Ordering::Less => out.extend(old.next().cloned()),
            Ordering::Greater => out.extend(new.next()),
            Ordering::Equal => {
                if let (Some(a), Some(b)) = (old.next(), new.next()) {
                    let inst = a.start_instant();
                    let value = combine(inst.value(), b.start_instant().value())?;
                    out.push(TSequence::from_instant(
                        inst.with_value(value),
                        Interpolation::Discrete,
                    ));
                }
            }
        }
    }
    Ok(out)
}

/// Merge continuous pieces: the parts defined on one side only are kept,
/// the common part is the lifted combination.
fn merge_sequences<V: TemporalValue>(
    old: Vec<&TSequence<V>>,
    new: Vec<TSequence<V>>,
    combine: Combine<V>,
    crossings: bool,
) -> Result<Vec<TSequence<V>>> {
    let a = Temporal::from_sequences(old.into_iter().cloned().collect())?;
    let b = Temporal::from_sequences(new)?;
    let mut pieces = Vec::new();
    if let Some(only_a) = a.minus_tstzspanset_inner(&b.time())? {
        pieces.extend(only_a.sequence_views().iter().cloned());
    }
    if let Some(only_b) = b.minus_tstzspanset_inner(&a.time())? {
        pieces.extend(only_b.sequence_views().iter().cloned());
    }
    let turning = crossings.then_some(V::crossing as fn(&V, &V, &V, &V) -> Option<f64>);
    if let Some(both) = lift_binary(&a, &b, |x: &V, y: &V| combine(x, y), turning)? {
        pieces.extend(both.sequence_views().iter().cloned());
    }
    Ok(Temporal::from_pieces(pieces)?
        .map(|t| t.sequence_views().into_owned())
        .unwrap_or_default())
}

/// How a window aggregate stretches a linear segment over the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extend {
    /// Keep the lowest value seen within the window.
    Min,
    /// Keep the highest value seen within the window.
    Max,
    /// Step values only; every value is kept for the whole window.
    Constant,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    size: Interval,
    extend: Extend,
}

/// `[inst, inst + size]` as a constant sequence.
fn extend_instant<V: TemporalValue>(
    inst: &TInstant<V>,
    size: Interval,
    interp: Interpolation,
) -> Result<TSequence<V>> {
    let end = TInstant::new(inst.value().clone(), inst.timestamp().checked_add(size)?);
    TSequence::make_inner(vec![inst.clone(), end], true, true, interp, false)
}

/// Instants of the linear segment `start`-`end` stretched by `size`.
fn extend_linear<V: TemporalValue>(
    start: &TInstant<V>,
    end: &TInstant<V>,
    size: Interval,
    extend: Extend,
) -> Result<Vec<TInstant<V>>> {
    let shifted_end = TInstant::new(end.value().clone(), end.timestamp().checked_add(size)?);
    let order = end.value().value_cmp(start.value());
    Ok(match (extend, order) {
        (_, Ordering::Equal) => vec![
            start.clone(),
            TInstant::new(start.value().clone(), shifted_end.timestamp()),
        ],
        (Extend::Min, Ordering::Greater) | (Extend::Max, Ordering::Less) => vec![
            start.clone(),
            TInstant::new(start.value().clone(), start.timestamp().checked_add(size)?),
            shifted_end,
        ],
        _ => vec![start.clone(), end.clone(), shifted_end],
    })
}

/// Pieces of `value` stretched by the window. Discrete values are
/// stretched with `discrete_interp`.
fn extend_pieces<V: TemporalValue>(
    value: &Temporal<V>,
    window: Window,
    discrete_interp: Interpolation,
) -> Result<Vec<TSequence<V>>> {
    let mut pieces = Vec::new();
    for seq in value.sequence_views().iter() {
        let instants = seq.instants();
        if seq.is_discrete() || instants.len() == 1 {
            let interp = if seq.is_discrete() { discrete_interp } else { seq.interp() };
            for inst in instants {
                pieces.push(extend_instant(inst, window.size, interp)?);
            }
            continue;
        }
        let interp = seq.interp();
        if interp == Interpolation::Linear && window.extend == Extend::Constant {
            return Err(ChronotopeError::FeatureNotSupported(
                "Window sum, count and average need step interpolation".to_string(),
            ));
        }
        // A closing step segment that keeps its value also covers the end
        // instant.
        let last = instants.len() - 2;
        let mut end_covered = false;
        for (i, pair) in instants.windows(2).enumerate() {
            let stretched = if interp == Interpolation::Linear {
                extend_linear(&pair[0], &pair[1], window.size, window.extend)?
            } else {
                let end = pair[1].timestamp().checked_add(window.size)?;
                vec![pair[0].clone(), TInstant::new(pair[0].value().clone(), end)]
            };
            let lower_inc = i > 0 || seq.lower_inc();
            end_covered = i == last
                && seq.upper_inc()
                && interp == Interpolation::Step
                && pair[0].value() == pair[1].value();
            pieces.push(TSequence::make_inner(stretched, lower_inc, end_covered, interp, false)?);
        }
        if seq.upper_inc() && !end_covered {
            pieces.push(extend_instant(seq.end_instant(), window.size, interp)?);
        }
    }
    Ok(pieces)
}

/// Running state of a temporal aggregate.
#[derive(Debug, Clone)]
pub struct Aggregator<V: TemporalValue> {
    list: SkipList<TSequence<V>>,
    combine: Combine<V>,
    crossings: bool,
    interp: Option<Interpolation>,
    window: Option<Window>,
}

impl<V: TemporalValue> Aggregator<V> {
    /// Aggregate with `combine`. With `crossings`, linear segments are
    /// also split where the inputs cross, as needed by minimum and maximum.
    pub fn new(combine: Combine<V>, crossings: bool) -> Self {
        Self::with_config(combine, crossings, &SkipListConfig::default())
    }

    pub fn with_config(combine: Combine<V>, crossings: bool, config: &SkipListConfig) -> Self {
        Self {
            list: SkipList::with_config(cmp_pieces::<V>, config),
            combine,
            crossings,
            interp: None,
            window: None,
        }
    }

    fn windowed(mut self, size: Interval, extend: Extend) -> Result<Self> {
        if size <= Interval::zero() {
            return Err(ChronotopeError::InvalidArgValue(format!(
                "The window must be positive: {}",
                size
            )))
            .reported();
        }
        self.window = Some(Window { size, extend });
        Ok(self)
    }

    /// Rebuild the empty state with other skip list parameters. The
    /// window, if any, is kept.
    pub fn with_skiplist(mut self, config: &SkipListConfig) -> Self {
        self.list = SkipList::with_config(cmp_pieces::<V>, config);
        self.interp = None;
        self
    }

    /// Temporal minimum.
    pub fn tmin() -> Self {
        Self::new(
            |a, b| Ok(if b.value_cmp(a) == Ordering::Less { b.clone() } else { a.clone() }),
            true,
        )
    }

    /// Temporal maximum.
    pub fn tmax() -> Self {
        Self::new(
            |a, b| Ok(if b.value_cmp(a) == Ordering::Greater { b.clone() } else { a.clone() }),
            true,
        )
    }

    /// Number of stored pieces.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Period of every stored piece, in time order.
    pub fn keys(&self) -> Vec<TstzSpan> {
        self.list.iter().map(|piece| piece.period()).collect()
    }

    /// Stored pieces in time order.
    pub fn values(&self) -> Vec<TSequence<V>> {
        self.list.values()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    fn check_interp(&self, interp: Interpolation) -> Result<()> {
        match self.interp {
            Some(current) if (current == Interpolation::Discrete) != (interp == Interpolation::Discrete) => {
                Err(ChronotopeError::Aggregation(
                    "Cannot aggregate temporal values of discrete and continuous interpolation"
                        .to_string(),
                ))
            }
            Some(current) if current != interp => Err(ChronotopeError::Aggregation(format!(
                "Cannot aggregate temporal values of {} and {} interpolation",
                current, interp
            ))),
            _ => Ok(()),
        }
    }

    fn splice(&mut self, interp: Interpolation, pieces: Vec<TSequence<V>>) -> Result<()> {
        self.check_interp(interp)?;
        let (combine, crossings) = (self.combine, self.crossings);
        if interp == Interpolation::Discrete {
            self.list
                .splice(pieces, |old, new| merge_instants(old, new, combine))?;
        } else {
            self.list
                .splice(pieces, |old, new| merge_sequences(old, new, combine, crossings))?;
        }
        self.interp = Some(interp);
        Ok(())
    }

    /// Fold one value into the state.
    pub fn add(&mut self, value: &Temporal<V>) -> Result<()> {
        if let Some(window) = self.window {
            return self.add_windowed(value, window).reported();
        }
        let interp = value.interp();
        let pieces = if interp == Interpolation::Discrete {
            value
                .instants()
                .into_iter()
                .map(|i| TSequence::from_instant(i.clone(), Interpolation::Discrete))
                .collect()
        } else {
            value.sequence_views().into_owned()
        };
        self.splice(interp, pieces).reported()
    }

    /// Stretched pieces overlap each other, so they are spliced one at a
    /// time; a failure restores the state as it was before the value.
    fn add_windowed(&mut self, value: &Temporal<V>, window: Window) -> Result<()> {
        let discrete_interp = match self.interp {
            Some(Interpolation::Linear) => Interpolation::Linear,
            _ => Interpolation::Step,
        };
        let pieces = extend_pieces(value, window, discrete_interp)?;
        let saved = (self.list.clone(), self.interp);
        for piece in pieces {
            if let Err(err) = self.splice(piece.interp(), vec![piece]) {
                (self.list, self.interp) = saved;
                return Err(err);
            }
        }
        Ok(())
    }

    /// Fold the state of another aggregator into this one. States of
    /// window aggregates are already stretched and are spliced as they are.
    pub fn merge(&mut self, other: Aggregator<V>) -> Result<()> {
        let Some(interp) = other.interp else {
            return Ok(());
        };
        self.splice(interp, other.list.into_values()).reported()
    }

    /// The aggregate so far, `None` when nothing was added.
    pub fn finish(&self) -> Result<Option<Temporal<V>>> {
        Temporal::from_pieces(self.list.values()).reported()
    }
}

impl<V: NumericValue> Aggregator<V> {
    /// Temporal sum.
    pub fn tsum() -> Self {
        Self::new(|a, b| a.checked_add(*b), false)
    }

    /// Minimum over the trailing `window`.
    pub fn wmin(window: Interval) -> Result<Self> {
        Self::tmin().windowed(window, Extend::Min)
    }

    /// Maximum over the trailing `window`.
    pub fn wmax(window: Interval) -> Result<Self> {
        Self::tmax().windowed(window, Extend::Max)
    }

    /// Sum of the instants and step segments met within the trailing
    /// `window`.
    pub fn wsum(window: Interval) -> Result<Self> {
        Self::tsum().windowed(window, Extend::Constant)
    }
}

impl Aggregator<i32> {
    /// Temporal count. Feed it with [`Aggregator::add_count`].
    pub fn tcount() -> Self {
        Self::new(|a, b| NumericValue::checked_add(*a, *b), false)
    }

    /// Number of sequences and instants defined within the trailing
    /// `window`.
    pub fn wcount(window: Interval) -> Result<Self> {
        Self::tcount().windowed(window, Extend::Constant)
    }

    /// Count one value of any type: 1 wherever it is defined.
    pub fn add_count<W: TemporalValue>(&mut self, value: &Temporal<W>) -> Result<()> {
        let ones = Temporal::from_base_temp(1, value)?;
        self.add(&ones)
    }
}

impl Aggregator<bool> {
    /// Temporal conjunction.
    pub fn tand() -> Self {
        Self::new(|a, b| Ok(*a && *b), false)
    }

    /// Temporal disjunction.
    pub fn tor() -> Self {
        Self::new(|a, b| Ok(*a || *b), false)
    }
}

impl Aggregator<Double2> {
    /// Temporal average. Feed it with [`Aggregator::add_avg`] and read it
    /// with [`Aggregator::finish_avg`].
    pub fn tavg() -> Self {
        Self::new(|x, y| Ok(Double2::new(x.a + y.a, x.b + y.b)), false)
    }

    /// Average over the trailing `window` of step or discrete numbers.
    pub fn wavg(window: Interval) -> Result<Self> {
        Self::tavg().windowed(window, Extend::Constant)
    }

    /// Add a number as a (value, 1) pair.
    pub fn add_avg<W: NumericValue>(&mut self, value: &Temporal<W>) -> Result<()> {
        let pairs = value
            .map_values(|v| Ok(Double2::new(v.to_f64(), 1.0)))
            .reported()?;
        self.add(&pairs)
    }

    pub fn finish_avg(&self) -> Result<Option<Temporal<f64>>> {
        match self.finish()? {
            Some(sums) => tavg_finalfn(&sums).map(Some),
            None => Ok(None),
        }
    }
}

/// Divide accumulated (sum, count) pairs.
pub fn tavg_finalfn(sums: &Temporal<Double2>) -> Result<Temporal<f64>> {
    sums.map_values(|d| {
        if d.b == 0.0 {
            return Err(ChronotopeError::DivisionByZero);
        }
        Ok(d.a / d.b)
    })
    .reported()
}

fn fold<V: TemporalValue>(mut agg: Aggregator<V>, values: &[Temporal<V>]) -> Result<Option<Temporal<V>>> {
    for value in values {
        agg.add(value)?;
    }
    agg.finish()
}

pub fn tsum<V: NumericValue>(values: &[Temporal<V>]) -> Result<Option<Temporal<V>>> {
    fold(Aggregator::tsum(), values)
}

pub fn tmin<V: TemporalValue>(values: &[Temporal<V>]) -> Result<Option<Temporal<V>>> {
    fold(Aggregator::tmin(), values)
}

pub fn tmax<V: TemporalValue>(values: &[Temporal<V>]) -> Result<Option<Temporal<V>>> {
    fold(Aggregator::tmax(), values)
}

pub fn tand(values: &[Temporal<bool>]) -> Result<Option<Temporal<bool>>> {
    fold(Aggregator::tand(), values)
}

pub fn tor(values: &[Temporal<bool>]) -> Result<Option<Temporal<bool>>> {
    fold(Aggregator::tor(), values)
}

pub fn tcount<W: TemporalValue>(values: &[Temporal<W>]) -> Result<Option<Temporal<i32>>> {
    let mut agg = Aggregator::tcount();
    for value in values {
        agg.add_count(value)?;
    }
    agg.finish()
}

pub fn tavg<W: NumericValue>(values: &[Temporal<W>]) -> Result<Option<Temporal<f64>>> {
    let mut agg = Aggregator::tavg();
    for value in values {
        agg.add_avg(value)?;
    }
    agg.finish_avg()
}

pub fn wmin<V: NumericValue>(values: &[Temporal<V>], window: Interval) -> Result<Option<Temporal<V>>> {
    fold(Aggregator::wmin(window)?, values)
}

pub fn wmax<V: NumericValue>(values: &[Temporal<V>], window: Interval) -> Result<Option<Temporal<V>>> {
    fold(Aggregator::wmax(window)?, values)
}

pub fn wsum<V: NumericValue>(values: &[Temporal<V>], window: Interval) -> Result<Option<Temporal<V>>> {
    fold(Aggregator::wsum(window)?, values)
}

pub fn wcount<W: TemporalValue>(values: &[Temporal<W>], window: Interval) -> Result<Option<Temporal<i32>>> {
    let mut agg = Aggregator::wcount(window)?;
    for value in values {
        agg.add_count(value)?;
    }
    agg.finish()
}

pub fn wavg<W: NumericValue>(values: &[Temporal<W>], window: Interval) -> Result<Option<Temporal<f64>>> {
    let mut agg = Aggregator::wavg(window)?;
    for value in values {
        agg.add_avg(value)?;
    }
    agg.finish_avg()
}

/// Bounding period of all values seen so far.
pub fn temporal_extent<V: TemporalValue>(state: Option<TstzSpan>, value: &Temporal<V>) -> TstzSpan {
    let span = value.timespan();
    match state {
        Some(mut acc) => {
            acc.expand(&span);
            acc
        }
        None => span,
    }
}

/// Bounding value and time box of all numbers seen so far.
pub fn tnumber_extent<V: NumericValue>(state: Option<TBox>, value: &Temporal<V>) -> TBox {
    let bbox = value.bbox();
    match state {
        Some(mut acc) => {
            acc.expand(&bbox);
            acc
        }
        None => bbox,
    }
}

/// Bounding spatiotemporal box of all points seen so far. Points of
/// different SRID or dimensionality are rejected.
pub fn tpoint_extent(state: Option<STBox>, value: &Temporal<GeoPoint>) -> Result<STBox> {
    let bbox = value.bbox();
    match state {
        Some(acc) => acc.union(&bbox).reported(),
        None => Ok(bbox),
    }
}

/// Smallest span covering all spans seen so far.
pub fn span_extent<T: SpanBound>(state: Option<Span<T>>, span: &Span<T>) -> Span<T> {
    match state {
        Some(mut acc) => {
            acc.expand(span);
            acc
        }
        None => *span,
    }
}

/// Union of all spans seen so far.
pub fn span_union<T: SpanBound>(state: Option<SpanSet<T>>, span: &Span<T>) -> SpanSet<T> {
    match state {
        Some(acc) => acc.union_span(span),
        None => SpanSet::from_span(*span),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TimestampTz;

    fn int(text: &str) -> Temporal<i32> {
        text.parse().unwrap()
    }

    fn float(text: &str) -> Temporal<f64> {
        text.parse().unwrap()
    }

    fn ts(text: &str) -> TimestampTz {
        TimestampTz::parse(text).unwrap()
    }

    #[test]
    fn test_tsum_is_pointwise_sum() {
        let a = int("[1@2000-01-01, 1@2000-01-03]");
        let b = int("[2@2000-01-02, 2@2000-01-04]");
        let sum = tsum(&[a.clone(), b.clone()]).unwrap().unwrap();
        assert_eq!(sum.start_timestamp(), a.start_timestamp());
        assert_eq!(sum.end_timestamp(), b.end_timestamp());
        for day in ["2000-01-01", "2000-01-02 12:00:00", "2000-01-03", "2000-01-04"] {
            let t = ts(day);
            let expected = a.value_at_timestamp(t).unwrap_or(0) + b.value_at_timestamp(t).unwrap_or(0);
            assert_eq!(sum.value_at_timestamp(t), Some(expected), "at {}", day);
        }
    }

    #[test]
    fn test_tcount_counts_any_type() {
        let a = float("[1@2000-01-01, 5@2000-01-03]");
        let b = float("[0@2000-01-02, 0@2000-01-04]");
        let count = tcount(&[a, b]).unwrap().unwrap();
        assert_eq!(count.interp(), Interpolation::Step);
        assert_eq!(count.value_at_timestamp(ts("2000-01-01 12:00:00")), Some(1));
        assert_eq!(count.value_at_timestamp(ts("2000-01-02 12:00:00")), Some(2));
        assert_eq!(count.value_at_timestamp(ts("2000-01-03 12:00:00")), Some(1));
    }

    #[test]
    fn test_tmin_splits_at_crossing() {
        let a = float("[0@2000-01-01, 10@2000-01-03]");
        let b = float("[10@2000-01-01, 0@2000-01-03]");
        let min = tmin(&[a, b]).unwrap().unwrap();
        assert_eq!(min.value_at_timestamp(ts("2000-01-02")), Some(5.0));
        assert_eq!(min.value_at_timestamp(ts("2000-01-01")), Some(0.0));
        assert_eq!(min.value_at_timestamp(ts("2000-01-03")), Some(0.0));
        assert_eq!(*min.max_value(), 5.0);
    }

    #[test]
    fn test_tavg() {
        let a = int("[2@2000-01-01, 2@2000-01-03]");
        let b = int("[4@2000-01-02, 4@2000-01-03]");
        let avg = tavg(&[a, b]).unwrap().unwrap();
        assert_eq!(avg.value_at_timestamp(ts("2000-01-01 12:00:00")), Some(2.0));
        assert_eq!(avg.value_at_timestamp(ts("2000-01-02 12:00:00")), Some(3.0));
    }

    #[test]
    fn test_discrete_values_merge_by_timestamp() {
        let a = int("{1@2000-01-01, 2@2000-01-02}");
        let b = int("{10@2000-01-02, 20@2000-01-03}");
        let sum = tsum(&[a, b]).unwrap().unwrap();
        assert_eq!(sum.interp(), Interpolation::Discrete);
        assert_eq!(sum.values(), vec![1, 12, 20]);
    }

    #[test]
    fn test_merge_of_partial_states_matches_single_pass() {
        let inputs = [
            int("[1@2000-01-01, 1@2000-01-05]"),
            int("[2@2000-01-03, 2@2000-01-07)"),
            int("[3@2000-01-02, 3@2000-01-04]"),
            int("[4@2000-01-06, 4@2000-01-09]"),
        ];
        let single = tsum(&inputs).unwrap().unwrap();

        let mut left = Aggregator::tsum();
        let mut right = Aggregator::tsum();
        left.add(&inputs[0]).unwrap();
        left.add(&inputs[3]).unwrap();
        right.add(&inputs[1]).unwrap();
        right.add(&inputs[2]).unwrap();
        left.merge(right).unwrap();
        let merged = left.finish().unwrap().unwrap();
        assert_eq!(merged.time(), single.time());
        for hours in 0..(9 * 24) {
            let t = TimestampTz::from_micros(ts("2000-01-01").micros() + hours * 3_600_000_000);
            assert_eq!(merged.value_at_timestamp(t), single.value_at_timestamp(t));
        }
    }

    #[test]
    fn test_mixed_interpolations_are_rejected() {
        let mut agg = Aggregator::tsum();
        agg.add(&int("[1@2000-01-01, 1@2000-01-02]")).unwrap();
        let before = agg.finish().unwrap();
        let err = agg.add(&int("{1@2000-01-01}")).unwrap_err();
        assert!(matches!(err, ChronotopeError::Aggregation(_)));
        assert_eq!(agg.finish().unwrap(), before);
    }

    #[test]
    fn test_failed_combine_leaves_state_unchanged() {
        let mut agg = Aggregator::tsum();
        agg.add(&int("[2147483647@2000-01-01, 2147483647@2000-01-02]")).unwrap();
        let before = agg.finish().unwrap();
        assert!(agg.add(&int("[1@2000-01-01, 1@2000-01-02]")).is_err());
        assert_eq!(agg.finish().unwrap(), before);
        assert_eq!(agg.len(), 1);
    }

    #[test]
    fn test_empty_aggregate() {
        let agg: Aggregator<i32> = Aggregator::tsum();
        assert!(agg.is_empty());
        assert_eq!(agg.finish().unwrap(), None);
        assert_eq!(tsum::<i32>(&[]).unwrap(), None);
    }

    #[test]
    fn test_extents() {
        let a = float("[1@2000-01-01, 5@2000-01-03]");
        let b = float("[-2@2000-01-05, 0@2000-01-06]");
        let period = temporal_extent(Some(temporal_extent(None, &a)), &b);
        assert_eq!(period.to_string(), "[2000-01-01 00:00:00+00, 2000-01-06 00:00:00+00]");
        let tbox = tnumber_extent(Some(tnumber_extent(None, &a)), &b);
        assert_eq!(tbox.xmin(), Some(-2.0));
        assert_eq!(tbox.xmax(), Some(5.0));

        let p: Temporal<GeoPoint> = "[POINT(0 0)@2000-01-01, POINT(2 3)@2000-01-02]".parse().unwrap();
        let q: Temporal<GeoPoint> = "SRID=4326;POINT(1 1)@2000-01-01".parse().unwrap();
        let stbox = tpoint_extent(None, &p).unwrap();
        assert_eq!(stbox.xmax(), 2.0);
        assert!(tpoint_extent(Some(stbox), &q).is_err());

        let s1: Span<i32> = "[1, 3)".parse().unwrap();
        let s2: Span<i32> = "[5, 8)".parse().unwrap();
        assert_eq!(span_extent(Some(s1), &s2).to_string(), "[1, 8)");
        assert_eq!(span_union(Some(SpanSet::from_span(s1)), &s2).num_spans(), 2);
    }

    #[test]
    fn test_wmin_over_step_values() {
        let v = int("[5@2000-01-01, 1@2000-01-02, 3@2000-01-03, 3@2000-01-05]");
        let min = wmin(&[v], Interval::days(1)).unwrap().unwrap();
        assert_eq!(min.value_at_timestamp(ts("2000-01-01 12:00:00")), Some(5));
        assert_eq!(min.value_at_timestamp(ts("2000-01-02 12:00:00")), Some(1));
        assert_eq!(min.value_at_timestamp(ts("2000-01-03 12:00:00")), Some(1));
        assert_eq!(min.value_at_timestamp(ts("2000-01-04 12:00:00")), Some(3));
        assert_eq!(min.value_at_timestamp(ts("2000-01-06")), Some(3));
        assert_eq!(min.value_at_timestamp(ts("2000-01-06 01:00:00")), None);
    }

    #[test]
    fn test_wmin_and_wmax_over_linear_values() {
        let v = float("[0@2000-01-01, 10@2000-01-03]");
        let max = wmax(&[v.clone()], Interval::days(1)).unwrap().unwrap();
        assert_eq!(max.value_at_timestamp(ts("2000-01-02")), Some(5.0));
        assert_eq!(max.value_at_timestamp(ts("2000-01-03 12:00:00")), Some(10.0));
        assert_eq!(max.end_timestamp(), ts("2000-01-04"));

        let min = wmin(&[v], Interval::days(1)).unwrap().unwrap();
        assert_eq!(min.value_at_timestamp(ts("2000-01-01 12:00:00")), Some(0.0));
        assert_eq!(min.value_at_timestamp(ts("2000-01-03")), Some(5.0));
        assert_eq!(min.value_at_timestamp(ts("2000-01-04")), Some(10.0));
    }

    #[test]
    fn test_wsum_adds_pieces_met_in_window() {
        let v = int("{1@2000-01-01, 2@2000-01-02}");
        let sum = wsum(&[v], Interval::days(2)).unwrap().unwrap();
        assert_eq!(sum.interp(), Interpolation::Step);
        assert_eq!(sum.value_at_timestamp(ts("2000-01-01")), Some(1));
        assert_eq!(sum.value_at_timestamp(ts("2000-01-02 12:00:00")), Some(3));
        assert_eq!(sum.value_at_timestamp(ts("2000-01-03")), Some(3));
        assert_eq!(sum.value_at_timestamp(ts("2000-01-03 12:00:00")), Some(2));

        let linear = float("[0@2000-01-01, 10@2000-01-03]");
        let err = wsum(&[linear], Interval::days(1)).unwrap_err();
        assert!(matches!(err, ChronotopeError::FeatureNotSupported(_)));
    }

    #[test]
    fn test_wcount_and_wavg() {
        let a = float("[1@2000-01-01, 5@2000-01-03]");
        let b = float("[0@2000-01-04, 0@2000-01-06]");
        let count = wcount(&[a, b], Interval::days(1)).unwrap().unwrap();
        assert_eq!(count.value_at_timestamp(ts("2000-01-02")), Some(1));
        assert_eq!(count.value_at_timestamp(ts("2000-01-03 12:00:00")), Some(1));
        assert_eq!(count.value_at_timestamp(ts("2000-01-04")), Some(2));
        assert_eq!(count.value_at_timestamp(ts("2000-01-05")), Some(1));
        assert_eq!(count.end_timestamp(), ts("2000-01-07"));

        let steps = int("[2@2000-01-01, 4@2000-01-02, 4@2000-01-03]");
        let avg = wavg(&[steps], Interval::days(1)).unwrap().unwrap();
        assert_eq!(avg.value_at_timestamp(ts("2000-01-01 12:00:00")), Some(2.0));
        assert_eq!(avg.value_at_timestamp(ts("2000-01-02 12:00:00")), Some(3.0));
        assert_eq!(avg.value_at_timestamp(ts("2000-01-04")), Some(4.0));
    }

    #[test]
    fn test_window_must_be_positive() {
        assert!(matches!(
            Aggregator::<i32>::wsum(Interval::zero()),
            Err(ChronotopeError::InvalidArgValue(_))
        ));
        assert!(Aggregator::<f64>::wmin(Interval::days(-1)).is_err());
    }

    #[test]
    fn test_failed_window_add_leaves_state_unchanged() {
        let mut agg = Aggregator::wsum(Interval::days(1)).unwrap();
        agg.add(&int("[2147483647@2000-01-01, 2147483647@2000-01-02]")).unwrap();
        let before = agg.finish().unwrap();
        let keys = agg.keys();
        assert!(agg.add(&int("{1@1999-12-20, 1@2000-01-01 12:00:00}")).is_err());
        assert_eq!(agg.finish().unwrap(), before);
        assert_eq!(agg.keys(), keys);
    }

    #[test]
    fn test_keys_and_values_follow_time_order() {
        let mut agg = Aggregator::tsum();
        agg.add(&int("[2@2000-01-05, 2@2000-01-06]")).unwrap();
        agg.add(&int("[1@2000-01-01, 1@2000-01-03]")).unwrap();
        let keys = agg.keys();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0], TstzSpan::new(ts("2000-01-01"), ts("2000-01-03"), true, true).unwrap());
        assert_eq!(keys[1].lower(), ts("2000-01-05"));
        let values = agg.values();
        assert_eq!(values.len(), 2);
        assert_eq!(*values[1].start_instant().value(), 2);
    }
}
