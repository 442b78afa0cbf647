//! Restriction of temporal values to times, values and boxes.
//!
//! Every `at_*` operation is computed as a restriction to a set of times.
//! The matching `minus_*` operation restricts to the complement of those
//! times, so that the two results always partition the input.

use super::{Interpolation, TInstant, TSequence, Temporal};
use crate::boxes::{STBox, TBox, TemporalBox};
use crate::error::{ChronotopeError, ReportExt, Result};
use crate::span::{FloatSpan, FloatSpanSet, Set, Span, SpanSet, TstzSpan, TstzSpanSet};
use crate::types::{GeoPoint, NumericValue, TemporalValue, TimestampTz};
use smallvec::{SmallVec, smallvec};

/// Fraction range along a linear segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RatioRange {
    pub lo: f64,
    pub hi: f64,
    pub lo_inc: bool,
    pub hi_inc: bool,
}

impl RatioRange {
    const FULL: Self = Self {
        lo: 0.0,
        hi: 1.0,
        lo_inc: true,
        hi_inc: true,
    };

    fn point(r: f64) -> Self {
        Self {
            lo: r,
            hi: r,
            lo_inc: true,
            hi_inc: true,
        }
    }
}

type Ranges = SmallVec<[RatioRange; 2]>;

/// Selects base values, both at instants and along linear segments.
pub(crate) trait ValueFilter<V: TemporalValue> {
    fn matches(&self, value: &V) -> bool;

    /// Fractions of the segment from `start` to `end` whose values match.
    fn segment_ranges(&self, start: &V, end: &V) -> Ranges;

    /// Replace a matched, possibly interpolated, value by its exact form.
    fn snap(&self, value: V) -> V {
        value
    }
}

struct ValueEq<'a, V>(&'a V);

impl<V: TemporalValue> ValueFilter<V> for ValueEq<'_, V> {
    fn matches(&self, value: &V) -> bool {
        value == self.0
    }

    fn segment_ranges(&self, start: &V, end: &V) -> Ranges {
        if start == end {
            if self.matches(start) {
                return smallvec![RatioRange::FULL];
            }
            return SmallVec::new();
        }
        V::locate(start, end, self.0)
            .map(RatioRange::point)
            .into_iter()
            .collect()
    }

    fn snap(&self, _value: V) -> V {
        self.0.clone()
    }
}

struct ValueIn<'a, V>(&'a [V]);

impl<V: TemporalValue> ValueFilter<V> for ValueIn<'_, V> {
    fn matches(&self, value: &V) -> bool {
        self.0.iter().any(|v| v == value)
    }

    fn segment_ranges(&self, start: &V, end: &V) -> Ranges {
        self.0
            .iter()
            .flat_map(|v| ValueEq(v).segment_ranges(start, end))
            .collect()
    }

    fn snap(&self, value: V) -> V {
        self.0
            .iter()
            .find(|v| V::collinear(v, &value, v, 0.5))
            .cloned()
            .unwrap_or(value)
    }
}

struct NumberRanges<'a>(&'a FloatSpanSet);

impl<V: NumericValue> ValueFilter<V> for NumberRanges<'_> {
    fn matches(&self, value: &V) -> bool {
        self.0.contains_value(value.to_f64())
    }

    fn segment_ranges(&self, start: &V, end: &V) -> Ranges {
        let (s, e) = (start.to_f64(), end.to_f64());
        let mut ranges = Ranges::new();
        for span in self.0.spans() {
            if s == e {
                if span.contains_value(s) {
                    ranges.push(RatioRange::FULL);
                }
                continue;
            }
            let r1 = (span.lower() - s) / (e - s);
            let r2 = (span.upper() - s) / (e - s);
            let (mut lo, mut lo_inc, mut hi, mut hi_inc) = if e > s {
                (r1, span.lower_inc(), r2, span.upper_inc())
            } else {
                (r2, span.upper_inc(), r1, span.lower_inc())
            };
            if lo < 0.0 {
                lo = 0.0;
                lo_inc = true;
            }
            if hi > 1.0 {
                hi = 1.0;
                hi_inc = true;
            }
            if lo < hi || (lo == hi && lo_inc && hi_inc) {
                ranges.push(RatioRange {
                    lo,
                    hi,
                    lo_inc,
                    hi_inc,
                });
            }
        }
        ranges
    }
}

struct BoxFilter<'a>(&'a STBox);

impl ValueFilter<GeoPoint> for BoxFilter<'_> {
    fn matches(&self, value: &GeoPoint) -> bool {
        self.0.contains_point(value)
    }

    fn segment_ranges(&self, start: &GeoPoint, end: &GeoPoint) -> Ranges {
        let b = self.0;
        if !b.has_x() {
            return smallvec![RatioRange::FULL];
        }
        let (p0, p1) = (start.coords(), end.coords());
        let mut axes = vec![(b.xmin(), b.xmax(), 0), (b.ymin(), b.ymax(), 1)];
        if let (Some(zmin), Some(zmax), true) = (b.zmin(), b.zmax(), start.has_z()) {
            axes.push((zmin, zmax, 2));
        }
        // Liang-Barsky clipping of the segment against the box.
        let (mut t0, mut t1) = (0.0f64, 1.0f64);
        for (min, max, axis) in axes {
            let d = p1[axis] - p0[axis];
            if d == 0.0 {
                if p0[axis] < min || p0[axis] > max {
                    return Ranges::new();
                }
                continue;
            }
            let a = (min - p0[axis]) / d;
            let c = (max - p0[axis]) / d;
            t0 = t0.max(a.min(c));
            t1 = t1.min(a.max(c));
            if t0 > t1 {
                return Ranges::new();
            }
        }
        smallvec![RatioRange {
            lo: t0,
            hi: t1,
            lo_inc: true,
            hi_inc: true,
        }]
    }
}

/// Restriction of one sequence to a period.
fn seq_at_span<V: TemporalValue>(seq: &TSequence<V>, span: &TstzSpan) -> Result<Option<TSequence<V>>> {
    let Some(inter) = seq.period().intersection(span) else {
        return Ok(None);
    };
    let (lo, hi) = (inter.lower(), inter.upper());
    if inter.is_instant() {
        let inst = TInstant::new(seq.value_at_unchecked(lo), lo);
        return Ok(Some(TSequence::from_instant(inst, seq.interp)));
    }
    let mut instants = Vec::with_capacity(seq.instants.len());
    instants.push(TInstant::new(seq.value_at_unchecked(lo), lo));
    instants.extend(
        seq.instants
            .iter()
            .filter(|i| i.t > lo && i.t < hi)
            .cloned(),
    );
    let end = if seq.interp == Interpolation::Step && !inter.upper_inc() {
        seq.left_limit(hi)
    } else {
        seq.value_at_unchecked(hi)
    };
    instants.push(TInstant::new(end, hi));
    TSequence::make_inner(instants, inter.lower_inc(), inter.upper_inc(), seq.interp, true).map(Some)
}

/// Restriction of one sequence to a set of periods.
fn seq_at_spanset<V: TemporalValue>(
    seq: &TSequence<V>,
    times: &TstzSpanSet,
) -> Result<Vec<TSequence<V>>> {
    if seq.is_discrete() {
        let instants: Vec<TInstant<V>> = seq
            .instants
            .iter()
            .filter(|i| times.contains_value(i.t))
            .cloned()
            .collect();
        if instants.is_empty() {
            return Ok(Vec::new());
        }
        let piece = TSequence::make_inner(instants, true, true, Interpolation::Discrete, false)?;
        return Ok(vec![piece]);
    }
    let period = seq.period();
    let mut pieces = Vec::new();
    for span in times.spans().iter().filter(|s| s.overlaps(&period)) {
        pieces.extend(seq_at_span(seq, span)?);
    }
    Ok(pieces)
}

/// Pieces of `temp` restricted to `times`.
fn restrict_time_pieces<V: TemporalValue>(
    temp: &Temporal<V>,
    times: &TstzSpanSet,
) -> Result<Vec<TSequence<V>>> {
    let mut pieces = Vec::new();
    for seq in temp.sequence_views().iter() {
        pieces.extend(seq_at_spanset(seq, times)?);
    }
    Ok(pieces)
}

/// Times at which a sequence satisfies `filter`.
fn value_times<V, F>(seq: &TSequence<V>, filter: &F) -> Option<TstzSpanSet>
where
    V: TemporalValue,
    F: ValueFilter<V>,
{
    let instants = &seq.instants;
    let mut spans = Vec::new();
    if seq.is_discrete() || instants.len() == 1 {
        spans.extend(
            instants
                .iter()
                .filter(|i| filter.matches(&i.value))
                .map(|i| TstzSpan::singleton(i.t)),
        );
    } else {
        for pair in instants.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            match seq.interp {
                Interpolation::Linear => {
                    for r in filter.segment_ranges(&a.value, &b.value) {
                        spans.extend(Span::try_new(
                            a.t.lerp(b.t, r.lo),
                            a.t.lerp(b.t, r.hi),
                            r.lo_inc,
                            r.hi_inc,
                        ));
                    }
                }
                _ => {
                    if filter.matches(&a.value) {
                        spans.extend(Span::try_new(a.t, b.t, true, false));
                    }
                }
            }
        }
        let last = &instants[instants.len() - 1];
        if seq.interp == Interpolation::Step && filter.matches(&last.value) {
            spans.push(TstzSpan::singleton(last.t));
        }
    }
    SpanSet::from_pieces(spans)?.intersection_span(&seq.period())
}

impl<V: TemporalValue> Temporal<V> {
    /// Restriction to the times where `filter` holds, or to the other times.
    pub(crate) fn restrict_filter<F: ValueFilter<V>>(
        &self,
        filter: &F,
        at: bool,
    ) -> Result<Option<Self>> {
        if let Self::Instant(inst) = self {
            return Ok((filter.matches(&inst.value) == at).then(|| self.clone()));
        }
        let mut pieces = Vec::new();
        for seq in self.sequence_views().iter() {
            let times = value_times(seq, filter);
            let keep = if at {
                times
            } else {
                match times {
                    Some(times) => SpanSet::from_span(seq.period()).minus(&times),
                    None => Some(SpanSet::from_span(seq.period())),
                }
            };
            if let Some(keep) = keep {
                let mut found = seq_at_spanset(seq, &keep)?;
                if at {
                    for piece in &mut found {
                        for inst in &mut piece.instants {
                            inst.value = filter.snap(inst.value.clone());
                        }
                        piece.recompute_bbox();
                    }
                }
                pieces.extend(found);
            }
        }
        Self::from_pieces(pieces)
    }

    /// Complement of an `at` result within `self`.
    fn minus_result(&self, at: Option<Self>) -> Result<Option<Self>> {
        match at {
            None => Ok(Some(self.clone())),
            Some(found) => self.minus_tstzspanset_inner(&found.time()),
        }
    }

    pub fn at_value(&self, value: &V) -> Result<Option<Self>> {
        let run = || -> Result<Option<Self>> {
            self.start_value().check_compatible(value)?;
            self.restrict_filter(&ValueEq(value), true)
        };
        run().reported()
    }

    pub fn minus_value(&self, value: &V) -> Result<Option<Self>> {
        let run = || -> Result<Option<Self>> {
            self.start_value().check_compatible(value)?;
            self.restrict_filter(&ValueEq(value), false)
        };
        run().reported()
    }

    pub fn at_values(&self, values: &[V]) -> Result<Option<Self>> {
        let run = || -> Result<Option<Self>> {
            for v in values {
                self.start_value().check_compatible(v)?;
            }
            self.restrict_filter(&ValueIn(values), true)
        };
        run().reported()
    }

    pub fn minus_values(&self, values: &[V]) -> Result<Option<Self>> {
        let run = || -> Result<Option<Self>> {
            for v in values {
                self.start_value().check_compatible(v)?;
            }
            self.restrict_filter(&ValueIn(values), false)
        };
        run().reported()
    }

    pub fn at_min(&self) -> Result<Option<Self>> {
        self.at_value(&self.min_value().clone())
    }

    pub fn minus_min(&self) -> Result<Option<Self>> {
        self.minus_value(&self.min_value().clone())
    }

    pub fn at_max(&self) -> Result<Option<Self>> {
        self.at_value(&self.max_value().clone())
    }

    pub fn minus_max(&self) -> Result<Option<Self>> {
        self.minus_value(&self.max_value().clone())
    }

    pub fn at_timestamp(&self, t: TimestampTz) -> Option<Self> {
        self.value_at_timestamp(t)
            .map(|v| Self::Instant(TInstant::new(v, t)))
    }

    pub fn minus_timestamp(&self, t: TimestampTz) -> Result<Option<Self>> {
        self.minus_tstzspanset(&SpanSet::from_span(TstzSpan::singleton(t)))
    }

    /// Values at the given timestamps, as an instant or a discrete sequence.
    pub fn at_tstzset(&self, set: &Set<TimestampTz>) -> Result<Option<Self>> {
        let mut instants: Vec<TInstant<V>> = set
            .values()
            .iter()
            .filter_map(|t| self.value_at_timestamp(*t).map(|v| TInstant::new(v, *t)))
            .collect();
        match instants.len() {
            0 => Ok(None),
            1 => Ok(instants.pop().map(Self::Instant)),
            _ => TSequence::make(instants, true, true, Interpolation::Discrete, false)
                .map(|s| Some(Self::Sequence(s))),
        }
    }

    pub fn minus_tstzset(&self, set: &Set<TimestampTz>) -> Result<Option<Self>> {
        let points = SpanSet::from_normalized(
            set.values().iter().map(|t| TstzSpan::singleton(*t)).collect(),
        );
        self.minus_tstzspanset(&points)
    }

    pub fn at_tstzspan(&self, span: &TstzSpan) -> Result<Option<Self>> {
        self.at_tstzspanset(&SpanSet::from_span(*span))
    }

    pub fn minus_tstzspan(&self, span: &TstzSpan) -> Result<Option<Self>> {
        self.minus_tstzspanset(&SpanSet::from_span(*span))
    }

    pub fn at_tstzspanset(&self, times: &TstzSpanSet) -> Result<Option<Self>> {
        self.at_tstzspanset_inner(times).reported()
    }

    pub(crate) fn at_tstzspanset_inner(&self, times: &TstzSpanSet) -> Result<Option<Self>> {
        if !self.timespan().overlaps(times.span()) {
            return Ok(None);
        }
        if let Self::Instant(inst) = self {
            return Ok(times.contains_value(inst.t).then(|| self.clone()));
        }
        Self::from_pieces(restrict_time_pieces(self, times)?)
    }

    pub fn minus_tstzspanset(&self, times: &TstzSpanSet) -> Result<Option<Self>> {
        self.minus_tstzspanset_inner(times).reported()
    }

    pub(crate) fn minus_tstzspanset_inner(&self, times: &TstzSpanSet) -> Result<Option<Self>> {
        if !self.timespan().overlaps(times.span()) {
            return Ok(Some(self.clone()));
        }
        match self.time().minus(times) {
            None => Ok(None),
            Some(keep) => self.at_tstzspanset_inner(&keep),
        }
    }
}

impl<V: NumericValue> Temporal<V> {
    pub fn at_span(&self, span: &FloatSpan) -> Result<Option<Self>> {
        self.at_spanset(&SpanSet::from_span(*span))
    }

    pub fn minus_span(&self, span: &FloatSpan) -> Result<Option<Self>> {
        self.minus_spanset(&SpanSet::from_span(*span))
    }

    pub fn at_spanset(&self, spans: &FloatSpanSet) -> Result<Option<Self>> {
        if !self.bbox().overlaps_box(&TBox::from_span(*spans.span())) {
            return Ok(None);
        }
        self.restrict_filter(&NumberRanges(spans), true).reported()
    }

    pub fn minus_spanset(&self, spans: &FloatSpanSet) -> Result<Option<Self>> {
        if !self.bbox().overlaps_box(&TBox::from_span(*spans.span())) {
            return Ok(Some(self.clone()));
        }
        self.restrict_filter(&NumberRanges(spans), false).reported()
    }

    /// Restriction to the value and time extents of a box.
    pub fn at_tbox(&self, tbox: &TBox) -> Result<Option<Self>> {
        if !self.bbox().overlaps_box(tbox) {
            return Ok(None);
        }
        let timed = match tbox.period() {
            Some(p) => match self.at_tstzspan(p)? {
                Some(t) => t,
                None => return Ok(None),
            },
            None => self.clone(),
        };
        match tbox.span() {
            Some(s) => timed.at_span(s),
            None => Ok(Some(timed)),
        }
    }

    pub fn minus_tbox(&self, tbox: &TBox) -> Result<Option<Self>> {
        let at = self.at_tbox(tbox)?;
        self.minus_result(at).reported()
    }
}

impl Temporal<GeoPoint> {
    fn check_box(&self, stbox: &STBox) -> Result<()> {
        let p = self.start_value();
        if stbox.has_x() && stbox.srid() != p.srid {
            return Err(ChronotopeError::InvalidArg(format!(
                "Operation on mixed SRID {} and {}",
                p.srid,
                stbox.srid()
            )));
        }
        Ok(())
    }

    /// Restriction to a spatiotemporal box; segments are clipped against
    /// the spatial extent.
    pub fn at_stbox(&self, stbox: &STBox) -> Result<Option<Self>> {
        let run = || -> Result<Option<Self>> {
            self.check_box(stbox)?;
            if !self.bbox().overlaps_box(stbox) {
                return Ok(None);
            }
            let timed = match stbox.period() {
                Some(p) => match self.at_tstzspanset_inner(&SpanSet::from_span(*p))? {
                    Some(t) => t,
                    None => return Ok(None),
                },
                None => self.clone(),
            };
            timed.restrict_filter(&BoxFilter(stbox), true)
        };
        run().reported()
    }

    pub fn minus_stbox(&self, stbox: &STBox) -> Result<Option<Self>> {
        let at = self.at_stbox(stbox)?;
        self.minus_result(at).reported()
    }
}
