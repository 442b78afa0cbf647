use super::{Bound, Span, SpanBound};
use crate::config::DEFAULT_FLOAT_DIGITS;
use crate::error::{ChronotopeError, ReportExt, Result};
use crate::parse::{split_top_level, strip_braces};
use crate::types::{Interval, TimestampTz};
use std::fmt;
use std::str::FromStr;

/// An ordered union of disjoint, non-adjacent spans.
///
/// Construction always normalizes: overlapping or adjacent input spans are
/// merged, so a `SpanSet` is never observed in a non-normalized state.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanSet<T> {
    spans: Vec<Span<T>>,
    span: Span<T>,
}

fn normalize<T: SpanBound>(mut spans: Vec<Span<T>>) -> Vec<Span<T>> {
    spans.sort_by(|a, b| a.cmp_span(b));
    let mut out: Vec<Span<T>> = Vec::with_capacity(spans.len());
    for s in spans {
        match out.last_mut() {
            Some(last) if last.overlaps(&s) || last.adjacent(&s) => last.expand(&s),
            _ => out.push(s),
        }
    }
    out
}

impl<T: SpanBound> SpanSet<T> {
    /// Build a normalized span set; fails on empty input.
    pub fn new(spans: Vec<Span<T>>) -> Result<Self> {
        if spans.is_empty() {
            return Err(ChronotopeError::InvalidArgValue(
                "A span set needs at least one span".to_string(),
            ))
            .reported();
        }
        Ok(Self::from_unsorted(spans))
    }

    pub fn from_span(span: Span<T>) -> Self {
        Self {
            spans: vec![span],
            span,
        }
    }

    /// Normalize a non-empty vector of spans.
    pub(crate) fn from_unsorted(spans: Vec<Span<T>>) -> Self {
        Self::from_normalized(normalize(spans))
    }

    /// Wrap spans that are already sorted, disjoint and non-adjacent.
    pub(crate) fn from_normalized(spans: Vec<Span<T>>) -> Self {
        debug_assert!(!spans.is_empty());
        let mut span = spans[0];
        if let Some(last) = spans.last() {
            span.expand(last);
        }
        Self { spans, span }
    }

    /// `None` for an empty vector.
    pub(crate) fn from_pieces(spans: Vec<Span<T>>) -> Option<Self> {
        (!spans.is_empty()).then(|| Self::from_unsorted(spans))
    }

    pub fn spans(&self) -> &[Span<T>] {
        &self.spans
    }

    pub fn into_spans(self) -> Vec<Span<T>> {
        self.spans
    }

    /// Bounding span.
    pub fn span(&self) -> &Span<T> {
        &self.span
    }

    pub fn num_spans(&self) -> usize {
        self.spans.len()
    }

    pub fn span_n(&self, n: usize) -> Option<&Span<T>> {
        self.spans.get(n)
    }

    pub fn start_span(&self) -> &Span<T> {
        &self.spans[0]
    }

    pub fn end_span(&self) -> &Span<T> {
        &self.spans[self.spans.len() - 1]
    }

    pub fn lower(&self) -> T {
        self.span.lower()
    }

    pub fn upper(&self) -> T {
        self.span.upper()
    }

    pub fn lower_inc(&self) -> bool {
        self.span.lower_inc()
    }

    pub fn upper_inc(&self) -> bool {
        self.span.upper_inc()
    }

    /// Sum of the component widths, or the bounding width when `boundspan`.
    pub fn width(&self, boundspan: bool) -> f64 {
        let width = |s: &Span<T>| s.upper().native() - s.lower().native();
        if boundspan {
            width(&self.span)
        } else {
            self.spans.iter().map(width).sum()
        }
    }

    /// Index of the first span not entirely left of `bound`.
    fn first_reaching(&self, bound: &Bound<T>) -> usize {
        self.spans.partition_point(|s| s.upper_bound().lt(bound))
    }

    pub fn contains_value(&self, value: T) -> bool {
        let i = self.first_reaching(&Bound::at(value));
        self.spans.get(i).is_some_and(|s| s.contains_value(value))
    }

    pub fn contains_span(&self, span: &Span<T>) -> bool {
        let i = self.first_reaching(&span.lower_bound());
        self.spans.get(i).is_some_and(|s| s.contains(span))
    }

    pub fn contains(&self, other: &Self) -> bool {
        self.span.contains(&other.span) && other.spans.iter().all(|s| self.contains_span(s))
    }

    pub fn contained(&self, other: &Self) -> bool {
        other.contains(self)
    }

    pub fn overlaps_span(&self, span: &Span<T>) -> bool {
        let i = self.first_reaching(&span.lower_bound());
        self.spans.get(i).is_some_and(|s| s.overlaps(span))
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        if !self.span.overlaps(&other.span) {
            return false;
        }
        let (mut i, mut j) = (0, 0);
        while i < self.spans.len() && j < other.spans.len() {
            let (a, b) = (&self.spans[i], &other.spans[j]);
            if a.overlaps(b) {
                return true;
            }
            if a.upper_bound().lt(&b.upper_bound()) {
                i += 1;
            } else {
                j += 1;
            }
        }
        false
    }

    pub fn adjacent_span(&self, span: &Span<T>) -> bool {
        self.span.adjacent(span)
    }

    pub fn adjacent(&self, other: &Self) -> bool {
        self.span.adjacent(&other.span)
    }

    pub fn left(&self, other: &Self) -> bool {
        self.span.left(&other.span)
    }

    pub fn overleft(&self, other: &Self) -> bool {
        self.span.overleft(&other.span)
    }

    pub fn right(&self, other: &Self) -> bool {
        self.span.right(&other.span)
    }

    pub fn overright(&self, other: &Self) -> bool {
        self.span.overright(&other.span)
    }

    pub fn before(&self, other: &Self) -> bool {
        self.span.before(&other.span)
    }

    pub fn after(&self, other: &Self) -> bool {
        self.span.after(&other.span)
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut spans = Vec::with_capacity(self.spans.len() + other.spans.len());
        spans.extend_from_slice(&self.spans);
        spans.extend_from_slice(&other.spans);
        Self::from_unsorted(spans)
    }

    pub fn union_span(&self, span: &Span<T>) -> Self {
        let mut spans = self.spans.clone();
        spans.push(*span);
        Self::from_unsorted(spans)
    }

    /// Common part, `None` when empty.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.span.overlaps(&other.span) {
            return None;
        }
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.spans.len() && j < other.spans.len() {
            let (a, b) = (&self.spans[i], &other.spans[j]);
            if let Some(common) = a.intersection(b) {
                out.push(common);
            }
            if a.upper_bound().lt(&b.upper_bound()) {
                i += 1;
            } else {
                j += 1;
            }
        }
        Self::from_pieces(out)
    }

    pub fn intersection_span(&self, span: &Span<T>) -> Option<Self> {
        self.intersection(&Self::from_span(*span))
    }

    /// Difference, `None` when nothing is left.
    pub fn minus(&self, other: &Self) -> Option<Self> {
        let mut out = Vec::with_capacity(self.spans.len());
        let mut j = 0;
        for s in &self.spans {
            while j < other.spans.len() && other.spans[j].upper_bound().lt(&s.lower_bound()) {
                j += 1;
            }
            let mut pieces = vec![*s];
            for o in other.spans[j..].iter().take_while(|o| !s.upper_bound().lt(&o.lower_bound())) {
                pieces = pieces
                    .iter()
                    .filter_map(|p| p.minus(o))
                    .flat_map(SpanSet::into_spans)
                    .collect();
                if pieces.is_empty() {
                    break;
                }
            }
            out.extend(pieces);
        }
        Self::from_pieces(out)
    }

    pub fn minus_span(&self, span: &Span<T>) -> Option<Self> {
        self.minus(&Self::from_span(*span))
    }

    pub fn minus_value(&self, value: T) -> Option<Self> {
        match Span::point(value) {
            Ok(point) => self.minus_span(&point),
            Err(_) => Some(self.clone()),
        }
    }

    /// Smallest gap between any two components, 0 when they overlap.
    pub fn distance(&self, other: &Self) -> f64 {
        if self.overlaps(other) {
            return 0.0;
        }
        self.spans
            .iter()
            .flat_map(|a| other.spans.iter().map(move |b| a.distance(b)))
            .fold(f64::INFINITY, f64::min)
    }

    pub fn distance_value(&self, value: T) -> f64 {
        self.spans
            .iter()
            .map(|s| s.distance_value(value))
            .fold(f64::INFINITY, f64::min)
    }

    pub fn shift(&self, delta: T::Delta) -> Result<Self> {
        let spans = self
            .spans
            .iter()
            .map(|s| s.shift(delta))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_unsorted(spans))
    }

    /// Scale every bound away from the lower bound by `factor`.
    pub fn scale(&self, factor: f64) -> Result<Self> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(ChronotopeError::InvalidArgValue(format!(
                "Scale factor must be positive, got {}",
                factor
            )));
        }
        let origin = self.lower().native();
        let map = |v: T| T::from_native(origin + (v.native() - origin) * factor);
        let spans = self
            .spans
            .iter()
            .map(|s| Span::new(map(s.lower())?, map(s.upper())?, s.lower_inc(), s.upper_inc()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_unsorted(spans))
    }

    pub fn to_text(&self, maxdd: usize) -> String {
        let parts: Vec<String> = self.spans.iter().map(|s| s.to_text(maxdd)).collect();
        format!("{{{}}}", parts.join(", "))
    }

    pub fn parse(input: &str) -> Result<Self> {
        let parse = || -> Result<Self> {
            let inner = strip_braces(input, "span set")?;
            let spans = split_top_level(inner)?
                .into_iter()
                .map(Span::parse_inner)
                .collect::<Result<Vec<_>>>()?;
            Ok(Self::from_unsorted(spans))
        };
        parse().reported()
    }
}

impl SpanSet<TimestampTz> {
    /// Total duration, or the bounding duration when `boundspan`.
    pub fn duration(&self, boundspan: bool) -> Interval {
        if boundspan {
            self.span.duration()
        } else {
            self.spans
                .iter()
                .fold(Interval::zero(), |acc, s| acc + s.duration())
        }
    }

    pub fn start_timestamp(&self) -> TimestampTz {
        self.lower()
    }

    pub fn end_timestamp(&self) -> TimestampTz {
        self.upper()
    }
}

impl<T: SpanBound> From<Span<T>> for SpanSet<T> {
    fn from(span: Span<T>) -> Self {
        Self::from_span(span)
    }
}

impl<T: SpanBound> fmt::Display for SpanSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text(DEFAULT_FLOAT_DIGITS))
    }
}

impl<T: SpanBound> FromStr for SpanSet<T> {
    type Err = ChronotopeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
