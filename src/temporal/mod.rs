//! Temporal values: base values that vary over time.
//!
//! A [`Temporal`] is either a single [`TInstant`], a [`TSequence`] of
//! instants joined by an [`Interpolation`], or a [`TSequenceSet`] of
//! time-disjoint continuous sequences. Every value caches its bounding box.
//!
//! # Examples
//!
//! ```
//! use chronotope::temporal::Temporal;
//!
//! let t: Temporal<f64> = "[1@2000-01-01, 3@2000-01-03]".parse().unwrap();
//! let mid = t.value_at_timestamp("2000-01-02".parse().unwrap());
//! assert_eq!(mid, Some(2.0));
//! ```

mod analytics;
mod instant;
mod lifting;
mod modify;
mod ops;
mod restrict;
mod sequence;
mod sequenceset;
mod text;
mod transform;

pub use instant::TInstant;
pub use sequence::TSequence;
pub use sequenceset::TSequenceSet;

pub(crate) use lifting::lift_binary;

use crate::error::{ChronotopeError, Result};
use crate::span::{SpanSet, TstzSpan, TstzSpanSet};
use crate::types::{Interval, TemporalValue, TimestampTz};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

/// How values are defined between recorded instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Interpolation {
    /// Only the recorded instants are defined
    Discrete,
    /// Each value holds until the next instant
    Step,
    /// Values vary linearly between instants
    Linear,
}

impl Interpolation {
    pub(crate) const fn code(self) -> u8 {
        match self {
            Self::Discrete => 1,
            Self::Step => 2,
            Self::Linear => 3,
        }
    }

    pub(crate) fn from_code(code: u8) -> Result<Self> {
        match code {
            1 => Ok(Self::Discrete),
            2 => Ok(Self::Step),
            3 => Ok(Self::Linear),
            other => Err(ChronotopeError::WkbInput(format!(
                "Invalid interpolation code {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Discrete => "Discrete",
            Self::Step => "Step",
            Self::Linear => "Linear",
        })
    }
}

/// Variant of a temporal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TemporalSubtype {
    Instant,
    Sequence,
    SequenceSet,
}

impl TemporalSubtype {
    pub(crate) const fn code(self) -> u8 {
        match self {
            Self::Instant => 1,
            Self::Sequence => 2,
            Self::SequenceSet => 3,
        }
    }

    pub(crate) fn from_code(code: u8) -> Result<Self> {
        match code {
            1 => Ok(Self::Instant),
            2 => Ok(Self::Sequence),
            3 => Ok(Self::SequenceSet),
            other => Err(ChronotopeError::WkbInput(format!(
                "Invalid temporal subtype {}",
                other
            ))),
        }
    }
}

/// A temporal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Temporal<V: TemporalValue> {
    Instant(TInstant<V>),
    Sequence(TSequence<V>),
    SequenceSet(TSequenceSet<V>),
}

impl<V: TemporalValue> From<TInstant<V>> for Temporal<V> {
    fn from(inst: TInstant<V>) -> Self {
        Self::Instant(inst)
    }
}

impl<V: TemporalValue> From<TSequence<V>> for Temporal<V> {
    fn from(seq: TSequence<V>) -> Self {
        Self::Sequence(seq)
    }
}

impl<V: TemporalValue> From<TSequenceSet<V>> for Temporal<V> {
    fn from(ss: TSequenceSet<V>) -> Self {
        Self::SequenceSet(ss)
    }
}

impl<V: TemporalValue> Temporal<V> {
    /// A sequence when one piece remains, a normalized sequence set otherwise.
    pub(crate) fn from_sequences(mut sequences: Vec<TSequence<V>>) -> Result<Self> {
        if sequences.len() == 1 {
            if let Some(seq) = sequences.pop() {
                return Ok(Self::Sequence(seq));
            }
        }
        let mut ss = TSequenceSet::make_inner(sequences, true)?;
        if ss.sequences.len() == 1 {
            if let Some(seq) = ss.sequences.pop() {
                return Ok(Self::Sequence(seq));
            }
        }
        Ok(Self::SequenceSet(ss))
    }

    /// Assemble restriction or lifting output.
    ///
    /// Nothing gives `None`; discrete pieces are merged into one discrete
    /// sequence; continuous pieces become a sequence or a sequence set.
    pub(crate) fn from_pieces(mut pieces: Vec<TSequence<V>>) -> Result<Option<Self>> {
        if pieces.is_empty() {
            return Ok(None);
        }
        if pieces.iter().all(|p| p.is_discrete()) {
            if pieces.len() == 1 {
                return Ok(pieces.pop().map(Self::Sequence));
            }
            let mut instants: Vec<TInstant<V>> =
                pieces.into_iter().flat_map(|p| p.instants).collect();
            instants.sort_by(|a, b| a.t.cmp(&b.t));
            instants.dedup_by(|a, b| a.t == b.t);
            let seq = TSequence::make_inner(instants, true, true, Interpolation::Discrete, false)?;
            return Ok(Some(Self::Sequence(seq)));
        }
        pieces.sort_by(|a, b| a.period().cmp_span(&b.period()));
        Self::from_sequences(pieces).map(Some)
    }

    /// The value viewed as continuous or discrete sequences.
    pub(crate) fn sequence_views(&self) -> Cow<'_, [TSequence<V>]> {
        match self {
            Self::Instant(inst) => Cow::Owned(vec![TSequence::from_instant(
                inst.clone(),
                Interpolation::Discrete,
            )]),
            Self::Sequence(seq) => Cow::Borrowed(std::slice::from_ref(seq)),
            Self::SequenceSet(ss) => Cow::Borrowed(&ss.sequences),
        }
    }

    pub fn subtype(&self) -> TemporalSubtype {
        match self {
            Self::Instant(_) => TemporalSubtype::Instant,
            Self::Sequence(_) => TemporalSubtype::Sequence,
            Self::SequenceSet(_) => TemporalSubtype::SequenceSet,
        }
    }

    /// Interpolation; instants report `Discrete`.
    pub fn interp(&self) -> Interpolation {
        match self {
            Self::Instant(_) => Interpolation::Discrete,
            Self::Sequence(seq) => seq.interp,
            Self::SequenceSet(ss) => ss.interp(),
        }
    }

    pub(crate) fn is_discrete(&self) -> bool {
        self.interp() == Interpolation::Discrete
    }

    pub fn bbox(&self) -> V::BBox {
        match self {
            Self::Instant(inst) => inst.bbox(),
            Self::Sequence(seq) => seq.bbox.clone(),
            Self::SequenceSet(ss) => ss.bbox.clone(),
        }
    }

    /// Bounding period.
    pub fn timespan(&self) -> TstzSpan {
        match self {
            Self::Instant(inst) => TstzSpan::singleton(inst.t),
            Self::Sequence(seq) => seq.period(),
            Self::SequenceSet(ss) => ss.period(),
        }
    }

    /// Time on which the value is defined.
    pub fn time(&self) -> TstzSpanSet {
        match self {
            Self::Instant(inst) => SpanSet::from_span(TstzSpan::singleton(inst.t)),
            Self::Sequence(seq) if seq.is_discrete() => SpanSet::from_normalized(
                seq.instants
                    .iter()
                    .map(|i| TstzSpan::singleton(i.t))
                    .collect(),
            ),
            Self::Sequence(seq) => SpanSet::from_span(seq.period()),
            Self::SequenceSet(ss) => {
                SpanSet::from_unsorted(ss.sequences.iter().map(|s| s.period()).collect())
            }
        }
    }

    /// Duration, either of the bounding period or of the defined time.
    pub fn duration(&self, boundspan: bool) -> Interval {
        match self {
            Self::Instant(_) => Interval::zero(),
            Self::Sequence(seq) if seq.is_discrete() => Interval::zero(),
            _ if boundspan => self.timespan().duration(),
            _ => self.time().duration(false),
        }
    }

    pub fn start_timestamp(&self) -> TimestampTz {
        self.start_instant().t
    }

    pub fn end_timestamp(&self) -> TimestampTz {
        self.end_instant().t
    }

    /// Distinct timestamps in increasing order.
    pub fn timestamps(&self) -> Vec<TimestampTz> {
        let mut result: Vec<TimestampTz> = self.instants().iter().map(|i| i.t).collect();
        result.dedup();
        result
    }

    pub fn num_instants(&self) -> usize {
        match self {
            Self::Instant(_) => 1,
            Self::Sequence(seq) => seq.instants.len(),
            Self::SequenceSet(ss) => ss.sequences.iter().map(|s| s.instants.len()).sum(),
        }
    }

    /// The `n`-th instant, counting from 0.
    pub fn instant_n(&self, n: usize) -> Option<&TInstant<V>> {
        match self {
            Self::Instant(inst) => (n == 0).then_some(inst),
            Self::Sequence(seq) => seq.instants.get(n),
            Self::SequenceSet(ss) => ss.sequences.iter().flat_map(|s| &s.instants).nth(n),
        }
    }

    pub fn instants(&self) -> Vec<&TInstant<V>> {
        match self {
            Self::Instant(inst) => vec![inst],
            Self::Sequence(seq) => seq.instants.iter().collect(),
            Self::SequenceSet(ss) => ss.sequences.iter().flat_map(|s| &s.instants).collect(),
        }
    }

    pub fn start_instant(&self) -> &TInstant<V> {
        match self {
            Self::Instant(inst) => inst,
            Self::Sequence(seq) => seq.start_instant(),
            Self::SequenceSet(ss) => ss.start_sequence().start_instant(),
        }
    }

    pub fn end_instant(&self) -> &TInstant<V> {
        match self {
            Self::Instant(inst) => inst,
            Self::Sequence(seq) => seq.end_instant(),
            Self::SequenceSet(ss) => ss.end_sequence().end_instant(),
        }
    }

    pub fn num_sequences(&self) -> usize {
        match self {
            Self::Instant(_) => 1,
            Self::Sequence(_) => 1,
            Self::SequenceSet(ss) => ss.sequences.len(),
        }
    }

    /// The `n`-th continuous sequence, counting from 0.
    pub fn sequence_n(&self, n: usize) -> Option<&TSequence<V>> {
        match self {
            Self::Instant(_) => None,
            Self::Sequence(seq) => (n == 0 && !seq.is_discrete()).then_some(seq),
            Self::SequenceSet(ss) => ss.sequences.get(n),
        }
    }

    pub fn start_value(&self) -> &V {
        &self.start_instant().value
    }

    pub fn end_value(&self) -> &V {
        &self.end_instant().value
    }

    /// Distinct values in increasing order.
    pub fn values(&self) -> Vec<V> {
        let mut values: Vec<V> = self.instants().iter().map(|i| i.value.clone()).collect();
        values.sort_by(|a, b| a.value_cmp(b));
        values.dedup_by(|a, b| a.value_cmp(b).is_eq());
        values
    }

    pub fn min_instant(&self) -> &TInstant<V> {
        let instants = self.instants();
        let mut best = instants[0];
        for &inst in &instants[1..] {
            if inst.value.value_cmp(&best.value) == Ordering::Less {
                best = inst;
            }
        }
        best
    }

    pub fn max_instant(&self) -> &TInstant<V> {
        let instants = self.instants();
        let mut best = instants[0];
        for &inst in &instants[1..] {
            if inst.value.value_cmp(&best.value) == Ordering::Greater {
                best = inst;
            }
        }
        best
    }

    pub fn min_value(&self) -> &V {
        &self.min_instant().value
    }

    pub fn max_value(&self) -> &V {
        &self.max_instant().value
    }

    /// Value at `t`, honoring bound inclusivity; `None` outside the
    /// defined time.
    pub fn value_at_timestamp(&self, t: TimestampTz) -> Option<V> {
        match self {
            Self::Instant(inst) => (inst.t == t).then(|| inst.value.clone()),
            Self::Sequence(seq) => seq.value_at(t),
            Self::SequenceSet(ss) => ss.value_at(t),
        }
    }

    pub fn lower_inc(&self) -> bool {
        match self {
            Self::Instant(_) => true,
            Self::Sequence(seq) => seq.lower_inc,
            Self::SequenceSet(ss) => ss.start_sequence().lower_inc,
        }
    }

    pub fn upper_inc(&self) -> bool {
        match self {
            Self::Instant(_) => true,
            Self::Sequence(seq) => seq.upper_inc,
            Self::SequenceSet(ss) => ss.end_sequence().upper_inc,
        }
    }

    /// Total order: same-variant values compare structurally, mixed
    /// variants by bounding box and then by variant.
    pub fn temporal_cmp(&self, other: &Self) -> Ordering {
        use crate::boxes::TemporalBox;
        match (self, other) {
            (Self::Instant(a), Self::Instant(b)) => a.cmp_instant(b),
            (Self::Sequence(a), Self::Sequence(b)) => a.cmp_seq(b),
            (Self::SequenceSet(a), Self::SequenceSet(b)) => a.cmp_seqset(b),
            _ => self
                .bbox()
                .box_cmp(&other.bbox())
                .then_with(|| self.subtype().cmp(&other.subtype())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(day: i64) -> TimestampTz {
        TimestampTz::from_micros(day * 86_400_000_000)
    }

    fn seqset() -> Temporal<i32> {
        let a = TSequence::make(
            vec![TInstant::new(1, t(0)), TInstant::new(5, t(2))],
            true,
            true,
            Interpolation::Step,
            true,
        )
        .unwrap();
        let b = TSequence::make(
            vec![TInstant::new(3, t(4)), TInstant::new(3, t(6))],
            false,
            true,
            Interpolation::Step,
            true,
        )
        .unwrap();
        Temporal::SequenceSet(TSequenceSet::make(vec![a, b], true).unwrap())
    }

    #[test]
    fn test_accessors() {
        let v = seqset();
        assert_eq!(v.subtype(), TemporalSubtype::SequenceSet);
        assert_eq!(v.interp(), Interpolation::Step);
        assert_eq!(v.num_instants(), 4);
        assert_eq!(v.num_sequences(), 2);
        assert_eq!(v.instant_n(2).map(|i| i.value), Some(3));
        assert_eq!(*v.min_value(), 1);
        assert_eq!(*v.max_value(), 5);
        assert_eq!(v.values(), vec![1, 3, 5]);
        assert_eq!(v.start_timestamp(), t(0));
        assert_eq!(v.end_timestamp(), t(6));
        assert_eq!(v.duration(true), Interval::days(6));
        assert_eq!(v.duration(false), Interval::days(4));
        assert_eq!(v.time().num_spans(), 2);
        assert!(!v.sequence_n(1).unwrap().lower_inc());
    }

    #[test]
    fn test_value_at_timestamp() {
        let v = seqset();
        assert_eq!(v.value_at_timestamp(t(1)), Some(1));
        assert_eq!(v.value_at_timestamp(t(2)), Some(5));
        assert_eq!(v.value_at_timestamp(t(3)), None);
        assert_eq!(v.value_at_timestamp(t(4)), None);
        assert_eq!(v.value_at_timestamp(t(5)), Some(3));
    }

    #[test]
    fn test_from_pieces() {
        assert_eq!(Temporal::<i32>::from_pieces(vec![]).unwrap(), None);
        let discrete = |d| {
            TSequence::make(vec![TInstant::new(1, t(d))], true, true, Interpolation::Discrete, true)
                .unwrap()
        };
        let merged = Temporal::from_pieces(vec![discrete(3), discrete(1)])
            .unwrap()
            .unwrap();
        assert_eq!(merged.interp(), Interpolation::Discrete);
        assert_eq!(merged.timestamps(), vec![t(1), t(3)]);
    }

    #[test]
    fn test_ordering() {
        let a = Temporal::Instant(TInstant::new(1, t(0)));
        let b = Temporal::Instant(TInstant::new(2, t(0)));
        let c = Temporal::Instant(TInstant::new(0, t(1)));
        assert_eq!(a.temporal_cmp(&b), Ordering::Less);
        assert_eq!(b.temporal_cmp(&c), Ordering::Less);
    }
}
