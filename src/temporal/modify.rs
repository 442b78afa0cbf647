//! Merging, insertion, deletion and in-place appends.

use super::sequence::normalize_instants;
use super::{Interpolation, TInstant, TSequence, TSequenceSet, Temporal};
use crate::boxes::TemporalBox;
use crate::config::AppendConfig;
use crate::error::{ChronotopeError, ReportExt, Result};
use crate::span::{Set, SpanSet, TstzSpan, TstzSpanSet};
use crate::types::{Interval, TemporalValue, TimestampTz};

fn overlap_error(t: TimestampTz) -> ChronotopeError {
    ChronotopeError::InvalidArg(format!(
        "The temporal values have different values at their common timestamp {}",
        t
    ))
}

/// Merge discrete inputs: one instant per timestamp, equal values required
/// on shared timestamps.
fn merge_discrete<V: TemporalValue>(values: &[&Temporal<V>]) -> Result<Temporal<V>> {
    let mut instants: Vec<TInstant<V>> = values
        .iter()
        .flat_map(|v| v.instants().into_iter().cloned())
        .collect();
    instants.sort_by(|a, b| a.t.cmp(&b.t));
    let mut result: Vec<TInstant<V>> = Vec::with_capacity(instants.len());
    for inst in instants {
        match result.last() {
            Some(last) if last.t == inst.t => {
                if last.value != inst.value {
                    return Err(overlap_error(inst.t));
                }
            }
            _ => result.push(inst),
        }
    }
    if result.len() == 1 {
        if let Some(inst) = result.pop() {
            return Ok(Temporal::Instant(inst));
        }
    }
    let seq = TSequence::make_inner(result, true, true, Interpolation::Discrete, false)?;
    Ok(Temporal::Sequence(seq))
}

/// Sort continuous sequences and reject overlaps, dropping a boundary
/// instant shared with an equal value.
fn merge_continuous<V: TemporalValue>(mut sequences: Vec<TSequence<V>>) -> Result<Temporal<V>> {
    let interp = sequences[0].interp;
    if sequences.iter().any(|s| s.interp != interp) {
        return Err(ChronotopeError::InvalidArg(
            "The temporal values must have the same interpolation".to_string(),
        ));
    }
    sequences.sort_by(|a, b| a.period().cmp_span(&b.period()));
    let mut result: Vec<TSequence<V>> = Vec::with_capacity(sequences.len());
    for mut seq in sequences {
        if let Some(prev) = result.last() {
            let (end, start) = (prev.end_timestamp(), seq.start_timestamp());
            if end > start {
                return Err(ChronotopeError::InvalidArg(format!(
                    "The temporal values overlap on time at {}",
                    start
                )));
            }
            if end == start && prev.upper_inc && seq.lower_inc {
                if prev.end_instant().value != seq.start_instant().value {
                    return Err(overlap_error(start));
                }
                if seq.is_instantaneous() {
                    continue;
                }
                seq.lower_inc = false;
                seq.recompute_bbox();
            }
        }
        result.push(seq);
    }
    Temporal::from_sequences(result)
}

impl<V: TemporalValue> Temporal<V> {
    /// Union of two temporal values defined on (mostly) disjoint times.
    pub fn merge(&self, other: &Self) -> Result<Self> {
        Self::merge_refs(&[self, other]).reported()
    }

    /// Merge any number of temporal values; fails on an empty slice.
    pub fn merge_array(values: &[Self]) -> Result<Self> {
        let refs: Vec<&Self> = values.iter().collect();
        Self::merge_refs(&refs).reported()
    }

    fn merge_refs(values: &[&Self]) -> Result<Self> {
        let Some(first) = values.first() else {
            return Err(ChronotopeError::InvalidArg(
                "Cannot merge an empty list of temporal values".to_string(),
            ));
        };
        for v in &values[1..] {
            first.start_value().check_compatible(v.start_value())?;
        }
        let continuous: Vec<&&Self> = values.iter().filter(|v| !v.is_discrete()).collect();
        if continuous.is_empty() {
            return merge_discrete(values);
        }
        let interp = continuous[0].interp();
        let mut sequences = Vec::new();
        for v in values {
            match v {
                Self::Instant(inst) => sequences.push(TSequence::from_instant(inst.clone(), interp)),
                Self::Sequence(seq) if seq.is_discrete() => {
                    return Err(ChronotopeError::InvalidArg(
                        "Cannot merge discrete and continuous temporal values".to_string(),
                    ));
                }
                _ => sequences.extend(v.sequence_views().iter().cloned()),
            }
        }
        merge_continuous(sequences)
    }

    /// Add the values of `other`, which may only meet `self` on boundary
    /// instants with equal values. With `connect`, each inserted sequence
    /// is joined to the sequences of `self` right before and after it.
    pub fn insert(&self, other: &Self, connect: bool) -> Result<Self> {
        let run = || -> Result<Self> {
            let merged = Self::merge_refs(&[self, other])?;
            if !connect || merged.is_discrete() {
                return Ok(merged);
            }
            let mut tagged: Vec<(TSequence<V>, bool)> = self
                .sequence_views()
                .iter()
                .map(|s| (s.clone(), false))
                .chain(other.sequence_views().iter().map(|s| (s.clone(), true)))
                .collect();
            tagged.sort_by(|a, b| a.0.period().cmp_span(&b.0.period()));
            let interp = merged.interp();
            let mut bridged: Vec<(TSequence<V>, bool)> = Vec::with_capacity(tagged.len());
            for (seq, inserted) in tagged {
                let seq = if seq.interp == interp {
                    seq
                } else {
                    TSequence::make_inner(seq.instants, true, true, interp, false)?
                };
                match bridged.last_mut() {
                    Some((prev, prev_inserted))
                        if *prev_inserted != inserted
                            && prev.end_timestamp() < seq.start_timestamp() =>
                    {
                        let mut instants = prev.instants.clone();
                        instants.extend(seq.instants.iter().cloned());
                        let instants = normalize_instants(instants, interp);
                        *prev = TSequence::make_inner(
                            instants,
                            prev.lower_inc,
                            seq.upper_inc,
                            interp,
                            false,
                        )?;
                        *prev_inserted = inserted;
                    }
                    _ => bridged.push((seq, inserted)),
                }
            }
            let values: Vec<Self> = bridged
                .into_iter()
                .map(|(s, _)| Self::Sequence(s))
                .collect();
            let refs: Vec<&Self> = values.iter().collect();
            Self::merge_refs(&refs)
        };
        run().reported()
    }

    /// Replace the values of `self` on the time of `other`, then insert
    /// `other` as [`Temporal::insert`] does.
    pub fn update(&self, other: &Self, connect: bool) -> Result<Self> {
        match self.minus_tstzspanset(&other.time())? {
            Some(rest) => rest.insert(other, connect),
            None => Ok(other.clone()),
        }
    }

    pub fn delete_timestamp(&self, t: TimestampTz, connect: bool) -> Result<Option<Self>> {
        self.delete_tstzspanset(&SpanSet::from_span(TstzSpan::singleton(t)), connect)
    }

    pub fn delete_tstzset(&self, set: &Set<TimestampTz>, connect: bool) -> Result<Option<Self>> {
        let times = SpanSet::from_normalized(
            set.values().iter().map(|t| TstzSpan::singleton(*t)).collect(),
        );
        self.delete_tstzspanset(&times, connect)
    }

    pub fn delete_tstzspan(&self, span: &TstzSpan, connect: bool) -> Result<Option<Self>> {
        self.delete_tstzspanset(&SpanSet::from_span(*span), connect)
    }

    /// Remove the values at `times`. Without `connect` this is the time
    /// restriction `minus`; with it, the instants left on both sides of a
    /// deleted period are joined.
    pub fn delete_tstzspanset(&self, times: &TstzSpanSet, connect: bool) -> Result<Option<Self>> {
        if !connect || self.is_discrete() {
            return self.minus_tstzspanset(times);
        }
        let run = || -> Result<Option<Self>> {
            let mut pieces = Vec::new();
            for seq in self.sequence_views().iter() {
                pieces.extend(delete_connected(seq, times)?);
            }
            Self::from_pieces(pieces)
        };
        run().reported()
    }

    /// Append an instant in place, with the default append configuration.
    ///
    /// `interp` is used when `self` is a single instant. A gap larger than
    /// `maxdist` in value or `maxt` in time starts a new sequence.
    pub fn append_instant(
        &mut self,
        inst: TInstant<V>,
        interp: Interpolation,
        maxdist: Option<f64>,
        maxt: Option<Interval>,
    ) -> Result<()> {
        self.append_instant_with(inst, interp, maxdist, maxt, &AppendConfig::default())
    }

    pub fn append_instant_with(
        &mut self,
        inst: TInstant<V>,
        interp: Interpolation,
        maxdist: Option<f64>,
        maxt: Option<Interval>,
        cfg: &AppendConfig,
    ) -> Result<()> {
        let gaps = Gaps { maxdist, maxt };
        self.append_inner(inst, interp, &gaps, cfg).reported()
    }

    fn append_inner(
        &mut self,
        inst: TInstant<V>,
        interp: Interpolation,
        gaps: &Gaps,
        cfg: &AppendConfig,
    ) -> Result<()> {
        self.start_value().check_compatible(&inst.value)?;
        match self {
            Self::Instant(first) => {
                if inst.t < first.t {
                    return Err(increasing_error(first.t, inst.t));
                }
                if inst.t == first.t {
                    return if inst.value == first.value {
                        Ok(())
                    } else {
                        Err(overlap_error(inst.t))
                    };
                }
                let first = first.clone();
                if interp != Interpolation::Discrete && gaps.exceeded(&first, &inst) {
                    let sequences = vec![
                        TSequence::make_inner(vec![first], true, true, interp, false)?,
                        TSequence::from_instant(inst, interp),
                    ];
                    *self = Self::SequenceSet(TSequenceSet::make_inner(sequences, false)?);
                    return Ok(());
                }
                let seq = TSequence::make_inner(vec![first, inst], true, true, interp, false)?;
                let mut seq = seq;
                seq.reserve_to(cfg.initial_maxcount)?;
                *self = Self::Sequence(seq);
                Ok(())
            }
            Self::Sequence(seq) => match append_to_sequence(seq, inst, gaps, cfg)? {
                Appended::Done => Ok(()),
                Appended::Split(inst) => {
                    let new_seq = TSequence::from_instant(inst, seq.interp);
                    let sequences = vec![seq.clone(), new_seq];
                    *self = Self::SequenceSet(TSequenceSet::make_inner(sequences, false)?);
                    Ok(())
                }
            },
            Self::SequenceSet(ss) => {
                let Some(last) = ss.sequences.last_mut() else {
                    return Err(ChronotopeError::Internal("Empty sequence set".to_string()));
                };
                match append_to_sequence(last, inst, gaps, cfg)? {
                    Appended::Done => {}
                    Appended::Split(inst) => {
                        let interp = last.interp;
                        ss.sequences.push(TSequence::from_instant(inst, interp));
                    }
                }
                if let Some(last) = ss.sequences.last() {
                    let bbox = last.bbox.clone();
                    ss.bbox.expand(&bbox);
                }
                Ok(())
            }
        }
    }

    /// Append a sequence after the end of `self`, joining it to the last
    /// sequence when they touch.
    pub fn append_sequence(&mut self, seq: TSequence<V>) -> Result<()> {
        let run = |this: &Self| -> Result<Self> {
            this.start_value().check_compatible(&seq.start_instant().value)?;
            if this.is_discrete() != seq.is_discrete() && !matches!(this, Self::Instant(_)) {
                return Err(ChronotopeError::InvalidArg(
                    "Cannot append a sequence with a different interpolation".to_string(),
                ));
            }
            if this.end_timestamp() > seq.start_timestamp() {
                return Err(increasing_error(this.end_timestamp(), seq.start_timestamp()));
            }
            let appended = Temporal::Sequence(seq.clone());
            Self::merge_refs(&[this, &appended])
        };
        let result = run(self).reported()?;
        *self = result;
        Ok(())
    }
}

fn increasing_error(prev: TimestampTz, next: TimestampTz) -> ChronotopeError {
    ChronotopeError::InvalidArg(format!(
        "Timestamps for temporal value must be increasing: {}, {}",
        prev, next
    ))
}

struct Gaps {
    maxdist: Option<f64>,
    maxt: Option<Interval>,
}

impl Gaps {
    fn exceeded<V: TemporalValue>(&self, last: &TInstant<V>, next: &TInstant<V>) -> bool {
        let time_gap = self.maxt.is_some_and(|m| next.t.delta_since(last.t) > m);
        let value_gap = self
            .maxdist
            .is_some_and(|m| last.value.gap_distance(&next.value).is_some_and(|d| d > m));
        time_gap || value_gap
    }
}

enum Appended<V> {
    Done,
    /// The instant starts a new sequence.
    Split(TInstant<V>),
}

fn append_to_sequence<V: TemporalValue>(
    seq: &mut TSequence<V>,
    inst: TInstant<V>,
    gaps: &Gaps,
    cfg: &AppendConfig,
) -> Result<Appended<V>> {
    let last = seq.end_instant();
    if inst.t < last.t {
        return Err(increasing_error(last.t, inst.t));
    }
    if inst.t == last.t {
        if seq.upper_inc || seq.is_discrete() {
            return if inst.value == last.value {
                Ok(Appended::Done)
            } else {
                Err(overlap_error(inst.t))
            };
        }
        if inst.value == last.value {
            seq.upper_inc = true;
            seq.recompute_bbox();
            return Ok(Appended::Done);
        }
        if seq.interp == Interpolation::Step {
            // The exclusive end only repeated the previous value.
            let n = seq.instants.len();
            seq.instants[n - 1] = inst;
            seq.upper_inc = true;
            seq.recompute_bbox();
            return Ok(Appended::Done);
        }
        return Ok(Appended::Split(inst));
    }
    if !seq.is_discrete() && gaps.exceeded(last, &inst) {
        return Ok(Appended::Split(inst));
    }

    if seq.instants.len() >= seq.maxcount {
        let grown = (seq.maxcount.max(1) * cfg.growth_factor.max(2)).max(cfg.initial_maxcount);
        log::trace!("growing appendable sequence from {} to {} instants", seq.maxcount, grown);
        seq.reserve_to(grown)?;
    }
    let inst_box = inst.bbox();
    seq.instants.push(inst);
    let n = seq.instants.len();
    if n >= 3 && !seq.is_discrete() {
        let (prev, mid, next) = (&seq.instants[n - 3], &seq.instants[n - 2], &seq.instants[n - 1]);
        let redundant = match seq.interp {
            Interpolation::Step => prev.value == mid.value,
            _ => V::collinear(&prev.value, &mid.value, &next.value, mid.t.ratio(prev.t, next.t)),
        };
        if redundant {
            seq.instants.remove(n - 2);
        }
    }
    seq.upper_inc = true;
    seq.bbox.expand(&inst_box);
    seq.bbox.set_period(seq.period());
    Ok(Appended::Done)
}

/// Delete `times` from one sequence, joining the instants that remain.
fn delete_connected<V: TemporalValue>(
    seq: &TSequence<V>,
    times: &TstzSpanSet,
) -> Result<Option<TSequence<V>>> {
    let n = seq.instants.len();
    let kept: Vec<(usize, &TInstant<V>)> = seq
        .instants
        .iter()
        .enumerate()
        .filter(|(_, i)| !times.contains_value(i.t))
        .collect();
    let (Some(&(first_idx, _)), Some(&(last_idx, _))) = (kept.first(), kept.last()) else {
        return Ok(None);
    };
    let lower_inc = if first_idx == 0 { seq.lower_inc } else { true };
    let upper_inc = if last_idx == n - 1 { seq.upper_inc } else { true };
    if kept.len() == 1 && !(lower_inc && upper_inc) {
        return Ok(None);
    }
    let mut instants: Vec<TInstant<V>> = kept.into_iter().map(|(_, i)| i.clone()).collect();
    let m = instants.len();
    if seq.interp == Interpolation::Step && !upper_inc && m >= 2 {
        instants[m - 1].value = instants[m - 2].value.clone();
    }
    TSequence::make_inner(instants, lower_inc, upper_inc, seq.interp, true).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(day: i64) -> TimestampTz {
        TimestampTz::from_micros(day * 86_400_000_000)
    }

    fn tint(text: &str) -> Temporal<i32> {
        text.parse().unwrap()
    }

    #[test]
    fn test_merge() {
        let a = tint("[1@2000-01-01, 2@2000-01-02]");
        let b = tint("[2@2000-01-02, 3@2000-01-03]");
        let m = a.merge(&b).unwrap();
        assert_eq!(m.num_sequences(), 1);
        assert_eq!(m.value_at_timestamp(t(2)), Some(3));

        let clash = tint("[5@2000-01-02, 3@2000-01-03]");
        assert!(matches!(a.merge(&clash), Err(ChronotopeError::InvalidArg(_))));

        let overlap = tint("[1@2000-01-01, 1@2000-01-05]");
        assert!(a.merge(&overlap).is_err());

        let d1 = tint("{1@2000-01-01, 2@2000-01-03}");
        let d2 = tint("{2@2000-01-03, 4@2000-01-05}");
        let md = d1.merge(&d2).unwrap();
        assert_eq!(md.num_instants(), 3);
        assert!(d1.merge(&a).is_err());
    }

    #[test]
    fn test_merge_array() {
        let parts = vec![
            tint("5@2000-01-03"),
            tint("[1@2000-01-01, 1@2000-01-02]"),
        ];
        let m = Temporal::merge_array(&parts).unwrap();
        assert_eq!(m.num_sequences(), 2);
        assert!(Temporal::<i32>::merge_array(&[]).is_err());
    }

    #[test]
    fn test_insert_connect() {
        let base = tint("{[1@2000-01-01, 1@2000-01-02], [1@2000-01-08, 1@2000-01-09]}");
        let inserted = tint("[2@2000-01-04, 2@2000-01-05]");
        let joined = base.insert(&inserted, true).unwrap();
        assert_eq!(joined.num_sequences(), 1);
        assert_eq!(joined.value_at_timestamp(t(2)), Some(1));
        assert_eq!(joined.value_at_timestamp(t(4)), Some(2));

        let separate = base.insert(&inserted, false).unwrap();
        assert_eq!(separate.num_sequences(), 3);
    }

    #[test]
    fn test_delete() {
        let v = tint("[1@2000-01-01, 2@2000-01-02, 3@2000-01-03, 4@2000-01-04]");
        let span = TstzSpan::new(t(1), t(2), true, true).unwrap();
        let connected = v.delete_tstzspan(&span, true).unwrap().unwrap();
        assert_eq!(connected.num_sequences(), 1);
        assert_eq!(connected.value_at_timestamp(t(2)), Some(1));

        let gap = v.delete_tstzspan(&span, false).unwrap().unwrap();
        assert_eq!(gap.num_sequences(), 2);

        let all = TstzSpan::new(t(0), t(3), true, true).unwrap();
        assert!(v.delete_tstzspan(&all, true).unwrap().is_none());
    }

    #[test]
    fn test_update() {
        let v = tint("[1@2000-01-01, 1@2000-01-05]");
        let patch = tint("[7@2000-01-02, 7@2000-01-03]");
        let u = v.update(&patch, true).unwrap();
        assert_eq!(u.value_at_timestamp(t(1)), Some(7));
        assert_eq!(u.value_at_timestamp(t(0)), Some(1));
        assert_eq!(u.end_timestamp(), t(4));
    }

    #[test]
    fn test_append_instant() {
        let mut v = Temporal::Instant(TInstant::new(1.0, t(0)));
        v.append_instant(TInstant::new(2.0, t(1)), Interpolation::Linear, None, None)
            .unwrap();
        v.append_instant(TInstant::new(3.0, t(2)), Interpolation::Linear, None, None)
            .unwrap();
        // Collinear instants collapse while appending.
        assert_eq!(v.num_instants(), 2);
        match &v {
            Temporal::Sequence(seq) => assert!(seq.maxcount() >= 64),
            other => panic!("expected a sequence, got {:?}", other),
        }

        assert!(
            v.append_instant(TInstant::new(0.0, t(1)), Interpolation::Linear, None, None)
                .is_err()
        );

        v.append_instant(
            TInstant::new(10.0, t(30)),
            Interpolation::Linear,
            None,
            Some(Interval::days(2)),
        )
        .unwrap();
        assert_eq!(v.num_sequences(), 2);
        assert_eq!(v.bbox().xmax(), Some(10.0));
    }

    #[test]
    fn test_append_grows_capacity() {
        let cfg = AppendConfig {
            initial_maxcount: 2,
            growth_factor: 2,
        };
        let mut v: Temporal<i32> = Temporal::Instant(TInstant::new(0, t(0)));
        for day in 1..10 {
            v.append_instant_with(
                TInstant::new((day % 2) as i32, t(day)),
                Interpolation::Step,
                None,
                None,
                &cfg,
            )
            .unwrap();
        }
        assert_eq!(v.num_instants(), 10);
        match &v {
            Temporal::Sequence(seq) => assert!(seq.maxcount() >= 10),
            other => panic!("expected a sequence, got {:?}", other),
        }
    }

    #[test]
    fn test_append_sequence() {
        let mut v = tint("[1@2000-01-01, 1@2000-01-02)");
        let next: Temporal<i32> = "[2@2000-01-02, 3@2000-01-03]".parse().unwrap();
        let Temporal::Sequence(next) = next else {
            panic!("expected a sequence");
        };
        v.append_sequence(next).unwrap();
        assert_eq!(v.num_sequences(), 1);
        assert_eq!(v.end_timestamp(), t(2));
    }
}
