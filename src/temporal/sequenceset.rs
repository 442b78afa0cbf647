use super::sequence::normalize_instants;
use super::{Interpolation, TInstant, TSequence, Temporal};
use crate::boxes::TemporalBox;
use crate::error::{ChronotopeError, ReportExt, Result};
use crate::span::{Span, TstzSpan};
use crate::types::{Interval, TemporalValue, TimestampTz};
use std::cmp::Ordering;

/// Ordered, time-disjoint continuous sequences.
#[derive(Debug, Clone)]
pub struct TSequenceSet<V: TemporalValue> {
    pub(crate) sequences: Vec<TSequence<V>>,
    pub(crate) bbox: V::BBox,
}

impl<V: TemporalValue> PartialEq for TSequenceSet<V> {
    fn eq(&self, other: &Self) -> bool {
        self.sequences == other.sequences
    }
}

impl<V: TemporalValue> TSequenceSet<V> {
    /// Validate and build a sequence set. With `normalize`, sequences that
    /// touch with equal boundary values are joined.
    pub fn make(sequences: Vec<TSequence<V>>, normalize: bool) -> Result<Self> {
        Self::make_inner(sequences, normalize).reported()
    }

    pub(crate) fn make_inner(sequences: Vec<TSequence<V>>, normalize: bool) -> Result<Self> {
        Self::validate(&sequences)?;
        let sequences = if normalize {
            join_sequences(sequences)?
        } else {
            sequences
        };
        let bbox = compute_bbox(&sequences);
        Ok(Self { sequences, bbox })
    }

    fn validate(sequences: &[TSequence<V>]) -> Result<()> {
        let Some(first) = sequences.first() else {
            return Err(ChronotopeError::InvalidArg(
                "A temporal sequence set needs at least one sequence".to_string(),
            ));
        };
        for seq in sequences {
            if seq.is_discrete() {
                return Err(ChronotopeError::InvalidArg(
                    "A temporal sequence set cannot hold discrete sequences".to_string(),
                ));
            }
            if seq.interp != first.interp {
                return Err(ChronotopeError::InvalidArg(
                    "The sequences of a sequence set must have the same interpolation".to_string(),
                ));
            }
        }
        for pair in sequences.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let (end, start) = (a.end_timestamp(), b.start_timestamp());
            if end > start || (end == start && a.upper_inc && b.lower_inc) {
                return Err(ChronotopeError::InvalidArg(format!(
                    "Timestamps for temporal value must be increasing: {}, {}",
                    end, start
                )));
            }
            a.end_instant().value.check_compatible(&b.start_instant().value)?;
        }
        Ok(())
    }

    /// Split instants into sequences wherever consecutive instants are more
    /// than `maxt` apart in time or `maxdist` apart in value.
    pub fn make_gaps(
        instants: Vec<TInstant<V>>,
        interp: Interpolation,
        maxt: Option<Interval>,
        maxdist: Option<f64>,
    ) -> Result<Temporal<V>> {
        let build = || -> Result<Temporal<V>> {
            if interp == Interpolation::Discrete || instants.len() < 2 {
                let seq = TSequence::make_inner(instants, true, true, interp, true)?;
                return Ok(Temporal::Sequence(seq));
            }
            let mut pieces: Vec<Vec<TInstant<V>>> = vec![Vec::new()];
            for inst in instants {
                if let Some(last) = pieces.last().and_then(|p| p.last()) {
                    let time_gap = maxt.is_some_and(|m| inst.t.delta_since(last.t) > m);
                    let value_gap = maxdist.is_some_and(|m| {
                        last.value.gap_distance(&inst.value).is_some_and(|d| d > m)
                    });
                    if time_gap || value_gap {
                        pieces.push(Vec::new());
                    }
                }
                if let Some(piece) = pieces.last_mut() {
                    piece.push(inst);
                }
            }
            let sequences = pieces
                .into_iter()
                .map(|p| TSequence::make_inner(p, true, true, interp, true))
                .collect::<Result<Vec<_>>>()?;
            Temporal::from_sequences(sequences)
        };
        build().reported()
    }

    pub fn sequences(&self) -> &[TSequence<V>] {
        &self.sequences
    }

    pub fn num_sequences(&self) -> usize {
        self.sequences.len()
    }

    pub fn sequence_n(&self, n: usize) -> Option<&TSequence<V>> {
        self.sequences.get(n)
    }

    pub fn start_sequence(&self) -> &TSequence<V> {
        &self.sequences[0]
    }

    pub fn end_sequence(&self) -> &TSequence<V> {
        &self.sequences[self.sequences.len() - 1]
    }

    pub fn interp(&self) -> Interpolation {
        self.start_sequence().interp
    }

    pub fn bbox(&self) -> &V::BBox {
        &self.bbox
    }

    /// Bounding period, gaps included.
    pub fn period(&self) -> TstzSpan {
        let (first, last) = (self.start_sequence(), self.end_sequence());
        Span::from_bounds(first.period().lower_bound(), last.period().upper_bound())
    }

    pub fn value_at(&self, t: TimestampTz) -> Option<V> {
        let idx = self.sequences.partition_point(|s| s.end_timestamp() < t);
        self.sequences[idx..]
            .iter()
            .take(2)
            .find_map(|s| s.value_at(t))
    }

    pub(crate) fn recompute_bbox(&mut self) {
        self.bbox = compute_bbox(&self.sequences);
    }

    /// Bounding box first, then sequences lexicographically.
    pub fn cmp_seqset(&self, other: &Self) -> Ordering {
        let ord = self.bbox.box_cmp(&other.bbox);
        if ord.is_ne() {
            return ord;
        }
        for (a, b) in self.sequences.iter().zip(&other.sequences) {
            let ord = a.cmp_seq(b);
            if ord.is_ne() {
                return ord;
            }
        }
        self.sequences.len().cmp(&other.sequences.len())
    }
}

fn compute_bbox<V: TemporalValue>(sequences: &[TSequence<V>]) -> V::BBox {
    let mut bbox = sequences[0].bbox.clone();
    for seq in &sequences[1..] {
        bbox.expand(&seq.bbox);
    }
    bbox
}

/// Instants of `a` and `b` joined into one sequence when they touch at a
/// timestamp and the function is continuous there.
pub(crate) fn join_instants<V: TemporalValue>(
    a: &TSequence<V>,
    b: &TSequence<V>,
) -> Option<Vec<TInstant<V>>> {
    if a.end_timestamp() != b.start_timestamp() || a.upper_inc == b.lower_inc {
        return None;
    }
    let (last, first) = (a.end_instant(), b.start_instant());
    let mut instants = Vec::with_capacity(a.instants.len() + b.instants.len());
    if a.interp == Interpolation::Step && !a.upper_inc {
        // The exclusive end only repeats the previous value.
        instants.extend_from_slice(&a.instants[..a.instants.len() - 1]);
        instants.extend_from_slice(&b.instants);
    } else if last.value == first.value {
        instants.extend_from_slice(&a.instants);
        instants.extend_from_slice(&b.instants[1..]);
    } else {
        return None;
    }
    Some(instants)
}

/// Join touching sequences and renormalize the joined instants.
pub(crate) fn join_sequences<V: TemporalValue>(
    sequences: Vec<TSequence<V>>,
) -> Result<Vec<TSequence<V>>> {
    let mut result: Vec<TSequence<V>> = Vec::with_capacity(sequences.len());
    for seq in sequences {
        let joined = result.last().and_then(|prev| join_instants(prev, &seq));
        match (joined, result.pop()) {
            (Some(instants), Some(prev)) => {
                let instants = normalize_instants(instants, prev.interp);
                result.push(TSequence::make_inner(
                    instants,
                    prev.lower_inc,
                    seq.upper_inc,
                    prev.interp,
                    false,
                )?);
            }
            (_, prev) => {
                result.extend(prev);
                result.push(seq);
            }
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(day: i64) -> TimestampTz {
        TimestampTz::from_micros(day * 86_400_000_000)
    }

    fn seq<V: TemporalValue>(
        values: &[(V, i64)],
        lower_inc: bool,
        upper_inc: bool,
        interp: Interpolation,
    ) -> TSequence<V> {
        let instants = values
            .iter()
            .map(|(v, d)| TInstant::new(v.clone(), t(*d)))
            .collect();
        TSequence::make(instants, lower_inc, upper_inc, interp, true).unwrap()
    }

    #[test]
    fn test_linear_join() {
        let a = seq(&[(1.0, 0), (2.0, 1)], true, false, Interpolation::Linear);
        let b = seq(&[(2.0, 1), (3.0, 2)], true, true, Interpolation::Linear);
        let ss = TSequenceSet::make(vec![a, b], true).unwrap();
        assert_eq!(ss.num_sequences(), 1);
        assert_eq!(ss.start_sequence().num_instants(), 2);
    }

    #[test]
    fn test_linear_jump_stays_split() {
        let a = seq(&[(1.0, 0), (2.0, 1)], true, false, Interpolation::Linear);
        let b = seq(&[(5.0, 1), (3.0, 2)], true, true, Interpolation::Linear);
        let ss = TSequenceSet::make(vec![a, b], true).unwrap();
        assert_eq!(ss.num_sequences(), 2);
        assert_eq!(ss.value_at(t(1)), Some(5.0));
    }

    #[test]
    fn test_step_join_replaces_exclusive_end() {
        let a = seq(&[(1, 0), (1, 1)], true, false, Interpolation::Step);
        let b = seq(&[(4, 1), (4, 2)], true, true, Interpolation::Step);
        let ss = TSequenceSet::make(vec![a, b], true).unwrap();
        assert_eq!(ss.num_sequences(), 1);
        let values: Vec<i32> = ss.start_sequence().instants().iter().map(|i| i.value).collect();
        assert_eq!(values, vec![1, 4, 4]);
    }

    #[test]
    fn test_overlap_rejected() {
        let a = seq(&[(1, 0), (1, 2)], true, true, Interpolation::Step);
        let b = seq(&[(2, 1), (2, 3)], true, true, Interpolation::Step);
        assert!(TSequenceSet::make(vec![a.clone(), b], true).is_err());

        let touching = seq(&[(1, 2), (1, 3)], true, true, Interpolation::Step);
        assert!(TSequenceSet::make(vec![a, touching], true).is_err());
    }

    #[test]
    fn test_make_gaps() {
        let instants = vec![
            TInstant::new(1.0, t(0)),
            TInstant::new(2.0, t(1)),
            TInstant::new(3.0, t(10)),
        ];
        let result =
            TSequenceSet::make_gaps(instants, Interpolation::Linear, Some(Interval::days(2)), None)
                .unwrap();
        assert_eq!(result.num_sequences(), 2);
    }
}
