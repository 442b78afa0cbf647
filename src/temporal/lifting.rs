//! Pointwise lifting of base functions to temporal values.
//!
//! Binary functions are evaluated over the synchronized time support of
//! both operands: the bounds of every intersecting pair of sequences, the
//! instants of either operand inside the intersection and, when the
//! function asks for them, the turning points where its result changes
//! behavior inside a segment.

use super::{Interpolation, TInstant, TSequence, TSequenceSet, Temporal};
use crate::error::Result;
use crate::span::TstzSpan;
use crate::types::{TemporalValue, TimestampTz};

/// Fraction in `(0, 1)` of a synchronized segment at which the lifted
/// function must be sampled, given the start and end values of both
/// operands on the segment.
pub(crate) type Turning<A, B> = fn(&A, &A, &B, &B) -> Option<f64>;

/// Lift `f` over two temporal values. `None` when their times do not
/// intersect.
pub(crate) fn lift_binary<A, B, R, F>(
    a: &Temporal<A>,
    b: &Temporal<B>,
    f: F,
    turning: Option<Turning<A, B>>,
) -> Result<Option<Temporal<R>>>
where
    A: TemporalValue,
    B: TemporalValue,
    R: TemporalValue,
    F: Fn(&A, &B) -> Result<R>,
{
    if !a.timespan().overlaps(&b.timespan()) {
        return Ok(None);
    }
    if a.is_discrete() || b.is_discrete() {
        return lift_discrete(a, b, &f);
    }
    let mut pieces = Vec::new();
    let seqs_b = b.sequence_views();
    for sa in a.sequence_views().iter() {
        let pa = sa.period();
        for sb in seqs_b.iter() {
            if let Some(inter) = pa.intersection(&sb.period()) {
                lift_sequences(sa, sb, &inter, &f, turning, &mut pieces)?;
            }
        }
    }
    Temporal::from_pieces(pieces)
}

/// Results at the instants of the discrete operand where the other one is
/// defined.
fn lift_discrete<A, B, R, F>(a: &Temporal<A>, b: &Temporal<B>, f: &F) -> Result<Option<Temporal<R>>>
where
    A: TemporalValue,
    B: TemporalValue,
    R: TemporalValue,
    F: Fn(&A, &B) -> Result<R>,
{
    let times = if a.is_discrete() {
        a.timestamps()
    } else {
        b.timestamps()
    };
    let mut instants = Vec::new();
    for t in times {
        if let (Some(va), Some(vb)) = (a.value_at_timestamp(t), b.value_at_timestamp(t)) {
            instants.push(TInstant::new(f(&va, &vb)?, t));
        }
    }
    if instants.is_empty() {
        return Ok(None);
    }
    if matches!(a, Temporal::Instant(_)) || matches!(b, Temporal::Instant(_)) {
        return Ok(instants.pop().map(Temporal::Instant));
    }
    let seq = TSequence::make_inner(instants, true, true, Interpolation::Discrete, false)?;
    Ok(Some(Temporal::Sequence(seq)))
}

/// Value of a sequence strictly inside the segment `(t0, t1)`, which holds
/// no instant of the sequence.
fn segment_mid<V: TemporalValue>(seq: &TSequence<V>, t0: TimestampTz, t1: TimestampTz) -> V {
    let start = seq.value_at_unchecked(t0);
    match seq.interp {
        Interpolation::Linear => V::interpolate(&start, &seq.left_limit(t1), 0.5),
        _ => start,
    }
}

fn step_piece<R: TemporalValue>(
    value: R,
    t0: TimestampTz,
    t1: TimestampTz,
    lower_inc: bool,
) -> Result<TSequence<R>> {
    let instants = vec![TInstant::new(value.clone(), t0), TInstant::new(value, t1)];
    TSequence::make_inner(instants, lower_inc, false, Interpolation::Step, false)
}

fn lift_sequences<A, B, R, F>(
    sa: &TSequence<A>,
    sb: &TSequence<B>,
    inter: &TstzSpan,
    f: &F,
    turning: Option<Turning<A, B>>,
    out: &mut Vec<TSequence<R>>,
) -> Result<()>
where
    A: TemporalValue,
    B: TemporalValue,
    R: TemporalValue,
    F: Fn(&A, &B) -> Result<R>,
{
    let linear = sa.interp == Interpolation::Linear || sb.interp == Interpolation::Linear;
    let interp = if R::CONTINUOUS && linear {
        Interpolation::Linear
    } else {
        Interpolation::Step
    };
    let at = |t: TimestampTz| f(&sa.value_at_unchecked(t), &sb.value_at_unchecked(t));
    let (lo, hi) = (inter.lower(), inter.upper());
    if lo == hi {
        out.push(TSequence::from_instant(TInstant::new(at(lo)?, lo), interp));
        return Ok(());
    }

    let mut times: Vec<TimestampTz> = sa
        .instants
        .iter()
        .map(|i| i.t)
        .chain(sb.instants.iter().map(|i| i.t))
        .filter(|t| *t > lo && *t < hi)
        .chain([lo, hi])
        .collect();
    times.sort_unstable();
    times.dedup();
    if let (Some(turning), true) = (turning, linear) {
        let extra: Vec<TimestampTz> = times
            .windows(2)
            .filter_map(|w| {
                let r = turning(
                    &sa.value_at_unchecked(w[0]),
                    &sa.left_limit(w[1]),
                    &sb.value_at_unchecked(w[0]),
                    &sb.left_limit(w[1]),
                )?;
                let t = w[0].lerp(w[1], r);
                (t > w[0] && t < w[1]).then_some(t)
            })
            .collect();
        if !extra.is_empty() {
            times.extend(extra);
            times.sort_unstable();
            times.dedup();
        }
    }

    for (k, w) in times.windows(2).enumerate() {
        let (t0, t1) = (w[0], w[1]);
        let lower_inc = k > 0 || inter.lower_inc();
        let start = at(t0)?;
        if interp == Interpolation::Linear {
            let end = f(&sa.left_limit(t1), &sb.left_limit(t1))?;
            let instants = vec![TInstant::new(start, t0), TInstant::new(end, t1)];
            out.push(TSequence::make_inner(instants, lower_inc, false, interp, false)?);
            continue;
        }
        let mid = f(&segment_mid(sa, t0, t1), &segment_mid(sb, t0, t1))?;
        if start == mid {
            out.push(step_piece(start, t0, t1, lower_inc)?);
        } else {
            if lower_inc {
                out.push(TSequence::from_instant(TInstant::new(start, t0), interp));
            }
            out.push(step_piece(mid, t0, t1, false)?);
        }
    }
    if inter.upper_inc() {
        out.push(TSequence::from_instant(TInstant::new(at(hi)?, hi), interp));
    }
    Ok(())
}

impl<V: TemporalValue> Temporal<V> {
    /// Apply `f` to every instant value, keeping the time frame.
    ///
    /// `f` must preserve the shape of each segment, e.g. be affine for
    /// linear values; redundant instants are dropped afterwards.
    pub(crate) fn map_values<W, F>(&self, f: F) -> Result<Temporal<W>>
    where
        W: TemporalValue,
        F: Fn(&V) -> Result<W>,
    {
        let map_seq = |seq: &TSequence<V>| -> Result<TSequence<W>> {
            let instants = seq
                .instants
                .iter()
                .map(|i| Ok(i.with_value(f(&i.value)?)))
                .collect::<Result<Vec<_>>>()?;
            let interp = if seq.interp == Interpolation::Linear && !W::CONTINUOUS {
                Interpolation::Step
            } else {
                seq.interp
            };
            TSequence::make_inner(instants, seq.lower_inc, seq.upper_inc, interp, true)
        };
        Ok(match self {
            Self::Instant(inst) => Temporal::Instant(inst.with_value(f(&inst.value)?)),
            Self::Sequence(seq) => Temporal::Sequence(map_seq(seq)?),
            Self::SequenceSet(ss) => {
                let sequences = ss
                    .sequences
                    .iter()
                    .map(map_seq)
                    .collect::<Result<Vec<_>>>()?;
                Temporal::SequenceSet(TSequenceSet::make_inner(sequences, true)?)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(day: i64) -> TimestampTz {
        TimestampTz::from_micros(day * 86_400_000_000)
    }

    #[test]
    fn test_lift_synchronizes_instants() {
        let a: Temporal<f64> = "[0@2000-01-01, 10@2000-01-11]".parse().unwrap();
        let b: Temporal<f64> = "[1@2000-01-03, 1@2000-01-05, 5@2000-01-07]".parse().unwrap();
        let sum = lift_binary(&a, &b, |x: &f64, y: &f64| Ok(x + y), None)
            .unwrap()
            .unwrap();
        assert_eq!(sum.start_timestamp(), t(2));
        assert_eq!(sum.end_timestamp(), t(6));
        assert_eq!(sum.value_at_timestamp(t(4)), Some(5.0));
        assert_eq!(sum.value_at_timestamp(t(6)), Some(11.0));
    }

    #[test]
    fn test_lift_comparison_adds_crossing() {
        let a: Temporal<f64> = "[0@2000-01-01, 10@2000-01-11]".parse().unwrap();
        let b: Temporal<f64> = "[10@2000-01-01, 0@2000-01-11]".parse().unwrap();
        let eq = lift_binary(&a, &b, |x: &f64, y: &f64| Ok(x == y), Some(f64::crossing))
            .unwrap()
            .unwrap();
        assert_eq!(eq.interp(), Interpolation::Step);
        assert_eq!(eq.value_at_timestamp(t(5)), Some(true));
        assert_eq!(eq.value_at_timestamp(t(4)), Some(false));
        assert_eq!(eq.value_at_timestamp(t(6)), Some(false));
        assert_eq!(eq.num_sequences(), 2);
    }

    #[test]
    fn test_lift_disjoint_is_none() {
        let a: Temporal<i32> = "[1@2000-01-01, 1@2000-01-02]".parse().unwrap();
        let b: Temporal<i32> = "[1@2000-01-05, 1@2000-01-06]".parse().unwrap();
        let r = lift_binary(&a, &b, |x: &i32, y: &i32| Ok(x + y), None).unwrap();
        assert!(r.is_none());
    }

    #[test]
    fn test_lift_discrete_operand() {
        let a: Temporal<i32> = "{1@2000-01-01, 2@2000-01-02, 3@2000-01-09}".parse().unwrap();
        let b: Temporal<i32> = "[10@2000-01-01, 20@2000-01-05]".parse().unwrap();
        let r = lift_binary(&a, &b, |x: &i32, y: &i32| Ok(x * y), None)
            .unwrap()
            .unwrap();
        assert_eq!(r.interp(), Interpolation::Discrete);
        assert_eq!(r.num_instants(), 2);
        assert_eq!(r.value_at_timestamp(t(1)), Some(20));
    }

    #[test]
    fn test_map_values_normalizes() {
        let a: Temporal<i32> = "[1@2000-01-01, 2@2000-01-02, 3@2000-01-03]".parse().unwrap();
        let b = a.map_values(|v| Ok(*v > 0)).unwrap();
        assert_eq!(b.num_instants(), 2);
    }
}
