//! Constructors from constants and transformations between subtypes,
//! interpolations, time frames and value ranges.

use super::{Interpolation, TInstant, TSequence, TSequenceSet, Temporal};
use crate::error::{ChronotopeError, ReportExt, Result};
use crate::span::{Set, TstzSpan, TstzSpanSet};
use crate::types::{Interval, NumericValue, TemporalValue, TimestampTz};

/// Interpolation used when continuous sequences are built without an
/// explicit choice.
pub(crate) fn default_interp<V: TemporalValue>() -> Interpolation {
    if V::CONTINUOUS {
        Interpolation::Linear
    } else {
        Interpolation::Step
    }
}

fn constant_sequence<V: TemporalValue>(
    value: &V,
    span: &TstzSpan,
    interp: Interpolation,
) -> Result<TSequence<V>> {
    if interp == Interpolation::Discrete {
        return Err(ChronotopeError::InvalidArgValue(
            "A constant over a time span cannot be discrete".to_string(),
        ));
    }
    let mut instants = vec![TInstant::new(value.clone(), span.lower())];
    if span.upper() != span.lower() {
        instants.push(TInstant::new(value.clone(), span.upper()));
    }
    TSequence::make_inner(instants, span.lower_inc(), span.upper_inc(), interp, false)
}

impl<V: TemporalValue> Temporal<V> {
    pub fn from_base_timestamp(value: V, t: TimestampTz) -> Self {
        Self::Instant(TInstant::new(value, t))
    }

    /// Discrete sequence holding `value` at every timestamp of `set`.
    pub fn from_base_tstzset(value: V, set: &Set<TimestampTz>) -> Result<Self> {
        let instants = set
            .values()
            .iter()
            .map(|t| TInstant::new(value.clone(), *t))
            .collect();
        TSequence::make(instants, true, true, Interpolation::Discrete, false).map(Self::Sequence)
    }

    pub fn from_base_tstzspan(value: V, span: &TstzSpan, interp: Interpolation) -> Result<Self> {
        constant_sequence(&value, span, interp)
            .map(Self::Sequence)
            .reported()
    }

    pub fn from_base_tstzspanset(
        value: V,
        spans: &TstzSpanSet,
        interp: Interpolation,
    ) -> Result<Self> {
        let build = || -> Result<Self> {
            let sequences = spans
                .spans()
                .iter()
                .map(|s| constant_sequence(&value, s, interp))
                .collect::<Result<Vec<_>>>()?;
            Ok(Self::SequenceSet(TSequenceSet::make_inner(sequences, false)?))
        };
        build().reported()
    }

    /// `value` over the same time frame as `frame`.
    pub fn from_base_temp<W: TemporalValue>(value: V, frame: &Temporal<W>) -> Result<Self> {
        let build = |seq: &TSequence<W>| -> Result<TSequence<V>> {
            let instants = seq
                .instants
                .iter()
                .map(|i| i.with_value(value.clone()))
                .collect();
            let interp = if seq.interp == Interpolation::Linear && !V::CONTINUOUS {
                Interpolation::Step
            } else {
                seq.interp
            };
            TSequence::make_inner(instants, seq.lower_inc, seq.upper_inc, interp, true)
        };
        let run = || -> Result<Self> {
            Ok(match frame {
                Temporal::Instant(inst) => Self::Instant(inst.with_value(value.clone())),
                Temporal::Sequence(seq) => Self::Sequence(build(seq)?),
                Temporal::SequenceSet(ss) => {
                    let sequences = ss.sequences.iter().map(build).collect::<Result<Vec<_>>>()?;
                    Self::SequenceSet(TSequenceSet::make_inner(sequences, false)?)
                }
            })
        };
        run().reported()
    }

    pub(crate) fn from_base_temp_inner(&self, value: V) -> Result<Self> {
        Self::from_base_temp(value, self)
    }

    /// Change the interpolation.
    ///
    /// Discrete values become one continuous sequence; step values become
    /// linear pieces split at each jump; linear values become step only
    /// when every segment is constant; continuous values become discrete
    /// only when every sequence is instantaneous.
    pub fn set_interp(&self, interp: Interpolation) -> Result<Self> {
        self.set_interp_inner(interp).reported()
    }

    fn set_interp_inner(&self, interp: Interpolation) -> Result<Self> {
        if let Self::Instant(inst) = self {
            if interp == Interpolation::Discrete {
                return Ok(self.clone());
            }
            let seq = TSequence::make_inner(vec![inst.clone()], true, true, interp, false)?;
            return Ok(Self::Sequence(seq));
        }
        let current = self.interp();
        if current == interp {
            return Ok(self.clone());
        }
        let views = self.sequence_views();
        match (current, interp) {
            (_, Interpolation::Discrete) => {
                if views.iter().any(|s| !s.is_instantaneous()) {
                    return Err(ChronotopeError::InvalidArgValue(
                        "Cannot transform a non-instantaneous value to discrete interpolation"
                            .to_string(),
                    ));
                }
                let instants = views.iter().map(|s| s.instants[0].clone()).collect();
                let seq = TSequence::make_inner(instants, true, true, interp, false)?;
                Ok(Self::Sequence(seq))
            }
            (Interpolation::Discrete, _) => {
                let instants = views[0].instants.clone();
                let seq = TSequence::make_inner(instants, true, true, interp, true)?;
                Ok(Self::Sequence(seq))
            }
            (Interpolation::Step, Interpolation::Linear) => {
                let mut pieces = Vec::new();
                for seq in views.iter() {
                    pieces.extend(step_to_linear(seq)?);
                }
                Self::from_sequences(pieces)
            }
            _ => {
                let mut pieces = Vec::with_capacity(views.len());
                for seq in views.iter() {
                    if seq.instants.windows(2).any(|w| w[0].value != w[1].value) {
                        return Err(ChronotopeError::InvalidArgValue(
                            "Cannot transform a non-constant linear segment to step interpolation"
                                .to_string(),
                        ));
                    }
                    pieces.push(TSequence::make_inner(
                        seq.instants.clone(),
                        seq.lower_inc,
                        seq.upper_inc,
                        interp,
                        true,
                    )?);
                }
                Self::from_sequences(pieces)
            }
        }
    }

    /// The single instant of an instantaneous value.
    pub fn to_instant(&self) -> Result<TInstant<V>> {
        if self.num_instants() != 1 {
            return Err(ChronotopeError::InvalidArgValue(
                "Cannot transform a value with several instants to an instant".to_string(),
            ))
            .reported();
        }
        Ok(self.start_instant().clone())
    }

    pub fn to_sequence(&self) -> Result<TSequence<V>> {
        match self {
            Self::Instant(inst) => Ok(TSequence::from_instant(inst.clone(), default_interp::<V>())),
            Self::Sequence(seq) => Ok(seq.clone()),
            Self::SequenceSet(ss) if ss.sequences.len() == 1 => Ok(ss.sequences[0].clone()),
            Self::SequenceSet(_) => Err(ChronotopeError::InvalidArgValue(
                "Cannot transform a sequence set with several sequences to a sequence".to_string(),
            ))
            .reported(),
        }
    }

    pub fn to_sequence_set(&self) -> Result<TSequenceSet<V>> {
        let interp = default_interp::<V>();
        let sequences = match self {
            Self::SequenceSet(ss) => return Ok(ss.clone()),
            Self::Sequence(seq) if !seq.is_discrete() => vec![seq.clone()],
            _ => self
                .instants()
                .into_iter()
                .map(|i| TSequence::from_instant(i.clone(), interp))
                .collect(),
        };
        TSequenceSet::make(sequences, false)
    }

    fn map_times<F>(&self, f: F) -> Result<Self>
    where
        F: Fn(TimestampTz) -> Result<TimestampTz>,
    {
        Ok(match self {
            Self::Instant(inst) => Self::Instant(TInstant::new(inst.value.clone(), f(inst.t)?)),
            Self::Sequence(seq) => Self::Sequence(seq.map_times(&f)?),
            Self::SequenceSet(ss) => {
                let sequences = ss
                    .sequences
                    .iter()
                    .map(|s| s.map_times(&f))
                    .collect::<Result<Vec<_>>>()?;
                Self::SequenceSet(TSequenceSet::make_inner(sequences, false)?)
            }
        })
    }

    pub fn shift_time(&self, shift: Interval) -> Result<Self> {
        self.shift_scale_time(Some(shift), None)
    }

    /// Rescale the time frame to last `duration`, keeping the start.
    pub fn scale_time(&self, duration: Interval) -> Result<Self> {
        self.shift_scale_time(None, Some(duration))
    }

    pub fn shift_scale_time(&self, shift: Option<Interval>, duration: Option<Interval>) -> Result<Self> {
        let run = || -> Result<Self> {
            if shift.is_none() && duration.is_none() {
                return Err(ChronotopeError::InvalidArg(
                    "A shift or a duration must be given".to_string(),
                ));
            }
            if duration.is_some_and(|d| d <= Interval::zero()) {
                return Err(ChronotopeError::InvalidArgValue(
                    "The duration must be positive".to_string(),
                ));
            }
            let start = self.start_timestamp();
            let new_start = match shift {
                Some(s) => start.checked_add(s)?,
                None => start,
            };
            let old_width = self.end_timestamp().micros() - start.micros();
            let factor = match duration.and_then(|d| d.num_microseconds()) {
                Some(new_width) if old_width > 0 => new_width as f64 / old_width as f64,
                _ => 1.0,
            };
            self.map_times(|t| {
                let offset = ((t.micros() - start.micros()) as f64 * factor).round() as i64;
                new_start.checked_add(Interval::microseconds(offset))
            })
        };
        run().reported()
    }
}

/// Linear pieces of a step sequence, split wherever the value jumps.
fn step_to_linear<V: TemporalValue>(seq: &TSequence<V>) -> Result<Vec<TSequence<V>>> {
    let n = seq.instants.len();
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut lower_inc = seq.lower_inc;
    for i in 1..n {
        let (prev, cur) = (&seq.instants[i - 1], &seq.instants[i]);
        if prev.value == cur.value {
            continue;
        }
        let instants = vec![
            seq.instants[start].clone(),
            TInstant::new(prev.value.clone(), cur.t),
        ];
        pieces.push(TSequence::make_inner(
            instants,
            lower_inc,
            false,
            Interpolation::Linear,
            false,
        )?);
        start = i;
        lower_inc = true;
    }
    let last = &seq.instants[n - 1];
    let mut instants = vec![seq.instants[start].clone()];
    if start + 1 < n {
        instants.push(last.clone());
    }
    if instants.len() > 1 || seq.upper_inc {
        let upper_inc = seq.upper_inc || instants.len() == 1;
        pieces.push(TSequence::make_inner(
            instants,
            lower_inc,
            upper_inc,
            Interpolation::Linear,
            false,
        )?);
    }
    Ok(pieces)
}

impl<V: NumericValue> Temporal<V> {
    /// Add `delta` to every value.
    pub fn shift_value(&self, delta: V) -> Result<Self> {
        self.add_value(delta)
    }

    /// Rescale the value range to span `width`, keeping the minimum.
    pub fn scale_value(&self, width: V) -> Result<Self> {
        let run = || -> Result<Self> {
            let width = width.to_f64();
            if width <= 0.0 {
                return Err(ChronotopeError::InvalidArgValue(
                    "The value width must be positive".to_string(),
                ));
            }
            let (min, max) = (self.min_value().to_f64(), self.max_value().to_f64());
            if max == min {
                return Ok(self.clone());
            }
            let factor = width / (max - min);
            self.map_values(|v| V::from_f64(min + (v.to_f64() - min) * factor))
        };
        run().reported()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(day: i64) -> TimestampTz {
        TimestampTz::from_micros(day * 86_400_000_000)
    }

    #[test]
    fn test_from_base() {
        let span = TstzSpan::new(t(0), t(2), true, false).unwrap();
        let v = Temporal::from_base_tstzspan(3, &span, Interpolation::Step).unwrap();
        assert_eq!(v.num_instants(), 2);
        assert_eq!(v.value_at_timestamp(t(1)), Some(3));
        assert_eq!(v.value_at_timestamp(t(2)), None);
        assert!(Temporal::from_base_tstzspan(3, &span, Interpolation::Linear).is_err());

        let set = Set::new(vec![t(0), t(5)]).unwrap();
        let d = Temporal::from_base_tstzset(true, &set).unwrap();
        assert_eq!(d.interp(), Interpolation::Discrete);

        let frame: Temporal<f64> = "{[1@2000-01-01, 2@2000-01-02], [3@2000-01-04, 5@2000-01-06]}"
            .parse()
            .unwrap();
        let c = Temporal::from_base_temp(7, &frame).unwrap();
        assert_eq!(c.num_sequences(), 2);
        assert_eq!(c.interp(), Interpolation::Step);
        assert_eq!(c.time(), frame.time());
    }

    #[test]
    fn test_step_to_linear_splits_jumps() {
        let v: Temporal<f64> = "Interp=Step;[1@2000-01-01, 2@2000-01-02, 2@2000-01-03]"
            .parse()
            .unwrap();
        let linear = v.set_interp(Interpolation::Linear).unwrap();
        assert_eq!(linear.num_sequences(), 2);
        assert_eq!(linear.value_at_timestamp(t(0)), Some(1.0));
        assert_eq!(linear.value_at_timestamp(t(1)), Some(2.0));
        assert!(!linear.sequence_n(0).unwrap().upper_inc());
    }

    #[test]
    fn test_linear_to_step_needs_constant_segments() {
        let v: Temporal<f64> = "[1@2000-01-01, 2@2000-01-02]".parse().unwrap();
        assert!(v.set_interp(Interpolation::Step).is_err());
        let c: Temporal<f64> = "[1@2000-01-01, 1@2000-01-02]".parse().unwrap();
        assert_eq!(
            c.set_interp(Interpolation::Step).unwrap().interp(),
            Interpolation::Step
        );
    }

    #[test]
    fn test_discrete_round_trip() {
        let d: Temporal<i32> = "{1@2000-01-01, 2@2000-01-02}".parse().unwrap();
        let step = d.set_interp(Interpolation::Step).unwrap();
        assert_eq!(step.num_sequences(), 1);
        assert_eq!(step.value_at_timestamp(t(1)), Some(2));
        assert!(step.set_interp(Interpolation::Discrete).is_err());

        let ss = d.to_sequence_set().unwrap();
        assert_eq!(ss.num_sequences(), 2);
        let back = Temporal::from(ss).set_interp(Interpolation::Discrete).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn test_time_transforms() {
        let v: Temporal<f64> = "[1@2000-01-01, 3@2000-01-03]".parse().unwrap();
        let shifted = v.shift_time(Interval::days(1)).unwrap();
        assert_eq!(shifted.start_timestamp(), t(1));
        let scaled = v.scale_time(Interval::days(4)).unwrap();
        assert_eq!(scaled.end_timestamp(), t(4));
        let both = v
            .shift_scale_time(Some(Interval::days(1)), Some(Interval::days(1)))
            .unwrap();
        assert_eq!(both.start_timestamp(), t(1));
        assert_eq!(both.end_timestamp(), t(2));
        assert!(v.scale_time(Interval::zero()).is_err());
    }

    #[test]
    fn test_value_transforms() {
        let v: Temporal<f64> = "[1@2000-01-01, 3@2000-01-03]".parse().unwrap();
        assert_eq!(*v.shift_value(2.0).unwrap().start_value(), 3.0);
        let scaled = v.scale_value(4.0).unwrap();
        assert_eq!(*scaled.max_value(), 5.0);
        assert_eq!(*scaled.min_value(), 1.0);
    }

    #[test]
    fn test_to_instant_and_sequence() {
        let v: Temporal<i32> = "5@2000-01-01".parse().unwrap();
        assert_eq!(v.to_instant().unwrap().value, 5);
        assert_eq!(v.to_sequence().unwrap().interp(), Interpolation::Step);
        let s: Temporal<i32> = "[1@2000-01-01, 2@2000-01-02]".parse().unwrap();
        assert!(s.to_instant().is_err());
    }
}
