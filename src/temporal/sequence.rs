use super::{Interpolation, TInstant};
use crate::boxes::TemporalBox;
use crate::error::{ChronotopeError, ReportExt, Result};
use crate::span::{Bound, Span, TstzSpan};
use crate::types::{TemporalValue, TimestampTz};
use std::cmp::Ordering;

/// Instants joined by an interpolation over a time span.
///
/// Timestamps are strictly increasing. Discrete and instantaneous sequences
/// have inclusive bounds, and a step sequence with an exclusive upper bound
/// ends with a repeated value.
#[derive(Debug, Clone)]
pub struct TSequence<V: TemporalValue> {
    pub(crate) instants: Vec<TInstant<V>>,
    pub(crate) lower_inc: bool,
    pub(crate) upper_inc: bool,
    pub(crate) interp: Interpolation,
    pub(crate) bbox: V::BBox,
    pub(crate) maxcount: usize,
}

impl<V: TemporalValue> PartialEq for TSequence<V> {
    fn eq(&self, other: &Self) -> bool {
        self.interp == other.interp
            && self.lower_inc == other.lower_inc
            && self.upper_inc == other.upper_inc
            && self.instants == other.instants
    }
}

impl<V: TemporalValue> TSequence<V> {
    /// Validate and build a sequence, optionally dropping redundant instants.
    pub fn make(
        instants: Vec<TInstant<V>>,
        lower_inc: bool,
        upper_inc: bool,
        interp: Interpolation,
        normalize: bool,
    ) -> Result<Self> {
        Self::make_inner(instants, lower_inc, upper_inc, interp, normalize).reported()
    }

    /// Like [`TSequence::make`], reserving room for `maxcount` instants so the
    /// sequence can grow by appends.
    pub fn make_exp(
        instants: Vec<TInstant<V>>,
        lower_inc: bool,
        upper_inc: bool,
        interp: Interpolation,
        normalize: bool,
        maxcount: usize,
    ) -> Result<Self> {
        let build = || -> Result<Self> {
            let mut seq = Self::make_inner(instants, lower_inc, upper_inc, interp, normalize)?;
            seq.reserve_to(maxcount)?;
            Ok(seq)
        };
        build().reported()
    }

    pub(crate) fn make_inner(
        instants: Vec<TInstant<V>>,
        lower_inc: bool,
        upper_inc: bool,
        interp: Interpolation,
        normalize: bool,
    ) -> Result<Self> {
        Self::validate(&instants, lower_inc, upper_inc, interp)?;
        let instants = if normalize && instants.len() > 2 {
            normalize_instants(instants, interp)
        } else {
            instants
        };
        let bbox = compute_bbox(&instants, lower_inc, upper_inc);
        let maxcount = instants.len();
        Ok(Self {
            instants,
            lower_inc,
            upper_inc,
            interp,
            bbox,
            maxcount,
        })
    }

    fn validate(
        instants: &[TInstant<V>],
        lower_inc: bool,
        upper_inc: bool,
        interp: Interpolation,
    ) -> Result<()> {
        if instants.is_empty() {
            return Err(ChronotopeError::InvalidArg(
                "A temporal sequence needs at least one instant".to_string(),
            ));
        }
        if interp == Interpolation::Linear && !V::CONTINUOUS {
            return Err(ChronotopeError::FeatureNotSupported(format!(
                "Linear interpolation is not supported for {}",
                V::BASE_TYPE
            )));
        }
        for pair in instants.windows(2) {
            if pair[0].t >= pair[1].t {
                return Err(ChronotopeError::InvalidArg(format!(
                    "Timestamps for temporal value must be increasing: {}, {}",
                    pair[0].t, pair[1].t
                )));
            }
            pair[0].value.check_compatible(&pair[1].value)?;
        }
        if (instants.len() == 1 || interp == Interpolation::Discrete) && !(lower_inc && upper_inc) {
            return Err(ChronotopeError::InvalidArg(
                "Instantaneous and discrete sequences must have inclusive bounds".to_string(),
            ));
        }
        if interp == Interpolation::Step && !upper_inc {
            let n = instants.len();
            if instants[n - 1].value != instants[n - 2].value {
                return Err(ChronotopeError::InvalidArg(
                    "Invalid end value for temporal sequence with step interpolation".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Instantaneous sequence `[value@t]`.
    pub fn from_instant(inst: TInstant<V>, interp: Interpolation) -> Self {
        let bbox = inst.bbox();
        Self {
            instants: vec![inst],
            lower_inc: true,
            upper_inc: true,
            interp,
            bbox,
            maxcount: 1,
        }
    }

    /// Grow the instant capacity to at least `maxcount` slots.
    pub(crate) fn reserve_to(&mut self, maxcount: usize) -> Result<()> {
        if maxcount > self.instants.len() {
            self.instants
                .try_reserve_exact(maxcount - self.instants.len())
                .map_err(|e| ChronotopeError::MemoryAlloc(e.to_string()))?;
        }
        self.maxcount = maxcount.max(self.instants.len());
        Ok(())
    }

    pub(crate) fn recompute_bbox(&mut self) {
        self.bbox = compute_bbox(&self.instants, self.lower_inc, self.upper_inc);
    }

    pub fn instants(&self) -> &[TInstant<V>] {
        &self.instants
    }

    pub fn num_instants(&self) -> usize {
        self.instants.len()
    }

    pub fn instant_n(&self, n: usize) -> Option<&TInstant<V>> {
        self.instants.get(n)
    }

    pub fn start_instant(&self) -> &TInstant<V> {
        &self.instants[0]
    }

    pub fn end_instant(&self) -> &TInstant<V> {
        &self.instants[self.instants.len() - 1]
    }

    pub fn lower_inc(&self) -> bool {
        self.lower_inc
    }

    pub fn upper_inc(&self) -> bool {
        self.upper_inc
    }

    pub fn interp(&self) -> Interpolation {
        self.interp
    }

    pub fn bbox(&self) -> &V::BBox {
        &self.bbox
    }

    /// Number of instant slots reserved for appends.
    pub fn maxcount(&self) -> usize {
        self.maxcount
    }

    pub fn start_timestamp(&self) -> TimestampTz {
        self.start_instant().t
    }

    pub fn end_timestamp(&self) -> TimestampTz {
        self.end_instant().t
    }

    pub fn period(&self) -> TstzSpan {
        Span::from_bounds(
            Bound::lower(self.start_timestamp(), self.lower_inc),
            Bound::upper(self.end_timestamp(), self.upper_inc),
        )
    }

    pub fn is_instantaneous(&self) -> bool {
        self.instants.len() == 1
    }

    pub(crate) fn is_discrete(&self) -> bool {
        self.interp == Interpolation::Discrete
    }

    /// Value at `t`, honoring the bounds; discrete sequences only answer at
    /// their instants.
    pub fn value_at(&self, t: TimestampTz) -> Option<V> {
        if self.is_discrete() {
            return self
                .instants
                .binary_search_by(|i| i.t.cmp(&t))
                .ok()
                .map(|i| self.instants[i].value.clone());
        }
        if !self.period().contains_value(t) {
            return None;
        }
        Some(self.value_at_unchecked(t))
    }

    /// Value at `t`, clamped to the first and last instants and ignoring
    /// the bound flags.
    pub(crate) fn value_at_unchecked(&self, t: TimestampTz) -> V {
        let idx = self.instants.partition_point(|i| i.t <= t);
        if idx == 0 {
            return self.instants[0].value.clone();
        }
        let i = idx - 1;
        let inst = &self.instants[i];
        if inst.t == t || i + 1 == self.instants.len() {
            return inst.value.clone();
        }
        self.segment_value(i, t)
    }

    /// Limit of the value when approaching `t` from the left.
    pub(crate) fn left_limit(&self, t: TimestampTz) -> V {
        let idx = self.instants.partition_point(|i| i.t < t);
        if idx == 0 {
            return self.instants[0].value.clone();
        }
        let i = idx - 1;
        if i + 1 == self.instants.len() {
            return self.instants[i].value.clone();
        }
        if self.instants[i + 1].t == t && self.interp == Interpolation::Linear {
            return self.instants[i + 1].value.clone();
        }
        self.segment_value(i, t)
    }

    /// Value inside segment `i` at `t`.
    fn segment_value(&self, i: usize, t: TimestampTz) -> V {
        let (a, b) = (&self.instants[i], &self.instants[i + 1]);
        match self.interp {
            Interpolation::Linear => V::interpolate(&a.value, &b.value, t.ratio(a.t, b.t)),
            _ => a.value.clone(),
        }
    }

    /// Lexicographic over instants, then bounds and interpolation.
    pub fn cmp_seq(&self, other: &Self) -> Ordering {
        for (a, b) in self.instants.iter().zip(&other.instants) {
            let ord = a.cmp_instant(b);
            if ord.is_ne() {
                return ord;
            }
        }
        self.instants
            .len()
            .cmp(&other.instants.len())
            .then_with(|| other.lower_inc.cmp(&self.lower_inc))
            .then_with(|| self.upper_inc.cmp(&other.upper_inc))
            .then_with(|| self.interp.cmp(&other.interp))
    }

    /// Apply `f` to every timestamp; `f` must be strictly increasing.
    pub(crate) fn map_times<F>(&self, f: F) -> Result<Self>
    where
        F: Fn(TimestampTz) -> Result<TimestampTz>,
    {
        let instants = self
            .instants
            .iter()
            .map(|i| Ok(TInstant::new(i.value.clone(), f(i.t)?)))
            .collect::<Result<Vec<_>>>()?;
        Self::make_inner(instants, self.lower_inc, self.upper_inc, self.interp, false)
    }
}

/// Drop instants that add no information: equal step values and collinear
/// linear points. Discrete sequences are kept as they are.
pub(crate) fn normalize_instants<V: TemporalValue>(
    instants: Vec<TInstant<V>>,
    interp: Interpolation,
) -> Vec<TInstant<V>> {
    if interp == Interpolation::Discrete {
        return instants;
    }
    let mut result: Vec<TInstant<V>> = Vec::with_capacity(instants.len());
    for inst in instants {
        let n = result.len();
        if n >= 2 {
            let (prev, mid) = (&result[n - 2], &result[n - 1]);
            let redundant = match interp {
                Interpolation::Step => prev.value == mid.value,
                _ => V::collinear(
                    &prev.value,
                    &mid.value,
                    &inst.value,
                    mid.t.ratio(prev.t, inst.t),
                ),
            };
            if redundant {
                result.pop();
            }
        }
        result.push(inst);
    }
    result
}

pub(crate) fn compute_bbox<V: TemporalValue>(
    instants: &[TInstant<V>],
    lower_inc: bool,
    upper_inc: bool,
) -> V::BBox {
    let mut bbox = instants[0].bbox();
    for inst in &instants[1..] {
        bbox.expand(&inst.bbox());
    }
    bbox.set_period(Span::from_bounds(
        Bound::lower(instants[0].t, lower_inc),
        Bound::upper(instants[instants.len() - 1].t, upper_inc),
    ));
    bbox
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(day: i64) -> TimestampTz {
        TimestampTz::from_micros(day * 86_400_000_000)
    }

    fn inst<V: TemporalValue>(v: V, day: i64) -> TInstant<V> {
        TInstant::new(v, t(day))
    }

    #[test]
    fn test_linear_normalization_drops_collinear() {
        let seq = TSequence::make(
            vec![inst(1.0, 0), inst(2.0, 1), inst(3.0, 2)],
            true,
            true,
            Interpolation::Linear,
            true,
        )
        .unwrap();
        assert_eq!(seq.num_instants(), 2);
        assert_eq!(seq.end_instant().value, 3.0);
    }

    #[test]
    fn test_step_normalization_drops_repeats() {
        let seq = TSequence::make(
            vec![inst(1, 0), inst(1, 1), inst(2, 2), inst(2, 3)],
            true,
            false,
            Interpolation::Step,
            true,
        )
        .unwrap();
        let values: Vec<i32> = seq.instants().iter().map(|i| i.value).collect();
        assert_eq!(values, vec![1, 2, 2]);
    }

    #[test]
    fn test_validation() {
        let linear_int =
            TSequence::make(vec![inst(1, 0), inst(2, 1)], true, true, Interpolation::Linear, true);
        assert!(matches!(
            linear_int,
            Err(ChronotopeError::FeatureNotSupported(_))
        ));

        let unordered =
            TSequence::make(vec![inst(1, 1), inst(2, 0)], true, true, Interpolation::Step, true);
        assert!(unordered.is_err());

        let open_instant = TSequence::make(vec![inst(1, 0)], true, false, Interpolation::Step, true);
        assert!(open_instant.is_err());

        let bad_step_end =
            TSequence::make(vec![inst(1, 0), inst(2, 1)], true, false, Interpolation::Step, true);
        assert!(bad_step_end.is_err());
    }

    #[test]
    fn test_value_at() {
        let seq = TSequence::make(
            vec![inst(0.0, 0), inst(10.0, 10)],
            true,
            false,
            Interpolation::Linear,
            true,
        )
        .unwrap();
        assert_eq!(seq.value_at(t(5)), Some(5.0));
        assert_eq!(seq.value_at(t(10)), None);
        assert_eq!(seq.left_limit(t(10)), 10.0);

        let step = TSequence::make(
            vec![inst(1, 0), inst(2, 5), inst(2, 10)],
            true,
            false,
            Interpolation::Step,
            false,
        )
        .unwrap();
        assert_eq!(step.value_at(t(4)), Some(1));
        assert_eq!(step.value_at(t(5)), Some(2));
        assert_eq!(step.left_limit(t(5)), 1);
    }

    #[test]
    fn test_bbox_follows_bounds() {
        let seq = TSequence::make(
            vec![inst(3, 0), inst(1, 1), inst(1, 2)],
            false,
            false,
            Interpolation::Step,
            true,
        )
        .unwrap();
        let period = seq.bbox().period().unwrap();
        assert!(!period.lower_inc() && !period.upper_inc());
        assert_eq!(seq.bbox().xmin(), Some(1.0));
        assert_eq!(seq.bbox().xmax(), Some(3.0));
    }

    #[test]
    fn test_make_exp_reserves() {
        let seq = TSequence::make_exp(
            vec![inst(1.0, 0)],
            true,
            true,
            Interpolation::Linear,
            true,
            16,
        )
        .unwrap();
        assert_eq!(seq.maxcount(), 16);
        assert!(seq.instants.capacity() >= 16);
    }
}
