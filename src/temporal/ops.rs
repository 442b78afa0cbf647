//! Lifted operators: arithmetic, boolean, text, comparisons and distance.
//!
//! Binary operators between temporal values return `None` when the
//! operands share no time. Operators against a constant always have a
//! result.

use super::lifting::{Turning, lift_binary};
use super::Temporal;
use crate::error::{ChronotopeError, ReportExt, Result};
use crate::span::{Span, TstzSpanSet};
use crate::types::{MetricValue, NumericValue, TemporalValue};
use std::cmp::Ordering;

/// Extremum of the product of two linear segments.
fn mul_turning<V: NumericValue>(a0: &V, a1: &V, b0: &V, b1: &V) -> Option<f64> {
    let (a0, b0) = (a0.to_f64(), b0.to_f64());
    let (da, db) = (a1.to_f64() - a0, b1.to_f64() - b0);
    if da == 0.0 || db == 0.0 {
        return None;
    }
    let r = -(a0 * db + b0 * da) / (2.0 * da * db);
    (r > 0.0 && r < 1.0).then_some(r)
}

fn cmp_turning<V: TemporalValue>(a0: &V, a1: &V, b0: &V, b1: &V) -> Option<f64> {
    V::crossing(a0, a1, b0, b1)
}

impl<V: TemporalValue> Temporal<V> {
    /// Lift `f` against a constant broadcast over the time of `self`.
    fn lift_value<R, F>(&self, value: &V, f: F, turning: Option<Turning<V, V>>) -> Result<Temporal<R>>
    where
        R: TemporalValue,
        F: Fn(&V, &V) -> Result<R>,
    {
        self.start_value().check_compatible(value)?;
        let constant = self.from_base_temp_inner(value.clone())?;
        lift_binary(self, &constant, f, turning)?.ok_or_else(|| {
            ChronotopeError::Internal("Lifting against a constant lost the time frame".to_string())
        })
    }

    fn lift_temporal<R, F>(
        &self,
        other: &Self,
        f: F,
        turning: Option<Turning<V, V>>,
    ) -> Result<Option<Temporal<R>>>
    where
        R: TemporalValue,
        F: Fn(&V, &V) -> Result<R>,
    {
        self.start_value().check_compatible(other.start_value())?;
        lift_binary(self, other, f, turning)
    }

    fn compare_with(&self, other: &Self, keep: fn(Ordering) -> bool) -> Result<Option<Temporal<bool>>> {
        self.lift_temporal(other, |a, b| Ok(keep(a.value_cmp(b))), Some(cmp_turning::<V>))
            .reported()
    }

    fn compare_value(&self, value: &V, keep: fn(Ordering) -> bool) -> Result<Temporal<bool>> {
        self.lift_value(value, |a, b| Ok(keep(a.value_cmp(b))), Some(cmp_turning::<V>))
            .reported()
    }

    /// Temporal equality.
    pub fn teq(&self, other: &Self) -> Result<Option<Temporal<bool>>> {
        self.lift_temporal(other, |a, b| Ok(a == b), Some(cmp_turning::<V>))
            .reported()
    }

    pub fn tne(&self, other: &Self) -> Result<Option<Temporal<bool>>> {
        self.lift_temporal(other, |a, b| Ok(a != b), Some(cmp_turning::<V>))
            .reported()
    }

    pub fn tlt(&self, other: &Self) -> Result<Option<Temporal<bool>>> {
        self.compare_with(other, Ordering::is_lt)
    }

    pub fn tle(&self, other: &Self) -> Result<Option<Temporal<bool>>> {
        self.compare_with(other, Ordering::is_le)
    }

    pub fn tgt(&self, other: &Self) -> Result<Option<Temporal<bool>>> {
        self.compare_with(other, Ordering::is_gt)
    }

    pub fn tge(&self, other: &Self) -> Result<Option<Temporal<bool>>> {
        self.compare_with(other, Ordering::is_ge)
    }

    pub fn teq_value(&self, value: &V) -> Result<Temporal<bool>> {
        self.lift_value(value, |a, b| Ok(a == b), Some(cmp_turning::<V>))
            .reported()
    }

    pub fn tne_value(&self, value: &V) -> Result<Temporal<bool>> {
        self.lift_value(value, |a, b| Ok(a != b), Some(cmp_turning::<V>))
            .reported()
    }

    pub fn tlt_value(&self, value: &V) -> Result<Temporal<bool>> {
        self.compare_value(value, Ordering::is_lt)
    }

    pub fn tle_value(&self, value: &V) -> Result<Temporal<bool>> {
        self.compare_value(value, Ordering::is_le)
    }

    pub fn tgt_value(&self, value: &V) -> Result<Temporal<bool>> {
        self.compare_value(value, Ordering::is_gt)
    }

    pub fn tge_value(&self, value: &V) -> Result<Temporal<bool>> {
        self.compare_value(value, Ordering::is_ge)
    }

    /// Whether the value is ever equal to `value`.
    pub fn ever_eq(&self, value: &V) -> Result<bool> {
        Ok(self.at_value(value)?.is_some())
    }

    /// Whether the value is always equal to `value`.
    pub fn always_eq(&self, value: &V) -> Result<bool> {
        Ok(self.minus_value(value)?.is_none())
    }

    pub fn ever_ne(&self, value: &V) -> Result<bool> {
        Ok(!self.always_eq(value)?)
    }

    pub fn always_ne(&self, value: &V) -> Result<bool> {
        Ok(!self.ever_eq(value)?)
    }
}

/// Value spans below and above a threshold.
fn below(value: f64, inclusive: bool) -> Result<crate::span::FloatSpan> {
    Span::new(f64::NEG_INFINITY, value, false, inclusive)
}

fn above(value: f64, inclusive: bool) -> Result<crate::span::FloatSpan> {
    Span::new(value, f64::INFINITY, inclusive, false)
}

impl<V: NumericValue> Temporal<V> {
    pub fn add(&self, other: &Self) -> Result<Option<Self>> {
        self.lift_temporal(other, |a, b| a.checked_add(*b), None)
            .reported()
    }

    pub fn sub(&self, other: &Self) -> Result<Option<Self>> {
        self.lift_temporal(other, |a, b| a.checked_sub(*b), None)
            .reported()
    }

    /// Product; linear operands are sampled at the extremum of each segment.
    pub fn mul(&self, other: &Self) -> Result<Option<Self>> {
        self.lift_temporal(other, |a, b| a.checked_mul(*b), Some(mul_turning::<V>))
            .reported()
    }

    /// Quotient; fails when the divisor is or crosses zero on the common time.
    pub fn div(&self, other: &Self) -> Result<Option<Self>> {
        let run = || -> Result<Option<Self>> {
            if let Some(common) = other.at_tstzspanset(&self.time())? {
                if common.at_value(&V::zero())?.is_some() {
                    return Err(ChronotopeError::DivisionByZero);
                }
            }
            self.lift_temporal(other, |a, b| a.checked_div(*b), None)
        };
        run().reported()
    }

    pub fn add_value(&self, value: V) -> Result<Self> {
        self.map_values(|a| a.checked_add(value)).reported()
    }

    pub fn sub_value(&self, value: V) -> Result<Self> {
        self.map_values(|a| a.checked_sub(value)).reported()
    }

    pub fn mul_value(&self, value: V) -> Result<Self> {
        self.map_values(|a| a.checked_mul(value)).reported()
    }

    pub fn div_value(&self, value: V) -> Result<Self> {
        self.map_values(|a| a.checked_div(value)).reported()
    }

    /// Absolute value; linear values gain an instant where they cross zero.
    pub fn abs(&self) -> Result<Self> {
        let run = || -> Result<Self> {
            self.lift_value(&V::zero(), |a, b| Ok(a.distance(b)), Some(V::closest_approach))?
                .map_values(|d| V::from_f64(*d))
        };
        run().reported()
    }

    pub fn ever_lt(&self, value: V) -> Result<bool> {
        Ok(self.at_span(&below(value.to_f64(), false)?)?.is_some())
    }

    pub fn ever_le(&self, value: V) -> Result<bool> {
        Ok(self.at_span(&below(value.to_f64(), true)?)?.is_some())
    }

    pub fn ever_gt(&self, value: V) -> Result<bool> {
        Ok(self.at_span(&above(value.to_f64(), false)?)?.is_some())
    }

    pub fn ever_ge(&self, value: V) -> Result<bool> {
        Ok(self.at_span(&above(value.to_f64(), true)?)?.is_some())
    }

    pub fn always_lt(&self, value: V) -> Result<bool> {
        Ok(self.minus_span(&below(value.to_f64(), false)?)?.is_none())
    }

    pub fn always_le(&self, value: V) -> Result<bool> {
        Ok(self.minus_span(&below(value.to_f64(), true)?)?.is_none())
    }

    pub fn always_gt(&self, value: V) -> Result<bool> {
        Ok(self.minus_span(&above(value.to_f64(), false)?)?.is_none())
    }

    pub fn always_ge(&self, value: V) -> Result<bool> {
        Ok(self.minus_span(&above(value.to_f64(), true)?)?.is_none())
    }
}

impl<V: MetricValue> Temporal<V> {
    /// Distance between two temporal values at each instant of their
    /// common time.
    pub fn tdistance(&self, other: &Self) -> Result<Option<Temporal<f64>>> {
        self.lift_temporal(other, |a, b| Ok(a.distance(b)), Some(V::closest_approach))
            .reported()
    }

    pub fn tdistance_value(&self, value: &V) -> Result<Temporal<f64>> {
        self.lift_value(value, |a, b| Ok(a.distance(b)), Some(V::closest_approach))
            .reported()
    }

    /// Smallest distance ever reached between the two values.
    pub fn nearest_approach_distance(&self, other: &Self) -> Result<Option<f64>> {
        Ok(self.tdistance(other)?.map(|d| *d.min_value()))
    }
}

impl Temporal<bool> {
    pub fn and(&self, other: &Self) -> Result<Option<Self>> {
        self.lift_temporal(other, |a, b| Ok(*a && *b), None).reported()
    }

    pub fn or(&self, other: &Self) -> Result<Option<Self>> {
        self.lift_temporal(other, |a, b| Ok(*a || *b), None).reported()
    }

    pub fn and_value(&self, value: bool) -> Result<Self> {
        self.map_values(|a| Ok(*a && value))
    }

    pub fn or_value(&self, value: bool) -> Result<Self> {
        self.map_values(|a| Ok(*a || value))
    }

    pub fn not(&self) -> Result<Self> {
        self.map_values(|a| Ok(!*a))
    }

    /// Time during which the value is true.
    pub fn when_true(&self) -> Result<Option<TstzSpanSet>> {
        Ok(self.at_value(&true)?.map(|v| v.time()))
    }
}

impl Temporal<String> {
    pub fn concat(&self, other: &Self) -> Result<Option<Self>> {
        self.lift_temporal(other, |a, b| Ok(format!("{}{}", a, b)), None)
            .reported()
    }

    /// Append `suffix` to every value.
    pub fn concat_value(&self, suffix: &str) -> Result<Self> {
        self.map_values(|a| Ok(format!("{}{}", a, suffix)))
    }

    pub fn upper(&self) -> Result<Self> {
        self.map_values(|a| Ok(a.to_uppercase()))
    }

    pub fn lower(&self) -> Result<Self> {
        self.map_values(|a| Ok(a.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::Interpolation;
    use crate::types::{GeoPoint, TimestampTz};

    fn t(day: i64) -> TimestampTz {
        TimestampTz::from_micros(day * 86_400_000_000)
    }

    fn tfloat(text: &str) -> Temporal<f64> {
        text.parse().unwrap()
    }

    #[test]
    fn test_arithmetic() {
        let a = tfloat("[1@2000-01-01, 3@2000-01-03]");
        let b = tfloat("[10@2000-01-02, 10@2000-01-05]");
        let sum = a.add(&b).unwrap().unwrap();
        assert_eq!(sum.start_timestamp(), t(1));
        assert_eq!(sum.value_at_timestamp(t(1)), Some(12.0));
        assert_eq!(sum.value_at_timestamp(t(2)), Some(13.0));

        let shifted = a.add_value(1.0).unwrap();
        assert_eq!(*shifted.start_value(), 2.0);
        assert_eq!(shifted.interp(), Interpolation::Linear);
    }

    #[test]
    fn test_mul_samples_extremum() {
        let a = tfloat("[-1@2000-01-01, 1@2000-01-03]");
        let sq = a.mul(&a).unwrap().unwrap();
        assert_eq!(sq.value_at_timestamp(t(1)), Some(0.0));
        assert_eq!(*sq.min_value(), 0.0);
    }

    #[test]
    fn test_division_by_zero() {
        let a = tfloat("[1@2000-01-01, 1@2000-01-03]");
        let crossing = tfloat("[-1@2000-01-01, 1@2000-01-03]");
        assert_eq!(a.div(&crossing), Err(ChronotopeError::DivisionByZero));
        assert!(a.div_value(0.0).is_err());

        let ints: Temporal<i32> = "[4@2000-01-01, 8@2000-01-02]".parse().unwrap();
        let halves = ints.div_value(2).unwrap();
        assert_eq!(halves.values(), vec![2, 4]);
    }

    #[test]
    fn test_comparisons() {
        let a = tfloat("[0@2000-01-01, 10@2000-01-11]");
        let lt = a.tlt_value(&5.0).unwrap();
        assert_eq!(lt.value_at_timestamp(t(2)), Some(true));
        assert_eq!(lt.value_at_timestamp(t(5)), Some(false));
        assert_eq!(lt.value_at_timestamp(t(8)), Some(false));
        assert_eq!(lt.num_sequences(), 1);

        assert!(a.ever_eq(&5.0).unwrap());
        assert!(!a.always_eq(&5.0).unwrap());
        assert!(a.ever_lt(1.0).unwrap());
        assert!(a.always_le(10.0).unwrap());
        assert!(!a.always_lt(10.0).unwrap());
    }

    #[test]
    fn test_abs_crosses_zero() {
        let a = tfloat("[-2@2000-01-01, 2@2000-01-05]");
        let abs = a.abs().unwrap();
        assert_eq!(abs.num_instants(), 3);
        assert_eq!(*abs.min_value(), 0.0);
        assert_eq!(abs.value_at_timestamp(t(0)), Some(2.0));
    }

    #[test]
    fn test_point_distance() {
        let a: Temporal<GeoPoint> = "[POINT(0 0)@2000-01-01, POINT(10 0)@2000-01-11]"
            .parse()
            .unwrap();
        let b: Temporal<GeoPoint> = "[POINT(10 1)@2000-01-01, POINT(0 1)@2000-01-11]"
            .parse()
            .unwrap();
        let d = a.nearest_approach_distance(&b).unwrap().unwrap();
        assert!((d - 1.0).abs() < 1e-9);

        let other: Temporal<GeoPoint> = "SRID=4326;[POINT(0 0)@2000-01-01, POINT(1 1)@2000-01-02]"
            .parse()
            .unwrap();
        assert!(matches!(a.tdistance(&other), Err(ChronotopeError::InvalidArg(_))));
    }

    #[test]
    fn test_bool_and_text() {
        let a: Temporal<bool> = "[t@2000-01-01, f@2000-01-03]".parse().unwrap();
        let b: Temporal<bool> = "[t@2000-01-02, t@2000-01-04]".parse().unwrap();
        let and = a.and(&b).unwrap().unwrap();
        assert_eq!(and.value_at_timestamp(t(1)), Some(true));
        assert_eq!(and.value_at_timestamp(t(2)), Some(false));
        assert_eq!(a.not().unwrap().value_at_timestamp(t(0)), Some(false));

        let s: Temporal<String> = "[\"ab\"@2000-01-01, \"cd\"@2000-01-02]".parse().unwrap();
        let up = s.upper().unwrap();
        assert_eq!(up.values(), vec!["AB".to_string(), "CD".to_string()]);
        let c = s.concat_value("!").unwrap();
        assert_eq!(c.start_value(), "ab!");
    }

    #[test]
    fn test_when_true_spans() {
        let a: Temporal<bool> = "[t@2000-01-01, f@2000-01-03, t@2000-01-05, t@2000-01-06]".parse().unwrap();
        let times = a.when_true().unwrap().unwrap();
        assert_eq!(times.num_spans(), 2);
        assert!(times.contains_value(t(0)));
        assert!(times.contains_value(TimestampTz::from_micros(2 * 86_400_000_000 - 1)));
        assert!(!times.contains_value(t(3)));
        assert!(times.contains_value(t(5)));
        assert!(!times.contains_value(t(2)));

        let never: Temporal<bool> = "{f@2000-01-01, f@2000-01-02}".parse().unwrap();
        assert!(never.when_true().unwrap().is_none());
    }
}
