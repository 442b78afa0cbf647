//! Predicates, set operations, distances and transforms over spans.

use super::{Bound, Span, SpanBound, SpanSet};
use crate::error::{ChronotopeError, Result};

impl<T: SpanBound> Span<T> {
    pub fn contains_value(&self, value: T) -> bool {
        let v = Bound::at(value);
        self.lower_bound().le(&v) && v.le(&self.upper_bound())
    }

    pub fn contains(&self, other: &Self) -> bool {
        self.lower_bound().le(&other.lower_bound()) && other.upper_bound().le(&self.upper_bound())
    }

    pub fn contained(&self, other: &Self) -> bool {
        other.contains(self)
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.lower_bound().le(&other.upper_bound()) && other.lower_bound().le(&self.upper_bound())
    }

    /// The spans touch at one value that exactly one of them includes.
    pub fn adjacent(&self, other: &Self) -> bool {
        let touches = |a: &Self, b: &Self| {
            a.upper.bound_cmp(&b.lower).is_eq() && a.upper_inc != b.lower_inc
        };
        touches(self, other) || touches(other, self)
    }

    /// The span ends just before an excluded `value`.
    pub fn adjacent_value(&self, value: T) -> bool {
        (self.upper.bound_cmp(&value).is_eq() && !self.upper_inc)
            || (self.lower.bound_cmp(&value).is_eq() && !self.lower_inc)
    }

    /// Strictly to the left; touching spans count as left.
    pub fn left(&self, other: &Self) -> bool {
        self.upper_bound().lt(&other.lower_bound())
    }

    /// Does not extend to the right of `other`.
    pub fn overleft(&self, other: &Self) -> bool {
        self.upper_bound().le(&other.upper_bound())
    }

    pub fn right(&self, other: &Self) -> bool {
        other.left(self)
    }

    /// Does not extend to the left of `other`.
    pub fn overright(&self, other: &Self) -> bool {
        other.lower_bound().le(&self.lower_bound())
    }

    /// Left of `other` with a gap between them.
    pub fn before(&self, other: &Self) -> bool {
        self.left(other) && !self.adjacent(other)
    }

    /// Right of `other` with a gap between them.
    pub fn after(&self, other: &Self) -> bool {
        other.before(self)
    }

    pub fn left_value(&self, value: T) -> bool {
        self.upper_bound().lt(&Bound::at(value))
    }

    pub fn right_value(&self, value: T) -> bool {
        Bound::at(value).lt(&self.lower_bound())
    }

    /// Common part, `None` when the spans do not overlap.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let lower = self.lower_bound().max(other.lower_bound());
        let upper = self.upper_bound().min(other.upper_bound());
        if upper.lt(&lower) {
            return None;
        }
        Some(Span::from_bounds(lower, upper))
    }

    /// Union, a single span when the inputs overlap or touch.
    pub fn union(&self, other: &Self) -> SpanSet<T> {
        SpanSet::from_unsorted(vec![*self, *other])
    }

    /// Smallest span containing both.
    pub fn super_union(&self, other: &Self) -> Self {
        let mut result = *self;
        result.expand(other);
        result
    }

    /// Grow in place to cover `other`.
    pub fn expand(&mut self, other: &Self) {
        let lower = self.lower_bound().min(other.lower_bound());
        let upper = self.upper_bound().max(other.upper_bound());
        *self = Span::from_bounds(lower, upper);
    }

    /// Difference, `None` when nothing is left.
    pub fn minus(&self, other: &Self) -> Option<SpanSet<T>> {
        if !self.overlaps(other) {
            return Some(SpanSet::from_span(*self));
        }
        let mut pieces = Vec::with_capacity(2);
        if self.lower_bound().lt(&other.lower_bound()) {
            pieces.push(Span::from_bounds(
                self.lower_bound(),
                Bound::upper(other.lower, !other.lower_inc),
            ));
        }
        if other.upper_bound().lt(&self.upper_bound()) {
            pieces.push(Span::from_bounds(
                Bound::lower(other.upper, !other.upper_inc),
                self.upper_bound(),
            ));
        }
        if pieces.is_empty() {
            None
        } else {
            Some(SpanSet::from_normalized(pieces))
        }
    }

    pub fn minus_value(&self, value: T) -> Option<SpanSet<T>> {
        match Span::point(value) {
            Ok(point) => self.minus(&point),
            Err(_) => Some(SpanSet::from_span(*self)),
        }
    }

    /// Native position of the last value included in the span.
    fn last_native(&self) -> f64 {
        if T::DISCRETE && !self.upper_inc {
            self.upper.native() - 1.0
        } else {
            self.upper.native()
        }
    }

    /// Gap between the spans, 0 when they overlap.
    ///
    /// Discrete spans measure from their last included value; time spans
    /// report seconds.
    pub fn distance(&self, other: &Self) -> f64 {
        if self.overlaps(other) {
            return 0.0;
        }
        let (first, second) = if self.left(other) {
            (self, other)
        } else {
            (other, self)
        };
        (second.lower.native() - first.last_native()).max(0.0) * T::DISTANCE_UNIT
    }

    pub fn distance_value(&self, value: T) -> f64 {
        if self.contains_value(value) {
            return 0.0;
        }
        let v = value.native();
        let gap = if self.right_value(value) {
            self.lower.native() - v
        } else {
            v - self.last_native()
        };
        gap.max(0.0) * T::DISTANCE_UNIT
    }

    /// Move both bounds by `delta`.
    pub fn shift(&self, delta: T::Delta) -> Result<Self> {
        Span::new(
            self.lower.add_delta(delta)?,
            self.upper.add_delta(delta)?,
            self.lower_inc,
            self.upper_inc,
        )
    }

    /// Multiply the width by `factor`, keeping the lower bound.
    pub fn scale(&self, factor: f64) -> Result<Self> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(ChronotopeError::InvalidArgValue(format!(
                "Scale factor must be positive, got {}",
                factor
            )));
        }
        let width = self.upper.native() - self.lower.native();
        let upper = T::from_native(self.lower.native() + width * factor)?;
        Span::new(self.lower, upper, self.lower_inc, self.upper_inc)
    }

    /// Shift by `shift` and then set the width to `width`.
    pub fn shift_scale(&self, shift: Option<T::Delta>, width: Option<T::Delta>) -> Result<Self> {
        if shift.is_none() && width.is_none() {
            return Err(ChronotopeError::InvalidArg(
                "At least one of shift or width must be given".to_string(),
            ));
        }
        let (mut lower, mut upper) = (self.lower, self.upper);
        if let Some(delta) = shift {
            lower = lower.add_delta(delta)?;
            upper = upper.add_delta(delta)?;
        }
        if let Some(width) = width {
            if T::delta_native(width) <= 0.0 {
                return Err(ChronotopeError::InvalidArgValue(
                    "The width must be positive".to_string(),
                ));
            }
            upper = lower.add_delta(width)?;
        }
        Span::new(lower, upper, self.lower_inc, self.upper_inc)
    }

    /// Subtract every span of `ss`.
    pub fn minus_spanset(&self, ss: &SpanSet<T>) -> Option<SpanSet<T>> {
        SpanSet::from_span(*self).minus(ss)
    }
}
