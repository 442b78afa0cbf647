//! Spans, span sets and sets over ordered base domains.
//!
//! A [`Span`] is an interval with independent bound inclusivity. Spans over
//! discrete domains (integers and dates) are kept in the canonical form
//! `[lower, upper)`. A [`SpanSet`] is an ordered union of disjoint,
//! non-adjacent spans, normalized at construction. A [`Set`] is an ordered
//! collection of distinct values.
//!
//! # Examples
//!
//! ```
//! use chronotope::span::{IntSpan, SpanSet};
//!
//! let s = IntSpan::new(1, 5, true, true).unwrap();
//! assert_eq!(s.to_string(), "[1, 6)");
//!
//! let a = IntSpan::new(1, 3, true, false).unwrap();
//! let b = IntSpan::new(3, 5, true, false).unwrap();
//! let merged = SpanSet::new(vec![a, b]).unwrap();
//! assert_eq!(merged.to_string(), "{[1, 5)}");
//! ```

mod bound;
mod ops;
mod set;
mod spanset;

pub use bound::SpanBound;
pub use set::Set;
pub use spanset::SpanSet;

use crate::config::DEFAULT_FLOAT_DIGITS;
use crate::error::{ChronotopeError, ReportExt, Result};
use crate::types::{Date, Interval, TimestampTz};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

pub type IntSpan = Span<i32>;
pub type BigintSpan = Span<i64>;
pub type FloatSpan = Span<f64>;
pub type DateSpan = Span<Date>;
pub type TstzSpan = Span<TimestampTz>;

pub type IntSpanSet = SpanSet<i32>;
pub type BigintSpanSet = SpanSet<i64>;
pub type FloatSpanSet = SpanSet<f64>;
pub type DateSpanSet = SpanSet<Date>;
pub type TstzSpanSet = SpanSet<TimestampTz>;

/// A bounded interval over an ordered base domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span<T> {
    lower: T,
    upper: T,
    lower_inc: bool,
    upper_inc: bool,
}

/// A span bound positioned on the domain line.
///
/// An exclusive lower bound sits just after its value and an exclusive
/// upper bound just before it, so bounds of either kind compare directly.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Bound<T> {
    pub value: T,
    offset: i8,
}

impl<T: SpanBound> Bound<T> {
    pub fn lower(value: T, inclusive: bool) -> Self {
        Self {
            value,
            offset: if inclusive { 0 } else { 1 },
        }
    }

    pub fn upper(value: T, inclusive: bool) -> Self {
        Self {
            value,
            offset: if inclusive { 0 } else { -1 },
        }
    }

    pub fn at(value: T) -> Self {
        Self { value, offset: 0 }
    }

    pub fn inclusive(&self) -> bool {
        self.offset == 0
    }

    pub fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .bound_cmp(&other.value)
            .then(self.offset.cmp(&other.offset))
    }

    pub fn lt(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Less
    }

    pub fn le(&self, other: &Self) -> bool {
        self.cmp(other) != Ordering::Greater
    }

    pub fn min(self, other: Self) -> Self {
        if other.lt(&self) { other } else { self }
    }

    pub fn max(self, other: Self) -> Self {
        if self.lt(&other) { other } else { self }
    }
}

impl<T: SpanBound> Span<T> {
    /// Build a span, canonicalizing discrete domains to `[lower, upper)`.
    ///
    /// Fails when `lower > upper`, when the span would be empty, or when a
    /// bound is NaN.
    pub fn new(lower: T, upper: T, lower_inc: bool, upper_inc: bool) -> Result<Self> {
        Self::make_inner(lower, upper, lower_inc, upper_inc).reported()
    }

    pub(crate) fn make_inner(
        mut lower: T,
        mut upper: T,
        mut lower_inc: bool,
        mut upper_inc: bool,
    ) -> Result<Self> {
        if !lower.is_valid() || !upper.is_valid() {
            return Err(ChronotopeError::InvalidArgValue(
                "Span bounds cannot be NaN".to_string(),
            ));
        }
        match lower.bound_cmp(&upper) {
            Ordering::Greater => {
                return Err(ChronotopeError::InvalidArgValue(format!(
                    "Span lower bound {:?} must be less than or equal to the upper bound {:?}",
                    lower, upper
                )));
            }
            Ordering::Equal if !(lower_inc && upper_inc) => {
                return Err(ChronotopeError::InvalidArgValue(
                    "Span cannot be empty".to_string(),
                ));
            }
            _ => {}
        }

        if T::DISCRETE {
            if !lower_inc {
                lower = lower.successor()?;
                lower_inc = true;
            }
            if upper_inc {
                upper = upper.successor()?;
                upper_inc = false;
            }
            if lower.bound_cmp(&upper) != Ordering::Less {
                return Err(ChronotopeError::InvalidArgValue(
                    "Span cannot be empty".to_string(),
                ));
            }
        }

        Ok(Self {
            lower,
            upper,
            lower_inc,
            upper_inc,
        })
    }

    /// Like [`Span::new`] but silent: an invalid or empty span is `None`.
    pub(crate) fn try_new(lower: T, upper: T, lower_inc: bool, upper_inc: bool) -> Option<Self> {
        Self::make_inner(lower, upper, lower_inc, upper_inc).ok()
    }

    /// Span holding exactly `value`.
    pub fn point(value: T) -> Result<Self> {
        Self::new(value, value, true, true)
    }

    /// Assemble a span from bounds known to be canonical and non-empty.
    pub(crate) fn from_bounds(lower: Bound<T>, upper: Bound<T>) -> Self {
        Self {
            lower: lower.value,
            upper: upper.value,
            lower_inc: lower.inclusive(),
            upper_inc: upper.inclusive(),
        }
    }

    pub(crate) fn lower_bound(&self) -> Bound<T> {
        Bound::lower(self.lower, self.lower_inc)
    }

    pub(crate) fn upper_bound(&self) -> Bound<T> {
        Bound::upper(self.upper, self.upper_inc)
    }

    pub fn lower(&self) -> T {
        self.lower
    }

    pub fn upper(&self) -> T {
        self.upper
    }

    pub fn lower_inc(&self) -> bool {
        self.lower_inc
    }

    pub fn upper_inc(&self) -> bool {
        self.upper_inc
    }

    /// `upper - lower`; out of range when the difference overflows the
    /// delta type of the domain.
    pub fn width(&self) -> Result<T::Delta> {
        self.upper.delta(self.lower)
    }

    /// Whether the span holds a single value.
    pub fn is_instant(&self) -> bool {
        self.lower.bound_cmp(&self.upper) == Ordering::Equal
    }

    /// Total order: lower bound first, then upper bound.
    pub fn cmp_span(&self, other: &Self) -> Ordering {
        self.lower_bound()
            .cmp(&other.lower_bound())
            .then_with(|| self.upper_bound().cmp(&other.upper_bound()))
    }

    /// Text form with at most `maxdd` decimals for float bounds.
    pub fn to_text(&self, maxdd: usize) -> String {
        format!(
            "{}{}, {}{}",
            if self.lower_inc { '[' } else { '(' },
            self.lower.format_bound(maxdd),
            self.upper.format_bound(maxdd),
            if self.upper_inc { ']' } else { ')' }
        )
    }

    /// Parse `[lower, upper)` and its variants.
    pub fn parse(input: &str) -> Result<Self> {
        Self::parse_inner(input).reported()
    }

    pub(crate) fn parse_inner(input: &str) -> Result<Self> {
        let text = input.trim();
        let lower_inc = match text.chars().next() {
            Some('[') => true,
            Some('(') => false,
            _ => {
                return Err(ChronotopeError::TextInput(format!(
                    "Could not parse span '{}': missing opening bracket",
                    input
                )));
            }
        };
        let upper_inc = match text.chars().last() {
            Some(']') => true,
            Some(')') => false,
            _ => {
                return Err(ChronotopeError::TextInput(format!(
                    "Could not parse span '{}': missing closing bracket",
                    input
                )));
            }
        };
        let inner = &text[1..text.len() - 1];
        let (lower, upper) = inner.split_once(',').ok_or_else(|| {
            ChronotopeError::TextInput(format!("Could not parse span '{}': missing comma", input))
        })?;
        let lower = T::parse_bound(lower.trim())?;
        let upper = T::parse_bound(upper.trim())?;
        Self::make_inner(lower, upper, lower_inc, upper_inc)
    }
}

impl<T: SpanBound> PartialOrd for Span<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp_span(other))
    }
}

impl<T: SpanBound> fmt::Display for Span<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text(DEFAULT_FLOAT_DIGITS))
    }
}

impl<T: SpanBound> FromStr for Span<T> {
    type Err = ChronotopeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Span<TimestampTz> {
    /// The instantaneous period `[t, t]`.
    pub fn singleton(t: TimestampTz) -> Self {
        Self {
            lower: t,
            upper: t,
            lower_inc: true,
            upper_inc: true,
        }
    }

    pub fn duration(&self) -> Interval {
        self.upper.delta_since(self.lower)
    }
}

impl Span<i32> {
    pub fn to_floatspan(&self) -> FloatSpan {
        Span {
            lower: f64::from(self.lower),
            upper: f64::from(self.upper),
            lower_inc: self.lower_inc,
            upper_inc: self.upper_inc,
        }
    }
}

impl Span<f64> {
    /// Smallest integer span covering this span.
    pub fn to_intspan(&self) -> Result<IntSpan> {
        let lower = <i32 as SpanBound>::from_native(self.lower.floor())?;
        let upper = <i32 as SpanBound>::from_native(self.upper.ceil())?;
        let lower_inc = self.lower_inc || self.lower.fract() != 0.0;
        let upper_inc = self.upper_inc || self.upper.fract() != 0.0;
        Span::new(lower, upper, lower_inc, upper_inc)
    }

    /// Round both bounds to `maxdd` decimals.
    ///
    /// Bounds are rounded first and the span is then rebuilt, so a span whose
    /// bounds collapse onto the same value with an exclusive bound is an error.
    pub fn round(&self, maxdd: i32) -> Result<Self> {
        let factor = 10f64.powi(maxdd);
        let round = |v: f64| {
            if v.is_finite() {
                (v * factor).round() / factor
            } else {
                v
            }
        };
        Span::new(
            round(self.lower),
            round(self.upper),
            self.lower_inc,
            self.upper_inc,
        )
    }
}

impl Span<Date> {
    /// Period from midnight of the first day to midnight after the last one.
    pub fn to_tstzspan(&self) -> TstzSpan {
        Span {
            lower: self.lower.to_timestamp(),
            upper: self.upper.to_timestamp(),
            lower_inc: self.lower_inc,
            upper_inc: self.upper_inc,
        }
    }
}
