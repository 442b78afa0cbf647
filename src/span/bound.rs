use crate::error::{ChronotopeError, Result};
use crate::types::catalog::TypeTag;
use crate::types::time::USECS_PER_DAY;
use crate::types::value::{format_float, parse_float};
use crate::types::{Date, Interval, TimestampTz};
use crate::wkb::{WkbReader, WkbWriter};
use std::cmp::Ordering;
use std::fmt;

/// Base domains that spans, span sets and sets can range over.
pub trait SpanBound: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Type of shifts and widths, e.g. [`Interval`] for timestamps.
    type Delta: Copy + fmt::Debug;

    const BASE_TYPE: TypeTag;
    const SET_TYPE: TypeTag;
    const SPAN_TYPE: TypeTag;
    const SPANSET_TYPE: TypeTag;

    /// Discrete domains are canonicalized to `[lower, upper)`.
    const DISCRETE: bool;

    /// Factor converting a native difference into a reported distance.
    const DISTANCE_UNIT: f64 = 1.0;

    fn bound_cmp(&self, other: &Self) -> Ordering;

    /// Next value of a discrete domain; the value itself otherwise.
    fn successor(self) -> Result<Self>;

    fn add_delta(self, delta: Self::Delta) -> Result<Self>;

    /// `self - earlier`, failing when it does not fit in `Self::Delta`.
    fn delta(self, earlier: Self) -> Result<Self::Delta>;

    /// Position on the real line in native units (days, microseconds, ...).
    fn native(self) -> f64;

    /// Inverse of [`SpanBound::native`], rounding discrete domains.
    fn from_native(v: f64) -> Result<Self>;

    fn delta_native(delta: Self::Delta) -> f64;

    fn is_valid(&self) -> bool {
        true
    }

    fn parse_bound(text: &str) -> Result<Self>;

    fn format_bound(&self, maxdd: usize) -> String;

    fn write_bound(&self, w: &mut WkbWriter);

    fn read_bound(r: &mut WkbReader<'_>) -> Result<Self>;
}

fn out_of_range(what: &str) -> ChronotopeError {
    ChronotopeError::OutOfRange(format!("{} out of range", what))
}

fn rounded_in(v: f64, min: f64, max: f64, what: &str) -> Result<f64> {
    let r = v.round();
    if !r.is_finite() || r < min || r > max {
        return Err(out_of_range(what));
    }
    Ok(r)
}

impl SpanBound for i32 {
    type Delta = i32;

    const BASE_TYPE: TypeTag = TypeTag::Int4;
    const SET_TYPE: TypeTag = TypeTag::IntSet;
    const SPAN_TYPE: TypeTag = TypeTag::IntSpan;
    const SPANSET_TYPE: TypeTag = TypeTag::IntSpanSet;
    const DISCRETE: bool = true;

    fn bound_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn successor(self) -> Result<Self> {
        self.checked_add(1).ok_or_else(|| out_of_range("Integer"))
    }

    fn add_delta(self, delta: i32) -> Result<Self> {
        self.checked_add(delta).ok_or_else(|| out_of_range("Integer"))
    }

    fn delta(self, earlier: Self) -> Result<i32> {
        self.checked_sub(earlier)
            .ok_or_else(|| out_of_range("Integer difference"))
    }

    fn native(self) -> f64 {
        f64::from(self)
    }

    fn from_native(v: f64) -> Result<Self> {
        Ok(rounded_in(v, f64::from(i32::MIN), f64::from(i32::MAX), "Integer")? as i32)
    }

    fn delta_native(delta: i32) -> f64 {
        f64::from(delta)
    }

    fn parse_bound(text: &str) -> Result<Self> {
        text.parse::<i32>()
            .map_err(|_| ChronotopeError::TextInput(format!("Invalid integer '{}'", text)))
    }

    fn format_bound(&self, _maxdd: usize) -> String {
        self.to_string()
    }

    fn write_bound(&self, w: &mut WkbWriter) {
        w.put_i32(*self);
    }

    fn read_bound(r: &mut WkbReader<'_>) -> Result<Self> {
        r.get_i32()
    }
}

impl SpanBound for i64 {
    type Delta = i64;

    const BASE_TYPE: TypeTag = TypeTag::Int8;
    const SET_TYPE: TypeTag = TypeTag::BigintSet;
    const SPAN_TYPE: TypeTag = TypeTag::BigintSpan;
    const SPANSET_TYPE: TypeTag = TypeTag::BigintSpanSet;
    const DISCRETE: bool = true;

    fn bound_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn successor(self) -> Result<Self> {
        self.checked_add(1).ok_or_else(|| out_of_range("Bigint"))
    }

    fn add_delta(self, delta: i64) -> Result<Self> {
        self.checked_add(delta).ok_or_else(|| out_of_range("Bigint"))
    }

    fn delta(self, earlier: Self) -> Result<i64> {
        self.checked_sub(earlier)
            .ok_or_else(|| out_of_range("Bigint difference"))
    }

    fn native(self) -> f64 {
        self as f64
    }

    fn from_native(v: f64) -> Result<Self> {
        Ok(rounded_in(v, i64::MIN as f64, i64::MAX as f64, "Bigint")? as i64)
    }

    fn delta_native(delta: i64) -> f64 {
        delta as f64
    }

    fn parse_bound(text: &str) -> Result<Self> {
        text.parse::<i64>()
            .map_err(|_| ChronotopeError::TextInput(format!("Invalid bigint '{}'", text)))
    }

    fn format_bound(&self, _maxdd: usize) -> String {
        self.to_string()
    }

    fn write_bound(&self, w: &mut WkbWriter) {
        w.put_i64(*self);
    }

    fn read_bound(r: &mut WkbReader<'_>) -> Result<Self> {
        r.get_i64()
    }
}

impl SpanBound for f64 {
    type Delta = f64;

    const BASE_TYPE: TypeTag = TypeTag::Float8;
    const SET_TYPE: TypeTag = TypeTag::FloatSet;
    const SPAN_TYPE: TypeTag = TypeTag::FloatSpan;
    const SPANSET_TYPE: TypeTag = TypeTag::FloatSpanSet;
    const DISCRETE: bool = false;

    fn bound_cmp(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }

    fn successor(self) -> Result<Self> {
        Ok(self)
    }

    fn add_delta(self, delta: f64) -> Result<Self> {
        Ok(self + delta)
    }

    fn delta(self, earlier: Self) -> Result<f64> {
        Ok(self - earlier)
    }

    fn native(self) -> f64 {
        self
    }

    fn from_native(v: f64) -> Result<Self> {
        Ok(v)
    }

    fn delta_native(delta: f64) -> f64 {
        delta
    }

    fn is_valid(&self) -> bool {
        !self.is_nan()
    }

    fn parse_bound(text: &str) -> Result<Self> {
        parse_float(text)
    }

    fn format_bound(&self, maxdd: usize) -> String {
        format_float(*self, maxdd)
    }

    fn write_bound(&self, w: &mut WkbWriter) {
        w.put_f64(*self);
    }

    fn read_bound(r: &mut WkbReader<'_>) -> Result<Self> {
        r.get_f64()
    }
}

impl SpanBound for Date {
    type Delta = i32;

    const BASE_TYPE: TypeTag = TypeTag::Date;
    const SET_TYPE: TypeTag = TypeTag::DateSet;
    const SPAN_TYPE: TypeTag = TypeTag::DateSpan;
    const SPANSET_TYPE: TypeTag = TypeTag::DateSpanSet;
    const DISCRETE: bool = true;

    fn bound_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn successor(self) -> Result<Self> {
        self.days()
            .checked_add(1)
            .map(Date::from_days)
            .ok_or_else(|| out_of_range("Date"))
    }

    fn add_delta(self, delta: i32) -> Result<Self> {
        self.days()
            .checked_add(delta)
            .map(Date::from_days)
            .ok_or_else(|| out_of_range("Date"))
    }

    fn delta(self, earlier: Self) -> Result<i32> {
        self.days()
            .checked_sub(earlier.days())
            .ok_or_else(|| out_of_range("Date difference"))
    }

    fn native(self) -> f64 {
        f64::from(self.days())
    }

    fn from_native(v: f64) -> Result<Self> {
        let days = rounded_in(v, f64::from(i32::MIN), f64::from(i32::MAX), "Date")?;
        Ok(Date::from_days(days as i32))
    }

    fn delta_native(delta: i32) -> f64 {
        f64::from(delta)
    }

    fn parse_bound(text: &str) -> Result<Self> {
        Date::parse(text)
    }

    fn format_bound(&self, _maxdd: usize) -> String {
        self.to_string()
    }

    fn write_bound(&self, w: &mut WkbWriter) {
        w.put_i32(self.days());
    }

    fn read_bound(r: &mut WkbReader<'_>) -> Result<Self> {
        Ok(Date::from_days(r.get_i32()?))
    }
}

impl SpanBound for TimestampTz {
    type Delta = Interval;

    const BASE_TYPE: TypeTag = TypeTag::TimestampTz;
    const SET_TYPE: TypeTag = TypeTag::TstzSet;
    const SPAN_TYPE: TypeTag = TypeTag::TstzSpan;
    const SPANSET_TYPE: TypeTag = TypeTag::TstzSpanSet;
    const DISCRETE: bool = false;
    /// Time distances are reported in seconds.
    const DISTANCE_UNIT: f64 = 1e-6;

    fn bound_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn successor(self) -> Result<Self> {
        Ok(self)
    }

    fn add_delta(self, delta: Interval) -> Result<Self> {
        self.checked_add(delta)
    }

    fn delta(self, earlier: Self) -> Result<Interval> {
        self.micros()
            .checked_sub(earlier.micros())
            .map(Interval::microseconds)
            .ok_or_else(|| out_of_range("Interval"))
    }

    fn native(self) -> f64 {
        self.micros() as f64
    }

    fn from_native(v: f64) -> Result<Self> {
        let micros = rounded_in(v, i64::MIN as f64, i64::MAX as f64, "Timestamp")?;
        Ok(TimestampTz::from_micros(micros as i64))
    }

    fn delta_native(delta: Interval) -> f64 {
        delta
            .num_microseconds()
            .map(|m| m as f64)
            .unwrap_or(delta.num_days() as f64 * USECS_PER_DAY as f64)
    }

    fn parse_bound(text: &str) -> Result<Self> {
        TimestampTz::parse(text.trim_matches('"'))
    }

    fn format_bound(&self, _maxdd: usize) -> String {
        self.to_string()
    }

    fn write_bound(&self, w: &mut WkbWriter) {
        w.put_i64(self.micros());
    }

    fn read_bound(r: &mut WkbReader<'_>) -> Result<Self> {
        Ok(TimestampTz::from_micros(r.get_i64()?))
    }
}
