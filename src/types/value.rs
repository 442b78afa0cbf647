//! Base values carried by temporal values.
//!
//! [`BaseValue`] covers parsing, printing, ordering and binary encoding of a
//! base type. [`TemporalValue`] adds what the temporal algebra needs: the
//! bounding box of an instant and, for continuous types, interpolation.

use crate::boxes::{STBox, TBox, TemporalBox};
use crate::error::{ChronotopeError, Result};
use crate::span::TstzSpan;
use crate::types::catalog::TypeTag;
use crate::types::point::GeoPoint;
use crate::types::time::TimestampTz;
use crate::wkb::{WkbReader, WkbWriter};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Tolerance used for collinearity and crossing tests.
pub const EPSILON: f64 = 1e-6;

/// Decoding context for values whose encoding depends on a header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueContext {
    pub srid: i32,
    pub has_z: bool,
}

/// A value that can be stored in spans, sets or temporal values.
pub trait BaseValue: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    const BASE_TYPE: TypeTag;

    /// Total order over values.
    fn value_cmp(&self, other: &Self) -> Ordering;

    fn parse_value(text: &str, ctx: &ValueContext) -> Result<Self>;

    fn format_value(&self, maxdd: usize) -> String;

    fn write_value(&self, w: &mut WkbWriter);

    fn read_value(r: &mut WkbReader<'_>, ctx: &ValueContext) -> Result<Self>;
}

/// A base value that can vary over time.
pub trait TemporalValue: BaseValue {
    /// Bounding box cached by temporal values of this type.
    type BBox: TemporalBox;

    const TEMPORAL_TYPE: TypeTag;

    /// Whether linear interpolation is defined.
    const CONTINUOUS: bool = false;

    fn instant_box(&self, t: TimestampTz) -> Self::BBox;

    /// Value at fraction `ratio` of a linear segment.
    fn interpolate(start: &Self, _end: &Self, _ratio: f64) -> Self {
        start.clone()
    }

    /// Whether `mid`, at fraction `ratio` between `start` and `end`, lies on
    /// the segment joining them.
    fn collinear(start: &Self, mid: &Self, end: &Self, _ratio: f64) -> bool {
        start == mid && mid == end
    }

    /// Fraction in `[0, 1]` at which a non-constant linear segment takes `value`.
    fn locate(_start: &Self, _end: &Self, _value: &Self) -> Option<f64> {
        None
    }

    /// Fraction in `(0, 1)` at which two synchronized linear segments meet.
    fn crossing(_start1: &Self, _end1: &Self, _start2: &Self, _end2: &Self) -> Option<f64> {
        None
    }

    /// Reject operands that cannot be combined, e.g. different SRIDs.
    fn check_compatible(&self, _other: &Self) -> Result<()> {
        Ok(())
    }

    /// Header information needed to decode values like this one.
    fn context(&self) -> ValueContext {
        ValueContext::default()
    }

    /// Distance used to split sequences on gaps, when the type has one.
    fn gap_distance(&self, _other: &Self) -> Option<f64> {
        None
    }
}

/// Temporal values with a distance between base values.
pub trait MetricValue: TemporalValue {
    fn distance(&self, other: &Self) -> f64;

    /// Fraction in `(0, 1)` at which two synchronized linear segments are
    /// closest.
    fn closest_approach(start1: &Self, end1: &Self, start2: &Self, end2: &Self) -> Option<f64>;
}

/// Integer and float base values.
pub trait NumericValue: TemporalValue<BBox = TBox> + MetricValue + Copy + PartialOrd {
    fn zero() -> Self;

    fn to_f64(self) -> f64;

    /// Convert back, rounding and range checking for integers.
    fn from_f64(v: f64) -> Result<Self>;

    fn checked_add(self, other: Self) -> Result<Self>;

    fn checked_sub(self, other: Self) -> Result<Self>;

    fn checked_mul(self, other: Self) -> Result<Self>;

    fn checked_div(self, other: Self) -> Result<Self>;
}

/// Print `v` with at most `maxdd` decimals and no trailing zeros.
pub fn format_float(v: f64, maxdd: usize) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let mut s = format!("{:.*}", maxdd, v);
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

pub(crate) fn parse_float(text: &str) -> Result<f64> {
    let t = text.trim();
    match t.to_ascii_lowercase().as_str() {
        "infinity" | "inf" => return Ok(f64::INFINITY),
        "-infinity" | "-inf" => return Ok(f64::NEG_INFINITY),
        _ => {}
    }
    t.parse::<f64>()
        .map_err(|_| ChronotopeError::TextInput(format!("Invalid float '{}'", t)))
}

fn float_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}

/// Root in `(0, 1)` of `d0 + r * (d1 - d0)`.
fn linear_root(d0: f64, d1: f64) -> Option<f64> {
    if d0 == d1 || d0 * d1 > 0.0 {
        return None;
    }
    let r = d0 / (d0 - d1);
    (r > 0.0 && r < 1.0).then_some(r)
}

impl BaseValue for bool {
    const BASE_TYPE: TypeTag = TypeTag::Bool;

    fn value_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn parse_value(text: &str, _ctx: &ValueContext) -> Result<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "t" | "true" => Ok(true),
            "f" | "false" => Ok(false),
            other => Err(ChronotopeError::TextInput(format!(
                "Invalid boolean '{}'",
                other
            ))),
        }
    }

    fn format_value(&self, _maxdd: usize) -> String {
        if *self { "t" } else { "f" }.to_string()
    }

    fn write_value(&self, w: &mut WkbWriter) {
        w.put_u8(u8::from(*self));
    }

    fn read_value(r: &mut WkbReader<'_>, _ctx: &ValueContext) -> Result<Self> {
        match r.get_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ChronotopeError::WkbInput(format!(
                "Invalid boolean byte {}",
                other
            ))),
        }
    }
}

impl TemporalValue for bool {
    type BBox = TstzSpan;
    const TEMPORAL_TYPE: TypeTag = TypeTag::TBool;

    fn instant_box(&self, t: TimestampTz) -> TstzSpan {
        TstzSpan::singleton(t)
    }
}

impl BaseValue for i32 {
    const BASE_TYPE: TypeTag = TypeTag::Int4;

    fn value_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn parse_value(text: &str, _ctx: &ValueContext) -> Result<Self> {
        text.trim()
            .parse::<i32>()
            .map_err(|_| ChronotopeError::TextInput(format!("Invalid integer '{}'", text.trim())))
    }

    fn format_value(&self, _maxdd: usize) -> String {
        self.to_string()
    }

    fn write_value(&self, w: &mut WkbWriter) {
        w.put_i32(*self);
    }

    fn read_value(r: &mut WkbReader<'_>, _ctx: &ValueContext) -> Result<Self> {
        r.get_i32()
    }
}

impl TemporalValue for i32 {
    type BBox = TBox;
    const TEMPORAL_TYPE: TypeTag = TypeTag::TInt;

    fn instant_box(&self, t: TimestampTz) -> TBox {
        TBox::from_value_time(f64::from(*self), t)
    }

    fn gap_distance(&self, other: &Self) -> Option<f64> {
        Some(MetricValue::distance(self, other))
    }
}

impl MetricValue for i32 {
    fn distance(&self, other: &Self) -> f64 {
        (f64::from(*self) - f64::from(*other)).abs()
    }

    fn closest_approach(_: &Self, _: &Self, _: &Self, _: &Self) -> Option<f64> {
        None
    }
}

impl NumericValue for i32 {
    fn zero() -> Self {
        0
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn from_f64(v: f64) -> Result<Self> {
        let rounded = v.round();
        if !rounded.is_finite() || rounded < f64::from(i32::MIN) || rounded > f64::from(i32::MAX) {
            return Err(ChronotopeError::OutOfRange(format!(
                "Value {} does not fit in an integer",
                v
            )));
        }
        Ok(rounded as i32)
    }

    fn checked_add(self, other: Self) -> Result<Self> {
        i32::checked_add(self, other)
            .ok_or_else(|| ChronotopeError::OutOfRange("Integer overflow in addition".to_string()))
    }

    fn checked_sub(self, other: Self) -> Result<Self> {
        i32::checked_sub(self, other).ok_or_else(|| {
            ChronotopeError::OutOfRange("Integer overflow in subtraction".to_string())
        })
    }

    fn checked_mul(self, other: Self) -> Result<Self> {
        i32::checked_mul(self, other).ok_or_else(|| {
            ChronotopeError::OutOfRange("Integer overflow in multiplication".to_string())
        })
    }

    fn checked_div(self, other: Self) -> Result<Self> {
        if other == 0 {
            return Err(ChronotopeError::DivisionByZero);
        }
        i32::checked_div(self, other)
            .ok_or_else(|| ChronotopeError::OutOfRange("Integer overflow in division".to_string()))
    }
}

impl BaseValue for f64 {
    const BASE_TYPE: TypeTag = TypeTag::Float8;

    fn value_cmp(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }

    fn parse_value(text: &str, _ctx: &ValueContext) -> Result<Self> {
        parse_float(text)
    }

    fn format_value(&self, maxdd: usize) -> String {
        format_float(*self, maxdd)
    }

    fn write_value(&self, w: &mut WkbWriter) {
        w.put_f64(*self);
    }

    fn read_value(r: &mut WkbReader<'_>, _ctx: &ValueContext) -> Result<Self> {
        r.get_f64()
    }
}

impl TemporalValue for f64 {
    type BBox = TBox;
    const TEMPORAL_TYPE: TypeTag = TypeTag::TFloat;
    const CONTINUOUS: bool = true;

    fn instant_box(&self, t: TimestampTz) -> TBox {
        TBox::from_value_time(*self, t)
    }

    fn interpolate(start: &Self, end: &Self, ratio: f64) -> Self {
        start + (end - start) * ratio
    }

    fn collinear(start: &Self, mid: &Self, end: &Self, ratio: f64) -> bool {
        float_eq(*mid, Self::interpolate(start, end, ratio))
    }

    fn locate(start: &Self, end: &Self, value: &Self) -> Option<f64> {
        if start == end {
            return None;
        }
        let (lo, hi) = if start < end { (start, end) } else { (end, start) };
        if value < lo || value > hi {
            return None;
        }
        Some(((value - start) / (end - start)).clamp(0.0, 1.0))
    }

    fn crossing(start1: &Self, end1: &Self, start2: &Self, end2: &Self) -> Option<f64> {
        linear_root(start1 - start2, end1 - end2)
    }

    fn gap_distance(&self, other: &Self) -> Option<f64> {
        Some((self - other).abs())
    }
}

impl MetricValue for f64 {
    fn distance(&self, other: &Self) -> f64 {
        (self - other).abs()
    }

    fn closest_approach(start1: &Self, end1: &Self, start2: &Self, end2: &Self) -> Option<f64> {
        Self::crossing(start1, end1, start2, end2)
    }
}

impl NumericValue for f64 {
    fn zero() -> Self {
        0.0
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(v: f64) -> Result<Self> {
        Ok(v)
    }

    fn checked_add(self, other: Self) -> Result<Self> {
        Ok(self + other)
    }

    fn checked_sub(self, other: Self) -> Result<Self> {
        Ok(self - other)
    }

    fn checked_mul(self, other: Self) -> Result<Self> {
        Ok(self * other)
    }

    fn checked_div(self, other: Self) -> Result<Self> {
        if other == 0.0 {
            return Err(ChronotopeError::DivisionByZero);
        }
        Ok(self / other)
    }
}

impl BaseValue for String {
    const BASE_TYPE: TypeTag = TypeTag::Text;

    fn value_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn parse_value(text: &str, _ctx: &ValueContext) -> Result<Self> {
        let t = text.trim();
        match t.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
            Some(inner) => Ok(inner.replace("\\\"", "\"").replace("\\\\", "\\")),
            None if t.contains(['"', ',', '@', '{', '}', '[', ']']) => Err(
                ChronotopeError::TextInput(format!("Text value '{}' must be quoted", t)),
            ),
            None => Ok(t.to_string()),
        }
    }

    fn format_value(&self, _maxdd: usize) -> String {
        format!("\"{}\"", self.replace('\\', "\\\\").replace('"', "\\\""))
    }

    fn write_value(&self, w: &mut WkbWriter) {
        w.put_u64(self.len() as u64);
        w.put_slice(self.as_bytes());
    }

    fn read_value(r: &mut WkbReader<'_>, _ctx: &ValueContext) -> Result<Self> {
        let len = usize::try_from(r.get_u64()?)
            .map_err(|_| ChronotopeError::WkbInput("Text length too large".to_string()))?;
        let bytes = r.get_slice(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| ChronotopeError::WkbInput(format!("Invalid UTF-8 text: {}", e)))
    }
}

impl TemporalValue for String {
    type BBox = TstzSpan;
    const TEMPORAL_TYPE: TypeTag = TypeTag::TText;

    fn instant_box(&self, t: TimestampTz) -> TstzSpan {
        TstzSpan::singleton(t)
    }
}

impl BaseValue for GeoPoint {
    const BASE_TYPE: TypeTag = TypeTag::Geometry;

    fn value_cmp(&self, other: &Self) -> Ordering {
        self.x()
            .total_cmp(&other.x())
            .then_with(|| self.y().total_cmp(&other.y()))
            .then_with(|| match (self.z, other.z) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                (a, b) => a.is_some().cmp(&b.is_some()),
            })
            .then_with(|| self.srid.cmp(&other.srid))
    }

    fn parse_value(text: &str, ctx: &ValueContext) -> Result<Self> {
        let point = GeoPoint::parse(text)?;
        if point.srid == 0 {
            return Ok(point.with_srid(ctx.srid));
        }
        if ctx.srid != 0 && point.srid != ctx.srid {
            return Err(ChronotopeError::InvalidArg(format!(
                "Point SRID {} differs from SRID {}",
                point.srid, ctx.srid
            )));
        }
        Ok(point)
    }

    fn format_value(&self, maxdd: usize) -> String {
        self.to_text(maxdd)
    }

    fn write_value(&self, w: &mut WkbWriter) {
        w.put_f64(self.x());
        w.put_f64(self.y());
        if let Some(z) = self.z {
            w.put_f64(z);
        }
    }

    fn read_value(r: &mut WkbReader<'_>, ctx: &ValueContext) -> Result<Self> {
        let x = r.get_f64()?;
        let y = r.get_f64()?;
        let point = if ctx.has_z {
            GeoPoint::new_3d(x, y, r.get_f64()?)
        } else {
            GeoPoint::new(x, y)
        };
        Ok(point.with_srid(ctx.srid))
    }
}

impl TemporalValue for GeoPoint {
    type BBox = STBox;
    const TEMPORAL_TYPE: TypeTag = TypeTag::TGeomPoint;
    const CONTINUOUS: bool = true;

    fn instant_box(&self, t: TimestampTz) -> STBox {
        STBox::from_point_time(self, t)
    }

    fn interpolate(start: &Self, end: &Self, ratio: f64) -> Self {
        start.lerp(end, ratio)
    }

    fn collinear(start: &Self, mid: &Self, end: &Self, ratio: f64) -> bool {
        start.lerp(end, ratio).distance(mid) <= EPSILON
    }

    fn locate(start: &Self, end: &Self, value: &Self) -> Option<f64> {
        let (a, b, p) = (start.coords(), end.coords(), value.coords());
        let d: Vec<f64> = (0..3).map(|i| b[i] - a[i]).collect();
        let len2: f64 = d.iter().map(|v| v * v).sum();
        if len2 == 0.0 {
            return None;
        }
        let r = (0..3).map(|i| (p[i] - a[i]) * d[i]).sum::<f64>() / len2;
        if !(-EPSILON..=1.0 + EPSILON).contains(&r) {
            return None;
        }
        let r = r.clamp(0.0, 1.0);
        (start.lerp(end, r).distance(value) <= EPSILON).then_some(r)
    }

    fn crossing(start1: &Self, end1: &Self, start2: &Self, end2: &Self) -> Option<f64> {
        let r = Self::closest_approach(start1, end1, start2, end2)?;
        (start1.lerp(end1, r).distance(&start2.lerp(end2, r)) <= EPSILON).then_some(r)
    }

    fn check_compatible(&self, other: &Self) -> Result<()> {
        if self.srid != other.srid {
            return Err(ChronotopeError::InvalidArg(format!(
                "Operation on mixed SRID {} and {}",
                self.srid, other.srid
            )));
        }
        if self.has_z() != other.has_z() {
            return Err(ChronotopeError::InvalidArg(
                "Operation on mixed 2D/3D dimensions".to_string(),
            ));
        }
        Ok(())
    }

    fn context(&self) -> ValueContext {
        ValueContext {
            srid: self.srid,
            has_z: self.has_z(),
        }
    }

    fn gap_distance(&self, other: &Self) -> Option<f64> {
        Some(self.distance(other))
    }
}

impl MetricValue for GeoPoint {
    fn distance(&self, other: &Self) -> f64 {
        GeoPoint::distance(self, other)
    }

    fn closest_approach(start1: &Self, end1: &Self, start2: &Self, end2: &Self) -> Option<f64> {
        let (a1, b1, a2, b2) = (start1.coords(), end1.coords(), start2.coords(), end2.coords());
        // Relative position d(r) = d0 + r * dv; minimize |d(r)|.
        let d0: Vec<f64> = (0..3).map(|i| a1[i] - a2[i]).collect();
        let dv: Vec<f64> = (0..3).map(|i| (b1[i] - b2[i]) - d0[i]).collect();
        let denom: f64 = dv.iter().map(|v| v * v).sum();
        if denom == 0.0 {
            return None;
        }
        let r = -(0..3).map(|i| d0[i] * dv[i]).sum::<f64>() / denom;
        (r > 0.0 && r < 1.0).then_some(r)
    }
}

/// Pair of floats accumulated by temporal averages.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Double2 {
    pub a: f64,
    pub b: f64,
}

impl Double2 {
    pub fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }
}

impl BaseValue for Double2 {
    const BASE_TYPE: TypeTag = TypeTag::Double2;

    fn value_cmp(&self, other: &Self) -> Ordering {
        self.a
            .total_cmp(&other.a)
            .then_with(|| self.b.total_cmp(&other.b))
    }

    fn parse_value(text: &str, _ctx: &ValueContext) -> Result<Self> {
        let inner = text
            .trim()
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .ok_or_else(|| ChronotopeError::TextInput(format!("Invalid double2 '{}'", text)))?;
        let (a, b) = inner
            .split_once(',')
            .ok_or_else(|| ChronotopeError::TextInput(format!("Invalid double2 '{}'", text)))?;
        Ok(Self::new(parse_float(a)?, parse_float(b)?))
    }

    fn format_value(&self, maxdd: usize) -> String {
        format!(
            "({}, {})",
            format_float(self.a, maxdd),
            format_float(self.b, maxdd)
        )
    }

    fn write_value(&self, w: &mut WkbWriter) {
        w.put_f64(self.a);
        w.put_f64(self.b);
    }

    fn read_value(r: &mut WkbReader<'_>, _ctx: &ValueContext) -> Result<Self> {
        Ok(Self::new(r.get_f64()?, r.get_f64()?))
    }
}

impl TemporalValue for Double2 {
    type BBox = TstzSpan;
    const TEMPORAL_TYPE: TypeTag = TypeTag::TDouble2;
    const CONTINUOUS: bool = true;

    fn instant_box(&self, t: TimestampTz) -> TstzSpan {
        TstzSpan::singleton(t)
    }

    fn interpolate(start: &Self, end: &Self, ratio: f64) -> Self {
        Self::new(
            start.a + (end.a - start.a) * ratio,
            start.b + (end.b - start.b) * ratio,
        )
    }

    fn collinear(start: &Self, mid: &Self, end: &Self, ratio: f64) -> bool {
        let expected = Self::interpolate(start, end, ratio);
        float_eq(mid.a, expected.a) && float_eq(mid.b, expected.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(1.0, 15), "1");
        assert_eq!(format_float(1.25, 15), "1.25");
        assert_eq!(format_float(2.0 / 3.0, 3), "0.667");
        assert_eq!(format_float(-0.0001, 2), "0");
        assert_eq!(format_float(f64::INFINITY, 2), "Infinity");
    }

    #[test]
    fn test_bool_and_text_literals() {
        let ctx = ValueContext::default();
        assert!(bool::parse_value("T", &ctx).unwrap());
        assert!(!bool::parse_value("false", &ctx).unwrap());
        assert!(bool::parse_value("maybe", &ctx).is_err());

        let s = String::parse_value("\"a \\\"b\\\"\"", &ctx).unwrap();
        assert_eq!(s, "a \"b\"");
        assert_eq!(s.format_value(0), "\"a \\\"b\\\"\"");
        assert!(String::parse_value("a,b", &ctx).is_err());
    }

    #[test]
    fn test_float_interpolation() {
        assert_eq!(f64::interpolate(&1.0, &3.0, 0.5), 2.0);
        assert!(f64::collinear(&1.0, &2.0, &3.0, 0.5));
        assert!(!f64::collinear(&1.0, &2.5, &3.0, 0.5));
        assert_eq!(f64::locate(&0.0, &10.0, &2.5), Some(0.25));
        assert_eq!(f64::locate(&0.0, &10.0, &12.0), None);
        assert_eq!(f64::crossing(&0.0, &10.0, &10.0, &0.0), Some(0.5));
        assert_eq!(f64::crossing(&0.0, &1.0, &5.0, &6.0), None);
    }

    #[test]
    fn test_integer_arithmetic() {
        assert_eq!(NumericValue::checked_add(2, 3).unwrap(), 5);
        assert!(NumericValue::checked_add(i32::MAX, 1).is_err());
        assert_eq!(
            NumericValue::checked_div(1, 0),
            Err(ChronotopeError::DivisionByZero)
        );
        assert_eq!(<i32 as NumericValue>::from_f64(2.6).unwrap(), 3);
    }

    #[test]
    fn test_point_segments() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(10.0, 0.0);
        assert_eq!(GeoPoint::locate(&a, &b, &GeoPoint::new(5.0, 0.0)), Some(0.5));
        assert_eq!(GeoPoint::locate(&a, &b, &GeoPoint::new(5.0, 1.0)), None);

        // Two points moving towards each other along x meet halfway.
        let c = GeoPoint::new(10.0, 0.0);
        let d = GeoPoint::new(0.0, 0.0);
        assert_eq!(GeoPoint::crossing(&a, &b, &c, &d), Some(0.5));

        let e = GeoPoint::new(0.0, 1.0);
        let f = GeoPoint::new(10.0, 1.0);
        assert_eq!(GeoPoint::crossing(&a, &b, &e, &f), None);
    }

    #[test]
    fn test_point_compatibility() {
        let a = GeoPoint::new(0.0, 0.0).with_srid(4326);
        let b = GeoPoint::new(1.0, 1.0).with_srid(3857);
        assert!(matches!(
            a.check_compatible(&b),
            Err(ChronotopeError::InvalidArg(_))
        ));
        let c = GeoPoint::new_3d(1.0, 1.0, 1.0).with_srid(4326);
        assert!(a.check_compatible(&c).is_err());
    }
}
