use super::{TemporalBox, cmp_periods, expand_period};
use crate::config::DEFAULT_FLOAT_DIGITS;
use crate::error::{ChronotopeError, ReportExt, Result};
use crate::span::{Bound, FloatSpan, Span, TstzSpan};
use crate::types::TimestampTz;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A value span and/or a time span.
///
/// Bounds the values of a temporal number over its period. Integer values are
/// widened to floats.
///
/// # Examples
///
/// ```
/// use chronotope::boxes::TBox;
///
/// let b: TBox = "TBOX X([1, 5])".parse().unwrap();
/// assert_eq!(b.xmin(), Some(1.0));
/// assert!(!b.has_t());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TBox {
    span: Option<FloatSpan>,
    period: Option<TstzSpan>,
}

impl TBox {
    /// Build a box with at least one dimension.
    pub fn new(span: Option<FloatSpan>, period: Option<TstzSpan>) -> Result<Self> {
        if span.is_none() && period.is_none() {
            return Err(ChronotopeError::InvalidArg(
                "A temporal box needs a value or a time dimension".to_string(),
            ))
            .reported();
        }
        Ok(Self { span, period })
    }

    /// Box of a single value at a single instant.
    pub fn from_value_time(value: f64, t: TimestampTz) -> Self {
        Self {
            span: Some(Span::from_bounds(Bound::at(value), Bound::at(value))),
            period: Some(TstzSpan::singleton(t)),
        }
    }

    pub fn from_span(span: FloatSpan) -> Self {
        Self {
            span: Some(span),
            period: None,
        }
    }

    pub fn from_period(period: TstzSpan) -> Self {
        Self {
            span: None,
            period: Some(period),
        }
    }

    pub fn from_span_period(span: FloatSpan, period: TstzSpan) -> Self {
        Self {
            span: Some(span),
            period: Some(period),
        }
    }

    pub fn span(&self) -> Option<&FloatSpan> {
        self.span.as_ref()
    }

    pub fn period(&self) -> Option<&TstzSpan> {
        self.period.as_ref()
    }

    pub fn has_x(&self) -> bool {
        self.span.is_some()
    }

    pub fn has_t(&self) -> bool {
        self.period.is_some()
    }

    pub fn xmin(&self) -> Option<f64> {
        self.span.map(|s| s.lower())
    }

    pub fn xmax(&self) -> Option<f64> {
        self.span.map(|s| s.upper())
    }

    pub fn tmin(&self) -> Option<TimestampTz> {
        self.period.map(|p| p.lower())
    }

    pub fn tmax(&self) -> Option<TimestampTz> {
        self.period.map(|p| p.upper())
    }

    pub fn expand(&mut self, other: &TBox) {
        match (self.span.as_mut(), &other.span) {
            (Some(s), Some(o)) => s.expand(o),
            (None, Some(o)) => self.span = Some(*o),
            _ => {}
        }
        expand_period(&mut self.period, &other.period);
    }

    fn check_same_dims(&self, other: &TBox) -> Result<()> {
        if self.has_x() != other.has_x() || self.has_t() != other.has_t() {
            return Err(ChronotopeError::InvalidArg(
                "The boxes must have the same dimensions".to_string(),
            ));
        }
        Ok(())
    }

    fn check_common_dim(&self, other: &TBox) -> Result<()> {
        if (self.has_x() && other.has_x()) || (self.has_t() && other.has_t()) {
            Ok(())
        } else {
            Err(ChronotopeError::InvalidArg(
                "The boxes must share at least one dimension".to_string(),
            ))
        }
    }

    /// Smallest box covering both; the boxes must have the same dimensions.
    pub fn union(&self, other: &TBox) -> Result<TBox> {
        self.check_same_dims(other)?;
        let mut result = self.clone();
        result.expand(other);
        Ok(result)
    }

    /// Common part on the shared dimensions, `None` when disjoint.
    pub fn intersection(&self, other: &TBox) -> Result<Option<TBox>> {
        self.check_common_dim(other)?;
        let span = match (&self.span, &other.span) {
            (Some(a), Some(b)) => match a.intersection(b) {
                Some(s) => Some(s),
                None => return Ok(None),
            },
            _ => None,
        };
        let period = match (&self.period, &other.period) {
            (Some(a), Some(b)) => match a.intersection(b) {
                Some(p) => Some(p),
                None => return Ok(None),
            },
            _ => None,
        };
        Ok(Some(TBox { span, period }))
    }

    fn both<T>(a: &Option<T>, b: &Option<T>, what: &str) -> Result<(T, T)>
    where
        T: Copy,
    {
        match (a, b) {
            (Some(a), Some(b)) => Ok((*a, *b)),
            _ => Err(ChronotopeError::InvalidArg(format!(
                "The boxes must have a {} dimension",
                what
            ))),
        }
    }

    pub fn overlaps(&self, other: &TBox) -> Result<bool> {
        self.check_common_dim(other)?;
        Ok(self.overlaps_box(other))
    }

    pub fn contains(&self, other: &TBox) -> Result<bool> {
        self.check_common_dim(other)?;
        let x = match (&self.span, &other.span) {
            (Some(a), Some(b)) => a.contains(b),
            _ => true,
        };
        let t = match (&self.period, &other.period) {
            (Some(a), Some(b)) => a.contains(b),
            _ => true,
        };
        Ok(x && t)
    }

    pub fn contained(&self, other: &TBox) -> Result<bool> {
        other.contains(self)
    }

    pub fn same(&self, other: &TBox) -> Result<bool> {
        self.check_common_dim(other)?;
        let x = match (&self.span, &other.span) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        };
        let t = match (&self.period, &other.period) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        };
        Ok(x && t)
    }

    pub fn left(&self, other: &TBox) -> Result<bool> {
        let (a, b) = Self::both(&self.span, &other.span, "value")?;
        Ok(a.left(&b))
    }

    pub fn overleft(&self, other: &TBox) -> Result<bool> {
        let (a, b) = Self::both(&self.span, &other.span, "value")?;
        Ok(a.overleft(&b))
    }

    pub fn right(&self, other: &TBox) -> Result<bool> {
        let (a, b) = Self::both(&self.span, &other.span, "value")?;
        Ok(a.right(&b))
    }

    pub fn overright(&self, other: &TBox) -> Result<bool> {
        let (a, b) = Self::both(&self.span, &other.span, "value")?;
        Ok(a.overright(&b))
    }

    pub fn before(&self, other: &TBox) -> Result<bool> {
        let (a, b) = Self::both(&self.period, &other.period, "time")?;
        Ok(a.left(&b))
    }

    pub fn overbefore(&self, other: &TBox) -> Result<bool> {
        let (a, b) = Self::both(&self.period, &other.period, "time")?;
        Ok(a.overleft(&b))
    }

    pub fn after(&self, other: &TBox) -> Result<bool> {
        let (a, b) = Self::both(&self.period, &other.period, "time")?;
        Ok(a.right(&b))
    }

    pub fn overafter(&self, other: &TBox) -> Result<bool> {
        let (a, b) = Self::both(&self.period, &other.period, "time")?;
        Ok(a.overright(&b))
    }

    pub fn to_text(&self, maxdd: usize) -> String {
        match (&self.span, &self.period) {
            (Some(s), Some(p)) => format!("TBOX XT({},{})", s.to_text(maxdd), p),
            (Some(s), None) => format!("TBOX X({})", s.to_text(maxdd)),
            (None, Some(p)) => format!("TBOX T({})", p),
            (None, None) => "TBOX()".to_string(),
        }
    }

    /// Parse `TBOX XT(span,period)`, `TBOX X(span)` or `TBOX T(period)`.
    pub fn parse(input: &str) -> Result<Self> {
        Self::parse_inner(input).reported()
    }

    fn parse_inner(input: &str) -> Result<Self> {
        let err = || ChronotopeError::TextInput(format!("Could not parse temporal box '{}'", input));
        let text = input.trim();
        if text.len() < 4 || !text[..4].eq_ignore_ascii_case("TBOX") {
            return Err(err());
        }
        let rest = text[4..].trim_start();
        let open = rest.find('(').ok_or_else(err)?;
        let dims = rest[..open].trim().to_ascii_uppercase();
        let inner = rest[open + 1..].strip_suffix(')').ok_or_else(err)?.trim();
        match dims.as_str() {
            "XT" => {
                let split = inner
                    .find([']', ')'])
                    .map(|i| i + 1)
                    .ok_or_else(err)?;
                let span = Span::parse_inner(&inner[..split])?;
                let period = inner[split..].trim_start().strip_prefix(',').ok_or_else(err)?;
                Ok(Self::from_span_period(span, Span::parse_inner(period)?))
            }
            "X" => Ok(Self::from_span(Span::parse_inner(inner)?)),
            "T" => Ok(Self::from_period(Span::parse_inner(inner)?)),
            _ => Err(err()),
        }
    }
}

impl TemporalBox for TBox {
    fn period(&self) -> Option<TstzSpan> {
        self.period
    }

    fn set_period(&mut self, period: TstzSpan) {
        self.period = Some(period);
    }

    fn expand(&mut self, other: &Self) {
        TBox::expand(self, other)
    }

    fn overlaps_box(&self, other: &Self) -> bool {
        let x = match (&self.span, &other.span) {
            (Some(a), Some(b)) => a.overlaps(b),
            _ => true,
        };
        let t = match (&self.period, &other.period) {
            (Some(a), Some(b)) => a.overlaps(b),
            _ => true,
        };
        x && t
    }

    fn box_cmp(&self, other: &Self) -> Ordering {
        cmp_periods(&self.period, &other.period).then_with(|| match (&self.span, &other.span) {
            (Some(a), Some(b)) => a.cmp_span(b),
            (a, b) => a.is_some().cmp(&b.is_some()),
        })
    }
}

impl fmt::Display for TBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text(DEFAULT_FLOAT_DIGITS))
    }
}

impl FromStr for TBox {
    type Err = ChronotopeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
