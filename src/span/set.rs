use super::{Span, SpanBound, SpanSet};
use crate::config::DEFAULT_FLOAT_DIGITS;
use crate::error::{ChronotopeError, ReportExt, Result};
use crate::parse::{split_top_level, strip_braces};
use std::fmt;
use std::str::FromStr;

/// An ordered set of distinct values.
#[derive(Debug, Clone, PartialEq)]
pub struct Set<T> {
    values: Vec<T>,
}

impl<T: SpanBound> Set<T> {
    /// Sort and deduplicate `values`; fails on empty input.
    pub fn new(values: Vec<T>) -> Result<Self> {
        Self::new_inner(values).reported()
    }

    pub(crate) fn new_inner(mut values: Vec<T>) -> Result<Self> {
        if values.is_empty() {
            return Err(ChronotopeError::InvalidArgValue(
                "A set needs at least one value".to_string(),
            ));
        }
        if values.iter().any(|v| !v.is_valid()) {
            return Err(ChronotopeError::InvalidArgValue(
                "Set values cannot be NaN".to_string(),
            ));
        }
        values.sort_by(|a, b| a.bound_cmp(b));
        values.dedup_by(|a, b| a.bound_cmp(b).is_eq());
        Ok(Self { values })
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn num_values(&self) -> usize {
        self.values.len()
    }

    pub fn value_n(&self, n: usize) -> Option<T> {
        self.values.get(n).copied()
    }

    pub fn start_value(&self) -> T {
        self.values[0]
    }

    pub fn end_value(&self) -> T {
        self.values[self.values.len() - 1]
    }

    pub fn contains(&self, value: T) -> bool {
        self.values
            .binary_search_by(|v| v.bound_cmp(&value))
            .is_ok()
    }

    /// Bounding span.
    pub fn to_span(&self) -> Result<Span<T>> {
        Span::new(self.start_value(), self.end_value(), true, true)
    }

    /// One point span per value.
    pub fn to_spanset(&self) -> Result<SpanSet<T>> {
        let spans = self
            .values
            .iter()
            .map(|v| Span::point(*v))
            .collect::<Result<Vec<_>>>()?;
        SpanSet::new(spans)
    }

    pub fn shift(&self, delta: T::Delta) -> Result<Self> {
        let values = self
            .values
            .iter()
            .map(|v| v.add_delta(delta))
            .collect::<Result<Vec<_>>>()?;
        Self::new(values)
    }

    pub fn to_text(&self, maxdd: usize) -> String {
        let parts: Vec<String> = self.values.iter().map(|v| v.format_bound(maxdd)).collect();
        format!("{{{}}}", parts.join(", "))
    }

    pub fn parse(input: &str) -> Result<Self> {
        let parse = || -> Result<Self> {
            let inner = strip_braces(input, "set")?;
            let values = split_top_level(inner)?
                .into_iter()
                .map(T::parse_bound)
                .collect::<Result<Vec<_>>>()?;
            Self::new_inner(values)
        };
        parse().reported()
    }
}

impl<T: SpanBound> fmt::Display for Set<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text(DEFAULT_FLOAT_DIGITS))
    }
}

impl<T: SpanBound> FromStr for Set<T> {
    type Err = ChronotopeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
