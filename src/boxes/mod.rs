//! Bounding boxes cached by temporal values.
//!
//! Temporal booleans and texts are bounded by their period, temporal numbers
//! by a [`TBox`] and temporal points by an [`STBox`]. Boxes are safe
//! over-approximations: operations between temporal values test their
//! boxes first and only fall back to per-instant work when the boxes
//! overlap.

mod stbox;
mod tbox;

pub use stbox::STBox;
pub(crate) use stbox::STBoxParts;
pub use tbox::TBox;

use crate::span::{Span, TstzSpan};
use std::cmp::Ordering;
use std::fmt;

/// Capabilities shared by every bounding box type.
pub trait TemporalBox: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// Time extent of the box.
    fn period(&self) -> Option<TstzSpan>;

    /// Replace the time extent, keeping the other dimensions.
    fn set_period(&mut self, period: TstzSpan);

    /// Grow in place to cover `other`.
    fn expand(&mut self, other: &Self);

    /// Whether the boxes intersect on every dimension they share.
    fn overlaps_box(&self, other: &Self) -> bool;

    fn box_cmp(&self, other: &Self) -> Ordering;
}

impl TemporalBox for TstzSpan {
    fn period(&self) -> Option<TstzSpan> {
        Some(*self)
    }

    fn set_period(&mut self, period: TstzSpan) {
        *self = period;
    }

    fn expand(&mut self, other: &Self) {
        Span::expand(self, other)
    }

    fn overlaps_box(&self, other: &Self) -> bool {
        self.overlaps(other)
    }

    fn box_cmp(&self, other: &Self) -> Ordering {
        self.cmp_span(other)
    }
}

/// Order optional periods, absent first.
pub(crate) fn cmp_periods(a: &Option<TstzSpan>, b: &Option<TstzSpan>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp_span(b),
        (a, b) => a.is_some().cmp(&b.is_some()),
    }
}

/// Expand an optional period in place.
pub(crate) fn expand_period(target: &mut Option<TstzSpan>, other: &Option<TstzSpan>) {
    match (target.as_mut(), other) {
        (Some(t), Some(o)) => t.expand(o),
        (None, Some(o)) => *target = Some(*o),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TimestampTz;

    #[test]
    fn test_period_box() {
        let t1 = TimestampTz::from_micros(0);
        let t2 = TimestampTz::from_micros(10);
        let mut b = TstzSpan::singleton(t1);
        TemporalBox::expand(&mut b, &TstzSpan::singleton(t2));
        assert_eq!(b.lower(), t1);
        assert_eq!(b.upper(), t2);
        assert!(b.overlaps_box(&TstzSpan::singleton(t2)));
        assert_eq!(b.period(), Some(b));
    }
}
