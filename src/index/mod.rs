//! Range index over bounding boxes.
//!
//! Boxes of one domain (spans, [`TBox`] or [`STBox`]) are projected on four
//! f64 axes and stored in an R-tree together with an integer id. A query
//! returns the ids of the stored boxes overlapping the query box.

mod rtree;

pub use rtree::RTreeIndex;

use crate::boxes::{STBox, TBox, TemporalBox};
use crate::span::{Span, SpanBound};
use std::fmt;

/// Number of envelope axes: value or x, y, z, and time.
pub const AXES: usize = 4;

/// Extent of a box on each envelope axis, `None` for absent dimensions.
pub type Axes = [Option<(f64, f64)>; AXES];

/// Boxes that can be stored in an [`RTreeIndex`].
pub trait IndexBox: Clone + fmt::Debug + Send + Sync + 'static {
    /// Projection on the envelope axes. It must cover the box.
    fn axes(&self) -> Axes;

    /// Exact overlap on the dimensions both boxes have.
    fn index_overlaps(&self, other: &Self) -> bool;
}

impl<T: SpanBound> IndexBox for Span<T> {
    fn axes(&self) -> Axes {
        [
            Some((self.lower().native(), self.upper().native())),
            None,
            None,
            None,
        ]
    }

    fn index_overlaps(&self, other: &Self) -> bool {
        self.overlaps(other)
    }
}

fn time_axis(period: Option<&crate::span::TstzSpan>) -> Option<(f64, f64)> {
    period.map(|p| (p.lower().native(), p.upper().native()))
}

impl IndexBox for TBox {
    fn axes(&self) -> Axes {
        [
            self.span().map(|s| (s.lower(), s.upper())),
            None,
            None,
            time_axis(self.period()),
        ]
    }

    fn index_overlaps(&self, other: &Self) -> bool {
        self.overlaps_box(other)
    }
}

impl IndexBox for STBox {
    fn axes(&self) -> Axes {
        let (x, y) = if self.has_x() {
            (
                Some((self.xmin(), self.xmax())),
                Some((self.ymin(), self.ymax())),
            )
        } else {
            (None, None)
        };
        let z = self.zmin().zip(self.zmax());
        [x, y, z, time_axis(self.period())]
    }

    fn index_overlaps(&self, other: &Self) -> bool {
        self.srid() == other.srid() && self.overlaps_box(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::TstzSpan;

    #[test]
    fn test_span_axes() {
        let span: Span<i32> = "[3, 7)".parse().unwrap();
        assert_eq!(span.axes(), [Some((3.0, 7.0)), None, None, None]);
    }

    #[test]
    fn test_box_axes() {
        let period: TstzSpan = "[2000-01-01, 2000-01-02]".parse().unwrap();
        let tbox = TBox::from_period(period);
        let axes = tbox.axes();
        assert!(axes[0].is_none());
        assert_eq!(axes[3], Some((period.lower().native(), period.upper().native())));

        let stbox = STBox::new_xyz([0.0, 1.0, 2.0], [3.0, 4.0, 5.0], 0).unwrap();
        assert_eq!(stbox.axes(), [Some((0.0, 3.0)), Some((1.0, 4.0)), Some((2.0, 5.0)), None]);
    }
}
