//! R-tree backed box index.
//!
//! Every stored box is reduced to an axis-aligned envelope over the four
//! axes of [`Axes`]. Queries first collect the entries whose envelope
//! intersects the query envelope with `locate_in_envelope_intersecting`,
//! then keep those passing the exact box overlap test, so exclusive span
//! bounds and SRIDs are honored.

use super::{AXES, Axes, IndexBox};
use crate::error::{ChronotopeError, ReportExt, Result};
use rstar::{AABB, RTree, RTreeObject};

type Envelope = AABB<[f64; AXES]>;

/// Which axes are present.
type Dims = [bool; AXES];

fn dims_of(axes: &Axes) -> Dims {
    axes.map(|a| a.is_some())
}

/// Stored box with its id and envelope.
#[derive(Debug, Clone)]
struct IndexEntry<B> {
    id: i64,
    bbox: B,
    envelope: Envelope,
}

impl<B: IndexBox> RTreeObject for IndexEntry<B> {
    type Envelope = Envelope;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Stored envelopes collapse absent axes to zero; all boxes of an index
/// share the same axes.
fn stored_envelope(axes: &Axes) -> Envelope {
    let lower = axes.map(|a| a.map_or(0.0, |(lo, _)| lo));
    let upper = axes.map(|a| a.map_or(0.0, |(_, hi)| hi));
    AABB::from_corners(lower, upper)
}

fn is_finite(axes: &Axes) -> bool {
    axes.iter()
        .flatten()
        .all(|(lo, hi)| lo.is_finite() && hi.is_finite())
}

/// Bulk-built index of boxes of one domain.
///
/// ```
/// use chronotope::index::RTreeIndex;
/// use chronotope::span::Span;
///
/// let boxes: Vec<(Span<f64>, i64)> = vec![
///     ("[0, 10]".parse().unwrap(), 1),
///     ("[20, 30]".parse().unwrap(), 2),
/// ];
/// let index = RTreeIndex::bulk_load(boxes).unwrap();
/// assert_eq!(index.search(&"[5, 6]".parse().unwrap()), vec![1]);
/// ```
#[derive(Debug, Clone)]
pub struct RTreeIndex<B: IndexBox> {
    tree: RTree<IndexEntry<B>>,
    dims: Option<Dims>,
}

impl<B: IndexBox> Default for RTreeIndex<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: IndexBox> RTreeIndex<B> {
    pub fn new() -> Self {
        Self {
            tree: RTree::new(),
            dims: None,
        }
    }

    fn entry(&mut self, bbox: B, id: i64) -> Result<IndexEntry<B>> {
        let axes = bbox.axes();
        if !is_finite(&axes) {
            return Err(ChronotopeError::InvalidArgValue(format!(
                "Cannot index a box with infinite bounds: {:?}",
                bbox
            )));
        }
        let dims = dims_of(&axes);
        match self.dims {
            Some(expected) if expected != dims => {
                return Err(ChronotopeError::InvalidArg(
                    "The boxes of an index must have the same dimensions".to_string(),
                ));
            }
            Some(_) => {}
            None => self.dims = Some(dims),
        }
        Ok(IndexEntry {
            id,
            envelope: stored_envelope(&axes),
            bbox,
        })
    }

    /// Build the index from a batch of boxes with their ids.
    pub fn bulk_load<I>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = (B, i64)>,
    {
        let mut index = Self::new();
        let run = |index: &mut Self| -> Result<()> {
            let entries = items
                .into_iter()
                .map(|(bbox, id)| index.entry(bbox, id))
                .collect::<Result<Vec<_>>>()?;
            log::debug!("R-tree bulk load of {} boxes", entries.len());
            index.tree = RTree::bulk_load(entries);
            Ok(())
        };
        run(&mut index).reported()?;
        Ok(index)
    }

    /// Add one box after construction.
    pub fn insert(&mut self, bbox: B, id: i64) -> Result<()> {
        let entry = self.entry(bbox, id).reported()?;
        self.tree.insert(entry);
        Ok(())
    }

    /// Query envelope: axes absent from the query or from the index are
    /// unconstrained.
    fn query_envelope(&self, axes: &Axes) -> Envelope {
        let dims = self.dims.unwrap_or([false; AXES]);
        let mut lower = [f64::NEG_INFINITY; AXES];
        let mut upper = [f64::INFINITY; AXES];
        for (i, axis) in axes.iter().enumerate() {
            if let (Some((lo, hi)), true) = (axis, dims[i]) {
                lower[i] = *lo;
                upper[i] = *hi;
            }
        }
        AABB::from_corners(lower, upper)
    }

    /// Ids of the stored boxes overlapping `query`, ascending and without
    /// duplicates.
    pub fn search(&self, query: &B) -> Vec<i64> {
        let axes = query.axes();
        if !is_finite(&axes) {
            log::warn!("R-tree query with non-finite bounds ignored: {:?}", query);
            return Vec::new();
        }
        let envelope = self.query_envelope(&axes);
        let mut ids: Vec<i64> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .filter(|entry| entry.bbox.index_overlaps(query))
            .map(|entry| entry.id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxes::{STBox, TBox};
    use crate::span::{FloatSpan, IntSpan, TstzSpan};

    fn float(text: &str) -> FloatSpan {
        text.parse().unwrap()
    }

    #[test]
    fn test_overlap_query() {
        let index = RTreeIndex::bulk_load(vec![
            (float("[0, 10]"), 1),
            (float("[20, 30]"), 2),
            (float("[25, 40]"), 3),
        ])
        .unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.search(&float("[22, 26]")), vec![2, 3]);
        assert_eq!(index.search(&float("[11, 19]")), Vec::<i64>::new());
        assert_eq!(index.search(&float("[-5, 50]")), vec![1, 2, 3]);
    }

    #[test]
    fn test_exclusive_bounds_are_refined() {
        let spans: Vec<(IntSpan, i64)> = vec![
            ("[1, 5)".parse().unwrap(), 1),
            ("[5, 9)".parse().unwrap(), 2),
        ];
        let index = RTreeIndex::bulk_load(spans).unwrap();
        assert_eq!(index.search(&"[5, 6)".parse().unwrap()), vec![2]);
    }

    #[test]
    fn test_insert_after_build() {
        let mut index = RTreeIndex::new();
        assert!(index.is_empty());
        index.insert(float("[0, 1]"), 7).unwrap();
        index.insert(float("[0.5, 2]"), 3).unwrap();
        assert_eq!(index.search(&float("[0.75, 0.8]")), vec![3, 7]);
    }

    #[test]
    fn test_non_finite_boxes() {
        let mut index = RTreeIndex::new();
        index.insert(float("[0, 1]"), 1).unwrap();
        assert!(index.insert(FloatSpan::new(0.0, f64::INFINITY, true, true).unwrap(), 2).is_err());
        let query = FloatSpan::new(f64::NEG_INFINITY, 0.5, true, true).unwrap();
        assert!(index.search(&query).is_empty());
    }

    #[test]
    fn test_tbox_index_with_partial_query() {
        let period: TstzSpan = "[2000-01-01, 2000-01-02]".parse().unwrap();
        let later: TstzSpan = "[2000-02-01, 2000-02-02]".parse().unwrap();
        let index = RTreeIndex::bulk_load(vec![
            (TBox::from_span_period(float("[0, 10]"), period), 1),
            (TBox::from_span_period(float("[0, 10]"), later), 2),
            (TBox::from_span_period(float("[50, 60]"), period), 3),
        ])
        .unwrap();
        assert_eq!(index.search(&TBox::from_period(period)), vec![1, 3]);
        assert_eq!(index.search(&TBox::from_span(float("[5, 6]"))), vec![1, 2]);
        assert!(RTreeIndex::bulk_load(vec![
            (TBox::from_period(period), 1),
            (TBox::from_span(float("[0, 1]")), 2),
        ])
        .is_err());
    }

    #[test]
    fn test_stbox_index() {
        let boxes = vec![
            (STBox::new_xy(0.0, 1.0, 0.0, 1.0, 4326).unwrap(), 10),
            (STBox::new_xy(5.0, 6.0, 5.0, 6.0, 4326).unwrap(), 20),
        ];
        let index = RTreeIndex::bulk_load(boxes).unwrap();
        let query = STBox::new_xy(0.5, 5.5, 0.5, 0.75, 4326).unwrap();
        assert_eq!(index.search(&query), vec![10]);
        let other_srid = STBox::new_xy(0.0, 10.0, 0.0, 10.0, 3857).unwrap();
        assert!(index.search(&other_srid).is_empty());
    }
}
