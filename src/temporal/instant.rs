use crate::types::{TemporalValue, TimestampTz};
use std::cmp::Ordering;

/// A value at a single timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct TInstant<V> {
    pub(crate) value: V,
    pub(crate) t: TimestampTz,
}

impl<V: TemporalValue> TInstant<V> {
    pub fn new(value: V, t: TimestampTz) -> Self {
        Self { value, t }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_value(self) -> V {
        self.value
    }

    pub fn timestamp(&self) -> TimestampTz {
        self.t
    }

    pub fn bbox(&self) -> V::BBox {
        self.value.instant_box(self.t)
    }

    /// Timestamp first, then value.
    pub fn cmp_instant(&self, other: &Self) -> Ordering {
        self.t
            .cmp(&other.t)
            .then_with(|| self.value.value_cmp(&other.value))
    }

    pub(crate) fn with_value<W: TemporalValue>(&self, value: W) -> TInstant<W> {
        TInstant { value, t: self.t }
    }
}
