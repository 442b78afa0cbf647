//! Temporal values, spans and spatiotemporal boxes: the in-memory value
//! algebra of a moving-object engine.
//!
//! ```rust
//! use chronotope::{IntSpan, IntSpanSet, Temporal};
//!
//! let span = IntSpan::new(1, 5, true, false)?;
//! assert_eq!(span.to_string(), "[1, 5)");
//!
//! let joined = IntSpanSet::new(vec!["[1, 3)".parse()?, "[3, 5)".parse()?])?;
//! assert_eq!(joined.num_spans(), 1);
//!
//! let speed: Temporal<f64> = "[10@2000-01-01, 20@2000-01-03]".parse()?;
//! assert_eq!(speed.value_at_timestamp("2000-01-02".parse()?), Some(15.0));
//! # Ok::<(), chronotope::ChronotopeError>(())
//! ```

pub mod aggregate;
pub mod boxes;
pub mod config;
pub mod error;
pub mod index;
pub mod span;
pub mod temporal;
pub mod types;
pub mod wkb;

mod parse;

pub use error::{
    ChronotopeError, ErrorCode, ErrorLevel, Result, clear_error_handler, errno, errno_reset,
    set_error_handler,
};

pub use config::{AppendConfig, Config, SkipListConfig};

pub use types::{
    BaseValue, Date, Double2, GeoPoint, Interval, MetricValue, NumericValue, TemporalValue,
    TimestampTz, TypeTag,
};

pub use span::{
    BigintSpan, BigintSpanSet, DateSpan, DateSpanSet, FloatSpan, FloatSpanSet, IntSpan,
    IntSpanSet, Set, Span, SpanBound, SpanSet, TstzSpan, TstzSpanSet,
};

pub use boxes::{STBox, TBox, TemporalBox};

pub use temporal::{Interpolation, TInstant, TSequence, TSequenceSet, Temporal, TemporalSubtype};

pub use aggregate::Aggregator;

pub use index::{IndexBox, RTreeIndex};

pub use wkb::{WkbDecode, WkbEncode, WkbVariant};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{ChronotopeError, Result};

    pub use crate::{Config, SkipListConfig};

    pub use crate::{Date, GeoPoint, Interval, TimestampTz};

    pub use crate::{FloatSpan, IntSpan, Set, Span, SpanSet, TstzSpan, TstzSpanSet};

    pub use crate::{STBox, TBox};

    pub use crate::{Interpolation, Temporal};

    pub use crate::{Aggregator, RTreeIndex};

    pub use crate::{WkbDecode, WkbEncode, WkbVariant};
}
