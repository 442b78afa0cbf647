//! Base types: timestamps, the type catalog, spatial points and the value
//! traits implemented by every base type.

pub mod catalog;
pub mod point;
pub mod time;
pub mod value;

pub use catalog::{TypeTag, TypeCategory, TypeInfo, type_info};
pub use point::GeoPoint;
pub use time::{Date, Interval, TimestampTz};
pub use value::{
    BaseValue, Double2, EPSILON, MetricValue, NumericValue, TemporalValue, ValueContext,
    format_float,
};
