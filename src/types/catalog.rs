//! Type catalog.
//!
//! Maps the stable numeric type tags used by the binary encodings to the
//! capabilities of each type. Codecs consult [`type_info`] instead of
//! hardcoding widths or categories.

use crate::error::{ChronotopeError, Result};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use std::fmt;

/// Stable type tags.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Bool = 1,
    Date = 2,
    DateSet = 5,
    DateSpan = 6,
    DateSpanSet = 7,
    Double2 = 8,
    Float8 = 11,
    FloatSet = 12,
    FloatSpan = 13,
    FloatSpanSet = 14,
    Int4 = 15,
    IntSet = 18,
    IntSpan = 19,
    IntSpanSet = 20,
    Int8 = 21,
    BigintSet = 22,
    BigintSpan = 23,
    BigintSpanSet = 24,
    STBox = 25,
    TBool = 26,
    TBox = 27,
    TDouble2 = 28,
    Text = 31,
    TextSet = 32,
    TFloat = 33,
    TimestampTz = 34,
    TInt = 35,
    TstzSet = 38,
    TstzSpan = 39,
    TstzSpanSet = 40,
    TText = 41,
    Geometry = 42,
    TGeomPoint = 46,
}

/// Broad family a type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Base,
    Set,
    Span,
    SpanSet,
    Box,
    Temporal,
}

/// Capabilities of a catalog type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInfo {
    /// Element type of containers and temporal types, `None` for base types and boxes
    pub base: Option<TypeTag>,
    pub category: TypeCategory,
    /// Whether linear interpolation is legal for values of the base type
    pub continuous: bool,
    /// Whether values are passed by value
    pub by_value: bool,
    /// Fixed encoded width in bytes of a base value, `None` when variable
    pub width: Option<usize>,
}

const ALL_TYPES: [TypeTag; 33] = [
    TypeTag::Bool,
    TypeTag::Date,
    TypeTag::DateSet,
    TypeTag::DateSpan,
    TypeTag::DateSpanSet,
    TypeTag::Double2,
    TypeTag::Float8,
    TypeTag::FloatSet,
    TypeTag::FloatSpan,
    TypeTag::FloatSpanSet,
    TypeTag::Int4,
    TypeTag::IntSet,
    TypeTag::IntSpan,
    TypeTag::IntSpanSet,
    TypeTag::Int8,
    TypeTag::BigintSet,
    TypeTag::BigintSpan,
    TypeTag::BigintSpanSet,
    TypeTag::STBox,
    TypeTag::TBool,
    TypeTag::TBox,
    TypeTag::TDouble2,
    TypeTag::Text,
    TypeTag::TextSet,
    TypeTag::TFloat,
    TypeTag::TimestampTz,
    TypeTag::TInt,
    TypeTag::TstzSet,
    TypeTag::TstzSpan,
    TypeTag::TstzSpanSet,
    TypeTag::TText,
    TypeTag::Geometry,
    TypeTag::TGeomPoint,
];

static TYPES_BY_NAME: Lazy<FxHashMap<&'static str, TypeTag>> =
    Lazy::new(|| ALL_TYPES.iter().map(|t| (t.name(), *t)).collect());

impl TypeTag {
    /// Look up a type by its numeric tag.
    pub fn from_id(id: u16) -> Result<Self> {
        ALL_TYPES
            .iter()
            .copied()
            .find(|t| *t as u16 == id)
            .ok_or_else(|| ChronotopeError::InvalidArgType(format!("Unknown type tag {}", id)))
    }

    /// Look up a type by its lowercase name, e.g. `tfloat`.
    pub fn from_name(name: &str) -> Result<Self> {
        TYPES_BY_NAME
            .get(name.trim().to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| ChronotopeError::InvalidArgType(format!("Unknown type name '{}'", name)))
    }

    pub const fn id(self) -> u16 {
        self as u16
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Date => "date",
            Self::DateSet => "dateset",
            Self::DateSpan => "datespan",
            Self::DateSpanSet => "datespanset",
            Self::Double2 => "double2",
            Self::Float8 => "float",
            Self::FloatSet => "floatset",
            Self::FloatSpan => "floatspan",
            Self::FloatSpanSet => "floatspanset",
            Self::Int4 => "int",
            Self::IntSet => "intset",
            Self::IntSpan => "intspan",
            Self::IntSpanSet => "intspanset",
            Self::Int8 => "bigint",
            Self::BigintSet => "bigintset",
            Self::BigintSpan => "bigintspan",
            Self::BigintSpanSet => "bigintspanset",
            Self::STBox => "stbox",
            Self::TBool => "tbool",
            Self::TBox => "tbox",
            Self::TDouble2 => "tdouble2",
            Self::Text => "text",
            Self::TextSet => "textset",
            Self::TFloat => "tfloat",
            Self::TimestampTz => "timestamptz",
            Self::TInt => "tint",
            Self::TstzSet => "tstzset",
            Self::TstzSpan => "tstzspan",
            Self::TstzSpanSet => "tstzspanset",
            Self::TText => "ttext",
            Self::Geometry => "geometry",
            Self::TGeomPoint => "tgeompoint",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const fn base(width: Option<usize>, by_value: bool, continuous: bool) -> TypeInfo {
    TypeInfo {
        base: None,
        category: TypeCategory::Base,
        continuous,
        by_value,
        width,
    }
}

const fn container(category: TypeCategory, elem: TypeTag, continuous: bool) -> TypeInfo {
    TypeInfo {
        base: Some(elem),
        category,
        continuous,
        by_value: false,
        width: None,
    }
}

/// Capabilities of `t`.
pub const fn type_info(t: TypeTag) -> TypeInfo {
    use TypeTag as M;
    use TypeCategory as C;
    match t {
        M::Bool => base(Some(1), true, false),
        M::Date => base(Some(4), true, false),
        M::Int4 => base(Some(4), true, false),
        M::Int8 => base(Some(8), true, false),
        M::Float8 => base(Some(8), true, true),
        M::TimestampTz => base(Some(8), true, true),
        M::Double2 => base(Some(16), false, true),
        M::Text => base(None, false, false),
        M::Geometry => base(None, false, true),

        M::IntSet => container(C::Set, M::Int4, false),
        M::BigintSet => container(C::Set, M::Int8, false),
        M::FloatSet => container(C::Set, M::Float8, true),
        M::DateSet => container(C::Set, M::Date, false),
        M::TstzSet => container(C::Set, M::TimestampTz, true),
        M::TextSet => container(C::Set, M::Text, false),

        M::IntSpan => container(C::Span, M::Int4, false),
        M::BigintSpan => container(C::Span, M::Int8, false),
        M::FloatSpan => container(C::Span, M::Float8, true),
        M::DateSpan => container(C::Span, M::Date, false),
        M::TstzSpan => container(C::Span, M::TimestampTz, true),

        M::IntSpanSet => container(C::SpanSet, M::Int4, false),
        M::BigintSpanSet => container(C::SpanSet, M::Int8, false),
        M::FloatSpanSet => container(C::SpanSet, M::Float8, true),
        M::DateSpanSet => container(C::SpanSet, M::Date, false),
        M::TstzSpanSet => container(C::SpanSet, M::TimestampTz, true),

        M::TBox => TypeInfo {
            base: None,
            category: C::Box,
            continuous: true,
            by_value: false,
            width: None,
        },
        M::STBox => TypeInfo {
            base: None,
            category: C::Box,
            continuous: true,
            by_value: false,
            width: None,
        },

        M::TBool => container(C::Temporal, M::Bool, false),
        M::TInt => container(C::Temporal, M::Int4, false),
        M::TFloat => container(C::Temporal, M::Float8, true),
        M::TText => container(C::Temporal, M::Text, false),
        M::TDouble2 => container(C::Temporal, M::Double2, true),
        M::TGeomPoint => container(C::Temporal, M::Geometry, true),
    }
}

/// Read a type tag and check that it is `expected`.
pub(crate) fn expect_type(id: u16, expected: TypeTag) -> Result<()> {
    let found = TypeTag::from_id(id)
        .map_err(|_| ChronotopeError::WkbInput(format!("Unknown type tag {}", id)))?;
    if found != expected {
        return Err(ChronotopeError::WkbInput(format!(
            "Expected {} but found {}",
            expected, found
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_stable() {
        assert_eq!(TypeTag::Bool.id(), 1);
        assert_eq!(TypeTag::FloatSpan.id(), 13);
        assert_eq!(TypeTag::TstzSpanSet.id(), 40);
        assert_eq!(TypeTag::TGeomPoint.id(), 46);
        assert_eq!(TypeTag::from_id(35).unwrap(), TypeTag::TInt);
        assert!(TypeTag::from_id(9999).is_err());
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(TypeTag::from_name("TFloat").unwrap(), TypeTag::TFloat);
        assert_eq!(TypeTag::from_name("intspan").unwrap(), TypeTag::IntSpan);
        assert!(TypeTag::from_name("tcbuffer").is_err());
    }

    #[test]
    fn test_type_info() {
        let info = type_info(TypeTag::TFloat);
        assert_eq!(info.base, Some(TypeTag::Float8));
        assert_eq!(info.category, TypeCategory::Temporal);
        assert!(info.continuous);

        assert!(!type_info(TypeTag::TInt).continuous);
        assert!(!type_info(TypeTag::TText).continuous);
        assert_eq!(type_info(TypeTag::Int8).width, Some(8));
        assert_eq!(type_info(TypeTag::Text).width, None);
    }

    #[test]
    fn test_expect_type() {
        assert!(expect_type(19, TypeTag::IntSpan).is_ok());
        assert!(expect_type(13, TypeTag::IntSpan).is_err());
        assert!(expect_type(0, TypeTag::IntSpan).is_err());
    }
}
