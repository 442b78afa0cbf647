use super::{TemporalBox, cmp_periods, expand_period};
use crate::config::DEFAULT_FLOAT_DIGITS;
use crate::error::{ChronotopeError, ReportExt, Result};
use crate::parse::split_top_level;
use crate::span::{Span, TstzSpan};
use crate::types::point::split_srid;
use crate::types::{GeoPoint, TimestampTz, format_float};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A spatial box and/or a time span, with an SRID.
///
/// # Examples
///
/// ```
/// use chronotope::boxes::STBox;
///
/// let b: STBox = "STBOX X((1,2),(3,4))".parse().unwrap();
/// assert_eq!(b.xmax(), 3.0);
/// assert!(b.has_x() && !b.has_t());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct STBox {
    xmin: f64,
    xmax: f64,
    ymin: f64,
    ymax: f64,
    zmin: f64,
    zmax: f64,
    period: Option<TstzSpan>,
    srid: i32,
    has_x: bool,
    has_z: bool,
    geodetic: bool,
}

impl STBox {
    fn check_extent(min: f64, max: f64, axis: char) -> Result<()> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(ChronotopeError::InvalidArgValue(format!(
                "Invalid {} extent [{}, {}]",
                axis, min, max
            )));
        }
        Ok(())
    }

    /// Planar 2D box.
    pub fn new_xy(xmin: f64, xmax: f64, ymin: f64, ymax: f64, srid: i32) -> Result<Self> {
        let make = || -> Result<Self> {
            Self::check_extent(xmin, xmax, 'x')?;
            Self::check_extent(ymin, ymax, 'y')?;
            Ok(Self {
                xmin,
                xmax,
                ymin,
                ymax,
                zmin: 0.0,
                zmax: 0.0,
                period: None,
                srid,
                has_x: true,
                has_z: false,
                geodetic: false,
            })
        };
        make().reported()
    }

    /// Planar 3D box.
    pub fn new_xyz(min: [f64; 3], max: [f64; 3], srid: i32) -> Result<Self> {
        let mut b = Self::new_xy(min[0], max[0], min[1], max[1], srid)?;
        Self::check_extent(min[2], max[2], 'z').reported()?;
        b.zmin = min[2];
        b.zmax = max[2];
        b.has_z = true;
        Ok(b)
    }

    /// Box with a time dimension only.
    pub fn from_period(period: TstzSpan) -> Self {
        Self {
            xmin: 0.0,
            xmax: 0.0,
            ymin: 0.0,
            ymax: 0.0,
            zmin: 0.0,
            zmax: 0.0,
            period: Some(period),
            srid: 0,
            has_x: false,
            has_z: false,
            geodetic: false,
        }
    }

    pub fn from_point(point: &GeoPoint) -> Self {
        let z = point.z().unwrap_or(0.0);
        Self {
            xmin: point.x(),
            xmax: point.x(),
            ymin: point.y(),
            ymax: point.y(),
            zmin: z,
            zmax: z,
            period: None,
            srid: point.srid,
            has_x: true,
            has_z: point.has_z(),
            geodetic: false,
        }
    }

    pub fn from_point_time(point: &GeoPoint, t: TimestampTz) -> Self {
        Self::from_point(point).with_period(TstzSpan::singleton(t))
    }

    pub fn with_period(mut self, period: TstzSpan) -> Self {
        self.period = Some(period);
        self
    }

    pub fn with_srid(mut self, srid: i32) -> Self {
        self.srid = srid;
        self
    }

    pub fn with_geodetic(mut self, geodetic: bool) -> Self {
        self.geodetic = geodetic;
        self
    }

    pub fn has_x(&self) -> bool {
        self.has_x
    }

    pub fn has_z(&self) -> bool {
        self.has_z
    }

    pub fn has_t(&self) -> bool {
        self.period.is_some()
    }

    pub fn is_geodetic(&self) -> bool {
        self.geodetic
    }

    pub fn srid(&self) -> i32 {
        self.srid
    }

    pub fn xmin(&self) -> f64 {
        self.xmin
    }

    pub fn xmax(&self) -> f64 {
        self.xmax
    }

    pub fn ymin(&self) -> f64 {
        self.ymin
    }

    pub fn ymax(&self) -> f64 {
        self.ymax
    }

    pub fn zmin(&self) -> Option<f64> {
        self.has_z.then_some(self.zmin)
    }

    pub fn zmax(&self) -> Option<f64> {
        self.has_z.then_some(self.zmax)
    }

    pub fn period(&self) -> Option<&TstzSpan> {
        self.period.as_ref()
    }

    pub fn tmin(&self) -> Option<TimestampTz> {
        self.period.map(|p| p.lower())
    }

    pub fn tmax(&self) -> Option<TimestampTz> {
        self.period.map(|p| p.upper())
    }

    /// Whether the spatial extent contains the point, bounds included.
    pub fn contains_point(&self, p: &GeoPoint) -> bool {
        if !self.has_x {
            return true;
        }
        let inside_xy = (self.xmin..=self.xmax).contains(&p.x())
            && (self.ymin..=self.ymax).contains(&p.y());
        let inside_z = match (self.has_z, p.z()) {
            (true, Some(z)) => (self.zmin..=self.zmax).contains(&z),
            _ => true,
        };
        inside_xy && inside_z
    }

    pub fn expand(&mut self, other: &STBox) {
        if other.has_x {
            if self.has_x {
                self.xmin = self.xmin.min(other.xmin);
                self.xmax = self.xmax.max(other.xmax);
                self.ymin = self.ymin.min(other.ymin);
                self.ymax = self.ymax.max(other.ymax);
                if self.has_z && other.has_z {
                    self.zmin = self.zmin.min(other.zmin);
                    self.zmax = self.zmax.max(other.zmax);
                }
            } else {
                self.xmin = other.xmin;
                self.xmax = other.xmax;
                self.ymin = other.ymin;
                self.ymax = other.ymax;
                self.zmin = other.zmin;
                self.zmax = other.zmax;
                self.has_x = true;
                self.has_z = other.has_z;
                self.srid = other.srid;
            }
        }
        expand_period(&mut self.period, &other.period);
    }

    fn check_srid(&self, other: &STBox) -> Result<()> {
        if self.has_x && other.has_x && self.srid != other.srid {
            return Err(ChronotopeError::InvalidArg(format!(
                "Operation on mixed SRID {} and {}",
                self.srid, other.srid
            )));
        }
        if self.geodetic != other.geodetic {
            return Err(ChronotopeError::InvalidArg(
                "Operation on mixed planar and geodetic boxes".to_string(),
            ));
        }
        Ok(())
    }

    fn check_common_dim(&self, other: &STBox) -> Result<()> {
        self.check_srid(other)?;
        if (self.has_x && other.has_x) || (self.has_t() && other.has_t()) {
            Ok(())
        } else {
            Err(ChronotopeError::InvalidArg(
                "The boxes must share at least one dimension".to_string(),
            ))
        }
    }

    fn check_axis(&self, other: &STBox, z: bool) -> Result<()> {
        self.check_srid(other)?;
        let ok = if z {
            self.has_z && other.has_z
        } else {
            self.has_x && other.has_x
        };
        if !ok {
            return Err(ChronotopeError::InvalidArg(format!(
                "The boxes must have {} dimension",
                if z { "a Z" } else { "an XY" }
            )));
        }
        Ok(())
    }

    fn periods(&self, other: &STBox) -> Result<(TstzSpan, TstzSpan)> {
        self.check_srid(other)?;
        match (self.period, other.period) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(ChronotopeError::InvalidArg(
                "The boxes must have a time dimension".to_string(),
            )),
        }
    }

    /// Smallest box covering both; the boxes must have the same dimensions.
    pub fn union(&self, other: &STBox) -> Result<STBox> {
        self.check_srid(other)?;
        if self.has_x != other.has_x || self.has_z != other.has_z || self.has_t() != other.has_t() {
            return Err(ChronotopeError::InvalidArg(
                "The boxes must have the same dimensions".to_string(),
            ));
        }
        let mut result = self.clone();
        result.expand(other);
        Ok(result)
    }

    /// Common part on the shared dimensions, `None` when disjoint.
    pub fn intersection(&self, other: &STBox) -> Result<Option<STBox>> {
        self.check_common_dim(other)?;
        if !self.overlaps_box(other) {
            return Ok(None);
        }
        let has_x = self.has_x && other.has_x;
        let has_z = has_x && self.has_z && other.has_z;
        let period = match (&self.period, &other.period) {
            (Some(a), Some(b)) => a.intersection(b),
            _ => None,
        };
        Ok(Some(STBox {
            xmin: if has_x { self.xmin.max(other.xmin) } else { 0.0 },
            xmax: if has_x { self.xmax.min(other.xmax) } else { 0.0 },
            ymin: if has_x { self.ymin.max(other.ymin) } else { 0.0 },
            ymax: if has_x { self.ymax.min(other.ymax) } else { 0.0 },
            zmin: if has_z { self.zmin.max(other.zmin) } else { 0.0 },
            zmax: if has_z { self.zmax.min(other.zmax) } else { 0.0 },
            period,
            srid: if has_x { self.srid } else { 0 },
            has_x,
            has_z,
            geodetic: self.geodetic,
        }))
    }

    pub fn overlaps(&self, other: &STBox) -> Result<bool> {
        self.check_common_dim(other)?;
        Ok(self.overlaps_box(other))
    }

    pub fn contains(&self, other: &STBox) -> Result<bool> {
        self.check_common_dim(other)?;
        let mut result = true;
        if self.has_x && other.has_x {
            result &= self.xmin <= other.xmin
                && other.xmax <= self.xmax
                && self.ymin <= other.ymin
                && other.ymax <= self.ymax;
            if self.has_z && other.has_z {
                result &= self.zmin <= other.zmin && other.zmax <= self.zmax;
            }
        }
        if let (Some(a), Some(b)) = (&self.period, &other.period) {
            result &= a.contains(b);
        }
        Ok(result)
    }

    pub fn contained(&self, other: &STBox) -> Result<bool> {
        other.contains(self)
    }

    pub fn same(&self, other: &STBox) -> Result<bool> {
        Ok(self.contains(other)? && other.contains(self)?)
    }

    pub fn left(&self, other: &STBox) -> Result<bool> {
        self.check_axis(other, false)?;
        Ok(self.xmax < other.xmin)
    }

    pub fn overleft(&self, other: &STBox) -> Result<bool> {
        self.check_axis(other, false)?;
        Ok(self.xmax <= other.xmax)
    }

    pub fn right(&self, other: &STBox) -> Result<bool> {
        self.check_axis(other, false)?;
        Ok(self.xmin > other.xmax)
    }

    pub fn overright(&self, other: &STBox) -> Result<bool> {
        self.check_axis(other, false)?;
        Ok(self.xmin >= other.xmin)
    }

    pub fn below(&self, other: &STBox) -> Result<bool> {
        self.check_axis(other, false)?;
        Ok(self.ymax < other.ymin)
    }

    pub fn overbelow(&self, other: &STBox) -> Result<bool> {
        self.check_axis(other, false)?;
        Ok(self.ymax <= other.ymax)
    }

    pub fn above(&self, other: &STBox) -> Result<bool> {
        self.check_axis(other, false)?;
        Ok(self.ymin > other.ymax)
    }

    pub fn overabove(&self, other: &STBox) -> Result<bool> {
        self.check_axis(other, false)?;
        Ok(self.ymin >= other.ymin)
    }

    pub fn front(&self, other: &STBox) -> Result<bool> {
        self.check_axis(other, true)?;
        Ok(self.zmax < other.zmin)
    }

    pub fn back(&self, other: &STBox) -> Result<bool> {
        self.check_axis(other, true)?;
        Ok(self.zmin > other.zmax)
    }

    pub fn before(&self, other: &STBox) -> Result<bool> {
        let (a, b) = self.periods(other)?;
        Ok(a.left(&b))
    }

    pub fn overbefore(&self, other: &STBox) -> Result<bool> {
        let (a, b) = self.periods(other)?;
        Ok(a.overleft(&b))
    }

    pub fn after(&self, other: &STBox) -> Result<bool> {
        let (a, b) = self.periods(other)?;
        Ok(a.right(&b))
    }

    pub fn overafter(&self, other: &STBox) -> Result<bool> {
        let (a, b) = self.periods(other)?;
        Ok(a.overright(&b))
    }

    pub fn to_text(&self, maxdd: usize) -> String {
        let f = |v: f64| format_float(v, maxdd);
        let spatial = if self.has_z {
            format!(
                "(({},{},{}),({},{},{}))",
                f(self.xmin),
                f(self.ymin),
                f(self.zmin),
                f(self.xmax),
                f(self.ymax),
                f(self.zmax)
            )
        } else {
            format!(
                "(({},{}),({},{}))",
                f(self.xmin),
                f(self.ymin),
                f(self.xmax),
                f(self.ymax)
            )
        };
        let prefix = if self.has_x && self.srid != 0 {
            format!("SRID={};", self.srid)
        } else {
            String::new()
        };
        let name = if self.geodetic { "GEODSTBOX" } else { "STBOX" };
        let dims = match (self.has_x, self.has_z, &self.period) {
            (true, true, Some(p)) => format!("ZT({},{})", spatial, p),
            (true, false, Some(p)) => format!("XT({},{})", spatial, p),
            (true, true, None) => format!("Z{}", spatial),
            (true, false, None) => format!("X{}", spatial),
            (false, _, Some(p)) => format!("T({})", p),
            (false, _, None) => "()".to_string(),
        };
        format!("{}{} {}", prefix, name, dims)
    }

    /// Parse `[SRID=n;][GEOD]STBOX X|Z|T|XT|ZT(...)`.
    pub fn parse(input: &str) -> Result<Self> {
        Self::parse_inner(input).reported()
    }

    fn parse_inner(input: &str) -> Result<Self> {
        let err = || ChronotopeError::TextInput(format!("Could not parse spatiotemporal box '{}'", input));
        let (srid, body) = split_srid(input)?;
        let upper = body.to_ascii_uppercase();
        let (geodetic, offset) = if upper.starts_with("GEODSTBOX") {
            (true, 9)
        } else if upper.starts_with("STBOX") {
            (false, 5)
        } else {
            return Err(err());
        };
        let rest = body[offset..].trim_start();
        let open = rest.find('(').ok_or_else(err)?;
        let dims = rest[..open].trim().to_ascii_uppercase();
        let inner = rest[open + 1..].trim_end().strip_suffix(')').ok_or_else(err)?;

        let parse_coords = |text: &str, n: usize| -> Result<Vec<f64>> {
            let inner = text
                .trim()
                .strip_prefix('(')
                .and_then(|r| r.strip_suffix(')'))
                .ok_or_else(err)?;
            let coords = inner
                .split(',')
                .map(|c| c.trim().parse::<f64>().map_err(|_| err()))
                .collect::<Result<Vec<_>>>()?;
            if coords.len() != n {
                return Err(err());
            }
            Ok(coords)
        };
        let parse_spatial = |text: &str, n: usize| -> Result<(Vec<f64>, Vec<f64>)> {
            let parts = split_top_level(text)?;
            match parts.as_slice() {
                [min, max] => Ok((parse_coords(min, n)?, parse_coords(max, n)?)),
                _ => Err(err()),
            }
        };
        let unwrap_parens = |text: &str| -> Result<String> {
            text.trim()
                .strip_prefix('(')
                .and_then(|r| r.strip_suffix(')'))
                .map(str::to_string)
                .ok_or_else(err)
        };

        let srid = srid.unwrap_or(0);
        let mut result = match dims.as_str() {
            "X" | "Z" => {
                let n = if dims == "Z" { 3 } else { 2 };
                let (min, max) = parse_spatial(inner, n)?;
                Self::spatial(&min, &max, srid)?
            }
            "XT" | "ZT" => {
                let n = if dims == "ZT" { 3 } else { 2 };
                let parts = split_top_level(inner)?;
                let [spatial, period] = parts.as_slice() else {
                    return Err(err());
                };
                let (min, max) = parse_spatial(&unwrap_parens(spatial)?, n)?;
                Self::spatial(&min, &max, srid)?.with_period(Span::parse_inner(period)?)
            }
            "T" => Self::from_period(Span::parse_inner(inner)?),
            _ => return Err(err()),
        };
        result.geodetic = geodetic;
        Ok(result)
    }

    fn spatial(min: &[f64], max: &[f64], srid: i32) -> Result<Self> {
        Self::check_extent(min[0], max[0], 'x')?;
        Self::check_extent(min[1], max[1], 'y')?;
        let mut b = Self {
            xmin: min[0],
            xmax: max[0],
            ymin: min[1],
            ymax: max[1],
            zmin: 0.0,
            zmax: 0.0,
            period: None,
            srid,
            has_x: true,
            has_z: false,
            geodetic: false,
        };
        if min.len() == 3 {
            Self::check_extent(min[2], max[2], 'z')?;
            b.zmin = min[2];
            b.zmax = max[2];
            b.has_z = true;
        }
        Ok(b)
    }
}

impl TemporalBox for STBox {
    fn period(&self) -> Option<TstzSpan> {
        self.period
    }

    fn set_period(&mut self, period: TstzSpan) {
        self.period = Some(period);
    }

    fn expand(&mut self, other: &Self) {
        STBox::expand(self, other)
    }

    fn overlaps_box(&self, other: &Self) -> bool {
        let mut result = true;
        if self.has_x && other.has_x {
            result &= self.xmin <= other.xmax
                && other.xmin <= self.xmax
                && self.ymin <= other.ymax
                && other.ymin <= self.ymax;
            if self.has_z && other.has_z {
                result &= self.zmin <= other.zmax && other.zmin <= self.zmax;
            }
        }
        if let (Some(a), Some(b)) = (&self.period, &other.period) {
            result &= a.overlaps(b);
        }
        result
    }

    fn box_cmp(&self, other: &Self) -> Ordering {
        cmp_periods(&self.period, &other.period)
            .then(self.has_x.cmp(&other.has_x))
            .then(self.xmin.total_cmp(&other.xmin))
            .then(self.ymin.total_cmp(&other.ymin))
            .then(self.zmin.total_cmp(&other.zmin))
            .then(self.xmax.total_cmp(&other.xmax))
            .then(self.ymax.total_cmp(&other.ymax))
            .then(self.zmax.total_cmp(&other.zmax))
            .then(self.srid.cmp(&other.srid))
    }
}

impl fmt::Display for STBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text(DEFAULT_FLOAT_DIGITS))
    }
}

impl FromStr for STBox {
    type Err = ChronotopeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Decoded header of a binary box, used by the codec.
pub(crate) struct STBoxParts {
    pub min: [f64; 3],
    pub max: [f64; 3],
    pub period: Option<TstzSpan>,
    pub srid: i32,
    pub has_x: bool,
    pub has_z: bool,
    pub geodetic: bool,
}

impl STBox {
    pub(crate) fn from_parts(parts: STBoxParts) -> Result<Self> {
        let mut b = if parts.has_x {
            let n = if parts.has_z { 3 } else { 2 };
            Self::spatial(&parts.min[..n], &parts.max[..n], parts.srid)?
        } else {
            match parts.period {
                Some(p) => Self::from_period(p),
                None => {
                    return Err(ChronotopeError::WkbInput(
                        "A spatiotemporal box needs a spatial or a time dimension".to_string(),
                    ));
                }
            }
        };
        b.period = parts.period;
        b.geodetic = parts.geodetic;
        Ok(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimestampTz {
        TimestampTz::parse(s).unwrap()
    }

    #[test]
    fn test_text_roundtrip() {
        let text = "SRID=4326;STBOX XT(((1,2),(3,4)),[2000-01-01 00:00:00+00, 2000-01-02 00:00:00+00])";
        let b: STBox = text.parse().unwrap();
        assert_eq!(b.srid(), 4326);
        assert_eq!((b.xmin(), b.ymax()), (1.0, 4.0));
        assert_eq!(b.to_string(), text);

        let z: STBox = "STBOX Z((1,2,3),(4,5,6))".parse().unwrap();
        assert_eq!(z.zmax(), Some(6.0));
        assert_eq!(z.to_string(), "STBOX Z((1,2,3),(4,5,6))");

        let tb: STBox = "STBOX T([2000-01-01, 2000-01-02])".parse().unwrap();
        assert!(!tb.has_x());
        assert!(STBox::parse("STBOX X((3,2),(1,4))").is_err());
        assert!(STBox::parse("STBOX W((1,2),(3,4))").is_err());
    }

    #[test]
    fn test_point_boxes() {
        let p = GeoPoint::new(1.0, 2.0);
        let mut b = STBox::from_point_time(&p, t("2000-01-01"));
        b.expand(&STBox::from_point_time(&GeoPoint::new(3.0, 0.0), t("2000-01-02")));
        assert_eq!((b.xmin(), b.xmax(), b.ymin(), b.ymax()), (1.0, 3.0, 0.0, 2.0));
        assert_eq!(b.tmax(), Some(t("2000-01-02")));
        assert!(b.contains_point(&GeoPoint::new(2.0, 1.0)));
        assert!(!b.contains_point(&GeoPoint::new(4.0, 1.0)));
    }

    #[test]
    fn test_srid_and_dimension_checks() {
        let a = STBox::new_xy(0.0, 1.0, 0.0, 1.0, 4326).unwrap();
        let b = STBox::new_xy(0.0, 1.0, 0.0, 1.0, 3857).unwrap();
        assert!(a.overlaps(&b).is_err());
        assert!(a.front(&a).is_err());
        assert!(a.before(&a).is_err());

        let c = STBox::new_xy(2.0, 3.0, 0.0, 1.0, 4326).unwrap();
        assert!(a.left(&c).unwrap());
        assert!(!a.overlaps(&c).unwrap());
        assert_eq!(a.intersection(&c).unwrap(), None);
        assert!(a.union(&c).unwrap().contains(&a).unwrap());
    }
}
