use crate::error::{ChronotopeError, Result};
use crate::types::value::format_float;
use geo::{Distance, Euclidean, Point};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 2D or 3D point with a spatial reference identifier.
///
/// Points are the spatial payload of temporal points. Planar distance is
/// delegated to `geo`; the optional z coordinate is combined with it when
/// both points carry one.
///
/// # Examples
///
/// ```
/// use chronotope::types::GeoPoint;
///
/// let a = GeoPoint::new(0.0, 0.0);
/// let b = GeoPoint::new(3.0, 4.0);
/// assert_eq!(a.distance(&b), 5.0);
///
/// let p: GeoPoint = "POINT Z(1 2 3)".parse().unwrap();
/// assert_eq!(p.z(), Some(3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Planar coordinates
    pub point: Point<f64>,
    /// Optional elevation
    pub z: Option<f64>,
    /// Spatial reference identifier, 0 when unknown
    pub srid: i32,
}

impl GeoPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            point: Point::new(x, y),
            z: None,
            srid: 0,
        }
    }

    pub fn new_3d(x: f64, y: f64, z: f64) -> Self {
        Self {
            point: Point::new(x, y),
            z: Some(z),
            srid: 0,
        }
    }

    pub fn with_srid(mut self, srid: i32) -> Self {
        self.srid = srid;
        self
    }

    pub fn x(&self) -> f64 {
        self.point.x()
    }

    pub fn y(&self) -> f64 {
        self.point.y()
    }

    pub fn z(&self) -> Option<f64> {
        self.z
    }

    pub fn has_z(&self) -> bool {
        self.z.is_some()
    }

    pub fn is_finite(&self) -> bool {
        self.x().is_finite() && self.y().is_finite() && self.z.is_none_or(f64::is_finite)
    }

    /// Euclidean distance, in 3D when both points have a z coordinate.
    pub fn distance(&self, other: &GeoPoint) -> f64 {
        let planar = Euclidean.distance(self.point, other.point);
        match (self.z, other.z) {
            (Some(z1), Some(z2)) => planar.hypot(z1 - z2),
            _ => planar,
        }
    }

    /// Point at fraction `ratio` of the segment from `self` to `other`.
    pub fn lerp(&self, other: &GeoPoint, ratio: f64) -> GeoPoint {
        let x = self.x() + (other.x() - self.x()) * ratio;
        let y = self.y() + (other.y() - self.y()) * ratio;
        let z = match (self.z, other.z) {
            (Some(z1), Some(z2)) => Some(z1 + (z2 - z1) * ratio),
            _ => None,
        };
        GeoPoint {
            point: Point::new(x, y),
            z,
            srid: self.srid,
        }
    }

    /// Coordinates as `[x, y, z]`, with z = 0 for 2D points.
    pub(crate) fn coords(&self) -> [f64; 3] {
        [self.x(), self.y(), self.z.unwrap_or(0.0)]
    }

    /// Parse `POINT(x y)`, `POINT Z(x y z)` or `POINT(x y z)`, optionally
    /// prefixed by `SRID=n;`.
    pub fn parse(input: &str) -> Result<Self> {
        let text = input.trim();
        let (srid, body) = split_srid(text)?;
        let upper = body.to_ascii_uppercase();
        let Some(rest) = upper.strip_prefix("POINT") else {
            return Err(ChronotopeError::TextInput(format!(
                "Could not parse point '{}'",
                input
            )));
        };
        let rest = rest.trim_start();
        let (explicit_z, rest) = match rest.strip_prefix('Z') {
            Some(r) => (true, r.trim_start()),
            None => (false, rest),
        };
        let inner = rest
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .ok_or_else(|| {
                ChronotopeError::TextInput(format!("Missing parentheses in point '{}'", input))
            })?;

        let coords = inner
            .split_whitespace()
            .map(|c| {
                c.parse::<f64>().map_err(|_| {
                    ChronotopeError::TextInput(format!("Invalid coordinate '{}' in '{}'", c, input))
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        let point = match (coords.as_slice(), explicit_z) {
            ([x, y], false) => GeoPoint::new(*x, *y),
            ([x, y, z], _) => GeoPoint::new_3d(*x, *y, *z),
            _ => {
                return Err(ChronotopeError::TextInput(format!(
                    "Wrong number of coordinates in point '{}'",
                    input
                )));
            }
        };
        Ok(point.with_srid(srid.unwrap_or(0)))
    }

    /// Point literal with up to `maxdd` decimal digits per coordinate.
    pub fn to_text(&self, maxdd: usize) -> String {
        match self.z {
            Some(z) => format!(
                "POINT Z({} {} {})",
                format_float(self.x(), maxdd),
                format_float(self.y(), maxdd),
                format_float(z, maxdd)
            ),
            None => format!(
                "POINT({} {})",
                format_float(self.x(), maxdd),
                format_float(self.y(), maxdd)
            ),
        }
    }
}

/// Split a leading `SRID=n;` prefix.
pub(crate) fn split_srid(text: &str) -> Result<(Option<i32>, &str)> {
    let trimmed = text.trim_start();
    if trimmed.len() < 5 || !trimmed[..5].eq_ignore_ascii_case("SRID=") {
        return Ok((None, trimmed));
    }
    let (srid, rest) = trimmed[5..].split_once(';').ok_or_else(|| {
        ChronotopeError::TextInput(format!("Missing ';' after SRID in '{}'", text))
    })?;
    let srid = srid
        .trim()
        .parse::<i32>()
        .map_err(|_| ChronotopeError::TextInput(format!("Invalid SRID '{}'", srid)))?;
    Ok((Some(srid), rest.trim_start()))
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.srid != 0 {
            write!(f, "SRID={};", self.srid)?;
        }
        f.write_str(&self.to_text(crate::config::DEFAULT_FLOAT_DIGITS))
    }
}

impl std::str::FromStr for GeoPoint {
    type Err = ChronotopeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_2d_and_3d() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(3.0, 4.0);
        assert_eq!(a.distance(&b), 5.0);

        let c = GeoPoint::new_3d(0.0, 0.0, 0.0);
        let d = GeoPoint::new_3d(3.0, 4.0, 12.0);
        assert_eq!(c.distance(&d), 13.0);
    }

    #[test]
    fn test_lerp() {
        let a = GeoPoint::new(0.0, 0.0).with_srid(4326);
        let b = GeoPoint::new(10.0, 20.0);
        let mid = a.lerp(&b, 0.5);
        assert_eq!(mid.x(), 5.0);
        assert_eq!(mid.y(), 10.0);
        assert_eq!(mid.srid, 4326);
    }

    #[test]
    fn test_parse_and_print() {
        let p = GeoPoint::parse("SRID=4326;Point(1.5 2)").unwrap();
        assert_eq!(p.srid, 4326);
        assert_eq!(p.to_string(), "SRID=4326;POINT(1.5 2)");

        let z = GeoPoint::parse("POINT Z (1 2 3)").unwrap();
        assert_eq!(z.to_text(15), "POINT Z(1 2 3)");

        assert!(GeoPoint::parse("POINT(1)").is_err());
        assert!(GeoPoint::parse("POINT Z(1 2)").is_err());
        assert!(GeoPoint::parse("LINESTRING(0 0, 1 1)").is_err());
    }
}
