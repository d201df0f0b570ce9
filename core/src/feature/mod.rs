//! Decoded vector tile features.
//!
//! Features are opaque to the bucket core; only variant tessellation reads
//! their geometry and only the [`FeatureFilter`] reads their properties.

mod filter;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use filter::{FeatureFilter, FilterExpr};

/// Size of the tile-local integer coordinate space.
///
/// Positions are stored as signed 16-bit integers. One bit is lost to the
/// sign so features may extend past the left edge of the tile, one bit to
/// the flags the line vertex packs into the coordinate, and one bit so
/// features may extend past the right edge. That leaves 2^13.
pub const EXTENT: i32 = 8192;

/// A point in tile-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i16,
    pub y: i16,
}

impl Point {
    pub fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

/// Geometry type of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
}

impl GeometryType {
    /// Name used by `$type` filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::LineString => "LineString",
            Self::Polygon => "Polygon",
        }
    }
}

/// A feature property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

/// A decoded vector tile feature.
///
/// `geometry` holds one point list per part: the single point of a point
/// feature is `geometry[0][0]`, each line is one part, and each polygon
/// ring is one part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: Option<u64>,
    pub geometry_type: GeometryType,
    pub geometry: Vec<Vec<Point>>,
    pub properties: BTreeMap<String, Value>,
}

impl Feature {
    /// Create a feature without properties.
    pub fn new(geometry_type: GeometryType, geometry: Vec<Vec<Point>>) -> Self {
        Self {
            id: None,
            geometry_type,
            geometry,
            properties: BTreeMap::new(),
        }
    }

    /// A single point feature.
    pub fn point(x: i16, y: i16) -> Self {
        Self::new(GeometryType::Point, vec![vec![Point::new(x, y)]])
    }

    /// A single line feature.
    pub fn line(points: Vec<Point>) -> Self {
        Self::new(GeometryType::LineString, vec![points])
    }

    /// A polygon feature from its rings.
    pub fn polygon(rings: Vec<Vec<Point>>) -> Self {
        Self::new(GeometryType::Polygon, rings)
    }

    /// Set the feature id.
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    /// Set a property.
    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// Look up a property.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Total number of points across all parts.
    pub fn point_count(&self) -> usize {
        self.geometry.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_builders() {
        let feature = Feature::point(10, 20)
            .with_id(7)
            .with_property("name", "a")
            .with_property("rank", 3.0);

        assert_eq!(feature.geometry_type, GeometryType::Point);
        assert_eq!(feature.geometry[0][0], Point::new(10, 20));
        assert_eq!(feature.id, Some(7));
        assert_eq!(feature.property("rank").and_then(Value::as_number), Some(3.0));
        assert_eq!(feature.point_count(), 1);
    }

    #[test]
    fn test_extent_fits_in_i16_with_headroom() {
        assert!(EXTENT * 2 < i16::MAX as i32 + 1);
    }
}
