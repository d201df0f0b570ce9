//! Style layers.
//!
//! A [`LayerDescriptor`] is the plain declarative description of a style
//! layer. [`StyleLayer::create`] resolves it (kind-specific defaults filled
//! in) into the immutable value buckets are constructed with, and
//! [`StyleLayer::recalculate`] evaluates its zoom-dependent properties into an
//! [`EvaluatedLayer`] for tessellation.

mod property;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::feature::FilterExpr;

pub use property::{EvaluatedValue, PropertyValue, ZoomFunction};

/// Kind tag of a style layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LayerKind {
    Fill,
    Line,
    Circle,
    Symbol,
    /// Any other style layer type (`raster`, `background`, ...).
    Other(String),
}

impl LayerKind {
    /// Parse a style layer type name.
    pub fn parse(name: &str) -> Self {
        match name {
            "fill" => Self::Fill,
            "line" => Self::Line,
            "circle" => Self::Circle,
            "symbol" => Self::Symbol,
            other => Self::Other(other.to_string()),
        }
    }

    /// The style layer type name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Fill => "fill",
            Self::Line => "line",
            Self::Circle => "circle",
            Self::Symbol => "symbol",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for LayerKind {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<LayerKind> for String {
    fn from(kind: LayerKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarative description of a style layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    #[serde(default, rename = "source-layer")]
    pub source_layer: Option<String>,
    #[serde(default, rename = "minzoom")]
    pub min_zoom: Option<f32>,
    #[serde(default, rename = "maxzoom")]
    pub max_zoom: Option<f32>,
    #[serde(default)]
    pub filter: Option<FilterExpr>,
    #[serde(default)]
    pub layout: BTreeMap<String, PropertyValue>,
    #[serde(default)]
    pub paint: BTreeMap<String, PropertyValue>,
}

impl LayerDescriptor {
    /// Create a descriptor with no filter and no properties.
    pub fn new(id: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id: id.into(),
            kind,
            source_layer: None,
            min_zoom: None,
            max_zoom: None,
            filter: None,
            layout: BTreeMap::new(),
            paint: BTreeMap::new(),
        }
    }

    /// Set the source layer name.
    pub fn with_source_layer(mut self, source_layer: impl Into<String>) -> Self {
        self.source_layer = Some(source_layer.into());
        self
    }

    /// Set the zoom range.
    pub fn with_zoom_range(mut self, min_zoom: f32, max_zoom: f32) -> Self {
        self.min_zoom = Some(min_zoom);
        self.max_zoom = Some(max_zoom);
        self
    }

    /// Set the filter expression.
    pub fn with_filter(mut self, filter: FilterExpr) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set a layout property.
    pub fn with_layout(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.layout.insert(name.to_string(), value.into());
        self
    }

    /// Set a paint property.
    pub fn with_paint(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.paint.insert(name.to_string(), value.into());
        self
    }
}

/// Zoom state a layer is recalculated against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomHistory {
    pub last_integer_zoom: f32,
    pub last_integer_zoom_time: f64,
    pub last_zoom: f32,
}

impl ZoomHistory {
    /// History with no prior integer zoom, used when building buckets.
    pub fn neutral() -> Self {
        Self {
            last_integer_zoom: f32::INFINITY,
            last_integer_zoom_time: 0.0,
            last_zoom: 0.0,
        }
    }

    /// Whether an integer zoom has been recorded.
    pub fn has_integer_zoom(&self) -> bool {
        self.last_integer_zoom.is_finite()
    }
}

impl Default for ZoomHistory {
    fn default() -> Self {
        Self::neutral()
    }
}

/// A resolved style layer.
///
/// Immutable once created; buckets share it through an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleLayer {
    descriptor: LayerDescriptor,
}

impl StyleLayer {
    /// Resolve a descriptor, filling in kind-specific property defaults.
    pub fn create(mut descriptor: LayerDescriptor) -> Self {
        for (name, value) in layout_defaults(&descriptor.kind) {
            descriptor
                .layout
                .entry(name.to_string())
                .or_insert_with(|| PropertyValue::Number(*value));
        }
        for (name, value) in paint_defaults(&descriptor.kind) {
            descriptor
                .paint
                .entry(name.to_string())
                .or_insert_with(|| PropertyValue::Number(*value));
        }
        Self { descriptor }
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn kind(&self) -> &LayerKind {
        &self.descriptor.kind
    }

    pub fn source_layer(&self) -> Option<&str> {
        self.descriptor.source_layer.as_deref()
    }

    /// Minimum zoom, `0` when unset.
    pub fn min_zoom(&self) -> f32 {
        self.descriptor.min_zoom.unwrap_or(0.0)
    }

    /// Maximum zoom, unbounded when unset.
    pub fn max_zoom(&self) -> f32 {
        self.descriptor.max_zoom.unwrap_or(f32::INFINITY)
    }

    pub fn filter(&self) -> Option<&FilterExpr> {
        self.descriptor.filter.as_ref()
    }

    /// The resolved descriptor.
    pub fn descriptor(&self) -> &LayerDescriptor {
        &self.descriptor
    }

    /// Evaluate every layout and paint property at `zoom`.
    pub fn recalculate(&self, zoom: f32, history: &ZoomHistory) -> EvaluatedLayer {
        let evaluate = |props: &BTreeMap<String, PropertyValue>| {
            props
                .iter()
                .map(|(name, value)| (name.clone(), value.evaluate(zoom)))
                .collect()
        };
        EvaluatedLayer {
            zoom,
            history: *history,
            layout: evaluate(&self.descriptor.layout),
            paint: evaluate(&self.descriptor.paint),
        }
    }
}

type Defaults = &'static [(&'static str, f64)];

fn layout_defaults(kind: &LayerKind) -> Defaults {
    match kind {
        LayerKind::Line => &[("line-miter-limit", 2.0)],
        LayerKind::Symbol => &[
            ("text-size", 16.0),
            ("text-max-size", 16.0),
            ("text-letter-spacing", 0.0),
            ("icon-size", 1.0),
        ],
        LayerKind::Fill | LayerKind::Circle | LayerKind::Other(_) => &[],
    }
}

fn paint_defaults(kind: &LayerKind) -> Defaults {
    match kind {
        LayerKind::Fill => &[("fill-opacity", 1.0)],
        LayerKind::Line => &[("line-width", 1.0), ("line-opacity", 1.0)],
        LayerKind::Circle => &[("circle-radius", 5.0), ("circle-blur", 0.0)],
        LayerKind::Symbol => &[("text-opacity", 1.0), ("icon-opacity", 1.0)],
        LayerKind::Other(_) => &[],
    }
}

/// Layout and paint properties of a layer evaluated at one zoom.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedLayer {
    zoom: f32,
    history: ZoomHistory,
    layout: BTreeMap<String, EvaluatedValue>,
    paint: BTreeMap<String, EvaluatedValue>,
}

impl EvaluatedLayer {
    /// The zoom the properties were evaluated at.
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// The zoom history used for evaluation.
    pub fn history(&self) -> &ZoomHistory {
        &self.history
    }

    pub fn layout(&self, name: &str) -> Option<&EvaluatedValue> {
        self.layout.get(name)
    }

    pub fn paint(&self, name: &str) -> Option<&EvaluatedValue> {
        self.paint.get(name)
    }

    /// A numeric layout property.
    pub fn layout_number(&self, name: &str) -> Option<f64> {
        self.layout(name).and_then(EvaluatedValue::as_number)
    }

    /// A string layout property.
    pub fn layout_str(&self, name: &str) -> Option<&str> {
        self.layout(name).and_then(EvaluatedValue::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_kind_parse() {
        assert_eq!(LayerKind::parse("circle"), LayerKind::Circle);
        assert_eq!(
            LayerKind::parse("raster"),
            LayerKind::Other("raster".to_string())
        );
        assert_eq!(LayerKind::Other("raster".into()).to_string(), "raster");
    }

    #[test]
    fn test_create_fills_defaults_without_overriding() {
        let layer = StyleLayer::create(
            LayerDescriptor::new("labels", LayerKind::Symbol).with_layout("text-size", 24.0),
        );
        let evaluated = layer.recalculate(10.0, &ZoomHistory::neutral());
        assert_eq!(evaluated.layout_number("text-size"), Some(24.0));
        assert_eq!(evaluated.layout_number("icon-size"), Some(1.0));
    }

    #[test]
    fn test_recalculate_at_fractional_zoom() {
        let layer = StyleLayer::create(
            LayerDescriptor::new("roads", LayerKind::Line)
                .with_paint("line-width", ZoomFunction::linear(vec![(10.0, 1.0), (12.0, 5.0)])),
        );
        let evaluated = layer.recalculate(10.5, &ZoomHistory::neutral());
        assert_eq!(evaluated.zoom(), 10.5);
        assert_eq!(
            evaluated.paint("line-width").and_then(EvaluatedValue::as_number),
            Some(2.0)
        );
        assert!(!evaluated.history().has_integer_zoom());
    }

    #[test]
    fn test_zoom_range_defaults() {
        let layer = StyleLayer::create(LayerDescriptor::new("water", LayerKind::Fill));
        assert_eq!(layer.min_zoom(), 0.0);
        assert!(layer.max_zoom().is_infinite());
    }
}
