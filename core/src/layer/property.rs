//! Style property values and zoom functions.

use serde::{Deserialize, Serialize};

/// A declared style property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Number(f64),
    String(String),
    /// A numeric value interpolated over zoom.
    Function(ZoomFunction),
}

impl PropertyValue {
    /// Evaluate the value at `zoom`.
    pub fn evaluate(&self, zoom: f32) -> EvaluatedValue {
        match self {
            Self::Number(n) => EvaluatedValue::Number(*n),
            Self::String(s) => EvaluatedValue::String(s.clone()),
            Self::Function(f) => EvaluatedValue::Number(f.evaluate(zoom)),
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<ZoomFunction> for PropertyValue {
    fn from(f: ZoomFunction) -> Self {
        Self::Function(f)
    }
}

/// Exponential interpolation between `(zoom, value)` stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomFunction {
    /// Exponential base; `1.0` interpolates linearly.
    #[serde(default = "default_base")]
    pub base: f64,
    /// Stops sorted by zoom.
    pub stops: Vec<(f32, f64)>,
}

fn default_base() -> f64 {
    1.0
}

impl ZoomFunction {
    /// Create a linear function.
    pub fn linear(stops: Vec<(f32, f64)>) -> Self {
        Self { base: 1.0, stops }
    }

    /// Create an exponential function.
    pub fn exponential(base: f64, stops: Vec<(f32, f64)>) -> Self {
        Self { base, stops }
    }

    /// Evaluate at `zoom`, clamping outside the stop range.
    pub fn evaluate(&self, zoom: f32) -> f64 {
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return 0.0;
        };
        if zoom <= first.0 {
            return first.1;
        }
        if zoom >= last.0 {
            return last.1;
        }

        let upper = self
            .stops
            .iter()
            .position(|(z, _)| *z > zoom)
            .unwrap_or(self.stops.len() - 1);
        let (z0, v0) = self.stops[upper - 1];
        let (z1, v1) = self.stops[upper];

        let t = interpolation_factor(zoom as f64, self.base, z0 as f64, z1 as f64);
        v0 + t * (v1 - v0)
    }
}

fn interpolation_factor(input: f64, base: f64, lower: f64, upper: f64) -> f64 {
    let difference = upper - lower;
    if difference == 0.0 {
        return 0.0;
    }
    let progress = input - lower;
    if base == 1.0 {
        progress / difference
    } else {
        (base.powf(progress) - 1.0) / (base.powf(difference) - 1.0)
    }
}

/// A property value evaluated at a specific zoom.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluatedValue {
    Number(f64),
    String(String),
}

impl EvaluatedValue {
    /// The numeric value, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::String(_) => None,
        }
    }

    /// The string value, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Number(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_function() {
        let f = ZoomFunction::linear(vec![(10.0, 1.0), (20.0, 11.0)]);
        assert_eq!(f.evaluate(5.0), 1.0);
        assert_eq!(f.evaluate(15.0), 6.0);
        assert_eq!(f.evaluate(25.0), 11.0);
    }

    #[test]
    fn test_exponential_function() {
        let f = ZoomFunction::exponential(2.0, vec![(0.0, 0.0), (2.0, 3.0)]);
        // (2^1 - 1) / (2^2 - 1) = 1/3
        assert!((f.evaluate(1.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_fractional_zoom_between_many_stops() {
        let f = ZoomFunction::linear(vec![(0.0, 0.0), (10.0, 10.0), (12.0, 30.0)]);
        assert!((f.evaluate(11.5) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_function() {
        assert_eq!(ZoomFunction::linear(Vec::new()).evaluate(3.0), 0.0);
    }
}
