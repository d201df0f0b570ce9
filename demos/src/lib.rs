//! # tilepack demos
//!
//! Synthetic tile content for the demo pipelines.
//!
//! ## Available Demos
//!
//! - `tile_pipeline` - Builds buckets on a worker thread and hydrates them on the main thread

use std::sync::Arc;

use tilepack_core::feature::{Feature, FilterExpr, Point, Value, EXTENT};
use tilepack_core::layer::{LayerDescriptor, LayerKind, StyleLayer, ZoomFunction};
use tilepack_core::Bucket;

/// Demos library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const NAMES: [&str; 6] = ["Harbor", "Old Mill", "Station", "Market", "Lighthouse", "Depot"];
const ICONS: [&str; 3] = ["cafe", "rail", ""];

/// A demo style layer of `kind`.
///
/// Every layer filters out features whose `rank` is above 8; see
/// [`visible_features`].
pub fn demo_layer(kind: LayerKind) -> Arc<StyleLayer> {
    let descriptor = LayerDescriptor::new(format!("demo-{}", kind.as_str()), kind.clone())
        .with_source_layer("demo")
        .with_filter(FilterExpr::Le("rank".to_string(), Value::Number(8.0)));

    let descriptor = match kind {
        LayerKind::Line => descriptor.with_paint(
            "line-width",
            ZoomFunction::exponential(1.5, vec![(5.0, 0.5), (18.0, 12.0)]),
        ),
        LayerKind::Circle => descriptor.with_paint("circle-radius", 4.0),
        LayerKind::Symbol => descriptor
            .with_layout("text-field", "{name}")
            .with_layout("icon-image", "{maki}"),
        _ => descriptor,
    };
    Arc::new(StyleLayer::create(descriptor))
}

/// `count` deterministic features suited to `kind`.
///
/// Features are spread over a grid covering the tile; each carries a
/// `name`, a `maki` icon name and a `rank` between 0 and 9.
pub fn synthetic_features(kind: &LayerKind, count: usize) -> Vec<Feature> {
    let columns = (count as f64).sqrt().ceil().max(1.0) as usize;
    let step = (EXTENT as usize / columns.max(1)).max(4) as i16;

    (0..count)
        .map(|i| {
            let x = (i % columns) as i16 * step;
            let y = (i / columns) as i16 * step;
            let feature = match kind {
                LayerKind::Line => Feature::line(vec![
                    Point::new(x, y),
                    Point::new(x + step / 2, y + step / 4),
                    Point::new(x + step / 2, y + step / 2),
                ]),
                LayerKind::Fill => {
                    let half = step / 2;
                    Feature::polygon(vec![vec![
                        Point::new(x, y),
                        Point::new(x + half, y),
                        Point::new(x + half, y + half),
                        Point::new(x, y + half),
                        Point::new(x, y),
                    ]])
                }
                _ => Feature::point(x, y),
            };
            feature
                .with_id(i as u64)
                .with_property("name", NAMES[i % NAMES.len()])
                .with_property("maki", ICONS[i % ICONS.len()])
                .with_property("rank", (i % 10) as f64)
        })
        .collect()
}

/// Keep the features that pass the filter of `bucket`'s layer.
pub fn visible_features(bucket: &Bucket, mut features: Vec<Feature>) -> Vec<Feature> {
    let filter = bucket.filter();
    features.retain(|feature| filter.matches(feature));
    features
}
