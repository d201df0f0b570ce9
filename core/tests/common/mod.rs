//! Shared fixtures for bucket integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use tilepack_core::array::ComponentType;
use tilepack_core::bucket::{Bucket, BucketOptions};
use tilepack_core::feature::{Feature, Point};
use tilepack_core::layer::{LayerDescriptor, LayerKind, StyleLayer};
use tilepack_core::program::{arg, AttributeSpec, ProgramInterface, ProgramInterfaces};

/// Grid spacing of generated point features.
pub const GRID_STEP: i16 = 64;
/// Points per grid row; `GRID_COLUMNS * GRID_STEP` is the tile extent.
pub const GRID_COLUMNS: usize = 128;

/// A resolved layer of the given kind.
pub fn layer(id: &str, kind: LayerKind) -> Arc<StyleLayer> {
    Arc::new(StyleLayer::create(LayerDescriptor::new(id, kind)))
}

/// A symbol layer labelling features with their `name` property.
pub fn label_layer(id: &str) -> Arc<StyleLayer> {
    Arc::new(StyleLayer::create(
        LayerDescriptor::new(id, LayerKind::Symbol).with_layout("text-field", "{name}"),
    ))
}

/// Create a bucket for `layer` at `zoom` and fill it with `features`.
pub fn bucket(layer: Arc<StyleLayer>, zoom: f32, features: Vec<Feature>) -> Bucket {
    let mut bucket = Bucket::create(BucketOptions::new(layer).with_zoom(zoom)).unwrap();
    bucket.set_features(features);
    bucket
}

/// `count` point features laid out row by row inside the tile.
pub fn point_grid(count: usize) -> Vec<Feature> {
    (0..count)
        .map(|i| {
            let x = (i % GRID_COLUMNS) as i16 * GRID_STEP;
            let y = ((i / GRID_COLUMNS) % GRID_COLUMNS) as i16 * GRID_STEP;
            Feature::point(x, y).with_id(i as u64)
        })
        .collect()
}

/// A square ring, closed.
pub fn square(x: i16, y: i16, size: i16) -> Vec<Point> {
    vec![
        Point::new(x, y),
        Point::new(x + size, y),
        Point::new(x + size, y + size),
        Point::new(x, y + size),
        Point::new(x, y),
    ]
}

/// One feature of every geometry type.
pub fn mixed_features() -> Vec<Feature> {
    vec![
        Feature::point(10, 10).with_property("name", "Cafe"),
        Feature::line(vec![Point::new(0, 0), Point::new(500, 0), Point::new(500, 500)])
            .with_property("name", "Main St"),
        Feature::polygon(vec![square(1000, 1000, 200)]).with_property("name", "Park"),
    ]
}

/// A registry with one vertex-only program named `test` taking `(x, y)`.
pub fn test_programs() -> ProgramInterfaces {
    ProgramInterfaces::new().with_program(
        "test",
        ProgramInterface::vertex(
            ["x", "y"],
            vec![AttributeSpec::new(
                "pos",
                ComponentType::Int16,
                vec![arg("x"), arg("y")],
            )],
        ),
    )
}
