//! Shared fixtures for hydration tests.

#![allow(dead_code)]

use std::sync::Arc;

use tilepack_core::bucket::{Bucket, BucketOptions, SerializedBucket};
use tilepack_core::feature::{Feature, Point};
use tilepack_core::layer::{LayerDescriptor, LayerKind, StyleLayer};

/// A resolved layer of `kind`; symbol layers label features by `name`.
pub fn layer(id: &str, kind: LayerKind) -> Arc<StyleLayer> {
    let descriptor = LayerDescriptor::new(id, kind.clone());
    let descriptor = match kind {
        LayerKind::Symbol => descriptor.with_layout("text-field", "{name}"),
        _ => descriptor,
    };
    Arc::new(StyleLayer::create(descriptor))
}

/// One feature of every geometry type.
pub fn mixed_features() -> Vec<Feature> {
    let ring = vec![
        Point::new(1000, 1000),
        Point::new(1200, 1000),
        Point::new(1200, 1200),
        Point::new(1000, 1200),
        Point::new(1000, 1000),
    ];
    vec![
        Feature::point(10, 10).with_property("name", "Cafe"),
        Feature::line(vec![Point::new(0, 0), Point::new(500, 0), Point::new(500, 500)])
            .with_property("name", "Main St"),
        Feature::polygon(vec![ring]).with_property("name", "Park"),
    ]
}

/// Build, populate and serialize a bucket of `kind`.
pub fn payload(kind: LayerKind, features: Vec<Feature>) -> SerializedBucket {
    let id = kind.as_str().to_string();
    let layer = layer(&id, kind);
    let mut bucket = Bucket::create(BucketOptions::new(layer).with_zoom(12.0)).unwrap();
    bucket.set_features(features);
    bucket.populate_buffers().unwrap();
    bucket.into_serialized()
}
