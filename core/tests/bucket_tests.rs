//! Integration tests for bucket building.
//!
//! # Test Categories
//!
//! - **Group Capacity Tests**: group splitting at the 16-bit vertex ceiling
//! - **Lifecycle Tests**: factory, populate order, trim, and the empty bucket
//! - **Method Sharing Tests**: insertion method identity across buckets
//! - **Payload Tests**: serialized schema and byte round trips

mod common;

use std::sync::Arc;

use rstest::rstest;

use common::{bucket, label_layer, layer, mixed_features, point_grid, square, test_programs};
use tilepack_core::array::ComponentType;
use tilepack_core::bucket::{Bucket, BucketBuffers, BucketOptions};
use tilepack_core::feature::{Feature, FilterExpr, Point};
use tilepack_core::layer::{LayerDescriptor, LayerKind, StyleLayer};
use tilepack_core::method::MethodCache;
use tilepack_core::program::{arg, AttributeSpec, ProgramInterface};
use tilepack_core::serialize::{decode, encode, Format};
use tilepack_core::{BucketError, MAX_GROUP_VERTICES};

// ============================================================================
// Group Capacity Tests
// ============================================================================

fn insert_batches(batches: &[usize]) -> BucketBuffers {
    let mut buffers = BucketBuffers::create(&test_programs(), &MethodCache::new()).unwrap();
    for &count in batches {
        let mut writer = buffers.make_room_for("test", count).unwrap();
        for i in 0..count {
            writer.add_vertex(&[i as f64, 0.0]);
        }
    }
    buffers
}

/// Vertex totals are preserved across groups and no group overflows.
#[rstest]
#[case::many_quads(vec![4; 100], 1)]
#[case::exactly_full(vec![65535, 1], 2)]
#[case::fills_to_boundary(vec![65534, 1, 1], 2)]
#[case::large_batches(vec![30000, 30000, 30000], 2)]
#[case::empty_batches(vec![0, 5, 0, 65530, 1], 2)]
fn test_group_lengths_sum_to_inserted(#[case] batches: Vec<usize>, #[case] expected_groups: usize) {
    let buffers = insert_batches(&batches);
    let groups = buffers.groups("test").unwrap();

    assert_eq!(groups.len(), expected_groups);
    assert_eq!(
        groups.iter().map(|g| g.vertex_length).sum::<usize>(),
        batches.iter().sum::<usize>()
    );
    assert!(groups.iter().all(|g| g.vertex_length <= MAX_GROUP_VERTICES));
    assert_eq!(
        buffers.array("testVertex").unwrap().len(),
        batches.iter().sum::<usize>()
    );
}

/// Groups are contiguous: each starts where the previous one ended.
#[test]
fn test_groups_are_contiguous() {
    let buffers = insert_batches(&[40000, 40000, 40000]);
    let groups = buffers.groups("test").unwrap();
    for pair in groups.windows(2) {
        assert_eq!(
            pair[1].vertex_start_index,
            pair[0].vertex_start_index + pair[0].vertex_length
        );
    }
}

/// Requesting room for zero vertices never opens a group.
#[test]
fn test_zero_vertices_keeps_current_group() {
    let mut buffers = insert_batches(&[100]);
    buffers.make_room_for("test", 0).unwrap();
    assert_eq!(buffers.groups("test").unwrap().len(), 1);

    let mut full = insert_batches(&[MAX_GROUP_VERTICES]);
    full.make_room_for("test", 0).unwrap();
    assert_eq!(full.groups("test").unwrap().len(), 1);
}

/// 16,384 quads split into a group of 65,532 vertices and one of 4.
#[test]
fn test_sixteen_thousand_quads_split_once() {
    let mut bucket = bucket(layer("poi", LayerKind::Circle), 14.0, point_grid(16_384));
    bucket.populate_buffers().unwrap();

    let groups = bucket.buffers().groups("circle").unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].vertex_length, 65_532);
    assert_eq!(groups[1].vertex_length, 4);
    assert_eq!(groups[0].vertex_length + groups[1].vertex_length, 16_384 * 4);

    assert_eq!(groups[1].vertex_start_index, 65_532);
    assert_eq!(groups[1].element_start_index, Some(groups[0].element_length));
    assert_eq!(groups[1].element_length, 2);
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[rstest]
#[case::raster("raster")]
#[case::background("background")]
#[case::hillshade("hillshade")]
fn test_factory_rejects_unsupported_kinds(#[case] kind: &str) {
    let result = Bucket::create(BucketOptions::new(layer("l", LayerKind::parse(kind))));
    assert_eq!(
        result.unwrap_err(),
        BucketError::UnsupportedLayerType(kind.to_string())
    );
}

/// An empty feature list yields no groups and empty trimmed arrays.
#[rstest]
#[case::fill(LayerKind::Fill, &["fill"])]
#[case::line(LayerKind::Line, &["line"])]
#[case::circle(LayerKind::Circle, &["circle"])]
#[case::symbol(LayerKind::Symbol, &["glyph", "icon"])]
fn test_empty_bucket(#[case] kind: LayerKind, #[case] programs: &[&str]) {
    let mut bucket = bucket(layer("empty", kind), 10.0, Vec::new());
    bucket.populate_buffers().unwrap();

    let buffers = bucket.buffers();
    assert_eq!(buffers.program_names().collect::<Vec<_>>(), programs);
    for program in programs {
        assert!(buffers.groups(program).unwrap().is_empty());
    }
    for (_, array) in buffers.arrays() {
        assert!(array.is_empty());
        assert!(array.is_trimmed());
    }

    let payload = bucket.serialize();
    assert!(payload.element_groups.values().all(Vec::is_empty));
    assert!(payload.arrays.values().all(|raw| raw.is_empty() && raw.bytes.is_empty()));
    assert_eq!(
        payload.arrays.keys().collect::<Vec<_>>(),
        payload.array_types.keys().collect::<Vec<_>>()
    );
}

/// Trimming twice changes nothing.
#[test]
fn test_trim_is_idempotent() {
    let mut bucket = bucket(layer("roads", LayerKind::Line), 12.0, mixed_features());
    bucket.populate_buffers().unwrap();

    let before: Vec<_> = bucket
        .buffers()
        .arrays()
        .map(|(name, array)| (name.to_string(), array.len(), array.capacity()))
        .collect();
    bucket.trim_arrays();
    let after: Vec<_> = bucket
        .buffers()
        .arrays()
        .map(|(name, array)| (name.to_string(), array.len(), array.capacity()))
        .collect();

    assert_eq!(before, after);
    assert_eq!(bucket.serialize(), bucket.serialize());
}

/// The filter is compiled once and never applied by `populate_buffers`.
#[test]
fn test_filter_is_cached_and_not_applied() {
    let layer = Arc::new(StyleLayer::create(
        LayerDescriptor::new("poi", LayerKind::Circle)
            .with_filter(FilterExpr::Eq("class".into(), "shop".into())),
    ));
    let shop = Feature::point(10, 10).with_property("class", "shop");
    let school = Feature::point(20, 20).with_property("class", "school");
    let mut bucket = bucket(layer, 14.0, vec![shop.clone(), school.clone()]);

    assert!(std::ptr::eq(bucket.filter(), bucket.filter()));
    assert!(bucket.filter().matches(&shop));
    assert!(!bucket.filter().matches(&school));

    bucket.populate_buffers().unwrap();
    assert_eq!(bucket.buffers().groups("circle").unwrap()[0].vertex_length, 8);
}

#[test]
fn test_bucket_metadata_from_options() {
    let layer = Arc::new(StyleLayer::create(
        LayerDescriptor::new("water", LayerKind::Fill)
            .with_source_layer("water")
            .with_zoom_range(4.0, 16.0),
    ));
    let bucket = Bucket::create(
        BucketOptions::new(layer)
            .with_zoom(7.5)
            .with_overscaling(2.0)
            .with_index(3)
            .with_source_layer_index(1),
    )
    .unwrap();

    assert_eq!(bucket.id(), "water");
    assert_eq!(bucket.zoom(), 7.5);
    assert_eq!(bucket.overscaling(), 2.0);
    assert_eq!(bucket.index(), 3);
    assert_eq!(bucket.source_layer(), Some("water"));
    assert_eq!(bucket.source_layer_index(), 1);
    assert_eq!((bucket.min_zoom(), bucket.max_zoom()), (4.0, 16.0));
}

fn fill_positions(bucket: &Bucket) -> Vec<(f64, f64)> {
    let vertices = bucket.buffers().array("fillVertex").unwrap();
    (0..vertices.len())
        .map(|i| {
            (
                vertices.get(i, "pos", 0).unwrap(),
                vertices.get(i, "pos", 1).unwrap(),
            )
        })
        .collect()
}

fn fill_triangles(bucket: &Bucket) -> Vec<[f64; 3]> {
    let elements = bucket.buffers().array("fillElement").unwrap();
    (0..elements.len())
        .map(|i| [0, 1, 2].map(|c| elements.get(i, "vertices", c).unwrap()))
        .collect()
}

#[test]
fn test_buffers_follow_feature_order() {
    let park = Feature::polygon(vec![square(0, 0, 10)]);
    let plaza = Feature::polygon(vec![vec![
        Point::new(100, 100),
        Point::new(200, 100),
        Point::new(150, 200),
        Point::new(100, 100),
    ]]);
    let park_positions = vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)];
    let plaza_positions = vec![(100.0, 100.0), (200.0, 100.0), (150.0, 200.0), (100.0, 100.0)];

    let mut forward = bucket(
        layer("parks", LayerKind::Fill),
        10.0,
        vec![park.clone(), plaza.clone()],
    );
    forward.populate_buffers().unwrap();
    let mut reversed = bucket(layer("parks", LayerKind::Fill), 10.0, vec![plaza, park]);
    reversed.populate_buffers().unwrap();

    assert_eq!(
        fill_positions(&forward),
        [park_positions.clone(), plaza_positions.clone()].concat()
    );
    assert_eq!(fill_positions(&reversed), [plaza_positions, park_positions].concat());

    assert_eq!(
        fill_triangles(&forward),
        [
            [0.0, 1.0, 2.0],
            [0.0, 2.0, 3.0],
            [0.0, 3.0, 4.0],
            [5.0, 6.0, 7.0],
            [5.0, 7.0, 8.0],
        ]
    );
    assert_eq!(
        fill_triangles(&reversed),
        [
            [0.0, 1.0, 2.0],
            [0.0, 2.0, 3.0],
            [4.0, 5.0, 6.0],
            [4.0, 6.0, 7.0],
            [4.0, 7.0, 8.0],
        ]
    );
}

// ============================================================================
// Method Sharing Tests
// ============================================================================

/// Separate buckets and separate programs with the same layout share one
/// method instance.
#[test]
fn test_identical_layouts_share_method_across_buckets() {
    let mut first = bucket(label_layer("labels-a"), 14.0, mixed_features());
    let mut second = bucket(label_layer("labels-b"), 15.0, Vec::new());
    first.populate_buffers().unwrap();
    second.populate_buffers().unwrap();

    let glyph = first.buffers().vertex_add_method("glyph").unwrap();
    let icon = second.buffers().vertex_add_method("icon").unwrap();
    assert!(Arc::ptr_eq(glyph, icon));
}

/// A hand-built interface matching the circle layout hits the global cache.
#[test]
fn test_structural_match_hits_global_cache() {
    let mut circles = bucket(layer("poi", LayerKind::Circle), 14.0, Vec::new());
    circles.create_arrays().unwrap();

    let lookalike = ProgramInterface::vertex(
        ["x", "y", "extrude_x", "extrude_y"],
        vec![AttributeSpec::new(
            "pos",
            ComponentType::Int16,
            vec![
                arg("x") * 2.0 + (arg("extrude_x") + 1.0) / 2.0,
                arg("y") * 2.0 + (arg("extrude_y") + 1.0) / 2.0,
            ],
        )],
    );
    let method = MethodCache::global()
        .vertex_add_method("lookalike", &lookalike)
        .unwrap();

    assert!(Arc::ptr_eq(
        &method,
        circles.buffers().vertex_add_method("circle").unwrap()
    ));
}

// ============================================================================
// Payload Tests
// ============================================================================

#[rstest]
#[case::fill(LayerKind::Fill, &["fillElement", "fillSecondElement", "fillVertex"])]
#[case::line(LayerKind::Line, &["lineElement", "lineVertex"])]
#[case::circle(LayerKind::Circle, &["circleElement", "circleVertex"])]
#[case::symbol(LayerKind::Symbol, &["glyphElement", "glyphVertex", "iconElement", "iconVertex"])]
fn test_payload_schema(#[case] kind: LayerKind, #[case] buffer_names: &[&str]) {
    let mut bucket = bucket(layer("layer", kind.clone()), 11.0, mixed_features());
    bucket.populate_buffers().unwrap();
    let payload = bucket.serialize();

    assert_eq!(payload.layer.id, "layer");
    assert_eq!(payload.layer.kind, kind.as_str());
    assert_eq!(payload.zoom, 11.0);
    assert_eq!(payload.arrays.keys().collect::<Vec<_>>(), buffer_names);
    for (name, raw) in &payload.arrays {
        let array_type = &payload.array_types[name];
        assert_eq!(raw.bytes.len(), raw.length * array_type.size);
        assert_eq!(array_type.is_element(), name.ends_with("Element"));
    }
}

#[rstest]
#[case::fill(LayerKind::Fill)]
#[case::line(LayerKind::Line)]
#[case::circle(LayerKind::Circle)]
#[case::symbol(LayerKind::Symbol)]
fn test_bincode_round_trip(#[case] kind: LayerKind) {
    let layer = Arc::new(StyleLayer::create(
        LayerDescriptor::new("layer", kind)
            .with_layout("text-field", "{name}")
            .with_layout("icon-image", "marker"),
    ));
    let mut bucket = bucket(layer, 13.0, mixed_features());
    bucket.populate_buffers().unwrap();

    let payload = bucket.serialize();
    assert!(payload.vertex_count() > 0);
    let bytes = encode(&payload, Format::Bincode).unwrap();
    assert_eq!(decode(&bytes, Format::Bincode).unwrap(), payload);
}
