//! Line tessellation: one extruded quad per segment.

use std::sync::LazyLock;

use crate::array::ComponentType;
use crate::feature::{Feature, GeometryType, Point};
use crate::layer::EvaluatedLayer;
use crate::program::{arg, AttributeSpec, ProgramInterface, ProgramInterfaces};

use super::{BucketBuffers, BucketVariant};

pub(crate) const PROGRAM: &str = "line";

/// Scale of the unit extrusion vector stored in a signed byte range.
const EXTRUDE_SCALE: f64 = 63.0;

/// Distance along the line is stored in units of this many tile units.
const LINE_DISTANCE_UNIT: f64 = 2.0;

/// Scaled distances take 14 bits: the low 6 share a byte with the direction,
/// the high 8 get their own. Longer lines wrap around.
const LINE_DISTANCE_WRAP: u32 = 1 << 14;

/// The up-flag of each vertex is packed into the low bit of the doubled
/// coordinate, which is why positions only have 15 usable bits.
static PROGRAMS: LazyLock<ProgramInterfaces> = LazyLock::new(|| {
    ProgramInterfaces::new().with_program(
        PROGRAM,
        ProgramInterface::vertex(
            ["x", "y", "round", "up", "extrude_x", "extrude_y", "dir_distance", "distance_high"],
            vec![
                AttributeSpec::new(
                    "pos",
                    ComponentType::Int16,
                    vec![arg("x") * 2.0 + arg("round"), arg("y") * 2.0 + arg("up")],
                ),
                AttributeSpec::new(
                    "data",
                    ComponentType::Uint8,
                    vec![
                        (arg("extrude_x") * EXTRUDE_SCALE + 0.5).floor() + 128.0,
                        (arg("extrude_y") * EXTRUDE_SCALE + 0.5).floor() + 128.0,
                        arg("dir_distance"),
                        arg("distance_high"),
                    ],
                ),
            ],
        )
        .with_element_buffer(3),
    )
});

/// Pack the segment direction and the distance along the line into two
/// bytes: `(distance_low << 2) | (dir + 1)` and `distance_high`.
fn pack_direction_distance(dir: i8, so_far: f64) -> (f64, f64) {
    let scaled = (so_far / LINE_DISTANCE_UNIT).floor() as u32 % LINE_DISTANCE_WRAP;
    let direction = (i32::from(dir) + 1) as u32;
    let low = ((scaled & 0x3f) << 2) | direction;
    (f64::from(low), f64::from(scaled >> 6))
}

/// Bucket variant for `line` layers.
#[derive(Debug, Clone, Default)]
pub struct LineBucket;

impl LineBucket {
    fn add_line(&self, buffers: &mut BucketBuffers, points: &[Point]) {
        let mut distance = 0.0;

        for segment in points.windows(2) {
            let (a, b) = (segment[0], segment[1]);
            let dx = f64::from(b.x) - f64::from(a.x);
            let dy = f64::from(b.y) - f64::from(a.y);
            let length = dx.hypot(dy);
            if length == 0.0 {
                continue;
            }
            let (nx, ny) = (-dy / length, dx / length);

            let Some(mut writer) = buffers.make_room_for(PROGRAM, 4) else {
                return;
            };
            let mut corner = |point: Point, up: bool, dir: i8, so_far: f64| {
                let sign = if up { 1.0 } else { -1.0 };
                let (dir_distance, distance_high) = pack_direction_distance(dir, so_far);
                writer.add_vertex(&[
                    f64::from(point.x),
                    f64::from(point.y),
                    0.0,
                    f64::from(u8::from(up)),
                    nx * sign,
                    ny * sign,
                    dir_distance,
                    distance_high,
                ])
            };
            let a_up = corner(a, true, 1, distance);
            let a_down = corner(a, false, 1, distance);
            distance += length;
            let b_up = corner(b, true, -1, distance);
            let b_down = corner(b, false, -1, distance);

            writer.add_element(&[a_up, a_down, b_up]);
            writer.add_element(&[a_down, b_up, b_down]);
        }
    }
}

impl BucketVariant for LineBucket {
    fn program_interfaces(&self) -> &'static ProgramInterfaces {
        &PROGRAMS
    }

    fn add_feature(
        &mut self,
        buffers: &mut BucketBuffers,
        _layer: &EvaluatedLayer,
        feature: &Feature,
    ) {
        if feature.geometry_type == GeometryType::Point {
            return;
        }
        for line in &feature.geometry {
            self.add_line(buffers, line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{LayerDescriptor, LayerKind, StyleLayer, ZoomHistory};
    use crate::method::MethodCache;

    #[test]
    fn test_two_triangles_per_segment() {
        let layer = StyleLayer::create(LayerDescriptor::new("roads", LayerKind::Line))
            .recalculate(10.0, &ZoomHistory::neutral());
        let mut variant = LineBucket;
        let mut buffers =
            BucketBuffers::create(variant.program_interfaces(), &MethodCache::new()).unwrap();

        let road = Feature::line(vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 0),
            Point::new(10, 10),
        ]);
        variant.add_feature(&mut buffers, &layer, &road);

        let group = buffers.groups(PROGRAM).unwrap()[0];
        assert_eq!(group.vertex_length, 8);
        assert_eq!(group.element_length, 4);

        let vertices = buffers.array("lineVertex").unwrap();
        // Up vertex: doubled coordinate with the up bit set, normal (0, 1).
        assert_eq!(vertices.get(0, "pos", 1), Some(1.0));
        assert_eq!(vertices.get(0, "data", 1), Some(191.0));
        assert_eq!(vertices.get(1, "data", 1), Some(65.0));
        // Second segment starts 10 units in: (5 << 2) | forward.
        assert_eq!(vertices.get(4, "data", 2), Some(22.0));
        assert_eq!(vertices.get(4, "data", 3), Some(0.0));
    }

    #[test]
    fn test_long_line_distance_spans_two_bytes() {
        let layer = StyleLayer::create(LayerDescriptor::new("roads", LayerKind::Line))
            .recalculate(10.0, &ZoomHistory::neutral());
        let mut variant = LineBucket;
        let mut buffers =
            BucketBuffers::create(variant.program_interfaces(), &MethodCache::new()).unwrap();

        let road = Feature::line(vec![Point::new(0, 0), Point::new(600, 0), Point::new(1200, 0)]);
        variant.add_feature(&mut buffers, &layer, &road);

        let vertices = buffers.array("lineVertex").unwrap();
        let unpack = |index: usize| {
            let low = vertices.get(index, "data", 2).unwrap() as u32;
            let high = vertices.get(index, "data", 3).unwrap() as u32;
            (low & 0x3, (low >> 2) + (high << 6))
        };
        // Start of the second segment, heading forward.
        assert_eq!(unpack(4), (2, 300));
        // End of the line, heading backward.
        assert_eq!(unpack(6), (0, 600));
    }

    #[test]
    fn test_distance_wraps() {
        assert_eq!(pack_direction_distance(1, 0.0), (2.0, 0.0));
        assert_eq!(pack_direction_distance(0, 2.0 * 16383.0), (253.0, 255.0));
        assert_eq!(pack_direction_distance(-1, 2.0 * 16384.0), (0.0, 0.0));
    }
}
