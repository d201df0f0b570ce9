//! Circle tessellation: one extruded quad per point.

use std::sync::LazyLock;

use crate::array::ComponentType;
use crate::feature::{Feature, EXTENT};
use crate::layer::EvaluatedLayer;
use crate::program::{arg, AttributeSpec, ProgramInterface, ProgramInterfaces};

use super::{BucketBuffers, BucketVariant};

pub(crate) const PROGRAM: &str = "circle";

/// The extrusion direction is packed into the low bit of each doubled
/// coordinate, so the shader can grow the quad to the circle radius.
static PROGRAMS: LazyLock<ProgramInterfaces> = LazyLock::new(|| {
    ProgramInterfaces::new().with_program(
        PROGRAM,
        ProgramInterface::vertex(
            ["x", "y", "extrude_x", "extrude_y"],
            vec![AttributeSpec::new(
                "pos",
                ComponentType::Int16,
                vec![
                    arg("x") * 2.0 + (arg("extrude_x") + 1.0) / 2.0,
                    arg("y") * 2.0 + (arg("extrude_y") + 1.0) / 2.0,
                ],
            )],
        )
        .with_element_buffer(3),
    )
});

const CORNERS: [(f64, f64); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

/// Bucket variant for `circle` layers.
#[derive(Debug, Clone, Default)]
pub struct CircleBucket;

impl BucketVariant for CircleBucket {
    fn program_interfaces(&self) -> &'static ProgramInterfaces {
        &PROGRAMS
    }

    fn add_feature(
        &mut self,
        buffers: &mut BucketBuffers,
        _layer: &EvaluatedLayer,
        feature: &Feature,
    ) {
        for point in feature.geometry.iter().flatten() {
            let (x, y) = (i32::from(point.x), i32::from(point.y));
            // Points outside the tile are drawn by the neighboring tile.
            if !(0..EXTENT).contains(&x) || !(0..EXTENT).contains(&y) {
                continue;
            }

            let Some(mut writer) = buffers.make_room_for(PROGRAM, CORNERS.len()) else {
                return;
            };
            let mut indices = [0u16; 4];
            for (index, (ex, ey)) in indices.iter_mut().zip(CORNERS) {
                *index = writer.add_vertex(&[f64::from(x), f64::from(y), ex, ey]);
            }
            writer.add_element(&[indices[0], indices[1], indices[2]]);
            writer.add_element(&[indices[0], indices[3], indices[2]]);
        }
    }
}
