//! Fill tessellation.
//!
//! Each polygon ring becomes a triangle fan around its first vertex plus a
//! closed outline of line segments. Fans of overlapping rings are resolved
//! with the stencil buffer at draw time, so no triangulation happens here.

use std::sync::LazyLock;

use crate::array::ComponentType;
use crate::feature::{Feature, GeometryType};
use crate::group::MAX_GROUP_VERTICES;
use crate::layer::EvaluatedLayer;
use crate::program::{arg, AttributeSpec, ProgramInterface, ProgramInterfaces};

use super::{BucketBuffers, BucketVariant};

pub(crate) const PROGRAM: &str = "fill";

static PROGRAMS: LazyLock<ProgramInterfaces> = LazyLock::new(|| {
    ProgramInterfaces::new().with_program(
        PROGRAM,
        ProgramInterface::vertex(
            ["x", "y"],
            vec![AttributeSpec::new(
                "pos",
                ComponentType::Int16,
                vec![arg("x"), arg("y")],
            )],
        )
        .with_element_buffer(3)
        .with_second_element_buffer(2),
    )
});

/// Bucket variant for `fill` layers.
#[derive(Debug, Clone, Default)]
pub struct FillBucket;

impl BucketVariant for FillBucket {
    fn program_interfaces(&self) -> &'static ProgramInterfaces {
        &PROGRAMS
    }

    fn add_feature(
        &mut self,
        buffers: &mut BucketBuffers,
        _layer: &EvaluatedLayer,
        feature: &Feature,
    ) {
        if feature.geometry_type != GeometryType::Polygon {
            return;
        }

        for ring in &feature.geometry {
            if ring.len() < 3 {
                continue;
            }
            if ring.len() > MAX_GROUP_VERTICES {
                log::warn!(
                    "FillBucket: skipping ring of {} vertices in feature {:?}",
                    ring.len(),
                    feature.id
                );
                continue;
            }

            let Some(mut writer) = buffers.make_room_for(PROGRAM, ring.len()) else {
                return;
            };
            let first = writer.add_vertex(&[f64::from(ring[0].x), f64::from(ring[0].y)]);
            let mut previous = first;
            for point in &ring[1..] {
                let current = writer.add_vertex(&[f64::from(point.x), f64::from(point.y)]);
                if previous != first {
                    writer.add_element(&[first, previous, current]);
                }
                writer.add_second_element(&[previous, current]);
                previous = current;
            }
        }
    }
}
