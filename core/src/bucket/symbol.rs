//! Symbol tessellation.
//!
//! Labels are laid out as one quad per glyph of the resolved `text-field`
//! and icons as one quad per resolved `icon-image`. Both programs share a
//! single vertex layout, so both resolve to the same insertion method.

use std::sync::LazyLock;

use crate::array::ComponentType;
use crate::feature::{Feature, GeometryType, Point, Value};
use crate::layer::EvaluatedLayer;
use crate::program::{arg, lit, AttributeSpec, ProgramInterface, ProgramInterfaces};

use super::{BucketBuffers, BucketVariant, GroupWriter};

pub(crate) const GLYPH_PROGRAM: &str = "glyph";
pub(crate) const ICON_PROGRAM: &str = "icon";

/// Offsets are stored in 1/64 of a pixel.
const OFFSET_SCALE: f64 = 64.0;
/// Largest offset, in pixels, that fits the 16-bit offset attribute.
const MAX_OFFSET: f64 = i16::MAX as f64 / OFFSET_SCALE;
/// Glyph metrics at a text size of 24.
const GLYPH_ADVANCE: f64 = 14.0;
const GLYPH_HEIGHT: f64 = 24.0;
const GLYPH_ATLAS_CELL: f64 = 24.0;
const GLYPH_ATLAS_COLUMNS: u32 = 16;
const ONE_EM: f64 = 24.0;
/// Icon edge length at an icon size of 1.
const ICON_SIZE: f64 = 16.0;
/// Symbols are hidden above this zoom; stored scaled by 10 in a byte.
const MAX_SYMBOL_ZOOM: f64 = 25.0;

fn symbol_interface() -> ProgramInterface {
    ProgramInterface::vertex(
        ["x", "y", "ox", "oy", "tx", "ty", "min_zoom", "max_zoom", "label_min_zoom"],
        vec![
            AttributeSpec::new("pos", ComponentType::Int16, vec![arg("x"), arg("y")]),
            AttributeSpec::new(
                "offset",
                ComponentType::Int16,
                vec![
                    (arg("ox") * OFFSET_SCALE + 0.5).floor(),
                    (arg("oy") * OFFSET_SCALE + 0.5).floor(),
                ],
            ),
            AttributeSpec::new(
                "data1",
                ComponentType::Uint8,
                vec![
                    arg("tx") / 4.0,
                    arg("ty") / 4.0,
                    arg("label_min_zoom") * 10.0,
                    lit(0.0),
                ],
            ),
            AttributeSpec::new(
                "data2",
                ComponentType::Uint8,
                vec![arg("min_zoom") * 10.0, arg("max_zoom") * 10.0],
            ),
        ],
    )
    .with_element_buffer(3)
}

static PROGRAMS: LazyLock<ProgramInterfaces> = LazyLock::new(|| {
    ProgramInterfaces::new()
        .with_program(GLYPH_PROGRAM, symbol_interface())
        .with_program(ICON_PROGRAM, symbol_interface())
});

/// Quad corners as `(offset x, offset y, texture x, texture y)`.
type Quad = [(f64, f64, f64, f64); 4];

/// Bucket variant for `symbol` layers.
#[derive(Debug, Clone, Default)]
pub struct SymbolBucket;

impl SymbolBucket {
    /// Quads reaching further than [`MAX_OFFSET`] from the anchor are dropped.
    fn add_quad(buffers: &mut BucketBuffers, program: &str, anchor: Point, quad: Quad) {
        if quad
            .iter()
            .any(|&(ox, oy, ..)| ox.abs() > MAX_OFFSET || oy.abs() > MAX_OFFSET)
        {
            log::debug!("SymbolBucket: dropping {} quad beyond the offset range", program);
            return;
        }
        let Some(mut writer) = buffers.make_room_for(program, 4) else {
            return;
        };
        let indices = quad.map(|corner| add_corner(&mut writer, anchor, corner));
        writer.add_element(&[indices[0], indices[1], indices[2]]);
        writer.add_element(&[indices[0], indices[2], indices[3]]);
    }

    fn add_text(buffers: &mut BucketBuffers, anchor: Point, text: &str, size: f64, spacing: f64) {
        let scale = size / ONE_EM;
        let glyphs = text.chars().count() as f64;
        let advance = (GLYPH_ADVANCE + spacing * ONE_EM) * scale;
        let half_height = GLYPH_HEIGHT * scale / 2.0;
        let mut left = -advance * glyphs / 2.0;

        for ch in text.chars() {
            if !ch.is_whitespace() {
                let code = u32::from(ch);
                let tx = f64::from(code % GLYPH_ATLAS_COLUMNS) * GLYPH_ATLAS_CELL;
                let ty = f64::from((code / GLYPH_ATLAS_COLUMNS) % GLYPH_ATLAS_COLUMNS)
                    * GLYPH_ATLAS_CELL;
                let right = left + GLYPH_ADVANCE * scale;
                let quad = [
                    (left, -half_height, tx, ty),
                    (right, -half_height, tx + GLYPH_ATLAS_CELL, ty),
                    (right, half_height, tx + GLYPH_ATLAS_CELL, ty + GLYPH_ATLAS_CELL),
                    (left, half_height, tx, ty + GLYPH_ATLAS_CELL),
                ];
                Self::add_quad(buffers, GLYPH_PROGRAM, anchor, quad);
            }
            left += advance;
        }
    }

    fn add_icon(buffers: &mut BucketBuffers, anchor: Point, size: f64) {
        let half = ICON_SIZE * size / 2.0;
        let quad = [
            (-half, -half, 0.0, 0.0),
            (half, -half, ICON_SIZE, 0.0),
            (half, half, ICON_SIZE, ICON_SIZE),
            (-half, half, 0.0, ICON_SIZE),
        ];
        Self::add_quad(buffers, ICON_PROGRAM, anchor, quad);
    }
}

fn add_corner(writer: &mut GroupWriter<'_>, anchor: Point, corner: (f64, f64, f64, f64)) -> u16 {
    let (ox, oy, tx, ty) = corner;
    writer.add_vertex(&[
        f64::from(anchor.x),
        f64::from(anchor.y),
        ox,
        oy,
        tx,
        ty,
        0.0,
        MAX_SYMBOL_ZOOM,
        0.0,
    ])
}

impl BucketVariant for SymbolBucket {
    fn program_interfaces(&self) -> &'static ProgramInterfaces {
        &PROGRAMS
    }

    fn add_feature(
        &mut self,
        buffers: &mut BucketBuffers,
        layer: &EvaluatedLayer,
        feature: &Feature,
    ) {
        let text = layer
            .layout_str("text-field")
            .map(|field| resolve_tokens(field, feature))
            .filter(|text| !text.trim().is_empty());
        let icon = layer
            .layout_str("icon-image")
            .map(|image| resolve_tokens(image, feature))
            .filter(|image| !image.is_empty());
        if text.is_none() && icon.is_none() {
            return;
        }

        let text_size = layer.layout_number("text-size").unwrap_or(16.0);
        let spacing = layer.layout_number("text-letter-spacing").unwrap_or(0.0);
        let icon_size = layer.layout_number("icon-size").unwrap_or(1.0);

        for anchor in anchors(feature) {
            if icon.is_some() {
                Self::add_icon(buffers, anchor, icon_size);
            }
            if let Some(text) = &text {
                Self::add_text(buffers, anchor, text, text_size, spacing);
            }
        }
    }
}

/// Label anchors: every point of a point feature, the middle vertex of each
/// line, and the first vertex of a polygon's outer ring.
fn anchors(feature: &Feature) -> Vec<Point> {
    match feature.geometry_type {
        GeometryType::Point => feature.geometry.iter().flatten().copied().collect(),
        GeometryType::LineString => feature
            .geometry
            .iter()
            .filter_map(|line| line.get(line.len() / 2).copied())
            .collect(),
        GeometryType::Polygon => feature
            .geometry
            .first()
            .and_then(|ring| ring.first().copied())
            .into_iter()
            .collect(),
    }
}

/// Replace `{name}` tokens with the feature's property values.
///
/// Missing properties resolve to an empty string; an unterminated `{` is
/// kept literally.
pub fn resolve_tokens(template: &str, feature: &Feature) -> String {
    let mut resolved = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}') else {
            break;
        };
        resolved.push_str(&rest[..open]);
        let key = &rest[open + 1..open + close];
        match feature.property(key) {
            Some(Value::String(s)) => resolved.push_str(s),
            Some(Value::Number(n)) => resolved.push_str(&n.to_string()),
            Some(Value::Bool(b)) => resolved.push_str(&b.to_string()),
            Some(Value::Null) | None => {}
        }
        rest = &rest[open + close + 1..];
    }
    resolved.push_str(rest);
    resolved
}
