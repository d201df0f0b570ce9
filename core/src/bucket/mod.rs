//! Buckets.
//!
//! A [`Bucket`] turns the features of one style layer in one tile into
//! packed vertex and index arrays. The layer kind selects a [`BucketKind`],
//! whose [`BucketVariant`] implementation declares the programs it draws
//! with and tessellates each feature. The bucket itself owns the buffer
//! lifecycle: array creation, the feature loop, trimming, and producing the
//! [`SerializedBucket`] handed to the rendering side.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tilepack_core::bucket::{Bucket, BucketOptions};
//! use tilepack_core::feature::Feature;
//! use tilepack_core::layer::{LayerDescriptor, LayerKind, StyleLayer};
//!
//! let layer = Arc::new(StyleLayer::create(LayerDescriptor::new("poi", LayerKind::Circle)));
//! let mut bucket = Bucket::create(BucketOptions::new(layer).with_zoom(14.0)).unwrap();
//! bucket.set_features(vec![Feature::point(100, 200), Feature::point(300, 400)]);
//! bucket.populate_buffers().unwrap();
//!
//! let groups = bucket.buffers().groups("circle").unwrap();
//! assert_eq!(groups[0].vertex_length, 8);
//! ```

mod buffers;
mod circle;
mod fill;
mod line;
mod symbol;

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::array::{RawArray, StructArrayType};
use crate::error::{BucketError, BucketResult};
use crate::feature::{Feature, FeatureFilter};
use crate::group::ElementGroup;
use crate::layer::{EvaluatedLayer, LayerKind, StyleLayer, ZoomHistory};
use crate::method::MethodCache;
use crate::program::ProgramInterfaces;

pub use buffers::{ArrayHandle, BucketBuffers, BufferArena, GroupWriter};
pub use circle::CircleBucket;
pub use fill::FillBucket;
pub use line::LineBucket;
pub use symbol::{resolve_tokens, SymbolBucket};

/// Layer-kind specific behavior of a bucket.
pub trait BucketVariant {
    /// The programs this variant draws with, in creation order.
    fn program_interfaces(&self) -> &'static ProgramInterfaces;

    /// Tessellate one feature into `buffers`.
    ///
    /// Must call [`BucketBuffers::make_room_for`] before every batch of
    /// vertices so that no group exceeds the vertex ceiling.
    fn add_feature(
        &mut self,
        buffers: &mut BucketBuffers,
        layer: &EvaluatedLayer,
        feature: &Feature,
    );
}

/// The closed set of bucket variants.
#[derive(Debug, Clone)]
pub enum BucketKind {
    Fill(FillBucket),
    Line(LineBucket),
    Circle(CircleBucket),
    Symbol(SymbolBucket),
}

impl BucketKind {
    /// Select the variant for a layer kind.
    pub fn for_layer(kind: &LayerKind) -> BucketResult<Self> {
        match kind {
            LayerKind::Fill => Ok(Self::Fill(FillBucket::default())),
            LayerKind::Line => Ok(Self::Line(LineBucket::default())),
            LayerKind::Circle => Ok(Self::Circle(CircleBucket::default())),
            LayerKind::Symbol => Ok(Self::Symbol(SymbolBucket::default())),
            LayerKind::Other(name) => Err(BucketError::UnsupportedLayerType(name.clone())),
        }
    }

    fn variant(&self) -> &dyn BucketVariant {
        match self {
            Self::Fill(v) => v,
            Self::Line(v) => v,
            Self::Circle(v) => v,
            Self::Symbol(v) => v,
        }
    }

    fn variant_mut(&mut self) -> &mut dyn BucketVariant {
        match self {
            Self::Fill(v) => v,
            Self::Line(v) => v,
            Self::Circle(v) => v,
            Self::Symbol(v) => v,
        }
    }
}

impl BucketVariant for BucketKind {
    fn program_interfaces(&self) -> &'static ProgramInterfaces {
        self.variant().program_interfaces()
    }

    fn add_feature(
        &mut self,
        buffers: &mut BucketBuffers,
        layer: &EvaluatedLayer,
        feature: &Feature,
    ) {
        self.variant_mut().add_feature(buffers, layer, feature);
    }
}

/// Construction options for a [`Bucket`].
#[derive(Debug, Clone)]
pub struct BucketOptions {
    /// Zoom the buffers are built for; may be fractional.
    pub zoom: f32,
    /// Overscaling factor of the tile.
    pub overscaling: f32,
    /// The resolved style layer.
    pub layer: Arc<StyleLayer>,
    /// Draw order of the layer.
    pub index: usize,
    /// Index of the source layer in the tile.
    pub source_layer_index: usize,
}

impl BucketOptions {
    /// Options for `layer` at zoom 0 with no overscaling.
    pub fn new(layer: Arc<StyleLayer>) -> Self {
        Self {
            zoom: 0.0,
            overscaling: 1.0,
            layer,
            index: 0,
            source_layer_index: 0,
        }
    }

    pub fn with_zoom(mut self, zoom: f32) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn with_overscaling(mut self, overscaling: f32) -> Self {
        self.overscaling = overscaling;
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn with_source_layer_index(mut self, source_layer_index: usize) -> Self {
        self.source_layer_index = source_layer_index;
        self
    }
}

/// Packed-buffer representation of one style layer for one tile.
#[derive(Debug)]
pub struct Bucket {
    layer: Arc<StyleLayer>,
    kind: BucketKind,
    zoom: f32,
    overscaling: f32,
    index: usize,
    source_layer_index: usize,
    features: Vec<Feature>,
    buffers: BucketBuffers,
    evaluated: OnceLock<EvaluatedLayer>,
    filter: OnceLock<FeatureFilter>,
}

impl Bucket {
    /// Create the bucket variant matching the layer's kind.
    ///
    /// Fails with [`BucketError::UnsupportedLayerType`] for layer kinds that
    /// have no bucket implementation.
    pub fn create(options: BucketOptions) -> BucketResult<Self> {
        let kind = BucketKind::for_layer(options.layer.kind())?;
        Ok(Self {
            layer: options.layer,
            kind,
            zoom: options.zoom,
            overscaling: options.overscaling,
            index: options.index,
            source_layer_index: options.source_layer_index,
            features: Vec::new(),
            buffers: BucketBuffers::default(),
            evaluated: OnceLock::new(),
            filter: OnceLock::new(),
        })
    }

    /// Id of the owning layer.
    pub fn id(&self) -> &str {
        self.layer.id()
    }

    pub fn kind(&self) -> &BucketKind {
        &self.kind
    }

    pub fn layer(&self) -> &Arc<StyleLayer> {
        &self.layer
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn overscaling(&self) -> f32 {
        self.overscaling
    }

    /// Draw order.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn source_layer(&self) -> Option<&str> {
        self.layer.source_layer()
    }

    pub fn source_layer_index(&self) -> usize {
        self.source_layer_index
    }

    pub fn min_zoom(&self) -> f32 {
        self.layer.min_zoom()
    }

    pub fn max_zoom(&self) -> f32 {
        self.layer.max_zoom()
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Replace the features to build from.
    pub fn set_features(&mut self, features: Vec<Feature>) {
        self.features = features;
    }

    /// Append a feature to build from.
    pub fn push_feature(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn buffers(&self) -> &BucketBuffers {
        &self.buffers
    }

    /// Mutable access for tessellation outside [`populate_buffers`](Self::populate_buffers).
    pub fn buffers_mut(&mut self) -> &mut BucketBuffers {
        &mut self.buffers
    }

    /// The layer's properties evaluated at the bucket zoom.
    ///
    /// Evaluated on first call against a history with no prior integer zoom
    /// and reused afterwards.
    pub fn evaluate_layer(&self) -> &EvaluatedLayer {
        evaluate_once(&self.evaluated, &self.layer, self.zoom)
    }

    /// The layer's feature filter, compiled on first call.
    ///
    /// [`populate_buffers`](Self::populate_buffers) never applies it; callers
    /// select features with it before handing them to the bucket.
    pub fn filter(&self) -> &FeatureFilter {
        self.filter
            .get_or_init(|| FeatureFilter::compile(self.layer.filter()))
    }

    /// Create empty arrays for every program of the variant.
    ///
    /// Any arrays and groups from an earlier call are discarded.
    pub fn create_arrays(&mut self) -> BucketResult<()> {
        self.buffers =
            BucketBuffers::create(self.kind.program_interfaces(), MethodCache::global())?;
        Ok(())
    }

    /// Build the buffers from the bucket's features.
    ///
    /// Evaluates the layer, creates the arrays, tessellates every feature in
    /// order, and trims.
    pub fn populate_buffers(&mut self) -> BucketResult<()> {
        self.evaluate_layer();
        self.create_arrays()?;

        let evaluated = evaluate_once(&self.evaluated, &self.layer, self.zoom);
        for feature in &self.features {
            self.kind.add_feature(&mut self.buffers, evaluated, feature);
        }

        self.trim_arrays();

        if log::log_enabled!(log::Level::Debug) {
            for (program, groups) in self.buffers.element_groups() {
                log::debug!(
                    "Bucket '{}': program '{}' has {} groups, {} vertices",
                    self.id(),
                    program,
                    groups.len(),
                    groups.iter().map(|g| g.vertex_length).sum::<usize>()
                );
            }
        }
        Ok(())
    }

    /// Release spare capacity of every array. Idempotent.
    pub fn trim_arrays(&mut self) {
        self.buffers.trim();
    }

    /// Snapshot the packed result for handoff.
    pub fn serialize(&self) -> SerializedBucket {
        SerializedBucket {
            layer: self.layer_ref(),
            zoom: self.zoom,
            element_groups: self.buffers.element_groups(),
            arrays: self
                .buffers
                .arrays()
                .map(|(name, array)| (name.to_string(), array.serialize()))
                .collect(),
            array_types: self.array_types(),
        }
    }

    /// Consume the bucket into its payload without copying array bytes.
    pub fn into_serialized(self) -> SerializedBucket {
        let layer = self.layer_ref();
        let element_groups = self.buffers.element_groups();
        let array_types = self.array_types();
        SerializedBucket {
            layer,
            zoom: self.zoom,
            element_groups,
            arrays: self
                .buffers
                .into_arrays()
                .map(|(name, array)| (name, array.into_raw()))
                .collect(),
            array_types,
        }
    }

    fn layer_ref(&self) -> LayerRef {
        LayerRef {
            id: self.layer.id().to_string(),
            kind: self.layer.kind().to_string(),
        }
    }

    fn array_types(&self) -> BTreeMap<String, StructArrayType> {
        self.buffers
            .array_types()
            .iter()
            .map(|(name, ty)| (name.clone(), StructArrayType::clone(ty)))
            .collect()
    }
}

fn evaluate_once<'a>(
    cell: &'a OnceLock<EvaluatedLayer>,
    layer: &StyleLayer,
    zoom: f32,
) -> &'a EvaluatedLayer {
    cell.get_or_init(|| layer.recalculate(zoom, &ZoomHistory::neutral()))
}

/// Identity of the layer a payload was built for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerRef {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// The serialized form of a built bucket.
///
/// This is the only value that crosses from the producer to the rendering
/// side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedBucket {
    pub layer: LayerRef,
    pub zoom: f32,
    /// Element groups by program name.
    pub element_groups: BTreeMap<String, Vec<ElementGroup>>,
    /// Raw array payloads by buffer name.
    pub arrays: BTreeMap<String, RawArray>,
    /// Record layouts by buffer name.
    pub array_types: BTreeMap<String, StructArrayType>,
}

impl SerializedBucket {
    /// Total number of vertices across all groups.
    pub fn vertex_count(&self) -> usize {
        self.element_groups
            .values()
            .flatten()
            .map(|group| group.vertex_length)
            .sum()
    }
}
