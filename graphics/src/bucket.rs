//! Hydrated buckets.
//!
//! A [`RenderBucket`] is the read-only, rendering-side view of a bucket,
//! reconstructed from the [`SerializedBucket`] payload a producer built.
//! It owns its buffers exclusively and must be [`destroy`](RenderBucket::destroy)ed
//! before it is dropped if any of them were bound.

use std::collections::BTreeMap;
use std::sync::Arc;

use tilepack_core::bucket::{LayerRef, SerializedBucket};
use tilepack_core::group::ElementGroup;
use tilepack_core::layer::StyleLayer;
use tilepack_core::program::{buffer_name, BufferRole};

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::resources::Buffer;
use crate::types::BufferType;

/// Construction options for a [`RenderBucket`].
#[derive(Debug, Clone)]
pub struct HydrateOptions {
    /// Overscaling factor of the tile.
    pub overscaling: f32,
    /// The resolved style layer, when the consumer has it.
    pub layer: Option<Arc<StyleLayer>>,
    /// Draw order of the layer.
    pub index: usize,
    /// Index of the source layer in the tile.
    pub source_layer_index: usize,
}

impl Default for HydrateOptions {
    fn default() -> Self {
        Self {
            overscaling: 1.0,
            layer: None,
            index: 0,
            source_layer_index: 0,
        }
    }
}

impl HydrateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overscaling(mut self, overscaling: f32) -> Self {
        self.overscaling = overscaling;
        self
    }

    pub fn with_layer(mut self, layer: Arc<StyleLayer>) -> Self {
        self.layer = Some(layer);
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

/// A bucket reconstructed on the rendering side.
#[derive(Debug)]
pub struct RenderBucket {
    layer_ref: LayerRef,
    layer: Option<Arc<StyleLayer>>,
    zoom: f32,
    overscaling: f32,
    index: usize,
    source_layer_index: usize,
    element_groups: BTreeMap<String, Vec<ElementGroup>>,
    buffers: BTreeMap<String, Buffer>,
}

impl RenderBucket {
    /// Rebuild a bucket from its payload.
    ///
    /// Each array becomes a [`Buffer`]; arrays whose layout starts with a
    /// `vertices` member are index buffers, all others vertex buffers.
    ///
    /// # Errors
    ///
    /// Fails if an array has no type descriptor, if an array's size does
    /// not match its layout, or if `options.layer` is a different layer
    /// than the payload was built for.
    pub fn hydrate(
        options: HydrateOptions,
        payload: SerializedBucket,
    ) -> Result<Self, GraphicsError> {
        if let Some(layer) = &options.layer {
            if layer.id() != payload.layer.id {
                return Err(GraphicsError::InvalidParameter(format!(
                    "payload of layer '{}' hydrated with layer '{}'",
                    payload.layer.id,
                    layer.id()
                )));
            }
        }

        let SerializedBucket {
            layer: layer_ref,
            zoom,
            element_groups,
            arrays,
            mut array_types,
        } = payload;

        let mut buffers = BTreeMap::new();
        for (name, raw) in arrays {
            let array_type = array_types
                .remove(&name)
                .ok_or_else(|| GraphicsError::MissingArrayType(name.clone()))?;
            let buffer_type = BufferType::infer(&array_type);
            let buffer = Buffer::new(name.as_str(), raw, Arc::new(array_type), buffer_type)?;
            buffers.insert(name, buffer);
        }

        log::trace!(
            "RenderBucket: hydrated '{}' with {} buffers",
            layer_ref.id,
            buffers.len()
        );

        Ok(Self {
            layer_ref,
            layer: options.layer,
            zoom,
            overscaling: options.overscaling,
            index: options.index,
            source_layer_index: options.source_layer_index,
            element_groups,
            buffers,
        })
    }

    /// Id of the owning layer.
    pub fn id(&self) -> &str {
        &self.layer_ref.id
    }

    /// Layer type name.
    pub fn kind(&self) -> &str {
        &self.layer_ref.kind
    }

    pub fn layer(&self) -> Option<&Arc<StyleLayer>> {
        self.layer.as_ref()
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

    pub fn source_layer_index(&self) -> usize {
        self.source_layer_index
    }

    /// Element groups of `program`.
    pub fn element_groups(&self, program: &str) -> Option<&[ElementGroup]> {
        self.element_groups.get(program).map(Vec::as_slice)
    }

    /// Program names with element groups, sorted.
    pub fn programs(&self) -> impl Iterator<Item = &str> {
        self.element_groups.keys().map(String::as_str)
    }

    /// Look up a buffer by name, e.g. `circleVertex`.
    pub fn buffer(&self, name: &str) -> Option<&Buffer> {
        self.buffers.get(name)
    }

    /// A program's buffer of the given role.
    pub fn program_buffer(&self, program: &str, role: BufferRole) -> Option<&Buffer> {
        self.buffer(&buffer_name(program, role))
    }

    /// All buffers, sorted by name.
    pub fn buffers(&self) -> impl Iterator<Item = &Buffer> {
        self.buffers.values()
    }

    /// Whether the bucket holds no buffers.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Whether there is anything to draw.
    pub fn has_data(&self) -> bool {
        self.element_groups
            .values()
            .flatten()
            .any(|group| group.vertex_length > 0)
    }

    /// Upload every buffer that is not bound yet; returns how many are bound.
    pub fn bind_all(&mut self, device: &GraphicsDevice) -> Result<usize, GraphicsError> {
        for buffer in self.buffers.values_mut() {
            buffer.bind(device)?;
        }
        Ok(self.buffers.values().filter(|b| b.is_bound()).count())
    }

    /// Release every GPU buffer held by the bucket.
    ///
    /// Does nothing for a bucket without buffers or with no buffer bound.
    pub fn destroy(&mut self, device: &GraphicsDevice) {
        for buffer in self.buffers.values_mut() {
            buffer.destroy(device);
        }
    }

    /// Rebuild the payload this bucket was hydrated from.
    pub fn serialize(&self) -> SerializedBucket {
        SerializedBucket {
            layer: self.layer_ref.clone(),
            zoom: self.zoom,
            element_groups: self.element_groups.clone(),
            arrays: self
                .buffers
                .iter()
                .map(|(name, buffer)| (name.clone(), buffer.serialize()))
                .collect(),
            array_types: self
                .buffers
                .iter()
                .map(|(name, buffer)| (name.clone(), (**buffer.array_type()).clone()))
                .collect(),
        }
    }
}

static_assertions::assert_impl_all!(RenderBucket: Send, Sync);
