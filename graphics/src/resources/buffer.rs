//! Hydrated bucket buffer.

use std::sync::Arc;

use tilepack_core::array::{RawArray, StructArray, StructArrayType};

use crate::backend::GpuBuffer;
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::types::{BufferDescriptor, BufferType};

/// One array of a hydrated bucket.
///
/// Holds the packed records on the CPU and uploads them to the GPU on the
/// first [`bind`](Self::bind). The upload stays alive until
/// [`destroy`](Self::destroy).
pub struct Buffer {
    name: String,
    array: StructArray,
    buffer_type: BufferType,
    gpu: Option<GpuBuffer>,
}

impl Buffer {
    /// Wrap a raw array payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload size does not match its record layout.
    pub fn new(
        name: impl Into<String>,
        raw: RawArray,
        array_type: Arc<StructArrayType>,
        buffer_type: BufferType,
    ) -> Result<Self, GraphicsError> {
        let name = name.into();
        if raw.bytes.len() != raw.length * array_type.size {
            return Err(GraphicsError::InvalidParameter(format!(
                "buffer '{}' holds {} bytes but {} records of {} bytes",
                name,
                raw.bytes.len(),
                raw.length,
                array_type.size
            )));
        }
        Ok(Self {
            name,
            array: StructArray::from_raw(array_type, raw),
            buffer_type,
            gpu: None,
        })
    }

    /// Buffer name, e.g. `circleVertex`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn buffer_type(&self) -> BufferType {
        self.buffer_type
    }

    pub fn array_type(&self) -> &Arc<StructArrayType> {
        self.array.array_type()
    }

    /// The packed records.
    pub fn array(&self) -> &StructArray {
        &self.array
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    /// Size of the packed records in bytes.
    pub fn byte_len(&self) -> u64 {
        self.array.as_bytes().len() as u64
    }

    /// The GPU buffer, once bound.
    pub fn gpu_buffer(&self) -> Option<&GpuBuffer> {
        self.gpu.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.gpu.is_some()
    }

    /// Upload the records on first call.
    ///
    /// Empty buffers are never uploaded; there is nothing to draw from them.
    pub fn bind(&mut self, device: &GraphicsDevice) -> Result<(), GraphicsError> {
        if self.gpu.is_some() || self.is_empty() {
            return Ok(());
        }
        let descriptor = BufferDescriptor::new(self.byte_len(), self.buffer_type.usage())
            .with_label(self.name.as_str());
        self.gpu = Some(device.create_buffer(&descriptor, self.array.as_bytes())?);
        Ok(())
    }

    /// Release the GPU buffer, if any.
    pub fn destroy(&mut self, device: &GraphicsDevice) {
        if let Some(gpu) = self.gpu.take() {
            device.destroy_buffer(gpu);
        }
    }

    /// The raw array payload.
    pub fn serialize(&self) -> RawArray {
        self.array.serialize()
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("name", &self.name)
            .field("type", &self.buffer_type)
            .field("length", &self.array.len())
            .field("gpu", &self.gpu)
            .finish()
    }
}

// Ensure Buffer is Send + Sync
static_assertions::assert_impl_all!(Buffer: Send, Sync);
