//! Graphics device.
//!
//! The [`GraphicsDevice`] creates and releases GPU buffers on behalf of
//! hydrated buckets and keeps track of every buffer still alive.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::backend::{DummyBackend, GpuBuffer};
use crate::error::GraphicsError;
use crate::types::BufferDescriptor;

/// Capabilities of a graphics device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceCapabilities {
    /// Maximum buffer size.
    pub max_buffer_size: u64,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            max_buffer_size: 1 << 30, // 1 GB
        }
    }
}

/// A graphics device for creating GPU buffers.
///
/// # Thread Safety
///
/// `GraphicsDevice` is `Send + Sync` and can be safely shared across threads.
#[derive(Debug, Default)]
pub struct GraphicsDevice {
    backend: DummyBackend,
    capabilities: DeviceCapabilities,
    live: Mutex<HashMap<u64, BufferDescriptor>>,
}

impl GraphicsDevice {
    /// Create a device on the dummy backend with default capabilities.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the device capabilities.
    pub fn with_capabilities(mut self, capabilities: DeviceCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// Get the backend name.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Create a GPU buffer filled with `contents`.
    ///
    /// # Errors
    ///
    /// Returns an error if the size is zero or exceeds device limits.
    pub fn create_buffer(
        &self,
        descriptor: &BufferDescriptor,
        contents: &[u8],
    ) -> Result<GpuBuffer, GraphicsError> {
        if descriptor.size > self.capabilities.max_buffer_size {
            return Err(GraphicsError::InvalidParameter(format!(
                "buffer size {} exceeds maximum {}",
                descriptor.size, self.capabilities.max_buffer_size
            )));
        }

        if descriptor.size == 0 {
            return Err(GraphicsError::InvalidParameter(
                "buffer size cannot be zero".to_string(),
            ));
        }

        let buffer = self.backend.create_buffer(descriptor, contents)?;
        self.live.lock().insert(buffer.id(), descriptor.clone());

        log::trace!(
            "GraphicsDevice: created buffer {:?}, size={}",
            descriptor.label,
            descriptor.size
        );

        Ok(buffer)
    }

    /// Release a GPU buffer.
    pub fn destroy_buffer(&self, buffer: GpuBuffer) {
        let descriptor = self.live.lock().remove(&buffer.id());
        debug_assert!(descriptor.is_some(), "buffer {} destroyed twice", buffer.id());
        self.backend.destroy_buffer(&buffer);
    }

    /// Get the number of live buffers created by this device.
    pub fn live_buffer_count(&self) -> usize {
        self.live.lock().len()
    }

    /// Total size in bytes of all live buffers.
    pub fn live_buffer_bytes(&self) -> u64 {
        self.live.lock().values().map(|d| d.size).sum()
    }
}

static_assertions::assert_impl_all!(GraphicsDevice: Send, Sync);
