//! Dummy GPU backend for testing and development.
//!
//! This backend doesn't perform actual GPU operations but provides
//! a valid implementation for exercising hydrated buckets without
//! requiring GPU hardware.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::GraphicsError;
use crate::types::BufferDescriptor;

use super::GpuBuffer;

/// Dummy GPU backend.
#[derive(Debug, Default)]
pub struct DummyBackend {
    next_id: AtomicU64,
}

impl DummyBackend {
    /// Create a new dummy backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the backend name.
    pub fn name(&self) -> &'static str {
        "Dummy"
    }

    /// Create a buffer and upload `contents` into it.
    pub fn create_buffer(
        &self,
        descriptor: &BufferDescriptor,
        contents: &[u8],
    ) -> Result<GpuBuffer, GraphicsError> {
        if contents.len() as u64 > descriptor.size {
            return Err(GraphicsError::ResourceCreationFailed(format!(
                "{} bytes of contents exceed buffer size {}",
                contents.len(),
                descriptor.size
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        log::trace!(
            "DummyBackend: creating buffer {:?} (id: {}, size: {})",
            descriptor.label,
            id,
            descriptor.size
        );
        Ok(GpuBuffer::Dummy {
            id,
            size: descriptor.size,
        })
    }

    /// Release a buffer.
    pub fn destroy_buffer(&self, buffer: &GpuBuffer) {
        log::trace!("DummyBackend: destroying buffer {}", buffer.id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BufferUsage;

    #[test]
    fn test_buffer_ids_are_unique() {
        let backend = DummyBackend::new();
        let desc = BufferDescriptor::new(16, BufferUsage::VERTEX);
        let a = backend.create_buffer(&desc, &[0; 16]).unwrap();
        let b = backend.create_buffer(&desc, &[0; 8]).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.size(), 16);
    }

    #[test]
    fn test_oversized_contents_rejected() {
        let backend = DummyBackend::new();
        let desc = BufferDescriptor::new(4, BufferUsage::INDEX);
        assert!(backend.create_buffer(&desc, &[0; 8]).is_err());
    }
}
