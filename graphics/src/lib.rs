//! # tilepack graphics
//!
//! Consumer side of the bucket pipeline: hydrates serialized buckets into
//! GPU-ready buffers.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`RenderBucket`] - Read-only bucket rebuilt from a [`SerializedBucket`] payload
//! - [`Buffer`] - One hydrated array, uploaded on first bind
//! - [`GraphicsDevice`] - Creates GPU buffers and tracks which are alive
//! - [`DummyBackend`] - Backend that never touches a GPU
//!
//! ## Example
//!
//! ```
//! use tilepack_graphics::{GraphicsDevice, HydrateOptions, RenderBucket};
//! # use std::sync::Arc;
//! # use tilepack_core::feature::Feature;
//! # use tilepack_core::layer::{LayerDescriptor, LayerKind, StyleLayer};
//! # use tilepack_core::{Bucket, BucketOptions};
//! # let layer = Arc::new(StyleLayer::create(LayerDescriptor::new("poi", LayerKind::Circle)));
//! # let mut bucket = Bucket::create(BucketOptions::new(layer)).unwrap();
//! # bucket.set_features(vec![Feature::point(10, 10)]);
//! # bucket.populate_buffers().unwrap();
//! # let payload = bucket.into_serialized();
//!
//! let device = GraphicsDevice::new();
//! let mut render = RenderBucket::hydrate(HydrateOptions::new(), payload).unwrap();
//! render.bind_all(&device).unwrap();
//! assert_eq!(device.live_buffer_count(), 2);
//! render.destroy(&device);
//! assert_eq!(device.live_buffer_count(), 0);
//! ```
//!
//! [`SerializedBucket`]: tilepack_core::SerializedBucket

pub mod backend;
pub mod bucket;
pub mod device;
pub mod error;
pub mod resources;
pub mod types;

// Re-export main types for convenience
pub use backend::{DummyBackend, GpuBuffer};
pub use bucket::{HydrateOptions, RenderBucket};
pub use device::{DeviceCapabilities, GraphicsDevice};
pub use error::GraphicsError;
pub use resources::Buffer;
pub use types::{BufferDescriptor, BufferType, BufferUsage};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
pub fn init() {
    log::info!("tilepack graphics v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_dummy_backend() {
        let device = GraphicsDevice::new();
        assert_eq!(device.backend_name(), "Dummy");
    }
}
