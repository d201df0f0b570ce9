//! # tilepack core
//!
//! Packs decoded vector tile features into GPU-ready vertex and index
//! arrays, one [`Bucket`] per style layer per tile.
//!
//! The producer side lives here: struct arrays, program interfaces and the
//! insertion methods synthesized from them, element groups, the per-kind
//! tessellation variants, and the [`SerializedBucket`] payload handed to the
//! rendering side.

pub mod array;
pub mod bucket;
pub mod error;
pub mod feature;
pub mod group;
pub mod layer;
pub mod method;
pub mod program;
pub mod serialize;

pub use bucket::{Bucket, BucketKind, BucketOptions, BucketVariant, SerializedBucket};
pub use error::{BucketError, BucketResult};
pub use group::{ElementGroup, MAX_GROUP_VERTICES};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version.
pub fn init() {
    log::info!("tilepack core v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
