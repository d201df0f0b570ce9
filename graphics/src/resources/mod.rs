//! GPU resources.
//!
//! - [`Buffer`] - one hydrated bucket array and its lazily uploaded GPU buffer

mod buffer;

pub use buffer::Buffer;
