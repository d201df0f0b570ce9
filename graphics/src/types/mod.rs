//! Buffer usage flags, descriptors, and buffer types.

mod buffer;

pub use buffer::{BufferDescriptor, BufferType, BufferUsage};
