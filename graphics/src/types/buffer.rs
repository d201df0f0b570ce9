//! Buffer types and descriptors.

use bitflags::bitflags;
use tilepack_core::array::{StructArrayType, ELEMENT_MEMBER_NAME};

bitflags! {
    /// Usage flags for buffers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// Buffer can be used as a vertex buffer.
        const VERTEX = 1 << 0;
        /// Buffer can be used as an index buffer.
        const INDEX = 1 << 1;
        /// Buffer can be copied to.
        const COPY_DST = 1 << 2;
    }
}

impl Default for BufferUsage {
    fn default() -> Self {
        Self::empty()
    }
}

/// Descriptor for creating a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BufferDescriptor {
    /// Debug label for the buffer.
    pub label: Option<String>,
    /// Size in bytes.
    pub size: u64,
    /// Usage flags.
    pub usage: BufferUsage,
}

impl BufferDescriptor {
    /// Create a new buffer descriptor.
    pub fn new(size: u64, usage: BufferUsage) -> Self {
        Self {
            label: None,
            size,
            usage,
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// What a hydrated buffer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferType {
    /// Vertex records.
    Vertex,
    /// Vertex index records.
    Element,
}

impl BufferType {
    /// Infer the buffer type from a record layout.
    ///
    /// Index arrays are recognized by their first member being named
    /// `vertices`; everything else is a vertex array.
    pub fn infer(array_type: &StructArrayType) -> Self {
        match array_type.members.first() {
            Some(member) if member.name == ELEMENT_MEMBER_NAME => Self::Element,
            _ => Self::Vertex,
        }
    }

    /// Usage flags a GPU buffer of this type is created with.
    pub fn usage(&self) -> BufferUsage {
        match self {
            Self::Vertex => BufferUsage::VERTEX | BufferUsage::COPY_DST,
            Self::Element => BufferUsage::INDEX | BufferUsage::COPY_DST,
        }
    }
}
