//! GPU backend abstraction layer.
//!
//! The only backend shipped is [`DummyBackend`], which records buffer
//! creation without touching a GPU. [`GpuBuffer`] is the handle a backend
//! returns for an uploaded buffer.

pub mod dummy;

pub use dummy::DummyBackend;

/// Handle to a GPU buffer resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GpuBuffer {
    /// Dummy backend buffer, identified by a device-unique id.
    Dummy { id: u64, size: u64 },
}

impl GpuBuffer {
    /// Device-unique id of the buffer.
    pub fn id(&self) -> u64 {
        match self {
            Self::Dummy { id, .. } => *id,
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        match self {
            Self::Dummy { size, .. } => *size,
        }
    }
}
