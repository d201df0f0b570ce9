//! Graphics error types.

use std::fmt;

/// Errors that can occur on the rendering side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// Failed to create a GPU resource.
    ResourceCreationFailed(String),
    /// An invalid parameter was provided.
    InvalidParameter(String),
    /// A payload array has no matching type descriptor.
    MissingArrayType(String),
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceCreationFailed(msg) => write!(f, "resource creation failed: {msg}"),
            Self::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            Self::MissingArrayType(name) => write!(f, "no array type for buffer '{name}'"),
        }
    }
}

impl std::error::Error for GraphicsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphicsError::MissingArrayType("circleVertex".to_string());
        assert_eq!(err.to_string(), "no array type for buffer 'circleVertex'");

        let err = GraphicsError::InvalidParameter("buffer size cannot be zero".to_string());
        assert_eq!(err.to_string(), "invalid parameter: buffer size cannot be zero");
    }
}
