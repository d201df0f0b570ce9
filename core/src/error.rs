//! Bucket error types.

use thiserror::Error;

/// Errors that can occur while building or transferring buckets.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BucketError {
    /// The layer kind has no bucket implementation.
    #[error("unsupported layer type: {0}")]
    UnsupportedLayerType(String),
    /// A program interface cannot be turned into an insertion method.
    #[error("malformed program interface '{program}': {reason}")]
    MalformedProgramInterface { program: String, reason: String },
    /// A payload could not be encoded.
    #[error("failed to encode bucket payload: {0}")]
    Encode(String),
    /// A payload could not be decoded.
    #[error("failed to decode bucket payload: {0}")]
    Decode(String),
}

pub type BucketResult<T> = Result<T, BucketError>;
