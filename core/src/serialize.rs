//! Byte encoding of bucket payloads.
//!
//! [`encode`] and [`decode`] turn a [`SerializedBucket`] into bytes and back
//! for the handoff between the building and the rendering context. Bincode
//! is always available; RON is enabled by the `serialize-ron` feature.

use crate::bucket::SerializedBucket;
use crate::error::{BucketError, BucketResult};

/// Supported payload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Bincode, a compact binary format.
    #[default]
    Bincode,
    /// RON (Rusty Object Notation), a human-readable text format.
    #[cfg(feature = "serialize-ron")]
    Ron,
}

impl Format {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bincode => "bincode",
            #[cfg(feature = "serialize-ron")]
            Self::Ron => "ron",
        }
    }
}

/// Encode a payload to bytes.
pub fn encode(payload: &SerializedBucket, format: Format) -> BucketResult<Vec<u8>> {
    match format {
        Format::Bincode => {
            bincode::serialize(payload).map_err(|e| BucketError::Encode(e.to_string()))
        }
        #[cfg(feature = "serialize-ron")]
        Format::Ron => ron::ser::to_string_pretty(payload, ron::ser::PrettyConfig::default())
            .map(String::into_bytes)
            .map_err(|e| BucketError::Encode(e.to_string())),
    }
}

/// Decode a payload from bytes.
pub fn decode(bytes: &[u8], format: Format) -> BucketResult<SerializedBucket> {
    match format {
        Format::Bincode => {
            bincode::deserialize(bytes).map_err(|e| BucketError::Decode(e.to_string()))
        }
        #[cfg(feature = "serialize-ron")]
        Format::Ron => {
            let s = std::str::from_utf8(bytes).map_err(|e| BucketError::Decode(e.to_string()))?;
            ron::from_str(s).map_err(|e| BucketError::Decode(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::bucket::{Bucket, BucketOptions};
    use crate::feature::{Feature, Point};
    use crate::layer::{LayerDescriptor, LayerKind, StyleLayer};

    fn built_payload() -> SerializedBucket {
        let layer = StyleLayer::create(LayerDescriptor::new("roads", LayerKind::Line));
        let options = BucketOptions::new(Arc::new(layer)).with_zoom(9.0);
        let mut bucket = Bucket::create(options).unwrap();
        bucket.set_features(vec![Feature::line(vec![
            Point::new(0, 0),
            Point::new(100, 0),
            Point::new(100, 100),
        ])]);
        bucket.populate_buffers().unwrap();
        bucket.into_serialized()
    }

    #[test]
    fn test_bincode_round_trip() {
        let payload = built_payload();
        let bytes = encode(&payload, Format::Bincode).unwrap();
        assert_eq!(decode(&bytes, Format::Bincode).unwrap(), payload);
    }

    #[cfg(feature = "serialize-ron")]
    #[test]
    fn test_ron_round_trip() {
        let payload = built_payload();
        let bytes = encode(&payload, Format::Ron).unwrap();
        assert_eq!(decode(&bytes, Format::Ron).unwrap(), payload);
    }

    #[test]
    fn test_truncated_payload_fails_to_decode() {
        let bytes = encode(&built_payload(), Format::Bincode).unwrap();
        let err = decode(&bytes[..bytes.len() / 2], Format::Bincode).unwrap_err();
        assert!(matches!(err, BucketError::Decode(_)));
    }
}
