//! Growable struct arrays backed by raw bytes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::types::StructArrayType;

/// Minimum number of records reserved on first growth.
const MIN_CAPACITY: usize = 128;

/// Raw serialized form of a [`StructArray`].
///
/// This is the payload handed across the producer/consumer boundary. It is
/// meaningless without the [`StructArrayType`] that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawArray {
    /// Number of records.
    pub length: usize,
    /// Record bytes, exactly `length * type.size` long.
    pub bytes: Vec<u8>,
}

impl RawArray {
    /// Whether the array holds no records.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// A growable array of fixed-layout records.
///
/// Records are appended with [`emplace_back`](Self::emplace_back), which hands
/// out the zeroed bytes of the new record for the caller to fill in. Once
/// [`trim`](Self::trim) has been called the array is frozen.
#[derive(Clone)]
pub struct StructArray {
    array_type: Arc<StructArrayType>,
    bytes: Vec<u8>,
    length: usize,
    trimmed: bool,
}

impl StructArray {
    /// Create an empty array of the given type.
    pub fn new(array_type: Arc<StructArrayType>) -> Self {
        Self {
            array_type,
            bytes: Vec::new(),
            length: 0,
            trimmed: false,
        }
    }

    /// Wrap a previously serialized array.
    pub fn from_raw(array_type: Arc<StructArrayType>, raw: RawArray) -> Self {
        debug_assert_eq!(raw.bytes.len(), raw.length * array_type.size);
        Self {
            array_type,
            bytes: raw.bytes,
            length: raw.length,
            trimmed: true,
        }
    }

    /// The record layout.
    pub fn array_type(&self) -> &Arc<StructArrayType> {
        &self.array_type
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Whether the array holds no records.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Number of records that fit without reallocating.
    pub fn capacity(&self) -> usize {
        match self.array_type.size {
            0 => 0,
            size => self.bytes.capacity() / size,
        }
    }

    /// Whether [`trim`](Self::trim) has been called.
    pub fn is_trimmed(&self) -> bool {
        self.trimmed
    }

    /// Append one zeroed record and return its index and bytes.
    #[inline]
    pub fn emplace_back(&mut self) -> (usize, &mut [u8]) {
        debug_assert!(!self.trimmed, "emplace_back on a trimmed struct array");

        let size = self.array_type.size;
        let start = self.bytes.len();
        if self.bytes.capacity() < start + size {
            let records = (self.length * 2).max(MIN_CAPACITY);
            self.bytes.reserve(records * size - start);
        }
        self.bytes.resize(start + size, 0);

        let index = self.length;
        self.length += 1;
        (index, &mut self.bytes[start..])
    }

    /// Release any capacity beyond the used length and freeze the array.
    ///
    /// Calling this more than once has no further effect.
    pub fn trim(&mut self) {
        self.bytes.shrink_to_fit();
        self.trimmed = true;
    }

    /// All record bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Bytes of the record at `index`.
    pub fn record(&self, index: usize) -> Option<&[u8]> {
        let size = self.array_type.size;
        self.bytes.get(index * size..(index + 1) * size)
    }

    /// Read component `component` of member `member` from record `index`.
    pub fn get(&self, index: usize, member: &str, component: usize) -> Option<f64> {
        let member = self.array_type.member(member)?;
        if component >= member.components {
            return None;
        }
        let record = self.record(index)?;
        let offset = member.offset + component * member.component_type.size();
        Some(member.component_type.read(&record[offset..]))
    }

    /// Copy the contents into their raw serialized form.
    pub fn serialize(&self) -> RawArray {
        RawArray {
            length: self.length,
            bytes: self.bytes.clone(),
        }
    }

    /// Move the contents into their raw serialized form.
    pub fn into_raw(self) -> RawArray {
        RawArray {
            length: self.length,
            bytes: self.bytes,
        }
    }
}

impl std::fmt::Debug for StructArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructArray")
            .field("length", &self.length)
            .field("stride", &self.array_type.size)
            .field("capacity", &self.capacity())
            .field("trimmed", &self.trimmed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::ComponentType;

    fn pos_type() -> Arc<StructArrayType> {
        Arc::new(StructArrayType::new([("pos", ComponentType::Int16, 2)], 4))
    }

    #[test]
    fn test_emplace_and_read() {
        let mut array = StructArray::new(pos_type());
        for i in 0..3 {
            let (index, slot) = array.emplace_back();
            assert_eq!(index, i);
            ComponentType::Int16.write(&mut slot[0..], i as f64 * 10.0);
            ComponentType::Int16.write(&mut slot[2..], -(i as f64));
        }

        assert_eq!(array.len(), 3);
        assert_eq!(array.as_bytes().len(), 12);
        assert_eq!(array.get(2, "pos", 0), Some(20.0));
        assert_eq!(array.get(2, "pos", 1), Some(-2.0));
        assert_eq!(array.get(3, "pos", 0), None);
        assert_eq!(array.get(0, "pos", 2), None);
        assert_eq!(array.get(0, "missing", 0), None);
    }

    #[test]
    fn test_trim_releases_slack_and_is_idempotent() {
        let mut array = StructArray::new(pos_type());
        array.emplace_back();
        assert!(array.capacity() >= MIN_CAPACITY);

        array.trim();
        let len = array.len();
        let bytes = array.as_bytes().to_vec();
        assert!(array.is_trimmed());

        array.trim();
        assert_eq!(array.len(), len);
        assert_eq!(array.as_bytes(), bytes.as_slice());
    }

    #[test]
    fn test_raw_roundtrip() {
        let ty = pos_type();
        let mut array = StructArray::new(ty.clone());
        let (_, slot) = array.emplace_back();
        ComponentType::Int16.write(slot, 7.0);
        array.trim();

        let raw = array.serialize();
        assert_eq!(raw.length, 1);
        let restored = StructArray::from_raw(ty, raw.clone());
        assert_eq!(restored.as_bytes(), array.as_bytes());
        assert_eq!(restored.into_raw(), raw);
    }
}
