//! Struct array storage.
//!
//! This module provides the typed, growable binary arrays that buckets pack
//! vertices and indices into:
//!
//! - [`StructArrayType`] - Record layout, serializable for the consumer side
//! - [`StructArray`] - Growable array with `emplace_back` and `trim`
//! - [`RawArray`] - Raw serialized form handed across contexts

mod struct_array;
mod types;

pub use struct_array::{RawArray, StructArray};
pub use types::{
    ComponentType, StructArrayType, StructMember, ELEMENT_COMPONENT_TYPE, ELEMENT_MEMBER_NAME,
    VERTEX_ATTRIBUTE_ALIGNMENT,
};
