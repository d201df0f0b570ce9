//! Element groups.
//!
//! An [`ElementGroup`] records one capacity-bounded slice of a program's
//! shared vertex and index arrays. Indices written inside a group are
//! relative to the group's first vertex, so every group must stay within
//! 16-bit index addressing.

use serde::{Deserialize, Serialize};

/// Maximum number of vertices a single group may address.
pub const MAX_GROUP_VERTICES: usize = u16::MAX as usize;

/// A slice of a program's vertex and index arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ElementGroup {
    /// Offset into the vertex array of the first vertex in this group.
    pub vertex_start_index: usize,
    /// Offset into the element array, if the program has one.
    pub element_start_index: Option<usize>,
    /// Offset into the second element array, if the program has one.
    pub second_element_start_index: Option<usize>,
    /// Number of vertices written into this group.
    pub vertex_length: usize,
    /// Number of element records written into this group.
    pub element_length: usize,
    /// Number of second element records written into this group.
    pub second_element_length: usize,
}

impl ElementGroup {
    /// Open an empty group starting at the given array lengths.
    pub fn new(
        vertex_start_index: usize,
        element_start_index: Option<usize>,
        second_element_start_index: Option<usize>,
    ) -> Self {
        Self {
            vertex_start_index,
            element_start_index,
            second_element_start_index,
            vertex_length: 0,
            element_length: 0,
            second_element_length: 0,
        }
    }

    /// Whether `num_vertices` more vertices still fit in this group.
    ///
    /// A group may end at exactly [`MAX_GROUP_VERTICES`] but never above.
    pub fn has_room_for(&self, num_vertices: usize) -> bool {
        self.vertex_length + num_vertices <= MAX_GROUP_VERTICES
    }
}
