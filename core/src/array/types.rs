//! Struct array type descriptors.
//!
//! A [`StructArrayType`] describes the binary layout of one record in a
//! [`StructArray`](super::StructArray): an ordered list of members, each a
//! fixed number of components of one [`ComponentType`]. The descriptor is
//! serializable so a consumer can reinterpret raw array bytes without the
//! program interface that produced them.

use serde::{Deserialize, Serialize};

/// Alignment in bytes of every vertex record.
pub const VERTEX_ATTRIBUTE_ALIGNMENT: usize = 4;

/// Name of the sole member of an index (element) array.
///
/// Consumers use this name to tell index buffers apart from vertex buffers.
pub const ELEMENT_MEMBER_NAME: &str = "vertices";

/// Component type of index arrays. Indices are addressed with 16 bits.
pub const ELEMENT_COMPONENT_TYPE: ComponentType = ComponentType::Uint16;

/// Scalar type of a single struct member component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
}

impl ComponentType {
    /// Size in bytes of one component.
    pub fn size(&self) -> usize {
        match self {
            Self::Int8 | Self::Uint8 => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float32 => 4,
        }
    }

    /// Short name used in method signatures and debug output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Int8 => "i8",
            Self::Uint8 => "u8",
            Self::Int16 => "i16",
            Self::Uint16 => "u16",
            Self::Int32 => "i32",
            Self::Uint32 => "u32",
            Self::Float32 => "f32",
        }
    }

    /// Write `value` into the first `size()` bytes of `dst`.
    ///
    /// Integer types truncate toward zero, then wrap on overflow.
    #[inline]
    pub fn write(&self, dst: &mut [u8], value: f64) {
        let truncated = value as i64;
        match self {
            Self::Int8 => dst[..1].copy_from_slice(bytemuck::bytes_of(&(truncated as i8))),
            Self::Uint8 => dst[0] = truncated as u8,
            Self::Int16 => dst[..2].copy_from_slice(bytemuck::bytes_of(&(truncated as i16))),
            Self::Uint16 => dst[..2].copy_from_slice(bytemuck::bytes_of(&(truncated as u16))),
            Self::Int32 => dst[..4].copy_from_slice(bytemuck::bytes_of(&(truncated as i32))),
            Self::Uint32 => dst[..4].copy_from_slice(bytemuck::bytes_of(&(truncated as u32))),
            Self::Float32 => dst[..4].copy_from_slice(bytemuck::bytes_of(&(value as f32))),
        }
    }

    /// Read one component from the first `size()` bytes of `src`.
    pub fn read(&self, src: &[u8]) -> f64 {
        match self {
            Self::Int8 => bytemuck::pod_read_unaligned::<i8>(&src[..1]) as f64,
            Self::Uint8 => src[0] as f64,
            Self::Int16 => bytemuck::pod_read_unaligned::<i16>(&src[..2]) as f64,
            Self::Uint16 => bytemuck::pod_read_unaligned::<u16>(&src[..2]) as f64,
            Self::Int32 => bytemuck::pod_read_unaligned::<i32>(&src[..4]) as f64,
            Self::Uint32 => bytemuck::pod_read_unaligned::<u32>(&src[..4]) as f64,
            Self::Float32 => bytemuck::pod_read_unaligned::<f32>(&src[..4]) as f64,
        }
    }
}

/// One member of a struct array record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructMember {
    /// Member name (the attribute name for vertex arrays).
    pub name: String,
    /// Scalar type of each component.
    pub component_type: ComponentType,
    /// Number of components.
    pub components: usize,
    /// Byte offset of the member within the record.
    pub offset: usize,
}

impl StructMember {
    /// Size in bytes of the whole member.
    pub fn size(&self) -> usize {
        self.component_type.size() * self.components
    }
}

/// Layout of one struct array record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructArrayType {
    /// Members in declaration order, with resolved offsets.
    pub members: Vec<StructMember>,
    /// Minimum alignment of members and of the record size.
    pub alignment: usize,
    /// Record size in bytes (the stride between consecutive records).
    pub size: usize,
}

impl StructArrayType {
    /// Lay out `members` given as `(name, type, components)`.
    ///
    /// Each member starts at a multiple of `max(alignment, component size)`
    /// and the record size is padded to a multiple of the largest of those.
    pub fn new<'a>(
        members: impl IntoIterator<Item = (&'a str, ComponentType, usize)>,
        alignment: usize,
    ) -> Self {
        let alignment = alignment.max(1);
        let mut offset = 0;
        let mut max_align = alignment;
        let members = members
            .into_iter()
            .map(|(name, component_type, components)| {
                let member_align = alignment.max(component_type.size());
                max_align = max_align.max(member_align);
                offset = align(offset, member_align);
                let member = StructMember {
                    name: name.to_string(),
                    component_type,
                    components,
                    offset,
                };
                offset += member.size();
                member
            })
            .collect();

        Self {
            members,
            alignment,
            size: align(offset, max_align),
        }
    }

    /// Type of an index array holding `components` indices per record.
    pub fn element(components: usize) -> Self {
        Self::new(
            [(ELEMENT_MEMBER_NAME, ELEMENT_COMPONENT_TYPE, components)],
            1,
        )
    }

    /// Whether this descriptor describes an index array.
    pub fn is_element(&self) -> bool {
        self.members
            .first()
            .is_some_and(|member| member.name == ELEMENT_MEMBER_NAME)
    }

    /// Find a member by name.
    pub fn member(&self, name: &str) -> Option<&StructMember> {
        self.members.iter().find(|member| member.name == name)
    }
}

fn align(offset: usize, to: usize) -> usize {
    offset.div_ceil(to) * to
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_sizes() {
        assert_eq!(ComponentType::Int8.size(), 1);
        assert_eq!(ComponentType::Uint16.size(), 2);
        assert_eq!(ComponentType::Float32.size(), 4);
    }

    #[test]
    fn test_member_offsets_are_aligned() {
        let ty = StructArrayType::new(
            [
                ("pos", ComponentType::Int16, 2),
                ("data", ComponentType::Uint8, 3),
                ("size", ComponentType::Float32, 1),
            ],
            VERTEX_ATTRIBUTE_ALIGNMENT,
        );

        assert_eq!(ty.members[0].offset, 0);
        assert_eq!(ty.members[1].offset, 4);
        // 4 + 3 = 7, rounded up to 8
        assert_eq!(ty.members[2].offset, 8);
        assert_eq!(ty.size, 12);
    }

    #[test]
    fn test_element_type() {
        let ty = StructArrayType::element(3);
        assert!(ty.is_element());
        assert_eq!(ty.size, 6);

        let vertex = StructArrayType::new([("pos", ComponentType::Int16, 2)], 4);
        assert!(!vertex.is_element());
    }

    #[test]
    fn test_write_truncates_and_wraps() {
        let mut buf = [0u8; 4];
        ComponentType::Int16.write(&mut buf, -1.5);
        assert_eq!(ComponentType::Int16.read(&buf), -1.0);

        ComponentType::Uint8.write(&mut buf, 257.0);
        assert_eq!(ComponentType::Uint8.read(&buf), 1.0);

        ComponentType::Float32.write(&mut buf, 0.25);
        assert_eq!(ComponentType::Float32.read(&buf), 0.25);
    }
}
