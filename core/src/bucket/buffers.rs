//! Per-bucket buffer storage.
//!
//! [`BucketBuffers`] owns every struct array a bucket writes, addressed by
//! [`ArrayHandle`] inside a [`BufferArena`], together with each program's
//! element groups and bound insertion methods. Tessellation code reaches it
//! only through [`BucketBuffers::make_room_for`], which hands out a
//! [`GroupWriter`] for the group the next vertices must land in.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::array::{StructArray, StructArrayType};
use crate::error::BucketResult;
use crate::group::{ElementGroup, MAX_GROUP_VERTICES};
use crate::method::{ElementAddMethod, MethodCache, VertexAddMethod};
use crate::program::{add_method_name, buffer_name, BufferRole, ProgramInterfaces};

/// Handle to an array in a [`BufferArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrayHandle(usize);

impl ArrayHandle {
    /// Position of the array in its arena.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Named struct arrays, in creation order.
#[derive(Debug, Default)]
pub struct BufferArena {
    names: Vec<String>,
    arrays: Vec<StructArray>,
}

impl BufferArena {
    /// Add an array under `name`.
    pub fn insert(&mut self, name: String, array: StructArray) -> ArrayHandle {
        debug_assert!(
            self.by_name(&name).is_none(),
            "buffer '{name}' created twice"
        );
        self.names.push(name);
        self.arrays.push(array);
        ArrayHandle(self.arrays.len() - 1)
    }

    pub fn get(&self, handle: ArrayHandle) -> &StructArray {
        &self.arrays[handle.0]
    }

    pub fn get_mut(&mut self, handle: ArrayHandle) -> &mut StructArray {
        &mut self.arrays[handle.0]
    }

    /// Find an array by buffer name.
    pub fn by_name(&self, name: &str) -> Option<ArrayHandle> {
        self.names.iter().position(|n| n == name).map(ArrayHandle)
    }

    /// Iterate `(buffer name, array)` pairs in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StructArray)> {
        self.names.iter().map(String::as_str).zip(&self.arrays)
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Trim every array.
    pub fn trim_all(&mut self) {
        for array in &mut self.arrays {
            array.trim();
        }
    }

    fn into_named_arrays(self) -> impl Iterator<Item = (String, StructArray)> {
        self.names.into_iter().zip(self.arrays)
    }
}

#[derive(Debug)]
struct ProgramBuffers {
    name: String,
    vertex: Option<(ArrayHandle, Arc<VertexAddMethod>)>,
    element: Option<(ArrayHandle, ElementAddMethod)>,
    second_element: Option<(ArrayHandle, ElementAddMethod)>,
    groups: Vec<ElementGroup>,
}

/// Arrays, array types, and element groups of one bucket.
#[derive(Debug, Default)]
pub struct BucketBuffers {
    arena: BufferArena,
    array_types: BTreeMap<String, Arc<StructArrayType>>,
    programs: Vec<ProgramBuffers>,
    trimmed: bool,
}

impl BucketBuffers {
    /// Create empty arrays for every program in `interfaces`.
    ///
    /// Vertex insertion methods come from `cache`, so structurally identical
    /// programs share one method.
    pub fn create(interfaces: &ProgramInterfaces, cache: &MethodCache) -> BucketResult<Self> {
        let mut buffers = Self::default();

        for (program, interface) in interfaces.iter() {
            let vertex = if interface.vertex_buffer {
                let method = cache.vertex_add_method(program, interface)?;
                let array_type = Arc::new(method.array_type().clone());
                let handle = buffers.add_array(program, BufferRole::Vertex, array_type);
                Some((handle, method))
            } else {
                None
            };

            let element = interface.element_buffer.then(|| {
                let components = interface.element_buffer_components;
                let array_type = Arc::new(StructArrayType::element(components));
                let handle = buffers.add_array(program, BufferRole::Element, array_type);
                (handle, ElementAddMethod::new(components))
            });

            let second_element = interface.second_element_buffer.then(|| {
                let components = interface.second_element_buffer_components;
                let array_type = Arc::new(StructArrayType::element(components));
                let handle = buffers.add_array(program, BufferRole::SecondElement, array_type);
                (handle, ElementAddMethod::new(components))
            });

            buffers.programs.push(ProgramBuffers {
                name: program.to_string(),
                vertex,
                element,
                second_element,
                groups: Vec::new(),
            });
        }

        Ok(buffers)
    }

    fn add_array(
        &mut self,
        program: &str,
        role: BufferRole,
        array_type: Arc<StructArrayType>,
    ) -> ArrayHandle {
        let name = buffer_name(program, role);
        log::trace!(
            "BucketBuffers: creating '{}' ({} bytes per record, filled by {})",
            name,
            array_type.size,
            add_method_name(program, role)
        );
        self.array_types.insert(name.clone(), Arc::clone(&array_type));
        self.arena.insert(name, StructArray::new(array_type))
    }

    /// Prepare `program` for `num_vertices` more vertices.
    ///
    /// Opens a new group when the program has none yet or when the current
    /// group would exceed [`MAX_GROUP_VERTICES`]. A new group starts at the
    /// current lengths of the program's arrays. Returns `None` for a program
    /// this bucket does not declare, or once the buffers have been trimmed.
    pub fn make_room_for(&mut self, program: &str, num_vertices: usize) -> Option<GroupWriter<'_>> {
        debug_assert!(!self.trimmed, "make_room_for on trimmed buffers");
        debug_assert!(
            num_vertices <= MAX_GROUP_VERTICES,
            "{num_vertices} vertices can never fit one group"
        );
        if self.trimmed {
            return None;
        }

        let Self { arena, programs, .. } = self;
        let buffers = programs.iter_mut().find(|p| p.name == program)?;

        let needs_group = buffers
            .groups
            .last()
            .map_or(true, |group| !group.has_room_for(num_vertices));
        if needs_group {
            let length = |handle: Option<ArrayHandle>| handle.map(|h| arena.get(h).len());
            let group = ElementGroup::new(
                length(buffers.vertex.as_ref().map(|(h, _)| *h)).unwrap_or(0),
                length(buffers.element.as_ref().map(|(h, _)| *h)),
                length(buffers.second_element.as_ref().map(|(h, _)| *h)),
            );
            buffers.groups.push(group);
        }

        Some(GroupWriter { arena, buffers })
    }

    /// Element groups of `program`.
    pub fn groups(&self, program: &str) -> Option<&[ElementGroup]> {
        self.program(program).map(|p| p.groups.as_slice())
    }

    /// Element groups of every program, by program name.
    pub fn element_groups(&self) -> BTreeMap<String, Vec<ElementGroup>> {
        self.programs
            .iter()
            .map(|p| (p.name.clone(), p.groups.clone()))
            .collect()
    }

    /// The vertex insertion method bound to `program`.
    pub fn vertex_add_method(&self, program: &str) -> Option<&Arc<VertexAddMethod>> {
        self.program(program)
            .and_then(|p| p.vertex.as_ref())
            .map(|(_, method)| method)
    }

    /// Look up an array by buffer name, e.g. `circleVertex`.
    pub fn array(&self, name: &str) -> Option<&StructArray> {
        self.arena.by_name(name).map(|h| self.arena.get(h))
    }

    /// Iterate `(buffer name, array)` pairs in creation order.
    pub fn arrays(&self) -> impl Iterator<Item = (&str, &StructArray)> {
        self.arena.iter()
    }

    /// Record layouts by buffer name.
    pub fn array_types(&self) -> &BTreeMap<String, Arc<StructArrayType>> {
        &self.array_types
    }

    /// Program names in registration order.
    pub fn program_names(&self) -> impl Iterator<Item = &str> {
        self.programs.iter().map(|p| p.name.as_str())
    }

    /// Whether no arrays have been created.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Release spare capacity of every array and freeze the buffers.
    pub fn trim(&mut self) {
        self.arena.trim_all();
        self.trimmed = true;
    }

    pub fn is_trimmed(&self) -> bool {
        self.trimmed
    }

    /// Consume the buffers into `(buffer name, array)` pairs.
    pub fn into_arrays(self) -> impl Iterator<Item = (String, StructArray)> {
        self.arena.into_named_arrays()
    }

    fn program(&self, name: &str) -> Option<&ProgramBuffers> {
        self.programs.iter().find(|p| p.name == name)
    }
}

/// Writes vertices and indices into a program's current group.
///
/// Vertex indices returned by [`add_vertex`](Self::add_vertex) are relative
/// to the group's first vertex; those are the indices element records hold.
pub struct GroupWriter<'a> {
    arena: &'a mut BufferArena,
    buffers: &'a mut ProgramBuffers,
}

impl GroupWriter<'_> {
    /// The group being written.
    pub fn group(&self) -> &ElementGroup {
        &self.buffers.groups[self.buffers.groups.len() - 1]
    }

    fn group_mut(&mut self) -> &mut ElementGroup {
        let last = self.buffers.groups.len() - 1;
        &mut self.buffers.groups[last]
    }

    /// Append a vertex computed from `args` and return its group-relative
    /// index.
    pub fn add_vertex(&mut self, args: &[f64]) -> u16 {
        let Some((handle, method)) = &self.buffers.vertex else {
            debug_assert!(false, "program '{}' has no vertex buffer", self.buffers.name);
            return 0;
        };
        method.emplace(self.arena.get_mut(*handle), args);

        let group = self.group_mut();
        debug_assert!(group.vertex_length < MAX_GROUP_VERTICES, "group overflow");
        let index = group.vertex_length as u16;
        group.vertex_length += 1;
        index
    }

    /// Append one record of group-relative vertex indices to the element
    /// buffer.
    pub fn add_element(&mut self, indices: &[u16]) {
        let Some((handle, method)) = &self.buffers.element else {
            debug_assert!(false, "program '{}' has no element buffer", self.buffers.name);
            return;
        };
        method.emplace(self.arena.get_mut(*handle), indices);
        self.group_mut().element_length += 1;
    }

    /// Append one record of group-relative vertex indices to the second
    /// element buffer.
    pub fn add_second_element(&mut self, indices: &[u16]) {
        let Some((handle, method)) = &self.buffers.second_element else {
            debug_assert!(
                false,
                "program '{}' has no second element buffer",
                self.buffers.name
            );
            return;
        };
        method.emplace(self.arena.get_mut(*handle), indices);
        self.group_mut().second_element_length += 1;
    }
}
