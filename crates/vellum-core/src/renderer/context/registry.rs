// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The object-state registry: every live object of a render context, keyed by name hash.

use std::collections::HashMap;

use super::buffer_state::BufferState;
use super::draw_state::DrawSpecificationState;
use super::shader_state::{ShaderSpecificationState, ShaderState};
use super::vertex_state::VertexSpecificationState;
use crate::renderer::api::{ObjectIdentifier, ObjectKind};
use crate::renderer::error::{RenderError, RenderResult};
use crate::renderer::traits::GraphicsDevice;

/// The state of one live object, tagged with its kind.
#[derive(Debug)]
pub enum ObjectState {
    /// A GPU buffer and its staging bookkeeping.
    Buffer(BufferState),
    /// A vertex array built from a vertex specification.
    VertexSpecification(VertexSpecificationState),
    /// A linked program plus its merged binding blocks.
    Shader(ShaderState),
    /// A shader plus the buffers to bind to it.
    ShaderSpecification(ShaderSpecificationState),
    /// A vertex specification paired with a shader specification.
    DrawSpecification(DrawSpecificationState),
}

impl ObjectState {
    /// The kind of object this state belongs to.
    pub fn kind(&self) -> ObjectKind {
        match self {
            ObjectState::Buffer(_) => ObjectKind::Buffer,
            ObjectState::VertexSpecification(_) => ObjectKind::VertexSpecification,
            ObjectState::Shader(_) => ObjectKind::Shader,
            ObjectState::ShaderSpecification(_) => ObjectKind::ShaderSpecification,
            ObjectState::DrawSpecification(_) => ObjectKind::DrawSpecification,
        }
    }

    /// Releases every GPU resource the state owns.
    pub fn destroy(self, device: &dyn GraphicsDevice) {
        match self {
            ObjectState::Buffer(state) => state.destroy(device),
            ObjectState::VertexSpecification(state) => state.destroy(device),
            ObjectState::Shader(state) => state.destroy(device),
            ObjectState::ShaderSpecification(_) | ObjectState::DrawSpecification(_) => {}
        }
    }
}

#[derive(Debug)]
struct RegistryEntry {
    name: String,
    state: ObjectState,
}

/// Owns every object state of a context.
///
/// Entries are keyed by the identifier hash and remember the full name, so a lookup
/// by a different name that happens to share the hash misses instead of aliasing.
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    entries: HashMap<u64, RegistryEntry>,
}

macro_rules! typed_accessors {
    ($($get:ident, $get_mut:ident => $variant:ident($ty:ty);)*) => {
        $(
            #[doc = concat!("Looks up a `", stringify!($variant), "` by name. Absent and wrong-kind entries both miss.")]
            pub fn $get(&self, id: &ObjectIdentifier) -> Option<&$ty> {
                match self.get(id) {
                    Some(ObjectState::$variant(state)) => Some(state),
                    _ => None,
                }
            }

            #[doc = concat!("Mutable form of [`", stringify!($get), "`](Self::", stringify!($get), ").")]
            pub fn $get_mut(&mut self, id: &ObjectIdentifier) -> Option<&mut $ty> {
                match self.get_mut(id) {
                    Some(ObjectState::$variant(state)) => Some(state),
                    _ => None,
                }
            }
        )*
    };
}

impl ObjectRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails with `DuplicateName` if `id`'s hash is already taken, by the same name
    /// or by a colliding one.
    pub fn check_available(&self, id: &ObjectIdentifier) -> RenderResult<()> {
        match self.entries.get(&id.hash()) {
            None => Ok(()),
            Some(entry) if entry.name == id.name() => Err(RenderError::duplicate_name(format!(
                "An object called '{}' already exists",
                id.name()
            ))),
            Some(entry) => Err(RenderError::duplicate_name(format!(
                "'{}' collides with the hash of existing object '{}'",
                id.name(),
                entry.name
            ))),
        }
    }

    /// Stores a new state under `id`.
    ///
    /// On `DuplicateName` the state is handed back untouched so the caller can destroy it.
    pub fn insert(
        &mut self,
        id: &ObjectIdentifier,
        state: ObjectState,
    ) -> Result<(), (RenderError, ObjectState)> {
        if let Err(err) = self.check_available(id) {
            return Err((err, state));
        }
        self.entries.insert(
            id.hash(),
            RegistryEntry {
                name: id.name().to_owned(),
                state,
            },
        );
        Ok(())
    }

    /// Removes and returns the state stored under `id`.
    pub fn remove(&mut self, id: &ObjectIdentifier) -> Option<ObjectState> {
        if !self.contains(id) {
            return None;
        }
        self.entries.remove(&id.hash()).map(|entry| entry.state)
    }

    /// Returns `true` if an object is registered under exactly this name.
    pub fn contains(&self, id: &ObjectIdentifier) -> bool {
        self.get(id).is_some()
    }

    /// Looks up a state of any kind.
    pub fn get(&self, id: &ObjectIdentifier) -> Option<&ObjectState> {
        self.entries
            .get(&id.hash())
            .filter(|entry| entry.name == id.name())
            .map(|entry| &entry.state)
    }

    /// Looks up a state of any kind, mutably.
    pub fn get_mut(&mut self, id: &ObjectIdentifier) -> Option<&mut ObjectState> {
        self.entries
            .get_mut(&id.hash())
            .filter(|entry| entry.name == id.name())
            .map(|entry| &mut entry.state)
    }

    typed_accessors! {
        buffer, buffer_mut => Buffer(BufferState);
        vertex_specification, vertex_specification_mut => VertexSpecification(VertexSpecificationState);
        shader, shader_mut => Shader(ShaderState);
        shader_specification, shader_specification_mut => ShaderSpecification(ShaderSpecificationState);
        draw_specification, draw_specification_mut => DrawSpecification(DrawSpecificationState);
    }

    /// The number of live objects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no object is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empties the registry, yielding every `(name, state)` pair.
    pub fn drain(&mut self) -> impl Iterator<Item = (String, ObjectState)> + '_ {
        self.entries
            .drain()
            .map(|(_, entry)| (entry.name, entry.state))
    }
}
