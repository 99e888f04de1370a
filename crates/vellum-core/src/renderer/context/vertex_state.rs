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

//! Vertex specification state: a vertex array wired to the buffers it reads.

use super::registry::ObjectRegistry;
use crate::renderer::api::{
    BufferId, ObjectIdentifier, VertexArrayId, VertexAttribute, VertexBufferBinding,
    VertexElement, VertexSpecificationDescriptor,
};
use crate::renderer::error::{DeviceError, ErrorKind, RenderError, RenderResult};
use crate::renderer::traits::GraphicsDevice;

/// One buffer binding slot of a vertex layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPlan {
    /// The buffer feeding the slot.
    pub source: ObjectIdentifier,
    /// Bytes between consecutive vertices: the sum of the slot's element sizes.
    pub stride: u32,
    /// Instance divisor shared by every attribute of the slot.
    pub instance_divisor: u32,
}

/// The attribute formats and buffer slots derived from a list of vertex elements.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VertexLayoutPlan {
    /// One attribute per element, at location `i` for element `i`.
    pub attributes: Vec<VertexAttribute>,
    /// Slots in first-seen order of their buffers.
    pub slots: Vec<SlotPlan>,
}

/// Lays out `elements` into attributes and buffer slots.
///
/// Each distinct buffer gets a slot the first time it is seen. Attributes sharing a
/// buffer are interleaved in element order: each starts at the running offset of its
/// slot. Attributes sharing a slot must agree on the instance divisor.
pub fn plan_vertex_layout(elements: &[VertexElement]) -> RenderResult<VertexLayoutPlan> {
    let mut plan = VertexLayoutPlan::default();

    for (location, element) in elements.iter().enumerate() {
        let slot = match plan
            .slots
            .iter()
            .position(|slot| slot.source == element.buffer_source)
        {
            Some(slot) => slot,
            None => {
                plan.slots.push(SlotPlan {
                    source: element.buffer_source.clone(),
                    stride: 0,
                    instance_divisor: element.instance_divisor,
                });
                plan.slots.len() - 1
            }
        };

        let slot_plan = &mut plan.slots[slot];
        if slot_plan.instance_divisor != element.instance_divisor {
            return Err(RenderError::broken_source(format!(
                "Vertex element {location} uses divisor {} but buffer '{}' already steps with divisor {}",
                element.instance_divisor, element.buffer_source, slot_plan.instance_divisor
            )));
        }

        plan.attributes.push(VertexAttribute {
            location: location as u32,
            binding_slot: slot as u32,
            element_type: element.element_type,
            relative_offset: slot_plan.stride,
            instance_divisor: element.instance_divisor,
        });
        slot_plan.stride += element.element_type.size();
    }

    Ok(plan)
}

/// A live vertex specification.
///
/// Remembers the buffer handles it was wired with so it can detect a source buffer
/// that was deleted or replaced since.
#[derive(Debug)]
pub struct VertexSpecificationState {
    name: String,
    vertex_array: VertexArrayId,
    sources: Vec<(ObjectIdentifier, BufferId)>,
    index_buffer: Option<(ObjectIdentifier, BufferId)>,
}

impl VertexSpecificationState {
    /// Builds the vertex array for `descriptor`.
    ///
    /// Every buffer is resolved before the vertex array is created, so a missing
    /// source leaves no GPU object behind.
    pub fn create(
        device: &dyn GraphicsDevice,
        registry: &ObjectRegistry,
        descriptor: &VertexSpecificationDescriptor,
    ) -> RenderResult<Self> {
        let name = descriptor.identifier.name();
        let plan = plan_vertex_layout(&descriptor.elements)?;

        let resolve = |source: &ObjectIdentifier| {
            registry
                .buffer(source)
                .map(|buffer| (source.clone(), buffer.id()))
                .ok_or_else(|| {
                    RenderError::unknown_source(format!(
                        "No buffer called '{source}' found while creating vertex specification '{name}'"
                    ))
                })
        };
        let sources = plan
            .slots
            .iter()
            .map(|slot| resolve(&slot.source))
            .collect::<RenderResult<Vec<_>>>()?;
        let index_buffer = descriptor
            .index_buffer_source
            .as_ref()
            .map(resolve)
            .transpose()?;

        let vertex_array = device.create_vertex_array().map_err(|err| {
            RenderError::new(
                ErrorKind::BackendError,
                format!("Failed to create the vertex array of '{name}': {err}"),
            )
        })?;

        let state = Self {
            name: name.to_owned(),
            vertex_array,
            sources,
            index_buffer,
        };
        if let Err(err) = state.wire(device, &plan) {
            state.destroy(device);
            return Err(RenderError::new(
                ErrorKind::BackendError,
                format!("Failed to configure vertex specification '{name}': {err}"),
            ));
        }
        if !state.is_valid(device) {
            state.destroy(device);
            return Err(RenderError::new(
                ErrorKind::BackendFailure,
                format!("Vertex specification '{name}' resulted in an invalid vertex array"),
            ));
        }

        log::debug!(
            "Created vertex specification '{name}' ({} attributes over {} buffers{})",
            plan.attributes.len(),
            plan.slots.len(),
            if state.index_buffer.is_some() { ", indexed" } else { "" }
        );
        Ok(state)
    }

    fn wire(&self, device: &dyn GraphicsDevice, plan: &VertexLayoutPlan) -> Result<(), DeviceError> {
        for attribute in &plan.attributes {
            device.configure_vertex_attribute(self.vertex_array, attribute)?;
        }
        for (slot, (slot_plan, (_, buffer))) in plan.slots.iter().zip(&self.sources).enumerate() {
            device.attach_vertex_buffer(
                self.vertex_array,
                &VertexBufferBinding {
                    slot: slot as u32,
                    buffer: *buffer,
                    stride: slot_plan.stride,
                },
            )?;
        }
        if let Some((_, buffer)) = &self.index_buffer {
            device.attach_index_buffer(self.vertex_array, *buffer)?;
        }
        Ok(())
    }

    /// The device vertex array.
    pub fn vertex_array(&self) -> VertexArrayId {
        self.vertex_array
    }

    /// Returns `true` if an index buffer is attached.
    pub fn has_index_buffer(&self) -> bool {
        self.index_buffer.is_some()
    }

    /// Returns `true` if the vertex array is still alive on the device.
    pub fn is_valid(&self, device: &dyn GraphicsDevice) -> bool {
        device.is_vertex_array(self.vertex_array)
    }

    /// Checks that the vertex array and every buffer it was wired with still exist
    /// under the same names, failing with `BrokenSource` otherwise.
    pub fn validate(&self, device: &dyn GraphicsDevice, registry: &ObjectRegistry) -> RenderResult<()> {
        if !self.is_valid(device) {
            return Err(RenderError::broken_source(format!(
                "Vertex specification '{}' lost its vertex array",
                self.name
            )));
        }
        for (source, buffer) in self.sources.iter().chain(&self.index_buffer) {
            let current = registry.buffer(source).map(|state| state.id());
            if current != Some(*buffer) || !device.is_buffer(*buffer) {
                return Err(RenderError::broken_source(format!(
                    "Buffer '{source}' used by vertex specification '{}' was deleted or replaced",
                    self.name
                )));
            }
        }
        Ok(())
    }

    /// Destroys the vertex array. Buffers are owned by their own states.
    pub fn destroy(self, device: &dyn GraphicsDevice) {
        if let Err(err) = device.destroy_vertex_array(self.vertex_array) {
            log::error!(
                "Failed to destroy the vertex array of '{}': {err}",
                self.name
            );
        }
    }
}
