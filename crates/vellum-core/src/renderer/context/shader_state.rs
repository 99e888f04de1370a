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

//! Shader and shader specification states.

use super::registry::ObjectRegistry;
use crate::renderer::api::{
    BindingBlock, ObjectIdentifier, ProgramId, ShaderBufferBinding, ShaderDescriptor,
    ShaderSpecificationDescriptor, ShaderStage,
};
use crate::renderer::error::{ErrorKind, RenderError, RenderResult};
use crate::renderer::traits::GraphicsDevice;

/// Merges the binding blocks of every stage into one list.
///
/// A block declared by several stages must agree on kind and slot.
pub fn merge_binding_blocks(stages: &[ShaderStage]) -> RenderResult<Vec<BindingBlock>> {
    let mut merged: Vec<BindingBlock> = Vec::new();
    for block in stages.iter().flat_map(|stage| &stage.program.binding_blocks) {
        match merged.iter().find(|existing| existing.name == block.name) {
            Some(existing) if existing == block => {}
            Some(existing) => {
                return Err(RenderError::duplicate_name(format!(
                    "Binding block '{}' is declared as {:?} slot {} and as {:?} slot {}",
                    block.name, existing.kind, existing.slot, block.kind, block.slot
                )));
            }
            None => merged.push(block.clone()),
        }
    }
    Ok(merged)
}

/// A linked program and the binding blocks its stages declare.
#[derive(Debug)]
pub struct ShaderState {
    name: String,
    program: ProgramId,
    binding_blocks: Vec<BindingBlock>,
}

impl ShaderState {
    /// Compiles and links the stages of `descriptor`.
    pub fn create(device: &dyn GraphicsDevice, descriptor: &ShaderDescriptor) -> RenderResult<Self> {
        let name = descriptor.identifier.name();
        if descriptor.stages.is_empty() {
            return Err(RenderError::broken_source(format!(
                "Shader '{name}' has no stages"
            )));
        }
        let binding_blocks =
            merge_binding_blocks(&descriptor.stages).map_err(|err| err.context(name))?;

        let program = device.create_program(&descriptor.stages).map_err(|err| {
            RenderError::new(
                ErrorKind::BackendError,
                format!("Failed to build shader '{name}': {err}"),
            )
        })?;

        log::debug!(
            "Linked shader '{name}' ({} stages, {} binding blocks)",
            descriptor.stages.len(),
            binding_blocks.len()
        );
        Ok(Self {
            name: name.to_owned(),
            program,
            binding_blocks,
        })
    }

    /// The device program.
    pub fn program(&self) -> ProgramId {
        self.program
    }

    /// Looks up a binding block by name.
    pub fn binding(&self, name: &str) -> Option<&BindingBlock> {
        self.binding_blocks.iter().find(|block| block.name == name)
    }

    /// Every binding block declared by the shader's stages.
    pub fn binding_blocks(&self) -> &[BindingBlock] {
        &self.binding_blocks
    }

    /// Returns `true` if the program is still alive on the device.
    pub fn is_valid(&self, device: &dyn GraphicsDevice) -> bool {
        device.is_program(self.program)
    }

    /// Destroys the program.
    pub fn destroy(self, device: &dyn GraphicsDevice) {
        if let Err(err) = device.destroy_program(self.program) {
            log::error!("Failed to destroy the program of shader '{}': {err}", self.name);
        }
    }
}

/// A shader plus the buffers to attach to its binding blocks.
///
/// Buffer bindings are resolved every time the specification is bound, so buffers
/// can be declared after the specification.
#[derive(Debug)]
pub struct ShaderSpecificationState {
    name: String,
    shader: ObjectIdentifier,
    buffer_bindings: Vec<ShaderBufferBinding>,
}

impl ShaderSpecificationState {
    /// Checks that the referenced shader exists and is valid.
    pub fn create(
        device: &dyn GraphicsDevice,
        registry: &ObjectRegistry,
        descriptor: &ShaderSpecificationDescriptor,
    ) -> RenderResult<Self> {
        let name = descriptor.identifier.name();
        let shader = registry.shader(&descriptor.shader).ok_or_else(|| {
            RenderError::unknown_source(format!(
                "Shader '{}' referenced by shader specification '{name}' not found",
                descriptor.shader
            ))
        })?;
        if !shader.is_valid(device) {
            return Err(RenderError::broken_source(format!(
                "Shader '{}' referenced by shader specification '{name}' is invalid",
                descriptor.shader
            )));
        }

        Ok(Self {
            name: name.to_owned(),
            shader: descriptor.shader.clone(),
            buffer_bindings: descriptor.buffer_bindings.clone(),
        })
    }

    /// The shader this specification binds.
    pub fn shader(&self) -> &ObjectIdentifier {
        &self.shader
    }

    /// The buffers attached to the shader's binding blocks.
    pub fn buffer_bindings(&self) -> &[ShaderBufferBinding] {
        &self.buffer_bindings
    }

    /// Uses the program and binds every buffer to its block's slot.
    pub fn bind(&self, device: &dyn GraphicsDevice, registry: &ObjectRegistry) -> RenderResult<()> {
        let shader = registry.shader(&self.shader).ok_or_else(|| {
            RenderError::unknown_source(format!(
                "Shader '{}' used by shader specification '{}' not found",
                self.shader, self.name
            ))
        })?;
        if !shader.is_valid(device) {
            return Err(RenderError::broken_source(format!(
                "Shader '{}' used by shader specification '{}' is invalid",
                self.shader, self.name
            )));
        }
        device.use_program(shader.program())?;

        for binding in &self.buffer_bindings {
            let buffer = registry.buffer(&binding.buffer).ok_or_else(|| {
                RenderError::unknown_source(format!(
                    "Buffer '{}' bound by shader specification '{}' not found",
                    binding.buffer, self.name
                ))
            })?;
            if !buffer.is_valid(device) {
                return Err(RenderError::broken_source(format!(
                    "Buffer '{}' bound by shader specification '{}' is invalid",
                    binding.buffer, self.name
                )));
            }
            let block = shader.binding(&binding.binding).ok_or_else(|| {
                RenderError::unknown_name(format!(
                    "Shader '{}' does not contain a binding called '{}'",
                    self.shader, binding.binding
                ))
            })?;
            device.bind_buffer_range(block.kind, block.slot, buffer.id(), 0, buffer.size())?;
        }
        Ok(())
    }
}
