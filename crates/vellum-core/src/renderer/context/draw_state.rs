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

//! Draw specification state: which vertex specification feeds which shader specification.

use super::registry::ObjectRegistry;
use crate::renderer::api::{DrawSpecificationDescriptor, ObjectIdentifier};
use crate::renderer::error::{RenderError, RenderResult};

/// Pairs a vertex specification with a shader specification. Owns no GPU resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawSpecificationState {
    vertex_specification: ObjectIdentifier,
    shader_specification: ObjectIdentifier,
}

impl DrawSpecificationState {
    /// Pairs two specifications without checking that they exist.
    pub fn new(vertex_specification: ObjectIdentifier, shader_specification: ObjectIdentifier) -> Self {
        Self {
            vertex_specification,
            shader_specification,
        }
    }

    /// Checks eagerly that both specifications exist.
    pub fn create(registry: &ObjectRegistry, descriptor: &DrawSpecificationDescriptor) -> RenderResult<Self> {
        let name = &descriptor.identifier;
        if registry
            .vertex_specification(&descriptor.vertex_specification)
            .is_none()
        {
            return Err(RenderError::unknown_name(format!(
                "Vertex specification '{}' used by draw specification '{name}' not found",
                descriptor.vertex_specification
            )));
        }
        if registry
            .shader_specification(&descriptor.shader_specification)
            .is_none()
        {
            return Err(RenderError::unknown_name(format!(
                "Shader specification '{}' used by draw specification '{name}' not found",
                descriptor.shader_specification
            )));
        }
        Ok(Self::new(
            descriptor.vertex_specification.clone(),
            descriptor.shader_specification.clone(),
        ))
    }

    /// The vertex specification to draw from.
    pub fn vertex_specification(&self) -> &ObjectIdentifier {
        &self.vertex_specification
    }

    /// The shader specification to draw with.
    pub fn shader_specification(&self) -> &ObjectIdentifier {
        &self.shader_specification
    }
}
