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

//! The descriptor sum type: declarative requests to create one named GPU object.

use super::buffer::BufferDescriptor;
use super::identifier::ObjectIdentifier;
use super::shader::{ShaderDescriptor, ShaderSpecificationDescriptor};
use super::vertex::VertexSpecificationDescriptor;

/// The kind of object a descriptor (or a live object state) stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// A GPU buffer.
    Buffer,
    /// A vertex input layout with its bound buffers.
    VertexSpecification,
    /// A linked shader program.
    Shader,
    /// A shader plus its buffer bindings.
    ShaderSpecification,
    /// A vertex specification composed with a shader specification.
    DrawSpecification,
}

impl ObjectKind {
    /// A lower-case, human-readable name for messages.
    pub fn label(&self) -> &'static str {
        match self {
            ObjectKind::Buffer => "buffer",
            ObjectKind::VertexSpecification => "vertex specification",
            ObjectKind::Shader => "shader",
            ObjectKind::ShaderSpecification => "shader specification",
            ObjectKind::DrawSpecification => "draw specification",
        }
    }
}

/// A descriptor used to create a draw specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawSpecificationDescriptor {
    /// The draw specification's name.
    pub identifier: ObjectIdentifier,
    /// The vertex specification to draw from.
    pub vertex_specification: ObjectIdentifier,
    /// The shader specification to draw with.
    pub shader_specification: ObjectIdentifier,
}

impl DrawSpecificationDescriptor {
    /// Composes `vertex_specification` with `shader_specification`.
    pub fn new(
        name: impl Into<ObjectIdentifier>,
        vertex_specification: impl Into<ObjectIdentifier>,
        shader_specification: impl Into<ObjectIdentifier>,
    ) -> Self {
        Self {
            identifier: name.into(),
            vertex_specification: vertex_specification.into(),
            shader_specification: shader_specification.into(),
        }
    }
}

/// A declarative request to create one named GPU object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    /// Create a buffer.
    Buffer(BufferDescriptor),
    /// Create a vertex specification.
    VertexSpecification(VertexSpecificationDescriptor),
    /// Create a shader.
    Shader(ShaderDescriptor),
    /// Create a shader specification.
    ShaderSpecification(ShaderSpecificationDescriptor),
    /// Create a draw specification.
    DrawSpecification(DrawSpecificationDescriptor),
}

impl Descriptor {
    /// The kind of object this descriptor creates.
    pub fn kind(&self) -> ObjectKind {
        match self {
            Descriptor::Buffer(_) => ObjectKind::Buffer,
            Descriptor::VertexSpecification(_) => ObjectKind::VertexSpecification,
            Descriptor::Shader(_) => ObjectKind::Shader,
            Descriptor::ShaderSpecification(_) => ObjectKind::ShaderSpecification,
            Descriptor::DrawSpecification(_) => ObjectKind::DrawSpecification,
        }
    }

    /// The name of the object this descriptor creates.
    pub fn identifier(&self) -> &ObjectIdentifier {
        match self {
            Descriptor::Buffer(desc) => &desc.identifier,
            Descriptor::VertexSpecification(desc) => &desc.identifier,
            Descriptor::Shader(desc) => &desc.identifier,
            Descriptor::ShaderSpecification(desc) => &desc.identifier,
            Descriptor::DrawSpecification(desc) => &desc.identifier,
        }
    }
}

impl From<BufferDescriptor> for Descriptor {
    fn from(desc: BufferDescriptor) -> Self {
        Descriptor::Buffer(desc)
    }
}

impl From<VertexSpecificationDescriptor> for Descriptor {
    fn from(desc: VertexSpecificationDescriptor) -> Self {
        Descriptor::VertexSpecification(desc)
    }
}

impl From<ShaderDescriptor> for Descriptor {
    fn from(desc: ShaderDescriptor) -> Self {
        Descriptor::Shader(desc)
    }
}

impl From<ShaderSpecificationDescriptor> for Descriptor {
    fn from(desc: ShaderSpecificationDescriptor) -> Self {
        Descriptor::ShaderSpecification(desc)
    }
}

impl From<DrawSpecificationDescriptor> for Descriptor {
    fn from(desc: DrawSpecificationDescriptor) -> Self {
        Descriptor::DrawSpecification(desc)
    }
}
