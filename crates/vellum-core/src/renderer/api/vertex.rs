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

//! Vertex input layouts: element types, per-attribute elements and vertex specifications.

use super::buffer::BufferId;
use super::identifier::ObjectIdentifier;

/// The scalar type each component of a vertex element is stored as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexScalar {
    /// 8-bit unsigned integer.
    U8,
    /// 8-bit signed integer.
    I8,
    /// 16-bit unsigned integer.
    U16,
    /// 16-bit signed integer.
    I16,
    /// 32-bit unsigned integer.
    U32,
    /// 32-bit signed integer.
    I32,
    /// 16-bit float.
    F16,
    /// 32-bit float.
    F32,
}

impl VertexScalar {
    /// Returns the size in bytes of one component.
    pub fn size(&self) -> u32 {
        match self {
            VertexScalar::U8 | VertexScalar::I8 => 1,
            VertexScalar::U16 | VertexScalar::I16 | VertexScalar::F16 => 2,
            VertexScalar::U32 | VertexScalar::I32 | VertexScalar::F32 => 4,
        }
    }
}

/// The memory format of a single vertex attribute's data.
///
/// `Uint*`/`Int*` are read by the shader as integers, `Float*Norm` are integers
/// normalized to `[0, 1]` (unsigned) or `[-1, 1]` (signed), and `Float*F16`/`Float*F32`
/// are plain floats.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexElementType {
    UintU8,
    Uint2U8,
    Uint3U8,
    Uint4U8,
    UintU16,
    Uint2U16,
    Uint3U16,
    Uint4U16,
    UintU32,
    Uint2U32,
    Uint3U32,
    Uint4U32,

    IntI8,
    Int2I8,
    Int3I8,
    Int4I8,
    IntI16,
    Int2I16,
    Int3I16,
    Int4I16,
    IntI32,
    Int2I32,
    Int3I32,
    Int4I32,

    FloatU8Norm,
    Float2U8Norm,
    Float3U8Norm,
    Float4U8Norm,
    FloatI8Norm,
    Float2I8Norm,
    Float3I8Norm,
    Float4I8Norm,

    FloatU16Norm,
    Float2U16Norm,
    Float3U16Norm,
    Float4U16Norm,
    FloatI16Norm,
    Float2I16Norm,
    Float3I16Norm,
    Float4I16Norm,

    FloatF16,
    Float2F16,
    Float3F16,
    Float4F16,

    FloatF32,
    Float2F32,
    Float3F32,
    Float4F32,
}

/// How a vertex element type is presented to the shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Interpretation {
    Integer,
    Normalized,
    Float,
}

impl VertexElementType {
    fn layout(&self) -> (VertexScalar, u32, Interpretation) {
        use Interpretation::*;
        use VertexElementType::*;
        use VertexScalar as S;
        match self {
            UintU8 => (S::U8, 1, Integer),
            Uint2U8 => (S::U8, 2, Integer),
            Uint3U8 => (S::U8, 3, Integer),
            Uint4U8 => (S::U8, 4, Integer),
            UintU16 => (S::U16, 1, Integer),
            Uint2U16 => (S::U16, 2, Integer),
            Uint3U16 => (S::U16, 3, Integer),
            Uint4U16 => (S::U16, 4, Integer),
            UintU32 => (S::U32, 1, Integer),
            Uint2U32 => (S::U32, 2, Integer),
            Uint3U32 => (S::U32, 3, Integer),
            Uint4U32 => (S::U32, 4, Integer),

            IntI8 => (S::I8, 1, Integer),
            Int2I8 => (S::I8, 2, Integer),
            Int3I8 => (S::I8, 3, Integer),
            Int4I8 => (S::I8, 4, Integer),
            IntI16 => (S::I16, 1, Integer),
            Int2I16 => (S::I16, 2, Integer),
            Int3I16 => (S::I16, 3, Integer),
            Int4I16 => (S::I16, 4, Integer),
            IntI32 => (S::I32, 1, Integer),
            Int2I32 => (S::I32, 2, Integer),
            Int3I32 => (S::I32, 3, Integer),
            Int4I32 => (S::I32, 4, Integer),

            FloatU8Norm => (S::U8, 1, Normalized),
            Float2U8Norm => (S::U8, 2, Normalized),
            Float3U8Norm => (S::U8, 3, Normalized),
            Float4U8Norm => (S::U8, 4, Normalized),
            FloatI8Norm => (S::I8, 1, Normalized),
            Float2I8Norm => (S::I8, 2, Normalized),
            Float3I8Norm => (S::I8, 3, Normalized),
            Float4I8Norm => (S::I8, 4, Normalized),

            FloatU16Norm => (S::U16, 1, Normalized),
            Float2U16Norm => (S::U16, 2, Normalized),
            Float3U16Norm => (S::U16, 3, Normalized),
            Float4U16Norm => (S::U16, 4, Normalized),
            FloatI16Norm => (S::I16, 1, Normalized),
            Float2I16Norm => (S::I16, 2, Normalized),
            Float3I16Norm => (S::I16, 3, Normalized),
            Float4I16Norm => (S::I16, 4, Normalized),

            FloatF16 => (S::F16, 1, Float),
            Float2F16 => (S::F16, 2, Float),
            Float3F16 => (S::F16, 3, Float),
            Float4F16 => (S::F16, 4, Float),

            FloatF32 => (S::F32, 1, Float),
            Float2F32 => (S::F32, 2, Float),
            Float3F32 => (S::F32, 3, Float),
            Float4F32 => (S::F32, 4, Float),
        }
    }

    /// Returns the size in bytes of this element type.
    pub fn size(&self) -> u32 {
        let (scalar, components, _) = self.layout();
        scalar.size() * components
    }

    /// The scalar type of each component.
    pub fn scalar(&self) -> VertexScalar {
        self.layout().0
    }

    /// The number of components (1 to 4).
    pub fn components(&self) -> u32 {
        self.layout().1
    }

    /// `true` if the shader reads this element as integers.
    pub fn is_integer(&self) -> bool {
        self.layout().2 == Interpretation::Integer
    }

    /// `true` if integer data is normalized into floats.
    pub fn is_normalized(&self) -> bool {
        self.layout().2 == Interpretation::Normalized
    }
}

/// One vertex attribute: where its data comes from and how it is laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexElement {
    /// The name of the buffer the attribute is read from.
    pub buffer_source: ObjectIdentifier,
    /// The attribute's format.
    pub element_type: VertexElementType,
    /// Advance once per this many instances; `0` advances per vertex.
    pub instance_divisor: u32,
}

impl VertexElement {
    /// A per-vertex attribute read from `buffer_source`.
    pub fn new(buffer_source: impl Into<ObjectIdentifier>, element_type: VertexElementType) -> Self {
        Self {
            buffer_source: buffer_source.into(),
            element_type,
            instance_divisor: 0,
        }
    }

    /// Sets the instance divisor.
    pub fn with_instance_divisor(mut self, divisor: u32) -> Self {
        self.instance_divisor = divisor;
        self
    }
}

/// A descriptor used to create a named vertex specification.
///
/// Attribute `i` of the specification is element `i` of `elements`. Elements sourced
/// from the same buffer are interleaved in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexSpecificationDescriptor {
    /// The vertex specification's name.
    pub identifier: ObjectIdentifier,
    /// The attributes in shader location order.
    pub elements: Vec<VertexElement>,
    /// The buffer holding indices, if indexed draws are wanted.
    pub index_buffer_source: Option<ObjectIdentifier>,
}

impl VertexSpecificationDescriptor {
    /// Describes a non-indexed vertex specification.
    pub fn new(name: impl Into<ObjectIdentifier>, elements: Vec<VertexElement>) -> Self {
        Self {
            identifier: name.into(),
            elements,
            index_buffer_source: None,
        }
    }

    /// Attaches an index buffer.
    pub fn with_index_buffer(mut self, buffer: impl Into<ObjectIdentifier>) -> Self {
        self.index_buffer_source = Some(buffer.into());
        self
    }
}

/// An opaque handle to a GPU vertex array object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayId(pub usize);

/// Device-level description of one attribute of a vertex array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// The shader attribute location.
    pub location: u32,
    /// The vertex-buffer binding slot the attribute reads from.
    pub binding_slot: u32,
    /// The attribute's format.
    pub element_type: VertexElementType,
    /// The attribute's byte offset within one vertex of its slot.
    pub relative_offset: u32,
    /// Instance divisor of the slot, `0` for per-vertex data.
    pub instance_divisor: u32,
}

/// Device-level description of a buffer attached to a vertex-buffer binding slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBufferBinding {
    /// The binding slot.
    pub slot: u32,
    /// The buffer attached to the slot.
    pub buffer: BufferId,
    /// The distance in bytes between consecutive vertices.
    pub stride: u32,
}

/// The integer type of the indices in an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexType {
    /// 8-bit indices.
    U8,
    /// 16-bit indices.
    U16,
    /// 32-bit indices.
    #[default]
    U32,
}

impl IndexType {
    /// Returns the size in bytes of one index.
    pub fn size(&self) -> u32 {
        match self {
            IndexType::U8 => 1,
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_sizes() {
        assert_eq!(VertexElementType::UintU8.size(), 1);
        assert_eq!(VertexElementType::Uint3U8.size(), 3);
        assert_eq!(VertexElementType::Int3I16.size(), 6);
        assert_eq!(VertexElementType::Float2U16Norm.size(), 4);
        assert_eq!(VertexElementType::Float4F16.size(), 8);
        assert_eq!(VertexElementType::Float3F32.size(), 12);
        assert_eq!(VertexElementType::Float4F32.size(), 16);
        assert_eq!(VertexElementType::Uint4U32.size(), 16);
    }

    #[test]
    fn test_element_interpretation() {
        let uint = VertexElementType::Uint2U16;
        assert!(uint.is_integer());
        assert!(!uint.is_normalized());
        assert_eq!(uint.components(), 2);
        assert_eq!(uint.scalar(), VertexScalar::U16);

        let norm = VertexElementType::Float4I8Norm;
        assert!(!norm.is_integer());
        assert!(norm.is_normalized());
        assert_eq!(norm.scalar(), VertexScalar::I8);

        let float = VertexElementType::FloatF16;
        assert!(!float.is_integer());
        assert!(!float.is_normalized());
        assert_eq!(float.scalar(), VertexScalar::F16);
    }

    #[test]
    fn test_index_type_default_and_size() {
        assert_eq!(IndexType::default(), IndexType::U32);
        assert_eq!(IndexType::U16.size(), 2);
        assert_eq!(IndexType::U8.size(), 1);
    }
}
