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

use vellum_core::renderer::api::{
    BindingKind, BlendFactor, BlendOperation, BufferUsage, ClearMode, CompareFunction, DrawMode,
    FaceCullMode, IndexType, ShaderStageKind, StencilFacing, StencilOperation, VertexScalar,
};

/// A local extension trait to convert our engine's types into OpenGL enums.
/// This avoids Rust's orphan rules while keeping an idiomatic `.into_gl()` syntax.
pub trait IntoGl<T> {
    /// Consumes self and converts it into an OpenGL-compatible value.
    fn into_gl(self) -> T;
}

// --- Buffers ---

impl IntoGl<u32> for BufferUsage {
    /// The `glBufferStorage` flags of an allocation.
    fn into_gl(self) -> u32 {
        match self {
            BufferUsage::DeviceLocal => 0,
            BufferUsage::HostVisible => {
                glow::MAP_READ_BIT
                    | glow::MAP_WRITE_BIT
                    | glow::MAP_PERSISTENT_BIT
                    | glow::MAP_COHERENT_BIT
                    | glow::CLIENT_STORAGE_BIT
            }
            BufferUsage::Staging => {
                glow::MAP_WRITE_BIT | glow::MAP_PERSISTENT_BIT | glow::MAP_COHERENT_BIT
            }
            BufferUsage::Transfer => glow::MAP_WRITE_BIT,
        }
    }
}

/// The `glMapBufferRange` access flags matching a buffer's storage flags.
pub fn map_access(usage: BufferUsage) -> Option<u32> {
    match usage {
        BufferUsage::DeviceLocal => None,
        BufferUsage::HostVisible => Some(
            glow::MAP_READ_BIT | glow::MAP_WRITE_BIT | glow::MAP_PERSISTENT_BIT | glow::MAP_COHERENT_BIT,
        ),
        BufferUsage::Staging => {
            Some(glow::MAP_WRITE_BIT | glow::MAP_PERSISTENT_BIT | glow::MAP_COHERENT_BIT)
        }
        BufferUsage::Transfer => Some(glow::MAP_WRITE_BIT | glow::MAP_INVALIDATE_BUFFER_BIT),
    }
}

impl IntoGl<u32> for BindingKind {
    fn into_gl(self) -> u32 {
        match self {
            BindingKind::Uniform => glow::UNIFORM_BUFFER,
            BindingKind::Storage => glow::SHADER_STORAGE_BUFFER,
        }
    }
}

// --- Vertex input ---

impl IntoGl<u32> for VertexScalar {
    fn into_gl(self) -> u32 {
        match self {
            VertexScalar::U8 => glow::UNSIGNED_BYTE,
            VertexScalar::I8 => glow::BYTE,
            VertexScalar::U16 => glow::UNSIGNED_SHORT,
            VertexScalar::I16 => glow::SHORT,
            VertexScalar::U32 => glow::UNSIGNED_INT,
            VertexScalar::I32 => glow::INT,
            VertexScalar::F16 => glow::HALF_FLOAT,
            VertexScalar::F32 => glow::FLOAT,
        }
    }
}

impl IntoGl<u32> for IndexType {
    fn into_gl(self) -> u32 {
        match self {
            IndexType::U8 => glow::UNSIGNED_BYTE,
            IndexType::U16 => glow::UNSIGNED_SHORT,
            IndexType::U32 => glow::UNSIGNED_INT,
        }
    }
}

impl IntoGl<u32> for DrawMode {
    fn into_gl(self) -> u32 {
        match self {
            DrawMode::Triangles => glow::TRIANGLES,
            DrawMode::TriangleStrip => glow::TRIANGLE_STRIP,
            DrawMode::TriangleFan => glow::TRIANGLE_FAN,
        }
    }
}

// --- Shaders ---

impl IntoGl<u32> for ShaderStageKind {
    fn into_gl(self) -> u32 {
        match self {
            ShaderStageKind::Vertex => glow::VERTEX_SHADER,
            ShaderStageKind::TessellationControl => glow::TESS_CONTROL_SHADER,
            ShaderStageKind::TessellationEvaluation => glow::TESS_EVALUATION_SHADER,
            ShaderStageKind::Geometry => glow::GEOMETRY_SHADER,
            ShaderStageKind::Fragment => glow::FRAGMENT_SHADER,
            ShaderStageKind::Compute => glow::COMPUTE_SHADER,
        }
    }
}

// --- Fixed-function state ---

impl IntoGl<u32> for CompareFunction {
    fn into_gl(self) -> u32 {
        match self {
            CompareFunction::Always => glow::ALWAYS,
            CompareFunction::Never => glow::NEVER,
            CompareFunction::Less => glow::LESS,
            CompareFunction::LessEqual => glow::LEQUAL,
            CompareFunction::Greater => glow::GREATER,
            CompareFunction::GreaterEqual => glow::GEQUAL,
            CompareFunction::Equal => glow::EQUAL,
            CompareFunction::NotEqual => glow::NOTEQUAL,
        }
    }
}

impl IntoGl<u32> for StencilOperation {
    fn into_gl(self) -> u32 {
        match self {
            StencilOperation::Keep => glow::KEEP,
            StencilOperation::Zero => glow::ZERO,
            StencilOperation::Replace => glow::REPLACE,
            StencilOperation::IncrementClamp => glow::INCR,
            StencilOperation::IncrementWrap => glow::INCR_WRAP,
            StencilOperation::DecrementClamp => glow::DECR,
            StencilOperation::DecrementWrap => glow::DECR_WRAP,
            StencilOperation::Invert => glow::INVERT,
        }
    }
}

impl IntoGl<u32> for StencilFacing {
    fn into_gl(self) -> u32 {
        match self {
            StencilFacing::Front => glow::FRONT,
            StencilFacing::Back => glow::BACK,
            StencilFacing::Both => glow::FRONT_AND_BACK,
        }
    }
}

impl IntoGl<u32> for BlendFactor {
    fn into_gl(self) -> u32 {
        match self {
            BlendFactor::Zero => glow::ZERO,
            BlendFactor::One => glow::ONE,
            BlendFactor::ConstantColor => glow::CONSTANT_COLOR,
            BlendFactor::ConstantAlpha => glow::CONSTANT_ALPHA,
            BlendFactor::OneMinusConstantColor => glow::ONE_MINUS_CONSTANT_COLOR,
            BlendFactor::OneMinusConstantAlpha => glow::ONE_MINUS_CONSTANT_ALPHA,
            BlendFactor::SrcColor => glow::SRC_COLOR,
            BlendFactor::DstColor => glow::DST_COLOR,
            BlendFactor::OneMinusSrcColor => glow::ONE_MINUS_SRC_COLOR,
            BlendFactor::OneMinusDstColor => glow::ONE_MINUS_DST_COLOR,
            BlendFactor::SrcAlpha => glow::SRC_ALPHA,
            BlendFactor::DstAlpha => glow::DST_ALPHA,
            BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
            BlendFactor::OneMinusDstAlpha => glow::ONE_MINUS_DST_ALPHA,
            BlendFactor::SrcAlphaSaturated => glow::SRC_ALPHA_SATURATE,
            BlendFactor::Src1Color => glow::SRC1_COLOR,
            BlendFactor::Src1Alpha => glow::SRC1_ALPHA,
        }
    }
}

impl IntoGl<u32> for BlendOperation {
    fn into_gl(self) -> u32 {
        match self {
            BlendOperation::Add => glow::FUNC_ADD,
            BlendOperation::Subtract => glow::FUNC_SUBTRACT,
            BlendOperation::ReverseSubtract => glow::FUNC_REVERSE_SUBTRACT,
            BlendOperation::Min => glow::MIN,
            BlendOperation::Max => glow::MAX,
        }
    }
}

impl IntoGl<Option<u32>> for FaceCullMode {
    /// The faces to cull, or `None` when culling is disabled.
    fn into_gl(self) -> Option<u32> {
        match self {
            FaceCullMode::Disabled => None,
            FaceCullMode::Back => Some(glow::BACK),
            FaceCullMode::Front => Some(glow::FRONT),
            FaceCullMode::Both => Some(glow::FRONT_AND_BACK),
        }
    }
}

impl IntoGl<u32> for ClearMode {
    /// The `glClear` mask.
    fn into_gl(self) -> u32 {
        let mut mask = 0;
        if self.clears_color() {
            mask |= glow::COLOR_BUFFER_BIT;
        }
        if self.clears_depth() {
            mask |= glow::DEPTH_BUFFER_BIT;
        }
        if self.clears_stencil() {
            mask |= glow::STENCIL_BUFFER_BIT;
        }
        mask
    }
}
