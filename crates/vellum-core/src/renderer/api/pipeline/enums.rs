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

//! Enums for fixed-function pipeline configuration.

/// The comparison function used for depth and stencil testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunction {
    /// The test always passes.
    #[default]
    Always,
    /// The test never passes.
    Never,
    /// The test passes if the new value is less than the existing value.
    Less,
    /// The test passes if the new value is less than or equal to the existing value.
    LessEqual,
    /// The test passes if the new value is greater than the existing value.
    Greater,
    /// The test passes if the new value is greater than or equal to the existing value.
    GreaterEqual,
    /// The test passes if the new value is equal to the existing value.
    Equal,
    /// The test passes if the new value is not equal to the existing value.
    NotEqual,
}

/// An operation to perform on a stencil buffer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilOperation {
    /// Keep the existing stencil value.
    #[default]
    Keep,
    /// Set the stencil value to 0.
    Zero,
    /// Replace the stencil value with the reference value.
    Replace,
    /// Increment the stencil value, clamping at the maximum value.
    IncrementClamp,
    /// Increment the stencil value, wrapping to 0 on overflow.
    IncrementWrap,
    /// Decrement the stencil value, clamping at 0.
    DecrementClamp,
    /// Decrement the stencil value, wrapping to the maximum value on underflow.
    DecrementWrap,
    /// Bitwise invert the stencil value.
    Invert,
}

/// Which polygon faces a stencil configuration applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilFacing {
    /// Front-facing polygons only.
    Front,
    /// Back-facing polygons only.
    Back,
    /// Both faces.
    #[default]
    Both,
}

/// A factor in a blend equation, determining how much a source or destination color contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    /// The factor is `0.0`.
    Zero,
    /// The factor is `1.0`.
    One,
    /// The factor is the constant blend color.
    ConstantColor,
    /// The factor is the constant blend alpha.
    ConstantAlpha,
    /// The factor is `1.0 - constant color`.
    OneMinusConstantColor,
    /// The factor is `1.0 - constant alpha`.
    OneMinusConstantAlpha,
    /// The factor is the source color.
    SrcColor,
    /// The factor is the destination color.
    DstColor,
    /// The factor is `1.0 - src`.
    OneMinusSrcColor,
    /// The factor is `1.0 - dst`.
    OneMinusDstColor,
    /// The factor is the source alpha component (`src.a`).
    SrcAlpha,
    /// The factor is the destination alpha component (`dst.a`).
    DstAlpha,
    /// The factor is `1.0 - src.a`.
    OneMinusSrcAlpha,
    /// The factor is `1.0 - dst.a`.
    OneMinusDstAlpha,
    /// The factor is `min(src.a, 1.0 - dst.a)`.
    SrcAlphaSaturated,
    /// The factor is the second fragment output's color (dual-source blending).
    Src1Color,
    /// The factor is the second fragment output's alpha (dual-source blending).
    Src1Alpha,
}

/// The operation used to combine source and destination colors in a blend equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendOperation {
    /// The result is `source + destination`.
    #[default]
    Add,
    /// The result is `source - destination`.
    Subtract,
    /// The result is `destination - source`.
    ReverseSubtract,
    /// The result is `min(source, destination)`.
    Min,
    /// The result is `max(source, destination)`.
    Max,
}

/// Defines which faces of a triangle to cull (not render).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FaceCullMode {
    /// No culling is performed.
    #[default]
    Disabled,
    /// Cull back-facing triangles.
    Back,
    /// Cull front-facing triangles.
    Front,
    /// Cull every triangle.
    Both,
}

/// Defines how vertices are connected to form triangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrawMode {
    /// Every three vertices form an isolated triangle.
    #[default]
    Triangles,
    /// Vertices form a connected triangle strip.
    TriangleStrip,
    /// Vertices form a fan around the first vertex.
    TriangleFan,
}

/// Which attachments of the window's framebuffer a clear touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClearMode {
    /// The color attachment only.
    Color,
    /// The depth attachment only.
    Depth,
    /// The stencil attachment only.
    Stencil,
    /// Color and depth.
    ColorAndDepth,
    /// Color and stencil.
    ColorAndStencil,
    /// Depth and stencil.
    DepthAndStencil,
    /// Every attachment.
    #[default]
    All,
}

impl ClearMode {
    /// Returns `true` if the color attachment is cleared.
    pub fn clears_color(&self) -> bool {
        matches!(
            self,
            ClearMode::Color | ClearMode::ColorAndDepth | ClearMode::ColorAndStencil | ClearMode::All
        )
    }

    /// Returns `true` if the depth attachment is cleared.
    pub fn clears_depth(&self) -> bool {
        matches!(
            self,
            ClearMode::Depth | ClearMode::ColorAndDepth | ClearMode::DepthAndStencil | ClearMode::All
        )
    }

    /// Returns `true` if the stencil attachment is cleared.
    pub fn clears_stencil(&self) -> bool {
        matches!(
            self,
            ClearMode::Stencil
                | ClearMode::ColorAndStencil
                | ClearMode::DepthAndStencil
                | ClearMode::All
        )
    }
}
