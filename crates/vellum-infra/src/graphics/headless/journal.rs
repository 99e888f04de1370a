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

//! The record of every call a [`HeadlessDevice`](super::HeadlessDevice) receives.

use vellum_core::renderer::api::*;
use vellum_core::renderer::DrawCall;

/// One device call, with the arguments that matter for replay comparisons.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    /// A buffer was allocated.
    CreateBuffer {
        /// The new buffer.
        buffer: BufferId,
        /// Its size in bytes.
        size: u64,
        /// Its storage flags.
        usage: BufferUsage,
    },
    /// A buffer was released.
    DestroyBuffer(BufferId),
    /// A buffer was mapped.
    MapBuffer(BufferId),
    /// A buffer was unmapped.
    UnmapBuffer(BufferId),
    /// Bytes were written through a mapping.
    WriteMapped {
        /// The written buffer.
        buffer: BufferId,
        /// Write offset.
        offset: u64,
        /// Bytes written.
        size: u64,
    },
    /// Bytes were read through a mapping.
    ReadMapped {
        /// The read buffer.
        buffer: BufferId,
        /// Read offset.
        offset: u64,
        /// Bytes read.
        size: u64,
    },
    /// A GPU copy was issued.
    CopyBuffer {
        /// Copy source.
        source: BufferId,
        /// Copy destination.
        destination: BufferId,
        /// Offset in the source.
        source_offset: u64,
        /// Offset in the destination.
        destination_offset: u64,
        /// Bytes copied.
        size: u64,
    },
    /// A fence was inserted.
    InsertFence(FenceId),
    /// A fence was deleted.
    DeleteFence(FenceId),
    /// A vertex array was created.
    CreateVertexArray(VertexArrayId),
    /// A vertex array was destroyed.
    DestroyVertexArray(VertexArrayId),
    /// A vertex attribute was formatted.
    ConfigureVertexAttribute {
        /// The vertex array.
        vertex_array: VertexArrayId,
        /// The attribute format.
        attribute: VertexAttribute,
    },
    /// A vertex buffer was attached to a slot.
    AttachVertexBuffer {
        /// The vertex array.
        vertex_array: VertexArrayId,
        /// The slot binding.
        binding: VertexBufferBinding,
    },
    /// An index buffer was attached.
    AttachIndexBuffer {
        /// The vertex array.
        vertex_array: VertexArrayId,
        /// The index buffer.
        buffer: BufferId,
    },
    /// A vertex array was bound.
    BindVertexArray(VertexArrayId),
    /// A program was linked.
    CreateProgram {
        /// The new program.
        program: ProgramId,
        /// The kinds of its stages, in order.
        stages: Vec<ShaderStageKind>,
    },
    /// A program was destroyed.
    DestroyProgram(ProgramId),
    /// A program was made current.
    UseProgram(ProgramId),
    /// A buffer range was bound to a block slot.
    BindBufferRange {
        /// Uniform or storage.
        kind: BindingKind,
        /// The binding point.
        slot: u32,
        /// The bound buffer.
        buffer: BufferId,
        /// Range offset.
        offset: u64,
        /// Range size.
        size: u64,
    },
    /// A buffer was bound as the indirect parameter source.
    BindIndirectBuffer(BufferId),
    /// A draw was issued.
    Draw(DrawCall),
    /// Blending was set.
    SetBlending {
        /// The blending state.
        config: BlendingConfig,
        /// The draw buffer.
        draw_buffer: u32,
    },
    /// The stencil test was set.
    SetStencil {
        /// The stencil state.
        config: StencilConfig,
        /// The faces.
        facing: StencilFacing,
    },
    /// A scissor rectangle was set.
    SetScissor {
        /// The scissor state.
        config: ScissorConfig,
        /// The viewport.
        viewport: u32,
    },
    /// Face culling was set.
    SetFaceCull(FaceCullMode),
    /// The depth test was set.
    SetDepthTest(DepthTestConfig),
    /// A depth range was set.
    SetDepthRange {
        /// Near plane depth.
        near: f64,
        /// Far plane depth.
        far: f64,
        /// The viewport.
        viewport: u32,
    },
    /// The window was cleared.
    ClearWindow {
        /// Cleared attachments.
        mode: ClearMode,
        /// Clear values.
        values: ClearValues,
    },
}

impl DeviceCall {
    /// Returns `true` for calls that create or destroy device objects.
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            DeviceCall::CreateBuffer { .. }
                | DeviceCall::DestroyBuffer(_)
                | DeviceCall::InsertFence(_)
                | DeviceCall::DeleteFence(_)
                | DeviceCall::CreateVertexArray(_)
                | DeviceCall::DestroyVertexArray(_)
                | DeviceCall::CreateProgram { .. }
                | DeviceCall::DestroyProgram(_)
        )
    }
}
