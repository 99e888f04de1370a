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

//! Defines the `GraphicsDevice` trait, the seam between the render context and a graphics API.

use crate::renderer::api::*;
use crate::renderer::error::DeviceError;
use std::fmt::Debug;

/// A resolved draw, ready for the device to issue.
///
/// The render context has already bound the vertex array, program and buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawCall {
    /// Non-indexed instanced draw.
    Arrays {
        /// How vertices form triangles.
        mode: DrawMode,
        /// First vertex.
        first: u32,
        /// Vertices per instance.
        count: u32,
        /// Number of instances.
        instances: u32,
        /// First instance.
        base_instance: u32,
    },
    /// Indexed instanced draw from the bound vertex array's index buffer.
    Elements {
        /// How vertices form triangles.
        mode: DrawMode,
        /// Integer type of the indices.
        index_type: IndexType,
        /// First index.
        first_index: u32,
        /// Indices per instance.
        count: u32,
        /// Added to every index.
        base_vertex: i32,
        /// Number of instances.
        instances: u32,
        /// First instance.
        base_instance: u32,
    },
    /// Non-indexed draws from the bound indirect buffer.
    ArraysIndirect {
        /// How vertices form triangles.
        mode: DrawMode,
        /// Byte offset of the first record.
        offset: u64,
        /// Number of consecutive records.
        draw_count: u32,
    },
    /// Indexed draws from the bound indirect buffer.
    ElementsIndirect {
        /// How vertices form triangles.
        mode: DrawMode,
        /// Integer type of the indices.
        index_type: IndexType,
        /// Byte offset of the first record.
        offset: u64,
        /// Number of consecutive records.
        draw_count: u32,
    },
}

/// The low-level primitives a graphics API must provide to back a render context.
///
/// Implementations wrap one graphics context. All methods take `&self`; devices
/// that keep bookkeeping use interior mutability. The render context guarantees the
/// graphics context is current before calling into the device.
pub trait GraphicsDevice: Debug {
    // --- Buffers ---

    /// Allocates a buffer of fixed size.
    /// ## Arguments
    /// * `size` - The size of the allocation in bytes.
    /// * `usage` - How the allocation will be accessed; decides its storage flags.
    /// ## Returns
    /// A `Result` containing the ID of the new buffer.
    /// ## Errors
    /// * `DeviceError` - If the allocation fails.
    fn create_buffer(&self, size: u64, usage: BufferUsage) -> Result<BufferId, DeviceError>;

    /// Releases a buffer. Pending GPU work that reads it still completes.
    fn destroy_buffer(&self, id: BufferId) -> Result<(), DeviceError>;

    /// Returns `true` if `id` names a live buffer.
    fn is_buffer(&self, id: BufferId) -> bool;

    /// Maps the whole buffer for CPU access. Host-visible and staging buffers stay
    /// mapped persistently; mapping an already-mapped buffer is a no-op.
    /// ## Errors
    /// * `DeviceError::MappingFailed` - If the buffer's storage cannot be mapped.
    fn map_buffer(&self, id: BufferId) -> Result<(), DeviceError>;

    /// Ends the CPU mapping of a buffer.
    fn unmap_buffer(&self, id: BufferId) -> Result<(), DeviceError>;

    /// Writes `data` into a mapped buffer at `offset`.
    /// ## Errors
    /// * `DeviceError::MappingFailed` - If the buffer is not mapped.
    /// * `DeviceError::OutOfBounds` - If the range exceeds the buffer.
    fn write_mapped(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), DeviceError>;

    /// Reads from a mapped, host-visible buffer at `offset` into `out`.
    fn read_mapped(&self, id: BufferId, offset: u64, out: &mut [u8]) -> Result<(), DeviceError>;

    /// Queues a GPU-side copy of `size` bytes between two buffers.
    fn copy_buffer(
        &self,
        source: BufferId,
        destination: BufferId,
        source_offset: u64,
        destination_offset: u64,
        size: u64,
    ) -> Result<(), DeviceError>;

    // --- Fences ---

    /// Inserts a fence that signals once all previously issued GPU work has completed.
    fn insert_fence(&self) -> Result<FenceId, DeviceError>;

    /// Blocks for at most `timeout_nanos` waiting for a fence. A zero timeout polls.
    fn wait_fence(&self, fence: FenceId, timeout_nanos: u64) -> FenceWait;

    /// Deletes a fence.
    fn delete_fence(&self, fence: FenceId);

    // --- Vertex arrays ---

    /// Creates an empty vertex array.
    fn create_vertex_array(&self) -> Result<VertexArrayId, DeviceError>;

    /// Destroys a vertex array.
    fn destroy_vertex_array(&self, id: VertexArrayId) -> Result<(), DeviceError>;

    /// Returns `true` if `id` names a live vertex array.
    fn is_vertex_array(&self, id: VertexArrayId) -> bool;

    /// Enables and formats one attribute of a vertex array.
    fn configure_vertex_attribute(
        &self,
        vertex_array: VertexArrayId,
        attribute: &VertexAttribute,
    ) -> Result<(), DeviceError>;

    /// Attaches a buffer to one of a vertex array's binding slots.
    fn attach_vertex_buffer(
        &self,
        vertex_array: VertexArrayId,
        binding: &VertexBufferBinding,
    ) -> Result<(), DeviceError>;

    /// Attaches the index buffer of a vertex array.
    fn attach_index_buffer(
        &self,
        vertex_array: VertexArrayId,
        buffer: BufferId,
    ) -> Result<(), DeviceError>;

    /// Makes a vertex array current for subsequent draws.
    fn bind_vertex_array(&self, id: VertexArrayId) -> Result<(), DeviceError>;

    // --- Programs ---

    /// Compiles every stage and links them into a program.
    /// ## Errors
    /// * `DeviceError::Compilation` - If a stage fails to compile or the program fails to link.
    fn create_program(&self, stages: &[ShaderStage]) -> Result<ProgramId, DeviceError>;

    /// Destroys a program.
    fn destroy_program(&self, id: ProgramId) -> Result<(), DeviceError>;

    /// Returns `true` if `id` names a live program.
    fn is_program(&self, id: ProgramId) -> bool;

    /// Makes a program current for subsequent draws.
    fn use_program(&self, id: ProgramId) -> Result<(), DeviceError>;

    /// Binds a range of a buffer to an indexed uniform or storage binding point.
    fn bind_buffer_range(
        &self,
        kind: BindingKind,
        slot: u32,
        buffer: BufferId,
        offset: u64,
        size: u64,
    ) -> Result<(), DeviceError>;

    /// Binds the buffer indirect draws read their parameters from.
    fn bind_indirect_buffer(&self, buffer: BufferId) -> Result<(), DeviceError>;

    // --- Drawing and fixed-function state ---

    /// Issues a draw with the currently bound state.
    fn draw(&self, call: &DrawCall) -> Result<(), DeviceError>;

    /// Sets blending for one draw buffer.
    fn set_blending(&self, config: &BlendingConfig, draw_buffer: u32) -> Result<(), DeviceError>;

    /// Sets the stencil test for the given faces.
    fn set_stencil(&self, config: &StencilConfig, facing: StencilFacing) -> Result<(), DeviceError>;

    /// Sets the scissor rectangle of one viewport.
    fn set_scissor(&self, config: &ScissorConfig, viewport: u32) -> Result<(), DeviceError>;

    /// Sets face culling.
    fn set_face_cull(&self, mode: FaceCullMode) -> Result<(), DeviceError>;

    /// Sets the depth test.
    fn set_depth_test(&self, config: &DepthTestConfig) -> Result<(), DeviceError>;

    /// Sets the depth range of one viewport.
    fn set_depth_range(&self, near: f64, far: f64, viewport: u32) -> Result<(), DeviceError>;

    /// Clears attachments of the window framebuffer.
    fn clear_window(&self, mode: ClearMode, values: &ClearValues) -> Result<(), DeviceError>;
}
