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

//! The command sum type: declarative requests to perform one GPU operation.
//!
//! Commands reference objects by name. Names are resolved every time a command
//! executes, so a stored command buffer whose objects were deleted fails with an
//! error instead of touching stale resources.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use super::identifier::ObjectIdentifier;
use super::pipeline::{
    BlendingConfig, ClearMode, ClearValues, DepthTestConfig, DrawMode, FaceCullMode,
    ScissorConfig, StencilConfig, StencilFacing,
};
use super::vertex::IndexType;

/// A non-indexed draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCommand {
    /// The draw specification to draw with.
    pub draw_specification: ObjectIdentifier,
    /// How vertices form triangles.
    pub mode: DrawMode,
    /// Number of vertices per instance.
    pub count: u32,
    /// First vertex to read.
    pub start_vertex: u32,
    /// Number of instances.
    pub instances: u32,
    /// First instance index.
    pub start_instance: u32,
}

impl DrawCommand {
    /// Draws `count` vertices once.
    pub fn new(draw_specification: impl Into<ObjectIdentifier>, mode: DrawMode, count: u32) -> Self {
        Self {
            draw_specification: draw_specification.into(),
            mode,
            count,
            start_vertex: 0,
            instances: 1,
            start_instance: 0,
        }
    }
}

/// An indexed draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawIndexedCommand {
    /// The draw specification to draw with. Its vertex specification must own an index buffer.
    pub draw_specification: ObjectIdentifier,
    /// How vertices form triangles.
    pub mode: DrawMode,
    /// Number of indices per instance.
    pub count: u32,
    /// First index to read.
    pub start_index: u32,
    /// Added to every index before fetching the vertex.
    pub vertex_index_offset: i32,
    /// Number of instances.
    pub instances: u32,
    /// First instance index.
    pub start_instance: u32,
    /// Integer type of the indices.
    pub index_type: IndexType,
}

impl DrawIndexedCommand {
    /// Draws `count` 32-bit indices once.
    pub fn new(draw_specification: impl Into<ObjectIdentifier>, mode: DrawMode, count: u32) -> Self {
        Self {
            draw_specification: draw_specification.into(),
            mode,
            count,
            start_index: 0,
            vertex_index_offset: 0,
            instances: 1,
            start_instance: 0,
            index_type: IndexType::U32,
        }
    }
}

/// Non-indexed draws whose parameters are read from a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawIndirectCommand {
    /// The draw specification to draw with.
    pub draw_specification: ObjectIdentifier,
    /// The buffer holding [`DrawArraysIndirectParams`] records.
    pub indirect_buffer: ObjectIdentifier,
    /// How vertices form triangles.
    pub mode: DrawMode,
    /// Number of consecutive records to draw.
    pub draw_count: u32,
    /// Byte offset of the first record.
    pub indirect_offset: u32,
}

/// Indexed draws whose parameters are read from a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawIndexedIndirectCommand {
    /// The draw specification to draw with. Its vertex specification must own an index buffer.
    pub draw_specification: ObjectIdentifier,
    /// The buffer holding [`DrawElementsIndirectParams`] records.
    pub indirect_buffer: ObjectIdentifier,
    /// How vertices form triangles.
    pub mode: DrawMode,
    /// Number of consecutive records to draw.
    pub draw_count: u32,
    /// Byte offset of the first record.
    pub indirect_offset: u32,
    /// Integer type of the indices.
    pub index_type: IndexType,
}

/// The GPU-side record read by a non-indexed indirect draw.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct DrawArraysIndirectParams {
    /// Vertices per instance.
    pub vertex_count: u32,
    /// Number of instances.
    pub instance_count: u32,
    /// First vertex.
    pub first_vertex: u32,
    /// First instance.
    pub base_instance: u32,
}

/// The GPU-side record read by an indexed indirect draw.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct DrawElementsIndirectParams {
    /// Indices per instance.
    pub index_count: u32,
    /// Number of instances.
    pub instance_count: u32,
    /// First index.
    pub first_index: u32,
    /// Added to every index.
    pub base_vertex: i32,
    /// First instance.
    pub base_instance: u32,
}

/// How a buffer upload reaches main storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UploadStrategy {
    /// Write straight into persistently mapped main storage, with no synchronization.
    /// The buffer must be host visible.
    UnsafeDirect,
    /// Stage through a fenced ring buffer and copy GPU-side. Suited to frequent uploads.
    SafeStreaming,
    /// Stage through a throwaway buffer and copy GPU-side.
    #[default]
    SafeOneTime,
}

/// Uploads bytes from the client into a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferUploadCommand {
    /// The destination buffer.
    pub buffer: ObjectIdentifier,
    /// Destination offset in bytes.
    pub address: u64,
    /// Number of bytes to upload from the front of `data`.
    pub bytes: u64,
    /// The source bytes.
    pub data: Arc<[u8]>,
    /// How the bytes reach the buffer.
    pub strategy: UploadStrategy,
}

impl BufferUploadCommand {
    /// Uploads all of `data` at `address` with the default strategy.
    pub fn new(buffer: impl Into<ObjectIdentifier>, address: u64, data: impl Into<Arc<[u8]>>) -> Self {
        let data = data.into();
        Self {
            buffer: buffer.into(),
            address,
            bytes: data.len() as u64,
            data,
            strategy: UploadStrategy::default(),
        }
    }

    /// Sets the upload strategy.
    pub fn with_strategy(mut self, strategy: UploadStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Copies bytes between two buffers on the GPU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferCopyCommand {
    /// The buffer to read from.
    pub source: ObjectIdentifier,
    /// The buffer to write to.
    pub destination: ObjectIdentifier,
    /// Read offset in `source`.
    pub source_address: u64,
    /// Write offset in `destination`.
    pub destination_address: u64,
    /// Number of bytes to copy.
    pub bytes: u64,
}

/// Reads bytes from a buffer back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDownloadCommand {
    /// The buffer to read from.
    pub buffer: ObjectIdentifier,
    /// Read offset in bytes.
    pub address: u64,
    /// Number of bytes to read.
    pub bytes: u64,
}

/// Fills a buffer with zeroes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearBufferCommand {
    /// The buffer to clear.
    pub buffer: ObjectIdentifier,
}

/// A declarative request to perform one GPU operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// A non-indexed draw.
    Draw(DrawCommand),
    /// An indexed draw.
    DrawIndexed(DrawIndexedCommand),
    /// Non-indexed draws from a parameter buffer.
    DrawIndirect(DrawIndirectCommand),
    /// Indexed draws from a parameter buffer.
    DrawIndexedIndirect(DrawIndexedIndirectCommand),
    /// Sets the blending state of one draw buffer.
    ConfigBlending {
        /// The blending state.
        config: BlendingConfig,
        /// The draw buffer it applies to.
        draw_buffer_index: u32,
    },
    /// Sets the stencil state of one or both faces.
    ConfigStencil {
        /// The stencil state.
        config: StencilConfig,
        /// The faces it applies to.
        facing: StencilFacing,
    },
    /// Sets the scissor rectangle of one viewport.
    ConfigScissor {
        /// The scissor state.
        config: ScissorConfig,
        /// The viewport it applies to.
        viewport_index: u32,
    },
    /// Sets face culling.
    ConfigFaceCull {
        /// The faces to cull.
        mode: FaceCullMode,
    },
    /// Sets the depth test.
    ConfigDepthTest {
        /// The depth test state.
        config: DepthTestConfig,
    },
    /// Sets the depth range of one viewport.
    ConfigDepthRange {
        /// Depth mapped to the near plane.
        near: f64,
        /// Depth mapped to the far plane.
        far: f64,
        /// The viewport it applies to.
        viewport_index: u32,
    },
    /// Uploads client bytes into a buffer.
    BufferUpload(BufferUploadCommand),
    /// Copies bytes between buffers.
    BufferCopy(BufferCopyCommand),
    /// Reads buffer bytes back to the client (not implemented by this backend).
    BufferDownload(BufferDownloadCommand),
    /// Clears the window's framebuffer.
    ClearWindow {
        /// Which attachments to clear.
        mode: ClearMode,
        /// The values to clear to.
        values: ClearValues,
    },
    /// Clears a buffer (not implemented by this backend).
    ClearBuffer(ClearBufferCommand),
    /// Registers a fence under `name` that signals once all previously issued work completes.
    Signal {
        /// The signal's name.
        name: String,
    },
}

impl Command {
    /// A short, stable name for the command's kind, used in logs and errors.
    pub fn label(&self) -> &'static str {
        match self {
            Command::Draw(_) => "draw",
            Command::DrawIndexed(_) => "draw_indexed",
            Command::DrawIndirect(_) => "draw_indirect",
            Command::DrawIndexedIndirect(_) => "draw_indexed_indirect",
            Command::ConfigBlending { .. } => "config_blending",
            Command::ConfigStencil { .. } => "config_stencil",
            Command::ConfigScissor { .. } => "config_scissor",
            Command::ConfigFaceCull { .. } => "config_face_cull",
            Command::ConfigDepthTest { .. } => "config_depth_test",
            Command::ConfigDepthRange { .. } => "config_depth_range",
            Command::BufferUpload(_) => "buffer_upload",
            Command::BufferCopy(_) => "buffer_copy",
            Command::BufferDownload(_) => "buffer_download",
            Command::ClearWindow { .. } => "clear_window",
            Command::ClearBuffer(_) => "clear_buffer",
            Command::Signal { .. } => "signal",
        }
    }

    /// Clears every attachment to the default values.
    pub fn clear_all() -> Self {
        Command::ClearWindow {
            mode: ClearMode::All,
            values: ClearValues::default(),
        }
    }
}

impl From<DrawCommand> for Command {
    fn from(cmd: DrawCommand) -> Self {
        Command::Draw(cmd)
    }
}

impl From<DrawIndexedCommand> for Command {
    fn from(cmd: DrawIndexedCommand) -> Self {
        Command::DrawIndexed(cmd)
    }
}

impl From<DrawIndirectCommand> for Command {
    fn from(cmd: DrawIndirectCommand) -> Self {
        Command::DrawIndirect(cmd)
    }
}

impl From<DrawIndexedIndirectCommand> for Command {
    fn from(cmd: DrawIndexedIndirectCommand) -> Self {
        Command::DrawIndexedIndirect(cmd)
    }
}

impl From<BufferUploadCommand> for Command {
    fn from(cmd: BufferUploadCommand) -> Self {
        Command::BufferUpload(cmd)
    }
}

impl From<BufferCopyCommand> for Command {
    fn from(cmd: BufferCopyCommand) -> Self {
        Command::BufferCopy(cmd)
    }
}
