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

//! Shader programs, their reflected binding blocks, and buffer memory layouts.
//!
//! A [`ShaderProgram`] is what the shading collaborator hands to the core: backend
//! source ready for the device to compile, the binding blocks it declares, and the
//! padded memory layout of each of those blocks.

use super::buffer::BindingKind;
use super::identifier::ObjectIdentifier;
use crate::renderer::error::{RenderError, RenderResult};

/// The pipeline stage a shader program runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStageKind {
    /// Per-vertex processing.
    Vertex,
    /// Tessellation control (hull) stage.
    TessellationControl,
    /// Tessellation evaluation (domain) stage.
    TessellationEvaluation,
    /// Per-primitive geometry stage.
    Geometry,
    /// Per-fragment processing.
    Fragment,
    /// Standalone compute stage.
    Compute,
}

/// A buffer attachment point declared by a shader.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingBlock {
    /// The block's name as declared in the shader.
    pub name: String,
    /// Whether the block is a uniform or a storage block.
    pub kind: BindingKind,
    /// The binding point index.
    pub slot: u32,
}

/// A run of padding bytes in a padded buffer layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PadRegion {
    /// Offset of the first pad byte, in padded space.
    pub offset: u64,
    /// Number of pad bytes.
    pub size: u64,
}

/// The packed vs padded memory layout of one shader buffer block.
///
/// Client code fills the tightly packed form; the GPU expects the padded form
/// (std140/std430 alignment). `pads` lists the padded-space holes, sorted by offset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShaderBufferLayout {
    /// Size of the block with no padding at all.
    pub packed_size: u64,
    /// Size of the block as the GPU lays it out.
    pub padded_size: u64,
    /// Pad regions in padded space.
    pub pads: Vec<PadRegion>,
}

impl ShaderBufferLayout {
    /// A layout with no padding.
    pub fn packed(size: u64) -> Self {
        Self {
            packed_size: size,
            padded_size: size,
            pads: Vec::new(),
        }
    }

    /// Total number of pad bytes.
    pub fn pad_bytes(&self) -> u64 {
        self.pads.iter().map(|pad| pad.size).sum()
    }
}

/// Expands tightly packed `packed` data into the padded layout described by `layout`.
///
/// Pad bytes are zeroed. The returned blob is ready to be uploaded to a buffer bound
/// to the block.
///
/// ## Errors
/// * `RangeOverflow` - If `packed` is not exactly `layout.packed_size` bytes long.
/// * `BrokenSource` - If the pads overlap, are unsorted, or do not account for the
///   difference between the packed and padded sizes.
pub fn layout_buffer_memory(layout: &ShaderBufferLayout, packed: &[u8]) -> RenderResult<Vec<u8>> {
    if packed.len() as u64 != layout.packed_size {
        return Err(RenderError::range_overflow(format!(
            "Packed data is {} bytes but the layout expects {}",
            packed.len(),
            layout.packed_size
        )));
    }

    let padded_size = usize::try_from(layout.padded_size)
        .map_err(|_| RenderError::range_overflow("Padded layout does not fit in memory"))?;
    let mut padded = vec![0u8; padded_size];
    let mut read = 0usize;
    let mut write = 0usize;

    for pad in &layout.pads {
        let pad_offset = pad.offset as usize;
        if pad_offset < write {
            return Err(RenderError::broken_source(format!(
                "Pad at offset {} overlaps the previous region",
                pad.offset
            )));
        }
        let run = pad_offset - write;
        if read + run > packed.len() || pad_offset + pad.size as usize > padded_size {
            return Err(RenderError::broken_source(format!(
                "Pad at offset {} runs past the end of the layout",
                pad.offset
            )));
        }
        padded[write..pad_offset].copy_from_slice(&packed[read..read + run]);
        read += run;
        write = pad_offset + pad.size as usize;
    }

    let tail = padded_size - write;
    if tail != packed.len() - read {
        return Err(RenderError::broken_source(format!(
            "Layout accounts for {} packed bytes but {} remain",
            read + tail,
            packed.len()
        )));
    }
    padded[write..].copy_from_slice(&packed[read..]);
    Ok(padded)
}

/// A compiled shader stage as produced by the shading collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShaderProgram {
    /// Backend source code for the stage.
    pub source: String,
    /// The buffer blocks the stage declares.
    pub binding_blocks: Vec<BindingBlock>,
    /// The memory layout of each declared block, by block name.
    pub buffer_layouts: Vec<(String, ShaderBufferLayout)>,
}

impl ShaderProgram {
    /// A program with no reflection data.
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    /// Adds a reflected binding block.
    pub fn with_binding_block(mut self, name: impl Into<String>, kind: BindingKind, slot: u32) -> Self {
        self.binding_blocks.push(BindingBlock {
            name: name.into(),
            kind,
            slot,
        });
        self
    }

    /// Returns the memory layout of the named block, if it was reflected.
    pub fn buffer_layout(&self, block: &str) -> Option<&ShaderBufferLayout> {
        self.buffer_layouts
            .iter()
            .find(|(name, _)| name == block)
            .map(|(_, layout)| layout)
    }
}

/// One stage of a shader descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderStage {
    /// Which pipeline stage the program belongs to.
    pub kind: ShaderStageKind,
    /// The compiled program.
    pub program: ShaderProgram,
}

/// A descriptor used to create a named, linked shader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDescriptor {
    /// The shader's name.
    pub identifier: ObjectIdentifier,
    /// The stages to link together.
    pub stages: Vec<ShaderStage>,
}

impl ShaderDescriptor {
    /// Describes a shader linked from `stages`.
    pub fn new(name: impl Into<ObjectIdentifier>, stages: Vec<ShaderStage>) -> Self {
        Self {
            identifier: name.into(),
            stages,
        }
    }
}

/// Attaches a buffer to one of a shader's binding blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderBufferBinding {
    /// The name of the buffer to attach.
    pub buffer: ObjectIdentifier,
    /// The name of the binding block in the shader.
    pub binding: String,
}

impl ShaderBufferBinding {
    /// Binds the buffer called `buffer` to the block called `binding`.
    pub fn new(buffer: impl Into<ObjectIdentifier>, binding: impl Into<String>) -> Self {
        Self {
            buffer: buffer.into(),
            binding: binding.into(),
        }
    }
}

/// A descriptor used to create a shader specification: a shader plus its buffer bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSpecificationDescriptor {
    /// The shader specification's name.
    pub identifier: ObjectIdentifier,
    /// The shader to use.
    pub shader: ObjectIdentifier,
    /// The buffers to attach each time the specification is bound.
    pub buffer_bindings: Vec<ShaderBufferBinding>,
}

impl ShaderSpecificationDescriptor {
    /// Describes a shader specification using `shader`.
    pub fn new(
        name: impl Into<ObjectIdentifier>,
        shader: impl Into<ObjectIdentifier>,
        buffer_bindings: Vec<ShaderBufferBinding>,
    ) -> Self {
        Self {
            identifier: name.into(),
            shader: shader.into(),
            buffer_bindings,
        }
    }
}

/// An opaque handle to a linked GPU program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub usize);
