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

//! Buffer-block reflection over a parsed naga module.
//!
//! The GLSL front end has already laid every block out (std140 for uniform blocks,
//! std430 for storage blocks, unless qualified otherwise), so member offsets, array
//! strides and struct spans are read straight from the IR. What is left is walking
//! each block down to its scalars to find which padded bytes hold client data.

use std::collections::HashSet;

use naga::{AddressSpace, ArraySize, Handle, Module, Type, TypeInner, VectorSize};
use vellum_core::renderer::api::{BindingBlock, BindingKind, PadRegion, ShaderBufferLayout};
use vellum_core::renderer::ShaderError;

/// The buffer blocks a stage declares, with the memory layout of each.
#[derive(Debug, Default)]
pub(crate) struct BlockReflection {
    pub(crate) blocks: Vec<BindingBlock>,
    pub(crate) layouts: Vec<(String, ShaderBufferLayout)>,
}

/// Collects every uniform and storage block of `module`, in declaration order.
pub(crate) fn reflect_blocks(module: &Module) -> Result<BlockReflection, ShaderError> {
    let mut reflection = BlockReflection::default();
    let mut seen = HashSet::new();

    for (_, global) in module.global_variables.iter() {
        let kind = match global.space {
            AddressSpace::Uniform => BindingKind::Uniform,
            AddressSpace::Storage { .. } => BindingKind::Storage,
            _ => continue,
        };
        let name = block_name(module, global.ty, global.name.as_deref())
            .ok_or_else(|| ShaderError::Reflection("a buffer block has no name".to_string()))?;
        if !seen.insert(name.clone()) {
            return Err(ShaderError::Reflection(format!(
                "block '{name}' is declared more than once"
            )));
        }

        let slot = match &global.binding {
            Some(binding) => binding.binding,
            None => {
                log::warn!("Block '{name}' has no binding qualifier, assuming binding 0");
                0
            }
        };
        let layout = block_layout(module, global.ty, kind)
            .map_err(|detail| ShaderError::Reflection(format!("block '{name}' {detail}")))?;

        log::trace!(
            "Reflected {kind:?} block '{name}' at binding {slot} ({} packed / {} padded bytes)",
            layout.packed_size,
            layout.padded_size
        );
        reflection.blocks.push(BindingBlock {
            name: name.clone(),
            kind,
            slot,
        });
        reflection.layouts.push((name, layout));
    }

    Ok(reflection)
}

/// The block name is the name of its struct type; the instance name is only a fallback.
fn block_name(module: &Module, mut ty: Handle<Type>, instance: Option<&str>) -> Option<String> {
    loop {
        let current = &module.types[ty];
        match current.inner {
            TypeInner::Array { base, .. } if current.name.is_none() => ty = base,
            _ => {
                return current
                    .name
                    .clone()
                    .or_else(|| instance.map(str::to_owned))
            }
        }
    }
}

/// Byte ranges of client data in padded space, in increasing order.
#[derive(Debug, Default)]
struct DataRuns {
    runs: Vec<(u64, u64)>,
    /// Where a trailing runtime-sized array starts, if the block has one.
    unsized_at: Option<u64>,
}

impl DataRuns {
    fn push(&mut self, offset: u64, size: u64) -> Result<(), String> {
        match self.runs.last_mut() {
            Some((start, len)) if *start + *len == offset => *len += size,
            Some((start, len)) if *start + *len > offset => {
                return Err(format!("has overlapping members at offset {offset}"));
            }
            _ => self.runs.push((offset, size)),
        }
        Ok(())
    }
}

fn collect_runs(
    module: &Module,
    ty: Handle<Type>,
    base: u64,
    kind: BindingKind,
    runs: &mut DataRuns,
) -> Result<(), String> {
    match &module.types[ty].inner {
        TypeInner::Scalar(scalar) | TypeInner::Atomic(scalar) => {
            runs.push(base, u64::from(scalar.width))
        }
        TypeInner::Vector { size, scalar } => {
            runs.push(base, *size as u64 * u64::from(scalar.width))
        }
        TypeInner::Matrix {
            columns,
            rows,
            scalar,
        } => {
            let width = u64::from(scalar.width);
            // Columns align like vectors of `rows` components; std140 rounds them up to 16.
            let natural = match rows {
                VectorSize::Bi => 2 * width,
                _ => 4 * width,
            };
            let stride = match kind {
                BindingKind::Uniform => natural.max(16),
                BindingKind::Storage => natural,
            };
            for column in 0..*columns as u64 {
                runs.push(base + column * stride, *rows as u64 * width)?;
            }
            Ok(())
        }
        TypeInner::Array { base: element, size, stride } => match size {
            ArraySize::Constant(count) => {
                for index in 0..u64::from(count.get()) {
                    let offset = base + index * u64::from(*stride);
                    collect_runs(module, *element, offset, kind, runs)?;
                }
                Ok(())
            }
            ArraySize::Dynamic => {
                runs.unsized_at.get_or_insert(base);
                Ok(())
            }
            #[allow(unreachable_patterns)]
            _ => Err("has an array sized by a pipeline override".to_string()),
        },
        TypeInner::Struct { members, .. } => {
            for member in members {
                collect_runs(module, member.ty, base + u64::from(member.offset), kind, runs)?;
            }
            Ok(())
        }
        other => Err(format!("has a member that cannot live in a buffer: {other:?}")),
    }
}

/// Computes the packed and padded forms of the block whose type is `ty`.
///
/// A trailing runtime-sized array is left out: the layout describes the fixed-size
/// part, and array elements follow it at the array stride.
fn block_layout(
    module: &Module,
    ty: Handle<Type>,
    kind: BindingKind,
) -> Result<ShaderBufferLayout, String> {
    let mut runs = DataRuns::default();
    collect_runs(module, ty, 0, kind, &mut runs)?;

    let data_end = runs.runs.last().map_or(0, |(start, len)| start + len);
    let span = match &module.types[ty].inner {
        TypeInner::Struct { span, .. } => u64::from(*span),
        _ => data_end,
    };
    let padded_size = runs.unsized_at.unwrap_or(span);

    let mut pads = Vec::new();
    let mut cursor = 0;
    let mut packed_size = 0;
    for &(offset, size) in &runs.runs {
        if offset > cursor {
            pads.push(PadRegion {
                offset: cursor,
                size: offset - cursor,
            });
        }
        cursor = offset + size;
        packed_size += size;
    }
    if padded_size > cursor {
        pads.push(PadRegion {
            offset: cursor,
            size: padded_size - cursor,
        });
    }

    Ok(ShaderBufferLayout {
        packed_size,
        padded_size,
        pads,
    })
}
