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

//! Defines the `ShaderCompiler` trait implemented by the shading collaborator.

use crate::renderer::api::{ShaderBufferLayout, ShaderProgram, ShaderStage, ShaderStageKind};
use crate::renderer::error::ShaderError;

/// Turns shader source into programs the device can link, with their reflection data.
pub trait ShaderCompiler {
    /// Compiles `source` for one pipeline stage.
    /// ## Returns
    /// The backend program together with its reflected binding blocks and buffer layouts.
    /// ## Errors
    /// * `ShaderError` - If the source cannot be compiled or reflected.
    fn compile(&self, kind: ShaderStageKind, source: &str) -> Result<ShaderProgram, ShaderError>;

    /// Compiles `source` into a stage ready to be put in a shader descriptor.
    fn compile_stage(&self, kind: ShaderStageKind, source: &str) -> Result<ShaderStage, ShaderError> {
        Ok(ShaderStage {
            kind,
            program: self.compile(kind, source)?,
        })
    }

    /// Looks up the memory layout of a buffer block declared by `program`.
    fn buffer_layout<'a>(
        &self,
        program: &'a ShaderProgram,
        block: &str,
    ) -> Option<&'a ShaderBufferLayout> {
        program.buffer_layout(block)
    }
}
