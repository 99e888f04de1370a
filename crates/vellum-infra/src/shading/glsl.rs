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

//! A GLSL compiler front end with buffer-block reflection.
//!
//! The OpenGL driver compiles GLSL itself, so "compiling" here means parsing the stage
//! with naga's GLSL front end, which checks it and lays out every block, and then
//! reflecting the uniform and storage blocks the render context resolves binding
//! names against.

use naga::front::glsl::{ErrorKind, Frontend, Options, ParseErrors};
use vellum_core::renderer::api::{ShaderProgram, ShaderStageKind};
use vellum_core::renderer::{ShaderCompiler, ShaderError};

use super::reflection::reflect_blocks;

/// Maps a stage onto the stages naga's GLSL front end can parse.
fn naga_stage(kind: ShaderStageKind) -> Option<naga::ShaderStage> {
    match kind {
        ShaderStageKind::Vertex => Some(naga::ShaderStage::Vertex),
        ShaderStageKind::Fragment => Some(naga::ShaderStage::Fragment),
        ShaderStageKind::Compute => Some(naga::ShaderStage::Compute),
        ShaderStageKind::TessellationControl
        | ShaderStageKind::TessellationEvaluation
        | ShaderStageKind::Geometry => None,
    }
}

fn is_missing_entry_point(errors: &ParseErrors) -> bool {
    errors.errors.iter().any(|error| {
        matches!(&error.kind, ErrorKind::SemanticError(message) if message.contains("entry point"))
    })
}

fn describe(errors: &ParseErrors) -> String {
    errors
        .errors
        .iter()
        .map(|error| error.kind.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A [`ShaderCompiler`] for GLSL 4.50 sources.
///
/// The source is passed through to the driver unchanged. Uniform blocks default to
/// std140 and storage blocks to std430 unless the layout qualifier says otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlslCompiler;

impl GlslCompiler {
    /// Creates a new compiler.
    pub fn new() -> Self {
        Self
    }
}

impl ShaderCompiler for GlslCompiler {
    fn compile(&self, kind: ShaderStageKind, source: &str) -> Result<ShaderProgram, ShaderError> {
        let label = format!("{kind:?}");
        if source.trim().is_empty() {
            return Err(ShaderError::CompilationError {
                label,
                details: "source is empty".to_string(),
            });
        }
        let stage = naga_stage(kind).ok_or_else(|| ShaderError::CompilationError {
            label: label.clone(),
            details: "the GLSL front end only parses vertex, fragment and compute stages"
                .to_string(),
        })?;

        let module = Frontend::default()
            .parse(&Options::from(stage), source)
            .map_err(|errors| {
                if is_missing_entry_point(&errors) {
                    ShaderError::MissingStage(label.clone())
                } else {
                    ShaderError::CompilationError {
                        label: label.clone(),
                        details: describe(&errors),
                    }
                }
            })?;

        let reflection = reflect_blocks(&module)?;
        log::debug!(
            "Compiled {kind:?} stage with {} binding block(s)",
            reflection.blocks.len()
        );
        Ok(ShaderProgram {
            source: source.to_string(),
            binding_blocks: reflection.blocks,
            buffer_layouts: reflection.layouts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_core::renderer::api::{BindingBlock, BindingKind, PadRegion, ShaderBufferLayout};

    const VERTEX: &str = r#"
        #version 450 core
        // camera data
        layout(std140, binding = 1) uniform Camera {
            mat4 view_projection;
            vec3 eye; /* w unused */
            float exposure;
        } camera;

        layout(binding = 3) readonly buffer Instances {
            highp vec4 offsets[16];
        };

        layout(location = 0) in vec3 position;

        void main() {
            gl_Position = camera.view_projection * vec4(position + offsets[0].xyz, 1.0);
        }
    "#;

    fn fragment(body: &str) -> String {
        format!("#version 450 core\n{body}\nvoid main() {{}}\n")
    }

    #[test]
    fn test_reflects_binding_blocks() {
        let program = GlslCompiler::new()
            .compile(ShaderStageKind::Vertex, VERTEX)
            .unwrap();
        assert_eq!(program.source, VERTEX);
        assert_eq!(
            program.binding_blocks,
            vec![
                BindingBlock {
                    name: "Camera".to_string(),
                    kind: BindingKind::Uniform,
                    slot: 1
                },
                BindingBlock {
                    name: "Instances".to_string(),
                    kind: BindingKind::Storage,
                    slot: 3
                },
            ]
        );
    }

    #[test]
    fn test_reflects_std140_layout() {
        let compiler = GlslCompiler::new();
        let program = compiler.compile(ShaderStageKind::Vertex, VERTEX).unwrap();

        // mat4 at 0, vec3 at 64, float packs into the vec3's last lane at 76.
        let camera = compiler.buffer_layout(&program, "Camera").unwrap();
        assert_eq!(camera.packed_size, 64 + 12 + 4);
        assert_eq!(camera.padded_size, 80);
        assert!(camera.pads.is_empty());

        let instances = compiler.buffer_layout(&program, "Instances").unwrap();
        assert_eq!(*instances, ShaderBufferLayout::packed(256));
        assert!(compiler.buffer_layout(&program, "position").is_none());
    }

    #[test]
    fn test_std140_scalar_array_stride() {
        let source = fragment("layout(binding = 0) uniform Weights { float w[3]; uint count; };");
        let program = GlslCompiler.compile(ShaderStageKind::Fragment, &source).unwrap();
        let layout = program.buffer_layout("Weights").unwrap();
        assert_eq!(layout.packed_size, 16);
        assert_eq!(layout.padded_size, 64);
        assert_eq!(
            layout.pads,
            vec![
                PadRegion { offset: 4, size: 12 },
                PadRegion { offset: 20, size: 12 },
                PadRegion { offset: 36, size: 12 },
                PadRegion { offset: 52, size: 12 },
            ]
        );
    }

    #[test]
    fn test_runtime_sized_storage_array() {
        let source = fragment(
            "layout(std430, binding = 2) buffer Particles { uint count; vec4 positions[]; };",
        );
        let program = GlslCompiler.compile(ShaderStageKind::Fragment, &source).unwrap();
        assert_eq!(
            program.binding_blocks,
            vec![BindingBlock {
                name: "Particles".to_string(),
                kind: BindingKind::Storage,
                slot: 2
            }]
        );

        // The layout covers the fixed prefix, up to where the array starts.
        let layout = program.buffer_layout("Particles").unwrap();
        assert_eq!(layout.packed_size, 4);
        assert_eq!(layout.padded_size, 16);
        assert_eq!(layout.pads, vec![PadRegion { offset: 4, size: 12 }]);
    }

    #[test]
    fn test_only_runtime_sized_array() {
        let source =
            fragment("layout(std430, binding = 2) buffer Particles { vec4 positions[]; };");
        let program = GlslCompiler.compile(ShaderStageKind::Fragment, &source).unwrap();
        assert_eq!(
            program.buffer_layout("Particles"),
            Some(&ShaderBufferLayout::packed(0))
        );
    }

    #[test]
    fn test_struct_array_members() {
        let source = fragment(
            "struct Light { vec3 position; float intensity; };\n\
             layout(binding = 4) uniform Lights { Light lights[4]; int count; };",
        );
        let program = GlslCompiler.compile(ShaderStageKind::Fragment, &source).unwrap();
        let layout = program.buffer_layout("Lights").unwrap();

        // Each Light fills 16 bytes exactly; count sits at 64 and the block rounds to 80.
        assert_eq!(layout.packed_size, 4 * 16 + 4);
        assert_eq!(layout.padded_size, 80);
        assert_eq!(layout.pads, vec![PadRegion { offset: 68, size: 12 }]);
    }

    #[test]
    fn test_matrix_columns() {
        let source = fragment("layout(binding = 0) uniform M { mat3x4 m; };");
        let program = GlslCompiler.compile(ShaderStageKind::Fragment, &source).unwrap();
        assert_eq!(
            program.buffer_layout("M"),
            Some(&ShaderBufferLayout::packed(48))
        );

        // std140 pads two-row columns out to 16 bytes; std430 keeps them tight.
        let source = fragment(
            "layout(binding = 0) uniform Basis { mat2 basis; };\n\
             layout(binding = 1) buffer Tight { mat2 tight; };",
        );
        let program = GlslCompiler.compile(ShaderStageKind::Fragment, &source).unwrap();
        let basis = program.buffer_layout("Basis").unwrap();
        assert_eq!(basis.packed_size, 16);
        assert_eq!(basis.padded_size, 32);
        assert_eq!(
            basis.pads,
            vec![
                PadRegion { offset: 8, size: 8 },
                PadRegion { offset: 24, size: 8 },
            ]
        );
        assert_eq!(
            program.buffer_layout("Tight"),
            Some(&ShaderBufferLayout::packed(16))
        );
    }

    #[test]
    fn test_missing_entry_point() {
        let source = "#version 450 core\nfloat helper() { return 1.0; }\n";
        let result = GlslCompiler.compile(ShaderStageKind::Fragment, source);
        assert_eq!(result, Err(ShaderError::MissingStage("Fragment".to_string())));
    }

    #[test]
    fn test_empty_source() {
        assert!(matches!(
            GlslCompiler.compile(ShaderStageKind::Vertex, "  \n"),
            Err(ShaderError::CompilationError { .. })
        ));
    }

    #[test]
    fn test_syntax_error() {
        let source = fragment("layout(binding = 0) uniform Broken { vec4 a };");
        match GlslCompiler.compile(ShaderStageKind::Fragment, &source) {
            Err(ShaderError::CompilationError { label, details }) => {
                assert_eq!(label, "Fragment");
                assert!(!details.is_empty());
            }
            other => panic!("expected a compilation error, got {other:?}"),
        }
    }

    #[test]
    fn test_unparsed_stage() {
        let source = "#version 450 core\nvoid main() {}\n";
        assert!(matches!(
            GlslCompiler.compile(ShaderStageKind::Geometry, source),
            Err(ShaderError::CompilationError { .. })
        ));
    }

    #[test]
    fn test_duplicate_block() {
        let source = fragment(
            "layout(binding = 0) uniform A { float x; };\n\
             layout(binding = 1) uniform A { float y; };",
        );
        assert!(GlslCompiler
            .compile(ShaderStageKind::Vertex, &source)
            .is_err());
    }
}
