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

//! Shared fixtures for the render context integration tests.

#![allow(dead_code)]

use vellum_core::renderer::api::*;
use vellum_core::renderer::ShaderCompiler;
use vellum_core::{ContextConfig, RenderContext};
use vellum_infra::{
    init_logging, DeviceCall, FenceMode, GlslCompiler, HeadlessDevice, HeadlessWindow,
    LoggingConfig,
};

pub const VERTEX_SHADER: &str = r#"
#version 450 core
layout(std140, binding = 1) uniform Camera {
    mat4 view_projection;
    vec3 eye;
    float exposure;
};
layout(location = 0) in vec3 position;
void main() {
    gl_Position = view_projection * vec4(position, 1.0);
}
"#;

pub const FRAGMENT_SHADER: &str = r#"
#version 450 core
layout(location = 0) out vec4 color;
void main() {
    color = vec4(1.0);
}
"#;

/// A context over a headless device and window, plus handles to both.
pub struct Fixture {
    pub context: RenderContext<HeadlessDevice>,
    pub device: HeadlessDevice,
    pub window: HeadlessWindow,
}

pub fn fixture(mode: FenceMode) -> Fixture {
    init_logging(&LoggingConfig::default());
    let device = HeadlessDevice::new(mode);
    let window = HeadlessWindow::new();
    let context = RenderContext::new(
        device.clone(),
        Box::new(window.clone()),
        ContextConfig::default(),
    );
    Fixture {
        context,
        device,
        window,
    }
}

pub fn shader_descriptor(name: &str) -> ShaderDescriptor {
    let compiler = GlslCompiler::new();
    let stages = vec![
        compiler
            .compile_stage(ShaderStageKind::Vertex, VERTEX_SHADER)
            .unwrap(),
        compiler
            .compile_stage(ShaderStageKind::Fragment, FRAGMENT_SHADER)
            .unwrap(),
    ];
    ShaderDescriptor::new(name, stages)
}

/// Descriptors for a float3 "vertices" buffer drawn through "draw" with the "shader"
/// program. The camera block is bound to "camera" when `bind_camera` is set.
pub fn triangle_scene(bind_camera: bool) -> Vec<Descriptor> {
    let bindings = if bind_camera {
        vec![ShaderBufferBinding::new("camera", "Camera")]
    } else {
        Vec::new()
    };
    vec![
        BufferDescriptor::new("vertices", 1024)
            .with_memory(BufferMemoryStorage::SystemRam)
            .into(),
        BufferDescriptor::new("camera", 80).into(),
        VertexSpecificationDescriptor::new(
            "vs",
            vec![VertexElement::new("vertices", VertexElementType::Float3F32)],
        )
        .into(),
        shader_descriptor("shader").into(),
        ShaderSpecificationDescriptor::new("ss", "shader", bindings).into(),
        DrawSpecificationDescriptor::new("draw", "vs", "ss").into(),
    ]
}

pub fn triangle_bytes() -> Vec<u8> {
    let vertices: [[f32; 3]; 3] = [[0.0, 0.5, 0.0], [-0.5, -0.5, 0.0], [0.5, -0.5, 0.0]];
    bytemuck::cast_slice(&vertices).to_vec()
}

/// The buffers the device allocated, in creation order.
pub fn created_buffers(device: &HeadlessDevice) -> Vec<(BufferId, u64, BufferUsage)> {
    device
        .journal()
        .into_iter()
        .filter_map(|call| match call {
            DeviceCall::CreateBuffer {
                buffer,
                size,
                usage,
            } => Some((buffer, size, usage)),
            _ => None,
        })
        .collect()
}

/// The first device allocation of `size` bytes with `usage`.
pub fn buffer_with(device: &HeadlessDevice, size: u64, usage: BufferUsage) -> BufferId {
    created_buffers(device)
        .into_iter()
        .find(|(_, s, u)| *s == size && *u == usage)
        .map(|(id, _, _)| id)
        .unwrap()
}

pub fn upload(buffer: &str, address: u64, data: &[u8], strategy: UploadStrategy) -> Command {
    Command::BufferUpload(BufferUploadCommand::new(buffer, address, data.to_vec()).with_strategy(strategy))
}
