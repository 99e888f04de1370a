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

mod common;

use common::{buffer_with, fixture, shader_descriptor, triangle_bytes, triangle_scene, upload};
use vellum_core::renderer::api::*;
use vellum_core::renderer::{Completion, DrawCall, ErrorKind};
use vellum_infra::{DeviceCall, FenceMode};

#[test]
fn test_vertices_scenario_end_to_end() {
    // --- 1. ARRANGE ---
    let mut fx = fixture(FenceMode::Immediate);
    let created = fx.context.create_objects(triangle_scene(false));
    let data = triangle_bytes();
    assert_eq!(data.len(), 36);

    // --- 2. ACT ---
    let executed = fx.context.execute_temp_command_buffer(&[
        Command::BufferUpload(BufferUploadCommand::new("vertices", 0, data.clone())),
        Command::Draw(DrawCommand::new("draw", DrawMode::Triangles, 3)),
    ]);

    // --- 3. ASSERT ---
    assert_eq!(created, Ok(Completion::Done));
    assert_eq!(executed, Ok(Completion::Done));

    let mut readback = vec![0u8; 36];
    fx.context.read_buffer("vertices", 0, &mut readback).unwrap();
    assert_eq!(readback, data, "uploaded vertices must read back unchanged");

    let journal = fx.device.journal();
    assert!(journal.contains(&DeviceCall::Draw(DrawCall::Arrays {
        mode: DrawMode::Triangles,
        first: 0,
        count: 3,
        instances: 1,
        base_instance: 0,
    })));
}

#[test]
fn test_vertex_layout_is_wired_once() {
    let mut fx = fixture(FenceMode::Immediate);
    fx.context.create_objects(triangle_scene(false)).unwrap();
    let vertices = buffer_with(&fx.device, 1024, BufferUsage::HostVisible);
    let vertex_array = fx
        .device
        .journal()
        .into_iter()
        .find_map(|call| match call {
            DeviceCall::CreateVertexArray(id) => Some(id),
            _ => None,
        })
        .unwrap();

    let (attributes, bindings, index_buffer) = fx.device.vertex_array_layout(vertex_array).unwrap();

    assert_eq!(attributes.len(), 1);
    assert_eq!(attributes[0].location, 0);
    assert_eq!(attributes[0].element_type, VertexElementType::Float3F32);
    assert_eq!(attributes[0].relative_offset, 0);
    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings[0].buffer, vertices);
    assert_eq!(bindings[0].stride, 12);
    assert_eq!(index_buffer, None);
}

#[test]
fn test_unknown_vertex_source_leaks_nothing() {
    let mut fx = fixture(FenceMode::Immediate);
    fx.context
        .create_objects([Descriptor::from(BufferDescriptor::new("positions", 64))])
        .unwrap();

    let err = fx
        .context
        .create_objects([Descriptor::from(VertexSpecificationDescriptor::new(
            "vs",
            vec![
                VertexElement::new("positions", VertexElementType::Float3F32),
                VertexElement::new("normals", VertexElementType::Float3F32),
            ],
        ))])
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::UnknownSource);
    assert!(!fx.context.contains_object("vs"));
    assert_eq!(fx.device.live_vertex_arrays(), 0, "no vertex array may leak");
}

#[test]
fn test_unknown_index_source_leaks_nothing() {
    let mut fx = fixture(FenceMode::Immediate);
    fx.context
        .create_objects([Descriptor::from(BufferDescriptor::new("positions", 64))])
        .unwrap();

    let err = fx
        .context
        .create_objects([Descriptor::from(
            VertexSpecificationDescriptor::new(
                "vs",
                vec![VertexElement::new("positions", VertexElementType::Float2F32)],
            )
            .with_index_buffer("indices"),
        )])
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::UnknownSource);
    assert_eq!(fx.device.live_vertex_arrays(), 0);
}

#[test]
fn test_indexed_draw_needs_an_index_buffer() {
    let mut fx = fixture(FenceMode::Immediate);
    fx.context.create_objects(triangle_scene(false)).unwrap();
    fx.device.clear_journal();

    let err = fx
        .context
        .execute_temp_command_buffer(&[Command::DrawIndexed(DrawIndexedCommand::new(
            "draw",
            DrawMode::Triangles,
            3,
        ))])
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::BrokenSource);
    assert!(
        !fx.device
            .journal()
            .iter()
            .any(|call| matches!(call, DeviceCall::Draw(_))),
        "no draw may reach the device"
    );
}

#[test]
fn test_indexed_draw_with_index_buffer() {
    let mut fx = fixture(FenceMode::Immediate);
    fx.context
        .create_objects([
            Descriptor::from(BufferDescriptor::new("positions", 48)),
            Descriptor::from(BufferDescriptor::new("indices", 12)),
            Descriptor::from(
                VertexSpecificationDescriptor::new(
                    "vs",
                    vec![VertexElement::new("positions", VertexElementType::Float3F32)],
                )
                .with_index_buffer("indices"),
            ),
            Descriptor::from(shader_descriptor("shader")),
            Descriptor::from(ShaderSpecificationDescriptor::new("ss", "shader", Vec::new())),
            Descriptor::from(DrawSpecificationDescriptor::new("draw", "vs", "ss")),
        ])
        .unwrap();
    let indices: [u32; 3] = [0, 1, 2];

    let mut draw = DrawIndexedCommand::new("draw", DrawMode::Triangles, 3);
    draw.instances = 4;
    fx.context
        .execute_temp_command_buffer(&[
            upload("indices", 0, bytemuck::cast_slice(&indices), UploadStrategy::SafeOneTime),
            Command::DrawIndexed(draw),
        ])
        .unwrap();

    assert!(fx.device.journal().contains(&DeviceCall::Draw(DrawCall::Elements {
        mode: DrawMode::Triangles,
        index_type: IndexType::U32,
        first_index: 0,
        count: 3,
        base_vertex: 0,
        instances: 4,
        base_instance: 0,
    })));
}

#[test]
fn test_deleted_dependency_breaks_the_draw_lazily() {
    let mut fx = fixture(FenceMode::Immediate);
    fx.context.create_objects(triangle_scene(false)).unwrap();
    let draw = [Command::Draw(DrawCommand::new("draw", DrawMode::Triangles, 3))];
    fx.context.execute_temp_command_buffer(&draw).unwrap();

    // Deleting the buffer does not touch the specifications that name it.
    fx.context.delete_object("vertices").unwrap();
    assert!(fx.context.contains_object("vs"));
    let deleted = fx.context.execute_temp_command_buffer(&draw).unwrap_err();

    // A new buffer under the old name is not the one the vertex array was wired to.
    fx.context
        .create_objects([Descriptor::from(BufferDescriptor::new("vertices", 1024))])
        .unwrap();
    let replaced = fx.context.execute_temp_command_buffer(&draw).unwrap_err();

    assert_eq!(deleted.kind, ErrorKind::BrokenSource);
    assert_eq!(replaced.kind, ErrorKind::BrokenSource);
}

#[test]
fn test_deleted_specification_is_an_unknown_source() {
    let mut fx = fixture(FenceMode::Immediate);
    fx.context.create_objects(triangle_scene(false)).unwrap();
    fx.context.delete_object("ss").unwrap();

    let err = fx
        .context
        .execute_temp_command_buffer(&[Command::Draw(DrawCommand::new(
            "draw",
            DrawMode::Triangles,
            3,
        ))])
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::UnknownSource);
}

#[test]
fn test_shader_binding_resolves_the_declared_slot() {
    let mut fx = fixture(FenceMode::Immediate);
    fx.context.create_objects(triangle_scene(true)).unwrap();
    let camera = buffer_with(&fx.device, 80, BufferUsage::DeviceLocal);

    fx.context
        .execute_temp_command_buffer(&[Command::Draw(DrawCommand::new(
            "draw",
            DrawMode::Triangles,
            3,
        ))])
        .unwrap();

    assert!(fx.device.journal().contains(&DeviceCall::BindBufferRange {
        kind: BindingKind::Uniform,
        slot: 1,
        buffer: camera,
        offset: 0,
        size: 80,
    }));
}

#[test]
fn test_shader_binding_to_an_undeclared_block() {
    let mut fx = fixture(FenceMode::Immediate);
    let mut scene = triangle_scene(false);
    scene[4] = ShaderSpecificationDescriptor::new(
        "ss",
        "shader",
        vec![ShaderBufferBinding::new("camera", "Lights")],
    )
    .into();
    // Bindings are resolved at bind time, so creation succeeds.
    fx.context.create_objects(scene).unwrap();

    let err = fx
        .context
        .execute_temp_command_buffer(&[Command::Draw(DrawCommand::new(
            "draw",
            DrawMode::Triangles,
            3,
        ))])
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::UnknownName);
    assert!(err.message.contains("Lights"), "{}", err.message);
}

#[test]
fn test_indirect_draw_checks_the_parameter_range() {
    let mut fx = fixture(FenceMode::Immediate);
    let mut scene = triangle_scene(false);
    scene.push(BufferDescriptor::new("params", 32).into());
    fx.context.create_objects(scene).unwrap();
    let records = [
        DrawArraysIndirectParams {
            vertex_count: 3,
            instance_count: 1,
            first_vertex: 0,
            base_instance: 0,
        },
        DrawArraysIndirectParams {
            vertex_count: 3,
            instance_count: 2,
            first_vertex: 3,
            base_instance: 1,
        },
    ];
    let indirect = |draw_count| {
        Command::DrawIndirect(DrawIndirectCommand {
            draw_specification: "draw".into(),
            indirect_buffer: "params".into(),
            mode: DrawMode::Triangles,
            draw_count,
            indirect_offset: 0,
        })
    };

    fx.context
        .execute_temp_command_buffer(&[
            upload("params", 0, bytemuck::cast_slice(&records), UploadStrategy::SafeOneTime),
            indirect(2),
        ])
        .unwrap();
    let overflow = fx
        .context
        .execute_temp_command_buffer(&[indirect(3)])
        .unwrap_err();

    assert_eq!(overflow.kind, ErrorKind::RangeOverflow);
    assert!(fx.device.journal().contains(&DeviceCall::Draw(DrawCall::ArraysIndirect {
        mode: DrawMode::Triangles,
        offset: 0,
        draw_count: 2,
    })));
}

#[test]
fn test_command_buffer_replay_is_deterministic() {
    // --- 1. ARRANGE ---
    let mut fx = fixture(FenceMode::Immediate);
    let mut scene = triangle_scene(true);
    scene.push(BufferDescriptor::new("backup", 1024).into());
    fx.context.create_objects(scene).unwrap();
    fx.context
        .create_command_buffer(
            "frame",
            vec![
                Command::clear_all(),
                Command::ConfigBlending {
                    config: BlendingConfig::default(),
                    draw_buffer_index: 0,
                },
                Command::ConfigDepthTest {
                    config: DepthTestConfig::default(),
                },
                Command::ConfigFaceCull {
                    mode: FaceCullMode::Back,
                },
                Command::BufferCopy(BufferCopyCommand {
                    source: "vertices".into(),
                    destination: "backup".into(),
                    source_address: 0,
                    destination_address: 0,
                    bytes: 36,
                }),
                Command::Draw(DrawCommand::new("draw", DrawMode::Triangles, 3)),
            ],
        )
        .unwrap();

    // --- 2. ACT ---
    fx.device.clear_journal();
    fx.context.execute_command_buffer("frame").unwrap();
    let first = fx.device.journal();
    fx.device.clear_journal();
    fx.context.execute_command_buffer("frame").unwrap();
    let second = fx.device.journal();

    // --- 3. ASSERT ---
    assert!(!first.is_empty());
    assert_eq!(first, second, "replaying a stored buffer must issue identical calls");
    assert!(
        !first.iter().any(DeviceCall::is_lifecycle),
        "replay must not create or destroy device objects"
    );
}
