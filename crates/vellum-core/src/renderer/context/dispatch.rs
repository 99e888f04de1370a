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

//! Command execution: resolves the names a command references and drives the device.

use super::registry::ObjectRegistry;
use super::signals::SignalTable;
use crate::config::ContextConfig;
use crate::renderer::api::*;
use crate::renderer::error::{Completion, ErrorKind, RenderError, RenderResult};
use crate::renderer::traits::{DrawCall, GraphicsDevice};

/// Executes commands against the objects of one context.
///
/// Borrows the context's parts separately so the device can be used while the
/// registry is mutated.
pub struct CommandExecutor<'a> {
    pub(crate) device: &'a dyn GraphicsDevice,
    pub(crate) objects: &'a mut ObjectRegistry,
    pub(crate) signals: &'a mut SignalTable,
    pub(crate) config: &'a ContextConfig,
}

impl CommandExecutor<'_> {
    /// Runs `commands` in order, stopping at the first failure.
    pub fn execute_all(&mut self, commands: &[Command]) -> RenderResult {
        for (index, command) in commands.iter().enumerate() {
            self.execute(command)
                .map_err(|err| err.context(format_args!("command {index} ({})", command.label())))?;
        }
        Ok(Completion::Done)
    }

    /// Runs one command.
    pub fn execute(&mut self, command: &Command) -> RenderResult {
        if self.config.trace_commands {
            log::trace!("Executing {command:?}");
        }

        match command {
            Command::Draw(draw) => self.draw(draw),
            Command::DrawIndexed(draw) => self.draw_indexed(draw),
            Command::DrawIndirect(draw) => self.draw_indirect(draw),
            Command::DrawIndexedIndirect(draw) => self.draw_indexed_indirect(draw),
            Command::ConfigBlending {
                config,
                draw_buffer_index,
            } => {
                self.device.set_blending(config, *draw_buffer_index)?;
                Ok(Completion::Done)
            }
            Command::ConfigStencil { config, facing } => {
                self.device.set_stencil(config, *facing)?;
                Ok(Completion::Done)
            }
            Command::ConfigScissor {
                config,
                viewport_index,
            } => {
                self.device.set_scissor(config, *viewport_index)?;
                Ok(Completion::Done)
            }
            Command::ConfigFaceCull { mode } => {
                self.device.set_face_cull(*mode)?;
                Ok(Completion::Done)
            }
            Command::ConfigDepthTest { config } => {
                self.device.set_depth_test(config)?;
                Ok(Completion::Done)
            }
            Command::ConfigDepthRange {
                near,
                far,
                viewport_index,
            } => {
                self.device.set_depth_range(*near, *far, *viewport_index)?;
                Ok(Completion::Done)
            }
            Command::BufferUpload(upload) => self.upload(upload),
            Command::BufferCopy(copy) => self.copy(copy),
            Command::BufferDownload(download) => Err(RenderError::new(
                ErrorKind::Unimplemented,
                format!("Downloading from buffer '{}' is not implemented", download.buffer),
            )),
            Command::ClearWindow { mode, values } => {
                self.device.clear_window(*mode, values)?;
                Ok(Completion::Done)
            }
            Command::ClearBuffer(clear) => Err(RenderError::new(
                ErrorKind::Unimplemented,
                format!("Clearing buffer '{}' is not implemented", clear.buffer),
            )),
            Command::Signal { name } => {
                let fence = self.device.insert_fence()?;
                self.signals.register(self.device, name, fence);
                Ok(Completion::Done)
            }
        }
    }

    /// Binds everything a draw through `draw_specification` needs.
    fn bind_draw_specification(
        &self,
        draw_specification: &ObjectIdentifier,
        indexed: bool,
    ) -> RenderResult<()> {
        let draw = self
            .objects
            .draw_specification(draw_specification)
            .ok_or_else(|| {
                RenderError::unknown_source(format!(
                    "Draw specification '{draw_specification}' not found"
                ))
            })?;
        let vertex = self
            .objects
            .vertex_specification(draw.vertex_specification())
            .ok_or_else(|| {
                RenderError::unknown_source(format!(
                    "Vertex specification '{}' used by '{draw_specification}' not found",
                    draw.vertex_specification()
                ))
            })?;
        vertex.validate(self.device, &*self.objects)?;
        if indexed && !vertex.has_index_buffer() {
            return Err(RenderError::broken_source(format!(
                "Indexed draw through '{draw_specification}' but vertex specification '{}' has no index buffer",
                draw.vertex_specification()
            )));
        }

        let shader = self
            .objects
            .shader_specification(draw.shader_specification())
            .ok_or_else(|| {
                RenderError::unknown_source(format!(
                    "Shader specification '{}' used by '{draw_specification}' not found",
                    draw.shader_specification()
                ))
            })?;
        shader.bind(self.device, &*self.objects)?;

        self.device.bind_vertex_array(vertex.vertex_array())?;
        Ok(())
    }

    /// Resolves and binds an indirect parameter buffer large enough for `draw_count` records.
    fn bind_indirect_buffer(
        &self,
        buffer: &ObjectIdentifier,
        offset: u32,
        draw_count: u32,
        record_size: u64,
    ) -> RenderResult<()> {
        let state = self.objects.buffer(buffer).ok_or_else(|| {
            RenderError::unknown_source(format!("Indirect buffer '{buffer}' not found"))
        })?;
        let bytes = u64::from(draw_count)
            .checked_mul(record_size)
            .ok_or_else(|| RenderError::range_overflow(format!("{draw_count} indirect records overflow")))?;
        state.check_range(u64::from(offset), bytes)?;
        self.device.bind_indirect_buffer(state.id())?;
        Ok(())
    }

    fn draw(&mut self, draw: &DrawCommand) -> RenderResult {
        self.bind_draw_specification(&draw.draw_specification, false)?;
        self.device.draw(&DrawCall::Arrays {
            mode: draw.mode,
            first: draw.start_vertex,
            count: draw.count,
            instances: draw.instances,
            base_instance: draw.start_instance,
        })?;
        Ok(Completion::Done)
    }

    fn draw_indexed(&mut self, draw: &DrawIndexedCommand) -> RenderResult {
        self.bind_draw_specification(&draw.draw_specification, true)?;
        self.device.draw(&DrawCall::Elements {
            mode: draw.mode,
            index_type: draw.index_type,
            first_index: draw.start_index,
            count: draw.count,
            base_vertex: draw.vertex_index_offset,
            instances: draw.instances,
            base_instance: draw.start_instance,
        })?;
        Ok(Completion::Done)
    }

    fn draw_indirect(&mut self, draw: &DrawIndirectCommand) -> RenderResult {
        self.bind_draw_specification(&draw.draw_specification, false)?;
        self.bind_indirect_buffer(
            &draw.indirect_buffer,
            draw.indirect_offset,
            draw.draw_count,
            std::mem::size_of::<DrawArraysIndirectParams>() as u64,
        )?;
        self.device.draw(&DrawCall::ArraysIndirect {
            mode: draw.mode,
            offset: u64::from(draw.indirect_offset),
            draw_count: draw.draw_count,
        })?;
        Ok(Completion::Done)
    }

    fn draw_indexed_indirect(&mut self, draw: &DrawIndexedIndirectCommand) -> RenderResult {
        self.bind_draw_specification(&draw.draw_specification, true)?;
        self.bind_indirect_buffer(
            &draw.indirect_buffer,
            draw.indirect_offset,
            draw.draw_count,
            std::mem::size_of::<DrawElementsIndirectParams>() as u64,
        )?;
        self.device.draw(&DrawCall::ElementsIndirect {
            mode: draw.mode,
            index_type: draw.index_type,
            offset: u64::from(draw.indirect_offset),
            draw_count: draw.draw_count,
        })?;
        Ok(Completion::Done)
    }

    fn upload(&mut self, upload: &BufferUploadCommand) -> RenderResult {
        let growth = self.config.staging_growth_factor;
        let device = self.device;
        let buffer = self.objects.buffer_mut(&upload.buffer).ok_or_else(|| {
            RenderError::unknown_source(format!("Upload target '{}' not found", upload.buffer))
        })?;
        if upload.data.is_empty() {
            return Err(RenderError::new(
                ErrorKind::UnexpectedNull,
                format!("Upload into '{}' has no source data", upload.buffer),
            ));
        }
        let bytes = usize::try_from(upload.bytes)
            .ok()
            .filter(|&bytes| bytes <= upload.data.len())
            .ok_or_else(|| {
                RenderError::range_overflow(format!(
                    "Upload into '{}' of {} bytes from only {} source bytes",
                    upload.buffer,
                    upload.bytes,
                    upload.data.len()
                ))
            })?;
        buffer.check_range(upload.address, bytes as u64)?;
        if bytes == 0 {
            return Ok(Completion::NothingToDo);
        }

        buffer.upload(
            device,
            upload.address,
            &upload.data[..bytes],
            upload.strategy,
            growth,
        )
    }

    fn copy(&mut self, copy: &BufferCopyCommand) -> RenderResult {
        let source = self.objects.buffer(&copy.source).ok_or_else(|| {
            RenderError::unknown_source(format!("Copy source '{}' not found", copy.source))
        })?;
        let destination = self.objects.buffer(&copy.destination).ok_or_else(|| {
            RenderError::unknown_source(format!(
                "Copy destination '{}' not found",
                copy.destination
            ))
        })?;
        source.check_range(copy.source_address, copy.bytes)?;
        destination.check_range(copy.destination_address, copy.bytes)?;
        if copy.bytes == 0 {
            return Ok(Completion::NothingToDo);
        }

        self.device.copy_buffer(
            source.id(),
            destination.id(),
            copy.source_address,
            copy.destination_address,
            copy.bytes,
        )?;
        Ok(Completion::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::context::buffer_state::BufferState;
    use crate::renderer::context::mock::MockGraphicsDevice;
    use crate::renderer::context::registry::ObjectState;

    struct Harness {
        device: MockGraphicsDevice,
        objects: ObjectRegistry,
        signals: SignalTable,
        config: ContextConfig,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                device: MockGraphicsDevice::new(),
                objects: ObjectRegistry::new(),
                signals: SignalTable::new(),
                config: ContextConfig::default(),
            }
        }

        fn add_buffer(&mut self, name: &str, size: u64) -> BufferId {
            let state = BufferState::create(
                &self.device,
                &BufferDescriptor::new(name, size).with_memory(BufferMemoryStorage::SystemRam),
            )
            .unwrap();
            let id = state.id();
            self.objects
                .insert(&name.into(), ObjectState::Buffer(state))
                .unwrap();
            id
        }

        fn run(&mut self, command: Command) -> RenderResult {
            CommandExecutor {
                device: &self.device,
                objects: &mut self.objects,
                signals: &mut self.signals,
                config: &self.config,
            }
            .execute(&command)
        }
    }

    #[test]
    fn test_upload_validation_order() {
        let mut harness = Harness::new();
        let err = harness
            .run(BufferUploadCommand::new("missing", 0, vec![1u8]).into())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownSource);

        harness.add_buffer("data", 8);
        let err = harness
            .run(BufferUploadCommand::new("data", 0, Vec::<u8>::new()).into())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedNull);

        let mut upload = BufferUploadCommand::new("data", 0, vec![1u8, 2]);
        upload.bytes = 3;
        let err = harness.run(upload.into()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RangeOverflow);
    }

    #[test]
    fn test_empty_upload_still_checks_the_address() {
        let mut harness = Harness::new();
        let id = harness.add_buffer("data", 16);

        let mut outside = BufferUploadCommand::new("data", 1000, vec![1u8]);
        outside.bytes = 0;
        let err = harness.run(outside.into()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RangeOverflow);

        let mut at_end = BufferUploadCommand::new("data", 16, vec![1u8]);
        at_end.bytes = 0;
        assert_eq!(harness.run(at_end.into()), Ok(Completion::NothingToDo));
        assert_eq!(harness.device.contents(id), vec![0; 16]);
    }

    #[test]
    fn test_copy_between_buffers() {
        let mut harness = Harness::new();
        let source = harness.add_buffer("source", 8);
        let destination = harness.add_buffer("destination", 8);
        harness
            .run(BufferUploadCommand::new("source", 0, vec![1u8, 2, 3, 4]).into())
            .unwrap();

        let copy = BufferCopyCommand {
            source: "source".into(),
            destination: "destination".into(),
            source_address: 0,
            destination_address: 4,
            bytes: 4,
        };
        assert_eq!(harness.run(copy.clone().into()), Ok(Completion::Done));
        assert_eq!(harness.device.contents(destination), vec![0, 0, 0, 0, 1, 2, 3, 4]);
        assert_eq!(harness.device.contents(source)[..4], [1, 2, 3, 4]);

        let empty = BufferCopyCommand { bytes: 0, ..copy.clone() };
        assert_eq!(harness.run(empty.into()), Ok(Completion::NothingToDo));

        let overflow = BufferCopyCommand {
            destination_address: 5,
            ..copy
        };
        assert_eq!(
            harness.run(overflow.into()).unwrap_err().kind,
            ErrorKind::RangeOverflow
        );
    }

    #[test]
    fn test_unimplemented_commands() {
        let mut harness = Harness::new();
        let download = Command::BufferDownload(BufferDownloadCommand {
            buffer: "data".into(),
            address: 0,
            bytes: 4,
        });
        assert_eq!(harness.run(download).unwrap_err().kind, ErrorKind::Unimplemented);
        let clear = Command::ClearBuffer(ClearBufferCommand {
            buffer: "data".into(),
        });
        assert_eq!(harness.run(clear).unwrap_err().kind, ErrorKind::Unimplemented);
    }

    #[test]
    fn test_draw_without_specification_is_unknown_source() {
        let mut harness = Harness::new();
        let err = harness
            .run(DrawCommand::new("missing", DrawMode::Triangles, 3).into())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownSource);
        assert!(harness.device.draws().is_empty());
    }

    #[test]
    fn test_execute_all_stops_at_first_failure() {
        let mut harness = Harness::new();
        harness.add_buffer("data", 4);
        let commands = vec![
            Command::Signal {
                name: "before".into(),
            },
            BufferUploadCommand::new("data", 2, vec![1u8; 4]).into(),
            Command::Signal {
                name: "after".into(),
            },
        ];
        let err = CommandExecutor {
            device: &harness.device,
            objects: &mut harness.objects,
            signals: &mut harness.signals,
            config: &harness.config,
        }
        .execute_all(&commands)
        .unwrap_err();

        assert_eq!(err.kind, ErrorKind::RangeOverflow);
        assert!(err.message.starts_with("command 1 (buffer_upload)"));
        assert!(harness.signals.contains("before"));
        assert!(!harness.signals.contains("after"));
    }
}
