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

//! The render context: a registry of named GPU objects and the command buffers that use them.
//!
//! A [`RenderContext`] turns [`Descriptor`]s into live objects, stores named command
//! buffers, and replays them against a [`GraphicsDevice`]. Objects reference each
//! other by name, and names are resolved again every time they are used, so a stale
//! reference surfaces as an error rather than a dangling GPU handle.

pub mod buffer_state;
pub mod dispatch;
pub mod draw_state;
pub mod registry;
pub mod shader_state;
pub mod signals;
pub mod staging;
pub mod vertex_state;

#[cfg(test)]
pub(crate) mod mock;

use std::collections::HashMap;

pub use self::buffer_state::BufferState;
pub use self::dispatch::CommandExecutor;
pub use self::draw_state::DrawSpecificationState;
pub use self::registry::{ObjectRegistry, ObjectState};
pub use self::shader_state::{ShaderSpecificationState, ShaderState};
pub use self::signals::SignalTable;
pub use self::staging::{StagingRing, UploadChunk};
pub use self::vertex_state::{plan_vertex_layout, VertexLayoutPlan, VertexSpecificationState};

use crate::config::ContextConfig;
use crate::platform::GraphicsWindow;
use crate::renderer::api::{Command, Descriptor, ObjectIdentifier};
use crate::renderer::error::{Completion, RenderError, RenderResult, SignalStatus};
use crate::renderer::traits::GraphicsDevice;

/// Owns a device, its window, and every object and command buffer created through it.
///
/// All operations run on the thread that owns the context. Each mutating operation
/// makes the window's graphics context current first.
pub struct RenderContext<D: GraphicsDevice> {
    device: D,
    window: Box<dyn GraphicsWindow>,
    config: ContextConfig,
    objects: ObjectRegistry,
    command_buffers: HashMap<String, Vec<Command>>,
    signals: SignalTable,
}

impl<D: GraphicsDevice> RenderContext<D> {
    /// Creates an empty context over `device`, presenting through `window`.
    pub fn new(device: D, window: Box<dyn GraphicsWindow>, config: ContextConfig) -> Self {
        log::info!("Render context created on {device:?}");
        Self {
            device,
            window,
            config,
            objects: ObjectRegistry::new(),
            command_buffers: HashMap::new(),
            signals: SignalTable::new(),
        }
    }

    /// The device backing this context.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// The window this context presents through.
    pub fn window(&self) -> &dyn GraphicsWindow {
        self.window.as_ref()
    }

    /// The settings this context was created with.
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Creates one object per descriptor, in order.
    ///
    /// Stops at the first failure. Objects created before it are kept.
    pub fn create_objects<I>(&mut self, descriptors: I) -> RenderResult
    where
        I: IntoIterator<Item = Descriptor>,
    {
        self.window.make_context_current()?;
        for descriptor in descriptors {
            self.create_object(&descriptor)?;
        }
        Ok(Completion::Done)
    }

    fn create_object(&mut self, descriptor: &Descriptor) -> RenderResult<()> {
        let identifier = descriptor.identifier();
        self.objects.check_available(identifier)?;

        let device: &dyn GraphicsDevice = &self.device;
        let state = match descriptor {
            Descriptor::Buffer(desc) => ObjectState::Buffer(BufferState::create(device, desc)?),
            Descriptor::VertexSpecification(desc) => ObjectState::VertexSpecification(
                VertexSpecificationState::create(device, &self.objects, desc)?,
            ),
            Descriptor::Shader(desc) => ObjectState::Shader(ShaderState::create(device, desc)?),
            Descriptor::ShaderSpecification(desc) => ObjectState::ShaderSpecification(
                ShaderSpecificationState::create(device, &self.objects, desc)?,
            ),
            Descriptor::DrawSpecification(desc) => {
                ObjectState::DrawSpecification(DrawSpecificationState::create(&self.objects, desc)?)
            }
        };

        if let Err((err, state)) = self.objects.insert(identifier, state) {
            state.destroy(device);
            return Err(err);
        }
        log::info!(
            "Created {} '{identifier}'",
            descriptor.kind().label()
        );
        Ok(())
    }

    /// Destroys the object called `name`. Deleting an absent name does nothing.
    pub fn delete_object(&mut self, name: impl Into<ObjectIdentifier>) -> RenderResult {
        self.window.make_context_current()?;
        let identifier = name.into();
        match self.objects.remove(&identifier) {
            Some(state) => {
                let kind = state.kind();
                state.destroy(&self.device);
                log::info!("Deleted {} '{identifier}'", kind.label());
                Ok(Completion::Done)
            }
            None => Ok(Completion::NothingToDo),
        }
    }

    /// Returns `true` if an object is registered under `name`.
    pub fn contains_object(&self, name: impl Into<ObjectIdentifier>) -> bool {
        self.objects.contains(&name.into())
    }

    /// The number of live objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Stores `commands` under `name` for later execution.
    pub fn create_command_buffer(
        &mut self,
        name: impl Into<String>,
        commands: Vec<Command>,
    ) -> RenderResult {
        self.window.make_context_current()?;
        let name = name.into();
        if self.command_buffers.contains_key(&name) {
            return Err(RenderError::duplicate_name(format!(
                "A command buffer called '{name}' already exists"
            )));
        }
        log::debug!("Stored command buffer '{name}' ({} commands)", commands.len());
        self.command_buffers.insert(name, commands);
        Ok(Completion::Done)
    }

    /// Discards a stored command buffer. Deleting an absent name does nothing.
    pub fn delete_command_buffer(&mut self, name: &str) -> RenderResult {
        self.window.make_context_current()?;
        match self.command_buffers.remove(name) {
            Some(_) => Ok(Completion::Done),
            None => Ok(Completion::NothingToDo),
        }
    }

    /// Returns `true` if a command buffer is stored under `name`.
    pub fn has_command_buffer(&self, name: &str) -> bool {
        self.command_buffers.contains_key(name)
    }

    /// Runs a stored command buffer, stopping at the first failing command.
    pub fn execute_command_buffer(&mut self, name: &str) -> RenderResult {
        self.window.make_context_current()?;
        let commands = self.command_buffers.get(name).ok_or_else(|| {
            RenderError::unknown_name(format!("No command buffer called '{name}'"))
        })?;

        CommandExecutor {
            device: &self.device,
            objects: &mut self.objects,
            signals: &mut self.signals,
            config: &self.config,
        }
        .execute_all(commands)
        .map_err(|err| err.context(format_args!("command buffer '{name}'")))
    }

    /// Runs `commands` once without storing them.
    pub fn execute_temp_command_buffer(&mut self, commands: &[Command]) -> RenderResult {
        self.window.make_context_current()?;
        CommandExecutor {
            device: &self.device,
            objects: &mut self.objects,
            signals: &mut self.signals,
            config: &self.config,
        }
        .execute_all(commands)
    }

    /// Polls the named signal without blocking.
    pub fn check_signal(&self, name: &str) -> SignalStatus {
        self.wait_signal(name, 0)
    }

    /// Blocks for at most `timeout_nanos` until the named signal is reached.
    pub fn wait_signal(&self, name: &str, timeout_nanos: u64) -> SignalStatus {
        if let Err(err) = self.window.make_context_current() {
            log::error!("Cannot wait on signal '{name}': {err}");
            return SignalStatus::ContextError;
        }
        self.signals.wait(
            &self.device,
            name,
            timeout_nanos,
            self.config.wait_poll_interval_nanos,
        )
    }

    /// Unregisters a signal and deletes its fence. Deleting an absent name does nothing.
    pub fn delete_signal(&mut self, name: &str) -> RenderResult {
        self.window.make_context_current()?;
        match self.signals.remove(name) {
            Some(fence) => {
                self.device.delete_fence(fence);
                Ok(Completion::Done)
            }
            None => Ok(Completion::NothingToDo),
        }
    }

    /// Reads back host-visible buffer memory at `address` into `out`.
    pub fn read_buffer(
        &mut self,
        name: impl Into<ObjectIdentifier>,
        address: u64,
        out: &mut [u8],
    ) -> RenderResult {
        self.window.make_context_current()?;
        let identifier = name.into();
        let buffer = self
            .objects
            .buffer_mut(&identifier)
            .ok_or_else(|| RenderError::unknown_name(format!("No buffer called '{identifier}'")))?;
        buffer.read(&self.device, address, out)
    }
}

impl<D: GraphicsDevice> Drop for RenderContext<D> {
    fn drop(&mut self) {
        if let Err(err) = self.window.make_context_current() {
            log::warn!("Tearing down render context without a current context: {err}");
        }
        let device: &dyn GraphicsDevice = &self.device;
        for fence in self.signals.drain() {
            device.delete_fence(fence);
        }
        let count = self.objects.len();
        for (name, state) in self.objects.drain() {
            log::debug!("Destroying {} '{name}'", state.kind().label());
            state.destroy(device);
        }
        log::info!("Render context destroyed ({count} objects released)");
    }
}

impl<D: GraphicsDevice> std::fmt::Debug for RenderContext<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("device", &self.device)
            .field("objects", &self.objects.len())
            .field("command_buffers", &self.command_buffers.len())
            .field("signals", &self.signals.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::*;
    use crate::renderer::context::mock::MockGraphicsDevice;
    use crate::renderer::error::ErrorKind;
    use std::cell::Cell;
    use std::rc::Rc;

    struct TestWindow {
        current: Rc<Cell<bool>>,
    }

    impl GraphicsWindow for TestWindow {
        fn make_context_current(&self) -> RenderResult<()> {
            if self.current.get() {
                Ok(())
            } else {
                Err(RenderError::new(ErrorKind::BackendFailure, "context lost"))
            }
        }

        fn swap_buffers(&self) -> RenderResult<()> {
            Ok(())
        }
    }

    fn context() -> (RenderContext<MockGraphicsDevice>, Rc<Cell<bool>>) {
        let current = Rc::new(Cell::new(true));
        let window = TestWindow {
            current: current.clone(),
        };
        let context = RenderContext::new(
            MockGraphicsDevice::new(),
            Box::new(window),
            ContextConfig::default(),
        );
        (context, current)
    }

    #[test]
    fn test_duplicate_in_one_call_keeps_first() {
        let (mut context, _) = context();
        let err = context
            .create_objects([
                Descriptor::from(BufferDescriptor::new("a", 16)),
                Descriptor::from(BufferDescriptor::new("a", 32)),
            ])
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateName);
        assert_eq!(context.object_count(), 1);
        assert_eq!(context.device().live_buffers(), 1);
    }

    #[test]
    fn test_delete_object_is_idempotent() {
        let (mut context, _) = context();
        context
            .create_objects([Descriptor::from(BufferDescriptor::new("a", 16))])
            .unwrap();
        assert_eq!(context.delete_object("a"), Ok(Completion::Done));
        assert_eq!(context.delete_object("a"), Ok(Completion::NothingToDo));
        assert_eq!(context.device().live_buffers(), 0);
    }

    #[test]
    fn test_command_buffer_lifecycle() {
        let (mut context, _) = context();
        context
            .create_command_buffer("frame", vec![Command::clear_all()])
            .unwrap();
        assert_eq!(
            context
                .create_command_buffer("frame", Vec::new())
                .unwrap_err()
                .kind,
            ErrorKind::DuplicateName
        );
        assert_eq!(context.execute_command_buffer("frame"), Ok(Completion::Done));
        assert_eq!(context.delete_command_buffer("frame"), Ok(Completion::Done));
        assert_eq!(
            context.delete_command_buffer("frame"),
            Ok(Completion::NothingToDo)
        );
        assert_eq!(
            context.execute_command_buffer("frame").unwrap_err().kind,
            ErrorKind::UnknownName
        );
    }

    #[test]
    fn test_context_failure_is_propagated() {
        let (mut context, current) = context();
        current.set(false);
        assert_eq!(
            context
                .create_objects([Descriptor::from(BufferDescriptor::new("a", 16))])
                .unwrap_err()
                .kind,
            ErrorKind::BackendFailure
        );
        assert_eq!(context.object_count(), 0);
        assert_eq!(context.wait_signal("frame", 10), SignalStatus::ContextError);
    }

    #[test]
    fn test_drop_releases_everything() {
        let (mut context, _) = context();
        let device = context.device().clone();
        context
            .create_objects([Descriptor::from(BufferDescriptor::new("a", 16))])
            .unwrap();
        context
            .execute_temp_command_buffer(&[
                BufferUploadCommand::new("a", 0, vec![1u8; 4])
                    .with_strategy(UploadStrategy::SafeStreaming)
                    .into(),
                Command::Signal {
                    name: "uploaded".into(),
                },
            ])
            .unwrap();
        assert_eq!(context.check_signal("uploaded"), SignalStatus::Signalled);
        assert_eq!(device.live_buffers(), 2);

        drop(context);
        assert_eq!(device.live_buffers(), 0);
        assert_eq!(device.live_fences(), 0);
    }
}
