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

//! A software [`GraphicsDevice`] that emulates GPU memory, queued copies and fences.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use vellum_core::renderer::api::*;
use vellum_core::renderer::{DeviceError, DrawCall, GraphicsDevice};

use super::journal::DeviceCall;

/// When the emulated GPU executes queued work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FenceMode {
    /// Copies run when issued and fences signal as soon as they are inserted.
    #[default]
    Immediate,
    /// Copies and fences queue up until [`HeadlessDevice::complete_next`] or
    /// [`HeadlessDevice::complete_all`] advances the GPU.
    Deferred,
}

#[derive(Debug)]
struct HeadlessBuffer {
    data: Vec<u8>,
    usage: BufferUsage,
    mapped: bool,
    /// `false` once destroyed; the storage lingers while queued copies still use it.
    alive: bool,
}

#[derive(Debug, Default, Clone)]
struct HeadlessVertexArray {
    attributes: Vec<VertexAttribute>,
    bindings: Vec<VertexBufferBinding>,
    index_buffer: Option<BufferId>,
}

#[derive(Debug, Clone, Copy)]
enum PendingOp {
    Copy {
        source: BufferId,
        destination: BufferId,
        source_offset: usize,
        destination_offset: usize,
        size: usize,
    },
    Fence(FenceId),
}

#[derive(Debug, Default)]
struct HeadlessState {
    buffers: HashMap<BufferId, HeadlessBuffer>,
    fences: HashMap<FenceId, bool>,
    vertex_arrays: HashMap<VertexArrayId, HeadlessVertexArray>,
    programs: HashMap<ProgramId, Vec<ShaderStageKind>>,
    pending: VecDeque<PendingOp>,
    bound_vertex_array: Option<VertexArrayId>,
    current_program: Option<ProgramId>,
    indirect_buffer: Option<BufferId>,
    journal: Vec<DeviceCall>,
}

impl HeadlessState {
    fn buffer(&self, id: BufferId) -> Result<&HeadlessBuffer, DeviceError> {
        self.buffers
            .get(&id)
            .filter(|buffer| buffer.alive)
            .ok_or(DeviceError::NotFound {
                object: "buffer",
                id: id.0,
            })
    }

    fn buffer_mut(&mut self, id: BufferId) -> Result<&mut HeadlessBuffer, DeviceError> {
        self.buffers
            .get_mut(&id)
            .filter(|buffer| buffer.alive)
            .ok_or(DeviceError::NotFound {
                object: "buffer",
                id: id.0,
            })
    }

    fn run(&mut self, op: PendingOp) {
        match op {
            PendingOp::Copy {
                source,
                destination,
                source_offset,
                destination_offset,
                size,
            } => {
                // Orphaned buffers are still in the map; the range was checked at issue time.
                let bytes = self
                    .buffers
                    .get(&source)
                    .map(|buffer| buffer.data[source_offset..source_offset + size].to_vec());
                if let (Some(bytes), Some(target)) = (bytes, self.buffers.get_mut(&destination)) {
                    target.data[destination_offset..destination_offset + size]
                        .copy_from_slice(&bytes);
                }
            }
            PendingOp::Fence(fence) => {
                if let Some(signaled) = self.fences.get_mut(&fence) {
                    *signaled = true;
                }
            }
        }
    }

    /// Drops orphaned buffers no queued copy refers to anymore.
    fn collect_orphans(&mut self) {
        let pending = &self.pending;
        self.buffers.retain(|id, buffer| {
            buffer.alive
                || pending.iter().any(|op| {
                    matches!(op, PendingOp::Copy { source, destination, .. } if source == id || destination == id)
                })
        });
    }
}

fn check_range(offset: u64, size: u64, capacity: usize) -> Result<(usize, usize), DeviceError> {
    let out_of_bounds = DeviceError::OutOfBounds {
        offset,
        size,
        capacity: capacity as u64,
    };
    let start = usize::try_from(offset).map_err(|_| out_of_bounds.clone())?;
    let len = usize::try_from(size).map_err(|_| out_of_bounds.clone())?;
    match start.checked_add(len) {
        Some(end) if end <= capacity => Ok((start, len)),
        _ => Err(out_of_bounds),
    }
}

#[derive(Debug, Default)]
struct HeadlessShared {
    state: Mutex<HeadlessState>,
    fence_signaled: Condvar,
}

/// An in-memory graphics device for tests, CI and tooling.
///
/// Buffers are plain byte vectors, vertex arrays and programs are bookkeeping, and
/// every call is appended to a journal. With [`FenceMode::Deferred`] the emulated GPU
/// only runs copies when told to, which makes fence-dependent behavior observable.
///
/// Clones share the same device, so a test can keep a handle to inspect it after
/// moving the device into a render context, or advance the GPU from another thread.
#[derive(Debug, Clone)]
pub struct HeadlessDevice {
    shared: Arc<HeadlessShared>,
    next_id: Arc<AtomicUsize>,
    fence_mode: FenceMode,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new(FenceMode::Immediate)
    }
}

impl HeadlessDevice {
    /// Creates a device executing GPU work as described by `fence_mode`.
    pub fn new(fence_mode: FenceMode) -> Self {
        log::debug!("Headless device created ({fence_mode:?} fences)");
        Self {
            shared: Arc::new(HeadlessShared::default()),
            next_id: Arc::new(AtomicUsize::new(1)),
            fence_mode,
        }
    }

    /// How this device executes GPU work.
    pub fn fence_mode(&self) -> FenceMode {
        self.fence_mode
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Runs queued copies up to and including the next fence, which then signals.
    ///
    /// Returns the signalled fence, or `None` if no fence was queued (any queued
    /// copies still run).
    pub fn complete_next(&self) -> Option<FenceId> {
        let mut state = self.lock();
        let mut signaled = None;
        while let Some(op) = state.pending.pop_front() {
            state.run(op);
            if let PendingOp::Fence(fence) = op {
                signaled = Some(fence);
                break;
            }
        }
        state.collect_orphans();
        drop(state);
        self.shared.fence_signaled.notify_all();
        signaled
    }

    /// Runs every queued operation. Returns the number of fences signalled.
    pub fn complete_all(&self) -> usize {
        let mut count = 0;
        while self.complete_next().is_some() {
            count += 1;
        }
        count
    }

    /// The number of queued copies and fences.
    pub fn pending_operations(&self) -> usize {
        self.lock().pending.len()
    }

    /// A copy of a live buffer's bytes.
    pub fn buffer_contents(&self, id: BufferId) -> Option<Vec<u8>> {
        self.lock().buffer(id).ok().map(|buffer| buffer.data.clone())
    }

    /// The number of live buffers.
    pub fn live_buffers(&self) -> usize {
        self.lock().buffers.values().filter(|b| b.alive).count()
    }

    /// The number of live vertex arrays.
    pub fn live_vertex_arrays(&self) -> usize {
        self.lock().vertex_arrays.len()
    }

    /// The number of live programs.
    pub fn live_programs(&self) -> usize {
        self.lock().programs.len()
    }

    /// The number of fences not yet deleted.
    pub fn live_fences(&self) -> usize {
        self.lock().fences.len()
    }

    /// The attribute formats, slot bindings and index buffer of a vertex array.
    pub fn vertex_array_layout(
        &self,
        id: VertexArrayId,
    ) -> Option<(Vec<VertexAttribute>, Vec<VertexBufferBinding>, Option<BufferId>)> {
        self.lock().vertex_arrays.get(&id).map(|vao| {
            (
                vao.attributes.clone(),
                vao.bindings.clone(),
                vao.index_buffer,
            )
        })
    }

    /// Every call received since creation or the last [`clear_journal`](Self::clear_journal).
    pub fn journal(&self) -> Vec<DeviceCall> {
        self.lock().journal.clone()
    }

    /// Forgets the recorded calls.
    pub fn clear_journal(&self) {
        self.lock().journal.clear();
    }

    fn record(&self, call: DeviceCall) {
        self.lock().journal.push(call);
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_buffer(&self, size: u64, usage: BufferUsage) -> Result<BufferId, DeviceError> {
        if size == 0 {
            return Err(DeviceError::BackendError(
                "cannot allocate a zero-sized buffer".into(),
            ));
        }
        let len = usize::try_from(size)
            .map_err(|_| DeviceError::BackendError(format!("{size} bytes do not fit in memory")))?;
        let id = BufferId(self.next_id());
        let mut state = self.lock();
        state.buffers.insert(
            id,
            HeadlessBuffer {
                data: vec![0; len],
                usage,
                mapped: false,
                alive: true,
            },
        );
        state.journal.push(DeviceCall::CreateBuffer {
            buffer: id,
            size,
            usage,
        });
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), DeviceError> {
        let mut state = self.lock();
        state.buffer_mut(id)?.alive = false;
        state.collect_orphans();
        state.journal.push(DeviceCall::DestroyBuffer(id));
        Ok(())
    }

    fn is_buffer(&self, id: BufferId) -> bool {
        self.lock().buffer(id).is_ok()
    }

    fn map_buffer(&self, id: BufferId) -> Result<(), DeviceError> {
        let mut state = self.lock();
        let buffer = state.buffer_mut(id)?;
        if buffer.usage == BufferUsage::DeviceLocal {
            return Err(DeviceError::MappingFailed(format!(
                "buffer {} has device-local storage",
                id.0
            )));
        }
        buffer.mapped = true;
        state.journal.push(DeviceCall::MapBuffer(id));
        Ok(())
    }

    fn unmap_buffer(&self, id: BufferId) -> Result<(), DeviceError> {
        let mut state = self.lock();
        state.buffer_mut(id)?.mapped = false;
        state.journal.push(DeviceCall::UnmapBuffer(id));
        Ok(())
    }

    fn write_mapped(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), DeviceError> {
        let mut state = self.lock();
        let buffer = state.buffer_mut(id)?;
        if !buffer.mapped {
            return Err(DeviceError::MappingFailed(format!("buffer {} is not mapped", id.0)));
        }
        let (start, len) = check_range(offset, data.len() as u64, buffer.data.len())?;
        buffer.data[start..start + len].copy_from_slice(data);
        state.journal.push(DeviceCall::WriteMapped {
            buffer: id,
            offset,
            size: data.len() as u64,
        });
        Ok(())
    }

    fn read_mapped(&self, id: BufferId, offset: u64, out: &mut [u8]) -> Result<(), DeviceError> {
        let mut state = self.lock();
        let buffer = state.buffer(id)?;
        if !buffer.mapped || buffer.usage != BufferUsage::HostVisible {
            return Err(DeviceError::MappingFailed(format!(
                "buffer {} is not mapped for reading",
                id.0
            )));
        }
        let (start, len) = check_range(offset, out.len() as u64, buffer.data.len())?;
        out.copy_from_slice(&buffer.data[start..start + len]);
        state.journal.push(DeviceCall::ReadMapped {
            buffer: id,
            offset,
            size: out.len() as u64,
        });
        Ok(())
    }

    fn copy_buffer(
        &self,
        source: BufferId,
        destination: BufferId,
        source_offset: u64,
        destination_offset: u64,
        size: u64,
    ) -> Result<(), DeviceError> {
        let mut state = self.lock();
        let (source_start, len) = check_range(source_offset, size, state.buffer(source)?.data.len())?;
        let (destination_start, _) =
            check_range(destination_offset, size, state.buffer(destination)?.data.len())?;

        let op = PendingOp::Copy {
            source,
            destination,
            source_offset: source_start,
            destination_offset: destination_start,
            size: len,
        };
        match self.fence_mode {
            FenceMode::Immediate => state.run(op),
            FenceMode::Deferred => state.pending.push_back(op),
        }
        state.journal.push(DeviceCall::CopyBuffer {
            source,
            destination,
            source_offset,
            destination_offset,
            size,
        });
        Ok(())
    }

    fn insert_fence(&self) -> Result<FenceId, DeviceError> {
        let fence = FenceId(self.next_id());
        let mut state = self.lock();
        match self.fence_mode {
            FenceMode::Immediate => {
                state.fences.insert(fence, true);
            }
            FenceMode::Deferred => {
                state.fences.insert(fence, false);
                state.pending.push_back(PendingOp::Fence(fence));
            }
        }
        state.journal.push(DeviceCall::InsertFence(fence));
        Ok(fence)
    }

    fn wait_fence(&self, fence: FenceId, timeout_nanos: u64) -> FenceWait {
        let state = self.lock();
        match state.fences.get(&fence) {
            None => return FenceWait::WaitFailed,
            Some(true) => return FenceWait::AlreadySignaled,
            Some(false) if timeout_nanos == 0 => return FenceWait::TimeoutExpired,
            Some(false) => {}
        }

        let (state, _) = self
            .shared
            .fence_signaled
            .wait_timeout_while(state, Duration::from_nanos(timeout_nanos), |state| {
                state.fences.get(&fence) == Some(&false)
            })
            .unwrap_or_else(PoisonError::into_inner);
        match state.fences.get(&fence) {
            Some(true) => FenceWait::ConditionSatisfied,
            Some(false) => FenceWait::TimeoutExpired,
            None => FenceWait::WaitFailed,
        }
    }

    fn delete_fence(&self, fence: FenceId) {
        let mut state = self.lock();
        // Like a deleted GL sync object, a queued fence still drains; it just cannot be waited on.
        state.fences.remove(&fence);
        state.journal.push(DeviceCall::DeleteFence(fence));
    }

    fn create_vertex_array(&self) -> Result<VertexArrayId, DeviceError> {
        let id = VertexArrayId(self.next_id());
        let mut state = self.lock();
        state.vertex_arrays.insert(id, HeadlessVertexArray::default());
        state.journal.push(DeviceCall::CreateVertexArray(id));
        Ok(id)
    }

    fn destroy_vertex_array(&self, id: VertexArrayId) -> Result<(), DeviceError> {
        let mut state = self.lock();
        state
            .vertex_arrays
            .remove(&id)
            .ok_or(DeviceError::NotFound {
                object: "vertex array",
                id: id.0,
            })?;
        if state.bound_vertex_array == Some(id) {
            state.bound_vertex_array = None;
        }
        state.journal.push(DeviceCall::DestroyVertexArray(id));
        Ok(())
    }

    fn is_vertex_array(&self, id: VertexArrayId) -> bool {
        self.lock().vertex_arrays.contains_key(&id)
    }

    fn configure_vertex_attribute(
        &self,
        vertex_array: VertexArrayId,
        attribute: &VertexAttribute,
    ) -> Result<(), DeviceError> {
        let mut state = self.lock();
        let vao = state
            .vertex_arrays
            .get_mut(&vertex_array)
            .ok_or(DeviceError::NotFound {
                object: "vertex array",
                id: vertex_array.0,
            })?;
        vao.attributes.retain(|a| a.location != attribute.location);
        vao.attributes.push(*attribute);
        state.journal.push(DeviceCall::ConfigureVertexAttribute {
            vertex_array,
            attribute: *attribute,
        });
        Ok(())
    }

    fn attach_vertex_buffer(
        &self,
        vertex_array: VertexArrayId,
        binding: &VertexBufferBinding,
    ) -> Result<(), DeviceError> {
        let mut state = self.lock();
        state.buffer(binding.buffer)?;
        let vao = state
            .vertex_arrays
            .get_mut(&vertex_array)
            .ok_or(DeviceError::NotFound {
                object: "vertex array",
                id: vertex_array.0,
            })?;
        vao.bindings.retain(|b| b.slot != binding.slot);
        vao.bindings.push(*binding);
        state.journal.push(DeviceCall::AttachVertexBuffer {
            vertex_array,
            binding: *binding,
        });
        Ok(())
    }

    fn attach_index_buffer(
        &self,
        vertex_array: VertexArrayId,
        buffer: BufferId,
    ) -> Result<(), DeviceError> {
        let mut state = self.lock();
        state.buffer(buffer)?;
        let vao = state
            .vertex_arrays
            .get_mut(&vertex_array)
            .ok_or(DeviceError::NotFound {
                object: "vertex array",
                id: vertex_array.0,
            })?;
        vao.index_buffer = Some(buffer);
        state.journal.push(DeviceCall::AttachIndexBuffer {
            vertex_array,
            buffer,
        });
        Ok(())
    }

    fn bind_vertex_array(&self, id: VertexArrayId) -> Result<(), DeviceError> {
        let mut state = self.lock();
        if !state.vertex_arrays.contains_key(&id) {
            return Err(DeviceError::NotFound {
                object: "vertex array",
                id: id.0,
            });
        }
        state.bound_vertex_array = Some(id);
        state.journal.push(DeviceCall::BindVertexArray(id));
        Ok(())
    }

    fn create_program(&self, stages: &[ShaderStage]) -> Result<ProgramId, DeviceError> {
        if let Some(stage) = stages.iter().find(|stage| stage.program.source.trim().is_empty()) {
            return Err(DeviceError::Compilation {
                label: format!("{:?} stage", stage.kind),
                details: "empty source".into(),
            });
        }
        let id = ProgramId(self.next_id());
        let kinds: Vec<ShaderStageKind> = stages.iter().map(|stage| stage.kind).collect();
        let mut state = self.lock();
        state.programs.insert(id, kinds.clone());
        state.journal.push(DeviceCall::CreateProgram {
            program: id,
            stages: kinds,
        });
        Ok(id)
    }

    fn destroy_program(&self, id: ProgramId) -> Result<(), DeviceError> {
        let mut state = self.lock();
        state.programs.remove(&id).ok_or(DeviceError::NotFound {
            object: "program",
            id: id.0,
        })?;
        if state.current_program == Some(id) {
            state.current_program = None;
        }
        state.journal.push(DeviceCall::DestroyProgram(id));
        Ok(())
    }

    fn is_program(&self, id: ProgramId) -> bool {
        self.lock().programs.contains_key(&id)
    }

    fn use_program(&self, id: ProgramId) -> Result<(), DeviceError> {
        let mut state = self.lock();
        if !state.programs.contains_key(&id) {
            return Err(DeviceError::NotFound {
                object: "program",
                id: id.0,
            });
        }
        state.current_program = Some(id);
        state.journal.push(DeviceCall::UseProgram(id));
        Ok(())
    }

    fn bind_buffer_range(
        &self,
        kind: BindingKind,
        slot: u32,
        buffer: BufferId,
        offset: u64,
        size: u64,
    ) -> Result<(), DeviceError> {
        let mut state = self.lock();
        check_range(offset, size, state.buffer(buffer)?.data.len())?;
        state.journal.push(DeviceCall::BindBufferRange {
            kind,
            slot,
            buffer,
            offset,
            size,
        });
        Ok(())
    }

    fn bind_indirect_buffer(&self, buffer: BufferId) -> Result<(), DeviceError> {
        let mut state = self.lock();
        state.buffer(buffer)?;
        state.indirect_buffer = Some(buffer);
        state.journal.push(DeviceCall::BindIndirectBuffer(buffer));
        Ok(())
    }

    fn draw(&self, call: &DrawCall) -> Result<(), DeviceError> {
        let mut state = self.lock();
        let vao = state
            .bound_vertex_array
            .ok_or_else(|| DeviceError::InvalidHandle("no vertex array bound".into()))?;
        if state.current_program.is_none() {
            return Err(DeviceError::InvalidHandle("no program in use".into()));
        }
        match call {
            DrawCall::Elements { .. } | DrawCall::ElementsIndirect { .. } => {
                let indexed = state
                    .vertex_arrays
                    .get(&vao)
                    .is_some_and(|vao| vao.index_buffer.is_some());
                if !indexed {
                    return Err(DeviceError::InvalidHandle(format!(
                        "vertex array {} has no index buffer",
                        vao.0
                    )));
                }
            }
            DrawCall::Arrays { .. } | DrawCall::ArraysIndirect { .. } => {}
        }
        if let DrawCall::ArraysIndirect { .. } | DrawCall::ElementsIndirect { .. } = call {
            match state.indirect_buffer {
                Some(buffer) if state.buffer(buffer).is_ok() => {}
                _ => return Err(DeviceError::InvalidHandle("no indirect buffer bound".into())),
            }
        }
        state.journal.push(DeviceCall::Draw(*call));
        Ok(())
    }

    fn set_blending(&self, config: &BlendingConfig, draw_buffer: u32) -> Result<(), DeviceError> {
        self.record(DeviceCall::SetBlending {
            config: *config,
            draw_buffer,
        });
        Ok(())
    }

    fn set_stencil(&self, config: &StencilConfig, facing: StencilFacing) -> Result<(), DeviceError> {
        self.record(DeviceCall::SetStencil {
            config: *config,
            facing,
        });
        Ok(())
    }

    fn set_scissor(&self, config: &ScissorConfig, viewport: u32) -> Result<(), DeviceError> {
        self.record(DeviceCall::SetScissor {
            config: *config,
            viewport,
        });
        Ok(())
    }

    fn set_face_cull(&self, mode: FaceCullMode) -> Result<(), DeviceError> {
        self.record(DeviceCall::SetFaceCull(mode));
        Ok(())
    }

    fn set_depth_test(&self, config: &DepthTestConfig) -> Result<(), DeviceError> {
        self.record(DeviceCall::SetDepthTest(*config));
        Ok(())
    }

    fn set_depth_range(&self, near: f64, far: f64, viewport: u32) -> Result<(), DeviceError> {
        self.record(DeviceCall::SetDepthRange {
            near,
            far,
            viewport,
        });
        Ok(())
    }

    fn clear_window(&self, mode: ClearMode, values: &ClearValues) -> Result<(), DeviceError> {
        self.record(DeviceCall::ClearWindow {
            mode,
            values: *values,
        });
        Ok(())
    }
}
