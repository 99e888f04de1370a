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

//! A minimal in-memory device for the context's unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::renderer::api::*;
use crate::renderer::error::DeviceError;
use crate::renderer::traits::{DrawCall, GraphicsDevice};

#[derive(Debug, Default)]
struct MockBuffer {
    data: Vec<u8>,
    usage: Option<BufferUsage>,
    mapped: bool,
}

#[derive(Debug, Default)]
struct MockState {
    buffers: HashMap<usize, MockBuffer>,
    fences: HashSet<usize>,
    vertex_arrays: HashSet<usize>,
    programs: HashSet<usize>,
    draws: Vec<DrawCall>,
    fail_fences: bool,
}

/// Applies copies immediately and signals every fence at once.
///
/// Clones share the same state, so a test can keep a handle after giving the
/// device to a context.
#[derive(Debug, Clone)]
pub(crate) struct MockGraphicsDevice {
    next_id: Arc<AtomicUsize>,
    state: Arc<Mutex<MockState>>,
}

impl MockGraphicsDevice {
    pub(crate) fn new() -> Self {
        Self {
            next_id: Arc::new(AtomicUsize::new(1)),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    fn next(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn contents(&self, id: BufferId) -> Vec<u8> {
        self.state.lock().unwrap().buffers[&id.0].data.clone()
    }

    pub(crate) fn live_buffers(&self) -> usize {
        self.state.lock().unwrap().buffers.len()
    }

    pub(crate) fn live_vertex_arrays(&self) -> usize {
        self.state.lock().unwrap().vertex_arrays.len()
    }

    /// Makes every following `insert_fence` fail until switched back.
    pub(crate) fn set_fail_fences(&self, fail: bool) {
        self.state.lock().unwrap().fail_fences = fail;
    }

    pub(crate) fn live_fences(&self) -> usize {
        self.state.lock().unwrap().fences.len()
    }

    pub(crate) fn draws(&self) -> Vec<DrawCall> {
        self.state.lock().unwrap().draws.clone()
    }
}

fn not_found(object: &'static str, id: usize) -> DeviceError {
    DeviceError::NotFound { object, id }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_buffer(&self, size: u64, usage: BufferUsage) -> Result<BufferId, DeviceError> {
        let id = self.next();
        self.state.lock().unwrap().buffers.insert(
            id,
            MockBuffer {
                data: vec![0; size as usize],
                usage: Some(usage),
                mapped: false,
            },
        );
        Ok(BufferId(id))
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), DeviceError> {
        self.state.lock().unwrap().buffers.remove(&id.0);
        Ok(())
    }

    fn is_buffer(&self, id: BufferId) -> bool {
        self.state.lock().unwrap().buffers.contains_key(&id.0)
    }

    fn map_buffer(&self, id: BufferId) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        let buffer = state.buffers.get_mut(&id.0).ok_or(not_found("buffer", id.0))?;
        if buffer.usage == Some(BufferUsage::DeviceLocal) {
            return Err(DeviceError::MappingFailed("device-local storage".into()));
        }
        buffer.mapped = true;
        Ok(())
    }

    fn unmap_buffer(&self, id: BufferId) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        let buffer = state.buffers.get_mut(&id.0).ok_or(not_found("buffer", id.0))?;
        buffer.mapped = false;
        Ok(())
    }

    fn write_mapped(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        let buffer = state.buffers.get_mut(&id.0).ok_or(not_found("buffer", id.0))?;
        assert!(buffer.mapped, "write into an unmapped buffer");
        let start = offset as usize;
        buffer.data[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn read_mapped(&self, id: BufferId, offset: u64, out: &mut [u8]) -> Result<(), DeviceError> {
        let state = self.state.lock().unwrap();
        let buffer = state.buffers.get(&id.0).ok_or(not_found("buffer", id.0))?;
        let start = offset as usize;
        out.copy_from_slice(&buffer.data[start..start + out.len()]);
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
        let mut state = self.state.lock().unwrap();
        let (src, dst, len) = (
            source_offset as usize,
            destination_offset as usize,
            size as usize,
        );
        let bytes = state.buffers[&source.0].data[src..src + len].to_vec();
        state
            .buffers
            .get_mut(&destination.0)
            .ok_or(not_found("buffer", destination.0))?
            .data[dst..dst + len]
            .copy_from_slice(&bytes);
        Ok(())
    }

    fn insert_fence(&self) -> Result<FenceId, DeviceError> {
        let id = self.next();
        let mut state = self.state.lock().unwrap();
        if state.fail_fences {
            return Err(DeviceError::BackendError("fence creation failed".to_string()));
        }
        state.fences.insert(id);
        Ok(FenceId(id))
    }

    fn wait_fence(&self, fence: FenceId, _timeout_nanos: u64) -> FenceWait {
        if self.state.lock().unwrap().fences.contains(&fence.0) {
            FenceWait::AlreadySignaled
        } else {
            FenceWait::WaitFailed
        }
    }

    fn delete_fence(&self, fence: FenceId) {
        self.state.lock().unwrap().fences.remove(&fence.0);
    }

    fn create_vertex_array(&self) -> Result<VertexArrayId, DeviceError> {
        let id = self.next();
        self.state.lock().unwrap().vertex_arrays.insert(id);
        Ok(VertexArrayId(id))
    }

    fn destroy_vertex_array(&self, id: VertexArrayId) -> Result<(), DeviceError> {
        self.state.lock().unwrap().vertex_arrays.remove(&id.0);
        Ok(())
    }

    fn is_vertex_array(&self, id: VertexArrayId) -> bool {
        self.state.lock().unwrap().vertex_arrays.contains(&id.0)
    }

    fn configure_vertex_attribute(
        &self,
        _vertex_array: VertexArrayId,
        _attribute: &VertexAttribute,
    ) -> Result<(), DeviceError> {
        Ok(())
    }

    fn attach_vertex_buffer(
        &self,
        _vertex_array: VertexArrayId,
        _binding: &VertexBufferBinding,
    ) -> Result<(), DeviceError> {
        Ok(())
    }

    fn attach_index_buffer(
        &self,
        _vertex_array: VertexArrayId,
        _buffer: BufferId,
    ) -> Result<(), DeviceError> {
        Ok(())
    }

    fn bind_vertex_array(&self, _id: VertexArrayId) -> Result<(), DeviceError> {
        Ok(())
    }

    fn create_program(&self, _stages: &[ShaderStage]) -> Result<ProgramId, DeviceError> {
        let id = self.next();
        self.state.lock().unwrap().programs.insert(id);
        Ok(ProgramId(id))
    }

    fn destroy_program(&self, id: ProgramId) -> Result<(), DeviceError> {
        self.state.lock().unwrap().programs.remove(&id.0);
        Ok(())
    }

    fn is_program(&self, id: ProgramId) -> bool {
        self.state.lock().unwrap().programs.contains(&id.0)
    }

    fn use_program(&self, _id: ProgramId) -> Result<(), DeviceError> {
        Ok(())
    }

    fn bind_buffer_range(
        &self,
        _kind: BindingKind,
        _slot: u32,
        _buffer: BufferId,
        _offset: u64,
        _size: u64,
    ) -> Result<(), DeviceError> {
        Ok(())
    }

    fn bind_indirect_buffer(&self, _buffer: BufferId) -> Result<(), DeviceError> {
        Ok(())
    }

    fn draw(&self, call: &DrawCall) -> Result<(), DeviceError> {
        self.state.lock().unwrap().draws.push(*call);
        Ok(())
    }

    fn set_blending(&self, _config: &BlendingConfig, _draw_buffer: u32) -> Result<(), DeviceError> {
        Ok(())
    }

    fn set_stencil(&self, _config: &StencilConfig, _facing: StencilFacing) -> Result<(), DeviceError> {
        Ok(())
    }

    fn set_scissor(&self, _config: &ScissorConfig, _viewport: u32) -> Result<(), DeviceError> {
        Ok(())
    }

    fn set_face_cull(&self, _mode: FaceCullMode) -> Result<(), DeviceError> {
        Ok(())
    }

    fn set_depth_test(&self, _config: &DepthTestConfig) -> Result<(), DeviceError> {
        Ok(())
    }

    fn set_depth_range(&self, _near: f64, _far: f64, _viewport: u32) -> Result<(), DeviceError> {
        Ok(())
    }

    fn clear_window(&self, _mode: ClearMode, _values: &ClearValues) -> Result<(), DeviceError> {
        Ok(())
    }
}
