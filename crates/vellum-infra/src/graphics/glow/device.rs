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

//! A `GraphicsDevice` backed by an OpenGL 4.5 context through `glow`.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use glow::HasContext;
use vellum_core::renderer::api::*;
use vellum_core::renderer::{DeviceError, DrawCall, GraphicsDevice};

use super::conversions::{map_access, IntoGl};

/// Size in bytes of one non-indexed indirect draw record.
const ARRAYS_INDIRECT_STRIDE: u64 = 16;
/// Size in bytes of one indexed indirect draw record.
const ELEMENTS_INDIRECT_STRIDE: u64 = 20;

#[derive(Debug)]
struct GlBufferEntry {
    raw: glow::Buffer,
    size: u64,
    usage: BufferUsage,
    // Base pointer of the live mapping, if any.
    mapping: Option<*mut u8>,
}

#[derive(Debug, Default)]
struct GlowState {
    buffers: HashMap<BufferId, GlBufferEntry>,
    fences: HashMap<FenceId, glow::Fence>,
    vertex_arrays: HashMap<VertexArrayId, glow::VertexArray>,
    programs: HashMap<ProgramId, glow::Program>,
    bound_vertex_array: Option<VertexArrayId>,
}

impl GlowState {
    fn buffer(&self, id: BufferId) -> Result<&GlBufferEntry, DeviceError> {
        self.buffers.get(&id).ok_or(DeviceError::NotFound {
            object: "buffer",
            id: id.0,
        })
    }

    fn vertex_array(&self, id: VertexArrayId) -> Result<glow::VertexArray, DeviceError> {
        self.vertex_arrays
            .get(&id)
            .copied()
            .ok_or(DeviceError::NotFound {
                object: "vertex array",
                id: id.0,
            })
    }

    fn program(&self, id: ProgramId) -> Result<glow::Program, DeviceError> {
        self.programs.get(&id).copied().ok_or(DeviceError::NotFound {
            object: "program",
            id: id.0,
        })
    }
}

/// Converts a byte count or offset into the `GLsizeiptr`/`GLintptr` range glow accepts.
fn gl_size(value: u64) -> Result<i32, DeviceError> {
    i32::try_from(value).map_err(|_| {
        DeviceError::BackendError(format!("{value} bytes exceeds the range of a GL size"))
    })
}

fn check_range(offset: u64, size: u64, capacity: u64) -> Result<(), DeviceError> {
    match offset.checked_add(size) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err(DeviceError::OutOfBounds {
            offset,
            size,
            capacity,
        }),
    }
}

/// An OpenGL implementation of [`GraphicsDevice`].
///
/// Buffers use immutable storage (`glBufferStorage`); host-visible and staging
/// buffers are mapped persistently and coherently, so writes through the mapping
/// need no explicit flush. Vertex arrays are configured with direct state access.
///
/// The device must only be used while its context is current on the calling thread.
pub struct GlowDevice {
    gl: glow::Context,
    state: Mutex<GlowState>,
    next_id: AtomicUsize,
}

impl fmt::Debug for GlowDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("GlowDevice")
            .field("buffers", &state.buffers.len())
            .field("fences", &state.fences.len())
            .field("vertex_arrays", &state.vertex_arrays.len())
            .field("programs", &state.programs.len())
            .finish()
    }
}

impl GlowDevice {
    /// Wraps a loaded OpenGL context. The context must be current.
    pub fn new(gl: glow::Context) -> Self {
        // SAFETY: the caller hands us a current context; these are plain queries.
        let (version, renderer) = unsafe {
            (
                gl.get_parameter_string(glow::VERSION),
                gl.get_parameter_string(glow::RENDERER),
            )
        };
        log::info!("Created OpenGL device: {renderer} ({version})");
        Self {
            gl,
            state: Mutex::new(GlowState::default()),
            next_id: AtomicUsize::new(1),
        }
    }

    /// The wrapped `glow` context.
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    fn lock(&self) -> MutexGuard<'_, GlowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Drains the GL error queue, reporting the first error against `operation`.
    fn check_error(&self, operation: &str) -> Result<(), DeviceError> {
        // SAFETY: querying the error flag has no preconditions beyond a current context.
        let first = unsafe { self.gl.get_error() };
        if first == glow::NO_ERROR {
            return Ok(());
        }
        while unsafe { self.gl.get_error() } != glow::NO_ERROR {}
        Err(DeviceError::BackendError(format!(
            "{operation} raised GL error 0x{first:04X}"
        )))
    }

    fn compile_stage(&self, stage: &ShaderStage) -> Result<glow::Shader, DeviceError> {
        let label = format!("{:?} stage", stage.kind);
        // SAFETY: shader objects are created, used and deleted on the current context.
        unsafe {
            let shader = self
                .gl
                .create_shader(stage.kind.into_gl())
                .map_err(DeviceError::BackendError)?;
            self.gl.shader_source(shader, &stage.program.source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let details = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(DeviceError::Compilation { label, details });
            }
            Ok(shader)
        }
    }
}

impl GraphicsDevice for GlowDevice {
    fn create_buffer(&self, size: u64, usage: BufferUsage) -> Result<BufferId, DeviceError> {
        if size == 0 {
            return Err(DeviceError::BackendError(
                "cannot allocate a zero-sized buffer".to_string(),
            ));
        }
        let gl_len = gl_size(size)?;
        // SAFETY: the buffer is bound, allocated and unbound on the current context.
        let raw = unsafe {
            let raw = self.gl.create_buffer().map_err(DeviceError::BackendError)?;
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(raw));
            self.gl
                .buffer_storage(glow::COPY_WRITE_BUFFER, gl_len, None, usage.into_gl());
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
            raw
        };
        if let Err(err) = self.check_error("glBufferStorage") {
            unsafe { self.gl.delete_buffer(raw) };
            return Err(err);
        }

        let id = BufferId(self.next_id());
        self.lock().buffers.insert(
            id,
            GlBufferEntry {
                raw,
                size,
                usage,
                mapping: None,
            },
        );
        log::trace!("Allocated GL buffer {} ({size} bytes, {usage:?})", id.0);
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), DeviceError> {
        let entry = self.lock().buffers.remove(&id).ok_or(DeviceError::NotFound {
            object: "buffer",
            id: id.0,
        })?;
        // Deleting a mapped buffer implicitly unmaps it; GL keeps the storage alive
        // until queued commands that reference it retire.
        unsafe { self.gl.delete_buffer(entry.raw) };
        Ok(())
    }

    fn is_buffer(&self, id: BufferId) -> bool {
        self.lock().buffers.contains_key(&id)
    }

    fn map_buffer(&self, id: BufferId) -> Result<(), DeviceError> {
        let mut state = self.lock();
        let entry = state.buffers.get_mut(&id).ok_or(DeviceError::NotFound {
            object: "buffer",
            id: id.0,
        })?;
        if entry.mapping.is_some() {
            return Ok(());
        }
        let access = map_access(entry.usage).ok_or_else(|| {
            DeviceError::MappingFailed(format!("buffer {} has device-local storage", id.0))
        })?;
        let length = gl_size(entry.size)?;
        // SAFETY: the whole range of an immutable store created with matching flags.
        let pointer = unsafe {
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(entry.raw));
            let pointer = self
                .gl
                .map_buffer_range(glow::COPY_WRITE_BUFFER, 0, length, access);
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
            pointer
        };
        if pointer.is_null() {
            return Err(DeviceError::MappingFailed(format!(
                "glMapBufferRange returned null for buffer {}",
                id.0
            )));
        }
        entry.mapping = Some(pointer);
        Ok(())
    }

    fn unmap_buffer(&self, id: BufferId) -> Result<(), DeviceError> {
        let mut state = self.lock();
        let entry = state.buffers.get_mut(&id).ok_or(DeviceError::NotFound {
            object: "buffer",
            id: id.0,
        })?;
        if entry.mapping.take().is_some() {
            unsafe {
                self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(entry.raw));
                self.gl.unmap_buffer(glow::COPY_WRITE_BUFFER);
                self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
            }
        }
        Ok(())
    }

    fn write_mapped(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), DeviceError> {
        let state = self.lock();
        let entry = state.buffer(id)?;
        let pointer = entry
            .mapping
            .ok_or_else(|| DeviceError::MappingFailed(format!("buffer {} is not mapped", id.0)))?;
        check_range(offset, data.len() as u64, entry.size)?;
        // SAFETY: the range was checked against the mapped allocation.
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), pointer.add(offset as usize), data.len());
        }
        Ok(())
    }

    fn read_mapped(&self, id: BufferId, offset: u64, out: &mut [u8]) -> Result<(), DeviceError> {
        let state = self.lock();
        let entry = state.buffer(id)?;
        if entry.usage != BufferUsage::HostVisible {
            return Err(DeviceError::MappingFailed(format!(
                "buffer {} is not readable from the host",
                id.0
            )));
        }
        let pointer = entry
            .mapping
            .ok_or_else(|| DeviceError::MappingFailed(format!("buffer {} is not mapped", id.0)))?;
        check_range(offset, out.len() as u64, entry.size)?;
        // SAFETY: the range was checked against the mapped allocation.
        unsafe {
            std::ptr::copy_nonoverlapping(pointer.add(offset as usize), out.as_mut_ptr(), out.len());
        }
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
        let state = self.lock();
        let src = state.buffer(source)?;
        let dst = state.buffer(destination)?;
        check_range(source_offset, size, src.size)?;
        check_range(destination_offset, size, dst.size)?;
        unsafe {
            self.gl.bind_buffer(glow::COPY_READ_BUFFER, Some(src.raw));
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(dst.raw));
            self.gl.copy_buffer_sub_data(
                glow::COPY_READ_BUFFER,
                glow::COPY_WRITE_BUFFER,
                gl_size(source_offset)?,
                gl_size(destination_offset)?,
                gl_size(size)?,
            );
            self.gl.bind_buffer(glow::COPY_READ_BUFFER, None);
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
        }
        self.check_error("glCopyBufferSubData")
    }

    fn insert_fence(&self) -> Result<FenceId, DeviceError> {
        let fence = unsafe {
            self.gl
                .fence_sync(glow::SYNC_GPU_COMMANDS_COMPLETE, 0)
                .map_err(DeviceError::BackendError)?
        };
        let id = FenceId(self.next_id());
        self.lock().fences.insert(id, fence);
        Ok(id)
    }

    fn wait_fence(&self, fence: FenceId, timeout_nanos: u64) -> FenceWait {
        let Some(raw) = self.lock().fences.get(&fence).copied() else {
            return FenceWait::WaitFailed;
        };
        // glow takes the timeout as a GLint; longer waits are sliced by the caller.
        let timeout = i32::try_from(timeout_nanos).unwrap_or(i32::MAX);
        let status = unsafe {
            self.gl
                .client_wait_sync(raw, glow::SYNC_FLUSH_COMMANDS_BIT, timeout)
        };
        match status {
            glow::ALREADY_SIGNALED => FenceWait::AlreadySignaled,
            glow::CONDITION_SATISFIED => FenceWait::ConditionSatisfied,
            glow::TIMEOUT_EXPIRED => FenceWait::TimeoutExpired,
            _ => FenceWait::WaitFailed,
        }
    }

    fn delete_fence(&self, fence: FenceId) {
        if let Some(raw) = self.lock().fences.remove(&fence) {
            unsafe { self.gl.delete_sync(raw) };
        }
    }

    fn create_vertex_array(&self) -> Result<VertexArrayId, DeviceError> {
        let raw = unsafe {
            self.gl
                .create_vertex_array()
                .map_err(DeviceError::BackendError)?
        };
        let id = VertexArrayId(self.next_id());
        self.lock().vertex_arrays.insert(id, raw);
        Ok(id)
    }

    fn destroy_vertex_array(&self, id: VertexArrayId) -> Result<(), DeviceError> {
        let mut state = self.lock();
        let raw = state
            .vertex_arrays
            .remove(&id)
            .ok_or(DeviceError::NotFound {
                object: "vertex array",
                id: id.0,
            })?;
        if state.bound_vertex_array == Some(id) {
            state.bound_vertex_array = None;
        }
        unsafe { self.gl.delete_vertex_array(raw) };
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
        let state = self.lock();
        let vao = state.vertex_array(vertex_array)?;
        let element = attribute.element_type;
        let components = element.components() as i32;
        let data_type = element.scalar().into_gl();
        unsafe {
            if element.is_integer() {
                self.gl.vertex_array_attrib_format_i32(
                    vao,
                    attribute.location,
                    components,
                    data_type,
                    attribute.relative_offset,
                );
            } else {
                self.gl.vertex_array_attrib_format_f32(
                    vao,
                    attribute.location,
                    components,
                    data_type,
                    element.is_normalized(),
                    attribute.relative_offset,
                );
            }
            self.gl
                .vertex_array_attrib_binding_f32(vao, attribute.location, attribute.binding_slot);
            self.gl.enable_vertex_array_attrib(vao, attribute.location);

            // There is no DSA entry point for the divisor in glow: bind, set, restore.
            self.gl.bind_vertex_array(Some(vao));
            self.gl
                .vertex_binding_divisor(attribute.binding_slot, attribute.instance_divisor);
            let restore = state
                .bound_vertex_array
                .and_then(|id| state.vertex_arrays.get(&id).copied());
            self.gl.bind_vertex_array(restore);
        }
        self.check_error("vertex attribute setup")
    }

    fn attach_vertex_buffer(
        &self,
        vertex_array: VertexArrayId,
        binding: &VertexBufferBinding,
    ) -> Result<(), DeviceError> {
        let state = self.lock();
        let vao = state.vertex_array(vertex_array)?;
        let buffer = state.buffer(binding.buffer)?.raw;
        let stride = i32::try_from(binding.stride)
            .map_err(|_| DeviceError::BackendError(format!("stride {} too large", binding.stride)))?;
        unsafe {
            self.gl
                .vertex_array_vertex_buffer(vao, binding.slot, Some(buffer), 0, stride);
        }
        self.check_error("glVertexArrayVertexBuffer")
    }

    fn attach_index_buffer(
        &self,
        vertex_array: VertexArrayId,
        buffer: BufferId,
    ) -> Result<(), DeviceError> {
        let state = self.lock();
        let vao = state.vertex_array(vertex_array)?;
        let raw = state.buffer(buffer)?.raw;
        unsafe { self.gl.vertex_array_element_buffer(vao, Some(raw)) };
        Ok(())
    }

    fn bind_vertex_array(&self, id: VertexArrayId) -> Result<(), DeviceError> {
        let mut state = self.lock();
        let vao = state.vertex_array(id)?;
        unsafe { self.gl.bind_vertex_array(Some(vao)) };
        state.bound_vertex_array = Some(id);
        Ok(())
    }

    fn create_program(&self, stages: &[ShaderStage]) -> Result<ProgramId, DeviceError> {
        let mut shaders = Vec::with_capacity(stages.len());
        for stage in stages {
            match self.compile_stage(stage) {
                Ok(shader) => shaders.push(shader),
                Err(err) => {
                    for shader in shaders {
                        unsafe { self.gl.delete_shader(shader) };
                    }
                    return Err(err);
                }
            }
        }

        // SAFETY: every handle used below was created on this context above.
        let linked = unsafe {
            let program = self
                .gl
                .create_program()
                .map_err(DeviceError::BackendError);
            if let Ok(program) = &program {
                for shader in &shaders {
                    self.gl.attach_shader(*program, *shader);
                }
                self.gl.link_program(*program);
                for shader in &shaders {
                    self.gl.detach_shader(*program, *shader);
                }
            }
            for shader in shaders {
                self.gl.delete_shader(shader);
            }
            let program = program?;
            if self.gl.get_program_link_status(program) {
                Ok(program)
            } else {
                let details = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                Err(DeviceError::Compilation {
                    label: "program".to_string(),
                    details,
                })
            }
        }?;

        let id = ProgramId(self.next_id());
        self.lock().programs.insert(id, linked);
        log::debug!("Linked GL program {} from {} stage(s)", id.0, stages.len());
        Ok(id)
    }

    fn destroy_program(&self, id: ProgramId) -> Result<(), DeviceError> {
        let raw = self.lock().programs.remove(&id).ok_or(DeviceError::NotFound {
            object: "program",
            id: id.0,
        })?;
        unsafe { self.gl.delete_program(raw) };
        Ok(())
    }

    fn is_program(&self, id: ProgramId) -> bool {
        self.lock().programs.contains_key(&id)
    }

    fn use_program(&self, id: ProgramId) -> Result<(), DeviceError> {
        let program = self.lock().program(id)?;
        unsafe { self.gl.use_program(Some(program)) };
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
        let state = self.lock();
        let entry = state.buffer(buffer)?;
        check_range(offset, size, entry.size)?;
        unsafe {
            self.gl.bind_buffer_range(
                kind.into_gl(),
                slot,
                Some(entry.raw),
                gl_size(offset)?,
                gl_size(size)?,
            );
        }
        self.check_error("glBindBufferRange")
    }

    fn bind_indirect_buffer(&self, buffer: BufferId) -> Result<(), DeviceError> {
        let raw = self.lock().buffer(buffer)?.raw;
        unsafe { self.gl.bind_buffer(glow::DRAW_INDIRECT_BUFFER, Some(raw)) };
        Ok(())
    }

    fn draw(&self, call: &DrawCall) -> Result<(), DeviceError> {
        let count = |value: u32| {
            i32::try_from(value)
                .map_err(|_| DeviceError::BackendError(format!("draw count {value} too large")))
        };
        unsafe {
            match *call {
                DrawCall::Arrays {
                    mode,
                    first,
                    count: vertices,
                    instances,
                    base_instance,
                } => self.gl.draw_arrays_instanced_base_instance(
                    mode.into_gl(),
                    count(first)?,
                    count(vertices)?,
                    count(instances)?,
                    base_instance,
                ),
                DrawCall::Elements {
                    mode,
                    index_type,
                    first_index,
                    count: indices,
                    base_vertex,
                    instances,
                    base_instance,
                } => {
                    let offset = u64::from(first_index) * u64::from(index_type.size());
                    self.gl.draw_elements_instanced_base_vertex_base_instance(
                        mode.into_gl(),
                        count(indices)?,
                        index_type.into_gl(),
                        gl_size(offset)?,
                        count(instances)?,
                        base_vertex,
                        base_instance,
                    );
                }
                DrawCall::ArraysIndirect {
                    mode,
                    offset,
                    draw_count,
                } => {
                    for record in 0..u64::from(draw_count) {
                        let at = gl_size(offset + record * ARRAYS_INDIRECT_STRIDE)?;
                        self.gl.draw_arrays_indirect_offset(mode.into_gl(), at);
                    }
                }
                DrawCall::ElementsIndirect {
                    mode,
                    index_type,
                    offset,
                    draw_count,
                } => {
                    for record in 0..u64::from(draw_count) {
                        let at = gl_size(offset + record * ELEMENTS_INDIRECT_STRIDE)?;
                        self.gl
                            .draw_elements_indirect_offset(mode.into_gl(), index_type.into_gl(), at);
                    }
                }
            }
        }
        self.check_error("draw")
    }

    fn set_blending(&self, config: &BlendingConfig, draw_buffer: u32) -> Result<(), DeviceError> {
        unsafe {
            if !config.enabled {
                self.gl.disable_draw_buffer(glow::BLEND, draw_buffer);
                return Ok(());
            }
            self.gl.enable_draw_buffer(glow::BLEND, draw_buffer);
            self.gl.blend_func_separate_draw_buffer(
                draw_buffer,
                config.src_rgb.into_gl(),
                config.dst_rgb.into_gl(),
                config.src_alpha.into_gl(),
                config.dst_alpha.into_gl(),
            );
            self.gl.blend_equation_separate_draw_buffer(
                draw_buffer,
                config.rgb_operation.into_gl(),
                config.alpha_operation.into_gl(),
            );
            let [r, g, b, a] = config.constant;
            self.gl.blend_color(r, g, b, a);
        }
        self.check_error("blending setup")
    }

    fn set_stencil(&self, config: &StencilConfig, facing: StencilFacing) -> Result<(), DeviceError> {
        unsafe {
            if !config.enabled {
                self.gl.disable(glow::STENCIL_TEST);
                return Ok(());
            }
            let face = facing.into_gl();
            self.gl.enable(glow::STENCIL_TEST);
            self.gl.stencil_func_separate(
                face,
                config.test.into_gl(),
                config.reference,
                config.test_mask as u32,
            );
            self.gl.stencil_op_separate(
                face,
                config.stencil_fail.into_gl(),
                config.depth_fail.into_gl(),
                config.pixel_pass.into_gl(),
            );
            self.gl.stencil_mask_separate(face, config.write_mask as u32);
        }
        self.check_error("stencil setup")
    }

    fn set_scissor(&self, config: &ScissorConfig, viewport: u32) -> Result<(), DeviceError> {
        unsafe {
            if !config.enabled {
                self.gl.disable_draw_buffer(glow::SCISSOR_TEST, viewport);
                return Ok(());
            }
            self.gl.enable_draw_buffer(glow::SCISSOR_TEST, viewport);
            let rect = [config.left, config.bottom, config.width, config.height];
            self.gl.scissor_slice(viewport, 1, &[rect]);
        }
        self.check_error("scissor setup")
    }

    fn set_face_cull(&self, mode: FaceCullMode) -> Result<(), DeviceError> {
        unsafe {
            match mode.into_gl() {
                Some(face) => {
                    self.gl.enable(glow::CULL_FACE);
                    self.gl.cull_face(face);
                }
                None => self.gl.disable(glow::CULL_FACE),
            }
        }
        Ok(())
    }

    fn set_depth_test(&self, config: &DepthTestConfig) -> Result<(), DeviceError> {
        unsafe {
            if config.enabled {
                self.gl.enable(glow::DEPTH_TEST);
                self.gl.depth_func(config.test.into_gl());
                self.gl.depth_mask(config.write);
            } else {
                self.gl.disable(glow::DEPTH_TEST);
            }
        }
        Ok(())
    }

    fn set_depth_range(&self, near: f64, far: f64, viewport: u32) -> Result<(), DeviceError> {
        unsafe { self.gl.depth_range_f64_slice(viewport, 1, &[[near, far]]) };
        self.check_error("glDepthRangeArrayv")
    }

    fn clear_window(&self, mode: ClearMode, values: &ClearValues) -> Result<(), DeviceError> {
        unsafe {
            if mode.clears_color() {
                let [r, g, b, a] = values.color;
                self.gl.clear_color(r, g, b, a);
            }
            if mode.clears_depth() {
                self.gl.clear_depth_f64(values.depth);
            }
            if mode.clears_stencil() {
                self.gl.clear_stencil(values.stencil);
            }
            self.gl.clear(mode.into_gl());
        }
        Ok(())
    }
}

impl Drop for GlowDevice {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        unsafe {
            for (_, fence) in state.fences.drain() {
                self.gl.delete_sync(fence);
            }
            for (_, program) in state.programs.drain() {
                self.gl.delete_program(program);
            }
            for (_, vao) in state.vertex_arrays.drain() {
                self.gl.delete_vertex_array(vao);
            }
            for (_, buffer) in state.buffers.drain() {
                self.gl.delete_buffer(buffer.raw);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gl_size_limits() {
        assert_eq!(gl_size(0), Ok(0));
        assert_eq!(gl_size(i32::MAX as u64), Ok(i32::MAX));
        assert!(matches!(
            gl_size(i32::MAX as u64 + 1),
            Err(DeviceError::BackendError(_))
        ));
    }

    #[test]
    fn test_check_range() {
        assert!(check_range(0, 16, 16).is_ok());
        assert_eq!(
            check_range(8, 16, 16),
            Err(DeviceError::OutOfBounds {
                offset: 8,
                size: 16,
                capacity: 16
            })
        );
        assert!(check_range(u64::MAX, 2, 16).is_err());
    }
}
