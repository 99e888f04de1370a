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

//! Defines data structures related to GPU buffer resources.

use super::identifier::ObjectIdentifier;

/// Where the main storage of a buffer should live.
///
/// The hint cannot always be honoured by the driver, but [`BufferMemoryStorage::SystemRam`]
/// guarantees that the buffer can be written directly through a persistent mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferMemoryStorage {
    /// Host-visible memory, persistently mappable for direct uploads and reads.
    SystemRam,
    /// Device-local memory, only reachable through GPU-side copies.
    #[default]
    VideoRam,
}

/// A descriptor used to create a named buffer object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDescriptor {
    /// The buffer's name.
    pub identifier: ObjectIdentifier,
    /// The total size of the buffer in bytes. Never changes after creation.
    pub size: u64,
    /// Where the buffer should be allocated.
    pub memory: BufferMemoryStorage,
}

impl BufferDescriptor {
    /// Describes a device-local buffer of `size` bytes.
    pub fn new(name: impl Into<ObjectIdentifier>, size: u64) -> Self {
        Self {
            identifier: name.into(),
            size,
            memory: BufferMemoryStorage::VideoRam,
        }
    }

    /// Sets the memory hint.
    pub fn with_memory(mut self, memory: BufferMemoryStorage) -> Self {
        self.memory = memory;
        self
    }
}

/// How a device allocation will be used, which decides its storage flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// GPU-only storage written by copies.
    DeviceLocal,
    /// Persistently mappable for reading and writing (coherent, client storage).
    HostVisible,
    /// A persistently write-mapped ring used to stage uploads.
    Staging,
    /// A short-lived write-only allocation used for a single upload.
    Transfer,
}

impl From<BufferMemoryStorage> for BufferUsage {
    fn from(memory: BufferMemoryStorage) -> Self {
        match memory {
            BufferMemoryStorage::SystemRam => BufferUsage::HostVisible,
            BufferMemoryStorage::VideoRam => BufferUsage::DeviceLocal,
        }
    }
}

/// The binding-point family a buffer is attached to for shader access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// A uniform (constant) buffer block.
    Uniform,
    /// A shader storage buffer block.
    Storage,
}

/// An opaque handle to a GPU buffer allocation.
///
/// This ID is returned by [`GraphicsDevice::create_buffer`](crate::renderer::GraphicsDevice::create_buffer)
/// and is used to reference the allocation in all subsequent device calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub usize);

/// An opaque handle to a GPU fence (sync object).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FenceId(pub usize);

/// The result of waiting on a fence from the client side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FenceWait {
    /// The fence was signalled before the wait started.
    AlreadySignaled,
    /// The fence became signalled during the wait.
    ConditionSatisfied,
    /// The wait window elapsed before the fence was signalled.
    TimeoutExpired,
    /// The wait could not be performed.
    WaitFailed,
}

impl FenceWait {
    /// Returns `true` if the fence is known to be signalled.
    pub fn is_signaled(self) -> bool {
        matches!(self, FenceWait::AlreadySignaled | FenceWait::ConditionSatisfied)
    }
}
