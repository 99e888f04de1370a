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

//! Ring allocator for staged uploads with fence-deferred reclamation.
//!
//! The ring hands out contiguous byte ranges of a staging buffer. Every range stays
//! reserved until the fence issued after its GPU copy is observed signalled. The
//! ring never waits on a fence; it only polls.

use std::collections::VecDeque;

use crate::renderer::api::{BufferId, FenceId};

/// One staged upload whose GPU-side copy may still be in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadChunk {
    /// Offset of the chunk in the staging buffer.
    pub offset: u64,
    /// Size of the chunk in bytes.
    pub size: u64,
    /// Signals once the copy out of the chunk has completed.
    pub fence: FenceId,
}

/// The staging side of a buffer: an optional ring buffer plus its in-flight chunks.
///
/// In-flight chunks are kept in submission order, so the front chunk marks the tail
/// of the used region and the cursor marks its head. Free space is whatever lies
/// between the head and the tail going around the ring.
#[derive(Debug, Default)]
pub struct StagingRing {
    buffer: Option<BufferId>,
    capacity: u64,
    cursor: u64,
    chunks: VecDeque<UploadChunk>,
}

impl StagingRing {
    /// An empty ring with no backing buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The staging buffer, if one has been allocated.
    pub fn buffer(&self) -> Option<BufferId> {
        self.buffer
    }

    /// The size of the staging buffer in bytes.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// The offset the next allocation would start at, before any wrap.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// The number of uploads still waiting for their fence to be observed.
    pub fn in_flight(&self) -> usize {
        self.chunks.len()
    }

    /// The in-flight chunks, oldest first.
    pub fn chunks(&self) -> impl Iterator<Item = &UploadChunk> {
        self.chunks.iter()
    }

    /// Pops chunks from the front of the queue while their fences have signalled.
    /// Released fences are pushed onto `released`.
    ///
    /// Stops at the first pending chunk even if younger chunks have completed, so
    /// reclaimed space is always contiguous with the free run.
    pub fn reclaim<F>(&mut self, is_signaled: &mut F, released: &mut Vec<FenceId>)
    where
        F: FnMut(FenceId) -> bool,
    {
        while let Some(front) = self.chunks.front().copied() {
            if !is_signaled(front.fence) {
                break;
            }
            self.chunks.pop_front();
            released.push(front.fence);
            log::trace!(
                "Staging ring reclaimed {} bytes at offset {}",
                front.size,
                front.offset
            );
        }
        if self.chunks.is_empty() {
            self.cursor = 0;
        }
    }

    /// Finds room for `bytes` contiguous bytes, reclaiming and wrapping as needed.
    ///
    /// Returns the offset to write at, or `None` if the ring has to be reallocated.
    /// The space is not reserved until [`commit`](Self::commit) is called.
    pub fn try_allocate<F>(
        &mut self,
        bytes: u64,
        mut is_signaled: F,
        released: &mut Vec<FenceId>,
    ) -> Option<u64>
    where
        F: FnMut(FenceId) -> bool,
    {
        self.buffer?;
        self.reclaim(&mut is_signaled, released);

        let Some(tail) = self.chunks.front().map(|chunk| chunk.offset) else {
            return (bytes <= self.capacity).then_some(0);
        };

        if tail >= self.cursor {
            // Used space wraps around the end: the only free run is up to the tail.
            return (bytes <= tail - self.cursor).then_some(self.cursor);
        }
        if bytes <= self.capacity - self.cursor {
            return Some(self.cursor);
        }
        if bytes <= tail {
            // The bytes between the cursor and the end stay unused until the next lap.
            self.cursor = 0;
            return Some(0);
        }
        None
    }

    /// Records an upload of `bytes` at the cursor, guarded by `fence`, and advances.
    pub fn commit(&mut self, bytes: u64, fence: FenceId) {
        self.chunks.push_back(UploadChunk {
            offset: self.cursor,
            size: bytes,
            fence,
        });
        self.cursor += bytes;
    }

    /// Detaches the current staging buffer and every in-flight fence, leaving the
    /// ring empty. The caller owns the returned resources.
    pub fn take(&mut self) -> (Option<BufferId>, Vec<FenceId>) {
        let fences = self.chunks.drain(..).map(|chunk| chunk.fence).collect();
        let buffer = self.buffer.take();
        self.capacity = 0;
        self.cursor = 0;
        (buffer, fences)
    }

    /// Starts over with a fresh, fully free staging buffer.
    pub fn reset(&mut self, buffer: BufferId, capacity: u64) {
        self.chunks.clear();
        self.buffer = Some(buffer);
        self.capacity = capacity;
        self.cursor = 0;
    }
}
