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

//! Buffer state: main storage plus the three upload strategies.
//!
//! - **Direct** writes through a persistent mapping of main storage, with no
//!   synchronization. Only host-visible (`SystemRam`) buffers can be mapped.
//! - **Staged** writes into a [`StagingRing`] and copies GPU-side into main storage,
//!   guarding the ring region with a fence until the copy has completed.
//! - **Temp-copy** writes into a throwaway transfer buffer and copies from it.

use super::staging::StagingRing;
use crate::renderer::api::{BufferDescriptor, BufferId, BufferUsage, UploadStrategy};
use crate::renderer::error::{Completion, DeviceError, ErrorKind, RenderError, RenderResult};
use crate::renderer::traits::GraphicsDevice;

/// A live buffer object.
#[derive(Debug)]
pub struct BufferState {
    name: String,
    buffer: BufferId,
    size: u64,
    usage: BufferUsage,
    mapped: bool,
    staging: StagingRing,
}

impl BufferState {
    /// Allocates the main storage described by `descriptor`.
    pub fn create(device: &dyn GraphicsDevice, descriptor: &BufferDescriptor) -> RenderResult<Self> {
        let usage = BufferUsage::from(descriptor.memory);
        let buffer = device.create_buffer(descriptor.size, usage).map_err(|err| {
            RenderError::new(
                ErrorKind::BackendError,
                format!(
                    "Failed to allocate {} bytes for buffer '{}': {err}",
                    descriptor.size, descriptor.identifier
                ),
            )
        })?;

        log::debug!(
            "Allocated buffer '{}' ({} bytes, {:?}, {:?}).",
            descriptor.identifier,
            descriptor.size,
            usage,
            buffer
        );

        Ok(Self {
            name: descriptor.identifier.name().to_owned(),
            buffer,
            size: descriptor.size,
            usage,
            mapped: false,
            staging: StagingRing::new(),
        })
    }

    /// The device handle of the main storage.
    pub fn id(&self) -> BufferId {
        self.buffer
    }

    /// The fixed size of the main storage in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// How the main storage was allocated.
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// The staging ring used by streaming uploads.
    pub fn staging(&self) -> &StagingRing {
        &self.staging
    }

    /// Returns `true` if the main storage is still alive on the device.
    pub fn is_valid(&self, device: &dyn GraphicsDevice) -> bool {
        device.is_buffer(self.buffer)
    }

    /// Fails with `RangeOverflow` unless `[address, address + bytes)` lies within the buffer.
    pub fn check_range(&self, address: u64, bytes: u64) -> RenderResult<()> {
        match address.checked_add(bytes) {
            Some(end) if end <= self.size => Ok(()),
            _ => Err(RenderError::range_overflow(format!(
                "Range of {bytes} bytes at address {address} exceeds the {} bytes of buffer '{}'",
                self.size, self.name
            ))),
        }
    }

    /// Uploads `data` into main storage at `address` with the given strategy.
    ///
    /// Nothing is written unless the whole range fits.
    pub fn upload(
        &mut self,
        device: &dyn GraphicsDevice,
        address: u64,
        data: &[u8],
        strategy: UploadStrategy,
        staging_growth_factor: u64,
    ) -> RenderResult {
        if data.is_empty() {
            return Err(RenderError::new(
                ErrorKind::UnexpectedNull,
                format!("No source bytes for upload into buffer '{}'", self.name),
            ));
        }
        self.check_range(address, data.len() as u64)?;

        match strategy {
            UploadStrategy::UnsafeDirect => self.upload_direct(device, address, data),
            UploadStrategy::SafeStreaming => {
                self.upload_staged(device, address, data, staging_growth_factor)
            }
            UploadStrategy::SafeOneTime => self.upload_temp_copy(device, address, data),
        }
    }

    /// Reads main storage at `address` through its persistent mapping.
    pub fn read(
        &mut self,
        device: &dyn GraphicsDevice,
        address: u64,
        out: &mut [u8],
    ) -> RenderResult {
        self.check_range(address, out.len() as u64)?;
        if out.is_empty() {
            return Ok(Completion::NothingToDo);
        }
        self.ensure_mapped(device)?;
        device.read_mapped(self.buffer, address, out)?;
        Ok(Completion::Done)
    }

    fn ensure_mapped(&mut self, device: &dyn GraphicsDevice) -> RenderResult<()> {
        if self.mapped {
            return Ok(());
        }
        device.map_buffer(self.buffer).map_err(|err| {
            RenderError::new(
                ErrorKind::BackendFailure,
                format!(
                    "Buffer '{}' cannot be mapped ({err}); create it with SystemRam memory for direct access",
                    self.name
                ),
            )
        })?;
        self.mapped = true;
        Ok(())
    }

    fn upload_direct(
        &mut self,
        device: &dyn GraphicsDevice,
        address: u64,
        data: &[u8],
    ) -> RenderResult {
        self.ensure_mapped(device)?;
        device.write_mapped(self.buffer, address, data)?;
        log::trace!(
            "Direct upload of {} bytes into '{}' at {address}",
            data.len(),
            self.name
        );
        Ok(Completion::Done)
    }

    fn upload_staged(
        &mut self,
        device: &dyn GraphicsDevice,
        address: u64,
        data: &[u8],
        growth_factor: u64,
    ) -> RenderResult {
        let bytes = data.len() as u64;

        let mut released = Vec::new();
        let slot = self.staging.try_allocate(
            bytes,
            |fence| device.wait_fence(fence, 0).is_signaled(),
            &mut released,
        );
        for fence in released {
            device.delete_fence(fence);
        }

        let offset = match slot {
            Some(offset) => offset,
            None => {
                let capacity = growth_factor.max(1).saturating_mul(bytes).min(self.size);
                self.reallocate_staging(device, capacity)?;
                0
            }
        };
        let ring = self.staging.buffer().ok_or_else(|| {
            RenderError::new(
                ErrorKind::BackendFailure,
                format!("Buffer '{}' has no staging ring", self.name),
            )
        })?;

        device.write_mapped(ring, offset, data)?;
        device.copy_buffer(ring, self.buffer, offset, address, bytes)?;
        let fence = match device.insert_fence() {
            Ok(fence) => fence,
            Err(err) => {
                // An unfenced region could be handed out again while the copy reads it.
                log::warn!(
                    "No fence for staged upload into '{}', retiring its staging ring: {err}",
                    self.name
                );
                self.release_staging(device);
                return Err(err.into());
            }
        };
        self.staging.commit(bytes, fence);

        log::trace!(
            "Staged upload of {bytes} bytes into '{}' at {address} (ring offset {offset}, {} in flight)",
            self.name,
            self.staging.in_flight()
        );
        Ok(Completion::Done)
    }

    fn reallocate_staging(&mut self, device: &dyn GraphicsDevice, capacity: u64) -> RenderResult<()> {
        self.release_staging(device);

        let ring = device
            .create_buffer(capacity, BufferUsage::Staging)
            .map_err(|err| {
                RenderError::new(
                    ErrorKind::BackendError,
                    format!(
                        "Failed to allocate a {capacity} byte staging ring for '{}': {err}",
                        self.name
                    ),
                )
            })?;
        if let Err(err) = device.map_buffer(ring) {
            if let Err(destroy_err) = device.destroy_buffer(ring) {
                log::warn!("Failed to destroy unmappable staging ring {ring:?}: {destroy_err}");
            }
            return Err(RenderError::new(
                ErrorKind::BackendFailure,
                format!("Failed to map the staging ring of '{}': {err}", self.name),
            ));
        }

        self.staging.reset(ring, capacity);
        log::debug!(
            "Staging ring of '{}' reallocated to {capacity} bytes ({ring:?})",
            self.name
        );
        Ok(())
    }

    fn release_staging(&mut self, device: &dyn GraphicsDevice) {
        let (ring, fences) = self.staging.take();
        for fence in fences {
            device.delete_fence(fence);
        }
        if let Some(ring) = ring {
            if let Err(err) = device.unmap_buffer(ring) {
                log::warn!("Failed to unmap staging ring {ring:?} of '{}': {err}", self.name);
            }
            if let Err(err) = device.destroy_buffer(ring) {
                log::warn!("Failed to destroy staging ring {ring:?} of '{}': {err}", self.name);
            }
        }
    }

    fn upload_temp_copy(
        &mut self,
        device: &dyn GraphicsDevice,
        address: u64,
        data: &[u8],
    ) -> RenderResult {
        let bytes = data.len() as u64;
        let transfer = device
            .create_buffer(bytes, BufferUsage::Transfer)
            .map_err(|err| {
                RenderError::new(
                    ErrorKind::BackendError,
                    format!(
                        "Failed to allocate a {bytes} byte transfer buffer for '{}': {err}",
                        self.name
                    ),
                )
            })?;

        let result = fill_and_copy(device, transfer, data, self.buffer, address);
        if let Err(err) = device.destroy_buffer(transfer) {
            log::warn!("Failed to destroy transfer buffer {transfer:?}: {err}");
        }
        result.map_err(|err| {
            RenderError::new(
                ErrorKind::BackendError,
                format!("Temporary copy into '{}' failed: {err}", self.name),
            )
        })?;

        log::trace!(
            "One-time upload of {bytes} bytes into '{}' at {address}",
            self.name
        );
        Ok(Completion::Done)
    }

    /// Releases the staging ring, its fences, and the main storage.
    pub fn destroy(mut self, device: &dyn GraphicsDevice) {
        self.release_staging(device);
        if self.mapped {
            if let Err(err) = device.unmap_buffer(self.buffer) {
                log::warn!("Failed to unmap buffer '{}': {err}", self.name);
            }
        }
        if let Err(err) = device.destroy_buffer(self.buffer) {
            log::error!("Failed to destroy buffer '{}': {err}", self.name);
        }
    }
}

fn fill_and_copy(
    device: &dyn GraphicsDevice,
    transfer: BufferId,
    data: &[u8],
    destination: BufferId,
    address: u64,
) -> Result<(), DeviceError> {
    device.map_buffer(transfer)?;
    device.write_mapped(transfer, 0, data)?;
    device.unmap_buffer(transfer)?;
    device.copy_buffer(transfer, destination, 0, address, data.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::BufferMemoryStorage;
    use crate::renderer::context::mock::MockGraphicsDevice;

    fn buffer(device: &MockGraphicsDevice, size: u64, memory: BufferMemoryStorage) -> BufferState {
        BufferState::create(device, &BufferDescriptor::new("data", size).with_memory(memory)).unwrap()
    }

    #[test]
    fn test_range_check_does_not_overflow() {
        let device = MockGraphicsDevice::new();
        let state = buffer(&device, 16, BufferMemoryStorage::VideoRam);
        assert!(state.check_range(0, 16).is_ok());
        assert!(state.check_range(16, 0).is_ok());
        let err = state.check_range(u64::MAX, 2).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RangeOverflow);
    }

    #[test]
    fn test_out_of_range_upload_writes_nothing() {
        let device = MockGraphicsDevice::new();
        for strategy in [
            UploadStrategy::UnsafeDirect,
            UploadStrategy::SafeStreaming,
            UploadStrategy::SafeOneTime,
        ] {
            let mut state = buffer(&device, 8, BufferMemoryStorage::SystemRam);
            let err = state
                .upload(&device, 4, &[0xAB; 8], strategy, 3)
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::RangeOverflow);
            assert_eq!(device.contents(state.id()), vec![0; 8]);
            state.destroy(&device);
        }
    }

    #[test]
    fn test_empty_upload_is_unexpected_null() {
        let device = MockGraphicsDevice::new();
        let mut state = buffer(&device, 8, BufferMemoryStorage::SystemRam);
        let err = state
            .upload(&device, 0, &[], UploadStrategy::SafeOneTime, 3)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedNull);
    }

    #[test]
    fn test_direct_upload_requires_system_ram() {
        let device = MockGraphicsDevice::new();
        let mut state = buffer(&device, 8, BufferMemoryStorage::VideoRam);
        let err = state
            .upload(&device, 0, &[1, 2], UploadStrategy::UnsafeDirect, 3)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::BackendFailure);
        assert!(err.message.contains("SystemRam"));
    }

    #[test]
    fn test_every_strategy_lands_in_main_storage() {
        let device = MockGraphicsDevice::new();
        let mut state = buffer(&device, 12, BufferMemoryStorage::SystemRam);
        state
            .upload(&device, 0, &[1, 2, 3, 4], UploadStrategy::UnsafeDirect, 3)
            .unwrap();
        state
            .upload(&device, 4, &[5, 6, 7, 8], UploadStrategy::SafeStreaming, 3)
            .unwrap();
        state
            .upload(&device, 8, &[9, 10, 11, 12], UploadStrategy::SafeOneTime, 3)
            .unwrap();

        let mut out = [0u8; 12];
        state.read(&device, 0, &mut out).unwrap();
        assert_eq!(out, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn test_staging_ring_is_sized_by_growth_factor() {
        let device = MockGraphicsDevice::new();
        let mut state = buffer(&device, 1024, BufferMemoryStorage::VideoRam);
        state
            .upload(&device, 0, &[7; 100], UploadStrategy::SafeStreaming, 3)
            .unwrap();
        assert_eq!(state.staging().capacity(), 300);

        // Larger than the ring: reallocated, capped at the main size.
        state
            .upload(&device, 0, &[7; 600], UploadStrategy::SafeStreaming, 3)
            .unwrap();
        assert_eq!(state.staging().capacity(), 1024);
        assert_eq!(state.staging().in_flight(), 1);
    }

    #[test]
    fn test_failed_fence_retires_staging_ring() {
        let device = MockGraphicsDevice::new();
        let mut state = buffer(&device, 256, BufferMemoryStorage::VideoRam);
        state
            .upload(&device, 0, &[1; 16], UploadStrategy::SafeStreaming, 3)
            .unwrap();
        assert_eq!(device.live_fences(), 1);

        device.set_fail_fences(true);
        let err = state
            .upload(&device, 16, &[2; 16], UploadStrategy::SafeStreaming, 3)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::BackendError);
        assert!(state.staging().buffer().is_none());
        assert_eq!(state.staging().capacity(), 0);
        assert_eq!(state.staging().in_flight(), 0);
        assert_eq!(device.live_buffers(), 1);
        assert_eq!(device.live_fences(), 0);

        // The next upload starts a fresh ring.
        device.set_fail_fences(false);
        state
            .upload(&device, 32, &[3; 16], UploadStrategy::SafeStreaming, 3)
            .unwrap();
        assert!(state.staging().buffer().is_some());
        assert_eq!(device.contents(state.id())[32..48], [3; 16]);
    }

    #[test]
    fn test_temp_copy_does_not_leak() {
        let device = MockGraphicsDevice::new();
        let mut state = buffer(&device, 8, BufferMemoryStorage::VideoRam);
        state
            .upload(&device, 0, &[1; 8], UploadStrategy::SafeOneTime, 3)
            .unwrap();
        assert_eq!(device.live_buffers(), 1);
    }

    #[test]
    fn test_destroy_releases_everything() {
        let device = MockGraphicsDevice::new();
        let mut state = buffer(&device, 64, BufferMemoryStorage::VideoRam);
        state
            .upload(&device, 0, &[1; 8], UploadStrategy::SafeStreaming, 3)
            .unwrap();
        assert_eq!(device.live_buffers(), 2);

        state.destroy(&device);
        assert_eq!(device.live_buffers(), 0);
        assert_eq!(device.live_fences(), 0);
    }
}
