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

//! Named signals: fences registered by `Signal` commands and waited on by the client.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::renderer::api::{FenceId, FenceWait};
use crate::renderer::error::SignalStatus;
use crate::renderer::traits::GraphicsDevice;

/// The fences of a context, by signal name.
#[derive(Debug, Default)]
pub struct SignalTable {
    fences: HashMap<String, FenceId>,
}

impl SignalTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `fence` under `name`, deleting the fence it replaces.
    pub fn register(&mut self, device: &dyn GraphicsDevice, name: &str, fence: FenceId) {
        if let Some(previous) = self.fences.insert(name.to_owned(), fence) {
            log::trace!("Signal '{name}' replaced fence {previous:?}");
            device.delete_fence(previous);
        }
    }

    /// Unregisters a signal, handing its fence back to the caller.
    pub fn remove(&mut self, name: &str) -> Option<FenceId> {
        self.fences.remove(name)
    }

    /// Returns `true` if a signal is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.fences.contains_key(name)
    }

    /// The number of registered signals.
    pub fn len(&self) -> usize {
        self.fences.len()
    }

    /// Returns `true` if no signal is registered.
    pub fn is_empty(&self) -> bool {
        self.fences.is_empty()
    }

    /// Waits up to `timeout_nanos` for the named signal.
    ///
    /// A zero timeout polls once. Longer waits are issued to the device in slices of
    /// at most `poll_interval_nanos` until the deadline passes.
    pub fn wait(
        &self,
        device: &dyn GraphicsDevice,
        name: &str,
        timeout_nanos: u64,
        poll_interval_nanos: u64,
    ) -> SignalStatus {
        let Some(&fence) = self.fences.get(name) else {
            return SignalStatus::UnknownSignal;
        };

        if timeout_nanos == 0 {
            return if device.wait_fence(fence, 0).is_signaled() {
                SignalStatus::Signalled
            } else {
                SignalStatus::NotSignalled
            };
        }

        let deadline = Instant::now() + Duration::from_nanos(timeout_nanos);
        let interval = poll_interval_nanos.max(1);
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let slice = u64::try_from(remaining.as_nanos())
                .unwrap_or(u64::MAX)
                .min(interval);
            match device.wait_fence(fence, slice) {
                FenceWait::AlreadySignaled | FenceWait::ConditionSatisfied => {
                    return SignalStatus::Signalled;
                }
                FenceWait::WaitFailed => {
                    log::warn!("Waiting on signal '{name}' failed");
                    return SignalStatus::NotSignalled;
                }
                FenceWait::TimeoutExpired if Instant::now() >= deadline => {
                    return SignalStatus::TimedOut;
                }
                FenceWait::TimeoutExpired => {}
            }
        }
    }

    /// Empties the table, yielding every fence.
    pub fn drain(&mut self) -> impl Iterator<Item = FenceId> + '_ {
        self.fences.drain().map(|(_, fence)| fence)
    }
}
