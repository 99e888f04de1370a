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

//! A window without a surface, for tests and offscreen tools.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use vellum_core::platform::window::GraphicsWindow;
use vellum_core::renderer::{ErrorKind, RenderError, RenderResult};

#[derive(Debug)]
struct WindowState {
    available: AtomicBool,
    activations: AtomicUsize,
    presents: AtomicUsize,
}

/// A [`GraphicsWindow`] whose context activation succeeds until it is marked lost.
///
/// Clones share state, so a test can keep a handle after boxing the window into a
/// render context and simulate a lost context later on.
#[derive(Debug, Clone)]
pub struct HeadlessWindow {
    state: Arc<WindowState>,
}

impl Default for HeadlessWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessWindow {
    /// Creates a window whose context is available.
    pub fn new() -> Self {
        Self {
            state: Arc::new(WindowState {
                available: AtomicBool::new(true),
                activations: AtomicUsize::new(0),
                presents: AtomicUsize::new(0),
            }),
        }
    }

    /// Makes every later activation fail (`lost = true`) or succeed again.
    pub fn set_context_lost(&self, lost: bool) {
        self.state.available.store(!lost, Ordering::SeqCst);
    }

    /// How many times the context was successfully made current.
    pub fn activations(&self) -> usize {
        self.state.activations.load(Ordering::SeqCst)
    }

    /// How many times the back buffer was presented.
    pub fn presents(&self) -> usize {
        self.state.presents.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> RenderResult<()> {
        if self.state.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RenderError::new(
                ErrorKind::BackendFailure,
                "Headless graphics context is lost",
            ))
        }
    }
}

impl GraphicsWindow for HeadlessWindow {
    fn make_context_current(&self) -> RenderResult<()> {
        self.check_available()?;
        self.state.activations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn swap_buffers(&self) -> RenderResult<()> {
        self.check_available()?;
        self.state.presents.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
