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

use crate::renderer::error::RenderResult;

/// A trait that abstracts the window owning a graphics context.
///
/// Any windowing backend (glutin, SDL2, GLFW, a headless surface, etc.) can implement
/// this trait to host a render context.
pub trait GraphicsWindow {
    /// Makes the window's graphics context current on the calling thread.
    ///
    /// The render context calls this before every operation that touches the GPU.
    fn make_context_current(&self) -> RenderResult<()>;

    /// Presents the back buffer.
    fn swap_buffers(&self) -> RenderResult<()>;
}
