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

//! # Vellum Core
//!
//! Foundational crate containing the contracts of the Vellum render backend:
//! object identifiers, descriptors, commands, the error taxonomy, the
//! [`GraphicsDevice`](renderer::GraphicsDevice) seam, and the
//! [`RenderContext`] that turns descriptors into live GPU objects and replays
//! command buffers against them.

#![warn(missing_docs)]

pub mod config;
pub mod platform;
pub mod renderer;

pub use config::ContextConfig;
pub use renderer::context::RenderContext;
