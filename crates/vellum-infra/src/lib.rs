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

//! # Vellum Infra
//!
//! Concrete implementations of the contracts defined in `vellum-core`: graphics
//! devices, windows, the GLSL shading collaborator, and logging setup.

#![warn(missing_docs)]

pub mod graphics;
pub mod logging;
pub mod platform;
pub mod shading;

#[cfg(feature = "graphics")]
pub use graphics::glow::GlowDevice;
pub use graphics::headless::{DeviceCall, FenceMode, HeadlessDevice};
pub use logging::{init_logging, LogWriteStyle, LoggingConfig};
pub use platform::headless::HeadlessWindow;
pub use shading::glsl::GlslCompiler;
