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

//! Provides the public, backend-agnostic rendering contracts for Vellum.
//!
//! This module defines the data every render context speaks: identifiers,
//! descriptors, commands and pipeline state in [`api`], the failure taxonomy in
//! [`error`], and the seams to the outside world in [`traits`]. The [`context`]
//! module holds the engine that turns descriptors into live objects and replays
//! command buffers through a [`GraphicsDevice`]; the device itself lives in the
//! `vellum-infra` crate.

pub mod api;
pub mod context;
pub mod error;
pub mod traits;

// Re-export the most important traits and types for easier use.
pub use self::api::*;
pub use self::error::{
    Completion, DeviceError, ErrorKind, RenderError, RenderResult, ShaderError, SignalStatus,
    Status, StatusKind,
};
pub use self::traits::{DrawCall, GraphicsDevice, ShaderCompiler};
