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

//! Backend-agnostic rendering API.
//!
//! Organized into several logical sub-modules:
//!
//! - **[`identifier`]**: name-hashed object identifiers.
//! - **[`buffer`]**, **[`vertex`]**, **[`shader`]**: object descriptors and device handles.
//! - **[`descriptor`]**: the descriptor sum type.
//! - **[`command`]**: the command sum type and its payloads.
//! - **[`pipeline`]**: fixed-function state configurations.

pub mod buffer;
pub mod command;
pub mod descriptor;
pub mod identifier;
pub mod pipeline;
pub mod shader;
pub mod vertex;

pub use self::buffer::*;
pub use self::command::*;
pub use self::descriptor::*;
pub use self::identifier::*;
pub use self::pipeline::*;
pub use self::shader::*;
pub use self::vertex::*;
