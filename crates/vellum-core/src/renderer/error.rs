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

//! Defines the hierarchy of error and status types for the rendering subsystem.
//!
//! There are two layers. [`DeviceError`] is what a [`GraphicsDevice`](super::GraphicsDevice)
//! reports when the underlying API rejects a call. [`RenderError`] is what the public
//! [`RenderContext`](super::context::RenderContext) surface reports, tagged with an
//! [`ErrorKind`] from the failure taxonomy.

use std::fmt;

/// An error reported by a concrete graphics device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The requested device object does not exist (or was already destroyed).
    NotFound {
        /// The kind of object that was looked up (e.g. "buffer").
        object: &'static str,
        /// The raw handle value.
        id: usize,
    },
    /// The handle is of the right kind but cannot be used for this operation.
    InvalidHandle(String),
    /// A read, write or copy would touch bytes outside of a device allocation.
    OutOfBounds {
        /// The first byte of the offending range.
        offset: u64,
        /// The length of the offending range.
        size: u64,
        /// The size of the allocation that was addressed.
        capacity: u64,
    },
    /// The device could not provide a CPU mapping of the allocation.
    MappingFailed(String),
    /// A shader stage failed to compile or a program failed to link.
    Compilation {
        /// The stage or program that failed.
        label: String,
        /// The backend's info log.
        details: String,
    },
    /// A generic error from the underlying graphics API.
    BackendError(String),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::NotFound { object, id } => {
                write!(f, "Device {object} not found for ID: {id}")
            }
            DeviceError::InvalidHandle(msg) => write!(f, "Invalid device handle: {msg}"),
            DeviceError::OutOfBounds {
                offset,
                size,
                capacity,
            } => write!(
                f,
                "Range [{offset}, {offset} + {size}) is outside of an allocation of {capacity} bytes"
            ),
            DeviceError::MappingFailed(msg) => write!(f, "Failed to map device memory: {msg}"),
            DeviceError::Compilation { label, details } => {
                write!(f, "Compilation failed for '{label}': {details}")
            }
            DeviceError::BackendError(msg) => write!(f, "Graphics backend error: {msg}"),
        }
    }
}

impl std::error::Error for DeviceError {}

/// An error produced by the shading collaborator while compiling or reflecting a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    /// The stage source failed to compile.
    CompilationError {
        /// A descriptive label for the stage.
        label: String,
        /// Detailed error messages from the compiler.
        details: String,
    },
    /// The source does not contain an entry point for the requested stage.
    MissingStage(String),
    /// The reflection step could not make sense of a declaration.
    Reflection(String),
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::CompilationError { label, details } => {
                write!(f, "Shader compilation failed for '{label}': {details}")
            }
            ShaderError::MissingStage(stage) => {
                write!(f, "Shader source has no entry point for stage {stage}")
            }
            ShaderError::Reflection(msg) => write!(f, "Shader reflection failed: {msg}"),
        }
    }
}

impl std::error::Error for ShaderError {}

/// The failure taxonomy of the render context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The operation is not supported by this backend.
    Unsupported,
    /// The operation is recognised but has no implementation yet.
    Unimplemented,
    /// The target was already initialized.
    AlreadyInitialized,
    /// The target has not been initialized.
    NotInitialized,
    /// A referenced object does not exist.
    UnknownSource,
    /// A referenced name does not exist.
    UnknownName,
    /// A referenced object exists but is structurally invalid.
    BrokenSource,
    /// Required source data was missing.
    UnexpectedNull,
    /// An address or size lies outside of a buffer.
    RangeOverflow,
    /// The name is already taken.
    DuplicateName,
    /// The graphics API rejected an operation.
    BackendError,
    /// A resource was unusable after the graphics API accepted its creation.
    BackendFailure,
    /// A bounded operation did not complete in time.
    Timeout,
}

impl ErrorKind {
    /// Returns the stable, upper-case name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unsupported => "UNSUPPORTED",
            ErrorKind::Unimplemented => "UNIMPLEMENTED",
            ErrorKind::AlreadyInitialized => "ALREADY_INITIALIZED",
            ErrorKind::NotInitialized => "NOT_INITIALIZED",
            ErrorKind::UnknownSource => "UNKNOWN_SOURCE",
            ErrorKind::UnknownName => "UNKNOWN_NAME",
            ErrorKind::BrokenSource => "BROKEN_SOURCE",
            ErrorKind::UnexpectedNull => "UNEXPECTED_NULL",
            ErrorKind::RangeOverflow => "RANGE_OVERFLOW",
            ErrorKind::DuplicateName => "DUPLICATE_NAME",
            ErrorKind::BackendError => "BACKEND_ERROR",
            ErrorKind::BackendFailure => "BACKEND_FAILURE",
            ErrorKind::Timeout => "TIMEOUT",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed render-context operation: a taxonomy kind plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Details for the caller, usually naming the offending object.
    pub message: String,
}

impl RenderError {
    /// Creates a new error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for an [`ErrorKind::UnknownSource`] error.
    pub fn unknown_source(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownSource, message)
    }

    /// Shorthand for an [`ErrorKind::UnknownName`] error.
    pub fn unknown_name(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownName, message)
    }

    /// Shorthand for an [`ErrorKind::BrokenSource`] error.
    pub fn broken_source(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BrokenSource, message)
    }

    /// Shorthand for an [`ErrorKind::RangeOverflow`] error.
    pub fn range_overflow(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RangeOverflow, message)
    }

    /// Shorthand for an [`ErrorKind::DuplicateName`] error.
    pub fn duplicate_name(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateName, message)
    }

    /// Prefixes the message with some context, keeping the kind.
    pub fn context(mut self, context: impl fmt::Display) -> Self {
        self.message = format!("{context}: {}", self.message);
        self
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for RenderError {}

impl From<DeviceError> for RenderError {
    fn from(err: DeviceError) -> Self {
        let kind = match err {
            DeviceError::OutOfBounds { .. } => ErrorKind::RangeOverflow,
            DeviceError::MappingFailed(_) => ErrorKind::BackendFailure,
            _ => ErrorKind::BackendError,
        };
        RenderError::new(kind, err.to_string())
    }
}

impl From<ShaderError> for RenderError {
    fn from(err: ShaderError) -> Self {
        RenderError::new(ErrorKind::BackendError, err.to_string())
    }
}

/// How a successful operation concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Completion {
    /// The operation did its work.
    Done,
    /// There was nothing to do, e.g. deleting a name that does not exist.
    NothingToDo,
}

/// The result type of every fallible render-context operation.
pub type RenderResult<T = Completion> = Result<T, RenderError>;

/// The flat status kind: success markers plus every [`ErrorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    /// The operation succeeded.
    Success,
    /// The operation succeeded without doing anything.
    NothingToDo,
    /// The operation failed.
    Error(ErrorKind),
}

/// A `{kind, message}` view of an operation's outcome.
///
/// Useful where outcomes are collected or reported rather than propagated with `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// The outcome kind.
    pub kind: StatusKind,
    /// An optional human-readable message (empty on success).
    pub message: String,
}

impl Status {
    /// Returns `true` unless the kind is [`StatusKind::Success`] or [`StatusKind::NothingToDo`].
    pub fn is_error(&self) -> bool {
        matches!(self.kind, StatusKind::Error(_))
    }
}

impl<T> From<&RenderResult<T>> for Status
where
    T: Copy + Into<Completion>,
{
    fn from(result: &RenderResult<T>) -> Self {
        match result {
            Ok(value) => match (*value).into() {
                Completion::Done => Status {
                    kind: StatusKind::Success,
                    message: String::new(),
                },
                Completion::NothingToDo => Status {
                    kind: StatusKind::NothingToDo,
                    message: String::new(),
                },
            },
            Err(err) => Status {
                kind: StatusKind::Error(err.kind),
                message: err.message.clone(),
            },
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            StatusKind::Success => f.write_str("SUCCESS"),
            StatusKind::NothingToDo => f.write_str("NOTHING_TO_DO"),
            StatusKind::Error(kind) => write!(f, "{kind}: {}", self.message),
        }
    }
}

/// The outcome of querying or waiting on a named signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalStatus {
    /// The fence is satisfied.
    Signalled,
    /// The fence is still pending (zero-timeout poll) or the wait failed.
    NotSignalled,
    /// The wait window elapsed with the fence still pending.
    TimedOut,
    /// No signal is registered under the name.
    UnknownSignal,
    /// The graphics context could not be made current.
    ContextError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_display() {
        let err = RenderError::unknown_source("No buffer called 'vertices'");
        assert_eq!(err.to_string(), "UNKNOWN_SOURCE: No buffer called 'vertices'");
    }

    #[test]
    fn test_render_error_context_keeps_kind() {
        let err = RenderError::broken_source("missing index buffer").context("draw 'quad'");
        assert_eq!(err.kind, ErrorKind::BrokenSource);
        assert_eq!(err.message, "draw 'quad': missing index buffer");
    }

    #[test]
    fn test_device_error_conversion() {
        let oob = DeviceError::OutOfBounds {
            offset: 8,
            size: 16,
            capacity: 16,
        };
        assert_eq!(RenderError::from(oob).kind, ErrorKind::RangeOverflow);

        let map = DeviceError::MappingFailed("not host visible".to_string());
        assert_eq!(RenderError::from(map).kind, ErrorKind::BackendFailure);

        let other = DeviceError::NotFound {
            object: "buffer",
            id: 3,
        };
        let err = RenderError::from(other);
        assert_eq!(err.kind, ErrorKind::BackendError);
        assert_eq!(err.message, "Device buffer not found for ID: 3");
    }

    #[test]
    fn test_device_error_display() {
        let err = DeviceError::OutOfBounds {
            offset: 4,
            size: 8,
            capacity: 10,
        };
        assert_eq!(
            err.to_string(),
            "Range [4, 4 + 8) is outside of an allocation of 10 bytes"
        );
    }

    #[test]
    fn test_status_from_results() {
        let done: RenderResult = Ok(Completion::Done);
        let noop: RenderResult = Ok(Completion::NothingToDo);
        let failed: RenderResult = Err(RenderError::duplicate_name("taken"));

        assert_eq!(Status::from(&done).kind, StatusKind::Success);
        assert!(!Status::from(&done).is_error());
        assert_eq!(Status::from(&noop).kind, StatusKind::NothingToDo);
        assert!(!Status::from(&noop).is_error());

        let status = Status::from(&failed);
        assert!(status.is_error());
        assert_eq!(status.kind, StatusKind::Error(ErrorKind::DuplicateName));
        assert_eq!(status.to_string(), "DUPLICATE_NAME: taken");
    }

    #[test]
    fn test_shader_error_display() {
        let err = ShaderError::CompilationError {
            label: "fragment".to_string(),
            details: "syntax error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Shader compilation failed for 'fragment': syntax error"
        );
    }
}
