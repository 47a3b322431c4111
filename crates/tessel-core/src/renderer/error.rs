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

//! Defines the hierarchy of error types for the rendering subsystem.

use crate::renderer::api::driver::Driver;
use crate::renderer::api::resource::ResourceId;
use std::fmt;

/// A programmer error caught on the logic thread before any command is queued.
///
/// These are never retried: they point at a bug in the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A resource id that must reference a live resource was null.
    NullResource {
        /// The renderer operation that was called.
        operation: &'static str,
        /// The offending argument.
        argument: &'static str,
    },
    /// An argument was out of range or inconsistent.
    InvalidArgument {
        /// The renderer operation that was called.
        operation: &'static str,
        /// What is wrong with the argument.
        reason: String,
    },
    /// A driver name that matches no known driver.
    InvalidDriver(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NullResource {
                operation,
                argument,
            } => write!(f, "{operation}: {argument} must not be a null resource"),
            ValidationError::InvalidArgument { operation, reason } => {
                write!(f, "{operation}: invalid argument: {reason}")
            }
            ValidationError::InvalidDriver(name) => write!(f, "Invalid graphics driver '{name}'"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// A failure of one command on the render thread.
///
/// The command's effect is skipped and execution continues with the next one;
/// only [`ExecutionError::DeviceLost`] triggers a recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// The command referenced an id with no live resource.
    UnknownResource(ResourceId),
    /// The id exists but names a resource of another kind.
    ResourceTypeMismatch {
        /// The id that was resolved.
        id: ResourceId,
        /// The kind the command needed.
        expected: &'static str,
        /// The kind found in the resource table.
        found: &'static str,
    },
    /// The backend rejected a shader program.
    ShaderCompilation {
        /// The shader being built.
        shader: ResourceId,
        /// Compiler diagnostics.
        details: String,
    },
    /// The backend does not implement the requested operation.
    Unsupported(&'static str),
    /// Any other native API failure.
    Backend(String),
    /// The native device or context was lost.
    DeviceLost,
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::UnknownResource(id) => write!(f, "Unknown resource {id}"),
            ExecutionError::ResourceTypeMismatch {
                id,
                expected,
                found,
            } => write!(f, "Resource {id} is a {found}, expected a {expected}"),
            ExecutionError::ShaderCompilation { shader, details } => {
                write!(f, "Shader {shader} failed to compile: {details}")
            }
            ExecutionError::Unsupported(operation) => {
                write!(f, "Operation not supported by this backend: {operation}")
            }
            ExecutionError::Backend(msg) => write!(f, "Backend error: {msg}"),
            ExecutionError::DeviceLost => write!(f, "The render device was lost"),
        }
    }
}

impl std::error::Error for ExecutionError {}

/// Top-level error of the rendering subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The configured driver name is not recognized.
    InvalidDriver(String),
    /// The driver is known but not compiled in or not supported here.
    DriverUnavailable(Driver),
    /// The backend failed to create its native device or context.
    InitializationFailed(String),
    /// A renderer call was rejected before queuing anything.
    Validation(ValidationError),
    /// The render device has shut down and accepts no more work.
    DeviceStopped,
    /// Rebuilding resources after a device loss failed.
    ReloadFailed(ExecutionError),
    /// The render thread could not be started.
    ThreadSpawn(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::InvalidDriver(name) => write!(f, "Invalid graphics driver '{name}'"),
            RenderError::DriverUnavailable(driver) => {
                write!(f, "Graphics driver '{driver}' is not available")
            }
            RenderError::InitializationFailed(msg) => {
                write!(f, "Render device initialization failed: {msg}")
            }
            RenderError::Validation(err) => write!(f, "Validation error: {err}"),
            RenderError::DeviceStopped => write!(f, "The render device is stopped"),
            RenderError::ReloadFailed(err) => write!(f, "Device reload failed: {err}"),
            RenderError::ThreadSpawn(msg) => write!(f, "Failed to spawn render thread: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Validation(err) => Some(err),
            RenderError::ReloadFailed(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RenderError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidDriver(name) => RenderError::InvalidDriver(name),
            other => RenderError::Validation(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn invalid_driver_is_promoted() {
        let err: RenderError = ValidationError::InvalidDriver("glide".into()).into();
        assert_eq!(err, RenderError::InvalidDriver("glide".into()));
        assert_eq!(err.to_string(), "Invalid graphics driver 'glide'");
    }

    #[test]
    fn validation_errors_keep_their_source() {
        let err: RenderError = ValidationError::NullResource {
            operation: "draw",
            argument: "vertex_buffer",
        }
        .into();
        assert!(matches!(err, RenderError::Validation(_)));
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("draw: vertex_buffer must not be a null resource".to_owned())
        );
    }

    #[test]
    fn execution_error_messages_name_the_resource() {
        assert_eq!(
            ExecutionError::UnknownResource(ResourceId(5)).to_string(),
            "Unknown resource #5"
        );
        let mismatch = ExecutionError::ResourceTypeMismatch {
            id: ResourceId(2),
            expected: "buffer",
            found: "texture",
        };
        assert_eq!(mismatch.to_string(), "Resource #2 is a texture, expected a buffer");
    }
}
