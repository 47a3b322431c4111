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

//! The render command pipeline.
//!
//! The logic thread records rendering through a [`Renderer`], which turns
//! each validated call into a [`Command`] appended to the current
//! [`CommandBuffer`]. `present` moves the finished buffer to a
//! [`RenderDevice`], whose render thread executes it against a concrete
//! [`RenderBackend`] from the `tessel-infra` crate.

pub mod api;
pub mod device;
pub mod error;
pub mod frontend;
pub mod pacing;
pub mod traits;

pub use self::api::*;
pub use self::device::{DeviceEvent, DeviceState, RenderDevice, ShutdownMode};
pub use self::error::{ExecutionError, RenderError, ValidationError};
pub use self::frontend::Renderer;
pub use self::pacing::FrameSync;
pub use self::traits::{DeviceServices, RenderBackend, RenderTask};
