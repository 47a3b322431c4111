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

use std::sync::Arc;

/// Lifecycle notifications emitted by the render thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceEvent {
    /// A `Present` command was executed.
    Frame,
    /// The native device was lost; resources are being rebuilt.
    DeviceLost,
    /// Every resource was rebuilt after a loss.
    DeviceRestored,
}

/// The frontend-supplied receiver of [`DeviceEvent`]s, called on the render thread.
pub type EventCallback = Arc<dyn Fn(DeviceEvent) + Send + Sync + 'static>;

/// The lifecycle state of a render device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceState {
    /// Created, native context not yet set up.
    Constructed,
    /// Native context ready, render thread not yet running.
    Initialized,
    /// Executing submitted command buffers.
    Running,
    /// Rebuilding resources after a device loss.
    Reloading,
    /// Shut down; no further work is accepted.
    Stopped,
}
