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

use crate::renderer::api::{Driver, FrameStats, ResourceId};
use crate::renderer::error::ExecutionError;
use std::path::Path;

/// Render-thread facilities available to housekeeping tasks.
///
/// Tasks run between command buffers, never in the middle of one, so they
/// observe the device in a consistent state.
pub trait DeviceServices {
    fn driver(&self) -> Driver;

    /// Writes the current back-buffer contents to `path`.
    fn generate_screenshot(&mut self, path: &Path) -> Result<(), ExecutionError>;

    /// Whether `id` has an entry in the resource table.
    fn contains_resource(&self, id: ResourceId) -> bool;

    /// Ids of every live resource, ascending.
    fn live_resources(&self) -> Vec<ResourceId>;

    /// A snapshot of the execution statistics.
    fn stats(&self) -> FrameStats;
}

/// A low-priority closure executed on the render thread outside the command stream.
pub type RenderTask = Box<dyn FnOnce(&mut dyn DeviceServices) + Send + 'static>;
