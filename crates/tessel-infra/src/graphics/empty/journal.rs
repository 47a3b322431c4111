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

use std::sync::{Arc, Mutex};
use tessel_core::math::{Extent2D, Rect};
use tessel_core::renderer::device::ResourceKind;
use tessel_core::renderer::{ClearParams, CubeFace, ResourceId};
use tessel_core::utils::sync::lock;

/// One operation executed by the empty backend.
#[derive(Debug, Clone, PartialEq)]
pub enum JournalEntry {
    Init { size: Extent2D },
    Recreate,
    Resize(Extent2D),
    Present,
    Created { id: ResourceId, kind: ResourceKind },
    Released(ResourceId),
    BufferData { buffer: ResourceId, len: usize },
    TextureData { texture: ResourceId, face: CubeFace },
    TextureParameters(ResourceId),
    RenderTarget(Option<ResourceId>),
    Clear(ClearParams),
    Scissor { enabled: bool, rect: Rect },
    Viewport(Rect),
    DepthStencilState { state: Option<ResourceId>, stencil_reference: u32 },
    PipelineState { blend_state: Option<ResourceId>, shader: Option<ResourceId> },
    ShaderConstants { fragment: usize, vertex: usize },
    Textures(Vec<Option<ResourceId>>),
    Draw { index_buffer: ResourceId, vertex_buffer: ResourceId, index_count: u32 },
    PushDebugMarker(String),
    PopDebugMarker,
}

/// A shared, append-only record of what an [`EmptyBackend`](super::EmptyBackend) executed.
///
/// Cloning yields another handle to the same record, so it can be read
/// from the logic thread while the backend lives on the render thread.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<JournalEntry>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, entry: JournalEntry) {
        lock(&self.entries)
            .push(entry);
    }

    /// A snapshot of every entry, oldest first.
    pub fn entries(&self) -> Vec<JournalEntry> {
        lock(&self.entries)
            .clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count(&self, predicate: impl Fn(&JournalEntry) -> bool) -> usize {
        lock(&self.entries)
            .iter()
            .filter(|entry| predicate(entry))
            .count()
    }

    /// Index of the first entry matching `predicate`.
    pub fn position(&self, predicate: impl Fn(&JournalEntry) -> bool) -> Option<usize> {
        lock(&self.entries)
            .iter()
            .position(predicate)
    }
}
