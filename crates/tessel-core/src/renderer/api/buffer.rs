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

//! Defines data structures related to GPU buffer resources.

use super::flags::ResourceFlags;

/// What a buffer is bound as when drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferType {
    Index,
    Vertex,
}

/// A description from which a backend creates (and re-creates) a buffer.
///
/// `data` may be empty, in which case the backend allocates `size` bytes of
/// backend-defined (typically zeroed) storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDescriptor {
    pub buffer_type: BufferType,
    pub flags: ResourceFlags,
    /// Initial contents.
    pub data: Vec<u8>,
    /// Allocation size in bytes. Never smaller than `data.len()`.
    pub size: u32,
}

impl BufferDescriptor {
    /// A static buffer whose size is the length of `data`.
    pub fn with_data(buffer_type: BufferType, data: Vec<u8>) -> Self {
        let size = u32::try_from(data.len()).unwrap_or(u32::MAX);
        Self {
            buffer_type,
            flags: ResourceFlags::EMPTY,
            data,
            size,
        }
    }

    /// A dynamic buffer of `size` bytes with unspecified initial contents.
    pub fn dynamic(buffer_type: BufferType, size: u32) -> Self {
        Self {
            buffer_type,
            flags: ResourceFlags::DYNAMIC,
            data: Vec::new(),
            size,
        }
    }

    /// Whether the contents may be replaced after creation.
    pub fn is_dynamic(&self) -> bool {
        self.flags.contains(ResourceFlags::DYNAMIC)
    }
}
