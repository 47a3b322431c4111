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

use crate::renderer::api::ResourceId;
use crate::renderer::error::ExecutionError;

/// A dense map from [`ResourceId`] to render-thread resource entries.
///
/// Ids are allocated sequentially from `1`, so entry `id` lives at index
/// `id - 1`. The table is owned by the render thread and never shared.
#[derive(Debug)]
pub struct ResourceTable<T> {
    slots: Vec<Option<T>>,
    len: usize,
}

impl<T> ResourceTable<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            len: 0,
        }
    }

    /// Stores `entry` under `id`, returning the entry it replaces.
    ///
    /// The null id has no slot and is rejected.
    pub fn insert(&mut self, id: ResourceId, entry: T) -> Result<Option<T>, ExecutionError> {
        let index = id.index().ok_or(ExecutionError::UnknownResource(id))?;
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        let previous = self.slots[index].replace(entry);
        if previous.is_none() {
            self.len += 1;
        }
        Ok(previous)
    }

    pub fn get(&self, id: ResourceId) -> Result<&T, ExecutionError> {
        id.index()
            .and_then(|index| self.slots.get(index))
            .and_then(Option::as_ref)
            .ok_or(ExecutionError::UnknownResource(id))
    }

    pub fn get_mut(&mut self, id: ResourceId) -> Result<&mut T, ExecutionError> {
        id.index()
            .and_then(|index| self.slots.get_mut(index))
            .and_then(Option::as_mut)
            .ok_or(ExecutionError::UnknownResource(id))
    }

    /// Removes the entry of `id` and hands it back to the caller.
    pub fn remove(&mut self, id: ResourceId) -> Result<T, ExecutionError> {
        let entry = id
            .index()
            .and_then(|index| self.slots.get_mut(index))
            .and_then(Option::take)
            .ok_or(ExecutionError::UnknownResource(id))?;
        self.len -= 1;
        Ok(entry)
    }

    pub fn contains(&self, id: ResourceId) -> bool {
        self.get(id).is_ok()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Ids of the live entries, ascending.
    pub fn ids(&self) -> Vec<ResourceId> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Live entries with their ids, ascending.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|entry| (ResourceId(index + 1), entry)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ResourceId, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_mut().map(|entry| (ResourceId(index + 1), entry)))
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.len = 0;
    }
}

impl<T> Default for ResourceTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
