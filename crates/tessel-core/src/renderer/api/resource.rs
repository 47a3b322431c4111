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

//! Resource handles shared by the renderer and the render device.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// An opaque handle to a GPU-side object, valid across the thread boundary.
///
/// Ids are allocated on the logic thread and resolved on the render thread.
/// The value `0` is the null sentinel and never identifies a live resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ResourceId(pub usize);

impl ResourceId {
    /// The null handle: "no resource".
    pub const NULL: Self = Self(0);

    /// Returns `true` for the null handle.
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// The raw integer value of the handle.
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Slot of this id in a dense table, `None` for the null handle.
    pub const fn index(&self) -> Option<usize> {
        match self.0 {
            0 => None,
            n => Some(n - 1),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A monotonically increasing, thread-safe id allocator.
///
/// Ids are never recycled, so a handle stays unique for the lifetime of the
/// device that owns the allocator. Both the renderer and diagnostic code on
/// the render thread share it through an `Arc`.
#[derive(Debug)]
pub struct ResourceIdAllocator {
    next: AtomicUsize,
}

impl ResourceIdAllocator {
    /// Creates an allocator whose first id is `1`.
    pub fn new() -> Self {
        Self {
            next: AtomicUsize::new(1),
        }
    }

    /// Returns a fresh, never-before-seen id.
    pub fn allocate(&self) -> ResourceId {
        ResourceId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Number of ids handed out so far.
    pub fn allocated_count(&self) -> usize {
        self.next.load(Ordering::Relaxed) - 1
    }
}

impl Default for ResourceIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn null_id_has_no_slot() {
        assert!(ResourceId::NULL.is_null());
        assert_eq!(ResourceId::NULL.index(), None);
        assert_eq!(ResourceId(3).index(), Some(2));
        assert_eq!(ResourceId::default(), ResourceId::NULL);
    }

    #[test]
    fn allocation_starts_at_one_and_increases() {
        let allocator = ResourceIdAllocator::new();
        assert_eq!(allocator.allocated_count(), 0);
        assert_eq!(allocator.allocate(), ResourceId(1));
        assert_eq!(allocator.allocate(), ResourceId(2));
        assert_eq!(allocator.allocated_count(), 2);
    }

    #[test]
    fn concurrent_allocation_never_duplicates() {
        let allocator = Arc::new(ResourceIdAllocator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let allocator = Arc::clone(&allocator);
                thread::spawn(move || (0..250).map(|_| allocator.allocate()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(!id.is_null());
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 1000);
        assert_eq!(allocator.allocated_count(), 1000);
    }
}
