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

//! Pixel extents for back buffers, textures and mip levels.

use serde::{Deserialize, Serialize};

/// A two-dimensional extent in pixels.
///
/// Sizes are unsigned; a zero extent is valid and describes an empty surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Extent2D {
    /// The width component of the extent.
    pub width: u32,
    /// The height component of the extent.
    pub height: u32,
}

impl Extent2D {
    /// Creates a new extent.
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels covered by the extent.
    #[inline]
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// `true` if either dimension is zero.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_does_not_overflow_u32() {
        let size = Extent2D::new(u32::MAX, 2);
        assert_eq!(size.area(), u32::MAX as u64 * 2);
    }

    #[test]
    fn empty_when_any_side_is_zero() {
        assert!(Extent2D::new(0, 10).is_empty());
        assert!(Extent2D::default().is_empty());
        assert!(!Extent2D::new(1, 1).is_empty());
    }
}
