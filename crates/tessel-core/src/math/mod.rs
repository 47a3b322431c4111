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

//! Value types shared by commands: extents, rectangles and colors.
//!
//! The full math library lives outside the pipeline; commands only need these
//! plain, copyable values so they stay self-describing.

pub mod color;
pub mod dimension;
pub mod geometry;

pub use self::color::Color;
pub use self::dimension::Extent2D;
pub use self::geometry::Rect;
