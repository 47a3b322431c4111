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

//! Defines the `Color` value type carried by clear and sampler commands.

/// An RGBA color with normalized `f32` components.
///
/// `#[repr(C)]` keeps the layout stable so colors can be uploaded as raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Color {
    /// The red component.
    pub r: f32,
    /// The green component.
    pub g: f32,
    /// The blue component.
    pub b: f32,
    /// The alpha (opacity) component.
    pub a: f32,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Creates a color from explicit RGBA values.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color.
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Creates a color from a packed `0xRRGGBBAA` value.
    pub fn from_rgba_u32(packed: u32) -> Self {
        let channel = |shift: u32| ((packed >> shift) & 0xFF) as f32 / 255.0;
        Self::new(channel(24), channel(16), channel(8), channel(0))
    }

    /// Quantizes the color to 8-bit RGBA, clamping out-of-range components.
    pub fn to_rgba8(&self) -> [u8; 4] {
        let quantize = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [
            quantize(self.r),
            quantize(self.g),
            quantize(self.b),
            quantize(self.a),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn packed_round_trip_through_rgba8() {
        let color = Color::from_rgba_u32(0x3366_99FF);
        assert_relative_eq!(color.r, 0x33 as f32 / 255.0);
        assert_eq!(color.to_rgba8(), [0x33, 0x66, 0x99, 0xFF]);
    }

    #[test]
    fn hdr_components_are_clamped_when_quantized() {
        let color = Color::new(2.0, -1.0, 0.5, 1.0);
        assert_eq!(color.to_rgba8(), [255, 0, 128, 255]);
    }

    #[test]
    fn color_is_plain_bytes() {
        let colors = [Color::WHITE, Color::BLACK];
        let bytes: &[u8] = bytemuck::cast_slice(&colors);
        assert_eq!(bytes.len(), 32);
    }
}
