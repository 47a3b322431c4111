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

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tessel_core::math::{Color, Extent2D};
use tessel_core::renderer::ExecutionError;

/// A CPU-side RGBA8 back buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    size: Extent2D,
    pixels: Vec<u8>,
}

impl Framebuffer {
    pub fn new(size: Extent2D) -> Self {
        Self {
            size,
            pixels: vec![0; Self::byte_len(size)],
        }
    }

    fn byte_len(size: Extent2D) -> usize {
        size.width as usize * size.height as usize * 4
    }

    pub fn size(&self) -> Extent2D {
        self.size
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Reallocates the buffer, discarding its contents.
    pub fn resize(&mut self, size: Extent2D) {
        self.size = size;
        self.pixels = vec![0; Self::byte_len(size)];
    }

    pub fn fill(&mut self, color: Color) {
        let texel = color.to_rgba8();
        for pixel in self.pixels.chunks_exact_mut(4) {
            pixel.copy_from_slice(&texel);
        }
    }

    /// The pixel at (`x`, `y`), if inside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let offset = (y as usize * self.size.width as usize + x as usize) * 4;
        let mut texel = [0; 4];
        texel.copy_from_slice(&self.pixels[offset..offset + 4]);
        Some(texel)
    }

    /// Encodes the buffer as an 8-bit RGBA PNG.
    pub fn write_png(&self, path: &Path) -> Result<(), ExecutionError> {
        if self.size.is_empty() {
            return Err(ExecutionError::Backend(
                "cannot capture an empty back buffer".to_owned(),
            ));
        }
        let file = File::create(path).map_err(|e| {
            ExecutionError::Backend(format!("failed to create {}: {e}", path.display()))
        })?;
        let mut encoder =
            png::Encoder::new(BufWriter::new(file), self.size.width, self.size.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| ExecutionError::Backend(format!("failed to encode screenshot: {e}")))?;
        writer
            .write_image_data(&self.pixels)
            .map_err(|e| ExecutionError::Backend(format!("failed to encode screenshot: {e}")))?;
        writer
            .finish()
            .map_err(|e| ExecutionError::Backend(format!("failed to encode screenshot: {e}")))
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Framebuffer::new(Extent2D::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_writes_every_pixel() {
        let mut framebuffer = Framebuffer::new(Extent2D::new(3, 2));
        framebuffer.fill(Color::from_rgba_u32(0x1020_30FF));
        assert_eq!(framebuffer.pixel(0, 0), Some([0x10, 0x20, 0x30, 0xFF]));
        assert_eq!(framebuffer.pixel(2, 1), Some([0x10, 0x20, 0x30, 0xFF]));
        assert_eq!(framebuffer.pixel(3, 0), None);
    }

    #[test]
    fn resize_discards_contents() {
        let mut framebuffer = Framebuffer::new(Extent2D::new(2, 2));
        framebuffer.fill(Color::WHITE);
        framebuffer.resize(Extent2D::new(4, 1));
        assert_eq!(framebuffer.pixels().len(), 16);
        assert_eq!(framebuffer.pixel(3, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn empty_buffer_cannot_be_captured() {
        let dir = tempfile::tempdir().unwrap();
        let framebuffer = Framebuffer::new(Extent2D::new(0, 0));
        assert!(framebuffer.write_png(&dir.path().join("shot.png")).is_err());
    }
}
