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

//! Defines data structures for textures, samplers and render targets.

use super::flags::ResourceFlags;
use super::resource::ResourceId;
use crate::math::{Color, Extent2D};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The dimensionality of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureType {
    OneDimensional,
    #[default]
    TwoDimensional,
    ThreeDimensional,
    Cube,
}

/// The memory layout of a texel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    A8UnsignedNorm,
    R8UnsignedNorm,
    R8SignedNorm,
    R16Float,
    R32Float,
    Rg8UnsignedNorm,
    Rg8SignedNorm,
    #[default]
    Rgba8UnsignedNorm,
    Rgba8UnsignedNormSrgb,
    Rgba8SignedNorm,
    Rgba16Float,
    Rgba32Float,
    Depth,
    DepthStencil,
}

impl PixelFormat {
    /// Size of one texel in bytes.
    pub const fn bytes_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::A8UnsignedNorm
            | PixelFormat::R8UnsignedNorm
            | PixelFormat::R8SignedNorm => 1,
            PixelFormat::R16Float | PixelFormat::Rg8UnsignedNorm | PixelFormat::Rg8SignedNorm => 2,
            PixelFormat::R32Float
            | PixelFormat::Rgba8UnsignedNorm
            | PixelFormat::Rgba8UnsignedNormSrgb
            | PixelFormat::Rgba8SignedNorm
            | PixelFormat::Depth
            | PixelFormat::DepthStencil => 4,
            PixelFormat::Rgba16Float => 8,
            PixelFormat::Rgba32Float => 16,
        }
    }

    /// `true` for formats that can only back a depth attachment.
    pub const fn is_depth(&self) -> bool {
        matches!(self, PixelFormat::Depth | PixelFormat::DepthStencil)
    }
}

/// Texture minification/magnification filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplerFilter {
    Point,
    #[default]
    Linear,
    Bilinear,
    Trilinear,
}

/// How texture coordinates outside `[0, 1]` are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SamplerAddressMode {
    #[default]
    ClampToEdge,
    ClampToBorder,
    Repeat,
    MirrorRepeat,
}

/// A face of a cube map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CubeFace {
    #[default]
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

/// One mip level: its extent and its texel bytes.
///
/// An empty `data` means storage is allocated without initial contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureLevel {
    pub size: Extent2D,
    pub data: Vec<u8>,
}

impl TextureLevel {
    pub fn new(size: Extent2D, data: Vec<u8>) -> Self {
        Self { size, data }
    }

    /// A level with no initial contents.
    pub fn empty(size: Extent2D) -> Self {
        Self {
            size,
            data: Vec::new(),
        }
    }
}

/// Full description of a texture resource.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDescriptor {
    /// Mip chain, largest level first. Never empty.
    pub levels: Vec<TextureLevel>,
    pub texture_type: TextureType,
    pub flags: ResourceFlags,
    pub sample_count: u32,
    pub pixel_format: PixelFormat,
    pub filter: SamplerFilter,
    pub max_anisotropy: u32,
}

impl TextureDescriptor {
    /// A single-level, single-sample 2D texture.
    pub fn new_2d(size: Extent2D, pixel_format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            levels: vec![TextureLevel::new(size, data)],
            texture_type: TextureType::TwoDimensional,
            flags: ResourceFlags::EMPTY,
            sample_count: 1,
            pixel_format,
            filter: SamplerFilter::default(),
            max_anisotropy: 0,
        }
    }

    /// Extent of the base level.
    pub fn size(&self) -> Extent2D {
        self.levels.first().map(|level| level.size).unwrap_or_default()
    }

    /// Whether the contents may be replaced after creation.
    pub fn is_dynamic(&self) -> bool {
        self.flags.contains(ResourceFlags::DYNAMIC)
    }
}

/// Sampler parameters that can be changed after a texture exists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureParameters {
    pub filter: SamplerFilter,
    pub address_x: SamplerAddressMode,
    pub address_y: SamplerAddressMode,
    pub address_z: SamplerAddressMode,
    pub border_color: Color,
    pub max_anisotropy: u32,
}

impl Default for TextureParameters {
    fn default() -> Self {
        Self {
            filter: SamplerFilter::default(),
            address_x: SamplerAddressMode::ClampToEdge,
            address_y: SamplerAddressMode::ClampToEdge,
            address_z: SamplerAddressMode::ClampToEdge,
            border_color: Color::BLACK,
            max_anisotropy: 0,
        }
    }
}

/// Attachments of an offscreen render target.
///
/// Color textures form an ordered set: each id appears once and attachment
/// slots follow ascending id order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderTargetDescriptor {
    pub color_textures: BTreeSet<ResourceId>,
    /// Null when the target has no depth attachment.
    pub depth_texture: ResourceId,
}

impl RenderTargetDescriptor {
    /// Every texture id this target attaches, colors first.
    pub fn attachments(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.color_textures
            .iter()
            .copied()
            .chain((!self.depth_texture.is_null()).then_some(self.depth_texture))
    }
}
