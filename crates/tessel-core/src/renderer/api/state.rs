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

//! Fixed-function pipeline state: blending, depth/stencil testing, rasterization.

use super::flags::ColorMask;

/// A multiplier applied to the source or destination color during blending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendFactor {
    Zero,
    #[default]
    One,
    SrcColor,
    InvSrcColor,
    SrcAlpha,
    InvSrcAlpha,
    DestAlpha,
    InvDestAlpha,
    DestColor,
    InvDestColor,
    SrcAlphaSat,
    BlendFactor,
    InvBlendFactor,
}

/// How the weighted source and destination colors are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendOperation {
    #[default]
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

/// A comparison used by depth and stencil tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunction {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    #[default]
    Always,
}

/// What happens to a stencil value after a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilOperation {
    #[default]
    Keep,
    Zero,
    Replace,
    IncrementClamp,
    DecrementClamp,
    Invert,
    IncrementWrap,
    DecrementWrap,
}

/// Which triangle faces are discarded before rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    #[default]
    NoCull,
    Front,
    Back,
}

/// How polygons are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FillMode {
    #[default]
    Solid,
    Wireframe,
}

/// The primitive topology of a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrawMode {
    PointList,
    LineList,
    LineStrip,
    #[default]
    TriangleList,
    TriangleStrip,
}

/// Full description of a blend state resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendStateDescriptor {
    /// Whether blending is enabled; when `false` the source color is written as is.
    pub enabled: bool,
    pub color_source: BlendFactor,
    pub color_destination: BlendFactor,
    pub color_operation: BlendOperation,
    pub alpha_source: BlendFactor,
    pub alpha_destination: BlendFactor,
    pub alpha_operation: BlendOperation,
    /// Channels written to the attachment.
    pub color_mask: ColorMask,
}

impl BlendStateDescriptor {
    /// Classic `src * a + dst * (1 - a)` alpha blending.
    pub const fn alpha_blend() -> Self {
        Self {
            enabled: true,
            color_source: BlendFactor::SrcAlpha,
            color_destination: BlendFactor::InvSrcAlpha,
            color_operation: BlendOperation::Add,
            alpha_source: BlendFactor::One,
            alpha_destination: BlendFactor::InvSrcAlpha,
            alpha_operation: BlendOperation::Add,
            color_mask: ColorMask::ALL,
        }
    }
}

impl Default for BlendStateDescriptor {
    /// Blending disabled, all channels written.
    fn default() -> Self {
        Self {
            enabled: false,
            color_source: BlendFactor::One,
            color_destination: BlendFactor::Zero,
            color_operation: BlendOperation::Add,
            alpha_source: BlendFactor::One,
            alpha_destination: BlendFactor::Zero,
            alpha_operation: BlendOperation::Add,
            color_mask: ColorMask::ALL,
        }
    }
}

/// Stencil test and operations for one face orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StencilFaceDescriptor {
    /// The operation to perform if the stencil test fails.
    pub failure: StencilOperation,
    /// The operation to perform if the stencil test passes but the depth test fails.
    pub depth_failure: StencilOperation,
    /// The operation to perform if both tests pass.
    pub pass: StencilOperation,
    /// The comparison used for the stencil test.
    pub compare: CompareFunction,
}

/// Full description of a depth/stencil state resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilStateDescriptor {
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_compare: CompareFunction,
    pub stencil_enabled: bool,
    pub stencil_read_mask: u32,
    pub stencil_write_mask: u32,
    pub front_face: StencilFaceDescriptor,
    pub back_face: StencilFaceDescriptor,
}

impl Default for DepthStencilStateDescriptor {
    fn default() -> Self {
        Self {
            depth_test: false,
            depth_write: false,
            depth_compare: CompareFunction::Always,
            stencil_enabled: false,
            stencil_read_mask: 0xFFFF_FFFF,
            stencil_write_mask: 0xFFFF_FFFF,
            front_face: StencilFaceDescriptor::default(),
            back_face: StencilFaceDescriptor::default(),
        }
    }
}
