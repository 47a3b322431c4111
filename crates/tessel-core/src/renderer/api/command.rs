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

//! The closed set of instructions the renderer sends to the render device.
//!
//! Every [`Command`] is an owned value: it carries all the data needed to
//! replay it later on another thread, and never borrows from the renderer.
//! Resources are referenced only through [`ResourceId`]s. State-setting
//! commands are deltas applied to the device's current state and stay in
//! effect for every following draw of the stream until overridden.

use super::buffer::BufferDescriptor;
use super::resource::ResourceId;
use super::shader::ShaderDescriptor;
use super::state::{
    BlendStateDescriptor, CullMode, DepthStencilStateDescriptor, DrawMode, FillMode,
};
use super::texture::{
    CubeFace, RenderTargetDescriptor, TextureDescriptor, TextureLevel, TextureParameters,
};
use crate::math::{Color, Extent2D, Rect};
use std::fmt;

/// Parameters of an indexed draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawParams {
    /// The index buffer to read indices from. Never null.
    pub index_buffer: ResourceId,
    /// Number of indices to draw.
    pub index_count: u32,
    /// Size of one index in bytes (1, 2 or 4).
    pub index_size: u32,
    /// The vertex buffer to fetch vertices from. Never null.
    pub vertex_buffer: ResourceId,
    pub draw_mode: DrawMode,
    /// First index to read.
    pub start_index: u32,
}

/// What a render-target clear touches and with which values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearParams {
    pub clear_color_buffer: bool,
    pub clear_depth_buffer: bool,
    pub clear_stencil_buffer: bool,
    pub color: Color,
    pub depth: f32,
    pub stencil: u32,
}

impl Default for ClearParams {
    fn default() -> Self {
        Self {
            clear_color_buffer: true,
            clear_depth_buffer: false,
            clear_stencil_buffer: false,
            color: Color::BLACK,
            depth: 1.0,
            stencil: 0,
        }
    }
}

/// One immutable, self-contained instruction of the render stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// The back buffer changed size.
    Resize { size: Extent2D },
    /// Ends the frame: the device flips after all prior commands.
    Present,
    /// Releases every native object associated with `resource`.
    DeleteResource { resource: ResourceId },

    InitRenderTarget {
        render_target: ResourceId,
        desc: RenderTargetDescriptor,
    },
    /// Selects the target of subsequent draws; null selects the back buffer.
    SetRenderTarget { render_target: ResourceId },
    ClearRenderTarget(ClearParams),
    SetScissorTest { enabled: bool, rect: Rect },
    SetViewport { viewport: Rect },

    InitDepthStencilState {
        depth_stencil_state: ResourceId,
        desc: DepthStencilStateDescriptor,
    },
    /// Binds a depth/stencil state; null restores the default state.
    SetDepthStencilState {
        depth_stencil_state: ResourceId,
        stencil_reference: u32,
    },
    SetPipelineState {
        blend_state: ResourceId,
        shader: ResourceId,
        cull_mode: CullMode,
        fill_mode: FillMode,
    },
    Draw(DrawParams),

    InitBlendState {
        blend_state: ResourceId,
        desc: BlendStateDescriptor,
    },
    InitBuffer {
        buffer: ResourceId,
        desc: BufferDescriptor,
    },
    SetBufferData { buffer: ResourceId, data: Vec<u8> },

    InitShader {
        shader: ResourceId,
        desc: ShaderDescriptor,
    },
    /// Per-stage constant values, bound positionally to the declared slots.
    SetShaderConstants {
        fragment_constants: Vec<Vec<f32>>,
        vertex_constants: Vec<Vec<f32>>,
    },

    InitTexture {
        texture: ResourceId,
        desc: TextureDescriptor,
    },
    SetTextureData {
        texture: ResourceId,
        levels: Vec<TextureLevel>,
        face: CubeFace,
    },
    SetTextureParameters {
        texture: ResourceId,
        params: TextureParameters,
    },
    /// Binds textures to sequential units; a null id unbinds its unit.
    SetTextures { textures: Vec<ResourceId> },

    PushDebugMarker { name: String },
    PopDebugMarker,
}

/// The tag of a [`Command`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Resize,
    Present,
    DeleteResource,
    InitRenderTarget,
    SetRenderTarget,
    ClearRenderTarget,
    SetScissorTest,
    SetViewport,
    InitDepthStencilState,
    SetDepthStencilState,
    SetPipelineState,
    Draw,
    InitBlendState,
    InitBuffer,
    SetBufferData,
    InitShader,
    SetShaderConstants,
    InitTexture,
    SetTextureData,
    SetTextureParameters,
    SetTextures,
    PushDebugMarker,
    PopDebugMarker,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Command {
    /// The tag of this command.
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Resize { .. } => CommandKind::Resize,
            Command::Present => CommandKind::Present,
            Command::DeleteResource { .. } => CommandKind::DeleteResource,
            Command::InitRenderTarget { .. } => CommandKind::InitRenderTarget,
            Command::SetRenderTarget { .. } => CommandKind::SetRenderTarget,
            Command::ClearRenderTarget(_) => CommandKind::ClearRenderTarget,
            Command::SetScissorTest { .. } => CommandKind::SetScissorTest,
            Command::SetViewport { .. } => CommandKind::SetViewport,
            Command::InitDepthStencilState { .. } => CommandKind::InitDepthStencilState,
            Command::SetDepthStencilState { .. } => CommandKind::SetDepthStencilState,
            Command::SetPipelineState { .. } => CommandKind::SetPipelineState,
            Command::Draw(_) => CommandKind::Draw,
            Command::InitBlendState { .. } => CommandKind::InitBlendState,
            Command::InitBuffer { .. } => CommandKind::InitBuffer,
            Command::SetBufferData { .. } => CommandKind::SetBufferData,
            Command::InitShader { .. } => CommandKind::InitShader,
            Command::SetShaderConstants { .. } => CommandKind::SetShaderConstants,
            Command::InitTexture { .. } => CommandKind::InitTexture,
            Command::SetTextureData { .. } => CommandKind::SetTextureData,
            Command::SetTextureParameters { .. } => CommandKind::SetTextureParameters,
            Command::SetTextures { .. } => CommandKind::SetTextures,
            Command::PushDebugMarker { .. } => CommandKind::PushDebugMarker,
            Command::PopDebugMarker => CommandKind::PopDebugMarker,
        }
    }

    /// The id a resource-creating command initializes, if any.
    pub fn initialized_resource(&self) -> Option<ResourceId> {
        match self {
            Command::InitRenderTarget { render_target: id, .. }
            | Command::InitDepthStencilState {
                depth_stencil_state: id,
                ..
            }
            | Command::InitBlendState { blend_state: id, .. }
            | Command::InitBuffer { buffer: id, .. }
            | Command::InitShader { shader: id, .. }
            | Command::InitTexture { texture: id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Every non-null resource id this command reads, writes or releases,
    /// including the one it initializes.
    pub fn referenced_resources(&self) -> Vec<ResourceId> {
        let ids: Vec<ResourceId> = match self {
            Command::Resize { .. }
            | Command::Present
            | Command::ClearRenderTarget(_)
            | Command::SetScissorTest { .. }
            | Command::SetViewport { .. }
            | Command::SetShaderConstants { .. }
            | Command::PushDebugMarker { .. }
            | Command::PopDebugMarker => Vec::new(),
            Command::DeleteResource { resource } => vec![*resource],
            Command::InitRenderTarget { render_target, desc } => std::iter::once(*render_target)
                .chain(desc.attachments())
                .collect(),
            Command::SetRenderTarget { render_target } => vec![*render_target],
            Command::InitDepthStencilState {
                depth_stencil_state,
                ..
            }
            | Command::SetDepthStencilState {
                depth_stencil_state,
                ..
            } => vec![*depth_stencil_state],
            Command::SetPipelineState {
                blend_state,
                shader,
                ..
            } => vec![*blend_state, *shader],
            Command::Draw(params) => vec![params.index_buffer, params.vertex_buffer],
            Command::InitBlendState { blend_state, .. } => vec![*blend_state],
            Command::InitBuffer { buffer, .. } | Command::SetBufferData { buffer, .. } => {
                vec![*buffer]
            }
            Command::InitShader { shader, .. } => vec![*shader],
            Command::InitTexture { texture, .. }
            | Command::SetTextureData { texture, .. }
            | Command::SetTextureParameters { texture, .. } => vec![*texture],
            Command::SetTextures { textures } => textures.clone(),
        };
        ids.into_iter().filter(|id| !id.is_null()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::buffer::BufferType;

    fn draw(index_buffer: usize, vertex_buffer: usize) -> Command {
        Command::Draw(DrawParams {
            index_buffer: ResourceId(index_buffer),
            index_count: 6,
            index_size: 2,
            vertex_buffer: ResourceId(vertex_buffer),
            draw_mode: DrawMode::TriangleList,
            start_index: 0,
        })
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(Command::Present.kind(), CommandKind::Present);
        assert_eq!(draw(1, 2).kind(), CommandKind::Draw);
        assert_eq!(
            Command::PushDebugMarker {
                name: "ui".into()
            }
            .kind()
            .to_string(),
            "PushDebugMarker"
        );
    }

    #[test]
    fn referenced_resources_skip_null_ids() {
        assert_eq!(draw(1, 2).referenced_resources(), vec![ResourceId(1), ResourceId(2)]);
        let bind = Command::SetTextures {
            textures: vec![ResourceId(4), ResourceId::NULL, ResourceId(5)],
        };
        assert_eq!(bind.referenced_resources(), vec![ResourceId(4), ResourceId(5)]);
        assert!(Command::Present.referenced_resources().is_empty());
    }

    #[test]
    fn render_target_init_references_its_attachments() {
        let mut desc = RenderTargetDescriptor::default();
        desc.color_textures.insert(ResourceId(2));
        desc.depth_texture = ResourceId(3);
        let cmd = Command::InitRenderTarget {
            render_target: ResourceId(1),
            desc,
        };
        assert_eq!(cmd.initialized_resource(), Some(ResourceId(1)));
        assert_eq!(
            cmd.referenced_resources(),
            vec![ResourceId(1), ResourceId(2), ResourceId(3)]
        );
    }

    #[test]
    fn only_init_commands_initialize() {
        assert_eq!(draw(1, 2).initialized_resource(), None);
        let cmd = Command::InitBuffer {
            buffer: ResourceId(8),
            desc: BufferDescriptor::dynamic(BufferType::Vertex, 16),
        };
        assert_eq!(cmd.initialized_resource(), Some(ResourceId(8)));
    }

    #[test]
    fn commands_are_owned_values() {
        let original = Command::SetBufferData {
            buffer: ResourceId(1),
            data: vec![1, 2, 3],
        };
        let replay = original.clone();
        drop(original);
        assert_eq!(
            replay,
            Command::SetBufferData {
                buffer: ResourceId(1),
                data: vec![1, 2, 3]
            }
        );
    }
}
