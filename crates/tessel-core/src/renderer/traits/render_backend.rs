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

use crate::math::{Extent2D, Rect};
use crate::platform::SurfaceHandle;
use crate::renderer::api::*;
use crate::renderer::error::{ExecutionError, RenderError};
use std::path::Path;

/// A concrete graphics driver, driven by the render device on the render thread.
///
/// The render device resolves every [`ResourceId`] before calling into the
/// backend, so implementations only ever see their own native objects. Each
/// associated type is an owning wrapper around native handles: it is dropped
/// when its resource is deleted or invalidated, and must release the native
/// object then.
///
/// Every method runs on the render thread. Returning
/// [`ExecutionError::DeviceLost`] from any of them makes the device invalidate
/// all resources, call [`recreate`](Self::recreate), rebuild every resource
/// from its retained description and retry the failed command once.
pub trait RenderBackend: Send + 'static {
    type RenderTarget: Send + 'static;
    type DepthStencilState: Send + 'static;
    type BlendState: Send + 'static;
    type Buffer: Send + 'static;
    type Shader: Send + 'static;
    type Texture: Send + 'static;

    /// The driver family this backend implements.
    fn driver(&self) -> Driver;

    /// Creates the native device/context. Runs on the thread that starts the
    /// render device, before the render thread exists.
    fn init(
        &mut self,
        surface: Option<&SurfaceHandle>,
        settings: &DeviceSettings,
    ) -> Result<(), RenderError>;

    /// Recreates the native device/context after a loss. Every resource has
    /// already been released when this is called.
    fn recreate(&mut self) -> Result<(), ExecutionError>;

    fn resize(&mut self, size: Extent2D) -> Result<(), ExecutionError>;

    /// Flips the back buffer.
    fn present(&mut self) -> Result<(), ExecutionError>;

    // --- Resource creation ---

    fn create_render_target(
        &mut self,
        id: ResourceId,
        desc: &RenderTargetDescriptor,
        color_textures: &[&Self::Texture],
        depth_texture: Option<&Self::Texture>,
    ) -> Result<Self::RenderTarget, ExecutionError>;

    fn create_depth_stencil_state(
        &mut self,
        id: ResourceId,
        desc: &DepthStencilStateDescriptor,
    ) -> Result<Self::DepthStencilState, ExecutionError>;

    fn create_blend_state(
        &mut self,
        id: ResourceId,
        desc: &BlendStateDescriptor,
    ) -> Result<Self::BlendState, ExecutionError>;

    fn create_buffer(
        &mut self,
        id: ResourceId,
        desc: &BufferDescriptor,
    ) -> Result<Self::Buffer, ExecutionError>;

    /// Builds a shader program. Compile failures are reported as
    /// [`ExecutionError::ShaderCompilation`].
    fn create_shader(
        &mut self,
        id: ResourceId,
        desc: &ShaderDescriptor,
    ) -> Result<Self::Shader, ExecutionError>;

    fn create_texture(
        &mut self,
        id: ResourceId,
        desc: &TextureDescriptor,
    ) -> Result<Self::Texture, ExecutionError>;

    /// Notification that the resource `id` was deleted. Its native object has
    /// already been dropped.
    fn resource_released(&mut self, _id: ResourceId) {}

    // --- Resource updates ---

    fn set_buffer_data(
        &mut self,
        buffer: &mut Self::Buffer,
        data: &[u8],
    ) -> Result<(), ExecutionError>;

    fn set_texture_data(
        &mut self,
        texture: &mut Self::Texture,
        levels: &[TextureLevel],
        face: CubeFace,
    ) -> Result<(), ExecutionError>;

    fn set_texture_parameters(
        &mut self,
        texture: &mut Self::Texture,
        params: &TextureParameters,
    ) -> Result<(), ExecutionError>;

    // --- Current state ---

    /// Selects the draw target; `None` selects the back buffer.
    fn set_render_target(
        &mut self,
        target: Option<&Self::RenderTarget>,
    ) -> Result<(), ExecutionError>;

    fn clear_render_target(&mut self, params: &ClearParams) -> Result<(), ExecutionError>;

    fn set_scissor_test(&mut self, enabled: bool, rect: Rect) -> Result<(), ExecutionError>;

    fn set_viewport(&mut self, viewport: Rect) -> Result<(), ExecutionError>;

    /// Binds a depth/stencil state; `None` restores the default state.
    fn set_depth_stencil_state(
        &mut self,
        state: Option<&Self::DepthStencilState>,
        stencil_reference: u32,
    ) -> Result<(), ExecutionError>;

    fn set_pipeline_state(
        &mut self,
        blend_state: Option<&Self::BlendState>,
        shader: Option<&Self::Shader>,
        cull_mode: CullMode,
        fill_mode: FillMode,
    ) -> Result<(), ExecutionError>;

    fn set_shader_constants(
        &mut self,
        fragment_constants: &[Vec<f32>],
        vertex_constants: &[Vec<f32>],
    ) -> Result<(), ExecutionError>;

    /// Binds textures to sequential units; `None` unbinds a unit.
    fn set_textures(&mut self, textures: &[Option<&Self::Texture>]) -> Result<(), ExecutionError>;

    // --- Drawing ---

    fn draw(
        &mut self,
        index_buffer: &Self::Buffer,
        vertex_buffer: &Self::Buffer,
        params: &DrawParams,
    ) -> Result<(), ExecutionError>;

    fn push_debug_marker(&mut self, _name: &str) -> Result<(), ExecutionError> {
        Ok(())
    }

    fn pop_debug_marker(&mut self) -> Result<(), ExecutionError> {
        Ok(())
    }

    // --- Housekeeping ---

    /// Writes the current back-buffer contents to `path`.
    fn generate_screenshot(&mut self, _path: &Path) -> Result<(), ExecutionError> {
        Err(ExecutionError::Unsupported("screenshot"))
    }

    /// Display resolutions the backend can switch to.
    fn supported_resolutions(&self) -> Vec<Extent2D> {
        Vec::new()
    }
}
