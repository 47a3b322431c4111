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

use super::framebuffer::Framebuffer;
use super::journal::{Journal, JournalEntry};
use super::resources::{EmptyBuffer, EmptyRenderTarget, EmptyShader, EmptyState, EmptyTexture};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tessel_core::math::{Extent2D, Rect};
use tessel_core::platform::SurfaceHandle;
use tessel_core::renderer::device::ResourceKind;
use tessel_core::renderer::*;

/// Arms a simulated device loss on an [`EmptyBackend`].
///
/// The next draw or present after [`trigger`](Self::trigger) reports
/// [`ExecutionError::DeviceLost`], once.
#[derive(Debug, Clone, Default)]
pub struct DeviceLossTrigger {
    armed: Arc<AtomicBool>,
}

impl DeviceLossTrigger {
    pub fn trigger(&self) {
        self.armed.store(true, Ordering::Release);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    fn take(&self) -> bool {
        self.armed.swap(false, Ordering::AcqRel)
    }
}

/// The `empty` driver.
#[derive(Debug, Default)]
pub struct EmptyBackend {
    journal: Journal,
    loss: DeviceLossTrigger,
    settings: DeviceSettings,
    framebuffer: Framebuffer,
    render_target: Option<ResourceId>,
    context_generation: u32,
}

impl EmptyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle to the record of executed operations.
    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    pub fn device_loss_trigger(&self) -> DeviceLossTrigger {
        self.loss.clone()
    }

    /// How many times the native context was (re)created.
    pub fn context_generation(&self) -> u32 {
        self.context_generation
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    fn check_device(&self) -> Result<(), ExecutionError> {
        if self.loss.take() {
            log::warn!("Empty device reports a simulated device loss");
            return Err(ExecutionError::DeviceLost);
        }
        Ok(())
    }

    fn created(&self, id: ResourceId, kind: ResourceKind) {
        self.journal.push(JournalEntry::Created { id, kind });
    }
}

impl RenderBackend for EmptyBackend {
    type RenderTarget = EmptyRenderTarget;
    type DepthStencilState = EmptyState;
    type BlendState = EmptyState;
    type Buffer = EmptyBuffer;
    type Shader = EmptyShader;
    type Texture = EmptyTexture;

    fn driver(&self) -> Driver {
        Driver::Empty
    }

    fn init(
        &mut self,
        surface: Option<&SurfaceHandle>,
        settings: &DeviceSettings,
    ) -> Result<(), RenderError> {
        if settings.sample_count == 0 {
            return Err(RenderError::InitializationFailed(
                "sample count must be at least 1".to_owned(),
            ));
        }
        log::debug!(
            "Initializing empty render device ({}x{}, {})",
            settings.size.width,
            settings.size.height,
            if surface.is_some() { "windowed" } else { "headless" }
        );
        self.settings = settings.clone();
        self.framebuffer = Framebuffer::new(settings.size);
        self.context_generation = 1;
        self.journal.push(JournalEntry::Init {
            size: settings.size,
        });
        Ok(())
    }

    fn recreate(&mut self) -> Result<(), ExecutionError> {
        self.framebuffer = Framebuffer::new(self.framebuffer.size());
        self.render_target = None;
        self.context_generation += 1;
        self.journal.push(JournalEntry::Recreate);
        Ok(())
    }

    fn resize(&mut self, size: Extent2D) -> Result<(), ExecutionError> {
        self.settings.size = size;
        self.framebuffer.resize(size);
        self.journal.push(JournalEntry::Resize(size));
        Ok(())
    }

    fn present(&mut self) -> Result<(), ExecutionError> {
        self.check_device()?;
        self.journal.push(JournalEntry::Present);
        Ok(())
    }

    fn create_render_target(
        &mut self,
        id: ResourceId,
        _desc: &RenderTargetDescriptor,
        color_textures: &[&EmptyTexture],
        depth_texture: Option<&EmptyTexture>,
    ) -> Result<EmptyRenderTarget, ExecutionError> {
        if let Some(texture) = color_textures.iter().find(|t| t.pixel_format.is_depth()) {
            return Err(ExecutionError::Backend(format!(
                "texture {} has a depth format and cannot be a color attachment",
                texture.id
            )));
        }
        if let Some(texture) = depth_texture.filter(|t| !t.pixel_format.is_depth()) {
            return Err(ExecutionError::Backend(format!(
                "texture {} is not a depth texture",
                texture.id
            )));
        }
        let size = color_textures
            .first()
            .copied()
            .or(depth_texture)
            .map(|t| t.size)
            .unwrap_or_default();
        if color_textures
            .iter()
            .chain(depth_texture.as_ref())
            .any(|t| t.size != size)
        {
            return Err(ExecutionError::Backend(
                "render target attachments differ in size".to_owned(),
            ));
        }
        self.created(id, ResourceKind::RenderTarget);
        Ok(EmptyRenderTarget {
            id,
            color_attachments: color_textures.len(),
            has_depth: depth_texture.is_some(),
            size,
        })
    }

    fn create_depth_stencil_state(
        &mut self,
        id: ResourceId,
        _desc: &DepthStencilStateDescriptor,
    ) -> Result<EmptyState, ExecutionError> {
        self.created(id, ResourceKind::DepthStencilState);
        Ok(EmptyState { id })
    }

    fn create_blend_state(
        &mut self,
        id: ResourceId,
        _desc: &BlendStateDescriptor,
    ) -> Result<EmptyState, ExecutionError> {
        self.created(id, ResourceKind::BlendState);
        Ok(EmptyState { id })
    }

    fn create_buffer(
        &mut self,
        id: ResourceId,
        desc: &BufferDescriptor,
    ) -> Result<EmptyBuffer, ExecutionError> {
        let mut data = desc.data.clone();
        data.resize(desc.size as usize, 0);
        self.created(id, ResourceKind::Buffer);
        Ok(EmptyBuffer {
            id,
            buffer_type: desc.buffer_type,
            flags: desc.flags,
            data,
        })
    }

    fn create_shader(
        &mut self,
        id: ResourceId,
        desc: &ShaderDescriptor,
    ) -> Result<EmptyShader, ExecutionError> {
        let shader = EmptyShader::compile(id, desc)
            .map_err(|details| ExecutionError::ShaderCompilation { shader: id, details })?;
        self.created(id, ResourceKind::Shader);
        Ok(shader)
    }

    fn create_texture(
        &mut self,
        id: ResourceId,
        desc: &TextureDescriptor,
    ) -> Result<EmptyTexture, ExecutionError> {
        self.created(id, ResourceKind::Texture);
        Ok(EmptyTexture::new(id, desc))
    }

    fn resource_released(&mut self, id: ResourceId) {
        if self.render_target == Some(id) {
            self.render_target = None;
        }
        self.journal.push(JournalEntry::Released(id));
    }

    fn set_buffer_data(
        &mut self,
        buffer: &mut EmptyBuffer,
        data: &[u8],
    ) -> Result<(), ExecutionError> {
        if !buffer.is_dynamic() {
            return Err(ExecutionError::Backend(format!(
                "buffer {} is not dynamic",
                buffer.id
            )));
        }
        if data.len() > buffer.data.len() {
            return Err(ExecutionError::Backend(format!(
                "{} bytes do not fit in buffer {} of {} bytes",
                data.len(),
                buffer.id,
                buffer.data.len()
            )));
        }
        buffer.data[..data.len()].copy_from_slice(data);
        self.journal.push(JournalEntry::BufferData {
            buffer: buffer.id,
            len: data.len(),
        });
        Ok(())
    }

    fn set_texture_data(
        &mut self,
        texture: &mut EmptyTexture,
        levels: &[TextureLevel],
        face: CubeFace,
    ) -> Result<(), ExecutionError> {
        if !texture.is_dynamic() {
            return Err(ExecutionError::Backend(format!(
                "texture {} is not dynamic",
                texture.id
            )));
        }
        if levels.len() > texture.levels.len() {
            return Err(ExecutionError::Backend(format!(
                "texture {} has {} levels, {} uploaded",
                texture.id,
                texture.levels.len(),
                levels.len()
            )));
        }
        for (stored, level) in texture.levels.iter_mut().zip(levels) {
            if !level.data.is_empty() {
                stored.clone_from(&level.data);
            }
        }
        self.journal.push(JournalEntry::TextureData {
            texture: texture.id,
            face,
        });
        Ok(())
    }

    fn set_texture_parameters(
        &mut self,
        texture: &mut EmptyTexture,
        params: &TextureParameters,
    ) -> Result<(), ExecutionError> {
        texture.params = *params;
        self.journal.push(JournalEntry::TextureParameters(texture.id));
        Ok(())
    }

    fn set_render_target(
        &mut self,
        target: Option<&EmptyRenderTarget>,
    ) -> Result<(), ExecutionError> {
        self.render_target = target.map(|t| t.id);
        self.journal.push(JournalEntry::RenderTarget(self.render_target));
        Ok(())
    }

    fn clear_render_target(&mut self, params: &ClearParams) -> Result<(), ExecutionError> {
        // Offscreen targets have no CPU storage; only the back buffer is filled.
        if params.clear_color_buffer && self.render_target.is_none() {
            self.framebuffer.fill(params.color);
        }
        self.journal.push(JournalEntry::Clear(*params));
        Ok(())
    }

    fn set_scissor_test(&mut self, enabled: bool, rect: Rect) -> Result<(), ExecutionError> {
        self.journal.push(JournalEntry::Scissor { enabled, rect });
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Rect) -> Result<(), ExecutionError> {
        self.journal.push(JournalEntry::Viewport(viewport));
        Ok(())
    }

    fn set_depth_stencil_state(
        &mut self,
        state: Option<&EmptyState>,
        stencil_reference: u32,
    ) -> Result<(), ExecutionError> {
        self.journal.push(JournalEntry::DepthStencilState {
            state: state.map(|s| s.id),
            stencil_reference,
        });
        Ok(())
    }

    fn set_pipeline_state(
        &mut self,
        blend_state: Option<&EmptyState>,
        shader: Option<&EmptyShader>,
        _cull_mode: CullMode,
        _fill_mode: FillMode,
    ) -> Result<(), ExecutionError> {
        self.journal.push(JournalEntry::PipelineState {
            blend_state: blend_state.map(|b| b.id),
            shader: shader.map(|s| s.id),
        });
        Ok(())
    }

    fn set_shader_constants(
        &mut self,
        fragment_constants: &[Vec<f32>],
        vertex_constants: &[Vec<f32>],
    ) -> Result<(), ExecutionError> {
        self.journal.push(JournalEntry::ShaderConstants {
            fragment: fragment_constants.len(),
            vertex: vertex_constants.len(),
        });
        Ok(())
    }

    fn set_textures(&mut self, textures: &[Option<&EmptyTexture>]) -> Result<(), ExecutionError> {
        self.journal.push(JournalEntry::Textures(
            textures.iter().map(|t| t.map(|t| t.id)).collect(),
        ));
        Ok(())
    }

    fn draw(
        &mut self,
        index_buffer: &EmptyBuffer,
        vertex_buffer: &EmptyBuffer,
        params: &DrawParams,
    ) -> Result<(), ExecutionError> {
        self.check_device()?;
        if index_buffer.buffer_type != BufferType::Index {
            return Err(ExecutionError::Backend(format!(
                "buffer {} is not an index buffer",
                index_buffer.id
            )));
        }
        if vertex_buffer.buffer_type != BufferType::Vertex {
            return Err(ExecutionError::Backend(format!(
                "buffer {} is not a vertex buffer",
                vertex_buffer.id
            )));
        }
        let end = (u64::from(params.start_index) + u64::from(params.index_count))
            * u64::from(params.index_size);
        if end > index_buffer.data.len() as u64 {
            return Err(ExecutionError::Backend(format!(
                "draw reads {end} bytes from index buffer {} of {} bytes",
                index_buffer.id,
                index_buffer.data.len()
            )));
        }
        self.journal.push(JournalEntry::Draw {
            index_buffer: index_buffer.id,
            vertex_buffer: vertex_buffer.id,
            index_count: params.index_count,
        });
        Ok(())
    }

    fn push_debug_marker(&mut self, name: &str) -> Result<(), ExecutionError> {
        log::trace!("Debug marker '{name}'");
        self.journal.push(JournalEntry::PushDebugMarker(name.to_owned()));
        Ok(())
    }

    fn pop_debug_marker(&mut self) -> Result<(), ExecutionError> {
        self.journal.push(JournalEntry::PopDebugMarker);
        Ok(())
    }

    fn generate_screenshot(&mut self, path: &Path) -> Result<(), ExecutionError> {
        self.framebuffer.write_png(path)
    }

    fn supported_resolutions(&self) -> Vec<Extent2D> {
        vec![self.settings.size]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_core::math::Color;

    fn initialized() -> EmptyBackend {
        let mut backend = EmptyBackend::new();
        let settings = DeviceSettings {
            size: Extent2D::new(4, 4),
            ..DeviceSettings::default()
        };
        backend.init(None, &settings).unwrap();
        backend
    }

    #[test]
    fn static_buffers_reject_updates() {
        let mut backend = initialized();
        let mut buffer = backend
            .create_buffer(
                ResourceId(1),
                &BufferDescriptor::with_data(BufferType::Vertex, vec![1, 2]),
            )
            .unwrap();
        assert!(backend.set_buffer_data(&mut buffer, &[3, 4]).is_err());

        let mut dynamic = backend
            .create_buffer(ResourceId(2), &BufferDescriptor::dynamic(BufferType::Vertex, 4))
            .unwrap();
        backend.set_buffer_data(&mut dynamic, &[5, 6]).unwrap();
        assert_eq!(dynamic.data, vec![5, 6, 0, 0]);
        assert!(backend.set_buffer_data(&mut dynamic, &[0; 5]).is_err());
    }

    #[test]
    fn device_loss_fires_once() {
        let mut backend = initialized();
        backend.device_loss_trigger().trigger();
        assert_eq!(backend.present(), Err(ExecutionError::DeviceLost));
        assert!(!backend.device_loss_trigger().is_armed());
        backend.recreate().unwrap();
        assert_eq!(backend.present(), Ok(()));
        assert_eq!(backend.context_generation(), 2);
    }

    #[test]
    fn clears_fill_only_the_back_buffer() {
        let mut backend = initialized();
        let texture = backend
            .create_texture(
                ResourceId(1),
                &TextureDescriptor::new_2d(
                    Extent2D::new(4, 4),
                    PixelFormat::Rgba8UnsignedNorm,
                    Vec::new(),
                ),
            )
            .unwrap();
        let target = backend
            .create_render_target(
                ResourceId(2),
                &RenderTargetDescriptor::default(),
                &[&texture],
                None,
            )
            .unwrap();
        let red = ClearParams {
            color: Color::rgb(1.0, 0.0, 0.0),
            ..ClearParams::default()
        };

        backend.set_render_target(Some(&target)).unwrap();
        backend.clear_render_target(&red).unwrap();
        assert_eq!(backend.framebuffer().pixel(0, 0), Some([0, 0, 0, 0]));

        backend.set_render_target(None).unwrap();
        backend.clear_render_target(&red).unwrap();
        assert_eq!(backend.framebuffer().pixel(0, 0), Some([255, 0, 0, 255]));
    }

    #[test]
    fn render_targets_check_attachment_formats() {
        let mut backend = initialized();
        let depth = backend
            .create_texture(
                ResourceId(1),
                &TextureDescriptor::new_2d(Extent2D::new(4, 4), PixelFormat::Depth, Vec::new()),
            )
            .unwrap();
        let err = backend
            .create_render_target(
                ResourceId(2),
                &RenderTargetDescriptor::default(),
                &[&depth],
                None,
            )
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Backend(_)));
    }

    #[test]
    fn draws_past_the_index_buffer_fail() {
        let mut backend = initialized();
        let indices = backend
            .create_buffer(
                ResourceId(1),
                &BufferDescriptor::with_data(BufferType::Index, vec![0; 6]),
            )
            .unwrap();
        let vertices = backend
            .create_buffer(
                ResourceId(2),
                &BufferDescriptor::with_data(BufferType::Vertex, vec![0; 36]),
            )
            .unwrap();
        let mut params = DrawParams {
            index_buffer: ResourceId(1),
            index_count: 3,
            index_size: 2,
            vertex_buffer: ResourceId(2),
            draw_mode: DrawMode::TriangleList,
            start_index: 0,
        };
        backend.draw(&indices, &vertices, &params).unwrap();

        params.start_index = 1;
        assert!(backend.draw(&indices, &vertices, &params).is_err());
        let from_start = DrawParams {
            start_index: 0,
            ..params
        };
        assert!(backend.draw(&vertices, &vertices, &from_start).is_err());
    }

    #[test]
    fn supported_resolutions_follow_resizes() {
        let mut backend = initialized();
        assert_eq!(backend.supported_resolutions(), vec![Extent2D::new(4, 4)]);
        backend.resize(Extent2D::new(8, 2)).unwrap();
        assert_eq!(backend.supported_resolutions(), vec![Extent2D::new(8, 2)]);
        assert_eq!(backend.framebuffer().size(), Extent2D::new(8, 2));
    }
}
