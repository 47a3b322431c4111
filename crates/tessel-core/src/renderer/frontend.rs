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

//! The producer side of the pipeline.

use super::api::*;
use super::device::{DeviceEvent, DeviceState, EventCallback, RenderDevice, ShutdownMode};
use super::error::{ExecutionError, RenderError, ValidationError};
use super::pacing::FrameSync;
use super::traits::{DeviceServices, RenderBackend};
use crate::event::EventBus;
use crate::math::{Extent2D, Rect};
use crate::platform::SurfaceHandle;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

// How often a paced wait re-checks that the device is still running.
const PACING_POLL: Duration = Duration::from_millis(100);

type Validated<T = ()> = Result<T, ValidationError>;

fn require(operation: &'static str, argument: &'static str, id: ResourceId) -> Validated {
    if id.is_null() {
        Err(ValidationError::NullResource {
            operation,
            argument,
        })
    } else {
        Ok(())
    }
}

fn invalid(operation: &'static str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidArgument {
        operation,
        reason: reason.into(),
    }
}

fn check_rect(operation: &'static str, rect: &Rect) -> Validated {
    if rect.is_valid() {
        Ok(())
    } else {
        Err(invalid(operation, format!("{rect:?} has a negative or non-finite extent")))
    }
}

fn check_levels(
    operation: &'static str,
    levels: &[TextureLevel],
    pixel_format: Option<PixelFormat>,
) -> Validated {
    if levels.is_empty() {
        return Err(invalid(operation, "at least one texture level is required"));
    }
    for (index, level) in levels.iter().enumerate() {
        if level.size.is_empty() {
            return Err(invalid(operation, format!("level {index} has an empty size")));
        }
        if let Some(format) = pixel_format {
            let needed = level.size.area() * u64::from(format.bytes_per_pixel());
            if !level.data.is_empty() && (level.data.len() as u64) < needed {
                return Err(invalid(
                    operation,
                    format!(
                        "level {index} holds {} bytes, {needed} needed",
                        level.data.len()
                    ),
                ));
            }
        }
    }
    Ok(())
}

/// The typed, validated facade the logic thread records rendering through.
///
/// Every call validates its arguments first. A rejected call returns a
/// [`ValidationError`] and appends nothing; an accepted one appends exactly
/// one [`Command`] to the frame being recorded. [`present`](Self::present)
/// ends the frame and hands it to the render device.
///
/// Resource ids are returned as soon as the init command is recorded. They
/// may be referenced by the very next command: the device executes commands
/// in the order they were recorded.
pub struct Renderer {
    device: RenderDevice,
    resource_ids: Arc<ResourceIdAllocator>,
    buffer: CommandBuffer,
    buffer_name: String,
    frame_sync: Arc<FrameSync>,
    events: EventBus<DeviceEvent>,
    size: Extent2D,
}

impl Renderer {
    /// Starts a render device around `backend` and returns its producer.
    pub fn new<B: RenderBackend>(
        backend: B,
        config: &RendererConfig,
        surface: Option<SurfaceHandle>,
    ) -> Result<Self, RenderError> {
        let frame_sync = Arc::new(FrameSync::new(config.effective_frame_lead()));
        let events = EventBus::new();

        let callback: EventCallback = {
            let frame_sync = Arc::clone(&frame_sync);
            let sender = events.sender();
            Arc::new(move |event: DeviceEvent| match event {
                DeviceEvent::Frame => frame_sync.signal(),
                other => {
                    let _ = sender.send(other);
                }
            })
        };

        let device = RenderDevice::start(backend, config.device.clone(), surface, callback)?;
        let resource_ids = device.resource_ids();
        let size = config.device.size;

        Ok(Self {
            device,
            resource_ids,
            buffer: CommandBuffer::with_name(config.command_buffer_name.clone()),
            buffer_name: config.command_buffer_name.clone(),
            frame_sync,
            events,
            size,
        })
    }

    pub fn driver(&self) -> Driver {
        self.device.driver()
    }

    /// The render device this renderer submits to.
    pub fn device(&self) -> &RenderDevice {
        &self.device
    }

    pub fn size(&self) -> Extent2D {
        self.size
    }

    pub fn stats(&self) -> FrameStats {
        self.device.stats()
    }

    /// The number of commands recorded for the current frame.
    pub fn pending_commands(&self) -> usize {
        self.buffer.len()
    }

    /// Commands recorded for the current frame, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &Command> {
        self.buffer.iter()
    }

    /// Device lifecycle events other than frames, oldest first.
    pub fn poll_events(&self) -> Vec<DeviceEvent> {
        self.events.drain()
    }

    fn record(&mut self, command: Command) {
        self.buffer.push_command(command);
    }

    fn record_init(&mut self, make: impl FnOnce(ResourceId) -> Command) -> ResourceId {
        let id = self.resource_ids.allocate();
        self.record(make(id));
        id
    }

    // --- Resources ---

    pub fn init_render_target(&mut self, desc: RenderTargetDescriptor) -> Validated<ResourceId> {
        const OP: &str = "init_render_target";
        if desc.color_textures.contains(&ResourceId::NULL) {
            return Err(invalid(OP, "color textures must not contain a null resource"));
        }
        if desc.attachments().next().is_none() {
            return Err(invalid(OP, "a render target needs at least one attachment"));
        }
        Ok(self.record_init(|render_target| Command::InitRenderTarget {
            render_target,
            desc,
        }))
    }

    pub fn init_depth_stencil_state(&mut self, desc: DepthStencilStateDescriptor) -> ResourceId {
        self.record_init(|depth_stencil_state| Command::InitDepthStencilState {
            depth_stencil_state,
            desc,
        })
    }

    pub fn init_blend_state(&mut self, desc: BlendStateDescriptor) -> ResourceId {
        self.record_init(|blend_state| Command::InitBlendState { blend_state, desc })
    }

    pub fn init_buffer(&mut self, desc: BufferDescriptor) -> Validated<ResourceId> {
        if desc.data.len() as u64 > u64::from(desc.size) {
            return Err(invalid(
                "init_buffer",
                format!("{} bytes of data exceed the {} byte size", desc.data.len(), desc.size),
            ));
        }
        Ok(self.record_init(|buffer| Command::InitBuffer { buffer, desc }))
    }

    /// Creates a buffer holding `data`, reinterpreted as bytes.
    pub fn init_buffer_from<T: bytemuck::Pod>(
        &mut self,
        buffer_type: BufferType,
        flags: ResourceFlags,
        data: &[T],
    ) -> Validated<ResourceId> {
        let mut desc =
            BufferDescriptor::with_data(buffer_type, bytemuck::cast_slice(data).to_vec());
        desc.flags = flags;
        self.init_buffer(desc)
    }

    pub fn set_buffer_data(&mut self, buffer: ResourceId, data: Vec<u8>) -> Validated {
        require("set_buffer_data", "buffer", buffer)?;
        self.record(Command::SetBufferData { buffer, data });
        Ok(())
    }

    pub fn set_buffer_data_from<T: bytemuck::Pod>(
        &mut self,
        buffer: ResourceId,
        data: &[T],
    ) -> Validated {
        self.set_buffer_data(buffer, bytemuck::cast_slice(data).to_vec())
    }

    pub fn init_shader(&mut self, desc: ShaderDescriptor) -> Validated<ResourceId> {
        if desc.vertex_shader.is_empty() || desc.fragment_shader.is_empty() {
            return Err(invalid("init_shader", "both shader stages are required"));
        }
        Ok(self.record_init(|shader| Command::InitShader { shader, desc }))
    }

    pub fn init_texture(&mut self, desc: TextureDescriptor) -> Validated<ResourceId> {
        const OP: &str = "init_texture";
        if desc.sample_count == 0 {
            return Err(invalid(OP, "sample count must be at least 1"));
        }
        check_levels(OP, &desc.levels, Some(desc.pixel_format))?;
        Ok(self.record_init(|texture| Command::InitTexture { texture, desc }))
    }

    pub fn set_texture_data(
        &mut self,
        texture: ResourceId,
        levels: Vec<TextureLevel>,
        face: CubeFace,
    ) -> Validated {
        require("set_texture_data", "texture", texture)?;
        check_levels("set_texture_data", &levels, None)?;
        self.record(Command::SetTextureData {
            texture,
            levels,
            face,
        });
        Ok(())
    }

    pub fn set_texture_parameters(
        &mut self,
        texture: ResourceId,
        params: TextureParameters,
    ) -> Validated {
        require("set_texture_parameters", "texture", texture)?;
        self.record(Command::SetTextureParameters { texture, params });
        Ok(())
    }

    /// Releases `resource`. Its id is never handed out again.
    pub fn delete_resource(&mut self, resource: ResourceId) -> Validated {
        require("delete_resource", "resource", resource)?;
        self.record(Command::DeleteResource { resource });
        Ok(())
    }

    // --- State ---

    /// Selects the target of following draws. [`ResourceId::NULL`] selects
    /// the back buffer.
    pub fn set_render_target(&mut self, render_target: ResourceId) {
        self.record(Command::SetRenderTarget { render_target });
    }

    pub fn clear_render_target(&mut self, params: ClearParams) -> Validated {
        if !(0.0..=1.0).contains(&params.depth) {
            return Err(invalid(
                "clear_render_target",
                format!("depth {} is outside [0, 1]", params.depth),
            ));
        }
        self.record(Command::ClearRenderTarget(params));
        Ok(())
    }

    pub fn set_scissor_test(&mut self, enabled: bool, rect: Rect) -> Validated {
        if enabled {
            check_rect("set_scissor_test", &rect)?;
        }
        self.record(Command::SetScissorTest { enabled, rect });
        Ok(())
    }

    pub fn set_viewport(&mut self, viewport: Rect) -> Validated {
        check_rect("set_viewport", &viewport)?;
        self.record(Command::SetViewport { viewport });
        Ok(())
    }

    /// Binds a depth/stencil state. [`ResourceId::NULL`] restores the default.
    pub fn set_depth_stencil_state(
        &mut self,
        depth_stencil_state: ResourceId,
        stencil_reference: u32,
    ) {
        self.record(Command::SetDepthStencilState {
            depth_stencil_state,
            stencil_reference,
        });
    }

    pub fn set_pipeline_state(
        &mut self,
        blend_state: ResourceId,
        shader: ResourceId,
        cull_mode: CullMode,
        fill_mode: FillMode,
    ) -> Validated {
        require("set_pipeline_state", "shader", shader)?;
        self.record(Command::SetPipelineState {
            blend_state,
            shader,
            cull_mode,
            fill_mode,
        });
        Ok(())
    }

    pub fn set_shader_constants(
        &mut self,
        fragment_constants: Vec<Vec<f32>>,
        vertex_constants: Vec<Vec<f32>>,
    ) {
        self.record(Command::SetShaderConstants {
            fragment_constants,
            vertex_constants,
        });
    }

    /// Binds `textures` to consecutive units; a null id unbinds its unit.
    pub fn set_textures(&mut self, textures: Vec<ResourceId>) {
        self.record(Command::SetTextures { textures });
    }

    // --- Drawing ---

    /// Records an indexed draw.
    ///
    /// Both buffers must be non-null; `index_size` must be 1, 2 or 4.
    pub fn draw(
        &mut self,
        index_buffer: ResourceId,
        index_count: u32,
        index_size: u32,
        vertex_buffer: ResourceId,
        draw_mode: DrawMode,
        start_index: u32,
    ) -> Validated {
        const OP: &str = "draw";
        require(OP, "index_buffer", index_buffer)?;
        require(OP, "vertex_buffer", vertex_buffer)?;
        if !matches!(index_size, 1 | 2 | 4) {
            return Err(invalid(OP, format!("index size {index_size} is not 1, 2 or 4")));
        }
        self.record(Command::Draw(DrawParams {
            index_buffer,
            index_count,
            index_size,
            vertex_buffer,
            draw_mode,
            start_index,
        }));
        Ok(())
    }

    pub fn push_debug_marker(&mut self, name: impl Into<String>) -> Validated {
        let name = name.into();
        if name.is_empty() {
            return Err(invalid("push_debug_marker", "marker name must not be empty"));
        }
        self.record(Command::PushDebugMarker { name });
        Ok(())
    }

    pub fn pop_debug_marker(&mut self) {
        self.record(Command::PopDebugMarker);
    }

    // --- Frames ---

    /// Records a back-buffer resize. The size is not checked, so a minimized
    /// window may report an empty extent.
    pub fn set_size(&mut self, size: Extent2D) {
        self.size = size;
        self.record(Command::Resize { size });
    }

    /// Ends the frame: appends a [`Command::Present`] and hands the frame's
    /// buffer to the render device, then starts an empty one.
    pub fn present(&mut self) -> Result<(), RenderError> {
        self.record(Command::Present);
        let next = CommandBuffer::with_name(self.buffer_name.clone());
        let frame = std::mem::replace(&mut self.buffer, next);
        self.device.submit_command_buffer(frame)
    }

    /// Blocks until the logic thread may start another frame.
    ///
    /// The first call returns at once; afterwards the logic thread stays at
    /// most the configured frame lead ahead of the presented frames.
    pub fn wait_for_next_frame(&self) -> Result<(), RenderError> {
        loop {
            if self.frame_sync.wait_timeout(PACING_POLL) {
                return Ok(());
            }
            if self.device.state() == DeviceState::Stopped {
                return Err(RenderError::DeviceStopped);
            }
        }
    }

    /// Like [`wait_for_next_frame`](Self::wait_for_next_frame), giving up
    /// after `timeout`. Returns `false` on timeout.
    pub fn wait_for_next_frame_timeout(&self, timeout: Duration) -> bool {
        self.frame_sync.wait_timeout(timeout)
    }

    /// Writes the back buffer to `path` once the frames presented so far are
    /// rendered.
    ///
    /// The capture runs on the render thread; its outcome arrives on the
    /// returned channel.
    pub fn save_screenshot(
        &self,
        path: impl Into<PathBuf>,
    ) -> Result<flume::Receiver<Result<(), ExecutionError>>, RenderError> {
        let path = path.into();
        let (sender, receiver) = flume::bounded(1);
        self.device
            .execute_on_render_thread(move |services: &mut dyn DeviceServices| {
                let result = services.generate_screenshot(&path);
                match &result {
                    Ok(()) => log::info!("Screenshot saved to {}", path.display()),
                    Err(err) => {
                        log::error!("Failed to save screenshot to {}: {err}", path.display())
                    }
                }
                let _ = sender.send(result);
            })?;
        Ok(receiver)
    }

    /// Queues `task` to run on the render thread between frames.
    pub fn execute_on_render_thread(
        &self,
        task: impl FnOnce(&mut dyn DeviceServices) + Send + 'static,
    ) -> Result<(), RenderError> {
        self.device.execute_on_render_thread(task)
    }

    /// Stops the render device. Commands recorded since the last present are
    /// dropped.
    pub fn shutdown(&mut self, mode: ShutdownMode) {
        if !self.buffer.is_empty() {
            log::debug!(
                "Dropping {} commands recorded after the last present",
                self.buffer.len()
            );
        }
        self.device.shutdown(mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::device::mock::{MockBackend, MockCall};
    use std::collections::BTreeSet;

    fn renderer() -> Renderer {
        Renderer::new(MockBackend::new(), &RendererConfig::default(), None).unwrap()
    }

    fn vertex_buffer(renderer: &mut Renderer) -> ResourceId {
        renderer
            .init_buffer(BufferDescriptor::with_data(BufferType::Vertex, vec![0; 12]))
            .unwrap()
    }

    #[test]
    fn rejected_draw_appends_nothing() {
        let mut renderer = renderer();
        let buffer = vertex_buffer(&mut renderer);
        assert_eq!(buffer, ResourceId(1));

        let err = renderer
            .draw(buffer, 6, 2, ResourceId::NULL, DrawMode::TriangleList, 0)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::NullResource {
                operation: "draw",
                argument: "vertex_buffer",
            }
        );
        assert!(renderer
            .draw(ResourceId::NULL, 6, 2, buffer, DrawMode::TriangleList, 0)
            .is_err());
        assert!(renderer
            .draw(buffer, 6, 3, buffer, DrawMode::TriangleList, 0)
            .is_err());
        assert_eq!(renderer.pending_commands(), 1);
    }

    #[test]
    fn ids_are_unique_and_usable_immediately() {
        let mut renderer = renderer();
        let index = vertex_buffer(&mut renderer);
        let vertex = vertex_buffer(&mut renderer);
        assert_ne!(index, vertex);

        renderer
            .draw(index, 3, 2, vertex, DrawMode::TriangleList, 0)
            .unwrap();
        let kinds: Vec<_> = renderer.pending().map(Command::kind).collect();
        assert_eq!(
            kinds,
            vec![CommandKind::InitBuffer, CommandKind::InitBuffer, CommandKind::Draw]
        );
    }

    #[test]
    fn present_hands_over_the_frame_and_starts_a_new_one() {
        let backend = MockBackend::new();
        let calls = backend.calls();
        let mut renderer = Renderer::new(backend, &RendererConfig::default(), None).unwrap();

        renderer.push_debug_marker("scene").unwrap();
        renderer.pop_debug_marker();
        renderer.present().unwrap();
        assert_eq!(renderer.pending_commands(), 0);

        renderer.shutdown(ShutdownMode::Drain);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                MockCall::Init,
                MockCall::PushMarker("scene".into()),
                MockCall::PopMarker,
                MockCall::Present,
            ]
        );
    }

    #[test]
    fn invalid_arguments_are_rejected() {
        let mut renderer = renderer();
        assert!(renderer.push_debug_marker("").is_err());
        assert!(renderer
            .set_viewport(Rect::new(0.0, 0.0, -1.0, 10.0))
            .is_err());
        assert!(renderer
            .init_buffer(BufferDescriptor {
                buffer_type: BufferType::Index,
                flags: ResourceFlags::EMPTY,
                data: vec![0; 8],
                size: 4,
            })
            .is_err());
        assert!(renderer.init_shader(ShaderDescriptor::default()).is_err());
        assert!(renderer
            .init_render_target(RenderTargetDescriptor::default())
            .is_err());
        assert!(renderer
            .init_render_target(RenderTargetDescriptor {
                color_textures: BTreeSet::from([ResourceId::NULL]),
                depth_texture: ResourceId::NULL,
            })
            .is_err());
        assert!(renderer
            .init_texture(TextureDescriptor::new_2d(
                Extent2D::new(2, 2),
                PixelFormat::Rgba8UnsignedNorm,
                vec![0; 3],
            ))
            .is_err());
        assert!(renderer
            .set_pipeline_state(ResourceId::NULL, ResourceId::NULL, CullMode::Back, FillMode::Solid)
            .is_err());
        assert_eq!(renderer.pending_commands(), 0);
    }

    #[test]
    fn disabled_scissor_ignores_its_rect() {
        let mut renderer = renderer();
        renderer
            .set_scissor_test(false, Rect::new(0.0, 0.0, -5.0, -5.0))
            .unwrap();
        assert_eq!(renderer.pending_commands(), 1);
    }

    #[test]
    fn typed_uploads_are_cast_to_bytes() {
        let mut renderer = renderer();
        let id = renderer
            .init_buffer_from(BufferType::Index, ResourceFlags::DYNAMIC, &[1u16, 2, 3])
            .unwrap();
        renderer.set_buffer_data_from(id, &[7u32]).unwrap();

        let commands: Vec<_> = renderer.pending().cloned().collect();
        match &commands[0] {
            Command::InitBuffer { desc, .. } => {
                assert_eq!(desc.size, 6);
                assert!(desc.is_dynamic());
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(
            commands[1],
            Command::SetBufferData {
                buffer: id,
                data: 7u32.to_ne_bytes().to_vec(),
            }
        );
    }

    #[test]
    fn set_size_records_a_resize() {
        let mut renderer = renderer();
        renderer.set_size(Extent2D::new(1024, 768));
        assert_eq!(renderer.size(), Extent2D::new(1024, 768));
        assert_eq!(
            renderer.pending().next(),
            Some(&Command::Resize {
                size: Extent2D::new(1024, 768)
            })
        );
    }

    #[test]
    fn frame_pacing_follows_presents() {
        let mut renderer = renderer();
        renderer.wait_for_next_frame().unwrap();
        assert!(!renderer.wait_for_next_frame_timeout(Duration::from_millis(10)));

        renderer.present().unwrap();
        assert!(renderer.wait_for_next_frame_timeout(Duration::from_secs(2)));
    }

    #[test]
    fn device_events_are_republished() {
        let renderer = renderer();
        renderer.device().notify_device_lost().unwrap();

        let mut events = Vec::new();
        for _ in 0..200 {
            events.extend(renderer.poll_events());
            if events.len() >= 2 {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(events, vec![DeviceEvent::DeviceLost, DeviceEvent::DeviceRestored]);
    }

    #[test]
    fn paced_wait_ends_when_the_render_thread_dies() {
        let backend = MockBackend::new().panicking_present();
        let mut renderer = Renderer::new(backend, &RendererConfig::default(), None).unwrap();

        renderer.wait_for_next_frame().unwrap();
        renderer.present().unwrap();

        assert_eq!(
            renderer.wait_for_next_frame(),
            Err(RenderError::DeviceStopped)
        );
        assert_eq!(renderer.device().state(), DeviceState::Stopped);
    }
}
