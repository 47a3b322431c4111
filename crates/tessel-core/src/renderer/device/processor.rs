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

//! Serial execution of command buffers on the render thread.

use super::event::{DeviceEvent, DeviceState, EventCallback};
use super::resource::{build_native, ResourceDescription, ResourceLookup, ResourceSlot, Resources};
use crate::renderer::api::*;
use crate::renderer::error::{ExecutionError, RenderError};
use crate::renderer::traits::{DeviceServices, RenderBackend};
use crate::utils::sync::lock;
use crate::utils::timer::Stopwatch;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Device state readable from the logic thread.
#[derive(Debug)]
pub struct SharedDeviceState {
    pub(crate) stats: Mutex<FrameStats>,
    pub(crate) state: Mutex<DeviceState>,
}

impl SharedDeviceState {
    pub fn new(state: DeviceState) -> Self {
        Self {
            stats: Mutex::new(FrameStats::default()),
            state: Mutex::new(state),
        }
    }

    pub fn stats(&self) -> FrameStats {
        lock(&self.stats).clone()
    }

    pub fn state(&self) -> DeviceState {
        *lock(&self.state)
    }

    pub fn set_state(&self, state: DeviceState) {
        *lock(&self.state) = state;
    }
}

/// The last command of each state-setting kind, replayed after a reload.
#[derive(Debug, Default)]
struct BoundState {
    render_target: Option<Command>,
    viewport: Option<Command>,
    scissor_test: Option<Command>,
    depth_stencil_state: Option<Command>,
    pipeline_state: Option<Command>,
    shader_constants: Option<Command>,
    textures: Option<Command>,
}

impl BoundState {
    fn record(&mut self, command: &Command) {
        let slot = match command {
            Command::SetRenderTarget { .. } => &mut self.render_target,
            Command::SetViewport { .. } => &mut self.viewport,
            Command::SetScissorTest { .. } => &mut self.scissor_test,
            Command::SetDepthStencilState { .. } => &mut self.depth_stencil_state,
            Command::SetPipelineState { .. } => &mut self.pipeline_state,
            Command::SetShaderConstants { .. } => &mut self.shader_constants,
            Command::SetTextures { .. } => &mut self.textures,
            _ => return,
        };
        *slot = Some(command.clone());
    }

    fn commands(&self) -> Vec<Command> {
        [
            &self.render_target,
            &self.viewport,
            &self.scissor_test,
            &self.depth_stencil_state,
            &self.pipeline_state,
            &self.shader_constants,
            &self.textures,
        ]
        .into_iter()
        .flatten()
        .cloned()
        .collect()
    }
}

/// Owns a backend and its resource table, and executes commands against them.
///
/// Per-command failures are logged and counted, and execution moves on to
/// the next command. A [`ExecutionError::DeviceLost`] failure triggers
/// [`recover_device`](Self::recover_device) and a single retry.
///
/// Only ids handed out by the shared allocator can be initialized.
pub struct CommandProcessor<B: RenderBackend> {
    backend: B,
    resources: Resources<B>,
    resource_ids: Arc<ResourceIdAllocator>,
    bound: BoundState,
    callback: EventCallback,
    shared: Arc<SharedDeviceState>,
    frame_timer: Stopwatch,
    fps: FpsCounter,
    frame_draw_calls: u32,
}

impl<B: RenderBackend> CommandProcessor<B> {
    pub fn new(
        backend: B,
        callback: EventCallback,
        shared: Arc<SharedDeviceState>,
        resource_ids: Arc<ResourceIdAllocator>,
    ) -> Self {
        Self {
            backend,
            resources: Resources::new(),
            resource_ids,
            bound: BoundState::default(),
            callback,
            shared,
            frame_timer: Stopwatch::new(),
            fps: FpsCounter::new(),
            frame_draw_calls: 0,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn resources(&self) -> &Resources<B> {
        &self.resources
    }

    /// Pops and executes every command of `buffer`, in order.
    ///
    /// Only a failed device recovery aborts the buffer; it leaves the device
    /// unusable.
    pub fn execute_buffer(&mut self, mut buffer: CommandBuffer) -> Result<(), RenderError> {
        log::trace!(
            "Executing command buffer '{}' ({} commands)",
            buffer.name(),
            buffer.len()
        );
        while let Some(command) = buffer.pop_command() {
            self.execute_with_recovery(buffer.name(), &command)?;
        }
        Ok(())
    }

    fn execute_with_recovery(
        &mut self,
        buffer_name: &str,
        command: &Command,
    ) -> Result<(), RenderError> {
        let result = match self.execute(command) {
            Err(ExecutionError::DeviceLost) => {
                self.recover_device()?;
                self.execute(command)
            }
            other => other,
        };

        {
            let mut stats = lock(&self.shared.stats);
            match &result {
                Ok(()) => {
                    stats.commands_executed += 1;
                    self.bound.record(command);
                }
                Err(err) => {
                    log::error!(
                        "Failed to execute {} command in buffer '{}': {}",
                        command.kind(),
                        buffer_name,
                        err
                    );
                    stats.command_errors += 1;
                }
            }
        }

        // The frame event fires even if the flip failed, so a paced logic
        // thread never waits on a frame that will not come.
        if matches!(command, Command::Present) {
            self.finish_frame();
        }
        Ok(())
    }

    fn finish_frame(&mut self) {
        self.fps.record_frame(self.frame_timer.lap());
        {
            let mut stats = lock(&self.shared.stats);
            stats.frames_presented += 1;
            stats.draw_calls = self.frame_draw_calls;
            stats.current_fps = self.fps.current_fps();
            stats.accumulated_fps = self.fps.accumulated_fps();
        }
        self.frame_draw_calls = 0;
        (self.callback)(DeviceEvent::Frame);
    }

    /// Executes one command against the backend.
    pub fn execute(&mut self, command: &Command) -> Result<(), ExecutionError> {
        match command {
            Command::Resize { size } => self.backend.resize(*size),
            Command::Present => self.backend.present(),
            Command::DeleteResource { resource } => {
                let slot = self.resources.remove(*resource)?;
                drop(slot);
                self.backend.resource_released(*resource);
                Ok(())
            }

            Command::InitRenderTarget {
                render_target,
                desc,
            } => self.init_resource(
                *render_target,
                ResourceDescription::RenderTarget(desc.clone()),
            ),
            Command::SetRenderTarget { render_target } => {
                let target = self
                    .resources
                    .optional(*render_target, |r, id| r.render_target(id))?;
                self.backend.set_render_target(target)
            }
            Command::ClearRenderTarget(params) => self.backend.clear_render_target(params),
            Command::SetScissorTest { enabled, rect } => {
                self.backend.set_scissor_test(*enabled, *rect)
            }
            Command::SetViewport { viewport } => self.backend.set_viewport(*viewport),

            Command::InitDepthStencilState {
                depth_stencil_state,
                desc,
            } => self.init_resource(
                *depth_stencil_state,
                ResourceDescription::DepthStencilState(*desc),
            ),
            Command::SetDepthStencilState {
                depth_stencil_state,
                stencil_reference,
            } => {
                let state = self
                    .resources
                    .optional(*depth_stencil_state, |r, id| r.depth_stencil_state(id))?;
                self.backend.set_depth_stencil_state(state, *stencil_reference)
            }
            Command::SetPipelineState {
                blend_state,
                shader,
                cull_mode,
                fill_mode,
            } => {
                let blend = self
                    .resources
                    .optional(*blend_state, |r, id| r.blend_state(id))?;
                let shader = self.resources.optional(*shader, |r, id| r.shader(id))?;
                self.backend
                    .set_pipeline_state(blend, shader, *cull_mode, *fill_mode)
            }
            Command::Draw(params) => {
                let index_buffer = self.resources.buffer(params.index_buffer)?;
                let vertex_buffer = self.resources.buffer(params.vertex_buffer)?;
                self.backend.draw(index_buffer, vertex_buffer, params)?;
                self.frame_draw_calls += 1;
                Ok(())
            }

            Command::InitBlendState { blend_state, desc } => {
                self.init_resource(*blend_state, ResourceDescription::BlendState(*desc))
            }
            Command::InitBuffer { buffer, desc } => {
                self.init_resource(*buffer, ResourceDescription::Buffer(desc.clone()))
            }
            Command::SetBufferData { buffer, data } => {
                let native = self.resources.buffer_mut(*buffer)?;
                self.backend.set_buffer_data(native, data)?;
                self.resources
                    .get_mut(*buffer)?
                    .description_mut()
                    .record_buffer_data(data);
                Ok(())
            }

            Command::InitShader { shader, desc } => {
                self.init_resource(*shader, ResourceDescription::Shader(desc.clone()))
            }
            Command::SetShaderConstants {
                fragment_constants,
                vertex_constants,
            } => self
                .backend
                .set_shader_constants(fragment_constants, vertex_constants),

            Command::InitTexture { texture, desc } => self.init_resource(
                *texture,
                ResourceDescription::Texture {
                    desc: desc.clone(),
                    uploads: Vec::new(),
                    params: None,
                },
            ),
            Command::SetTextureData {
                texture,
                levels,
                face,
            } => {
                let native = self.resources.texture_mut(*texture)?;
                self.backend.set_texture_data(native, levels, *face)?;
                self.resources
                    .get_mut(*texture)?
                    .description_mut()
                    .record_texture_data(*face, levels);
                Ok(())
            }
            Command::SetTextureParameters { texture, params } => {
                let native = self.resources.texture_mut(*texture)?;
                self.backend.set_texture_parameters(native, params)?;
                self.resources
                    .get_mut(*texture)?
                    .description_mut()
                    .record_texture_parameters(params);
                Ok(())
            }
            Command::SetTextures { textures } => {
                let bound = textures
                    .iter()
                    .map(|texture| self.resources.optional(*texture, |r, id| r.texture(id)))
                    .collect::<Result<Vec<_>, _>>()?;
                self.backend.set_textures(&bound)
            }

            Command::PushDebugMarker { name } => self.backend.push_debug_marker(name),
            Command::PopDebugMarker => self.backend.pop_debug_marker(),
        }
    }

    fn init_resource(
        &mut self,
        id: ResourceId,
        description: ResourceDescription,
    ) -> Result<(), ExecutionError> {
        if id.get() > self.resource_ids.allocated_count() {
            return Err(ExecutionError::UnknownResource(id));
        }
        let native = build_native(&mut self.backend, &self.resources, id, &description)?;
        if let Some(previous) = self.resources.insert(id, ResourceSlot::new(description, native))? {
            log::debug!("Resource {id} re-initialized, replacing a {}", previous.kind());
        }
        Ok(())
    }

    /// Rebuilds the device after a loss.
    ///
    /// Every live resource is invalidated, the backend recreates its native
    /// context, and each resource is rebuilt from its retained description in
    /// id order, so render targets find their attachments already restored.
    /// A resource that fails to rebuild stays invalid and is reported; only a
    /// failure to recreate the context itself is fatal. The last bound state
    /// is set again once the resources are back.
    pub fn recover_device(&mut self) -> Result<(), RenderError> {
        log::warn!(
            "Render device lost, reloading {} resources",
            self.resources.len()
        );
        self.shared.set_state(DeviceState::Reloading);
        (self.callback)(DeviceEvent::DeviceLost);

        for (_, slot) in self.resources.iter_mut() {
            slot.invalidate();
        }

        if let Err(err) = self.backend.recreate() {
            log::error!("Failed to recreate the render device: {err}");
            self.shared.set_state(DeviceState::Stopped);
            return Err(RenderError::ReloadFailed(err));
        }

        let mut failures = 0usize;
        for id in self.resources.ids() {
            let rebuilt = self.resources.get(id).and_then(|slot| {
                build_native(&mut self.backend, &self.resources, id, slot.description())
            });
            match rebuilt {
                Ok(native) => {
                    if let Ok(slot) = self.resources.get_mut(id) {
                        slot.restore(native);
                    }
                }
                Err(err) => {
                    failures += 1;
                    log::error!("Failed to restore resource {id}: {err}");
                }
            }
        }

        for command in self.bound.commands() {
            if let Err(err) = self.execute(&command) {
                log::debug!("Could not rebind {} after reload: {err}", command.kind());
            }
        }

        lock(&self.shared.stats).reloads += 1;
        self.shared.set_state(DeviceState::Running);
        if failures == 0 {
            log::info!("Render device restored");
        } else {
            log::warn!("Render device restored with {failures} resources missing");
        }
        (self.callback)(DeviceEvent::DeviceRestored);
        Ok(())
    }
}

impl<B: RenderBackend> DeviceServices for CommandProcessor<B> {
    fn driver(&self) -> Driver {
        self.backend.driver()
    }

    fn generate_screenshot(&mut self, path: &Path) -> Result<(), ExecutionError> {
        self.backend.generate_screenshot(path)
    }

    fn contains_resource(&self, id: ResourceId) -> bool {
        self.resources.contains(id)
    }

    fn live_resources(&self) -> Vec<ResourceId> {
        self.resources.ids()
    }

    fn stats(&self) -> FrameStats {
        self.shared.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Extent2D;
    use crate::renderer::device::mock::{MockBackend, MockCall};
    use std::collections::BTreeSet;
    use std::sync::atomic::Ordering;

    // Ids 1 to ISSUED_IDS are handed out before each test.
    const ISSUED_IDS: usize = 16;

    type Events = Arc<Mutex<Vec<DeviceEvent>>>;

    fn processor(backend: MockBackend) -> (CommandProcessor<MockBackend>, Events) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let callback: EventCallback =
            Arc::new(move |event: DeviceEvent| sink.lock().unwrap().push(event));
        let shared = Arc::new(SharedDeviceState::new(DeviceState::Running));
        let resource_ids = Arc::new(ResourceIdAllocator::new());
        for _ in 0..ISSUED_IDS {
            resource_ids.allocate();
        }
        (
            CommandProcessor::new(backend, callback, shared, resource_ids),
            events,
        )
    }

    fn buffer_of(commands: Vec<Command>) -> CommandBuffer {
        let mut buffer = CommandBuffer::new();
        for command in commands {
            buffer.push_command(command);
        }
        buffer
    }

    fn init_buffer(id: usize) -> Command {
        Command::InitBuffer {
            buffer: ResourceId(id),
            desc: BufferDescriptor::with_data(BufferType::Vertex, vec![1, 2, 3, 4]),
        }
    }

    fn draw(index: usize, vertex: usize) -> Command {
        Command::Draw(DrawParams {
            index_buffer: ResourceId(index),
            index_count: 3,
            index_size: 2,
            vertex_buffer: ResourceId(vertex),
            draw_mode: DrawMode::TriangleList,
            start_index: 0,
        })
    }

    #[test]
    fn failing_command_does_not_stop_the_buffer() {
        let backend = MockBackend::new();
        let calls = backend.calls();
        let (mut processor, events) = processor(backend);

        processor
            .execute_buffer(buffer_of(vec![draw(7, 8), Command::Present]))
            .unwrap();

        let stats = processor.stats();
        assert_eq!(stats.command_errors, 1);
        assert_eq!(stats.commands_executed, 1);
        assert_eq!(stats.frames_presented, 1);
        assert_eq!(*calls.lock().unwrap(), vec![MockCall::Present]);
        assert_eq!(*events.lock().unwrap(), vec![DeviceEvent::Frame]);
    }

    #[test]
    fn wrong_resource_kind_is_rejected() {
        let (mut processor, _) = processor(MockBackend::new());
        processor
            .execute(&Command::InitBlendState {
                blend_state: ResourceId(1),
                desc: BlendStateDescriptor::default(),
            })
            .unwrap();
        processor.execute(&init_buffer(2)).unwrap();

        let err = processor.execute(&draw(1, 2)).unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::ResourceTypeMismatch { id: ResourceId(1), .. }
        ));
    }

    #[test]
    fn draws_are_counted_per_frame() {
        let backend = MockBackend::new();
        let calls = backend.calls();
        let (mut processor, _) = processor(backend);
        processor
            .execute_buffer(buffer_of(vec![
                init_buffer(1),
                init_buffer(2),
                draw(1, 2),
                draw(1, 2),
                Command::Present,
                draw(1, 2),
            ]))
            .unwrap();

        assert_eq!(processor.stats().draw_calls, 2);
        let draws = calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == MockCall::Draw(ResourceId(1), ResourceId(2)))
            .count();
        assert_eq!(draws, 3);
    }

    #[test]
    fn delete_releases_the_resource_once() {
        let backend = MockBackend::new();
        let calls = backend.calls();
        let (mut processor, _) = processor(backend);

        processor.execute(&init_buffer(1)).unwrap();
        processor
            .execute(&Command::DeleteResource {
                resource: ResourceId(1),
            })
            .unwrap();
        assert!(!processor.contains_resource(ResourceId(1)));
        assert!(calls.lock().unwrap().contains(&MockCall::Released(ResourceId(1))));

        let err = processor
            .execute(&Command::DeleteResource {
                resource: ResourceId(1),
            })
            .unwrap_err();
        assert_eq!(err, ExecutionError::UnknownResource(ResourceId(1)));
    }

    #[test]
    fn device_loss_rebuilds_and_retries_the_command() {
        let backend = MockBackend::new();
        let calls = backend.calls();
        let losses = backend.device_losses();
        let (mut processor, events) = processor(backend);

        processor
            .execute_buffer(buffer_of(vec![
                Command::InitBuffer {
                    buffer: ResourceId(1),
                    desc: BufferDescriptor::dynamic(BufferType::Vertex, 4),
                },
                Command::SetBufferData {
                    buffer: ResourceId(1),
                    data: vec![9, 9, 9, 9],
                },
            ]))
            .unwrap();
        calls.lock().unwrap().clear();

        losses.store(1, Ordering::Release);
        processor.execute_buffer(buffer_of(vec![Command::Present])).unwrap();

        assert_eq!(
            *calls.lock().unwrap(),
            vec![MockCall::Recreate, MockCall::Create(ResourceId(1)), MockCall::Present]
        );
        match processor.resources().get(ResourceId(1)).unwrap().description() {
            ResourceDescription::Buffer(desc) => assert_eq!(desc.data, vec![9, 9, 9, 9]),
            other => panic!("unexpected description {other:?}"),
        }
        let stats = processor.stats();
        assert_eq!(stats.reloads, 1);
        assert_eq!(stats.command_errors, 0);
        assert_eq!(
            *events.lock().unwrap(),
            vec![DeviceEvent::DeviceLost, DeviceEvent::DeviceRestored, DeviceEvent::Frame]
        );
    }

    #[test]
    fn textures_are_restored_before_their_render_targets() {
        let backend = MockBackend::new();
        let calls = backend.calls();
        let (mut processor, _) = processor(backend);
        let size = Extent2D::new(4, 4);

        processor
            .execute_buffer(buffer_of(vec![
                Command::InitTexture {
                    texture: ResourceId(1),
                    desc: TextureDescriptor::new_2d(
                        size,
                        PixelFormat::Rgba8UnsignedNorm,
                        Vec::new(),
                    ),
                },
                Command::SetTextureData {
                    texture: ResourceId(1),
                    levels: vec![TextureLevel::new(size, vec![0; 64])],
                    face: CubeFace::default(),
                },
                Command::InitRenderTarget {
                    render_target: ResourceId(2),
                    desc: RenderTargetDescriptor {
                        color_textures: BTreeSet::from([ResourceId(1)]),
                        depth_texture: ResourceId::NULL,
                    },
                },
            ]))
            .unwrap();
        calls.lock().unwrap().clear();

        processor.recover_device().unwrap();
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                MockCall::Recreate,
                MockCall::Create(ResourceId(1)),
                MockCall::SetTextureData(ResourceId(1), CubeFace::default()),
                MockCall::Create(ResourceId(2)),
            ]
        );
    }

    #[test]
    fn unrestored_resources_report_errors_without_another_reload() {
        let backend = MockBackend::new();
        let failing = backend.failing_resources();
        let (mut processor, _) = processor(backend);
        processor.execute(&init_buffer(1)).unwrap();
        processor.execute(&init_buffer(2)).unwrap();

        failing.lock().unwrap().insert(ResourceId(1));
        processor.recover_device().unwrap();

        assert!(!processor.resources().get(ResourceId(1)).unwrap().is_valid());
        assert!(processor.resources().get(ResourceId(2)).unwrap().is_valid());
        let err = processor.execute(&draw(1, 2)).unwrap_err();
        assert!(matches!(err, ExecutionError::Backend(_)));
        assert_eq!(processor.stats().reloads, 1);
    }

    #[test]
    fn failed_recreate_is_fatal() {
        let backend = MockBackend::new().failing_recreate();
        let (mut processor, _) = processor(backend);
        processor.execute(&init_buffer(1)).unwrap();

        let err = processor.recover_device().unwrap_err();
        assert!(matches!(err, RenderError::ReloadFailed(_)));
        assert_eq!(processor.shared.state(), DeviceState::Stopped);
    }

    #[test]
    fn unissued_ids_cannot_be_initialized() {
        let backend = MockBackend::new();
        let calls = backend.calls();
        let (mut processor, _) = processor(backend);

        for id in [ISSUED_IDS + 1, usize::MAX] {
            let err = processor
                .execute(&Command::InitBlendState {
                    blend_state: ResourceId(id),
                    desc: BlendStateDescriptor::default(),
                })
                .unwrap_err();
            assert_eq!(err, ExecutionError::UnknownResource(ResourceId(id)));
        }
        assert!(calls.lock().unwrap().is_empty());
        assert!(processor.live_resources().is_empty());
    }

    #[test]
    fn bound_state_is_set_again_after_a_loss() {
        let backend = MockBackend::new();
        let calls = backend.calls();
        let losses = backend.device_losses();
        let (mut processor, _) = processor(backend);
        let size = Extent2D::new(4, 4);

        processor
            .execute_buffer(buffer_of(vec![
                Command::InitTexture {
                    texture: ResourceId(1),
                    desc: TextureDescriptor::new_2d(
                        size,
                        PixelFormat::Rgba8UnsignedNorm,
                        Vec::new(),
                    ),
                },
                Command::InitRenderTarget {
                    render_target: ResourceId(2),
                    desc: RenderTargetDescriptor {
                        color_textures: BTreeSet::from([ResourceId(1)]),
                        depth_texture: ResourceId::NULL,
                    },
                },
                init_buffer(3),
                init_buffer(4),
                Command::SetRenderTarget {
                    render_target: ResourceId(2),
                },
                Command::SetTextures {
                    textures: vec![ResourceId(1)],
                },
            ]))
            .unwrap();
        calls.lock().unwrap().clear();

        losses.store(1, Ordering::Release);
        processor.execute_buffer(buffer_of(vec![draw(3, 4)])).unwrap();

        let calls = calls.lock().unwrap();
        let target = calls
            .iter()
            .position(|c| *c == MockCall::SetRenderTarget(Some(ResourceId(2))))
            .unwrap();
        let textures = calls
            .iter()
            .position(|c| *c == MockCall::SetTextures(vec![Some(ResourceId(1))]))
            .unwrap();
        let draw = calls
            .iter()
            .position(|c| *c == MockCall::Draw(ResourceId(3), ResourceId(4)))
            .unwrap();
        assert!(calls.iter().position(|c| *c == MockCall::Recreate).unwrap() < target);
        assert!(target < textures && textures < draw);
        assert_eq!(processor.stats().command_errors, 0);
    }
}
