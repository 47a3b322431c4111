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

//! A recording backend for the device's unit tests.

use crate::math::{Extent2D, Rect};
use crate::platform::SurfaceHandle;
use crate::renderer::api::*;
use crate::renderer::error::{ExecutionError, RenderError};
use crate::renderer::traits::RenderBackend;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Init,
    Recreate,
    Resize(Extent2D),
    Present,
    Create(ResourceId),
    Released(ResourceId),
    SetBufferData(ResourceId, Vec<u8>),
    SetTextureData(ResourceId, CubeFace),
    SetTextureParameters(ResourceId),
    SetRenderTarget(Option<ResourceId>),
    Clear,
    Scissor(bool),
    Viewport(Rect),
    SetDepthStencil(Option<ResourceId>, u32),
    SetPipeline(Option<ResourceId>, Option<ResourceId>),
    ShaderConstants(usize, usize),
    SetTextures(Vec<Option<ResourceId>>),
    Draw(ResourceId, ResourceId),
    PushMarker(String),
    PopMarker,
}

#[derive(Debug)]
pub struct MockResource {
    pub id: ResourceId,
}

pub struct MockBackend {
    calls: Arc<Mutex<Vec<MockCall>>>,
    fail_init: bool,
    fail_recreate: bool,
    panic_on_present: bool,
    gate: Option<flume::Receiver<()>>,
    losses: Arc<AtomicUsize>,
    failing: Arc<Mutex<HashSet<ResourceId>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_init: false,
            fail_recreate: false,
            panic_on_present: false,
            gate: None,
            losses: Arc::new(AtomicUsize::new(0)),
            failing: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn failing_recreate(mut self) -> Self {
        self.fail_recreate = true;
        self
    }

    pub fn panicking_present(mut self) -> Self {
        self.panic_on_present = true;
        self
    }

    /// Makes every debug marker push block until the returned sender fires.
    pub fn gated(mut self) -> (Self, flume::Sender<()>) {
        let (tx, rx) = flume::unbounded();
        self.gate = Some(rx);
        (self, tx)
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<MockCall>>> {
        Arc::clone(&self.calls)
    }

    /// Number of upcoming draws or presents that report a device loss.
    pub fn device_losses(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.losses)
    }

    /// Ids whose creation fails from now on.
    pub fn failing_resources(&self) -> Arc<Mutex<HashSet<ResourceId>>> {
        Arc::clone(&self.failing)
    }

    fn record(&self, call: MockCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_lost(&self) -> Result<(), ExecutionError> {
        let lost = self
            .losses
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok();
        if lost {
            Err(ExecutionError::DeviceLost)
        } else {
            Ok(())
        }
    }

    fn create(&self, id: ResourceId) -> Result<MockResource, ExecutionError> {
        if self.failing.lock().unwrap().contains(&id) {
            return Err(ExecutionError::Backend(format!("cannot create {id}")));
        }
        self.record(MockCall::Create(id));
        Ok(MockResource { id })
    }
}

impl RenderBackend for MockBackend {
    type RenderTarget = MockResource;
    type DepthStencilState = MockResource;
    type BlendState = MockResource;
    type Buffer = MockResource;
    type Shader = MockResource;
    type Texture = MockResource;

    fn driver(&self) -> Driver {
        Driver::Empty
    }

    fn init(
        &mut self,
        _surface: Option<&SurfaceHandle>,
        _settings: &DeviceSettings,
    ) -> Result<(), RenderError> {
        if self.fail_init {
            return Err(RenderError::InitializationFailed("mock init failure".into()));
        }
        self.record(MockCall::Init);
        Ok(())
    }

    fn recreate(&mut self) -> Result<(), ExecutionError> {
        if self.fail_recreate {
            return Err(ExecutionError::Backend("mock recreate failure".into()));
        }
        self.record(MockCall::Recreate);
        Ok(())
    }

    fn resize(&mut self, size: Extent2D) -> Result<(), ExecutionError> {
        self.record(MockCall::Resize(size));
        Ok(())
    }

    fn present(&mut self) -> Result<(), ExecutionError> {
        if self.panic_on_present {
            panic!("mock present panic");
        }
        self.check_lost()?;
        self.record(MockCall::Present);
        Ok(())
    }

    fn create_render_target(
        &mut self,
        id: ResourceId,
        _desc: &RenderTargetDescriptor,
        _color_textures: &[&MockResource],
        _depth_texture: Option<&MockResource>,
    ) -> Result<MockResource, ExecutionError> {
        self.create(id)
    }

    fn create_depth_stencil_state(
        &mut self,
        id: ResourceId,
        _desc: &DepthStencilStateDescriptor,
    ) -> Result<MockResource, ExecutionError> {
        self.create(id)
    }

    fn create_blend_state(
        &mut self,
        id: ResourceId,
        _desc: &BlendStateDescriptor,
    ) -> Result<MockResource, ExecutionError> {
        self.create(id)
    }

    fn create_buffer(
        &mut self,
        id: ResourceId,
        _desc: &BufferDescriptor,
    ) -> Result<MockResource, ExecutionError> {
        self.create(id)
    }

    fn create_shader(
        &mut self,
        id: ResourceId,
        _desc: &ShaderDescriptor,
    ) -> Result<MockResource, ExecutionError> {
        self.create(id)
    }

    fn create_texture(
        &mut self,
        id: ResourceId,
        _desc: &TextureDescriptor,
    ) -> Result<MockResource, ExecutionError> {
        self.create(id)
    }

    fn resource_released(&mut self, id: ResourceId) {
        self.record(MockCall::Released(id));
    }

    fn set_buffer_data(
        &mut self,
        buffer: &mut MockResource,
        data: &[u8],
    ) -> Result<(), ExecutionError> {
        self.record(MockCall::SetBufferData(buffer.id, data.to_vec()));
        Ok(())
    }

    fn set_texture_data(
        &mut self,
        texture: &mut MockResource,
        _levels: &[TextureLevel],
        face: CubeFace,
    ) -> Result<(), ExecutionError> {
        self.record(MockCall::SetTextureData(texture.id, face));
        Ok(())
    }

    fn set_texture_parameters(
        &mut self,
        texture: &mut MockResource,
        _params: &TextureParameters,
    ) -> Result<(), ExecutionError> {
        self.record(MockCall::SetTextureParameters(texture.id));
        Ok(())
    }

    fn set_render_target(&mut self, target: Option<&MockResource>) -> Result<(), ExecutionError> {
        self.record(MockCall::SetRenderTarget(target.map(|t| t.id)));
        Ok(())
    }

    fn clear_render_target(&mut self, _params: &ClearParams) -> Result<(), ExecutionError> {
        self.record(MockCall::Clear);
        Ok(())
    }

    fn set_scissor_test(&mut self, enabled: bool, _rect: Rect) -> Result<(), ExecutionError> {
        self.record(MockCall::Scissor(enabled));
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Rect) -> Result<(), ExecutionError> {
        self.record(MockCall::Viewport(viewport));
        Ok(())
    }

    fn set_depth_stencil_state(
        &mut self,
        state: Option<&MockResource>,
        stencil_reference: u32,
    ) -> Result<(), ExecutionError> {
        self.record(MockCall::SetDepthStencil(state.map(|s| s.id), stencil_reference));
        Ok(())
    }

    fn set_pipeline_state(
        &mut self,
        blend_state: Option<&MockResource>,
        shader: Option<&MockResource>,
        _cull_mode: CullMode,
        _fill_mode: FillMode,
    ) -> Result<(), ExecutionError> {
        self.record(MockCall::SetPipeline(blend_state.map(|b| b.id), shader.map(|s| s.id)));
        Ok(())
    }

    fn set_shader_constants(
        &mut self,
        fragment_constants: &[Vec<f32>],
        vertex_constants: &[Vec<f32>],
    ) -> Result<(), ExecutionError> {
        self.record(MockCall::ShaderConstants(fragment_constants.len(), vertex_constants.len()));
        Ok(())
    }

    fn set_textures(&mut self, textures: &[Option<&MockResource>]) -> Result<(), ExecutionError> {
        self.record(MockCall::SetTextures(textures.iter().map(|t| t.map(|t| t.id)).collect()));
        Ok(())
    }

    fn draw(
        &mut self,
        index_buffer: &MockResource,
        vertex_buffer: &MockResource,
        _params: &DrawParams,
    ) -> Result<(), ExecutionError> {
        self.check_lost()?;
        self.record(MockCall::Draw(index_buffer.id, vertex_buffer.id));
        Ok(())
    }

    fn push_debug_marker(&mut self, name: &str) -> Result<(), ExecutionError> {
        self.record(MockCall::PushMarker(name.to_owned()));
        if let Some(gate) = &self.gate {
            let _ = gate.recv();
        }
        Ok(())
    }

    fn pop_debug_marker(&mut self) -> Result<(), ExecutionError> {
        self.record(MockCall::PopMarker);
        Ok(())
    }
}
