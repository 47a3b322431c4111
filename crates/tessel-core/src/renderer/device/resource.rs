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

//! Resource-table entries and the invalidation/restore protocol.
//!
//! Each entry pairs the backend's native object with the last-known
//! description it was built from. Invalidating an entry drops the native
//! object and keeps the description; restoring rebuilds the native object
//! from it. This is how a lost device gets its resources back without the
//! renderer noticing.

use super::resource_table::ResourceTable;
use crate::renderer::api::*;
use crate::renderer::error::ExecutionError;
use crate::renderer::traits::RenderBackend;
use std::fmt;

/// The kind of object a resource id names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    RenderTarget,
    DepthStencilState,
    BlendState,
    Buffer,
    Shader,
    Texture,
}

impl ResourceKind {
    pub const fn name(&self) -> &'static str {
        match self {
            ResourceKind::RenderTarget => "render target",
            ResourceKind::DepthStencilState => "depth/stencil state",
            ResourceKind::BlendState => "blend state",
            ResourceKind::Buffer => "buffer",
            ResourceKind::Shader => "shader",
            ResourceKind::Texture => "texture",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The retained, backend-independent description of a resource.
///
/// Updates applied after creation are folded in, so rebuilding from the
/// description reproduces the resource's latest contents.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceDescription {
    RenderTarget(RenderTargetDescriptor),
    DepthStencilState(DepthStencilStateDescriptor),
    BlendState(BlendStateDescriptor),
    Buffer(BufferDescriptor),
    Shader(ShaderDescriptor),
    Texture {
        desc: TextureDescriptor,
        /// Contents uploaded after creation, per face, in upload order.
        uploads: Vec<(CubeFace, Vec<TextureLevel>)>,
        /// Sampler parameters set after creation.
        params: Option<TextureParameters>,
    },
}

impl ResourceDescription {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceDescription::RenderTarget(_) => ResourceKind::RenderTarget,
            ResourceDescription::DepthStencilState(_) => ResourceKind::DepthStencilState,
            ResourceDescription::BlendState(_) => ResourceKind::BlendState,
            ResourceDescription::Buffer(_) => ResourceKind::Buffer,
            ResourceDescription::Shader(_) => ResourceKind::Shader,
            ResourceDescription::Texture { .. } => ResourceKind::Texture,
        }
    }

    /// Folds a buffer upload into the description.
    pub fn record_buffer_data(&mut self, data: &[u8]) {
        if let ResourceDescription::Buffer(desc) = self {
            desc.data = data.to_vec();
        }
    }

    /// Folds a texture upload into the description.
    ///
    /// A later upload to the same face supersedes an earlier one.
    pub fn record_texture_data(&mut self, face: CubeFace, levels: &[TextureLevel]) {
        if let ResourceDescription::Texture { uploads, .. } = self {
            uploads.retain(|(uploaded_face, _)| *uploaded_face != face);
            uploads.push((face, levels.to_vec()));
        }
    }

    pub fn record_texture_parameters(&mut self, new_params: &TextureParameters) {
        if let ResourceDescription::Texture { params, .. } = self {
            *params = Some(*new_params);
        }
    }
}

/// A backend-native object, tagged with its kind.
pub enum NativeResource<B: RenderBackend> {
    RenderTarget(B::RenderTarget),
    DepthStencilState(B::DepthStencilState),
    BlendState(B::BlendState),
    Buffer(B::Buffer),
    Shader(B::Shader),
    Texture(B::Texture),
}

impl<B: RenderBackend> NativeResource<B> {
    pub fn kind(&self) -> ResourceKind {
        match self {
            NativeResource::RenderTarget(_) => ResourceKind::RenderTarget,
            NativeResource::DepthStencilState(_) => ResourceKind::DepthStencilState,
            NativeResource::BlendState(_) => ResourceKind::BlendState,
            NativeResource::Buffer(_) => ResourceKind::Buffer,
            NativeResource::Shader(_) => ResourceKind::Shader,
            NativeResource::Texture(_) => ResourceKind::Texture,
        }
    }
}

/// One resource-table entry.
pub struct ResourceSlot<B: RenderBackend> {
    description: ResourceDescription,
    native: Option<NativeResource<B>>,
}

impl<B: RenderBackend> fmt::Debug for ResourceSlot<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceSlot")
            .field("kind", &self.description.kind())
            .field("valid", &self.is_valid())
            .finish()
    }
}

impl<B: RenderBackend> ResourceSlot<B> {
    pub fn new(description: ResourceDescription, native: NativeResource<B>) -> Self {
        Self {
            description,
            native: Some(native),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.description.kind()
    }

    pub fn description(&self) -> &ResourceDescription {
        &self.description
    }

    pub fn description_mut(&mut self) -> &mut ResourceDescription {
        &mut self.description
    }

    /// Whether the native object exists.
    pub fn is_valid(&self) -> bool {
        self.native.is_some()
    }

    /// Drops the native object, keeping the description for [`restore`].
    ///
    /// [`restore`]: ResourceSlot::restore
    pub fn invalidate(&mut self) {
        self.native = None;
    }

    /// Installs a native object rebuilt from the retained description.
    pub fn restore(&mut self, native: NativeResource<B>) {
        self.native = Some(native);
    }

    /// The native object, or an error if it was not restored after a loss.
    pub fn native(&self) -> Result<&NativeResource<B>, ExecutionError> {
        self.native.as_ref().ok_or_else(not_restored)
    }

    pub fn native_mut(&mut self) -> Result<&mut NativeResource<B>, ExecutionError> {
        self.native.as_mut().ok_or_else(not_restored)
    }
}

fn not_restored() -> ExecutionError {
    ExecutionError::Backend("resource was not restored after device loss".to_owned())
}

/// The resource table as the render device keeps it.
pub type Resources<B> = ResourceTable<ResourceSlot<B>>;

fn mismatch(id: ResourceId, expected: ResourceKind, found: ResourceKind) -> ExecutionError {
    ExecutionError::ResourceTypeMismatch {
        id,
        expected: expected.name(),
        found: found.name(),
    }
}

/// Typed lookups into the resource table.
pub trait ResourceLookup<B: RenderBackend> {
    fn render_target(&self, id: ResourceId) -> Result<&B::RenderTarget, ExecutionError>;
    fn depth_stencil_state(&self, id: ResourceId) -> Result<&B::DepthStencilState, ExecutionError>;
    fn blend_state(&self, id: ResourceId) -> Result<&B::BlendState, ExecutionError>;
    fn buffer(&self, id: ResourceId) -> Result<&B::Buffer, ExecutionError>;
    fn shader(&self, id: ResourceId) -> Result<&B::Shader, ExecutionError>;
    fn texture(&self, id: ResourceId) -> Result<&B::Texture, ExecutionError>;
    fn buffer_mut(&mut self, id: ResourceId) -> Result<&mut B::Buffer, ExecutionError>;
    fn texture_mut(&mut self, id: ResourceId) -> Result<&mut B::Texture, ExecutionError>;

    /// Resolves an optional binding: the null id yields `None`.
    fn optional<'a, T: 'a>(
        &'a self,
        id: ResourceId,
        lookup: impl FnOnce(&'a Self, ResourceId) -> Result<&'a T, ExecutionError>,
    ) -> Result<Option<&'a T>, ExecutionError> {
        if id.is_null() {
            Ok(None)
        } else {
            lookup(self, id).map(Some)
        }
    }
}

macro_rules! typed_lookup {
    ($name:ident, $variant:ident, $ty:ident) => {
        fn $name(&self, id: ResourceId) -> Result<&B::$ty, ExecutionError> {
            match self.get(id)?.native()? {
                NativeResource::$variant(native) => Ok(native),
                other => Err(mismatch(id, ResourceKind::$variant, other.kind())),
            }
        }
    };
    (mut $name:ident, $variant:ident, $ty:ident) => {
        fn $name(&mut self, id: ResourceId) -> Result<&mut B::$ty, ExecutionError> {
            match self.get_mut(id)?.native_mut()? {
                NativeResource::$variant(native) => Ok(native),
                other => Err(mismatch(id, ResourceKind::$variant, other.kind())),
            }
        }
    };
}

impl<B: RenderBackend> ResourceLookup<B> for Resources<B> {
    typed_lookup!(render_target, RenderTarget, RenderTarget);
    typed_lookup!(depth_stencil_state, DepthStencilState, DepthStencilState);
    typed_lookup!(blend_state, BlendState, BlendState);
    typed_lookup!(buffer, Buffer, Buffer);
    typed_lookup!(shader, Shader, Shader);
    typed_lookup!(texture, Texture, Texture);
    typed_lookup!(mut buffer_mut, Buffer, Buffer);
    typed_lookup!(mut texture_mut, Texture, Texture);
}

/// Builds the native object for `description` and replays the uploads folded
/// into it.
///
/// Resources referenced by the description (render-target attachments) are
/// resolved through `resources`, so they must already be valid.
pub fn build_native<B: RenderBackend>(
    backend: &mut B,
    resources: &Resources<B>,
    id: ResourceId,
    description: &ResourceDescription,
) -> Result<NativeResource<B>, ExecutionError> {
    let native = match description {
        ResourceDescription::RenderTarget(desc) => {
            let color_textures = desc
                .color_textures
                .iter()
                .map(|texture| resources.texture(*texture))
                .collect::<Result<Vec<_>, _>>()?;
            let depth_texture = resources.optional(desc.depth_texture, |r, id| r.texture(id))?;
            NativeResource::RenderTarget(backend.create_render_target(
                id,
                desc,
                &color_textures,
                depth_texture,
            )?)
        }
        ResourceDescription::DepthStencilState(desc) => {
            NativeResource::DepthStencilState(backend.create_depth_stencil_state(id, desc)?)
        }
        ResourceDescription::BlendState(desc) => {
            NativeResource::BlendState(backend.create_blend_state(id, desc)?)
        }
        ResourceDescription::Buffer(desc) => {
            NativeResource::Buffer(backend.create_buffer(id, desc)?)
        }
        ResourceDescription::Shader(desc) => {
            NativeResource::Shader(backend.create_shader(id, desc)?)
        }
        ResourceDescription::Texture {
            desc,
            uploads,
            params,
        } => {
            let mut texture = backend.create_texture(id, desc)?;
            for (face, levels) in uploads {
                backend.set_texture_data(&mut texture, levels, *face)?;
            }
            if let Some(params) = params {
                backend.set_texture_parameters(&mut texture, params)?;
            }
            NativeResource::Texture(texture)
        }
    };
    Ok(native)
}
