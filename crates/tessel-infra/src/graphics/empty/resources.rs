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

//! CPU-side stand-ins for native resources.

use tessel_core::math::Extent2D;
use tessel_core::renderer::{
    BufferType, PixelFormat, ResourceFlags, ResourceId, ShaderDescriptor, TextureDescriptor,
    TextureParameters, TextureType,
};

/// A render target; only its attachment layout is kept.
#[derive(Debug)]
pub struct EmptyRenderTarget {
    pub id: ResourceId,
    pub color_attachments: usize,
    pub has_depth: bool,
    pub size: Extent2D,
}

/// A blend or depth/stencil state. The description lives in the resource table.
#[derive(Debug)]
pub struct EmptyState {
    pub id: ResourceId,
}

#[derive(Debug)]
pub struct EmptyBuffer {
    pub id: ResourceId,
    pub buffer_type: BufferType,
    pub flags: ResourceFlags,
    /// Always `size` bytes long.
    pub data: Vec<u8>,
}

impl EmptyBuffer {
    pub fn is_dynamic(&self) -> bool {
        self.flags.contains(ResourceFlags::DYNAMIC)
    }
}

#[derive(Debug)]
pub struct EmptyShader {
    pub id: ResourceId,
    pub fragment_constants: usize,
    pub vertex_constants: usize,
}

impl EmptyShader {
    pub(crate) fn compile(id: ResourceId, desc: &ShaderDescriptor) -> Result<Self, String> {
        check_entry_point("fragment", &desc.fragment_shader, &desc.fragment_function)?;
        check_entry_point("vertex", &desc.vertex_shader, &desc.vertex_function)?;
        Ok(Self {
            id,
            fragment_constants: desc.fragment_constants.len(),
            vertex_constants: desc.vertex_constants.len(),
        })
    }
}

// An entry point must be named somewhere in its stage's source.
fn check_entry_point(stage: &str, source: &[u8], function: &str) -> Result<(), String> {
    if function.is_empty() {
        return Ok(());
    }
    let found = source
        .windows(function.len())
        .any(|window| window == function.as_bytes());
    if found {
        Ok(())
    } else {
        Err(format!("{stage} entry point '{function}' not found"))
    }
}

#[derive(Debug)]
pub struct EmptyTexture {
    pub id: ResourceId,
    pub texture_type: TextureType,
    pub pixel_format: PixelFormat,
    pub flags: ResourceFlags,
    pub size: Extent2D,
    /// Contents of each mip level, zero-filled when uploaded without data.
    pub levels: Vec<Vec<u8>>,
    pub params: TextureParameters,
}

impl EmptyTexture {
    pub(crate) fn new(id: ResourceId, desc: &TextureDescriptor) -> Self {
        let bytes_per_pixel = desc.pixel_format.bytes_per_pixel() as usize;
        let levels = desc
            .levels
            .iter()
            .map(|level| {
                if level.data.is_empty() {
                    vec![0; level.size.area() as usize * bytes_per_pixel]
                } else {
                    level.data.clone()
                }
            })
            .collect();
        Self {
            id,
            texture_type: desc.texture_type,
            pixel_format: desc.pixel_format,
            flags: desc.flags,
            size: desc.size(),
            levels,
            params: TextureParameters {
                filter: desc.filter,
                max_anisotropy: desc.max_anisotropy,
                ..TextureParameters::default()
            },
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.flags.contains(ResourceFlags::DYNAMIC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_core::renderer::{DataType, ShaderConstantInfo};

    #[test]
    fn shader_entry_points_must_exist_in_the_source() {
        let mut desc = ShaderDescriptor {
            fragment_shader: b"void fs_main() {}".to_vec(),
            vertex_shader: b"void vs_main() {}".to_vec(),
            fragment_function: "fs_main".into(),
            vertex_function: "vs_main".into(),
            vertex_constants: vec![ShaderConstantInfo::new("mvp", DataType::Matrix4)],
            ..ShaderDescriptor::default()
        };
        let shader = EmptyShader::compile(ResourceId(1), &desc).unwrap();
        assert_eq!(shader.vertex_constants, 1);

        desc.vertex_function = "main".into();
        let err = EmptyShader::compile(ResourceId(1), &desc).unwrap_err();
        assert!(err.contains("vertex entry point 'main'"));
    }

    #[test]
    fn texture_levels_without_data_are_zero_filled() {
        let desc =
            TextureDescriptor::new_2d(Extent2D::new(2, 2), PixelFormat::R32Float, Vec::new());
        let texture = EmptyTexture::new(ResourceId(3), &desc);
        assert_eq!(texture.levels, vec![vec![0; 16]]);
        assert_eq!(texture.size, Extent2D::new(2, 2));
    }
}
