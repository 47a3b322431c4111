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

//! Shader program descriptions.
//!
//! Shader code is carried as opaque bytes: the pipeline neither parses nor
//! compiles it, the backend does.

use std::collections::BTreeSet;

/// The type of a vertex attribute or shader constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Byte,
    Byte2,
    Byte4,
    UnsignedByte,
    UnsignedByte2,
    UnsignedByte4,
    Short,
    Short2,
    Short4,
    UnsignedShort,
    UnsignedShort2,
    UnsignedShort4,
    Integer,
    Integer2,
    Integer3,
    Integer4,
    UnsignedInteger,
    UnsignedInteger2,
    UnsignedInteger3,
    UnsignedInteger4,
    Float,
    Float2,
    Float3,
    Float4,
    Matrix3,
    Matrix4,
}

impl DataType {
    /// Size of one value of this type, in bytes.
    pub const fn size(&self) -> u32 {
        match self {
            DataType::Byte | DataType::UnsignedByte => 1,
            DataType::Byte2 | DataType::UnsignedByte2 => 2,
            DataType::Byte4 | DataType::UnsignedByte4 => 4,
            DataType::Short | DataType::UnsignedShort => 2,
            DataType::Short2 | DataType::UnsignedShort2 => 4,
            DataType::Short4 | DataType::UnsignedShort4 => 8,
            DataType::Integer | DataType::UnsignedInteger | DataType::Float => 4,
            DataType::Integer2 | DataType::UnsignedInteger2 | DataType::Float2 => 8,
            DataType::Integer3 | DataType::UnsignedInteger3 | DataType::Float3 => 12,
            DataType::Integer4 | DataType::UnsignedInteger4 | DataType::Float4 => 16,
            DataType::Matrix3 => 36,
            DataType::Matrix4 => 64,
        }
    }

    /// Number of `f32` values needed to fill a constant of this type.
    pub const fn float_count(&self) -> usize {
        (self.size() / 4) as usize
    }
}

/// The semantic of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VertexUsage {
    Binormal,
    BlendIndices,
    BlendWeight,
    Color,
    Normal,
    Position,
    PositionTransformed,
    PointSize,
    Tangent,
    TextureCoordinates0,
    TextureCoordinates1,
}

/// A named constant slot declared by a shader stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderConstantInfo {
    pub name: String,
    pub data_type: DataType,
}

impl ShaderConstantInfo {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Everything a backend needs to build (or rebuild) a shader program.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShaderDescriptor {
    pub fragment_shader: Vec<u8>,
    pub vertex_shader: Vec<u8>,
    /// Vertex attributes consumed by the vertex stage.
    pub vertex_attributes: BTreeSet<VertexUsage>,
    /// Constant slots of the fragment stage, in binding order.
    pub fragment_constants: Vec<ShaderConstantInfo>,
    /// Constant slots of the vertex stage, in binding order.
    pub vertex_constants: Vec<ShaderConstantInfo>,
    /// Entry point of the fragment stage. Empty selects the backend default.
    pub fragment_function: String,
    /// Entry point of the vertex stage. Empty selects the backend default.
    pub vertex_function: String,
}
