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

//! Identifiers of the native graphics APIs a render device can drive.

use crate::renderer::error::ValidationError;
use std::fmt;

/// A graphics driver family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Driver {
    /// Executes commands without touching any GPU.
    Empty,
    OpenGL,
    Direct3D11,
    Metal,
}

impl Driver {
    /// Every driver family, in ascending order of preference.
    pub const ALL: [Driver; 4] = [
        Driver::Empty,
        Driver::OpenGL,
        Driver::Direct3D11,
        Driver::Metal,
    ];

    /// Canonical configuration name.
    pub const fn name(&self) -> &'static str {
        match self {
            Driver::Empty => "empty",
            Driver::OpenGL => "opengl",
            Driver::Direct3D11 => "direct3d11",
            Driver::Metal => "metal",
        }
    }

    /// Parses a configured driver name.
    ///
    /// `""` and `"default"` return `Ok(None)`, meaning "best available".
    pub fn parse(name: &str) -> Result<Option<Driver>, ValidationError> {
        match name {
            "" | "default" => Ok(None),
            "empty" => Ok(Some(Driver::Empty)),
            "opengl" => Ok(Some(Driver::OpenGL)),
            "direct3d11" => Ok(Some(Driver::Direct3D11)),
            "metal" => Ok(Some(Driver::Metal)),
            other => Err(ValidationError::InvalidDriver(other.to_owned())),
        }
    }

    /// Picks the preferred driver out of `available`: metal, then direct3d11,
    /// then opengl, then empty.
    pub fn best_of(available: &[Driver]) -> Driver {
        available.iter().copied().max().unwrap_or(Driver::Empty)
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
