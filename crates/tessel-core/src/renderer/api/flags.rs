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

//! Flag sets shared by several resource descriptions.

use crate::tessel_bitflags;

tessel_bitflags! {
    /// Usage hints attached to buffers and textures at creation time.
    ///
    /// Backends use them to pick a storage class and to validate later
    /// updates: only `DYNAMIC` resources accept `Set*Data` commands.
    pub struct ResourceFlags: u32 {
        /// Contents are rewritten after creation.
        const DYNAMIC = 1 << 0;
        /// A texture can be attached to a render target.
        const BIND_RENDER_TARGET = 1 << 1;
        /// A render-target texture can be sampled by shaders.
        const BIND_SHADER = 1 << 2;
        /// A multisampled render-target texture can be sampled by shaders.
        const BIND_SHADER_MSAA = 1 << 3;
    }
}

tessel_bitflags! {
    /// Channels written to the color attachment by a blend state.
    pub struct ColorMask: u8 {
        const RED = 0x01;
        const GREEN = 0x02;
        const BLUE = 0x04;
        const ALPHA = 0x08;
        const ALL = 0x0F;
    }
}
