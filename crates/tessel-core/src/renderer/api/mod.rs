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

//! Backend-agnostic data types of the render command protocol.
//!
//! Nothing in here names a native graphics API: backends translate these
//! values into their own vocabulary on the render thread.

pub mod buffer;
pub mod command;
pub mod command_buffer;
pub mod driver;
pub mod flags;
pub mod resource;
pub mod settings;
pub mod shader;
pub mod state;
pub mod stats;
pub mod texture;

pub use self::buffer::*;
pub use self::command::*;
pub use self::command_buffer::*;
pub use self::driver::*;
pub use self::flags::*;
pub use self::resource::*;
pub use self::settings::*;
pub use self::shader::*;
pub use self::state::*;
pub use self::stats::*;
pub use self::texture::*;
