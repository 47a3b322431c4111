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

//! The `empty` driver: a backend that executes every command against
//! CPU-side state without touching a GPU.
//!
//! It validates what a real driver would reject, keeps a colour buffer that
//! clears write into (so screenshots have content), and records what it
//! executed in a [`Journal`] that tests inspect.

mod backend;
mod framebuffer;
mod journal;
mod resources;

pub use self::backend::{DeviceLossTrigger, EmptyBackend};
pub use self::framebuffer::Framebuffer;
pub use self::journal::{Journal, JournalEntry};
pub use self::resources::{EmptyBuffer, EmptyRenderTarget, EmptyShader, EmptyState, EmptyTexture};
