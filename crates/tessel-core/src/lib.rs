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

//! # Tessel Core
//!
//! Backend-agnostic contracts of the Tessel render pipeline: resource ids,
//! the command protocol, the renderer frontend and the render device that
//! executes commands on a dedicated thread.

pub mod event;
pub mod math;
pub mod platform;
pub mod renderer;
pub mod utils;

pub use utils::timer::Stopwatch;
