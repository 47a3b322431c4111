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

//! Execution statistics of the render device.

use std::time::Duration;

/// Counters maintained by the render thread, readable from any thread.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    /// Number of `Present` commands executed.
    pub frames_presented: u64,
    /// Number of commands executed successfully.
    pub commands_executed: u64,
    /// Number of commands whose execution failed and was skipped.
    pub command_errors: u64,
    /// Draw calls executed during the last presented frame.
    pub draw_calls: u32,
    /// Frame rate derived from the last frame interval.
    pub current_fps: f32,
    /// Frames counted over the last full second.
    pub accumulated_fps: f32,
    /// Number of completed device-lost reloads.
    pub reloads: u32,
}

/// Derives frame rates from successive frame intervals.
#[derive(Debug, Default)]
pub struct FpsCounter {
    accumulated_time: Duration,
    accumulated_frames: u32,
    current_fps: f32,
    accumulated_fps: f32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one frame that took `delta` since the previous one.
    pub fn record_frame(&mut self, delta: Duration) {
        if !delta.is_zero() {
            self.current_fps = 1.0 / delta.as_secs_f32();
        }

        self.accumulated_time += delta;
        self.accumulated_frames += 1;

        if self.accumulated_time > Duration::from_secs(1) {
            self.accumulated_fps =
                self.accumulated_frames as f32 / self.accumulated_time.as_secs_f32();
            self.accumulated_time = Duration::ZERO;
            self.accumulated_frames = 0;
        }
    }

    pub fn current_fps(&self) -> f32 {
        self.current_fps
    }

    pub fn accumulated_fps(&self) -> f32 {
        self.accumulated_fps
    }
}
