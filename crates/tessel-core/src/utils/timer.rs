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

//! Monotonic timing helpers used for frame statistics.

use std::time::{Duration, Instant};

/// A restartable monotonic stopwatch.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start_time: Instant,
}

impl Stopwatch {
    /// Creates a stopwatch that starts counting immediately.
    #[inline]
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    /// Time elapsed since the stopwatch was created or last lapped.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Elapsed time in seconds as `f32`.
    #[inline]
    pub fn elapsed_secs_f32(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }

    /// Returns the elapsed time and restarts the stopwatch from now.
    ///
    /// Used once per presented frame to measure the frame delta.
    pub fn lap(&mut self) -> Duration {
        let now = Instant::now();
        let delta = now.duration_since(self.start_time);
        self.start_time = now;
        delta
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}
