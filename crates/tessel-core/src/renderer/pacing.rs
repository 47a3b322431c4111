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

use crate::utils::sync::lock;
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Bounds how far the logic thread may run ahead of the render thread.
///
/// Holds up to `lead` frame tokens and starts full. The logic thread takes a
/// token per frame in [`wait`](Self::wait); the render thread gives one back
/// with [`signal`](Self::signal) after each present.
#[derive(Debug)]
pub struct FrameSync {
    tokens: Mutex<u32>,
    lead: u32,
    frame_ready: Condvar,
}

impl FrameSync {
    pub fn new(lead: u32) -> Self {
        let lead = lead.max(1);
        Self {
            tokens: Mutex::new(lead),
            lead,
            frame_ready: Condvar::new(),
        }
    }

    pub fn lead(&self) -> u32 {
        self.lead
    }

    /// Frames the logic thread may still start without blocking.
    pub fn available(&self) -> u32 {
        *lock(&self.tokens)
    }

    /// Called from the render thread when a frame was presented.
    pub fn signal(&self) {
        let mut tokens = lock(&self.tokens);
        if *tokens < self.lead {
            *tokens += 1;
        }
        self.frame_ready.notify_one();
    }

    /// Blocks until a frame token is available and takes it.
    pub fn wait(&self) {
        let mut tokens = self
            .frame_ready
            .wait_while(lock(&self.tokens), |tokens| *tokens == 0)
            .unwrap_or_else(PoisonError::into_inner);
        *tokens -= 1;
    }

    /// Like [`wait`](Self::wait), giving up after `timeout`.
    ///
    /// Returns `false` on timeout, in which case no token was taken.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut tokens = lock(&self.tokens);
        while *tokens == 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            tokens = self
                .frame_ready
                .wait_timeout(tokens, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        *tokens -= 1;
        true
    }
}

impl Default for FrameSync {
    fn default() -> Self {
        Self::new(1)
    }
}
