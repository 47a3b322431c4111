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

//! The consumer side of the pipeline: a render thread driving a backend.
//!
//! [`RenderDevice`] is the handle the logic thread keeps. Command buffers are
//! moved to the render thread through a channel, executed in submission
//! order by a [`CommandProcessor`], and frame completion is reported back
//! through the event callback.

mod event;
#[cfg(test)]
pub(crate) mod mock;
mod processor;
mod resource;
mod resource_table;

pub use self::event::{DeviceEvent, DeviceState, EventCallback};
pub use self::processor::{CommandProcessor, SharedDeviceState};
pub use self::resource::{
    build_native, NativeResource, ResourceDescription, ResourceKind, ResourceLookup, ResourceSlot,
    Resources,
};
pub use self::resource_table::ResourceTable;

use crate::math::Extent2D;
use crate::platform::SurfaceHandle;
use crate::renderer::api::{
    CommandBuffer, DeviceSettings, Driver, FrameStats, ResourceIdAllocator,
};
use crate::renderer::error::RenderError;
use crate::renderer::traits::{DeviceServices, RenderBackend, RenderTask};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// How pending work is treated when a device shuts down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    /// Execute every buffer submitted before the shutdown, then stop.
    Drain,
    /// Drop every buffer not yet started, then stop.
    Discard,
}

enum DeviceMessage {
    Submit(CommandBuffer),
    Task(RenderTask),
    DeviceLost,
    Shutdown,
}

/// The logic-thread handle to a running render device.
///
/// Dropping the handle performs a draining shutdown.
pub struct RenderDevice {
    driver: Driver,
    settings: DeviceSettings,
    supported_resolutions: Vec<Extent2D>,
    sender: flume::Sender<DeviceMessage>,
    shared: Arc<SharedDeviceState>,
    discard: Arc<AtomicBool>,
    resource_ids: Arc<ResourceIdAllocator>,
    thread: Option<JoinHandle<()>>,
}

impl RenderDevice {
    /// Initializes `backend` on the calling thread, then starts the render thread.
    ///
    /// Initialization failures are returned here, before any thread exists,
    /// so the caller can fall back to another driver.
    pub fn start<B: RenderBackend>(
        mut backend: B,
        settings: DeviceSettings,
        surface: Option<SurfaceHandle>,
        callback: EventCallback,
    ) -> Result<Self, RenderError> {
        let driver = backend.driver();
        let shared = Arc::new(SharedDeviceState::new(DeviceState::Constructed));

        backend.init(surface.as_ref(), &settings)?;
        shared.set_state(DeviceState::Initialized);
        let supported_resolutions = backend.supported_resolutions();

        let (sender, receiver) = flume::unbounded();
        let discard = Arc::new(AtomicBool::new(false));
        let resource_ids = Arc::new(ResourceIdAllocator::new());
        let processor = CommandProcessor::new(
            backend,
            callback,
            Arc::clone(&shared),
            Arc::clone(&resource_ids),
        );

        shared.set_state(DeviceState::Running);
        let thread = {
            let discard = Arc::clone(&discard);
            let thread_shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("tessel-render".to_owned())
                .spawn(move || render_loop(processor, receiver, discard, thread_shared))
                .map_err(|e| {
                    shared.set_state(DeviceState::Stopped);
                    RenderError::ThreadSpawn(e.to_string())
                })?
        };
        log::info!("Render device started with the {driver} driver");

        Ok(Self {
            driver,
            settings,
            supported_resolutions,
            sender,
            shared,
            discard,
            resource_ids,
            thread: Some(thread),
        })
    }

    pub fn driver(&self) -> Driver {
        self.driver
    }

    /// The settings the device was initialized with.
    pub fn settings(&self) -> &DeviceSettings {
        &self.settings
    }

    pub fn supported_resolutions(&self) -> &[Extent2D] {
        &self.supported_resolutions
    }

    /// The id allocator shared with the producer.
    pub fn resource_ids(&self) -> Arc<ResourceIdAllocator> {
        Arc::clone(&self.resource_ids)
    }

    pub fn state(&self) -> DeviceState {
        self.shared.state()
    }

    pub fn stats(&self) -> FrameStats {
        self.shared.stats()
    }

    /// Hands `buffer` over to the render thread.
    ///
    /// Never waits for execution. Fails only once the device has stopped.
    pub fn submit_command_buffer(&self, buffer: CommandBuffer) -> Result<(), RenderError> {
        if self.state() == DeviceState::Stopped {
            return Err(RenderError::DeviceStopped);
        }
        self.sender
            .send(DeviceMessage::Submit(buffer))
            .map_err(|_| RenderError::DeviceStopped)
    }

    /// Queues `task` to run on the render thread between command buffers.
    ///
    /// The task runs after every buffer submitted before it and before every
    /// buffer submitted after it.
    pub fn execute_on_render_thread(
        &self,
        task: impl FnOnce(&mut dyn DeviceServices) + Send + 'static,
    ) -> Result<(), RenderError> {
        if self.state() == DeviceState::Stopped {
            return Err(RenderError::DeviceStopped);
        }
        self.sender
            .send(DeviceMessage::Task(Box::new(task)))
            .map_err(|_| RenderError::DeviceStopped)
    }

    /// Reports a native device or surface loss detected outside the command
    /// stream (for example by the platform layer). Resources are rebuilt
    /// before the next submitted buffer executes.
    pub fn notify_device_lost(&self) -> Result<(), RenderError> {
        self.sender
            .send(DeviceMessage::DeviceLost)
            .map_err(|_| RenderError::DeviceStopped)
    }

    /// Stops the render thread and waits for it to exit.
    ///
    /// Calling it again after the device stopped does nothing.
    pub fn shutdown(&mut self, mode: ShutdownMode) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        if mode == ShutdownMode::Discard {
            self.discard.store(true, Ordering::Release);
        }
        // The render thread may already be gone after a fatal error.
        let _ = self.sender.send(DeviceMessage::Shutdown);
        if thread.join().is_err() {
            log::error!("Render thread panicked");
            self.shared.set_state(DeviceState::Stopped);
        }
        log::info!("Render device stopped ({mode:?})");
    }
}

impl Drop for RenderDevice {
    fn drop(&mut self) {
        self.shutdown(ShutdownMode::Drain);
    }
}

// Marks the device stopped when the render thread exits, including by panic.
struct StopGuard(Arc<SharedDeviceState>);

impl Drop for StopGuard {
    fn drop(&mut self) {
        self.0.set_state(DeviceState::Stopped);
        if thread::panicking() {
            log::error!("Render thread panicked, device stopped");
        }
    }
}

fn render_loop<B: RenderBackend>(
    mut processor: CommandProcessor<B>,
    receiver: flume::Receiver<DeviceMessage>,
    discard: Arc<AtomicBool>,
    shared: Arc<SharedDeviceState>,
) {
    let _stopped = StopGuard(shared);
    log::debug!("Render thread started.");
    let mut discarded = 0usize;
    let mut dropped_tasks = 0usize;

    while let Ok(message) = receiver.recv() {
        let discarding = discard.load(Ordering::Acquire);
        let outcome = match message {
            DeviceMessage::Submit(_) if discarding => {
                discarded += 1;
                Ok(())
            }
            DeviceMessage::Task(_) if discarding => {
                dropped_tasks += 1;
                Ok(())
            }
            DeviceMessage::Submit(buffer) => processor.execute_buffer(buffer),
            DeviceMessage::Task(task) => {
                task(&mut processor as &mut dyn DeviceServices);
                Ok(())
            }
            DeviceMessage::DeviceLost => processor.recover_device(),
            DeviceMessage::Shutdown => break,
        };
        if let Err(err) = outcome {
            log::error!("Render thread stopping: {err}");
            break;
        }
    }

    if discarded > 0 {
        log::warn!("Discarded {discarded} pending command buffers on shutdown");
    }
    if dropped_tasks > 0 {
        log::debug!("Dropped {dropped_tasks} pending render-thread tasks");
    }
    log::debug!("Render thread stopped.");
}
