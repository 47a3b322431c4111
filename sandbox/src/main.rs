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

// Tessel sandbox: records a few frames of a colored triangle on the logic
// thread and lets the render thread execute them.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tessel_core::math::{Color, Rect};
use tessel_core::renderer::*;
use tessel_infra::start_renderer;

#[derive(Parser, Debug)]
#[command(version, about = "Tessel render pipeline sandbox")]
struct Args {
    /// JSON renderer configuration. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the configured driver (`default`, `empty`, `opengl`, `direct3d11`, `metal`).
    #[arg(long)]
    driver: Option<String>,

    /// Number of frames to render.
    #[arg(long, default_value_t = 120)]
    frames: u32,

    /// Simulates a device loss before this frame.
    #[arg(long)]
    lose_device_at: Option<u32>,

    /// Saves the last frame as a PNG.
    #[arg(long)]
    screenshot: Option<PathBuf>,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
    color: [f32; 3],
}

const VERTICES: &[Vertex] = &[
    Vertex {
        position: [0.0, 0.5, 0.0],
        color: [1.0, 0.0, 0.0],
    },
    Vertex {
        position: [-0.5, -0.5, 0.0],
        color: [0.0, 1.0, 0.0],
    },
    Vertex {
        position: [0.5, -0.5, 0.0],
        color: [0.0, 0.0, 1.0],
    },
];

const INDICES: &[u16] = &[0, 1, 2];

const SHADER_SOURCE: &[u8] = b"
fn vs_main(position: vec3<f32>, color: vec3<f32>) {}
fn fs_main() {}
";

struct Scene {
    index_buffer: ResourceId,
    vertex_buffer: ResourceId,
    shader: ResourceId,
    blend_state: ResourceId,
    depth_stencil_state: ResourceId,
}

impl Scene {
    fn new(renderer: &mut Renderer) -> Result<Self> {
        let index_buffer =
            renderer.init_buffer_from(BufferType::Index, ResourceFlags::EMPTY, INDICES)?;
        let vertex_buffer =
            renderer.init_buffer_from(BufferType::Vertex, ResourceFlags::DYNAMIC, VERTICES)?;
        let shader = renderer.init_shader(ShaderDescriptor {
            fragment_shader: SHADER_SOURCE.to_vec(),
            vertex_shader: SHADER_SOURCE.to_vec(),
            vertex_attributes: [VertexUsage::Position, VertexUsage::Color].into(),
            vertex_constants: vec![ShaderConstantInfo::new(
                "model_view_projection",
                DataType::Matrix4,
            )],
            fragment_function: "fs_main".into(),
            vertex_function: "vs_main".into(),
            ..ShaderDescriptor::default()
        })?;
        let blend_state = renderer.init_blend_state(BlendStateDescriptor::alpha_blend());
        let depth_stencil_state =
            renderer.init_depth_stencil_state(DepthStencilStateDescriptor::default());
        Ok(Self {
            index_buffer,
            vertex_buffer,
            shader,
            blend_state,
            depth_stencil_state,
        })
    }

    fn record_frame(&self, renderer: &mut Renderer, frame: u32) -> Result<()> {
        let size = renderer.size();
        let phase = frame as f32 * 0.05;

        renderer.push_debug_marker(format!("frame {frame}"))?;
        renderer.set_render_target(ResourceId::NULL);
        renderer.set_viewport(Rect::new(0.0, 0.0, size.width as f32, size.height as f32))?;
        renderer.clear_render_target(ClearParams {
            clear_depth_buffer: true,
            color: Color::rgb(0.1, 0.1, 0.1 + 0.1 * phase.sin().abs()),
            ..ClearParams::default()
        })?;
        renderer.set_depth_stencil_state(self.depth_stencil_state, 0);
        renderer.set_pipeline_state(
            self.blend_state,
            self.shader,
            CullMode::NoCull,
            FillMode::Solid,
        )?;

        let mut vertices = VERTICES.to_vec();
        for vertex in &mut vertices {
            vertex.position[0] *= phase.cos();
        }
        renderer.set_buffer_data_from(self.vertex_buffer, &vertices)?;

        let mut transform = [0.0f32; 16];
        for i in 0..4 {
            transform[i * 5] = 1.0;
        }
        renderer.set_shader_constants(Vec::new(), vec![transform.to_vec()]);
        renderer.draw(
            self.index_buffer,
            INDICES.len() as u32,
            std::mem::size_of::<u16>() as u32,
            self.vertex_buffer,
            DrawMode::TriangleList,
            0,
        )?;
        renderer.pop_debug_marker();
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => RendererConfig::from_file(path)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => RendererConfig::default(),
    };
    if let Some(driver) = args.driver {
        config.driver = driver;
    }

    let mut renderer = start_renderer(&config, None)?;
    let scene = Scene::new(&mut renderer)?;

    for frame in 0..args.frames {
        renderer.wait_for_next_frame()?;
        if args.lose_device_at == Some(frame) {
            renderer.device().notify_device_lost()?;
        }
        scene.record_frame(&mut renderer, frame)?;
        renderer.present()?;

        for event in renderer.poll_events() {
            log::info!("Device event: {event:?}");
        }
    }

    if let Some(path) = &args.screenshot {
        let outcome = renderer.save_screenshot(path)?;
        match outcome.recv_timeout(Duration::from_secs(5)) {
            Ok(result) => result.with_context(|| format!("failed to save {}", path.display()))?,
            Err(_) => anyhow::bail!("screenshot did not complete"),
        }
    }

    renderer.shutdown(ShutdownMode::Drain);
    let stats = renderer.stats();
    log::info!(
        "Rendered {} frames ({} commands, {} errors, {} reloads, {:.1} fps)",
        stats.frames_presented,
        stats.commands_executed,
        stats.command_errors,
        stats.reloads,
        stats.accumulated_fps
    );
    Ok(())
}
