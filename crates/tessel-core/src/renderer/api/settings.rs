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

//! Configuration of the render device and of the renderer frontend.

use super::texture::SamplerFilter;
use crate::math::Extent2D;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Native context parameters passed to a backend at initialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    /// Initial back-buffer size in pixels.
    pub size: Extent2D,
    /// MSAA sample count of the back buffer. `1` disables multisampling.
    pub sample_count: u32,
    pub srgb: bool,
    pub vertical_sync: bool,
    /// Whether the back buffer has a depth attachment.
    pub depth: bool,
    /// Whether the back buffer has a stencil attachment.
    pub stencil: bool,
    /// Enables the native API's validation layer, when it has one.
    pub debug_renderer: bool,
    /// Filter used by textures that don't specify one.
    pub texture_filter: SamplerFilter,
    pub max_anisotropy: u32,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            size: Extent2D::new(800, 600),
            sample_count: 1,
            srgb: false,
            vertical_sync: true,
            depth: false,
            stencil: false,
            debug_renderer: false,
            texture_filter: SamplerFilter::Point,
            max_anisotropy: 1,
        }
    }
}

/// Bootstrap configuration of the rendering subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Driver name: `""`/`"default"`, `"empty"`, `"opengl"`, `"direct3d11"`
    /// or `"metal"`.
    pub driver: String,
    pub device: DeviceSettings,
    /// How many frames the logic thread may run ahead of the render thread
    /// before [`wait_for_next_frame`](crate::renderer::Renderer::wait_for_next_frame)
    /// blocks. Values below `1` are treated as `1`.
    pub frame_lead: u32,
    /// Label given to every command buffer, for diagnostics.
    pub command_buffer_name: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            driver: String::new(),
            device: DeviceSettings::default(),
            frame_lead: 1,
            command_buffer_name: "frame".to_owned(),
        }
    }
}

impl RendererConfig {
    /// Parses a configuration from a JSON string; missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Loads a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    /// Saves the configuration as pretty-printed JSON.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// The frame lead, clamped to at least one frame.
    pub fn effective_frame_lead(&self) -> u32 {
        self.frame_lead.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_select_best_driver_with_one_frame_lead() {
        let config = RendererConfig::default();
        assert_eq!(config.driver, "");
        assert_eq!(config.frame_lead, 1);
        assert_eq!(config.device.size, Extent2D::new(800, 600));
        assert!(config.device.vertical_sync);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config = RendererConfig::from_json(
            r#"{
                "driver": "empty",
                "device": {
                    "size": { "width": 320, "height": 200 },
                    "texture_filter": "trilinear"
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.driver, "empty");
        assert_eq!(config.device.size, Extent2D::new(320, 200));
        assert_eq!(config.device.texture_filter, SamplerFilter::Trilinear);
        assert_eq!(config.device.sample_count, 1);
        assert_eq!(config.command_buffer_name, "frame");
    }

    #[test]
    fn zero_frame_lead_is_clamped() {
        let config = RendererConfig {
            frame_lead: 0,
            ..Default::default()
        };
        assert_eq!(config.effective_frame_lead(), 1);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("renderer.json");
        let mut config = RendererConfig::default();
        config.driver = "opengl".to_owned();
        config.device.debug_renderer = true;

        config.to_file(&path).unwrap();
        assert_eq!(RendererConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(RendererConfig::from_json("{ driver: }").is_err());
        assert!(RendererConfig::from_file("/nonexistent/renderer.json").is_err());
    }
}
