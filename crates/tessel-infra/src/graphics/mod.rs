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

//! Render backends and driver selection.
//!
//! Only the `empty` driver is compiled in. Native drivers are reported as
//! unavailable, and [`start_renderer`] falls back to `empty` when the
//! configured driver cannot be started.

pub mod empty;

pub use self::empty::EmptyBackend;

use tessel_core::platform::SurfaceHandle;
use tessel_core::renderer::{Driver, RenderError, Renderer, RendererConfig};

/// Drivers this build can start.
pub fn available_drivers() -> Vec<Driver> {
    vec![Driver::Empty]
}

/// Maps a configured driver name to a driver.
///
/// `""` and `"default"` pick the best available driver. The result may still
/// be unavailable in this build.
pub fn resolve_driver(name: &str) -> Result<Driver, RenderError> {
    Ok(Driver::parse(name)?.unwrap_or_else(|| Driver::best_of(&available_drivers())))
}

fn start_with(
    driver: Driver,
    config: &RendererConfig,
    surface: Option<SurfaceHandle>,
) -> Result<Renderer, RenderError> {
    match driver {
        Driver::Empty => Renderer::new(EmptyBackend::new(), config, surface),
        other => Err(RenderError::DriverUnavailable(other)),
    }
}

/// Starts a renderer on the driver named by `config`.
///
/// An unknown driver name is an error. A known driver that is unavailable
/// or fails to initialize falls back to the `empty` driver.
pub fn start_renderer(
    config: &RendererConfig,
    surface: Option<SurfaceHandle>,
) -> Result<Renderer, RenderError> {
    let requested = resolve_driver(&config.driver)?;
    let renderer = match start_with(requested, config, surface.clone()) {
        Ok(renderer) => renderer,
        Err(err) if requested != Driver::Empty => {
            log::warn!(
                "Failed to start the {requested} render driver ({err}), falling back to {}",
                Driver::Empty
            );
            start_with(Driver::Empty, config, surface)?
        }
        Err(err) => return Err(err),
    };
    log::info!("Using {} render driver", renderer.driver());
    Ok(renderer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_resolves_to_the_best_available_driver() {
        assert_eq!(resolve_driver(""), Ok(Driver::Empty));
        assert_eq!(resolve_driver("default"), Ok(Driver::Empty));
        assert_eq!(resolve_driver("metal"), Ok(Driver::Metal));
    }

    #[test]
    fn unknown_driver_names_are_rejected() {
        assert_eq!(
            resolve_driver("vulkan").err(),
            Some(RenderError::InvalidDriver("vulkan".into()))
        );
        let config = RendererConfig {
            driver: "glide".into(),
            ..RendererConfig::default()
        };
        assert!(matches!(start_renderer(&config, None), Err(RenderError::InvalidDriver(_))));
    }

    #[test]
    fn unavailable_drivers_fall_back_to_empty() {
        for name in ["opengl", "direct3d11", "metal"] {
            let config = RendererConfig {
                driver: name.into(),
                ..RendererConfig::default()
            };
            let renderer = start_renderer(&config, None).unwrap();
            assert_eq!(renderer.driver(), Driver::Empty);
        }
    }
}
