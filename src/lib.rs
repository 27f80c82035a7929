//! `ringtext` library crate root.
//!
//! Lays text out around a horizontal ring in 3D and spins it, with the pieces needed to
//! show it: system-font glyph extrusion, a small scene graph, and a winit/wgpu runner.
//!
//! The binary and the `text_ring` example stay thin and call into these modules:
//! - `ring`: layout, build/advance/dispose, rebuild controller
//! - `font`: glyph outlines from system fonts (`FontMetricsProvider`)
//! - `scene`: meshes, materials, camera, lighting, draw items
//! - `render`: app runner, GPU context, lit mesh renderer
//! - `config`: defaults, TOML file, environment overrides

pub mod config;
pub mod font;
pub mod render;
pub mod ring;
pub mod scene;

use std::{future::Future, sync::Arc};

use winit::window::Window;

/// Run the winit/wgpu event loop with a state built by `builder`.
///
/// Does not initialize logging; binaries pick their own logger.
pub fn run_app<S, B, Fut>(config: &config::RingConfig, builder: B) -> anyhow::Result<()>
where
    S: render::app::AppState,
    B: FnOnce(Arc<Window>) -> Fut + 'static,
    Fut: Future<Output = anyhow::Result<S>> + 'static,
{
    render::app::run_with_builder(
        render::app::AppConfig {
            title: config.window.title.clone(),
            inner_size: Some((config.window.width, config.window.height)),
            ..Default::default()
        },
        builder,
    )
}
