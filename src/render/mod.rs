//! Rendering module root.
//!
//! The `render` module owns the window/event-loop integration and the GPU renderer.
//! Entrypoint: `render::app::run_with_builder(...)`.

pub mod app;

/// GPU context, surface and depth target.
pub mod gpu;

/// Lit 3D mesh renderer for scene draw items.
pub mod mesh_renderer;

/// Procedural backdrop meshes (globe, axis guides).
pub mod primitives;

/// Frame timing.
pub mod util;
