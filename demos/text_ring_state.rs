//! Reusable state-only implementation for the text ring demo.
//!
//! Not an example binary (no `fn main()`). Shared by:
//! - `demos/text_ring.rs`
//! - `src/main.rs` (default `cargo run` entrypoint)
//!
//! The state renders:
//! - a lit globe and X/Y/Z axis guides
//! - the text ring, spinning by `speed` per frame
//!
//! Keyboard stands in for the parameter panel:
//! - Up/Down: radius, `+`/`-`: size, `]`/`[`: spacing, `.`/`,`: speed
//! - Enter: rebuild with the configured text
//!
//! and for the material folder:
//! - `1`/`2`: globe shininess, `3`/`4`: ambient light, `5`/`6`: key light,
//!   `7`/`8`: exposure
//!
//! A rejected change is logged and the previous ring stays on screen.

use std::sync::Arc;

use anyhow::Context as _;
use log::{debug, info};
use winit::{
    event::KeyEvent,
    keyboard::{Key, NamedKey},
    window::Window,
};

use ringtext::config::RingConfig;
use ringtext::font::{FontSystem, OutlineGlyphs};
use ringtext::render::{
    app::AppState,
    gpu::{DEPTH_CLEAR, Gpu},
    mesh_renderer::MeshRenderer,
    primitives::{
        AXES_LENGTH, GLOBE_RADIUS, GLOBE_SEGMENTS, GLOBE_SHININESS, axis_guides, uv_sphere,
    },
    util::FrameClock,
};
use ringtext::ring::{
    MaterialField, MaterialRanges, MaterialSettings, PanelField, PanelRanges, ParamChange,
    RingController,
};
use ringtext::scene::{Node3D, Rgba, Scene3D};

/// Thickness of the axis guide bars.
const AXIS_THICKNESS: f32 = 0.4;

/// Text ring demo state, driven by `ringtext::run_app(...)`.
pub struct State {
    pub window: Arc<Window>,
    pub gpu: Gpu,

    pub scene: Scene3D,
    pub renderer: MeshRenderer,
    pub controller: RingController<OutlineGlyphs>,

    config: RingConfig,
    ranges: PanelRanges,
    material: MaterialSettings,
    material_ranges: MaterialRanges,
    clock: FrameClock,
}

impl State {
    pub async fn new(window: Arc<Window>, config: RingConfig) -> anyhow::Result<Self> {
        let gpu = Gpu::new(window.clone()).await?;

        let material = MaterialSettings {
            shininess: GLOBE_SHININESS,
            ..Default::default()
        };
        let mut scene = Scene3D::new();
        material.apply_to(&mut scene.lighting);
        scene
            .camera
            .set_viewport_px(gpu.size.width.max(1), gpu.size.height.max(1));

        if config.scene.show_globe {
            let globe = uv_sphere(GLOBE_RADIUS, GLOBE_SEGMENTS, GLOBE_SEGMENTS)
                .context("scene: globe mesh exceeds u16 indices")?;
            scene.add_root(
                Node3D::new("globe")
                    .with_mesh(globe)
                    .with_material(
                        material.globe_material(Rgba::from_hex(config.scene.globe_color)),
                    ),
            );
        }

        if config.scene.show_axes {
            let mut axes = Node3D::new("axes");
            let guides = axis_guides(AXES_LENGTH, AXIS_THICKNESS);
            for (name, guide) in ["x", "y", "z"].into_iter().zip(guides) {
                axes.add_child(
                    Node3D::new(format!("axis_{name}"))
                        .with_mesh(guide.mesh)
                        .with_material(guide.material),
                );
            }
            scene.add_root(axes);
        }

        let fonts = FontSystem::new().context("font: failed to initialize FontSystem")?;
        let face = fonts
            .resolve(&config.font.to_query())
            .context("font: failed to resolve ring face")?;
        info!("font: ring lettering uses {:?}", face.family);

        let provider = OutlineGlyphs::new(face, config.font.tessellate_options());
        let controller = RingController::new(provider, config.ring.to_params())
            .context("ring: initial build failed")?;

        let renderer = MeshRenderer::new(&gpu)?;

        Ok(Self {
            window,
            gpu,
            scene,
            renderer,
            controller,
            config,
            ranges: PanelRanges::default(),
            material,
            material_ranges: MaterialRanges::default(),
            clock: FrameClock::new(),
        })
    }

    /// Forward resize events to the GPU and camera.
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.gpu.resize(new_size);
        self.scene
            .camera
            .set_viewport_px(self.gpu.size.width.max(1), self.gpu.size.height.max(1));
    }

    /// Map a key press to a parameter change.
    fn change_for_key(&self, event: &KeyEvent) -> Option<ParamChange> {
        let params = self.controller.params();
        let nudge = |field, steps| Some(self.ranges.nudge(params, field, steps));
        match event.logical_key.as_ref() {
            Key::Named(NamedKey::ArrowUp) => nudge(PanelField::Radius, 1),
            Key::Named(NamedKey::ArrowDown) => nudge(PanelField::Radius, -1),
            Key::Character("+") | Key::Character("=") => nudge(PanelField::Size, 1),
            Key::Character("-") | Key::Character("_") => nudge(PanelField::Size, -1),
            Key::Character("]") => nudge(PanelField::Spacing, 1),
            Key::Character("[") => nudge(PanelField::Spacing, -1),
            Key::Character(".") => nudge(PanelField::Speed, 1),
            Key::Character(",") => nudge(PanelField::Speed, -1),
            Key::Named(NamedKey::Enter) => Some(ParamChange::Text(self.config.ring.text.clone())),
            _ => None,
        }
    }

    /// Map a key press to a material slider nudge.
    fn material_for_key(event: &KeyEvent) -> Option<(MaterialField, i32)> {
        let Key::Character(c) = event.logical_key.as_ref() else {
            return None;
        };
        match c {
            "1" => Some((MaterialField::Shininess, -1)),
            "2" => Some((MaterialField::Shininess, 1)),
            "3" => Some((MaterialField::Ambient, -1)),
            "4" => Some((MaterialField::Ambient, 1)),
            "5" => Some((MaterialField::KeyLight, -1)),
            "6" => Some((MaterialField::KeyLight, 1)),
            "7" => Some((MaterialField::Exposure, -1)),
            "8" => Some((MaterialField::Exposure, 1)),
            _ => None,
        }
    }

    fn nudge_material(&mut self, field: MaterialField, steps: i32) {
        let value = self
            .material_ranges
            .nudge(&mut self.material, field, steps);
        self.material.apply_to(&mut self.scene.lighting);
        if let Some(globe) = self.scene.get_mut("globe") {
            globe.material = self.material.globe_material(globe.material.color);
        }
        info!("material: {field:?} = {value:.2}");
    }

    pub fn key_pressed(&mut self, event: &KeyEvent) {
        if let Some((field, steps)) = Self::material_for_key(event) {
            self.nudge_material(field, steps);
            return;
        }

        let Some(change) = self.change_for_key(event) else {
            return;
        };

        // Enter with unchanged text still rebuilds from scratch.
        let result = match change {
            ParamChange::Text(ref t) if *t == self.controller.params().text => {
                self.controller.rebuild().map(|()| true)
            }
            change => self.controller.apply(change),
        };

        // Errors are logged by the controller; the old ring stays.
        if let Ok(rebuilt) = result {
            let p = self.controller.params();
            info!(
                "params: radius {} size {} spacing {:.2} speed {:.3}{}",
                p.radius,
                p.size,
                p.spacing,
                p.speed,
                if rebuilt { " (rebuilt)" } else { "" }
            );
        }
    }

    /// Advance the ring, render one frame and schedule the next redraw.
    pub fn render(&mut self) -> anyhow::Result<()> {
        let dt = self.clock.tick();
        self.controller
            .tick(self.config.scene.timestep.frames(dt));

        if self.clock.frames() % 600 == 0 {
            debug!(
                "frame {} at {:.1}s, ring rotation {:.3} rad",
                self.clock.frames(),
                self.clock.elapsed_s(),
                self.controller.ring().rotation()
            );
        }

        if !self.gpu.is_drawable() {
            return Ok(());
        }

        let (surface_texture, view) = match self.gpu.acquire_frame() {
            Ok(v) => v,
            Err(wgpu::SurfaceError::Outdated) | Err(wgpu::SurfaceError::Lost) => {
                self.gpu.resize(self.gpu.size);
                self.window.request_redraw();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                self.window.request_redraw();
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(anyhow::anyhow!("wgpu SurfaceError::OutOfMemory"));
            }
            Err(wgpu::SurfaceError::Other) => {
                self.gpu.resize(self.gpu.size);
                self.window.request_redraw();
                return Ok(());
            }
        };

        let mut items = self.scene.flatten();
        self.controller.ring().flatten(&mut items);
        self.renderer
            .prepare(&self.gpu, &self.scene.camera, &self.scene.lighting, &items);

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Main Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.02,
                            g: 0.02,
                            b: 0.04,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.gpu.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(DEPTH_CLEAR),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            self.renderer.draw(&mut pass);
        }

        self.gpu.queue.submit(Some(encoder.finish()));
        self.window.pre_present_notify();
        surface_texture.present();

        self.window.request_redraw();

        Ok(())
    }
}

impl AppState for State {
    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        Self::resize(self, new_size)
    }

    fn key_pressed(&mut self, event: &KeyEvent) {
        Self::key_pressed(self, event)
    }

    fn render(&mut self) -> anyhow::Result<()> {
        Self::render(self)
    }

    fn request_redraw(&self) {
        self.window.request_redraw();
    }
}
