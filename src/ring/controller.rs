//! Ring rebuild controller.
//!
//! Owns the current `LayoutParams` and the ring built from them, and turns
//! parameter-change events into rebuilds:
//! - `text`, `radius`, `size`, `depth`, `spacing` rebuild the ring
//! - `speed` only changes the per-frame spin
//!
//! Rebuilds are all-or-nothing. The candidate ring is built first; only when that
//! succeeds is the old ring disposed and swapped out. A failed rebuild leaves both
//! the ring and the parameters exactly as they were.
//!
//! All mutation goes through `&mut self`, so rebuilds cannot overlap. Hosts that share
//! a controller across threads put it behind a `Mutex`.
//!
//! The material folder of the panel (globe shininess, ambient and key light
//! intensity, exposure) never touches the ring; `MaterialSettings` holds those values
//! and writes them into the scene.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::font::FontMetricsProvider;
use crate::ring::{LayoutParams, RingError, TextRing, build};
use crate::scene::{Lighting, Material, Rgba};

/// Frames per second that `speed` (radians per frame) is calibrated against.
pub const REFERENCE_FPS: f32 = 60.0;

/// One edit coming from the parameter panel (or its keyboard stand-in).
#[derive(Debug, Clone, PartialEq)]
pub enum ParamChange {
    Text(String),
    Radius(f32),
    Size(f32),
    Depth(f32),
    Spacing(f32),
    Speed(f32),
}

impl ParamChange {
    /// Whether applying this change invalidates the built glyphs.
    #[inline]
    pub fn triggers_rebuild(&self) -> bool {
        !matches!(self, ParamChange::Speed(_))
    }

    fn apply_to(self, params: &mut LayoutParams) {
        match self {
            ParamChange::Text(t) => params.text = t,
            ParamChange::Radius(v) => params.radius = v,
            ParamChange::Size(v) => params.size = v,
            ParamChange::Depth(v) => params.depth = v,
            ParamChange::Spacing(v) => params.spacing = v,
            ParamChange::Speed(v) => params.speed = v,
        }
    }
}

/// How `tick` converts wall-clock frames into spin.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timestep {
    /// One `speed` increment per rendered frame, whatever the frame rate.
    #[default]
    Fixed,
    /// Scale the increment by `dt * REFERENCE_FPS`.
    Variable,
}

impl Timestep {
    /// Number of reference frames represented by a frame of `dt_s` seconds.
    #[inline]
    pub fn frames(self, dt_s: f32) -> f32 {
        match self {
            Timestep::Fixed => 1.0,
            Timestep::Variable => dt_s.max(0.0) * REFERENCE_FPS,
        }
    }
}

/// A slider range: inclusive bounds plus a step.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl ParamRange {
    pub const fn new(min: f32, max: f32, step: f32) -> Self {
        Self { min, max, step }
    }

    #[inline]
    pub fn clamp(&self, v: f32) -> f32 {
        v.clamp(self.min, self.max)
    }

    /// Move `v` by `steps` steps, snapped to the step grid and clamped into range.
    pub fn step_by(&self, v: f32, steps: i32) -> f32 {
        if self.step <= 0.0 {
            return self.clamp(v);
        }
        let raw = v + steps as f32 * self.step;
        let snapped = self.min + ((raw - self.min) / self.step).round() * self.step;
        self.clamp(snapped)
    }
}

/// Which numeric field a panel slider drives.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PanelField {
    Radius,
    Size,
    Speed,
    Spacing,
}

/// Slider ranges of the parameter panel.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PanelRanges {
    pub radius: ParamRange,
    pub size: ParamRange,
    pub speed: ParamRange,
    pub spacing: ParamRange,
}

impl Default for PanelRanges {
    fn default() -> Self {
        Self {
            radius: ParamRange::new(55.0, 120.0, 1.0),
            size: ParamRange::new(2.0, 12.0, 1.0),
            speed: ParamRange::new(-0.05, 0.05, 0.001),
            spacing: ParamRange::new(0.8, 2.0, 0.01),
        }
    }
}

impl PanelRanges {
    /// The change produced by nudging `field` by `steps` from its value in `params`.
    pub fn nudge(&self, params: &LayoutParams, field: PanelField, steps: i32) -> ParamChange {
        match field {
            PanelField::Radius => ParamChange::Radius(self.radius.step_by(params.radius, steps)),
            PanelField::Size => ParamChange::Size(self.size.step_by(params.size, steps)),
            PanelField::Speed => ParamChange::Speed(self.speed.step_by(params.speed, steps)),
            PanelField::Spacing => {
                ParamChange::Spacing(self.spacing.step_by(params.spacing, steps))
            }
        }
    }
}

/// Which value a material slider drives.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MaterialField {
    Shininess,
    Ambient,
    KeyLight,
    Exposure,
}

/// Values of the material folder.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MaterialSettings {
    /// Globe specular exponent.
    pub shininess: f32,
    pub ambient: f32,
    pub key_light: f32,
    pub exposure: f32,
}

impl Default for MaterialSettings {
    fn default() -> Self {
        let lighting = Lighting::default();
        Self {
            shininess: 10.0,
            ambient: lighting.ambient,
            key_light: lighting.key.intensity,
            exposure: lighting.exposure,
        }
    }
}

impl MaterialSettings {
    /// Write the light intensities and exposure into `lighting`.
    pub fn apply_to(&self, lighting: &mut Lighting) {
        lighting.ambient = self.ambient;
        lighting.key.intensity = self.key_light;
        lighting.exposure = self.exposure;
    }

    /// Globe material in `color` with the current shininess.
    #[inline]
    pub fn globe_material(&self, color: Rgba) -> Material {
        Material::from_shininess(color, self.shininess)
    }
}

/// Slider ranges of the material folder.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MaterialRanges {
    pub shininess: ParamRange,
    pub ambient: ParamRange,
    pub key_light: ParamRange,
    pub exposure: ParamRange,
}

impl Default for MaterialRanges {
    fn default() -> Self {
        Self {
            shininess: ParamRange::new(0.0, 100.0, 1.0),
            ambient: ParamRange::new(0.0, 5.0, 0.1),
            key_light: ParamRange::new(0.0, 3.0, 0.1),
            exposure: ParamRange::new(0.1, 3.0, 0.1),
        }
    }
}

impl MaterialRanges {
    /// Nudge `field` of `settings` by `steps`, staying in range. Returns the new value.
    pub fn nudge(&self, settings: &mut MaterialSettings, field: MaterialField, steps: i32) -> f32 {
        let (range, value) = match field {
            MaterialField::Shininess => (&self.shininess, &mut settings.shininess),
            MaterialField::Ambient => (&self.ambient, &mut settings.ambient),
            MaterialField::KeyLight => (&self.key_light, &mut settings.key_light),
            MaterialField::Exposure => (&self.exposure, &mut settings.exposure),
        };
        *value = range.step_by(*value, steps);
        *value
    }
}

/// Owns the layout parameters and the ring built from them.
pub struct RingController<P> {
    fonts: P,
    params: LayoutParams,
    ring: TextRing,
    generation: u64,
    last_released: usize,
}

impl<P: FontMetricsProvider> RingController<P> {
    /// Build the initial ring. Fails if `params` cannot be built.
    pub fn new(fonts: P, params: LayoutParams) -> Result<Self, RingError> {
        let ring = build(&params, &fonts)?;
        info!(
            "ring: initial build, {} glyphs over {:.3} rad",
            ring.glyphs().len(),
            ring.total_angle()
        );
        Ok(Self {
            fonts,
            params,
            ring,
            generation: 1,
            last_released: 0,
        })
    }

    #[inline]
    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    #[inline]
    pub fn ring(&self) -> &TextRing {
        &self.ring
    }

    #[inline]
    pub fn fonts(&self) -> &P {
        &self.fonts
    }

    /// Number of successful builds so far (the initial one included).
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Glyphs released by the ring the most recent rebuild replaced.
    #[inline]
    pub fn last_released(&self) -> usize {
        self.last_released
    }

    /// Replace the parameters wholesale.
    ///
    /// Returns `Ok(true)` if the ring was rebuilt, `Ok(false)` if only the spin speed
    /// changed. On error nothing changes.
    pub fn set_params(&mut self, next: LayoutParams) -> Result<bool, RingError> {
        next.validate()?;

        if !self.params.needs_rebuild(&next) {
            self.params = next;
            return Ok(false);
        }

        let mut candidate = build(&next, &self.fonts)?;
        candidate.set_rotation(self.ring.rotation());

        self.swap(candidate);
        self.params = next;
        Ok(true)
    }

    /// Apply one panel edit. Same result contract as `set_params`.
    pub fn apply(&mut self, change: ParamChange) -> Result<bool, RingError> {
        let mut next = self.params.clone();
        change.clone().apply_to(&mut next);
        self.set_params(next).inspect_err(|e| {
            warn!("ring: rejected {change:?}: {e}");
        })
    }

    /// Rebuild from the current parameters, e.g. after the font changed.
    pub fn rebuild(&mut self) -> Result<(), RingError> {
        let mut candidate = build(&self.params, &self.fonts).inspect_err(|e| {
            warn!("ring: rebuild failed: {e}");
        })?;
        candidate.set_rotation(self.ring.rotation());
        self.swap(candidate);
        Ok(())
    }

    fn swap(&mut self, candidate: TextRing) {
        self.last_released = self.ring.dispose();
        self.ring = candidate;
        self.generation += 1;

        info!(
            "ring: rebuilt (generation {}), released {} glyphs, now {} glyphs over {:.3} rad",
            self.generation,
            self.last_released,
            self.ring.glyphs().len(),
            self.ring.total_angle()
        );
    }

    /// Per-frame update: spin the ring by `speed * frames`.
    #[inline]
    pub fn tick(&mut self, frames: f32) {
        self.ring.advance(self.params.speed * frames);
    }
}
