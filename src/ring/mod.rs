//! Circular text layout.
//!
//! Lays a string out evenly around a horizontal ring (the XZ plane):
//! - every character gets an angular slot of `outline_width / radius`
//! - the run is centered on angle 0, so it spans `[-total/2, +total/2]`
//! - each renderable glyph sits at its slot center, facing away from the ring center
//! - whitespace takes up a slot but produces no geometry
//!
//! The ring as a whole hangs off one parent rotation about world up. Spinning it
//! (`TextRing::advance`) touches only that rotation, never the glyphs.
//!
//! A ring is immutable once built. Any layout change other than the spin speed goes
//! through `build` again (see `RingController`).

pub mod controller;

use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::{Mat4, Quat, Vec3};
use log::debug;

use crate::font::{FontError, FontMetricsProvider, GlyphOutline};
use crate::scene::{Aabb3, DrawItem3D, Material, Mesh3D, Rgba};

pub use controller::{
    MaterialField, MaterialRanges, MaterialSettings, PanelField, PanelRanges, ParamChange,
    ParamRange, RingController, Timestep,
};

/// Width of a whitespace slot, as a fraction of the glyph size.
pub const SPACE_WIDTH_FACTOR: f32 = 0.5;

/// Errors produced while building a ring.
#[derive(thiserror::Error, Debug)]
pub enum RingError {
    #[error("invalid layout parameter `{name}`: {value}")]
    InvalidParameter { name: &'static str, value: f32 },

    #[error("cannot resolve glyph {character:?}: {source}")]
    GlyphResolution {
        character: char,
        #[source]
        source: FontError,
    },
}

/// Everything a ring is built from. Replaced as a whole, never patched.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutParams {
    pub text: String,
    /// Ring radius in world units. Must be > 0.
    pub radius: f32,
    /// Glyph em size in world units. Must be > 0.
    pub size: f32,
    /// Extrusion depth. Must be >= 0.
    pub depth: f32,
    /// Multiplier on every slot width. Must be > 0.
    pub spacing: f32,
    /// Ring spin in radians per frame. Any finite value.
    pub speed: f32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            text: "RUST • TEXT AROUND EARTH".to_string(),
            radius: 70.0,
            size: 6.0,
            depth: 1.0,
            spacing: 1.0,
            speed: 0.01,
        }
    }
}

impl LayoutParams {
    /// Check the numeric constraints `build` relies on.
    pub fn validate(&self) -> Result<(), RingError> {
        let positive = [
            ("radius", self.radius),
            ("size", self.size),
            ("spacing", self.spacing),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(RingError::InvalidParameter { name, value });
            }
        }
        if !(self.depth.is_finite() && self.depth >= 0.0) {
            return Err(RingError::InvalidParameter {
                name: "depth",
                value: self.depth,
            });
        }
        if !self.speed.is_finite() {
            return Err(RingError::InvalidParameter {
                name: "speed",
                value: self.speed,
            });
        }
        Ok(())
    }

    /// True when going from `self` to `next` invalidates the built glyphs.
    ///
    /// Only `speed` can change without a rebuild.
    pub fn needs_rebuild(&self, next: &LayoutParams) -> bool {
        self.text != next.text
            || self.radius != next.radius
            || self.size != next.size
            || self.depth != next.depth
            || self.spacing != next.spacing
    }
}

/// Per-character measurement.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlyphDescriptor {
    pub character: char,
    /// Slot width in world units, spacing already applied.
    pub outline_width: f32,
    /// False for whitespace.
    pub renderable: bool,
}

impl GlyphDescriptor {
    /// Arc length as an angle on a ring of `radius`.
    #[inline]
    pub fn angular_width(&self, radius: f32) -> f32 {
        self.outline_width / radius
    }
}

/// Where one renderable glyph sits on the ring, in the ring's own frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Placement {
    /// Center angle of the glyph's slot.
    pub angle: f32,
    pub position: Vec3,
    pub orientation: Quat,
}

impl Placement {
    /// Place a glyph at `angle` on a ring of `radius`, front facing outward.
    pub fn on_ring(angle: f32, radius: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            angle,
            position: Vec3::new(radius * cos, 0.0, radius * sin),
            orientation: facing_outward(angle),
        }
    }

    /// Ring-space transform of the glyph (rotation then translation).
    #[inline]
    pub fn ring_from_glyph(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position)
    }

    /// Direction the glyph front (+Z) points in ring space.
    #[inline]
    pub fn front(&self) -> Vec3 {
        self.orientation * Vec3::Z
    }
}

/// Orientation whose +Z points away from the ring center at `angle`, with +Y up.
///
/// Equivalent to looking at the center and turning half a turn about Y.
#[inline]
pub fn facing_outward(angle: f32) -> Quat {
    Quat::from_rotation_y(FRAC_PI_2 - angle)
}

/// Fold an angle into `[-PI, PI)`; values already inside are returned untouched.
#[inline]
fn wrap_angle(angle: f32) -> f32 {
    if (-PI..PI).contains(&angle) {
        angle
    } else {
        (angle + PI).rem_euclid(TAU) - PI
    }
}

/// Output of the pure layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RingLayout {
    pub total_angle: f32,
    /// `(index into descriptors, placement)` for every renderable glyph, in order.
    pub placements: Vec<(usize, Placement)>,
}

/// Distribute measured glyphs around a ring of `radius`, centered on angle 0.
///
/// Widths are summed left to right in character order, so the result is
/// reproducible bit for bit.
pub fn layout(descriptors: &[GlyphDescriptor], radius: f32) -> Result<RingLayout, RingError> {
    if !(radius.is_finite() && radius > 0.0) {
        return Err(RingError::InvalidParameter {
            name: "radius",
            value: radius,
        });
    }

    let total_angle = descriptors
        .iter()
        .fold(0.0f32, |acc, d| acc + d.angular_width(radius));

    let mut current = -total_angle / 2.0;
    let mut placements = Vec::with_capacity(descriptors.len());

    for (i, d) in descriptors.iter().enumerate() {
        let char_angle = d.angular_width(radius);
        if d.renderable {
            let center = wrap_angle(current + char_angle / 2.0);
            placements.push((i, Placement::on_ring(center, radius)));
        }
        current += char_angle;
    }

    Ok(RingLayout {
        total_angle,
        placements,
    })
}

/// Base surface for ring glyphs; each glyph gets its own copy.
pub fn glyph_material() -> Material {
    Material {
        color: Rgba::from_hex(0x66ccff),
        metalness: 0.2,
        roughness: 0.3,
    }
}

/// One rendered glyph owned by a ring.
#[derive(Debug, Clone)]
pub struct RingGlyph {
    pub character: char,
    pub placement: Placement,
    /// Geometry centered on its own bounding box.
    pub mesh: Mesh3D,
    pub bounds: Aabb3,
    pub material: Material,
}

/// A built ring: glyph visuals, their layout, and the parent spin.
#[derive(Debug, Clone)]
pub struct TextRing {
    glyphs: Vec<RingGlyph>,
    descriptors: Vec<GlyphDescriptor>,
    total_angle: f32,
    radius: f32,
    rotation: f32,
    disposed: bool,
}

impl TextRing {
    /// A ring with nothing on it.
    pub fn empty(radius: f32) -> Self {
        Self {
            glyphs: Vec::new(),
            descriptors: Vec::new(),
            total_angle: 0.0,
            radius,
            rotation: 0.0,
            disposed: false,
        }
    }

    #[inline]
    pub fn glyphs(&self) -> &[RingGlyph] {
        &self.glyphs
    }

    #[inline]
    pub fn descriptors(&self) -> &[GlyphDescriptor] {
        &self.descriptors
    }

    pub fn placements(&self) -> impl Iterator<Item = &Placement> + '_ {
        self.glyphs.iter().map(|g| &g.placement)
    }

    #[inline]
    pub fn total_angle(&self) -> f32 {
        self.total_angle
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Current parent rotation about world up, in `[0, TAU)`.
    #[inline]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    #[inline]
    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation.rem_euclid(TAU);
    }

    /// Spin the ring's parent frame by `rotation_speed` radians.
    ///
    /// Constant time: glyph placements are not touched.
    #[inline]
    pub fn advance(&mut self, rotation_speed: f32) {
        self.set_rotation(self.rotation + rotation_speed);
    }

    /// World transform of the ring's parent frame.
    #[inline]
    pub fn world_from_ring(&self) -> Mat4 {
        Mat4::from_rotation_y(self.rotation)
    }

    /// Release every glyph mesh and material.
    ///
    /// Returns how many glyphs were released; a second call releases nothing.
    pub fn dispose(&mut self) -> usize {
        if self.disposed {
            return 0;
        }
        let released = self.glyphs.len();
        self.glyphs = Vec::new();
        self.disposed = true;
        debug!("ring: disposed {released} glyphs");
        released
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Emit one draw item per glyph under the ring's parent rotation.
    pub fn flatten<'a>(&'a self, out: &mut Vec<DrawItem3D<'a>>) {
        let world_from_ring = self.world_from_ring();
        for g in &self.glyphs {
            if g.mesh.is_empty() {
                continue;
            }
            out.push(DrawItem3D {
                mesh: &g.mesh,
                material: g.material,
                world_from_local: world_from_ring * g.placement.ring_from_glyph(),
            });
        }
    }
}

/// Measure every character of `params.text`.
///
/// Returns the descriptors plus the centered outline of each renderable character
/// (`None` for whitespace). Repeated characters are fetched from the provider once.
fn measure<P: FontMetricsProvider + ?Sized>(
    params: &LayoutParams,
    fonts: &P,
) -> Result<Vec<(GlyphDescriptor, Option<GlyphOutline>)>, RingError> {
    let mut cache: HashMap<char, GlyphOutline> = HashMap::new();
    let mut out = Vec::with_capacity(params.text.chars().count());

    for ch in params.text.chars() {
        if ch.is_whitespace() {
            out.push((
                GlyphDescriptor {
                    character: ch,
                    outline_width: params.size * SPACE_WIDTH_FACTOR * params.spacing,
                    renderable: false,
                },
                None,
            ));
            continue;
        }

        let outline = match cache.get(&ch) {
            Some(o) => o.clone(),
            None => {
                let o = fonts
                    .glyph(ch, params.size, params.depth)
                    .map_err(|source| RingError::GlyphResolution {
                        character: ch,
                        source,
                    })?
                    .centered();
                cache.insert(ch, o.clone());
                o
            }
        };

        out.push((
            GlyphDescriptor {
                character: ch,
                outline_width: outline.width() * params.spacing,
                renderable: true,
            },
            Some(outline),
        ));
    }

    Ok(out)
}

/// Build a ring for `params` using glyph outlines from `fonts`.
///
/// Pure: nothing outside the returned ring is touched, so a failure leaves any
/// existing ring exactly as it was.
pub fn build<P: FontMetricsProvider + ?Sized>(
    params: &LayoutParams,
    fonts: &P,
) -> Result<TextRing, RingError> {
    params.validate()?;

    let measured = measure(params, fonts)?;
    let descriptors: Vec<GlyphDescriptor> = measured.iter().map(|(d, _)| *d).collect();
    let laid_out = layout(&descriptors, params.radius)?;

    let mut outlines: Vec<Option<GlyphOutline>> = measured.into_iter().map(|(_, o)| o).collect();
    let base = glyph_material();

    let mut glyphs = Vec::with_capacity(laid_out.placements.len());
    for (i, placement) in laid_out.placements {
        let Some(outline) = outlines[i].take() else {
            continue;
        };
        glyphs.push(RingGlyph {
            character: descriptors[i].character,
            placement,
            mesh: outline.mesh,
            bounds: outline.bounds,
            material: base,
        });
    }

    debug!(
        "ring: built {} glyphs from {} chars, total angle {:.4} rad",
        glyphs.len(),
        descriptors.len(),
        laid_out.total_angle
    );

    Ok(TextRing {
        glyphs,
        descriptors,
        total_angle: laid_out.total_angle,
        radius: params.radius,
        rotation: 0.0,
        disposed: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(ch: char, w: f32) -> GlyphDescriptor {
        GlyphDescriptor {
            character: ch,
            outline_width: w,
            renderable: !ch.is_whitespace(),
        }
    }

    #[test]
    fn test_single_glyph_is_centered_at_zero() {
        let l = layout(&[glyph('A', 4.0)], 70.0).unwrap();
        assert_eq!(l.placements.len(), 1);
        assert_eq!(l.placements[0].1.angle, 0.0);
        assert_eq!(l.placements[0].1.position, Vec3::new(70.0, 0.0, 0.0));
    }

    #[test]
    fn test_layout_rejects_non_positive_radius() {
        for r in [0.0, -1.0, f32::NAN] {
            assert!(matches!(
                layout(&[glyph('A', 1.0)], r),
                Err(RingError::InvalidParameter { name: "radius", .. })
            ));
        }
    }

    #[test]
    fn test_whitespace_widens_gap_without_placement() {
        let l = layout(&[glyph('A', 4.0), glyph(' ', 3.0), glyph('B', 4.0)], 70.0).unwrap();
        let idx: Vec<usize> = l.placements.iter().map(|(i, _)| *i).collect();
        assert_eq!(idx, vec![0, 2]);
        let gap = l.placements[1].1.angle - l.placements[0].1.angle;
        assert!((gap - (4.0 + 3.0) / 70.0).abs() < 1e-6);
    }

    #[test]
    fn test_placement_faces_away_from_center() {
        for angle in [-2.5f32, -0.3, 0.0, 0.7, 1.9] {
            let p = Placement::on_ring(angle, 50.0);
            let outward = p.position.normalize();
            assert!(p.front().distance(outward) < 1e-5, "angle {angle}");
            assert!((p.orientation * Vec3::Y).distance(Vec3::Y) < 1e-6);
        }
    }

    #[test]
    fn test_angles_outside_half_turn_are_wrapped() {
        // Each slot spans one and a half turns: centers land past +/- PI.
        let w = 70.0 * 1.5 * TAU;
        let l = layout(&[glyph('A', w), glyph('B', w)], 70.0).unwrap();
        for (_, p) in &l.placements {
            assert!((-PI..PI).contains(&p.angle), "{}", p.angle);
        }
    }

    #[test]
    fn test_advance_is_rigid_and_wraps() {
        let mut ring = TextRing::empty(70.0);
        ring.advance(0.25);
        ring.advance(0.25);
        assert_eq!(ring.rotation(), 0.5);
        ring.advance(-1.0);
        assert!((ring.rotation() - (TAU - 0.5)).abs() < 1e-5);
    }

    #[test]
    fn test_dispose_twice_is_noop() {
        let mut ring = TextRing::empty(70.0);
        assert_eq!(ring.dispose(), 0);
        assert!(ring.is_disposed());
        assert_eq!(ring.dispose(), 0);
    }

    #[test]
    fn test_needs_rebuild_ignores_speed() {
        let a = LayoutParams::default();
        let b = LayoutParams {
            speed: -0.03,
            ..a.clone()
        };
        assert!(!a.needs_rebuild(&b));
        let c = LayoutParams {
            spacing: 1.5,
            ..a.clone()
        };
        assert!(a.needs_rebuild(&c));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = LayoutParams::default();
        let cases = [
            LayoutParams {
                spacing: 0.0,
                ..base.clone()
            },
            LayoutParams {
                size: -1.0,
                ..base.clone()
            },
            LayoutParams {
                depth: -0.5,
                ..base.clone()
            },
            LayoutParams {
                speed: f32::INFINITY,
                ..base.clone()
            },
        ];
        for p in cases {
            assert!(matches!(
                p.validate(),
                Err(RingError::InvalidParameter { .. })
            ));
        }
        assert!(base.validate().is_ok());
    }
}
