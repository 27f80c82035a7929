//! Per-character glyph geometry for the ring engine.
//!
//! The ring engine only needs two things per character: an extruded outline mesh and
//! its axis-aligned bounds (for `max.x - min.x`). `FontMetricsProvider` is that seam;
//! `OutlineGlyphs` implements it on top of a resolved system font.

use log::trace;

use crate::font::tessellate::{Affine2x3, TessellateOptions, extrude_path_to_mesh};
use crate::font::{FontError, ResolvedFace, outline};
use crate::scene::{Aabb3, Mesh3D};

/// Extruded outline of one character, in world units.
///
/// The mesh is in the glyph's own frame: baseline at `y = 0`, pen origin at `x = 0`,
/// extruded from `z = 0` to `z = depth`.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphOutline {
    pub mesh: Mesh3D,
    pub bounds: Aabb3,
}

impl GlyphOutline {
    /// Wrap a mesh and compute its bounds.
    pub fn from_mesh(mesh: Mesh3D) -> Self {
        let bounds = mesh.bounds();
        Self { mesh, bounds }
    }

    /// Horizontal extent of the outline.
    #[inline]
    pub fn width(&self) -> f32 {
        self.bounds.width()
    }

    /// Shift the geometry so its bounding box is centered on the origin.
    pub fn centered(mut self) -> Self {
        self.bounds = self.mesh.center();
        self
    }
}

/// Source of glyph outlines.
///
/// Implementations must behave as a pure function of `(ch, size, depth)`: the ring
/// engine relies on that for reproducible layouts.
pub trait FontMetricsProvider {
    /// Produce the extruded outline for `ch` at em size `size` and extrusion `depth`.
    ///
    /// Never called for whitespace.
    fn glyph(&self, ch: char, size: f32, depth: f32) -> Result<GlyphOutline, FontError>;
}

impl<P: FontMetricsProvider + ?Sized> FontMetricsProvider for &P {
    fn glyph(&self, ch: char, size: f32, depth: f32) -> Result<GlyphOutline, FontError> {
        (**self).glyph(ch, size, depth)
    }
}

/// Glyph outlines read from one resolved font face.
pub struct OutlineGlyphs {
    face: ResolvedFace,
    opts: TessellateOptions,
}

impl OutlineGlyphs {
    pub fn new(face: ResolvedFace, opts: TessellateOptions) -> Self {
        Self { face, opts }
    }

    #[inline]
    pub fn face(&self) -> &ResolvedFace {
        &self.face
    }
}

impl FontMetricsProvider for OutlineGlyphs {
    fn glyph(&self, ch: char, size: f32, depth: f32) -> Result<GlyphOutline, FontError> {
        let parsed = self.face.parse()?;
        let gid = parsed.glyph_index(ch).ok_or(FontError::MissingChar(ch))?;
        let path = outline::outline_glyph(&parsed, gid.0)
            .ok_or(FontError::MissingGlyph { glyph_id: gid.0 })?;

        let scale = self.face.font_units_to_world_scale(size);
        let mesh = extrude_path_to_mesh(
            &path,
            Affine2x3::scale_translate(scale, 0.0, 0.0),
            depth,
            self.opts,
        )
        .map_err(FontError::Tessellation)?;

        trace!(
            "font: glyph {ch:?} (gid {}) -> {} vertices",
            gid.0,
            mesh.vertex_count()
        );

        Ok(GlyphOutline::from_mesh(mesh))
    }
}
