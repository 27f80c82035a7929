//! Glyph outline extraction.
//!
//! Converts `ttf-parser` outline callbacks (move/line/quad/curve/close) into a
//! `lyon::path::Path` in **font units** (Y up). Scaling to world units happens at
//! tessellation time.

use lyon::math::point;
use lyon::path::Path;

/// Extract the outline of `glyph_id` from a parsed face.
///
/// Returns `None` when the glyph has no outline (e.g. space, or an empty glyph).
pub fn outline_glyph(face: &ttf_parser::Face<'_>, glyph_id: u16) -> Option<Path> {
    let mut builder = LyonOutlineBuilder::new();
    face.outline_glyph(ttf_parser::GlyphId(glyph_id), &mut builder)?;
    Some(builder.build())
}

/// Convert `ttf-parser` outline callbacks into a `lyon::path::Path`.
///
/// A glyph may contain multiple contours; `move_to` starts a new one and `close`
/// ends the current one.
struct LyonOutlineBuilder {
    builder: lyon::path::Builder,
    contour_open: bool,
}

impl LyonOutlineBuilder {
    fn new() -> Self {
        Self {
            builder: Path::builder(),
            contour_open: false,
        }
    }

    fn build(mut self) -> Path {
        // Some fonts omit the final close.
        if self.contour_open {
            self.builder.close();
            self.contour_open = false;
        }
        self.builder.build()
    }
}

impl ttf_parser::OutlineBuilder for LyonOutlineBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        if self.contour_open {
            self.builder.close();
        }
        self.builder.begin(point(x, y));
        self.contour_open = true;
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(point(x, y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder.quadratic_bezier_to(point(x1, y1), point(x, y));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder
            .cubic_bezier_to(point(x1, y1), point(x2, y2), point(x, y));
    }

    fn close(&mut self) {
        if self.contour_open {
            self.builder.close();
            self.contour_open = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyon::path::PathEvent;
    use ttf_parser::OutlineBuilder as _;

    #[test]
    fn test_unclosed_contours_are_closed() {
        let mut b = LyonOutlineBuilder::new();
        b.move_to(0.0, 0.0);
        b.line_to(10.0, 0.0);
        b.line_to(10.0, 10.0);
        // second contour starts without an explicit close
        b.move_to(20.0, 0.0);
        b.quad_to(25.0, 10.0, 30.0, 0.0);
        let path = b.build();

        let ends = path
            .iter()
            .filter(|e| matches!(e, PathEvent::End { close: true, .. }))
            .count();
        assert_eq!(ends, 2);
    }
}
