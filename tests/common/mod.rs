//! Deterministic glyph providers for integration tests.
//!
//! No system fonts involved: every character is a box whose width comes from a table.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::HashMap;

use glam::Vec3;
use ringtext::font::{FontError, FontMetricsProvider, GlyphOutline};
use ringtext::render::primitives::box_mesh;

/// Box glyphs: width `size * factor(ch)`, height `size`, depth `depth`.
pub struct BoxGlyphs {
    factors: HashMap<char, f32>,
    default_factor: f32,
    missing: Vec<char>,
    calls: Cell<usize>,
}

impl BoxGlyphs {
    /// Every character is `size` units wide.
    pub fn uniform() -> Self {
        Self {
            factors: HashMap::new(),
            default_factor: 1.0,
            missing: Vec::new(),
            calls: Cell::new(0),
        }
    }

    pub fn with_factor(mut self, ch: char, factor: f32) -> Self {
        self.factors.insert(ch, factor);
        self
    }

    /// Characters this provider refuses with `FontError::MissingChar`.
    pub fn without(mut self, ch: char) -> Self {
        self.missing.push(ch);
        self
    }

    /// How many times `glyph` has been called.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn width(&self, ch: char, size: f32) -> f32 {
        size * self.factors.get(&ch).copied().unwrap_or(self.default_factor)
    }
}

impl FontMetricsProvider for BoxGlyphs {
    fn glyph(&self, ch: char, size: f32, depth: f32) -> Result<GlyphOutline, FontError> {
        self.calls.set(self.calls.get() + 1);
        if self.missing.contains(&ch) {
            return Err(FontError::MissingChar(ch));
        }
        let w = self.width(ch, size);
        let mesh = box_mesh(Vec3::ZERO, Vec3::new(w, size, depth.max(1e-3)));
        Ok(GlyphOutline::from_mesh(mesh))
    }
}

pub fn assert_close(a: f32, b: f32) {
    assert!((a - b).abs() < 1e-5, "{a} != {b}");
}
