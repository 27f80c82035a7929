mod common;

use std::f32::consts::PI;

use common::{BoxGlyphs, assert_close};
use glam::Vec3;
use ringtext::ring::{LayoutParams, RingError, SPACE_WIDTH_FACTOR, build};

fn params(text: &str) -> LayoutParams {
    LayoutParams {
        text: text.to_string(),
        radius: 70.0,
        size: 6.0,
        depth: 1.0,
        spacing: 1.0,
        speed: 0.01,
    }
}

#[test]
fn test_two_glyphs_straddle_zero() {
    let fonts = BoxGlyphs::uniform();
    let ring = build(&params("AB"), &fonts).unwrap();
    let w = fonts.width('A', 6.0);

    assert_close(ring.total_angle(), 2.0 * w / 70.0);
    let angles: Vec<f32> = ring.placements().map(|p| p.angle).collect();
    assert_eq!(angles.len(), 2);
    assert_close(angles[0], -w / 140.0);
    assert_close(angles[1], w / 140.0);
}

#[test]
fn test_space_takes_a_slot_without_geometry() {
    let fonts = BoxGlyphs::uniform();
    let p = params("A B");
    let ring = build(&p, &fonts).unwrap();
    let w = fonts.width('A', p.size);
    let s = p.size * SPACE_WIDTH_FACTOR * p.spacing;

    assert_eq!(ring.glyphs().len(), 2);
    assert_eq!(ring.descriptors().len(), 3);
    assert!(!ring.descriptors()[1].renderable);
    assert_close(ring.total_angle(), (2.0 * w + s) / 70.0);
}

#[test]
fn test_widths_sum_to_total_and_run_is_centered() {
    let fonts = BoxGlyphs::uniform()
        .with_factor('I', 0.3)
        .with_factor('W', 1.4)
        .with_factor('•', 0.5);
    let p = params("WIDE • RING\tTEST");
    let ring = build(&p, &fonts).unwrap();

    let sum: f32 = ring
        .descriptors()
        .iter()
        .map(|d| d.angular_width(p.radius))
        .sum();
    assert_close(sum, ring.total_angle());

    let first = &ring.descriptors()[0];
    let leading = ring.glyphs()[0].placement.angle - first.angular_width(p.radius) / 2.0;
    assert_close(leading, -ring.total_angle() / 2.0);

    let visible = p.text.chars().filter(|c| !c.is_whitespace()).count();
    assert_eq!(ring.glyphs().len(), visible);
}

#[test]
fn test_odd_count_puts_middle_glyph_at_zero() {
    let fonts = BoxGlyphs::uniform();
    let ring = build(&params("ABCDE"), &fonts).unwrap();
    let middle = &ring.glyphs()[2];
    assert_eq!(middle.character, 'C');
    assert!(middle.placement.angle.abs() < 1e-6);
    assert_close(middle.placement.position.x, 70.0);
}

#[test]
fn test_placements_sit_on_the_ring_facing_out() {
    let fonts = BoxGlyphs::uniform();
    let ring = build(&params("RUST • TEXT AROUND EARTH"), &fonts).unwrap();
    for p in ring.placements() {
        assert_eq!(p.position.y, 0.0);
        assert_close(p.position.length(), 70.0);
        assert!(p.front().distance(p.position.normalize()) < 1e-5);
        assert!((-PI..PI).contains(&p.angle));
    }
}

#[test]
fn test_build_is_idempotent() {
    let fonts = BoxGlyphs::uniform().with_factor('X', 0.77);
    let p = params("XAXBX CX");
    let a = build(&p, &fonts).unwrap();
    let b = build(&p, &fonts).unwrap();
    assert_eq!(a.total_angle(), b.total_angle());
    let pa: Vec<_> = a.placements().copied().collect();
    let pb: Vec<_> = b.placements().copied().collect();
    assert_eq!(pa, pb);
}

#[test]
fn test_empty_text_builds_empty_ring() {
    let ring = build(&params(""), &BoxGlyphs::uniform()).unwrap();
    assert_eq!(ring.glyphs().len(), 0);
    assert_eq!(ring.total_angle(), 0.0);

    let spaces = build(&params("   "), &BoxGlyphs::uniform()).unwrap();
    assert_eq!(spaces.glyphs().len(), 0);
    assert_close(spaces.total_angle(), 3.0 * 6.0 * SPACE_WIDTH_FACTOR * 1.0 / 70.0);
}

#[test]
fn test_consecutive_spaces_each_take_a_slot() {
    let fonts = BoxGlyphs::uniform();
    let one = build(&params("A B"), &fonts).unwrap();
    let two = build(&params("A  B"), &fonts).unwrap();
    let s = 6.0 * SPACE_WIDTH_FACTOR * 1.0 / 70.0;

    assert_eq!(two.glyphs().len(), 2);
    assert_eq!(two.descriptors().len(), 4);
    assert_close(two.total_angle() - one.total_angle(), s);

    let gap = |ring: &ringtext::ring::TextRing| {
        ring.glyphs()[1].placement.angle - ring.glyphs()[0].placement.angle
    };
    assert_close(gap(&two) - gap(&one), s);
}

#[test]
fn test_unicode_whitespace_counts_as_space() {
    let fonts = BoxGlyphs::uniform();
    let ascii = build(&params("A B"), &fonts).unwrap();
    for text in ["A\u{00A0}B", "A\tB", "A\u{3000}B"] {
        let ring = build(&params(text), &fonts).unwrap();
        assert_eq!(ring.glyphs().len(), 2, "{text:?}");
        assert!(!ring.descriptors()[1].renderable);
        assert_close(ring.total_angle(), ascii.total_angle());
    }
}

#[test]
fn test_zero_radius_is_rejected() {
    let p = LayoutParams {
        radius: 0.0,
        ..params("AB")
    };
    assert!(matches!(
        build(&p, &BoxGlyphs::uniform()),
        Err(RingError::InvalidParameter { name: "radius", .. })
    ));
}

#[test]
fn test_doubling_spacing_doubles_slots_not_geometry() {
    let fonts = BoxGlyphs::uniform().with_factor('M', 1.3);
    let one = build(&params("MA N"), &fonts).unwrap();
    let two = build(
        &LayoutParams {
            spacing: 2.0,
            ..params("MA N")
        },
        &fonts,
    )
    .unwrap();

    assert_close(two.total_angle(), 2.0 * one.total_angle());
    for (a, b) in one.descriptors().iter().zip(two.descriptors()) {
        assert_close(b.outline_width, 2.0 * a.outline_width);
    }
    for (a, b) in one.glyphs().iter().zip(two.glyphs()) {
        assert_eq!(a.mesh, b.mesh);
    }
}

#[test]
fn test_glyph_geometry_is_centered() {
    let ring = build(&params("AB"), &BoxGlyphs::uniform()).unwrap();
    for g in ring.glyphs() {
        assert!(g.bounds.center().length() < 1e-5);
        assert!(g.mesh.bounds().center().length() < 1e-5);
    }
}

#[test]
fn test_repeated_characters_are_measured_once() {
    let fonts = BoxGlyphs::uniform();
    build(&params("AAAA BBBB"), &fonts).unwrap();
    assert_eq!(fonts.calls(), 2);
}

#[test]
fn test_missing_glyph_names_the_character() {
    let fonts = BoxGlyphs::uniform().without('Z');
    match build(&params("AZ"), &fonts) {
        Err(RingError::GlyphResolution { character, .. }) => assert_eq!(character, 'Z'),
        other => panic!("expected GlyphResolution, got {other:?}"),
    }
}

#[test]
fn test_flatten_applies_parent_rotation() {
    let mut ring = build(&params("A"), &BoxGlyphs::uniform()).unwrap();
    ring.advance(PI / 2.0);

    let mut items = Vec::new();
    ring.flatten(&mut items);
    assert_eq!(items.len(), 1);

    // Glyph at angle 0 sits on +X; a quarter turn about +Y carries it to -Z.
    let origin = items[0].world_from_local.transform_point3(Vec3::ZERO);
    assert!(origin.distance(Vec3::new(0.0, 0.0, -70.0)) < 1e-3, "{origin}");
}

#[test]
fn test_dispose_releases_glyphs_once() {
    let mut ring = build(&params("ABC"), &BoxGlyphs::uniform()).unwrap();
    assert_eq!(ring.dispose(), 3);
    assert_eq!(ring.dispose(), 0);
    assert!(ring.glyphs().is_empty());

    let mut items = Vec::new();
    ring.flatten(&mut items);
    assert!(items.is_empty());
}
