//! Glyph/path tessellation and extrusion.
//!
//! This module turns vector outlines (`lyon::path::Path`) into renderer-friendly
//! triangle meshes:
//! - `tessellate_path` fills the outline in 2D (`lyon::tessellation::FillTessellator`).
//! - `extrude_path_to_mesh` turns the filled outline into a solid slab: a front cap at
//!   `z = depth`, a back cap at `z = 0` and side walls along the flattened contours.
//!
//! Notes:
//! - Fill tessellation assumes closed contours, which is what font outlines are.
//! - Fonts are authored for the non-zero rule; EvenOdd is exposed for odd data.
//! - Side-wall normals need to know which side of a contour is solid. TrueType and CFF
//!   disagree on contour direction, so we look at the total signed area of the glyph
//!   instead of trusting either convention.

use lyon::math::point;
use lyon::path::iterator::PathIterator;
use lyon::path::{Path, PathEvent};
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, FillVertexConstructor,
    VertexBuffers,
};

use crate::scene::Mesh3D;

/// Tessellation options tailored for glyph outlines.
///
/// - `tolerance`: maximum curve deviation in **output** units. Smaller means smoother
///   curves and more triangles.
/// - `fill_rule`: NonZero is the right default for fonts.
#[derive(Debug, Copy, Clone)]
pub struct TessellateOptions {
    pub tolerance: f32,
    pub fill_rule: FillRule,
}

impl Default for TessellateOptions {
    fn default() -> Self {
        Self {
            tolerance: 0.02,
            fill_rule: FillRule::NonZero,
        }
    }
}

/// Simple affine transform for 2D points (column-vector convention).
///
/// Matrix:
/// [ a c tx ]
/// [ b d ty ]
/// [ 0 0  1 ]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Affine2x3 {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for Affine2x3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine2x3 {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    #[inline]
    pub fn scale_translate(scale: f32, tx: f32, ty: f32) -> Self {
        Self {
            a: scale,
            b: 0.0,
            c: 0.0,
            d: scale,
            tx,
            ty,
        }
    }

    #[inline]
    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        let nx = self.a * x + self.c * y + self.tx;
        let ny = self.b * x + self.d * y + self.ty;
        (nx, ny)
    }

    /// Geometric-mean scale factor (`sqrt(|det|)`).
    #[inline]
    pub fn scale_factor(&self) -> f32 {
        (self.a * self.d - self.b * self.c).abs().sqrt()
    }
}

/// A vertex for tessellation output (2D position only).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TessVertex {
    pub position: [f32; 2],
}

/// Builds `TessVertex` from lyon's `FillVertex`.
struct TessVertexCtor {
    xf: Affine2x3,
}

impl FillVertexConstructor<TessVertex> for TessVertexCtor {
    fn new_vertex(&mut self, v: FillVertex) -> TessVertex {
        let p = v.position();
        let (x, y) = self.xf.transform_point(p.x, p.y);
        TessVertex { position: [x, y] }
    }
}

/// Tolerance in path units so the output deviation stays within `opts.tolerance`.
#[inline]
fn path_tolerance(transform: Affine2x3, opts: TessellateOptions) -> f32 {
    let scale = transform.scale_factor().max(1e-6);
    (opts.tolerance / scale).max(1e-4)
}

/// Fill-tessellate an outline, applying `transform` to every output vertex.
pub fn tessellate_path(
    path: &Path,
    transform: Affine2x3,
    opts: TessellateOptions,
) -> Result<VertexBuffers<TessVertex, u16>, String> {
    let mut tess = FillTessellator::new();
    let mut buffers: VertexBuffers<TessVertex, u16> = VertexBuffers::new();

    let fill =
        FillOptions::tolerance(path_tolerance(transform, opts)).with_fill_rule(opts.fill_rule);

    // Fonts can self-intersect; keep lyon's intersection handling on.
    let ctor = TessVertexCtor { xf: transform };
    tess.tessellate_path(path, &fill, &mut BuffersBuilder::new(&mut buffers, ctor))
        .map_err(|e| format!("lyon tessellation failed: {e:?}"))?;

    Ok(buffers)
}

/// Flatten an outline into closed polylines (last point not repeated).
pub fn flatten_contours(
    path: &Path,
    transform: Affine2x3,
    opts: TessellateOptions,
) -> Vec<Vec<[f32; 2]>> {
    let mut contours = Vec::new();
    let mut current: Vec<[f32; 2]> = Vec::new();

    let tf = |p: lyon::math::Point| {
        let (x, y) = transform.transform_point(p.x, p.y);
        [x, y]
    };

    for event in path.iter().flattened(path_tolerance(transform, opts)) {
        match event {
            PathEvent::Begin { at } => {
                current.clear();
                current.push(tf(at));
            }
            PathEvent::Line { to, .. } => current.push(tf(to)),
            PathEvent::End { .. } => {
                // Glyph contours are implicitly closed; drop a duplicated endpoint.
                if current.len() > 1 && current.first() == current.last() {
                    current.pop();
                }
                if current.len() >= 2 {
                    contours.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            }
            // `flattened` only yields lines.
            PathEvent::Quadratic { .. } | PathEvent::Cubic { .. } => {}
        }
    }

    contours
}

/// Shoelace area of a closed polyline; positive for counter-clockwise (Y up).
pub fn signed_area(contour: &[[f32; 2]]) -> f32 {
    let n = contour.len();
    let mut twice = 0.0f32;
    for i in 0..n {
        let [x0, y0] = contour[i];
        let [x1, y1] = contour[(i + 1) % n];
        twice += x0 * y1 - x1 * y0;
    }
    twice * 0.5
}

/// Extrude an outline into a closed 3D slab.
///
/// - `transform` maps path units into output units (e.g. font units -> world).
/// - The front cap sits at `z = depth` facing +Z, the back cap at `z = 0` facing -Z.
/// - `depth <= 0` yields only the front cap (a flat glyph).
///
/// Errors if tessellation fails or the mesh would overflow u16 indices.
pub fn extrude_path_to_mesh(
    path: &Path,
    transform: Affine2x3,
    depth: f32,
    opts: TessellateOptions,
) -> Result<Mesh3D, String> {
    let caps = tessellate_path(path, transform, opts)?;
    let depth = depth.max(0.0);

    let contours = if depth > 0.0 {
        flatten_contours(path, transform, opts)
    } else {
        Vec::new()
    };

    let cap_vertices = caps.vertices.len() * if depth > 0.0 { 2 } else { 1 };
    let wall_vertices: usize = contours.iter().map(|c| c.len() * 4).sum();
    if cap_vertices + wall_vertices >= u16::MAX as usize {
        return Err(format!(
            "extruded outline needs {} vertices; u16 indices allow {}",
            cap_vertices + wall_vertices,
            u16::MAX
        ));
    }

    let mut mesh = Mesh3D::default();
    append_cap(&mut mesh, &caps, depth, false);

    if depth > 0.0 {
        append_cap(&mut mesh, &caps, 0.0, true);
        append_walls(&mut mesh, &contours, depth);
    }

    Ok(mesh)
}

fn append_cap(mesh: &mut Mesh3D, caps: &VertexBuffers<TessVertex, u16>, z: f32, back: bool) {
    let normal = if back {
        [0.0, 0.0, -1.0]
    } else {
        [0.0, 0.0, 1.0]
    };

    let base = mesh.vertex_count() as u16;
    for v in &caps.vertices {
        mesh.push_vertex([v.position[0], v.position[1], z], normal);
    }

    for tri in caps.indices.chunks_exact(3) {
        if back {
            mesh.indices
                .extend([base + tri[0], base + tri[2], base + tri[1]]);
        } else {
            mesh.indices
                .extend([base + tri[0], base + tri[1], base + tri[2]]);
        }
    }
}

fn append_walls(mesh: &mut Mesh3D, contours: &[Vec<[f32; 2]>], depth: f32) {
    // Solid on the left of travel (CCW outers) when the total area is positive.
    let total: f32 = contours.iter().map(|c| signed_area(c)).sum();
    let solid_on_left = total >= 0.0;

    for contour in contours {
        let n = contour.len();
        for i in 0..n {
            let a = contour[i];
            let b = contour[(i + 1) % n];
            let dx = b[0] - a[0];
            let dy = b[1] - a[1];
            let len = (dx * dx + dy * dy).sqrt();
            if len <= f32::EPSILON {
                continue;
            }

            let (nx, ny) = if solid_on_left {
                (dy / len, -dx / len)
            } else {
                (-dy / len, dx / len)
            };
            let normal = [nx, ny, 0.0];

            let v0 = mesh.push_vertex([a[0], a[1], 0.0], normal);
            let v1 = mesh.push_vertex([b[0], b[1], 0.0], normal);
            let v2 = mesh.push_vertex([b[0], b[1], depth], normal);
            let v3 = mesh.push_vertex([a[0], a[1], depth], normal);
            mesh.indices.extend([v0, v1, v2, v0, v2, v3]);
        }
    }
}

/// Create a rectangle path centered on the origin (tests / bring-up).
pub fn rect_path(w: f32, h: f32) -> Path {
    let hw = w * 0.5;
    let hh = h * 0.5;

    let mut b = Path::builder();
    b.begin(point(-hw, -hh));
    b.line_to(point(hw, -hh));
    b.line_to(point(hw, hh));
    b.line_to(point(-hw, hh));
    b.close();
    b.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn cap_vertex_count(path: &Path) -> usize {
        tessellate_path(path, Affine2x3::IDENTITY, Default::default())
            .unwrap()
            .vertices
            .len()
    }

    #[test]
    fn test_rect_fill_is_two_triangles() {
        let buffers =
            tessellate_path(&rect_path(4.0, 2.0), Affine2x3::IDENTITY, Default::default())
                .unwrap();
        assert!(buffers.vertices.len() >= 4);
        assert_eq!(buffers.indices.len(), 6);
    }

    #[test]
    fn test_rect_contour_is_ccw() {
        let contours = flatten_contours(
            &rect_path(4.0, 2.0),
            Affine2x3::IDENTITY,
            Default::default(),
        );
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 4);
        assert!((signed_area(&contours[0]) - 8.0).abs() < 1e-5);
    }

    #[test]
    fn test_extruded_rect_is_a_closed_box() {
        let mesh = extrude_path_to_mesh(
            &rect_path(4.0, 2.0),
            Affine2x3::scale_translate(2.0, 0.0, 0.0),
            1.5,
            Default::default(),
        )
        .unwrap();

        // Front + back caps, then 4 walls * 4 vertices.
        let caps = cap_vertex_count(&rect_path(4.0, 2.0));
        assert_eq!(mesh.vertex_count(), 2 * caps + 16);
        // 2 + 2 cap triangles, 2 per wall.
        assert_eq!(mesh.indices.len(), (4 + 8) * 3);

        let b = mesh.bounds();
        assert_eq!(b.min, Vec3::new(-4.0, -2.0, 0.0));
        assert_eq!(b.max, Vec3::new(4.0, 2.0, 1.5));
    }

    #[test]
    fn test_wall_normals_point_outward() {
        let mesh = extrude_path_to_mesh(
            &rect_path(2.0, 2.0),
            Affine2x3::IDENTITY,
            1.0,
            Default::default(),
        )
        .unwrap();

        let caps = cap_vertex_count(&rect_path(2.0, 2.0));
        for (p, n) in mesh.positions.iter().zip(&mesh.normals).skip(2 * caps) {
            // Walls of a box centered on the origin: the normal agrees with the position.
            let outward = p[0] * n[0] + p[1] * n[1];
            assert!(outward > 0.0, "inward wall normal {n:?} at {p:?}");
            assert_eq!(n[2], 0.0);
        }
    }

    #[test]
    fn test_clockwise_outline_still_gets_outward_normals() {
        let mut b = Path::builder();
        b.begin(point(-1.0, -1.0));
        b.line_to(point(-1.0, 1.0));
        b.line_to(point(1.0, 1.0));
        b.line_to(point(1.0, -1.0));
        b.close();
        let cw = b.build();

        let mesh = extrude_path_to_mesh(&cw, Affine2x3::IDENTITY, 1.0, Default::default())
            .unwrap();
        let caps = cap_vertex_count(&cw);
        for (p, n) in mesh.positions.iter().zip(&mesh.normals).skip(2 * caps) {
            assert!(p[0] * n[0] + p[1] * n[1] > 0.0);
        }
    }

    #[test]
    fn test_zero_depth_has_front_cap_only() {
        let mesh = extrude_path_to_mesh(
            &rect_path(2.0, 2.0),
            Affine2x3::IDENTITY,
            0.0,
            Default::default(),
        )
        .unwrap();
        assert_eq!(mesh.vertex_count(), cap_vertex_count(&rect_path(2.0, 2.0)));
        assert!(mesh.normals.iter().all(|n| *n == [0.0, 0.0, 1.0]));
    }
}
