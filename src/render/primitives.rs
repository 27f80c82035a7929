//! Procedural meshes for the scene backdrop.
//!
//! Everything here produces `scene::Mesh3D` (CPU-side, u16 indices, CCW front faces)
//! and is drawn by `MeshRenderer` like any other item.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::scene::{Material, Mesh3D, Rgba};

/// Default globe parameters: radius 50, 100 x 100 segments, shininess 10.
pub const GLOBE_RADIUS: f32 = 50.0;
pub const GLOBE_SEGMENTS: u32 = 100;
pub const GLOBE_SHININESS: f32 = 10.0;

/// Default axis guide length.
pub const AXES_LENGTH: f32 = 200.0;

/// A UV sphere centered on the origin.
///
/// `width_segments` runs around the Y axis, `height_segments` from pole to pole.
/// Returns `None` if the vertex count would not fit u16 indices.
pub fn uv_sphere(radius: f32, width_segments: u32, height_segments: u32) -> Option<Mesh3D> {
    let ws = width_segments.max(3);
    let hs = height_segments.max(2);
    let vertex_count = (ws as usize + 1) * (hs as usize + 1);
    if vertex_count > u16::MAX as usize {
        return None;
    }

    let mut mesh = Mesh3D {
        positions: Vec::with_capacity(vertex_count),
        normals: Vec::with_capacity(vertex_count),
        indices: Vec::with_capacity(ws as usize * hs as usize * 6),
    };

    for iy in 0..=hs {
        let v = iy as f32 / hs as f32;
        let theta = v * PI;
        for ix in 0..=ws {
            let u = ix as f32 / ws as f32;
            let phi = u * TAU;
            let n = Vec3::new(
                -phi.cos() * theta.sin(),
                theta.cos(),
                phi.sin() * theta.sin(),
            );
            mesh.push_vertex((n * radius).to_array(), n.to_array());
        }
    }

    let row = ws + 1;
    for iy in 0..hs {
        for ix in 0..ws {
            let a = (iy * row + ix + 1) as u16;
            let b = (iy * row + ix) as u16;
            let c = ((iy + 1) * row + ix) as u16;
            let d = ((iy + 1) * row + ix + 1) as u16;
            // Degenerate triangles at the poles are skipped.
            if iy != 0 {
                mesh.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != hs - 1 {
                mesh.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    Some(mesh)
}

/// An axis-aligned box between `min` and `max`, with flat per-face normals.
pub fn box_mesh(min: Vec3, max: Vec3) -> Mesh3D {
    let mut mesh = Mesh3D::default();
    let faces: [(Vec3, [Vec3; 4]); 6] = [
        (
            Vec3::X,
            [
                Vec3::new(max.x, min.y, max.z),
                Vec3::new(max.x, min.y, min.z),
                Vec3::new(max.x, max.y, min.z),
                Vec3::new(max.x, max.y, max.z),
            ],
        ),
        (
            Vec3::NEG_X,
            [
                Vec3::new(min.x, min.y, min.z),
                Vec3::new(min.x, min.y, max.z),
                Vec3::new(min.x, max.y, max.z),
                Vec3::new(min.x, max.y, min.z),
            ],
        ),
        (
            Vec3::Y,
            [
                Vec3::new(min.x, max.y, max.z),
                Vec3::new(max.x, max.y, max.z),
                Vec3::new(max.x, max.y, min.z),
                Vec3::new(min.x, max.y, min.z),
            ],
        ),
        (
            Vec3::NEG_Y,
            [
                Vec3::new(min.x, min.y, min.z),
                Vec3::new(max.x, min.y, min.z),
                Vec3::new(max.x, min.y, max.z),
                Vec3::new(min.x, min.y, max.z),
            ],
        ),
        (
            Vec3::Z,
            [
                Vec3::new(min.x, min.y, max.z),
                Vec3::new(max.x, min.y, max.z),
                Vec3::new(max.x, max.y, max.z),
                Vec3::new(min.x, max.y, max.z),
            ],
        ),
        (
            Vec3::NEG_Z,
            [
                Vec3::new(max.x, min.y, min.z),
                Vec3::new(min.x, min.y, min.z),
                Vec3::new(min.x, max.y, min.z),
                Vec3::new(max.x, max.y, min.z),
            ],
        ),
    ];

    for (normal, corners) in faces {
        let n = normal.to_array();
        let base = mesh.push_vertex(corners[0].to_array(), n);
        for c in &corners[1..] {
            mesh.push_vertex(c.to_array(), n);
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh
}

/// One colored axis of the orientation guide.
#[derive(Debug, Clone)]
pub struct AxisGuide {
    pub mesh: Mesh3D,
    pub material: Material,
}

/// Three thin bars along +X (red), +Y (green) and +Z (blue), starting at the origin.
pub fn axis_guides(length: f32, thickness: f32) -> [AxisGuide; 3] {
    let h = thickness * 0.5;
    let bar = |dir: Vec3| {
        let far = dir * length;
        box_mesh(far.min(Vec3::ZERO) - Vec3::splat(h), far.max(Vec3::ZERO) + Vec3::splat(h))
    };
    let unlit = |hex: u32| Material {
        color: Rgba::from_hex(hex),
        metalness: 0.0,
        roughness: 1.0,
    };
    [
        AxisGuide {
            mesh: bar(Vec3::X),
            material: unlit(0xff0000),
        },
        AxisGuide {
            mesh: bar(Vec3::Y),
            material: unlit(0x00ff00),
        },
        AxisGuide {
            mesh: bar(Vec3::Z),
            material: unlit(0x0000ff),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uv_sphere_vertices_on_surface() {
        let mesh = uv_sphere(GLOBE_RADIUS, 16, 8).expect("fits u16");
        assert_eq!(mesh.vertex_count(), 17 * 9);
        for p in &mesh.positions {
            let r = Vec3::from_array(*p).length();
            assert!((r - GLOBE_RADIUS).abs() < 1e-3);
        }
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));
    }

    #[test]
    fn test_default_globe_fits_u16() {
        let mesh = uv_sphere(GLOBE_RADIUS, GLOBE_SEGMENTS, GLOBE_SEGMENTS);
        assert!(mesh.is_some());
        assert!(uv_sphere(1.0, 400, 400).is_none());
    }

    #[test]
    fn test_box_normals_point_outward() {
        let mesh = box_mesh(Vec3::splat(-1.0), Vec3::splat(1.0));
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.indices.len(), 36);
        for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
            assert!(Vec3::from_array(*p).dot(Vec3::from_array(*n)) > 0.0);
        }
    }

    #[test]
    fn test_axis_guides_extend_along_axes() {
        let [x, y, z] = axis_guides(AXES_LENGTH, 0.5);
        assert!((x.mesh.bounds().max.x - AXES_LENGTH - 0.25).abs() < 1e-4);
        assert!((y.mesh.bounds().max.y - AXES_LENGTH - 0.25).abs() < 1e-4);
        assert!((z.mesh.bounds().max.z - AXES_LENGTH - 0.25).abs() < 1e-4);
    }
}
