//! Scene graph abstractions.
//!
//! The mental model is the usual retained-mode one:
//! - You build a scene out of nodes (`Node3D`) that carry a transform, optional
//!   geometry and a material.
//! - A perspective camera maps world coordinates into clip space.
//! - Renderers consume a flattened list of draw items (mesh + material + transform).
//!
//! Conventions:
//! - Right-handed, Y-up world. The text ring lies in the XZ plane.
//! - Column vectors; composition is `world_from_local = parent * local`.
//! - Clip space follows `wgpu` (depth in `0..1`), which is what `glam`'s `*_rh`
//!   projections produce.
//!
//! This module intentionally does not depend on wgpu; it is renderer-agnostic.

use std::collections::BTreeMap;

use glam::{Mat4, Vec3};

/// Axis-aligned bounding box in world (or local) units.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb3 {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb3 {
    #[inline]
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    #[inline]
    pub fn include_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Horizontal extent (`max.x - min.x`), zero for an empty box.
    #[inline]
    pub fn width(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.max.x - self.min.x
        }
    }
}

/// Simple RGBA color (linear space assumed; the renderer writes to an sRGB view).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    /// Build an opaque color from a `0xRRGGBB` literal.
    #[inline]
    pub fn from_hex(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xff) as f32 / 255.0,
            g: ((rgb >> 8) & 0xff) as f32 / 255.0,
            b: (rgb & 0xff) as f32 / 255.0,
            a: 1.0,
        }
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Surface description for the lit mesh pipeline.
///
/// `metalness` and `roughness` are both in `[0, 1]`. The renderer uses them to
/// shape a cheap specular lobe; there is no image-based lighting.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Material {
    pub color: Rgba,
    pub metalness: f32,
    pub roughness: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Rgba::WHITE,
            metalness: 0.0,
            roughness: 1.0,
        }
    }
}

impl Material {
    /// Convert a Phong-style shininess exponent into an approximate roughness.
    #[inline]
    pub fn from_shininess(color: Rgba, shininess: f32) -> Self {
        Self {
            color,
            metalness: 0.0,
            roughness: (2.0 / (shininess.max(0.0) + 2.0)).sqrt(),
        }
    }
}

/// A renderer-agnostic triangle mesh with per-vertex normals.
///
/// Indices are u16; meshes that would overflow must be split by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh3D {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u16>,
}

impl Mesh3D {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Push one vertex and return its index.
    ///
    /// Panics if the vertex count exceeds `u16::MAX`.
    #[inline]
    pub fn push_vertex(&mut self, position: [f32; 3], normal: [f32; 3]) -> u16 {
        let idx = self.positions.len();
        assert!(
            idx < u16::MAX as usize,
            "Mesh3D::push_vertex: vertex count overflow for u16 indices"
        );
        self.positions.push(position);
        self.normals.push(normal);
        idx as u16
    }

    /// Append `other` into `self` with index offset.
    ///
    /// Panics if the vertex count exceeds `u16::MAX`.
    pub fn append(&mut self, other: &Mesh3D) {
        let base = self.positions.len();
        assert!(
            base + other.positions.len() <= u16::MAX as usize,
            "Mesh3D::append: vertex count overflow for u16 indices"
        );

        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);

        let base = base as u16;
        self.indices
            .extend(other.indices.iter().copied().map(|i| base + i));
    }

    /// Translate every vertex in place.
    pub fn translate(&mut self, offset: Vec3) {
        for p in &mut self.positions {
            p[0] += offset.x;
            p[1] += offset.y;
            p[2] += offset.z;
        }
    }

    /// Tight bounds over all vertex positions.
    pub fn bounds(&self) -> Aabb3 {
        let mut b = Aabb3::empty();
        for &p in &self.positions {
            b.include_point(Vec3::from_array(p));
        }
        b
    }

    /// Shift the mesh so its bounding box is centered on the local origin.
    ///
    /// Returns the new (centered) bounds.
    pub fn center(&mut self) -> Aabb3 {
        let b = self.bounds();
        if b.is_empty() {
            return b;
        }
        let c = b.center();
        self.translate(-c);
        Aabb3::from_min_max(b.min - c, b.max - c)
    }
}

/// A draw item produced by flattening.
///
/// Borrows the mesh from its owner, so flattening every frame is cheap.
#[derive(Debug, Clone, Copy)]
pub struct DrawItem3D<'a> {
    pub mesh: &'a Mesh3D,
    pub material: Material,
    pub world_from_local: Mat4,
}

/// A node in the scene graph.
#[derive(Debug, Clone)]
pub struct Node3D {
    pub name: String,
    pub local_from_parent: Mat4,
    pub material: Material,
    pub mesh: Option<Mesh3D>,
    pub children: Vec<Node3D>,
    pub visible: bool,
}

impl Default for Node3D {
    fn default() -> Self {
        Self {
            name: "node".to_string(),
            local_from_parent: Mat4::IDENTITY,
            material: Material::default(),
            mesh: None,
            children: Vec::new(),
            visible: true,
        }
    }
}

impl Node3D {
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[inline]
    pub fn with_mesh(mut self, mesh: Mesh3D) -> Self {
        self.mesh = Some(mesh);
        self
    }

    #[inline]
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    #[inline]
    pub fn with_transform(mut self, local_from_parent: Mat4) -> Self {
        self.local_from_parent = local_from_parent;
        self
    }

    #[inline]
    pub fn add_child(&mut self, child: Node3D) {
        self.children.push(child);
    }

    /// Flatten this subtree into draw items, composing transforms.
    ///
    /// Invisible nodes hide their whole subtree.
    pub fn flatten<'a>(&'a self, parent_from_world: Mat4, out: &mut Vec<DrawItem3D<'a>>) {
        if !self.visible {
            return;
        }

        let world_from_local = parent_from_world * self.local_from_parent;

        if let Some(mesh) = &self.mesh {
            if !mesh.is_empty() {
                out.push(DrawItem3D {
                    mesh,
                    material: self.material,
                    world_from_local,
                });
            }
        }

        for child in &self.children {
            child.flatten(world_from_local, out);
        }
    }
}

/// A perspective camera looking at a target point.
#[derive(Debug, Copy, Clone)]
pub struct Camera3D {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
}

impl Default for Camera3D {
    fn default() -> Self {
        Self {
            position: Vec3::new(200.0, 200.0, 200.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 75.0_f32.to_radians(),
            near: 1.0,
            far: 1000.0,
            aspect: 1.0,
        }
    }
}

impl Camera3D {
    /// Set the viewport size in pixels to update the aspect ratio.
    #[inline]
    pub fn set_viewport_px(&mut self, width: u32, height: u32) {
        let w = width.max(1) as f32;
        let h = height.max(1) as f32;
        self.aspect = w / h;
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    #[inline]
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    /// World -> clip transform.
    #[inline]
    pub fn clip_from_world(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

/// A directional light. `direction` points from the light toward the scene.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub intensity: f32,
}

impl DirectionalLight {
    /// A light placed at `position` shining at the origin.
    #[inline]
    pub fn from_position(position: Vec3, intensity: f32) -> Self {
        Self {
            direction: (-position).normalize_or_zero(),
            intensity,
        }
    }
}

/// Scene lighting: one ambient term plus a key and a fill light.
///
/// `exposure` scales the lit color before filmic tone mapping.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Lighting {
    pub ambient: f32,
    pub key: DirectionalLight,
    pub fill: DirectionalLight,
    pub exposure: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: 2.0,
            key: DirectionalLight::from_position(Vec3::new(100.0, 100.0, 100.0), 1.5),
            fill: DirectionalLight::from_position(Vec3::new(-100.0, -100.0, -100.0), 0.8),
            exposure: 1.2,
        }
    }
}

/// A top-level scene that holds named root nodes.
#[derive(Debug, Default)]
pub struct Scene3D {
    pub camera: Camera3D,
    pub lighting: Lighting,
    pub roots: Vec<Node3D>,
    /// A simple name index for convenience.
    pub index: BTreeMap<String, usize>,
}

impl Scene3D {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(&mut self, node: Node3D) {
        let idx = self.roots.len();
        self.index.insert(node.name.clone(), idx);
        self.roots.push(node);
    }

    pub fn get(&self, name: &str) -> Option<&Node3D> {
        self.index.get(name).and_then(|&i| self.roots.get(i))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Node3D> {
        let i = *self.index.get(name)?;
        self.roots.get_mut(i)
    }

    /// Flatten all roots into draw items.
    pub fn flatten(&self) -> Vec<DrawItem3D<'_>> {
        let mut items = Vec::new();
        for root in &self.roots {
            root.flatten(Mat4::IDENTITY, &mut items);
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> Mesh3D {
        let mut m = Mesh3D::default();
        let a = m.push_vertex([0.0, 0.0, 0.0], [0.0, 0.0, 1.0]);
        let b = m.push_vertex([2.0, 0.0, 0.0], [0.0, 0.0, 1.0]);
        let c = m.push_vertex([0.0, 4.0, 0.0], [0.0, 0.0, 1.0]);
        m.indices.extend([a, b, c]);
        m
    }

    #[test]
    fn test_mesh_center_moves_bounds_to_origin() {
        let mut m = unit_triangle();
        let b = m.center();
        assert_eq!(b.center(), Vec3::ZERO);
        assert_eq!(b.size(), Vec3::new(2.0, 4.0, 0.0));
        assert_eq!(m.bounds(), b);
    }

    #[test]
    fn test_mesh_append_offsets_indices() {
        let mut a = unit_triangle();
        let b = unit_triangle();
        a.append(&b);
        assert_eq!(a.vertex_count(), 6);
        assert_eq!(&a.indices[3..], &[3, 4, 5]);
        assert_eq!(a.normals.len(), a.positions.len());
    }

    #[test]
    fn test_empty_aabb_has_zero_width() {
        assert!(Aabb3::empty().is_empty());
        assert_eq!(Aabb3::empty().width(), 0.0);
    }

    #[test]
    fn test_flatten_composes_parent_transform() {
        let mut parent =
            Node3D::new("parent").with_transform(Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)));
        parent.add_child(
            Node3D::new("child")
                .with_mesh(unit_triangle())
                .with_transform(Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0))),
        );

        let mut scene = Scene3D::new();
        scene.add_root(parent);

        let items = scene.flatten();
        assert_eq!(items.len(), 1);
        let p = items[0].world_from_local.transform_point3(Vec3::ZERO);
        assert_eq!(p, Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_hidden_node_is_skipped() {
        let mut node = Node3D::new("hidden").with_mesh(unit_triangle());
        node.visible = false;
        let mut scene = Scene3D::new();
        scene.add_root(node);
        assert!(scene.flatten().is_empty());
        assert!(scene.get("hidden").is_some());
    }

    #[test]
    fn test_camera_target_projects_to_screen_center() {
        let mut cam = Camera3D::default();
        cam.set_viewport_px(1600, 900);
        let clip = cam.clip_from_world() * cam.target.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn test_hex_color() {
        let c = Rgba::from_hex(0x66ccff);
        assert!((c.r - 0.4).abs() < 1e-6);
        assert!((c.g - 0.8).abs() < 1e-6);
        assert_eq!(c.b, 1.0);
    }
}
