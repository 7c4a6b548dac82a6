//! CPU-side meshes and the procedural builders used by both scenes.
//!
//! Vertices are interleaved as position, normal, uv, color and point size.
//! Texture coordinates follow the GPU convention: `v = 0` is the top row of
//! the image.

use std::f32::consts::{PI, TAU};

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 4],
    /// Point sprite size; zero for regular surfaces and for hidden sprites.
    pub size: f32,
}

impl Vertex {
    fn surface(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
            uv: uv.into(),
            color: [1.0; 4],
            size: 0.0,
        }
    }
}

/// Local-space shape used for ray picking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bounds {
    Sphere { radius: f32 },
    Box { half_extents: Vec3 },
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub bounds: Bounds,
    sprites: bool,
    revision: u64,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>, bounds: Bounds) -> Self {
        Self {
            vertices,
            indices,
            bounds,
            sprites: false,
            revision: 0,
        }
    }

    /// Whether each group of four vertices is one screen-facing sprite.
    pub fn is_sprites(&self) -> bool {
        self.sprites
    }

    /// Bumped every time the mesh is handed out mutably through [`MeshStore`].
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Number of sprites in a mesh built by [`points`].
    pub fn point_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// Moves sprite `index` to `position`; out-of-range indices are ignored.
    pub fn set_point_position(&mut self, index: usize, position: Vec3) {
        if let Some(quad) = self.vertices.get_mut(index * 4..index * 4 + 4) {
            for vertex in quad {
                vertex.position = position.into();
            }
        }
    }

    pub fn point_position(&self, index: usize) -> Option<Vec3> {
        self.vertices
            .get(index * 4)
            .map(|vertex| Vec3::from(vertex.position))
    }

    /// Moves every sprite one slot toward the end, dropping the last one.
    /// Slot 0 keeps its current value.
    pub fn shift_points(&mut self) {
        let len = self.vertices.len();
        if len >= 8 {
            self.vertices.copy_within(0..len - 4, 4);
        }
    }

    pub fn point_size(&self, index: usize) -> Option<f32> {
        self.vertices.get(index * 4).map(|vertex| vertex.size)
    }

    pub fn set_point_size(&mut self, index: usize, size: f32) {
        if let Some(quad) = self.vertices.get_mut(index * 4..index * 4 + 4) {
            for vertex in quad {
                vertex.size = size;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(usize);

#[derive(Debug, Default)]
pub struct MeshStore {
    meshes: Vec<Mesh>,
}

impl MeshStore {
    pub fn insert(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn get(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0)
    }

    /// Mutable access marks the mesh dirty so the renderer re-uploads it.
    pub fn get_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        let mesh = self.meshes.get_mut(id.0)?;
        mesh.revision += 1;
        Some(mesh)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

/// UV sphere centered at the origin, seam along -X like most DCC tools.
pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Mesh {
    let ws = width_segments.max(3);
    let hs = height_segments.max(2);
    let mut vertices = Vec::with_capacity(((ws + 1) * (hs + 1)) as usize);
    for iy in 0..=hs {
        let v = iy as f32 / hs as f32;
        for ix in 0..=ws {
            let u = ix as f32 / ws as f32;
            let direction = Vec3::new(
                -(u * TAU).cos() * (v * PI).sin(),
                (v * PI).cos(),
                (u * TAU).sin() * (v * PI).sin(),
            );
            vertices.push(Vertex::surface(
                direction * radius,
                direction.normalize_or_zero(),
                Vec2::new(u, v),
            ));
        }
    }

    let row = ws + 1;
    let mut indices = Vec::new();
    for iy in 0..hs {
        for ix in 0..ws {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != hs - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
    Mesh::new(vertices, indices, Bounds::Sphere { radius })
}

/// Flat annulus in the XY plane facing +Z. UVs are a planar projection
/// scaled by the outer radius, so a radial texture maps onto the ring.
pub fn ring(inner: f32, outer: f32, segments: u32) -> Mesh {
    let segments = segments.max(3);
    let mut vertices = Vec::with_capacity(2 * (segments as usize + 1));
    for radius in [inner, outer] {
        for i in 0..=segments {
            let angle = i as f32 / segments as f32 * TAU;
            let position = Vec3::new(radius * angle.cos(), radius * angle.sin(), 0.0);
            let uv = Vec2::new(
                (position.x / outer + 1.0) / 2.0,
                1.0 - (position.y / outer + 1.0) / 2.0,
            );
            vertices.push(Vertex::surface(position, Vec3::Z, uv));
        }
    }
    let mut indices = Vec::with_capacity(segments as usize * 6);
    for i in 0..segments {
        let a = i;
        let b = i + segments + 1;
        let c = i + segments + 2;
        let d = i + 1;
        indices.extend_from_slice(&[a, b, d, b, c, d]);
    }
    Mesh::new(vertices, indices, Bounds::None)
}

/// Rectangle in the XY plane facing +Z.
pub fn plane(width: f32, height: f32) -> Mesh {
    let (hw, hh) = (width / 2.0, height / 2.0);
    let vertices = vec![
        Vertex::surface(Vec3::new(-hw, -hh, 0.0), Vec3::Z, Vec2::new(0.0, 1.0)),
        Vertex::surface(Vec3::new(hw, -hh, 0.0), Vec3::Z, Vec2::new(1.0, 1.0)),
        Vertex::surface(Vec3::new(hw, hh, 0.0), Vec3::Z, Vec2::new(1.0, 0.0)),
        Vertex::surface(Vec3::new(-hw, hh, 0.0), Vec3::Z, Vec2::new(0.0, 0.0)),
    ];
    Mesh::new(vertices, vec![0, 1, 2, 0, 2, 3], Bounds::None)
}

/// Axis-aligned box centered at the origin, one quad per face.
pub fn cuboid(width: f32, height: f32, depth: f32) -> Mesh {
    let h = Vec3::new(width, height, depth) / 2.0;
    let faces = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    ];
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, right, up) in faces {
        let base = vertices.len() as u32;
        let center = normal * h;
        let r = right * h;
        let u = up * h;
        let corners = [
            (center - r - u, Vec2::new(0.0, 1.0)),
            (center + r - u, Vec2::new(1.0, 1.0)),
            (center + r + u, Vec2::new(1.0, 0.0)),
            (center - r + u, Vec2::new(0.0, 0.0)),
        ];
        for (position, uv) in corners {
            vertices.push(Vertex::surface(position, normal, uv));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    Mesh::new(vertices, indices, Bounds::Box { half_extents: h })
}

/// Triangular prism: a gable of `width` and `height` with its base on y = 0,
/// extruded `depth` along Z.
pub fn gable(width: f32, height: f32, depth: f32) -> Mesh {
    let (hw, hd) = (width / 2.0, depth / 2.0);
    let left = |z: f32| Vec3::new(-hw, 0.0, z);
    let right = |z: f32| Vec3::new(hw, 0.0, z);
    let apex = |z: f32| Vec3::new(0.0, height, z);

    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let mut triangle = |corners: [(Vec3, Vec2); 3]| {
        let normal = (corners[1].0 - corners[0].0)
            .cross(corners[2].0 - corners[0].0)
            .normalize_or_zero();
        let base = vertices.len() as u32;
        for (position, uv) in corners {
            vertices.push(Vertex::surface(position, normal, uv));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2]);
    };

    let (bl, br, tl, tr) = (
        Vec2::new(0.0, 1.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
    );
    let top = Vec2::new(0.5, 0.0);
    // Gable ends.
    triangle([(left(hd), bl), (right(hd), br), (apex(hd), top)]);
    triangle([(right(-hd), bl), (left(-hd), br), (apex(-hd), top)]);
    // Right slope.
    triangle([(right(hd), bl), (right(-hd), br), (apex(-hd), tr)]);
    triangle([(right(hd), bl), (apex(-hd), tr), (apex(hd), tl)]);
    // Left slope.
    triangle([(left(-hd), bl), (left(hd), br), (apex(hd), tr)]);
    triangle([(left(-hd), bl), (apex(hd), tr), (apex(-hd), tl)]);
    // Underside.
    triangle([(left(-hd), tl), (right(-hd), tr), (right(hd), br)]);
    triangle([(left(-hd), tl), (right(hd), br), (left(hd), bl)]);

    Mesh::new(vertices, indices, Bounds::None)
}

/// One screen-facing sprite of a point cloud.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSprite {
    pub position: Vec3,
    pub color: [f32; 4],
    pub size: f32,
}

/// Expands each sprite to a quad sharing its center; the vertex shader
/// pushes the corners apart in screen space using the uv as the offset.
pub fn points(sprites: &[PointSprite]) -> Mesh {
    let mut vertices = Vec::with_capacity(sprites.len() * 4);
    let mut indices = Vec::with_capacity(sprites.len() * 6);
    let corners = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];
    for sprite in sprites {
        let base = vertices.len() as u32;
        for uv in corners {
            vertices.push(Vertex {
                position: sprite.position.into(),
                normal: [0.0, 0.0, 1.0],
                uv,
                color: sprite.color,
                size: sprite.size,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    let mut mesh = Mesh::new(vertices, indices, Bounds::None);
    mesh.sprites = true;
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let mesh = sphere(2.0, 16, 12);
        assert_eq!(mesh.vertices.len(), 17 * 13);
        for vertex in &mesh.vertices {
            let length = Vec3::from(vertex.position).length();
            assert!((length - 2.0).abs() < 1e-4);
        }
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
        assert_eq!(mesh.bounds, Bounds::Sphere { radius: 2.0 });
    }

    #[test]
    fn sphere_triangles_face_outward() {
        let mesh = sphere(1.0, 8, 6);
        for tri in mesh.indices.chunks_exact(3) {
            let p: Vec<Vec3> = tri
                .iter()
                .map(|&i| Vec3::from(mesh.vertices[i as usize].position))
                .collect();
            let normal = (p[1] - p[0]).cross(p[2] - p[0]);
            let centroid = (p[0] + p[1] + p[2]) / 3.0;
            assert!(normal.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn ring_spans_inner_to_outer_radius() {
        let mesh = ring(9.98, 10.02, 128);
        for vertex in &mesh.vertices {
            let r = Vec3::from(vertex.position).length();
            assert!(r > 9.97 && r < 10.03);
        }
        assert_eq!(mesh.indices.len(), 128 * 6);
    }

    #[test]
    fn cuboid_faces_point_away_from_center() {
        let mesh = cuboid(2.0, 4.0, 6.0);
        assert_eq!(mesh.vertices.len(), 24);
        for tri in mesh.indices.chunks_exact(3) {
            let p: Vec<Vec3> = tri
                .iter()
                .map(|&i| Vec3::from(mesh.vertices[i as usize].position))
                .collect();
            let normal = (p[1] - p[0]).cross(p[2] - p[0]);
            let centroid = (p[0] + p[1] + p[2]) / 3.0;
            assert!(normal.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn gable_triangles_face_outward() {
        let mesh = gable(8.0, 2.5, 6.0);
        let center = Vec3::new(0.0, 0.8, 0.0);
        for tri in mesh.indices.chunks_exact(3) {
            let p: Vec<Vec3> = tri
                .iter()
                .map(|&i| Vec3::from(mesh.vertices[i as usize].position))
                .collect();
            let normal = (p[1] - p[0]).cross(p[2] - p[0]);
            let centroid = (p[0] + p[1] + p[2]) / 3.0;
            assert!(normal.dot(centroid - center) > 0.0);
        }
    }

    #[test]
    fn point_sprites_can_move() {
        let sprite = PointSprite {
            position: Vec3::ZERO,
            color: [1.0; 4],
            size: 2.0,
        };
        let mut mesh = points(&[sprite; 3]);
        assert!(mesh.is_sprites());
        assert!(!plane(1.0, 1.0).is_sprites());
        assert_eq!(mesh.point_count(), 3);
        mesh.set_point_position(1, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(mesh.point_position(1), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(mesh.point_position(0), Some(Vec3::ZERO));
        mesh.set_point_position(9, Vec3::ONE);
        assert_eq!(mesh.point_position(9), None);
    }

    #[test]
    fn shift_moves_sprites_back_one_slot() {
        let sprites: Vec<PointSprite> = (0..3)
            .map(|i| PointSprite {
                position: Vec3::splat(i as f32),
                color: [1.0; 4],
                size: i as f32,
            })
            .collect();
        let mut mesh = points(&sprites);
        mesh.shift_points();
        assert_eq!(mesh.point_position(0), Some(Vec3::ZERO));
        assert_eq!(mesh.point_position(1), Some(Vec3::ZERO));
        assert_eq!(mesh.point_position(2), Some(Vec3::ONE));
        assert_eq!(mesh.point_size(2), Some(1.0));
        // Corner uvs travel with their quads.
        assert_eq!(mesh.vertices[8].uv, [0.0, 1.0]);
    }

    #[test]
    fn store_bumps_revision_on_mutation() {
        let mut store = MeshStore::default();
        let id = store.insert(plane(1.0, 1.0));
        assert_eq!(store.get(id).unwrap().revision(), 0);
        store.get_mut(id).unwrap();
        assert_eq!(store.get(id).unwrap().revision(), 1);
    }
}
