//! Pointer to world-ray conversion and ray casting against node bounds.

use glam::{Mat4, Vec2, Vec3};

use crate::camera::OrbitCamera;
use crate::geometry::Bounds;
use crate::scene::{NodeKey, SceneGraph};

/// Pointer travel, in pixels, below which a press/release pair is a click.
pub const CLICK_SLOP: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Nearest non-negative hit distance against a sphere at the origin.
    pub fn hit_sphere(&self, radius: f32) -> Option<f32> {
        let a = self.direction.length_squared();
        if a <= f32::EPSILON {
            return None;
        }
        let b = self.origin.dot(self.direction);
        let c = self.origin.length_squared() - radius * radius;
        let discriminant = b * b - a * c;
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        let near = (-b - root) / a;
        let far = (-b + root) / a;
        if near >= 0.0 {
            Some(near)
        } else if far >= 0.0 {
            Some(far)
        } else {
            None
        }
    }

    /// Slab test against an axis-aligned box centered at the origin.
    pub fn hit_box(&self, half_extents: Vec3) -> Option<f32> {
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;
        for axis in 0..3 {
            let origin = self.origin[axis];
            let direction = self.direction[axis];
            let half = half_extents[axis];
            if direction.abs() <= f32::EPSILON {
                if origin < -half || origin > half {
                    return None;
                }
                continue;
            }
            let t1 = (-half - origin) / direction;
            let t2 = (half - origin) / direction;
            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
            if t_min > t_max {
                return None;
            }
        }
        if t_max < 0.0 {
            None
        } else {
            Some(t_min.max(0.0))
        }
    }

    pub fn transformed(&self, matrix: Mat4) -> Self {
        Self {
            origin: matrix.transform_point3(self.origin),
            direction: matrix.transform_vector3(self.direction),
        }
    }
}

/// Window pixel coordinates to normalized device coordinates, y up.
pub fn ndc(pointer: Vec2, viewport: Vec2) -> Vec2 {
    let width = viewport.x.max(1.0);
    let height = viewport.y.max(1.0);
    Vec2::new(pointer.x / width * 2.0 - 1.0, -(pointer.y / height * 2.0 - 1.0))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub key: NodeKey,
    pub distance: f32,
    pub point: Vec3,
}

/// Casts `ray` against every visible node that blocks the pointer and
/// returns the nearest hit when that node is pickable. A wall in front of a
/// door hides the door.
pub fn cast(graph: &SceneGraph, ray: &Ray) -> Option<Hit> {
    let mut best: Option<Hit> = None;
    for (key, world, bounds) in graph.visible_bounds() {
        let inverse = world.inverse();
        let local = ray.transformed(inverse);
        let t = match bounds {
            Bounds::Sphere { radius } => local.hit_sphere(radius),
            Bounds::Box { half_extents } => local.hit_box(half_extents),
            Bounds::None => None,
        };
        let Some(t) = t else {
            continue;
        };
        // `local.direction` is not normalized, so `t` is shared by both spaces.
        let point = world.transform_point3(local.at(t));
        let distance = point.distance(ray.origin);
        if best.map_or(true, |hit| distance < hit.distance) {
            best = Some(Hit {
                key,
                distance,
                point,
            });
        }
    }
    best.filter(|hit| graph.pick_info(hit.key).is_some())
}

/// Picks through the camera at a window pixel.
pub fn pick(graph: &SceneGraph, camera: &OrbitCamera, pointer: Vec2, viewport: Vec2) -> Option<Hit> {
    cast(graph, &camera.ray(ndc(pointer, viewport)))
}
