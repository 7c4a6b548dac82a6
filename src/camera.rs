//! Perspective camera that orbits a center point.

use std::f32::consts::PI;

use glam::{Mat4, Vec2, Vec3};

use crate::config::CameraConfig;
use crate::picking::Ray;

const MIN_POLAR: f32 = 0.1;

/// Where the camera sits and what it looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
}

/// Orbit center and allowed distance from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitLimits {
    pub center: Vec3,
    pub min_distance: f32,
    pub max_distance: f32,
}

#[derive(Debug, Clone)]
pub struct OrbitCamera {
    position: Vec3,
    target: Vec3,
    home: CameraPose,
    limits: OrbitLimits,
    following: bool,
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
    drag_sensitivity: f32,
    zoom_sensitivity: f32,
}

impl OrbitCamera {
    pub fn new(settings: &CameraConfig, home: CameraPose, limits: OrbitLimits) -> Self {
        Self {
            position: home.position,
            target: home.target,
            home,
            limits,
            following: false,
            fov_y: settings.fov.to_radians(),
            aspect: 16.0 / 9.0,
            near: settings.near,
            far: settings.far,
            drag_sensitivity: settings.drag_sensitivity,
            zoom_sensitivity: settings.zoom_sensitivity,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn is_following(&self) -> bool {
        self.following
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// Rotates around the orbit center on a sphere, keeping the distance.
    /// The polar angle stays clear of the poles.
    pub fn drag(&mut self, delta: Vec2) {
        let offset = self.position - self.limits.center;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return;
        }
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();
        theta -= delta.x * self.drag_sensitivity;
        phi += delta.y * self.drag_sensitivity;
        phi = phi.clamp(MIN_POLAR, PI - MIN_POLAR);
        self.position = self.limits.center
            + Vec3::new(
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
                radius * phi.sin() * theta.cos(),
            );
        if !self.following {
            self.target = self.limits.center;
        }
    }

    /// Moves along the view direction so the distance to the center becomes
    /// the current distance plus `delta_y` scaled, within the limits.
    pub fn zoom(&mut self, delta_y: f32) {
        let distance = self.position.distance(self.limits.center);
        let distance = (distance + delta_y * self.zoom_sensitivity)
            .clamp(self.limits.min_distance, self.limits.max_distance);
        let forward = self.forward();
        if forward == Vec3::ZERO {
            return;
        }
        self.position = self.limits.center - forward * distance;
        if !self.following {
            self.target = self.limits.center;
        }
    }

    /// Keeps looking at `target` until cleared with `None` or [`reset`].
    ///
    /// [`reset`]: Self::reset
    pub fn follow(&mut self, target: Option<Vec3>) {
        match target {
            Some(target) => {
                self.following = true;
                self.target = target;
            }
            None => {
                self.following = false;
                self.target = self.limits.center;
            }
        }
    }

    pub fn reset(&mut self) {
        self.following = false;
        self.position = self.home.position;
        self.target = self.home.target;
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// World-space ray through a point in normalized device coordinates.
    pub fn ray(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_proj().inverse();
        let near = inverse.project_point3(ndc.extend(0.0));
        let far = inverse.project_point3(ndc.extend(1.0));
        Ray::new(self.position, far - near)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solar_camera() -> OrbitCamera {
        OrbitCamera::new(
            &CameraConfig::default(),
            CameraPose {
                position: Vec3::new(0.0, 20.0, 40.0),
                target: Vec3::ZERO,
            },
            OrbitLimits {
                center: Vec3::ZERO,
                min_distance: 10.0,
                max_distance: 100.0,
            },
        )
    }

    #[test]
    fn drag_keeps_distance_and_clamps_polar_angle() {
        let mut camera = solar_camera();
        let distance = camera.position().length();
        camera.drag(Vec2::new(120.0, 0.0));
        assert!((camera.position().length() - distance).abs() < 1e-3);

        camera.drag(Vec2::new(0.0, -10_000.0));
        let phi = (camera.position().y / camera.position().length()).acos();
        assert!((phi - MIN_POLAR).abs() < 1e-4);
        assert_eq!(camera.target(), Vec3::ZERO);
    }

    #[test]
    fn horizontal_drag_rotates_about_y() {
        let mut camera = solar_camera();
        camera.drag(Vec2::new(157.079_63, 0.0));
        // theta went from 0 to -pi/2: the camera swings to -X.
        assert!((camera.position().x + 40.0).abs() < 1e-2);
        assert!(camera.position().z.abs() < 1e-2);
        assert!((camera.position().y - 20.0).abs() < 1e-3);
    }

    #[test]
    fn zoom_clamps_to_limits() {
        let mut camera = solar_camera();
        camera.zoom(-100_000.0);
        assert!((camera.position().length() - 10.0).abs() < 1e-3);
        camera.zoom(100_000.0);
        assert!((camera.position().length() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn zoom_moves_along_view_direction() {
        let mut camera = solar_camera();
        let before = camera.position().normalize();
        camera.zoom(500.0);
        let expected = 44.721_36 + 5.0;
        assert!((camera.position().length() - expected).abs() < 1e-3);
        assert!(camera.position().normalize().dot(before) > 0.9999);
    }

    #[test]
    fn follow_survives_drag_and_reset_clears_it() {
        let mut camera = solar_camera();
        let earth = Vec3::new(10.0, 0.0, 0.0);
        camera.follow(Some(earth));
        camera.drag(Vec2::new(10.0, 5.0));
        assert_eq!(camera.target(), earth);
        camera.reset();
        assert!(!camera.is_following());
        assert_eq!(camera.position(), Vec3::new(0.0, 20.0, 40.0));
        assert_eq!(camera.target(), Vec3::ZERO);
    }

    #[test]
    fn center_ray_points_forward() {
        let mut camera = solar_camera();
        camera.resize(800, 600);
        let ray = camera.ray(Vec2::ZERO);
        assert!(ray.direction.dot(camera.forward()) > 0.9999);
        assert_eq!(ray.origin, camera.position());
    }
}
