//! Orbit camera with damping, projection and pointer rays.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};
use serde::{Deserialize, Serialize};

/// Keeps the camera off the poles, where the view basis degenerates.
const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;

/// Rotation velocity below which damping stops.
const REST_VELOCITY: f32 = 1e-5;

/// A half-line in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Point at parameter `t` along the ray.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Point on the ray closest to `point`.
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let t = (point - self.origin).dot(self.direction).max(0.0);
        self.at(t)
    }

    /// Distance from `point` to the ray.
    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.closest_point(point).distance(point)
    }

    /// Intersection with the plane through `point` with `normal`.
    ///
    /// `None` when the ray is parallel to the plane or points away from it.
    pub fn intersect_plane(&self, point: Vec3, normal: Vec3) -> Option<Vec3> {
        let denom = normal.dot(self.direction);
        if denom.abs() < 1e-6 {
            return None;
        }
        let t = (point - self.origin).dot(normal) / denom;
        if t < 0.0 {
            return None;
        }
        Some(self.at(t))
    }
}

/// Serializable camera pose.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraSnapshot {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub target: Vec3,
}

impl Default for CameraSnapshot {
    fn default() -> Self {
        Camera::new().snapshot()
    }
}

/// Orbit camera around a target point.
#[derive(Clone, Debug)]
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    /// Fraction of the pending rotation applied (and removed) per update.
    pub damping: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    yaw_velocity: f32,
    pitch_velocity: f32,
}

impl Camera {
    /// Camera at (0, 100, 800) looking at the origin.
    pub fn new() -> Self {
        let start = Vec3::new(0.0, 100.0, 800.0);
        Self {
            yaw: 0.0,
            pitch: start.y.atan2(start.z),
            distance: start.length(),
            target: Vec3::ZERO,
            fov_y: 60f32.to_radians(),
            near: 1.0,
            far: 5000.0,
            damping: 0.05,
            min_distance: 100.0,
            max_distance: 1500.0,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect.max(1e-3), self.near, self.far)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view_matrix()
    }

    /// Project a world point to NDC. The returned `z` is the view depth.
    ///
    /// `None` for points behind the camera.
    pub fn project(&self, point: Vec3, aspect: f32) -> Option<Vec3> {
        let clip = self.view_projection(aspect) * point.extend(1.0);
        if clip.w <= self.near * 0.5 {
            return None;
        }
        let ndc = clip.xy() / clip.w;
        Some(ndc.extend(clip.w))
    }

    /// Ray from the camera through an NDC point.
    pub fn ray(&self, ndc: Vec2, aspect: f32) -> Ray {
        let inverse = self.view_projection(aspect).inverse();
        let near = inverse.project_point3(ndc.extend(0.0));
        let far = inverse.project_point3(ndc.extend(1.0));
        Ray::new(near, far - near)
    }

    /// Queue a rotation, applied gradually by [`update`](Self::update).
    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw_velocity += delta_yaw;
        self.pitch_velocity += delta_pitch;
    }

    /// Scale the distance by `factor`, within the distance limits.
    pub fn zoom(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.distance = (self.distance * factor).clamp(self.min_distance, self.max_distance);
        }
    }

    /// Apply a damped share of the pending rotation.
    pub fn update(&mut self) {
        let k = self.damping.clamp(0.0, 1.0);
        let (k, keep) = if k == 0.0 { (1.0, 0.0) } else { (k, 1.0 - k) };

        self.yaw += self.yaw_velocity * k;
        self.pitch = (self.pitch + self.pitch_velocity * k).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.yaw_velocity *= keep;
        self.pitch_velocity *= keep;

        if self.yaw_velocity.abs() < REST_VELOCITY {
            self.yaw_velocity = 0.0;
        }
        if self.pitch_velocity.abs() < REST_VELOCITY {
            self.pitch_velocity = 0.0;
        }
    }

    /// Whether a queued rotation is still being applied.
    pub fn is_moving(&self) -> bool {
        self.yaw_velocity != 0.0 || self.pitch_velocity != 0.0
    }

    pub fn snapshot(&self) -> CameraSnapshot {
        CameraSnapshot {
            yaw: self.yaw,
            pitch: self.pitch,
            distance: self.distance,
            target: self.target,
        }
    }

    /// Restore a pose, clamping it into the camera limits.
    pub fn restore(&mut self, snapshot: &CameraSnapshot) {
        let fallback = Camera::new();
        self.yaw = if snapshot.yaw.is_finite() { snapshot.yaw } else { fallback.yaw };
        self.pitch = if snapshot.pitch.is_finite() {
            snapshot.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT)
        } else {
            fallback.pitch
        };
        self.distance = if snapshot.distance.is_finite() {
            snapshot.distance.clamp(self.min_distance, self.max_distance)
        } else {
            fallback.distance
        };
        self.target = if snapshot.target.is_finite() { snapshot.target } else { fallback.target };
        self.yaw_velocity = 0.0;
        self.pitch_velocity = 0.0;
    }

    /// Back to the starting pose.
    pub fn reset(&mut self) {
        self.restore(&Camera::new().snapshot());
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
