//! Orbit and attraction motion model for text labels.
//!
//! Every label is in exactly one [`Motion`] mode per frame:
//!
//! | Mode | Position update |
//! |------|-----------------|
//! | [`Motion::Orbiting`] | Advance the angle, compute the tilted orbit point, ease toward it |
//! | [`Motion::Attracted`] | Pull toward the pointer target, plus a weighted orbital drift |
//!
//! # Orbit geometry
//!
//! For a label on level `n` with radius `r`, tilt `t` and angle `a`:
//!
//! ```text
//! base   = (cos(a) * r, 0, sin(a) * r)
//! target = center + rotate_x(t) * base + (0, 0, n * z_offset)
//! ```
//!
//! The per-level z offset keeps concentric orbits from z-fighting. The label
//! does not jump to `target`; it interpolates toward it with a factor of
//! `min(0.1, angular_speed * 0.05)`.
//!
//! # Attraction
//!
//! While attracted the orbit angle is frozen. Each frame the label moves
//! `strength * distance` toward the target and picks up 30% of the step it
//! would have taken along its orbit, so it keeps some orbital momentum while
//! dragged. Within one unit of the target nothing moves.

use std::f32::consts::{PI, TAU};

use glam::{Mat3, Quat, Vec3};

use crate::color::Rgb;
use crate::error::MotionError;

/// Upper bound on any interpolation factor toward the orbit.
pub const MAX_SMOOTHING: f32 = 0.1;

/// Orbit-easing factor per unit of angular speed.
pub const SMOOTHING_PER_SPEED: f32 = 0.05;

/// Distance below which an attracted label stops moving.
pub const ATTRACTION_DEADZONE: f32 = 1.0;

/// Weight of the orbital drift blended into attraction.
pub const DRIFT_WEIGHT: f32 = 0.3;

/// Forward tilt applied after facing the orbit center.
pub const READING_PITCH: f32 = 0.1 * PI;

/// Orbit layout and motion parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitConfig {
    /// Radius of the innermost orbit.
    pub base_radius: f32,
    /// Radius added per level.
    pub radius_increment: f32,
    /// Slowest rotation speed handed to a new label.
    pub min_speed: f32,
    /// Fastest rotation speed handed to a new label.
    pub max_speed: f32,
    /// Orbit plane rotation about X, in radians.
    pub tilt: f32,
    /// Z offset per level.
    pub z_offset: f32,
    /// Radians per reference frame per unit of rotation speed.
    pub tick: f32,
    /// Common center of all orbits.
    pub center: Vec3,
    /// Glyph height of label meshes.
    pub text_size: f32,
    /// Extrusion depth of label meshes.
    pub text_depth: f32,
    /// Fraction of the remaining distance covered per frame while attracted.
    pub attraction_strength: f32,
    /// Interpolation factor used to return to the orbit after a release.
    pub return_speed: f32,
    /// Half-extent of the scene cube. Attraction targets are clamped into it.
    pub bounds: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            base_radius: 100.0,
            radius_increment: 100.0,
            min_speed: 0.2,
            max_speed: 0.8,
            tilt: 0.15,
            z_offset: 1.0,
            tick: 0.01,
            center: Vec3::ZERO,
            text_size: 30.0,
            text_depth: 5.0,
            attraction_strength: 0.1,
            return_speed: 0.05,
            bounds: 1000.0,
        }
    }
}

impl OrbitConfig {
    /// Orbit radius of a level.
    pub fn radius_for_level(&self, level: usize) -> f32 {
        self.base_radius + level as f32 * self.radius_increment
    }
}

/// Pointer attraction acting on a label.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attraction {
    /// Point the label is pulled toward.
    pub target: Vec3,
    /// Fraction of the remaining distance covered per frame (0..=1).
    pub strength: f32,
    /// Interpolation factor used to return to the orbit once released.
    pub return_speed: f32,
}

/// The motion mode of a label.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Motion {
    /// Steady angular motion along the tilted orbit.
    Orbiting,
    /// Pulled toward a pointer target.
    Attracted(Attraction),
}

/// A text label moving on its orbit.
#[derive(Clone, Debug)]
pub struct OrbitingLabel {
    text: String,
    color: Rgb,
    radius: f32,
    /// Current orbit angle in radians, kept in `0..TAU`.
    angle: f32,
    angular_speed: f32,
    tilt: f32,
    level: usize,
    z_offset: f32,
    center: Vec3,
    visible: bool,
    position: Vec3,
    orientation: Quat,
    motion: Motion,
    /// Return speed left over from the last attraction, until back on orbit.
    recovery: Option<f32>,
}

impl OrbitingLabel {
    /// Create a label on `level` starting at `angle` with the given rotation speed.
    ///
    /// The label is placed on its orbit immediately.
    pub fn new(
        text: impl Into<String>,
        color: Rgb,
        level: usize,
        angle: f32,
        angular_speed: f32,
        config: &OrbitConfig,
    ) -> Self {
        let mut label = Self {
            text: text.into(),
            color,
            radius: config.radius_for_level(level),
            angle: angle.rem_euclid(TAU),
            angular_speed,
            tilt: config.tilt,
            level,
            z_offset: level as f32 * config.z_offset,
            center: config.center,
            visible: true,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            motion: Motion::Orbiting,
            recovery: None,
        };
        label.snap_to_orbit();
        label
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn angular_speed(&self) -> f32 {
        self.angular_speed
    }

    pub fn tilt(&self) -> f32 {
        self.tilt
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn motion(&self) -> &Motion {
        &self.motion
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_attracted(&self) -> bool {
        matches!(self.motion, Motion::Attracted(_))
    }

    /// Whether the label is still easing back after an attraction.
    pub fn is_recovering(&self) -> bool {
        self.recovery.is_some()
    }

    /// Point on this label's orbit at `angle`.
    pub fn orbit_point(&self, angle: f32) -> Vec3 {
        let base = Vec3::new(angle.cos() * self.radius, 0.0, angle.sin() * self.radius);
        self.center + Quat::from_rotation_x(self.tilt) * base + Vec3::Z * self.z_offset
    }

    /// Point on the orbit at the current angle.
    pub fn orbit_target(&self) -> Vec3 {
        self.orbit_point(self.angle)
    }

    /// Interpolation factor used while orbiting.
    pub fn smoothing_factor(&self) -> f32 {
        (self.angular_speed.abs() * SMOOTHING_PER_SPEED).min(MAX_SMOOTHING)
    }

    /// Start (or retarget) an attraction toward `target`.
    ///
    /// A label has at most one target; a new call overwrites the previous one.
    pub fn attract(&mut self, target: Vec3, strength: f32, return_speed: f32) {
        self.motion = Motion::Attracted(Attraction {
            target,
            strength: strength.clamp(0.0, 1.0),
            return_speed,
        });
        self.recovery = None;
    }

    /// Move the current attraction target. No-op while orbiting.
    pub fn set_target(&mut self, target: Vec3) {
        if let Motion::Attracted(attraction) = &mut self.motion {
            attraction.target = target;
        }
    }

    /// End the attraction and ease back onto the orbit.
    ///
    /// Returns `false` if the label was not attracted.
    pub fn release(&mut self) -> bool {
        match self.motion {
            Motion::Attracted(attraction) => {
                self.motion = Motion::Orbiting;
                self.recovery = Some(attraction.return_speed);
                true
            }
            Motion::Orbiting => false,
        }
    }

    /// Drop any attraction and put the label exactly on its orbit.
    pub fn snap_to_orbit(&mut self) {
        if !self.angle.is_finite() {
            self.angle = 0.0;
        }
        self.motion = Motion::Orbiting;
        self.recovery = None;
        self.position = self.orbit_target();
        self.orientation = facing(self.position, self.center, READING_PITCH);
    }

    /// Advance the label by one frame.
    ///
    /// `dt_scale` is the angle advance per unit of angular speed for this
    /// frame (reference frames × speed multiplier × tick).
    pub fn update(&mut self, dt_scale: f32) -> Result<(), MotionError> {
        match self.motion {
            Motion::Orbiting => self.step_orbit(dt_scale),
            Motion::Attracted(attraction) => self.step_attraction(attraction, dt_scale),
        }

        self.orientation = facing(self.position, self.center, READING_PITCH);

        if !self.position.is_finite() || !self.orientation.is_finite() {
            return Err(MotionError::NonFinite {
                label: self.text.clone(),
            });
        }
        Ok(())
    }

    fn step_orbit(&mut self, dt_scale: f32) {
        self.angle = (self.angle + self.angular_speed * dt_scale).rem_euclid(TAU);
        let target = self.orbit_target();

        self.position = self.position.lerp(target, self.lerp_factor());

        if self.recovery.is_some() {
            // Back on orbit once no further than the lag the normal factor settles at
            let k = self.smoothing_factor();
            let step = (self.angular_speed * dt_scale).abs() * self.radius;
            let settled = if k > 0.0 { step * (1.0 - k) / k } else { 0.0 };
            if self.position.distance(target) <= settled + ATTRACTION_DEADZONE {
                self.recovery = None;
            }
        }
    }

    /// Interpolation toward the orbit target. Recovery never eases slower
    /// than normal orbiting and never faster than [`MAX_SMOOTHING`].
    fn lerp_factor(&self) -> f32 {
        match self.recovery {
            Some(return_speed) => return_speed.max(self.smoothing_factor()).min(MAX_SMOOTHING),
            None => self.smoothing_factor(),
        }
    }

    fn step_attraction(&mut self, attraction: Attraction, dt_scale: f32) {
        let to_target = attraction.target - self.position;
        let distance = to_target.length();
        if distance <= ATTRACTION_DEADZONE {
            return;
        }

        let direction = to_target / distance;
        // One orbit step ahead, not committed to the angle
        let step = self.angular_speed * dt_scale;
        let drift = self.orbit_point(self.angle + step) - self.orbit_point(self.angle);

        self.position += direction * attraction.strength * distance + drift * DRIFT_WEIGHT;
    }
}

/// Orientation that points local +Z from `position` toward `center`, then
/// pitches forward by `pitch` around the local X axis.
pub fn facing(position: Vec3, center: Vec3, pitch: f32) -> Quat {
    let tilt = Quat::from_rotation_x(pitch);
    let forward = (center - position).normalize_or_zero();
    if forward == Vec3::ZERO {
        return tilt;
    }
    let right = Vec3::Y.cross(forward).normalize_or_zero();
    if right == Vec3::ZERO {
        return tilt;
    }
    let up = forward.cross(right);
    Quat::from_mat3(&Mat3::from_cols(right, up, forward)) * tilt
}
