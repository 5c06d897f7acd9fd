//! Orbit trails.
//!
//! A trail is the label's orbit drawn as a closed polyline with a fixed number
//! of segments. The geometry is built once; every frame only the per-segment
//! opacity changes, depending on how far each segment is from the label.
//!
//! # Modes
//!
//! | Mode | Look |
//! |------|------|
//! | [`TrailMode::Full`] | Whole orbit at low opacity, dashed |
//! | [`TrailMode::Partial`] | Bright fading arc behind the label, dim dashed arc ahead |
//!
//! In partial mode the arcs grow with the label's angular speed, so fast
//! labels leave longer trails. All angle differences go through
//! [`wrap_angle`] first.

use std::f32::consts::{PI, TAU};

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::orbit::OrbitingLabel;

/// How trails are drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrailMode {
    /// The whole orbit, faint and dashed.
    Full,
    /// Only the recent past and near future of the label.
    #[default]
    Partial,
}

impl TrailMode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            TrailMode::Full => TrailMode::Partial,
            TrailMode::Partial => TrailMode::Full,
        }
    }
}

/// Trail appearance parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct TrailConfig {
    /// Number of segments around the orbit. Fixed for the lifetime of a trail.
    pub segments: usize,
    /// Opacity of lit segments in full mode.
    pub full_opacity: f32,
    /// Peak opacity of the past arc (at the label).
    pub past_opacity: f32,
    /// Peak opacity of the future arc.
    pub future_opacity: f32,
    /// Past arc length at zero speed, in radians.
    pub base_arc: f32,
    /// Ratio of future arc length to past arc length.
    pub future_ratio: f32,
    /// Dash period in segments.
    pub dash_period: usize,
    /// Lit segments per dash period.
    pub dash_on: usize,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            segments: 128,
            full_opacity: 0.15,
            past_opacity: 0.8,
            future_opacity: 0.3,
            base_arc: PI / 4.0,
            future_ratio: 0.5,
            dash_period: 8,
            dash_on: 5,
        }
    }
}

impl TrailConfig {
    /// Whether segment `index` is lit in the dash pattern.
    pub fn dash_lit(&self, index: usize) -> bool {
        self.dash_period == 0 || index % self.dash_period < self.dash_on
    }

    /// Lengths of the past and future arcs for a given angular speed.
    pub fn arcs(&self, angular_speed: f32) -> (f32, f32) {
        let past = (self.base_arc * (1.0 + angular_speed.abs())).min(PI);
        (past, past * self.future_ratio)
    }

    /// Opacity of segment `index` whose angular distance from the label is
    /// `delta` (positive = ahead in the direction of travel).
    pub fn opacity_at(&self, mode: TrailMode, index: usize, delta: f32, angular_speed: f32) -> f32 {
        match mode {
            TrailMode::Full => {
                if self.dash_lit(index) {
                    self.full_opacity
                } else {
                    0.0
                }
            }
            TrailMode::Partial => {
                let (past_arc, future_arc) = self.arcs(angular_speed);
                if delta <= 0.0 && -delta < past_arc {
                    self.past_opacity * ease(-delta / past_arc)
                } else if delta > 0.0 && delta < future_arc && self.dash_lit(index) {
                    self.future_opacity * ease(delta / future_arc)
                } else {
                    0.0
                }
            }
        }
    }
}

/// Wrap an angle difference into `(-PI, PI]`.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Cosine falloff from 1 at `t = 0` to 0 at `t = 1`.
fn ease(t: f32) -> f32 {
    0.5 * (1.0 + (PI * t.clamp(0.0, 1.0)).cos())
}

/// Trail geometry and per-segment opacity of one label.
#[derive(Clone, Debug)]
pub struct Trail {
    config: TrailConfig,
    /// `segments + 1` points, closed.
    points: Vec<Vec3>,
    opacities: Vec<f32>,
    visible: bool,
}

impl Trail {
    /// Create a trail with the configured segment count and an empty path.
    pub fn new(config: &TrailConfig) -> Self {
        let segments = config.segments.max(3);
        Self {
            config: TrailConfig {
                segments,
                ..config.clone()
            },
            points: Vec::with_capacity(segments + 1),
            opacities: vec![0.0; segments],
            visible: true,
        }
    }

    /// Create a trail and build its path along `label`'s orbit.
    pub fn for_label(config: &TrailConfig, label: &OrbitingLabel) -> Self {
        let mut trail = Self::new(config);
        trail.rebuild_path(label);
        trail
    }

    /// Number of segments.
    pub fn segments(&self) -> usize {
        self.config.segments
    }

    /// Angle at which segment `index` starts.
    pub fn segment_angle(&self, index: usize) -> f32 {
        index as f32 / self.config.segments as f32 * TAU
    }

    /// Sample the orbit of `label` into the path.
    pub fn rebuild_path(&mut self, label: &OrbitingLabel) {
        self.points.clear();
        for i in 0..=self.config.segments {
            self.points.push(label.orbit_point(self.segment_angle(i)));
        }
    }

    /// Recompute per-segment opacity for a label at `angle`.
    pub fn update(&mut self, mode: TrailMode, angle: f32, angular_speed: f32) {
        let direction = if angular_speed < 0.0 { -1.0 } else { 1.0 };
        for i in 0..self.config.segments {
            let delta = wrap_angle(self.segment_angle(i) - angle) * direction;
            self.opacities[i] = self.config.opacity_at(mode, i, delta, angular_speed);
        }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn opacities(&self) -> &[f32] {
        &self.opacities
    }

    /// Per-segment RGBA in the label's color.
    pub fn colors(&self, color: Rgb) -> Vec<Vec4> {
        self.opacities.iter().map(|&o| color.with_alpha(o)).collect()
    }

    /// Write per-segment RGBA into `out`, reusing its allocation.
    pub fn write_colors(&self, color: Rgb, out: &mut Vec<Vec4>) {
        out.clear();
        out.extend(self.opacities.iter().map(|&o| color.with_alpha(o)));
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbit::OrbitConfig;

    #[test]
    fn test_wrap_angle_range() {
        let samples = [-20.0, -TAU, -PI - 0.001, -PI, -1.0, 0.0, 1.0, PI, PI + 0.001, TAU, 37.5];
        for &a in &samples {
            for &b in &samples {
                let d = wrap_angle(a - b);
                assert!(d > -PI && d <= PI, "wrap_angle({} - {}) = {}", a, b, d);
            }
        }
    }

    #[test]
    fn test_wrap_angle_values() {
        assert_eq!(wrap_angle(0.0), 0.0);
        assert_eq!(wrap_angle(-PI), PI);
        assert_eq!(wrap_angle(PI), PI);
        assert!((wrap_angle(TAU + 0.5) - 0.5).abs() < 1e-5);
        assert!((wrap_angle(-0.5) + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_segment_count_is_fixed() {
        let config = TrailConfig::default();
        let l = OrbitingLabel::new("a", Rgb::WHITE, 1, 0.0, 0.5, &OrbitConfig::default());
        let mut trail = Trail::for_label(&config, &l);

        assert_eq!(trail.points().len(), 129);
        assert_eq!(trail.opacities().len(), 128);

        trail.update(TrailMode::Full, 1.0, 0.5);
        trail.rebuild_path(&l);
        assert_eq!(trail.points().len(), 129);
        assert_eq!(trail.opacities().len(), 128);
        assert_eq!(trail.points()[0], trail.points()[128]);
    }

    #[test]
    fn test_partial_peak_at_label() {
        let mut trail = Trail::new(&TrailConfig::default());
        let angle = trail.segment_angle(40);
        trail.update(TrailMode::Partial, angle, 0.5);

        let peak = trail.opacities()[40];
        assert_eq!(peak, TrailConfig::default().past_opacity);
        assert!(trail.opacities().iter().all(|&o| o <= peak));
    }

    #[test]
    fn test_partial_past_brighter_than_future() {
        let mut trail = Trail::new(&TrailConfig::default());
        let angle = trail.segment_angle(64);
        trail.update(TrailMode::Partial, angle, 0.5);

        // Segment 63 is behind, 65 is ahead (and lit in the dash pattern)
        let behind = trail.opacities()[63];
        let ahead = trail.opacities()[65];
        assert!(behind > ahead);
        assert!(ahead > 0.0);

        // The far side of the orbit is dark
        assert_eq!(trail.opacities()[0], 0.0);
    }

    #[test]
    fn test_partial_direction_follows_speed() {
        let mut trail = Trail::new(&TrailConfig::default());
        let angle = trail.segment_angle(64);
        trail.update(TrailMode::Partial, angle, -0.5);

        // Moving backwards: segment 65 is now behind the label
        assert!(trail.opacities()[65] > trail.opacities()[63]);
    }

    #[test]
    fn test_arc_grows_with_speed() {
        let config = TrailConfig::default();
        let (slow_past, slow_future) = config.arcs(0.2);
        let (fast_past, fast_future) = config.arcs(0.8);
        assert!(fast_past > slow_past);
        assert!(fast_future > slow_future);
        assert!((slow_future - slow_past * 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_full_mode_dashes() {
        let config = TrailConfig::default();
        let mut trail = Trail::new(&config);
        trail.update(TrailMode::Full, 0.0, 0.5);

        for (i, &o) in trail.opacities().iter().enumerate() {
            if config.dash_lit(i) {
                assert_eq!(o, config.full_opacity);
            } else {
                assert_eq!(o, 0.0);
            }
        }
    }

    #[test]
    fn test_colors_carry_opacity() {
        let mut trail = Trail::new(&TrailConfig::default());
        trail.update(TrailMode::Partial, 0.0, 0.5);
        let colors = trail.colors(Rgb(0xff0000));
        assert_eq!(colors.len(), 128);
        assert_eq!(colors[0], Vec4::new(1.0, 0.0, 0.0, 0.8));
    }

    #[test]
    fn test_toggle_mode() {
        assert_eq!(TrailMode::Full.toggled(), TrailMode::Partial);
        assert_eq!(TrailMode::default().toggled(), TrailMode::Full);
    }
}
