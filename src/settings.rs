//! Persisted viewer state.
//!
//! Settings are stored as pretty-printed JSON. Every field has a serde
//! default, so files written by older versions (or edited by hand) still load.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::camera::CameraSnapshot;
use crate::error::SettingsError;
use crate::trail::TrailMode;

/// Default number of orbits drawn.
pub const DEFAULT_VISIBLE_ORBITS: usize = 13;

/// Seconds between periodic saves.
pub const AUTOSAVE_INTERVAL: f32 = 5.0;

/// Range of the global speed multiplier.
pub const SPEED_RANGE: std::ops::RangeInclusive<f32> = 0.0..=5.0;

fn default_true() -> bool {
    true
}

fn default_visible_orbits() -> usize {
    DEFAULT_VISIBLE_ORBITS
}

fn default_speed() -> f32 {
    1.0
}

/// UI state restored on startup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Whether labels advance along their orbits.
    #[serde(default = "default_true")]
    pub orbit_enabled: bool,
    #[serde(default)]
    pub trail_mode: TrailMode,
    #[serde(default = "default_true")]
    pub trails_visible: bool,
    /// Labels on levels at or beyond this count are hidden.
    #[serde(default = "default_visible_orbits")]
    pub visible_orbits: usize,
    /// Global speed multiplier.
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default)]
    pub camera: CameraSnapshot,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            orbit_enabled: true,
            trail_mode: TrailMode::default(),
            trails_visible: true,
            visible_orbits: DEFAULT_VISIBLE_ORBITS,
            speed: 1.0,
            camera: CameraSnapshot::default(),
        }
    }
}

impl Settings {
    /// Clamp out-of-range values loaded from disk.
    pub fn sanitized(mut self) -> Self {
        self.speed = if self.speed.is_finite() {
            self.speed.clamp(*SPEED_RANGE.start(), *SPEED_RANGE.end())
        } else {
            1.0
        };
        self
    }

    /// Multiplier applied to the per-frame tick.
    pub fn effective_speed(&self) -> f32 {
        if self.orbit_enabled {
            self.speed
        } else {
            0.0
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&json)?;
        Ok(settings.sanitized())
    }

    /// Load settings, falling back to defaults if the file is missing or invalid.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => {
                tracing::info!("loaded settings from {}", path.display());
                settings
            }
            Err(SettingsError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Self::default()
            }
            Err(e) => {
                tracing::warn!("ignoring settings at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Writes settings when they change and on a fixed interval.
///
/// Camera moves change the settings nearly every frame, so a change that
/// only touches the camera waits for the next interval.
#[derive(Debug)]
pub struct Autosave {
    interval: f32,
    timer: f32,
    last_saved: Option<Settings>,
}

impl Autosave {
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            timer: 0.0,
            last_saved: None,
        }
    }

    /// Whether `settings` differ from what was last written.
    pub fn is_dirty(&self, settings: &Settings) -> bool {
        self.last_saved.as_ref() != Some(settings)
    }

    /// Whether anything other than the camera differs from what was last written.
    fn needs_immediate_save(&self, settings: &Settings) -> bool {
        match &self.last_saved {
            Some(saved) => {
                let ignoring_camera = Settings {
                    camera: settings.camera,
                    ..saved.clone()
                };
                ignoring_camera != *settings
            }
            None => true,
        }
    }

    /// Record `settings` as already persisted (for example right after loading).
    pub fn mark_saved(&mut self, settings: &Settings) {
        self.last_saved = Some(settings.clone());
        self.timer = 0.0;
    }

    /// Advance by `dt` seconds and save if a toggle changed or the interval
    /// elapsed.
    ///
    /// Returns `Ok(true)` if a save happened.
    pub fn tick(
        &mut self,
        settings: &Settings,
        path: impl AsRef<Path>,
        dt: f32,
    ) -> Result<bool, SettingsError> {
        if dt.is_finite() && dt > 0.0 {
            self.timer += dt;
        }
        if !self.needs_immediate_save(settings) && self.timer < self.interval {
            return Ok(false);
        }
        self.timer = 0.0;
        settings.save(path)?;
        self.last_saved = Some(settings.clone());
        Ok(true)
    }
}

impl Default for Autosave {
    fn default() -> Self {
        Self::new(AUTOSAVE_INTERVAL)
    }
}
