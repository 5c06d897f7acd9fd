//! Pointer and keyboard state for the scene.
//!
//! The `Input` struct turns raw window events into per-frame state, tracking
//! both instantaneous events (button just pressed) and continuous state
//! (button held down). Pointer-driven attraction reads it between frames:
//!
//! ```ignore
//! if input.pointer_pressed(PointerButton::Primary) {
//!     let ray = camera.ray(input.pointer_ndc(), input.aspect());
//!     scene.pointer_down(&mut host, ray);
//! }
//! ```
//!
//! With the `viewer` feature, [`Input::handle_egui_event`] feeds it from egui.

use glam::Vec2;
use std::collections::HashSet;

/// Pointer button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Keys the viewer binds to scene toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Pause or resume orbiting.
    Space,
    /// Cycle the trail mode.
    T,
    /// Reset the camera.
    R,
    /// Release every attraction.
    Escape,
    Other,
}

/// Input state tracking for pointer and keys.
#[derive(Debug, Default)]
pub struct Input {
    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,

    pointer_held: HashSet<PointerButton>,
    pointer_pressed: HashSet<PointerButton>,
    pointer_released: HashSet<PointerButton>,

    pointer_position: Vec2,
    pointer_ndc: Vec2,
    pointer_delta: Vec2,

    scroll_delta: f32,

    /// Viewport origin and size in pixels, for NDC conversion.
    viewport_origin: Vec2,
    viewport_size: Vec2,
}

impl Input {
    pub fn new() -> Self {
        Self {
            viewport_size: Vec2::new(800.0, 600.0),
            ..Default::default()
        }
    }

    // ========== Key Queries ==========

    /// Check if a key was pressed this frame.
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Check if a key is currently held down.
    pub fn key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    // ========== Pointer Queries ==========

    /// Check if a pointer button was pressed this frame.
    pub fn pointer_pressed(&self, button: PointerButton) -> bool {
        self.pointer_pressed.contains(&button)
    }

    /// Check if a pointer button is currently held down.
    pub fn pointer_held(&self, button: PointerButton) -> bool {
        self.pointer_held.contains(&button)
    }

    /// Check if a pointer button was released this frame.
    pub fn pointer_released(&self, button: PointerButton) -> bool {
        self.pointer_released.contains(&button)
    }

    /// Pointer position in screen pixels.
    pub fn pointer_position(&self) -> Vec2 {
        self.pointer_position
    }

    /// Pointer position in normalized device coordinates (-1 to 1).
    ///
    /// Origin is at the viewport center, Y increases upward.
    pub fn pointer_ndc(&self) -> Vec2 {
        self.pointer_ndc
    }

    /// Pointer movement since last frame in pixels.
    pub fn pointer_delta(&self) -> Vec2 {
        self.pointer_delta
    }

    /// Scroll delta this frame, positive when scrolling up/forward.
    pub fn scroll_delta(&self) -> f32 {
        self.scroll_delta
    }

    /// Viewport aspect ratio (width / height).
    pub fn aspect(&self) -> f32 {
        if self.viewport_size.y > 0.0 {
            self.viewport_size.x / self.viewport_size.y
        } else {
            1.0
        }
    }

    // ========== Event Feeding ==========

    /// Clear per-frame state. Call at the start of each frame.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.pointer_pressed.clear();
        self.pointer_released.clear();
        self.pointer_delta = Vec2::ZERO;
        self.scroll_delta = 0.0;
    }

    /// Update the viewport rectangle used for NDC conversion.
    pub fn set_viewport(&mut self, origin: Vec2, size: Vec2) {
        self.viewport_origin = origin;
        self.viewport_size = size;
        self.pointer_ndc = self.to_ndc(self.pointer_position);
    }

    pub fn press_key(&mut self, key: KeyCode) {
        // Only fire pressed if not already held (no repeat)
        if self.keys_held.insert(key) {
            self.keys_pressed.insert(key);
        }
    }

    pub fn release_key(&mut self, key: KeyCode) {
        self.keys_held.remove(&key);
    }

    pub fn press_pointer(&mut self, button: PointerButton) {
        self.pointer_pressed.insert(button);
        self.pointer_held.insert(button);
    }

    pub fn release_pointer(&mut self, button: PointerButton) {
        self.pointer_held.remove(&button);
        self.pointer_released.insert(button);
    }

    /// Record a pointer move to `position` (screen pixels).
    pub fn move_pointer(&mut self, position: Vec2) {
        self.pointer_delta += position - self.pointer_position;
        self.pointer_position = position;
        self.pointer_ndc = self.to_ndc(position);
    }

    pub fn scroll(&mut self, delta: f32) {
        self.scroll_delta += delta;
    }

    fn to_ndc(&self, position: Vec2) -> Vec2 {
        let size = self.viewport_size;
        if size.x <= 0.0 || size.y <= 0.0 {
            return Vec2::ZERO;
        }
        let local = position - self.viewport_origin;
        Vec2::new(
            (local.x / size.x) * 2.0 - 1.0,
            1.0 - (local.y / size.y) * 2.0, // Y flipped
        )
    }
}

#[cfg(feature = "viewer")]
impl From<egui::PointerButton> for PointerButton {
    fn from(button: egui::PointerButton) -> Self {
        match button {
            egui::PointerButton::Secondary => PointerButton::Secondary,
            egui::PointerButton::Middle => PointerButton::Middle,
            _ => PointerButton::Primary,
        }
    }
}

#[cfg(feature = "viewer")]
impl From<egui::Key> for KeyCode {
    fn from(key: egui::Key) -> Self {
        match key {
            egui::Key::Space => KeyCode::Space,
            egui::Key::T => KeyCode::T,
            egui::Key::R => KeyCode::R,
            egui::Key::Escape => KeyCode::Escape,
            _ => KeyCode::Other,
        }
    }
}

#[cfg(feature = "viewer")]
impl Input {
    /// Process an egui input event.
    pub fn handle_egui_event(&mut self, event: &egui::Event) {
        match event {
            egui::Event::Key { key, pressed, repeat, .. } => {
                let key = KeyCode::from(*key);
                if *pressed && !*repeat {
                    self.press_key(key);
                } else if !*pressed {
                    self.release_key(key);
                }
            }
            egui::Event::PointerButton { pos, button, pressed, .. } => {
                self.move_pointer(Vec2::new(pos.x, pos.y));
                if *pressed {
                    self.press_pointer((*button).into());
                } else {
                    self.release_pointer((*button).into());
                }
            }
            egui::Event::PointerMoved(pos) => {
                self.move_pointer(Vec2::new(pos.x, pos.y));
            }
            egui::Event::MouseWheel { delta, unit, .. } => {
                self.scroll(match unit {
                    egui::MouseWheelUnit::Point => delta.y / 100.0,
                    _ => delta.y,
                });
            }
            _ => {}
        }
    }
}
