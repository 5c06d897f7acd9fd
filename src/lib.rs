//! # orbitext - orbiting text labels
//!
//! A scene of text labels circling a common center on tilted, concentric
//! orbits, with fading trails and pointer-driven "gravity" that pulls a label
//! off its orbit until it is released.
//!
//! orbitext owns the motion model and the scene state. Drawing is delegated
//! to a [`SceneHost`](host::SceneHost), so the same scene runs headless in
//! tests and benches and inside the optional desktop viewer.
//!
//! ## Quick Start
//!
//! ```ignore
//! use orbitext::prelude::*;
//!
//! let mut host = HeadlessHost::new();
//! let mut scene = OrbitScene::new().with_seed(42);
//! let mut clock = FrameClock::new();
//!
//! loop {
//!     let dt = clock.advance(1.0 / 60.0);
//!     scene.frame(&mut host, clock.frame_scale(), dt);
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Labels
//!
//! An [`OrbitingLabel`] sits on level `n` of the scene with radius
//! `100 + 100 * n`. Each frame it advances its angle and eases toward the
//! corresponding point on its tilted orbit. Levels come from the catalog's
//! display order, so `"Hello World!"` is always innermost.
//!
//! ### Attraction and gravity links
//!
//! Pressing the pointer near a label attracts it toward the pointer. A
//! [`GravityLink`](link::GravityLink) is drawn between the pointer anchor and
//! the label; it tightens as the label approaches and breaks on its own if the
//! label ends up too far away. On release the label eases back onto its orbit.
//!
//! ### Trails
//!
//! Each label owns a [`Trail`](trail::Trail) along its orbit. In
//! [`TrailMode::Partial`] a bright arc fades out behind the label and a dim,
//! dashed arc leads it; [`TrailMode::Full`] draws the whole orbit faintly.
//!
//! ### Paging
//!
//! Labels arrive in batches from a [`TextCatalog`]. Each text gets a color
//! derived from its contents, so a word looks the same on every run.
//!
//! ## Feature Overview
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`orbit`] | Orbit geometry, attraction, recovery |
//! | [`trail`] | Trail opacity profiles, [`wrap_angle`](trail::wrap_angle) |
//! | [`link`] | Gravity link dash pattern and break rule |
//! | [`paging`] | Text catalog, color hashing, batch loader |
//! | [`scene`] | [`OrbitScene`], the per-frame update and pointer handling |
//! | [`host`] | [`SceneHost`](host::SceneHost), node handles, headless host |
//! | [`camera`] | Orbit camera, projection, pointer rays |
//! | [`settings`] | Persisted viewer state |
//! | `viewer` | Desktop viewer (feature `viewer`) |

pub mod camera;
pub mod color;
pub mod error;
pub mod host;
pub mod input;
pub mod link;
pub mod orbit;
pub mod paging;
pub mod scene;
pub mod settings;
pub mod time;
pub mod trail;
#[cfg(feature = "viewer")]
pub mod viewer;

pub use camera::{Camera, Ray};
pub use color::Rgb;
pub use error::{MotionError, SceneError, SettingsError};
pub use glam::{Quat, Vec2, Vec3, Vec4};
pub use host::{HeadlessHost, Node, NodeHandle, NodeId, Retirer, SceneHost};
pub use orbit::{Attraction, Motion, OrbitConfig, OrbitingLabel};
pub use paging::{generate_color, BatchLoader, TextCatalog, TextItem};
pub use scene::{FrameStats, OrbitScene};
pub use settings::Settings;
pub use trail::TrailMode;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use orbitext::prelude::*;
/// ```
///
/// This imports:
/// - [`OrbitScene`] - the scene state and frame loop
/// - [`SceneHost`], [`HeadlessHost`] - the rendering boundary
/// - [`Camera`], [`Ray`] - view and picking
/// - [`FrameClock`](crate::time::FrameClock) - frame timing
/// - [`Vec2`], [`Vec3`], [`Vec4`] - glam vector types
pub mod prelude {
    pub use crate::camera::{Camera, CameraSnapshot, Ray};
    pub use crate::color::Rgb;
    pub use crate::host::{HeadlessHost, Node, NodeId, SceneHost};
    pub use crate::input::{Input, KeyCode, PointerButton};
    pub use crate::link::{GravityLink, LinkConfig, LinkStatus};
    pub use crate::orbit::{Motion, OrbitConfig, OrbitingLabel};
    pub use crate::paging::{generate_color, BatchLoader, TextCatalog, TextItem};
    pub use crate::scene::{FrameStats, OrbitScene};
    pub use crate::settings::Settings;
    pub use crate::time::FrameClock;
    pub use crate::trail::{TrailConfig, TrailMode};
    pub use crate::{Vec2, Vec3, Vec4};
    #[cfg(feature = "viewer")]
    pub use egui;
}
