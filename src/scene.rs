//! The orbiting text scene.
//!
//! [`OrbitScene`] is the whole application state: the labels with their
//! trails and gravity links, the text catalog feeding them, the persisted
//! [`Settings`] and the current pointer grab. It never touches a window or a
//! GPU; everything visible goes through a [`SceneHost`].
//!
//! # Frame
//!
//! [`OrbitScene::frame`] runs once per display frame:
//!
//! 1. Poll the [`BatchLoader`] and spawn any new labels.
//! 2. For each label: advance its motion, update its gravity link (which may
//!    break), recompute its trail and push the result to the host.
//! 3. Remove every node whose handle was dropped during the frame.
//! 4. Ask the host to render.
//!
//! A failing label never stops the frame. The error is logged, the label's
//! link and attraction are released, the label is put back on its orbit and
//! the loop moves on.
//!
//! # Pointer
//!
//! Pointer events arrive between frames as world-space [`Ray`]s:
//!
//! ```ignore
//! let ray = camera.ray(input.pointer_ndc(), input.aspect());
//! if input.pointer_pressed(PointerButton::Primary) {
//!     scene.pointer_down(&mut host, ray);
//! } else if input.pointer_held(PointerButton::Primary) {
//!     scene.pointer_drag(ray);
//! } else if input.pointer_released(PointerButton::Primary) {
//!     scene.pointer_up();
//! }
//! ```
//!
//! The latest event wins: a drag retargets the grabbed label, a new press
//! releases the previous grab first.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::camera::Ray;
use crate::error::MotionError;
use crate::host::{LabelNode, Node, NodeHandle, NodeId, Retirer, SceneHost, TrailNode};
use crate::link::{GravityLink, LinkConfig, LinkStatus};
use crate::orbit::{OrbitConfig, OrbitingLabel};
use crate::paging::{BatchLoader, TextCatalog, TextItem, DEFAULT_BATCH_INTERVAL};
use crate::settings::Settings;
use crate::trail::{Trail, TrailConfig};

/// A label together with everything it owns in the host.
///
/// Dropping it retires its mesh, its trail and any active link.
#[derive(Debug)]
pub struct SceneLabel {
    label: OrbitingLabel,
    trail: Trail,
    link: GravityLink,
    mesh: NodeHandle,
    trail_line: NodeHandle,
}

impl SceneLabel {
    pub fn label(&self) -> &OrbitingLabel {
        &self.label
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    pub fn link(&self) -> &GravityLink {
        &self.link
    }

    /// Host node of the label mesh.
    pub fn mesh_id(&self) -> NodeId {
        self.mesh.id()
    }

    /// Host node of the trail polyline.
    pub fn trail_id(&self) -> NodeId {
        self.trail_line.id()
    }

    fn text(&self) -> &str {
        self.label.text()
    }

    /// Advance one frame and push the result to the host.
    fn update<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        dt_scale: f32,
        settings: &Settings,
    ) -> Result<LinkStatus, MotionError> {
        let visible = self.label.level() < settings.visible_orbits;
        self.label.set_visible(visible);
        self.label.update(dt_scale)?;

        let status = self.link.update(host, self.label.position())?;
        if status == LinkStatus::Broken {
            self.label.release();
        }

        self.sync(host, settings)?;
        Ok(status)
    }

    /// Write label and trail state into their host nodes.
    fn sync<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        settings: &Settings,
    ) -> Result<(), MotionError> {
        let visible = self.label.is_visible();

        let mesh = host.label_mut(self.mesh.id())?;
        mesh.position = self.label.position();
        mesh.orientation = self.label.orientation();
        mesh.visible = visible;

        let trail_visible = visible && settings.trails_visible && !self.label.is_attracted();
        self.trail.set_visible(trail_visible);
        if trail_visible {
            self.trail.update(
                settings.trail_mode,
                self.label.angle(),
                self.label.angular_speed(),
            );
        }

        let line = host.trail_mut(self.trail_line.id())?;
        line.visible = trail_visible;
        if trail_visible {
            self.trail.write_colors(self.label.color(), &mut line.colors);
        }
        Ok(())
    }

    /// Drop the link and attraction and put the label back on its orbit.
    fn recover<H: SceneHost + ?Sized>(&mut self, host: &mut H, settings: &Settings) {
        self.link.release();
        self.label.snap_to_orbit();
        if let Err(e) = self.sync(host, settings) {
            tracing::debug!("label '{}' could not be resynced: {}", self.text(), e);
        }
    }
}

/// What happened during one [`OrbitScene::frame`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Labels in the scene after the frame.
    pub labels: usize,
    /// Labels spawned from the batch loader.
    pub spawned: usize,
    /// Labels currently attracted.
    pub attracted: usize,
    /// Links that exceeded their break threshold.
    pub broken_links: usize,
    /// Labels that failed and were recovered.
    pub errors: usize,
    /// Host nodes removed at the end of the frame.
    pub removed_nodes: usize,
}

/// The current pointer grab.
#[derive(Clone, Debug)]
struct Grab {
    text: String,
    /// Drag plane through the initial anchor, facing the camera.
    plane_point: Vec3,
    plane_normal: Vec3,
}

/// Application state of the orbiting text scene.
#[derive(Debug)]
pub struct OrbitScene {
    orbit: OrbitConfig,
    trail: TrailConfig,
    link: LinkConfig,
    settings: Settings,
    catalog: TextCatalog,
    loader: BatchLoader,
    autoload: bool,
    labels: Vec<SceneLabel>,
    retirer: Retirer,
    rng: StdRng,
    grab: Option<Grab>,
}

impl OrbitScene {
    /// Empty scene with default configuration and the default catalog.
    pub fn new() -> Self {
        Self {
            orbit: OrbitConfig::default(),
            trail: TrailConfig::default(),
            link: LinkConfig::default(),
            settings: Settings::default(),
            catalog: TextCatalog::new(),
            loader: BatchLoader::new(DEFAULT_BATCH_INTERVAL),
            autoload: true,
            labels: Vec::new(),
            retirer: Retirer::new(),
            rng: StdRng::from_entropy(),
            grab: None,
        }
    }

    // ========== Builder ==========

    pub fn with_orbit_config(mut self, config: OrbitConfig) -> Self {
        self.orbit = config;
        self
    }

    pub fn with_trail_config(mut self, config: TrailConfig) -> Self {
        self.trail = config;
        self
    }

    pub fn with_link_config(mut self, config: LinkConfig) -> Self {
        self.link = config;
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_catalog(mut self, catalog: TextCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Seconds between batches pulled from the catalog.
    pub fn with_batch_interval(mut self, seconds: f32) -> Self {
        self.loader = BatchLoader::new(seconds);
        self
    }

    /// Whether [`frame`](Self::frame) pulls pages from the catalog on its own.
    /// When off, labels only arrive through [`load_next_page`](Self::load_next_page)
    /// and [`spawn_label`](Self::spawn_label).
    pub fn with_autoload(mut self, autoload: bool) -> Self {
        self.autoload = autoload;
        self
    }

    /// Fixed seed for start angles and speeds.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    // ========== Accessors ==========

    pub fn labels(&self) -> &[SceneLabel] {
        &self.labels
    }

    pub fn label(&self, text: &str) -> Option<&SceneLabel> {
        self.labels.iter().find(|l| l.text() == text)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Settings take effect on the next frame.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn catalog(&self) -> &TextCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut TextCatalog {
        &mut self.catalog
    }

    pub fn orbit_config(&self) -> &OrbitConfig {
        &self.orbit
    }

    pub fn link_config(&self) -> &LinkConfig {
        &self.link
    }

    /// Text of the label currently held by the pointer.
    pub fn grabbed(&self) -> Option<&str> {
        self.grab.as_ref().map(|g| g.text.as_str())
    }

    /// Whether the batch loader has run out of pages.
    pub fn is_fully_loaded(&self) -> bool {
        self.loader.is_exhausted()
    }

    // ========== Labels ==========

    /// Add a label for `item`.
    ///
    /// The orbit level is the item's position in the display order; texts
    /// outside it are appended to it first. Returns `false` if a label with
    /// the same text already exists.
    pub fn spawn_label<H: SceneHost + ?Sized>(&mut self, host: &mut H, item: &TextItem) -> bool {
        if self.label(&item.text).is_some() {
            return false;
        }

        let level = match self.catalog.level_of(&item.text) {
            Some(level) => level,
            None => {
                self.catalog.extend_display_order([item.text.as_str()]);
                self.catalog.count() - 1
            }
        };
        let angle = self.rng.gen_range(0.0..TAU);
        let speed = if self.orbit.max_speed > self.orbit.min_speed {
            self.rng.gen_range(self.orbit.min_speed..=self.orbit.max_speed)
        } else {
            self.orbit.min_speed
        };

        let mut label = OrbitingLabel::new(&item.text, item.color, level, angle, speed, &self.orbit);
        label.set_visible(level < self.settings.visible_orbits);
        let trail = Trail::for_label(&self.trail, &label);

        let mesh = self.retirer.acquire(
            host,
            Node::Label(LabelNode {
                text: item.text.clone(),
                color: item.color,
                size: self.orbit.text_size,
                depth: self.orbit.text_depth,
                position: label.position(),
                orientation: label.orientation(),
                visible: label.is_visible(),
            }),
        );
        let trail_line = self.retirer.acquire(
            host,
            Node::Trail(TrailNode {
                points: trail.points().to_vec(),
                colors: trail.colors(item.color),
                visible: false,
            }),
        );

        tracing::debug!(
            "spawned '{}' on level {} (speed {:.2}, color {})",
            item.text,
            level,
            speed,
            item.color
        );
        self.labels.push(SceneLabel {
            label,
            trail,
            link: GravityLink::new(&self.link),
            mesh,
            trail_line,
        });
        true
    }

    /// Spawn the next catalog page right away. Returns how many labels were added.
    pub fn load_next_page<H: SceneHost + ?Sized>(&mut self, host: &mut H) -> usize {
        let page = self.catalog.next_page();
        page.iter().filter(|item| self.spawn_label(host, item)).count()
    }

    /// Add texts to the end of the display order so the loader pages them in.
    pub fn add_texts<I, S>(&mut self, texts: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let added = self.catalog.extend_display_order(texts);
        if added > 0 {
            self.loader.reset();
        }
        added
    }

    /// Remove a label. Its nodes leave the host at the next frame.
    pub fn remove_label(&mut self, text: &str) -> bool {
        match self.labels.iter().position(|l| l.text() == text) {
            Some(index) => {
                self.labels.remove(index);
                if self.grabbed() == Some(text) {
                    self.grab = None;
                }
                true
            }
            None => false,
        }
    }

    /// Remove every label and start paging from the beginning.
    pub fn reset(&mut self) {
        self.labels.clear();
        self.grab = None;
        self.catalog.reset_paging();
        self.loader.reset();
    }

    // ========== Pointer ==========

    /// Grab the label closest to `ray`, if one is within the pick radius.
    ///
    /// Returns `true` if a label was grabbed.
    pub fn pointer_down<H: SceneHost + ?Sized>(&mut self, host: &mut H, ray: Ray) -> bool {
        self.pointer_up();

        let picked = self
            .labels
            .iter()
            .enumerate()
            .filter(|(_, l)| l.label.is_visible())
            .map(|(i, l)| (i, ray.distance_to(l.label.position())))
            .filter(|(_, d)| *d <= self.link.pick_radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i);

        let Some(index) = picked else {
            return false;
        };

        let strength = self.orbit.attraction_strength;
        let return_speed = self.orbit.return_speed;
        let bounds = self.orbit.bounds;
        let entry = &mut self.labels[index];

        let anchor = clamp_to_bounds(ray.closest_point(entry.label.position()), bounds);
        entry.label.attract(anchor, strength, return_speed);
        entry
            .link
            .attach(host, &self.retirer, anchor, entry.label.position());

        tracing::debug!("grabbed '{}'", entry.text());
        self.grab = Some(Grab {
            text: entry.text().to_string(),
            plane_point: anchor,
            plane_normal: -ray.direction,
        });
        true
    }

    /// Move the grabbed label's target along the drag plane.
    ///
    /// Returns `false` if nothing is grabbed or the ray misses the plane.
    pub fn pointer_drag(&mut self, ray: Ray) -> bool {
        let Some(grab) = &self.grab else {
            return false;
        };
        let Some(point) = ray.intersect_plane(grab.plane_point, grab.plane_normal) else {
            return false;
        };
        let anchor = clamp_to_bounds(point, self.orbit.bounds);

        let text = grab.text.clone();
        match self.labels.iter_mut().find(|l| l.text() == text) {
            Some(entry) if entry.label.is_attracted() => {
                entry.label.set_target(anchor);
                entry.link.set_anchor(anchor);
                true
            }
            _ => {
                self.grab = None;
                false
            }
        }
    }

    /// Release the grabbed label. A second call is a no-op.
    pub fn pointer_up(&mut self) -> bool {
        let Some(grab) = self.grab.take() else {
            return false;
        };
        match self.labels.iter_mut().find(|l| l.text() == grab.text) {
            Some(entry) => {
                let link = entry.link.release();
                let attraction = entry.label.release();
                tracing::debug!("released '{}'", grab.text);
                link || attraction
            }
            None => false,
        }
    }

    /// Release every link and attraction. Returns how many labels were affected.
    pub fn release_all(&mut self) -> usize {
        self.grab = None;
        self.labels
            .iter_mut()
            .filter_map(|l| {
                let link = l.link.release();
                let attraction = l.label.release();
                (link || attraction).then_some(())
            })
            .count()
    }

    // ========== Frame ==========

    /// Advance the scene by one display frame.
    ///
    /// `frame_scale` is the frame time in reference frames (see
    /// [`FrameClock::frame_scale`](crate::time::FrameClock::frame_scale));
    /// `dt_secs` drives the batch loader.
    pub fn frame<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        frame_scale: f32,
        dt_secs: f32,
    ) -> FrameStats {
        let mut stats = FrameStats::default();

        if self.autoload {
            if let Some(page) = self.loader.poll(&mut self.catalog, dt_secs) {
                stats.spawned = page.iter().filter(|item| self.spawn_label(host, item)).count();
            }
        }

        let frame_scale = if frame_scale.is_finite() { frame_scale.max(0.0) } else { 0.0 };
        let dt_scale = frame_scale * self.settings.effective_speed() * self.orbit.tick;

        for entry in &mut self.labels {
            match entry.update(host, dt_scale, &self.settings) {
                Ok(LinkStatus::Broken) => {
                    stats.broken_links += 1;
                    if self.grab.as_ref().is_some_and(|g| g.text == entry.text()) {
                        self.grab = None;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("recovering label '{}': {}", entry.text(), e);
                    stats.errors += 1;
                    entry.recover(host, &self.settings);
                    if self.grab.as_ref().is_some_and(|g| g.text == entry.text()) {
                        self.grab = None;
                    }
                }
            }
            if entry.label.is_attracted() {
                stats.attracted += 1;
            }
        }

        stats.labels = self.labels.len();
        stats.removed_nodes = self.retirer.flush(host);
        host.render();
        stats
    }
}

impl Default for OrbitScene {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_to_bounds(point: Vec3, bounds: f32) -> Vec3 {
    let b = bounds.abs();
    point.clamp(Vec3::splat(-b), Vec3::splat(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HeadlessHost;
    use crate::paging::TextItem;

    fn scene() -> OrbitScene {
        OrbitScene::new().with_seed(7).with_autoload(false)
    }

    /// A ray from far out on +Z straight through `point`.
    fn ray_through(point: Vec3) -> Ray {
        Ray::new(point + Vec3::Z * 2000.0, -Vec3::Z)
    }

    #[test]
    fn test_spawn_acquires_nodes() {
        let mut host = HeadlessHost::new();
        let mut scene = scene();
        assert!(scene.spawn_label(&mut host, &TextItem::new("Python")));
        assert!(!scene.spawn_label(&mut host, &TextItem::new("Python")));

        assert_eq!(host.count_kind("label"), 1);
        assert_eq!(host.count_kind("trail"), 1);
        // Display order puts Python on level 3
        assert_eq!(scene.label("Python").unwrap().label().level(), 3);
    }

    #[test]
    fn test_speed_within_range() {
        let mut host = HeadlessHost::new();
        let mut scene = scene();
        scene.load_next_page(&mut host);
        for l in scene.labels() {
            let speed = l.label().angular_speed();
            assert!((0.2..=0.8).contains(&speed));
        }
    }

    #[test]
    fn test_remove_label_retires_nodes() {
        let mut host = HeadlessHost::new();
        let mut scene = scene();
        scene.spawn_label(&mut host, &TextItem::new("Vue"));
        let mesh = scene.label("Vue").unwrap().mesh_id();

        assert!(scene.remove_label("Vue"));
        assert!(!scene.remove_label("Vue"));
        let stats = scene.frame(&mut host, 1.0, 0.0);
        assert_eq!(stats.removed_nodes, 2);
        assert_eq!(host.removal_count(mesh), 1);
        assert!(host.is_empty());
    }

    #[test]
    fn test_texts_outside_display_order_get_new_levels() {
        let mut host = HeadlessHost::new();
        let mut scene = scene();
        scene.spawn_label(&mut host, &TextItem::new("Go"));
        scene.spawn_label(&mut host, &TextItem::new("Zig"));
        assert_eq!(scene.label("Go").unwrap().label().level(), 13);
        assert_eq!(scene.label("Zig").unwrap().label().level(), 14);
    }

    #[test]
    fn test_pick_misses_far_ray() {
        let mut host = HeadlessHost::new();
        let mut scene = scene();
        scene.spawn_label(&mut host, &TextItem::new("Java"));
        let far = Ray::new(Vec3::new(5000.0, 5000.0, 5000.0), Vec3::X);
        assert!(!scene.pointer_down(&mut host, far));
        assert!(scene.grabbed().is_none());
    }

    #[test]
    fn test_grab_drag_release() {
        let mut host = HeadlessHost::new();
        let mut scene = scene();
        scene.spawn_label(&mut host, &TextItem::new("Java"));
        let position = scene.label("Java").unwrap().label().position();

        assert!(scene.pointer_down(&mut host, ray_through(position + Vec3::X * 10.0)));
        assert_eq!(scene.grabbed(), Some("Java"));
        assert!(scene.label("Java").unwrap().label().is_attracted());
        assert_eq!(host.count_kind("link"), 1);

        assert!(scene.pointer_drag(ray_through(position + Vec3::Y * 50.0)));
        let stats = scene.frame(&mut host, 1.0, 0.0);
        assert_eq!(stats.attracted, 1);

        assert!(scene.pointer_up());
        assert!(!scene.pointer_up());
        scene.frame(&mut host, 1.0, 0.0);
        assert_eq!(host.count_kind("link"), 0);
        assert!(!scene.label("Java").unwrap().label().is_attracted());
    }

    #[test]
    fn test_trail_hidden_while_attracted() {
        let mut host = HeadlessHost::new();
        let mut scene = scene();
        scene.spawn_label(&mut host, &TextItem::new("Java"));
        scene.frame(&mut host, 1.0, 0.0);
        assert!(scene.label("Java").unwrap().trail().is_visible());

        let position = scene.label("Java").unwrap().label().position();
        scene.pointer_down(&mut host, ray_through(position));
        scene.frame(&mut host, 1.0, 0.0);
        let entry = scene.label("Java").unwrap();
        assert!(!entry.trail().is_visible());
        match host.node(entry.trail_id()) {
            Some(Node::Trail(t)) => assert!(!t.visible),
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_orbit_disabled_freezes_angle() {
        let mut host = HeadlessHost::new();
        let mut scene = scene();
        scene.spawn_label(&mut host, &TextItem::new("Java"));
        scene.settings_mut().orbit_enabled = false;
        let angle = scene.label("Java").unwrap().label().angle();
        for _ in 0..10 {
            scene.frame(&mut host, 1.0, 0.0);
        }
        assert_eq!(scene.label("Java").unwrap().label().angle(), angle);
    }

    #[test]
    fn test_visible_orbits_hides_outer_levels() {
        let mut host = HeadlessHost::new();
        let mut scene = scene();
        scene.settings_mut().visible_orbits = 2;
        scene.load_next_page(&mut host);
        scene.frame(&mut host, 1.0, 0.0);

        let visible = scene.labels().iter().filter(|l| l.label().is_visible()).count();
        assert_eq!(visible, 2);
    }

    #[test]
    fn test_release_all() {
        let mut host = HeadlessHost::new();
        let mut scene = scene();
        scene.spawn_label(&mut host, &TextItem::new("Java"));
        let position = scene.label("Java").unwrap().label().position();
        scene.pointer_down(&mut host, ray_through(position));

        assert_eq!(scene.release_all(), 1);
        assert_eq!(scene.release_all(), 0);
        assert!(scene.grabbed().is_none());
    }

    #[test]
    fn test_anchor_clamped_to_bounds() {
        assert_eq!(
            clamp_to_bounds(Vec3::new(5000.0, -5000.0, 10.0), 1000.0),
            Vec3::new(1000.0, -1000.0, 10.0)
        );
    }
}
