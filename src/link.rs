//! Gravity links: the dashed line between a pointer anchor and a dragged label.
//!
//! A link exists only while an attraction is active. Its look depends on the
//! current length relative to `max_length`:
//!
//! ```text
//! ratio   = clamp(length / max_length, 0, 1)
//! dash    = 2 + 10 * ratio
//! gap     = 1 + 6 * ratio
//! opacity = 1.0 - 0.7 * ratio
//! ```
//!
//! so the line tightens and brightens as the label comes closer. Once the
//! length exceeds `break_threshold` the link breaks on its own; that is the
//! only automatic way a link ends. Otherwise it lasts until released.
//!
//! The line itself is a [`NodeHandle`]. Breaking, releasing and dropping the
//! link all go through dropping that handle, so the host node is removed
//! exactly once whichever happens first.

use glam::Vec3;

use crate::color::Rgb;
use crate::error::SceneError;
use crate::host::{LinkNode, Node, NodeHandle, Retirer, SceneHost};

/// Opacity of a link stretched to `max_length` or beyond.
pub const MIN_LINK_OPACITY: f32 = 0.3;

/// Gravity link parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkConfig {
    /// Length at which the dash pattern is at its loosest.
    pub max_length: f32,
    /// Length beyond which the link breaks.
    pub break_threshold: f32,
    /// How close the pointer ray must pass to a label to grab it.
    pub pick_radius: f32,
    pub color: Rgb,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            max_length: 300.0,
            break_threshold: 500.0,
            pick_radius: 60.0,
            color: Rgb::WHITE,
        }
    }
}

/// Dash layout and opacity of a link of a given length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DashPattern {
    pub dash_size: f32,
    pub gap_size: f32,
    pub opacity: f32,
}

/// Dash pattern for a link of `length` with the given `max_length`.
pub fn dash_pattern(length: f32, max_length: f32) -> DashPattern {
    let ratio = if max_length > 0.0 {
        (length / max_length).clamp(0.0, 1.0)
    } else {
        1.0
    };
    DashPattern {
        dash_size: 2.0 + 10.0 * ratio,
        gap_size: 1.0 + 6.0 * ratio,
        opacity: 1.0 - (1.0 - MIN_LINK_OPACITY) * ratio,
    }
}

/// Result of a link update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkStatus {
    /// No link was active.
    Inactive,
    /// The link is active and was redrawn.
    Holding,
    /// The link exceeded its break threshold this frame and is gone.
    Broken,
}

/// Gravity link owned by a label.
#[derive(Debug)]
pub struct GravityLink {
    anchor: Vec3,
    current_length: f32,
    max_length: f32,
    break_threshold: f32,
    color: Rgb,
    line: Option<NodeHandle>,
}

impl GravityLink {
    /// An inactive link.
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            anchor: Vec3::ZERO,
            current_length: 0.0,
            max_length: config.max_length,
            break_threshold: config.break_threshold,
            color: config.color,
            line: None,
        }
    }

    /// Start drawing a link from `anchor` to a label at `label_position`.
    ///
    /// An already active link is replaced; its old line is retired.
    pub fn attach<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        retirer: &Retirer,
        anchor: Vec3,
        label_position: Vec3,
    ) {
        self.anchor = anchor;
        self.current_length = anchor.distance(label_position);
        let pattern = dash_pattern(self.current_length, self.max_length);
        let node = Node::Link(LinkNode {
            from: anchor,
            to: label_position,
            color: self.color,
            dash_size: pattern.dash_size,
            gap_size: pattern.gap_size,
            opacity: pattern.opacity,
        });
        self.line = Some(retirer.acquire(host, node));
        tracing::debug!("gravity link attached, length {:.1}", self.current_length);
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.line.is_some()
    }

    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }

    /// Length measured at the last attach or update.
    pub fn current_length(&self) -> f32 {
        self.current_length
    }

    pub fn max_length(&self) -> f32 {
        self.max_length
    }

    pub fn break_threshold(&self) -> f32 {
        self.break_threshold
    }

    /// Move the pointer end of the link.
    pub fn set_anchor(&mut self, anchor: Vec3) {
        self.anchor = anchor;
    }

    /// Redraw the link toward a label at `label_position`, or break it.
    pub fn update<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        label_position: Vec3,
    ) -> Result<LinkStatus, SceneError> {
        let id = match &self.line {
            Some(line) => line.id(),
            None => return Ok(LinkStatus::Inactive),
        };

        self.current_length = self.anchor.distance(label_position);
        if self.current_length > self.break_threshold {
            self.line = None;
            tracing::debug!("gravity link broke at length {:.1}", self.current_length);
            return Ok(LinkStatus::Broken);
        }

        let pattern = dash_pattern(self.current_length, self.max_length);
        let node = host.link_mut(id)?;
        node.from = self.anchor;
        node.to = label_position;
        node.dash_size = pattern.dash_size;
        node.gap_size = pattern.gap_size;
        node.opacity = pattern.opacity;
        Ok(LinkStatus::Holding)
    }

    /// Tear the link down.
    ///
    /// Returns `false` if it was not active.
    pub fn release(&mut self) -> bool {
        self.line.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HeadlessHost;

    #[test]
    fn test_dash_pattern_bounds() {
        let near = dash_pattern(0.0, 300.0);
        assert_eq!(near, DashPattern { dash_size: 2.0, gap_size: 1.0, opacity: 1.0 });

        let far = dash_pattern(900.0, 300.0);
        assert_eq!(far.dash_size, 12.0);
        assert_eq!(far.gap_size, 7.0);
        assert!((far.opacity - MIN_LINK_OPACITY).abs() < 1e-6);

        let half = dash_pattern(150.0, 300.0);
        assert_eq!(half.dash_size, 7.0);
        assert_eq!(half.gap_size, 4.0);
    }

    #[test]
    fn test_attach_and_update() {
        let mut host = HeadlessHost::new();
        let retirer = Retirer::new();
        let mut link = GravityLink::new(&LinkConfig::default());
        assert!(!link.is_active());

        link.attach(&mut host, &retirer, Vec3::ZERO, Vec3::X * 100.0);
        assert!(link.is_active());
        assert_eq!(host.count_kind("link"), 1);

        let status = link.update(&mut host, Vec3::X * 150.0).unwrap();
        assert_eq!(status, LinkStatus::Holding);
        assert_eq!(link.current_length(), 150.0);

        let (_, node) = host.nodes().next().unwrap();
        match node {
            Node::Link(l) => {
                assert_eq!(l.to, Vec3::X * 150.0);
                assert_eq!(l.dash_size, 7.0);
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_break_releases_once() {
        let mut host = HeadlessHost::new();
        let retirer = Retirer::new();
        let mut link = GravityLink::new(&LinkConfig::default());
        link.attach(&mut host, &retirer, Vec3::ZERO, Vec3::X * 100.0);
        let (id, _) = host.nodes().next().unwrap();

        let status = link.update(&mut host, Vec3::X * 501.0).unwrap();
        assert_eq!(status, LinkStatus::Broken);
        assert!(!link.is_active());

        // Pointer-up after a break does nothing
        assert!(!link.release());
        assert_eq!(link.update(&mut host, Vec3::ZERO).unwrap(), LinkStatus::Inactive);

        retirer.flush(&mut host);
        retirer.flush(&mut host);
        assert_eq!(host.removal_count(id), 1);
        assert_eq!(host.count_kind("link"), 0);
    }

    #[test]
    fn test_at_threshold_holds() {
        let mut host = HeadlessHost::new();
        let retirer = Retirer::new();
        let mut link = GravityLink::new(&LinkConfig::default());
        link.attach(&mut host, &retirer, Vec3::ZERO, Vec3::ZERO);
        assert_eq!(link.update(&mut host, Vec3::X * 500.0).unwrap(), LinkStatus::Holding);
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut host = HeadlessHost::new();
        let retirer = Retirer::new();
        let mut link = GravityLink::new(&LinkConfig::default());
        link.attach(&mut host, &retirer, Vec3::ZERO, Vec3::Y);

        assert!(link.release());
        assert!(!link.release());
        assert_eq!(retirer.flush(&mut host), 1);
        assert!(host.is_empty());
    }

    #[test]
    fn test_reattach_retires_previous_line() {
        let mut host = HeadlessHost::new();
        let retirer = Retirer::new();
        let mut link = GravityLink::new(&LinkConfig::default());
        link.attach(&mut host, &retirer, Vec3::ZERO, Vec3::Y);
        link.attach(&mut host, &retirer, Vec3::X, Vec3::Y);

        retirer.flush(&mut host);
        assert_eq!(host.count_kind("link"), 1);
    }

    #[test]
    fn test_missing_node_is_reported() {
        let mut host = HeadlessHost::new();
        let retirer = Retirer::new();
        let mut link = GravityLink::new(&LinkConfig::default());
        link.attach(&mut host, &retirer, Vec3::ZERO, Vec3::Y);
        let (id, _) = host.nodes().next().unwrap();
        host.remove_node(id);

        assert_eq!(
            link.update(&mut host, Vec3::Y),
            Err(SceneError::MissingNode(id))
        );
    }
}
