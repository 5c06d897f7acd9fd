//! Scene host that draws nodes with the egui painter.
//!
//! Nodes are kept in a [`HeadlessHost`]; [`PainterHost::paint`] projects them
//! through the camera each frame. Labels are drawn back to front as text
//! scaled by perspective, trails as colored segments and links as dashed
//! lines.

use egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke};
use glam::{Vec2, Vec3, Vec4};

use crate::camera::Camera;
use crate::host::{HeadlessHost, LabelNode, Node, NodeId, SceneHost};

/// Segments fainter than this are skipped.
const MIN_VISIBLE_ALPHA: f32 = 0.01;

/// Clamp for projected label sizes, in points.
const MIN_LABEL_POINTS: f32 = 4.0;
const MAX_LABEL_POINTS: f32 = 160.0;

const TRAIL_WIDTH: f32 = 1.5;
const LINK_WIDTH: f32 = 1.0;

/// Convert a linear RGBA color to egui.
pub fn to_color32(color: Vec4) -> Color32 {
    let c = (color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round();
    Color32::from_rgba_unmultiplied(c.x as u8, c.y as u8, c.z as u8, c.w as u8)
}

/// Map NDC to a point inside `rect`.
pub fn ndc_to_screen(ndc: Vec2, rect: Rect) -> Pos2 {
    Pos2::new(
        rect.left() + (ndc.x + 1.0) * 0.5 * rect.width(),
        rect.top() + (1.0 - ndc.y) * 0.5 * rect.height(),
    )
}

/// Screen projection of the scene for one frame.
struct Projector<'a> {
    camera: &'a Camera,
    rect: Rect,
    aspect: f32,
    /// Points per world unit at depth 1.
    focal: f32,
}

impl<'a> Projector<'a> {
    fn new(camera: &'a Camera, rect: Rect) -> Self {
        let aspect = if rect.height() > 0.0 { rect.width() / rect.height() } else { 1.0 };
        let focal = rect.height() * 0.5 / (camera.fov_y * 0.5).tan();
        Self { camera, rect, aspect, focal }
    }

    /// Screen position and view depth.
    fn project(&self, point: Vec3) -> Option<(Pos2, f32)> {
        let ndc = self.camera.project(point, self.aspect)?;
        Some((ndc_to_screen(ndc.truncate(), self.rect), ndc.z))
    }

    fn scale_at(&self, depth: f32) -> f32 {
        self.focal / depth.max(1e-3)
    }
}

/// Egui-backed scene host.
#[derive(Debug, Default)]
pub struct PainterHost {
    nodes: HeadlessHost,
}

impl PainterHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored nodes.
    pub fn nodes(&self) -> &HeadlessHost {
        &self.nodes
    }

    /// Draw every visible node into `rect`.
    pub fn paint(&self, painter: &Painter, rect: Rect, camera: &Camera) {
        let projector = Projector::new(camera, rect);
        let mut labels: Vec<(f32, Pos2, &LabelNode)> = Vec::new();

        for (_, node) in self.nodes.nodes() {
            match node {
                Node::Trail(trail) if trail.visible => {
                    for (i, color) in trail.colors.iter().enumerate() {
                        if color.w < MIN_VISIBLE_ALPHA {
                            continue;
                        }
                        let (Some(a), Some(b)) = (
                            trail.points.get(i).and_then(|p| projector.project(*p)),
                            trail.points.get(i + 1).and_then(|p| projector.project(*p)),
                        ) else {
                            continue;
                        };
                        painter.line_segment([a.0, b.0], Stroke::new(TRAIL_WIDTH, to_color32(*color)));
                    }
                }
                Node::Link(link) => {
                    let (Some(from), Some(to)) = (projector.project(link.from), projector.project(link.to))
                    else {
                        continue;
                    };
                    let stroke = Stroke::new(LINK_WIDTH, to_color32(link.color.with_alpha(link.opacity)));
                    painter.extend(Shape::dashed_line(
                        &[from.0, to.0],
                        stroke,
                        link.dash_size,
                        link.gap_size,
                    ));
                }
                Node::Label(label) if label.visible => {
                    if let Some((pos, depth)) = projector.project(label.position) {
                        labels.push((depth, pos, label));
                    }
                }
                _ => {}
            }
        }

        // Far labels first so near ones draw on top
        labels.sort_by(|a, b| b.0.total_cmp(&a.0));
        for (depth, pos, label) in labels {
            let size = (label.size * projector.scale_at(depth)).clamp(MIN_LABEL_POINTS, MAX_LABEL_POINTS);
            painter.text(
                pos,
                Align2::CENTER_CENTER,
                &label.text,
                FontId::proportional(size),
                to_color32(label.color.with_alpha(1.0)),
            );
        }
    }
}

impl SceneHost for PainterHost {
    fn add_node(&mut self, node: Node) -> NodeId {
        self.nodes.add_node(node)
    }

    fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        self.nodes.remove_node(id)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.node_mut(id)
    }

    fn render(&mut self) {
        // Painting happens in the egui pass, after the scene update
        self.nodes.render();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_color32() {
        assert_eq!(to_color32(Vec4::new(1.0, 0.0, 0.0, 1.0)), Color32::from_rgb(255, 0, 0));
        assert_eq!(to_color32(Vec4::new(2.0, -1.0, 0.0, 1.0)), Color32::from_rgb(255, 0, 0));
    }

    #[test]
    fn test_ndc_to_screen() {
        let rect = Rect::from_min_size(Pos2::new(100.0, 50.0), egui::vec2(200.0, 100.0));
        assert_eq!(ndc_to_screen(Vec2::ZERO, rect), Pos2::new(200.0, 100.0));
        assert_eq!(ndc_to_screen(Vec2::new(-1.0, 1.0), rect), Pos2::new(100.0, 50.0));
        assert_eq!(ndc_to_screen(Vec2::new(1.0, -1.0), rect), Pos2::new(300.0, 150.0));
    }

    #[test]
    fn test_host_delegates_to_nodes() {
        let mut host = PainterHost::new();
        let id = host.add_node(Node::Label(LabelNode {
            text: "a".into(),
            color: crate::color::Rgb::WHITE,
            size: 30.0,
            depth: 5.0,
            position: Vec3::ZERO,
            orientation: glam::Quat::IDENTITY,
            visible: true,
        }));
        assert!(host.label_mut(id).is_ok());
        host.render();
        assert_eq!(host.nodes().frames(), 1);
        assert!(host.remove_node(id).is_some());
    }
}
