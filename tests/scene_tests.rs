//! End-to-end tests of the scene against the headless host.

use std::f32::consts::{PI, TAU};

use orbitext::link::LinkStatus;
use orbitext::prelude::*;
use orbitext::trail::wrap_angle;
use orbitext::Quat;

fn scene() -> OrbitScene {
    OrbitScene::new().with_seed(11).with_autoload(false)
}

fn ray_through(point: Vec3) -> Ray {
    Ray::new(point + Vec3::Z * 2000.0, -Vec3::Z)
}

fn link_nodes(host: &HeadlessHost) -> Vec<NodeId> {
    host.nodes()
        .filter(|(_, node)| node.kind() == "link")
        .map(|(id, _)| id)
        .collect()
}

#[test]
fn test_orbit_stays_on_tilted_circle() {
    let config = OrbitConfig::default();
    let (start, speed, steps) = (1.0_f32, 0.5_f32, 200);
    let mut label = OrbitingLabel::new("Java", Rgb::WHITE, 2, start, speed, &config);
    let dt_scale = config.tick;

    for _ in 0..steps {
        label.update(dt_scale).unwrap();
    }

    let expected = (start + steps as f32 * speed * dt_scale).rem_euclid(TAU);
    assert!(wrap_angle(label.angle() - expected).abs() < 1e-3);

    // Undo the level offset and tilt: the target lies on a flat circle
    let target = label.orbit_target() - config.center - Vec3::Z * 2.0 * config.z_offset;
    let flat = Quat::from_rotation_x(-config.tilt) * target;
    assert!(flat.y.abs() < 1e-3);
    assert!((flat.length() - label.radius()).abs() < 1e-2);

    // Smoothed position trails the target by at most the settled lag
    let k = label.smoothing_factor();
    let step = speed * dt_scale * label.radius();
    let lag = step * (1.0 - k) / k;
    assert!(label.position().distance(label.orbit_target()) <= lag + 1.0);
}

#[test]
fn test_wrap_angle_range() {
    let samples = [-7.0 * PI, -PI, -1.0, 0.0, 0.5, PI, 3.0 * PI, 100.0];
    for a in samples {
        for b in samples {
            let w = wrap_angle(a - b);
            assert!(w > -PI - 1e-4 && w <= PI + 1e-4, "{} - {} wrapped to {}", a, b, w);
        }
    }
}

#[test]
fn test_partial_trail_peaks_at_label() {
    let config = TrailConfig::default();
    let peak = config.opacity_at(TrailMode::Partial, 0, 0.0, 0.5);
    for i in 1..64 {
        let delta = i as f32 * 0.05;
        assert!(config.opacity_at(TrailMode::Partial, 0, delta, 0.5) <= peak);
        assert!(config.opacity_at(TrailMode::Partial, 0, -delta, 0.5) <= peak);
    }
}

#[test]
fn test_paging_spawns_batches() {
    let mut host = HeadlessHost::new();
    let mut scene = OrbitScene::new().with_seed(3);

    let stats = scene.frame(&mut host, 1.0, 0.0);
    assert_eq!(stats.spawned, 10);
    assert_eq!(scene.label("Hello World!").unwrap().label().level(), 0);

    assert_eq!(scene.frame(&mut host, 1.0, 0.5).spawned, 0);
    assert_eq!(scene.frame(&mut host, 1.0, 0.5).spawned, 3);
    assert!(!scene.is_fully_loaded());

    let stats = scene.frame(&mut host, 1.0, 1.0);
    assert_eq!(stats.spawned, 0);
    assert_eq!(stats.labels, 13);
    assert!(scene.is_fully_loaded());
    assert_eq!(host.count_kind("label"), 13);
    assert_eq!(host.count_kind("trail"), 13);
}

#[test]
fn test_added_texts_resume_paging() {
    let mut host = HeadlessHost::new();
    let mut scene = OrbitScene::new().with_seed(3).with_batch_interval(0.0);
    while !scene.is_fully_loaded() {
        scene.frame(&mut host, 1.0, 0.1);
    }

    assert_eq!(scene.add_texts(["Zig", "Go", "Zig", ""]), 2);
    assert_eq!(scene.frame(&mut host, 1.0, 0.1).spawned, 2);
    assert_eq!(scene.label("Zig").unwrap().label().level(), 13);
}

#[test]
fn test_link_break_releases_once() {
    let mut host = HeadlessHost::new();
    let mut scene = scene();
    scene.spawn_label(&mut host, &TextItem::new("Hello World!"));
    let position = scene.label("Hello World!").unwrap().label().position();

    assert!(scene.pointer_down(&mut host, ray_through(position)));
    let links = link_nodes(&host);
    assert_eq!(links.len(), 1);

    // Drag the anchor far past the break threshold
    assert!(scene.pointer_drag(ray_through(Vec3::new(900.0, 900.0, 0.0))));
    let stats = scene.frame(&mut host, 1.0, 0.0);

    assert_eq!(stats.broken_links, 1);
    assert_eq!(stats.attracted, 0);
    assert!(scene.grabbed().is_none());
    assert!(!scene.label("Hello World!").unwrap().link().is_active());
    assert_eq!(host.removal_count(links[0]), 1);

    // Pointer-up after the break does nothing
    assert!(!scene.pointer_up());
    scene.frame(&mut host, 1.0, 0.0);
    assert_eq!(host.removal_count(links[0]), 1);
}

#[test]
fn test_link_tightens_as_label_approaches() {
    let mut host = HeadlessHost::new();
    let mut scene = scene();
    scene.spawn_label(&mut host, &TextItem::new("Java"));
    let position = scene.label("Java").unwrap().label().position();

    scene.pointer_down(&mut host, ray_through(position));
    scene.pointer_drag(ray_through(position + Vec3::new(200.0, 0.0, 0.0)));

    let mut lengths = Vec::new();
    for _ in 0..20 {
        scene.frame(&mut host, 1.0, 0.0);
        lengths.push(scene.label("Java").unwrap().link().current_length());
    }
    assert!(lengths.windows(2).all(|w| w[1] <= w[0] + 1.0));
    assert!(lengths[lengths.len() - 1] < lengths[0]);

    let link = link_nodes(&host)[0];
    match host.node(link) {
        Some(Node::Link(node)) => {
            assert!(node.opacity >= orbitext::link::MIN_LINK_OPACITY);
            assert!(node.opacity <= 1.0);
        }
        other => panic!("unexpected node {:?}", other),
    }
}

#[test]
fn test_missing_node_is_recovered() {
    let mut host = HeadlessHost::new();
    let mut scene = scene();
    scene.spawn_label(&mut host, &TextItem::new("Java"));
    scene.spawn_label(&mut host, &TextItem::new("Python"));

    let java = scene.label("Java").unwrap();
    let mesh = java.mesh_id();
    let position = java.label().position();
    scene.pointer_down(&mut host, ray_through(position));
    assert_eq!(scene.grabbed(), Some("Java"));

    host.remove_node(mesh);
    let python_angle = scene.label("Python").unwrap().label().angle();
    let stats = scene.frame(&mut host, 1.0, 0.0);

    assert_eq!(stats.errors, 1);
    assert_eq!(stats.labels, 2);
    assert!(scene.grabbed().is_none());
    assert!(!scene.label("Java").unwrap().label().is_attracted());
    assert!(link_nodes(&host).is_empty());
    // The other label kept moving
    assert_ne!(scene.label("Python").unwrap().label().angle(), python_angle);
}

#[test]
fn test_link_status_without_grab() {
    let mut host = HeadlessHost::new();
    let mut link = GravityLink::new(&LinkConfig::default());
    assert_eq!(link.update(&mut host, Vec3::ZERO).unwrap(), LinkStatus::Inactive);
    assert!(!link.release());
}

#[test]
fn test_colors_are_stable() {
    let a = generate_color("Hello World!");
    let b = generate_color("Hello World!");
    assert_eq!(a, b);
    assert_eq!(TextItem::new("Hello World!").color, a);
}

#[test]
fn test_frame_renders_once() {
    let mut host = HeadlessHost::new();
    let mut scene = scene();
    scene.load_next_page(&mut host);
    for _ in 0..5 {
        scene.frame(&mut host, 1.0, 1.0 / 60.0);
    }
    assert_eq!(host.frames(), 5);
}
