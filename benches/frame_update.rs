//! Benchmarks for the per-frame scene update.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use orbitext::prelude::*;
use orbitext::trail::wrap_angle;

fn loaded_scene(host: &mut HeadlessHost, mode: TrailMode) -> OrbitScene {
    let mut scene = OrbitScene::new().with_seed(1).with_autoload(false);
    scene.settings_mut().trail_mode = mode;
    scene.catalog_mut().set_page_size(64);
    scene.load_next_page(host);
    scene
}

fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");

    for (name, mode) in [("partial", TrailMode::Partial), ("full", TrailMode::Full)] {
        group.bench_function(BenchmarkId::new("13_labels", name), |b| {
            let mut host = HeadlessHost::new();
            let mut scene = loaded_scene(&mut host, mode);
            b.iter(|| black_box(scene.frame(&mut host, 1.0, 1.0 / 60.0)))
        });
    }

    group.bench_function("13_labels_attracted", |b| {
        let mut host = HeadlessHost::new();
        let mut scene = loaded_scene(&mut host, TrailMode::Partial);
        let position = scene.label("Java").map(|l| l.label().position()).unwrap_or_default();
        scene.pointer_down(&mut host, Ray::new(position + Vec3::Z * 2000.0, -Vec3::Z));
        b.iter(|| black_box(scene.frame(&mut host, 1.0, 1.0 / 60.0)))
    });

    group.finish();
}

fn bench_trail_profile(c: &mut Criterion) {
    let config = TrailConfig::default();
    c.bench_function("trail_opacity_128", |b| {
        b.iter(|| {
            let mut sum = 0.0;
            for i in 0..config.segments {
                let delta = wrap_angle(i as f32 * 0.049 - 1.3);
                sum += config.opacity_at(TrailMode::Partial, i, delta, 0.6);
            }
            black_box(sum)
        })
    });
}

fn bench_color(c: &mut Criterion) {
    c.bench_function("generate_color", |b| {
        b.iter(|| black_box(generate_color(black_box("Hello World!"))))
    });
}

criterion_group!(benches, bench_frame, bench_trail_profile, bench_color);
criterion_main!(benches);
