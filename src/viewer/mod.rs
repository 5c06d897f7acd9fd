//! Desktop viewer built on eframe.
//!
//! The scene is projected through a [`Camera`](crate::camera::Camera) and drawn
//! with the egui painter. A side panel edits the text store.

mod app;
pub mod painter;
pub mod remote;

pub use app::{ViewerApp, ViewerOptions};

/// Open the viewer window and block until it is closed.
pub fn run(options: ViewerOptions) -> eframe::Result<()> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("orbitext"),
        renderer: eframe::Renderer::Wgpu,
        wgpu_options: eframe::egui_wgpu::WgpuConfiguration::default(),
        ..Default::default()
    };

    eframe::run_native(
        "orbitext",
        native_options,
        Box::new(|cc| Ok(Box::new(ViewerApp::new(cc, options)))),
    )
}
