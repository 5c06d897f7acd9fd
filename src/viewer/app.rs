use std::path::PathBuf;
use std::time::Instant;

use eframe::egui;
use glam::Vec2;

use crate::camera::Camera;
use crate::input::{Input, KeyCode, PointerButton};
use crate::scene::{FrameStats, OrbitScene};
use crate::settings::{Autosave, Settings, SPEED_RANGE};
use crate::time::FrameClock;
use crate::trail::TrailMode;

use super::painter::PainterHost;
use super::remote::{split_lines, RemoteClient, RemoteEvent, DEFAULT_STORE_URL};

/// Camera rotation per dragged pixel, in radians.
const ROTATE_SPEED: f32 = 0.005;

/// Zoom exponent per scroll step.
const ZOOM_SPEED: f32 = 0.1;

const STATUS_TIMEOUT_SECS: u64 = 5;

const BACKGROUND: egui::Color32 = egui::Color32::from_rgb(10, 10, 18);

/// Startup options for the viewer.
#[derive(Clone, Debug)]
pub struct ViewerOptions {
    /// Where settings are read from and saved to.
    pub settings_path: PathBuf,
    /// Base URL of the text store. `None` disables the store panel.
    pub store_url: Option<String>,
    /// Seed for label placement; random when `None`.
    pub seed: Option<u64>,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            settings_path: PathBuf::from("orbitext.json"),
            store_url: Some(DEFAULT_STORE_URL.to_string()),
            seed: None,
        }
    }
}

/// The eframe application.
pub struct ViewerApp {
    scene: OrbitScene,
    host: PainterHost,
    camera: Camera,
    input: Input,
    clock: FrameClock,
    settings_path: PathBuf,
    autosave: Autosave,
    remote: Option<RemoteClient>,
    /// Contents of the store editor.
    editor_text: String,
    status_message: Option<(String, Instant)>,
    /// The current primary drag orbits the camera instead of a label.
    rotating: bool,
    last_stats: FrameStats,
}

impl ViewerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, options: ViewerOptions) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let settings = Settings::load_or_default(&options.settings_path);
        let mut camera = Camera::new();
        camera.restore(&settings.camera);

        let mut autosave = Autosave::default();
        autosave.mark_saved(&settings);

        let mut scene = OrbitScene::new().with_settings(settings);
        if let Some(seed) = options.seed {
            scene = scene.with_seed(seed);
        }

        let mut status_message = None;
        let remote = options.store_url.and_then(|url| match RemoteClient::new(url) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!("text store disabled: {}", e);
                status_message = Some((format!("Text store disabled: {}", e), Instant::now()));
                None
            }
        });

        Self {
            scene,
            host: PainterHost::new(),
            camera,
            input: Input::new(),
            clock: FrameClock::new(),
            settings_path: options.settings_path,
            autosave,
            remote,
            editor_text: String::new(),
            status_message,
            rotating: false,
            last_stats: FrameStats::default(),
        }
    }

    fn show_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    fn reload(&mut self) {
        self.scene.reset();
        self.show_status("Scene reloaded");
    }

    fn handle_keys(&mut self) {
        if self.input.key_pressed(KeyCode::Space) {
            let settings = self.scene.settings_mut();
            settings.orbit_enabled = !settings.orbit_enabled;
        }
        if self.input.key_pressed(KeyCode::T) {
            let settings = self.scene.settings_mut();
            settings.trail_mode = settings.trail_mode.toggled();
        }
        if self.input.key_pressed(KeyCode::R) {
            self.camera.reset();
        }
        if self.input.key_pressed(KeyCode::Escape) {
            self.scene.release_all();
        }
    }

    fn handle_pointer(&mut self, response: &egui::Response) {
        let ray = self.camera.ray(self.input.pointer_ndc(), self.input.aspect());

        if self.input.pointer_pressed(PointerButton::Primary) && response.hovered() {
            self.rotating = !self.scene.pointer_down(&mut self.host, ray);
        }

        if self.input.pointer_held(PointerButton::Primary) {
            if self.scene.grabbed().is_some() {
                self.scene.pointer_drag(ray);
            } else if self.rotating {
                let delta = self.input.pointer_delta();
                self.camera.rotate(-delta.x * ROTATE_SPEED, delta.y * ROTATE_SPEED);
            }
        }

        if self.input.pointer_released(PointerButton::Primary) {
            self.scene.pointer_up();
            self.rotating = false;
        }

        let scroll = self.input.scroll_delta();
        if scroll != 0.0 && response.hovered() {
            self.camera.zoom((-scroll * ZOOM_SPEED).exp());
        }
    }

    fn poll_remote(&mut self) {
        let Some(remote) = self.remote.as_mut() else {
            return;
        };
        let mut events = Vec::new();
        while let Some(event) = remote.poll() {
            events.push(event);
        }

        for event in events {
            match event {
                RemoteEvent::Fetched(Ok(text)) => {
                    let added = self.scene.add_texts(split_lines(&text));
                    self.editor_text = text;
                    self.show_status(format!("Fetched text, {} new labels", added));
                }
                RemoteEvent::Saved(Ok(())) => self.show_status("Text saved"),
                RemoteEvent::Fetched(Err(e)) | RemoteEvent::Saved(Err(e)) => {
                    tracing::warn!("text store request failed: {}", e);
                    self.show_status(e.to_string());
                }
            }
        }
    }

    fn autosave(&mut self, dt: f32) {
        self.scene.settings_mut().camera = self.camera.snapshot();
        match self.autosave.tick(self.scene.settings(), &self.settings_path, dt) {
            Ok(true) => tracing::debug!("saved settings to {}", self.settings_path.display()),
            Ok(false) => {}
            Err(e) => {
                tracing::warn!("could not save settings: {}", e);
                // Retry on the next interval, not every frame
                let settings = self.scene.settings().clone();
                self.autosave.mark_saved(&settings);
            }
        }
    }

    fn controls_panel(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let settings = self.scene.settings_mut();
            ui.checkbox(&mut settings.orbit_enabled, "Orbit");

            ui.separator();
            ui.checkbox(&mut settings.trails_visible, "Trails");
            egui::ComboBox::from_id_salt("trail_mode")
                .selected_text(match settings.trail_mode {
                    TrailMode::Full => "Full",
                    TrailMode::Partial => "Partial",
                })
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut settings.trail_mode, TrailMode::Partial, "Partial");
                    ui.selectable_value(&mut settings.trail_mode, TrailMode::Full, "Full");
                });

            ui.separator();
            ui.add(egui::Slider::new(&mut settings.visible_orbits, 0..=32).text("Orbits"));
            ui.add(egui::Slider::new(&mut settings.speed, SPEED_RANGE).text("Speed"));

            ui.separator();
            if ui.button("Reset camera").clicked() {
                self.camera.reset();
            }
            if ui.button("Release all").clicked() {
                self.scene.release_all();
            }
            if ui.button("Reload").clicked() {
                self.reload();
            }
        });
    }

    fn store_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Text store");
        let Some(remote) = self.remote.as_mut() else {
            ui.label("Not configured");
            return;
        };
        ui.label(egui::RichText::new(remote.base_url()).small().weak());
        ui.label("One label per line");

        egui::ScrollArea::vertical().max_height(400.0).show(ui, |ui| {
            ui.add(
                egui::TextEdit::multiline(&mut self.editor_text)
                    .desired_width(f32::INFINITY)
                    .desired_rows(12),
            );
        });

        ui.horizontal(|ui| {
            let idle = !remote.is_busy();
            if ui.add_enabled(idle, egui::Button::new("Fetch")).clicked() {
                remote.fetch();
            }
            if ui.add_enabled(idle, egui::Button::new("Save")).clicked() {
                remote.save(self.editor_text.clone());
            }
            if !idle {
                ui.spinner();
            }
        });
    }

    fn status_bar(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            if let Some((msg, time)) = &self.status_message {
                if time.elapsed().as_secs() < STATUS_TIMEOUT_SECS {
                    ui.label(msg);
                } else {
                    self.status_message = None;
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("{:.0} FPS", 1.0 / ctx.input(|i| i.stable_dt).max(1e-3)));
                ui.separator();
                ui.label(format!(
                    "{} labels, {} attracted",
                    self.last_stats.labels, self.last_stats.attracted
                ));
                if !self.scene.is_fully_loaded() {
                    ui.separator();
                    ui.label("loading...");
                }
            });
        });
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let dt = self.clock.advance(ctx.input(|i| i.stable_dt));

        self.input.begin_frame();
        let events = ctx.input(|i| i.events.clone());
        for event in &events {
            self.input.handle_egui_event(event);
        }
        if !ctx.wants_keyboard_input() {
            self.handle_keys();
        }
        self.poll_remote();

        egui::TopBottomPanel::top("controls").show(ctx, |ui| self.controls_panel(ui));

        egui::SidePanel::right("store")
            .default_width(260.0)
            .show(ctx, |ui| self.store_panel(ui));

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| self.status_bar(ui, ctx));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(BACKGROUND))
            .show(ctx, |ui| {
                let (response, painter) =
                    ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
                let rect = response.rect;
                self.input.set_viewport(
                    Vec2::new(rect.left(), rect.top()),
                    Vec2::new(rect.width(), rect.height()),
                );
                self.handle_pointer(&response);

                self.camera.update();
                self.last_stats = self.scene.frame(&mut self.host, self.clock.frame_scale(), dt);
                self.host.paint(&painter, rect, &self.camera);
            });

        self.autosave(dt);
        ctx.request_repaint();
    }
}
