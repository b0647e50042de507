//! Interactive particle field viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which hosts a [`FieldEngine`] the way a
//! web page hosts its canvas: it reports the canvas geometry, forwards
//! pointer moves to the shared [`PointerTracker`], drives the engine's frame
//! scheduler from egui's clock, and paints the engine's display list.

use eframe::App;
use field_core::{
    color::Rgba,
    config::FieldConfig,
    engine::FieldEngine,
    pointer::PointerTracker,
    scheduler::{ManualScheduler, RESIZE_DEBOUNCE},
    surface::{Canvas, DrawnCircle},
    types::Viewport,
};
use glam::Vec2;
use rand::{SeedableRng, rngs::StdRng};
use std::time::Duration;

type Engine = FieldEngine<Canvas, ManualScheduler>;

/// Main application state for the viewer.
///
/// ### Fields
/// - `engine` - The mounted field; `None` until the canvas has been measured.
/// - `pointer` - Pointer tracker shared with the engine.
/// - `cfg` - Configuration being edited in the side panel.
/// - `seed` - Optional seed making every (re)mount reproducible.
/// - `color_input` - Color text being typed; copied into `cfg` once committed.
///
/// - `running` - Whether frames are delivered to the engine.
/// - `viewport` - Canvas geometry last reported to the engine.
///
/// - `frames` - Number of frames delivered since start.
/// - `last_frame_time` - egui time of the last delivered frame.
/// - `last_frame_dt` - Time between the last two delivered frames (display only).
pub struct Viewer {
    engine: Option<Engine>,
    pointer: PointerTracker,
    cfg: FieldConfig,
    seed: Option<u64>,
    color_input: String,

    running: bool,
    viewport: Option<Viewport>,

    frames: u64,
    last_frame_time: f64,
    last_frame_dt: f64,
}

impl Viewer {
    /// Creates a viewer; the field is mounted on the first painted frame.
    pub fn new(cfg: FieldConfig, seed: Option<u64>) -> Self {
        Self {
            engine: None,
            pointer: PointerTracker::new(),
            color_input: cfg.color.clone(),
            cfg,
            seed,
            running: true,
            viewport: None,
            frames: 0,
            last_frame_time: 0.0,
            last_frame_dt: 0.0,
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// Tears down the current engine, if any, and mounts a new one.
    fn mount(&mut self, viewport: Viewport) {
        if let Some(mut old) = self.engine.take() {
            old.teardown();
        }
        self.engine = Some(FieldEngine::mount(
            self.cfg.clone(),
            viewport,
            Some(Canvas::default()),
            ManualScheduler::new(),
            self.rng(),
            &self.pointer,
        ));
        self.viewport = Some(viewport);
    }

    /// Re-mounts the field into the last known viewport.
    fn remount(&mut self) {
        if let Some(viewport) = self.viewport {
            self.mount(viewport);
        }
    }

    /// Reports the canvas geometry: mounts on first sight, then forwards
    /// changes as resize notifications.
    fn sync_viewport(&mut self, viewport: Viewport) {
        match self.engine.as_mut() {
            None => self.mount(viewport),
            Some(engine) => {
                if self.viewport != Some(viewport) {
                    engine.on_resize(viewport);
                    self.viewport = Some(viewport);
                }
            }
        }
    }

    /// Pushes edits from the config panel to the engine.
    fn apply_config(&mut self) {
        if let Some(engine) = self.engine.as_mut()
            && engine.config() != &self.cfg
        {
            engine.set_config(self.cfg.clone());
        }
    }

    /// Takes the typed color into the config. Called when the text box is
    /// left, so partial input never regenerates the pool.
    fn commit_color(&mut self) {
        if self.cfg.color != self.color_input {
            self.cfg.color = self.color_input.clone();
            self.apply_config();
        }
    }

    /// Bumps the refresh counter, regenerating the pool.
    fn refresh(&mut self) {
        self.cfg.refresh = self.cfg.refresh.wrapping_add(1);
        self.apply_config();
    }

    /// Delivers due timers and the pending frame at egui time `now`.
    ///
    /// Returns `true` if a frame ran.
    fn advance(&mut self, now: f64) -> bool {
        let Some(engine) = self.engine.as_mut() else {
            return false;
        };
        let ran = engine.pump(Duration::from_secs_f64(now.max(0.0)));
        if ran {
            if self.frames > 0 {
                self.last_frame_dt = now - self.last_frame_time;
            }
            self.last_frame_time = now;
            self.frames += 1;
        }
        ran
    }

    /// Delivers due timers only, so a paused field still follows resizes.
    ///
    /// Returns `true` while a timer is still waiting.
    fn idle(&mut self, now: f64) -> bool {
        let Some(engine) = self.engine.as_mut() else {
            return false;
        };
        engine.pump_timers(Duration::from_secs_f64(now.max(0.0)));
        engine.scheduler().pending_timers() > 0
    }

    /// Builds the top panel (run controls, refresh, remount).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                if ui.button("Step").clicked() {
                    let now = ctx.input(|i| i.time);
                    self.advance(now);
                }

                if ui.button("Refresh").clicked() {
                    self.refresh();
                }

                if ui.button("Remount").clicked() {
                    self.remount();
                }
            });
        });
    }

    /// Builds the bottom status bar.
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt last = {:.3} s", self.last_frame_dt));
                ui.label(format!("frames = {}", self.frames));
                ui.separator();
                if let Some(engine) = &self.engine {
                    let offset = engine.pointer_offset();
                    ui.label(format!("pointer = ({:.0}, {:.0})", offset.x, offset.y));
                    ui.label(format!("generation = {}", engine.generation()));
                    ui.label(format!("particles = {}", engine.particles().len()));
                }
            });
        });
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the right-hand panel for field parameters.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Field");

                ui.separator();
                ui.horizontal(|ui| {
                    ui.label("quantity:");
                    ui.add(
                        egui::DragValue::new(&mut self.cfg.quantity)
                            .range(0..=5000)
                            .speed(1.0),
                    );
                });
                Self::labeled_drag_f32(ui, "size:", &mut self.cfg.size, 0.0..=10.0, 0.05);
                ui.horizontal(|ui| {
                    ui.label("color:");
                    if ui.text_edit_singleline(&mut self.color_input).lost_focus() {
                        self.commit_color();
                    }
                });

                ui.separator();
                ui.label("Pointer attraction");
                Self::labeled_drag_f32(
                    ui,
                    "staticity:",
                    &mut self.cfg.staticity,
                    1.0..=500.0,
                    0.5,
                );
                Self::labeled_drag_f32(ui, "ease:", &mut self.cfg.ease, 1.0..=500.0, 0.5);

                ui.separator();
                ui.label("Drift bias");
                Self::labeled_drag_f32(ui, "vx:", &mut self.cfg.drift.x, -5.0..=5.0, 0.01);
                Self::labeled_drag_f32(ui, "vy:", &mut self.cfg.drift.y, -5.0..=5.0, 0.01);

                ui.separator();
                if let Err(e) = self.cfg.validate() {
                    ui.colored_label(egui::Color32::YELLOW, e.to_string());
                }
                if ui.button("Reset cfg to default").clicked() {
                    let refresh = self.cfg.refresh;
                    self.cfg = FieldConfig {
                        refresh,
                        ..FieldConfig::default()
                    };
                    self.color_input = self.cfg.color.clone();
                }
            });
    }

    /// Builds the central panel hosting the field.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                let response = ui.allocate_response(ui.available_size(), egui::Sense::hover());
                let rect = response.rect;
                let ppp = ctx.pixels_per_point();

                self.sync_viewport(viewport_for(rect, ppp));
                self.apply_config();

                if let Some(pos) = ctx.input(|i| i.pointer.latest_pos()) {
                    let page = Vec2::new(pos.x, pos.y);
                    if self.pointer.latest() != page {
                        self.pointer.notify_move(page);
                    }
                }

                if self.running {
                    let now = ctx.input(|i| i.time);
                    self.advance(now);
                    ctx.request_repaint();
                } else if self.idle(ctx.input(|i| i.time)) {
                    ctx.request_repaint_after(RESIZE_DEBOUNCE);
                }

                let painter = ui.painter_at(rect);
                if let Some(canvas) = self.engine.as_ref().and_then(|e| e.surface()) {
                    for circle in canvas.circles() {
                        let (center, radius) = device_to_screen(circle, rect, ppp);
                        painter.circle_filled(center, radius, to_color32(circle.color));
                    }
                }
            });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}

/// Canvas geometry for an egui rect, in points, at `ppp` pixels per point.
fn viewport_for(rect: egui::Rect, ppp: f32) -> Viewport {
    Viewport::new(
        Vec2::new(rect.width(), rect.height()),
        Vec2::new(rect.min.x, rect.min.y),
        ppp,
    )
}

/// Maps a display-list circle (device pixels, canvas-relative) to screen points.
fn device_to_screen(circle: &DrawnCircle, rect: egui::Rect, ppp: f32) -> (egui::Pos2, f32) {
    let local = circle.center / ppp;
    (
        egui::pos2(rect.min.x + local.x, rect.min.y + local.y),
        circle.radius / ppp,
    )
}

fn to_color32(color: Rgba) -> egui::Color32 {
    let a = (color.a.clamp(0.0, 1.0) * 255.0).round() as u8;
    egui::Color32::from_rgba_unmultiplied(color.r, color.g, color.b, a)
}
