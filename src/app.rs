// src/app.rs
use anyhow::Result;
use eframe::egui;
use image::RgbImage;

use crate::detector::LandmarkDetector;
use crate::pipeline::{FrameOutcome, PerformanceMetrics};
use crate::session::{DisplaySink, LoopState, Presentation, Session};
use crate::ui::{Theme, VideoView};
use crate::video::FrameSource;

/// Key that ends the session from the window.
pub const EXIT_KEY: egui::Key = egui::Key::Escape;

pub type BoxedSession = Session<Box<dyn FrameSource>, Box<dyn LandmarkDetector>>;

/// Sink used inside `update`: uploads the frame and watches for the exit key.
struct EguiSink<'a> {
    ctx: &'a egui::Context,
    view: &'a mut VideoView,
    exit_key: egui::Key,
    fps: &'a mut f32,
}

impl DisplaySink for EguiSink<'_> {
    fn present(
        &mut self,
        frame: &RgbImage,
        outcome: &FrameOutcome,
        metrics: &PerformanceMetrics,
    ) -> Presentation {
        self.view.update_frame(self.ctx, frame, outcome);
        *self.fps = metrics.avg_fps;

        if self.ctx.input(|i| i.key_pressed(self.exit_key)) {
            Presentation::ExitRequested
        } else {
            Presentation::Continue
        }
    }
}

pub struct PinchApp {
    session: BoxedSession,
    view: VideoView,
    theme: Theme,
    exit_key: egui::Key,
    fps: f32,
}

impl PinchApp {
    pub fn new(session: BoxedSession, exit_key: egui::Key) -> Self {
        Self {
            session,
            view: VideoView::new(),
            theme: Theme::default(),
            exit_key,
            fps: 0.0,
        }
    }

    fn render_header(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Hand Tracking");
                ui.separator();
                ui.label(format!("{:.1} fps", self.fps));
                ui.separator();
                ui.label(
                    egui::RichText::new(format!("{:?} to quit", self.exit_key))
                        .color(self.theme.text_secondary),
                );
            });
        });
    }

    fn render_recent(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("recent").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                ui.label("Recent:");
                for fired in self.view.recent() {
                    let name = fired
                        .path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    ui.colored_label(self.theme.marker, format!("{} {}", fired.key, name));
                }
            });
        });
    }
}

impl eframe::App for PinchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.session.state() != LoopState::Stopped {
            let mut sink = EguiSink {
                ctx,
                view: &mut self.view,
                exit_key: self.exit_key,
                fps: &mut self.fps,
            };
            if self.session.tick(&mut sink) == LoopState::Stopped {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        }

        self.render_header(ctx);
        self.render_recent(ctx);
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.background))
            .show(ctx, |ui| {
                ui.centered_and_justified(|ui| self.view.show(ui, &self.theme));
            });

        ctx.request_repaint();
    }
}

/// Opens the window and runs the session inside it until it closes.
pub fn run_window(session: BoxedSession, width: u32, height: u32) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width as f32 + 40.0, height as f32 + 100.0])
            .with_min_inner_size([320.0, 280.0]),
        centered: true,
        ..Default::default()
    };

    eframe::run_native(
        "Hand Tracking",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Box::new(PinchApp::new(session, EXIT_KEY))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Error running application: {}", e))
}
