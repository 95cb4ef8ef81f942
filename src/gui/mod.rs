mod toolbar_panel;

use crate::draw::canvas::StrokeCanvas;
use crate::draw::capture::{CapturePoll, CaptureProvider, PendingCapture};
use crate::draw::save::save_annotation;
use crate::draw::settings_store::SharedSettings;
use crate::draw::toolbar::{Toolbar, ToolbarEffect};
use eframe::egui::{self, Align2, Color32, PointerButton, Pos2, Rect, Sense};
use egui_toast::{Toast, ToastKind, ToastOptions, Toasts};
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub const WINDOW_TITLE: &str = "PreTools Overlay Style";
pub const WINDOW_SIZE: [f32; 2] = [360.0, 640.0];

/// Delay between the first frame and the background capture request.
pub const CAPTURE_START_DELAY: Duration = Duration::from_millis(100);
const SAVE_TOAST_SECONDS: f64 = 1.5;
const ACTIVE_REPAINT: Duration = Duration::from_millis(16);

const HELP_TEXT: &str = "Drawing over other apps\n(a captured background plus annotations)";

enum CaptureState {
    Waiting,
    Pending(PendingCapture),
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UploadedFrame {
    revision: u64,
    size: (u32, u32),
    active_points: Option<usize>,
}

pub struct OverlayApp {
    canvas: StrokeCanvas,
    toolbar: Toolbar,
    capture: Box<dyn CaptureProvider>,
    capture_state: CaptureState,
    first_frame: Option<Instant>,
    texture: Option<egui::TextureHandle>,
    uploaded: Option<UploadedFrame>,
    toasts: Toasts,
    export_dir: PathBuf,
}

impl OverlayApp {
    pub fn new(
        settings: SharedSettings,
        capture: Box<dyn CaptureProvider>,
        export_dir: PathBuf,
    ) -> Self {
        let auto_hide = settings.read(|store| store.auto_hide_toolbar());
        let canvas = StrokeCanvas::new(settings, (WINDOW_SIZE[0], WINDOW_SIZE[1]));
        Self {
            canvas,
            toolbar: Toolbar::new(auto_hide, Instant::now()),
            capture,
            capture_state: CaptureState::Waiting,
            first_frame: None,
            texture: None,
            uploaded: None,
            toasts: Toasts::new()
                .anchor(Align2::CENTER_TOP, [0.0, 48.0])
                .direction(egui::Direction::TopDown),
            export_dir,
        }
    }

    fn poll_capture(&mut self, now: Instant) {
        let first_frame = *self.first_frame.get_or_insert(now);
        let state = std::mem::replace(&mut self.capture_state, CaptureState::Finished);
        self.capture_state = match state {
            CaptureState::Waiting if now.duration_since(first_frame) >= CAPTURE_START_DELAY => {
                tracing::debug!("requesting background capture");
                self.resolve_capture(self.capture.acquire_background(), now)
            }
            CaptureState::Pending(pending) => self.resolve_capture(pending, now),
            other => other,
        };
    }

    fn resolve_capture(&mut self, pending: PendingCapture, now: Instant) -> CaptureState {
        match pending.poll(now) {
            CapturePoll::Pending(pending) => CaptureState::Pending(pending),
            CapturePoll::Ready(Some(background)) => {
                self.canvas.set_background(background);
                CaptureState::Finished
            }
            CapturePoll::Ready(None) => {
                tracing::info!("drawing without a background capture");
                CaptureState::Finished
            }
        }
    }

    fn handle_pointer(&mut self, ctx: &egui::Context, response: &egui::Response) {
        let origin = response.rect.min;
        let to_canvas = |pos: Pos2| {
            let local = pos - origin;
            (local.x, local.y)
        };

        if response.drag_started_by(PointerButton::Primary) {
            if let Some(pos) = ctx.input(|i| i.pointer.press_origin()) {
                self.canvas.pointer_down(to_canvas(pos));
            }
        } else if response.dragged_by(PointerButton::Primary) {
            let moved = ctx.input(|i| i.pointer.delta() != egui::Vec2::ZERO);
            if moved {
                if let Some(pos) = response.interact_pointer_pos() {
                    self.canvas.pointer_move(to_canvas(pos));
                }
            }
        }

        if response.drag_stopped_by(PointerButton::Primary) {
            let pos = ctx
                .input(|i| i.pointer.interact_pos())
                .unwrap_or(origin);
            self.canvas.pointer_up(to_canvas(pos));
        }
    }

    fn paint_canvas(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::drag());
        let size = response.rect.size();
        self.canvas.resize((size.x, size.y));
        self.handle_pointer(ctx, &response);

        let pixel_size = (size.x.round().max(1.0) as u32, size.y.round().max(1.0) as u32);
        let frame_key = UploadedFrame {
            revision: self.canvas.revision(),
            size: pixel_size,
            active_points: self.canvas.active_stroke().map(|s| s.points.len()),
        };
        if self.uploaded != Some(frame_key) || self.texture.is_none() {
            let frame = self.canvas.render(pixel_size);
            let image = egui::ColorImage::from_rgba_unmultiplied(
                [frame.width as usize, frame.height as usize],
                &frame.pixels,
            );
            match self.texture.as_mut() {
                Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                None => {
                    self.texture =
                        Some(ctx.load_texture("overlay_canvas", image, egui::TextureOptions::LINEAR))
                }
            }
            self.uploaded = Some(frame_key);
        }

        if let Some(texture) = &self.texture {
            painter.image(
                texture.id(),
                response.rect,
                Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }
    }

    fn save(&mut self) {
        let size = self.canvas.size();
        let pixel_size = (size.0.round().max(1.0) as u32, size.1.round().max(1.0) as u32);
        match save_annotation(
            self.canvas.model(),
            pixel_size,
            &self.export_dir,
            chrono::Local::now(),
        ) {
            Ok(_) => push_toast(
                &mut self.toasts,
                Toast {
                    text: "Annotation saved!".into(),
                    kind: ToastKind::Success,
                    options: ToastOptions::default().duration_in_seconds(SAVE_TOAST_SECONDS),
                },
            ),
            Err(err) => {
                tracing::error!(?err, "failed to save annotation");
                push_toast(
                    &mut self.toasts,
                    Toast {
                        text: format!("Failed to save annotation: {err}").into(),
                        kind: ToastKind::Error,
                        options: ToastOptions::default().duration_in_seconds(3.0),
                    },
                );
            }
        }
    }

    fn schedule_repaint(&self, ctx: &egui::Context, now: Instant) {
        let capture_due = match (&self.capture_state, self.first_frame) {
            (CaptureState::Waiting, Some(first)) => {
                Some((first + CAPTURE_START_DELAY).saturating_duration_since(now))
            }
            (CaptureState::Pending(_), _) => Some(ACTIVE_REPAINT),
            _ => None,
        };
        let drawing = self.canvas.is_drawing().then_some(ACTIVE_REPAINT);
        let fade = self.toolbar.auto_hide().next_change_in(now);
        if let Some(after) = [capture_due, drawing, fade].into_iter().flatten().min() {
            ctx.request_repaint_after(after);
        }
    }
}

fn push_toast(toasts: &mut Toasts, toast: Toast) {
    tracing::debug!(text = toast.text.text(), "toast");
    toasts.add(toast);
}

impl eframe::App for OverlayApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.poll_capture(now);

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| self.paint_canvas(ctx, ui));

        egui::Area::new(egui::Id::new("overlay_help"))
            .anchor(Align2::LEFT_TOP, [8.0, 8.0])
            .interactable(false)
            .show(ctx, |ui| {
                ui.label(egui::RichText::new(HELP_TEXT).small().color(Color32::DARK_GRAY));
            });

        egui::Area::new(egui::Id::new("overlay_exit"))
            .anchor(Align2::RIGHT_TOP, [-8.0, 8.0])
            .show(ctx, |ui| {
                let exit = egui::Button::new("❌")
                    .fill(Color32::from_rgba_unmultiplied(255, 77, 77, 204))
                    .min_size(egui::vec2(40.0, 40.0));
                if ui.add(exit).clicked() {
                    tracing::info!("overlay closed");
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });

        let position = self.canvas.settings().read(|store| store.settings().toolbar_position);
        let mut commands =
            toolbar_panel::show_toolbar(ctx, &self.toolbar, &self.canvas, position, now);
        commands.extend(toolbar_panel::show_color_picker(ctx, &mut self.toolbar));
        for command in commands {
            if self.toolbar.apply(&mut self.canvas, command, now) == ToolbarEffect::SaveRequested {
                self.save();
            }
        }

        self.toasts.show(ctx);
        self.schedule_repaint(ctx, now);
    }
}
