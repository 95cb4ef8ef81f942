use crate::draw::canvas::StrokeCanvas;
use crate::draw::model::{DrawColor, Tool};
use crate::draw::settings::ToolbarPosition;
use crate::draw::toolbar::{Toolbar, ToolbarCommand};
use eframe::egui::{self, Align2, Color32, Stroke};
use std::time::Instant;

const QUICK_COLOR_SIZE: f32 = 28.0;
const EDGE_MARGIN: f32 = 16.0;

fn anchor_for(position: ToolbarPosition) -> (Align2, egui::Vec2) {
    match position {
        ToolbarPosition::Top => (Align2::CENTER_TOP, egui::vec2(0.0, EDGE_MARGIN * 4.0)),
        ToolbarPosition::Bottom => (Align2::CENTER_BOTTOM, egui::vec2(0.0, -EDGE_MARGIN * 2.0)),
        ToolbarPosition::Left => (Align2::LEFT_CENTER, egui::vec2(EDGE_MARGIN, 0.0)),
        ToolbarPosition::Right => (Align2::RIGHT_CENTER, egui::vec2(-EDGE_MARGIN, 0.0)),
    }
}

pub fn to_color32(color: DrawColor) -> Color32 {
    let [r, g, b, a] = color.to_rgba8();
    Color32::from_rgba_unmultiplied(r, g, b, a)
}

pub fn from_color32(color: Color32) -> DrawColor {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    DrawColor::rgba(
        r as f64 / 255.0,
        g as f64 / 255.0,
        b as f64 / 255.0,
        a as f64 / 255.0,
    )
}

/// Draws the floating toolbar and returns the commands clicked this frame.
pub fn show_toolbar(
    ctx: &egui::Context,
    toolbar: &Toolbar,
    canvas: &StrokeCanvas,
    position: ToolbarPosition,
    now: Instant,
) -> Vec<ToolbarCommand> {
    let mut commands = Vec::new();
    let (align, offset) = anchor_for(position);
    let vertical = matches!(position, ToolbarPosition::Left | ToolbarPosition::Right);
    let opacity = toolbar.opacity(now);
    let quick_colors = toolbar.quick_colors(canvas);

    egui::Area::new(egui::Id::new("overlay_toolbar"))
        .anchor(align, offset)
        .show(ctx, |ui| {
            ui.set_opacity(opacity);
            egui::Frame::popup(ui.style())
                .rounding(12.0)
                .show(ui, |ui| {
                    let contents = |ui: &mut egui::Ui| {
                        for (tool, label) in [(Tool::Pen, "✏ Pen"), (Tool::Eraser, "⌫ Eraser")] {
                            let active = toolbar.is_tool_active(canvas, tool);
                            if ui.selectable_label(active, label).clicked() {
                                commands.push(ToolbarCommand::SelectTool(tool));
                            }
                        }
                        ui.separator();
                        for hex in &quick_colors {
                            let Some(color) = DrawColor::from_hex(hex) else {
                                continue;
                            };
                            let button = egui::Button::new("")
                                .fill(to_color32(color))
                                .stroke(Stroke::new(1.0, Color32::BLACK))
                                .min_size(egui::vec2(QUICK_COLOR_SIZE, QUICK_COLOR_SIZE));
                            if ui.add(button).on_hover_text(hex.as_str()).clicked() {
                                commands.push(ToolbarCommand::SelectColor(color));
                            }
                        }
                        if ui.button("🎨").on_hover_text("More colors").clicked() {
                            commands.push(ToolbarCommand::OpenColorPicker);
                        }
                        ui.separator();
                        if ui.button("🗑 Clear").clicked() {
                            commands.push(ToolbarCommand::Clear);
                        }
                        if ui.button("💾 Save").clicked() {
                            commands.push(ToolbarCommand::Save);
                        }
                    };
                    if vertical {
                        ui.vertical(contents);
                    } else {
                        ui.horizontal(contents);
                    }
                });
        });
    commands
}

/// Modal-style picker window; edits the toolbar's draft color in place.
pub fn show_color_picker(ctx: &egui::Context, toolbar: &mut Toolbar) -> Option<ToolbarCommand> {
    let draft = toolbar.picker_draft_mut()?;
    let mut command = None;
    let mut color = to_color32(*draft);

    egui::Window::new("Pick a color")
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            egui::color_picker::color_picker_color32(
                ui,
                &mut color,
                egui::color_picker::Alpha::Opaque,
            );
            ui.horizontal(|ui| {
                if ui.button("OK").clicked() {
                    command = Some(ToolbarCommand::ConfirmColorPicker);
                }
                if ui.button("Cancel").clicked() {
                    command = Some(ToolbarCommand::CancelColorPicker);
                }
            });
        });

    *draft = from_color32(color);
    command
}
