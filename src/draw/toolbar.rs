use crate::draw::autohide::AutoHide;
use crate::draw::canvas::StrokeCanvas;
use crate::draw::model::{DrawColor, Tool};
use crate::draw::settings::RECENT_COLORS_CAP;
use std::time::Instant;

/// Number of recent colors offered as one-tap buttons.
pub const QUICK_COLOR_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolbarCommand {
    SelectTool(Tool),
    SelectColor(DrawColor),
    OpenColorPicker,
    ConfirmColorPicker,
    CancelColorPicker,
    Clear,
    Save,
}

/// Work the toolbar hands back to the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarEffect {
    None,
    SaveRequested,
}

#[derive(Debug, Clone)]
pub struct Toolbar {
    auto_hide: AutoHide,
    picker: Option<DrawColor>,
}

impl Toolbar {
    pub fn new(auto_hide_enabled: bool, now: Instant) -> Self {
        Self {
            auto_hide: AutoHide::new(auto_hide_enabled, now),
            picker: None,
        }
    }

    pub fn auto_hide(&self) -> &AutoHide {
        &self.auto_hide
    }

    pub fn opacity(&self, now: Instant) -> f32 {
        self.auto_hide.opacity(now)
    }

    /// Restores full opacity and restarts the hide timer.
    pub fn show_temporarily(&mut self, now: Instant) {
        self.auto_hide.touch(now);
    }

    pub fn is_picker_open(&self) -> bool {
        self.picker.is_some()
    }

    /// Color being edited in the open picker.
    pub fn picker_draft_mut(&mut self) -> Option<&mut DrawColor> {
        self.picker.as_mut()
    }

    pub fn is_tool_active(&self, canvas: &StrokeCanvas, tool: Tool) -> bool {
        canvas.tool() == tool
    }

    pub fn quick_colors(&self, canvas: &StrokeCanvas) -> Vec<String> {
        canvas.settings().read(|store| {
            store
                .recent_colors()
                .iter()
                .take(QUICK_COLOR_COUNT)
                .cloned()
                .collect()
        })
    }

    pub fn apply(
        &mut self,
        canvas: &mut StrokeCanvas,
        command: ToolbarCommand,
        now: Instant,
    ) -> ToolbarEffect {
        tracing::debug!(?command, "toolbar command");
        let effect = match command {
            ToolbarCommand::SelectTool(tool) => {
                canvas.set_tool(tool);
                ToolbarEffect::None
            }
            ToolbarCommand::SelectColor(color) => {
                select_color(canvas, color);
                ToolbarEffect::None
            }
            ToolbarCommand::OpenColorPicker => {
                self.picker = Some(canvas.settings().read(|store| store.pen_color()));
                ToolbarEffect::None
            }
            ToolbarCommand::ConfirmColorPicker => {
                if let Some(color) = self.picker.take() {
                    select_color(canvas, color);
                }
                ToolbarEffect::None
            }
            ToolbarCommand::CancelColorPicker => {
                self.picker = None;
                ToolbarEffect::None
            }
            ToolbarCommand::Clear => {
                canvas.clear_canvas();
                ToolbarEffect::None
            }
            ToolbarCommand::Save => ToolbarEffect::SaveRequested,
        };
        self.show_temporarily(now);
        effect
    }

    pub fn select_pen(&mut self, canvas: &mut StrokeCanvas, now: Instant) {
        self.apply(canvas, ToolbarCommand::SelectTool(Tool::Pen), now);
    }

    pub fn select_eraser(&mut self, canvas: &mut StrokeCanvas, now: Instant) {
        self.apply(canvas, ToolbarCommand::SelectTool(Tool::Eraser), now);
    }

    pub fn select_color(&mut self, canvas: &mut StrokeCanvas, color: DrawColor, now: Instant) {
        self.apply(canvas, ToolbarCommand::SelectColor(color), now);
    }

    pub fn clear(&mut self, canvas: &mut StrokeCanvas, now: Instant) {
        self.apply(canvas, ToolbarCommand::Clear, now);
    }

    pub fn save(&mut self, canvas: &mut StrokeCanvas, now: Instant) -> ToolbarEffect {
        self.apply(canvas, ToolbarCommand::Save, now)
    }
}

fn select_color(canvas: &mut StrokeCanvas, color: DrawColor) {
    canvas.set_pen_color(color);
    let hex = color.to_hex();
    canvas.settings().write(|store| {
        let mut recent = store.recent_colors().to_vec();
        push_recent_color(&mut recent, &hex);
        store.set_recent_colors(recent);
    });
}

/// Moves `hex` to the front (or inserts it there) and caps the list.
pub fn push_recent_color(colors: &mut Vec<String>, hex: &str) {
    colors.retain(|c| !c.eq_ignore_ascii_case(hex));
    colors.insert(0, hex.to_owned());
    colors.truncate(RECENT_COLORS_CAP);
}
