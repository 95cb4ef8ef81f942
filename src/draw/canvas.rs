use crate::draw::model::{
    BackgroundImage, CanvasModel, CanvasPoint, DrawColor, RenderItem, Stroke, StrokeStyle, Tool,
    FLAT_FILL,
};
use crate::draw::render::LayeredRenderer;
use crate::draw::composite::RgbaBuffer;
use crate::draw::settings_store::SharedSettings;

/// Freehand canvas driven by a single pointer.
///
/// The canvas is `Drawing` exactly while `active` holds a stroke. Committed
/// strokes and the optional background live in the render list; `revision`
/// changes whenever that list does.
pub struct StrokeCanvas {
    settings: SharedSettings,
    tool: Tool,
    active: Option<Stroke>,
    model: CanvasModel,
    size: (f32, f32),
    revision: u64,
    renderer: LayeredRenderer,
}

impl StrokeCanvas {
    pub fn new(settings: SharedSettings, size: (f32, f32)) -> Self {
        Self {
            settings,
            tool: Tool::Pen,
            active: None,
            model: CanvasModel::default(),
            size,
            revision: 0,
            renderer: LayeredRenderer::default(),
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn is_drawing(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_stroke(&self) -> Option<&Stroke> {
        self.active.as_ref()
    }

    pub fn model(&self) -> &CanvasModel {
        &self.model
    }

    pub fn strokes(&self) -> impl Iterator<Item = &Stroke> {
        self.model.strokes()
    }

    pub fn size(&self) -> (f32, f32) {
        self.size
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    pub fn resize(&mut self, size: (f32, f32)) {
        self.size = size;
    }

    pub fn contains(&self, point: CanvasPoint) -> bool {
        point.0 >= 0.0 && point.1 >= 0.0 && point.0 < self.size.0 && point.1 < self.size.1
    }

    /// Starts a stroke when the pointer lands inside the canvas. Returns
    /// whether the event was consumed.
    pub fn pointer_down(&mut self, point: CanvasPoint) -> bool {
        if self.active.is_some() || !self.contains(point) {
            return false;
        }
        let style = self.style_for(self.tool);
        tracing::debug!(tool = self.tool.as_str(), width = style.width, "stroke started");
        self.active = Some(Stroke::begin(self.tool, style, point));
        true
    }

    /// Appends in-bounds samples to the active stroke; anything else is dropped.
    pub fn pointer_move(&mut self, point: CanvasPoint) -> bool {
        if !self.contains(point) {
            return false;
        }
        match self.active.as_mut() {
            Some(stroke) => {
                stroke.points.push(point);
                true
            }
            None => false,
        }
    }

    /// Finalizes the active stroke regardless of where the pointer was
    /// released.
    pub fn pointer_up(&mut self, _point: CanvasPoint) -> bool {
        let Some(stroke) = self.active.take() else {
            return false;
        };
        tracing::debug!(points = stroke.points.len(), "stroke committed");
        self.model.items.push(RenderItem::Stroke(stroke));
        self.bump_revision();
        true
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    /// Persists the pen color; strokes already started keep their own color.
    pub fn set_pen_color(&mut self, color: DrawColor) {
        self.settings.write(|store| store.set_pen_color(color));
    }

    /// Drops committed and in-progress strokes, keeping the background.
    pub fn clear_canvas(&mut self) {
        self.active = None;
        let before = self.model.items.len();
        self.model
            .items
            .retain(|item| matches!(item, RenderItem::Background(_)));
        if self.model.items.len() != before {
            self.bump_revision();
        }
    }

    /// Installs (or replaces) the background capture behind the strokes.
    pub fn set_background(&mut self, background: BackgroundImage) {
        self.model
            .items
            .retain(|item| !matches!(item, RenderItem::Background(_)));
        self.model.items.insert(0, RenderItem::Background(background));
        self.bump_revision();
    }

    pub fn has_background(&self) -> bool {
        self.model.background().is_some()
    }

    /// Frame with the backdrop, committed strokes and the stroke in progress.
    pub fn render(&mut self, pixel_size: (u32, u32)) -> &RgbaBuffer {
        self.renderer
            .render(&self.model, self.active.as_ref(), pixel_size, self.revision)
    }

    fn style_for(&self, tool: Tool) -> StrokeStyle {
        self.settings.read(|store| match tool {
            Tool::Pen => StrokeStyle {
                width: store.pen_thickness() as f32,
                color: store.pen_color(),
            },
            Tool::Eraser => StrokeStyle {
                width: store.eraser_thickness() as f32,
                color: FLAT_FILL,
            },
        })
    }

    fn bump_revision(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::composite::Rgba;
    use crate::draw::settings_store::SettingsStore;

    fn canvas() -> (tempfile::TempDir, StrokeCanvas) {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = SettingsStore::load(dir.path().join("settings.json"));
        let canvas = StrokeCanvas::new(SharedSettings::new(store), (100.0, 100.0));
        (dir, canvas)
    }

    #[test]
    fn down_move_up_commits_points_in_order() {
        let (_dir, mut canvas) = canvas();
        assert!(canvas.pointer_down((10.0, 10.0)));
        assert!(canvas.is_drawing());
        canvas.pointer_move((20.0, 10.0));
        canvas.pointer_move((30.0, 10.0));
        canvas.pointer_up((30.0, 10.0));

        assert!(!canvas.is_drawing());
        let strokes: Vec<_> = canvas.strokes().collect();
        assert_eq!(strokes.len(), 1);
        assert_eq!(
            strokes[0].points,
            vec![(10.0, 10.0), (20.0, 10.0), (30.0, 10.0)]
        );
        assert_eq!(strokes[0].tool, Tool::Pen);
        assert_eq!(strokes[0].style.width, 3.0);
        assert_eq!(strokes[0].style.color, DrawColor::rgba(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn down_outside_bounds_is_ignored() {
        let (_dir, mut canvas) = canvas();
        assert!(!canvas.pointer_down((-1.0, 5.0)));
        assert!(!canvas.pointer_down((100.0, 5.0)));
        assert!(!canvas.is_drawing());
        canvas.pointer_up((5.0, 5.0));
        assert_eq!(canvas.strokes().count(), 0);
    }

    #[test]
    fn out_of_bounds_moves_are_dropped_and_up_outside_still_commits() {
        let (_dir, mut canvas) = canvas();
        canvas.pointer_down((50.0, 50.0));
        canvas.pointer_move((150.0, 50.0));
        canvas.pointer_move((60.0, 50.0));
        canvas.pointer_up((500.0, 500.0));

        let stroke = canvas.strokes().next().expect("stroke");
        assert_eq!(stroke.points, vec![(50.0, 50.0), (60.0, 50.0)]);
        assert!(!canvas.is_drawing());
    }

    #[test]
    fn second_down_while_drawing_does_not_start_another_stroke() {
        let (_dir, mut canvas) = canvas();
        canvas.pointer_down((1.0, 1.0));
        assert!(!canvas.pointer_down((2.0, 2.0)));
        canvas.pointer_up((2.0, 2.0));
        assert_eq!(canvas.strokes().count(), 1);
        assert_eq!(canvas.strokes().next().map(|s| s.points.len()), Some(1));
    }

    #[test]
    fn color_change_mid_stroke_only_affects_later_strokes() {
        let (_dir, mut canvas) = canvas();
        canvas.pointer_down((1.0, 1.0));
        canvas.set_pen_color(DrawColor::rgba(0.0, 0.0, 1.0, 1.0));
        canvas.set_tool(Tool::Eraser);
        canvas.pointer_move((2.0, 2.0));
        canvas.pointer_up((2.0, 2.0));

        canvas.set_tool(Tool::Pen);
        canvas.pointer_down((3.0, 3.0));
        canvas.pointer_up((3.0, 3.0));

        let strokes: Vec<_> = canvas.strokes().collect();
        assert_eq!(strokes[0].tool, Tool::Pen);
        assert_eq!(strokes[0].style.color, DrawColor::rgba(1.0, 0.0, 0.0, 1.0));
        assert_eq!(strokes[1].style.color, DrawColor::rgba(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn eraser_strokes_use_eraser_width_and_flat_fill() {
        let (_dir, mut canvas) = canvas();
        canvas.set_tool(Tool::Eraser);
        canvas.pointer_down((5.0, 5.0));
        canvas.pointer_up((5.0, 5.0));
        let stroke = canvas.strokes().next().expect("stroke");
        assert_eq!(stroke.tool, Tool::Eraser);
        assert_eq!(stroke.style.width, 15.0);
        assert_eq!(stroke.style.color, FLAT_FILL);
    }

    #[test]
    fn clear_is_idempotent_and_keeps_background() {
        let (_dir, mut canvas) = canvas();
        canvas.set_background(BackgroundImage {
            source: None,
            pixels: RgbaBuffer::new(2, 2, Rgba::BLACK),
        });
        canvas.pointer_down((1.0, 1.0));
        canvas.pointer_up((1.0, 1.0));
        canvas.pointer_down((2.0, 2.0));

        canvas.clear_canvas();
        let once = canvas.model().clone();
        let revision = canvas.revision();
        canvas.clear_canvas();

        assert_eq!(canvas.model(), &once);
        assert_eq!(canvas.revision(), revision);
        assert!(!canvas.is_drawing());
        assert_eq!(canvas.strokes().count(), 0);
        assert!(canvas.has_background());
    }

    #[test]
    fn tool_toggle_without_pointer_events_leaves_render_list_alone() {
        let (_dir, mut canvas) = canvas();
        canvas.pointer_down((1.0, 1.0));
        canvas.pointer_up((1.0, 1.0));
        let before = canvas.model().clone();

        canvas.set_tool(Tool::Eraser);
        canvas.set_tool(Tool::Pen);

        assert_eq!(canvas.model(), &before);
    }

    #[test]
    fn background_is_installed_without_discarding_strokes() {
        let (_dir, mut canvas) = canvas();
        canvas.pointer_down((1.0, 1.0));
        canvas.pointer_up((1.0, 1.0));
        let revision = canvas.revision();

        canvas.set_background(BackgroundImage {
            source: None,
            pixels: RgbaBuffer::new(2, 2, Rgba::BLACK),
        });
        canvas.set_background(BackgroundImage {
            source: None,
            pixels: RgbaBuffer::new(3, 3, Rgba::BLACK),
        });

        assert_eq!(canvas.strokes().count(), 1);
        assert_eq!(canvas.model().background().map(|b| b.pixels.width), Some(3));
        assert!(canvas.revision() > revision);
    }

    #[test]
    fn render_includes_the_stroke_in_progress() {
        let (_dir, mut canvas) = canvas();
        canvas.resize((10.0, 10.0));
        canvas.pointer_down((5.0, 5.0));
        let frame = canvas.render((10, 10));
        assert_eq!(frame.pixel(5, 5), Rgba::new(255, 0, 0, 255));
    }
}
