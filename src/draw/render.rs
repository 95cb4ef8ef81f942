use crate::draw::composite::{Rgba, RgbaBuffer};
use crate::draw::model::{CanvasModel, Stroke, Tool, FLAT_FILL};

/// Snapped coordinates and brush radii stay within this magnitude so rect
/// arithmetic cannot overflow `i32`.
const COORD_LIMIT: i32 = 1 << 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl DirtyRect {
    pub fn from_points(a: (i32, i32), b: (i32, i32), pad: i32) -> Self {
        let min_x = a.0.min(b.0) - pad;
        let max_x = a.0.max(b.0) + pad;
        let min_y = a.1.min(b.1) - pad;
        let max_y = a.1.max(b.1) + pad;
        Self {
            x: min_x,
            y: min_y,
            width: (max_x - min_x + 1).max(1),
            height: (max_y - min_y + 1).max(1),
        }
    }

    pub fn union(self, other: DirtyRect) -> DirtyRect {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = (self.x + self.width).max(other.x + other.width);
        let max_y = (self.y + self.height).max(other.y + other.height);
        DirtyRect {
            x: min_x,
            y: min_y,
            width: (max_x - min_x).max(1),
            height: (max_y - min_y).max(1),
        }
    }

    pub fn clamp(self, width: u32, height: u32) -> Option<DirtyRect> {
        let max_w = width as i32;
        let max_h = height as i32;
        let x0 = self.x.clamp(0, max_w);
        let y0 = self.y.clamp(0, max_h);
        let x1 = (self.x + self.width).clamp(0, max_w);
        let y1 = (self.y + self.height).clamp(0, max_h);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(DirtyRect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }
}

/// What sits behind the strokes: the installed capture stretched to the canvas,
/// or the flat fill.
pub fn backdrop_layer(canvas: &CanvasModel, size: (u32, u32)) -> RgbaBuffer {
    match canvas.background() {
        Some(bg) => bg.pixels.scaled_to(size.0, size.1),
        None => RgbaBuffer::new(size.0, size.1, Rgba::from(FLAT_FILL)),
    }
}

pub fn render_canvas_to_rgba(canvas: &CanvasModel, size: (u32, u32)) -> RgbaBuffer {
    let backdrop = backdrop_layer(canvas, size);
    let mut frame = backdrop.clone();
    for stroke in canvas.strokes() {
        paint_stroke(&mut frame, &backdrop, stroke);
    }
    frame
}

/// Keeps the backdrop and committed strokes cached per canvas revision so only
/// the in-progress stroke is repainted while the pointer moves.
#[derive(Debug, Default)]
pub struct LayeredRenderer {
    layers: Option<CachedLayers>,
    composed: Option<RgbaBuffer>,
    #[cfg(test)]
    committed_rebuild_count: usize,
}

#[derive(Debug)]
struct CachedLayers {
    revision: u64,
    backdrop: RgbaBuffer,
    committed: RgbaBuffer,
}

impl CachedLayers {
    fn build(canvas: &CanvasModel, size: (u32, u32), revision: u64) -> Self {
        let backdrop = backdrop_layer(canvas, size);
        let mut committed = backdrop.clone();
        for stroke in canvas.strokes() {
            paint_stroke(&mut committed, &backdrop, stroke);
        }
        Self {
            revision,
            backdrop,
            committed,
        }
    }
}

impl LayeredRenderer {
    pub fn render(
        &mut self,
        canvas: &CanvasModel,
        active: Option<&Stroke>,
        size: (u32, u32),
        revision: u64,
    ) -> &RgbaBuffer {
        let stale = self
            .layers
            .as_ref()
            .map_or(true, |l| l.revision != revision || l.committed.size() != size);
        if stale {
            self.layers = Some(CachedLayers::build(canvas, size, revision));
            #[cfg(test)]
            {
                self.committed_rebuild_count += 1;
            }
        }
        let layers = self
            .layers
            .get_or_insert_with(|| CachedLayers::build(canvas, size, revision));

        let composed = self
            .composed
            .get_or_insert_with(|| layers.committed.clone());
        if composed.size() == layers.committed.size() {
            composed.pixels.copy_from_slice(&layers.committed.pixels);
        } else {
            *composed = layers.committed.clone();
        }

        if let Some(stroke) = active {
            paint_stroke(composed, &layers.backdrop, stroke);
        }
        composed
    }

    #[cfg(test)]
    pub fn committed_rebuild_count(&self) -> usize {
        self.committed_rebuild_count
    }
}

/// Pen strokes blend their color over the frame; eraser strokes copy the
/// backdrop back in. Each covered pixel is touched once per stroke, so a
/// translucent pen does not darken where brush stamps overlap.
pub fn paint_stroke(frame: &mut RgbaBuffer, backdrop: &RgbaBuffer, stroke: &Stroke) {
    let Some(mask) = StrokeMask::rasterize(stroke, frame.size()) else {
        return;
    };
    let color = Rgba::from(stroke.style.color);
    for (x, y) in mask.covered() {
        match stroke.tool {
            Tool::Pen => frame.blend_pixel(x, y, color),
            Tool::Eraser => frame.put_pixel(x, y, backdrop.pixel(x, y)),
        }
    }
}

/// Area a stroke can touch when painted into a frame of `size`.
pub fn stroke_bounds(stroke: &Stroke, size: (u32, u32)) -> Option<DirtyRect> {
    let radius = brush_radius(stroke.style.width, size);
    let mut points = stroke.points.iter().map(|&p| snap(p));
    let first = points.next()?;
    let mut rect = DirtyRect::from_points(first, first, radius + 1);
    for point in points {
        rect = rect.union(DirtyRect::from_points(point, point, radius + 1));
    }
    Some(rect)
}

fn snap(point: (f32, f32)) -> (i32, i32) {
    let axis = |v: f32| (v.round() as i32).clamp(-COORD_LIMIT, COORD_LIMIT);
    (axis(point.0), axis(point.1))
}

/// Capped at `width + height`, past which a brush centred inside the frame
/// already covers all of it.
fn brush_radius(width: f32, size: (u32, u32)) -> i32 {
    let cap = size.0.saturating_add(size.1).min(COORD_LIMIT as u32) as f64;
    let radius = ((width as f64).max(1.0) - 1.0) / 2.0;
    radius.round().min(cap) as i32
}

struct StrokeMask {
    rect: DirtyRect,
    bits: Vec<bool>,
}

impl StrokeMask {
    fn rasterize(stroke: &Stroke, size: (u32, u32)) -> Option<Self> {
        let rect = stroke_bounds(stroke, size)?.clamp(size.0, size.1)?;
        let mut mask = Self {
            rect,
            bits: vec![false; (rect.width as usize) * (rect.height as usize)],
        };
        let brush = BrushMask::new(brush_radius(stroke.style.width, size));
        let points: Vec<(i32, i32)> = stroke.points.iter().map(|&p| snap(p)).collect();
        match points.as_slice() {
            [] => return None,
            [only] => mask.stamp(&brush, *only),
            _ => {
                for segment in points.windows(2) {
                    mask.segment(&brush, segment[0], segment[1]);
                }
            }
        }
        Some(mask)
    }

    fn stamp(&mut self, brush: &BrushMask, center: (i32, i32)) {
        let rect = self.rect;
        for row in &brush.rows {
            let y = center.1 + row.dy;
            if y < rect.y || y >= rect.y + rect.height {
                continue;
            }
            let x0 = (center.0 + row.min_dx).max(rect.x);
            let x1 = (center.0 + row.max_dx).min(rect.x + rect.width - 1);
            if x0 > x1 {
                continue;
            }
            let start = ((y - rect.y) * rect.width + (x0 - rect.x)) as usize;
            let end = start + (x1 - x0) as usize;
            self.bits[start..=end].fill(true);
        }
    }

    /// Bresenham walk stamping the round brush at every step.
    fn segment(&mut self, brush: &BrushMask, start: (i32, i32), end: (i32, i32)) {
        let (mut x0, mut y0) = start;
        let (x1, y1) = end;
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.stamp(brush, (x0, y0));
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn covered(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let rect = self.rect;
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, set)| **set)
            .map(move |(idx, _)| {
                let idx = idx as i32;
                (
                    (rect.x + idx % rect.width) as u32,
                    (rect.y + idx / rect.width) as u32,
                )
            })
    }
}

struct BrushMask {
    rows: Vec<BrushMaskRow>,
}

struct BrushMaskRow {
    dy: i32,
    min_dx: i32,
    max_dx: i32,
}

impl BrushMask {
    fn new(radius: i32) -> Self {
        let radius = radius.max(0);
        let r2 = i64::from(radius) * i64::from(radius);
        let mut rows = Vec::with_capacity(radius as usize * 2 + 1);
        for dy in -radius..=radius {
            let remaining = r2 - i64::from(dy) * i64::from(dy);
            let mut max_dx = (remaining as f64).sqrt() as i64;
            while max_dx * max_dx > remaining {
                max_dx -= 1;
            }
            while (max_dx + 1) * (max_dx + 1) <= remaining {
                max_dx += 1;
            }
            let max_dx = max_dx as i32;
            rows.push(BrushMaskRow {
                dy,
                min_dx: -max_dx,
                max_dx,
            });
        }
        Self { rows }
    }
}
