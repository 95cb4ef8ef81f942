use crate::draw::composite::RgbaBuffer;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Canvas-local coordinate of a pointer sample.
pub type CanvasPoint = (f32, f32);

/// Fill painted behind the strokes when no background capture is installed.
pub const FLAT_FILL: DrawColor = DrawColor::rgba(0.9, 0.9, 0.9, 1.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Pen,
    Eraser,
}

impl Tool {
    pub fn as_str(self) -> &'static str {
        match self {
            Tool::Pen => "pen",
            Tool::Eraser => "eraser",
        }
    }
}

/// Straight RGBA color with float channels in `[0, 1]`.
///
/// Serialized as a plain `[r, g, b, a]` array so the settings file stays a
/// flat key-value document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct DrawColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl DrawColor {
    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#RRGGBB` (the leading `#` is optional). Alpha is always opaque.
    pub fn from_hex(hex_color: &str) -> Option<Self> {
        let trimmed = hex_color.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if digits.len() != 6 {
            return None;
        }
        let bytes = hex::decode(digits).ok()?;
        Some(Self::rgba(
            bytes[0] as f64 / 255.0,
            bytes[1] as f64 / 255.0,
            bytes[2] as f64 / 255.0,
            1.0,
        ))
    }

    /// Formats as uppercase `#RRGGBB`, truncating each channel.
    pub fn to_hex(self) -> String {
        let [r, g, b, _] = self.clamped().to_array();
        format!(
            "#{}",
            hex::encode_upper([(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8])
        )
    }

    pub fn clamped(self) -> Self {
        Self::rgba(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
            self.a.clamp(0.0, 1.0),
        )
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let c = self.clamped();
        let q = |v: f64| (v * 255.0).round() as u8;
        [q(c.r), q(c.g), q(c.b), q(c.a)]
    }

    pub fn is_valid(self) -> bool {
        self.to_array()
            .iter()
            .all(|c| c.is_finite() && (0.0..=1.0).contains(c))
    }
}

impl From<[f64; 4]> for DrawColor {
    fn from(c: [f64; 4]) -> Self {
        Self::rgba(c[0], c[1], c[2], c[3])
    }
}

impl From<DrawColor> for [f64; 4] {
    fn from(c: DrawColor) -> Self {
        c.to_array()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub width: f32,
    pub color: DrawColor,
}

/// One pointer-down to pointer-up path. Tool and style are fixed when the
/// stroke is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub tool: Tool,
    pub style: StrokeStyle,
    pub points: Vec<CanvasPoint>,
}

impl Stroke {
    pub fn begin(tool: Tool, style: StrokeStyle, first: CanvasPoint) -> Self {
        Self {
            tool,
            style,
            points: vec![first],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundImage {
    pub source: Option<PathBuf>,
    pub pixels: RgbaBuffer,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderItem {
    Background(BackgroundImage),
    Stroke(Stroke),
}

/// Ordered render list. Background items are drawn first regardless of their
/// slot; strokes are drawn in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CanvasModel {
    pub items: Vec<RenderItem>,
}

impl CanvasModel {
    pub fn strokes(&self) -> impl Iterator<Item = &Stroke> {
        self.items.iter().filter_map(|item| match item {
            RenderItem::Stroke(stroke) => Some(stroke),
            RenderItem::Background(_) => None,
        })
    }

    pub fn background(&self) -> Option<&BackgroundImage> {
        self.items.iter().find_map(|item| match item {
            RenderItem::Background(bg) => Some(bg),
            RenderItem::Stroke(_) => None,
        })
    }

    pub fn stroke_count(&self) -> usize {
        self.strokes().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parses_with_and_without_hash() {
        assert_eq!(
            DrawColor::from_hex("#FF0000"),
            Some(DrawColor::rgba(1.0, 0.0, 0.0, 1.0))
        );
        assert_eq!(
            DrawColor::from_hex("00ff00"),
            Some(DrawColor::rgba(0.0, 1.0, 0.0, 1.0))
        );
        assert_eq!(DrawColor::from_hex("#12"), None);
        assert_eq!(DrawColor::from_hex("#GG0000"), None);
    }

    #[test]
    fn hex_needs_exactly_six_digits() {
        assert_eq!(DrawColor::from_hex("#FF0000junk"), None);
        assert_eq!(DrawColor::from_hex("#FF00001"), None);
        assert_eq!(DrawColor::from_hex("##FF0000"), None);
        assert_eq!(
            DrawColor::from_hex(" #00FF00 "),
            Some(DrawColor::rgba(0.0, 1.0, 0.0, 1.0))
        );
    }

    #[test]
    fn hex_formatting_truncates_channels() {
        assert_eq!(DrawColor::rgba(1.0, 0.0, 0.0, 1.0).to_hex(), "#FF0000");
        // 0.5 * 255 = 127.5 which truncates to 0x7F
        assert_eq!(DrawColor::rgba(0.5, 0.5, 0.5, 1.0).to_hex(), "#7F7F7F");
    }

    #[test]
    fn color_serializes_as_flat_array() {
        let json = serde_json::to_value(DrawColor::rgba(1.0, 0.0, 0.0, 1.0)).expect("serialize");
        assert_eq!(json, serde_json::json!([1.0, 0.0, 0.0, 1.0]));

        let decoded: DrawColor = serde_json::from_value(serde_json::json!([0, 1, 0, 1]))
            .expect("deserialize integer channels");
        assert_eq!(decoded, DrawColor::rgba(0.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn render_list_separates_background_and_strokes() {
        let stroke = Stroke::begin(
            Tool::Pen,
            StrokeStyle {
                width: 3.0,
                color: DrawColor::rgba(1.0, 0.0, 0.0, 1.0),
            },
            (1.0, 1.0),
        );
        let canvas = CanvasModel {
            items: vec![
                RenderItem::Stroke(stroke.clone()),
                RenderItem::Background(BackgroundImage {
                    source: None,
                    pixels: RgbaBuffer::new(1, 1, crate::draw::composite::Rgba::BLACK),
                }),
            ],
        };
        assert_eq!(canvas.stroke_count(), 1);
        assert_eq!(canvas.strokes().next(), Some(&stroke));
        assert!(canvas.background().is_some());
    }
}
