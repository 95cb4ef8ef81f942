use crate::draw::model::DrawColor;
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub const RECENT_COLORS_CAP: usize = 6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ToolbarPosition {
    Top,
    Bottom,
    Left,
    Right,
}

/// Names of every persisted option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    PenColor,
    PenThickness,
    EraserThickness,
    RecentColors,
    ToolbarPosition,
    AutoHideToolbar,
}

impl SettingKey {
    pub const ALL: [SettingKey; 6] = [
        SettingKey::PenColor,
        SettingKey::PenThickness,
        SettingKey::EraserThickness,
        SettingKey::RecentColors,
        SettingKey::ToolbarPosition,
        SettingKey::AutoHideToolbar,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::PenColor => "pen_color",
            SettingKey::PenThickness => "pen_thickness",
            SettingKey::EraserThickness => "eraser_thickness",
            SettingKey::RecentColors => "recent_colors",
            SettingKey::ToolbarPosition => "toolbar_position",
            SettingKey::AutoHideToolbar => "auto_hide_toolbar",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        SettingKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| anyhow!("unknown setting key '{s}'"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverlaySettings {
    #[serde(default = "default_pen_color")]
    pub pen_color: DrawColor,
    #[serde(default = "default_pen_thickness", serialize_with = "serialize_number")]
    pub pen_thickness: f64,
    #[serde(default = "default_eraser_thickness", serialize_with = "serialize_number")]
    pub eraser_thickness: f64,
    /// Hex colors, most recent first.
    #[serde(default = "default_recent_colors")]
    pub recent_colors: Vec<String>,
    #[serde(default = "default_toolbar_position")]
    pub toolbar_position: ToolbarPosition,
    #[serde(default = "default_auto_hide_toolbar")]
    pub auto_hide_toolbar: bool,
}

fn default_pen_color() -> DrawColor {
    DrawColor::rgba(1.0, 0.0, 0.0, 1.0)
}

fn default_pen_thickness() -> f64 {
    3.0
}

fn default_eraser_thickness() -> f64 {
    15.0
}

fn default_recent_colors() -> Vec<String> {
    ["#FF0000", "#00FF00", "#0000FF", "#FFFF00", "#FF00FF", "#00FFFF"]
        .into_iter()
        .map(str::to_owned)
        .collect()
}

fn default_toolbar_position() -> ToolbarPosition {
    ToolbarPosition::Bottom
}

fn default_auto_hide_toolbar() -> bool {
    true
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            pen_color: default_pen_color(),
            pen_thickness: default_pen_thickness(),
            eraser_thickness: default_eraser_thickness(),
            recent_colors: default_recent_colors(),
            toolbar_position: default_toolbar_position(),
            auto_hide_toolbar: default_auto_hide_toolbar(),
        }
    }
}

impl OverlaySettings {
    /// Builds settings from a decoded JSON object one key at a time. Keys that
    /// are missing or fail validation keep their default; unknown keys are
    /// ignored. Returns the names of rejected keys.
    pub fn from_map(map: &Map<String, Value>) -> (Self, Vec<SettingKey>) {
        let mut settings = Self::default();
        let mut rejected = Vec::new();
        for key in SettingKey::ALL {
            let Some(value) = map.get(key.as_str()) else {
                continue;
            };
            let value = if key == SettingKey::RecentColors {
                truncate_recent_colors(value.clone())
            } else {
                value.clone()
            };
            if settings.apply_value(key, value).is_err() {
                rejected.push(key);
            }
        }
        (settings, rejected)
    }

    pub fn value_of(&self, key: SettingKey) -> Value {
        match key {
            SettingKey::PenColor => serde_json::to_value(self.pen_color),
            SettingKey::PenThickness => Ok(number_value(self.pen_thickness)),
            SettingKey::EraserThickness => Ok(number_value(self.eraser_thickness)),
            SettingKey::RecentColors => serde_json::to_value(&self.recent_colors),
            SettingKey::ToolbarPosition => serde_json::to_value(self.toolbar_position),
            SettingKey::AutoHideToolbar => serde_json::to_value(self.auto_hide_toolbar),
        }
        .unwrap_or(Value::Null)
    }

    /// Validates and stores a single value. On error `self` is unchanged.
    pub fn apply_value(&mut self, key: SettingKey, value: Value) -> Result<()> {
        match key {
            SettingKey::PenColor => {
                let color: DrawColor = decode(key, value)?;
                if !color.is_valid() {
                    bail!("{key} channels must be within [0, 1]");
                }
                self.pen_color = color;
            }
            SettingKey::PenThickness => {
                self.pen_thickness = decode_thickness(key, value)?;
            }
            SettingKey::EraserThickness => {
                self.eraser_thickness = decode_thickness(key, value)?;
            }
            SettingKey::RecentColors => {
                let colors: Vec<String> = decode(key, value)?;
                if colors.len() > RECENT_COLORS_CAP {
                    bail!("{key} holds at most {RECENT_COLORS_CAP} entries");
                }
                if let Some(bad) = colors.iter().find(|c| DrawColor::from_hex(c).is_none()) {
                    bail!("{key} entry '{bad}' is not a #RRGGBB color");
                }
                self.recent_colors = colors;
            }
            SettingKey::ToolbarPosition => {
                self.toolbar_position = decode(key, value)?;
            }
            SettingKey::AutoHideToolbar => {
                self.auto_hide_toolbar = decode(key, value)?;
            }
        }
        Ok(())
    }
}

/// Whole numbers are written as JSON integers so `3` reads back as `3`.
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

fn serialize_number<S: serde::Serializer>(n: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    number_value(*n).serialize(serializer)
}

fn decode<T: serde::de::DeserializeOwned>(key: SettingKey, value: Value) -> Result<T> {
    serde_json::from_value(value).with_context(|| format!("invalid value for {key}"))
}

fn decode_thickness(key: SettingKey, value: Value) -> Result<f64> {
    let thickness: f64 = decode(key, value)?;
    if !thickness.is_finite() || thickness <= 0.0 {
        bail!("{key} must be a positive number");
    }
    Ok(thickness)
}

fn truncate_recent_colors(value: Value) -> Value {
    match value {
        Value::Array(mut colors) if colors.len() > RECENT_COLORS_CAP => {
            colors.truncate(RECENT_COLORS_CAP);
            Value::Array(colors)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_overlay_contract() {
        let settings = OverlaySettings::default();
        assert_eq!(settings.pen_color, DrawColor::rgba(1.0, 0.0, 0.0, 1.0));
        assert_eq!(settings.pen_thickness, 3.0);
        assert_eq!(settings.eraser_thickness, 15.0);
        assert_eq!(settings.value_of(SettingKey::PenThickness), json!(3));
        assert_eq!(settings.recent_colors.len(), 6);
        assert_eq!(settings.recent_colors[0], "#FF0000");
        assert_eq!(settings.recent_colors[1], "#00FF00");
        assert_eq!(settings.toolbar_position, ToolbarPosition::Bottom);
        assert!(settings.auto_hide_toolbar);
    }

    #[test]
    fn serde_roundtrip_uses_flat_keys() {
        let settings = OverlaySettings::default();
        let json = serde_json::to_value(&settings).expect("serialize settings");
        let object = json.as_object().expect("object");
        for key in SettingKey::ALL {
            assert!(object.contains_key(key.as_str()), "missing {key}");
        }
        assert_eq!(object.len(), SettingKey::ALL.len());
        let decoded: OverlaySettings = serde_json::from_value(json).expect("deserialize");
        assert_eq!(decoded, settings);
    }

    #[test]
    fn from_map_backfills_missing_and_ignores_unknown_keys() {
        let map = json!({ "pen_thickness": 8, "unknown_option": "x" });
        let (settings, rejected) = OverlaySettings::from_map(map.as_object().expect("object"));
        assert!(rejected.is_empty());
        assert_eq!(settings.pen_thickness, 8.0);
        assert_eq!(settings.eraser_thickness, 15.0);
    }

    #[test]
    fn from_map_rejects_wrong_typed_key_but_keeps_the_rest() {
        let map = json!({ "pen_thickness": "thick", "auto_hide_toolbar": false });
        let (settings, rejected) = OverlaySettings::from_map(map.as_object().expect("object"));
        assert_eq!(rejected, vec![SettingKey::PenThickness]);
        assert_eq!(settings.pen_thickness, 3.0);
        assert!(!settings.auto_hide_toolbar);
    }

    #[test]
    fn from_map_truncates_long_recent_color_lists() {
        let map = json!({
            "recent_colors": ["#000001", "#000002", "#000003", "#000004", "#000005", "#000006", "#000007"]
        });
        let (settings, rejected) = OverlaySettings::from_map(map.as_object().expect("object"));
        assert!(rejected.is_empty());
        assert_eq!(settings.recent_colors.len(), RECENT_COLORS_CAP);
        assert_eq!(settings.recent_colors[5], "#000006");
    }

    #[test]
    fn apply_value_validates_without_mutating_on_error() {
        let mut settings = OverlaySettings::default();
        assert!(settings
            .apply_value(SettingKey::PenThickness, json!(-1))
            .is_err());
        assert!(settings
            .apply_value(SettingKey::PenColor, json!([2.0, 0.0, 0.0, 1.0]))
            .is_err());
        assert!(settings
            .apply_value(SettingKey::RecentColors, json!(["red"]))
            .is_err());
        assert!(settings
            .apply_value(SettingKey::RecentColors, json!(["#FF0000junk"]))
            .is_err());
        assert_eq!(settings, OverlaySettings::default());

        settings
            .apply_value(SettingKey::ToolbarPosition, json!("left"))
            .expect("valid position");
        assert_eq!(settings.toolbar_position, ToolbarPosition::Left);
        assert_eq!(
            settings.value_of(SettingKey::ToolbarPosition),
            json!("left")
        );
    }

    #[test]
    fn setting_keys_parse_from_their_names() {
        for key in SettingKey::ALL {
            assert_eq!(key.as_str().parse::<SettingKey>().expect("parse"), key);
        }
        assert!("pen_width".parse::<SettingKey>().is_err());
    }
}
