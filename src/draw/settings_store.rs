use crate::draw::model::DrawColor;
use crate::draw::settings::{OverlaySettings, SettingKey};
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub const SETTINGS_DIR_NAME: &str = ".pretools_overlay";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

pub fn settings_dir_from_home(home: &Path) -> PathBuf {
    home.join(SETTINGS_DIR_NAME)
}

/// `~/.pretools_overlay`, or a folder under the temp dir when no home
/// directory can be resolved.
pub fn resolve_settings_dir() -> PathBuf {
    match dirs_next::home_dir() {
        Some(home) => settings_dir_from_home(&home),
        None => {
            tracing::warn!("no home directory found, keeping overlay settings in temp dir");
            std::env::temp_dir().join(SETTINGS_DIR_NAME)
        }
    }
}

pub fn resolve_settings_path() -> PathBuf {
    resolve_settings_dir().join(SETTINGS_FILE_NAME)
}

/// Key-value settings backed by a single JSON file.
///
/// Every write updates memory first and then rewrites the whole file, so a
/// `set` is always visible to the next `get` even when the disk write fails.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    settings: OverlaySettings,
}

impl SettingsStore {
    /// Never fails: missing, empty or malformed files yield defaults.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = match read_settings_file(&path) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!(?err, path = %path.display(), "falling back to default overlay settings");
                OverlaySettings::default()
            }
        };
        Self { path, settings }
    }

    pub fn load_default_location() -> Self {
        Self::load(resolve_settings_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &OverlaySettings {
        &self.settings
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let key = key.parse::<SettingKey>().ok()?;
        Some(self.settings.value_of(key))
    }

    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    /// Rejects unknown keys and ill-typed values. Persistence problems are only
    /// logged.
    pub fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let key = key.parse::<SettingKey>()?;
        self.settings.apply_value(key, value)?;
        self.persist();
        Ok(())
    }

    pub fn pen_color(&self) -> DrawColor {
        self.settings.pen_color
    }

    pub fn pen_thickness(&self) -> f64 {
        self.settings.pen_thickness
    }

    pub fn eraser_thickness(&self) -> f64 {
        self.settings.eraser_thickness
    }

    pub fn recent_colors(&self) -> &[String] {
        &self.settings.recent_colors
    }

    pub fn auto_hide_toolbar(&self) -> bool {
        self.settings.auto_hide_toolbar
    }

    pub fn set_pen_color(&mut self, color: DrawColor) {
        self.settings.pen_color = color.clamped();
        self.persist();
    }

    pub fn set_recent_colors(&mut self, colors: Vec<String>) {
        self.settings.recent_colors = colors;
        self.persist();
    }

    fn persist(&self) {
        if let Err(err) = save_to_path(&self.path, &self.settings) {
            tracing::error!(?err, "failed to persist overlay settings");
        }
    }
}

/// Single settings store shared by every component of one overlay session.
#[derive(Debug, Clone)]
pub struct SharedSettings(Rc<RefCell<SettingsStore>>);

impl SharedSettings {
    pub fn new(store: SettingsStore) -> Self {
        Self(Rc::new(RefCell::new(store)))
    }

    pub fn read<R>(&self, f: impl FnOnce(&SettingsStore) -> R) -> R {
        f(&self.0.borrow())
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut SettingsStore) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }

    pub fn snapshot(&self) -> OverlaySettings {
        self.read(|store| store.settings().clone())
    }
}

fn read_settings_file(path: &Path) -> Result<OverlaySettings> {
    if !path.exists() {
        return Ok(OverlaySettings::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read overlay settings file {}", path.display()))?;

    if content.trim().is_empty() {
        return Ok(OverlaySettings::default());
    }

    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("deserialize overlay settings file {}", path.display()))?;
    let map = value
        .as_object()
        .ok_or_else(|| anyhow!("overlay settings file {} is not a JSON object", path.display()))?;

    let (settings, rejected) = OverlaySettings::from_map(map);
    for key in rejected {
        tracing::warn!(%key, "ignoring invalid overlay setting, using default");
    }
    Ok(settings)
}

fn save_to_path(path: &Path, settings: &OverlaySettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create overlay settings folder {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(settings).context("serialize overlay settings")?;
    std::fs::write(path, json)
        .with_context(|| format!("write overlay settings file {}", path.display()))
}
