use crate::draw::model::{CanvasModel, Stroke};
use crate::draw::render::render_canvas_to_rgba;
use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const EXPORT_SUBDIR: &str = "exports";

/// Files written by one save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedAnnotation {
    pub image: PathBuf,
    pub stroke_log: PathBuf,
}

/// JSON companion of the exported PNG.
#[derive(Debug, Serialize)]
pub struct StrokeLog<'a> {
    pub width: u32,
    pub height: u32,
    pub background: Option<&'a Path>,
    pub strokes: Vec<&'a Stroke>,
}

impl<'a> StrokeLog<'a> {
    pub fn from_canvas(canvas: &'a CanvasModel, size: (u32, u32)) -> Self {
        Self {
            width: size.0,
            height: size.1,
            background: canvas.background().and_then(|bg| bg.source.as_deref()),
            strokes: canvas.strokes().collect(),
        }
    }
}

pub fn export_folder_from_settings_dir(settings_dir: &Path) -> PathBuf {
    settings_dir.join(EXPORT_SUBDIR)
}

pub fn timestamped_stem(now: chrono::DateTime<Local>) -> String {
    now.format("annotation_%Y%m%d_%H%M%S").to_string()
}

pub fn build_filename(stem: &str, extension: &str) -> String {
    format!("{stem}.{extension}")
}

/// Writes the flattened frame and the stroke log into `output_dir`.
pub fn save_annotation(
    canvas: &CanvasModel,
    size: (u32, u32),
    output_dir: &Path,
    now: chrono::DateTime<Local>,
) -> Result<SavedAnnotation> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("create export folder {}", output_dir.display()))?;

    let stem = timestamped_stem(now);
    let image_path = output_dir.join(build_filename(&stem, "png"));
    let log_path = output_dir.join(build_filename(&stem, "json"));

    render_canvas_to_rgba(canvas, size)
        .to_image()?
        .save(&image_path)
        .with_context(|| format!("write annotation image {}", image_path.display()))?;

    let log = StrokeLog::from_canvas(canvas, size);
    let json = serde_json::to_string_pretty(&log).context("serialize stroke log")?;
    fs::write(&log_path, json)
        .with_context(|| format!("write stroke log {}", log_path.display()))?;

    tracing::info!(image = %image_path.display(), strokes = log.strokes.len(), "annotation saved");
    Ok(SavedAnnotation {
        image: image_path,
        stroke_log: log_path,
    })
}
