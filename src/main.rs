use anyhow::anyhow;
use eframe::egui;
use pretools_overlay::draw::capture::{CaptureProvider, FileCapture, NoCapture};
use pretools_overlay::draw::save::export_folder_from_settings_dir;
use pretools_overlay::draw::settings_store::{
    resolve_settings_dir, SettingsStore, SharedSettings, SETTINGS_FILE_NAME,
};
use pretools_overlay::gui::{OverlayApp, WINDOW_SIZE, WINDOW_TITLE};
use pretools_overlay::logging;

const LOG_FILE_NAME: &str = "overlay.log";
const BACKGROUND_FILE_NAME: &str = "screenshot_background.png";

fn main() -> anyhow::Result<()> {
    let settings_dir = resolve_settings_dir();
    logging::init(cfg!(debug_assertions), Some(settings_dir.join(LOG_FILE_NAME)));

    let settings = SharedSettings::new(SettingsStore::load(settings_dir.join(SETTINGS_FILE_NAME)));

    // A screenshot dropped next to the settings stands in for the platform
    // capture; without one the canvas uses the flat fill.
    let background = settings_dir.join(BACKGROUND_FILE_NAME);
    let capture: Box<dyn CaptureProvider> = if background.exists() {
        Box::new(FileCapture::new(background))
    } else {
        Box::new(NoCapture)
    };
    let export_dir = export_folder_from_settings_dir(&settings_dir);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(WINDOW_SIZE)
            .with_decorations(false)
            .with_always_on_top(),
        ..Default::default()
    };

    tracing::info!(settings = %settings_dir.display(), "starting overlay");
    eframe::run_native(
        WINDOW_TITLE,
        native_options,
        Box::new(move |_cc| Box::new(OverlayApp::new(settings, capture, export_dir))),
    )
    .map_err(|err| anyhow!("overlay window failed: {err}"))
}
