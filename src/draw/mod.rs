pub mod autohide;
pub mod canvas;
pub mod capture;
pub mod composite;
pub mod model;
pub mod render;
pub mod save;
pub mod settings;
pub mod settings_store;
pub mod toolbar;

pub use canvas::StrokeCanvas;
pub use capture::{CaptureProvider, FileCapture, NoCapture, PendingCapture};
pub use settings_store::{SettingsStore, SharedSettings};
