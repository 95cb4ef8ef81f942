use pretools_overlay::draw::settings::{OverlaySettings, ToolbarPosition};
use pretools_overlay::draw::SettingsStore;
use serde_json::{json, Value};
use tempfile::tempdir;

#[test]
fn set_then_get_round_trips_every_key() {
    let dir = tempdir().unwrap();
    let mut store = SettingsStore::load(dir.path().join("settings.json"));
    let values = [
        ("pen_color", json!([0.25, 0.5, 0.75, 1.0])),
        ("pen_thickness", json!(4.5)),
        ("eraser_thickness", json!(30)),
        ("recent_colors", json!(["#123456", "#ABCDEF"])),
        ("toolbar_position", json!("top")),
        ("auto_hide_toolbar", json!(false)),
    ];
    for (key, value) in &values {
        store.set(key, value.clone()).unwrap();
        assert_eq!(store.get(key).as_ref(), Some(value), "{key}");
    }

    let reloaded = SettingsStore::load(dir.path().join("settings.json"));
    for (key, value) in &values {
        assert_eq!(reloaded.get(key).as_ref(), Some(value), "{key} after reload");
    }
    assert_eq!(reloaded.settings().toolbar_position, ToolbarPosition::Top);
}

#[test]
fn partial_file_is_backfilled_with_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{ "pen_thickness": 8, "theme": "dark" }"#).unwrap();

    let store = SettingsStore::load(&path);
    assert_eq!(store.pen_thickness(), 8.0);
    assert_eq!(store.eraser_thickness(), 15.0);
    assert_eq!(store.get("theme"), None);
    assert_eq!(store.recent_colors()[..2], ["#FF0000", "#00FF00"]);
}

#[test]
fn first_write_creates_the_settings_folder() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(".pretools_overlay").join("settings.json");
    let mut store = SettingsStore::load(&path);
    assert!(!path.exists());

    store.set("auto_hide_toolbar", json!(false)).unwrap();

    let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let expected = serde_json::to_value(OverlaySettings {
        auto_hide_toolbar: false,
        ..OverlaySettings::default()
    })
    .unwrap();
    assert_eq!(written, expected);
}

#[test]
fn recent_colors_reject_trailing_characters() {
    let dir = tempdir().unwrap();
    let mut store = SettingsStore::load(dir.path().join("settings.json"));
    assert!(store.set("recent_colors", json!(["#FF0000junk"])).is_err());
    assert_eq!(store.recent_colors()[0], "#FF0000");
    assert!(!dir.path().join("settings.json").exists());
}
