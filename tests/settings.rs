use bgm_player::settings::{AudioSettings, load_settings, save_settings, settings_path};
use std::fs;
use std::path::PathBuf;

#[test]
fn settings_roundtrip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data_dir = dir.path();

    let s = AudioSettings {
        use_music: true,
        music_dir: Some(PathBuf::from("/srv/bgm")),
        track_extension: "flac".to_owned(),
        buffer_depth: 8,
        idle_min_secs: 30,
        idle_jitter_secs: 0,
    };
    save_settings(data_dir, &s).expect("save_settings");

    let loaded = load_settings(data_dir);
    assert_eq!(loaded, s);
    assert!(!settings_path(data_dir).with_extension("json.tmp").exists());
}

#[test]
fn settings_corrupt_file_falls_back_to_default() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data_dir = dir.path();
    fs::write(data_dir.join("settings.json"), b"{not-json").expect("write");

    let loaded = load_settings(data_dir);
    assert_eq!(loaded, AudioSettings::default());
}

#[test]
fn settings_missing_fields_use_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data_dir = dir.path();
    fs::write(data_dir.join("settings.json"), br#"{"use_music": true}"#).expect("write");

    let loaded = load_settings(data_dir);
    assert!(loaded.use_music);
    assert_eq!(loaded.track_extension, "ogg");
    assert_eq!(loaded.buffer_depth, 5);
    assert_eq!(loaded.idle_min_secs, 120);
    assert_eq!(loaded.idle_jitter_secs, 300);
}
