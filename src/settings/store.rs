use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::audio_worker::{IdleInterval, PlaybackConfig};
use crate::error::SettingsError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    // 开关
    #[serde(default)]
    pub use_music: bool,

    // 曲目来源
    #[serde(default)]
    pub music_dir: Option<PathBuf>,
    #[serde(default = "default_track_extension")]
    pub track_extension: String,

    // 播放节奏
    #[serde(default = "default_buffer_depth")]
    pub buffer_depth: usize,
    #[serde(default = "default_idle_min_secs")]
    pub idle_min_secs: u64,
    #[serde(default = "default_idle_jitter_secs")]
    pub idle_jitter_secs: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            use_music: false,
            music_dir: None,
            track_extension: default_track_extension(),
            buffer_depth: default_buffer_depth(),
            idle_min_secs: default_idle_min_secs(),
            idle_jitter_secs: default_idle_jitter_secs(),
        }
    }
}

// 默认值函数（用于 serde default）
fn default_track_extension() -> String { "ogg".to_owned() }
fn default_buffer_depth() -> usize { 5 }
fn default_idle_min_secs() -> u64 { 2 * 60 }
fn default_idle_jitter_secs() -> u64 { 5 * 60 }

impl AudioSettings {
    /// 曲目目录，未配置时为 `{data_dir}/audio`
    pub fn music_dir(&self, data_dir: &Path) -> PathBuf {
        self.music_dir
            .clone()
            .unwrap_or_else(|| data_dir.join("audio"))
    }

    pub fn playback_config(&self, label: &str) -> PlaybackConfig {
        PlaybackConfig {
            label: label.to_owned(),
            buffer_depth: self.buffer_depth,
            idle: IdleInterval {
                min: Duration::from_secs(self.idle_min_secs),
                jitter: Duration::from_secs(self.idle_jitter_secs),
            },
        }
    }
}

/// 系统本地数据目录，取不到时退回临时目录
pub fn default_data_dir() -> PathBuf {
    ProjectDirs::from("dev", "bgm", "bgm-player")
        .map(|p| p.data_local_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("bgm-player"))
}

pub fn load_settings(data_dir: &Path) -> AudioSettings {
    let p = settings_path(data_dir);
    let Ok(bytes) = fs::read(&p) else {
        return AudioSettings::default();
    };
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        tracing::warn!(path = %p.display(), err = %e, "设置文件损坏，使用默认设置");
        AudioSettings::default()
    })
}

pub fn save_settings(data_dir: &Path, s: &AudioSettings) -> Result<(), SettingsError> {
    let bytes = serde_json::to_vec_pretty(s).map_err(|source| SettingsError::Encode { source })?;
    write_atomic(data_dir, &bytes).map_err(|source| SettingsError::Save { source })
}

fn write_atomic(data_dir: &Path, bytes: &[u8]) -> std::io::Result<()> {
    fs::create_dir_all(data_dir)?;
    let p = settings_path(data_dir);
    let tmp = p.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    if let Err(e) = fs::rename(&tmp, &p) {
        let _ = fs::remove_file(&p);
        fs::rename(&tmp, &p).map_err(|_| e)?;
    }
    Ok(())
}

pub fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join("settings.json")
}
