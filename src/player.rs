//! 宿主侧的音频入口：读取设置、持有音乐控制器、持久化开关

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::audio_worker::{
    AudioBackend, DeviceFactory, DirTrackSource, LoopExit, NotificationSink, PlaybackController,
};
use crate::error::{AudioError, SettingsError};
use crate::settings::{AudioSettings, load_settings, save_settings};

pub struct AudioPlayer {
    data_dir: PathBuf,
    settings: AudioSettings,
    music: PlaybackController,
}

impl AudioPlayer {
    pub fn new(data_dir: &Path, backend: AudioBackend, notifier: Arc<dyn NotificationSink>) -> Self {
        let settings = load_settings(data_dir);
        Self::with_factory(data_dir, settings, backend.device_factory(), notifier)
    }

    /// 按给定设置构建；若设置中音乐是开启的，立即启用
    pub fn with_factory(
        data_dir: &Path,
        settings: AudioSettings,
        factory: Arc<dyn DeviceFactory>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let source = DirTrackSource::new(settings.music_dir(data_dir), &settings.track_extension);
        tracing::info!(music_dir = %source.dir().display(), use_music = settings.use_music, "AudioPlayer 初始化");
        let music = PlaybackController::new(
            settings.playback_config("music"),
            factory,
            Arc::new(source),
            notifier,
        );

        let mut player = Self {
            data_dir: data_dir.to_path_buf(),
            settings,
            music,
        };
        if player.settings.use_music
            && let Err(e) = player.music.set_enabled(true)
        {
            tracing::warn!(err = %e, "启动时启用音乐失败");
            player.settings.use_music = false;
        }
        player
    }

    pub fn music(&self) -> &PlaybackController {
        &self.music
    }

    pub fn settings(&self) -> &AudioSettings {
        &self.settings
    }

    pub fn is_music_enabled(&self) -> bool {
        self.music.is_enabled()
    }

    /// 切换音乐并保存设置；启用失败时保存为关闭
    pub fn set_music(&mut self, on: bool) -> Result<(), AudioError> {
        let result = self.music.set_enabled(on);
        self.settings.use_music = on && result.is_ok();
        self.persist();
        result
    }

    /// 关闭所有播放并保存最终状态
    pub fn shutdown(&mut self) {
        self.music.shutdown();
        // 播放故障会让控制器自行关闭，这里同步到设置；曲目为空不算
        if matches!(
            self.music.last_exit(),
            Some(LoopExit::Fault(_) | LoopExit::Panicked)
        ) {
            self.settings.use_music = false;
        }
        self.persist();
    }

    fn persist(&self) {
        if let Err(e) = self.save() {
            tracing::warn!(err = %e, "保存设置失败");
        }
    }

    fn save(&self) -> Result<(), SettingsError> {
        save_settings(&self.data_dir, &self.settings)
    }
}
