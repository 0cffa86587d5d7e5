//! 音频播放相关错误

use std::path::PathBuf;

/// 设备层报告“没有可用输出设备”时使用的消息
pub const NO_AUDIO_DEVICES: &str = "No audio devices found";

/// 音频播放错误类型
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    /// 没有可用的音频输出设备
    #[error("没有可用的音频输出设备: {0}")]
    DeviceUnavailable(String),

    /// 播放过程中设备或音频流出错
    #[error("播放失败: {0}")]
    PlaybackFault(String),

    /// 曲目来源为空
    #[error("没有可播放的曲目: {source_desc}")]
    ConfigurationEmpty { source_desc: String },

    /// 曲目文件在枚举之后消失
    #[error("音频文件不存在: {}", .0.display())]
    TrackNotFound(PathBuf),

    /// 打开音频文件失败
    #[error("打开音频文件失败({}): {source}", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 解码音频失败
    #[error("解码音频失败({track}): {message}")]
    Decode { track: String, message: String },
}

impl AudioError {
    /// 是否属于“找不到设备”一类
    ///
    /// 设备层有时只能通过 `PlaybackFault` 报告缺少设备，此时按消息判断。
    pub fn is_device_unavailable(&self) -> bool {
        match self {
            AudioError::DeviceUnavailable(_) => true,
            AudioError::PlaybackFault(msg) => msg == NO_AUDIO_DEVICES,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_error_display() {
        let err = AudioError::DeviceUnavailable("default output".to_string());
        assert_eq!(err.to_string(), "没有可用的音频输出设备: default output");
    }

    #[test]
    fn test_is_device_unavailable() {
        assert!(AudioError::DeviceUnavailable("x".into()).is_device_unavailable());
        assert!(AudioError::PlaybackFault(NO_AUDIO_DEVICES.into()).is_device_unavailable());
        assert!(!AudioError::PlaybackFault("buffer underrun".into()).is_device_unavailable());
        assert!(
            !AudioError::ConfigurationEmpty {
                source_desc: "audio".into()
            }
            .is_device_unavailable()
        );
    }

    #[test]
    fn test_open_file_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "拒绝访问");
        let err = AudioError::OpenFile {
            path: PathBuf::from("audio/calm1.ogg"),
            source: io_err,
        };
        assert!(err.to_string().contains("calm1.ogg"));
        assert!(err.to_string().contains("拒绝访问"));
    }
}
