//! 统一错误处理模块
//!
//! 播放核心与宿主程序的结构化错误类型。

mod app;
mod audio;

pub use app::{AppError, SettingsError};
pub use audio::{AudioError, NO_AUDIO_DEVICES};
