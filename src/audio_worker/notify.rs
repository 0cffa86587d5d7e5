use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc;

/// 面向用户的播放通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackNotice {
    /// 找不到音频设备，功能已关闭
    NoDevice { controller: String },
    /// 播放出错，功能已关闭
    PlaybackFailed { controller: String, detail: String },
}

impl PlaybackNotice {
    pub fn message(&self) -> String {
        match self {
            PlaybackNotice::NoDevice { controller } => {
                format!("未找到音频设备，已关闭 {controller}")
            }
            PlaybackNotice::PlaybackFailed { controller, .. } => {
                format!("播放 {controller} 时出错，已关闭 {controller}")
            }
        }
    }
}

/// 通知输出端（聊天栏、toast、日志……）
///
/// 故障通知在播放线程上同步调用，实现里不要回调控制器的生命周期操作。
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: &PlaybackNotice);
}

/// 只写日志
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&self, notice: &PlaybackNotice) {
        tracing::warn!(notice = ?notice, "{}", notice.message());
    }
}

impl NotificationSink for mpsc::Sender<PlaybackNotice> {
    fn notify(&self, notice: &PlaybackNotice) {
        let _ = self.send(notice.clone());
    }
}

/// 调用通知端，吞掉其中的 panic
pub(super) fn deliver(sink: &dyn NotificationSink, notice: &PlaybackNotice) {
    if catch_unwind(AssertUnwindSafe(|| sink.notify(notice))).is_err() {
        tracing::error!(notice = ?notice, "通知端 panic，已忽略");
    }
}
