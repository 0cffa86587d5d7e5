use std::sync::Arc;

use super::notify::{NotificationSink, PlaybackNotice, deliver};
use crate::error::AudioError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    NoDeviceFound,
    PlaybackFailure,
}

/// 请求关闭控制器，不得等待调用者所在的线程
pub trait DisableRequest {
    fn request_disable(&self);
}

/// 设备故障的处理策略：分类、关闭功能、通知用户
#[derive(Clone)]
pub struct ErrorPolicy {
    label: String,
    notifier: Arc<dyn NotificationSink>,
}

impl ErrorPolicy {
    pub fn new(label: impl Into<String>, notifier: Arc<dyn NotificationSink>) -> Self {
        Self {
            label: label.into(),
            notifier,
        }
    }

    pub fn classify(err: &AudioError) -> FaultKind {
        if err.is_device_unavailable() {
            FaultKind::NoDeviceFound
        } else {
            FaultKind::PlaybackFailure
        }
    }

    /// 播放线程里遇到故障时调用
    pub fn handle(&self, err: &AudioError, ctl: &dyn DisableRequest) -> FaultKind {
        let kind = Self::classify(err);
        tracing::error!(controller = %self.label, ?kind, err = %err, "播放出错，关闭播放");
        ctl.request_disable();
        self.report(err, kind);
        kind
    }

    /// 只通知，不请求关闭（启用失败时控制器本身仍是关闭状态）
    pub fn report(&self, err: &AudioError, kind: FaultKind) {
        let notice = match kind {
            FaultKind::NoDeviceFound => PlaybackNotice::NoDevice {
                controller: self.label.clone(),
            },
            FaultKind::PlaybackFailure => PlaybackNotice::PlaybackFailed {
                controller: self.label.clone(),
                detail: err.to_string(),
            },
        };
        deliver(self.notifier.as_ref(), &notice);
    }
}
