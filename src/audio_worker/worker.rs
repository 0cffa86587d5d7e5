use rand::Rng;
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::Duration;

use super::device::OutputDevice;
use super::policy::{DisableRequest, ErrorPolicy, FaultKind};
use super::signal::{CancelSignal, WaitOutcome};
use super::source::TrackSource;
use crate::error::AudioError;

/// 两首曲目之间的空闲时长：`[min, min + jitter)` 内均匀分布
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleInterval {
    pub min: Duration,
    pub jitter: Duration,
}

impl Default for IdleInterval {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(2 * 60),
            jitter: Duration::from_secs(5 * 60),
        }
    }
}

impl IdleInterval {
    /// 结果在 `Duration::MAX` 处饱和
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        if jitter_ms == 0 {
            return self.min;
        }
        self.min
            .saturating_add(Duration::from_millis(rng.gen_range(0..jitter_ms)))
    }
}

/// 播放循环结束的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Cancelled,
    Empty,
    Fault(FaultKind),
    /// 播放线程 panic，已被控制器捕获
    Panicked,
}

pub(super) struct WorkerContext<D: DisableRequest> {
    pub label: String,
    pub device: Arc<dyn OutputDevice>,
    pub source: Arc<dyn TrackSource>,
    pub cancel: Arc<CancelSignal>,
    pub idle: IdleInterval,
    pub policy: ErrorPolicy,
    pub retire: D,
}

/// 播放线程主体：随机选曲、播放、空闲等待，直到被取消或出错
///
/// 进入时输出设备已经打开。设备故障不会越过线程边界，只会交给 `ErrorPolicy`。
pub(super) fn run_streaming_loop<D, R>(ctx: &WorkerContext<D>, rng: &mut R) -> LoopExit
where
    D: DisableRequest,
    R: Rng + ?Sized,
{
    loop {
        if ctx.cancel.is_raised() {
            return LoopExit::Cancelled;
        }

        let tracks = ctx.source.enumerate();
        let Some(track) = tracks.choose(rng) else {
            let err = AudioError::ConfigurationEmpty {
                source_desc: ctx.source.describe(),
            };
            tracing::warn!(controller = %ctx.label, err = %err, "结束本次播放周期");
            ctx.retire.request_disable();
            return LoopExit::Empty;
        };

        tracing::debug!(controller = %ctx.label, track = %track, candidates = tracks.len(), "playing track");
        match ctx.source.open_stream(track) {
            Ok(stream) => {
                if let Err(e) = ctx.device.play_streaming(track, stream) {
                    let kind = ctx.policy.handle(&e, &ctx.retire);
                    return LoopExit::Fault(kind);
                }
            }
            Err(e) => {
                tracing::warn!(controller = %ctx.label, track = %track, err = %e, "打开曲目失败，跳过");
            }
        }

        if ctx.cancel.is_raised() {
            return LoopExit::Cancelled;
        }

        let idle = ctx.idle.sample(rng);
        tracing::debug!(controller = %ctx.label, idle_ms = idle.as_millis() as u64, "idle");
        if ctx.cancel.wait(idle) == WaitOutcome::Signaled {
            return LoopExit::Cancelled;
        }
    }
}
