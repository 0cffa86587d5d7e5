use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, JoinHandle};

use super::device::{DeviceFactory, OutputDevice};
use super::notify::NotificationSink;
use super::policy::{DisableRequest, ErrorPolicy};
use super::signal::CancelSignal;
use super::source::{TrackId, TrackSource, TrackStream};
use super::worker::{IdleInterval, LoopExit, WorkerContext, run_streaming_loop};
use crate::error::AudioError;

#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// 控制器名称，用于线程名、日志和通知
    pub label: String,
    pub buffer_depth: usize,
    pub idle: IdleInterval,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            label: "music".to_owned(),
            buffer_depth: 5,
            idle: IdleInterval::default(),
        }
    }
}

/// 播放线程和控制器共享的输出设备，`close` 只转发一次
struct LeasedDevice {
    inner: Arc<dyn OutputDevice>,
    closed: AtomicBool,
}

impl LeasedDevice {
    fn new(inner: Arc<dyn OutputDevice>) -> Self {
        Self {
            inner,
            closed: AtomicBool::new(false),
        }
    }
}

impl OutputDevice for LeasedDevice {
    fn play_streaming(&self, track: &TrackId, stream: TrackStream) -> Result<(), AudioError> {
        self.inner.play_streaming(track, stream)
    }

    fn request_stop(&self) {
        self.inner.request_stop();
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.inner.close();
        }
    }
}

/// 一个正在运行（或正在退出）的播放线程及其输出设备
struct WorkerHandle {
    generation: u64,
    thread: JoinHandle<()>,
    device: Arc<dyn OutputDevice>,
    cancel: Arc<CancelSignal>,
}

impl WorkerHandle {
    /// 取消、停止设备、等待线程结束、关闭设备
    fn teardown(self, label: &str) {
        self.cancel.raise();
        self.device.request_stop();
        if self.thread.join().is_err() {
            tracing::error!(controller = %label, generation = self.generation, "播放线程 panic");
        }
        self.device.close();
        tracing::debug!(controller = %label, generation = self.generation, "播放线程已回收");
    }
}

#[derive(Default)]
struct Lifecycle {
    enabled: bool,
    shut_down: bool,
    generation: u64,
    last_exit: Option<LoopExit>,
    worker: Option<WorkerHandle>,
    /// 自行退出的线程，等待下一次生命周期操作时 join
    retired: Option<WorkerHandle>,
}

struct Shared {
    label: String,
    state: Mutex<Lifecycle>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// 播放线程内部使用的关闭请求，只做状态转换，从不 join
struct Retire {
    shared: Weak<Shared>,
    generation: u64,
}

impl DisableRequest for Retire {
    fn request_disable(&self) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        let mut st = shared.lock();
        if st
            .worker
            .as_ref()
            .is_some_and(|w| w.generation == self.generation)
        {
            let handle = st.worker.take();
            if let Some(h) = handle.as_ref() {
                h.cancel.raise();
            }
            st.retired = handle;
            st.enabled = false;
            tracing::info!(controller = %shared.label, generation = self.generation, "播放线程请求关闭");
        }
    }
}

impl Retire {
    fn record_exit(&self, exit: LoopExit) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        let mut st = shared.lock();
        if st.generation == self.generation {
            st.last_exit = Some(exit);
        }
    }
}

/// 后台播放控制器
///
/// 持有启用状态、播放线程和取消信号。`set_enabled` / `shutdown` 返回时，
/// 被关闭的线程已经结束，输出设备已经释放。
pub struct PlaybackController {
    shared: Arc<Shared>,
    // 串行化生命周期操作；播放线程从不获取它
    ops: Mutex<()>,
    config: PlaybackConfig,
    factory: Arc<dyn DeviceFactory>,
    source: Arc<dyn TrackSource>,
    policy: ErrorPolicy,
}

impl PlaybackController {
    pub fn new(
        config: PlaybackConfig,
        factory: Arc<dyn DeviceFactory>,
        source: Arc<dyn TrackSource>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let policy = ErrorPolicy::new(config.label.clone(), notifier);
        Self {
            shared: Arc::new(Shared {
                label: config.label.clone(),
                state: Mutex::new(Lifecycle::default()),
            }),
            ops: Mutex::new(()),
            config,
            factory,
            source,
            policy,
        }
    }

    pub fn label(&self) -> &str {
        &self.config.label
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.lock().enabled
    }

    /// 最近一个播放线程的退出原因；线程仍在运行时为 `None`
    pub fn last_exit(&self) -> Option<LoopExit> {
        self.shared.lock().last_exit
    }

    /// 幂等地启用或关闭
    ///
    /// 启用时如果打不开输出设备，返回 `AudioError::DeviceUnavailable`，状态保持关闭。
    pub fn set_enabled(&self, on: bool) -> Result<(), AudioError> {
        let _ops = self.ops.lock().unwrap_or_else(PoisonError::into_inner);
        self.reap_retired();

        let (enabled, shut_down) = {
            let st = self.shared.lock();
            (st.enabled, st.shut_down)
        };
        if shut_down {
            if on {
                tracing::warn!(controller = %self.config.label, "控制器已关闭，忽略启用请求");
            }
            return Ok(());
        }

        match (on, enabled) {
            (true, false) => self.start(),
            (false, true) => {
                self.stop();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// 完整关闭：停止播放线程并释放资源，之后不能再启用。重复调用无效果。
    pub fn shutdown(&self) {
        let _ops = self.ops.lock().unwrap_or_else(PoisonError::into_inner);
        if self.shared.lock().shut_down {
            return;
        }
        self.stop();
        self.shared.lock().shut_down = true;
        tracing::info!(controller = %self.config.label, "播放控制器已关闭");
    }

    fn start(&self) -> Result<(), AudioError> {
        let label = &self.config.label;
        let device = match self.factory.open(self.config.buffer_depth) {
            Ok(v) => v,
            Err(e) => {
                let kind = ErrorPolicy::classify(&e);
                tracing::warn!(controller = %label, ?kind, err = %e, "打开输出设备失败，保持关闭");
                self.policy.report(&e, kind);
                return Err(e);
            }
        };
        let device: Arc<dyn OutputDevice> = Arc::new(LeasedDevice::new(device));
        let cancel = Arc::new(CancelSignal::new());

        // 持有状态锁直到句柄写入，播放线程的关闭请求因此总能看到自己的句柄
        let mut st = self.shared.lock();
        st.generation = st.generation.wrapping_add(1);
        st.last_exit = None;
        let generation = st.generation;

        let ctx = WorkerContext {
            label: label.clone(),
            device: Arc::clone(&device),
            source: Arc::clone(&self.source),
            cancel: Arc::clone(&cancel),
            idle: self.config.idle,
            policy: self.policy.clone(),
            retire: Retire {
                shared: Arc::downgrade(&self.shared),
                generation,
            },
        };
        let spawned = thread::Builder::new()
            .name(format!("bgm-{label}"))
            .spawn(move || {
                let run = panic::catch_unwind(AssertUnwindSafe(|| {
                    let mut rng = rand::thread_rng();
                    run_streaming_loop(&ctx, &mut rng)
                }));
                let exit = run.unwrap_or_else(|_| {
                    tracing::error!(controller = %ctx.label, generation, "播放线程 panic，自行关闭");
                    ctx.retire.request_disable();
                    LoopExit::Panicked
                });
                // 自行退出时不等下一次生命周期操作，先释放设备
                if exit != LoopExit::Cancelled {
                    ctx.device.close();
                }
                ctx.retire.record_exit(exit);
                tracing::info!(controller = %ctx.label, generation, ?exit, "播放线程退出");
            });
        let thread = match spawned {
            Ok(v) => v,
            Err(e) => {
                drop(st);
                device.close();
                tracing::error!(controller = %label, err = %e, "创建播放线程失败");
                return Err(AudioError::PlaybackFault(format!("创建播放线程失败: {e}")));
            }
        };

        st.worker = Some(WorkerHandle {
            generation,
            thread,
            device,
            cancel,
        });
        st.enabled = true;
        tracing::info!(controller = %label, generation, "播放已启用");
        Ok(())
    }

    fn stop(&self) {
        let handle = {
            let mut st = self.shared.lock();
            st.enabled = false;
            st.worker.take()
        };
        if let Some(handle) = handle {
            handle.teardown(&self.config.label);
            tracing::info!(controller = %self.config.label, "播放已关闭");
        }
        self.reap_retired();
    }

    fn reap_retired(&self) {
        let retired = self.shared.lock().retired.take();
        if let Some(handle) = retired {
            handle.teardown(&self.config.label);
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
