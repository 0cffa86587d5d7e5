use rodio::mixer::Mixer;
use rodio::{Decoder, OutputStreamBuilder, Sink, Source};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, mpsc};
use std::thread::{self, JoinHandle};

use super::source::{TrackId, TrackStream};
use crate::error::AudioError;

/// 平台音频输出
///
/// `play_streaming` 在调用线程上阻塞到曲目播完；`request_stop` 可以从其它线程调用，
/// 让正在进行的 `play_streaming` 尽快返回。一个实例只服务一个启用周期。
pub trait OutputDevice: Send + Sync {
    fn play_streaming(&self, track: &TrackId, stream: TrackStream) -> Result<(), AudioError>;

    fn request_stop(&self);

    fn close(&self);
}

pub trait DeviceFactory: Send + Sync {
    fn open(&self, buffer_depth: usize) -> Result<Arc<dyn OutputDevice>, AudioError>;
}

/// 通过 rodio 打开默认输出设备
#[derive(Debug, Default, Clone, Copy)]
pub struct RodioFactory;

impl DeviceFactory for RodioFactory {
    fn open(&self, buffer_depth: usize) -> Result<Arc<dyn OutputDevice>, AudioError> {
        let output = RodioOutput::open(buffer_depth)?;
        Ok(Arc::new(output))
    }
}

/// rodio 输出
///
/// `OutputStream` 不能跨线程移动，所以放在专门的线程里持有，直到 `close`。
pub struct RodioOutput {
    mixer: Mixer,
    current: Mutex<Option<Arc<Sink>>>,
    stop_requested: AtomicBool,
    close_tx: Mutex<Option<mpsc::Sender<()>>>,
    stream_thread: Mutex<Option<JoinHandle<()>>>,
}

impl RodioOutput {
    pub fn open(buffer_depth: usize) -> Result<Self, AudioError> {
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<Mixer, String>>(1);
        let (close_tx, close_rx) = mpsc::channel::<()>();

        let stream_thread = thread::Builder::new()
            .name("bgm-output-stream".to_owned())
            .spawn(move || {
                let stream = match OutputStreamBuilder::open_default_stream() {
                    Ok(v) => v,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                if ready_tx.send(Ok(stream.mixer().clone())).is_err() {
                    return;
                }
                // sender 被 drop 或收到关闭消息时释放输出流
                let _ = close_rx.recv();
                drop(stream);
            })
            .map_err(|e| AudioError::DeviceUnavailable(format!("创建音频输出线程失败: {e}")))?;

        let mixer = match ready_rx.recv() {
            Ok(Ok(mixer)) => mixer,
            Ok(Err(e)) => {
                let _ = stream_thread.join();
                tracing::error!(err = %e, "初始化音频输出失败");
                return Err(AudioError::DeviceUnavailable(e));
            }
            Err(_) => {
                let _ = stream_thread.join();
                return Err(AudioError::DeviceUnavailable(
                    "音频输出线程意外退出".to_owned(),
                ));
            }
        };

        tracing::info!(buffer_depth, "音频输出已打开");
        Ok(Self {
            mixer,
            current: Mutex::new(None),
            stop_requested: AtomicBool::new(false),
            close_tx: Mutex::new(Some(close_tx)),
            stream_thread: Mutex::new(Some(stream_thread)),
        })
    }
}

impl OutputDevice for RodioOutput {
    fn play_streaming(&self, track: &TrackId, stream: TrackStream) -> Result<(), AudioError> {
        let decoder = Decoder::new(stream).map_err(|e| AudioError::Decode {
            track: track.to_string(),
            message: e.to_string(),
        })?;
        let duration_ms = decoder.total_duration().map(|d| d.as_millis() as u64);

        let sink = Arc::new(Sink::connect_new(&self.mixer));
        sink.append(decoder);
        {
            let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
            if self.stop_requested.load(Ordering::SeqCst) {
                sink.stop();
                return Ok(());
            }
            *current = Some(Arc::clone(&sink));
        }

        tracing::debug!(track = %track, ?duration_ms, "start playback");
        sink.sleep_until_end();

        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }

    fn request_stop(&self) {
        let current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        self.stop_requested.store(true, Ordering::SeqCst);
        if let Some(sink) = current.as_ref() {
            tracing::debug!("Stopping current sink");
            sink.stop();
        }
    }

    fn close(&self) {
        self.request_stop();
        self.close_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let handle = self
            .stream_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle
            && handle.join().is_err()
        {
            tracing::error!("音频输出线程 panic");
        }
    }
}
